/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

//! External endpoint references and their wire encoding.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::endpoint::{EndpointDescriptor, QName};

/// Version written into every serialized EPR.
pub const EPR_WIRE_VERSION: u32 = 1;

/// A self-contained address for an endpoint, usable outside the local process.
///
/// Produced from a descriptor by
/// [`EndpointRegistry::to_epr`](crate::endpoint::EndpointRegistry::to_epr) and turned back
/// into a live descriptor by
/// [`EndpointRegistry::resolve`](crate::endpoint::EndpointRegistry::resolve).
///
/// # Wire Format
///
/// ```json
/// {
///   "version": 1,
///   "elementName": { "namespace": "urn:x:dummy", "localPart": "epr" },
///   "serviceName": { "namespace": "urn:x:dummy", "localPart": "DummyComponent" },
///   "addressOrId": "dummy:epr"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointReference {
    element_name: QName,
    service_name: QName,
    address_or_id: String,
}

#[derive(Serialize, Deserialize)]
struct EprWire {
    version: u32,
    #[serde(flatten)]
    reference: EndpointReference,
}

impl EndpointReference {
    /// Builds a reference from its three fields.
    #[must_use]
    pub fn new(
        element_name: impl Into<QName>,
        service_name: impl Into<QName>,
        address_or_id: impl Into<String>,
    ) -> Self {
        Self {
            element_name: element_name.into(),
            service_name: service_name.into(),
            address_or_id: address_or_id.into(),
        }
    }

    /// Element name; its local part carries the endpoint name.
    #[must_use]
    pub const fn element_name(&self) -> &QName {
        &self.element_name
    }

    /// Service name of the referenced endpoint.
    #[must_use]
    pub const fn service_name(&self) -> &QName {
        &self.service_name
    }

    /// Protocol-prefixed address, or a bare endpoint id.
    #[must_use]
    pub fn address_or_id(&self) -> &str {
        &self.address_or_id
    }

    /// Serializes to the versioned JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns [`EprError::Malformed`] if serialization fails.
    pub fn to_json(&self) -> Result<String, EprError> {
        let wire = EprWire {
            version: EPR_WIRE_VERSION,
            reference: self.clone(),
        };
        Ok(serde_json::to_string(&wire)?)
    }

    /// Serializes to the versioned JSON wire form as bytes.
    ///
    /// # Errors
    ///
    /// Returns [`EprError::Malformed`] if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EprError> {
        Ok(self.to_json()?.into_bytes())
    }

    /// Parses the versioned JSON wire form.
    ///
    /// # Errors
    ///
    /// * [`EprError::Malformed`] - the document is not a valid EPR.
    /// * [`EprError::UnsupportedVersion`] - the document was written by a newer encoder.
    pub fn from_json(text: &str) -> Result<Self, EprError> {
        Self::from_slice(text.as_bytes())
    }

    /// Parses the versioned JSON wire form from bytes.
    ///
    /// # Errors
    ///
    /// Same as [`EndpointReference::from_json`].
    pub fn from_slice(bytes: &[u8]) -> Result<Self, EprError> {
        let wire: EprWire = serde_json::from_slice(bytes)?;
        if wire.version != EPR_WIRE_VERSION {
            return Err(EprError::UnsupportedVersion(wire.version));
        }
        Ok(wire.reference)
    }
}

impl From<&EndpointDescriptor> for EndpointReference {
    fn from(descriptor: &EndpointDescriptor) -> Self {
        let service_name = descriptor.service_name().clone();
        let element_name = QName::new(service_name.namespace(), descriptor.endpoint_name());
        let address_or_id = descriptor.protocols().first().map_or_else(
            || descriptor.endpoint_name().to_string(),
            |protocol| format!("{protocol}{}", descriptor.endpoint_name()),
        );
        Self {
            element_name,
            service_name,
            address_or_id,
        }
    }
}

/// Errors decoding an EPR document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EprError {
    /// The document is not valid JSON or lacks a required field.
    Malformed(String),
    /// The document declares a wire version this build does not understand.
    UnsupportedVersion(u32),
}

impl fmt::Display for EprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(e) => write!(f, "Malformed endpoint reference: {e}"),
            Self::UnsupportedVersion(v) => {
                write!(f, "Unsupported endpoint reference version: {v}")
            }
        }
    }
}

impl std::error::Error for EprError {}

impl From<serde_json::Error> for EprError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_form_carries_version() {
        let epr = EndpointReference::new("{urn:a}ep", "{urn:a}Svc", "tcp:ep");
        let json = epr.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["addressOrId"], "tcp:ep");
        assert_eq!(value["serviceName"]["localPart"], "Svc");
    }

    #[test]
    fn rejects_future_versions() {
        let json = r#"{"version":7,"elementName":{"namespace":"","localPart":"a"},
            "serviceName":{"namespace":"","localPart":"b"},"addressOrId":"c"}"#;
        assert_eq!(
            EndpointReference::from_json(json),
            Err(EprError::UnsupportedVersion(7))
        );
    }

    #[test]
    fn rejects_missing_fields() {
        let result = EndpointReference::from_json(r#"{"version":1}"#);
        assert!(matches!(result, Err(EprError::Malformed(_))));
    }
}
