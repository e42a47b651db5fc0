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

use std::fmt;

use serde::{Deserialize, Serialize};

/// A qualified name: a namespace URI plus a local part.
///
/// Service names, interface names, operations and EPR element names are all qualified
/// names. Two names are equal only when both the namespace and the local part match.
///
/// Parsing accepts three spellings:
/// - Clark notation, `{urn:x:dummy}DummyComponent`
/// - fragment notation, `urn:x:dummy#DummyComponent`
/// - a bare local part, `DummyComponent` (empty namespace)
///
/// [`Display`](fmt::Display) always renders Clark notation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QName {
    namespace: String,
    local_part: String,
}

impl QName {
    /// Creates a qualified name from its namespace and local part.
    #[must_use]
    pub fn new(namespace: impl Into<String>, local_part: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            local_part: local_part.into(),
        }
    }

    /// Creates a qualified name with an empty namespace.
    #[must_use]
    pub fn local(local_part: impl Into<String>) -> Self {
        Self::new(String::new(), local_part)
    }

    /// Parses Clark, fragment or bare notation. Never fails: anything that is not
    /// recognisably namespaced becomes a bare local part.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        if let Some(rest) = text.strip_prefix('{') {
            if let Some((namespace, local_part)) = rest.split_once('}') {
                return Self::new(namespace, local_part);
            }
        }
        match text.rsplit_once('#') {
            Some((namespace, local_part)) if !namespace.is_empty() => {
                Self::new(namespace, local_part)
            }
            _ => Self::local(text),
        }
    }

    /// The namespace URI, empty when unqualified.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The local part.
    #[must_use]
    pub fn local_part(&self) -> &str {
        &self.local_part
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.local_part)
        } else {
            write!(f, "{{{}}}{}", self.namespace, self.local_part)
        }
    }
}

impl From<&str> for QName {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_clark_notation() {
        let name = QName::parse("{urn:x:dummy}DummyComponent");
        assert_eq!(name.namespace(), "urn:x:dummy");
        assert_eq!(name.local_part(), "DummyComponent");
        assert_eq!(name.to_string(), "{urn:x:dummy}DummyComponent");
    }

    #[test]
    fn parses_fragment_notation() {
        let name = QName::parse("urn:x:dummy#DummyComponent");
        assert_eq!(name, QName::new("urn:x:dummy", "DummyComponent"));
    }

    #[test]
    fn bare_names_have_no_namespace() {
        let name = QName::from("epr");
        assert_eq!(name.namespace(), "");
        assert_eq!(name.to_string(), "epr");
        assert_eq!(QName::parse("#only"), QName::local("#only"));
    }
}
