//! Endpoint addressing: qualified names, endpoint descriptors, external references and
//! the registry that indexes live endpoints.

pub use descriptor::{ComponentId, EndpointDescriptor, EndpointKey, Role};
pub use epr::{EndpointReference, EprError, EPR_WIRE_VERSION};
pub use qname::QName;
pub use registry::{EndpointEvent, EndpointRegistry};
pub use registry_error::RegistryError;

mod descriptor;
mod epr;
mod qname;
mod registry;
mod registry_error;
