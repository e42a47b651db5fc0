//! [`Store`](crate::traits::Store) backends and the factory that opens them by name.

pub use factory::{StoreBackend, StoreFactory};
pub use file::FileStore;
pub use ids::IdGenerator;
pub use memory::MemoryStore;
pub use store_error::StoreError;

mod factory;
mod file;
mod ids;
mod memory;
mod store_error;
