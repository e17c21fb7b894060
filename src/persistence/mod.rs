//! Persistence layer: JSON document storage for monitor state.

pub mod error;
pub mod json_store;
pub mod traits;

pub use error::PersistenceError;
pub use json_store::JsonFileStore;
#[cfg(test)]
pub use traits::MockStateStore;
pub use traits::StateStore;
