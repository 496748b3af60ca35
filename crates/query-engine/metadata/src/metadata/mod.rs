//! Metadata information regarding the logical schemas a query can be compiled against.

pub mod definition;
pub mod error;
pub mod registry;
pub mod schema;

// re-export without modules
pub use definition::*;
pub use error::MetadataError;
pub use registry::SchemaRegistry;
pub use schema::*;
