pub mod catalog;
pub mod error;
pub mod memory_source;
pub mod obj_source;
pub mod registry;
pub mod source;
pub mod template;

// Re-export commonly used items
pub use catalog::{vegetation_catalog, ModelEntry, ModelMetadata};
pub use error::{LoadError, RegistryError};
pub use memory_source::MemoryModelSource;
pub use obj_source::ObjModelSource;
pub use registry::ModelRegistry;
pub use source::ModelSource;
pub use template::{ModelInstance, ModelTemplate};
