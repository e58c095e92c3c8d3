pub mod catalog;
pub mod loader;
pub mod schema;

pub use catalog::{DataCatalog, load_catalog, test_factory_dir};
pub use loader::DataLoadError;
