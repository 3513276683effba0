//! Tool catalog and execution adapters.

pub mod catalog;
mod composite;
mod provider;
mod schema;
mod validating;

pub use provider::StudioToolProvider;
pub use schema::FunctionSchemaConverter;
pub use validating::ValidatingExecutor;
