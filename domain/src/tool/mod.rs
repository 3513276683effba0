//! Tool domain: catalog entities, execution results, and parameter
//! validation.

pub mod entities;
pub mod validation;
pub mod value_objects;
