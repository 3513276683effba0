//! Ports - interfaces between the application and infrastructure layers

pub mod llm_gateway;
pub mod tool_executor;
pub mod tool_schema;
