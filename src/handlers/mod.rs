pub mod actor;
pub mod file_handlers;
pub mod health_handlers;
