pub mod content_store;
pub mod vault_service;
