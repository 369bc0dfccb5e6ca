// src/services/mod.rs
pub mod api_client;
pub mod backend;

pub use api_client::ApiClient;
pub use backend::TransformerApi;
