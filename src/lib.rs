// src/lib.rs
//! Client for the transformer thermal-inspection backend: a typed HTTP
//! adapter plus the controllers behind the transformer, inspection, upload,
//! preview and comparison views.

pub mod config;
pub mod controllers;
pub mod errors;
pub mod input;
pub mod models;
pub mod notify;
pub mod services;

pub use config::ClientConfig;
pub use errors::ClientError;
pub use services::{ApiClient, TransformerApi};
