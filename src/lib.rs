pub mod attestation;
pub mod codelog;
pub mod config;
pub mod crypto;
pub mod error;
pub mod server;
pub mod service;
pub mod store;
