pub mod api;
pub mod blob_factory;
pub mod config;
pub mod error;
pub mod seed;
pub mod state_factory;
pub mod templates;
pub mod views;
