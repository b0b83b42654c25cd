pub mod app;
pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod state;
