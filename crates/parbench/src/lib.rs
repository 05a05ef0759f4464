//! parbench library: application logic for the strategy comparison CLI.

pub mod app;
pub mod config;
pub mod errors;
