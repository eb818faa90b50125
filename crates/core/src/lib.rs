//! Core business logic for fairway.

pub mod services;

pub use services::*;
