//! Domain models

pub mod auth;
pub mod settings;
pub mod task;
pub mod user;
