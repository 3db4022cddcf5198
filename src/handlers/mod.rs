//! HTTP handlers

pub mod analytics;
pub mod auth;
pub mod health;
pub mod settings;
pub mod task;
pub mod user;
