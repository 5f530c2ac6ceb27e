//! Gateway HTTP handlers.

pub mod auth;
pub mod health;
