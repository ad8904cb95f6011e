//! Request handlers, one module per resource.
//!
//! Handlers only extract, call into [`crate::core`] and wrap the result.

pub mod auth;
pub mod bookings;
pub mod health;
pub mod menu;
pub mod orders;
pub mod settings;
pub mod upload;
pub mod users;
