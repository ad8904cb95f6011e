//! Core business logic - framework-agnostic account, menu, order, booking and
//! dashboard operations.
//!
//! Every function takes a database connection and returns [`crate::errors::Result`];
//! the HTTP layer in [`crate::api`] is a thin adapter over this module.

/// Password hashing, token issue/verification, login and registration
pub mod auth;
/// Table reservations
pub mod booking;
/// Menu browsing and administration
pub mod menu;
/// Order creation, status changes, cancellation and listing
pub mod order;
/// Menu item reviews and rating maintenance
pub mod review;
/// Restaurant settings singleton
pub mod settings;
/// Admin dashboard statistics
pub mod stats;
/// Image uploads
pub mod upload;
/// Profiles, address books and customer administration
pub mod user;
