//! Client library for front ends talking to the API.
//!
//! The stores mirror what a UI needs: a persisted session and cart, a toast
//! queue for failures, and an order list that polls the server. Persistence
//! goes through the [`storage::Storage`] trait so any key/value backend works.

pub mod cart;
pub mod http;
pub mod orders;
pub mod session;
pub mod storage;
pub mod toast;
