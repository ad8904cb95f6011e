/// Server settings read from the environment
pub mod app;

/// Database configuration and connection management
pub mod database;

/// Settings defaults and menu seed loading from seed.toml
pub mod seed;
