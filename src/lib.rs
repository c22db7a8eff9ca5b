pub mod comms;
pub mod extract;
pub mod gateway;
pub mod session;
pub mod utils;

// Crate version exposed for runtime queries
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
