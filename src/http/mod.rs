pub mod assets;
pub mod cache;
pub mod error;
pub mod server;
