pub mod cache;
pub mod config;
pub mod enrich;
pub mod error;
pub mod gcp;
pub mod logging;
pub mod publish;
pub mod resolver;
pub mod resource;
pub mod server;

pub use error::{EnricherError, Result};
