//! Thin authenticated access to Google Cloud REST APIs

mod auth;
mod client;

pub use auth::{
    AdcTokenSource, BILLING_READ_ONLY_SCOPE, CLOUD_PLATFORM_READ_ONLY_SCOPE, DATASTORE_SCOPE,
    PUBSUB_SCOPE, StaticTokenSource, TokenSource,
};
pub use client::GcpClient;
