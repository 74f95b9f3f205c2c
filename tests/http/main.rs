//! HTTP API integration tests.
//!
//! Starts an axum server on an ephemeral port and exercises it with reqwest.

#[cfg(feature = "http")]
mod support;
#[cfg(feature = "http")]
mod auth;
#[cfg(feature = "http")]
mod media;
