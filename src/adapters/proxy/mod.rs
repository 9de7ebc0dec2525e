//! CORS Proxy Adapter
//!
//! Lets a browser page reach exchange APIs without cross-origin
//! failures, and exposes the scheduler's board over HTTP.

pub mod server;
pub mod upstream;

#[cfg(test)]
mod stub;

pub use server::{ProxyState, router, serve};
pub use upstream::{ProxyError, UpstreamRegistry};
