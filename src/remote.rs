/// Hosted notes table module.
///
/// This module provides a synchronous HTTP client for the remote notes table,
/// the `RemoteSource` seam the facade talks through, and its error type.
mod client;

pub use client::{DEFAULT_TABLE, RemoteClient, RemoteClientBuilder, RemoteError, RemoteSource};
