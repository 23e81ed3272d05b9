//! HTTP acquisition for the API-backed providers.

pub mod http_client;
