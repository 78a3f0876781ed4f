//! Adapters at the edges of the crate: the backend HTTP client and CSV output.

pub mod csv;
pub mod http;
