//! Fetch worker: API transport, envelope decoding, and the bounded pool

pub mod decode;
pub mod http;
pub mod runner;

pub use decode::{DecodeError, Envelope, classify, decode};
pub use http::{ExtractClient, HttpConfig, TransportError};
pub use runner::{FetchError, FetchFailure, FetchOutcome, FetchPool, FetchSummary, fetch_one};
