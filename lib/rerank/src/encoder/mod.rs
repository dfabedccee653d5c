//! Text encoder implementations
//!
//! - [`HashingEncoder`] - deterministic, local, no model weights
//! - [`HttpEncoder`] - pretrained model hosted by an embedding sidecar
//! - [`SerializedEncoder`] - adapter for encoders needing `&mut self`

mod hashing;
mod http;
mod serialized;

pub use hashing::{HashingEncoder, DEFAULT_HASHING_DIM};
pub use http::{HttpEncoder, DEFAULT_HTTP_TIMEOUT_SECS};
pub use serialized::{EncoderMut, SerializedEncoder};
