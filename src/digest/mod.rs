//! Content fingerprinting for cache comparison.
//!
//! This module provides a streaming MD5 implementation used to fingerprint
//! file contents. MD5 is kept for compatibility with existing cache files and
//! external tooling that inspects the hashes; it carries no security claim
//! here, collisions are accepted as negligible for change detection.

pub mod md5;

pub use md5::{Digest, Md5};
