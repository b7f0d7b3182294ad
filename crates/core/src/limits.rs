//! Decode limits
//!
//! This module defines configurable size limits enforced by the codec decode
//! paths. Violations are reported as `CorruptData`, since a hostile or
//! damaged input is indistinguishable from a legitimate one that large.
//!
//! ## Contract
//!
//! Defaults are frozen; custom limits can be supplied per decode call through
//! the `*_with` codec entry points.

/// Size limits enforced while decoding
#[derive(Debug, Clone)]
pub struct DecodeLimits {
    /// Maximum nesting depth of messages and lists (default: 128)
    pub max_nesting_depth: usize,

    /// Maximum declared length of a single length-delimited payload
    /// (default: 32MB)
    pub max_payload_bytes: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        DecodeLimits {
            max_nesting_depth: 128,
            max_payload_bytes: 32 * 1024 * 1024, // 32MB
        }
    }
}

impl DecodeLimits {
    /// Create limits with small values for testing
    ///
    /// Useful for unit tests that exercise limit enforcement without
    /// building extremely large or deep inputs.
    pub fn with_small_limits() -> Self {
        DecodeLimits {
            max_nesting_depth: 4,
            max_payload_bytes: 64,
        }
    }
}
