//! Token Estimation
//!
//! Approximates provider token counts without a tokenizer dependency.
//!
//! ## Strategy
//! - Count UTF-8 bytes, divide by [`BYTES_PER_TOKEN`], round up
//! - Err on the high side: providers enforce limits in real tokens, so an
//!   undercount would let an oversized request through to the backend
//!
//! Byte length rather than `chars().count()` keeps non-ASCII text safe: CJK
//! and emoji occupy several bytes and usually several real tokens.

use crate::constants::tokens::BYTES_PER_TOKEN;

/// Character-count heuristic estimator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenEstimator {
    bytes_per_token: usize,
}

impl Default for TokenEstimator {
    fn default() -> Self {
        Self {
            bytes_per_token: BYTES_PER_TOKEN,
        }
    }
}

impl TokenEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Divisor applied to the UTF-8 length of the text
    pub fn bytes_per_token(&self) -> usize {
        self.bytes_per_token
    }

    /// Estimated token count for `text`; empty text is 0 tokens
    pub fn estimate(&self, text: &str) -> usize {
        text.len().div_ceil(self.bytes_per_token)
    }
}
