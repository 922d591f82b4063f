use std::net::Ipv4Addr;

use thiserror::Error;

/// A target specification that cannot be turned into a bounded address list.
///
/// Always raised before any probe is sent, so a caller never sees partial work.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("invalid target '{input}': {reason}")]
    InvalidTarget { input: String, reason: String },

    #[error("invalid range: end {end} is before start {start}")]
    InvalidRange { start: Ipv4Addr, end: Ipv4Addr },

    #[error("invalid prefix: {prefix} > 32")]
    InvalidPrefix { prefix: u8 },

    #[error("target expands to {count} addresses, limit is {cap}")]
    TooManyAddresses { count: u64, cap: usize },

    #[error("target expands to zero addresses")]
    NoTargets,
}

impl InputError {
    pub fn invalid(input: &str, reason: impl Into<String>) -> Self {
        Self::InvalidTarget {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}
