//! Account address bound to a chain.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A bech32 account address as returned by the signer (e.g. `cosmos1…`).
///
/// The core never decodes it; it is only compared and forwarded.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human-readable prefix (the part before the bech32 separator `1`).
    pub fn hrp(&self) -> Option<&str> {
        self.0.rsplit_once('1').map(|(hrp, _)| hrp).filter(|h| !h.is_empty())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hrp_is_text_before_last_separator() {
        let addr = Address::new("osmo1qyqszqgpqyqszqgpqyqszqgpqyqszqgp");
        assert_eq!(addr.hrp(), Some("osmo"));
    }

    #[test]
    fn hrp_missing_without_separator() {
        assert_eq!(Address::new("nonsense").hrp(), None);
    }
}
