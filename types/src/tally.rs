//! Tally counts and the percentages derived from them.
//!
//! On-chain token counts routinely exceed 64 bits, so counts are held as
//! [`BigUint`] and all percentage arithmetic is done in big-integer space.

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use serde::{Deserialize, Serialize};

use crate::error::TypesError;

/// Aggregate vote counts for one proposal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyResult {
    #[serde(with = "decimal")]
    pub yes: BigUint,
    #[serde(with = "decimal")]
    pub no: BigUint,
    #[serde(with = "decimal")]
    pub abstain: BigUint,
    #[serde(with = "decimal")]
    pub no_with_veto: BigUint,
}

/// Whole-number share of each option, truncated toward zero.
///
/// The four values may sum to less than 100; the remainder is dropped, not
/// redistributed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotePercentages {
    pub yes: u8,
    pub no: u8,
    pub abstain: u8,
    pub no_with_veto: u8,
}

impl TallyResult {
    pub fn new(
        yes: impl Into<BigUint>,
        no: impl Into<BigUint>,
        abstain: impl Into<BigUint>,
        no_with_veto: impl Into<BigUint>,
    ) -> Self {
        Self {
            yes: yes.into(),
            no: no.into(),
            abstain: abstain.into(),
            no_with_veto: no_with_veto.into(),
        }
    }

    /// Build a tally from the decimal strings a chain's REST gateway returns.
    pub fn from_decimal_strings(
        yes: &str,
        no: &str,
        abstain: &str,
        no_with_veto: &str,
    ) -> Result<Self, TypesError> {
        Ok(Self {
            yes: parse_count("yes", yes)?,
            no: parse_count("no", no)?,
            abstain: parse_count("abstain", abstain)?,
            no_with_veto: parse_count("no_with_veto", no_with_veto)?,
        })
    }

    pub fn total(&self) -> BigUint {
        &self.yes + &self.no + &self.abstain + &self.no_with_veto
    }

    /// `floor(100 * part / total)` per option, or `None` when nothing has been cast.
    pub fn percentages(&self) -> Option<VotePercentages> {
        let total = self.total();
        if total.is_zero() {
            return None;
        }
        Some(VotePercentages {
            yes: share(&self.yes, &total),
            no: share(&self.no, &total),
            abstain: share(&self.abstain, &total),
            no_with_veto: share(&self.no_with_veto, &total),
        })
    }
}

impl VotePercentages {
    pub fn sum(&self) -> u16 {
        self.yes as u16 + self.no as u16 + self.abstain as u16 + self.no_with_veto as u16
    }
}

fn share(part: &BigUint, total: &BigUint) -> u8 {
    // part <= total, so the quotient is at most 100.
    (part * 100u32 / total).to_u8().unwrap_or(100).min(100)
}

fn parse_count(field: &'static str, value: &str) -> Result<BigUint, TypesError> {
    let invalid = || TypesError::InvalidCount {
        field,
        value: value.to_string(),
    };
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    BigUint::parse_bytes(value.as_bytes(), 10).ok_or_else(invalid)
}

/// Serde adapter writing big counts as decimal strings, matching the wire format.
mod decimal {
    use num_bigint::BigUint;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &BigUint, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_str_radix(10))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BigUint, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_count("count", &raw).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seventy_thirty_split() {
        let tally = TallyResult::new(70u32, 30u32, 0u32, 0u32);
        let pct = tally.percentages().unwrap();
        assert_eq!(
            pct,
            VotePercentages {
                yes: 70,
                no: 30,
                abstain: 0,
                no_with_veto: 0
            }
        );
    }

    #[test]
    fn empty_tally_has_no_percentages() {
        assert_eq!(TallyResult::default().percentages(), None);
    }

    #[test]
    fn thirds_truncate_below_one_hundred() {
        let tally = TallyResult::new(1u32, 1u32, 1u32, 0u32);
        let pct = tally.percentages().unwrap();
        assert_eq!(pct.yes, 33);
        assert_eq!(pct.sum(), 99);
    }

    #[test]
    fn counts_beyond_u64_are_supported() {
        // 2^80 yes vs 2^80 no
        let big = "1208925819614629174706176";
        let tally = TallyResult::from_decimal_strings(big, big, "0", "0").unwrap();
        let pct = tally.percentages().unwrap();
        assert_eq!(pct.yes, 50);
        assert_eq!(pct.no, 50);
    }

    #[test]
    fn rejects_signed_and_fractional_counts() {
        assert!(TallyResult::from_decimal_strings("-1", "0", "0", "0").is_err());
        assert!(TallyResult::from_decimal_strings("1.5", "0", "0", "0").is_err());
        let err = TallyResult::from_decimal_strings("0", "", "0", "0").unwrap_err();
        assert!(matches!(err, TypesError::InvalidCount { field: "no", .. }));
    }

    #[test]
    fn serializes_counts_as_strings() {
        let tally = TallyResult::new(5u32, 0u32, 0u32, 1u32);
        let json = serde_json::to_value(&tally).unwrap();
        assert_eq!(json["yes"], "5");
        assert_eq!(json["no_with_veto"], "1");
        let back: TallyResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, tally);
    }
}
