//! Signing thresholds: how many (or which weighted combination of) key
//! indices must have signed for an event to carry authority.
//!
//! Weighted arithmetic is exact rational arithmetic over integers; floating
//! point near the `sum == 1` boundary is precisely the bug class this
//! module exists to rule out.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// A positive rational weight: numerator over an optional denominator.
/// `Weight::new(1, None)` is the weight 1; `Weight::new(1, Some(2))` is 1/2.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Weight {
    numerator: u64,
    denominator: Option<u64>,
}

impl Weight {
    pub fn new(numerator: u64, denominator: Option<u64>) -> Result<Self> {
        if numerator == 0 || denominator == Some(0) {
            Err(Error::WeightZero)?;
        }
        Ok(Self { numerator, denominator })
    }

    pub fn numerator(&self) -> u64 {
        self.numerator
    }

    pub fn denominator(&self) -> Option<u64> {
        self.denominator
    }

    fn fraction(&self) -> (u128, u128) {
        (self.numerator as u128, self.denominator.unwrap_or(1) as u128)
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.denominator {
            Some(den) => write!(f, "{}/{}", self.numerator, den),
            None => write!(f, "{}", self.numerator),
        }
    }
}

impl FromStr for Weight {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let malformed = || Error::WeightMalformed(s.into());
        match s.split_once('/') {
            Some((num, den)) => Weight::new(
                num.parse().map_err(|_| malformed())?,
                Some(den.parse().map_err(|_| malformed())?),
            ),
            None => Weight::new(s.parse().map_err(|_| malformed())?, None),
        }
    }
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Sum a list of fractions exactly and report whether the sum reaches one.
fn sum_reaches_one<'a>(weights: impl Iterator<Item = &'a Weight>) -> bool {
    // accumulate as num/den, reducing by gcd each step to keep the
    // intermediates small
    let (mut num, mut den) = (0u128, 1u128);
    for weight in weights {
        let (n, d) = weight.fraction();
        num = num * d + n * den;
        den *= d;
        let g = gcd(num, den);
        if g > 1 {
            num /= g;
            den /= g;
        }
    }
    num >= den
}

/// The signing threshold attached to an establishment event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigningThreshold {
    /// At least `threshold` of the keys must sign.
    Unweighted {
        threshold: u32,
    },
    /// Keys map positionally onto the flattened clause list; every clause's
    /// satisfied weights must sum to at least one.
    Weighted {
        clauses: Vec<Vec<Weight>>,
    },
}

impl SigningThreshold {
    pub fn unweighted(threshold: u32) -> Self {
        Self::Unweighted { threshold }
    }

    /// Build a weighted threshold. Rejected eagerly if any clause is empty
    /// or its *full* weight sum is below one, since such a clause could
    /// never be satisfied no matter who signs.
    pub fn weighted(clauses: Vec<Vec<Weight>>) -> Result<Self> {
        if clauses.is_empty() {
            Err(Error::ThresholdUnsatisfiable)?;
        }
        for clause in &clauses {
            if clause.is_empty() || !sum_reaches_one(clause.iter()) {
                Err(Error::ThresholdUnsatisfiable)?;
            }
        }
        Ok(Self::Weighted { clauses })
    }

    /// Decide whether the given set of satisfied key indices meets this
    /// threshold. Duplicate indices count once.
    pub fn is_met(&self, satisfied: &[usize]) -> bool {
        let mut indices: Vec<usize> = satisfied.to_vec();
        indices.sort_unstable();
        indices.dedup();
        match self {
            Self::Unweighted { threshold } => indices.len() >= *threshold as usize,
            Self::Weighted { clauses } => {
                // flattened index position determines clause membership
                let mut offset = 0usize;
                for clause in clauses {
                    let in_clause = indices
                        .iter()
                        .filter(|&&idx| idx >= offset && idx < offset + clause.len())
                        .map(|&idx| &clause[idx - offset]);
                    if !sum_reaches_one(in_clause) {
                        return false;
                    }
                    offset += clause.len();
                }
                true
            }
        }
    }

    /// Whether this threshold is shaped for a key list of `count` entries:
    /// an unweighted value must fall in `[1, count]`, a weighted clause set
    /// must name exactly one weight per key.
    pub fn fits_key_count(&self, count: usize) -> bool {
        match self {
            Self::Unweighted { threshold } => *threshold >= 1 && *threshold as usize <= count,
            Self::Weighted { clauses } => clauses.iter().map(|c| c.len()).sum::<usize>() == count,
        }
    }

    /// Canonical string form, used by the next-key commitment. Stable and
    /// order-preserving: `,` joins weights within a clause, `&` joins
    /// clauses, and an unweighted count renders as lower-hex.
    pub fn canonical_string(&self) -> String {
        match self {
            Self::Unweighted { threshold } => format!("{:x}", threshold),
            Self::Weighted { clauses } => clauses
                .iter()
                .map(|clause| {
                    clause
                        .iter()
                        .map(|w| w.to_string())
                        .collect::<Vec<_>>()
                        .join(",")
                })
                .collect::<Vec<_>>()
                .join("&"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(s: &str) -> Weight {
        Weight::from_str(s).unwrap()
    }

    #[test]
    fn weight_construction_bounds() {
        assert_eq!(Weight::new(0, None).err(), Some(Error::WeightZero));
        assert_eq!(Weight::new(1, Some(0)).err(), Some(Error::WeightZero));
        assert!(Weight::new(1, Some(2)).is_ok());
    }

    #[test]
    fn weight_parse_display() {
        assert_eq!(w("1/2").to_string(), "1/2");
        assert_eq!(w("3").to_string(), "3");
        assert_eq!(Weight::from_str("x/2").err(), Some(Error::WeightMalformed("x/2".into())));
        assert_eq!(Weight::from_str("").err(), Some(Error::WeightMalformed("".into())));
    }

    #[test]
    fn unweighted_is_count_based() {
        let t = SigningThreshold::unweighted(2);
        assert!(!t.is_met(&[]));
        assert!(!t.is_met(&[0]));
        assert!(t.is_met(&[0, 1]));
        assert!(t.is_met(&[0, 1, 2]));
        // duplicates count once
        assert!(!t.is_met(&[1, 1, 1]));
    }

    #[test]
    fn weighted_single_clause_scenario() {
        // clause [1/2, 1/2, 1/4, 1/4, 1/4]
        let t = SigningThreshold::weighted(vec![vec![w("1/2"), w("1/2"), w("1/4"), w("1/4"), w("1/4")]]).unwrap();
        // 1/2 + 1/4 + 1/4 = 1
        assert!(t.is_met(&[0, 2, 4]));
        // 1/2 + 1/4 = 3/4
        assert!(!t.is_met(&[0, 2]));
        assert!(t.is_met(&[0, 1]));
        assert!(!t.is_met(&[2, 3, 4]));
    }

    #[test]
    fn weighted_multi_clause_all_must_pass() {
        let t = SigningThreshold::weighted(vec![
            vec![w("1/2"), w("1/2")],
            vec![w("1")],
        ])
        .unwrap();
        // second clause holds flattened index 2
        assert!(t.is_met(&[0, 1, 2]));
        assert!(!t.is_met(&[0, 1]));
        assert!(!t.is_met(&[2]));
    }

    #[test]
    fn weighted_monotonic_under_removal() {
        let t = SigningThreshold::weighted(vec![vec![w("1/2"), w("1/2"), w("1/4"), w("1/4"), w("1/4")]]).unwrap();
        let full = vec![0usize, 1, 2, 3, 4];
        assert!(t.is_met(&full));
        // removing a satisfied index can only turn met into unmet, never the
        // reverse: every subset of an unmet set stays unmet
        for skip in 0..full.len() {
            let reduced: Vec<usize> = full.iter().copied().filter(|&i| i != skip).collect();
            if !t.is_met(&reduced) {
                for skip2 in 0..reduced.len() {
                    let further: Vec<usize> = reduced.iter().copied().filter(|&i| i != reduced[skip2]).collect();
                    assert!(!t.is_met(&further));
                }
            }
        }
    }

    #[test]
    fn unsatisfiable_clause_rejected_eagerly() {
        let res = SigningThreshold::weighted(vec![vec![w("1/4"), w("1/4")]]);
        assert_eq!(res.err(), Some(Error::ThresholdUnsatisfiable));
        let res = SigningThreshold::weighted(vec![]);
        assert_eq!(res.err(), Some(Error::ThresholdUnsatisfiable));
        let res = SigningThreshold::weighted(vec![vec![w("1")], vec![]]);
        assert_eq!(res.err(), Some(Error::ThresholdUnsatisfiable));
    }

    #[test]
    fn fits_key_count() {
        assert!(SigningThreshold::unweighted(1).fits_key_count(1));
        assert!(SigningThreshold::unweighted(3).fits_key_count(3));
        assert!(!SigningThreshold::unweighted(4).fits_key_count(3));
        assert!(!SigningThreshold::unweighted(0).fits_key_count(3));
        let t = SigningThreshold::weighted(vec![vec![w("1/2"), w("1/2")], vec![w("1")]]).unwrap();
        assert!(t.fits_key_count(3));
        assert!(!t.fits_key_count(2));
    }

    #[test]
    fn canonical_string_is_stable() {
        assert_eq!(SigningThreshold::unweighted(2).canonical_string(), "2");
        assert_eq!(SigningThreshold::unweighted(26).canonical_string(), "1a");
        let t = SigningThreshold::weighted(vec![
            vec![w("1/2"), w("1/2"), w("1/4"), w("1/4"), w("1/4")],
            vec![w("1")],
        ])
        .unwrap();
        assert_eq!(t.canonical_string(), "1/2,1/2,1/4,1/4,1/4&1");
    }

    #[test]
    fn exact_arithmetic_at_the_boundary() {
        // 1/3 + 1/3 + 1/3 must be exactly one, which f64 gets wrong
        let t = SigningThreshold::weighted(vec![vec![w("1/3"), w("1/3"), w("1/3")]]).unwrap();
        assert!(t.is_met(&[0, 1, 2]));
        assert!(!t.is_met(&[0, 1]));
    }
}
