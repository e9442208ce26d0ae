//! Pre-rotation key commitments.
//!
//! An establishment event may publish a digest binding a *future* signing
//! threshold and key set without revealing how they will be used. A later
//! rotation is only valid if recomputing the commitment from its declared
//! threshold and keys reproduces that digest bit for bit. That match is
//! proof the rotation was decided before the current keys could have
//! been stolen.

use crate::{
    crypto::{CryptoProvider, Digest, DigestAlgo, PublicKey},
    error::{Error, Result},
    threshold::SigningThreshold,
};
use std::fmt;
use std::ops::Deref;

/// The digest committing to a next key configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyConfigurationDigest(Digest);

impl KeyConfigurationDigest {
    /// Commit to a future threshold and key set.
    ///
    /// The threshold's canonical string is digested, then each next key's
    /// qualified form is digested and XORed in. XOR commutes, so key order
    /// does not affect the commitment; the threshold string's clause order
    /// does, which is exactly the semantics clauses need.
    pub fn commit(
        threshold: &SigningThreshold,
        next_keys: &[PublicKey],
        algo: DigestAlgo,
        provider: &dyn CryptoProvider,
    ) -> Result<Self> {
        let threshold_digest = provider.digest(algo, threshold.canonical_string().as_bytes())?;
        let mut acc: Vec<u8> = threshold_digest.as_bytes().to_vec();
        for key in next_keys {
            let key_digest = provider.digest(algo, key.qualified().as_bytes())?;
            for (acc_byte, key_byte) in acc.iter_mut().zip(key_digest.as_bytes()) {
                *acc_byte ^= key_byte;
            }
        }
        Ok(Self(Digest::from_slice(algo, &acc)?))
    }

    /// Recompute the commitment from a rotation's declared threshold and
    /// keys and compare with this one. Bit-exact equality or nothing.
    pub fn matches(
        &self,
        threshold: &SigningThreshold,
        keys: &[PublicKey],
        provider: &dyn CryptoProvider,
    ) -> Result<bool> {
        let recomputed = Self::commit(threshold, keys, self.0.algo(), provider)?;
        Ok(recomputed == *self)
    }

    pub fn qualified(&self) -> String {
        self.0.qualified()
    }
}

impl From<Digest> for KeyConfigurationDigest {
    fn from(digest: Digest) -> Self {
        Self(digest)
    }
}

impl Deref for KeyConfigurationDigest {
    type Target = Digest;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl TryFrom<&str> for KeyConfigurationDigest {
    type Error = Error;

    fn try_from(string: &str) -> std::result::Result<Self, Self::Error> {
        Ok(Self(Digest::try_from(string)?))
    }
}

impl fmt::Display for KeyConfigurationDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{KeyPair, StandardProvider};
    use crate::threshold::Weight;
    use std::str::FromStr;

    fn keys(seeds: &[u8]) -> Vec<PublicKey> {
        seeds
            .iter()
            .map(|&seed| KeyPair::new_ed25519_from_bytes([seed; 32]).public_key().clone())
            .collect()
    }

    #[test]
    fn commitment_is_deterministic() {
        let provider = StandardProvider::new();
        let threshold = SigningThreshold::unweighted(2);
        let next = keys(&[1, 2, 3]);
        let a = KeyConfigurationDigest::commit(&threshold, &next, DigestAlgo::Blake3_256, &provider).unwrap();
        let b = KeyConfigurationDigest::commit(&threshold, &next, DigestAlgo::Blake3_256, &provider).unwrap();
        assert_eq!(a, b);
        assert!(a.matches(&threshold, &next, &provider).unwrap());
    }

    #[test]
    fn key_order_does_not_matter() {
        let provider = StandardProvider::new();
        let threshold = SigningThreshold::unweighted(2);
        let forward = keys(&[1, 2, 3]);
        let mut reversed = forward.clone();
        reversed.reverse();
        let a = KeyConfigurationDigest::commit(&threshold, &forward, DigestAlgo::Blake3_256, &provider).unwrap();
        let b = KeyConfigurationDigest::commit(&threshold, &reversed, DigestAlgo::Blake3_256, &provider).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn threshold_clause_order_matters() {
        let provider = StandardProvider::new();
        let next = keys(&[1, 2, 3]);
        let w = |s: &str| Weight::from_str(s).unwrap();
        let t1 = SigningThreshold::weighted(vec![vec![w("1/2"), w("1/2")], vec![w("1")]]).unwrap();
        let t2 = SigningThreshold::weighted(vec![vec![w("1")], vec![w("1/2"), w("1/2")]]).unwrap();
        let a = KeyConfigurationDigest::commit(&t1, &next, DigestAlgo::Blake3_256, &provider).unwrap();
        let b = KeyConfigurationDigest::commit(&t2, &next, DigestAlgo::Blake3_256, &provider).unwrap();
        assert!(a != b);
    }

    #[test]
    fn changed_key_breaks_match() {
        let provider = StandardProvider::new();
        let threshold = SigningThreshold::unweighted(1);
        let committed = keys(&[1, 2]);
        let digest = KeyConfigurationDigest::commit(&threshold, &committed, DigestAlgo::Blake3_256, &provider).unwrap();
        let substituted = keys(&[1, 9]);
        assert!(!digest.matches(&threshold, &substituted, &provider).unwrap());
        let changed_threshold = SigningThreshold::unweighted(2);
        assert!(!digest.matches(&changed_threshold, &committed, &provider).unwrap());
    }

    #[test]
    fn qualified_round_trip() {
        let provider = StandardProvider::new();
        let digest =
            KeyConfigurationDigest::commit(&SigningThreshold::unweighted(1), &keys(&[4]), DigestAlgo::Sha3_256, &provider)
                .unwrap();
        let q = digest.qualified();
        let back = KeyConfigurationDigest::try_from(q.as_str()).unwrap();
        assert_eq!(digest, back);
    }
}
