//! Shared helpers for the test modules: deterministic keypairs and
//! ready-made event chains.

use crate::{
    commitment::KeyConfigurationDigest,
    crypto::{DigestAlgo, KeyPair, StandardProvider},
    event::{builder, ConfigurationTrait, DelegatingLocation, Format, InceptionData, KeyEvent, RotationData, Seal},
    identifier::{BasicIdentifier, IdentifierDerivation},
    threshold::{SigningThreshold, Weight},
};
use std::collections::BTreeSet;
use std::str::FromStr;

pub(crate) fn keypair(seed: u8) -> KeyPair {
    KeyPair::new_ed25519_from_bytes([seed; 32])
}

/// An unsigned self-addressing inception over the given keys, no witnesses,
/// no next-key commitment. JSON format.
pub(crate) fn simple_inception(keypairs: &[&KeyPair]) -> KeyEvent {
    let provider = StandardProvider::new();
    let data = InceptionData::new(
        SigningThreshold::unweighted(keypairs.len() as u32),
        keypairs.iter().map(|kp| kp.public_key().clone()).collect(),
        None,
        0,
        vec![],
        BTreeSet::new(),
    );
    builder::incept(
        data,
        IdentifierDerivation::SelfAddressing(DigestAlgo::Blake3_256),
        Format::Json,
        None,
        &provider,
    )
    .unwrap()
}

/// A signed single-key inception that pre-commits to `next`.
pub(crate) fn inception_with_next(current: &KeyPair, next: &KeyPair) -> KeyEvent {
    let provider = StandardProvider::new();
    let commitment = KeyConfigurationDigest::commit(
        &SigningThreshold::unweighted(1),
        &[next.public_key().clone()],
        DigestAlgo::Blake3_256,
        &provider,
    )
    .unwrap();
    let data = InceptionData::new(
        SigningThreshold::unweighted(1),
        vec![current.public_key().clone()],
        Some(commitment),
        0,
        vec![],
        BTreeSet::new(),
    );
    builder::incept(
        data,
        IdentifierDerivation::SelfAddressing(DigestAlgo::Blake3_256),
        Format::Json,
        None,
        &provider,
    )
    .unwrap()
    .sign(0, current)
    .unwrap()
}

/// A signed rotation on top of `prior`, rotating to `new_key` and (when
/// `next` is given) pre-committing to the key after that.
pub(crate) fn rotation_with_next(prior: &KeyEvent, new_key: &KeyPair, next: Option<&KeyPair>) -> KeyEvent {
    let provider = StandardProvider::new();
    let commitment = next.map(|next| {
        KeyConfigurationDigest::commit(
            &SigningThreshold::unweighted(1),
            &[next.public_key().clone()],
            DigestAlgo::Blake3_256,
            &provider,
        )
        .unwrap()
    });
    let data = RotationData::new(
        SigningThreshold::unweighted(1),
        vec![new_key.public_key().clone()],
        commitment,
        0,
        vec![],
        vec![],
        vec![],
    );
    builder::rotate(
        prior.identifier().clone(),
        prior.sequence_number() + 1,
        prior.coordinates(),
        data,
        Format::Json,
        &provider,
    )
    .unwrap()
    .sign(0, new_key)
    .unwrap()
}

/// One unsigned event of every type, chained plausibly, in the given
/// format. Exercises weighted thresholds, witnesses, commitments, config
/// traits, and all three seal kinds.
pub(crate) fn one_of_each_event_type(format: Format) -> Vec<KeyEvent> {
    let provider = StandardProvider::new();
    let k0 = keypair(10);
    let k1 = keypair(11);
    let w0 = keypair(12);
    let witness = BasicIdentifier::new(w0.public_key().clone());
    let weight = |s: &str| Weight::from_str(s).unwrap();

    let commitment = KeyConfigurationDigest::commit(
        &SigningThreshold::unweighted(1),
        &[k1.public_key().clone()],
        DigestAlgo::Blake3_256,
        &provider,
    )
    .unwrap();

    let icp = builder::incept(
        InceptionData::new(
            SigningThreshold::unweighted(1),
            vec![k0.public_key().clone()],
            Some(commitment.clone()),
            1,
            vec![witness.clone()],
            [ConfigurationTrait::DoNotDelegate].into_iter().collect(),
        ),
        IdentifierDerivation::SelfAddressing(DigestAlgo::Blake3_256),
        format,
        None,
        &provider,
    )
    .unwrap();

    let rot = builder::rotate(
        icp.identifier().clone(),
        1,
        icp.coordinates(),
        RotationData::new(
            SigningThreshold::unweighted(1),
            vec![k1.public_key().clone()],
            Some(commitment.clone()),
            0,
            vec![witness.clone()],
            vec![],
            vec![Seal::Digest {
                digest: digest_of(b"anchored datum"),
            }],
        ),
        format,
        &provider,
    )
    .unwrap();

    let ixn = builder::interact(
        icp.identifier().clone(),
        2,
        rot.coordinates(),
        vec![
            Seal::Coordinates(icp.coordinates()),
            Seal::MerkleRoot {
                root: digest_of(b"merkle root"),
            },
        ],
        format,
        &provider,
    )
    .unwrap();

    let dip = builder::delegated_incept(
        InceptionData::new(
            SigningThreshold::weighted(vec![vec![weight("1/2"), weight("1/2")]]).unwrap(),
            vec![k0.public_key().clone(), k1.public_key().clone()],
            Some(commitment.clone()),
            0,
            vec![],
            BTreeSet::new(),
        ),
        DelegatingLocation::new(icp.identifier().clone(), 1),
        IdentifierDerivation::SelfAddressing(DigestAlgo::Sha2_256),
        format,
        None,
        &provider,
    )
    .unwrap();

    let drt = builder::delegated_rotate(
        dip.identifier().clone(),
        1,
        dip.coordinates(),
        RotationData::new(
            SigningThreshold::weighted(vec![vec![weight("1/2"), weight("1/2")]]).unwrap(),
            vec![k0.public_key().clone(), k1.public_key().clone()],
            None,
            0,
            vec![],
            vec![],
            vec![],
        ),
        DelegatingLocation::new(icp.identifier().clone(), 2),
        format,
        &provider,
    )
    .unwrap();

    let rct = builder::receipt(icp.coordinates(), format, &provider).unwrap();
    let vrc = builder::validator_receipt(icp.coordinates(), rot.coordinates(), format, &provider).unwrap();

    vec![icp, rot, ixn, dip, drt, rct, vrc]
}

/// Blake3 digest of arbitrary test data.
pub(crate) fn digest_of(data: &[u8]) -> crate::crypto::Digest {
    use crate::crypto::CryptoProvider as _;
    StandardProvider::new().digest(DigestAlgo::Blake3_256, data).unwrap()
}
