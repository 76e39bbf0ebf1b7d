//! Poseidon hash used for parameter commitments, certificate leaves and
//! registry Merkle trees.
//!
//! ## Parameters (BN254 Scalar Field)
//! - Field: BN254 Fr (scalar field)
//! - Width: 3 (rate=2, capacity=1)
//! - Full rounds: 8
//! - Partial rounds: 57
//! - S-box: x^5
//! - Round constants: Grain LFSR (arkworks standard)
//!
//! This is the arkworks sponge, not Poseidon2. Roots and commitments are
//! consistent within this crate but differ from what Poseidon2 circuits
//! compute. Every hash goes through [`poseidon_hash_fields`].
//!
//! ## Byte Convention
//! Words cross the API as big-endian [`Bytes32`], matching how they appear
//! in proof public inputs and on chain. Values at or above the field
//! modulus are reduced.

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::{
    poseidon::{find_poseidon_ark_and_mds, PoseidonConfig, PoseidonSponge},
    CryptographicSponge,
};
use ark_ff::{BigInteger, PrimeField};
use std::sync::OnceLock;
use zkid_types::{Bytes32, FIELD_BYTES};

static CANONICAL_CONFIG: OnceLock<PoseidonConfig<Fr>> = OnceLock::new();

/// Thread-safe singleton initialization.
pub fn canonical_config() -> &'static PoseidonConfig<Fr> {
    CANONICAL_CONFIG.get_or_init(|| {
        let rate = 2;
        let full_rounds = 8;
        let partial_rounds = 57;

        let (ark, mds) = find_poseidon_ark_and_mds::<Fr>(254, rate, full_rounds, partial_rounds, 0);

        PoseidonConfig {
            full_rounds: full_rounds as usize,
            partial_rounds: partial_rounds as usize,
            alpha: 5,
            ark,
            mds,
            rate,
            capacity: 1,
        }
    })
}

/// Absorbs every input and returns the first squeezed element.
pub fn poseidon_hash_fields(inputs: &[Fr]) -> Fr {
    let mut sponge = PoseidonSponge::new(canonical_config());
    for input in inputs {
        sponge.absorb(input);
    }
    let output: Vec<Fr> = sponge.squeeze_field_elements(1);
    output[0]
}

/// Merkle node hash.
pub fn poseidon_hash2_fields(left: Fr, right: Fr) -> Fr {
    poseidon_hash_fields(&[left, right])
}

// ============================================================================
// Word Interface (big-endian Bytes32)
// ============================================================================

pub fn fr_from_word(word: &Bytes32) -> Fr {
    Fr::from_be_bytes_mod_order(word.as_bytes())
}

pub fn fr_to_word(f: &Fr) -> Bytes32 {
    let be = f.into_bigint().to_bytes_be();
    let mut out = [0u8; FIELD_BYTES];
    out[FIELD_BYTES - be.len()..].copy_from_slice(&be);
    Bytes32(out)
}

/// Whether `word` is already a canonical field element.
pub fn is_canonical(word: &Bytes32) -> bool {
    fr_to_word(&fr_from_word(word)) == *word
}

pub fn poseidon_hash(inputs: &[Bytes32]) -> Bytes32 {
    let fields: Vec<Fr> = inputs.iter().map(fr_from_word).collect();
    fr_to_word(&poseidon_hash_fields(&fields))
}

pub fn poseidon_hash2(left: &Bytes32, right: &Bytes32) -> Bytes32 {
    fr_to_word(&poseidon_hash2_fields(fr_from_word(left), fr_from_word(right)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        let a = Fr::from(12345u64);
        let b = Fr::from(67890u64);

        let h1 = poseidon_hash2_fields(a, b);
        let h2 = poseidon_hash2_fields(a, b);
        assert_eq!(h1, h2);

        // Order matters
        let h3 = poseidon_hash2_fields(b, a);
        assert_ne!(h1, h3);
    }

    #[test]
    fn test_sponge_parameters_pinned() {
        let config = canonical_config();
        assert_eq!(config.rate, 2);
        assert_eq!(config.capacity, 1);
        assert_eq!(config.full_rounds, 8);
        assert_eq!(config.partial_rounds, 57);
        assert_eq!(config.alpha, 5);
        assert_eq!(config.ark.len(), 65);
        assert!(config.ark.iter().all(|row| row.len() == 3));
        assert_eq!(config.mds.len(), 3);
        assert!(std::ptr::eq(config, canonical_config()));
    }

    #[test]
    fn test_word_roundtrip_is_big_endian() {
        let word = Bytes32::from_u64(0xdead_beef);
        let f = fr_from_word(&word);
        assert_eq!(f, Fr::from(0xdead_beefu64));
        assert_eq!(fr_to_word(&f), word);
    }

    #[test]
    fn test_non_canonical_word_reduced() {
        let max = Bytes32([0xff; 32]);
        assert!(!is_canonical(&max));
        assert!(is_canonical(&fr_to_word(&fr_from_word(&max))));
        assert!(is_canonical(&Bytes32::from_u64(7)));
    }

    #[test]
    fn test_word_and_field_interfaces_agree() {
        let inputs = [Bytes32::from_u64(1), Bytes32::from_u64(2), Bytes32::from_u64(3)];
        let fields: Vec<Fr> = inputs.iter().map(fr_from_word).collect();
        assert_eq!(poseidon_hash(&inputs), fr_to_word(&poseidon_hash_fields(&fields)));
        assert_eq!(
            poseidon_hash2(&inputs[0], &inputs[1]),
            poseidon_hash(&inputs[..2])
        );
    }
}
