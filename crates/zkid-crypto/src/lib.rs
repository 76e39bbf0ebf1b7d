#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod commitment;
pub mod leaf;
pub mod merkle;
pub mod packing;
pub mod poseidon;
pub mod scope;
pub mod signature;
pub mod vkey;

pub use commitment::{format_bound_data, ParameterCommitmentCodec};
pub use leaf::{certificate_leaf_hash, tags_to_bits_flag, CERT_TYPE_CSCA, CERT_TYPE_DSC};
pub use merkle::{
    certificate_root, circuit_inclusion_proof, circuit_manifest_root, circuit_root, InclusionProof,
    MerkleEngine, MerkleTree,
};
pub use packing::{pack_be_bytes_into_field, pack_be_bytes_into_fields};
pub use poseidon::{canonical_config, poseidon_hash, poseidon_hash2};
pub use scope::{normalize_domain, scope_hash, service_scope_hash};
pub use signature::{
    verify_certificate_signature, AlgorithmHint, AlgorithmPolicy, HashAlgorithm, P256Verifier,
    SignatureScheme, SignatureVerifier,
};
pub use vkey::{vkey_hash, vkey_hash_base64};
