//! Certificate signature capability and the accepted-algorithm policy.
//!
//! Curve and RSA arithmetic live behind [`SignatureVerifier`]; this module
//! only decides which algorithm combinations are acceptable and which hash
//! to try first. [`P256Verifier`] covers the most common CSCA curve.

use crate::leaf;
use p256::ecdsa::{signature::hazmat::PrehashVerifier, Signature, VerifyingKey};
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use std::fmt;
use tracing::debug;
use zkid_types::{CertificatePublicKey, PackagedCertificate, ZkidError, ZkidResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    pub const ALL: [HashAlgorithm; 5] = [
        HashAlgorithm::Sha1,
        HashAlgorithm::Sha224,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha384,
        HashAlgorithm::Sha512,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().replace('_', "-").as_str() {
            "SHA-1" | "SHA1" => Some(HashAlgorithm::Sha1),
            "SHA-224" | "SHA224" => Some(HashAlgorithm::Sha224),
            "SHA-256" | "SHA256" => Some(HashAlgorithm::Sha256),
            "SHA-384" | "SHA384" => Some(HashAlgorithm::Sha384),
            "SHA-512" | "SHA512" => Some(HashAlgorithm::Sha512),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha1 => "SHA-1",
            HashAlgorithm::Sha224 => "SHA-224",
            HashAlgorithm::Sha256 => "SHA-256",
            HashAlgorithm::Sha384 => "SHA-384",
            HashAlgorithm::Sha512 => "SHA-512",
        }
    }

    /// Registry identifier, as hashed into certificate leaves.
    pub fn id(&self) -> u8 {
        match self {
            HashAlgorithm::Sha1 => leaf::HASH_ALGORITHM_SHA1,
            HashAlgorithm::Sha224 => leaf::HASH_ALGORITHM_SHA224,
            HashAlgorithm::Sha256 => leaf::HASH_ALGORITHM_SHA256,
            HashAlgorithm::Sha384 => leaf::HASH_ALGORITHM_SHA384,
            HashAlgorithm::Sha512 => leaf::HASH_ALGORITHM_SHA512,
        }
    }

    /// SHA-1 digests must be supplied by the caller.
    pub fn digest(&self, data: &[u8]) -> Option<Vec<u8>> {
        match self {
            HashAlgorithm::Sha1 => None,
            HashAlgorithm::Sha224 => Some(Sha224::digest(data).to_vec()),
            HashAlgorithm::Sha256 => Some(Sha256::digest(data).to_vec()),
            HashAlgorithm::Sha384 => Some(Sha384::digest(data).to_vec()),
            HashAlgorithm::Sha512 => Some(Sha512::digest(data).to_vec()),
        }
    }

    /// Hashes to try for a key of `bits`, most likely first.
    pub fn candidates_for_key_size(bits: u32) -> [HashAlgorithm; 5] {
        use HashAlgorithm::*;
        if bits <= 192 {
            [Sha1, Sha224, Sha256, Sha384, Sha512]
        } else if bits <= 256 {
            [Sha256, Sha1, Sha224, Sha384, Sha512]
        } else if bits <= 384 {
            [Sha384, Sha256, Sha512, Sha1, Sha224]
        } else {
            [Sha512, Sha384, Sha256, Sha1, Sha224]
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SignatureScheme {
    RsaPkcs1v15,
    RsaPss,
    Ecdsa,
}

impl SignatureScheme {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "RSA" | "RSA-PKCS1" | "RSASSA-PKCS1-V1_5" => Some(SignatureScheme::RsaPkcs1v15),
            "RSA-PSS" | "RSASSA-PSS" => Some(SignatureScheme::RsaPss),
            "ECDSA" | "EC" => Some(SignatureScheme::Ecdsa),
            _ => None,
        }
    }
}

/// What the verifier is told about the signature it checks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlgorithmHint {
    pub hash: HashAlgorithm,
    pub scheme: SignatureScheme,
    /// Named curve for ECDSA keys.
    pub curve: Option<String>,
}

pub trait SignatureVerifier: Send + Sync {
    /// `hash` is the digest of the signed bytes under `hint.hash`.
    fn verify(
        &self,
        hash: &[u8],
        signature: &[u8],
        public_key: &CertificatePublicKey,
        hint: &AlgorithmHint,
    ) -> ZkidResult<bool>;
}

const NIST_CURVES: [&str; 5] = ["P-192", "P-224", "P-256", "P-384", "P-521"];
const BRAINPOOL_SIZES: [u32; 6] = [192, 224, 256, 320, 384, 512];

/// Algorithm combinations accepted for document-signing chains.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlgorithmPolicy;

impl AlgorithmPolicy {
    pub fn is_accepted(&self, hash: HashAlgorithm, scheme: SignatureScheme, curve: Option<&str>) -> bool {
        debug!("Checking algorithm policy: {} {:?} {:?}", hash, scheme, curve);
        match scheme {
            SignatureScheme::RsaPkcs1v15 | SignatureScheme::RsaPss => curve.is_none(),
            SignatureScheme::Ecdsa => curve.map(is_accepted_curve).unwrap_or(false),
        }
    }

    /// Derives and checks the hint for a trusted certificate.
    pub fn hint_for(&self, cert: &PackagedCertificate) -> ZkidResult<AlgorithmHint> {
        let hash = HashAlgorithm::from_name(&cert.hash_algorithm).ok_or_else(|| {
            ZkidError::Crypto(format!("Unsupported hash algorithm: {}", cert.hash_algorithm))
        })?;
        let (scheme, curve) = match &cert.public_key {
            CertificatePublicKey::Rsa { .. } => {
                let scheme = if cert.signature_algorithm.eq_ignore_ascii_case("RSA-PSS") {
                    SignatureScheme::RsaPss
                } else {
                    SignatureScheme::RsaPkcs1v15
                };
                (scheme, None)
            }
            CertificatePublicKey::Ec { curve, .. } => (SignatureScheme::Ecdsa, Some(curve.clone())),
        };
        if !self.is_accepted(hash, scheme, curve.as_deref()) {
            return Err(ZkidError::Crypto(format!(
                "Algorithm not accepted: {} {:?} {}",
                hash,
                scheme,
                curve.as_deref().unwrap_or("")
            )));
        }
        Ok(AlgorithmHint { hash, scheme, curve })
    }
}

fn is_accepted_curve(curve: &str) -> bool {
    if NIST_CURVES.contains(&curve) {
        return true;
    }
    let Some(rest) = curve.strip_prefix("brainpoolP") else {
        return false;
    };
    let (bits, variant) = rest.split_at(rest.len().saturating_sub(2));
    matches!(variant, "r1" | "t1") && bits.parse::<u32>().map(|b| BRAINPOOL_SIZES.contains(&b)).unwrap_or(false)
}

fn key_size_bits(key: &CertificatePublicKey) -> u32 {
    match key {
        CertificatePublicKey::Rsa { key_size, modulus, .. } => {
            key_size.unwrap_or_else(|| (modulus.trim_start_matches("0x").len() as u32) * 4)
        }
        CertificatePublicKey::Ec { key_size, public_key_x, .. } => {
            key_size.unwrap_or_else(|| (public_key_x.trim_start_matches("0x").len() as u32) * 4)
        }
    }
}

/// Checks a signature issued by `issuer` over `tbs`, trying the declared
/// hash first and then the likely ones for the key size.
pub fn verify_certificate_signature(
    verifier: &dyn SignatureVerifier,
    policy: &AlgorithmPolicy,
    tbs: &[u8],
    signature: &[u8],
    issuer: &PackagedCertificate,
) -> ZkidResult<bool> {
    let declared = policy.hint_for(issuer)?;
    let mut order = vec![declared.hash];
    order.extend(
        HashAlgorithm::candidates_for_key_size(key_size_bits(&issuer.public_key))
            .into_iter()
            .filter(|h| *h != declared.hash),
    );

    for hash in order {
        let Some(digest) = hash.digest(tbs) else {
            continue;
        };
        let hint = AlgorithmHint {
            hash,
            ..declared.clone()
        };
        if verifier.verify(&digest, signature, &issuer.public_key, &hint)? {
            debug!("Certificate signature verified with {}", hash);
            return Ok(true);
        }
    }
    Ok(false)
}

// ============================================================================
// P-256 backend
// ============================================================================

/// ECDSA P-256 verifier. Other curves and RSA report `false`.
#[derive(Clone, Copy, Debug, Default)]
pub struct P256Verifier;

impl SignatureVerifier for P256Verifier {
    fn verify(
        &self,
        hash: &[u8],
        signature: &[u8],
        public_key: &CertificatePublicKey,
        hint: &AlgorithmHint,
    ) -> ZkidResult<bool> {
        let CertificatePublicKey::Ec {
            curve,
            public_key_x,
            public_key_y,
            ..
        } = public_key
        else {
            return Ok(false);
        };
        if curve != "P-256" || hint.scheme != SignatureScheme::Ecdsa {
            return Ok(false);
        }

        let mut sec1 = vec![0x04];
        sec1.extend(coordinate(public_key_x)?);
        sec1.extend(coordinate(public_key_y)?);
        let key = VerifyingKey::from_sec1_bytes(&sec1)
            .map_err(|e| ZkidError::Crypto(format!("Invalid P-256 public key: {}", e)))?;

        let signature = match Signature::from_der(signature) {
            Ok(sig) => sig,
            Err(_) => match Signature::from_slice(signature) {
                Ok(sig) => sig,
                Err(_) => return Ok(false),
            },
        };
        Ok(key.verify_prehash(hash, &signature).is_ok())
    }
}

fn coordinate(value: &str) -> ZkidResult<[u8; 32]> {
    let digits = value.trim_start_matches("0x");
    let bytes = hex::decode(format!("{:0>64}", digits))
        .map_err(|e| ZkidError::Crypto(format!("Invalid curve coordinate: {}", e)))?;
    bytes
        .try_into()
        .map_err(|_| ZkidError::Crypto("P-256 coordinate longer than 32 bytes".into()))
}
