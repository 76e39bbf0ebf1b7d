//! Certificate registry leaves.
//!
//! A leaf commits to the certificate's tags, type, country and public key
//! (version 0), plus its expiry and fingerprint (version 1).

use crate::packing::{be_bytes, pack_be_bytes_into_fields, MAX_FIELD_BYTES};
use crate::poseidon::poseidon_hash;
use zkid_types::{Bytes32, CertificatePublicKey, PackagedCertificate, ZkidError, ZkidResult, FIELD_BYTES};

pub const CERT_TYPE_CSCA: u8 = 1;
pub const CERT_TYPE_DSC: u8 = 2;

pub const HASH_ALGORITHM_SHA1: u8 = 1;
pub const HASH_ALGORITHM_SHA224: u8 = 2;
pub const HASH_ALGORITHM_SHA256: u8 = 3;
pub const HASH_ALGORITHM_SHA384: u8 = 4;
pub const HASH_ALGORITHM_SHA512: u8 = 5;

/// Bits used per tag limb so each limb stays below the field modulus.
pub const TAG_BITS_PER_LIMB: usize = 253;
pub const TAG_LIMBS: usize = 3;

pub fn hash_algorithm_id(name: &str) -> ZkidResult<u8> {
    match name {
        "SHA-1" => Ok(HASH_ALGORITHM_SHA1),
        "SHA-224" => Ok(HASH_ALGORITHM_SHA224),
        "SHA-256" => Ok(HASH_ALGORITHM_SHA256),
        "SHA-384" => Ok(HASH_ALGORITHM_SHA384),
        "SHA-512" => Ok(HASH_ALGORITHM_SHA512),
        other => Err(ZkidError::InvalidInput(format!("Unsupported hash algorithm: {}", other))),
    }
}

fn tag_bit_index(tag: &str) -> ZkidResult<usize> {
    let bytes = tag.as_bytes();
    if bytes.len() != 2 || !bytes.iter().all(|b| b.is_ascii_uppercase()) {
        return Err(ZkidError::InvalidInput(format!("Invalid certificate tag: {}", tag)));
    }
    Ok((bytes[0] - b'A') as usize * 26 + (bytes[1] - b'A') as usize)
}

/// Maps two-letter tags onto a bit flag split across three limbs.
pub fn tags_to_bits_flag<S: AsRef<str>>(tags: &[S]) -> ZkidResult<[Bytes32; TAG_LIMBS]> {
    let mut limbs = [[0u8; FIELD_BYTES]; TAG_LIMBS];
    for tag in tags {
        let bit = tag_bit_index(tag.as_ref())?;
        let limb = bit / TAG_BITS_PER_LIMB;
        let offset = bit % TAG_BITS_PER_LIMB;
        limbs[limb][FIELD_BYTES - 1 - offset / 8] |= 1 << (offset % 8);
    }
    Ok(limbs.map(Bytes32))
}

pub fn bits_flag_to_tags(limbs: &[Bytes32; TAG_LIMBS]) -> Vec<String> {
    let mut tags = Vec::new();
    for (limb_index, limb) in limbs.iter().enumerate() {
        for offset in 0..TAG_BITS_PER_LIMB {
            let byte = limb.as_bytes()[FIELD_BYTES - 1 - offset / 8];
            if byte & (1 << (offset % 8)) == 0 {
                continue;
            }
            let bit = limb_index * TAG_BITS_PER_LIMB + offset;
            if bit >= 26 * 26 {
                continue;
            }
            let first = (b'A' + (bit / 26) as u8) as char;
            let second = (b'A' + (bit % 26) as u8) as char;
            tags.push(format!("{}{}", first, second));
        }
    }
    tags
}

fn decode_hex(value: &str) -> ZkidResult<Vec<u8>> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    let digits = if digits.len() % 2 == 1 {
        format!("0{}", digits)
    } else {
        digits.to_string()
    };
    hex::decode(digits).map_err(|e| ZkidError::InvalidInput(format!("Invalid hex value: {}", e)))
}

/// RSA keys contribute the modulus, EC keys `x ++ y`.
pub fn public_key_bytes(key: &CertificatePublicKey) -> ZkidResult<Vec<u8>> {
    match key {
        CertificatePublicKey::Rsa { modulus, .. } => decode_hex(modulus),
        CertificatePublicKey::Ec {
            public_key_x,
            public_key_y,
            ..
        } => {
            let mut bytes = decode_hex(public_key_x)?;
            bytes.extend(decode_hex(public_key_y)?);
            Ok(bytes)
        }
    }
}

pub fn certificate_leaf_hash(cert: &PackagedCertificate, version: u8) -> ZkidResult<Bytes32> {
    certificate_leaf_hash_with_type(cert, version, CERT_TYPE_CSCA)
}

pub fn certificate_leaf_hash_with_type(cert: &PackagedCertificate, version: u8, cert_type: u8) -> ZkidResult<Bytes32> {
    let country = cert.country.as_bytes();
    if country.len() != 3 {
        return Err(ZkidError::InvalidInput(format!(
            "Country code must be 3 characters: {}",
            cert.country
        )));
    }

    let tags = match &cert.tags {
        Some(tags) => tags_to_bits_flag(tags)?,
        None => [Bytes32::zero(); TAG_LIMBS],
    };
    let key = pack_be_bytes_into_fields(&public_key_bytes(&cert.public_key)?, MAX_FIELD_BYTES);

    let mut header = vec![cert_type, country[0], country[1], country[2]];
    let mut inputs: Vec<Bytes32> = tags.to_vec();

    match version {
        0 => {
            inputs.push(pack_header(&header)?);
        }
        1 => {
            let fingerprint = cert
                .fingerprint
                .ok_or_else(|| ZkidError::InvalidInput("Certificate fingerprint required".into()))?;
            let not_after = u32::try_from(cert.validity.not_after).map_err(|_| {
                ZkidError::InvalidInput(format!("Certificate expiry out of range: {}", cert.validity.not_after))
            })?;
            header.extend(be_bytes(not_after as u64, 4));
            inputs.push(pack_header(&header)?);
            inputs.push(fingerprint);
        }
        other => {
            return Err(ZkidError::InvalidInput(format!(
                "Unsupported packaged certificates version: {}",
                other
            )))
        }
    }

    inputs.extend(key);
    Ok(poseidon_hash(&inputs))
}

fn pack_header(header: &[u8]) -> ZkidResult<Bytes32> {
    pack_be_bytes_into_fields(header, MAX_FIELD_BYTES)
        .first()
        .copied()
        .ok_or_else(|| ZkidError::Internal("Empty certificate header".into()))
}
