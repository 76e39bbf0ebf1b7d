//! Parameter commitments: the value a claim proof exposes to bind the
//! public parameters it was evaluated against.
//!
//! Each claim kind has two encodings:
//! - standard: `poseidon([tag, LEN, ...payload fields])`
//! - EVM: `sha256([tag] ++ be16(LEN) ++ payload bytes)`, first 31 bytes as
//!   a field element
//!
//! `LEN` is the per-kind payload length header from [`ClaimKind`].

use crate::packing::{be_bytes, minimal_be_bytes, pack_be_bytes_into_field, MAX_FIELD_BYTES};
use crate::poseidon::poseidon_hash;
use sha2::{Digest, Sha256};
use tracing::debug;
use zkid_types::{
    AgeCommittedInputs, BoundData, Bytes32, ClaimKind, CommittedEntry, CommittedInput,
    CountryCommittedInputs, DateCommittedInputs, DiscloseCommittedInputs,
    FacematchCommittedInputs, SanctionsCommittedInputs, ZkidError, ZkidResult,
    BIND_DATA_MAX_LENGTH, COUNTRY_LIST_MAX_ENTRIES, DISCLOSED_BYTES_LENGTH,
    SECONDS_BETWEEN_1900_AND_1970,
};

const BOUND_USER_ADDRESS: u8 = 1;
const BOUND_CHAIN_ID: u8 = 2;
const BOUND_CUSTOM_DATA: u8 = 3;

/// Stateless encoder for both commitment variants.
#[derive(Clone, Copy, Debug, Default)]
pub struct ParameterCommitmentCodec;

impl ParameterCommitmentCodec {
    pub fn new() -> Self {
        Self
    }

    /// Commitment for a committed-inputs entry, picking the variant from `entry.evm`.
    pub fn commit(&self, entry: &CommittedEntry) -> ZkidResult<Bytes32> {
        self.compute(entry.kind, &entry.input, entry.evm)
    }

    pub fn compute(&self, kind: ClaimKind, input: &CommittedInput, evm: bool) -> ZkidResult<Bytes32> {
        let commitment = if evm {
            self.evm(kind, input)?
        } else {
            self.standard(kind, input)?
        };
        debug!("Parameter commitment {}{}: {}", kind, if evm { "_evm" } else { "" }, commitment);
        Ok(commitment)
    }

    pub fn standard(&self, kind: ClaimKind, input: &CommittedInput) -> ZkidResult<Bytes32> {
        let mut fields = vec![
            Bytes32::from_u64(kind.tag() as u64),
            Bytes32::from_u64(kind.standard_length() as u64),
        ];
        match (kind, input) {
            (ClaimKind::Disclose, CommittedInput::Disclose(d)) => {
                check_disclose(d)?;
                fields.extend(byte_fields(&d.disclose_mask));
                fields.extend(byte_fields(&d.disclosed_bytes));
            }
            (ClaimKind::Age, CommittedInput::Age(a)) => {
                fields.push(timestamp_word(a.current_date)?);
                fields.push(Bytes32::from_u64(a.min_age as u64));
                fields.push(Bytes32::from_u64(a.max_age as u64));
            }
            (ClaimKind::Birthdate | ClaimKind::ExpiryDate, CommittedInput::Date(d)) => {
                let (min, max) = date_bounds(kind, d);
                fields.push(timestamp_word(d.current_date)?);
                fields.push(timestamp_word(min)?);
                fields.push(timestamp_word(max)?);
            }
            (k, CommittedInput::Country(c)) if k.is_country_check() => {
                for code in padded_country_codes(c)? {
                    fields.push(Bytes32::from_be_slice(&code)?);
                }
            }
            (ClaimKind::Bind, CommittedInput::Bind(b)) => {
                fields.extend(byte_fields(&padded_bound_data(&b.data)?));
            }
            (ClaimKind::SanctionsExclusion, CommittedInput::Sanctions(s)) => {
                fields.push(s.root_hash);
                fields.push(Bytes32::from_u64(s.is_strict as u64));
            }
            (ClaimKind::Facematch, CommittedInput::Facematch(f)) => {
                fields.push(f.root_key_leaf);
                fields.push(Bytes32::from_u64(f.environment.code() as u64));
                fields.push(f.app_id_hash);
                fields.push(f.integrity_pubkey_hash);
                fields.push(Bytes32::from_u64(f.mode.code() as u64));
            }
            _ => return Err(mismatch(kind)),
        }
        Ok(poseidon_hash(&fields))
    }

    pub fn evm(&self, kind: ClaimKind, input: &CommittedInput) -> ZkidResult<Bytes32> {
        let mut bytes = vec![kind.tag()];
        bytes.extend(be_bytes(kind.evm_length() as u64, 2));
        match (kind, input) {
            (ClaimKind::Disclose, CommittedInput::Disclose(d)) => {
                check_disclose(d)?;
                bytes.extend_from_slice(&d.disclose_mask);
                bytes.extend_from_slice(&d.disclosed_bytes);
            }
            (ClaimKind::Age, CommittedInput::Age(a)) => {
                bytes.extend(timestamp_bytes(a.current_date)?);
                bytes.push(a.min_age);
                bytes.push(a.max_age);
            }
            (ClaimKind::Birthdate | ClaimKind::ExpiryDate, CommittedInput::Date(d)) => {
                let (min, max) = date_bounds(kind, d);
                bytes.extend(timestamp_bytes(d.current_date)?);
                bytes.extend(timestamp_bytes(min)?);
                bytes.extend(timestamp_bytes(max)?);
            }
            (k, CommittedInput::Country(c)) if k.is_country_check() => {
                for code in padded_country_codes(c)? {
                    bytes.extend_from_slice(&code);
                }
            }
            (ClaimKind::Bind, CommittedInput::Bind(b)) => {
                bytes.extend(padded_bound_data(&b.data)?);
            }
            (ClaimKind::SanctionsExclusion, CommittedInput::Sanctions(s)) => {
                bytes.extend_from_slice(s.root_hash.as_bytes());
                bytes.push(s.is_strict as u8);
            }
            (ClaimKind::Facematch, CommittedInput::Facematch(f)) => {
                bytes.extend_from_slice(f.root_key_leaf.as_bytes());
                bytes.push(f.environment.code());
                bytes.extend_from_slice(f.app_id_hash.as_bytes());
                bytes.extend_from_slice(f.integrity_pubkey_hash.as_bytes());
                bytes.push(f.mode.code());
            }
            _ => return Err(mismatch(kind)),
        }
        let digest = Sha256::digest(&bytes);
        pack_be_bytes_into_field(&digest, MAX_FIELD_BYTES)
    }
}

// ============================================================================
// Convenience constructors
// ============================================================================

pub fn age_commitment(inputs: &AgeCommittedInputs, evm: bool) -> ZkidResult<Bytes32> {
    ParameterCommitmentCodec.compute(ClaimKind::Age, &CommittedInput::Age(inputs.clone()), evm)
}

pub fn date_commitment(kind: ClaimKind, inputs: &DateCommittedInputs, evm: bool) -> ZkidResult<Bytes32> {
    ParameterCommitmentCodec.compute(kind, &CommittedInput::Date(inputs.clone()), evm)
}

pub fn country_commitment(kind: ClaimKind, inputs: &CountryCommittedInputs, evm: bool) -> ZkidResult<Bytes32> {
    ParameterCommitmentCodec.compute(kind, &CommittedInput::Country(inputs.clone()), evm)
}

pub fn sanctions_commitment(inputs: &SanctionsCommittedInputs, evm: bool) -> ZkidResult<Bytes32> {
    ParameterCommitmentCodec.compute(
        ClaimKind::SanctionsExclusion,
        &CommittedInput::Sanctions(inputs.clone()),
        evm,
    )
}

pub fn facematch_commitment(inputs: &FacematchCommittedInputs, evm: bool) -> ZkidResult<Bytes32> {
    ParameterCommitmentCodec.compute(ClaimKind::Facematch, &CommittedInput::Facematch(inputs.clone()), evm)
}

// ============================================================================
// Bound data
// ============================================================================

/// Tag-length encoding of the data a bind proof commits to.
pub fn format_bound_data(data: &BoundData) -> ZkidResult<Vec<u8>> {
    let mut out = Vec::new();

    if let Some(address) = data.user_address.as_deref().filter(|a| !a.is_empty()) {
        let digits = address.strip_prefix("0x").unwrap_or(address);
        let digits = if digits.len() % 2 == 1 {
            format!("0{}", digits)
        } else {
            digits.to_string()
        };
        let bytes = hex::decode(&digits)
            .map_err(|e| ZkidError::InvalidInput(format!("Invalid bound user address: {}", e)))?;
        out.push(BOUND_USER_ADDRESS);
        out.extend(be_bytes(bytes.len() as u64, 2));
        out.extend(bytes);
    }

    if let Some(chain) = data.chain {
        let id = minimal_be_bytes(chain.chain_id());
        out.push(BOUND_CHAIN_ID);
        out.push(0);
        out.push(id.len() as u8);
        out.extend(id);
    }

    if let Some(custom) = data.custom_data.as_deref().filter(|c| !c.is_empty()) {
        let bytes = custom.as_bytes();
        out.push(BOUND_CUSTOM_DATA);
        out.extend(be_bytes(bytes.len() as u64, 2));
        out.extend_from_slice(bytes);
    }

    if out.len() > BIND_DATA_MAX_LENGTH {
        return Err(ZkidError::InvalidInput(format!(
            "Bound data is too long: {} > {}",
            out.len(),
            BIND_DATA_MAX_LENGTH
        )));
    }
    Ok(out)
}

fn padded_bound_data(data: &BoundData) -> ZkidResult<Vec<u8>> {
    let mut bytes = format_bound_data(data)?;
    bytes.resize(BIND_DATA_MAX_LENGTH, 0);
    Ok(bytes)
}

// ============================================================================
// Helpers
// ============================================================================

fn mismatch(kind: ClaimKind) -> ZkidError {
    ZkidError::InvalidInput(format!("Committed inputs do not match claim kind {}", kind))
}

fn byte_fields(bytes: &[u8]) -> impl Iterator<Item = Bytes32> + '_ {
    bytes.iter().map(|b| Bytes32::from_u64(*b as u64))
}

fn check_disclose(d: &DiscloseCommittedInputs) -> ZkidResult<()> {
    if d.disclose_mask.len() != DISCLOSED_BYTES_LENGTH || d.disclosed_bytes.len() != DISCLOSED_BYTES_LENGTH {
        return Err(ZkidError::InvalidInput(format!(
            "Disclose mask and bytes must be {} bytes, got {} and {}",
            DISCLOSED_BYTES_LENGTH,
            d.disclose_mask.len(),
            d.disclosed_bytes.len()
        )));
    }
    Ok(())
}

/// Birthdate bounds are offset to a 1900 epoch inside the circuit.
fn date_bounds(kind: ClaimKind, d: &DateCommittedInputs) -> (i64, i64) {
    let shift = |v: i64| {
        if kind == ClaimKind::Birthdate && v != 0 {
            v + SECONDS_BETWEEN_1900_AND_1970
        } else {
            v
        }
    };
    (shift(d.min_date), shift(d.max_date))
}

fn timestamp_u64(value: i64) -> ZkidResult<u64> {
    u64::try_from(value).map_err(|_| ZkidError::InvalidInput(format!("Negative timestamp: {}", value)))
}

fn timestamp_word(value: i64) -> ZkidResult<Bytes32> {
    Ok(Bytes32::from_u64(timestamp_u64(value)?))
}

fn timestamp_bytes(value: i64) -> ZkidResult<Vec<u8>> {
    Ok(be_bytes(timestamp_u64(value)?, 8))
}

fn padded_country_codes(c: &CountryCommittedInputs) -> ZkidResult<Vec<[u8; 3]>> {
    if c.countries.len() > COUNTRY_LIST_MAX_ENTRIES {
        return Err(ZkidError::InvalidInput(format!(
            "Country list has {} entries, at most {} allowed",
            c.countries.len(),
            COUNTRY_LIST_MAX_ENTRIES
        )));
    }
    let mut codes = Vec::with_capacity(COUNTRY_LIST_MAX_ENTRIES);
    for country in &c.countries {
        let bytes = country.as_bytes();
        if bytes.len() != 3 {
            return Err(ZkidError::InvalidInput(format!("Invalid country code: {}", country)));
        }
        codes.push([bytes[0], bytes[1], bytes[2]]);
    }
    codes.resize(COUNTRY_LIST_MAX_ENTRIES, [0u8; 3]);
    Ok(codes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use zkid_types::{FacematchEnvironment, FacematchMode, SupportedChain};

    fn age(date: i64, min: u8, max: u8) -> CommittedInput {
        CommittedInput::Age(AgeCommittedInputs {
            min_age: min,
            max_age: max,
            current_date: date,
        })
    }

    fn date(min: i64, max: i64, current: i64) -> CommittedInput {
        CommittedInput::Date(DateCommittedInputs {
            min_date: min,
            max_date: max,
            current_date: current,
        })
    }

    fn facematch() -> FacematchCommittedInputs {
        FacematchCommittedInputs {
            root_key_leaf: Bytes32::from_u64(1),
            environment: FacematchEnvironment::Production,
            app_id_hash: Bytes32::from_u64(2),
            integrity_pubkey_hash: Bytes32::from_u64(3),
            mode: FacematchMode::Regular,
        }
    }

    #[test]
    fn test_age_evm_vector() {
        let codec = ParameterCommitmentCodec::new();
        let c = codec.evm(ClaimKind::Age, &age(1_735_689_600, 18, 0)).unwrap();
        assert_eq!(
            c.to_hex(),
            "0x00bdbd09d74847cc111e3313751bdb2b293b0bc9aacf0871baa4a6e789e9be97"
        );
    }

    #[test]
    fn test_sanctions_evm_vector() {
        let inputs = SanctionsCommittedInputs {
            root_hash: Bytes32::from_u64(7),
            is_strict: true,
        };
        assert_eq!(
            sanctions_commitment(&inputs, true).unwrap().to_hex(),
            "0x001e5a7ab0edd7b24b6d6fde3d04336d96943800b76cee670e0fe6a2440d5c50"
        );
    }

    #[test]
    fn test_codec_is_pure() {
        let codec = ParameterCommitmentCodec::new();
        let input = age(1_735_689_600, 18, 0);
        assert_eq!(
            codec.standard(ClaimKind::Age, &input).unwrap(),
            codec.standard(ClaimKind::Age, &input).unwrap()
        );
        assert_ne!(
            codec.standard(ClaimKind::Age, &input).unwrap(),
            codec.evm(ClaimKind::Age, &input).unwrap()
        );
    }

    #[test]
    fn test_age_sensitive_to_every_field() {
        let codec = ParameterCommitmentCodec::new();
        for evm in [false, true] {
            let base = codec.compute(ClaimKind::Age, &age(1_735_689_600, 18, 0), evm).unwrap();
            for other in [age(1_735_776_000, 18, 0), age(1_735_689_600, 19, 0), age(1_735_689_600, 18, 65)] {
                assert_ne!(base, codec.compute(ClaimKind::Age, &other, evm).unwrap());
            }
        }
    }

    #[test]
    fn test_birthdate_and_expiry_differ() {
        let codec = ParameterCommitmentCodec::new();
        let input = date(946_684_800, 0, 1_735_689_600);
        for evm in [false, true] {
            assert_ne!(
                codec.compute(ClaimKind::Birthdate, &input, evm).unwrap(),
                codec.compute(ClaimKind::ExpiryDate, &input, evm).unwrap()
            );
        }
    }

    #[test]
    fn test_birthdate_offset_skips_zero_bounds() {
        let d = DateCommittedInputs {
            min_date: 0,
            max_date: 100,
            current_date: 1,
        };
        assert_eq!(date_bounds(ClaimKind::Birthdate, &d), (0, 100 + SECONDS_BETWEEN_1900_AND_1970));
        assert_eq!(date_bounds(ClaimKind::ExpiryDate, &d), (0, 100));
    }

    #[test]
    fn test_negative_birthdate_bound_after_offset() {
        // 1950-01-01 is negative in UNIX time but positive from 1900
        let input = date(-631_152_000, 0, 1_735_689_600);
        assert!(ParameterCommitmentCodec.standard(ClaimKind::Birthdate, &input).is_ok());
        assert!(ParameterCommitmentCodec.standard(ClaimKind::ExpiryDate, &input).is_err());
    }

    #[test]
    fn test_country_list_order_matters() {
        let a = CountryCommittedInputs {
            countries: vec!["DEU".into(), "FRA".into()],
        };
        let b = CountryCommittedInputs {
            countries: vec!["FRA".into(), "DEU".into()],
        };
        for evm in [false, true] {
            assert_ne!(
                country_commitment(ClaimKind::NationalityExclusion, &a, evm).unwrap(),
                country_commitment(ClaimKind::NationalityExclusion, &b, evm).unwrap()
            );
            assert_ne!(
                country_commitment(ClaimKind::NationalityExclusion, &a, evm).unwrap(),
                country_commitment(ClaimKind::NationalityInclusion, &a, evm).unwrap()
            );
        }
    }

    #[test]
    fn test_country_list_limits() {
        let too_many = CountryCommittedInputs {
            countries: vec!["FRA".to_string(); COUNTRY_LIST_MAX_ENTRIES + 1],
        };
        assert!(country_commitment(ClaimKind::NationalityInclusion, &too_many, false).is_err());
        let bad_code = CountryCommittedInputs {
            countries: vec!["FR".into()],
        };
        assert!(country_commitment(ClaimKind::NationalityInclusion, &bad_code, true).is_err());
    }

    #[test]
    fn test_kind_input_mismatch() {
        let codec = ParameterCommitmentCodec::new();
        assert!(codec.standard(ClaimKind::Birthdate, &age(1, 1, 1)).is_err());
        assert!(codec.evm(ClaimKind::Facematch, &age(1, 1, 1)).is_err());
    }

    #[test]
    fn test_disclose_requires_full_length() {
        let codec = ParameterCommitmentCodec::new();
        let short = CommittedInput::Disclose(DiscloseCommittedInputs {
            disclose_mask: vec![1; 10],
            disclosed_bytes: vec![0; 10],
        });
        assert!(codec.standard(ClaimKind::Disclose, &short).is_err());

        let full = CommittedInput::Disclose(DiscloseCommittedInputs {
            disclose_mask: vec![1; DISCLOSED_BYTES_LENGTH],
            disclosed_bytes: vec![b'<'; DISCLOSED_BYTES_LENGTH],
        });
        assert!(codec.standard(ClaimKind::Disclose, &full).is_ok());
        assert!(codec.evm(ClaimKind::Disclose, &full).is_ok());
    }

    #[test]
    fn test_facematch_sensitive_to_mode() {
        let regular = facematch();
        let mut strict = facematch();
        strict.mode = FacematchMode::Strict;
        for evm in [false, true] {
            assert_ne!(
                facematch_commitment(&regular, evm).unwrap(),
                facematch_commitment(&strict, evm).unwrap()
            );
        }
    }

    #[test]
    fn test_format_bound_data() {
        let data = BoundData {
            user_address: Some("0x04Fb06E8BF44eC60b6A99D2F98551172b2F2dED8".into()),
            chain: Some(SupportedChain::EthereumSepolia),
            custom_data: Some("email:test@test.com".into()),
        };
        let bytes = format_bound_data(&data).unwrap();
        assert_eq!(&bytes[..3], &[1, 0, 20]);
        assert_eq!(bytes[3], 0x04);
        assert_eq!(&bytes[23..29], &[2, 0, 3, 0xaa, 0x36, 0xa7]);
        assert_eq!(&bytes[29..32], &[3, 0, 19]);
        assert_eq!(&bytes[32..], b"email:test@test.com");
    }

    #[test]
    fn test_bound_data_too_long() {
        let data = BoundData {
            user_address: None,
            chain: None,
            custom_data: Some("x".repeat(BIND_DATA_MAX_LENGTH)),
        };
        assert!(format_bound_data(&data).is_err());
    }
}
