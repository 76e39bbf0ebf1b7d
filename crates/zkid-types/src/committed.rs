use crate::{BoundData, Bytes32, ClaimKind, ZkidError};
use chrono::NaiveDate;
use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgeCommittedInputs {
    pub min_age: u8,
    pub max_age: u8,
    #[serde(rename = "currentDateTimestamp", deserialize_with = "flexible_timestamp")]
    pub current_date: i64,
}

/// Birthdate and expiry bounds, UNIX seconds. Zero means "unbounded".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateCommittedInputs {
    #[serde(rename = "minDateTimestamp", deserialize_with = "flexible_timestamp")]
    pub min_date: i64,
    #[serde(rename = "maxDateTimestamp", deserialize_with = "flexible_timestamp")]
    pub max_date: i64,
    #[serde(rename = "currentDateTimestamp", deserialize_with = "flexible_timestamp")]
    pub current_date: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscloseCommittedInputs {
    pub disclose_mask: Vec<u8>,
    pub disclosed_bytes: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryCommittedInputs {
    pub countries: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindCommittedInputs {
    pub data: BoundData,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SanctionsCommittedInputs {
    pub root_hash: Bytes32,
    pub is_strict: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacematchEnvironment {
    Development,
    Production,
}

impl FacematchEnvironment {
    pub fn code(&self) -> u8 {
        match self {
            FacematchEnvironment::Development => 0,
            FacematchEnvironment::Production => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacematchMode {
    Regular,
    Strict,
}

impl FacematchMode {
    pub fn code(&self) -> u8 {
        match self {
            FacematchMode::Regular => 1,
            FacematchMode::Strict => 2,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacematchCommittedInputs {
    pub root_key_leaf: Bytes32,
    pub environment: FacematchEnvironment,
    pub app_id_hash: Bytes32,
    pub integrity_pubkey_hash: Bytes32,
    pub mode: FacematchMode,
}

/// Inputs a claim proof commits to, one variant per payload shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommittedInput {
    Age(AgeCommittedInputs),
    Date(DateCommittedInputs),
    Disclose(DiscloseCommittedInputs),
    Country(CountryCommittedInputs),
    Bind(BindCommittedInputs),
    Sanctions(SanctionsCommittedInputs),
    Facematch(FacematchCommittedInputs),
}

impl CommittedInput {
    /// Decodes the payload shape that `kind` requires.
    pub fn from_value(kind: ClaimKind, value: serde_json::Value) -> Result<Self, ZkidError> {
        let input = match kind {
            ClaimKind::Age => CommittedInput::Age(serde_json::from_value(value)?),
            ClaimKind::Birthdate | ClaimKind::ExpiryDate => {
                CommittedInput::Date(serde_json::from_value(value)?)
            }
            ClaimKind::Disclose => CommittedInput::Disclose(serde_json::from_value(value)?),
            ClaimKind::NationalityInclusion
            | ClaimKind::NationalityExclusion
            | ClaimKind::IssuingCountryInclusion
            | ClaimKind::IssuingCountryExclusion => {
                CommittedInput::Country(serde_json::from_value(value)?)
            }
            ClaimKind::Bind => CommittedInput::Bind(serde_json::from_value(value)?),
            ClaimKind::SanctionsExclusion => {
                CommittedInput::Sanctions(serde_json::from_value(value)?)
            }
            ClaimKind::Facematch => CommittedInput::Facematch(serde_json::from_value(value)?),
        };
        Ok(input)
    }

    fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            CommittedInput::Age(v) => serde_json::to_value(v),
            CommittedInput::Date(v) => serde_json::to_value(v),
            CommittedInput::Disclose(v) => serde_json::to_value(v),
            CommittedInput::Country(v) => serde_json::to_value(v),
            CommittedInput::Bind(v) => serde_json::to_value(v),
            CommittedInput::Sanctions(v) => serde_json::to_value(v),
            CommittedInput::Facematch(v) => serde_json::to_value(v),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommittedEntry {
    pub kind: ClaimKind,
    pub evm: bool,
    pub input: CommittedInput,
}

impl CommittedEntry {
    pub fn circuit_name(&self) -> String {
        if self.evm {
            format!("{}_evm", self.kind.circuit_name())
        } else {
            self.kind.circuit_name().to_string()
        }
    }
}

/// Committed inputs of a proof, keyed on the wire by circuit name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommittedInputs {
    entries: Vec<CommittedEntry>,
}

impl CommittedInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: ClaimKind, evm: bool, input: CommittedInput) {
        self.entries.retain(|e| !(e.kind == kind && e.evm == evm));
        self.entries.push(CommittedEntry { kind, evm, input });
    }

    pub fn with(mut self, kind: ClaimKind, evm: bool, input: CommittedInput) -> Self {
        self.insert(kind, evm, input);
        self
    }

    /// Standard variant wins over the EVM variant when both are present.
    pub fn get(&self, kind: ClaimKind) -> Option<&CommittedEntry> {
        self.entries
            .iter()
            .find(|e| e.kind == kind && !e.evm)
            .or_else(|| self.entries.iter().find(|e| e.kind == kind))
    }

    pub fn contains(&self, kind: ClaimKind) -> bool {
        self.get(kind).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommittedEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for CommittedInputs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            let value = entry.input.to_value().map_err(serde::ser::Error::custom)?;
            map.serialize_entry(&entry.circuit_name(), &value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CommittedInputs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
        let mut inputs = CommittedInputs::new();
        for (name, value) in raw {
            let (kind, evm) = ClaimKind::from_circuit_name(&name)
                .ok_or_else(|| de::Error::custom(format!("unknown circuit name: {}", name)))?;
            let input = CommittedInput::from_value(kind, value)
                .map_err(|e| de::Error::custom(format!("{}: {}", name, e)))?;
            inputs.insert(kind, evm, input);
        }
        Ok(inputs)
    }
}

/// Accepts UNIX seconds or an 8-character `YYYYMMDD` string.
fn flexible_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    struct TimestampVisitor;

    impl<'de> de::Visitor<'de> for TimestampVisitor {
        type Value = i64;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("UNIX seconds or a YYYYMMDD string")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
            i64::try_from(v).map_err(|_| E::custom("timestamp out of range"))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<i64, E> {
            parse_yyyymmdd(v).ok_or_else(|| E::custom(format!("invalid date: {}", v)))
        }
    }

    deserializer.deserialize_any(TimestampVisitor)
}

/// `"00000000"` and `"11111111"` are the circuits' "no bound" markers.
pub fn parse_yyyymmdd(s: &str) -> Option<i64> {
    if s == "00000000" || s == "11111111" {
        return Some(0);
    }
    if s.len() != 8 {
        return None;
    }
    let date = NaiveDate::parse_from_str(s, "%Y%m%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp())
}
