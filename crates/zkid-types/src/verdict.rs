use crate::{Bytes32, IdField};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Which constraint a recorded failure belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    Eq,
    Gte,
    Gt,
    Lte,
    Lt,
    Range,
    In,
    Out,
    Disclose,
    Commitment,
    Date,
    Certificate,
    Circuit,
    Scope,
    Nullifier,
    Proof,
    Missing,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received: Option<String>,
    pub message: String,
}

impl ConstraintError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            expected: None,
            received: None,
            message: message.into(),
        }
    }

    pub fn expected(mut self, expected: impl ToString) -> Self {
        self.expected = Some(expected.to_string());
        self
    }

    pub fn received(mut self, received: impl ToString) -> Self {
        self.received = Some(received.to_string());
        self
    }
}

/// Error report key: a query field or a proof stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKey {
    Age,
    Birthdate,
    ExpiryDate,
    Nationality,
    IssuingCountry,
    DocumentType,
    DocumentNumber,
    Gender,
    Firstname,
    Lastname,
    Fullname,
    SigCheckDsc,
    SigCheckIdData,
    DataCheckIntegrity,
    Outer,
    Disclose,
    Bind,
    Facematch,
    Sanctions,
    /// The bundle as a whole.
    Proofs,
}

impl FieldKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKey::Age => "age",
            FieldKey::Birthdate => "birthdate",
            FieldKey::ExpiryDate => "expiry_date",
            FieldKey::Nationality => "nationality",
            FieldKey::IssuingCountry => "issuing_country",
            FieldKey::DocumentType => "document_type",
            FieldKey::DocumentNumber => "document_number",
            FieldKey::Gender => "gender",
            FieldKey::Firstname => "firstname",
            FieldKey::Lastname => "lastname",
            FieldKey::Fullname => "fullname",
            FieldKey::SigCheckDsc => "sig_check_dsc",
            FieldKey::SigCheckIdData => "sig_check_id_data",
            FieldKey::DataCheckIntegrity => "data_check_integrity",
            FieldKey::Outer => "outer",
            FieldKey::Disclose => "disclose",
            FieldKey::Bind => "bind",
            FieldKey::Facematch => "facematch",
            FieldKey::Sanctions => "sanctions",
            FieldKey::Proofs => "proofs",
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<IdField> for FieldKey {
    fn from(field: IdField) -> Self {
        match field {
            IdField::Age => FieldKey::Age,
            IdField::Birthdate => FieldKey::Birthdate,
            IdField::ExpiryDate => FieldKey::ExpiryDate,
            IdField::Nationality => FieldKey::Nationality,
            IdField::IssuingCountry => FieldKey::IssuingCountry,
            IdField::DocumentType => FieldKey::DocumentType,
            IdField::DocumentNumber => FieldKey::DocumentNumber,
            IdField::Gender => FieldKey::Gender,
            IdField::Firstname => FieldKey::Firstname,
            IdField::Lastname => FieldKey::Lastname,
            IdField::Fullname => FieldKey::Fullname,
        }
    }
}

/// Failures recorded for one key, grouped by constraint.
pub type FieldErrors = BTreeMap<ConstraintKind, Vec<ConstraintError>>;

/// Accumulated failures of one verification call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorReport {
    entries: BTreeMap<FieldKey, FieldErrors>,
}

impl ErrorReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, key: FieldKey, kind: ConstraintKind, error: ConstraintError) {
        self.entries
            .entry(key)
            .or_default()
            .entry(kind)
            .or_default()
            .push(error);
    }

    pub fn merge(&mut self, other: ErrorReport) {
        for (key, kinds) in other.entries {
            for (kind, errors) in kinds {
                self.entries
                    .entry(key)
                    .or_default()
                    .entry(kind)
                    .or_default()
                    .extend(errors);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: FieldKey) -> Option<&FieldErrors> {
        self.entries.get(&key)
    }

    pub fn errors(&self, key: FieldKey, kind: ConstraintKind) -> &[ConstraintError] {
        self.entries
            .get(&key)
            .and_then(|kinds| kinds.get(&kind))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn has(&self, key: FieldKey, kind: ConstraintKind) -> bool {
        !self.errors(key, kind).is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &FieldKey> {
        self.entries.keys()
    }

    /// Total number of recorded failures.
    pub fn count(&self) -> usize {
        self.entries
            .values()
            .flat_map(|kinds| kinds.values())
            .map(|v| v.len())
            .sum()
    }
}

/// Slot value of `nullifier_type` in a disclosure-class proof.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullifierKind {
    NonSalted = 0,
    Salted = 1,
    NonSaltedMock = 2,
    SaltedMock = 3,
}

impl NullifierKind {
    pub fn from_field(field: &Bytes32) -> Option<Self> {
        match field.to_u64()? {
            0 => Some(NullifierKind::NonSalted),
            1 => Some(NullifierKind::Salted),
            2 => Some(NullifierKind::NonSaltedMock),
            3 => Some(NullifierKind::SaltedMock),
            _ => None,
        }
    }

    /// Mock nullifiers come from test documents.
    pub fn is_mock(&self) -> bool {
        matches!(self, NullifierKind::NonSaltedMock | NullifierKind::SaltedMock)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nullifier {
    pub value: Bytes32,
    pub kind: NullifierKind,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationVerdict {
    pub verified: bool,
    pub unique_identifier: Option<Bytes32>,
    pub unique_identifier_kind: Option<NullifierKind>,
    pub field_errors: ErrorReport,
}

impl VerificationVerdict {
    pub fn failed(field_errors: ErrorReport) -> Self {
        Self {
            verified: false,
            unique_identifier: None,
            unique_identifier_kind: None,
            field_errors,
        }
    }
}
