use crate::FacematchMode;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identity-document attributes a relying party can ask about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdField {
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
}

impl IdField {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdField::Age => "age",
            IdField::Birthdate => "birthdate",
            IdField::ExpiryDate => "expiry_date",
            IdField::Nationality => "nationality",
            IdField::IssuingCountry => "issuing_country",
            IdField::DocumentType => "document_type",
            IdField::DocumentNumber => "document_number",
            IdField::Gender => "gender",
            IdField::Firstname => "firstname",
            IdField::Lastname => "lastname",
            IdField::Fullname => "fullname",
        }
    }
}

impl fmt::Display for IdField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scalar asserted by a query: a number, a string, or a date given as a string.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClaimValue {
    Number(i64),
    Text(String),
}

impl ClaimValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ClaimValue::Number(n) => Some(*n),
            ClaimValue::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Dates are accepted as `YYYY-MM-DD`, RFC 3339, `YYYYMMDD`, or UNIX seconds.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            ClaimValue::Number(secs) => DateTime::<Utc>::from_timestamp(*secs, 0).map(|d| d.date_naive()),
            ClaimValue::Text(s) => {
                let s = s.trim();
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()
                    .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|d| d.with_timezone(&Utc).date_naive()))
                    .or_else(|| NaiveDate::parse_from_str(s, "%Y%m%d").ok())
            }
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            ClaimValue::Number(n) => n.to_string(),
            ClaimValue::Text(s) => s.clone(),
        }
    }
}

impl fmt::Display for ClaimValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<i64> for ClaimValue {
    fn from(n: i64) -> Self {
        ClaimValue::Number(n)
    }
}

impl From<&str> for ClaimValue {
    fn from(s: &str) -> Self {
        ClaimValue::Text(s.to_string())
    }
}

/// Constraints a relying party places on one field.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimConstraint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eq: Option<ClaimValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gte: Option<ClaimValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gt: Option<ClaimValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lte: Option<ClaimValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lt: Option<ClaimValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<(ClaimValue, ClaimValue)>,
    #[serde(default, rename = "in", skip_serializing_if = "Option::is_none")]
    pub in_list: Option<Vec<String>>,
    #[serde(default, rename = "out", skip_serializing_if = "Option::is_none")]
    pub out_list: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disclose: Option<bool>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportedChain {
    Ethereum,
    EthereumSepolia,
    Local,
}

impl SupportedChain {
    pub fn chain_id(&self) -> u64 {
        match self {
            SupportedChain::Ethereum => 1,
            SupportedChain::EthereumSepolia => 11_155_111,
            SupportedChain::Local => 31_337,
        }
    }
}

/// Data a bind proof ties to the holder's proof.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain: Option<SupportedChain>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanctionsQuery {
    #[serde(default)]
    pub strict: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacematchQuery {
    pub mode: FacematchMode,
}

/// The relying party's request, as sent to the holder.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    #[serde(flatten)]
    pub fields: BTreeMap<IdField, ClaimConstraint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<BoundData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sanctions: Option<SanctionsQuery>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facematch: Option<FacematchQuery>,
}

impl Query {
    pub fn field(&self, field: IdField) -> Option<&ClaimConstraint> {
        self.fields.get(&field)
    }

    pub fn with_field(mut self, field: IdField, constraint: ClaimConstraint) -> Self {
        self.fields.insert(field, constraint);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExpectedResult<T> {
    pub expected: T,
    pub result: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DisclosedResult {
    pub result: ClaimValue,
}

/// Holder-computed answer for one field. The verifier re-derives every
/// `result` from the proofs rather than trusting it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eq: Option<ExpectedResult<ClaimValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gte: Option<ExpectedResult<ClaimValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gt: Option<ExpectedResult<ClaimValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lte: Option<ExpectedResult<ClaimValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lt: Option<ExpectedResult<ClaimValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<ExpectedResult<(ClaimValue, ClaimValue)>>,
    #[serde(default, rename = "in", skip_serializing_if = "Option::is_none")]
    pub in_list: Option<ExpectedResult<Vec<String>>>,
    #[serde(default, rename = "out", skip_serializing_if = "Option::is_none")]
    pub out_list: Option<ExpectedResult<Vec<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disclose: Option<DisclosedResult>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SanctionsResult {
    pub passed: bool,
    #[serde(default)]
    pub is_strict: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacematchResult {
    pub mode: FacematchMode,
    pub passed: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    #[serde(flatten)]
    pub fields: BTreeMap<IdField, FieldResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<BoundData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sanctions: Option<SanctionsResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facematch: Option<FacematchResult>,
}

impl QueryResult {
    pub fn field(&self, field: IdField) -> Option<&FieldResult> {
        self.fields.get(&field)
    }

    pub fn with_field(mut self, field: IdField, result: FieldResult) -> Self {
        self.fields.insert(field, result);
        self
    }
}
