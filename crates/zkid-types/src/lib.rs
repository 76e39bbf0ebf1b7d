#![forbid(unsafe_code)]
#![warn(clippy::all)]

mod bytes;
mod claim;
mod committed;
mod error;
mod proof;
mod query;
mod registry;
mod verdict;

pub use bytes::Bytes32;
pub use claim::{CircuitStage, ClaimKind};
pub use committed::{
    parse_yyyymmdd, AgeCommittedInputs, BindCommittedInputs, CommittedEntry, CommittedInput,
    CommittedInputs, CountryCommittedInputs, DateCommittedInputs, DiscloseCommittedInputs,
    FacematchCommittedInputs, FacematchEnvironment, FacematchMode, SanctionsCommittedInputs,
};
pub use error::{ZkidError, ZkidResult};
pub use proof::{encode_fields, ProofResult};
pub use query::{
    BoundData, ClaimConstraint, ClaimValue, DisclosedResult, ExpectedResult, FacematchQuery,
    FacematchResult, FieldResult, IdField, Query, QueryResult, SanctionsQuery, SanctionsResult,
    SupportedChain,
};
pub use registry::{
    CertificatePublicKey, CertificateValidity, CircuitManifest, CircuitManifestEntry,
    PackagedCertificate, PackagedCertificatesFile, PackagedCircuit, RootDetails,
};
pub use verdict::{
    ConstraintError, ConstraintKind, ErrorReport, FieldErrors, FieldKey, Nullifier, NullifierKind,
    VerificationVerdict,
};

pub const FIELD_BYTES: usize = 32;

/// Registry id of the CSCA certificate registry.
pub const CERTIFICATE_REGISTRY_ID: u64 = 1;

/// Registry id of the circuit verification-key registry.
pub const CIRCUIT_REGISTRY_ID: u64 = 2;

pub const CERTIFICATE_TREE_HEIGHT: usize = 16;

pub const CIRCUIT_TREE_HEIGHT: usize = 12;

/// Default proof validity window: one week.
pub const DEFAULT_VALIDITY_SECS: i64 = 7 * 86_400;

pub const SECONDS_PER_DAY: i64 = 86_400;

pub const SECONDS_BETWEEN_1900_AND_1970: i64 = 2_208_988_800;

/// Length of the MRZ bytes exposed by the disclose circuit.
pub const DISCLOSED_BYTES_LENGTH: usize = 90;

pub const BIND_DATA_MAX_LENGTH: usize = 509;

pub const COUNTRY_LIST_MAX_ENTRIES: usize = 200;

pub const DEFAULT_HISTORICAL_ROOTS_PAGE_SIZE: u64 = 100;

pub const DEFAULT_RETRY_COUNT: u32 = 3;
