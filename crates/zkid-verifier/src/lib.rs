#![forbid(unsafe_code)]
#![warn(clippy::all)]

mod backend;
pub mod checks;
mod config;
mod disclosed;
mod inputs;
mod ordering;
mod session;
mod validator;

pub use backend::ProofBackend;
pub use checks::{check_claim, claim_key, required_claims, CheckContext, FacematchPolicy};
pub use config::VerifierConfig;
pub use disclosed::{normalize_name, DisclosedData, DocumentLayout};
pub use inputs::{
    public_input_count, DisclosureInputs, DscInputs, IdDataInputs, IntegrityInputs, OuterInputs,
    StageInputs,
};
pub use ordering::{order_index, sort_proofs, PROOF_ORDER};
pub use session::{Session, SessionStatus};
pub use validator::ProofChainValidator;
