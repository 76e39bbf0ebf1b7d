use crate::backend::ProofBackend;
use crate::checks::{age_of_date, check_claim, claim_key, required_claims, CheckContext, FacematchPolicy};
use crate::config::VerifierConfig;
use crate::inputs::{public_input_count, DisclosureInputs, OuterInputs, StageInputs};
use crate::ordering::sort_proofs;
use crate::session::Session;
use chrono::{DateTime, NaiveDate, Utc};
use futures::future::join_all;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use zkid_crypto::{scope_hash, service_scope_hash, ParameterCommitmentCodec};
use zkid_registry::RootValidator;
use zkid_types::{
    Bytes32, CircuitStage, ClaimKind, ConstraintError, ConstraintKind, ErrorReport, FieldKey,
    Nullifier, NullifierKind, ProofResult, QueryResult, VerificationVerdict, ZkidResult,
    CERTIFICATE_REGISTRY_ID, CIRCUIT_REGISTRY_ID,
};

const REGISTRY_ROOT_EXPECTED: &str = "A valid root from ZKPassport Registry";

/// Stages a bundle without an outer proof must carry, in chain order.
const CHAIN_STAGES: [(FieldKey, &str); 3] = [
    (FieldKey::SigCheckDsc, "certificate signature"),
    (FieldKey::SigCheckIdData, "ID signature"),
    (FieldKey::DataCheckIntegrity, "data integrity"),
];

/// Validates a bundle of proofs against a session.
///
/// Every failure is accumulated into the verdict's error report; nothing
/// aborts early. `ZkidError` is only returned when the session cannot be
/// verified at all.
pub struct ProofChainValidator {
    roots: Arc<dyn RootValidator>,
    backend: Option<Arc<dyn ProofBackend>>,
    codec: ParameterCommitmentCodec,
    sanctions_root: Option<Bytes32>,
    facematch: FacematchPolicy,
}

/// Per-call accumulator.
#[derive(Default)]
struct VerificationState {
    report: ErrorReport,
    commitment_out: Option<Bytes32>,
    certificate_roots: Vec<(FieldKey, Bytes32)>,
    circuit_roots: Vec<Bytes32>,
    covered: BTreeSet<ClaimKind>,
    stages: BTreeSet<FieldKey>,
    nullifier: Option<Nullifier>,
}

impl VerificationState {
    fn fail(&mut self, key: FieldKey, kind: ConstraintKind, error: ConstraintError) {
        warn!("{} {:?}: {}", key, kind, error.message);
        self.report.record(key, kind, error);
    }

    /// Compares a stage's input commitment with the previous stage's output.
    /// A stage with nothing before it fails to link.
    fn link(&mut self, key: FieldKey, commitment_in: &Bytes32, message: &str) {
        match self.commitment_out {
            Some(previous) if previous == *commitment_in => {}
            Some(previous) => self.fail(
                key,
                ConstraintKind::Commitment,
                ConstraintError::new(message).expected(previous).received(commitment_in),
            ),
            None => self.fail(
                key,
                ConstraintKind::Commitment,
                ConstraintError::new(message).received(commitment_in),
            ),
        }
    }

    /// Without an outer proof every chain stage has to be present.
    fn check_chain(&mut self) {
        if self.stages.contains(&FieldKey::Outer) {
            return;
        }
        for (key, stage) in CHAIN_STAGES {
            if !self.stages.contains(&key) {
                self.fail(
                    key,
                    ConstraintKind::Missing,
                    ConstraintError::new(format!("The {} proof is missing from the chain", stage)),
                );
            }
        }
    }
}

/// Scope hashes a proof must carry.
struct ExpectedScope {
    domain: Bytes32,
    subscope: Option<Bytes32>,
}

impl ProofChainValidator {
    pub fn new(roots: Arc<dyn RootValidator>) -> Self {
        Self {
            roots,
            backend: None,
            codec: ParameterCommitmentCodec::new(),
            sanctions_root: None,
            facematch: FacematchPolicy::default(),
        }
    }

    pub fn from_config(config: &VerifierConfig, roots: Arc<dyn RootValidator>) -> ZkidResult<Self> {
        config.validate()?;
        let mut validator = Self::new(roots).with_facematch_policy(config.facematch_policy());
        validator.sanctions_root = config.sanctions_root;
        Ok(validator)
    }

    pub fn with_backend(mut self, backend: Arc<dyn ProofBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_sanctions_root(mut self, root: Bytes32) -> Self {
        self.sanctions_root = Some(root);
        self
    }

    pub fn with_facematch_policy(mut self, policy: FacematchPolicy) -> Self {
        self.facematch = policy;
        self
    }

    pub async fn verify(
        &self,
        session: &mut Session,
        proofs: Vec<ProofResult>,
        result: &QueryResult,
    ) -> ZkidResult<VerificationVerdict> {
        self.verify_at(session, proofs, result, Utc::now()).await
    }

    /// Verifies as of `now`, which fixes "today" for freshness checks and
    /// the timestamp passed to root lookups.
    pub async fn verify_at(
        &self,
        session: &mut Session,
        mut proofs: Vec<ProofResult>,
        result: &QueryResult,
        now: DateTime<Utc>,
    ) -> ZkidResult<VerificationVerdict> {
        session.ensure_pending()?;

        if proofs.is_empty() {
            let mut report = ErrorReport::new();
            report.record(
                FieldKey::Proofs,
                ConstraintKind::Missing,
                ConstraintError::new("No proofs to verify").expected("at least one proof").received(0),
            );
            warn!("Session {} has no proofs to verify", session.id);
            let verdict = VerificationVerdict::failed(report);
            session.complete(verdict.clone());
            return Ok(verdict);
        }

        sort_proofs(&mut proofs);
        let today = now.date_naive();
        let ctx = CheckContext {
            today,
            dev_mode: session.dev_mode,
            sanctions_root: self.sanctions_root.as_ref(),
            facematch: &self.facematch,
        };
        let scope = ExpectedScope {
            domain: service_scope_hash(&session.domain),
            subscope: session.scope.as_deref().map(scope_hash),
        };

        let mut state = VerificationState::default();
        for proof in &proofs {
            self.process_proof(&mut state, proof, session, result, &ctx, &scope);
        }
        state.check_chain();

        self.anchor_roots(&mut state, now.timestamp()).await;

        for (key, kinds) in required_claims(&session.query) {
            if !kinds.iter().any(|kind| state.covered.contains(kind)) {
                state.fail(
                    key,
                    ConstraintKind::Missing,
                    ConstraintError::new(format!("This proof does not verify {}", claim_subject(kinds[0]))),
                );
            }
        }

        if state.report.is_empty() {
            if let Some(backend) = &self.backend {
                verify_proofs(backend.as_ref(), &mut state, &proofs).await;
            }
        }

        let verdict = if state.report.is_empty() {
            VerificationVerdict {
                verified: true,
                unique_identifier: state.nullifier.map(|n| n.value),
                unique_identifier_kind: state.nullifier.map(|n| n.kind),
                field_errors: state.report,
            }
        } else {
            VerificationVerdict::failed(state.report)
        };

        info!(
            "Session {} verified={} ({} proofs, {} errors)",
            session.id,
            verdict.verified,
            proofs.len(),
            verdict.field_errors.count()
        );
        session.complete(verdict.clone());
        Ok(verdict)
    }

    fn process_proof(
        &self,
        state: &mut VerificationState,
        proof: &ProofResult,
        session: &Session,
        result: &QueryResult,
        ctx: &CheckContext<'_>,
        scope: &ExpectedScope,
    ) {
        let stage = proof.stage();
        let Some(key) = stage_key(&stage) else {
            state.fail(
                FieldKey::Proofs,
                ConstraintKind::Proof,
                ConstraintError::new("The proof uses an unknown circuit").received(&proof.name),
            );
            return;
        };
        state.stages.insert(key);
        debug!("Checking proof {} as {:?}", proof.name, stage);

        let inputs = match StageInputs::read(proof) {
            Ok(inputs) => inputs,
            Err(e) => {
                state.fail(
                    key,
                    ConstraintKind::Missing,
                    ConstraintError::new("Failed to read the public inputs of the proof").received(e),
                );
                return;
            }
        };

        match (stage, inputs) {
            (CircuitStage::Dsc, StageInputs::Dsc(dsc)) => {
                state.certificate_roots.push((key, dsc.certificate_root));
                state.commitment_out = Some(dsc.commitment_out);
            }
            (CircuitStage::IdData, StageInputs::IdData(id_data)) => {
                state.link(
                    key,
                    &id_data.commitment_in,
                    "Failed to check the link between the certificate signature and ID signature",
                );
                state.commitment_out = Some(id_data.commitment_out);
            }
            (CircuitStage::Integrity, StageInputs::Integrity(integrity)) => {
                state.link(
                    key,
                    &integrity.commitment_in,
                    "Failed to check the link between the ID signature and the data signed",
                );
                check_validity(state, key, integrity.current_date, ctx.today, session.validity_secs);
                state.commitment_out = Some(integrity.commitment_out);
            }
            (CircuitStage::Claim { kind, evm }, StageInputs::Disclosure(disclosure)) => {
                self.process_claim(state, proof, kind, evm, &disclosure, result, ctx, scope);
            }
            (CircuitStage::Outer { evm, .. }, StageInputs::Outer(outer)) => {
                self.process_outer(state, proof, evm, &outer, session, result, ctx, scope);
            }
            (stage, _) => warn!("Proof {} decoded with a layout other than {:?}", proof.name, stage),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn process_claim(
        &self,
        state: &mut VerificationState,
        proof: &ProofResult,
        kind: ClaimKind,
        evm: bool,
        inputs: &DisclosureInputs,
        result: &QueryResult,
        ctx: &CheckContext<'_>,
        scope: &ExpectedScope,
    ) {
        let key = claim_key(kind);
        state.link(
            key,
            &inputs.commitment_in,
            &format!("Failed to check the link between the validity of the ID and {}", link_subject(kind)),
        );
        check_scope(state, key, &inputs.service_scope, &inputs.service_subscope, scope);

        let committed = proof.committed_inputs();
        let Some(entry) = committed.get(kind) else {
            state.fail(
                key,
                ConstraintKind::Missing,
                ConstraintError::new(format!("Committed inputs for {} are missing", proof.name)),
            );
            return;
        };

        match self.codec.compute(kind, &entry.input, evm) {
            Ok(commitment) if commitment == inputs.param_commitment => {}
            Ok(commitment) => state.fail(
                key,
                ConstraintKind::Commitment,
                ConstraintError::new(format!("This proof does not verify {}", claim_subject(kind)))
                    .expected(inputs.param_commitment)
                    .received(commitment),
            ),
            Err(e) => state.fail(
                key,
                ConstraintKind::Commitment,
                ConstraintError::new(format!("This proof does not verify {}", claim_subject(kind)))
                    .received(e),
            ),
        }

        state.report.merge(check_claim(kind, &entry.input, result, ctx));
        state.covered.insert(kind);
        take_nullifier(state, key, &inputs.nullifier_type, inputs.nullifier(), ctx.dev_mode);
    }

    #[allow(clippy::too_many_arguments)]
    fn process_outer(
        &self,
        state: &mut VerificationState,
        proof: &ProofResult,
        evm: bool,
        inputs: &OuterInputs,
        session: &Session,
        result: &QueryResult,
        ctx: &CheckContext<'_>,
        scope: &ExpectedScope,
    ) {
        let key = FieldKey::Outer;
        state.certificate_roots.push((key, inputs.certificate_root));
        state.circuit_roots.push(inputs.circuit_root);
        check_validity(state, key, inputs.current_date, ctx.today, session.validity_secs);

        let committed = proof.committed_inputs();
        if committed.len() != inputs.param_commitments.len() {
            state.fail(
                key,
                ConstraintKind::Commitment,
                ConstraintError::new("The proof does not verify all the requested conditions and information")
                    .expected(inputs.param_commitments.len())
                    .received(committed.len()),
            );
        }
        check_scope(state, key, &inputs.service_scope, &inputs.service_subscope, scope);

        for entry in committed.iter() {
            let member = self
                .codec
                .compute(entry.kind, &entry.input, evm)
                .map(|c| inputs.param_commitments.contains(&c));
            if !matches!(member, Ok(true)) {
                let mut error =
                    ConstraintError::new(format!("This proof does not verify {}", claim_subject(entry.kind)));
                if let Err(e) = member {
                    error = error.received(e);
                }
                state.fail(claim_key(entry.kind), ConstraintKind::Commitment, error);
            }
            state.report.merge(check_claim(entry.kind, &entry.input, result, ctx));
            state.covered.insert(entry.kind);
        }

        take_nullifier(state, key, &inputs.nullifier_type, inputs.nullifier(), ctx.dev_mode);
    }

    /// Looks up every collected root concurrently. Lookup errors count as
    /// invalid roots.
    async fn anchor_roots(&self, state: &mut VerificationState, timestamp: i64) {
        let certificate_roots = std::mem::take(&mut state.certificate_roots);
        let circuit_roots = std::mem::take(&mut state.circuit_roots);
        let roots = self.roots.as_ref();

        let certificate_checks = join_all(certificate_roots.iter().map(|(key, root)| async move {
            (*key, *root, root_is_valid(roots, CERTIFICATE_REGISTRY_ID, root, timestamp).await)
        }));
        let circuit_checks = join_all(circuit_roots.iter().map(|root| async move {
            (*root, root_is_valid(roots, CIRCUIT_REGISTRY_ID, root, timestamp).await)
        }));
        let (certificates, circuits) = futures::join!(certificate_checks, circuit_checks);

        for (key, root, valid) in certificates {
            if !valid {
                state.fail(
                    key,
                    ConstraintKind::Certificate,
                    ConstraintError::new("The ID was signed by an unrecognized root certificate")
                        .expected(REGISTRY_ROOT_EXPECTED)
                        .received(format!("Got invalid certificate registry root: {}", root)),
                );
            }
        }
        for (root, valid) in circuits {
            if !valid {
                state.fail(
                    FieldKey::Outer,
                    ConstraintKind::Circuit,
                    ConstraintError::new("The proof uses an unrecognized circuit")
                        .expected(REGISTRY_ROOT_EXPECTED)
                        .received(format!("Got invalid circuit registry root: {}", root)),
                );
            }
        }
    }
}

async fn root_is_valid(roots: &dyn RootValidator, registry_id: u64, root: &Bytes32, timestamp: i64) -> bool {
    match roots.is_root_valid(registry_id, root, timestamp).await {
        Ok(valid) => valid,
        Err(e) => {
            warn!("Root lookup in registry {} failed for {}: {}", registry_id, root, e);
            false
        }
    }
}

async fn verify_proofs(backend: &dyn ProofBackend, state: &mut VerificationState, proofs: &[ProofResult]) {
    for proof in proofs {
        let stage = proof.stage();
        let (Some(key), Some(count)) = (stage_key(&stage), public_input_count(&stage)) else {
            continue;
        };
        let Some(vkey_hash) = proof.vkey_hash else {
            state.fail(
                key,
                ConstraintKind::Proof,
                ConstraintError::new(format!("Proof {} has no verification key hash", proof.name)),
            );
            continue;
        };
        let outcome = match proof.public_inputs(count) {
            Ok(public_inputs) => backend.verify(proof, &vkey_hash, &public_inputs).await,
            Err(e) => Err(e),
        };
        match outcome {
            Ok(true) => debug!("Proof {} verified", proof.name),
            Ok(false) => state.fail(
                key,
                ConstraintKind::Proof,
                ConstraintError::new(format!("Proof {} is invalid", proof.name)),
            ),
            Err(e) => state.fail(
                key,
                ConstraintKind::Proof,
                ConstraintError::new(format!("Proof {} could not be verified", proof.name)).received(e),
            ),
        }
    }
}

fn check_validity(state: &mut VerificationState, key: FieldKey, current_date: i64, today: NaiveDate, validity_secs: i64) {
    let age = age_of_date(current_date, today);
    if age >= validity_secs {
        state.fail(
            key,
            ConstraintKind::Date,
            ConstraintError::new("The date used to check the validity of the ID is older than the validity period")
                .expected(format!("less than {} seconds", validity_secs))
                .received(format!("{} seconds", age)),
        );
    }
}

fn check_scope(state: &mut VerificationState, key: FieldKey, domain: &Bytes32, subscope: &Bytes32, expected: &ExpectedScope) {
    if *domain != expected.domain {
        state.fail(
            key,
            ConstraintKind::Scope,
            ConstraintError::new("The proof comes from a different domain than the one expected")
                .expected(expected.domain)
                .received(domain),
        );
    }
    if let Some(expected_subscope) = expected.subscope {
        if *subscope != expected_subscope {
            state.fail(
                key,
                ConstraintKind::Scope,
                ConstraintError::new("The proof uses a different scope than the one expected")
                    .expected(expected_subscope)
                    .received(subscope),
            );
        }
    }
}

/// Keeps the last nullifier seen. Mock nullifiers only pass in dev mode.
fn take_nullifier(
    state: &mut VerificationState,
    key: FieldKey,
    raw_kind: &Bytes32,
    nullifier: Option<Nullifier>,
    dev_mode: bool,
) {
    let Some(nullifier) = nullifier else {
        state.fail(
            key,
            ConstraintKind::Nullifier,
            ConstraintError::new("Invalid nullifier type").received(raw_kind),
        );
        return;
    };
    if nullifier.kind.is_mock() {
        if dev_mode {
            warn!("Accepting mock nullifier from {} in dev mode", key);
        } else {
            state.fail(
                key,
                ConstraintKind::Nullifier,
                ConstraintError::new("The proof was generated from a mock document")
                    .expected(format!("{:?} or {:?}", NullifierKind::NonSalted, NullifierKind::Salted))
                    .received(format!("{:?}", nullifier.kind)),
            );
        }
    }
    state.nullifier = Some(nullifier);
}

fn stage_key(stage: &CircuitStage) -> Option<FieldKey> {
    match stage {
        CircuitStage::Dsc => Some(FieldKey::SigCheckDsc),
        CircuitStage::IdData => Some(FieldKey::SigCheckIdData),
        CircuitStage::Integrity => Some(FieldKey::DataCheckIntegrity),
        CircuitStage::Claim { kind, .. } => Some(claim_key(*kind)),
        CircuitStage::Outer { .. } => Some(FieldKey::Outer),
        CircuitStage::Unknown => None,
    }
}

fn claim_subject(kind: ClaimKind) -> &'static str {
    match kind {
        ClaimKind::Disclose => "any of the data disclosed",
        ClaimKind::Age => "the age",
        ClaimKind::Birthdate => "the birthdate",
        ClaimKind::ExpiryDate => "the expiry date",
        ClaimKind::NationalityInclusion => "the inclusion of the nationality",
        ClaimKind::NationalityExclusion => "the exclusion of the nationality",
        ClaimKind::IssuingCountryInclusion => "the inclusion of the issuing country",
        ClaimKind::IssuingCountryExclusion => "the exclusion of the issuing country",
        ClaimKind::Bind => "the bound data",
        ClaimKind::SanctionsExclusion => "the exclusion from the sanction lists",
        ClaimKind::Facematch => "FaceMatch",
    }
}

fn link_subject(kind: ClaimKind) -> &'static str {
    match kind {
        ClaimKind::Disclose => "the data to disclose",
        ClaimKind::Age => "the age derived from it",
        ClaimKind::Birthdate => "the birthdate derived from it",
        ClaimKind::ExpiryDate => "its expiry date",
        ClaimKind::NationalityInclusion => "the nationality inclusion check",
        ClaimKind::NationalityExclusion => "the nationality exclusion check",
        ClaimKind::IssuingCountryInclusion => "the issuing country inclusion check",
        ClaimKind::IssuingCountryExclusion => "the issuing country exclusion check",
        ClaimKind::Bind => "the bound data",
        ClaimKind::SanctionsExclusion => "the sanctions exclusion check",
        ClaimKind::Facematch => "the facematch check",
    }
}
