use crate::config::VerifierConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zkid_types::{Query, VerificationVerdict, ZkidError, ZkidResult, DEFAULT_VALIDITY_SECS};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "verdict")]
pub enum SessionStatus {
    Pending,
    Completed(VerificationVerdict),
    Cancelled,
}

/// One verification request: what the relying party asked for and where
/// the answer must be scoped. A session is verified at most once.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub domain: String,
    pub scope: Option<String>,
    pub query: Query,
    pub dev_mode: bool,
    pub validity_secs: i64,
    pub created_at: DateTime<Utc>,
    status: SessionStatus,
}

impl Session {
    pub fn new(domain: impl Into<String>, query: Query) -> Self {
        Self {
            id: Uuid::new_v4(),
            domain: domain.into(),
            scope: None,
            query,
            dev_mode: false,
            validity_secs: DEFAULT_VALIDITY_SECS,
            created_at: Utc::now(),
            status: SessionStatus::Pending,
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn with_dev_mode(mut self, dev_mode: bool) -> Self {
        self.dev_mode = dev_mode;
        self
    }

    pub fn with_validity(mut self, validity_secs: i64) -> Self {
        self.validity_secs = validity_secs;
        self
    }

    /// Builds a session from configured defaults. Fails when no domain is
    /// configured.
    pub fn from_config(config: &VerifierConfig, query: Query) -> ZkidResult<Self> {
        config.validate()?;
        let domain = config
            .domain
            .clone()
            .ok_or_else(|| ZkidError::Config("No verifier domain configured".into()))?;
        let mut session = Self::new(domain, query)
            .with_dev_mode(config.dev_mode)
            .with_validity(config.validity_secs);
        session.scope = config.scope.clone();
        Ok(session)
    }

    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    pub fn is_pending(&self) -> bool {
        self.status == SessionStatus::Pending
    }

    pub fn verdict(&self) -> Option<&VerificationVerdict> {
        match &self.status {
            SessionStatus::Completed(verdict) => Some(verdict),
            _ => None,
        }
    }

    pub fn cancel(&mut self) -> ZkidResult<()> {
        self.ensure_pending()?;
        self.status = SessionStatus::Cancelled;
        Ok(())
    }

    pub(crate) fn ensure_pending(&self) -> ZkidResult<()> {
        if !self.is_pending() {
            return Err(ZkidError::InvalidInput(format!(
                "Session {} cannot be verified from state {}",
                self.id,
                self.status_name()
            )));
        }
        Ok(())
    }

    pub(crate) fn complete(&mut self, verdict: VerificationVerdict) {
        self.status = SessionStatus::Completed(verdict);
    }

    fn status_name(&self) -> &'static str {
        match self.status {
            SessionStatus::Pending => "pending",
            SessionStatus::Completed(_) => "completed",
            SessionStatus::Cancelled => "cancelled",
        }
    }
}
