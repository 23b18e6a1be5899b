use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{
    Application, ApplicationFilter, ApplicationId, ApplicationStatus, SubmissionKey,
};
use crate::persistence::RepositoryError;
use crate::principal::CandidateId;

/// Storage abstraction so the service module can be exercised in isolation.
pub trait ApplicationRepository: Send + Sync {
    /// Persist a new application. Fails with `Conflict` when the candidate already holds a
    /// non-cancelled application for the same combination, checked atomically with the write,
    /// and with `MissingReference` when the combination is absent from the mapping table.
    fn insert(&self, application: Application) -> Result<Application, RepositoryError>;
    /// Replace a stored application if its version still equals `expected_version`.
    /// The stored copy is returned with its version bumped.
    fn replace(
        &self,
        application: Application,
        expected_version: u64,
    ) -> Result<Application, RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError>;
    fn find_active(&self, key: &SubmissionKey) -> Result<Option<Application>, RepositoryError>;
    fn for_candidate(&self, candidate: &CandidateId) -> Result<Vec<Application>, RepositoryError>;
    fn list(&self, filter: &ApplicationFilter) -> Result<Vec<Application>, RepositoryError>;
}

/// Outbound notification hook (e-mail, SMS, push adapters).
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError>;
}

/// Payload handed to the notification collaborator on final decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub template: String,
    pub application_id: ApplicationId,
    pub candidate_id: CandidateId,
    pub status: ApplicationStatus,
    pub details: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
