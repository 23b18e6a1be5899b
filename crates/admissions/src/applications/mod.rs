//! Candidate applications: creation checks, the status workflow and its audit trail.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;
pub mod status;
pub mod validator;

#[cfg(test)]
mod tests;

pub use domain::{
    Application, ApplicationFilter, ApplicationId, ApplicationStatus, ApplicationSubmission,
    DocumentReference, StatusChange, StatusChangeRequest, StatusSummary, SubmissionKey,
};
pub use repository::{
    ApplicationRepository, Notification, NotificationError, NotificationPublisher,
};
pub use router::application_router;
pub use service::ApplicationService;
pub use status::{Permit, Transition, TRANSITIONS};
pub use validator::{SubmissionValidator, ValidatedSubmission};
