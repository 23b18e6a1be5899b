use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::domain::{
    Application, ApplicationFilter, ApplicationId, ApplicationStatus, ApplicationSubmission,
    StatusChange, StatusChangeRequest, StatusSummary,
};
use super::repository::{ApplicationRepository, Notification, NotificationPublisher};
use super::status;
use super::validator::SubmissionValidator;
use crate::catalog::CatalogRepository;
use crate::error::AdmissionError;
use crate::persistence::RepositoryError;
use crate::principal::Principal;

/// Service composing the submission validator, the application repository and the
/// notification collaborator.
pub struct ApplicationService<C, R, N> {
    validator: SubmissionValidator<C, R>,
    repository: Arc<R>,
    notifier: Arc<N>,
}

impl<C, R, N> ApplicationService<C, R, N>
where
    C: CatalogRepository + 'static,
    R: ApplicationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(catalog: Arc<C>, repository: Arc<R>, notifier: Arc<N>) -> Self {
        let validator = SubmissionValidator::new(catalog, repository.clone());
        Self {
            validator,
            repository,
            notifier,
        }
    }

    /// Create a `pending` application after every creation check passes.
    pub fn submit(
        &self,
        principal: &Principal,
        submission: ApplicationSubmission,
    ) -> Result<Application, AdmissionError> {
        let validated = self.validator.validate(principal, submission)?;
        let now = Utc::now();
        let submission = validated.submission;

        let application = Application {
            id: ApplicationId::generate(),
            candidate_id: validated.candidate_id,
            university_id: submission.university_id,
            major_id: submission.major_id,
            admission_method_id: submission.admission_method_id,
            subject_group_id: submission.subject_group_id,
            year: submission.year,
            status: ApplicationStatus::Pending,
            submission_date: now,
            updated_at: now,
            documents: submission.documents,
            version: 1,
            history: vec![StatusChange {
                from: ApplicationStatus::Pending,
                to: ApplicationStatus::Pending,
                actor: principal.clone(),
                at: now,
                note: None,
            }],
        };

        let stored = self
            .repository
            .insert(application)
            .map_err(|err| match err {
                RepositoryError::Conflict("application_submission") => {
                    AdmissionError::DuplicateSubmission
                }
                RepositoryError::MissingReference(entity) => {
                    AdmissionError::not_found(entity, "for submitted combination")
                }
                other => AdmissionError::from(other),
            })?;

        info!(
            application_id = %stored.id,
            candidate_id = %stored.candidate_id,
            major_id = %stored.major_id,
            year = %stored.year,
            "application submitted"
        );
        Ok(stored)
    }

    /// Move an application along the transition table and append to its audit trail.
    pub fn transition(
        &self,
        principal: &Principal,
        id: &ApplicationId,
        request: StatusChangeRequest,
    ) -> Result<Application, AdmissionError> {
        let current = self.get(principal, id)?;

        if let Some(expected) = request.expected_version {
            if expected != current.version {
                return Err(AdmissionError::ConcurrentModification);
            }
        }

        let from = current.status;
        let to = request.status;
        status::authorize(principal, &current.candidate_id, from, to)?;

        let now = Utc::now();
        let read_version = current.version;
        let mut next = current;
        next.status = to;
        next.updated_at = now;
        next.history.push(StatusChange {
            from,
            to,
            actor: principal.clone(),
            at: now,
            note: request.note.filter(|note| !note.trim().is_empty()),
        });

        let stored = self.repository.replace(next, read_version)?;
        info!(
            application_id = %stored.id,
            %from,
            %to,
            actor = %principal,
            version = stored.version,
            "application status changed"
        );

        if to.is_terminal() {
            self.notify(&stored);
        }
        Ok(stored)
    }

    /// Administrators read any application; candidates only their own.
    pub fn get(
        &self,
        principal: &Principal,
        id: &ApplicationId,
    ) -> Result<Application, AdmissionError> {
        let application = self
            .repository
            .fetch(id)?
            .ok_or_else(|| AdmissionError::not_found("application", id))?;

        if !principal.can_act_for(&application.candidate_id) {
            return Err(AdmissionError::forbidden(format!(
                "{principal} may not access application {id}"
            )));
        }
        Ok(application)
    }

    pub fn history(
        &self,
        principal: &Principal,
        id: &ApplicationId,
    ) -> Result<Vec<StatusChange>, AdmissionError> {
        Ok(self.get(principal, id)?.history)
    }

    /// The caller's own applications, newest first.
    pub fn list_for_candidate(
        &self,
        principal: &Principal,
    ) -> Result<Vec<Application>, AdmissionError> {
        let mut applications = self.repository.for_candidate(&principal.candidate_id())?;
        applications.sort_by(|left, right| {
            right
                .submission_date
                .cmp(&left.submission_date)
                .then_with(|| right.id.cmp(&left.id))
        });
        Ok(applications)
    }

    pub fn list(
        &self,
        principal: &Principal,
        filter: &ApplicationFilter,
    ) -> Result<Vec<Application>, AdmissionError> {
        principal.require_administrator()?;
        let mut applications = self.repository.list(filter)?;
        applications.sort_by(|left, right| {
            left.submission_date
                .cmp(&right.submission_date)
                .then_with(|| left.id.cmp(&right.id))
        });
        Ok(applications)
    }

    pub fn status_summary(
        &self,
        principal: &Principal,
        filter: &ApplicationFilter,
    ) -> Result<StatusSummary, AdmissionError> {
        principal.require_administrator()?;
        let applications = self.repository.list(filter)?;
        Ok(StatusSummary::tally(&applications))
    }

    fn notify(&self, application: &Application) {
        let mut details = BTreeMap::new();
        details.insert("decision".to_string(), application.status.to_string());
        details.insert("year".to_string(), application.year.to_string());
        details.insert("major_id".to_string(), application.major_id.to_string());
        if let Some(note) = application.history.last().and_then(|change| change.note.clone()) {
            details.insert("note".to_string(), note);
        }

        let notification = Notification {
            template: format!("application_{}", application.status.label()),
            application_id: application.id,
            candidate_id: application.candidate_id.clone(),
            status: application.status,
            details,
        };

        if let Err(err) = self.notifier.publish(notification) {
            warn!(
                application_id = %application.id,
                status = %application.status,
                error = %err,
                "decision notification failed"
            );
        }
    }
}
