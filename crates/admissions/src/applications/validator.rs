use std::sync::Arc;

use super::domain::{ApplicationSubmission, DocumentReference, SubmissionKey};
use super::repository::ApplicationRepository;
use crate::catalog::{CatalogRepository, MappingEntry};
use crate::error::AdmissionError;
use crate::principal::{CandidateId, Principal};

/// A submission that passed every creation check and may be persisted.
#[derive(Debug, Clone)]
pub struct ValidatedSubmission {
    pub candidate_id: CandidateId,
    pub submission: ApplicationSubmission,
    pub mapping: MappingEntry,
}

impl ValidatedSubmission {
    pub fn key(&self) -> SubmissionKey {
        SubmissionKey {
            candidate_id: self.candidate_id.clone(),
            mapping: self.mapping.key(),
        }
    }
}

/// Runs the creation checks in a fixed order and stops at the first failure.
///
/// The duplicate check here gives an early answer; the repository enforces the same
/// uniqueness atomically on insert.
pub struct SubmissionValidator<C, R> {
    catalog: Arc<C>,
    applications: Arc<R>,
}

impl<C, R> SubmissionValidator<C, R>
where
    C: CatalogRepository + 'static,
    R: ApplicationRepository + 'static,
{
    pub fn new(catalog: Arc<C>, applications: Arc<R>) -> Self {
        Self {
            catalog,
            applications,
        }
    }

    pub fn validate(
        &self,
        principal: &Principal,
        submission: ApplicationSubmission,
    ) -> Result<ValidatedSubmission, AdmissionError> {
        principal.require_candidate()?;
        check_documents(&submission.documents)?;

        let university = self
            .catalog
            .university(&submission.university_id)?
            .filter(|university| university.is_active)
            .ok_or_else(|| AdmissionError::not_found("university", submission.university_id))?;

        let major = self
            .catalog
            .major(&submission.major_id)?
            .filter(|major| major.is_active)
            .ok_or_else(|| AdmissionError::not_found("major", submission.major_id))?;
        if major.university_id != university.id {
            return Err(AdmissionError::validation(format!(
                "major {} does not belong to university {}",
                major.code, university.code
            )));
        }

        let mapping = self
            .catalog
            .find_mapping_entry(&submission.mapping_key())?
            .ok_or_else(|| {
                AdmissionError::not_found(
                    "mapping entry",
                    format!("for major {} in {}", major.code, submission.year),
                )
            })?;
        self.catalog
            .admission_method(&mapping.admission_method_id)?
            .filter(|method| method.is_active)
            .ok_or_else(|| {
                AdmissionError::not_found("admission method", mapping.admission_method_id)
            })?;
        self.catalog
            .subject_group(&mapping.subject_group_id)?
            .filter(|group| group.is_active)
            .ok_or_else(|| AdmissionError::not_found("subject group", mapping.subject_group_id))?;

        let validated = ValidatedSubmission {
            candidate_id: principal.candidate_id(),
            submission,
            mapping,
        };
        if self.applications.find_active(&validated.key())?.is_some() {
            return Err(AdmissionError::DuplicateSubmission);
        }
        Ok(validated)
    }
}

fn check_documents(documents: &[DocumentReference]) -> Result<(), AdmissionError> {
    for (index, document) in documents.iter().enumerate() {
        if document.name.trim().is_empty() {
            return Err(AdmissionError::validation(format!(
                "document {index} is missing a name"
            )));
        }
        if document.storage_key.trim().is_empty() {
            return Err(AdmissionError::validation(format!(
                "document '{}' is missing a storage key",
                document.name
            )));
        }
    }
    Ok(())
}
