use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::domain::entity_id;
use crate::catalog::{
    AcademicYear, AdmissionMethodId, MajorId, MappingKey, SubjectGroupId, UniversityId,
};
use crate::principal::{CandidateId, Principal};

entity_id!(
    /// Identifier wrapper for submitted applications.
    ApplicationId
);

/// Lifecycle status of an application. Transitions are governed by `status::TRANSITIONS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Processing,
    Approved,
    Rejected,
    AdditionalRequired,
    Cancelled,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 6] = [
        ApplicationStatus::Pending,
        ApplicationStatus::Processing,
        ApplicationStatus::Approved,
        ApplicationStatus::Rejected,
        ApplicationStatus::AdditionalRequired,
        ApplicationStatus::Cancelled,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Processing => "processing",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::AdditionalRequired => "additional_required",
            ApplicationStatus::Cancelled => "cancelled",
        }
    }

    /// Final decisions. The candidate is notified when an application lands here.
    pub const fn is_terminal(self) -> bool {
        matches!(self, ApplicationStatus::Approved | ApplicationStatus::Rejected)
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Reference to a file held by the document storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentReference {
    pub name: String,
    pub storage_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// One entry of the append-only audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub from: ApplicationStatus,
    pub to: ApplicationStatus,
    pub actor: Principal,
    pub at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A candidate's submission for one eligibility combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub candidate_id: CandidateId,
    pub university_id: UniversityId,
    pub major_id: MajorId,
    pub admission_method_id: AdmissionMethodId,
    pub subject_group_id: SubjectGroupId,
    pub year: AcademicYear,
    pub status: ApplicationStatus,
    pub submission_date: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub documents: Vec<DocumentReference>,
    /// Optimistic-concurrency token, bumped by the repository on every write.
    pub version: u64,
    pub history: Vec<StatusChange>,
}

impl Application {
    pub fn mapping_key(&self) -> MappingKey {
        MappingKey {
            major_id: self.major_id,
            admission_method_id: self.admission_method_id,
            subject_group_id: self.subject_group_id,
            year: self.year,
        }
    }

    pub fn submission_key(&self) -> SubmissionKey {
        SubmissionKey {
            candidate_id: self.candidate_id.clone(),
            mapping: self.mapping_key(),
        }
    }
}

/// At most one non-cancelled application may exist per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubmissionKey {
    pub candidate_id: CandidateId,
    pub mapping: MappingKey,
}

/// Candidate payload for creating an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApplicationSubmission {
    pub university_id: UniversityId,
    pub major_id: MajorId,
    pub admission_method_id: AdmissionMethodId,
    pub subject_group_id: SubjectGroupId,
    pub year: AcademicYear,
    #[serde(default)]
    pub documents: Vec<DocumentReference>,
}

impl ApplicationSubmission {
    pub fn mapping_key(&self) -> MappingKey {
        MappingKey {
            major_id: self.major_id,
            admission_method_id: self.admission_method_id,
            subject_group_id: self.subject_group_id,
            year: self.year,
        }
    }
}

/// Administrator or candidate request to move an application to a new status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatusChangeRequest {
    pub status: ApplicationStatus,
    #[serde(default)]
    pub expected_version: Option<u64>,
    #[serde(default)]
    pub note: Option<String>,
}

impl StatusChangeRequest {
    pub fn to(status: ApplicationStatus) -> Self {
        Self {
            status,
            expected_version: None,
            note: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApplicationFilter {
    #[serde(default)]
    pub status: Option<ApplicationStatus>,
    #[serde(default)]
    pub university_id: Option<UniversityId>,
    #[serde(default)]
    pub major_id: Option<MajorId>,
    #[serde(default)]
    pub year: Option<AcademicYear>,
}

impl ApplicationFilter {
    pub fn matches(&self, application: &Application) -> bool {
        self.status.map_or(true, |status| application.status == status)
            && self
                .university_id
                .map_or(true, |id| application.university_id == id)
            && self.major_id.map_or(true, |id| application.major_id == id)
            && self.year.map_or(true, |year| application.year == year)
    }
}

/// Count of applications per status for the administrator dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub total: usize,
    pub by_status: BTreeMap<ApplicationStatus, usize>,
}

impl StatusSummary {
    pub fn tally<'a>(applications: impl IntoIterator<Item = &'a Application>) -> Self {
        let mut by_status: BTreeMap<ApplicationStatus, usize> = ApplicationStatus::ALL
            .iter()
            .map(|status| (*status, 0))
            .collect();
        let mut total = 0;
        for application in applications {
            *by_status.entry(application.status).or_default() += 1;
            total += 1;
        }
        Self { total, by_status }
    }
}
