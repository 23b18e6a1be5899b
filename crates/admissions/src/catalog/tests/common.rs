use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::catalog::domain::{
    AcademicYear, AdmissionMethod, AdmissionMethodId, Major, MajorId, MappingEntry,
    MappingEntryId, MappingKey, NewAdmissionMethod, NewMajor, NewMappingEntry, NewSubjectGroup,
    NewUniversity, SubjectGroup, SubjectGroupId, University, UniversityId,
};
use crate::catalog::{CatalogRepository, CatalogService};
use crate::persistence::{InMemoryStore, RepositoryError};
use crate::principal::Principal;

pub(super) fn admin() -> Principal {
    Principal::administrator("registrar")
}

pub(super) fn year(value: i64) -> AcademicYear {
    AcademicYear::new(value).expect("valid year")
}

/// University U with major M, methods THPT and HB, groups A00 and A01 and one 2025 mapping.
pub(super) struct Fixture {
    pub(super) store: Arc<InMemoryStore>,
    pub(super) service: CatalogService<InMemoryStore>,
    pub(super) university: University,
    pub(super) major: Major,
    pub(super) exam: AdmissionMethod,
    pub(super) transcript: AdmissionMethod,
    pub(super) science: SubjectGroup,
    pub(super) english: SubjectGroup,
    pub(super) entry: MappingEntry,
}

impl Fixture {
    pub(super) fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let service = CatalogService::new(store.clone());
        let admin = admin();

        let university = service
            .create_university(
                &admin,
                NewUniversity {
                    name: "National University".to_string(),
                    code: "nu".to_string(),
                },
            )
            .expect("university created");
        let major = service
            .create_major(
                &admin,
                NewMajor {
                    name: "Computer Science".to_string(),
                    code: "CS".to_string(),
                    university_id: university.id,
                },
            )
            .expect("major created");
        let exam = service
            .create_admission_method(
                &admin,
                NewAdmissionMethod {
                    name: "National exam".to_string(),
                    code: "THPT".to_string(),
                },
            )
            .expect("method created");
        let transcript = service
            .create_admission_method(
                &admin,
                NewAdmissionMethod {
                    name: "Transcript review".to_string(),
                    code: "HB".to_string(),
                },
            )
            .expect("method created");
        let science = service
            .create_subject_group(
                &admin,
                NewSubjectGroup {
                    name: "Science".to_string(),
                    code: "A00".to_string(),
                    subjects: vec![
                        "Maths".to_string(),
                        "Physics".to_string(),
                        "Chemistry".to_string(),
                    ],
                },
            )
            .expect("group created");
        let english = service
            .create_subject_group(
                &admin,
                NewSubjectGroup {
                    name: "Science and English".to_string(),
                    code: "A01".to_string(),
                    subjects: vec![
                        "Maths".to_string(),
                        "Physics".to_string(),
                        "English".to_string(),
                    ],
                },
            )
            .expect("group created");
        let entry = service
            .create_mapping_entry(
                &admin,
                NewMappingEntry {
                    major_id: major.id,
                    admission_method_id: exam.id,
                    subject_group_id: science.id,
                    year: year(2025),
                    min_score: Some(24.0),
                },
            )
            .expect("mapping created");

        Self {
            store,
            service,
            university,
            major,
            exam,
            transcript,
            science,
            english,
            entry,
        }
    }

    pub(super) fn map(
        &self,
        method: &AdmissionMethod,
        group: &SubjectGroup,
        year_value: i64,
    ) -> MappingEntry {
        self.service
            .create_mapping_entry(
                &admin(),
                NewMappingEntry {
                    major_id: self.major.id,
                    admission_method_id: method.id,
                    subject_group_id: group.id,
                    year: year(year_value),
                    min_score: None,
                },
            )
            .expect("mapping created")
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Repository whose backing store is down.
pub(super) struct UnavailableCatalog;

fn unavailable<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("catalog offline".to_string()))
}

impl CatalogRepository for UnavailableCatalog {
    fn insert_university(&self, _university: University) -> Result<University, RepositoryError> {
        unavailable()
    }

    fn update_university(&self, _university: University) -> Result<University, RepositoryError> {
        unavailable()
    }

    fn university(&self, _id: &UniversityId) -> Result<Option<University>, RepositoryError> {
        unavailable()
    }

    fn universities(&self) -> Result<Vec<University>, RepositoryError> {
        unavailable()
    }

    fn insert_major(&self, _major: Major) -> Result<Major, RepositoryError> {
        unavailable()
    }

    fn update_major(&self, _major: Major) -> Result<Major, RepositoryError> {
        unavailable()
    }

    fn major(&self, _id: &MajorId) -> Result<Option<Major>, RepositoryError> {
        unavailable()
    }

    fn majors_for_university(&self, _id: &UniversityId) -> Result<Vec<Major>, RepositoryError> {
        unavailable()
    }

    fn insert_admission_method(
        &self,
        _method: AdmissionMethod,
    ) -> Result<AdmissionMethod, RepositoryError> {
        unavailable()
    }

    fn update_admission_method(
        &self,
        _method: AdmissionMethod,
    ) -> Result<AdmissionMethod, RepositoryError> {
        unavailable()
    }

    fn admission_method(
        &self,
        _id: &AdmissionMethodId,
    ) -> Result<Option<AdmissionMethod>, RepositoryError> {
        unavailable()
    }

    fn admission_methods(&self) -> Result<Vec<AdmissionMethod>, RepositoryError> {
        unavailable()
    }

    fn insert_subject_group(&self, _group: SubjectGroup) -> Result<SubjectGroup, RepositoryError> {
        unavailable()
    }

    fn update_subject_group(&self, _group: SubjectGroup) -> Result<SubjectGroup, RepositoryError> {
        unavailable()
    }

    fn subject_group(&self, _id: &SubjectGroupId) -> Result<Option<SubjectGroup>, RepositoryError> {
        unavailable()
    }

    fn subject_groups(&self) -> Result<Vec<SubjectGroup>, RepositoryError> {
        unavailable()
    }

    fn insert_mapping_entry(&self, _entry: MappingEntry) -> Result<MappingEntry, RepositoryError> {
        unavailable()
    }

    fn mapping_entry(&self, _id: &MappingEntryId) -> Result<Option<MappingEntry>, RepositoryError> {
        unavailable()
    }

    fn find_mapping_entry(
        &self,
        _key: &MappingKey,
    ) -> Result<Option<MappingEntry>, RepositoryError> {
        unavailable()
    }

    fn mapping_entries_for(
        &self,
        _major_id: &MajorId,
        _year: AcademicYear,
    ) -> Result<Vec<MappingEntry>, RepositoryError> {
        unavailable()
    }

    fn remove_mapping_entry(&self, _id: &MappingEntryId) -> Result<MappingEntry, RepositoryError> {
        unavailable()
    }
}
