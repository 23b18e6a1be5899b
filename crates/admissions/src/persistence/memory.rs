use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::RepositoryError;
use crate::applications::{
    Application, ApplicationFilter, ApplicationId, ApplicationRepository, ApplicationStatus,
    SubmissionKey,
};
use crate::catalog::{
    AcademicYear, AdmissionMethod, AdmissionMethodId, CatalogRepository, Major, MajorId,
    MappingEntry, MappingEntryId, MappingKey, SubjectGroup, SubjectGroupId, University,
    UniversityId,
};
use crate::principal::CandidateId;

/// Process-local persistence context implementing both repositories.
///
/// Reference data sits behind a `RwLock` so eligibility reads never block each other.
/// Applications sit behind a `Mutex`; when both are needed the catalog lock is taken first.
#[derive(Default)]
pub struct InMemoryStore {
    catalog: RwLock<CatalogTables>,
    applications: Mutex<ApplicationTables>,
}

#[derive(Default)]
struct CatalogTables {
    universities: BTreeMap<UniversityId, University>,
    majors: BTreeMap<MajorId, Major>,
    admission_methods: BTreeMap<AdmissionMethodId, AdmissionMethod>,
    subject_groups: BTreeMap<SubjectGroupId, SubjectGroup>,
    mapping_entries: BTreeMap<MappingEntryId, MappingEntry>,
    mapping_index: HashMap<MappingKey, MappingEntryId>,
}

#[derive(Default)]
struct ApplicationTables {
    records: BTreeMap<ApplicationId, Application>,
    /// Unique index over non-cancelled applications.
    live_submissions: HashMap<SubmissionKey, ApplicationId>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn catalog_read(&self) -> Result<RwLockReadGuard<'_, CatalogTables>, RepositoryError> {
        self.catalog
            .read()
            .map_err(|_| RepositoryError::Unavailable("catalog lock poisoned".to_string()))
    }

    fn catalog_write(&self) -> Result<RwLockWriteGuard<'_, CatalogTables>, RepositoryError> {
        self.catalog
            .write()
            .map_err(|_| RepositoryError::Unavailable("catalog lock poisoned".to_string()))
    }

    fn applications(&self) -> Result<MutexGuard<'_, ApplicationTables>, RepositoryError> {
        self.applications
            .lock()
            .map_err(|_| RepositoryError::Unavailable("application lock poisoned".to_string()))
    }
}

fn same_text(left: &str, right: &str) -> bool {
    left.trim().to_lowercase() == right.trim().to_lowercase()
}

impl CatalogTables {
    fn check_university(&self, university: &University) -> Result<(), RepositoryError> {
        if !university.is_active {
            return Ok(());
        }
        let taken = self.universities.values().any(|other| {
            other.id != university.id && other.is_active && same_text(&other.code, &university.code)
        });
        if taken {
            return Err(RepositoryError::Conflict("university_code"));
        }
        Ok(())
    }

    fn check_major(&self, major: &Major) -> Result<(), RepositoryError> {
        if !self.universities.contains_key(&major.university_id) {
            return Err(RepositoryError::MissingReference("university"));
        }
        let taken = self.majors.values().any(|other| {
            other.id != major.id
                && other.university_id == major.university_id
                && same_text(&other.code, &major.code)
        });
        if taken {
            return Err(RepositoryError::Conflict("major_code"));
        }
        Ok(())
    }

    fn check_admission_method(&self, method: &AdmissionMethod) -> Result<(), RepositoryError> {
        let others = self
            .admission_methods
            .values()
            .filter(|other| other.id != method.id);
        for other in others {
            if same_text(&other.name, &method.name) {
                return Err(RepositoryError::Conflict("admission_method_name"));
            }
            if same_text(&other.code, &method.code) {
                return Err(RepositoryError::Conflict("admission_method_code"));
            }
        }
        Ok(())
    }

    fn check_subject_group(&self, group: &SubjectGroup) -> Result<(), RepositoryError> {
        let taken = self
            .subject_groups
            .values()
            .any(|other| other.id != group.id && same_text(&other.code, &group.code));
        if taken {
            return Err(RepositoryError::Conflict("subject_group_code"));
        }
        Ok(())
    }
}

impl CatalogRepository for InMemoryStore {
    fn insert_university(&self, university: University) -> Result<University, RepositoryError> {
        let mut tables = self.catalog_write()?;
        if tables.universities.contains_key(&university.id) {
            return Err(RepositoryError::Conflict("university_id"));
        }
        tables.check_university(&university)?;
        tables
            .universities
            .insert(university.id, university.clone());
        Ok(university)
    }

    fn update_university(&self, university: University) -> Result<University, RepositoryError> {
        let mut tables = self.catalog_write()?;
        if !tables.universities.contains_key(&university.id) {
            return Err(RepositoryError::NotFound);
        }
        tables.check_university(&university)?;
        tables
            .universities
            .insert(university.id, university.clone());
        Ok(university)
    }

    fn university(&self, id: &UniversityId) -> Result<Option<University>, RepositoryError> {
        Ok(self.catalog_read()?.universities.get(id).cloned())
    }

    fn universities(&self) -> Result<Vec<University>, RepositoryError> {
        Ok(self.catalog_read()?.universities.values().cloned().collect())
    }

    fn insert_major(&self, major: Major) -> Result<Major, RepositoryError> {
        let mut tables = self.catalog_write()?;
        if tables.majors.contains_key(&major.id) {
            return Err(RepositoryError::Conflict("major_id"));
        }
        tables.check_major(&major)?;
        tables.majors.insert(major.id, major.clone());
        Ok(major)
    }

    fn update_major(&self, major: Major) -> Result<Major, RepositoryError> {
        let mut tables = self.catalog_write()?;
        if !tables.majors.contains_key(&major.id) {
            return Err(RepositoryError::NotFound);
        }
        tables.check_major(&major)?;
        tables.majors.insert(major.id, major.clone());
        Ok(major)
    }

    fn major(&self, id: &MajorId) -> Result<Option<Major>, RepositoryError> {
        Ok(self.catalog_read()?.majors.get(id).cloned())
    }

    fn majors_for_university(&self, id: &UniversityId) -> Result<Vec<Major>, RepositoryError> {
        Ok(self
            .catalog_read()?
            .majors
            .values()
            .filter(|major| major.university_id == *id)
            .cloned()
            .collect())
    }

    fn insert_admission_method(
        &self,
        method: AdmissionMethod,
    ) -> Result<AdmissionMethod, RepositoryError> {
        let mut tables = self.catalog_write()?;
        if tables.admission_methods.contains_key(&method.id) {
            return Err(RepositoryError::Conflict("admission_method_id"));
        }
        tables.check_admission_method(&method)?;
        tables.admission_methods.insert(method.id, method.clone());
        Ok(method)
    }

    fn update_admission_method(
        &self,
        method: AdmissionMethod,
    ) -> Result<AdmissionMethod, RepositoryError> {
        let mut tables = self.catalog_write()?;
        if !tables.admission_methods.contains_key(&method.id) {
            return Err(RepositoryError::NotFound);
        }
        tables.check_admission_method(&method)?;
        tables.admission_methods.insert(method.id, method.clone());
        Ok(method)
    }

    fn admission_method(
        &self,
        id: &AdmissionMethodId,
    ) -> Result<Option<AdmissionMethod>, RepositoryError> {
        Ok(self.catalog_read()?.admission_methods.get(id).cloned())
    }

    fn admission_methods(&self) -> Result<Vec<AdmissionMethod>, RepositoryError> {
        Ok(self
            .catalog_read()?
            .admission_methods
            .values()
            .cloned()
            .collect())
    }

    fn insert_subject_group(&self, group: SubjectGroup) -> Result<SubjectGroup, RepositoryError> {
        let mut tables = self.catalog_write()?;
        if tables.subject_groups.contains_key(&group.id) {
            return Err(RepositoryError::Conflict("subject_group_id"));
        }
        tables.check_subject_group(&group)?;
        tables.subject_groups.insert(group.id, group.clone());
        Ok(group)
    }

    fn update_subject_group(&self, group: SubjectGroup) -> Result<SubjectGroup, RepositoryError> {
        let mut tables = self.catalog_write()?;
        if !tables.subject_groups.contains_key(&group.id) {
            return Err(RepositoryError::NotFound);
        }
        tables.check_subject_group(&group)?;
        tables.subject_groups.insert(group.id, group.clone());
        Ok(group)
    }

    fn subject_group(&self, id: &SubjectGroupId) -> Result<Option<SubjectGroup>, RepositoryError> {
        Ok(self.catalog_read()?.subject_groups.get(id).cloned())
    }

    fn subject_groups(&self) -> Result<Vec<SubjectGroup>, RepositoryError> {
        Ok(self.catalog_read()?.subject_groups.values().cloned().collect())
    }

    fn insert_mapping_entry(&self, entry: MappingEntry) -> Result<MappingEntry, RepositoryError> {
        let mut tables = self.catalog_write()?;
        if !tables.majors.contains_key(&entry.major_id) {
            return Err(RepositoryError::MissingReference("major"));
        }
        if !tables
            .admission_methods
            .contains_key(&entry.admission_method_id)
        {
            return Err(RepositoryError::MissingReference("admission_method"));
        }
        if !tables.subject_groups.contains_key(&entry.subject_group_id) {
            return Err(RepositoryError::MissingReference("subject_group"));
        }
        if tables.mapping_entries.contains_key(&entry.id) {
            return Err(RepositoryError::Conflict("mapping_entry_id"));
        }

        let key = entry.key();
        if tables.mapping_index.contains_key(&key) {
            return Err(RepositoryError::Conflict("mapping_entry_key"));
        }
        tables.mapping_index.insert(key, entry.id);
        tables.mapping_entries.insert(entry.id, entry.clone());
        Ok(entry)
    }

    fn mapping_entry(&self, id: &MappingEntryId) -> Result<Option<MappingEntry>, RepositoryError> {
        Ok(self.catalog_read()?.mapping_entries.get(id).cloned())
    }

    fn find_mapping_entry(
        &self,
        key: &MappingKey,
    ) -> Result<Option<MappingEntry>, RepositoryError> {
        let tables = self.catalog_read()?;
        Ok(tables
            .mapping_index
            .get(key)
            .and_then(|id| tables.mapping_entries.get(id))
            .cloned())
    }

    fn mapping_entries_for(
        &self,
        major_id: &MajorId,
        year: AcademicYear,
    ) -> Result<Vec<MappingEntry>, RepositoryError> {
        Ok(self
            .catalog_read()?
            .mapping_entries
            .values()
            .filter(|entry| entry.major_id == *major_id && entry.year == year)
            .cloned()
            .collect())
    }

    fn remove_mapping_entry(&self, id: &MappingEntryId) -> Result<MappingEntry, RepositoryError> {
        let mut tables = self.catalog_write()?;
        let key = tables
            .mapping_entries
            .get(id)
            .map(MappingEntry::key)
            .ok_or(RepositoryError::NotFound)?;

        let referenced = self
            .applications()?
            .records
            .values()
            .any(|application| application.mapping_key() == key);
        if referenced {
            return Err(RepositoryError::InUse("application"));
        }

        tables.mapping_index.remove(&key);
        tables
            .mapping_entries
            .remove(id)
            .ok_or(RepositoryError::NotFound)
    }
}

impl ApplicationRepository for InMemoryStore {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError> {
        let catalog = self.catalog_read()?;
        if !catalog
            .mapping_index
            .contains_key(&application.mapping_key())
        {
            return Err(RepositoryError::MissingReference("mapping_entry"));
        }

        let mut tables = self.applications()?;
        if tables.records.contains_key(&application.id) {
            return Err(RepositoryError::Conflict("application_id"));
        }

        let key = application.submission_key();
        if application.status != ApplicationStatus::Cancelled {
            if tables.live_submissions.contains_key(&key) {
                return Err(RepositoryError::Conflict("application_submission"));
            }
            tables.live_submissions.insert(key, application.id);
        }
        tables.records.insert(application.id, application.clone());
        Ok(application)
    }

    fn replace(
        &self,
        mut application: Application,
        expected_version: u64,
    ) -> Result<Application, RepositoryError> {
        let mut tables = self.applications()?;
        let stored = tables
            .records
            .get(&application.id)
            .ok_or(RepositoryError::NotFound)?;

        if stored.version != expected_version {
            return Err(RepositoryError::Stale {
                expected: expected_version,
                found: stored.version,
            });
        }

        let was_live = stored.status != ApplicationStatus::Cancelled;
        let key = stored.submission_key();
        application.version = expected_version + 1;

        if was_live && application.status == ApplicationStatus::Cancelled {
            tables.live_submissions.remove(&key);
        }
        tables.records.insert(application.id, application.clone());
        Ok(application)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Ok(self.applications()?.records.get(id).cloned())
    }

    fn find_active(&self, key: &SubmissionKey) -> Result<Option<Application>, RepositoryError> {
        let tables = self.applications()?;
        Ok(tables
            .live_submissions
            .get(key)
            .and_then(|id| tables.records.get(id))
            .cloned())
    }

    fn for_candidate(&self, candidate: &CandidateId) -> Result<Vec<Application>, RepositoryError> {
        Ok(self
            .applications()?
            .records
            .values()
            .filter(|application| application.candidate_id == *candidate)
            .cloned()
            .collect())
    }

    fn list(&self, filter: &ApplicationFilter) -> Result<Vec<Application>, RepositoryError> {
        Ok(self
            .applications()?
            .records
            .values()
            .filter(|application| filter.matches(application))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::principal::Principal;
    use chrono::Utc;
    use std::sync::Arc;
    use std::thread;

    fn seeded_store() -> (InMemoryStore, MappingEntry, UniversityId) {
        let store = InMemoryStore::new();
        let university = store
            .insert_university(University {
                id: UniversityId::generate(),
                name: "Hanoi University of Science and Technology".to_string(),
                code: "BKA".to_string(),
                is_active: true,
            })
            .expect("university stored");
        let major = store
            .insert_major(Major {
                id: MajorId::generate(),
                name: "Computer Science".to_string(),
                code: "IT1".to_string(),
                university_id: university.id,
                is_active: true,
            })
            .expect("major stored");
        let method = store
            .insert_admission_method(AdmissionMethod {
                id: AdmissionMethodId::generate(),
                name: "National exam".to_string(),
                code: "THPT".to_string(),
                is_active: true,
            })
            .expect("method stored");
        let group = store
            .insert_subject_group(SubjectGroup {
                id: SubjectGroupId::generate(),
                name: "Maths, Physics, Chemistry".to_string(),
                code: "A00".to_string(),
                subjects: vec!["Maths".into(), "Physics".into(), "Chemistry".into()],
                is_active: true,
            })
            .expect("group stored");
        let entry = store
            .insert_mapping_entry(MappingEntry {
                id: MappingEntryId::generate(),
                major_id: major.id,
                admission_method_id: method.id,
                subject_group_id: group.id,
                year: AcademicYear::new(2025).expect("valid year"),
                min_score: Some(24.0),
            })
            .expect("mapping stored");
        (store, entry, university.id)
    }

    fn application_for(entry: &MappingEntry, university_id: UniversityId) -> Application {
        let now = Utc::now();
        Application {
            id: ApplicationId::generate(),
            candidate_id: CandidateId("cand-1".to_string()),
            university_id,
            major_id: entry.major_id,
            admission_method_id: entry.admission_method_id,
            subject_group_id: entry.subject_group_id,
            year: entry.year,
            status: ApplicationStatus::Pending,
            submission_date: now,
            updated_at: now,
            documents: Vec::new(),
            version: 1,
            history: Vec::new(),
        }
    }

    #[test]
    fn active_university_codes_are_unique_case_insensitively() {
        let (store, _, _) = seeded_store();
        let clash = University {
            id: UniversityId::generate(),
            name: "Another".to_string(),
            code: "bka".to_string(),
            is_active: true,
        };
        assert_eq!(
            store.insert_university(clash.clone()),
            Err(RepositoryError::Conflict("university_code"))
        );

        let inactive = University {
            is_active: false,
            ..clash
        };
        assert!(store.insert_university(inactive).is_ok());
    }

    #[test]
    fn duplicate_mapping_tuples_conflict() {
        let (store, entry, _) = seeded_store();
        let duplicate = MappingEntry {
            id: MappingEntryId::generate(),
            min_score: None,
            ..entry
        };
        assert_eq!(
            store.insert_mapping_entry(duplicate),
            Err(RepositoryError::Conflict("mapping_entry_key"))
        );
    }

    #[test]
    fn majors_require_an_existing_university() {
        let store = InMemoryStore::new();
        let orphan = Major {
            id: MajorId::generate(),
            name: "Physics".to_string(),
            code: "PH1".to_string(),
            university_id: UniversityId::generate(),
            is_active: true,
        };
        assert_eq!(
            store.insert_major(orphan),
            Err(RepositoryError::MissingReference("university"))
        );
    }

    #[test]
    fn replace_rejects_stale_versions_and_bumps_on_success() {
        let (store, entry, university_id) = seeded_store();
        let application = store
            .insert(application_for(&entry, university_id))
            .expect("insert succeeds");

        let mut processing = application.clone();
        processing.status = ApplicationStatus::Processing;
        let stored = store.replace(processing, 1).expect("fresh write succeeds");
        assert_eq!(stored.version, 2);

        let mut stale = application;
        stale.status = ApplicationStatus::Rejected;
        assert_eq!(
            store.replace(stale, 1),
            Err(RepositoryError::Stale {
                expected: 1,
                found: 2
            })
        );
        let current = store
            .fetch(&stored.id)
            .expect("fetch succeeds")
            .expect("record present");
        assert_eq!(current.status, ApplicationStatus::Processing);
    }

    #[test]
    fn cancelling_frees_the_submission_slot() {
        let (store, entry, university_id) = seeded_store();
        let first = store
            .insert(application_for(&entry, university_id))
            .expect("first insert");
        assert_eq!(
            store.insert(application_for(&entry, university_id)),
            Err(RepositoryError::Conflict("application_submission"))
        );

        let mut cancelled = first.clone();
        cancelled.status = ApplicationStatus::Cancelled;
        store.replace(cancelled, first.version).expect("cancel");

        assert!(store
            .find_active(&first.submission_key())
            .expect("lookup")
            .is_none());
        assert!(store.insert(application_for(&entry, university_id)).is_ok());
    }

    #[test]
    fn referenced_mapping_entries_cannot_be_removed() {
        let (store, entry, university_id) = seeded_store();
        store
            .insert(application_for(&entry, university_id))
            .expect("insert");
        assert_eq!(
            store.remove_mapping_entry(&entry.id),
            Err(RepositoryError::InUse("application"))
        );
    }

    #[test]
    fn concurrent_duplicate_inserts_admit_exactly_one() {
        let (store, entry, university_id) = seeded_store();
        let store = Arc::new(store);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                let application = application_for(&entry, university_id);
                thread::spawn(move || store.insert(application).is_ok())
            })
            .collect();

        let admitted = handles
            .into_iter()
            .map(|handle| handle.join().expect("thread joins"))
            .filter(|admitted| *admitted)
            .count();
        assert_eq!(admitted, 1);

        let candidate = Principal::candidate("cand-1").candidate_id();
        assert_eq!(store.for_candidate(&candidate).expect("list").len(), 1);
    }
}
