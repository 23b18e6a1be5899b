use super::domain::{
    AcademicYear, AdmissionMethod, AdmissionMethodId, Major, MajorId, MappingEntry,
    MappingEntryId, MappingKey, SubjectGroup, SubjectGroupId, University, UniversityId,
};
use crate::persistence::RepositoryError;

/// Storage abstraction for administrator-managed reference data.
///
/// Implementations enforce the uniqueness constraints and references atomically:
/// `Conflict` names the violated constraint and `MissingReference` the absent parent.
pub trait CatalogRepository: Send + Sync {
    fn insert_university(&self, university: University) -> Result<University, RepositoryError>;
    fn update_university(&self, university: University) -> Result<University, RepositoryError>;
    fn university(&self, id: &UniversityId) -> Result<Option<University>, RepositoryError>;
    fn universities(&self) -> Result<Vec<University>, RepositoryError>;

    fn insert_major(&self, major: Major) -> Result<Major, RepositoryError>;
    fn update_major(&self, major: Major) -> Result<Major, RepositoryError>;
    fn major(&self, id: &MajorId) -> Result<Option<Major>, RepositoryError>;
    fn majors_for_university(&self, id: &UniversityId) -> Result<Vec<Major>, RepositoryError>;

    fn insert_admission_method(
        &self,
        method: AdmissionMethod,
    ) -> Result<AdmissionMethod, RepositoryError>;
    fn update_admission_method(
        &self,
        method: AdmissionMethod,
    ) -> Result<AdmissionMethod, RepositoryError>;
    fn admission_method(
        &self,
        id: &AdmissionMethodId,
    ) -> Result<Option<AdmissionMethod>, RepositoryError>;
    fn admission_methods(&self) -> Result<Vec<AdmissionMethod>, RepositoryError>;

    fn insert_subject_group(&self, group: SubjectGroup) -> Result<SubjectGroup, RepositoryError>;
    fn update_subject_group(&self, group: SubjectGroup) -> Result<SubjectGroup, RepositoryError>;
    fn subject_group(&self, id: &SubjectGroupId) -> Result<Option<SubjectGroup>, RepositoryError>;
    fn subject_groups(&self) -> Result<Vec<SubjectGroup>, RepositoryError>;

    fn insert_mapping_entry(&self, entry: MappingEntry) -> Result<MappingEntry, RepositoryError>;
    fn mapping_entry(&self, id: &MappingEntryId) -> Result<Option<MappingEntry>, RepositoryError>;
    fn find_mapping_entry(&self, key: &MappingKey)
        -> Result<Option<MappingEntry>, RepositoryError>;
    fn mapping_entries_for(
        &self,
        major_id: &MajorId,
        year: AcademicYear,
    ) -> Result<Vec<MappingEntry>, RepositoryError>;
    /// Hard delete; fails with `InUse` while any application references the tuple.
    fn remove_mapping_entry(&self, id: &MappingEntryId) -> Result<MappingEntry, RepositoryError>;
}
