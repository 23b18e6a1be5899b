//! Reference data administered by the admissions office and the eligibility lookup built on it.

pub mod domain;
pub mod eligibility;
pub mod import;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{
    AcademicYear, AdmissionMethod, AdmissionMethodId, AdmissionMethodUpdate, InvalidYear, Major,
    MajorId, MajorUpdate, MappingEntry, MappingEntryId, MappingKey, NewAdmissionMethod, NewMajor,
    NewMappingEntry, NewSubjectGroup, NewUniversity, SubjectGroup, SubjectGroupId,
    SubjectGroupUpdate, University, UniversityId, UniversityUpdate,
};
pub use eligibility::{
    AdmissionMethodSummary, EligibilityOption, EligibilityQuery, EligibilityResolver,
    SubjectGroupSummary,
};
pub use import::{CatalogImporter, ImportError, ImportFailure, ImportReport};
pub use repository::CatalogRepository;
pub use router::catalog_router;
pub use service::CatalogService;

#[cfg(test)]
mod tests;
