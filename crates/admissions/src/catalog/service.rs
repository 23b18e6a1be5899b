use std::sync::Arc;

use tracing::info;

use super::domain::{
    AdmissionMethod, AdmissionMethodId, AdmissionMethodUpdate, Major, MajorId, MajorUpdate,
    MappingEntry, MappingEntryId, MappingKey, NewAdmissionMethod, NewMajor, NewMappingEntry,
    NewSubjectGroup, NewUniversity, SubjectGroup, SubjectGroupId, SubjectGroupUpdate,
    University, UniversityId, UniversityUpdate,
};
use super::eligibility::EligibilityResolver;
use super::repository::CatalogRepository;
use crate::error::AdmissionError;
use crate::persistence::RepositoryError;
use crate::principal::Principal;

/// Administrator-facing service over the reference data and the eligibility table.
pub struct CatalogService<C> {
    repository: Arc<C>,
    resolver: EligibilityResolver<C>,
}

impl<C> CatalogService<C>
where
    C: CatalogRepository + 'static,
{
    pub fn new(repository: Arc<C>) -> Self {
        let resolver = EligibilityResolver::new(repository.clone());
        Self {
            repository,
            resolver,
        }
    }

    pub fn eligibility(&self) -> &EligibilityResolver<C> {
        &self.resolver
    }

    pub fn universities(&self, active_only: bool) -> Result<Vec<University>, AdmissionError> {
        let mut universities = self.repository.universities()?;
        universities.retain(|university| university.is_active || !active_only);
        Ok(universities)
    }

    pub fn university(&self, id: &UniversityId) -> Result<University, AdmissionError> {
        self.repository
            .university(id)?
            .ok_or_else(|| AdmissionError::not_found("university", id))
    }

    pub fn create_university(
        &self,
        principal: &Principal,
        input: NewUniversity,
    ) -> Result<University, AdmissionError> {
        principal.require_administrator()?;
        let university = University {
            id: UniversityId::generate(),
            name: required("name", &input.name)?,
            code: code("code", &input.code)?,
            is_active: true,
        };

        let stored = self
            .repository
            .insert_university(university)
            .map_err(constraint_error)?;
        info!(university_id = %stored.id, code = %stored.code, actor = %principal, "university created");
        Ok(stored)
    }

    pub fn update_university(
        &self,
        principal: &Principal,
        id: &UniversityId,
        update: UniversityUpdate,
    ) -> Result<University, AdmissionError> {
        principal.require_administrator()?;
        let mut university = self.university(id)?;
        if let Some(name) = update.name {
            university.name = required("name", &name)?;
        }
        if let Some(value) = update.code {
            university.code = code("code", &value)?;
        }
        if let Some(is_active) = update.is_active {
            university.is_active = is_active;
        }

        let stored = self
            .repository
            .update_university(university)
            .map_err(|err| missing_or_constraint(err, "university", id))?;
        info!(university_id = %stored.id, active = stored.is_active, actor = %principal, "university updated");
        Ok(stored)
    }

    /// Soft delete. Majors and historical applications keep referencing the record.
    pub fn deactivate_university(
        &self,
        principal: &Principal,
        id: &UniversityId,
    ) -> Result<University, AdmissionError> {
        self.update_university(
            principal,
            id,
            UniversityUpdate {
                is_active: Some(false),
                ..UniversityUpdate::default()
            },
        )
    }

    /// Active majors offered by an existing university; none while the university is inactive.
    pub fn majors_for_university(&self, id: &UniversityId) -> Result<Vec<Major>, AdmissionError> {
        if !self.university(id)?.is_active {
            return Ok(Vec::new());
        }
        let mut majors = self.repository.majors_for_university(id)?;
        majors.retain(|major| major.is_active);
        majors.sort_by(|left, right| left.code.cmp(&right.code));
        Ok(majors)
    }

    pub fn major(&self, id: &MajorId) -> Result<Major, AdmissionError> {
        self.repository
            .major(id)?
            .ok_or_else(|| AdmissionError::not_found("major", id))
    }

    pub fn create_major(
        &self,
        principal: &Principal,
        input: NewMajor,
    ) -> Result<Major, AdmissionError> {
        principal.require_administrator()?;
        let name = required("name", &input.name)?;
        let code = code("code", &input.code)?;
        self.university(&input.university_id)?;

        let major = Major {
            id: MajorId::generate(),
            name,
            code,
            university_id: input.university_id,
            is_active: true,
        };

        let stored = self.repository.insert_major(major).map_err(|err| match err {
            RepositoryError::MissingReference(entity) => {
                AdmissionError::not_found(entity, input.university_id)
            }
            other => constraint_error(other),
        })?;
        info!(major_id = %stored.id, university_id = %stored.university_id, code = %stored.code, "major created");
        Ok(stored)
    }

    pub fn update_major(
        &self,
        principal: &Principal,
        id: &MajorId,
        update: MajorUpdate,
    ) -> Result<Major, AdmissionError> {
        principal.require_administrator()?;
        let mut major = self.major(id)?;
        if let Some(name) = update.name {
            major.name = required("name", &name)?;
        }
        if let Some(value) = update.code {
            major.code = code("code", &value)?;
        }
        if let Some(is_active) = update.is_active {
            major.is_active = is_active;
        }

        let stored = self
            .repository
            .update_major(major)
            .map_err(|err| missing_or_constraint(err, "major", id))?;
        info!(major_id = %stored.id, active = stored.is_active, actor = %principal, "major updated");
        Ok(stored)
    }

    pub fn deactivate_major(
        &self,
        principal: &Principal,
        id: &MajorId,
    ) -> Result<Major, AdmissionError> {
        self.update_major(
            principal,
            id,
            MajorUpdate {
                is_active: Some(false),
                ..MajorUpdate::default()
            },
        )
    }

    pub fn admission_methods(
        &self,
        active_only: bool,
    ) -> Result<Vec<AdmissionMethod>, AdmissionError> {
        let mut methods = self.repository.admission_methods()?;
        methods.retain(|method| method.is_active || !active_only);
        methods.sort_by(|left, right| left.code.cmp(&right.code));
        Ok(methods)
    }

    pub fn admission_method(
        &self,
        id: &AdmissionMethodId,
    ) -> Result<AdmissionMethod, AdmissionError> {
        self.repository
            .admission_method(id)?
            .ok_or_else(|| AdmissionError::not_found("admission method", id))
    }

    pub fn create_admission_method(
        &self,
        principal: &Principal,
        input: NewAdmissionMethod,
    ) -> Result<AdmissionMethod, AdmissionError> {
        principal.require_administrator()?;
        let method = AdmissionMethod {
            id: AdmissionMethodId::generate(),
            name: required("name", &input.name)?,
            code: code("code", &input.code)?,
            is_active: true,
        };

        let stored = self
            .repository
            .insert_admission_method(method)
            .map_err(constraint_error)?;
        info!(admission_method_id = %stored.id, code = %stored.code, "admission method created");
        Ok(stored)
    }

    pub fn update_admission_method(
        &self,
        principal: &Principal,
        id: &AdmissionMethodId,
        update: AdmissionMethodUpdate,
    ) -> Result<AdmissionMethod, AdmissionError> {
        principal.require_administrator()?;
        let mut method = self.admission_method(id)?;
        if let Some(name) = update.name {
            method.name = required("name", &name)?;
        }
        if let Some(value) = update.code {
            method.code = code("code", &value)?;
        }
        if let Some(is_active) = update.is_active {
            method.is_active = is_active;
        }

        self.repository
            .update_admission_method(method)
            .map_err(|err| missing_or_constraint(err, "admission method", id))
    }

    pub fn deactivate_admission_method(
        &self,
        principal: &Principal,
        id: &AdmissionMethodId,
    ) -> Result<AdmissionMethod, AdmissionError> {
        self.update_admission_method(
            principal,
            id,
            AdmissionMethodUpdate {
                is_active: Some(false),
                ..AdmissionMethodUpdate::default()
            },
        )
    }

    pub fn subject_groups(&self, active_only: bool) -> Result<Vec<SubjectGroup>, AdmissionError> {
        let mut groups = self.repository.subject_groups()?;
        groups.retain(|group| group.is_active || !active_only);
        groups.sort_by(|left, right| left.code.cmp(&right.code));
        Ok(groups)
    }

    pub fn subject_group(&self, id: &SubjectGroupId) -> Result<SubjectGroup, AdmissionError> {
        self.repository
            .subject_group(id)?
            .ok_or_else(|| AdmissionError::not_found("subject group", id))
    }

    pub fn create_subject_group(
        &self,
        principal: &Principal,
        input: NewSubjectGroup,
    ) -> Result<SubjectGroup, AdmissionError> {
        principal.require_administrator()?;
        let group = SubjectGroup {
            id: SubjectGroupId::generate(),
            name: required("name", &input.name)?,
            code: code("code", &input.code)?,
            subjects: subjects(&input.subjects)?,
            is_active: true,
        };

        let stored = self
            .repository
            .insert_subject_group(group)
            .map_err(constraint_error)?;
        info!(subject_group_id = %stored.id, code = %stored.code, "subject group created");
        Ok(stored)
    }

    pub fn update_subject_group(
        &self,
        principal: &Principal,
        id: &SubjectGroupId,
        update: SubjectGroupUpdate,
    ) -> Result<SubjectGroup, AdmissionError> {
        principal.require_administrator()?;
        let mut group = self.subject_group(id)?;
        if let Some(name) = update.name {
            group.name = required("name", &name)?;
        }
        if let Some(value) = update.code {
            group.code = code("code", &value)?;
        }
        if let Some(list) = update.subjects {
            group.subjects = subjects(&list)?;
        }
        if let Some(is_active) = update.is_active {
            group.is_active = is_active;
        }

        self.repository
            .update_subject_group(group)
            .map_err(|err| missing_or_constraint(err, "subject group", id))
    }

    pub fn deactivate_subject_group(
        &self,
        principal: &Principal,
        id: &SubjectGroupId,
    ) -> Result<SubjectGroup, AdmissionError> {
        self.update_subject_group(
            principal,
            id,
            SubjectGroupUpdate {
                is_active: Some(false),
                ..SubjectGroupUpdate::default()
            },
        )
    }

    pub fn mapping_entry(&self, id: &MappingEntryId) -> Result<MappingEntry, AdmissionError> {
        self.repository
            .mapping_entry(id)?
            .ok_or_else(|| AdmissionError::not_found("mapping entry", id))
    }

    pub fn find_mapping_entry(
        &self,
        key: &MappingKey,
    ) -> Result<Option<MappingEntry>, AdmissionError> {
        Ok(self.repository.find_mapping_entry(key)?)
    }

    /// Add a combination to the eligibility table. Duplicate tuples are a validation failure.
    pub fn create_mapping_entry(
        &self,
        principal: &Principal,
        input: NewMappingEntry,
    ) -> Result<MappingEntry, AdmissionError> {
        principal.require_administrator()?;
        check_min_score(input.min_score)?;

        self.major(&input.major_id)?;
        self.admission_method(&input.admission_method_id)?;
        self.subject_group(&input.subject_group_id)?;

        let entry = MappingEntry {
            id: MappingEntryId::generate(),
            major_id: input.major_id,
            admission_method_id: input.admission_method_id,
            subject_group_id: input.subject_group_id,
            year: input.year,
            min_score: input.min_score,
        };

        let stored = self
            .repository
            .insert_mapping_entry(entry)
            .map_err(|err| match err {
                RepositoryError::MissingReference(entity) => AdmissionError::not_found(
                    entity,
                    format!("referenced by mapping for major {}", input.major_id),
                ),
                other => constraint_error(other),
            })?;
        info!(
            mapping_id = %stored.id,
            major_id = %stored.major_id,
            year = %stored.year,
            "mapping entry created"
        );
        Ok(stored)
    }

    /// Hard delete, refused while any application references the combination.
    pub fn delete_mapping_entry(
        &self,
        principal: &Principal,
        id: &MappingEntryId,
    ) -> Result<MappingEntry, AdmissionError> {
        principal.require_administrator()?;
        let removed = self
            .repository
            .remove_mapping_entry(id)
            .map_err(|err| match err {
                RepositoryError::NotFound => AdmissionError::not_found("mapping entry", id),
                RepositoryError::InUse(referrer) => AdmissionError::InUse {
                    entity: "mapping entry",
                    referrer,
                },
                other => AdmissionError::from(other),
            })?;
        info!(mapping_id = %removed.id, actor = %principal, "mapping entry deleted");
        Ok(removed)
    }
}

pub(crate) fn check_min_score(min_score: Option<f32>) -> Result<(), AdmissionError> {
    match min_score {
        Some(score) if !score.is_finite() || score < 0.0 => Err(AdmissionError::validation(
            format!("min_score must be a non-negative number, got {score}"),
        )),
        _ => Ok(()),
    }
}

pub(crate) fn required(field: &str, value: &str) -> Result<String, AdmissionError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AdmissionError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn code(field: &str, value: &str) -> Result<String, AdmissionError> {
    let value = required(field, value)?;
    if value.chars().any(char::is_whitespace) {
        return Err(AdmissionError::validation(format!(
            "{field} must not contain whitespace"
        )));
    }
    Ok(value.to_uppercase())
}

fn subjects(values: &[String]) -> Result<Vec<String>, AdmissionError> {
    let mut subjects: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let subject = required("subject", value)?;
        if subjects
            .iter()
            .any(|existing| existing.eq_ignore_ascii_case(&subject))
        {
            return Err(AdmissionError::validation(format!(
                "subject {subject} listed twice"
            )));
        }
        subjects.push(subject);
    }
    if subjects.is_empty() {
        return Err(AdmissionError::validation(
            "a subject group needs at least one subject",
        ));
    }
    Ok(subjects)
}

/// Uniqueness violations on reference data are reported as validation failures.
fn constraint_error(err: RepositoryError) -> AdmissionError {
    match err {
        RepositoryError::Conflict(constraint) => AdmissionError::validation(match constraint {
            "university_code" => "another active university already uses this code",
            "major_code" => "the university already has a major with this code",
            "admission_method_name" => "an admission method with this name already exists",
            "admission_method_code" => "an admission method with this code already exists",
            "subject_group_code" => "a subject group with this code already exists",
            "mapping_entry_key" => {
                "this major, admission method, subject group and year are already mapped"
            }
            _ => "record already exists",
        }),
        other => AdmissionError::from(other),
    }
}

fn missing_or_constraint(
    err: RepositoryError,
    entity: &'static str,
    id: impl std::fmt::Display,
) -> AdmissionError {
    match err {
        RepositoryError::NotFound => AdmissionError::not_found(entity, id),
        other => constraint_error(other),
    }
}
