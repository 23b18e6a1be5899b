use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::domain::{
    AcademicYear, AdmissionMethod, AdmissionMethodId, MajorId, MappingEntryId, SubjectGroup,
    SubjectGroupId,
};
use super::repository::CatalogRepository;
use crate::error::AdmissionError;

/// Query parameters of the eligibility lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EligibilityQuery {
    pub major_id: MajorId,
    pub year: AcademicYear,
}

impl EligibilityQuery {
    pub fn new(major_id: MajorId, year: i64) -> Result<Self, AdmissionError> {
        let year =
            AcademicYear::new(year).map_err(|err| AdmissionError::validation(err.to_string()))?;
        Ok(Self { major_id, year })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdmissionMethodSummary {
    pub id: AdmissionMethodId,
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectGroupSummary {
    pub id: SubjectGroupId,
    pub name: String,
    pub code: String,
    pub subjects: Vec<String>,
}

/// One combination a candidate may apply with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EligibilityOption {
    pub mapping_id: MappingEntryId,
    pub admission_method: AdmissionMethodSummary,
    pub subject_group: SubjectGroupSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_score: Option<f32>,
}

/// Read-only lookup over the mapping table.
pub struct EligibilityResolver<C> {
    repository: Arc<C>,
}

impl<C> EligibilityResolver<C>
where
    C: CatalogRepository + 'static,
{
    pub fn new(repository: Arc<C>) -> Self {
        Self { repository }
    }

    /// Combinations available for a major in a year, ordered by method code then group code.
    ///
    /// An unknown major is `NotFound`. A known major with no data for the year, an
    /// inactive major, or a major of an inactive university yields an empty list.
    pub fn resolve(
        &self,
        query: &EligibilityQuery,
    ) -> Result<Vec<EligibilityOption>, AdmissionError> {
        let major = self
            .repository
            .major(&query.major_id)?
            .ok_or_else(|| AdmissionError::not_found("major", query.major_id))?;
        if !major.is_active {
            return Ok(Vec::new());
        }
        let university_active = self
            .repository
            .university(&major.university_id)?
            .is_some_and(|university| university.is_active);
        if !university_active {
            return Ok(Vec::new());
        }

        let entries = self
            .repository
            .mapping_entries_for(&major.id, query.year)?;
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let methods: HashMap<AdmissionMethodId, AdmissionMethod> = self
            .repository
            .admission_methods()?
            .into_iter()
            .filter(|method| method.is_active)
            .map(|method| (method.id, method))
            .collect();
        let groups: HashMap<SubjectGroupId, SubjectGroup> = self
            .repository
            .subject_groups()?
            .into_iter()
            .filter(|group| group.is_active)
            .map(|group| (group.id, group))
            .collect();

        let mut options: Vec<EligibilityOption> = entries
            .into_iter()
            .filter_map(|entry| {
                let method = methods.get(&entry.admission_method_id)?;
                let group = groups.get(&entry.subject_group_id)?;
                Some(EligibilityOption {
                    mapping_id: entry.id,
                    admission_method: AdmissionMethodSummary {
                        id: method.id,
                        name: method.name.clone(),
                        code: method.code.clone(),
                    },
                    subject_group: SubjectGroupSummary {
                        id: group.id,
                        name: group.name.clone(),
                        code: group.code.clone(),
                        subjects: group.subjects.clone(),
                    },
                    min_score: entry.min_score,
                })
            })
            .collect();

        options.sort_by(|left, right| {
            left.admission_method
                .code
                .cmp(&right.admission_method.code)
                .then_with(|| left.subject_group.code.cmp(&right.subject_group.code))
        });
        Ok(options)
    }
}
