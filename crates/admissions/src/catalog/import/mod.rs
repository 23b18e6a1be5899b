//! Bulk catalog import from CSV exports of the admissions office.

mod parser;

use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use super::domain::{
    AcademicYear, AdmissionMethodId, MajorId, MappingKey, NewAdmissionMethod, NewMajor,
    NewMappingEntry, NewSubjectGroup, NewUniversity, SubjectGroupId, UniversityId,
};
use super::repository::CatalogRepository;
use super::service::{check_min_score, required, CatalogService};
use crate::error::AdmissionError;
use crate::principal::Principal;
use parser::CatalogRow;

#[derive(Debug)]
pub enum ImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Catalog(AdmissionError),
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportError::Io(err) => write!(f, "failed to read catalog export: {}", err),
            ImportError::Csv(err) => write!(f, "invalid catalog CSV data: {}", err),
            ImportError::Catalog(err) => write!(f, "catalog rejected the import: {}", err),
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImportError::Io(err) => Some(err),
            ImportError::Csv(err) => Some(err),
            ImportError::Catalog(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<AdmissionError> for ImportError {
    fn from(err: AdmissionError) -> Self {
        Self::Catalog(err)
    }
}

/// A row that could not be applied; the import carries on with the next one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportFailure {
    pub line: u64,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub rows: usize,
    pub created_entries: usize,
    pub skipped_entries: usize,
    pub failures: Vec<ImportFailure>,
}

enum RowOutcome {
    Created,
    Skipped,
}

pub struct CatalogImporter;

impl CatalogImporter {
    pub fn from_path<C, P>(
        service: &CatalogService<C>,
        principal: &Principal,
        path: P,
    ) -> Result<ImportReport, ImportError>
    where
        C: CatalogRepository + 'static,
        P: AsRef<Path>,
    {
        let file = std::fs::File::open(path)?;
        Self::from_reader(service, principal, file)
    }

    /// Get-or-create every entity a row names (matched by code), then map the combination.
    pub fn from_reader<C, R>(
        service: &CatalogService<C>,
        principal: &Principal,
        reader: R,
    ) -> Result<ImportReport, ImportError>
    where
        C: CatalogRepository + 'static,
        R: Read,
    {
        principal.require_administrator()?;

        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let mut state = ImportState::load(service, principal)?;
        let mut report = ImportReport::default();

        for record in csv_reader.records() {
            let record = record?;
            let line = record.position().map(|position| position.line()).unwrap_or(0);
            report.rows += 1;

            let outcome = record
                .deserialize::<CatalogRow>(Some(&headers))
                .map_err(|err| err.to_string())
                .and_then(|row| state.apply(row).map_err(|err| err.to_string()));

            match outcome {
                Ok(RowOutcome::Created) => report.created_entries += 1,
                Ok(RowOutcome::Skipped) => report.skipped_entries += 1,
                Err(message) => {
                    warn!(line, %message, "catalog row rejected");
                    report.failures.push(ImportFailure { line, message });
                }
            }
        }

        info!(
            rows = report.rows,
            created = report.created_entries,
            skipped = report.skipped_entries,
            failed = report.failures.len(),
            "catalog import finished"
        );
        Ok(report)
    }
}

/// Code lookups built once per import and extended as rows create entities.
struct ImportState<'a, C> {
    service: &'a CatalogService<C>,
    principal: &'a Principal,
    universities: HashMap<String, UniversityId>,
    majors: HashMap<(UniversityId, String), MajorId>,
    loaded_majors: HashSet<UniversityId>,
    methods: HashMap<String, AdmissionMethodId>,
    groups: HashMap<String, SubjectGroupId>,
}

impl<'a, C> ImportState<'a, C>
where
    C: CatalogRepository + 'static,
{
    fn load(
        service: &'a CatalogService<C>,
        principal: &'a Principal,
    ) -> Result<Self, AdmissionError> {
        let universities = service
            .universities(true)?
            .into_iter()
            .map(|university| (university.code, university.id))
            .collect();
        let methods = service
            .admission_methods(false)?
            .into_iter()
            .map(|method| (method.code, method.id))
            .collect();
        let groups = service
            .subject_groups(false)?
            .into_iter()
            .map(|group| (group.code, group.id))
            .collect();

        Ok(Self {
            service,
            principal,
            universities,
            majors: HashMap::new(),
            loaded_majors: HashSet::new(),
            methods,
            groups,
        })
    }

    fn apply(&mut self, row: CatalogRow) -> Result<RowOutcome, AdmissionError> {
        let year = AcademicYear::new(row.year)
            .map_err(|err| AdmissionError::validation(err.to_string()))?;
        let min_score = row.min_score().map_err(AdmissionError::validation)?;
        self.check_row(&row, min_score)?;

        let university_id = self.university(&row.university_code, &row.university_name)?;
        let major_id = self.major(university_id, &row.major_code, &row.major_name)?;
        let admission_method_id =
            self.method(&row.admission_method_code, &row.admission_method_name)?;
        let subject_group_id = self.group(&row)?;

        let key = MappingKey {
            major_id,
            admission_method_id,
            subject_group_id,
            year,
        };
        if self.service.find_mapping_entry(&key)?.is_some() {
            return Ok(RowOutcome::Skipped);
        }

        self.service.create_mapping_entry(
            self.principal,
            NewMappingEntry {
                major_id,
                admission_method_id,
                subject_group_id,
                year,
                min_score,
            },
        )?;
        Ok(RowOutcome::Created)
    }

    /// Rejections must happen before any get-or-create so a failed row changes nothing.
    fn check_row(&self, row: &CatalogRow, min_score: Option<f32>) -> Result<(), AdmissionError> {
        check_min_score(min_score)?;
        for (field, value) in [
            ("university_code", &row.university_code),
            ("university_name", &row.university_name),
            ("major_code", &row.major_code),
            ("major_name", &row.major_name),
            ("admission_method_code", &row.admission_method_code),
            ("admission_method_name", &row.admission_method_name),
            ("subject_group_code", &row.subject_group_code),
            ("subject_group_name", &row.subject_group_name),
        ] {
            required(field, value)?;
        }

        let group_code = row.subject_group_code.trim().to_uppercase();
        if !self.groups.contains_key(&group_code) && row.subjects().is_empty() {
            return Err(AdmissionError::validation(format!(
                "subject group {group_code} needs at least one subject"
            )));
        }
        Ok(())
    }

    fn university(&mut self, code: &str, name: &str) -> Result<UniversityId, AdmissionError> {
        let code = code.trim().to_uppercase();
        if let Some(id) = self.universities.get(&code) {
            return Ok(*id);
        }
        let created = self.service.create_university(
            self.principal,
            NewUniversity {
                name: name.to_string(),
                code: code.clone(),
            },
        )?;
        self.universities.insert(code, created.id);
        Ok(created.id)
    }

    fn major(
        &mut self,
        university_id: UniversityId,
        code: &str,
        name: &str,
    ) -> Result<MajorId, AdmissionError> {
        if self.loaded_majors.insert(university_id) {
            for major in self.service.majors_for_university(&university_id)? {
                self.majors.insert((university_id, major.code), major.id);
            }
        }

        let code = code.trim().to_uppercase();
        if let Some(id) = self.majors.get(&(university_id, code.clone())) {
            return Ok(*id);
        }
        let created = self.service.create_major(
            self.principal,
            NewMajor {
                name: name.to_string(),
                code: code.clone(),
                university_id,
            },
        )?;
        self.majors.insert((university_id, code), created.id);
        Ok(created.id)
    }

    fn method(&mut self, code: &str, name: &str) -> Result<AdmissionMethodId, AdmissionError> {
        let code = code.trim().to_uppercase();
        if let Some(id) = self.methods.get(&code) {
            return Ok(*id);
        }
        let created = self.service.create_admission_method(
            self.principal,
            NewAdmissionMethod {
                name: name.to_string(),
                code: code.clone(),
            },
        )?;
        self.methods.insert(code, created.id);
        Ok(created.id)
    }

    fn group(&mut self, row: &CatalogRow) -> Result<SubjectGroupId, AdmissionError> {
        let code = row.subject_group_code.trim().to_uppercase();
        if let Some(id) = self.groups.get(&code) {
            return Ok(*id);
        }
        let created = self.service.create_subject_group(
            self.principal,
            NewSubjectGroup {
                name: row.subject_group_name.clone(),
                code: code.clone(),
                subjects: row.subjects(),
            },
        )?;
        self.groups.insert(code, created.id);
        Ok(created.id)
    }
}
