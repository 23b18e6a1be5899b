use std::fmt;

use serde::{Deserialize, Serialize};

/// Declares a UUIDv7-backed identifier newtype for one entity kind.
macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub ::uuid::Uuid);

        impl $name {
            pub fn generate() -> Self {
                Self(::uuid::Uuid::now_v7())
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::fmt::Display::fmt(&self.0, f)
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = ::uuid::Error;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                ::uuid::Uuid::parse_str(value.trim()).map(Self)
            }
        }
    };
}

pub(crate) use entity_id;

entity_id!(
    /// Identifier of a degree-granting institution.
    UniversityId
);
entity_id!(MajorId);
entity_id!(AdmissionMethodId);
entity_id!(SubjectGroupId);
entity_id!(
    /// Identifier of one row of the eligibility mapping table.
    MappingEntryId
);

/// Four-digit academic year used by the mapping table and applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u16")]
pub struct AcademicYear(u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("year must be a 4-digit positive integer, got {0}")]
pub struct InvalidYear(pub i64);

impl AcademicYear {
    pub const MIN: u16 = 1000;
    pub const MAX: u16 = 9999;

    pub fn new(value: i64) -> Result<Self, InvalidYear> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Ok(Self(value as u16))
        } else {
            Err(InvalidYear(value))
        }
    }

    pub const fn value(self) -> u16 {
        self.0
    }
}

impl TryFrom<i64> for AcademicYear {
    type Error = InvalidYear;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AcademicYear> for u16 {
    fn from(value: AcademicYear) -> Self {
        value.0
    }
}

impl fmt::Display for AcademicYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct University {
    pub id: UniversityId,
    pub name: String,
    pub code: String,
    pub is_active: bool,
}

/// A field of study offered by exactly one university.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Major {
    pub id: MajorId,
    pub name: String,
    pub code: String,
    pub university_id: UniversityId,
    pub is_active: bool,
}

/// Named admission pathway such as national exam scores or transcript review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionMethod {
    pub id: AdmissionMethodId,
    pub name: String,
    pub code: String,
    pub is_active: bool,
}

/// Combination of subjects whose scores are summed for admission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectGroup {
    pub id: SubjectGroupId,
    pub name: String,
    pub code: String,
    pub subjects: Vec<String>,
    pub is_active: bool,
}

/// Natural key of the eligibility table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MappingKey {
    pub major_id: MajorId,
    pub admission_method_id: AdmissionMethodId,
    pub subject_group_id: SubjectGroupId,
    pub year: AcademicYear,
}

/// One valid (major, method, subject group, year) combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingEntry {
    pub id: MappingEntryId,
    pub major_id: MajorId,
    pub admission_method_id: AdmissionMethodId,
    pub subject_group_id: SubjectGroupId,
    pub year: AcademicYear,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_score: Option<f32>,
}

impl MappingEntry {
    pub fn key(&self) -> MappingKey {
        MappingKey {
            major_id: self.major_id,
            admission_method_id: self.admission_method_id,
            subject_group_id: self.subject_group_id,
            year: self.year,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewUniversity {
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UniversityUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewMajor {
    pub name: String,
    pub code: String,
    pub university_id: UniversityId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MajorUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewAdmissionMethod {
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdmissionMethodUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewSubjectGroup {
    pub name: String,
    pub code: String,
    pub subjects: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubjectGroupUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub subjects: Option<Vec<String>>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewMappingEntry {
    pub major_id: MajorId,
    pub admission_method_id: AdmissionMethodId,
    pub subject_group_id: SubjectGroupId,
    pub year: AcademicYear,
    #[serde(default)]
    pub min_score: Option<f32>,
}
