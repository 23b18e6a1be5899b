use serde::{Deserialize, Deserializer};

/// Subjects within a row are separated by semicolons.
const SUBJECT_SEPARATOR: char = ';';

#[derive(Debug, Deserialize)]
pub(crate) struct CatalogRow {
    pub(crate) university_code: String,
    pub(crate) university_name: String,
    pub(crate) major_code: String,
    pub(crate) major_name: String,
    pub(crate) admission_method_code: String,
    pub(crate) admission_method_name: String,
    pub(crate) subject_group_code: String,
    pub(crate) subject_group_name: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    subjects: Option<String>,
    pub(crate) year: i64,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    min_score: Option<String>,
}

impl CatalogRow {
    pub(crate) fn subjects(&self) -> Vec<String> {
        self.subjects
            .as_deref()
            .map(|raw| {
                raw.split(SUBJECT_SEPARATOR)
                    .map(str::trim)
                    .filter(|subject| !subject.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn min_score(&self) -> Result<Option<f32>, String> {
        match self.min_score.as_deref() {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse::<f32>()
                .map(Some)
                .map_err(|_| format!("min_score '{raw}' is not a number")),
        }
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
