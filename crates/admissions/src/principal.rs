use std::fmt;
use std::str::FromStr;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};

use crate::error::AdmissionError;

pub const PRINCIPAL_ID_HEADER: &str = "x-principal-id";
pub const PRINCIPAL_ROLE_HEADER: &str = "x-principal-role";

/// Role supplied by the authentication collaborator. The core trusts it as given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Candidate,
    Administrator,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Candidate => "candidate",
            Role::Administrator => "administrator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Role {
    type Err = AdmissionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "candidate" => Ok(Role::Candidate),
            "administrator" | "admin" => Ok(Role::Administrator),
            other => Err(AdmissionError::Unauthenticated(format!(
                "unknown principal role '{other}'"
            ))),
        }
    }
}

/// Identity of a candidate as issued by the authentication collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CandidateId(pub String);

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The acting user of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub role: Role,
}

impl Principal {
    pub fn candidate(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::Candidate,
        }
    }

    pub fn administrator(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::Administrator,
        }
    }

    pub fn is_administrator(&self) -> bool {
        self.role == Role::Administrator
    }

    pub fn candidate_id(&self) -> CandidateId {
        CandidateId(self.id.clone())
    }

    pub fn require_administrator(&self) -> Result<(), AdmissionError> {
        if self.is_administrator() {
            Ok(())
        } else {
            Err(AdmissionError::forbidden(format!(
                "{} {} is not an administrator",
                self.role, self.id
            )))
        }
    }

    pub fn require_candidate(&self) -> Result<(), AdmissionError> {
        if self.role == Role::Candidate {
            Ok(())
        } else {
            Err(AdmissionError::forbidden(
                "only candidates may submit applications",
            ))
        }
    }

    /// Administrators may act on any candidate's data; candidates only on their own.
    pub fn can_act_for(&self, candidate: &CandidateId) -> bool {
        self.is_administrator() || self.id == candidate.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.role, self.id)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AdmissionError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(PRINCIPAL_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                AdmissionError::Unauthenticated(format!("missing {PRINCIPAL_ID_HEADER} header"))
            })?;

        let role = parts
            .headers
            .get(PRINCIPAL_ROLE_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                AdmissionError::Unauthenticated(format!(
                    "missing {PRINCIPAL_ROLE_HEADER} header"
                ))
            })?
            .parse::<Role>()?;

        Ok(Principal {
            id: id.to_string(),
            role,
        })
    }
}
