//! Application status transition table.
//!
//! Every status write goes through [`authorize`]; no other code decides whether a
//! move between two statuses is legal.

use super::domain::ApplicationStatus;
use crate::error::AdmissionError;
use crate::principal::{CandidateId, Principal};

/// Who may perform a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permit {
    Administrator,
    OwnerOrAdministrator,
}

impl Permit {
    fn allows(self, principal: &Principal, owner: &CandidateId) -> bool {
        match self {
            Permit::Administrator => principal.is_administrator(),
            Permit::OwnerOrAdministrator => principal.can_act_for(owner),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: ApplicationStatus,
    pub to: ApplicationStatus,
    pub permit: Permit,
}

const fn edge(from: ApplicationStatus, to: ApplicationStatus, permit: Permit) -> Transition {
    Transition { from, to, permit }
}

pub const TRANSITIONS: &[Transition] = &[
    edge(
        ApplicationStatus::Pending,
        ApplicationStatus::Processing,
        Permit::Administrator,
    ),
    edge(
        ApplicationStatus::Pending,
        ApplicationStatus::Approved,
        Permit::Administrator,
    ),
    edge(
        ApplicationStatus::Pending,
        ApplicationStatus::Rejected,
        Permit::Administrator,
    ),
    edge(
        ApplicationStatus::Pending,
        ApplicationStatus::AdditionalRequired,
        Permit::Administrator,
    ),
    edge(
        ApplicationStatus::Processing,
        ApplicationStatus::Approved,
        Permit::Administrator,
    ),
    edge(
        ApplicationStatus::Processing,
        ApplicationStatus::Rejected,
        Permit::Administrator,
    ),
    edge(
        ApplicationStatus::Processing,
        ApplicationStatus::AdditionalRequired,
        Permit::Administrator,
    ),
    // Review resumes once the requested documents arrive.
    edge(
        ApplicationStatus::AdditionalRequired,
        ApplicationStatus::Processing,
        Permit::Administrator,
    ),
    edge(
        ApplicationStatus::Pending,
        ApplicationStatus::Cancelled,
        Permit::OwnerOrAdministrator,
    ),
    edge(
        ApplicationStatus::Processing,
        ApplicationStatus::Cancelled,
        Permit::OwnerOrAdministrator,
    ),
    edge(
        ApplicationStatus::AdditionalRequired,
        ApplicationStatus::Cancelled,
        Permit::OwnerOrAdministrator,
    ),
];

pub fn rule_for(from: ApplicationStatus, to: ApplicationStatus) -> Option<&'static Transition> {
    TRANSITIONS
        .iter()
        .find(|transition| transition.from == from && transition.to == to)
}

/// Check that `principal` may move an application owned by `owner` from `from` to `to`.
///
/// A missing edge is an `InvalidTransition`; an edge the actor may not use is `Forbidden`.
pub fn authorize(
    principal: &Principal,
    owner: &CandidateId,
    from: ApplicationStatus,
    to: ApplicationStatus,
) -> Result<&'static Transition, AdmissionError> {
    let transition = rule_for(from, to).ok_or(AdmissionError::InvalidTransition { from, to })?;

    if transition.permit.allows(principal, owner) {
        Ok(transition)
    } else {
        Err(AdmissionError::forbidden(format!(
            "{principal} may not move application from {from} to {to}"
        )))
    }
}
