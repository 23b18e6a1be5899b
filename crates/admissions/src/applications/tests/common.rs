use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::applications::domain::{ApplicationSubmission, DocumentReference};
use crate::applications::repository::{Notification, NotificationError, NotificationPublisher};
use crate::applications::{application_router, ApplicationService};
use crate::catalog::{
    AcademicYear, AdmissionMethod, CatalogService, Major, MappingEntry, NewAdmissionMethod,
    NewMajor, NewMappingEntry, NewSubjectGroup, NewUniversity, SubjectGroup, University,
};
use crate::persistence::InMemoryStore;
use crate::principal::Principal;

pub(super) fn admin() -> Principal {
    Principal::administrator("registrar")
}

pub(super) fn candidate() -> Principal {
    Principal::candidate("cand-1")
}

#[derive(Default)]
pub(super) struct MemoryNotifier {
    events: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    pub(super) fn events(&self) -> Vec<Notification> {
        self.events.lock().expect("notifier lock").clone()
    }
}

impl NotificationPublisher for MemoryNotifier {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("notifier lock")
            .push(notification);
        Ok(())
    }
}

/// Notifier whose transport is down; counts attempts.
#[derive(Default)]
pub(super) struct FailingNotifier {
    attempts: Mutex<usize>,
}

impl FailingNotifier {
    pub(super) fn attempts(&self) -> usize {
        *self.attempts.lock().expect("notifier lock")
    }
}

impl NotificationPublisher for FailingNotifier {
    fn publish(&self, _notification: Notification) -> Result<(), NotificationError> {
        *self.attempts.lock().expect("notifier lock") += 1;
        Err(NotificationError::Transport("smtp relay offline".to_string()))
    }
}

pub(super) type Service<N = MemoryNotifier> = ApplicationService<InMemoryStore, InMemoryStore, N>;

/// University U, major M, method A, group S and a 2025 mapping with minimum score 24.
pub(super) struct Scenario<N = MemoryNotifier> {
    pub(super) store: Arc<InMemoryStore>,
    pub(super) catalog: CatalogService<InMemoryStore>,
    pub(super) service: Arc<Service<N>>,
    pub(super) notifier: Arc<N>,
    pub(super) university: University,
    pub(super) major: Major,
    pub(super) method: AdmissionMethod,
    pub(super) group: SubjectGroup,
    pub(super) entry: MappingEntry,
}

impl Scenario<MemoryNotifier> {
    pub(super) fn new() -> Self {
        Self::with_notifier(Arc::new(MemoryNotifier::default()))
    }
}

impl<N> Scenario<N>
where
    N: NotificationPublisher + 'static,
{
    pub(super) fn with_notifier(notifier: Arc<N>) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let catalog = CatalogService::new(store.clone());
        let admin = admin();

        let university = catalog
            .create_university(
                &admin,
                NewUniversity {
                    name: "University U".to_string(),
                    code: "U".to_string(),
                },
            )
            .expect("university");
        let major = catalog
            .create_major(
                &admin,
                NewMajor {
                    name: "Major M".to_string(),
                    code: "M".to_string(),
                    university_id: university.id,
                },
            )
            .expect("major");
        let method = catalog
            .create_admission_method(
                &admin,
                NewAdmissionMethod {
                    name: "Method A".to_string(),
                    code: "A".to_string(),
                },
            )
            .expect("method");
        let group = catalog
            .create_subject_group(
                &admin,
                NewSubjectGroup {
                    name: "Group S".to_string(),
                    code: "S".to_string(),
                    subjects: vec!["Maths".to_string(), "Literature".to_string()],
                },
            )
            .expect("group");
        let entry = catalog
            .create_mapping_entry(
                &admin,
                NewMappingEntry {
                    major_id: major.id,
                    admission_method_id: method.id,
                    subject_group_id: group.id,
                    year: AcademicYear::new(2025).expect("year"),
                    min_score: Some(24.0),
                },
            )
            .expect("mapping");

        let service = Arc::new(ApplicationService::new(
            store.clone(),
            store.clone(),
            notifier.clone(),
        ));

        Self {
            store,
            catalog,
            service,
            notifier,
            university,
            major,
            method,
            group,
            entry,
        }
    }

    pub(super) fn submission(&self) -> ApplicationSubmission {
        ApplicationSubmission {
            university_id: self.university.id,
            major_id: self.major.id,
            admission_method_id: self.method.id,
            subject_group_id: self.group.id,
            year: self.entry.year,
            documents: vec![DocumentReference {
                name: "Transcript".to_string(),
                storage_key: "applications/cand-1/transcript.pdf".to_string(),
                content_type: Some("application/pdf".to_string()),
            }],
        }
    }

    pub(super) fn router(&self) -> axum::Router {
        application_router(self.service.clone())
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
