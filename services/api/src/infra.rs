use admissions::applications::{
    ApplicationService, Notification, NotificationError, NotificationPublisher,
};
use admissions::catalog::{CatalogImporter, CatalogService, ImportReport};
use admissions::error::AppError;
use admissions::persistence::InMemoryStore;
use admissions::principal::Principal;
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

pub(crate) type Catalog = CatalogService<InMemoryStore>;
pub(crate) type Applications = ApplicationService<InMemoryStore, InMemoryStore, TracingNotifier>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Stands in for the e-mail/SMS adapters: decisions are written to the log stream.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct TracingNotifier;

impl NotificationPublisher for TracingNotifier {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError> {
        info!(
            template = %notification.template,
            application_id = %notification.application_id,
            candidate_id = %notification.candidate_id,
            status = %notification.status,
            details = ?notification.details,
            "decision notification dispatched"
        );
        Ok(())
    }
}

/// Wire both services over one shared persistence context.
pub(crate) fn build_services(store: Arc<InMemoryStore>) -> (Arc<Catalog>, Arc<Applications>) {
    let catalog = Arc::new(CatalogService::new(store.clone()));
    let applications = Arc::new(ApplicationService::new(
        store.clone(),
        store,
        Arc::new(TracingNotifier),
    ));
    (catalog, applications)
}

/// Principal used for startup seeding and offline imports.
pub(crate) fn system_principal() -> Principal {
    Principal::administrator("system")
}

pub(crate) fn seed_catalog(catalog: &Catalog, path: &Path) -> Result<ImportReport, AppError> {
    let report = CatalogImporter::from_path(catalog, &system_principal(), path)?;
    info!(
        path = %path.display(),
        created = report.created_entries,
        skipped = report.skipped_entries,
        failed = report.failures.len(),
        "catalog seeded"
    );
    Ok(report)
}
