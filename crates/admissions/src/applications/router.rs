use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};

use super::domain::{
    Application, ApplicationFilter, ApplicationId, ApplicationSubmission, StatusChange,
    StatusChangeRequest, StatusSummary,
};
use super::repository::{ApplicationRepository, NotificationPublisher};
use super::service::ApplicationService;
use crate::catalog::CatalogRepository;
use crate::error::AdmissionError;
use crate::extract::{AdmissionJson, AdmissionPath, AdmissionQuery};
use crate::principal::Principal;

type SharedApplications<C, R, N> = State<Arc<ApplicationService<C, R, N>>>;

/// Router builder exposing submission, review and reporting endpoints.
pub fn application_router<C, R, N>(service: Arc<ApplicationService<C, R, N>>) -> Router
where
    C: CatalogRepository + 'static,
    R: ApplicationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    Router::new()
        .route(
            "/api/v1/applications",
            get(list_handler::<C, R, N>).post(submit_handler::<C, R, N>),
        )
        .route("/api/v1/applications/mine", get(mine_handler::<C, R, N>))
        .route(
            "/api/v1/applications/summary",
            get(summary_handler::<C, R, N>),
        )
        .route("/api/v1/applications/:id", get(get_handler::<C, R, N>))
        .route(
            "/api/v1/applications/:id/history",
            get(history_handler::<C, R, N>),
        )
        .route(
            "/api/v1/applications/:id/status",
            patch(transition_handler::<C, R, N>),
        )
        .with_state(service)
}

pub(crate) async fn submit_handler<C, R, N>(
    State(service): SharedApplications<C, R, N>,
    principal: Principal,
    AdmissionJson(submission): AdmissionJson<ApplicationSubmission>,
) -> Result<(StatusCode, Json<Application>), AdmissionError>
where
    C: CatalogRepository + 'static,
    R: ApplicationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let created = service.submit(&principal, submission)?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_handler<C, R, N>(
    State(service): SharedApplications<C, R, N>,
    principal: Principal,
    AdmissionQuery(filter): AdmissionQuery<ApplicationFilter>,
) -> Result<Json<Vec<Application>>, AdmissionError>
where
    C: CatalogRepository + 'static,
    R: ApplicationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    service.list(&principal, &filter).map(Json)
}

async fn mine_handler<C, R, N>(
    State(service): SharedApplications<C, R, N>,
    principal: Principal,
) -> Result<Json<Vec<Application>>, AdmissionError>
where
    C: CatalogRepository + 'static,
    R: ApplicationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    service.list_for_candidate(&principal).map(Json)
}

async fn summary_handler<C, R, N>(
    State(service): SharedApplications<C, R, N>,
    principal: Principal,
    AdmissionQuery(filter): AdmissionQuery<ApplicationFilter>,
) -> Result<Json<StatusSummary>, AdmissionError>
where
    C: CatalogRepository + 'static,
    R: ApplicationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    service.status_summary(&principal, &filter).map(Json)
}

async fn get_handler<C, R, N>(
    State(service): SharedApplications<C, R, N>,
    principal: Principal,
    AdmissionPath(id): AdmissionPath<ApplicationId>,
) -> Result<Json<Application>, AdmissionError>
where
    C: CatalogRepository + 'static,
    R: ApplicationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    service.get(&principal, &id).map(Json)
}

async fn history_handler<C, R, N>(
    State(service): SharedApplications<C, R, N>,
    principal: Principal,
    AdmissionPath(id): AdmissionPath<ApplicationId>,
) -> Result<Json<Vec<StatusChange>>, AdmissionError>
where
    C: CatalogRepository + 'static,
    R: ApplicationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    service.history(&principal, &id).map(Json)
}

pub(crate) async fn transition_handler<C, R, N>(
    State(service): SharedApplications<C, R, N>,
    principal: Principal,
    AdmissionPath(id): AdmissionPath<ApplicationId>,
    AdmissionJson(request): AdmissionJson<StatusChangeRequest>,
) -> Result<Json<Application>, AdmissionError>
where
    C: CatalogRepository + 'static,
    R: ApplicationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    service.transition(&principal, &id, request).map(Json)
}
