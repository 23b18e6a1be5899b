use std::io::Cursor;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::Deserialize;

use super::domain::{
    AdmissionMethod, AdmissionMethodId, AdmissionMethodUpdate, Major, MajorId, MajorUpdate,
    MappingEntry, MappingEntryId, NewAdmissionMethod, NewMajor, NewMappingEntry, NewSubjectGroup,
    NewUniversity, SubjectGroup, SubjectGroupId, SubjectGroupUpdate, University, UniversityId,
    UniversityUpdate,
};
use super::eligibility::{EligibilityOption, EligibilityQuery};
use super::import::{CatalogImporter, ImportError, ImportReport};
use super::repository::CatalogRepository;
use super::service::CatalogService;
use crate::error::{AdmissionError, AppError};
use crate::extract::{AdmissionJson, AdmissionPath, AdmissionQuery};
use crate::principal::Principal;

type SharedCatalog<C> = State<Arc<CatalogService<C>>>;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ListQuery {
    #[serde(default)]
    active_only: Option<bool>,
}

impl ListQuery {
    fn active_only(&self) -> bool {
        self.active_only.unwrap_or(true)
    }
}

/// Reference data, mapping administration, eligibility lookups and bulk import.
pub fn catalog_router<C>(service: Arc<CatalogService<C>>) -> Router
where
    C: CatalogRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/universities",
            get(list_universities::<C>).post(create_university::<C>),
        )
        .route(
            "/api/v1/universities/:id",
            get(get_university::<C>)
                .patch(update_university::<C>)
                .delete(deactivate_university::<C>),
        )
        .route("/api/v1/universities/:id/majors", get(list_majors::<C>))
        .route("/api/v1/majors", post(create_major::<C>))
        .route(
            "/api/v1/majors/:id",
            get(get_major::<C>)
                .patch(update_major::<C>)
                .delete(deactivate_major::<C>),
        )
        .route(
            "/api/v1/admission-methods",
            get(list_admission_methods::<C>).post(create_admission_method::<C>),
        )
        .route(
            "/api/v1/admission-methods/:id",
            patch(update_admission_method::<C>).delete(deactivate_admission_method::<C>),
        )
        .route(
            "/api/v1/subject-groups",
            get(list_subject_groups::<C>).post(create_subject_group::<C>),
        )
        .route(
            "/api/v1/subject-groups/:id",
            patch(update_subject_group::<C>).delete(deactivate_subject_group::<C>),
        )
        .route("/api/v1/mappings", post(create_mapping::<C>))
        .route(
            "/api/v1/mappings/:id",
            get(get_mapping::<C>).delete(delete_mapping::<C>),
        )
        .route("/api/v1/eligibility", get(eligibility::<C>))
        .route("/api/v1/catalog/import", post(import_catalog::<C>))
        .with_state(service)
}

async fn list_universities<C>(
    State(service): SharedCatalog<C>,
    AdmissionQuery(query): AdmissionQuery<ListQuery>,
) -> Result<Json<Vec<University>>, AdmissionError>
where
    C: CatalogRepository + 'static,
{
    service.universities(query.active_only()).map(Json)
}

async fn create_university<C>(
    State(service): SharedCatalog<C>,
    principal: Principal,
    AdmissionJson(input): AdmissionJson<NewUniversity>,
) -> Result<(StatusCode, Json<University>), AdmissionError>
where
    C: CatalogRepository + 'static,
{
    let created = service.create_university(&principal, input)?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_university<C>(
    State(service): SharedCatalog<C>,
    AdmissionPath(id): AdmissionPath<UniversityId>,
) -> Result<Json<University>, AdmissionError>
where
    C: CatalogRepository + 'static,
{
    service.university(&id).map(Json)
}

async fn update_university<C>(
    State(service): SharedCatalog<C>,
    principal: Principal,
    AdmissionPath(id): AdmissionPath<UniversityId>,
    AdmissionJson(update): AdmissionJson<UniversityUpdate>,
) -> Result<Json<University>, AdmissionError>
where
    C: CatalogRepository + 'static,
{
    service.update_university(&principal, &id, update).map(Json)
}

async fn deactivate_university<C>(
    State(service): SharedCatalog<C>,
    principal: Principal,
    AdmissionPath(id): AdmissionPath<UniversityId>,
) -> Result<Json<University>, AdmissionError>
where
    C: CatalogRepository + 'static,
{
    service.deactivate_university(&principal, &id).map(Json)
}

async fn list_majors<C>(
    State(service): SharedCatalog<C>,
    AdmissionPath(id): AdmissionPath<UniversityId>,
) -> Result<Json<Vec<Major>>, AdmissionError>
where
    C: CatalogRepository + 'static,
{
    service.majors_for_university(&id).map(Json)
}

async fn create_major<C>(
    State(service): SharedCatalog<C>,
    principal: Principal,
    AdmissionJson(input): AdmissionJson<NewMajor>,
) -> Result<(StatusCode, Json<Major>), AdmissionError>
where
    C: CatalogRepository + 'static,
{
    let created = service.create_major(&principal, input)?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_major<C>(
    State(service): SharedCatalog<C>,
    AdmissionPath(id): AdmissionPath<MajorId>,
) -> Result<Json<Major>, AdmissionError>
where
    C: CatalogRepository + 'static,
{
    service.major(&id).map(Json)
}

async fn update_major<C>(
    State(service): SharedCatalog<C>,
    principal: Principal,
    AdmissionPath(id): AdmissionPath<MajorId>,
    AdmissionJson(update): AdmissionJson<MajorUpdate>,
) -> Result<Json<Major>, AdmissionError>
where
    C: CatalogRepository + 'static,
{
    service.update_major(&principal, &id, update).map(Json)
}

async fn deactivate_major<C>(
    State(service): SharedCatalog<C>,
    principal: Principal,
    AdmissionPath(id): AdmissionPath<MajorId>,
) -> Result<Json<Major>, AdmissionError>
where
    C: CatalogRepository + 'static,
{
    service.deactivate_major(&principal, &id).map(Json)
}

async fn list_admission_methods<C>(
    State(service): SharedCatalog<C>,
    AdmissionQuery(query): AdmissionQuery<ListQuery>,
) -> Result<Json<Vec<AdmissionMethod>>, AdmissionError>
where
    C: CatalogRepository + 'static,
{
    service.admission_methods(query.active_only()).map(Json)
}

async fn create_admission_method<C>(
    State(service): SharedCatalog<C>,
    principal: Principal,
    AdmissionJson(input): AdmissionJson<NewAdmissionMethod>,
) -> Result<(StatusCode, Json<AdmissionMethod>), AdmissionError>
where
    C: CatalogRepository + 'static,
{
    let created = service.create_admission_method(&principal, input)?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_admission_method<C>(
    State(service): SharedCatalog<C>,
    principal: Principal,
    AdmissionPath(id): AdmissionPath<AdmissionMethodId>,
    AdmissionJson(update): AdmissionJson<AdmissionMethodUpdate>,
) -> Result<Json<AdmissionMethod>, AdmissionError>
where
    C: CatalogRepository + 'static,
{
    service
        .update_admission_method(&principal, &id, update)
        .map(Json)
}

async fn deactivate_admission_method<C>(
    State(service): SharedCatalog<C>,
    principal: Principal,
    AdmissionPath(id): AdmissionPath<AdmissionMethodId>,
) -> Result<Json<AdmissionMethod>, AdmissionError>
where
    C: CatalogRepository + 'static,
{
    service.deactivate_admission_method(&principal, &id).map(Json)
}

async fn list_subject_groups<C>(
    State(service): SharedCatalog<C>,
    AdmissionQuery(query): AdmissionQuery<ListQuery>,
) -> Result<Json<Vec<SubjectGroup>>, AdmissionError>
where
    C: CatalogRepository + 'static,
{
    service.subject_groups(query.active_only()).map(Json)
}

async fn create_subject_group<C>(
    State(service): SharedCatalog<C>,
    principal: Principal,
    AdmissionJson(input): AdmissionJson<NewSubjectGroup>,
) -> Result<(StatusCode, Json<SubjectGroup>), AdmissionError>
where
    C: CatalogRepository + 'static,
{
    let created = service.create_subject_group(&principal, input)?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_subject_group<C>(
    State(service): SharedCatalog<C>,
    principal: Principal,
    AdmissionPath(id): AdmissionPath<SubjectGroupId>,
    AdmissionJson(update): AdmissionJson<SubjectGroupUpdate>,
) -> Result<Json<SubjectGroup>, AdmissionError>
where
    C: CatalogRepository + 'static,
{
    service.update_subject_group(&principal, &id, update).map(Json)
}

async fn deactivate_subject_group<C>(
    State(service): SharedCatalog<C>,
    principal: Principal,
    AdmissionPath(id): AdmissionPath<SubjectGroupId>,
) -> Result<Json<SubjectGroup>, AdmissionError>
where
    C: CatalogRepository + 'static,
{
    service.deactivate_subject_group(&principal, &id).map(Json)
}

async fn create_mapping<C>(
    State(service): SharedCatalog<C>,
    principal: Principal,
    AdmissionJson(input): AdmissionJson<NewMappingEntry>,
) -> Result<(StatusCode, Json<MappingEntry>), AdmissionError>
where
    C: CatalogRepository + 'static,
{
    let created = service.create_mapping_entry(&principal, input)?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_mapping<C>(
    State(service): SharedCatalog<C>,
    AdmissionPath(id): AdmissionPath<MappingEntryId>,
) -> Result<Json<MappingEntry>, AdmissionError>
where
    C: CatalogRepository + 'static,
{
    service.mapping_entry(&id).map(Json)
}

async fn delete_mapping<C>(
    State(service): SharedCatalog<C>,
    principal: Principal,
    AdmissionPath(id): AdmissionPath<MappingEntryId>,
) -> Result<Json<MappingEntry>, AdmissionError>
where
    C: CatalogRepository + 'static,
{
    service.delete_mapping_entry(&principal, &id).map(Json)
}

async fn eligibility<C>(
    State(service): SharedCatalog<C>,
    AdmissionQuery(query): AdmissionQuery<EligibilityQuery>,
) -> Result<Json<Vec<EligibilityOption>>, AdmissionError>
where
    C: CatalogRepository + 'static,
{
    service.eligibility().resolve(&query).map(Json)
}

/// The body is the raw CSV export. Domain failures keep their own status codes.
async fn import_catalog<C>(
    State(service): SharedCatalog<C>,
    principal: Principal,
    body: String,
) -> Response
where
    C: CatalogRepository + 'static,
{
    let outcome: Result<ImportReport, ImportError> =
        CatalogImporter::from_reader(&service, &principal, Cursor::new(body.into_bytes()));
    match outcome {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(ImportError::Catalog(err)) => err.into_response(),
        Err(other) => AppError::from(other).into_response(),
    }
}
