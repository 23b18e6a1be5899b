//! Request extractors that report malformed payloads as `ValidationFailed`.

use axum::async_trait;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;

use crate::error::AdmissionError;

/// `Json<T>` wrapper so unknown fields and type errors surface as structured 400s.
pub struct AdmissionJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for AdmissionJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AdmissionError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AdmissionError::validation(rejection.body_text()))?;
        Ok(AdmissionJson(value))
    }
}

/// `Query<T>` wrapper with the same rejection mapping as [`AdmissionJson`].
pub struct AdmissionQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for AdmissionQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AdmissionError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection: QueryRejection| {
                AdmissionError::validation(rejection.body_text())
            })?;
        Ok(AdmissionQuery(value))
    }
}

/// `Path<T>` wrapper; malformed identifiers are validation failures rather than plain-text 400s.
pub struct AdmissionPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for AdmissionPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AdmissionError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection: PathRejection| AdmissionError::validation(rejection.body_text()))?;
        Ok(AdmissionPath(value))
    }
}
