use std::time::Instant;

use axum::http::StatusCode;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::catalog::{Element, Refbook, RefbookId};
use crate::error::{RefbookdError, Result};
use crate::lookup::LookupService;

#[derive(Deserialize)]
pub struct RefbooksQuery {
    pub date: Option<String>,
}

#[derive(Deserialize)]
pub struct ElementsQuery {
    pub version: Option<String>,
}

#[derive(Deserialize)]
pub struct CheckQuery {
    pub code: Option<String>,
    pub value: Option<String>,
    pub version: Option<String>,
}

#[derive(Serialize)]
pub struct RefbookItem {
    pub id: RefbookId,
    pub code: String,
    pub name: String,
}

impl From<Refbook> for RefbookItem {
    fn from(refbook: Refbook) -> Self {
        Self {
            id: refbook.id(),
            code: refbook.code().to_owned(),
            name: refbook.name().to_owned(),
        }
    }
}

#[derive(Serialize)]
pub struct RefbookListResponse {
    pub refbooks: Vec<RefbookItem>,
}

#[derive(Serialize)]
pub struct ElementItem {
    pub code: String,
    pub value: String,
}

impl From<Element> for ElementItem {
    fn from(element: Element) -> Self {
        Self {
            code: element.code().to_owned(),
            value: element.value().to_owned(),
        }
    }
}

#[derive(Serialize)]
pub struct ElementListResponse {
    pub elements: Vec<ElementItem>,
}

#[derive(Serialize)]
pub struct CheckResponse {
    pub valid: bool,
}

#[derive(Serialize)]
struct Detail {
    detail: String,
}

impl IntoResponse for RefbookdError {
    fn into_response(self) -> Response {
        let status = match &self {
            RefbookdError::BadRequest(_) => StatusCode::BAD_REQUEST,
            RefbookdError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let msg = self.to_string();
        warn!(%msg, code = %status.as_u16(), "lookup error");
        let detail = if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Internals stay in the log, not in the response body.
            "Internal server error".to_owned()
        } else {
            msg
        };
        (status, Json(Detail { detail })).into_response()
    }
}

pub fn router(lookup: LookupService) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET])
        .allow_headers(Any);
    Router::new()
        .route("/refbooks/", get(list_refbooks))
        .route("/refbooks/:id/elements/", get(list_elements))
        .route("/refbooks/:id/check_element/", get(check_element))
        .with_state(lookup)
        .layer(cors)
}

async fn list_refbooks(
    State(lookup): State<LookupService>,
    Query(query): Query<RefbooksQuery>,
) -> Result<Json<RefbookListResponse>> {
    let started = Instant::now();
    // An empty date counts as an absent one, same as the version and
    // code/value parameters.
    let as_of = query
        .date
        .as_deref()
        .filter(|d| !d.is_empty())
        .map(parse_date)
        .transpose()?;
    let refbooks = run_blocking(move || lookup.refbooks(as_of)).await?;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    info!(ms = elapsed_ms, count = refbooks.len(), "refbooks listed");
    Ok(Json(RefbookListResponse {
        refbooks: refbooks.into_iter().map(Into::into).collect(),
    }))
}

async fn list_elements(
    State(lookup): State<LookupService>,
    Path(id): Path<RefbookId>,
    Query(query): Query<ElementsQuery>,
) -> Result<Json<ElementListResponse>> {
    let started = Instant::now();
    let elements = run_blocking(move || lookup.elements(id, query.version.as_deref())).await?;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    info!(ms = elapsed_ms, refbook = id, count = elements.len(), "elements listed");
    Ok(Json(ElementListResponse {
        elements: elements.into_iter().map(Into::into).collect(),
    }))
}

async fn check_element(
    State(lookup): State<LookupService>,
    Path(id): Path<RefbookId>,
    Query(query): Query<CheckQuery>,
) -> Result<Json<CheckResponse>> {
    let started = Instant::now();
    let valid = run_blocking(move || {
        lookup.check_element(
            id,
            query.code.as_deref(),
            query.value.as_deref(),
            query.version.as_deref(),
        )
    })
    .await?;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    info!(ms = elapsed_ms, refbook = id, valid, "element checked");
    Ok(Json(CheckResponse { valid }))
}

/// The `date` query parameter must be an ISO calendar date.
fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        RefbookdError::BadRequest("Query parameter date must be formatted as YYYY-MM-DD".to_owned())
    })
}

// The lookup engine is synchronous (SQLite underneath), so queries run
// on the blocking pool.
async fn run_blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(result) => result,
        Err(e) => {
            warn!(error = %e, "Join error");
            Err(RefbookdError::Server(format!("worker task failed: {e}")))
        }
    }
}
