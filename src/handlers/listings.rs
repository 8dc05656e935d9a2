//! Listings proxy endpoint.

use axum::Json;
use axum::extract::{Extension, Query, State};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::{AppError, AppResult};
use crate::middleware::AuthSubject;
use crate::models::ListingsResponse;
use crate::state::AppState;
use crate::upstream::ListingsQuery;
use crate::validation::{validate_date, validate_page, validate_page_size};

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    20
}

/// Query parameters for `GET /listings`.
#[derive(Debug, Deserialize)]
pub struct ListingsParams {
    /// Start of the date range, `YYYYMMDD` (required).
    pub start_date: Option<String>,
    /// End of the date range, `YYYYMMDD` (required).
    pub end_date: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

/// Proxy a page of performance listings from the upstream provider.
///
/// Requires a valid bearer token; the auth middleware has already run
/// and stashed the token's subject as a request extension.
#[instrument(skip(state, subject), fields(subject = %subject.0))]
pub async fn get_listings(
    State(state): State<AppState>,
    Extension(subject): Extension<AuthSubject>,
    Query(params): Query<ListingsParams>,
) -> AppResult<Json<ListingsResponse>> {
    let start_date = params
        .start_date
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("start_date is required".to_string()))?;
    let end_date = params
        .end_date
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("end_date is required".to_string()))?;

    let start_date = validate_date("start_date", start_date)?;
    let end_date = validate_date("end_date", end_date)?;
    if end_date < start_date {
        return Err(AppError::BadRequest(
            "end_date must not be before start_date".to_string(),
        ));
    }
    validate_page(params.page)?;
    validate_page_size(params.page_size)?;

    let query = ListingsQuery {
        start_date,
        end_date,
        page: params.page,
        page_size: params.page_size,
        category: state.config.provider_category.clone(),
    };

    let response = state.listings.fetch_listings(&query).await?;
    debug!(items = response.items.len(), "served listings page");

    Ok(Json(response))
}
