//! Client for the upstream performance-listings provider.
//!
//! The provider exposes listings as XML at `GET {base_url}/pblprfr`. This
//! module owns the full round trip: query construction, the HTTP call,
//! XML-to-JSON conversion, the single-item-vs-array normalization of the
//! result set, and the mapping of every failure mode onto a 502-class
//! [`AppError`].

pub mod xml;

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::error::{AppError, AppResult};
use crate::metrics;
use crate::models::{Listing, ListingsMeta, ListingsResponse};
use crate::validation::DATE_FORMAT;

/// Provider resource for performance listings.
const LISTINGS_PATH: &str = "/pblprfr";

/// A validated listings query, ready to be sent upstream.
#[derive(Debug, Clone)]
pub struct ListingsQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub page: u32,
    pub page_size: u32,
    /// Provider genre code to restrict results to.
    pub category: String,
}

impl ListingsQuery {
    fn start_date_wire(&self) -> String {
        self.start_date.format(DATE_FORMAT).to_string()
    }

    fn end_date_wire(&self) -> String {
        self.end_date.format(DATE_FORMAT).to_string()
    }

    fn meta(&self) -> ListingsMeta {
        ListingsMeta {
            start_date: self.start_date_wire(),
            end_date: self.end_date_wire(),
            page: self.page,
            page_size: self.page_size,
            category: self.category.clone(),
        }
    }
}

/// HTTP client for the listings provider.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct ListingsClient {
    http: Client,
    base_url: Arc<str>,
    api_key: Arc<str>,
}

impl ListingsClient {
    /// Create a client with the given connect/read timeout.
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::ConfigError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            api_key: Arc::from(api_key),
        })
    }

    /// Fetch one page of listings and normalize it to JSON.
    ///
    /// Failures map onto the three 502 variants: the provider could not be
    /// reached (connect failure or timeout), it answered with a non-2xx
    /// status, or its body was not parseable XML.
    #[instrument(skip(self), fields(page = query.page, page_size = query.page_size))]
    pub async fn fetch_listings(&self, query: &ListingsQuery) -> AppResult<ListingsResponse> {
        let url = format!("{}{}", self.base_url, LISTINGS_PATH);
        let params = [
            ("service", self.api_key.as_ref()),
            ("stdate", &query.start_date_wire()),
            ("eddate", &query.end_date_wire()),
            ("cpage", &query.page.to_string()),
            ("rows", &query.page_size.to_string()),
            ("shcate", &query.category),
        ];

        let started = Instant::now();
        let response = self
            .http
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                metrics::record_upstream_failure("unreachable");
                // without_url keeps the API key out of the error message
                AppError::UpstreamUnreachable(e.without_url().to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            metrics::record_upstream_failure("bad_status");
            warn!(status = status.as_u16(), "upstream returned an error status");
            return Err(AppError::UpstreamBadStatus(status.as_u16()));
        }

        let body = response.text().await.map_err(|e| {
            metrics::record_upstream_failure("unreachable");
            AppError::UpstreamUnreachable(e.without_url().to_string())
        })?;
        metrics::record_upstream_duration(started.elapsed().as_secs_f64());

        let raw = xml::xml_to_value(&body).map_err(|e| {
            metrics::record_upstream_failure("malformed");
            AppError::UpstreamMalformed(e.to_string())
        })?;

        let items: Vec<Listing> = extract_items(&raw).iter().map(Listing::from_raw).collect();
        debug!(items = items.len(), "fetched listings page");

        Ok(ListingsResponse {
            meta: query.meta(),
            raw,
            items,
        })
    }
}

/// Pull the result set out of the converted provider document.
///
/// Listings live at `dbs.db`. The XML-to-JSON mapping makes a single
/// listing an object and several listings an array; both come back here
/// as a uniform `Vec`. A missing or empty result set is an empty page,
/// not an error.
fn extract_items(raw: &Value) -> Vec<Value> {
    match raw.pointer("/dbs/db") {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::Null) | None => Vec::new(),
        Some(single) => vec![single.clone()],
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn query() -> ListingsQuery {
        ListingsQuery {
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
            page: 2,
            page_size: 25,
            category: "CCCD".to_string(),
        }
    }

    #[test]
    fn test_query_dates_use_compact_wire_format() {
        let query = query();
        assert_eq!(query.start_date_wire(), "20250101");
        assert_eq!(query.end_date_wire(), "20250131");
    }

    #[test]
    fn test_meta_echoes_the_query() {
        let meta = query().meta();
        assert_eq!(meta.start_date, "20250101");
        assert_eq!(meta.end_date, "20250131");
        assert_eq!(meta.page, 2);
        assert_eq!(meta.page_size, 25);
        assert_eq!(meta.category, "CCCD");
    }

    #[test]
    fn test_extract_items_from_array() {
        let raw = json!({"dbs": {"db": [{"mt20id": "PF1"}, {"mt20id": "PF2"}]}});
        let items = extract_items(&raw);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["mt20id"], "PF1");
    }

    #[test]
    fn test_extract_items_wraps_single_object() {
        let raw = json!({"dbs": {"db": {"mt20id": "PF1"}}});
        let items = extract_items(&raw);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["mt20id"], "PF1");
    }

    #[test]
    fn test_extract_items_empty_when_absent() {
        assert!(extract_items(&json!({"dbs": null})).is_empty());
        assert!(extract_items(&json!({"dbs": {"db": null}})).is_empty());
        assert!(extract_items(&json!({"other": {}})).is_empty());
    }

    #[test]
    fn test_client_rejects_trailing_slash_in_base_url() {
        let client =
            ListingsClient::new("http://example.com/api/", "key", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url.as_ref(), "http://example.com/api");
    }
}
