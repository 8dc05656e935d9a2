//! Validation for listings query parameters.
//!
//! The upstream provider expects `YYYYMMDD` dates and bounded paging
//! values; everything is checked here before a request is built, so the
//! provider never sees malformed input and the caller gets a 400 naming
//! the offending field instead of an opaque 502.

use chrono::NaiveDate;

use crate::error::{AppError, AppResult};

/// Wire format for calendar dates (`YYYYMMDD`).
pub const DATE_FORMAT: &str = "%Y%m%d";

/// Largest accepted `page_size`.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Parse a `YYYYMMDD` date parameter; `field` names it in the error.
///
/// Rejects wrong lengths, non-digits, and impossible calendar dates
/// (e.g. `20250230`).
pub fn validate_date(field: &str, value: &str) -> AppResult<NaiveDate> {
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::BadRequest(format!(
            "{field} must be a date in YYYYMMDD format"
        )));
    }

    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| {
        AppError::BadRequest(format!("{field} is not a valid calendar date"))
    })
}

/// Page numbers are 1-based.
pub fn validate_page(page: u32) -> AppResult<u32> {
    if page == 0 {
        return Err(AppError::BadRequest("page must be >= 1".to_string()));
    }
    Ok(page)
}

/// Page size must be between 1 and [`MAX_PAGE_SIZE`].
pub fn validate_page_size(page_size: u32) -> AppResult<u32> {
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(AppError::BadRequest(format!(
            "page_size must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }
    Ok(page_size)
}
