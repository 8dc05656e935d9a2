use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response for `POST /token`.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Compact signed bearer credential.
    pub token: String,
    /// Credential lifetime in seconds.
    pub expires_in: u64,
}

/// Response for `GET /health`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub message: String,
}

/// Echo of the query a listings response was produced for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListingsMeta {
    /// Start of the date range, `YYYYMMDD`.
    pub start_date: String,
    /// End of the date range, `YYYYMMDD`.
    pub end_date: String,
    pub page: u32,
    pub page_size: u32,
    /// Provider genre code the query was restricted to.
    pub category: String,
}

/// A normalized performance listing.
///
/// Every field is optional: the provider does not guarantee any of them,
/// and an absent upstream field stays `null` rather than being given a
/// placeholder value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Listing {
    /// Provider's listing identifier.
    pub id: Option<String>,
    /// Performance title.
    pub title: Option<String>,
    /// First performance date.
    pub start_date: Option<String>,
    /// Last performance date.
    pub end_date: Option<String>,
    /// Venue name.
    pub venue: Option<String>,
    /// Poster image URL.
    pub poster: Option<String>,
    /// Genre name.
    pub genre: Option<String>,
    /// Region name.
    pub region: Option<String>,
    /// Provider's open-run flag ("Y"/"N").
    pub open_run: Option<String>,
}

impl Listing {
    /// Project a raw provider item (one `db` element of the parsed XML
    /// tree) into the normalized shape.
    ///
    /// Lookups are by the provider's field names; anything missing or not
    /// a plain text value becomes `None`.
    pub fn from_raw(item: &Value) -> Self {
        let text = |key: &str| {
            item.get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        Self {
            id: text("mt20id"),
            title: text("prfnm"),
            start_date: text("prfpdfrom"),
            end_date: text("prfpdto"),
            venue: text("fcltynm"),
            poster: text("poster"),
            genre: text("genrenm"),
            region: text("area"),
            open_run: text("openrun"),
        }
    }
}

/// Response for `GET /listings`: echoed query metadata, the full parsed
/// provider tree for consumers that need un-normalized detail, and the
/// normalized items.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListingsResponse {
    pub meta: ListingsMeta,
    pub raw: Value,
    pub items: Vec<Listing>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_raw_maps_provider_fields() {
        let item = json!({
            "mt20id": "PF251234",
            "prfnm": "Spring Tour",
            "prfpdfrom": "2025.03.01",
            "prfpdto": "2025.03.31",
            "fcltynm": "Riverside Hall",
            "poster": "http://img.example.com/poster.gif",
            "genrenm": "Popular music",
            "area": "Seoul",
            "openrun": "N"
        });

        let listing = Listing::from_raw(&item);
        assert_eq!(listing.id.as_deref(), Some("PF251234"));
        assert_eq!(listing.title.as_deref(), Some("Spring Tour"));
        assert_eq!(listing.venue.as_deref(), Some("Riverside Hall"));
        assert_eq!(listing.open_run.as_deref(), Some("N"));
    }

    #[test]
    fn test_missing_fields_stay_none() {
        let item = json!({ "mt20id": "PF251234" });

        let listing = Listing::from_raw(&item);
        assert_eq!(listing.id.as_deref(), Some("PF251234"));
        assert_eq!(listing.title, None);
        assert_eq!(listing.poster, None);
        assert_eq!(listing.open_run, None);
    }

    #[test]
    fn test_null_and_nested_values_become_none() {
        // The XML tree builder yields null for empty elements and objects
        // for nested ones; neither is a usable text field.
        let item = json!({ "prfnm": null, "area": {"unexpected": "child"} });

        let listing = Listing::from_raw(&item);
        assert_eq!(listing.title, None);
        assert_eq!(listing.region, None);
    }

    #[test]
    fn test_absent_fields_serialize_as_null() {
        let listing = Listing {
            id: Some("PF251234".to_string()),
            ..Listing::default()
        };

        let value = serde_json::to_value(&listing).unwrap();
        assert_eq!(value["id"], json!("PF251234"));
        assert_eq!(value["title"], Value::Null);
    }
}
