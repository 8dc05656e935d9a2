mod api;

pub use api::{HealthResponse, Listing, ListingsMeta, ListingsResponse, TokenResponse};
