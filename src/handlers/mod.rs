mod health;
mod listings;
mod token;

pub use health::health_check;
pub use listings::{ListingsParams, get_listings};
pub use token::{TokenRequest, issue_token};
