mod api_types;
mod client;
mod error;

pub use client::SsisClient;
pub use error::{ApiError, SESSION_EXPIRED};
