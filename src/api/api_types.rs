//! Serde types matching the SSIS backend's request and response bodies.
//!
//! Entity records live with their entity descriptors; these are the
//! envelopes around them.

use serde::{Deserialize, Serialize};

/// Paginated list envelope: `{ data: [...], total: n }`
#[derive(Debug, Deserialize)]
pub struct ApiListResponse<T> {
  #[serde(default = "Vec::new")]
  pub data: Vec<T>,
  #[serde(default)]
  pub total: u64,
}

/// Response of `?only_codes=true`: `{ data: ["BSCS", ...] }`
#[derive(Debug, Deserialize)]
pub struct ApiCodesResponse {
  #[serde(default)]
  pub data: Vec<String>,
}

/// Error body returned with any non-success status
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
  pub error: Option<String>,
  pub message: Option<String>,
  /// Machine-readable error kind, e.g. "conflict"
  pub code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApiLoginRequest<'a> {
  pub username: &'a str,
  pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiUser {
  pub username: String,
  #[serde(default)]
  pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiLoginResponse {
  pub access_token: String,
  pub user: Option<ApiUser>,
}

#[derive(Debug, Deserialize)]
pub struct ApiPhotoResponse {
  pub photo_url: Option<String>,
}
