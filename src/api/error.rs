//! Error taxonomy for calls to the SSIS backend.

use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

use super::api_types::ApiErrorBody;

/// Error code the backend puts in `{ "code": ... }` for uniqueness violations
const CONFLICT_CODE: &str = "conflict";

/// Shown once a request is rejected for an expired or missing token
pub const SESSION_EXPIRED: &str = "Session expired. Restart ssis to sign in again.";

#[derive(Debug, Error)]
pub enum ApiError {
  #[error("network error: {0}")]
  Network(#[from] reqwest::Error),

  /// 401, with the backend's reason (e.g. bad credentials at login)
  #[error("{0}")]
  Unauthorized(String),

  #[error("not found: {0}")]
  NotFound(String),

  /// The record clashes with an existing one (duplicate key)
  #[error("conflict: {0}")]
  Conflict(String),

  #[error("request rejected ({status}): {message}")]
  Rejected { status: StatusCode, message: String },

  #[error("unexpected response: {0}")]
  Decode(String),

  #[error("could not read {}: {source}", .path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

impl ApiError {
  /// Classify a failed response by status and structured error body.
  ///
  /// Conflicts are recognised by HTTP 409 or `code: "conflict"`; the free
  /// text of the message is never inspected.
  pub fn from_response(status: StatusCode, body: &[u8]) -> Self {
    let parsed: Option<ApiErrorBody> = serde_json::from_slice(body).ok();
    let code = parsed.as_ref().and_then(|b| b.code.clone());
    let reason = parsed.and_then(|b| b.error.or(b.message));

    if status == StatusCode::UNAUTHORIZED {
      return ApiError::Unauthorized(
        reason.unwrap_or_else(|| "not signed in or session expired".to_string()),
      );
    }

    let message = reason.unwrap_or_else(|| {
      status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string()
    });
    if status == StatusCode::CONFLICT || code.as_deref() == Some(CONFLICT_CODE) {
      return ApiError::Conflict(message);
    }
    if status == StatusCode::NOT_FOUND {
      return ApiError::NotFound(message);
    }
    ApiError::Rejected { status, message }
  }

  pub fn is_unauthorized(&self) -> bool {
    matches!(self, ApiError::Unauthorized(_))
  }

  /// Text shown to the user. `conflict_message` replaces the backend's wording
  /// for duplicate records.
  pub fn user_message(&self, conflict_message: &str) -> String {
    match self {
      ApiError::Network(_) => "Network error. Please try again.".to_string(),
      ApiError::Unauthorized(_) => SESSION_EXPIRED.to_string(),
      ApiError::NotFound(message) => message.clone(),
      ApiError::Conflict(_) => conflict_message.to_string(),
      ApiError::Rejected { message, .. } => message.clone(),
      ApiError::Decode(_) => "Unexpected response from the server.".to_string(),
      ApiError::Io { .. } => self.to_string(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_conflict_from_status() {
    let err = ApiError::from_response(
      StatusCode::CONFLICT,
      br#"{"error": "duplicate key value violates unique constraint"}"#,
    );
    assert!(matches!(err, ApiError::Conflict(_)));
    assert_eq!(err.user_message("Student ID already exists."), "Student ID already exists.");
  }

  #[test]
  fn test_conflict_from_code() {
    let err = ApiError::from_response(
      StatusCode::BAD_REQUEST,
      br#"{"error": "Program code taken", "code": "conflict"}"#,
    );
    assert!(matches!(err, ApiError::Conflict(ref m) if m == "Program code taken"));
  }

  #[test]
  fn test_duplicate_wording_alone_is_not_a_conflict() {
    let err = ApiError::from_response(
      StatusCode::INTERNAL_SERVER_ERROR,
      br#"{"error": "duplicate key value"}"#,
    );
    match err {
      ApiError::Rejected { status, message } => {
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "duplicate key value");
      }
      other => panic!("unexpected {other:?}"),
    }
  }

  #[test]
  fn test_unauthorized_and_not_found() {
    assert!(ApiError::from_response(StatusCode::UNAUTHORIZED, b"").is_unauthorized());
    let err = ApiError::from_response(StatusCode::NOT_FOUND, br#"{"error": "Student not found"}"#);
    assert_eq!(err.user_message(""), "Student not found");
  }

  #[test]
  fn test_unauthorized_keeps_backend_reason() {
    let err = ApiError::from_response(
      StatusCode::UNAUTHORIZED,
      br#"{"error": "Invalid username or password"}"#,
    );
    assert!(err.is_unauthorized());
    assert_eq!(err.to_string(), "Invalid username or password");
    assert_eq!(err.user_message(""), SESSION_EXPIRED);

    let bare = ApiError::from_response(StatusCode::UNAUTHORIZED, b"");
    assert_eq!(bare.to_string(), "not signed in or session expired");
  }

  #[test]
  fn test_unparseable_body_uses_reason_phrase() {
    let err = ApiError::from_response(StatusCode::BAD_GATEWAY, b"<html>oops</html>");
    assert_eq!(err.user_message(""), "Bad Gateway");
  }
}
