use color_eyre::{eyre::eyre, Result};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use url::Url;

use super::api_types::{
  ApiCodesResponse, ApiListResponse, ApiLoginRequest, ApiLoginResponse, ApiPhotoResponse, ApiUser,
};
use super::error::ApiError;
use crate::config::Config;
use crate::entity::Entity;
use crate::listview::{ListParams, Page};

/// Upper bound the backend accepts for `per_page` on code lists
const CODES_PER_PAGE: &str = "1000";

/// SSIS REST client. Clones share the session token.
#[derive(Clone)]
pub struct SsisClient {
  http: reqwest::Client,
  base: Url,
  token: Arc<RwLock<Option<String>>>,
}

impl SsisClient {
  pub fn new(config: &Config) -> Result<Self> {
    let base = Url::parse(&config.api.url)
      .map_err(|e| eyre!("Invalid API url {}: {}", config.api.url, e))?;
    if base.cannot_be_a_base() {
      return Err(eyre!("Invalid API url {}: not a base url", config.api.url));
    }

    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.api.timeout_secs))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      base,
      token: Arc::new(RwLock::new(None)),
    })
  }

  /// Host shown in the header
  pub fn host(&self) -> &str {
    self.base.host_str().unwrap_or("")
  }

  pub fn set_token(&self, token: Option<String>) {
    let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());
    *guard = token;
  }

  pub fn has_token(&self) -> bool {
    self.current_token().is_some()
  }

  fn current_token(&self) -> Option<String> {
    self
      .token
      .read()
      .unwrap_or_else(|e| e.into_inner())
      .clone()
  }

  /// Base url with `segments` appended, each percent-encoded
  fn endpoint(&self, segments: &[&str]) -> Url {
    let mut url = self.base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
      path.pop_if_empty().extend(segments);
    }
    url
  }

  async fn execute(
    &self,
    request: RequestBuilder,
    expected: &[StatusCode],
  ) -> Result<Vec<u8>, ApiError> {
    let request = match self.current_token() {
      Some(token) => request.bearer_auth(token),
      None => request,
    };

    let response = request.send().await?;
    let status = response.status();
    let body = response.bytes().await?;

    if !expected.contains(&status) {
      tracing::debug!(%status, "request failed");
      return Err(ApiError::from_response(status, &body));
    }
    Ok(body.to_vec())
  }

  /// Sign in and keep the returned token for later requests
  pub async fn login(&self, username: &str, password: &str) -> Result<Option<ApiUser>, ApiError> {
    let request = self
      .http
      .post(self.endpoint(&["auth", "login"]))
      .json(&ApiLoginRequest { username, password });

    let body = self.execute(request, &[StatusCode::OK]).await?;
    let response: ApiLoginResponse = decode(&body)?;
    self.set_token(Some(response.access_token));
    tracing::info!(username, "signed in");
    Ok(response.user)
  }

  /// End the session. The local token is dropped even if the call fails.
  pub async fn logout(&self) -> Result<(), ApiError> {
    let request = self.http.post(self.endpoint(&["auth", "logout"]));
    let result = self
      .execute(request, &[StatusCode::OK, StatusCode::NO_CONTENT])
      .await;
    self.set_token(None);
    result.map(|_| ())
  }

  /// One page of an entity collection
  pub async fn list<E: Entity>(&self, params: ListParams) -> Result<Page<E::Record>, ApiError> {
    tracing::debug!(namespace = E::PATH, page = params.page, per_page = params.per_page, "list request");
    let request = self
      .http
      .get(self.endpoint(&[E::PATH]))
      .query(&params.query_pairs());

    let body = self.execute(request, &[StatusCode::OK]).await?;
    let response: ApiListResponse<E::Record> = decode(&body)?;
    Ok(Page {
      rows: response.data,
      total_count: response.total,
    })
  }

  /// Every code of a collection (e.g. "programs"), for filter and form options
  pub async fn codes(&self, namespace: &str) -> Result<Vec<String>, ApiError> {
    let request = self
      .http
      .get(self.endpoint(&[namespace]))
      .query(&[("only_codes", "true"), ("per_page", CODES_PER_PAGE)]);

    let body = self.execute(request, &[StatusCode::OK]).await?;
    let response: ApiCodesResponse = decode(&body)?;
    Ok(response.data)
  }

  pub async fn create<E: Entity>(&self, payload: &E::Payload) -> Result<(), ApiError> {
    let request = self.http.post(self.endpoint(&[E::PATH])).json(payload);
    self.execute(request, &[StatusCode::CREATED]).await?;
    tracing::info!(namespace = E::PATH, "record created");
    Ok(())
  }

  pub async fn update<E: Entity>(&self, id: &str, payload: &E::Payload) -> Result<(), ApiError> {
    let request = self.http.put(self.endpoint(&[E::PATH, id])).json(payload);
    self.execute(request, &[StatusCode::OK]).await?;
    tracing::info!(namespace = E::PATH, id, "record updated");
    Ok(())
  }

  pub async fn delete<E: Entity>(&self, id: &str) -> Result<(), ApiError> {
    let request = self.http.delete(self.endpoint(&[E::PATH, id]));
    self
      .execute(request, &[StatusCode::OK, StatusCode::NO_CONTENT])
      .await?;
    tracing::info!(namespace = E::PATH, id, "record deleted");
    Ok(())
  }

  /// Upload a student photo from a local file. Returns the new photo url.
  pub async fn upload_photo(&self, student_id: &str, path: &Path) -> Result<Option<String>, ApiError> {
    let data = tokio::fs::read(path).await.map_err(|source| ApiError::Io {
      path: path.to_path_buf(),
      source,
    })?;
    let file_name = path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_else(|| "photo".to_string());

    let part = reqwest::multipart::Part::bytes(data)
      .file_name(file_name)
      .mime_str(image_mime(path))?;
    let form = reqwest::multipart::Form::new().part("file", part);

    let request = self
      .http
      .post(self.endpoint(&["students", student_id, "photo"]))
      .multipart(form);

    let body = self
      .execute(request, &[StatusCode::OK, StatusCode::CREATED])
      .await?;
    let response: ApiPhotoResponse = decode(&body)?;
    tracing::info!(student_id, "photo uploaded");
    Ok(response.photo_url)
  }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
  serde_json::from_slice(body).map_err(|e| ApiError::Decode(e.to_string()))
}

fn image_mime(path: &Path) -> &'static str {
  let ext = path
    .extension()
    .map(|e| e.to_string_lossy().to_lowercase())
    .unwrap_or_default();
  match ext.as_str() {
    "jpg" | "jpeg" => "image/jpeg",
    "png" => "image/png",
    "gif" => "image/gif",
    "webp" => "image/webp",
    _ => "application/octet-stream",
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn client(url: &str) -> SsisClient {
    let mut config = Config::default();
    config.api.url = url.to_string();
    SsisClient::new(&config).unwrap()
  }

  #[test]
  fn test_endpoint_appends_segments() {
    let c = client("http://localhost:5000/api");
    assert_eq!(
      c.endpoint(&["students", "2023-0001"]).as_str(),
      "http://localhost:5000/api/students/2023-0001"
    );
    let c = client("http://localhost:5000/api/");
    assert_eq!(
      c.endpoint(&["programs"]).as_str(),
      "http://localhost:5000/api/programs"
    );
  }

  #[test]
  fn test_endpoint_escapes_ids() {
    let c = client("http://localhost:5000/api");
    assert_eq!(
      c.endpoint(&["colleges", "a/b"]).as_str(),
      "http://localhost:5000/api/colleges/a%2Fb"
    );
  }

  #[test]
  fn test_invalid_url_rejected() {
    let mut config = Config::default();
    config.api.url = "not a url".into();
    assert!(SsisClient::new(&config).is_err());
    config.api.url = "mailto:admin@example.com".into();
    assert!(SsisClient::new(&config).is_err());
  }

  #[test]
  fn test_token_shared_between_clones() {
    let a = client("http://localhost:5000/api");
    let b = a.clone();
    a.set_token(Some("t0k".into()));
    assert!(b.has_token());
    b.set_token(None);
    assert!(!a.has_token());
  }

  #[test]
  fn test_image_mime() {
    assert_eq!(image_mime(Path::new("me.JPG")), "image/jpeg");
    assert_eq!(image_mime(Path::new("me.png")), "image/png");
    assert_eq!(image_mime(Path::new("me")), "application/octet-stream");
  }
}
