//! HTTP client for the Bandmate REST backend
//!
//! One trait method per backend operation; the reqwest implementation builds
//! each request, attaches the bearer token where the operation requires it,
//! and surfaces any non-2xx response as an `AppError::Api` carrying the
//! status and body text. Nothing is retried.

pub mod types;

use async_trait::async_trait;
use reqwest::{header, Client, Request};
use serde::Serialize;
use serde_json::Value;

use crate::config::AuthPolicy;
use crate::errors::AppError;
use types::{ArtistPayload, ListPayload, SongPayload};

/// Filters for the song collection listing. When both are set, `ids` wins
/// and `user_id` is ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SongsFilter {
    pub ids: Option<Vec<String>>,
    pub user_id: Option<String>,
}

#[async_trait]
pub trait BandmateApi: Send + Sync {
    async fn list_songs(&self, filter: &SongsFilter) -> Result<Value, AppError>;
    async fn get_song(&self, id: &str) -> Result<Value, AppError>;
    async fn songs_by_user(&self, user_id: &str) -> Result<Value, AppError>;
    async fn songs_in_list(&self, list_id: &str) -> Result<Value, AppError>;
    async fn upsert_song(&self, song: &SongPayload) -> Result<Value, AppError>;
    async fn list_lists(&self, user_id: Option<&str>) -> Result<Value, AppError>;
    async fn get_list(&self, id: &str) -> Result<Value, AppError>;
    async fn upsert_list(&self, list: &ListPayload) -> Result<Value, AppError>;
    async fn list_artists(&self) -> Result<Value, AppError>;
    async fn upsert_artist(&self, artist: &ArtistPayload) -> Result<Value, AppError>;
}

pub fn songs_path(filter: &SongsFilter) -> String {
    if let Some(ids) = filter.ids.as_deref().filter(|ids| !ids.is_empty()) {
        return format!("/songs?ids={}", ids.join(","));
    }
    match filter.user_id.as_deref() {
        Some(user_id) => format!("/songs?userId={user_id}"),
        None => "/songs".to_string(),
    }
}

pub fn lists_path(user_id: Option<&str>) -> String {
    match user_id {
        Some(user_id) => format!("/lists?userId={user_id}"),
        None => "/lists".to_string(),
    }
}

pub struct HttpBandmateClient {
    base_url: String,
    auth_token: Option<String>,
    auth_policy: AuthPolicy,
    client: Client,
}

impl HttpBandmateClient {
    pub fn new(
        api_url: impl Into<String>,
        auth_token: Option<String>,
        auth_policy: AuthPolicy,
    ) -> Self {
        Self {
            base_url: api_url.into().trim_end_matches('/').to_string(),
            auth_token,
            auth_policy,
            client: Client::new(),
        }
    }

    fn url(&self, path_and_query: &str) -> String {
        format!("{}{}", self.base_url, path_and_query)
    }

    fn bearer_value(&self, requires_auth: bool) -> Result<Option<String>, AppError> {
        if !requires_auth {
            return Ok(None);
        }
        match (&self.auth_token, self.auth_policy) {
            (Some(token), _) => Ok(Some(format!("Bearer {token}"))),
            // Observed upstream behavior: the request goes out unauthenticated
            // and the backend decides.
            (None, AuthPolicy::Open) => Ok(None),
            (None, AuthPolicy::Strict) => Err(AppError::unauthorized(
                "missing_auth_token",
                "BANDMATE_AUTH_TOKEN is required for this operation",
            )),
        }
    }

    fn get_request(&self, path_and_query: &str) -> Result<Request, AppError> {
        self.client
            .get(self.url(path_and_query))
            .header(header::CONTENT_TYPE, "application/json")
            .build()
            .map_err(|err| AppError::internal(format!("failed to build backend request: {err}")))
    }

    fn post_request<T: Serialize>(
        &self,
        path: &str,
        body: &T,
        requires_auth: bool,
    ) -> Result<Request, AppError> {
        let mut builder = self
            .client
            .post(self.url(path))
            .header(header::CONTENT_TYPE, "application/json")
            .json(body);
        if let Some(bearer) = self.bearer_value(requires_auth)? {
            builder = builder.header(header::AUTHORIZATION, bearer);
        }
        builder
            .build()
            .map_err(|err| AppError::internal(format!("failed to build backend request: {err}")))
    }

    async fn execute(&self, request: Request) -> Result<Value, AppError> {
        let response = self
            .client
            .execute(request)
            .await
            .map_err(|err| AppError::internal(format!("backend request failed: {err}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| AppError::internal(format!("failed to read backend response: {err}")))?;

        if !status.is_success() {
            return Err(AppError::api(status.as_u16(), body));
        }

        serde_json::from_str(&body)
            .map_err(|err| AppError::internal(format!("backend returned invalid JSON: {err}")))
    }
}

#[async_trait]
impl BandmateApi for HttpBandmateClient {
    async fn list_songs(&self, filter: &SongsFilter) -> Result<Value, AppError> {
        let request = self.get_request(&songs_path(filter))?;
        self.execute(request).await
    }

    async fn get_song(&self, id: &str) -> Result<Value, AppError> {
        let request = self.get_request(&format!("/songs/{id}"))?;
        self.execute(request).await
    }

    async fn songs_by_user(&self, user_id: &str) -> Result<Value, AppError> {
        let request = self.get_request(&format!("/songs/user/{user_id}"))?;
        self.execute(request).await
    }

    async fn songs_in_list(&self, list_id: &str) -> Result<Value, AppError> {
        let request = self.get_request(&format!("/songs/list/{list_id}"))?;
        self.execute(request).await
    }

    async fn upsert_song(&self, song: &SongPayload) -> Result<Value, AppError> {
        let request = self.post_request("/songs", song, false)?;
        self.execute(request).await
    }

    async fn list_lists(&self, user_id: Option<&str>) -> Result<Value, AppError> {
        let request = self.get_request(&lists_path(user_id))?;
        self.execute(request).await
    }

    async fn get_list(&self, id: &str) -> Result<Value, AppError> {
        let request = self.get_request(&format!("/lists/{id}"))?;
        self.execute(request).await
    }

    async fn upsert_list(&self, list: &ListPayload) -> Result<Value, AppError> {
        let request = self.post_request("/lists", list, true)?;
        self.execute(request).await
    }

    async fn list_artists(&self) -> Result<Value, AppError> {
        let request = self.get_request("/artists")?;
        self.execute(request).await
    }

    async fn upsert_artist(&self, artist: &ArtistPayload) -> Result<Value, AppError> {
        let request = self.post_request("/artists", artist, false)?;
        self.execute(request).await
    }
}
