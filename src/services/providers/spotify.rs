/// Spotify Web API provider
///
/// Authenticates with the client-credentials flow and searches tracks by free
/// text. Tokens are reused until shortly before they expire; search results
/// are cached in Redis when a cache is configured.
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::{Client as HttpClient, StatusCode};
use tokio::sync::RwLock;

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{SpotifySearchResponse, SpotifyToken, Track},
    services::providers::RecommendationProvider,
};

const SEARCH_CACHE_TTL: u64 = 3600; // 1 hour
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);
const MAX_SEARCH_LIMIT: usize = 50;

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

impl CachedToken {
    fn from_response(token: SpotifyToken, now: Instant) -> Self {
        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        Self {
            value: token.access_token,
            expires_at: now + lifetime,
        }
    }

    fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

#[derive(Clone)]
pub struct SpotifyProvider {
    http_client: HttpClient,
    client_id: String,
    client_secret: String,
    api_url: String,
    auth_url: String,
    cache: Option<Cache>,
    token: Arc<RwLock<Option<CachedToken>>>,
}

impl SpotifyProvider {
    pub fn new(
        client_id: String,
        client_secret: String,
        api_url: String,
        auth_url: String,
        cache: Option<Cache>,
    ) -> Self {
        Self {
            http_client: HttpClient::new(),
            client_id,
            client_secret,
            api_url: api_url.trim_end_matches('/').to_string(),
            auth_url,
            cache,
            token: Arc::new(RwLock::new(None)),
        }
    }

    /// Returns a valid bearer token, requesting a new one when needed
    async fn access_token(&self) -> AppResult<String> {
        if let Some(token) = self.token.read().await.as_ref() {
            if token.is_fresh(Instant::now()) {
                return Ok(token.value.clone());
            }
        }

        let mut guard = self.token.write().await;
        // Another request may have refreshed while we waited for the lock
        if let Some(token) = guard.as_ref() {
            if token.is_fresh(Instant::now()) {
                return Ok(token.value.clone());
            }
        }

        let response = self
            .http_client
            .post(&self.auth_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::RecommendationService(format!(
                "Spotify token endpoint returned status {}: {}",
                status, body
            )));
        }

        let token: SpotifyToken = response.json().await?;
        let cached = CachedToken::from_response(token, Instant::now());
        let value = cached.value.clone();
        *guard = Some(cached);

        tracing::debug!(provider = "spotify", "Access token refreshed");

        Ok(value)
    }

    async fn fetch_tracks(&self, query: &str, limit: usize) -> AppResult<Vec<Track>> {
        let token = self.access_token().await?;
        let limit = limit.clamp(1, MAX_SEARCH_LIMIT).to_string();

        let url = format!("{}/search", self.api_url);
        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&token)
            .query(&[("q", query), ("type", "track"), ("limit", limit.as_str())])
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            // Revoked or expired early; the next request fetches a new token
            *self.token.write().await = None;
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::RecommendationService(format!(
                "Spotify search returned status {}: {}",
                status, body
            )));
        }

        let results: SpotifySearchResponse = response.json().await?;
        let tracks = results.into_tracks();

        tracing::info!(
            query = %query,
            results = tracks.len(),
            provider = "spotify",
            "Track search completed"
        );

        Ok(tracks)
    }
}

#[async_trait::async_trait]
impl RecommendationProvider for SpotifyProvider {
    async fn search_tracks(&self, query: &str, limit: usize) -> AppResult<Vec<Track>> {
        match &self.cache {
            Some(cache) => {
                let key = CacheKey::TrackSearch {
                    query: query.to_string(),
                    limit,
                };
                cached!(cache, key, SEARCH_CACHE_TTL, self.fetch_tracks(query, limit))
            }
            None => self.fetch_tracks(query, limit).await,
        }
    }

    fn name(&self) -> &'static str {
        "spotify"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_provider(auth_url: &str) -> SpotifyProvider {
        SpotifyProvider::new(
            "client".to_string(),
            "secret".to_string(),
            "http://127.0.0.1:1/v1/".to_string(),
            auth_url.to_string(),
            None,
        )
    }

    #[test]
    fn test_cached_token_lifetime_keeps_margin() {
        let now = Instant::now();
        let token = CachedToken::from_response(
            SpotifyToken {
                access_token: "tok".to_string(),
                expires_in: 3600,
            },
            now,
        );

        assert_eq!(token.value, "tok");
        assert!(token.is_fresh(now + Duration::from_secs(3500)));
        assert!(!token.is_fresh(now + Duration::from_secs(3540)));
    }

    #[test]
    fn test_cached_token_short_lifetime_is_immediately_stale() {
        let now = Instant::now();
        let token = CachedToken::from_response(
            SpotifyToken {
                access_token: "tok".to_string(),
                expires_in: 30,
            },
            now,
        );

        assert!(!token.is_fresh(now));
    }

    #[test]
    fn test_api_url_trailing_slash_is_trimmed() {
        let provider = create_test_provider("http://127.0.0.1:1/api/token");
        assert_eq!(provider.api_url, "http://127.0.0.1:1/v1");
        assert_eq!(provider.name(), "spotify");
    }

    #[tokio::test]
    async fn test_unreachable_token_endpoint_is_an_error() {
        let provider = create_test_provider("http://127.0.0.1:1/api/token");
        let result = provider.search_tracks("happy upbeat", 5).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_fresh_token_is_reused() {
        let provider = create_test_provider("http://127.0.0.1:1/api/token");
        *provider.token.write().await = Some(CachedToken {
            value: "cached-token".to_string(),
            expires_at: Instant::now() + Duration::from_secs(600),
        });

        assert_eq!(provider.access_token().await.unwrap(), "cached-token");
    }

    mod stub {
        use std::collections::HashMap;
        use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
        use std::sync::{Arc, Mutex};

        use axum::{
            extract::{Query, State},
            http::{header::AUTHORIZATION, HeaderMap, StatusCode},
            routing::{get, post},
            Form, Json, Router,
        };
        use serde_json::{json, Value};

        /// In-process stand-in for the Spotify accounts and search endpoints
        #[derive(Clone, Default)]
        pub struct StubSpotify {
            pub token_requests: Arc<AtomicUsize>,
            pub token_auth: Arc<Mutex<Vec<String>>>,
            pub token_forms: Arc<Mutex<Vec<HashMap<String, String>>>>,
            pub search_auth: Arc<Mutex<Vec<String>>>,
            pub search_params: Arc<Mutex<Vec<HashMap<String, String>>>>,
            pub reject_search: Arc<AtomicBool>,
        }

        fn authorization(headers: &HeaderMap) -> String {
            headers
                .get(AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .unwrap_or_default()
                .to_string()
        }

        async fn token(
            State(stub): State<StubSpotify>,
            headers: HeaderMap,
            Form(form): Form<HashMap<String, String>>,
        ) -> Json<Value> {
            let n = stub.token_requests.fetch_add(1, Ordering::SeqCst) + 1;
            stub.token_auth.lock().unwrap().push(authorization(&headers));
            stub.token_forms.lock().unwrap().push(form);

            Json(json!({
                "access_token": format!("token-{}", n),
                "token_type": "Bearer",
                "expires_in": 3600
            }))
        }

        async fn search(
            State(stub): State<StubSpotify>,
            headers: HeaderMap,
            Query(params): Query<HashMap<String, String>>,
        ) -> (StatusCode, Json<Value>) {
            stub.search_auth.lock().unwrap().push(authorization(&headers));
            stub.search_params.lock().unwrap().push(params);

            if stub.reject_search.load(Ordering::SeqCst) {
                return (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "error": { "status": 401, "message": "The access token expired" } })),
                );
            }

            (
                StatusCode::OK,
                Json(json!({
                    "tracks": {
                        "items": [
                            { "id": "track-b", "name": "Second by name" },
                            { "id": "track-a", "name": "First by name" },
                            { "id": "track-c", "name": "Third" }
                        ]
                    }
                })),
            )
        }

        /// Serves the stub on an ephemeral port and returns its base URL
        pub async fn spawn(stub: StubSpotify) -> String {
            let app = Router::new()
                .route("/api/token", post(token))
                .route("/v1/search", get(search))
                .with_state(stub);

            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });

            format!("http://{}", addr)
        }
    }

    fn provider_for(base_url: &str, cache: Option<Cache>) -> SpotifyProvider {
        SpotifyProvider::new(
            "client".to_string(),
            "secret".to_string(),
            format!("{}/v1", base_url),
            format!("{}/api/token", base_url),
            cache,
        )
    }

    fn ids(tracks: &[Track]) -> Vec<&str> {
        tracks.iter().filter_map(Track::stable_id).collect()
    }

    #[tokio::test]
    async fn test_search_reuses_token_and_sends_query() {
        use base64::{engine::general_purpose::STANDARD, Engine};
        use std::sync::atomic::Ordering;

        let stub = stub::StubSpotify::default();
        let base_url = stub::spawn(stub.clone()).await;
        let provider = provider_for(&base_url, None);

        let first = provider.search_tracks("happy upbeat", 5).await.unwrap();
        let second = provider.search_tracks("sad mellow", 5).await.unwrap();

        // Results keep the service's ranking order
        assert_eq!(ids(&first), vec!["track-b", "track-a", "track-c"]);
        assert_eq!(ids(&second), vec!["track-b", "track-a", "track-c"]);

        assert_eq!(stub.token_requests.load(Ordering::SeqCst), 1);
        let expected_basic = format!("Basic {}", STANDARD.encode("client:secret"));
        assert_eq!(*stub.token_auth.lock().unwrap(), vec![expected_basic]);
        let forms = stub.token_forms.lock().unwrap().clone();
        assert_eq!(forms[0].get("grant_type").map(String::as_str), Some("client_credentials"));

        let auth = stub.search_auth.lock().unwrap().clone();
        assert_eq!(auth, vec!["Bearer token-1", "Bearer token-1"]);

        let params = stub.search_params.lock().unwrap().clone();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].get("q").map(String::as_str), Some("happy upbeat"));
        assert_eq!(params[0].get("type").map(String::as_str), Some("track"));
        assert_eq!(params[0].get("limit").map(String::as_str), Some("5"));
        assert_eq!(params[1].get("q").map(String::as_str), Some("sad mellow"));
    }

    #[tokio::test]
    async fn test_search_limit_is_clamped() {
        let stub = stub::StubSpotify::default();
        let base_url = stub::spawn(stub.clone()).await;
        let provider = provider_for(&base_url, None);

        provider.search_tracks("chill music", 500).await.unwrap();

        let params = stub.search_params.lock().unwrap().clone();
        assert_eq!(params[0].get("limit").map(String::as_str), Some("50"));
    }

    #[tokio::test]
    async fn test_unauthorized_search_clears_token() {
        use std::sync::atomic::Ordering;

        let stub = stub::StubSpotify::default();
        let base_url = stub::spawn(stub.clone()).await;
        let provider = provider_for(&base_url, None);

        stub.reject_search.store(true, Ordering::SeqCst);
        let result = provider.search_tracks("angry intense", 5).await;
        assert!(matches!(result, Err(AppError::RecommendationService(_))));
        assert!(provider.token.read().await.is_none());

        stub.reject_search.store(false, Ordering::SeqCst);
        let tracks = provider.search_tracks("angry intense", 5).await.unwrap();
        assert_eq!(tracks.len(), 3);

        assert_eq!(stub.token_requests.load(Ordering::SeqCst), 2);
        let auth = stub.search_auth.lock().unwrap().clone();
        assert_eq!(auth.last().map(String::as_str), Some("Bearer token-2"));
    }

    #[tokio::test]
    async fn test_unreachable_cache_falls_through_to_search() {
        use crate::db::create_redis_client;

        let stub = stub::StubSpotify::default();
        let base_url = stub::spawn(stub.clone()).await;

        let (cache, handle) = Cache::new(create_redis_client("redis://127.0.0.1:1").unwrap());
        let provider = provider_for(&base_url, Some(cache));

        let tracks = provider.search_tracks("calm relaxing", 5).await.unwrap();
        assert_eq!(ids(&tracks), vec!["track-b", "track-a", "track-c"]);
        assert_eq!(stub.search_params.lock().unwrap().len(), 1);

        handle.shutdown().await;
    }
}
