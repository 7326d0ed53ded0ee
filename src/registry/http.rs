//! registry::http
//!
//! Registry implementation over HTTP using `reqwest`.
//!
//! # Authentication
//!
//! Requests are first sent with whatever authorization was learned so far
//! (nothing, at the start). A `401` carrying a `WWW-Authenticate`
//! challenge is answered once and the request re-sent:
//!
//! - `Bearer realm=...,service=...,scope=...`: a token is fetched from the
//!   realm, with Basic credentials when available, and cached for later
//!   requests until another challenge replaces it
//! - `Basic`: the configured credentials are attached from then on
//!
//! A second `401` is reported as an error; there are no other retries.
//!
//! # Pagination
//!
//! `/v2/_catalog` and `/v2/<name>/tags/list` follow `Link: <...>; rel="next"`
//! headers until the registry stops sending them.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, LINK, WWW_AUTHENTICATE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::Mutex;

use super::manifest::ImageManifest;
use super::traits::{RawManifest, Registry, RegistryError};
use super::{DIGEST_HEADER, MEDIA_TYPE_MANIFEST_V2};
use crate::core::types::{Digest, ManifestSchema};
use crate::credentials::Credentials;

/// Authorization learned from previous challenges.
#[derive(Clone, PartialEq, Eq)]
enum AuthState {
    Anonymous,
    Basic,
    Bearer(String),
}

/// A parsed `WWW-Authenticate` challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Challenge {
    /// `Basic realm="..."`
    Basic,
    /// `Bearer realm="...",service="...",scope="..."`
    Bearer {
        realm: String,
        service: Option<String>,
        scope: Option<String>,
    },
}

/// Registry error body: `{"errors": [{"code": ..., "message": ...}]}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct CatalogPage {
    #[serde(default)]
    repositories: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct TagsPage {
    #[serde(default)]
    tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
}

/// Docker Registry v2 client over HTTP.
pub struct HttpRegistry {
    /// HTTP client for making requests
    client: Client,
    /// Base URL without trailing slash
    url: String,
    /// Credentials offered to Basic challenges and token endpoints
    credentials: Option<Credentials>,
    /// Authorization attached to each request
    auth: Mutex<AuthState>,
}

// Custom Debug to avoid exposing credentials and tokens
impl std::fmt::Debug for HttpRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRegistry")
            .field("url", &self.url)
            .field("has_credentials", &self.credentials.is_some())
            .finish()
    }
}

impl HttpRegistry {
    /// Create a client for the registry at `url` (e.g. `https://host:5000`).
    ///
    /// # Errors
    ///
    /// Returns `NetworkError` if the HTTP client cannot be initialized.
    pub fn new(
        url: impl Into<String>,
        credentials: Option<Credentials>,
        user_agent: &str,
    ) -> Result<Self, RegistryError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| RegistryError::NetworkError(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into().trim_end_matches('/').to_string(),
            credentials,
            auth: Mutex::new(AuthState::Anonymous),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/v2/{}", self.url, path)
    }

    /// Turn a `Link` target into an absolute URL.
    fn resolve_link(&self, target: &str) -> String {
        if target.starts_with("http://") || target.starts_with("https://") {
            target.to_string()
        } else if target.starts_with('/') {
            format!("{}{}", self.url, target)
        } else {
            format!("{}/{}", self.url, target)
        }
    }

    async fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &*self.auth.lock().await {
            AuthState::Anonymous => request,
            AuthState::Basic => match &self.credentials {
                Some(creds) => request.basic_auth(&creds.username, Some(&creds.password)),
                None => request,
            },
            AuthState::Bearer(token) => request.bearer_auth(token),
        }
    }

    /// Send a request, answering one auth challenge if the registry asks.
    async fn send<F>(&self, build: F) -> Result<Response, RegistryError>
    where
        F: Fn() -> RequestBuilder,
    {
        let response = self
            .authorize(build())
            .await
            .send()
            .await
            .map_err(|e| RegistryError::NetworkError(e.to_string()))?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let challenge = response
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_challenge);

        let Some(challenge) = challenge else {
            return Ok(response);
        };
        if !self.answer_challenge(challenge).await? {
            return Ok(response);
        }

        tracing::debug!("re-sending request after auth challenge");
        self.authorize(build())
            .await
            .send()
            .await
            .map_err(|e| RegistryError::NetworkError(e.to_string()))
    }

    /// Update the auth state for a challenge.
    ///
    /// Returns false when there is nothing new to try.
    async fn answer_challenge(&self, challenge: Challenge) -> Result<bool, RegistryError> {
        match challenge {
            Challenge::Bearer {
                realm,
                service,
                scope,
            } => {
                tracing::debug!(realm = %realm, service = ?service, scope = ?scope, "fetching bearer token");
                let token = self
                    .fetch_token(&realm, service.as_deref(), scope.as_deref())
                    .await?;
                *self.auth.lock().await = AuthState::Bearer(token);
                Ok(true)
            }
            Challenge::Basic => {
                if self.credentials.is_none() {
                    return Err(RegistryError::AuthRequired);
                }
                let mut auth = self.auth.lock().await;
                if *auth == AuthState::Basic {
                    return Ok(false);
                }
                *auth = AuthState::Basic;
                Ok(true)
            }
        }
    }

    async fn fetch_token(
        &self,
        realm: &str,
        service: Option<&str>,
        scope: Option<&str>,
    ) -> Result<String, RegistryError> {
        let mut query = Vec::new();
        if let Some(service) = service {
            query.push(("service", service));
        }
        if let Some(scope) = scope {
            query.push(("scope", scope));
        }

        let mut request = self.client.get(realm).query(&query);
        if let Some(creds) = &self.credentials {
            request = request.basic_auth(&creds.username, Some(&creds.password));
        }

        let response = request
            .send()
            .await
            .map_err(|e| RegistryError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::AuthFailed(format!(
                "token endpoint returned {}",
                status
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| RegistryError::InvalidResponse(format!("bad token response: {}", e)))?;

        body.token
            .or(body.access_token)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| RegistryError::InvalidResponse("token response has no token".into()))
    }

    /// Handle a response, parsing the JSON body on success.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: Response,
    ) -> Result<T, RegistryError> {
        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| {
                RegistryError::InvalidResponse(format!("failed to parse response: {}", e))
            })
        } else {
            self.handle_error_response(response, status).await
        }
    }

    /// Handle an error response from the registry.
    async fn handle_error_response<T>(
        &self,
        response: Response,
        status: StatusCode,
    ) -> Result<T, RegistryError> {
        let text = response.text().await.unwrap_or_default();
        let message = error_message(&text)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());

        Err(match status {
            StatusCode::UNAUTHORIZED if self.credentials.is_none() => RegistryError::AuthRequired,
            StatusCode::UNAUTHORIZED => RegistryError::AuthFailed(message),
            StatusCode::FORBIDDEN => RegistryError::AuthFailed(format!("permission denied: {}", message)),
            StatusCode::NOT_FOUND => RegistryError::NotFound(message),
            _ => RegistryError::ApiError {
                status: status.as_u16(),
                message,
            },
        })
    }

    /// Collect a paginated list endpoint.
    async fn paginate<T, F>(&self, path: &str, mut collect: F) -> Result<(), RegistryError>
    where
        T: DeserializeOwned,
        F: FnMut(T) + Send,
    {
        let mut url = self.endpoint(path);
        let mut visited = HashSet::new();
        loop {
            tracing::debug!(url = %url, "registry.list");
            visited.insert(url.clone());
            let response = self.send(|| self.client.get(&url)).await?;
            let next = response
                .headers()
                .get_all(LINK)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .find_map(parse_next_link)
                .map(|target| self.resolve_link(&target));

            let page: T = self.handle_response(response).await?;
            collect(page);

            match next {
                Some(next) if visited.contains(&next) => {
                    tracing::warn!(url = %next, "pagination link points to a visited page");
                    return Ok(());
                }
                Some(next) => url = next,
                None => return Ok(()),
            }
        }
    }
}

#[async_trait]
impl Registry for HttpRegistry {
    fn url(&self) -> &str {
        &self.url
    }

    async fn ping(&self) -> Result<(), RegistryError> {
        let url = self.endpoint("");
        tracing::debug!(url = %url, "registry.ping");

        let response = self.send(|| self.client.get(&url)).await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            self.handle_error_response(response, status).await
        }
    }

    async fn repositories(&self) -> Result<Vec<String>, RegistryError> {
        let mut repositories = Vec::new();
        self.paginate("_catalog", |page: CatalogPage| {
            repositories.extend(page.repositories.unwrap_or_default());
        })
        .await?;
        Ok(repositories)
    }

    async fn tags(&self, name: &str) -> Result<Vec<String>, RegistryError> {
        let mut tags = Vec::new();
        self.paginate(&format!("{}/tags/list", name), |page: TagsPage| {
            tags.extend(page.tags.unwrap_or_default());
        })
        .await?;
        Ok(tags)
    }

    async fn manifest(
        &self,
        name: &str,
        reference: &str,
        schema: ManifestSchema,
    ) -> Result<RawManifest, RegistryError> {
        let url = self.endpoint(&format!("{}/manifests/{}", name, reference));
        tracing::debug!(url = %url, accept = schema.media_type(), "registry.manifest.get");

        let response = self
            .send(|| self.client.get(&url).header(ACCEPT, schema.media_type()))
            .await?;

        let status = response.status();
        if !status.is_success() {
            return self.handle_error_response(response, status).await;
        }

        let header = |key: &str| {
            response
                .headers()
                .get(key)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let digest = header(DIGEST_HEADER);
        let media_type = header(CONTENT_TYPE.as_str());

        let body = response
            .bytes()
            .await
            .map_err(|e| RegistryError::NetworkError(e.to_string()))?;

        Ok(RawManifest {
            digest,
            media_type,
            body: body.to_vec(),
        })
    }

    async fn manifest_digest(&self, name: &str, reference: &str) -> Result<Digest, RegistryError> {
        let url = self.endpoint(&format!("{}/manifests/{}", name, reference));
        tracing::debug!(url = %url, "registry.manifest.head");

        let response = self
            .send(|| self.client.head(&url).header(ACCEPT, MEDIA_TYPE_MANIFEST_V2))
            .await?;

        let status = response.status();
        if !status.is_success() {
            return self.handle_error_response(response, status).await;
        }

        let value = response
            .headers()
            .get(DIGEST_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                RegistryError::InvalidResponse(format!("response has no {} header", DIGEST_HEADER))
            })?;

        Digest::new(value.trim())
            .map_err(|e| RegistryError::InvalidResponse(format!("bad {} header: {}", DIGEST_HEADER, e)))
    }

    async fn put_manifest(
        &self,
        name: &str,
        reference: &str,
        manifest: &ImageManifest,
    ) -> Result<Option<Digest>, RegistryError> {
        let url = self.endpoint(&format!("{}/manifests/{}", name, reference));
        let body = manifest.to_vec()?;
        tracing::debug!(url = %url, size = body.len(), "registry.manifest.put");

        let response = self
            .send(|| {
                self.client
                    .put(&url)
                    .header(CONTENT_TYPE, manifest.content_type())
                    .body(body.clone())
            })
            .await?;

        let status = response.status();
        if !status.is_success() {
            return self.handle_error_response(response, status).await;
        }

        Ok(response
            .headers()
            .get(DIGEST_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Digest::new(v.trim()).ok()))
    }

    async fn delete_manifest(&self, name: &str, digest: &Digest) -> Result<(), RegistryError> {
        let url = self.endpoint(&format!("{}/manifests/{}", name, digest));
        tracing::debug!(url = %url, "registry.manifest.delete");

        let response = self.send(|| self.client.delete(&url)).await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            self.handle_error_response(response, status).await
        }
    }

    async fn blob(&self, name: &str, digest: &Digest) -> Result<Vec<u8>, RegistryError> {
        let url = self.endpoint(&format!("{}/blobs/{}", name, digest));
        tracing::debug!(url = %url, "registry.blob.get");

        let response = self.send(|| self.client.get(&url)).await?;
        let status = response.status();
        if !status.is_success() {
            return self.handle_error_response(response, status).await;
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| RegistryError::NetworkError(e.to_string()))?;
        Ok(body.to_vec())
    }
}

/// Parse a `WWW-Authenticate` header value.
///
/// Returns `None` for schemes other than Basic and Bearer, and for Bearer
/// challenges without a realm.
pub fn parse_challenge(header: &str) -> Option<Challenge> {
    let header = header.trim();
    let (scheme, rest) = header.split_once(' ').unwrap_or((header, ""));

    if scheme.eq_ignore_ascii_case("basic") {
        return Some(Challenge::Basic);
    }
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let mut params = parse_auth_params(rest);
    Some(Challenge::Bearer {
        realm: params.remove("realm")?,
        service: params.remove("service"),
        scope: params.remove("scope"),
    })
}

/// Parse `key="value", key=value` auth parameters.
///
/// Quoted values may contain commas (scopes like `repository:a:pull,push`).
fn parse_auth_params(input: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    let mut chars = input.chars().peekable();

    loop {
        while chars.next_if(|c| *c == ',' || c.is_whitespace()).is_some() {}
        if chars.peek().is_none() {
            break;
        }

        let key: String = std::iter::from_fn(|| chars.next_if(|c| *c != '=' && *c != ',')).collect();
        if chars.next_if_eq(&'=').is_none() {
            continue;
        }

        let value = if chars.next_if_eq(&'"').is_some() {
            let mut value = String::new();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            value.push(escaped);
                        }
                    }
                    '"' => break,
                    _ => value.push(c),
                }
            }
            value
        } else {
            let raw: String = std::iter::from_fn(|| chars.next_if(|c| *c != ',')).collect();
            raw.trim().to_string()
        };

        params.insert(key.trim().to_ascii_lowercase(), value);
    }

    params
}

/// Extract the `rel="next"` target from a `Link` header value.
pub fn parse_next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|link| {
        let (target, params) = link.split_once(';')?;
        let is_next = params.split(';').any(|p| {
            let p = p.trim();
            p == "rel=\"next\"" || p == "rel=next"
        });
        if !is_next {
            return None;
        }
        let target = target.trim().strip_prefix('<')?.strip_suffix('>')?;
        Some(target.to_string())
    })
}

/// Join the entries of a registry error body into one message.
fn error_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    let parts: Vec<String> = parsed
        .errors
        .iter()
        .map(|e| match (e.code.is_empty(), e.message.is_empty()) {
            (false, false) => format!("{}: {}", e.code, e.message),
            (false, true) => e.code.clone(),
            _ => e.message.clone(),
        })
        .filter(|m| !m.is_empty())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("; "))
    }
}
