//! RegistryClient: a hand-rolled OCI Distribution HTTP client.
//!
//! This is deliberately not built atop a higher-level OCI client crate: the chunked
//! upload handshake, token-auth negotiation, and relative/absolute redirect handling
//! are exactly the engineering this crate exists to get right, so they're implemented
//! against raw HTTP requests rather than hidden behind someone else's abstraction.

use bytes::Bytes;
use derive_more::Debug;
use reqwest::{header, StatusCode};
use serde::Deserialize;
use tap::TapFallible;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::digest::{digest_of, Digest};
use crate::error::{Error, Result};

/// A scoped OCI Distribution client for a single registry.
///
/// Authentication is attempted lazily on first request, per §4.D. A client is meant to
/// be owned by one operation ([`crate::ops::publish`], [`crate::ops::list`], or
/// [`crate::ops::pull`]) at a time; it holds no registry-wide mutable state beyond its
/// own cached bearer token.
#[derive(Debug)]
pub struct RegistryClient {
    registry_url: String,
    #[debug(skip)]
    client: reqwest::Client,
    username: Option<String>,
    #[debug(skip)]
    password: Option<String>,
    /// `None` until the first request; after that, `Some(None)` means no auth is
    /// required, `Some(Some(token))` means the token should be attached to requests.
    token: Mutex<Option<Option<String>>>,
}

#[bon::bon]
impl RegistryClient {
    #[builder]
    pub fn new(
        #[builder(into)] registry_url: String,
        username: Option<String>,
        password: Option<String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(2))
            .build()?;
        Ok(Self {
            registry_url: normalize_registry_url(&registry_url),
            client,
            username,
            password,
            token: Mutex::new(None),
        })
    }
}

impl RegistryClient {
    /// `GET /v2/{name}/tags/list`.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, name: &str) -> Result<Vec<String>> {
        #[derive(Deserialize)]
        struct TagsList {
            tags: Vec<String>,
        }

        let url = format!("{}/v2/{name}/tags/list", self.registry_url);
        let response = self.authed_request(reqwest::Method::GET, &url).await?.send().await?;
        let response = ensure_success(response, "list tags").await?;
        let body: TagsList = response.json().await?;
        Ok(body.tags)
    }

    /// `GET /v2/{name}/manifests/{reference}`, returning the raw body bytes.
    #[tracing::instrument(skip(self))]
    pub async fn pull_manifest_raw(&self, name: &str, reference: &str, accept: &str) -> Result<Bytes> {
        let url = format!("{}/v2/{name}/manifests/{reference}", self.registry_url);
        let response = self
            .authed_request(reqwest::Method::GET, &url)
            .await?
            .header(header::ACCEPT, accept)
            .send()
            .await
            .tap_err(|err| warn!(%err, "pull manifest request failed"))?;
        let response = ensure_success(response, "pull manifest").await?;
        Ok(response.bytes().await?)
    }

    /// `GET /v2/{name}/blobs/{digest}`.
    #[tracing::instrument(skip(self))]
    pub async fn pull_blob(&self, name: &str, digest: &Digest) -> Result<Bytes> {
        let url = format!("{}/v2/{name}/blobs/{digest}", self.registry_url);
        let response = self
            .authed_request(reqwest::Method::GET, &url)
            .await?
            .send()
            .await
            .tap_err(|err| warn!(%err, "pull blob request failed"))?;
        let response = ensure_success(response, "pull blob").await?;
        Ok(response.bytes().await?)
    }

    /// The chunked-upload handshake for blobs: `HEAD` existence check, `POST` to begin,
    /// `PUT` to complete. Idempotent: an existing blob short-circuits after the `HEAD`.
    #[tracing::instrument(skip(self, bytes), fields(size = bytes.len(), %digest))]
    pub async fn push_blob(&self, name: &str, bytes: &[u8], digest: &Digest) -> Result<()> {
        let blob_url = format!("{}/v2/{name}/blobs/{digest}", self.registry_url);
        let head = self.authed_request(reqwest::Method::HEAD, &blob_url).await?.send().await?;
        if head.status() == StatusCode::OK {
            debug!("blob already present, skipping upload");
            return Ok(());
        }

        let begin_url = format!("{}/v2/{name}/blobs/uploads/", self.registry_url);
        let begin = self
            .authed_request(reqwest::Method::POST, &begin_url)
            .await?
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .send()
            .await?;
        if begin.status() != StatusCode::ACCEPTED {
            return Err(Error::Transport(format!(
                "begin blob upload returned unexpected status {}",
                begin.status()
            )));
        }

        let location = begin
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| Error::Transport("upload response missing Location header".into()))?
            .to_string();

        // Relative locations stay on the registry host and keep our bearer token;
        // absolute locations may point at a different host (e.g. a signed blob store
        // URL) and must not carry our registry credentials.
        let (complete_url, authenticated) = if let Some(path) = location.strip_prefix('/') {
            (format!("{}/{path}", self.registry_url), true)
        } else {
            (location, false)
        };
        let complete_url = format!(
            "{complete_url}{}digest={digest}",
            if complete_url.contains('?') { "&" } else { "?" }
        );

        let request = if authenticated {
            self.authed_request(reqwest::Method::PUT, &complete_url).await?
        } else {
            self.client.put(&complete_url)
        };
        let complete = request
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .body(Bytes::copy_from_slice(bytes))
            .send()
            .await?;

        if complete.status() == StatusCode::NOT_FOUND {
            let body = complete.text().await.unwrap_or_default();
            warn!(body, "blob upload completion returned 404");
            return Err(Error::Transport("blob upload completion returned 404".into()));
        }
        ensure_success(complete, "complete blob upload").await?;
        Ok(())
    }

    /// `PUT /v2/{name}/manifests/{reference}`. When `reference` is `None`, the manifest
    /// is addressed by its own digest and the push is short-circuited by a `HEAD`.
    #[tracing::instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn push_manifest(
        &self,
        name: &str,
        bytes: &[u8],
        media_type: &str,
        reference: Option<&str>,
    ) -> Result<()> {
        let reference = match reference {
            Some(reference) => reference.to_string(),
            None => {
                let digest = digest_of(bytes);
                let head_url = format!("{}/v2/{name}/manifests/{digest}", self.registry_url);
                let head = self.authed_request(reqwest::Method::HEAD, &head_url).await?.send().await?;
                if head.status() == StatusCode::OK {
                    debug!(%digest, "manifest already present, skipping push");
                    return Ok(());
                }
                digest.to_string()
            }
        };

        let url = format!("{}/v2/{name}/manifests/{reference}", self.registry_url);
        let response = self
            .authed_request(reqwest::Method::PUT, &url)
            .await?
            .header(header::CONTENT_TYPE, media_type)
            .body(Bytes::copy_from_slice(bytes))
            .send()
            .await?;
        ensure_success(response, "push manifest").await?;
        Ok(())
    }

    /// Builds a request, ensuring the session is authenticated and attaching the
    /// bearer token if one was obtained.
    async fn authed_request(&self, method: reqwest::Method, url: &str) -> Result<reqwest::RequestBuilder> {
        self.ensure_session().await?;
        let guard = self.token.lock().await;
        let mut request = self.client.request(method, url);
        if let Some(Some(token)) = guard.as_ref() {
            request = request.bearer_auth(token);
        }
        Ok(request)
    }

    /// Performs the OCI token-auth handshake against `GET /v2/`, caching the result.
    #[tracing::instrument(skip(self))]
    async fn ensure_session(&self) -> Result<()> {
        let mut guard = self.token.lock().await;
        if guard.is_some() {
            return Ok(());
        }

        let url = format!("{}/v2/", self.registry_url);
        let response = self.client.get(&url).send().await?;
        match response.status() {
            StatusCode::OK => {
                *guard = Some(None);
                Ok(())
            }
            StatusCode::UNAUTHORIZED => {
                let challenge = response
                    .headers()
                    .get(header::WWW_AUTHENTICATE)
                    .and_then(|value| value.to_str().ok())
                    .ok_or(Error::Authentication)?
                    .to_string();
                let challenge = BearerChallenge::parse(&challenge)?;

                let (username, password) = match (&self.username, &self.password) {
                    (Some(username), Some(password)) => (username.clone(), password.clone()),
                    _ => return Err(Error::Authentication),
                };

                let mut request = self
                    .client
                    .get(&challenge.realm)
                    .basic_auth(&username, Some(&password))
                    .query(&[("grant_type", "password"), ("service", &challenge.service), ("client_id", &username)]);
                if let Some(scope) = &challenge.scope {
                    request = request.query(&[("scope", scope)]);
                }

                let token_response = request.send().await?;
                if !token_response.status().is_success() {
                    return Err(Error::Authentication);
                }

                #[derive(Deserialize)]
                struct TokenResponse {
                    #[serde(alias = "access_token")]
                    token: String,
                }
                let body: TokenResponse = token_response.json().await?;
                *guard = Some(Some(body.token));
                Ok(())
            }
            other => Err(Error::Transport(format!("unexpected status from GET /v2/: {other}"))),
        }
    }
}

/// A parsed `WWW-Authenticate: Bearer realm="...",service="...",scope="..."` challenge.
struct BearerChallenge {
    realm: String,
    service: String,
    scope: Option<String>,
}

impl BearerChallenge {
    fn parse(header: &str) -> Result<Self> {
        let rest = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| Error::Transport(format!("unsupported auth challenge: {header}")))?;

        let mut realm = None;
        let mut service = None;
        let mut scope = None;
        for part in rest.split(',') {
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };
            let value = value.trim().trim_matches('"').to_string();
            match key.trim() {
                "realm" => realm = Some(value),
                "service" => service = Some(value),
                "scope" => scope = Some(value),
                _ => {}
            }
        }

        Ok(Self {
            realm: realm.ok_or_else(|| Error::Transport("auth challenge missing realm".into()))?,
            service: service.unwrap_or_default(),
            scope,
        })
    }
}

/// Rejects non-2xx responses, folding them into [`Error::Transport`].
async fn ensure_success(response: reqwest::Response, context: &str) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(Error::Transport(format!("{context} failed with status {status}: {body}")))
}

/// Defaults a scheme-less registry URL to `https`, and rewrites `docker.io` to the
/// host Docker Hub's registry actually serves from.
pub fn normalize_registry_url(raw: &str) -> String {
    let with_scheme = if raw.contains("://") { raw.to_string() } else { format!("https://{raw}") };
    match reqwest::Url::parse(&with_scheme) {
        Ok(mut url) => {
            if url.host_str() == Some("docker.io") {
                let _ = url.set_host(Some("registry-1.docker.io"));
            }
            url.as_str().trim_end_matches('/').to_string()
        }
        Err(_) => with_scheme.trim_end_matches('/').to_string(),
    }
}
