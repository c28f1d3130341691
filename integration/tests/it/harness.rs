//! A fake OCI Distribution registry backed by an in-memory store, exposed over real
//! HTTP via `wiremock`. Driving the actual `pyoci` binary against this (rather than
//! calling `pyoci-core` in-process) exercises the full chunked-upload handshake,
//! manifest/index push-pull cycle, and tag listing exactly as a real registry would.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use wiremock::matchers::path_regex;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

#[derive(Default)]
struct State {
    blobs: HashMap<String, Vec<u8>>,
    manifests: HashMap<(String, String), (Vec<u8>, String)>,
    tags: HashMap<String, Vec<String>>,
}

enum Route<'a> {
    Base,
    TagsList { name: &'a str },
    BeginUpload { name: &'a str },
    CompleteUpload { name: &'a str, upload_id: &'a str },
    Blob { name: &'a str, digest: &'a str },
    Manifest { name: &'a str, reference: &'a str },
}

fn route(path: &str) -> Option<Route<'_>> {
    if path == "/v2/" {
        return Some(Route::Base);
    }
    let rest = path.strip_prefix("/v2/")?;
    if let Some(name) = rest.strip_suffix("/tags/list") {
        return Some(Route::TagsList { name });
    }
    if let Some(name) = rest.strip_suffix("/blobs/uploads/") {
        return Some(Route::BeginUpload { name });
    }
    if let Some(idx) = rest.find("/blobs/uploads/") {
        let (name, tail) = rest.split_at(idx);
        let upload_id = &tail["/blobs/uploads/".len()..];
        return Some(Route::CompleteUpload { name, upload_id });
    }
    if let Some(idx) = rest.find("/manifests/") {
        let (name, tail) = rest.split_at(idx);
        let reference = &tail["/manifests/".len()..];
        return Some(Route::Manifest { name, reference });
    }
    if let Some(idx) = rest.find("/blobs/") {
        let (name, tail) = rest.split_at(idx);
        let digest = &tail["/blobs/".len()..];
        return Some(Route::Blob { name, digest });
    }
    None
}

/// Implements just enough of the OCI Distribution API (§6 of the design) to round-trip
/// a publish/list/pull cycle: tag listing, blob existence/upload, and manifest/index
/// push-pull by tag or by digest.
struct FakeRegistry {
    state: Mutex<State>,
    upload_seq: AtomicU64,
}

impl FakeRegistry {
    fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            upload_seq: AtomicU64::new(0),
        }
    }
}

impl Respond for FakeRegistry {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let method = request.method.as_str();
        let path = request.url.path();

        let Some(route) = route(path) else {
            return ResponseTemplate::new(404);
        };

        match route {
            Route::Base => ResponseTemplate::new(200),
            Route::TagsList { name } => {
                let state = self.state.lock().expect("lock poisoned");
                let tags = state.tags.get(name).cloned().unwrap_or_default();
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "tags": tags }))
            }
            Route::BeginUpload { name } => {
                let id = self.upload_seq.fetch_add(1, Ordering::SeqCst);
                ResponseTemplate::new(202).insert_header("Location", format!("/v2/{name}/blobs/uploads/{id}"))
            }
            Route::CompleteUpload { name, upload_id: _ } => {
                let Some(digest) =
                    request.url.query_pairs().find(|(k, _)| k.as_ref() == "digest").map(|(_, v)| v.to_string())
                else {
                    return ResponseTemplate::new(400);
                };
                let mut state = self.state.lock().expect("lock poisoned");
                state.blobs.insert(format!("{name}:{digest}"), request.body.clone());
                ResponseTemplate::new(201)
            }
            Route::Blob { name, digest } => {
                let state = self.state.lock().expect("lock poisoned");
                match state.blobs.get(&format!("{name}:{digest}")) {
                    Some(_) if method == "HEAD" => ResponseTemplate::new(200),
                    Some(bytes) => ResponseTemplate::new(200).set_body_bytes(bytes.clone()),
                    None => ResponseTemplate::new(404),
                }
            }
            Route::Manifest { name, reference } => {
                let mut state = self.state.lock().expect("lock poisoned");
                match method {
                    "PUT" => {
                        let media_type = request
                            .headers
                            .get("content-type")
                            .and_then(|value| value.to_str().ok())
                            .unwrap_or_default()
                            .to_string();
                        state
                            .manifests
                            .insert((name.to_string(), reference.to_string()), (request.body.clone(), media_type));
                        if !reference.starts_with("sha256:") {
                            let tags = state.tags.entry(name.to_string()).or_default();
                            if !tags.contains(&reference.to_string()) {
                                tags.push(reference.to_string());
                            }
                        }
                        ResponseTemplate::new(201)
                    }
                    "HEAD" => match state.manifests.get(&(name.to_string(), reference.to_string())) {
                        Some(_) => ResponseTemplate::new(200),
                        None => ResponseTemplate::new(404),
                    },
                    _ => match state.manifests.get(&(name.to_string(), reference.to_string())) {
                        Some((bytes, media_type)) => {
                            ResponseTemplate::new(200).set_body_bytes(bytes.clone()).insert_header(
                                "Content-Type",
                                if media_type.is_empty() { "application/json" } else { media_type.as_str() },
                            )
                        }
                        None => ResponseTemplate::new(404),
                    },
                }
            }
        }
    }
}

/// Starts a fake OCI registry listening on a local port, returning its base URL.
pub async fn start() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(path_regex(r"^/v2"))
        .respond_with(FakeRegistry::new())
        .mount(&server)
        .await;
    server
}
