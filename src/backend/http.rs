//! HTTP client for the bxt server using reqwest

use crate::auth::{LoginRequest, Session, TokenResponse};
use crate::backend::{BackendService, CommitResponse, SnapRequest, UploadProgress};
use crate::error::{Error, Result};
use crate::submit::{PayloadPart, SubmissionPayload};
use crate::types::SectionAddress;
use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, stream};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};
use url::Url;

/// Size of the chunks a file is streamed in
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// bxt server client
pub struct HttpBackend {
    client: Client,
    base_url: Url,
    timeout: Duration,
    session: Mutex<Option<Session>>,
}

impl HttpBackend {
    /// Create a client for the server at `base_url`
    ///
    /// `timeout` applies to metadata calls only; commit uploads may take
    /// arbitrarily long.
    pub fn new(base_url: Url, session: Option<Session>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().connect_timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url,
            timeout,
            session: Mutex::new(session),
        })
    }

    /// Current session, including tokens renewed by [`BackendService::refresh_auth`]
    pub fn session(&self) -> Option<Session> {
        self.lock_session().clone()
    }

    /// Log in and keep the returned session
    pub async fn login(&self, name: &str, password: &str) -> Result<Session> {
        let request = LoginRequest {
            name,
            password,
            response_type: "bearer",
        };

        let tokens: TokenResponse = check(
            self.client
                .post(self.api_url("api/auth")?)
                .timeout(self.timeout)
                .json(&request)
                .send()
                .await?,
        )
        .await?
        .json()
        .await?;

        let session = Session::from_tokens(name, tokens);
        *self.lock_session() = Some(session.clone());
        info!("Logged in as {name}");
        Ok(session)
    }

    /// Revoke the session on the server
    pub async fn logout(&self) -> Result<()> {
        let request = self.authorized(self.client.post(self.api_url("api/auth/revoke")?))?;
        check(request.send().await?).await?;
        *self.lock_session() = None;
        Ok(())
    }

    fn api_url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn lock_session(&self) -> std::sync::MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let guard = self.lock_session();
        let session = guard.as_ref().ok_or(Error::NotLoggedIn)?;
        Ok(request.bearer_auth(&session.access_token))
    }

    async fn build_form(&self, payload: &SubmissionPayload, progress: UploadProgress) -> Result<Form> {
        let mut total = 0;
        for artifact in payload.artifacts() {
            total += tokio::fs::metadata(artifact.path()).await?.len();
        }

        let sent = Arc::new(AtomicU64::new(0));
        let mut form = Form::new();

        for part in &payload.parts {
            match part {
                PayloadPart::File { field, artifact } => {
                    let len = tokio::fs::metadata(artifact.path()).await?.len();
                    let body = Body::wrap_stream(progress_stream(
                        artifact.path().to_path_buf(),
                        Arc::clone(&sent),
                        total,
                        Arc::clone(&progress),
                    ));
                    let file_part = Part::stream_with_length(body, len)
                        .file_name(artifact.file_name())
                        .mime_str("application/octet-stream")?;
                    form = form.part(field.clone(), file_part);
                }
                PayloadPart::Text { field, value } => {
                    form = form.text(field.clone(), value.clone());
                }
            }
        }

        debug!("Commit body holds {total} bytes of package data");
        Ok(form)
    }
}

/// Read `path` in chunks as the body is polled, reporting cumulative progress
///
/// The file is opened on first poll, so only the part being sent holds a handle.
fn progress_stream(
    path: PathBuf,
    sent: Arc<AtomicU64>,
    total: u64,
    progress: UploadProgress,
) -> impl Stream<Item = std::io::Result<Bytes>> + Send + 'static {
    stream::try_unfold(None, move |file: Option<File>| {
        let path = path.clone();
        let sent = Arc::clone(&sent);
        let progress = Arc::clone(&progress);
        async move {
            let mut file = match file {
                Some(file) => file,
                None => File::open(&path).await?,
            };
            let mut buf = vec![0u8; UPLOAD_CHUNK_SIZE];
            let read = file.read(&mut buf).await?;
            if read == 0 {
                return Ok(None);
            }
            buf.truncate(read);

            let len = read as u64;
            let now = sent.fetch_add(len, Ordering::Relaxed) + len;
            progress(now, total);
            Ok::<_, std::io::Error>(Some((Bytes::from(buf), Some(file))))
        }
    })
}

/// Map error statuses to [`Error`], keeping 401 distinct
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(Error::Unauthorized);
    }
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .unwrap_or(text);
    Err(Error::Backend(format!("{status}: {detail}")))
}

#[async_trait]
impl BackendService for HttpBackend {
    async fn list_sections(&self) -> Result<Vec<SectionAddress>> {
        let request = self.authorized(
            self.client
                .get(self.api_url("api/sections")?)
                .timeout(self.timeout),
        )?;

        Ok(check(request.send().await?).await?.json().await?)
    }

    async fn refresh_auth(&self) -> Result<()> {
        let credential = {
            let guard = self.lock_session();
            let session = guard.as_ref().ok_or(Error::NotLoggedIn)?;
            session.refresh_credential().to_string()
        };

        let response = check(
            self.client
                .get(self.api_url("api/auth/refresh")?)
                .timeout(self.timeout)
                .bearer_auth(credential)
                .send()
                .await?,
        )
        .await?;

        // Cookie-mode servers answer with an empty body
        let text = response.text().await?;
        if let Ok(tokens) = serde_json::from_str::<TokenResponse>(&text) {
            if let Some(session) = self.lock_session().as_mut() {
                session.renew(tokens);
            }
            debug!("Session tokens renewed");
        }
        Ok(())
    }

    async fn commit(
        &self,
        payload: &SubmissionPayload,
        progress: UploadProgress,
    ) -> Result<CommitResponse> {
        let form = self.build_form(payload, progress).await?;
        let request = self.authorized(
            self.client
                .post(self.api_url("api/packages/commit")?)
                .multipart(form),
        )?;

        Ok(check(request.send().await?).await?.json().await?)
    }

    async fn sync(&self) -> Result<()> {
        let request = self.authorized(
            self.client
                .post(self.api_url("api/packages/sync")?)
                .timeout(self.timeout),
        )?;
        check(request.send().await?).await?;
        Ok(())
    }

    async fn snap(&self, snap: &SnapRequest) -> Result<()> {
        let request = self.authorized(
            self.client
                .post(self.api_url("api/packages/snap/branch")?)
                .timeout(self.timeout)
                .json(snap),
        )?;
        check(request.send().await?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tokio_test::block_on;

    #[test]
    fn test_progress_stream_reads_file_in_chunks() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("foo-1.0.pkg");
        let size = UPLOAD_CHUNK_SIZE * 2 + 10;
        std::fs::write(&path, vec![7u8; size]).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let progress: UploadProgress = Arc::new(move |sent, total| {
            sink.lock().unwrap().push((sent, total));
        });

        let total = size as u64;
        let chunks: Vec<_> = block_on(
            progress_stream(path, Arc::new(AtomicU64::new(0)), total, progress).collect::<Vec<_>>(),
        );

        assert!(chunks.len() >= 3);
        let streamed: usize = chunks.iter().map(|c| c.as_ref().unwrap().len()).sum();
        assert_eq!(streamed, size);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.last(), Some(&(total, total)));
        assert!(seen.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn test_progress_stream_counts_across_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let first = dir.path().join("a.pkg");
        let second = dir.path().join("a.pkg.sig");
        std::fs::write(&first, vec![1u8; 100]).unwrap();
        std::fs::write(&second, vec![2u8; 28]).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let progress: UploadProgress = Arc::new(move |sent, total| {
            sink.lock().unwrap().push((sent, total));
        });
        let sent = Arc::new(AtomicU64::new(0));

        block_on(async {
            for path in [first, second] {
                progress_stream(path, Arc::clone(&sent), 128, Arc::clone(&progress))
                    .collect::<Vec<_>>()
                    .await;
            }
        });

        assert_eq!(*seen.lock().unwrap(), vec![(100, 128), (128, 128)]);
    }
}
