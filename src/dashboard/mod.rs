//! Single-page interactive dashboard.
//!
//! Serves one connection at a time: the page itself, a health check, and
//! `POST /analyze`, which takes the raw image as the request body. A client that
//! does not deliver its request within the read timeout gets a 408. Uploads are
//! staged to a temporary file for the duration of one analysis and removed on
//! every exit path.

pub mod http;
pub mod view;

use std::future::Future;
use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;
use tempfile::NamedTempFile;
use tokio::net::{TcpListener, TcpStream};

use self::http::{HttpRequest, RequestError};
use self::view::AnalysisView;
use crate::DetectionClient;
use crate::config::DashboardSettings;

const PAGE: &str = include_str!("page.html");
const ACCEPTED_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", ".jpg"),
    ("image/jpg", ".jpg"),
    ("image/png", ".png"),
];

pub struct Dashboard {
    client: DetectionClient,
    settings: DashboardSettings,
}

impl Dashboard {
    pub fn new(client: DetectionClient, settings: DashboardSettings) -> Self {
        Self { client, settings }
    }

    pub async fn bind(&self) -> io::Result<TcpListener> {
        TcpListener::bind(self.settings.addr).await
    }

    /// Accepts connections until `shutdown` resolves.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    log::info!("dashboard shutting down");
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        log::debug!("connection from {peer}");
                        if let Err(err) = self.handle_connection(stream).await {
                            log::warn!("dashboard request from {peer} failed: {err}");
                        }
                    }
                    Err(err) => log::warn!("accept failed: {err}"),
                },
            }
        }
        Ok(())
    }

    async fn handle_connection(&self, mut stream: TcpStream) -> Result<()> {
        let read = tokio::time::timeout(
            self.settings.read_timeout,
            http::read_request(&mut stream, self.settings.max_upload_bytes),
        )
        .await;
        let Ok(read) = read else {
            log::debug!(
                "no complete request within {:?}; closing connection",
                self.settings.read_timeout
            );
            let view = AnalysisView::error("❌ Request timed out", None);
            return write_view(&mut stream, 408, &view).await;
        };
        let request = match read {
            Ok(request) => request,
            Err(RequestError::BodyTooLarge { length, limit }) => {
                let view = AnalysisView::error(
                    "❌ Upload too large",
                    Some(format!("{length} bytes exceeds the {limit} byte limit")),
                );
                return write_view(&mut stream, 413, &view).await;
            }
            Err(RequestError::Incomplete) => return Ok(()),
            Err(err) => {
                let view = AnalysisView::error("❌ Bad request", Some(err.to_string()));
                write_view(&mut stream, 400, &view).await?;
                return Err(err.into());
            }
        };

        log::info!("{} {}", request.method, request.path);
        match (request.method.as_str(), request.path.as_str()) {
            ("GET", "/") => {
                http::write_response(&mut stream, 200, "text/html; charset=utf-8", PAGE.as_bytes())
                    .await?;
            }
            ("GET", "/health") => {
                http::write_response(&mut stream, 200, "application/json", br#"{"status":"ok"}"#)
                    .await?;
            }
            ("POST", "/analyze") => {
                let (status, view) = self.analyze_upload(&request).await;
                write_view(&mut stream, status, &view).await?;
            }
            (_, "/" | "/health" | "/analyze") => {
                http::write_response(
                    &mut stream,
                    405,
                    "application/json",
                    br#"{"error":"method_not_allowed"}"#,
                )
                .await?;
            }
            _ => {
                http::write_response(&mut stream, 404, "application/json", br#"{"error":"not_found"}"#)
                    .await?;
            }
        }
        Ok(())
    }

    async fn analyze_upload(&self, request: &HttpRequest) -> (u16, AnalysisView) {
        if request.body.is_empty() {
            return (
                400,
                AnalysisView::error("👆 Upload an image to get started", None),
            );
        }

        let content_type = request.content_type().unwrap_or_default();
        let Some(&(_, suffix)) = ACCEPTED_TYPES
            .iter()
            .find(|(mime, _)| *mime == content_type)
        else {
            return (
                415,
                AnalysisView::error(
                    "❌ Unsupported file type",
                    Some(format!("expected jpg, jpeg or png, got '{content_type}'")),
                ),
            );
        };

        let staged = match stage_upload(self.settings.upload_dir.as_deref(), suffix, &request.body)
        {
            Ok(staged) => staged,
            Err(err) => {
                log::error!("failed to stage upload: {err}");
                return (
                    500,
                    AnalysisView::error("❌ Could not store upload", Some(err.to_string())),
                );
            }
        };
        log::debug!("staged upload at {}", staged.path().display());

        let result = self.client.analyze_image_path(staged.path()).await;

        if let Err(err) = staged.close() {
            log::warn!("failed to remove staged upload: {err}");
        }

        if let Err(err) = &result {
            log::warn!("analysis failed: {err}");
        }
        view::render(result)
    }
}

fn stage_upload(dir: Option<&Path>, suffix: &str, bytes: &[u8]) -> io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("agvision-upload-").suffix(suffix);
    let mut file = match dir {
        Some(dir) => builder.tempfile_in(dir)?,
        None => builder.tempfile()?,
    };
    file.write_all(bytes)?;
    file.flush()?;
    Ok(file)
}

async fn write_view(stream: &mut TcpStream, status: u16, view: &AnalysisView) -> Result<()> {
    let body = serde_json::to_vec(view)?;
    http::write_response(stream, status, "application/json", &body).await?;
    Ok(())
}
