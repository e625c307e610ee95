use super::{ApiError, ApiResult, ChatRequest, RagBackend, StatusReport, UploadReceipt};
use crate::upload::{DocumentKind, LocalFile};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Deserialize;
use std::time::Duration;

const ACTIVE_STATUS: &str = "active";
const OCTET_STREAM: &str = "application/octet-stream";

pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    answer: String,
}

/// Prefers the `detail` field of a JSON error body, then the raw body.
fn error_detail(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<ErrorBody>(trimmed) {
        Ok(parsed) => parsed.detail,
        Err(_) => Some(trimmed.to_string()),
    }
}

async fn read_success(response: Response) -> ApiResult<String> {
    let status = response.status();
    let body = response.text().await?;
    if status.is_success() {
        Ok(body)
    } else {
        Err(ApiError::Status {
            status: status.as_u16(),
            detail: error_detail(&body),
        })
    }
}

fn file_part(file: &LocalFile) -> ApiResult<Part> {
    let part = Part::bytes(file.bytes.clone())
        .file_name(file.name.clone())
        .mime_str(file.kind().map_or(OCTET_STREAM, DocumentKind::mime))?;
    Ok(part)
}

#[async_trait]
impl RagBackend for HttpBackend {
    async fn status(&self) -> ApiResult<StatusReport> {
        let response = self.client.get(self.endpoint("")).send().await?;
        let body = read_success(response).await?;
        let report: StatusReport = serde_json::from_str(&body)?;
        if report.status != ACTIVE_STATUS {
            return Err(ApiError::NotActive(report.status));
        }
        Ok(report)
    }

    async fn upload(&self, files: &[LocalFile]) -> ApiResult<UploadReceipt> {
        let mut form = Form::new();
        for file in files {
            form = form.part("files", file_part(file)?);
        }
        let response = self
            .client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await?;
        let body = read_success(response).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn chat(&self, request: &ChatRequest) -> ApiResult<String> {
        let response = self
            .client
            .post(self.endpoint("chat"))
            .json(request)
            .send()
            .await?;
        let body = read_success(response).await?;
        let parsed: ChatResponse = serde_json::from_str(&body)?;
        Ok(parsed.answer)
    }

    async fn clear(&self) -> ApiResult<()> {
        let response = self.client.post(self.endpoint("clear")).send().await?;
        read_success(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_detail_shapes() {
        assert_eq!(
            error_detail(r#"{"detail":"No valid documents"}"#),
            Some("No valid documents".to_string())
        );
        assert_eq!(error_detail(r#"{"other":1}"#), None);
        assert_eq!(
            error_detail("Internal Server Error"),
            Some("Internal Server Error".to_string())
        );
        assert_eq!(error_detail("   "), None);
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let backend = HttpBackend::new("http://localhost:8000/", Duration::from_secs(5)).unwrap();
        assert_eq!(backend.endpoint("chat"), "http://localhost:8000/chat");
        assert_eq!(backend.endpoint(""), "http://localhost:8000/");
    }
}
