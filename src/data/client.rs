//! Report Fetch API client
//!
//! [`ReportApi`] is the seam the loader depends on; [`HttpReportApi`] is the
//! reqwest implementation used in production.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use super::InterviewStage;
use crate::config::ApiConfig;

/// A Report Fetch API endpoint, used to label requests and errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    JobPost,
    DocumentReport,
    WrittenReport,
    Interview(InterviewStage),
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::JobPost => f.write_str("job post"),
            Endpoint::DocumentReport => f.write_str("document report"),
            Endpoint::WrittenReport => f.write_str("written-test report"),
            Endpoint::Interview(stage) => write!(f, "{} interview evaluations", stage.as_str()),
        }
    }
}

/// Errors that can occur when calling the Report Fetch API
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request did not complete within its timeout
    #[error("{endpoint} request timed out")]
    Timeout { endpoint: Endpoint },

    /// The server answered 404
    #[error("{endpoint} not found")]
    NotFound { endpoint: Endpoint },

    /// The server answered with a 5xx status
    #[error("{endpoint} failed with server error {status}")]
    Server { endpoint: Endpoint, status: u16 },

    /// Any other non-success status
    #[error("{endpoint} failed with status {status}")]
    Status { endpoint: Endpoint, status: u16 },

    /// The request could not be sent or the connection failed
    #[error("{endpoint} request failed: {source}")]
    Transport {
        endpoint: Endpoint,
        #[source]
        source: reqwest::Error,
    },

    /// The response body was not valid JSON
    #[error("failed to decode {endpoint} response: {reason}")]
    Decode { endpoint: Endpoint, reason: String },

    /// The configured base URL cannot be used
    #[error("invalid API base URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl FetchError {
    /// Whether trying again later may succeed
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            FetchError::Timeout { .. } | FetchError::Server { .. } | FetchError::Transport { .. }
        )
    }

    /// Message suitable for showing to the person who triggered the load
    pub fn user_message(&self) -> String {
        match self {
            FetchError::Timeout { .. } => "request timed out, try again shortly".to_string(),
            FetchError::NotFound { endpoint } => format!("{} does not exist", endpoint),
            FetchError::Server { .. } => "server error, try again shortly".to_string(),
            other => other.to_string(),
        }
    }

    /// Maps a response status to an error; `None` for success
    fn from_status(endpoint: Endpoint, status: StatusCode) -> Option<Self> {
        if status.is_success() {
            None
        } else if status == StatusCode::NOT_FOUND {
            Some(FetchError::NotFound { endpoint })
        } else if status.is_server_error() {
            Some(FetchError::Server {
                endpoint,
                status: status.as_u16(),
            })
        } else {
            Some(FetchError::Status {
                endpoint,
                status: status.as_u16(),
            })
        }
    }

    fn from_reqwest(endpoint: Endpoint, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            FetchError::Timeout { endpoint }
        } else if error.is_decode() {
            FetchError::Decode {
                endpoint,
                reason: error.to_string(),
            }
        } else {
            FetchError::Transport {
                endpoint,
                source: error,
            }
        }
    }
}

/// The report endpoints the cache loads from
#[async_trait]
pub trait ReportApi: Send + Sync {
    /// Job posting metadata (title, headcount, dates)
    async fn job_post(&self, job_post_id: &str) -> Result<Value, FetchError>;

    /// Document screening statistics
    async fn document_report(&self, job_post_id: &str) -> Result<Value, FetchError>;

    /// Written (job aptitude) test statistics
    async fn written_report(&self, job_post_id: &str) -> Result<Value, FetchError>;

    /// Evaluations for one interview stage
    async fn interview_evaluations(
        &self,
        stage: InterviewStage,
        job_post_id: &str,
    ) -> Result<Value, FetchError>;
}

/// Client for the hiring backend's report endpoints
#[derive(Debug, Clone)]
pub struct HttpReportApi {
    client: Client,
    base_url: Url,
    token: Option<String>,
    job_post_timeout: Duration,
    report_timeout: Duration,
}

impl HttpReportApi {
    /// Creates a client from the `[api]` configuration section
    pub fn new(config: &ApiConfig) -> Result<Self, FetchError> {
        Self::with_client(Client::new(), config)
    }

    /// Creates a client with a custom HTTP client
    pub fn with_client(client: Client, config: &ApiConfig) -> Result<Self, FetchError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| FetchError::InvalidUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(FetchError::InvalidUrl {
                url: config.base_url.clone(),
                reason: "URL cannot be used as a base".to_string(),
            });
        }

        Ok(Self {
            client,
            base_url,
            token: config.token.clone(),
            job_post_timeout: config.job_post_timeout(),
            report_timeout: config.report_timeout(),
        })
    }

    fn timeout(&self, endpoint: Endpoint) -> Duration {
        match endpoint {
            Endpoint::JobPost => self.job_post_timeout,
            _ => self.report_timeout,
        }
    }

    /// Builds the request URL for an endpoint
    ///
    /// The job post id is always inserted as a single escaped path segment
    /// or query value.
    fn url(&self, endpoint: Endpoint, job_post_id: &str) -> Url {
        let mut url = self.base_url.clone();
        // Base URLs that cannot hold path segments are rejected in the constructor.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty();
            match endpoint {
                Endpoint::JobPost => {
                    segments.extend(["company", "jobposts", job_post_id]);
                }
                Endpoint::DocumentReport => {
                    segments.extend(["report", "document"]);
                }
                Endpoint::WrittenReport => {
                    segments.extend(["report", "job-aptitude"]);
                }
                Endpoint::Interview(InterviewStage::Ai) => {
                    segments.extend(["ai-interview", "evaluations", "job-post", job_post_id]);
                }
                Endpoint::Interview(stage) => {
                    segments.extend([
                        "interview-evaluation",
                        "job-post",
                        job_post_id,
                        stage.as_str(),
                    ]);
                }
            }
        }
        if matches!(endpoint, Endpoint::DocumentReport | Endpoint::WrittenReport) {
            url.query_pairs_mut().append_pair("job_post_id", job_post_id);
        }
        url
    }

    async fn get_json(&self, endpoint: Endpoint, job_post_id: &str) -> Result<Value, FetchError> {
        let url = self.url(endpoint, job_post_id);
        debug!(%endpoint, %url, "requesting");

        let mut request = self.client.get(url).timeout(self.timeout(endpoint));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(endpoint, e))?;
        if let Some(error) = FetchError::from_status(endpoint, response.status()) {
            return Err(error);
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| FetchError::from_reqwest(endpoint, e))?;
        info!(%endpoint, job_post_id, "fetched");
        Ok(body)
    }
}

#[async_trait]
impl ReportApi for HttpReportApi {
    async fn job_post(&self, job_post_id: &str) -> Result<Value, FetchError> {
        self.get_json(Endpoint::JobPost, job_post_id).await
    }

    async fn document_report(&self, job_post_id: &str) -> Result<Value, FetchError> {
        self.get_json(Endpoint::DocumentReport, job_post_id).await
    }

    async fn written_report(&self, job_post_id: &str) -> Result<Value, FetchError> {
        self.get_json(Endpoint::WrittenReport, job_post_id).await
    }

    async fn interview_evaluations(
        &self,
        stage: InterviewStage,
        job_post_id: &str,
    ) -> Result<Value, FetchError> {
        self.get_json(Endpoint::Interview(stage), job_post_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn api_for(base_url: &str) -> HttpReportApi {
        let config = ApiConfig {
            base_url: base_url.to_string(),
            ..ApiConfig::default()
        };
        HttpReportApi::new(&config).expect("valid base URL")
    }

    /// Serves one canned HTTP response on a local port, optionally after a delay
    async fn serve_once(status_line: &'static str, body: &'static str, delay: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            tokio::time::sleep(delay).await;
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\n\
                 content-length: {}\r\nconnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        });

        format!("http://{}/api/v1", addr)
    }

    #[test]
    fn test_urls_match_backend_routes() {
        let api = api_for("http://localhost:8000/api/v1");

        assert_eq!(
            api.url(Endpoint::JobPost, "42").as_str(),
            "http://localhost:8000/api/v1/company/jobposts/42"
        );
        assert_eq!(
            api.url(Endpoint::DocumentReport, "42").as_str(),
            "http://localhost:8000/api/v1/report/document?job_post_id=42"
        );
        assert_eq!(
            api.url(Endpoint::WrittenReport, "42").as_str(),
            "http://localhost:8000/api/v1/report/job-aptitude?job_post_id=42"
        );
        assert_eq!(
            api.url(Endpoint::Interview(InterviewStage::Ai), "42").as_str(),
            "http://localhost:8000/api/v1/ai-interview/evaluations/job-post/42"
        );
        assert_eq!(
            api.url(Endpoint::Interview(InterviewStage::FinalSelected), "42")
                .as_str(),
            "http://localhost:8000/api/v1/interview-evaluation/job-post/42/final-selected"
        );
    }

    #[test]
    fn test_trailing_slash_and_unsafe_ids_are_handled() {
        let api = api_for("http://localhost:8000/api/v1/");

        assert_eq!(
            api.url(Endpoint::JobPost, "4/2").as_str(),
            "http://localhost:8000/api/v1/company/jobposts/4%2F2"
        );
        assert_eq!(
            api.url(Endpoint::DocumentReport, "4&x=1").as_str(),
            "http://localhost:8000/api/v1/report/document?job_post_id=4%26x%3D1"
        );
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let config = ApiConfig {
            base_url: "not a url".to_string(),
            ..ApiConfig::default()
        };
        assert!(matches!(
            HttpReportApi::new(&config),
            Err(FetchError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_status_classification() {
        let endpoint = Endpoint::DocumentReport;
        assert!(FetchError::from_status(endpoint, StatusCode::OK).is_none());
        assert!(matches!(
            FetchError::from_status(endpoint, StatusCode::NOT_FOUND),
            Some(FetchError::NotFound { .. })
        ));
        assert!(matches!(
            FetchError::from_status(endpoint, StatusCode::BAD_GATEWAY),
            Some(FetchError::Server { status: 502, .. })
        ));
        assert!(matches!(
            FetchError::from_status(endpoint, StatusCode::UNAUTHORIZED),
            Some(FetchError::Status { status: 401, .. })
        ));
    }

    #[test]
    fn test_user_messages() {
        let timeout = FetchError::Timeout {
            endpoint: Endpoint::JobPost,
        };
        assert_eq!(timeout.user_message(), "request timed out, try again shortly");
        assert!(timeout.is_retriable());

        let not_found = FetchError::NotFound {
            endpoint: Endpoint::WrittenReport,
        };
        assert_eq!(not_found.user_message(), "written-test report does not exist");
        assert!(!not_found.is_retriable());

        let server = FetchError::Server {
            endpoint: Endpoint::Interview(InterviewStage::Executive),
            status: 500,
        };
        assert!(server.is_retriable());
    }

    #[tokio::test]
    async fn test_fetch_returns_json_body() {
        let base = serve_once("200 OK", r#"{"stats":{"avg_score":80}}"#, Duration::ZERO).await;
        let api = api_for(&base);

        let body = api.document_report("42").await.expect("fetch should succeed");

        assert_eq!(body, json!({"stats": {"avg_score": 80}}));
    }

    #[tokio::test]
    async fn test_fetch_maps_404_to_not_found() {
        let base = serve_once("404 Not Found", r#"{"detail":"missing"}"#, Duration::ZERO).await;
        let api = api_for(&base);

        let result = api.job_post("42").await;

        assert!(matches!(
            result,
            Err(FetchError::NotFound {
                endpoint: Endpoint::JobPost
            })
        ));
    }

    #[tokio::test]
    async fn test_fetch_maps_500_to_server_error() {
        let base = serve_once("500 Internal Server Error", "{}", Duration::ZERO).await;
        let api = api_for(&base);

        let result = api
            .interview_evaluations(InterviewStage::Practical, "42")
            .await;

        assert!(matches!(result, Err(FetchError::Server { status: 500, .. })));
    }

    #[tokio::test]
    async fn test_fetch_times_out() {
        let base = serve_once("200 OK", "{}", Duration::from_secs(5)).await;
        let config = ApiConfig {
            base_url: base,
            ..ApiConfig::default()
        };
        let mut api = HttpReportApi::new(&config).unwrap();
        api.report_timeout = Duration::from_millis(200);

        let result = api.written_report("42").await;

        assert!(matches!(
            result,
            Err(FetchError::Timeout {
                endpoint: Endpoint::WrittenReport
            })
        ));
    }

    #[tokio::test]
    async fn test_invalid_json_is_decode_error() {
        let base = serve_once("200 OK", "not json", Duration::ZERO).await;
        let api = api_for(&base);

        let result = api.document_report("42").await;

        assert!(matches!(result, Err(FetchError::Decode { .. })));
    }
}
