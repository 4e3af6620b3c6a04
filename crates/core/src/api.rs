//! Wire types and the HTTP client.
//!
//! The state machines talk to the backend only through the [`AuthApi`],
//! [`PredictionApi`] and [`ProjectApi`] traits; [`HttpClient`] is the real
//! implementation, tests plug in fakes.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::prediction::{Field, PredictionRequest, PredictionResult};
use crate::role::{Identity, Role};

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: Identity,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// Body of a 201 from `/auth/register`. Deployments differ in what they echo
/// back, so both fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisteredUser {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user: Option<Identity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    pub status: String,
    pub progress: f64,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub delay_status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Pulls a human-readable message out of an error body (`{message}` from the
/// auth service, `{error}` from the inference service).
pub fn error_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed
        .message
        .or(parsed.error)
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
}

#[allow(async_fn_in_trait)]
pub trait AuthApi {
    async fn login(&self, req: &LoginRequest) -> Result<LoginResponse, ApiError>;
    async fn register(&self, req: &RegisterRequest) -> Result<RegisteredUser, ApiError>;
    async fn profile(&self, token: &str) -> Result<Identity, ApiError>;
}

#[allow(async_fn_in_trait)]
pub trait PredictionApi {
    async fn predict(&self, req: &PredictionRequest) -> Result<PredictionResult, ApiError>;
}

#[allow(async_fn_in_trait)]
pub trait ProjectApi {
    async fn public_projects(&self) -> Result<Vec<ProjectSummary>, ApiError>;

    /// Authenticated listing at `path` (see `Dashboard::projects_path`).
    async fn listing(&self, path: &str, token: &str) -> Result<Vec<ProjectSummary>, ApiError>;

    async fn projects(&self, token: &str) -> Result<Vec<ProjectSummary>, ApiError> {
        self.listing("/projects", token).await
    }
}

#[derive(Debug, Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base: String,
}

impl HttpClient {
    pub fn new(cfg: &ClientConfig) -> Result<Self, ApiError> {
        #[allow(unused_mut)]
        let mut builder = reqwest::Client::builder();
        // Browser fetch has no client-side timeout knob.
        #[cfg(not(target_arch = "wasm32"))]
        {
            builder = builder.timeout(cfg.request_timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ApiError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base: cfg.api_base.clone(),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
        let status = resp.status();
        if status.is_success() {
            return resp
                .json::<T>()
                .await
                .map_err(|e| ApiError::Decode(e.to_string()));
        }
        let body = resp.text().await.unwrap_or_default();
        Err(ApiError::from_status(status.as_u16(), error_message(&body)))
    }
}

impl AuthApi for HttpClient {
    async fn login(&self, req: &LoginRequest) -> Result<LoginResponse, ApiError> {
        let resp = self
            .http
            .post(self.url("/auth/login"))
            .json(req)
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn register(&self, req: &RegisterRequest) -> Result<RegisteredUser, ApiError> {
        let resp = self
            .http
            .post(self.url("/auth/register"))
            .json(req)
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn profile(&self, token: &str) -> Result<Identity, ApiError> {
        let resp = self
            .http
            .get(self.url("/auth/profile"))
            .bearer_auth(token)
            .send()
            .await?;
        Self::decode(resp).await
    }
}

impl PredictionApi for HttpClient {
    async fn predict(&self, req: &PredictionRequest) -> Result<PredictionResult, ApiError> {
        let image = reqwest::multipart::Part::bytes(req.image.bytes.clone())
            .file_name(req.image.file_name.clone())
            .mime_str(&req.image.content_type)
            .map_err(|e| ApiError::InvalidRequest(format!("invalid image content type: {e}")))?;
        let form = reqwest::multipart::Form::new()
            .text(Field::TimelineDays.wire_name(), req.timeline_days.clone())
            .text(
                Field::BudgetUtilizedPercent.wire_name(),
                req.budget_utilized_percent.clone(),
            )
            .part(Field::Image.wire_name(), image);

        tracing::debug!(
            "POST /predict ({} bytes, {})",
            req.image.bytes.len(),
            req.image.content_type
        );
        let resp = self
            .http
            .post(self.url("/predict"))
            .multipart(form)
            .send()
            .await?;
        Self::decode(resp).await
    }
}

impl ProjectApi for HttpClient {
    async fn public_projects(&self) -> Result<Vec<ProjectSummary>, ApiError> {
        let resp = self.http.get(self.url("/projects/public")).send().await?;
        Self::decode(resp).await
    }

    async fn listing(&self, path: &str, token: &str) -> Result<Vec<ProjectSummary>, ApiError> {
        let resp = self
            .http
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await?;
        Self::decode(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_message_then_error() {
        assert_eq!(
            error_message(r#"{"message":"Invalid email or password"}"#).as_deref(),
            Some("Invalid email or password")
        );
        assert_eq!(
            error_message(r#"{"error":"AI model not loaded"}"#).as_deref(),
            Some("AI model not loaded")
        );
        assert_eq!(error_message(r#"{"message":"  "}"#), None);
        assert_eq!(error_message("<html>502</html>"), None);
        assert_eq!(error_message(""), None);
    }

    #[test]
    fn register_request_omits_missing_role() {
        let req = RegisterRequest {
            username: "asha".into(),
            email: "asha@example.com".into(),
            password: "pw".into(),
            role: None,
        };
        let v = serde_json::to_value(&req).unwrap();
        assert!(v.get("role").is_none());

        let req = RegisterRequest {
            role: Some(Role::Official),
            ..req
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["role"], "official");
    }

    #[test]
    fn public_project_listing_decodes() {
        let raw = r#"[{"id":2,"name":"Delhi Airport Terminal 4","location":"New Delhi, Delhi",
            "status":"delayed","progress":60,"latitude":28.5562,"longitude":77.1,
            "delay_status":"3 months behind schedule"}]"#;
        let list: Vec<ProjectSummary> = serde_json::from_str(raw).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].progress, 60.0);
        assert_eq!(list[0].delay_status.as_deref(), Some("3 months behind schedule"));
    }

    #[test]
    fn url_joins_base_and_path() {
        let cfg = ClientConfig::with_base("http://api.example.test/").unwrap();
        let client = HttpClient::new(&cfg).unwrap();
        assert_eq!(client.url("/auth/login"), "http://api.example.test/auth/login");
    }

    struct PathEcho;

    impl ProjectApi for PathEcho {
        async fn public_projects(&self) -> Result<Vec<ProjectSummary>, ApiError> {
            Ok(Vec::new())
        }

        async fn listing(&self, path: &str, token: &str) -> Result<Vec<ProjectSummary>, ApiError> {
            if token.is_empty() {
                return Err(ApiError::from_status(401, None));
            }
            Ok(vec![ProjectSummary {
                id: 1,
                name: path.to_string(),
                location: None,
                status: "ongoing".into(),
                progress: 0.0,
                latitude: None,
                longitude: None,
                delay_status: None,
            }])
        }
    }

    #[tokio::test]
    async fn own_projects_use_the_plain_listing() {
        let list = PathEcho.projects("tok").await.unwrap();
        assert_eq!(list[0].name, "/projects");
        assert!(PathEcho.projects("").await.unwrap_err().is_auth_rejection());
    }

    mod wire {
        //! Requests against a one-shot loopback server.

        use super::*;
        use crate::prediction::ImageAttachment;
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::{TcpListener, TcpStream};
        use tokio::task::JoinHandle;

        fn client(base: &str) -> HttpClient {
            HttpClient {
                http: reqwest::Client::builder().no_proxy().build().unwrap(),
                base: base.to_string(),
            }
        }

        fn request_complete(buf: &[u8]) -> bool {
            let Some(head_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
                return false;
            };
            let head = String::from_utf8_lossy(&buf[..head_end]).to_ascii_lowercase();
            let body = &buf[head_end + 4..];
            if head.contains("transfer-encoding: chunked") {
                return body.ends_with(b"0\r\n\r\n");
            }
            let length = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            body.len() >= length
        }

        async fn read_request(sock: &mut TcpStream) -> String {
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = sock.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                if request_complete(&buf) {
                    break;
                }
            }
            String::from_utf8_lossy(&buf).into_owned()
        }

        /// Answers exactly one request with `status` and `body`; the handle
        /// yields the raw request text.
        async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let base = format!("http://{}", listener.local_addr().unwrap());
            let handle = tokio::spawn(async move {
                let (mut sock, _) = listener.accept().await.unwrap();
                let raw = read_request(&mut sock).await;
                let resp = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                sock.write_all(resp.as_bytes()).await.unwrap();
                let _ = sock.shutdown().await;
                raw
            });
            (base, handle)
        }

        fn site_photo(content_type: &str) -> PredictionRequest {
            PredictionRequest {
                timeline_days: "30".into(),
                budget_utilized_percent: "55".into(),
                image: ImageAttachment {
                    file_name: "site.jpg".into(),
                    content_type: content_type.into(),
                    bytes: b"fakejpeg".to_vec(),
                },
            }
        }

        #[tokio::test]
        async fn expired_token_is_an_auth_rejection() {
            let (base, server) =
                serve_once("401 Unauthorized", r#"{"message":"Token expired"}"#).await;

            let err = client(&base).profile("tok-1").await.unwrap_err();
            let raw = server.await.unwrap();

            assert_eq!(
                err,
                ApiError::Unauthorized {
                    message: "Token expired".into()
                }
            );
            assert!(err.is_auth_rejection());
            assert!(raw.starts_with("GET /auth/profile "));
            assert!(raw.to_ascii_lowercase().contains("authorization: bearer tok-1"));
        }

        #[tokio::test]
        async fn bad_credentials_keep_the_server_message() {
            let (base, server) =
                serve_once("400 Bad Request", r#"{"message":"Invalid email or password"}"#).await;

            let req = LoginRequest {
                email: "asha@example.com".into(),
                password: "wrong".into(),
            };
            let err = client(&base).login(&req).await.unwrap_err();
            let raw = server.await.unwrap();

            assert_eq!(
                err,
                ApiError::Rejected {
                    status: 400,
                    message: "Invalid email or password".into()
                }
            );
            assert!(!err.is_auth_rejection());
            assert!(raw.starts_with("POST /auth/login "));
            assert!(raw.contains(r#""email":"asha@example.com""#));
        }

        #[tokio::test]
        async fn prediction_failure_without_body_is_a_bare_status() {
            let (base, server) = serve_once("503 Service Unavailable", "").await;

            let err = client(&base).predict(&site_photo("image/jpeg")).await.unwrap_err();
            let raw = server.await.unwrap();

            assert_eq!(err, ApiError::Status(503));
            assert!(raw.starts_with("POST /predict "));
            assert!(raw.contains(r#"name="timeline_days""#));
            assert!(raw.contains(r#"name="budget_utilized_percent""#));
            assert!(raw.contains(r#"name="image"; filename="site.jpg""#));
            assert!(raw.contains("fakejpeg"));
        }

        #[tokio::test]
        async fn prediction_error_body_is_surfaced() {
            let (base, server) =
                serve_once("500 Internal Server Error", r#"{"error":"AI model not loaded"}"#).await;

            let err = client(&base).predict(&site_photo("image/png")).await.unwrap_err();
            server.await.unwrap();

            assert_eq!(err.server_message(), Some("AI model not loaded"));
            assert_eq!(err.status(), Some(500));
        }

        #[tokio::test]
        async fn unparseable_content_type_fails_before_sending() {
            let err = client("http://127.0.0.1:9")
                .predict(&site_photo("image/a(b)"))
                .await
                .unwrap_err();
            assert!(matches!(err, ApiError::InvalidRequest(_)), "{err:?}");
        }
    }
}
