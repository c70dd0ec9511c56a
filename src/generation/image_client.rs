use crate::{
    config::StabilitySettings,
    error::GenerationError,
    generation::{
        credentials::{Credential, CredentialPool},
        styles::StyleCatalog,
    },
    models::{GenerationOutcome, GenerationRequest},
};
use reqwest::{
    header::ACCEPT,
    multipart::{Form, Part},
    Client, StatusCode,
};
use std::path::{Path, PathBuf};

const OUTPUT_FORMAT: &str = "webp";
const STRENGTH: &str = "0.7";
const REFERENCE_IMAGE_MIME: &str = "image/png";
const LOG_BODY_LIMIT: usize = 512;

/// Auth, payment and rate-limit statuses move on to the next credential.
const ROTATE_STATUSES: [StatusCode; 4] = [
    StatusCode::UNAUTHORIZED,
    StatusCode::PAYMENT_REQUIRED,
    StatusCode::FORBIDDEN,
    StatusCode::TOO_MANY_REQUESTS,
];

enum Attempt {
    Succeeded(Vec<u8>),
    Rejected { status: u16, body: String },
    Failed { status: u16, body: String },
    Transport(String),
}

/// Client for the structure-conditioned image transformation endpoint.
///
/// Holds only immutable settings and a connection pool; credentials are
/// passed to every call so one instance can be shared across requests.
#[derive(Clone)]
pub struct ImageGenerationClient {
    http: Client,
    settings: StabilitySettings,
}

impl ImageGenerationClient {
    pub fn new(settings: StabilitySettings) -> Result<Self, GenerationError> {
        let http = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| GenerationError::ClientError(e.to_string()))?;

        Ok(Self { http, settings })
    }

    /// Returns the output path on success and `None` once every credential
    /// failed. An empty pool is an error and makes no network call.
    pub async fn generate(
        &self,
        credentials: &CredentialPool,
        request: &GenerationRequest,
    ) -> Result<Option<PathBuf>, GenerationError> {
        Ok(self
            .generate_detailed(credentials, request)
            .await?
            .into_path())
    }

    pub async fn generate_detailed(
        &self,
        credentials: &CredentialPool,
        request: &GenerationRequest,
    ) -> Result<GenerationOutcome, GenerationError> {
        if credentials.is_empty() {
            return Err(GenerationError::NotConfigured);
        }

        let reference_image = request
            .base_dir
            .as_deref()
            .and_then(|base_dir| StyleCatalog::resolve_reference_image(&request.style, base_dir));

        log::info!(
            "Generating interior (style: '{}', credentials: {}, reference image: {})",
            request.style,
            credentials.len(),
            reference_image
                .as_deref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "none".to_string())
        );

        let mut last_status = None;
        let mut last_error = None;

        for (index, credential) in credentials.iter().enumerate() {
            // Buffers for this attempt are owned by the form and released
            // when the attempt ends.
            let form = build_form(request, reference_image.as_deref()).await?;
            log::debug!(
                "Attempt {}/{} with credential {}",
                index + 1,
                credentials.len(),
                credential.masked()
            );

            match self.submit(credential, form).await {
                Attempt::Succeeded(bytes) => {
                    tokio::fs::write(&request.output_path, &bytes)
                        .await
                        .map_err(|source| GenerationError::WriteOutput {
                            path: request.output_path.clone(),
                            source,
                        })?;
                    log::info!(
                        "Interior written to {} ({} bytes, attempt {})",
                        request.output_path.display(),
                        bytes.len(),
                        index + 1
                    );
                    return Ok(GenerationOutcome::Generated(request.output_path.clone()));
                }
                Attempt::Rejected { status, body } => {
                    log::warn!(
                        "Credential #{} rejected with status {}, trying next: {}",
                        index + 1,
                        status,
                        body
                    );
                    last_status = Some(status);
                    last_error = Some(body);
                }
                Attempt::Failed { status, body } => {
                    log::error!(
                        "Upstream refused the request with status {}; remaining credentials not tried: {}",
                        status,
                        body
                    );
                    return Ok(GenerationOutcome::Aborted { status, body });
                }
                Attempt::Transport(error) => {
                    log::warn!(
                        "Credential #{} hit a transport error, trying next: {}",
                        index + 1,
                        error
                    );
                    last_error = Some(error);
                }
            }
        }

        log::error!(
            "All {} credentials exhausted (last status: {:?})",
            credentials.len(),
            last_status
        );
        Ok(GenerationOutcome::Exhausted {
            attempts: credentials.len(),
            last_status,
            last_error,
        })
    }

    async fn submit(&self, credential: &Credential, form: Form) -> Attempt {
        let response = match self
            .http
            .post(&self.settings.endpoint)
            .bearer_auth(credential.expose())
            .header(ACCEPT, "image/*")
            .multipart(form)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return Attempt::Transport(e.to_string()),
        };

        let status = response.status();
        if status == StatusCode::OK {
            return match response.bytes().await {
                Ok(bytes) => Attempt::Succeeded(bytes.to_vec()),
                Err(e) => Attempt::Transport(e.to_string()),
            };
        }

        let body = truncate(&response.text().await.unwrap_or_default(), LOG_BODY_LIMIT);
        if ROTATE_STATUSES.contains(&status) {
            Attempt::Rejected {
                status: status.as_u16(),
                body,
            }
        } else {
            Attempt::Failed {
                status: status.as_u16(),
                body,
            }
        }
    }
}

async fn build_form(
    request: &GenerationRequest,
    reference_image: Option<&Path>,
) -> Result<Form, GenerationError> {
    let image = file_part(&request.source_image, mime_for(&request.source_image)).await?;
    let mut form = Form::new()
        .text("prompt", request.prompt.clone())
        .text("output_format", OUTPUT_FORMAT)
        .text("strength", STRENGTH)
        .part("image", image);

    if let Some(path) = reference_image {
        form = form.part("reference_image", file_part(path, REFERENCE_IMAGE_MIME).await?);
    }

    Ok(form)
}

async fn file_part(path: &Path, mime: &str) -> Result<Part, GenerationError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| GenerationError::ReadInput {
            path: path.to_path_buf(),
            source,
        })?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());

    Part::bytes(bytes)
        .file_name(file_name)
        .mime_str(mime)
        .map_err(|e| GenerationError::ClientError(e.to_string()))
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut out: String = text.chars().take(limit).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    const ENDPOINT_PATH: &str = "/v2beta/stable-image/control/structure";

    struct Fixture {
        dir: TempDir,
        source: PathBuf,
        output: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("plan.png");
        std::fs::write(&source, b"floor-plan-bytes").unwrap();
        let output = dir.path().join("result.webp");
        Fixture {
            dir,
            source,
            output,
        }
    }

    fn client_for(server: &MockServer) -> ImageGenerationClient {
        let settings = StabilitySettings::new()
            .with_endpoint(format!("{}{}", server.uri(), ENDPOINT_PATH))
            .with_timeout(Duration::from_secs(5));
        ImageGenerationClient::new(settings).unwrap()
    }

    fn request_for(fx: &Fixture, style: &str) -> GenerationRequest {
        GenerationRequest::new("a prompt", &fx.source, &fx.output)
            .with_style(style)
            .with_base_dir(fx.dir.path())
    }

    async fn mount(server: &MockServer, key: &str, response: ResponseTemplate, times: u64) {
        Mock::given(method("POST"))
            .and(path(ENDPOINT_PATH))
            .and(header("authorization", format!("Bearer {}", key).as_str()))
            .respond_with(response)
            .expect(times)
            .mount(server)
            .await;
    }

    fn body_of(request: &Request) -> String {
        String::from_utf8_lossy(&request.body).into_owned()
    }

    #[tokio::test]
    async fn test_empty_pool_fails_without_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let fx = fixture();
        let result = client_for(&server)
            .generate(&CredentialPool::default(), &request_for(&fx, "modern"))
            .await;

        assert!(matches!(result, Err(GenerationError::NotConfigured)));
        assert!(!fx.output.exists());
    }

    #[tokio::test]
    async fn test_rate_limited_key_fails_over_to_next() {
        let server = MockServer::start().await;
        mount(
            &server,
            "k1",
            ResponseTemplate::new(429).set_body_string("rate limited"),
            1,
        )
        .await;
        mount(
            &server,
            "k2",
            ResponseTemplate::new(200).set_body_bytes(b"RIFF-webp-from-k2".to_vec()),
            1,
        )
        .await;

        let fx = fixture();
        let result = client_for(&server)
            .generate(&CredentialPool::parse("k1,k2"), &request_for(&fx, "modern"))
            .await
            .unwrap();

        assert_eq!(result, Some(fx.output.clone()));
        assert_eq!(std::fs::read(&fx.output).unwrap(), b"RIFF-webp-from-k2");
    }

    #[tokio::test]
    async fn test_auth_and_quota_statuses_all_rotate() {
        let server = MockServer::start().await;
        mount(&server, "k1", ResponseTemplate::new(401), 1).await;
        mount(&server, "k2", ResponseTemplate::new(402), 1).await;
        mount(&server, "k3", ResponseTemplate::new(403), 1).await;
        mount(
            &server,
            "k4",
            ResponseTemplate::new(429).set_body_string("slow down"),
            1,
        )
        .await;

        let fx = fixture();
        let outcome = client_for(&server)
            .generate_detailed(
                &CredentialPool::parse("k1 k2 k3 k4"),
                &request_for(&fx, "modern"),
            )
            .await
            .unwrap();

        assert_eq!(
            outcome,
            GenerationOutcome::Exhausted {
                attempts: 4,
                last_status: Some(429),
                last_error: Some("slow down".to_string()),
            }
        );
        assert!(!fx.output.exists());
    }

    #[tokio::test]
    async fn test_server_error_stops_the_loop() {
        let server = MockServer::start().await;
        mount(
            &server,
            "k1",
            ResponseTemplate::new(500).set_body_string("boom"),
            1,
        )
        .await;
        mount(&server, "k2", ResponseTemplate::new(200), 0).await;

        let fx = fixture();
        let client = client_for(&server);
        let pool = CredentialPool::parse("k1,k2");

        let outcome = client
            .generate_detailed(&pool, &request_for(&fx, "modern"))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            GenerationOutcome::Aborted {
                status: 500,
                body: "boom".to_string(),
            }
        );
        assert_eq!(outcome.into_path(), None);
        assert!(!fx.output.exists());
    }

    #[tokio::test]
    async fn test_bad_request_is_not_retried() {
        let server = MockServer::start().await;
        mount(&server, "k1", ResponseTemplate::new(400), 1).await;
        mount(&server, "k2", ResponseTemplate::new(200), 0).await;

        let fx = fixture();
        let result = client_for(&server)
            .generate(&CredentialPool::parse("k1,k2"), &request_for(&fx, "modern"))
            .await
            .unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_request_fields_without_reference_image() {
        let server = MockServer::start().await;
        mount(
            &server,
            "only",
            ResponseTemplate::new(200).set_body_bytes(b"img".to_vec()),
            1,
        )
        .await;

        // No static/images directory in the base dir.
        let fx = fixture();
        client_for(&server)
            .generate(&CredentialPool::parse("only"), &request_for(&fx, "modern"))
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(
            request.headers.get("accept").and_then(|v| v.to_str().ok()),
            Some("image/*")
        );
        assert!(request
            .headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map_or(false, |v| v.starts_with("multipart/form-data")));

        let body = body_of(request);
        assert!(body.contains("name=\"prompt\""));
        assert!(body.contains("a prompt"));
        assert!(body.contains("name=\"output_format\""));
        assert!(body.contains("webp"));
        assert!(body.contains("name=\"strength\""));
        assert!(body.contains("0.7"));
        assert!(body.contains("name=\"image\"; filename=\"plan.png\""));
        assert!(body.contains("floor-plan-bytes"));
        assert!(!body.contains("reference_image"));
    }

    #[tokio::test]
    async fn test_reference_image_attached_on_every_attempt() {
        let server = MockServer::start().await;
        mount(&server, "k1", ResponseTemplate::new(403), 1).await;
        mount(
            &server,
            "k2",
            ResponseTemplate::new(200).set_body_bytes(b"img".to_vec()),
            1,
        )
        .await;

        let fx = fixture();
        let images = fx.dir.path().join("static").join("images");
        std::fs::create_dir_all(&images).unwrap();
        std::fs::write(images.join("shabby-chic.png"), b"reference-bytes").unwrap();

        client_for(&server)
            .generate(
                &CredentialPool::parse("k1,k2"),
                &request_for(&fx, "shabby_chic"),
            )
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
        for request in &requests {
            let body = body_of(request);
            assert!(body.contains("name=\"reference_image\"; filename=\"shabby-chic.png\""));
            assert!(body.contains("Content-Type: image/png"));
            assert!(body.contains("reference-bytes"));
            assert!(body.contains("floor-plan-bytes"));
        }
    }

    #[tokio::test]
    async fn test_no_base_dir_means_no_reference_image() {
        let server = MockServer::start().await;
        mount(&server, "k", ResponseTemplate::new(200), 1).await;

        let fx = fixture();
        let images = fx.dir.path().join("static").join("images");
        std::fs::create_dir_all(&images).unwrap();
        std::fs::write(images.join("modern.png"), b"reference-bytes").unwrap();

        let request = GenerationRequest::new("p", &fx.source, &fx.output).with_style("modern");
        client_for(&server)
            .generate(&CredentialPool::parse("k"), &request)
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        assert!(!body_of(&requests[0]).contains("reference_image"));
    }

    #[tokio::test]
    async fn test_transport_errors_exhaust_pool() {
        // Nothing listens on the discard port.
        let settings = StabilitySettings::new()
            .with_endpoint("http://127.0.0.1:9/structure")
            .with_timeout(Duration::from_secs(2));
        let client = ImageGenerationClient::new(settings).unwrap();

        let fx = fixture();
        let outcome = client
            .generate_detailed(&CredentialPool::parse("a,b"), &request_for(&fx, "modern"))
            .await
            .unwrap();

        match outcome {
            GenerationOutcome::Exhausted {
                attempts,
                last_status,
                last_error,
            } => {
                assert_eq!(attempts, 2);
                assert_eq!(last_status, None);
                assert!(last_error.is_some());
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(!fx.output.exists());
    }

    #[tokio::test]
    async fn test_missing_source_image_is_an_error() {
        let server = MockServer::start().await;
        mount(&server, "k", ResponseTemplate::new(200), 0).await;

        let fx = fixture();
        let request = GenerationRequest::new("p", fx.dir.path().join("missing.png"), &fx.output);
        let result = client_for(&server)
            .generate(&CredentialPool::parse("k"), &request)
            .await;

        assert!(matches!(result, Err(GenerationError::ReadInput { .. })));
    }

    #[test]
    fn test_truncate_long_bodies() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc…");
    }

    #[test]
    fn test_mime_for_extension() {
        assert_eq!(mime_for(Path::new("a.PNG")), "image/png");
        assert_eq!(mime_for(Path::new("a.jpeg")), "image/jpeg");
        assert_eq!(mime_for(Path::new("a")), "application/octet-stream");
    }
}
