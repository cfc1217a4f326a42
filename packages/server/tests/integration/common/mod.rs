use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use ::common::storage::filesystem::FilesystemBlobStore;
use reqwest::Client;
use serde_json::Value;
use tempfile::TempDir;

use plantdex_server::config::{
    AppConfig, CorsConfig, DatabaseConfig, GeneratorConfig, S3Config, ServerConfig,
    StorageBackend, StorageConfig, SuggestConfig,
};
use plantdex_server::plants::store::MemoryPlantStore;
use plantdex_server::plants::{ContentGenerator, GeneratedImage, GenerationError, ImageStore};
use plantdex_server::state::AppState;

pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n fake plant photo";
pub const PLACEHOLDER: &str = "https://upload.wikimedia.org/placeholder.png";

pub mod routes {
    pub const PLANTS: &str = "/api/plants";
    pub const UPLOADS: &str = "/api/uploads";
    pub const SUGGEST: &str = "/suggest";
    pub const HEALTH: &str = "/health";

    pub fn plant_image(name: &str) -> String {
        format!("/api/plant?name={}", urlencode(name))
    }

    pub fn plant(id: i64) -> String {
        format!("/api/plant/{id}")
    }

    fn urlencode(s: &str) -> String {
        s.replace('%', "%25").replace(' ', "%20").replace('&', "%26")
    }
}

/// What the fake generator answers for image requests.
#[derive(Clone)]
pub enum ImageReply {
    Png,
    Empty,
    Fail,
}

/// Scripted [`ContentGenerator`] that counts image calls.
pub struct FakeGenerator {
    image: ImageReply,
    completion: Option<String>,
    delay: Duration,
    image_calls: AtomicUsize,
}

impl FakeGenerator {
    pub fn new(image: ImageReply) -> Self {
        Self {
            image,
            completion: None,
            delay: Duration::ZERO,
            image_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_completion(mut self, text: &str) -> Self {
        self.completion = Some(text.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn image_calls(&self) -> usize {
        self.image_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentGenerator for FakeGenerator {
    async fn generate_image(&self, _prompt: &str) -> Result<GeneratedImage, GenerationError> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        match self.image {
            ImageReply::Png => Ok(GeneratedImage::Bytes {
                data: PNG_BYTES.to_vec(),
                content_type: "image/png".into(),
            }),
            ImageReply::Empty => Ok(GeneratedImage::Bytes {
                data: Vec::new(),
                content_type: "image/png".into(),
            }),
            ImageReply::Fail => Err(GenerationError::Upstream {
                status: 503,
                message: "overloaded".into(),
            }),
        }
    }

    async fn complete(&self, _prompt: &str) -> Result<String, GenerationError> {
        self.completion
            .clone()
            .ok_or(GenerationError::EmptyPayload)
    }
}

/// A running test server backed by the in-memory store and a temp directory.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub store: Arc<MemoryPlantStore>,
    pub generator: Arc<FakeGenerator>,
    _data_dir: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    pub headers: reqwest::header::HeaderMap,
    /// Raw response body.
    pub bytes: Vec<u8>,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestResponse {
    async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let headers = res.headers().clone();
        let bytes = res.bytes().await.expect("Failed to read body").to_vec();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Self {
            status,
            headers,
            bytes,
            body,
        }
    }

    pub fn text_contains(&self, needle: &str) -> bool {
        String::from_utf8_lossy(&self.bytes).contains(needle)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(FakeGenerator::new(ImageReply::Png)).await
    }

    pub async fn spawn_with(generator: FakeGenerator) -> Self {
        let data_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        let config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: addr.port(),
                public_url: Some(format!("http://{addr}")),
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig {
                url: "memory".to_string(),
                max_connections: 1,
                connect_timeout_secs: 1,
            },
            storage: StorageConfig {
                backend: StorageBackend::Filesystem,
                data_dir: data_dir.path().to_path_buf(),
                max_blob_size: 1024 * 1024,
                s3: S3Config::default(),
            },
            generator: GeneratorConfig::default(),
            suggest: SuggestConfig {
                allowed_image_hosts: vec!["upload.wikimedia.org".to_string()],
                placeholder_image_url: PLACEHOLDER.to_string(),
            },
        };

        let blobs = FilesystemBlobStore::new(
            config.storage.data_dir.clone(),
            config.storage.max_blob_size,
        )
        .await
        .expect("Failed to open blob store");
        let images = ImageStore::new(Arc::new(blobs), config.server.public_url());
        let store = Arc::new(MemoryPlantStore::new());
        let generator = Arc::new(generator);

        let state = AppState::new(config, store.clone(), generator.clone(), images);
        let app = plantdex_server::build_router(state);

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            store,
            generator,
            _data_dir: data_dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    /// Owned-path variant for building many requests at once.
    pub async fn get_owned(&self, path: String) -> TestResponse {
        self.get(&path).await
    }

    /// GET an absolute URL, as returned in `imageUrl`.
    pub async fn get_absolute(&self, url: &str, if_none_match: Option<&str>) -> TestResponse {
        let mut req = self.client.get(url);
        if let Some(etag) = if_none_match {
            req = req.header("If-None-Match", etag);
        }
        let res = req.send().await.expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn patch(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .patch(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send PATCH request");

        TestResponse::from_response(res).await
    }

    pub async fn delete(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    pub async fn upload(&self, file_name: &str, mime: &str, bytes: Vec<u8>) -> TestResponse {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime)
            .expect("Failed to set MIME type");
        let form = reqwest::multipart::Form::new().part("file", part);

        let res = self
            .client
            .post(self.url(routes::UPLOADS))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart upload request");

        TestResponse::from_response(res).await
    }

    /// Create a plant and return its id.
    pub async fn create_plant(&self, body: Value) -> i64 {
        let res = self.post(routes::PLANTS, &body).await;
        assert_eq!(res.status, 201, "Create failed: {}", res.body);
        res.body["id"].as_i64().expect("id missing")
    }
}
