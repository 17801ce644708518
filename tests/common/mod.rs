#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tower::ServiceExt;

use bourbon_admin::config::{Config, DatabaseConfig, ServerConfig, StorageConfig};
use bourbon_admin::{create_router, AppState};

pub const BOUNDARY: &str = "----bourbon-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub dir: TempDir,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

/// A multipart part: (name, filename, content)
pub type Part<'a> = (&'a str, Option<&'a str>, &'a [u8]);

impl TestApp {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            server: ServerConfig::default(),
            database: DatabaseConfig {
                path: dir.path().join("bourbon.db").to_string_lossy().into_owned(),
                max_connections: 2,
            },
            storage: StorageConfig {
                files_dir: dir.path().join("file_uploads").to_string_lossy().into_owned(),
                partners_dir: dir.path().join("uploads").to_string_lossy().into_owned(),
            },
        };
        let state = AppState::new(config).await.unwrap();
        let router = create_router(state.clone());
        Self { router, state, dir }
    }

    pub fn files_dir(&self) -> PathBuf {
        self.dir.path().join("file_uploads")
    }

    pub fn partners_dir(&self) -> PathBuf {
        self.dir.path().join("uploads")
    }

    pub async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        TestResponse {
            status,
            headers,
            body: body.to_vec(),
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.send(
            Request::builder()
                .method("DELETE")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn multipart(&self, method: &str, uri: &str, parts: &[Part<'_>]) -> TestResponse {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(multipart_body(parts)))
                .unwrap(),
        )
        .await
    }

    pub async fn json(&self, method: &str, uri: &str, body: Value) -> TestResponse {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// GET a resource list and return it as a JSON array
    pub async fn list(&self, uri: &str) -> Vec<Value> {
        let response = self.get(uri).await;
        assert_eq!(response.status, StatusCode::OK);
        response.json().as_array().unwrap().clone()
    }
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, content) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match filename {
            Some(f) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                    name, f
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
            ),
        }
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn count_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}
