//! Multipart ingestion: turns one request body into text fields and stored files.
//!
//! File parts are streamed straight into a [`BlobStore`] while the body is parsed,
//! so once [`ingest`] returns every uploaded blob already exists on disk. Callers
//! that fail to commit a record afterwards must hand the result back through
//! [`Ingested::discard`].

use axum::{
    extract::{multipart::Field, FromRequest, Multipart, Request},
    http::header,
    Json,
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{AppError, Result};
use crate::storage::BlobStore;

/// One part of a multipart body
pub enum RequestPart<'a> {
    Field {
        name: String,
        value: String,
    },
    File {
        name: String,
        original_filename: String,
        stream: Field<'a>,
    },
}

/// Read the next part. A part carrying a filename is a file, everything else is a field.
pub async fn next_part(multipart: &mut Multipart) -> Result<Option<RequestPart<'_>>> {
    let Some(field) = multipart.next_field().await.map_err(malformed)? else {
        return Ok(None);
    };

    let name = field.name().unwrap_or("").to_string();
    match field.file_name().map(|s| s.to_string()) {
        Some(original_filename) => Ok(Some(RequestPart::File {
            name,
            original_filename,
            stream: field,
        })),
        None => {
            let value = field.text().await.map_err(malformed)?;
            Ok(Some(RequestPart::Field { name, value }))
        }
    }
}

fn malformed(e: impl std::fmt::Display) -> AppError {
    AppError::Validation(format!("Malformed multipart body: {}", e))
}

/// A file part that has been written to the blob store
#[derive(Debug, Clone)]
pub struct FileHandle {
    pub original_filename: String,
    /// Unique name assigned by the store
    pub stored_name: String,
    pub stored_path: PathBuf,
    pub size: u64,
}

impl FileHandle {
    /// Store-assigned name first, client name second
    pub fn resolved_name(&self) -> Option<&str> {
        [self.stored_name.as_str(), self.original_filename.as_str()]
            .into_iter()
            .find(|name| !name.is_empty())
    }

    /// Name shown to users
    pub fn display_name(&self) -> Option<&str> {
        if self.original_filename.is_empty() {
            self.resolved_name()
        } else {
            Some(&self.original_filename)
        }
    }
}

/// Parsed request body
#[derive(Debug, Default)]
pub struct Ingested {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, FileHandle>,
}

impl Ingested {
    /// First field present under any of `aliases`
    pub fn field(&self, aliases: &[&str]) -> Option<&str> {
        aliases
            .iter()
            .find_map(|alias| self.fields.get(*alias))
            .map(|s| s.as_str())
    }

    /// The uploaded file, if any. A file under a part name outside `aliases` is rejected
    /// so it cannot be left behind without a record.
    pub fn file(&self, aliases: &[&str]) -> Result<Option<&FileHandle>> {
        if let Some(name) = self.files.keys().find(|name| !aliases.contains(&name.as_str())) {
            return Err(AppError::Validation(format!(
                "Unexpected file part '{}'",
                name
            )));
        }
        Ok(aliases.iter().find_map(|alias| self.files.get(*alias)))
    }

    /// Remove every blob written while parsing this body
    pub async fn discard(self, store: &BlobStore) {
        for (_, file) in self.files {
            tracing::info!(
                "Discarding uncommitted upload {:?} ({})",
                file.stored_path,
                file.original_filename
            );
            store.discard(&file.stored_path).await;
        }
    }
}

/// Parse a multipart body, streaming file parts into `store`.
///
/// At most one file part is accepted. Parts whose filename is empty (a form
/// submitted without choosing a file) are skipped. On any failure the blobs
/// written so far are removed.
pub async fn ingest(mut multipart: Multipart, store: &BlobStore) -> Result<Ingested> {
    let mut ingested = Ingested::default();

    let parsed: Result<()> = async {
        while let Some(part) = next_part(&mut multipart).await? {
            match part {
                RequestPart::Field { name, value } => {
                    ingested.fields.insert(name, value);
                }
                RequestPart::File {
                    name,
                    original_filename,
                    stream,
                } => {
                    if original_filename.is_empty() {
                        continue;
                    }
                    if !ingested.files.is_empty() {
                        return Err(AppError::Validation(
                            "Only one file may be uploaded per request".to_string(),
                        ));
                    }

                    let blob = store.store(stream, &original_filename).await?;
                    ingested.files.insert(
                        name,
                        FileHandle {
                            original_filename,
                            stored_name: blob.stored_name,
                            stored_path: blob.path,
                            size: blob.size,
                        },
                    );
                }
            }
        }
        Ok(())
    }
    .await;

    if let Err(e) = parsed {
        ingested.discard(store).await;
        return Err(e);
    }

    tracing::debug!(
        "Parsed fields: {:?}, files: {:?}",
        ingested.fields.keys().collect::<Vec<_>>(),
        ingested.files.values().map(|f| &f.stored_path).collect::<Vec<_>>()
    );
    Ok(ingested)
}

/// Parse an update body: multipart goes through [`ingest`], a JSON object becomes fields.
pub async fn parse_update_body(req: Request, store: &BlobStore) -> Result<Ingested> {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();

    if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(req, &()).await.map_err(malformed)?;
        return ingest(multipart, store).await;
    }

    if content_type.contains("json") {
        let Json(object) = Json::<Map<String, Value>>::from_request(req, &())
            .await
            .map_err(|e| AppError::Validation(format!("Invalid JSON body: {}", e)))?;
        return Ok(Ingested {
            fields: json_fields(object),
            files: HashMap::new(),
        });
    }

    Err(AppError::Validation(
        "Expected a JSON or multipart/form-data body".to_string(),
    ))
}

fn json_fields(object: Map<String, Value>) -> HashMap<String, String> {
    object
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::Null => None,
            Value::String(s) => Some((key, s)),
            other => Some((key, other.to_string())),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;

    const BOUNDARY: &str = "XBOUNDARYX";

    fn multipart_request(parts: &[(&str, Option<&str>, &str)]) -> Request {
        let mut body = String::new();
        for (name, filename, content) in parts {
            body.push_str(&format!("--{}\r\n", BOUNDARY));
            match filename {
                Some(f) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                    name, f
                )),
                None => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                    name
                )),
            }
            body.push_str(content);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{}--\r\n", BOUNDARY));

        HttpRequest::builder()
            .method("POST")
            .uri("/")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn multipart_of(req: Request) -> Multipart {
        Multipart::from_request(req, &()).await.unwrap()
    }

    fn count_files(dir: &std::path::Path) -> usize {
        std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }

    #[tokio::test]
    async fn test_fields_and_file_are_separated() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::new(dir.path());
        let req = multipart_request(&[
            ("name", None, "Acme"),
            ("logo", Some("logo.png"), "PNGDATA"),
        ]);

        let ingested = ingest(multipart_of(req).await, &store).await.unwrap();

        assert_eq!(ingested.field(&["name"]), Some("Acme"));
        let logo = ingested.file(&["logo"]).unwrap().unwrap();
        assert_eq!(logo.original_filename, "logo.png");
        assert_eq!(logo.size, 7);
        assert!(logo.stored_name.ends_with("-logo.png"));
        assert_eq!(std::fs::read(&logo.stored_path).unwrap(), b"PNGDATA");
    }

    #[tokio::test]
    async fn test_empty_filename_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::new(dir.path());
        let req = multipart_request(&[("nom", None, "Acme"), ("fileupload", Some(""), "")]);

        let ingested = ingest(multipart_of(req).await, &store).await.unwrap();

        assert!(ingested.files.is_empty());
        assert_eq!(ingested.field(&["name", "nom"]), Some("Acme"));
        assert_eq!(count_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_second_file_is_rejected_and_first_removed() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::new(dir.path());
        let req = multipart_request(&[
            ("file", Some("a.txt"), "a"),
            ("file", Some("b.txt"), "b"),
        ]);

        let err = ingest(multipart_of(req).await, &store).await.unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(count_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_truncated_body_is_a_client_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::new(dir.path());
        let body = format!(
            "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"a.txt\"\r\n\r\nabc",
            BOUNDARY
        );
        let req = HttpRequest::builder()
            .method("POST")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();

        let err = ingest(multipart_of(req).await, &store).await.unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(count_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_unexpected_file_part_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::new(dir.path());
        let req = multipart_request(&[("attachment", Some("a.txt"), "a")]);

        let ingested = ingest(multipart_of(req).await, &store).await.unwrap();
        assert!(ingested.file(&["file"]).is_err());

        ingested.discard(&store).await;
        assert_eq!(count_files(dir.path()), 0);
    }

    #[test]
    fn test_resolved_name_prefers_stored_name() {
        let mut handle = FileHandle {
            original_filename: "report.pdf".to_string(),
            stored_name: "1700000000000-report.pdf".to_string(),
            stored_path: PathBuf::from("/up/1700000000000-report.pdf"),
            size: 3,
        };
        assert_eq!(handle.resolved_name(), Some("1700000000000-report.pdf"));
        assert_eq!(handle.display_name(), Some("report.pdf"));

        handle.stored_name.clear();
        assert_eq!(handle.resolved_name(), Some("report.pdf"));

        handle.original_filename.clear();
        assert_eq!(handle.resolved_name(), None);
        assert_eq!(handle.display_name(), None);
    }

    #[tokio::test]
    async fn test_json_update_body() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::new(dir.path());
        let req = HttpRequest::builder()
            .method("PUT")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"id":"abc","newFileName":"b.pdf","size":3,"x":null}"#))
            .unwrap();

        let ingested = parse_update_body(req, &store).await.unwrap();

        assert_eq!(ingested.field(&["id"]), Some("abc"));
        assert_eq!(ingested.field(&["newFileName"]), Some("b.pdf"));
        assert_eq!(ingested.field(&["size"]), Some("3"));
        assert_eq!(ingested.field(&["x"]), None);
    }

    #[tokio::test]
    async fn test_update_body_without_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::new(dir.path());
        let req = HttpRequest::builder().method("PUT").body(Body::empty()).unwrap();

        let err = parse_update_body(req, &store).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
