//! Photo and verification-document uploads into object storage.

use std::sync::Arc;

use axum::http::StatusCode;
use mime::Mime;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::domain::{UserId, UserRole};
use crate::backend::{backend_status, BackendError, ObjectStorage, UserRepository};
use crate::config::BackendConfig;

pub const MAX_PHOTO_BYTES: usize = 10 * 1024 * 1024;
pub const MAX_DOCUMENT_BYTES: usize = 20 * 1024 * 1024;
const MAX_FILE_NAME_CHARS: usize = 100;

const PHOTO_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];
const DOCUMENT_TYPES: [&str; 3] = ["application/pdf", "image/jpeg", "image/png"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadKind {
    Photo,
    Document,
}

impl UploadKind {
    pub const fn label(self) -> &'static str {
        match self {
            UploadKind::Photo => "photo",
            UploadKind::Document => "document",
        }
    }

    pub const fn max_bytes(self) -> usize {
        match self {
            UploadKind::Photo => MAX_PHOTO_BYTES,
            UploadKind::Document => MAX_DOCUMENT_BYTES,
        }
    }

    pub fn accepts(self, content_type: &Mime) -> bool {
        let allowed: &[&str] = match self {
            UploadKind::Photo => &PHOTO_TYPES,
            UploadKind::Document => &DOCUMENT_TYPES,
        };
        allowed.contains(&content_type.essence_str())
    }
}

/// Bucket names and signed URL lifetime taken from the backend configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageBuckets {
    pub photos: String,
    pub documents: String,
    pub signed_url_ttl_secs: u64,
}

impl Default for StorageBuckets {
    fn default() -> Self {
        Self::from(&BackendConfig::default())
    }
}

impl From<&BackendConfig> for StorageBuckets {
    fn from(config: &BackendConfig) -> Self {
        Self {
            photos: config.photo_bucket.clone(),
            documents: config.document_bucket.clone(),
            signed_url_ttl_secs: config.signed_url_ttl_secs,
        }
    }
}

impl StorageBuckets {
    pub fn bucket_for(&self, kind: UploadKind) -> &str {
        match kind {
            UploadKind::Photo => &self.photos,
            UploadKind::Document => &self.documents,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub kind: UploadKind,
    /// Client-side draft the file belongs to; becomes a path segment.
    pub draft_id: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredObject {
    pub bucket: String,
    pub path: String,
    pub content_type: String,
    pub size: usize,
    /// Public URL for photos, short-lived signed URL for documents.
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedDocumentUrl {
    pub path: String,
    pub url: String,
    pub expires_in_secs: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("uploaded file is empty")]
    Empty,
    #[error("{} exceeds the {limit} byte limit ({size} bytes)", .kind.label())]
    TooLarge {
        kind: UploadKind,
        size: usize,
        limit: usize,
    },
    #[error("{content_type} is not an accepted {} type", .kind.label())]
    UnsupportedType {
        kind: UploadKind,
        content_type: String,
    },
    #[error("invalid storage path: {0}")]
    InvalidPath(String),
    #[error("file does not belong to the caller")]
    Forbidden,
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl UploadError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            UploadError::Empty | UploadError::InvalidPath(_) => StatusCode::BAD_REQUEST,
            UploadError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            UploadError::UnsupportedType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            UploadError::Forbidden => StatusCode::FORBIDDEN,
            UploadError::Backend(err) => backend_status(err),
        }
    }
}

/// Declared content type when usable, otherwise a guess from the file extension.
pub fn resolve_content_type(
    kind: UploadKind,
    declared: Option<&str>,
    file_name: &str,
) -> Result<Mime, UploadError> {
    let declared = declared
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .and_then(|raw| raw.parse::<Mime>().ok())
        .filter(|mime| *mime != mime::APPLICATION_OCTET_STREAM);
    let resolved = match declared {
        Some(mime) => mime,
        None => mime_guess::from_path(file_name).first_or_octet_stream(),
    };

    if kind.accepts(&resolved) {
        Ok(resolved)
    } else {
        Err(UploadError::UnsupportedType {
            kind,
            content_type: resolved.essence_str().to_string(),
        })
    }
}

/// Reduce a client file name to a safe final path segment.
pub fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    let mut cleaned = String::with_capacity(base.len());
    for c in base.trim().chars() {
        let mapped = if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
            c
        } else {
            '-'
        };
        if mapped == '-' && cleaned.ends_with('-') {
            continue;
        }
        cleaned.push(mapped);
    }
    let cleaned: String = cleaned
        .trim_start_matches(['.', '-'])
        .chars()
        .take(MAX_FILE_NAME_CHARS)
        .collect();
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

fn draft_segment(raw: &str) -> Result<&str, UploadError> {
    let trimmed = raw.trim();
    let valid = !trimmed.is_empty()
        && trimmed.len() <= 64
        && trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'));
    if valid {
        Ok(trimmed)
    } else {
        Err(UploadError::InvalidPath(format!("draft id '{raw}'")))
    }
}

/// Whether `path` sits under the caller's own upload prefix.
pub(crate) fn owned_by(path: &str, caller: UserId) -> bool {
    let prefix = format!("{caller}/");
    path.starts_with(&prefix) && !path.split('/').any(|segment| segment == "..")
}

pub struct UploadService {
    storage: Arc<dyn ObjectStorage>,
    users: Arc<dyn UserRepository>,
    buckets: StorageBuckets,
}

impl UploadService {
    pub fn new(
        storage: Arc<dyn ObjectStorage>,
        users: Arc<dyn UserRepository>,
        buckets: StorageBuckets,
    ) -> Self {
        Self {
            storage,
            users,
            buckets,
        }
    }

    pub fn buckets(&self) -> &StorageBuckets {
        &self.buckets
    }

    pub async fn upload(
        &self,
        caller: UserId,
        request: UploadRequest,
    ) -> Result<StoredObject, UploadError> {
        let kind = request.kind;
        let size = request.bytes.len();
        if size == 0 {
            return Err(UploadError::Empty);
        }
        if size > kind.max_bytes() {
            return Err(UploadError::TooLarge {
                kind,
                size,
                limit: kind.max_bytes(),
            });
        }
        let content_type =
            resolve_content_type(kind, request.content_type.as_deref(), &request.file_name)?;
        let draft = draft_segment(&request.draft_id)?;

        let path = format!(
            "{caller}/{draft}/{}/{}-{}",
            kind.label(),
            Uuid::new_v4().simple(),
            sanitize_file_name(&request.file_name)
        );
        let bucket = self.buckets.bucket_for(kind).to_string();
        self.storage
            .upload(&bucket, &path, request.bytes, content_type.essence_str())
            .await?;

        let url = match kind {
            UploadKind::Photo => self.storage.public_url(&bucket, &path),
            UploadKind::Document => {
                self.storage
                    .signed_url(&bucket, &path, self.buckets.signed_url_ttl_secs)
                    .await?
            }
        };
        info!(host = %caller, kind = kind.label(), size, %path, "file uploaded");

        Ok(StoredObject {
            bucket,
            path,
            content_type: content_type.essence_str().to_string(),
            size,
            url,
        })
    }

    /// Delete an object the caller uploaded.
    pub async fn remove(
        &self,
        caller: UserId,
        kind: UploadKind,
        path: &str,
    ) -> Result<(), UploadError> {
        if !owned_by(path, caller) {
            return Err(UploadError::Forbidden);
        }
        let bucket = self.buckets.bucket_for(kind);
        self.storage.remove(bucket, &[path.to_string()]).await?;
        info!(host = %caller, kind = kind.label(), %path, "file removed");
        Ok(())
    }

    /// Signed link to a private verification document for its owner or an admin.
    pub async fn signed_document_url(
        &self,
        caller: UserId,
        path: &str,
    ) -> Result<SignedDocumentUrl, UploadError> {
        if !owned_by(path, caller) {
            let is_admin = self
                .users
                .fetch(caller)
                .await?
                .is_some_and(|profile| profile.role == UserRole::Admin);
            if !is_admin || path.split('/').any(|segment| segment == "..") {
                return Err(UploadError::Forbidden);
            }
        }
        let ttl = self.buckets.signed_url_ttl_secs;
        let url = self
            .storage
            .signed_url(&self.buckets.documents, path, ttl)
            .await?;
        Ok(SignedDocumentUrl {
            path: path.to_string(),
            url,
            expires_in_secs: ttl,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{InMemoryBackend, InMemoryStorage};
    use crate::listings::fixtures::{host_id, user};

    fn service() -> (UploadService, Arc<InMemoryStorage>, Arc<InMemoryBackend>) {
        let storage = Arc::new(InMemoryStorage::default());
        let backend = Arc::new(InMemoryBackend::default());
        let service = UploadService::new(
            storage.clone(),
            backend.clone(),
            StorageBuckets::default(),
        );
        (service, storage, backend)
    }

    fn request(kind: UploadKind, file_name: &str, bytes: usize) -> UploadRequest {
        UploadRequest {
            kind,
            draft_id: "draft-7".to_string(),
            file_name: file_name.to_string(),
            content_type: None,
            bytes: vec![0xAB; bytes],
        }
    }

    #[test]
    fn sanitizes_client_file_names() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(
            sanitize_file_name("C:\\Users\\me\\Living Room (1).JPG"),
            "Living-Room-1-.JPG"
        );
        assert_eq!(sanitize_file_name("..."), "file");
    }

    #[test]
    fn content_type_is_guessed_from_extension() {
        let mime = resolve_content_type(UploadKind::Photo, None, "pool.webp").unwrap();
        assert_eq!(mime.essence_str(), "image/webp");

        let pdf = resolve_content_type(
            UploadKind::Document,
            Some("application/octet-stream"),
            "deed.pdf",
        )
        .unwrap();
        assert_eq!(pdf.essence_str(), "application/pdf");

        assert!(matches!(
            resolve_content_type(UploadKind::Photo, Some("application/pdf"), "deed.pdf"),
            Err(UploadError::UnsupportedType { .. })
        ));
    }

    #[tokio::test]
    async fn photo_upload_lands_under_host_prefix() {
        let (service, storage, _) = service();
        let host = host_id();
        let stored = service
            .upload(host, request(UploadKind::Photo, "Front Door.jpg", 2048))
            .await
            .unwrap();

        assert_eq!(stored.bucket, "property-photos");
        assert!(stored.path.starts_with(&format!("{host}/draft-7/photo/")));
        assert!(stored.path.ends_with("-Front-Door.jpg"));
        assert!(stored.url.contains("/object/public/property-photos/"));
        assert_eq!(
            storage.object("property-photos", &stored.path).unwrap().content_type,
            "image/jpeg"
        );
    }

    #[tokio::test]
    async fn size_limits_depend_on_kind() {
        let (service, _, _) = service();
        let host = host_id();
        let err = service
            .upload(host, request(UploadKind::Photo, "big.png", MAX_PHOTO_BYTES + 1))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);

        let empty = service
            .upload(host, request(UploadKind::Document, "id.pdf", 0))
            .await
            .unwrap_err();
        assert!(matches!(empty, UploadError::Empty));
    }

    #[tokio::test]
    async fn only_owner_can_remove() {
        let (service, storage, _) = service();
        let host = host_id();
        let stored = service
            .upload(host, request(UploadKind::Photo, "a.png", 10))
            .await
            .unwrap();

        let err = service
            .remove(host_id(), UploadKind::Photo, &stored.path)
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Forbidden));

        service
            .remove(host, UploadKind::Photo, &stored.path)
            .await
            .unwrap();
        assert_eq!(storage.object_count(), 0);
    }

    #[tokio::test]
    async fn admins_can_sign_any_document() {
        let (service, _, backend) = service();
        let host = host_id();
        let stored = service
            .upload(host, request(UploadKind::Document, "deed.pdf", 64))
            .await
            .unwrap();
        assert!(stored.url.contains("/object/sign/property-documents/"));

        let stranger = host_id();
        assert!(matches!(
            service.signed_document_url(stranger, &stored.path).await,
            Err(UploadError::Forbidden)
        ));

        let admin = user(UserRole::Admin, "admin@example.test");
        backend.seed_user(admin.clone()).unwrap();
        let signed = service
            .signed_document_url(admin.id, &stored.path)
            .await
            .unwrap();
        assert_eq!(signed.expires_in_secs, 3600);
    }
}
