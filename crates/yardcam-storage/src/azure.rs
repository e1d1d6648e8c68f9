//! Azure Blob Storage backend
//!
//! Blob writes go through `object_store`. Container administration (create, set ACL) is not
//! part of the `object_store` API, so those two calls are issued directly with `reqwest` and
//! signed with the account's shared key.

use crate::connection_string::AzureConnectionString;
use crate::keys::{validate_blob_name, validate_container_name};
use crate::traits::{BlobMetadata, BlobStore, ContainerStatus, StorageError, StorageResult};
use crate::{PublicAccess, StorageBackend};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use bytes::Bytes;
use hmac::{Hmac, Mac};
use object_store::azure::MicrosoftAzureBuilder;
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, AttributeValue, Attributes, ObjectStore, PutOptions, PutPayload, RetryConfig,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_LENGTH};
use reqwest::StatusCode;
use sha2::Sha256;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use url::Url;

const AZURE_API_VERSION: &str = "2021-08-06";
const ERROR_CODE_HEADER: &str = "x-ms-error-code";
const PUBLIC_ACCESS_HEADER: &str = "x-ms-blob-public-access";
const ADMIN_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

type HmacSha256 = Hmac<Sha256>;

/// Azure Blob Storage implementation
pub struct AzureBlobStorage {
    account: AzureConnectionString,
    key_bytes: Vec<u8>,
    http: reqwest::Client,
    stores: RwLock<HashMap<String, Arc<dyn ObjectStore>>>,
}

impl AzureBlobStorage {
    pub fn new(account: AzureConnectionString) -> StorageResult<Self> {
        let key_bytes = general_purpose::STANDARD
            .decode(&account.account_key)
            .map_err(|e| StorageError::ConfigError(format!("AccountKey is not base64: {}", e)))?;

        let http = reqwest::Client::builder()
            .timeout(ADMIN_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StorageError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(AzureBlobStorage {
            account,
            key_bytes,
            http,
            stores: RwLock::new(HashMap::new()),
        })
    }

    pub fn from_connection_string(connection_string: &str) -> StorageResult<Self> {
        let account = AzureConnectionString::parse(connection_string)
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;
        Self::new(account)
    }

    /// Public URL of a blob: `{blob_endpoint}/{container}/{key}`
    pub fn blob_url(&self, container: &str, key: &str) -> String {
        format!("{}/{}/{}", self.account.blob_endpoint, container, key)
    }

    /// Object store client scoped to one container, built on first use.
    async fn store_for(&self, container: &str) -> StorageResult<Arc<dyn ObjectStore>> {
        if let Some(store) = self.stores.read().await.get(container) {
            return Ok(store.clone());
        }

        // Retries are driven by the upload service's policy, not the client
        let retry = RetryConfig {
            max_retries: 0,
            ..Default::default()
        };

        let store = MicrosoftAzureBuilder::new()
            .with_account(self.account.account_name.clone())
            .with_access_key(self.account.account_key.clone())
            .with_container_name(container)
            .with_endpoint(self.account.blob_endpoint.clone())
            .with_allow_http(self.account.allows_http())
            .with_retry(retry)
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        let store: Arc<dyn ObjectStore> = Arc::new(store);
        let mut stores = self.stores.write().await;
        Ok(stores
            .entry(container.to_string())
            .or_insert(store)
            .clone())
    }

    async fn send_container_request(
        &self,
        container: &str,
        query: &[(&str, &str)],
        access: PublicAccess,
    ) -> StorageResult<reqwest::Response> {
        let mut url = Url::parse(&format!("{}/{}", self.account.blob_endpoint, container))
            .map_err(|e| StorageError::ConfigError(format!("Invalid container URL: {}", e)))?;
        for (name, value) in query {
            url.query_pairs_mut().append_pair(name, value);
        }

        let mut ms_headers = BTreeMap::new();
        ms_headers.insert(
            "x-ms-date".to_string(),
            chrono::Utc::now()
                .format("%a, %d %b %Y %H:%M:%S GMT")
                .to_string(),
        );
        ms_headers.insert("x-ms-version".to_string(), AZURE_API_VERSION.to_string());
        if let Some(value) = access.header_value() {
            ms_headers.insert(PUBLIC_ACCESS_HEADER.to_string(), value.to_string());
        }

        let signature = shared_key_signature(
            &self.account.account_name,
            &self.key_bytes,
            "PUT",
            &url,
            &ms_headers,
        );

        let mut headers = HeaderMap::new();
        for (name, value) in &ms_headers {
            headers.insert(
                HeaderName::from_bytes(name.as_bytes())
                    .map_err(|e| StorageError::ConfigError(e.to_string()))?,
                HeaderValue::from_str(value)
                    .map_err(|e| StorageError::ConfigError(e.to_string()))?,
            );
        }
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!(
                "SharedKey {}:{}",
                self.account.account_name, signature
            ))
            .map_err(|e| StorageError::ConfigError(e.to_string()))?,
        );
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("0"));

        self.http
            .put(url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| StorageError::BackendError(format!("Container request failed: {}", e)))
    }

    /// Set the container's public access level. Used when the container already existed and
    /// may have been created with a different level.
    async fn apply_public_access(&self, container: &str, access: PublicAccess) {
        let result = self
            .send_container_request(
                container,
                &[("restype", "container"), ("comp", "acl")],
                access,
            )
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(container = %container, "Container access level applied");
            }
            Ok(response) => {
                tracing::warn!(
                    container = %container,
                    status = %response.status(),
                    error_code = error_code(&response).unwrap_or_default(),
                    "Failed to apply container access level"
                );
            }
            Err(e) => {
                tracing::warn!(
                    container = %container,
                    error = %e,
                    "Failed to apply container access level"
                );
            }
        }
    }
}

fn error_code(response: &reqwest::Response) -> Option<&str> {
    response
        .headers()
        .get(ERROR_CODE_HEADER)
        .and_then(|v| v.to_str().ok())
}

/// Compute the SharedKey signature for a body-less request.
///
/// `ms_headers` holds every `x-ms-*` header sent with the request, keyed by lowercase name.
pub(crate) fn shared_key_signature(
    account: &str,
    key: &[u8],
    method: &str,
    url: &Url,
    ms_headers: &BTreeMap<String, String>,
) -> String {
    // Content-Encoding through Range: all empty, Content-Length included since it is zero
    let mut string_to_sign = format!("{}\n", method);
    string_to_sign.push_str(&"\n".repeat(11));

    for (name, value) in ms_headers {
        string_to_sign.push_str(&format!("{}:{}\n", name, value.trim()));
    }

    string_to_sign.push_str(&format!("/{}{}", account, url.path()));
    let query: BTreeMap<String, String> = url
        .query_pairs()
        .map(|(k, v)| (k.to_lowercase(), v.into_owned()))
        .collect();
    for (name, value) in query {
        string_to_sign.push_str(&format!("\n{}:{}", name, value));
    }

    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key size");
    mac.update(string_to_sign.as_bytes());
    general_purpose::STANDARD.encode(mac.finalize().into_bytes())
}

fn put_options(content_type: &str, metadata: &BlobMetadata) -> PutOptions {
    let mut attributes = Attributes::new();
    attributes.insert(
        Attribute::ContentType,
        AttributeValue::from(content_type.to_string()),
    );
    for (key, value) in metadata {
        attributes.insert(
            Attribute::Metadata(Cow::Owned(key.clone())),
            AttributeValue::from(value.clone()),
        );
    }

    PutOptions {
        attributes,
        ..Default::default()
    }
}

/// Only failures of the transport or the service itself stay retryable.
fn map_put_error(err: ObjectStoreError, key: &str) -> StorageError {
    match err {
        ObjectStoreError::PermissionDenied { .. } | ObjectStoreError::Unauthenticated { .. } => {
            StorageError::AccessDenied(err.to_string())
        }
        ObjectStoreError::InvalidPath { .. } => StorageError::InvalidKey(key.to_string()),
        ObjectStoreError::NotFound { .. } => StorageError::ContainerFailed(err.to_string()),
        ObjectStoreError::AlreadyExists { .. }
        | ObjectStoreError::Precondition { .. }
        | ObjectStoreError::NotModified { .. } => StorageError::Conflict(err.to_string()),
        ObjectStoreError::NotSupported { .. }
        | ObjectStoreError::NotImplemented { .. }
        | ObjectStoreError::UnknownConfigurationKey { .. } => {
            StorageError::ConfigError(err.to_string())
        }
        other => StorageError::UploadFailed(other.to_string()),
    }
}

#[async_trait]
impl BlobStore for AzureBlobStorage {
    async fn ensure_container(
        &self,
        container: &str,
        access: PublicAccess,
    ) -> StorageResult<ContainerStatus> {
        validate_container_name(container)?;

        let response = self
            .send_container_request(container, &[("restype", "container")], access)
            .await?;
        let status = response.status();

        match status {
            StatusCode::CREATED => {
                tracing::info!(
                    container = %container,
                    access = ?access,
                    "Azure container created"
                );
                Ok(ContainerStatus::Created)
            }
            StatusCode::CONFLICT
                if matches!(error_code(&response), None | Some("ContainerAlreadyExists")) =>
            {
                tracing::debug!(container = %container, "Azure container already exists");
                self.apply_public_access(container, access).await;
                Ok(ContainerStatus::AlreadyExists)
            }
            StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => Err(StorageError::AccessDenied(
                format!(
                    "Container create rejected ({}): {}",
                    status,
                    error_code(&response).unwrap_or_default()
                ),
            )),
            _ if status.is_server_error() => Err(StorageError::BackendError(format!(
                "Container create failed ({}): {}",
                status,
                error_code(&response).unwrap_or_default()
            ))),
            _ => Err(StorageError::ContainerFailed(format!(
                "Container create failed ({}): {}",
                status,
                error_code(&response).unwrap_or_default()
            ))),
        }
    }

    async fn put_blob(
        &self,
        container: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
        metadata: &BlobMetadata,
    ) -> StorageResult<String> {
        validate_blob_name(key)?;
        let location =
            Path::parse(key).map_err(|e| StorageError::InvalidKey(format!("{}: {}", key, e)))?;
        let store = self.store_for(container).await?;
        let size = data.len();
        let start = std::time::Instant::now();

        store
            .put_opts(
                &location,
                PutPayload::from(data),
                put_options(content_type, metadata),
            )
            .await
            .map_err(|e| map_put_error(e, key))?;

        let url = self.blob_url(container, key);

        tracing::info!(
            container = %container,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Azure blob upload successful"
        );

        Ok(url)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Azure
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection_string::DEV_STORE_ACCOUNT;
    use std::sync::Mutex;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const DEV_KEY: &str =
        "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";

    fn fixed_headers() -> BTreeMap<String, String> {
        let mut headers = BTreeMap::new();
        headers.insert(
            "x-ms-date".to_string(),
            "Mon, 19 Oct 2026 12:00:00 GMT".to_string(),
        );
        headers.insert("x-ms-version".to_string(), AZURE_API_VERSION.to_string());
        headers.insert(PUBLIC_ACCESS_HEADER.to_string(), "blob".to_string());
        headers
    }

    #[test]
    fn signs_create_container_request() {
        let key = general_purpose::STANDARD.decode(DEV_KEY).unwrap();
        let url = Url::parse(
            "http://127.0.0.1:10000/devstoreaccount1/yard-images?restype=container",
        )
        .unwrap();

        let signature = shared_key_signature(DEV_STORE_ACCOUNT, &key, "PUT", &url, &fixed_headers());
        assert_eq!(signature, "6lvO6cfRhH+pZY/X9GT8EDeoBQngyw8qmQHp3a5esbQ=");
    }

    #[test]
    fn signs_query_parameters_in_sorted_order() {
        let key = general_purpose::STANDARD.decode(DEV_KEY).unwrap();
        let url = Url::parse(
            "http://127.0.0.1:10000/devstoreaccount1/yard-images?restype=container&comp=acl",
        )
        .unwrap();

        let signature = shared_key_signature(DEV_STORE_ACCOUNT, &key, "PUT", &url, &fixed_headers());
        assert_eq!(signature, "jvbnzxqilGo8mWD8unNSvOGcCBowOXD5iQVp3O4FAVk=");
    }

    #[test]
    fn put_options_carry_content_type_and_metadata() {
        let mut metadata = BlobMetadata::new();
        metadata.insert("userId".to_string(), "user_42".to_string());

        let opts = put_options("image/jpeg", &metadata);
        let content_type: &str = opts.attributes.get(&Attribute::ContentType).unwrap().as_ref();
        assert_eq!(content_type, "image/jpeg");
        let user: &str = opts
            .attributes
            .get(&Attribute::Metadata(Cow::Borrowed("userId")))
            .unwrap()
            .as_ref();
        assert_eq!(user, "user_42");
    }

    fn source(message: &str) -> Box<dyn std::error::Error + Send + Sync> {
        Box::new(std::io::Error::other(message.to_string()))
    }

    #[test]
    fn put_errors_split_into_transient_and_permanent() {
        let path = || "patio.jpg".to_string();
        let cases = vec![
            (
                ObjectStoreError::Generic {
                    store: "MicrosoftAzure",
                    source: source("connection reset"),
                },
                true,
            ),
            (
                ObjectStoreError::NotFound {
                    path: path(),
                    source: source("ContainerNotFound"),
                },
                false,
            ),
            (
                ObjectStoreError::AlreadyExists {
                    path: path(),
                    source: source("BlobAlreadyExists"),
                },
                false,
            ),
            (
                ObjectStoreError::Precondition {
                    path: path(),
                    source: source("ConditionNotMet"),
                },
                false,
            ),
            (
                ObjectStoreError::NotSupported {
                    source: source("tags"),
                },
                false,
            ),
            (
                ObjectStoreError::UnknownConfigurationKey {
                    store: "MicrosoftAzure",
                    key: "azure_bogus".to_string(),
                },
                false,
            ),
            (
                ObjectStoreError::PermissionDenied {
                    path: path(),
                    source: source("AuthorizationPermissionMismatch"),
                },
                false,
            ),
            (
                ObjectStoreError::Unauthenticated {
                    path: path(),
                    source: source("AuthenticationFailed"),
                },
                false,
            ),
        ];

        for (err, transient) in cases {
            let description = err.to_string();
            let mapped = map_put_error(err, "patio.jpg");
            assert_eq!(
                mapped.is_transient(),
                transient,
                "{} mapped to {:?}",
                description,
                mapped
            );
        }
    }

    #[test]
    fn missing_container_and_conflicts_map_to_permanent_variants() {
        let not_found = map_put_error(
            ObjectStoreError::NotFound {
                path: "patio.jpg".to_string(),
                source: source("ContainerNotFound"),
            },
            "patio.jpg",
        );
        assert!(matches!(not_found, StorageError::ContainerFailed(_)));

        let conflict = map_put_error(
            ObjectStoreError::Precondition {
                path: "patio.jpg".to_string(),
                source: source("ConditionNotMet"),
            },
            "patio.jpg",
        );
        assert!(matches!(conflict, StorageError::Conflict(_)));
    }

    #[test]
    fn blob_url_joins_endpoint_container_and_key() {
        let storage = AzureBlobStorage::from_connection_string(
            "DefaultEndpointsProtocol=https;AccountName=yardphotos;AccountKey=c2VjcmV0;EndpointSuffix=core.windows.net",
        )
        .unwrap();
        assert_eq!(
            storage.blob_url("yard-images", "user_1_1_a.jpg"),
            "https://yardphotos.blob.core.windows.net/yard-images/user_1_1_a.jpg"
        );
    }

    #[test]
    fn rejects_non_base64_account_key() {
        let result = AzureBlobStorage::from_connection_string("AccountName=acct;AccountKey=***");
        assert!(matches!(result, Err(StorageError::ConfigError(_))));
    }

    /// Minimal HTTP responder: answers each connection with the next scripted response and
    /// records the request head it received.
    async fn spawn_blob_service(responses: Vec<&'static str>) -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorded = seen.clone();

        tokio::spawn(async move {
            for response in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = socket.read(&mut chunk).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                }
                recorded
                    .lock()
                    .unwrap()
                    .push(String::from_utf8_lossy(&buf).to_ascii_lowercase());
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.ok();
            }
        });

        let connection_string = format!(
            "AccountName={};AccountKey={};BlobEndpoint=http://{}/{}",
            DEV_STORE_ACCOUNT, DEV_KEY, addr, DEV_STORE_ACCOUNT
        );
        (connection_string, seen)
    }

    const CREATED: &str =
        "HTTP/1.1 201 Created\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
    const ALREADY_EXISTS: &str = "HTTP/1.1 409 Conflict\r\nx-ms-error-code: ContainerAlreadyExists\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
    const ACL_OK: &str = "HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
    const ACL_FAILED: &str =
        "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
    const FORBIDDEN: &str = "HTTP/1.1 403 Forbidden\r\nx-ms-error-code: AuthenticationFailed\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";

    #[tokio::test]
    async fn ensure_container_creates_with_public_blob_access() {
        let (conn, seen) = spawn_blob_service(vec![CREATED]).await;
        let storage = AzureBlobStorage::from_connection_string(&conn).unwrap();

        let status = storage
            .ensure_container("yard-images", PublicAccess::Blob)
            .await
            .unwrap();
        assert_eq!(status, ContainerStatus::Created);

        let requests = seen.lock().unwrap().clone();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].starts_with("put /devstoreaccount1/yard-images?restype=container "));
        assert!(requests[0].contains("x-ms-blob-public-access: blob"));
        assert!(requests[0].contains("authorization: sharedkey devstoreaccount1:"));
    }

    #[tokio::test]
    async fn existing_container_is_success_and_reapplies_access() {
        let (conn, seen) = spawn_blob_service(vec![ALREADY_EXISTS, ACL_OK]).await;
        let storage = AzureBlobStorage::from_connection_string(&conn).unwrap();

        let status = storage
            .ensure_container("yard-images", PublicAccess::Blob)
            .await
            .unwrap();
        assert_eq!(status, ContainerStatus::AlreadyExists);

        let requests = seen.lock().unwrap().clone();
        assert_eq!(requests.len(), 2);
        assert!(requests[1].contains("comp=acl"));
    }

    #[tokio::test]
    async fn failed_acl_update_does_not_fail_ensure() {
        let (conn, _) = spawn_blob_service(vec![ALREADY_EXISTS, ACL_FAILED]).await;
        let storage = AzureBlobStorage::from_connection_string(&conn).unwrap();

        let status = storage
            .ensure_container("yard-images", PublicAccess::Blob)
            .await
            .unwrap();
        assert_eq!(status, ContainerStatus::AlreadyExists);
    }

    #[tokio::test]
    async fn rejected_credentials_are_access_denied() {
        let (conn, _) = spawn_blob_service(vec![FORBIDDEN]).await;
        let storage = AzureBlobStorage::from_connection_string(&conn).unwrap();

        let err = storage
            .ensure_container("yard-images", PublicAccess::Blob)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::AccessDenied(_)));
        assert!(!err.is_transient());
    }
}
