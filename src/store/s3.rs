//! S3-compatible object store
//!
//! Works against AWS S3 and S3-compatible services (MinIO, R2, Ceph) via a
//! custom endpoint. The SDK is async; each store call drives it to
//! completion on an owned current-thread runtime so callers stay
//! synchronous.
//!
//! Namespaces map to buckets, unless a single `bucket` is configured, in
//! which case each namespace becomes a `<namespace>/` prefix inside it.

use std::path::PathBuf;
use std::sync::Arc;

use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tokio::runtime::Runtime;
use tracing::{debug, info};

use super::{Backend, ObjectEntry, ObjectStore};
use crate::config::settings::S3Settings;
use crate::error::{VaultError, VaultResult};

/// Backend for an S3-compatible service
pub struct S3Backend {
    client: Client,
    runtime: Arc<Runtime>,
    shared_bucket: Option<String>,
}

impl S3Backend {
    /// Build a client from settings. No request is made until a store is used.
    pub fn connect(settings: &S3Settings) -> VaultResult<Self> {
        let access_key_id = resolve_secret(
            settings.access_key_id.as_deref(),
            settings.access_key_id_path.as_ref(),
            "AWS_ACCESS_KEY_ID",
        )?
        .ok_or_else(|| VaultError::Config("S3 access key id is not configured".into()))?;

        let secret_access_key = resolve_secret(
            settings.secret_access_key.as_deref(),
            settings.secret_access_key_path.as_ref(),
            "AWS_SECRET_ACCESS_KEY",
        )?
        .ok_or_else(|| VaultError::Config("S3 secret access key is not configured".into()))?;

        let credentials = Credentials::new(access_key_id, secret_access_key, None, None, "webvault");

        let mut config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .credentials_provider(credentials);

        if let Some(endpoint) = &settings.endpoint {
            config = config.endpoint_url(endpoint);
        }
        if settings.path_style {
            config = config.force_path_style(true);
        }

        info!(
            region = %settings.region,
            endpoint = ?settings.endpoint,
            bucket = ?settings.bucket,
            "S3 backend configured"
        );

        Self::from_config(config.build(), settings.bucket.clone())
    }

    /// Build a backend from a prepared SDK configuration
    pub fn from_config(config: aws_sdk_s3::Config, shared_bucket: Option<String>) -> VaultResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| VaultError::Io(format!("Failed to start storage runtime: {}", e)))?;

        Ok(Self {
            client: Client::from_conf(config),
            runtime: Arc::new(runtime),
            shared_bucket,
        })
    }

    /// Store handle for a namespace, as a bucket or as a prefix in the shared bucket
    pub fn store(&self, namespace: &str) -> S3ObjectStore {
        let (bucket, prefix) = match &self.shared_bucket {
            Some(bucket) => (bucket.clone(), format!("{}/", namespace)),
            None => (bucket_for_namespace(namespace), String::new()),
        };

        S3ObjectStore {
            namespace: namespace.to_string(),
            bucket,
            prefix,
            client: self.client.clone(),
            runtime: Arc::clone(&self.runtime),
        }
    }
}

impl Backend for S3Backend {
    fn open(&self, namespace: &str) -> VaultResult<Box<dyn ObjectStore>> {
        Ok(Box::new(self.store(namespace)))
    }
}

/// One namespace in an S3-compatible service
pub struct S3ObjectStore {
    namespace: String,
    bucket: String,
    prefix: String,
    client: Client,
    runtime: Arc<Runtime>,
}

impl S3ObjectStore {
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Object key including the namespace prefix, if any
    pub fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

impl ObjectStore for S3ObjectStore {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn put(&self, key: &str, bytes: &[u8]) -> VaultResult<()> {
        let full_key = self.full_key(key);
        debug!(bucket = %self.bucket, key = %full_key, size = bytes.len(), "put_object");

        self.runtime
            .block_on(
                self.client
                    .put_object()
                    .bucket(&self.bucket)
                    .key(&full_key)
                    .body(ByteStream::from(bytes.to_vec()))
                    .send(),
            )
            .map_err(|e| VaultError::storage("put", key, DisplayErrorContext(&e)))?;

        Ok(())
    }

    fn get(&self, key: &str) -> VaultResult<Vec<u8>> {
        let full_key = self.full_key(key);
        debug!(bucket = %self.bucket, key = %full_key, "get_object");

        self.runtime.block_on(async {
            let output = match self
                .client
                .get_object()
                .bucket(&self.bucket)
                .key(&full_key)
                .send()
                .await
            {
                Ok(output) => output,
                Err(err) if err.as_service_error().is_some_and(|e| e.is_no_such_key()) => {
                    return Err(VaultError::NotFound {
                        namespace: self.namespace.clone(),
                        key: key.to_string(),
                    });
                }
                Err(err) => return Err(VaultError::storage("get", key, DisplayErrorContext(&err))),
            };

            let data = output
                .body
                .collect()
                .await
                .map_err(|e| VaultError::storage("get", key, e))?;

            Ok(data.into_bytes().to_vec())
        })
    }

    fn list(&self, prefix: &str) -> VaultResult<Vec<ObjectEntry>> {
        let full_prefix = self.full_key(prefix);
        debug!(bucket = %self.bucket, prefix = %full_prefix, "list_objects_v2");

        self.runtime.block_on(async {
            let mut entries = Vec::new();
            let mut continuation: Option<String> = None;

            loop {
                let output = self
                    .client
                    .list_objects_v2()
                    .bucket(&self.bucket)
                    .prefix(&full_prefix)
                    .set_continuation_token(continuation.take())
                    .send()
                    .await
                    .map_err(|e| VaultError::storage("list", prefix, DisplayErrorContext(&e)))?;

                for object in output.contents() {
                    let Some(key) = object.key().and_then(|k| k.strip_prefix(&self.prefix)) else {
                        continue;
                    };
                    entries.push(ObjectEntry {
                        key: key.to_string(),
                        size_bytes: object.size().unwrap_or(0).max(0) as u64,
                    });
                }

                match output.next_continuation_token() {
                    Some(token) if output.is_truncated().unwrap_or(false) => {
                        continuation = Some(token.to_string());
                    }
                    _ => break,
                }
            }

            // Listing order is not part of the S3 contract for every provider
            entries.sort_by(|a, b| a.key.cmp(&b.key));
            Ok(entries)
        })
    }

    fn delete(&self, key: &str) -> VaultResult<()> {
        let full_key = self.full_key(key);
        debug!(bucket = %self.bucket, key = %full_key, "delete_object");

        self.runtime
            .block_on(
                self.client
                    .delete_object()
                    .bucket(&self.bucket)
                    .key(&full_key)
                    .send(),
            )
            .map_err(|e| VaultError::storage("delete", key, DisplayErrorContext(&e)))?;

        Ok(())
    }

    fn exists(&self, key: &str) -> VaultResult<bool> {
        let full_key = self.full_key(key);

        let result = self.runtime.block_on(
            self.client
                .head_object()
                .bucket(&self.bucket)
                .key(&full_key)
                .send(),
        );

        match result {
            Ok(_) => Ok(true),
            Err(err) if err.as_service_error().is_some_and(|e| e.is_not_found()) => Ok(false),
            Err(err) => Err(VaultError::storage("exists", key, DisplayErrorContext(&err))),
        }
    }
}

/// Bucket name used for a namespace when there is no shared bucket
///
/// Bucket names are lowercase and cannot contain `_`, so `myblog_db`
/// becomes `myblog-db`.
pub fn bucket_for_namespace(namespace: &str) -> String {
    namespace.to_ascii_lowercase().replace('_', "-")
}

/// Resolve a credential: inline value, then file contents, then environment variable
fn resolve_secret(
    inline: Option<&str>,
    path: Option<&PathBuf>,
    env_var: &str,
) -> VaultResult<Option<String>> {
    if let Some(value) = inline.filter(|v| !v.trim().is_empty()) {
        return Ok(Some(value.trim().to_string()));
    }

    if let Some(path) = path {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            VaultError::Config(format!("Failed to read credential file {}: {}", path.display(), e))
        })?;
        return Ok(Some(contents.trim().to_string()));
    }

    Ok(std::env::var(env_var).ok().filter(|v| !v.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_smithy_runtime::client::http::test_util::{ReplayEvent, StaticReplayClient};
    use aws_smithy_runtime_api::http::{Request as HttpRequest, Response as HttpResponse, StatusCode};
    use aws_smithy_types::body::SdkBody;
    use tempfile::TempDir;

    fn event(status: u16, body: &'static str) -> ReplayEvent {
        ReplayEvent::new(
            HttpRequest::new(SdkBody::empty()),
            HttpResponse::new(StatusCode::try_from(status).unwrap(), SdkBody::from(body)),
        )
    }

    /// A store in the shared `backups` bucket whose HTTP traffic is answered by `events`
    fn replay_store(events: Vec<ReplayEvent>) -> (S3ObjectStore, StaticReplayClient) {
        let http = StaticReplayClient::new(events);
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("minio", "minio123", None, None, "test"))
            .endpoint_url("http://127.0.0.1:9000")
            .force_path_style(true)
            .http_client(http.clone())
            .build();
        let backend = S3Backend::from_config(config, Some("backups".into())).unwrap();
        (backend.store("myblog_db"), http)
    }

    const LIST_PAGE_1: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Name>backups</Name>
  <Prefix>myblog_db/db.</Prefix>
  <KeyCount>2</KeyCount>
  <MaxKeys>2</MaxKeys>
  <IsTruncated>true</IsTruncated>
  <NextContinuationToken>page-2</NextContinuationToken>
  <Contents><Key>myblog_db/db.20230103000000</Key><Size>30</Size></Contents>
  <Contents><Key>myblog_db/db.20230101000000</Key><Size>10</Size></Contents>
</ListBucketResult>"#;

    const LIST_PAGE_2: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Name>backups</Name>
  <Prefix>myblog_db/db.</Prefix>
  <KeyCount>1</KeyCount>
  <MaxKeys>2</MaxKeys>
  <IsTruncated>false</IsTruncated>
  <Contents><Key>myblog_db/db.20230102000000</Key><Size>20</Size></Contents>
</ListBucketResult>"#;

    const NO_SUCH_KEY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Error><Code>NoSuchKey</Code><Message>The specified key does not exist.</Message><Key>myblog_db/db.20230105120000</Key><RequestId>1</RequestId></Error>"#;

    const ACCESS_DENIED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Error><Code>AccessDenied</Code><Message>Access Denied</Message><RequestId>2</RequestId></Error>"#;

    fn test_settings(bucket: Option<&str>) -> S3Settings {
        S3Settings {
            region: "us-east-1".into(),
            endpoint: Some("http://127.0.0.1:9000".into()),
            bucket: bucket.map(String::from),
            access_key_id: Some("minio".into()),
            secret_access_key: Some("minio123".into()),
            access_key_id_path: None,
            secret_access_key_path: None,
            path_style: true,
        }
    }

    #[test]
    fn test_resolve_secret_prefers_inline() {
        let value = resolve_secret(Some(" abc "), None, "WEBVAULT_TEST_UNSET_VAR").unwrap();
        assert_eq!(value.as_deref(), Some("abc"));
    }

    #[test]
    fn test_resolve_secret_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("key");
        std::fs::write(&path, "from-file\n").unwrap();

        let value = resolve_secret(None, Some(&path), "WEBVAULT_TEST_UNSET_VAR").unwrap();
        assert_eq!(value.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_resolve_secret_missing_file_is_config_error() {
        let path = PathBuf::from("/nonexistent/webvault/key");
        let err = resolve_secret(None, Some(&path), "WEBVAULT_TEST_UNSET_VAR").unwrap_err();
        assert!(matches!(err, VaultError::Config(_)));
    }

    #[test]
    fn test_namespace_as_bucket() {
        let backend = S3Backend::connect(&test_settings(None)).unwrap();
        let store = backend.store("myblog_db");
        assert_eq!(store.namespace(), "myblog_db");
        assert_eq!(store.bucket(), "myblog-db");
        assert_eq!(store.full_key("db.20230101000000"), "db.20230101000000");
    }

    #[test]
    fn test_namespace_as_prefix() {
        let backend = S3Backend::connect(&test_settings(Some("backups"))).unwrap();
        let store = backend.store("myblog_db");
        assert_eq!(store.bucket(), "backups");
        assert_eq!(store.full_key("db.20230101000000"), "myblog_db/db.20230101000000");
    }

    #[test]
    fn test_missing_credentials_is_config_error() {
        let mut settings = test_settings(None);
        settings.access_key_id = None;
        settings.access_key_id_path = Some(PathBuf::from("/nonexistent/webvault/key"));
        assert!(matches!(S3Backend::connect(&settings), Err(VaultError::Config(_))));
    }

    #[test]
    fn test_list_follows_continuation_and_sorts() {
        let (store, http) = replay_store(vec![event(200, LIST_PAGE_1), event(200, LIST_PAGE_2)]);

        let listed = store.list("db.").unwrap();

        let keys: Vec<&str> = listed.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["db.20230101000000", "db.20230102000000", "db.20230103000000"]
        );
        assert_eq!(listed[0].size_bytes, 10);

        let uris: Vec<String> = http.actual_requests().map(|r| r.uri().to_string()).collect();
        assert_eq!(uris.len(), 2);
        assert!(uris[0].contains("prefix=myblog_db"));
        assert!(uris[1].contains("continuation-token=page-2"));
    }

    #[test]
    fn test_head_404_is_absent() {
        let (store, _http) = replay_store(vec![event(404, "")]);
        assert!(!store.exists("db.20230105120000").unwrap());
    }

    #[test]
    fn test_get_no_such_key_is_not_found() {
        let (store, _http) = replay_store(vec![event(404, NO_SUCH_KEY)]);

        match store.get("db.20230105120000").unwrap_err() {
            VaultError::NotFound { namespace, key } => {
                assert_eq!(namespace, "myblog_db");
                assert_eq!(key, "db.20230105120000");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_get_returns_body() {
        let (store, _http) = replay_store(vec![event(200, "compressed-bytes")]);
        assert_eq!(store.get("db.20230105120000").unwrap(), b"compressed-bytes");
    }

    #[test]
    fn test_access_denied_is_storage_error() {
        let (store, _http) = replay_store(vec![event(403, ACCESS_DENIED), event(403, "")]);

        let err = store.get("db.20230105120000").unwrap_err();
        assert!(err.is_storage());
        assert!(err.to_string().contains("AccessDenied"));

        // A forbidden HEAD is not mistaken for a missing object
        assert!(store.exists("db.20230105120000").unwrap_err().is_storage());
    }
}
