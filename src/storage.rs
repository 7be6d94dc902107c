// ABOUTME: S3 object store access through a Fastly backend
// ABOUTME: Signs GET requests with AWS v4 using credentials from the secret store

use crate::error::TemplateFetchError;
use crate::object_store::ObjectStore;
use crate::sigv4::{self, Credentials, SigningTime};
use fastly::http::{Method, StatusCode};
use fastly::secret_store::SecretStore;
use fastly::Request;

/// Backend name (must match fastly.toml)
pub const STORAGE_BACKEND: &str = "object_storage";

/// Secret store name
pub const SECRET_STORE: &str = "error_page_secrets";

/// Fetches template objects from S3 over the `object_storage` backend.
///
/// Connect and first-byte timeouts are configured on the backend itself, so a
/// slow bucket surfaces here as a send error.
pub struct S3ObjectStore {
    backend: String,
    region: String,
}

impl S3ObjectStore {
    pub fn new(backend: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            region: region.into(),
        }
    }

    fn host(&self, bucket: &str) -> String {
        format!("{}.s3.{}.amazonaws.com", bucket, self.region)
    }
}

impl ObjectStore for S3ObjectStore {
    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, TemplateFetchError> {
        let credentials = load_credentials()?;
        let host = self.host(bucket);
        let path = format!("/{}", sigv4::encode_path(key));

        let signed = sigv4::sign(
            "GET",
            &host,
            &path,
            "",
            &self.region,
            &credentials,
            &SigningTime::now(),
        )
        .map_err(|e| TemplateFetchError::Storage(format!("Failed to sign request: {}", e)))?;

        let mut req = Request::new(Method::GET, format!("https://{}{}", host, path));
        req.set_header("Host", &host);
        req.set_header("x-amz-date", &signed.amz_date);
        req.set_header("x-amz-content-sha256", &signed.content_sha256);
        req.set_header("Authorization", &signed.authorization);

        let resp = req
            .send(self.backend.as_str())
            .map_err(|e| TemplateFetchError::Storage(format!("Failed to fetch {}/{}: {}", bucket, key, e)))?;

        match resp.get_status() {
            StatusCode::OK => Ok(resp.into_body_bytes()),
            StatusCode::NOT_FOUND => Err(TemplateFetchError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
            StatusCode::FORBIDDEN => Err(TemplateFetchError::AccessDenied {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
            status => Err(TemplateFetchError::Storage(format!(
                "Fetch of {}/{} failed with status: {}",
                bucket, key, status
            ))),
        }
    }
}

fn load_credentials() -> Result<Credentials, TemplateFetchError> {
    Ok(Credentials {
        access_key: get_secret("aws_access_key_id")?,
        secret_key: get_secret("aws_secret_access_key")?,
    })
}

/// Get secret value
fn get_secret(key: &str) -> Result<String, TemplateFetchError> {
    let store = SecretStore::open(SECRET_STORE)
        .map_err(|e| TemplateFetchError::Storage(format!("Failed to open secret store: {}", e)))?;

    let secret = store
        .get(key)
        .ok_or_else(|| TemplateFetchError::Storage(format!("Missing secret: {}", key)))?;

    String::from_utf8(secret.plaintext().to_vec())
        .map_err(|e| TemplateFetchError::Storage(format!("Secret is not valid UTF-8: {}", e)))
}
