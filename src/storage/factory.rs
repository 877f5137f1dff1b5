// Copyright 2025 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.
//
// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

use std::env;
use std::sync::Arc;
use tracing::{info, warn};

use super::aws::{self, S3SandboxProvisioner};
use super::backend::CloudBlobStore;
use super::config::{BucketProvider, CloudStorageOption};
use super::error::{StorageError, StorageResult};
use super::gcp::credentials::ServiceAccountKey;
use super::gcp::metadata::{MetadataClient, DEFAULT_SERVICE_ACCOUNT};
use super::gcp::sandbox::GcsSandboxProvisioner;
use super::gcp::{build_ambient_store, build_explicit_store, build_sandbox_store};
use super::provider::{BackendKind, BlobStore};

/// Fallback for the emulator host when the option bag leaves it empty.
pub const STORAGE_EMULATOR_HOST_ENV: &str = "STORAGE_EMULATOR_HOST";

/// Factory for creating blob stores
pub struct CloudStorageFactory;

impl CloudStorageFactory {
    /// Create a blob store bound to `bucket_name` on the provider named by `provider_tag`.
    ///
    /// # Arguments
    ///
    /// * `test_mode` - Use the provider's emulator instead of the real service
    /// * `provider_tag` - "aws" (or empty) or "gcp"
    /// * `bucket_name` - Bucket every operation of the returned store targets
    /// * `options` - Credentials, endpoints and client tuning
    ///
    /// # Returns
    ///
    /// A `Result` containing:
    /// * `Ok(Arc<dyn BlobStore>)` - A thread-safe reference to the open store
    /// * `Err(StorageError)` - If the store cannot be created
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// * The provider tag is unknown (`UnsupportedProvider`)
    /// * The bucket name is empty, or a GCP test store has no emulator host (`ConfigError`)
    /// * The credential JSON cannot be parsed (`ConfigError`)
    /// * GCP ambient credentials are requested outside GCP compute, or the
    ///   metadata server cannot resolve the service account (`AuthenticationError`)
    pub async fn new_cloud_storage(
        test_mode: bool,
        provider_tag: &str,
        bucket_name: &str,
        options: CloudStorageOption,
    ) -> StorageResult<Arc<dyn BlobStore>> {
        let provider: BucketProvider = provider_tag.parse()?;
        if bucket_name.trim().is_empty() {
            return Err(StorageError::ConfigError(
                "Bucket name must not be empty".to_string(),
            ));
        }

        info!(
            "Creating blob store provider={} bucket={} test_mode={} options={:?}",
            provider, bucket_name, test_mode, options
        );

        let store = match provider {
            BucketProvider::Aws => Self::new_aws(test_mode, bucket_name, &options).await?,
            BucketProvider::Gcp => Self::new_gcp(test_mode, bucket_name, &options).await?,
        };
        Ok(Arc::new(store))
    }

    /// Like [`CloudStorageFactory::new_cloud_storage`], with the options merged
    /// from partial overrides first (later partials win).
    pub async fn new_cloud_storage_with(
        test_mode: bool,
        provider_tag: &str,
        bucket_name: &str,
        partials: impl IntoIterator<Item = CloudStorageOption>,
    ) -> StorageResult<Arc<dyn BlobStore>> {
        let options = CloudStorageOption::merge(partials);
        Self::new_cloud_storage(test_mode, provider_tag, bucket_name, options).await
    }

    /// Older entry point without S3 transfer acceleration.
    pub async fn new_cloud_storage_v1(
        test_mode: bool,
        provider_tag: &str,
        bucket_name: &str,
        options: CloudStorageOption,
    ) -> StorageResult<Arc<dyn BlobStore>> {
        let options = options.with_accelerate_endpoint(false);
        Self::new_cloud_storage(test_mode, provider_tag, bucket_name, options).await
    }

    async fn new_aws(
        test_mode: bool,
        bucket_name: &str,
        options: &CloudStorageOption,
    ) -> StorageResult<CloudBlobStore> {
        let store = aws::build_s3_store(bucket_name, options, test_mode)?;
        if !test_mode {
            return Ok(CloudBlobStore::aws(bucket_name, store));
        }

        let provisioner = S3SandboxProvisioner::new(options, bucket_name).await;
        Ok(CloudBlobStore::aws_sandbox(
            bucket_name,
            store,
            aws::sandbox_endpoint(options),
            provisioner,
        ))
    }

    async fn new_gcp(
        test_mode: bool,
        bucket_name: &str,
        options: &CloudStorageOption,
    ) -> StorageResult<CloudBlobStore> {
        if test_mode {
            return Self::new_gcp_sandbox(bucket_name, options);
        }

        if !options.gcp_credentials_json.is_empty() {
            return Self::new_gcp_explicit(bucket_name, options);
        }

        let metadata = MetadataClient::from_options(options)?;
        if !metadata.on_gce().await {
            return Err(StorageError::AuthenticationError(
                "Unable to create implicit GCP client without credentials outside GCP compute"
                    .to_string(),
            ));
        }
        Self::new_gcp_ambient(bucket_name, options, metadata).await
    }

    fn new_gcp_sandbox(
        bucket_name: &str,
        options: &CloudStorageOption,
    ) -> StorageResult<CloudBlobStore> {
        let emulator_host = if !options.gcp_storage_emulator_host.is_empty() {
            options.gcp_storage_emulator_host.clone()
        } else {
            env::var(STORAGE_EMULATOR_HOST_ENV).unwrap_or_default()
        };
        if emulator_host.is_empty() {
            return Err(StorageError::ConfigError(format!(
                "GCP test mode requires an emulator host (option or {})",
                STORAGE_EMULATOR_HOST_ENV
            )));
        }
        if !options.gcp_credentials_json.is_empty() {
            warn!("GCP credentials are ignored when talking to the storage emulator");
        }

        let store = build_sandbox_store(bucket_name, &emulator_host, options)?;
        let provisioner = GcsSandboxProvisioner::new(&emulator_host, bucket_name)?;
        Ok(CloudBlobStore::gcp_sandbox(
            bucket_name,
            Arc::new(store),
            &emulator_host,
            provisioner,
        ))
    }

    fn new_gcp_explicit(
        bucket_name: &str,
        options: &CloudStorageOption,
    ) -> StorageResult<CloudBlobStore> {
        let key = ServiceAccountKey::from_json(&options.gcp_credentials_json)?;
        let client_email = key.client_email()?;
        if key.private_key().is_none() {
            return Err(StorageError::ConfigError(format!(
                "GCP credentials JSON for {} has no private_key to sign URLs with",
                client_email
            )));
        }
        let store = build_explicit_store(bucket_name, options)?;
        info!("Using explicit GCP service account {}", client_email);

        Ok(CloudBlobStore::gcp(BackendKind::GcpExplicit, bucket_name, store))
    }

    async fn new_gcp_ambient(
        bucket_name: &str,
        options: &CloudStorageOption,
        metadata: MetadataClient,
    ) -> StorageResult<CloudBlobStore> {
        // The instance's default account is the identity URLs are signed as.
        let client_email = metadata
            .service_account_email(DEFAULT_SERVICE_ACCOUNT)
            .await?;
        info!("Resolved ambient GCP service account {}", client_email);

        let store = build_ambient_store(bucket_name, options)?;
        Ok(CloudBlobStore::gcp(BackendKind::GcpAmbient, bucket_name, store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::provider::SignedUrlOption;
    use crate::storage::testing::{
        init_tracing, service_account_json, CannedResponse, CannedServer,
    };
    use std::time::Duration;

    fn sandbox_options() -> CloudStorageOption {
        CloudStorageOption::new()
            .with_aws_endpoint("http://localhost:4566")
            .with_aws_region("us-east-1")
            .with_aws_credentials("test", "test")
    }

    #[tokio::test]
    async fn test_unknown_provider() {
        init_tracing();
        let err = CloudStorageFactory::new_cloud_storage(
            false,
            "unknown",
            "bucket",
            CloudStorageOption::new(),
        )
        .await
        .unwrap_err();

        assert!(err.is_config_error());
        assert!(matches!(err, StorageError::UnsupportedProvider(_)));
    }

    #[tokio::test]
    async fn test_empty_bucket_name() {
        let err = CloudStorageFactory::new_cloud_storage(true, "aws", " ", sandbox_options())
            .await
            .unwrap_err();
        assert!(err.is_config_error());
    }

    #[tokio::test]
    async fn test_aws_sandbox() {
        init_tracing();
        let store = CloudStorageFactory::new_cloud_storage(true, "aws", "sandbox", sandbox_options())
            .await
            .unwrap();

        assert_eq!(store.kind(), BackendKind::AwsSandbox);
        assert_eq!(store.bucket_name(), "sandbox");

        let url = store
            .get_signed_url("test/a.json", &SignedUrlOption::default())
            .await
            .unwrap();
        assert_eq!(url, "http://localhost:4566/sandbox/test/a.json");
    }

    #[tokio::test]
    async fn test_empty_tag_defaults_to_aws() {
        let store = CloudStorageFactory::new_cloud_storage(true, "", "sandbox", sandbox_options())
            .await
            .unwrap();
        assert_eq!(store.kind(), BackendKind::AwsSandbox);
    }

    #[tokio::test]
    async fn test_aws_production() {
        let options = CloudStorageOption::new()
            .with_aws_region("us-east-1")
            .with_aws_credentials("AKIDEXAMPLE", "secret");
        let store = CloudStorageFactory::new_cloud_storage(false, "aws", "bucket", options)
            .await
            .unwrap();

        assert_eq!(store.kind(), BackendKind::Aws);
        let url = store
            .get_signed_url("test/a.json", &SignedUrlOption::put(Duration::from_secs(120)))
            .await
            .unwrap();
        assert!(url.contains("X-Amz-Signature="));
    }

    #[tokio::test]
    async fn test_new_cloud_storage_with_partials() {
        let base = CloudStorageOption::new()
            .with_aws_region("us-east-1")
            .with_aws_credentials("test", "test");
        let endpoint = CloudStorageOption::new().with_aws_endpoint("http://localhost:4566");

        let store =
            CloudStorageFactory::new_cloud_storage_with(true, "aws", "sandbox", [base, endpoint])
                .await
                .unwrap();
        let url = store
            .get_signed_url("k", &SignedUrlOption::default())
            .await
            .unwrap();
        assert_eq!(url, "http://localhost:4566/sandbox/k");
    }

    #[tokio::test]
    async fn test_v1_entry_point() {
        let options = sandbox_options().with_accelerate_endpoint(true);
        let store = CloudStorageFactory::new_cloud_storage_v1(true, "aws", "sandbox", options)
            .await
            .unwrap();
        assert_eq!(store.kind(), BackendKind::AwsSandbox);
    }

    #[tokio::test]
    async fn test_gcp_sandbox() {
        let options = CloudStorageOption::new().with_gcp_emulator_host("localhost:4443");
        let store = CloudStorageFactory::new_cloud_storage(true, "gcp", "sandbox", options)
            .await
            .unwrap();

        assert_eq!(store.kind(), BackendKind::GcpSandbox);
        let url = store
            .get_signed_url("test/a.json", &SignedUrlOption::default())
            .await
            .unwrap();
        assert_eq!(url, "http://localhost:4443/sandbox/test/a.json");
    }

    #[tokio::test]
    async fn test_gcp_sandbox_create_bucket() {
        let server = CannedServer::start(|_| CannedResponse::new(200, "{}")).await;
        let options = CloudStorageOption::new().with_gcp_emulator_host(server.host());
        let store = CloudStorageFactory::new_cloud_storage(true, "gcp", "sandbox", options)
            .await
            .unwrap();

        store.create_bucket("requests/", 1).await.unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].path.starts_with("/storage/v1/b"));
    }

    #[tokio::test]
    async fn test_gcp_sandbox_without_emulator_host() {
        if env::var(STORAGE_EMULATOR_HOST_ENV).is_ok() {
            return;
        }
        let err = CloudStorageFactory::new_cloud_storage(
            true,
            "gcp",
            "sandbox",
            CloudStorageOption::new(),
        )
        .await
        .unwrap_err();
        assert!(err.is_config_error());
    }

    #[tokio::test]
    async fn test_gcp_explicit() {
        let options = CloudStorageOption::new().with_gcp_credentials_json(service_account_json());
        let store = CloudStorageFactory::new_cloud_storage(false, "gcp", "bucket", options)
            .await
            .unwrap();

        assert_eq!(store.kind(), BackendKind::GcpExplicit);
        let url = store
            .get_signed_url("test/a.json", &SignedUrlOption::get(Duration::from_secs(900)))
            .await
            .unwrap();
        assert!(url.starts_with("https://storage.googleapis.com/bucket/test/a.json?"));
        assert!(url.contains("X-Goog-Credential=signer"));
        assert!(url.contains("X-Goog-Expires=900"));
        assert!(url.contains("X-Goog-Signature="));
    }

    #[tokio::test]
    async fn test_gcp_explicit_invalid_json() {
        let options = CloudStorageOption::new().with_gcp_credentials_json("{oops");
        let err = CloudStorageFactory::new_cloud_storage(false, "gcp", "bucket", options)
            .await
            .unwrap_err();
        assert!(err.is_config_error());
    }

    #[tokio::test]
    async fn test_gcp_explicit_without_private_key() {
        let json = serde_json::json!({
            "type": "service_account",
            "client_email": "signer@demo.iam.gserviceaccount.com"
        });
        let options = CloudStorageOption::new().with_gcp_credentials_json(json.to_string());
        let err = CloudStorageFactory::new_cloud_storage(false, "gcp", "bucket", options)
            .await
            .unwrap_err();
        assert!(err.is_config_error());
    }

    #[tokio::test]
    async fn test_gcp_outside_compute() {
        let options = CloudStorageOption::new().with_gcp_metadata_host("127.0.0.1:9");
        let err = CloudStorageFactory::new_cloud_storage(false, "gcp", "bucket", options)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::AuthenticationError(_)));
    }

    #[tokio::test]
    async fn test_gcp_ambient_resolves_identity() {
        init_tracing();
        let server = CannedServer::start(|request| match request.path.as_str() {
            "/" => CannedResponse::new(200, "").with_header("Metadata-Flavor", "Google"),
            "/computeMetadata/v1/instance/service-accounts/default/email" => {
                CannedResponse::new(200, "runner@demo.iam.gserviceaccount.com")
            }
            _ => CannedResponse::new(404, ""),
        })
        .await;

        let options = CloudStorageOption::new().with_gcp_metadata_host(server.host());
        let store = CloudStorageFactory::new_cloud_storage(false, "gcp", "bucket", options)
            .await
            .unwrap();

        assert_eq!(store.kind(), BackendKind::GcpAmbient);
        assert_eq!(store.bucket_name(), "bucket");
    }

    #[tokio::test]
    async fn test_gcp_ambient_unknown_account() {
        let server = CannedServer::start(|request| match request.path.as_str() {
            "/" => CannedResponse::new(200, "").with_header("Metadata-Flavor", "Google"),
            _ => CannedResponse::new(404, ""),
        })
        .await;

        let options = CloudStorageOption::new().with_gcp_metadata_host(server.host());
        let err = CloudStorageFactory::new_cloud_storage(false, "gcp", "bucket", options)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::AuthenticationError(_)));
    }
}
