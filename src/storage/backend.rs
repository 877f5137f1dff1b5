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

use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::AmazonS3;
use object_store::gcp::GoogleCloudStorage;
use object_store::ObjectStore;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use tracing::{debug, info};

use super::aws::{self, S3SandboxProvisioner};
use super::error::StorageResult;
use super::gcp;
use super::gcp::sandbox::{self as gcp_sandbox, GcsSandboxProvisioner};
use super::iter::ListIterator;
use super::object_store::ObjectStoreBucket;
use super::provider::{
    Attributes, BackendKind, BlobStore, BlobWriter, ByteStream, ListOptions, SignedUrlOption,
};

/// How a backend produces pre-authenticated URLs
pub(crate) enum UrlSigning {
    /// S3 query-string presigning through the client's credentials
    S3(Arc<AmazonS3>),
    /// GCS V4 signing, locally with a service-account key or through IAM `signBlob`
    Gcs(Arc<GoogleCloudStorage>),
    /// Emulators accept unsigned URLs; the string is the URL prefix up to the bucket
    Unsigned { base_url: String },
}

/// What `create_bucket` does for a backend
pub(crate) enum Provisioning {
    /// Production buckets are managed out of band
    Disabled,
    S3Sandbox(S3SandboxProvisioner),
    GcsSandbox(GcsSandboxProvisioner),
}

/// A blob store bound to one bucket on one provider.
///
/// All variants share the data path through [`ObjectStoreBucket`]; they differ
/// only in how URLs are signed and whether buckets can be created.
pub struct CloudBlobStore {
    kind: BackendKind,
    bucket: ObjectStoreBucket,
    signing: UrlSigning,
    provisioning: Provisioning,
}

impl CloudBlobStore {
    pub(crate) fn new(
        kind: BackendKind,
        bucket: ObjectStoreBucket,
        signing: UrlSigning,
        provisioning: Provisioning,
    ) -> Self {
        info!("Opened {} blob store for bucket {}", kind, bucket.name());
        Self {
            kind,
            bucket,
            signing,
            provisioning,
        }
    }

    pub(crate) fn aws(bucket_name: &str, store: AmazonS3) -> Self {
        let store = Arc::new(store);
        Self::new(
            BackendKind::Aws,
            ObjectStoreBucket::new(bucket_name, Arc::clone(&store) as Arc<dyn ObjectStore>),
            UrlSigning::S3(store),
            Provisioning::Disabled,
        )
    }

    pub(crate) fn aws_sandbox(
        bucket_name: &str,
        store: AmazonS3,
        base_url: String,
        provisioner: S3SandboxProvisioner,
    ) -> Self {
        Self::new(
            BackendKind::AwsSandbox,
            ObjectStoreBucket::new(bucket_name, Arc::new(store)),
            UrlSigning::Unsigned { base_url },
            Provisioning::S3Sandbox(provisioner),
        )
    }

    pub(crate) fn gcp(kind: BackendKind, bucket_name: &str, store: GoogleCloudStorage) -> Self {
        let store = Arc::new(store);
        Self::new(
            kind,
            ObjectStoreBucket::new(bucket_name, Arc::clone(&store) as Arc<dyn ObjectStore>),
            UrlSigning::Gcs(store),
            Provisioning::Disabled,
        )
    }

    pub(crate) fn gcp_sandbox(
        bucket_name: &str,
        store: Arc<dyn ObjectStore>,
        emulator_host: &str,
        provisioner: GcsSandboxProvisioner,
    ) -> Self {
        Self::new(
            BackendKind::GcpSandbox,
            ObjectStoreBucket::new(bucket_name, store),
            UrlSigning::Unsigned {
                base_url: gcp_sandbox::emulator_base_url(emulator_host),
            },
            Provisioning::GcsSandbox(provisioner),
        )
    }
}

#[async_trait]
impl BlobStore for CloudBlobStore {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn bucket_name(&self) -> &str {
        self.bucket.name()
    }

    fn list(&self, prefix: &str) -> ListIterator {
        self.bucket.list(prefix)
    }

    fn list_with_options(&self, options: ListOptions) -> ListIterator {
        self.bucket.list_with_options(options)
    }

    async fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        self.bucket.get(key).await
    }

    async fn get_reader(&self, key: &str) -> StorageResult<ByteStream> {
        self.bucket.get_reader(key).await
    }

    async fn get_range_reader(
        &self,
        key: &str,
        offset: u64,
        length: Option<u64>,
    ) -> StorageResult<ByteStream> {
        self.bucket.get_range_reader(key, offset, length).await
    }

    async fn get_writer(&self, key: &str) -> StorageResult<BlobWriter> {
        self.bucket.get_writer(key)
    }

    async fn write(
        &self,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> StorageResult<()> {
        self.bucket.write(key, body, content_type).await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.bucket.delete(key).await
    }

    async fn attributes(&self, key: &str) -> StorageResult<Attributes> {
        self.bucket.attributes(key).await
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        self.bucket.exists(key).await
    }

    async fn copy(&self, dst_key: &str, src_key: &str) -> StorageResult<()> {
        self.bucket.copy(dst_key, src_key).await
    }

    async fn get_signed_url(&self, key: &str, options: &SignedUrlOption) -> StorageResult<String> {
        // Closed stores refuse to sign as well.
        self.bucket.store()?;
        debug!(
            "Signing {} URL for {}/{} valid {:?}",
            options.method,
            self.bucket.name(),
            key,
            options.effective_expiry()
        );

        if options.content_type.is_some() || options.enforce_absent_content_type {
            debug!("Content type constraints are not bound into {} signed URLs", self.kind);
        }

        match &self.signing {
            UrlSigning::S3(store) => aws::s3_signed_url(store, key, options).await,
            UrlSigning::Gcs(store) => gcp::gcs_signed_url(store, key, options).await,
            UrlSigning::Unsigned { base_url } => {
                Ok(format!("{}/{}/{}", base_url, self.bucket.name(), key))
            }
        }
    }

    async fn create_bucket(&self, prefix: &str, expiration_days: u32) -> StorageResult<()> {
        self.bucket.store()?;
        match &self.provisioning {
            Provisioning::Disabled => {
                debug!(
                    "Bucket creation skipped for {} backend {}",
                    self.kind,
                    self.bucket.name()
                );
                Ok(())
            }
            Provisioning::S3Sandbox(provisioner) => {
                provisioner.create_bucket(prefix, expiration_days).await?;
                Ok(())
            }
            Provisioning::GcsSandbox(provisioner) => {
                provisioner.create_bucket(prefix, expiration_days).await
            }
        }
    }

    fn close(&self) {
        self.bucket.close();
    }
}

impl Debug for CloudBlobStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CloudBlobStore(kind={}, bucket={})",
            self.kind,
            self.bucket.name()
        )
    }
}
