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
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use reqwest::Method;
use std::collections::HashMap;
use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::pin::Pin;
use std::time::Duration;
use tokio::io::AsyncWrite;

use super::config::BucketProvider;
use super::error::StorageResult;
use super::iter::ListIterator;

/// Default lifetime of a signed URL when the caller passes a zero expiry.
pub const DEFAULT_SIGNED_URL_EXPIRY: Duration = Duration::from_secs(60 * 60);

/// Stream of blob content chunks. Dropping it releases the underlying connection.
pub type ByteStream = BoxStream<'static, StorageResult<Bytes>>;

/// Incremental blob writer. The blob becomes visible once `shutdown` completes.
pub type BlobWriter = Pin<Box<dyn AsyncWrite + Send>>;

/// A single entry produced by listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListObject {
    /// Blob key, or the common prefix (ending with the delimiter) for directories
    pub key: String,

    /// Last modified timestamp, `None` for directory markers
    pub modified: Option<DateTime<Utc>>,

    /// Blob size in bytes
    pub size: u64,

    /// Provider entity tag. For single-part S3 uploads this is the hex MD5 of the content.
    pub content_hash: Option<String>,

    /// Virtual directory entry from a delimited listing
    pub is_dir: bool,
}

impl ListObject {
    /// Directory marker: every field except the key is zero-valued.
    pub fn directory(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            modified: None,
            size: 0,
            content_hash: None,
            is_dir: true,
        }
    }
}

/// Blob attributes, fetched fresh on every call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    pub cache_control: String,
    pub content_disposition: String,
    pub content_encoding: String,
    pub content_language: String,
    pub content_type: String,

    /// User metadata. Keys are lowercase; on case-insensitive collisions the last one wins.
    pub metadata: HashMap<String, String>,

    pub modified: DateTime<Utc>,
    pub size: u64,
    pub content_hash: Option<String>,
}

/// Options for [`BlobStore::get_signed_url`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedUrlOption {
    /// HTTP method the URL is valid for
    pub method: Method,

    /// Validity window; zero means [`DEFAULT_SIGNED_URL_EXPIRY`]
    pub expiry: Duration,

    /// Content type the eventual request is expected to carry.
    ///
    /// The `object_store` signers bind only method, path and expiry, so neither
    /// this nor `enforce_absent_content_type` ends up in the signature today.
    pub content_type: Option<String>,

    /// Expect the eventual request to carry no content type at all
    pub enforce_absent_content_type: bool,
}

impl Default for SignedUrlOption {
    fn default() -> Self {
        Self {
            method: Method::GET,
            expiry: DEFAULT_SIGNED_URL_EXPIRY,
            content_type: None,
            enforce_absent_content_type: false,
        }
    }
}

impl SignedUrlOption {
    /// Options for a download URL.
    pub fn get(expiry: Duration) -> Self {
        Self {
            expiry,
            ..Self::default()
        }
    }

    /// Options for an upload URL.
    pub fn put(expiry: Duration) -> Self {
        Self {
            method: Method::PUT,
            expiry,
            ..Self::default()
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_enforce_absent_content_type(mut self, enforce: bool) -> Self {
        self.enforce_absent_content_type = enforce;
        self
    }

    /// Expiry with the zero value replaced by the default.
    pub fn effective_expiry(&self) -> Duration {
        if self.expiry.is_zero() {
            DEFAULT_SIGNED_URL_EXPIRY
        } else {
            self.expiry
        }
    }
}

/// Options for [`BlobStore::list_with_options`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Only keys starting with this string are listed
    pub prefix: String,

    /// Group keys sharing a prefix up to this delimiter into directory entries.
    /// Only "/" is supported.
    pub delimiter: Option<String>,
}

impl ListOptions {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            delimiter: None,
        }
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = Some(delimiter.into());
        self
    }
}

/// Concrete backend variant behind a [`BlobStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Amazon S3, production
    Aws,
    /// S3-compatible emulator (localstack)
    AwsSandbox,
    /// GCS with an explicit service-account key
    GcpExplicit,
    /// GCS with workload/metadata credentials
    GcpAmbient,
    /// GCS emulator (fake-gcs-server)
    GcpSandbox,
}

impl BackendKind {
    pub fn provider(&self) -> BucketProvider {
        match self {
            BackendKind::Aws | BackendKind::AwsSandbox => BucketProvider::Aws,
            BackendKind::GcpExplicit | BackendKind::GcpAmbient | BackendKind::GcpSandbox => {
                BucketProvider::Gcp
            }
        }
    }

    pub fn is_sandbox(&self) -> bool {
        matches!(self, BackendKind::AwsSandbox | BackendKind::GcpSandbox)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Aws => "aws",
            BackendKind::AwsSandbox => "aws-sandbox",
            BackendKind::GcpExplicit => "gcp-explicit",
            BackendKind::GcpAmbient => "gcp-ambient",
            BackendKind::GcpSandbox => "gcp-sandbox",
        }
    }
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Unified blob storage interface
///
/// Every backend produced by the factory implements this trait; callers never
/// see which provider is live. Operations are plain async calls into the
/// provider SDK: dropping a future cancels the request but does not roll back
/// data already flushed to the provider. Nothing is retried here beyond the
/// SDK's own retry configuration.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// The backend variant serving this store.
    fn kind(&self) -> BackendKind;

    /// Name of the bucket this store is bound to.
    fn bucket_name(&self) -> &str;

    /// List every blob whose key starts with `prefix`.
    ///
    /// Returns immediately; no request is made until the first
    /// [`ListIterator::next`]. Ordering is provider-defined.
    fn list(&self, prefix: &str) -> ListIterator;

    /// List with an optional delimiter, yielding directory entries for common prefixes.
    fn list_with_options(&self, options: ListOptions) -> ListIterator;

    /// Read the whole blob into memory.
    ///
    /// # Errors
    ///
    /// * `StorageError::NotFound` - The key does not exist
    /// * Transport or authentication errors from the provider
    async fn get(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Open a streaming reader over the blob content.
    async fn get_reader(&self, key: &str) -> StorageResult<ByteStream>;

    /// Open a streaming reader over `length` bytes starting at `offset`.
    ///
    /// `None` reads to the end of the blob.
    ///
    /// # Errors
    ///
    /// * `StorageError::InvalidRange` - The provider rejected the range
    /// * `StorageError::NotFound` - The key does not exist
    async fn get_range_reader(
        &self,
        key: &str,
        offset: u64,
        length: Option<u64>,
    ) -> StorageResult<ByteStream>;

    /// Open an incremental writer.
    ///
    /// The blob is not guaranteed to exist until the writer is shut down.
    /// A failure half way may leave a partial upload behind, depending on the provider.
    async fn get_writer(&self, key: &str) -> StorageResult<BlobWriter>;

    /// Replace the blob unconditionally.
    async fn write(&self, key: &str, body: Bytes, content_type: Option<&str>)
        -> StorageResult<()>;

    /// Delete the blob; `NotFound` when it does not exist, on every provider.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Fetch the blob attributes.
    async fn attributes(&self, key: &str) -> StorageResult<Attributes>;

    /// Check whether the blob exists.
    ///
    /// Never fails on a missing key; transport and authentication errors are returned.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Server-side copy of `src_key` to `dst_key`.
    async fn copy(&self, dst_key: &str, src_key: &str) -> StorageResult<()>;

    /// Produce a time-limited pre-authenticated URL.
    ///
    /// The method and content type are not checked against the eventual
    /// request; a mismatch is rejected by the provider when the URL is used.
    async fn get_signed_url(&self, key: &str, options: &SignedUrlOption) -> StorageResult<String>;

    /// Create the bucket with a lifecycle rule expiring objects under `prefix`.
    ///
    /// Production backends treat this as a no-op: bucket creation is an operational task.
    async fn create_bucket(&self, prefix: &str, expiration_days: u32) -> StorageResult<()>;

    /// Release the bucket handle. Later operations fail with `StorageError::Closed`.
    fn close(&self);
}

impl Debug for dyn BlobStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "BlobStore(kind={}, bucket={})",
            self.kind(),
            self.bucket_name()
        )
    }
}
