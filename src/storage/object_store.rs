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

//! Provider-neutral bucket operations on top of `object_store`.
//!
//! Every backend variant owns one [`ObjectStoreBucket`]; the translation from
//! `object_store` types into the crate's data types lives here once.

use super::config::CloudStorageOption;
use super::error::{StorageError, StorageResult};
use super::iter::ListIterator;
use super::provider::{Attributes, BlobWriter, ByteStream, ListObject, ListOptions};
use bytes::Bytes;
use futures::stream::{self, StreamExt, TryStreamExt};
use object_store::{
    buffered::BufWriter, path::Path as ObjectPath, Attribute, Attributes as ObjectAttributes,
    ClientOptions, GetOptions, GetRange, ObjectMeta, ObjectStore, ObjectStoreExt, PutOptions,
    PutPayload, RetryConfig,
};
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, info, warn};

/// An open bucket: the shared `object_store` client plus its lifecycle.
///
/// The client is dropped on [`ObjectStoreBucket::close`]; any operation after
/// that fails with [`StorageError::Closed`].
pub struct ObjectStoreBucket {
    name: String,
    handle: RwLock<Option<Arc<dyn ObjectStore>>>,
}

impl ObjectStoreBucket {
    pub fn new(name: impl Into<String>, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            name: name.into(),
            handle: RwLock::new(Some(store)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Live client handle, or `Closed` once the bucket has been closed.
    pub fn store(&self) -> StorageResult<Arc<dyn ObjectStore>> {
        let guard = match self.handle.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.as_ref().map(Arc::clone).ok_or(StorageError::Closed)
    }

    pub fn is_closed(&self) -> bool {
        self.store().is_err()
    }

    /// Drop the client. Returns false if the bucket was already closed.
    pub fn close(&self) -> bool {
        let mut guard = match self.handle.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match guard.take() {
            Some(_) => {
                info!("Closed bucket {}", self.name);
                true
            }
            None => {
                warn!("Bucket {} is already closed", self.name);
                false
            }
        }
    }

    /// List every object whose key starts with `prefix`.
    ///
    /// The provider is asked for the directory part of the prefix (up to the last
    /// '/') and the results are narrowed to the full prefix, so partial segment
    /// prefixes such as `logs/2024-0` behave as plain string prefixes.
    pub fn list(&self, prefix: &str) -> ListIterator {
        let store = match self.store() {
            Ok(store) => store,
            Err(e) => return ListIterator::failed(e),
        };
        let root = listing_root(prefix);
        debug!(
            "Listing bucket={} prefix={} root={:?}",
            self.name, prefix, root
        );

        let prefix = prefix.to_string();
        let stream = store
            .list(root.as_ref())
            .map_err(StorageError::from)
            .try_filter(move |meta| futures::future::ready(meta.location.as_ref().starts_with(&prefix)))
            .map_ok(list_object_from_meta)
            .boxed();
        ListIterator::new(stream)
    }

    pub fn list_with_options(&self, options: ListOptions) -> ListIterator {
        match options.delimiter.as_deref() {
            None | Some("") => self.list(&options.prefix),
            Some("/") => self.list_delimited(options.prefix),
            Some(other) => ListIterator::failed(StorageError::ConfigError(format!(
                "Unsupported list delimiter '{}', only '/' is supported",
                other
            ))),
        }
    }

    /// One level of the hierarchy under `prefix`.
    ///
    /// `list_with_delimiter` has no paged form, so the whole level is fetched on
    /// the first `next()` and then yielded in key order. Unlike `list`, this
    /// buffers one level in memory.
    fn list_delimited(&self, prefix: String) -> ListIterator {
        let store = match self.store() {
            Ok(store) => store,
            Err(e) => return ListIterator::failed(e),
        };
        let root = listing_root(&prefix);
        debug!(
            "Listing bucket={} prefix={} root={:?} delimiter=/",
            self.name, prefix, root
        );

        let fetch = async move {
            let listing = store.list_with_delimiter(root.as_ref()).await?;
            let mut entries: Vec<ListObject> = listing
                .common_prefixes
                .into_iter()
                .map(|dir| ListObject::directory(format!("{}/", dir)))
                .chain(listing.objects.into_iter().map(list_object_from_meta))
                .filter(|entry| entry.key.starts_with(&prefix))
                .collect();
            entries.sort_by(|a, b| a.key.cmp(&b.key));
            Ok::<_, StorageError>(stream::iter(entries.into_iter().map(Ok)))
        };
        ListIterator::new(stream::once(fetch).try_flatten().boxed())
    }

    pub async fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        let store = self.store()?;
        let result = store.get(&string_to_path(key)).await?;
        let bytes = result.bytes().await?;
        Ok(bytes.to_vec())
    }

    pub async fn get_reader(&self, key: &str) -> StorageResult<ByteStream> {
        let store = self.store()?;
        let result = store.get(&string_to_path(key)).await?;
        Ok(result.into_stream().map_err(StorageError::from).boxed())
    }

    pub async fn get_range_reader(
        &self,
        key: &str,
        offset: u64,
        length: Option<u64>,
    ) -> StorageResult<ByteStream> {
        let store = self.store()?;
        let path = string_to_path(key);

        let range = match length {
            Some(0) => {
                // Nothing to read, but a missing key is still an error.
                store.head(&path).await?;
                return Ok(stream::empty().boxed());
            }
            Some(len) => GetRange::Bounded(offset..offset.saturating_add(len)),
            None => GetRange::Offset(offset),
        };
        let options = GetOptions {
            range: Some(range),
            ..Default::default()
        };

        let result = store.get_opts(&path, options).await?;
        Ok(result.into_stream().map_err(StorageError::from).boxed())
    }

    pub fn get_writer(&self, key: &str) -> StorageResult<BlobWriter> {
        let store = self.store()?;
        Ok(Box::pin(BufWriter::new(store, string_to_path(key))))
    }

    pub async fn write(&self, key: &str, body: Bytes, content_type: Option<&str>) -> StorageResult<()> {
        let store = self.store()?;

        let mut attributes = ObjectAttributes::new();
        if let Some(content_type) = content_type.filter(|ct| !ct.is_empty()) {
            attributes.insert(Attribute::ContentType, content_type.to_string().into());
        }
        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        let size = body.len();
        store
            .put_opts(&string_to_path(key), PutPayload::from(body), options)
            .await?;
        debug!("Wrote {} bytes to {}/{}", size, self.name, key);
        Ok(())
    }

    /// Delete `key`, failing with `NotFound` when it does not exist.
    ///
    /// S3 deletes are idempotent while GCS rejects missing keys; the existence
    /// check gives every backend the GCS behaviour.
    pub async fn delete(&self, key: &str) -> StorageResult<()> {
        let store = self.store()?;
        let path = string_to_path(key);
        store.head(&path).await?;
        store.delete(&path).await?;
        Ok(())
    }

    pub async fn attributes(&self, key: &str) -> StorageResult<Attributes> {
        let store = self.store()?;
        let options = GetOptions {
            head: true,
            ..Default::default()
        };
        let result = store.get_opts(&string_to_path(key), options).await?;
        Ok(attributes_from_object(&result.meta, &result.attributes))
    }

    pub async fn exists(&self, key: &str) -> StorageResult<bool> {
        let store = self.store()?;
        match store.head(&string_to_path(key)).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn copy(&self, dst_key: &str, src_key: &str) -> StorageResult<()> {
        let store = self.store()?;
        store
            .copy(&string_to_path(src_key), &string_to_path(dst_key))
            .await?;
        Ok(())
    }
}

impl Debug for ObjectStoreBucket {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ObjectStoreBucket(name={}, closed={})",
            self.name,
            self.is_closed()
        )
    }
}

pub(crate) fn string_to_path(s: &str) -> ObjectPath {
    ObjectPath::from(s)
}

/// Directory part of a listing prefix, up to (not including) the last '/'.
pub(crate) fn listing_root(prefix: &str) -> Option<ObjectPath> {
    match prefix.rfind('/') {
        Some(idx) if idx > 0 => Some(string_to_path(&prefix[..idx])),
        _ => None,
    }
}

pub(crate) fn list_object_from_meta(meta: ObjectMeta) -> ListObject {
    ListObject {
        key: meta.location.to_string(),
        modified: Some(meta.last_modified),
        size: meta.size,
        content_hash: meta.e_tag.map(|tag| tag.trim_matches('"').to_string()),
        is_dir: false,
    }
}

pub(crate) fn attributes_from_object(meta: &ObjectMeta, attributes: &ObjectAttributes) -> Attributes {
    let mut result = Attributes {
        modified: meta.last_modified,
        size: meta.size,
        content_hash: meta.e_tag.as_ref().map(|tag| tag.trim_matches('"').to_string()),
        ..Default::default()
    };

    for (attribute, value) in attributes.iter() {
        let value: &str = value.as_ref();
        match attribute {
            Attribute::CacheControl => result.cache_control = value.to_string(),
            Attribute::ContentDisposition => result.content_disposition = value.to_string(),
            Attribute::ContentEncoding => result.content_encoding = value.to_string(),
            Attribute::ContentLanguage => result.content_language = value.to_string(),
            Attribute::ContentType => result.content_type = value.to_string(),
            Attribute::Metadata(name) => {
                result
                    .metadata
                    .insert(name.to_lowercase(), value.to_string());
            }
            _ => {}
        }
    }
    result
}

/// Build HTTP client options from the tuning keys of the option bag.
///
/// "0" or "disabled" turns a timeout off; unparseable values are ignored.
pub(crate) fn build_connection_options(options: &CloudStorageOption) -> ClientOptions {
    let mut client_options = ClientOptions::default();
    if let Some(timeout_str) = options.client_option("timeout") {
        if timeout_str == "0" || timeout_str == "disabled" {
            client_options = client_options.with_timeout_disabled();
        } else if let Ok(sec) = timeout_str.parse::<u64>() {
            client_options = client_options.with_timeout(Duration::from_secs(sec))
        }
    };
    if let Some(connect_timeout_str) = options.client_option("connect_timeout") {
        if connect_timeout_str == "0" || connect_timeout_str == "disabled" {
            client_options = client_options.with_connect_timeout_disabled();
        } else if let Ok(sec) = connect_timeout_str.parse::<u64>() {
            client_options = client_options.with_connect_timeout(Duration::from_secs(sec))
        }
    }
    if let Some(pool_idle_timeout_str) = options.client_option("pool_idle_timeout") {
        if let Ok(sec) = pool_idle_timeout_str.parse::<u64>() {
            client_options = client_options.with_pool_idle_timeout(Duration::from_secs(sec))
        }
    }
    if let Some(pool_max_idle_per_host_str) = options.client_option("pool_max_idle_per_host") {
        if let Ok(max_idle) = pool_max_idle_per_host_str.parse::<usize>() {
            client_options = client_options.with_pool_max_idle_per_host(max_idle)
        }
    }
    client_options
}

/// Build the SDK retry policy from the option bag.
pub(crate) fn build_retry_options(options: &CloudStorageOption) -> RetryConfig {
    let default_retry_config = RetryConfig::default();
    let max_retries = options
        .client_option("max_retries")
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(default_retry_config.max_retries);
    let retry_timeout = options
        .client_option("retry_timeout")
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(default_retry_config.retry_timeout);
    RetryConfig {
        backoff: Default::default(),
        max_retries,
        retry_timeout,
    }
}
