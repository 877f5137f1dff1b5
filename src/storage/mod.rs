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

//! Cloud blob storage abstraction layer
//!
//! This module provides one interface, [`BlobStore`], over Amazon S3 and Google
//! Cloud Storage, plus their local emulators for tests. Callers obtain a store
//! from [`CloudStorageFactory`] and never branch on the provider again.
//!
//! Data operations for every backend go through the `object_store` crate; the
//! backends differ only in how they authenticate, sign URLs and provision
//! buckets.

pub mod aws;
pub mod backend;
pub mod config;
pub mod error;
pub mod factory;
pub mod gcp;
pub mod iter;
pub mod object_store;
pub mod provider;

#[cfg(test)]
pub(crate) mod testing;

// Public exports
pub use self::backend::CloudBlobStore;
pub use self::config::{BucketProvider, CloudStorageOption};
pub use self::error::{StorageError, StorageResult};
pub use self::factory::CloudStorageFactory;
pub use self::iter::ListIterator;
pub use self::object_store::ObjectStoreBucket;
pub use self::provider::{
    Attributes, BackendKind, BlobStore, BlobWriter, ByteStream, ListObject, ListOptions,
    SignedUrlOption,
};
