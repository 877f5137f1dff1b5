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

//! # Cloud Blob
//!
//! A unified blob storage facade over Amazon S3 and Google Cloud Storage.
//!
//! Application code asks [`CloudStorageFactory`] for a store bound to one bucket
//! and then talks only to the [`BlobStore`] trait: list, read, stream, write,
//! delete, inspect attributes, copy and sign URLs, whatever the provider.
//!
//! ## Features
//!
//! - **Providers**: Amazon S3 (optionally through transfer acceleration), Google
//!   Cloud Storage with an explicit service-account key or with the workload
//!   identity of the GCP compute instance
//! - **Test mode**: S3-compatible (localstack) and GCS (fake-gcs-server)
//!   emulators, including bucket creation with an expiration lifecycle rule
//! - **Signed URLs**: S3 presigning and GCS V4 signing, locally or through the
//!   IAM Credentials API
//! - **Streaming**: ranged readers and incremental writers
//!
//! ## Quick Start
//!
//! ### AWS S3 Example
//!
//! ```rust,no_run
//! use bytes::Bytes;
//! use cloud_blob::{BlobStore, CloudStorageFactory, CloudStorageOption};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let options = CloudStorageOption::new()
//!     .with_aws_region("us-east-1")
//!     .with_aws_credentials("ACCESS_KEY", "SECRET_KEY");
//!
//! let store = CloudStorageFactory::new_cloud_storage(false, "aws", "my-bucket", options).await?;
//! store
//!     .write("reports/a.json", Bytes::from_static(b"{}"), Some("application/json"))
//!     .await?;
//!
//! let mut iter = store.list("reports/");
//! while let Some(object) = iter.next().await? {
//!     println!("{} ({} bytes)", object.key, object.size);
//! }
//! store.close();
//! # Ok(())
//! # }
//! ```
//!
//! ### GCS Emulator Example
//!
//! ```rust,no_run
//! use cloud_blob::{BlobStore, CloudStorageFactory, CloudStorageOption, SignedUrlOption};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let options = CloudStorageOption::new().with_gcp_emulator_host("localhost:4443");
//!
//! let store = CloudStorageFactory::new_cloud_storage(true, "gcp", "sandbox", options).await?;
//! store.create_bucket("requests/", 1).await?;
//!
//! let url = store
//!     .get_signed_url("requests/a.json", &SignedUrlOption::default())
//!     .await?;
//! println!("{}", url);
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! [`CloudStorageOption`] carries credentials and endpoints; empty fields fall
//! back to the ambient environment. Client tuning keys (`timeout`,
//! `connect_timeout`, `max_retries`, `retry_timeout`, `pool_idle_timeout`,
//! `pool_max_idle_per_host`) are set with [`CloudStorageOption::with_option`].
//!
//! ## Logging
//!
//! The crate logs through `tracing`; install any subscriber to see construction,
//! provisioning and signing events.

pub mod storage;

// Re-export commonly used types
pub use storage::{
    Attributes, BackendKind, BlobStore, CloudStorageFactory, CloudStorageOption, ListIterator,
    ListObject, ListOptions, SignedUrlOption, StorageError, StorageResult,
};
