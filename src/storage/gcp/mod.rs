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

//! Google Cloud Storage backends.

pub mod credentials;
pub mod metadata;
pub mod sandbox;

use object_store::gcp::{GoogleCloudStorage, GoogleCloudStorageBuilder};
use object_store::signer::Signer;
use std::time::Duration;

use super::config::CloudStorageOption;
use super::error::{StorageError, StorageResult};
use super::object_store::{build_connection_options, build_retry_options, string_to_path};
use super::provider::SignedUrlOption;

/// Longest validity GCS accepts for a V4 signed URL.
pub const MAX_SIGNED_URL_EXPIRY: Duration = Duration::from_secs(7 * 24 * 60 * 60);

fn gcs_builder(
    builder: GoogleCloudStorageBuilder,
    bucket: &str,
    options: &CloudStorageOption,
) -> GoogleCloudStorageBuilder {
    builder
        .with_bucket_name(bucket)
        .with_client_options(build_connection_options(options))
        .with_retry(build_retry_options(options))
}

fn build(builder: GoogleCloudStorageBuilder) -> StorageResult<GoogleCloudStorage> {
    builder
        .build()
        .map_err(|e| StorageError::ConfigError(format!("Failed to create GCS store: {}", e)))
}

/// GCS client authenticated with the service-account JSON from the option bag.
pub(crate) fn build_explicit_store(
    bucket: &str,
    options: &CloudStorageOption,
) -> StorageResult<GoogleCloudStorage> {
    build(
        gcs_builder(GoogleCloudStorageBuilder::new(), bucket, options)
            .with_service_account_key(&options.gcp_credentials_json),
    )
}

/// GCS client using application-default or instance credentials.
pub(crate) fn build_ambient_store(
    bucket: &str,
    options: &CloudStorageOption,
) -> StorageResult<GoogleCloudStorage> {
    build(gcs_builder(GoogleCloudStorageBuilder::from_env(), bucket, options))
}

/// GCS client talking plain HTTP to the storage emulator without OAuth.
pub(crate) fn build_sandbox_store(
    bucket: &str,
    emulator_host: &str,
    options: &CloudStorageOption,
) -> StorageResult<GoogleCloudStorage> {
    build(
        gcs_builder(GoogleCloudStorageBuilder::new(), bucket, options)
            .with_service_account_key(sandbox::emulator_service_account(emulator_host))
            .with_client_options(build_connection_options(options).with_allow_http(true)),
    )
}

/// V4 signed URL for `key`.
///
/// The client signs locally when it holds a service-account key and through
/// the IAM `signBlob` API otherwise. As with S3, only the method and expiry are
/// bound into the signature.
pub(crate) async fn gcs_signed_url(
    store: &GoogleCloudStorage,
    key: &str,
    options: &SignedUrlOption,
) -> StorageResult<String> {
    let expiry = options.effective_expiry();
    if expiry > MAX_SIGNED_URL_EXPIRY {
        return Err(StorageError::ConfigError(format!(
            "Signed URL expiry {}s exceeds the GCS maximum of {}s",
            expiry.as_secs(),
            MAX_SIGNED_URL_EXPIRY.as_secs()
        )));
    }

    let url = store
        .signed_url(options.method.clone(), &string_to_path(key), expiry)
        .await?;
    Ok(url.to_string())
}
