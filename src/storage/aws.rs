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

//! Amazon S3 and S3-compatible emulator backends.

use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::types::{
    BucketLifecycleConfiguration, BucketLocationConstraint, CreateBucketConfiguration,
    ExpirationStatus, LifecycleExpiration, LifecycleRule, LifecycleRuleFilter,
    NoncurrentVersionExpiration,
};
use aws_sdk_s3::Client as S3Client;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::signer::Signer;
use tracing::{info, warn};

use super::config::CloudStorageOption;
use super::error::{StorageError, StorageResult};
use super::object_store::{build_connection_options, build_retry_options, string_to_path};
use super::provider::SignedUrlOption;

pub const DEFAULT_REGION: &str = "us-east-1";

const LIFECYCLE_RULE_ID: &str = "Delete request user data";
const CREDENTIALS_PROVIDER_NAME: &str = "cloud-blob";

/// Build an S3 client from the option bag.
///
/// The environment (`AWS_*` variables) is read as a base and explicit options
/// override it; nothing is written back. Requests use path-style addressing
/// unless the accelerate endpoint is requested.
pub(crate) fn build_s3_store(
    bucket: &str,
    options: &CloudStorageOption,
    sandbox: bool,
) -> StorageResult<AmazonS3> {
    let mut builder = AmazonS3Builder::from_env()
        .with_bucket_name(bucket)
        .with_client_options(build_connection_options(options))
        .with_retry(build_retry_options(options));

    if !options.aws_s3_access_key_id.is_empty() {
        builder = builder.with_access_key_id(&options.aws_s3_access_key_id);
    }
    if !options.aws_s3_secret_access_key.is_empty() {
        builder = builder.with_secret_access_key(&options.aws_s3_secret_access_key);
    }
    if !options.aws_s3_region.is_empty() {
        builder = builder.with_region(&options.aws_s3_region);
    }

    if !options.aws_s3_endpoint.is_empty() {
        builder = builder
            .with_endpoint(&options.aws_s3_endpoint)
            .with_virtual_hosted_style_request(false);
        if options.aws_s3_endpoint.starts_with("http://") {
            builder = builder.with_allow_http(true);
        }
        if options.aws_enable_accelerate_endpoint {
            warn!(
                "Accelerate endpoint ignored for bucket {}: custom endpoint {} is set",
                bucket, options.aws_s3_endpoint
            );
        }
    } else if options.aws_enable_accelerate_endpoint && !sandbox {
        builder = builder
            .with_endpoint(format!("https://{}.s3-accelerate.amazonaws.com", bucket))
            .with_virtual_hosted_style_request(true);
    }

    if sandbox {
        let client_options = build_connection_options(options).with_allow_http(true);
        builder = builder.with_client_options(client_options);
    }

    builder
        .build()
        .map_err(|e| StorageError::ConfigError(format!("Failed to create S3 store: {}", e)))
}

/// Presigned S3 URL for `key`.
///
/// Only the method and expiry are signed; S3 presigning through this client does
/// not bind the content type.
pub(crate) async fn s3_signed_url(
    store: &AmazonS3,
    key: &str,
    options: &SignedUrlOption,
) -> StorageResult<String> {
    let url = store
        .signed_url(
            options.method.clone(),
            &string_to_path(key),
            options.effective_expiry(),
        )
        .await?;
    Ok(url.to_string())
}

/// Endpoint the emulator is reached at.
pub fn sandbox_endpoint(options: &CloudStorageOption) -> String {
    if !options.aws_s3_endpoint.is_empty() {
        return options.aws_s3_endpoint.trim_end_matches('/').to_string();
    }
    let region = if options.aws_s3_region.is_empty() {
        DEFAULT_REGION
    } else {
        options.aws_s3_region.as_str()
    };
    format!("https://s3.{}.amazonaws.com", region)
}

fn provisioning_error(action: &str, bucket: &str, error: impl std::error::Error) -> StorageError {
    StorageError::ProvisioningError(format!(
        "{} {} failed: {}",
        action,
        bucket,
        DisplayErrorContext(error)
    ))
}

/// Lifecycle configuration expiring current and noncurrent versions under `prefix`.
///
/// A trailing '/' on the prefix is dropped.
pub(crate) fn lifecycle_configuration(
    prefix: &str,
    expiration_days: u32,
) -> StorageResult<BucketLifecycleConfiguration> {
    let days = i32::try_from(expiration_days).map_err(|_| {
        StorageError::ConfigError(format!("Expiration of {} days is too large", expiration_days))
    })?;

    let rule = LifecycleRule::builder()
        .id(LIFECYCLE_RULE_ID)
        .filter(
            LifecycleRuleFilter::builder()
                .prefix(prefix.trim_end_matches('/'))
                .build(),
        )
        .expiration(LifecycleExpiration::builder().days(days).build())
        .noncurrent_version_expiration(
            NoncurrentVersionExpiration::builder()
                .noncurrent_days(days)
                .build(),
        )
        .status(ExpirationStatus::Enabled)
        .build()
        .map_err(|e| provisioning_error("LifecycleRule", LIFECYCLE_RULE_ID, e))?;

    BucketLifecycleConfiguration::builder()
        .rules(rule)
        .build()
        .map_err(|e| provisioning_error("BucketLifecycleConfiguration", LIFECYCLE_RULE_ID, e))
}

/// Creates buckets on the S3 emulator through the AWS SDK.
///
/// The client is signed with the same explicit credentials, region and endpoint
/// the data path uses, so emulators that enforce SigV4 accept it.
#[derive(Debug, Clone)]
pub struct S3SandboxProvisioner {
    client: S3Client,
    bucket: String,
    region: String,
}

impl S3SandboxProvisioner {
    pub async fn new(options: &CloudStorageOption, bucket: impl Into<String>) -> Self {
        let region = if options.aws_s3_region.is_empty() {
            DEFAULT_REGION.to_string()
        } else {
            options.aws_s3_region.clone()
        };

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.clone()))
            .endpoint_url(sandbox_endpoint(options));
        if !options.aws_s3_access_key_id.is_empty() {
            loader = loader.credentials_provider(Credentials::new(
                options.aws_s3_access_key_id.clone(),
                options.aws_s3_secret_access_key.clone(),
                None,
                None,
                CREDENTIALS_PROVIDER_NAME,
            ));
        }
        let shared_config = loader.load().await;
        let config = aws_sdk_s3::config::Builder::from(&shared_config)
            .force_path_style(true)
            .build();

        Self {
            client: S3Client::from_conf(config),
            bucket: bucket.into(),
            region,
        }
    }

    /// Create the bucket, attach the expiration rule and check it can be listed.
    ///
    /// Returns `Ok(true)` when the bucket was created, `Ok(false)` when it already
    /// existed, in which case its lifecycle is left untouched.
    pub async fn create_bucket(&self, prefix: &str, expiration_days: u32) -> StorageResult<bool> {
        info!(
            "CreateBucket. Name: {}, Prefix: {}, Exp Time: {}",
            self.bucket, prefix, expiration_days
        );
        let lifecycle = lifecycle_configuration(prefix, expiration_days)?;

        let mut request = self.client.create_bucket().bucket(&self.bucket);
        if self.region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }
        if let Err(e) = request.send().await {
            let service_error = e.into_service_error();
            if service_error.is_bucket_already_owned_by_you()
                || service_error.is_bucket_already_exists()
            {
                info!("Bucket {} already exists.", self.bucket);
                return Ok(false);
            }
            return Err(provisioning_error("CreateBucket", &self.bucket, service_error));
        }

        self.client
            .put_bucket_lifecycle_configuration()
            .bucket(&self.bucket)
            .lifecycle_configuration(lifecycle)
            .send()
            .await
            .map_err(|e| {
                provisioning_error("PutBucketLifecycleConfiguration", &self.bucket, e)
            })?;

        self.client
            .list_objects_v2()
            .bucket(&self.bucket)
            .max_keys(1)
            .send()
            .await
            .map_err(|e| provisioning_error("ListObjectsV2", &self.bucket, e))?;

        info!("Bucket {} created.", self.bucket);
        Ok(true)
    }
}
