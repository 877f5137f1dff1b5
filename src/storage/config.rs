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

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

use super::error::StorageError;

/// Client tuning keys understood by every backend, with their defaults.
///
/// Values are in seconds except `max_retries` and `pool_max_idle_per_host`.
pub const DEFAULT_CLIENT_OPTIONS: [(&str, &str); 6] = [
    ("timeout", "1200"),
    ("connect_timeout", "30"),
    ("max_retries", "20"),
    ("retry_timeout", "1200"),
    ("pool_idle_timeout", "15"),
    ("pool_max_idle_per_host", "5"),
];

/// Bucket provider selected by the factory
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BucketProvider {
    /// Amazon S3
    Aws,
    /// Google Cloud Storage
    Gcp,
}

impl BucketProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            BucketProvider::Aws => "aws",
            BucketProvider::Gcp => "gcp",
        }
    }
}

impl Display for BucketProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BucketProvider {
    type Err = StorageError;

    /// Parse a provider tag. The empty tag selects AWS; tags are matched exactly.
    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "" | "aws" => Ok(BucketProvider::Aws),
            "gcp" => Ok(BucketProvider::Gcp),
            _ => Err(StorageError::UnsupportedProvider(tag.to_string())),
        }
    }
}

/// Configuration bundle consumed by the factory.
///
/// Every field is optional: an empty string (or `false`) means "use the
/// ambient/default value". Several partial bundles can be combined with
/// [`CloudStorageOption::merge`].
///
/// # Examples
///
/// ## AWS S3 against a local emulator
/// ```
/// use cloud_blob::storage::CloudStorageOption;
///
/// let options = CloudStorageOption::new()
///     .with_aws_endpoint("http://localhost:4566")
///     .with_aws_region("us-west-2")
///     .with_aws_credentials("ACCESS_KEY", "SECRET_KEY");
/// ```
///
/// ## GCS with a service account
/// ```
/// use cloud_blob::storage::CloudStorageOption;
///
/// let options = CloudStorageOption::new()
///     .with_gcp_credentials_json(r#"{"type": "service_account"}"#)
///     .with_option("timeout", "60");
/// ```
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CloudStorageOption {
    /// Custom S3 endpoint (S3-compatible services, localstack)
    pub aws_s3_endpoint: String,
    /// AWS region, e.g. "us-east-1"
    pub aws_s3_region: String,
    pub aws_s3_access_key_id: String,
    pub aws_s3_secret_access_key: String,
    /// Route production S3 traffic through the transfer acceleration endpoint
    pub aws_enable_accelerate_endpoint: bool,

    /// Service account key file contents
    pub gcp_credentials_json: String,
    /// `host:port` of a GCS emulator, test mode only
    pub gcp_storage_emulator_host: String,
    /// Metadata server `host[:port]`, defaults to the link-local GCE address
    pub gcp_metadata_host: String,

    /// SDK client tuning, see [`DEFAULT_CLIENT_OPTIONS`]
    pub client_options: HashMap<String, String>,
}

impl CloudStorageOption {
    /// Create an empty configuration bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Combine partial bundles in order.
    ///
    /// For every string field the last non-empty value wins. The accelerate
    /// flag is overwritten by every partial, whatever its value.
    pub fn merge(partials: impl IntoIterator<Item = CloudStorageOption>) -> Self {
        partials
            .into_iter()
            .fold(Self::default(), |merged, partial| merged.merged_with(partial))
    }

    /// Apply a single partial bundle on top of this one.
    pub fn merged_with(mut self, other: CloudStorageOption) -> Self {
        fn pick(target: &mut String, value: String) {
            if !value.is_empty() {
                *target = value;
            }
        }

        pick(&mut self.aws_s3_endpoint, other.aws_s3_endpoint);
        pick(&mut self.aws_s3_region, other.aws_s3_region);
        pick(&mut self.aws_s3_access_key_id, other.aws_s3_access_key_id);
        pick(
            &mut self.aws_s3_secret_access_key,
            other.aws_s3_secret_access_key,
        );
        self.aws_enable_accelerate_endpoint = other.aws_enable_accelerate_endpoint;

        pick(&mut self.gcp_credentials_json, other.gcp_credentials_json);
        pick(
            &mut self.gcp_storage_emulator_host,
            other.gcp_storage_emulator_host,
        );
        pick(&mut self.gcp_metadata_host, other.gcp_metadata_host);

        for (key, value) in other.client_options {
            if !value.is_empty() {
                self.client_options.insert(key, value);
            }
        }
        self
    }

    pub fn with_aws_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.aws_s3_endpoint = endpoint.into();
        self
    }

    pub fn with_aws_region(mut self, region: impl Into<String>) -> Self {
        self.aws_s3_region = region.into();
        self
    }

    pub fn with_aws_credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.aws_s3_access_key_id = access_key_id.into();
        self.aws_s3_secret_access_key = secret_access_key.into();
        self
    }

    pub fn with_accelerate_endpoint(mut self, enabled: bool) -> Self {
        self.aws_enable_accelerate_endpoint = enabled;
        self
    }

    pub fn with_gcp_credentials_json(mut self, json: impl Into<String>) -> Self {
        self.gcp_credentials_json = json.into();
        self
    }

    pub fn with_gcp_emulator_host(mut self, host: impl Into<String>) -> Self {
        self.gcp_storage_emulator_host = host.into();
        self
    }

    pub fn with_gcp_metadata_host(mut self, host: impl Into<String>) -> Self {
        self.gcp_metadata_host = host.into();
        self
    }

    /// Add a client tuning option.
    ///
    /// # Arguments
    ///
    /// * `key` - The option key, one of [`DEFAULT_CLIENT_OPTIONS`]
    /// * `value` - The option value
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.client_options.insert(key.into(), value.into());
        self
    }

    /// Get a client tuning option, falling back to its default.
    pub fn client_option(&self, key: &str) -> Option<&str> {
        self.client_options
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
            .or_else(|| {
                DEFAULT_CLIENT_OPTIONS
                    .iter()
                    .find(|(name, _)| *name == key)
                    .map(|(_, value)| *value)
            })
    }
}

impl Debug for CloudStorageOption {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        fn redact(value: &str) -> &str {
            if value.is_empty() {
                ""
            } else {
                "<redacted>"
            }
        }

        f.debug_struct("CloudStorageOption")
            .field("aws_s3_endpoint", &self.aws_s3_endpoint)
            .field("aws_s3_region", &self.aws_s3_region)
            .field("aws_s3_access_key_id", &self.aws_s3_access_key_id)
            .field(
                "aws_s3_secret_access_key",
                &redact(&self.aws_s3_secret_access_key),
            )
            .field(
                "aws_enable_accelerate_endpoint",
                &self.aws_enable_accelerate_endpoint,
            )
            .field("gcp_credentials_json", &redact(&self.gcp_credentials_json))
            .field("gcp_storage_emulator_host", &self.gcp_storage_emulator_host)
            .field("gcp_metadata_host", &self.gcp_metadata_host)
            .field("client_options", &self.client_options)
            .finish()
    }
}
