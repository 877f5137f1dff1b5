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

//! Client for the GCE instance metadata server.
//!
//! Only used to decide whether ambient credentials are available and which
//! service account they belong to. Tokens and remote signing are handled by the
//! `object_store` GCS client itself.

use std::env;
use std::time::Duration;
use tracing::debug;

use crate::storage::config::CloudStorageOption;
use crate::storage::error::{StorageError, StorageResult};

pub const DEFAULT_METADATA_HOST: &str = "169.254.169.254";
pub const METADATA_HOST_ENV: &str = "GCE_METADATA_HOST";
pub const DEFAULT_SERVICE_ACCOUNT: &str = "default";

const METADATA_FLAVOR_HEADER: &str = "Metadata-Flavor";
const METADATA_FLAVOR: &str = "Google";
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct MetadataClient {
    http: reqwest::Client,
    host: String,
}

impl MetadataClient {
    pub fn new(host: impl Into<String>) -> StorageResult<Self> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            host: host.into(),
        })
    }

    /// Host from the option bag, else `GCE_METADATA_HOST`, else the link-local default.
    pub fn from_options(options: &CloudStorageOption) -> StorageResult<Self> {
        let host = if !options.gcp_metadata_host.is_empty() {
            options.gcp_metadata_host.clone()
        } else {
            env::var(METADATA_HOST_ENV)
                .ok()
                .filter(|h| !h.is_empty())
                .unwrap_or_else(|| DEFAULT_METADATA_HOST.to_string())
        };
        Self::new(host)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn url(&self, suffix: &str) -> String {
        format!("http://{}/computeMetadata/v1/{}", self.host, suffix)
    }

    /// True when the metadata server answers with the Google flavor header.
    pub async fn on_gce(&self) -> bool {
        let response = self
            .http
            .get(format!("http://{}", self.host))
            .header(METADATA_FLAVOR_HEADER, METADATA_FLAVOR)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await;
        match response {
            Ok(response) => response
                .headers()
                .get(METADATA_FLAVOR_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(|v| v == METADATA_FLAVOR)
                .unwrap_or(false),
            Err(e) => {
                debug!("Metadata server at {} is unreachable: {}", self.host, e);
                false
            }
        }
    }

    async fn fetch(&self, suffix: &str) -> StorageResult<reqwest::Response> {
        let url = self.url(suffix);
        let response = self
            .http
            .get(&url)
            .header(METADATA_FLAVOR_HEADER, METADATA_FLAVOR)
            .send()
            .await
            .map_err(|e| {
                StorageError::AuthenticationError(format!(
                    "Metadata server request {} failed: {}",
                    url, e
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::AuthenticationError(format!(
                "Metadata server returned {} for {}",
                status, url
            )));
        }
        Ok(response)
    }

    /// E-mail of the instance service account `account` ("default" for the one
    /// ambient credentials and remote signing use).
    pub async fn service_account_email(&self, account: &str) -> StorageResult<String> {
        let response = self
            .fetch(&format!("instance/service-accounts/{}/email", account))
            .await?;
        let email = response.text().await?.trim().to_string();
        if email.is_empty() {
            return Err(StorageError::AuthenticationError(format!(
                "Metadata server returned no e-mail for service account {}",
                account
            )));
        }
        Ok(email)
    }
}
