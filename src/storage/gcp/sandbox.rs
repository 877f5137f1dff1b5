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

//! Storage emulator (fake-gcs-server) support.

use reqwest::StatusCode;
use serde_json::json;
use std::time::Duration;
use tracing::info;

use crate::storage::error::{StorageError, StorageResult};

const EMULATOR_PROJECT: &str = "test";
const PROVISION_TIMEOUT: Duration = Duration::from_secs(10);

/// Emulator base URL; a bare `host:port` is taken as plain HTTP.
pub fn emulator_base_url(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    }
}

/// Service-account JSON pointing the GCS client at the emulator with OAuth disabled.
pub(crate) fn emulator_service_account(host: &str) -> String {
    json!({
        "gcs_base_url": emulator_base_url(host),
        "disable_oauth": true,
        "client_email": "",
        "private_key": "",
        "private_key_id": ""
    })
    .to_string()
}

/// Creates emulator buckets through the JSON API.
#[derive(Debug, Clone)]
pub struct GcsSandboxProvisioner {
    http: reqwest::Client,
    base_url: String,
    bucket: String,
}

impl GcsSandboxProvisioner {
    pub fn new(host: &str, bucket: impl Into<String>) -> StorageResult<Self> {
        let http = reqwest::Client::builder().timeout(PROVISION_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: emulator_base_url(host),
            bucket: bucket.into(),
        })
    }

    /// Create the bucket with a delete-after-`expiration_days` rule on `prefix`.
    ///
    /// An existing bucket is left as is.
    pub async fn create_bucket(&self, prefix: &str, expiration_days: u32) -> StorageResult<()> {
        info!(
            "CreateBucket. Name: {}, Prefix: {}, Exp Time: {}",
            self.bucket, prefix, expiration_days
        );

        let body = json!({
            "name": self.bucket,
            "lifecycle": {
                "rule": [{
                    "action": { "type": "Delete" },
                    "condition": {
                        "age": expiration_days,
                        "matchesPrefix": [prefix]
                    }
                }]
            }
        });

        let response = self
            .http
            .post(format!("{}/storage/v1/b", self.base_url))
            .query(&[("project", EMULATOR_PROJECT)])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::CONFLICT {
            info!("Bucket {} already exists.", self.bucket);
            return Ok(());
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(StorageError::ProvisioningError(format!(
                "Emulator rejected bucket {} with {}: {}",
                self.bucket, status, text
            )));
        }

        info!("Bucket {} created.", self.bucket);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::testing::{CannedResponse, CannedServer};

    #[test]
    fn test_emulator_base_url() {
        assert_eq!(emulator_base_url("localhost:4443"), "http://localhost:4443");
        assert_eq!(emulator_base_url("http://gcs:4443/"), "http://gcs:4443");
        assert_eq!(emulator_base_url("https://gcs"), "https://gcs");
    }

    #[test]
    fn test_emulator_service_account() {
        let json: serde_json::Value =
            serde_json::from_str(&emulator_service_account("localhost:4443")).unwrap();
        assert_eq!(json["gcs_base_url"], "http://localhost:4443");
        assert_eq!(json["disable_oauth"], true);
    }

    #[tokio::test]
    async fn test_create_bucket() {
        let server = CannedServer::start(|_| CannedResponse::new(200, "{}")).await;
        let provisioner = GcsSandboxProvisioner::new(&server.host(), "sandbox").unwrap();

        provisioner.create_bucket("requests/", 3).await.unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].path, "/storage/v1/b?project=test");

        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["name"], "sandbox");
        let rule = &body["lifecycle"]["rule"][0];
        assert_eq!(rule["action"]["type"], "Delete");
        assert_eq!(rule["condition"]["age"], 3);
        assert_eq!(rule["condition"]["matchesPrefix"][0], "requests/");
    }

    #[tokio::test]
    async fn test_create_existing_bucket() {
        let server = CannedServer::start(|_| CannedResponse::new(409, "conflict")).await;
        let provisioner = GcsSandboxProvisioner::new(&server.host(), "sandbox").unwrap();
        provisioner.create_bucket("", 1).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_bucket_failure() {
        let server = CannedServer::start(|_| CannedResponse::new(500, "boom")).await;
        let provisioner = GcsSandboxProvisioner::new(&server.host(), "sandbox").unwrap();
        let err = provisioner.create_bucket("", 1).await.unwrap_err();
        assert!(err.to_string().contains("boom"));
    }
}
