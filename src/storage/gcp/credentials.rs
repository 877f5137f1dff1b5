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

use serde::Deserialize;
use std::fmt::{Debug, Formatter};

use crate::storage::error::{StorageError, StorageResult};

/// The fields of a Google credential JSON bundle this crate needs.
#[derive(Clone, Deserialize, Default)]
pub struct ServiceAccountKey {
    #[serde(rename = "type", default)]
    pub credential_type: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default)]
    pub private_key: Option<String>,
    #[serde(default)]
    pub client_email: Option<String>,
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> StorageResult<Self> {
        serde_json::from_str(json).map_err(|e| {
            StorageError::ConfigError(format!("Unable to parse GCP credentials JSON: {}", e))
        })
    }

    /// Signing identity: the service account's e-mail.
    pub fn client_email(&self) -> StorageResult<&str> {
        self.client_email
            .as_deref()
            .filter(|email| !email.is_empty())
            .ok_or_else(|| {
                StorageError::ConfigError(
                    "GCP credentials JSON has no client_email to sign URLs with".to_string(),
                )
            })
    }

    pub fn private_key(&self) -> Option<&str> {
        self.private_key.as_deref().filter(|key| !key.is_empty())
    }
}

impl Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("type", &self.credential_type)
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
