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

use thiserror::Error;

/// Errors that can occur while constructing or using a blob store
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unsupported bucket provider: {0}")]
    UnsupportedProvider(String),

    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    #[error("Blob not found: {key}")]
    NotFound {
        key: String,
        #[source]
        source: object_store::Error,
    },

    #[error("Invalid range: {0}")]
    InvalidRange(#[source] object_store::Error),

    #[error("Blob store is closed")]
    Closed,

    #[error("Bucket provisioning error: {0}")]
    ProvisioningError(String),

    #[error("Object store error: {0}")]
    ObjectStoreError(object_store::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl StorageError {
    /// True for errors raised while validating the construction request.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            StorageError::ConfigError(_) | StorageError::UnsupportedProvider(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}

impl From<object_store::Error> for StorageError {
    fn from(error: object_store::Error) -> Self {
        match error {
            object_store::Error::NotFound { path, source } => StorageError::NotFound {
                key: path.clone(),
                source: object_store::Error::NotFound { path, source },
            },
            other if is_range_rejection(&other) => StorageError::InvalidRange(other),
            other => StorageError::ObjectStoreError(other),
        }
    }
}

/// Messages providers use when refusing a byte range.
const RANGE_REJECTION_MARKERS: &[&str] = &[
    "invalidrange",
    "invalid range",
    "wanted range",
    "range not satisfiable",
];

// object_store has no dedicated range variant, so the provider's wording is matched.
fn is_range_rejection(error: &object_store::Error) -> bool {
    let message = error.to_string().to_lowercase();
    RANGE_REJECTION_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_config_error() {
        let error = StorageError::ConfigError("Invalid configuration".to_string());
        assert_eq!(
            error.to_string(),
            "Configuration error: Invalid configuration"
        );
        assert!(error.is_config_error());
    }

    #[test]
    fn test_unsupported_provider_is_config_error() {
        let error = StorageError::UnsupportedProvider("unknown".to_string());
        assert_eq!(error.to_string(), "Unsupported bucket provider: unknown");
        assert!(error.is_config_error());
        assert!(!error.is_not_found());
    }

    #[test]
    fn test_authentication_error() {
        let error = StorageError::AuthenticationError("no token".to_string());
        assert_eq!(error.to_string(), "Authentication error: no token");
        assert!(!error.is_config_error());
    }

    #[test]
    fn test_not_found_conversion() {
        let source = object_store::Error::NotFound {
            path: "test/a.json".to_string(),
            source: Box::new(io::Error::new(io::ErrorKind::NotFound, "missing")),
        };
        let storage_error: StorageError = source.into();

        assert!(storage_error.is_not_found());
        match storage_error {
            StorageError::NotFound { key, .. } => assert_eq!(key, "test/a.json"),
            _ => panic!("Expected NotFound variant"),
        }
    }

    #[test]
    fn test_generic_object_store_error_conversion() {
        let source = object_store::Error::Generic {
            store: "S3",
            source: Box::new(io::Error::other("connection reset")),
        };
        let storage_error: StorageError = source.into();

        match storage_error {
            StorageError::ObjectStoreError(_) => {
                assert!(storage_error.to_string().contains("Object store error"));
            }
            _ => panic!("Expected ObjectStoreError variant"),
        }
    }

    #[test]
    fn test_range_error_conversion() {
        let source = object_store::Error::Generic {
            store: "S3",
            source: Box::new(io::Error::other("InvalidRange: The requested range is not satisfiable")),
        };
        let storage_error: StorageError = source.into();

        assert!(matches!(storage_error, StorageError::InvalidRange(_)));
    }

    #[test]
    fn test_range_rejection_markers() {
        for message in [
            "Invalid range: Wanted range starting at 100, but object was only 3 bytes long",
            "Client error with status 416 Range Not Satisfiable",
        ] {
            let source = object_store::Error::Generic {
                store: "InMemory",
                source: Box::new(io::Error::other(message)),
            };
            let storage_error: StorageError = source.into();
            assert!(matches!(storage_error, StorageError::InvalidRange(_)), "{}", message);
        }
    }

    #[test]
    fn test_key_containing_range_is_not_range_error() {
        let source = object_store::Error::Generic {
            store: "S3",
            source: Box::new(io::Error::other(
                "Error performing GET http://s3/bucket/fruit/orange.json: connection reset",
            )),
        };
        let storage_error: StorageError = source.into();
        assert!(matches!(storage_error, StorageError::ObjectStoreError(_)));
    }

    #[test]
    fn test_provisioning_error() {
        let error = StorageError::ProvisioningError("bucket rejected".to_string());
        assert_eq!(error.to_string(), "Bucket provisioning error: bucket rejected");
        assert!(!error.is_config_error());
    }

    #[test]
    fn test_closed_error() {
        assert_eq!(StorageError::Closed.to_string(), "Blob store is closed");
    }
}
