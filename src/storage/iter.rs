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

use futures::stream::{self, BoxStream, StreamExt};
use std::fmt::{Debug, Formatter};

use super::error::{StorageError, StorageResult};
use super::provider::ListObject;

/// Pull-based cursor over a listing.
///
/// The iterator is single-pass and cannot be restarted; list again to start over.
/// Pages are fetched lazily as [`ListIterator::next`] is called. It is not meant to
/// be shared between tasks.
pub struct ListIterator {
    inner: BoxStream<'static, StorageResult<ListObject>>,
    exhausted: bool,
}

impl ListIterator {
    pub fn new(inner: BoxStream<'static, StorageResult<ListObject>>) -> Self {
        Self {
            inner,
            exhausted: false,
        }
    }

    /// Iterator whose first step reports `error`.
    pub fn failed(error: StorageError) -> Self {
        Self::new(stream::once(async move { Err(error) }).boxed())
    }

    pub fn empty() -> Self {
        Self::new(stream::empty().boxed())
    }

    /// Advance to the next object.
    ///
    /// Returns `Ok(None)` once the listing is exhausted, and keeps doing so on
    /// further calls. Errors carry the provider error unchanged.
    pub async fn next(&mut self) -> StorageResult<Option<ListObject>> {
        if self.exhausted {
            return Ok(None);
        }
        match self.inner.next().await {
            Some(Ok(object)) => Ok(Some(object)),
            Some(Err(e)) => Err(e),
            None => {
                self.exhausted = true;
                Ok(None)
            }
        }
    }

    /// Drain the remaining objects, stopping at the first error.
    pub async fn collect(mut self) -> StorageResult<Vec<ListObject>> {
        let mut objects = Vec::new();
        while let Some(object) = self.next().await? {
            objects.push(object);
        }
        Ok(objects)
    }

    pub fn into_stream(self) -> BoxStream<'static, StorageResult<ListObject>> {
        if self.exhausted {
            stream::empty().boxed()
        } else {
            self.inner
        }
    }
}

impl Debug for ListIterator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListIterator")
            .field("exhausted", &self.exhausted)
            .finish()
    }
}
