// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Defines the abstract `AudioLoader` trait used by the content pipeline.

use super::asset::AudioAsset;
use anyhow::Result;
use std::path::Path;

/// Loads audio files from disk into playable assets.
pub trait AudioLoader {
    /// Returns `true` if the file's container format is supported.
    ///
    /// The decision is made from the path alone; the file is not opened.
    fn can_load(&self, path: &Path) -> bool;

    /// Decodes the file into an [`AudioAsset`].
    fn load(&self, path: &Path) -> Result<AudioAsset>;
}
