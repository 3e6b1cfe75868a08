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

//! A registry of decode lanes, keyed by file extension.

use anyhow::{anyhow, Result};
use cadenza_lanes::asset_lane::{AssetLoader, DecodedAudio, SymphoniaLoaderLane, WavLoaderLane};
use std::collections::HashMap;
use std::path::Path;

/// Extensions decoded by the WAV lane.
const WAV_EXTENSIONS: [&str; 2] = ["wav", "wave"];
/// Extensions decoded by the symphonia lane.
const SYMPHONIA_EXTENSIONS: [&str; 3] = ["ogg", "flac", "mp3"];

type BoxedLoader = Box<dyn AssetLoader<DecodedAudio> + Send + Sync>;

/// Returns the lowercase extension of `path`, if it has one.
pub(crate) fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

/// Maps lowercase file extensions to the lane decoding them.
pub(crate) struct AudioLoaderRegistry {
    loaders: HashMap<String, BoxedLoader>,
}

impl AudioLoaderRegistry {
    /// Creates a registry with the WAV and symphonia lanes registered.
    pub(crate) fn new() -> Self {
        let mut registry = Self {
            loaders: HashMap::new(),
        };
        for extension in WAV_EXTENSIONS {
            registry.register(extension, WavLoaderLane::new());
        }
        for extension in SYMPHONIA_EXTENSIONS {
            registry.register(extension, SymphoniaLoaderLane::with_extension(extension));
        }
        registry
    }

    /// Registers `loader` for `extension`, replacing any previous lane.
    pub(crate) fn register(
        &mut self,
        extension: &str,
        loader: impl AssetLoader<DecodedAudio> + Send + Sync + 'static,
    ) {
        self.loaders
            .insert(extension.to_ascii_lowercase(), Box::new(loader));
    }

    pub(crate) fn supports(&self, path: &Path) -> bool {
        extension_of(path).is_some_and(|ext| self.loaders.contains_key(&ext))
    }

    /// Decodes `bytes` with the lane registered for the extension of `path`.
    pub(crate) fn decode(&self, path: &Path, bytes: &[u8]) -> Result<DecodedAudio> {
        let extension = extension_of(path)
            .ok_or_else(|| anyhow!("'{}' has no file extension", path.display()))?;
        let loader = self
            .loaders
            .get(&extension)
            .ok_or_else(|| anyhow!("No audio loader registered for '.{}' files", extension))?;

        loader.load(bytes).map_err(|e| anyhow!(e.to_string()))
    }
}
