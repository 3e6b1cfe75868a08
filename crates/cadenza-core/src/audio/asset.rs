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

//! Defines the core asset type for playable audio.

use super::format::{AudioFormat, SampleFormat};
use crate::asset::{Asset, AssetUUID};
use std::sync::Arc;

/// A decoded sound, ready to be handed to a mixer.
///
/// The sample buffer is raw interleaved bytes described by [`AudioFormat`].
/// It is reference counted, so cloning an `AudioAsset` is cheap and every
/// clone shares the same identity and data.
#[derive(Debug, Clone)]
pub struct AudioAsset {
    id: AssetUUID,
    samples: Arc<[u8]>,
    format: AudioFormat,
}

impl AudioAsset {
    /// Creates an asset with a fresh random identity.
    pub fn new(samples: impl Into<Arc<[u8]>>, format: AudioFormat) -> Self {
        Self::with_id(AssetUUID::new(), samples, format)
    }

    /// Creates an asset with an explicit identity.
    pub fn with_id(id: AssetUUID, samples: impl Into<Arc<[u8]>>, format: AudioFormat) -> Self {
        Self {
            id,
            samples: samples.into(),
            format,
        }
    }

    /// Creates a Float32 asset from interleaved `f32` samples.
    pub fn from_f32_samples(samples: &[f32], sample_rate: u32, channels: u16) -> Self {
        let bytes: &[u8] = bytemuck::cast_slice(samples);
        Self::new(
            bytes,
            AudioFormat::new(SampleFormat::Float32, sample_rate, channels),
        )
    }

    /// The asset's identity.
    pub fn id(&self) -> AssetUUID {
        self.id
    }

    /// The raw interleaved sample bytes.
    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    /// The format describing [`AudioAsset::samples`].
    pub fn format(&self) -> &AudioFormat {
        &self.format
    }

    /// Returns `true` if there are no sample bytes.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of complete frames, or `None` for an unknown encoding or zero
    /// channels.
    pub fn frame_count(&self) -> Option<usize> {
        match self.format.bytes_per_frame() {
            Some(frame) if frame > 0 => Some(self.samples.len() / frame),
            _ => None,
        }
    }
}

impl Asset for AudioAsset {}
