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

//! Implements an asset loader for `.wav` audio files.

use super::DecodedAudio;
use crate::asset_lane::AssetLoader;
use anyhow::anyhow;
use cadenza_core::lane::{Lane, LaneKind};
use std::{error::Error, io::Cursor};

/// An `AssetLoader` that decodes audio data from the WAV format.
#[derive(Default)]
pub struct WavLoaderLane;

impl WavLoaderLane {
    /// Creates a new instance of `WavLoaderLane`.
    pub fn new() -> Self {
        Self
    }
}

impl AssetLoader<DecodedAudio> for WavLoaderLane {
    /// Parses a byte slice representing a `.wav` file, converting every
    /// integer encoding to normalized `f32`.
    fn load(&self, bytes: &[u8]) -> Result<DecodedAudio, Box<dyn Error + Send + Sync>> {
        let cursor = Cursor::new(bytes);
        let mut reader = hound::WavReader::new(cursor)?;

        let spec = reader.spec();
        if spec.channels == 0 {
            return Err(anyhow!("WAV header declares zero channels").into());
        }

        let samples: Result<Vec<f32>, _> = match spec.sample_format {
            hound::SampleFormat::Float => reader.samples::<f32>().collect(),
            hound::SampleFormat::Int => {
                let max_value = (1u64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
                reader
                    .samples::<i32>()
                    .map(|sample| sample.map(|s| s as f32 / max_value))
                    .collect()
            }
        };

        let samples = samples.map_err(|e| anyhow!("Failed to parse WAV samples: {}", e))?;

        Ok(DecodedAudio {
            samples,
            channels: spec.channels,
            sample_rate: spec.sample_rate,
        })
    }
}

impl Lane for WavLoaderLane {
    fn strategy_name(&self) -> &'static str {
        "WavLoader"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Asset
    }
}
