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

//! Decoding lanes for audio containers.
//!
//! Every lane produces [`DecodedAudio`]: interleaved `f32` samples in
//! `[-1.0, 1.0]`, whatever the container stored. Forcing float output here
//! keeps decoded assets eligible for spatialization.

mod symphonia_loader_lane;
mod wav_loader_lane;

pub use symphonia_loader_lane::*;
pub use wav_loader_lane::*;

use cadenza_core::asset::Asset;
use cadenza_core::audio::AudioAsset;

/// A sound decoded to interleaved floats.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    /// The raw, interleaved audio samples, ordered `[L, R, L, R, ...]` for stereo.
    pub samples: Vec<f32>,
    /// The number of channels in the audio data.
    pub channels: u16,
    /// The number of frames per second.
    pub sample_rate: u32,
}

impl DecodedAudio {
    /// Wraps the samples into a Float32 [`AudioAsset`] with a fresh identity.
    pub fn into_asset(self) -> AudioAsset {
        AudioAsset::from_f32_samples(&self.samples, self.sample_rate, self.channels)
    }
}

impl Asset for DecodedAudio {}
