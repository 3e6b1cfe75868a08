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

//! Stereo gain pairs and the per-call spatial settings derived from them.

/// Left/right linear gains applied to a spatialized sound.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StereoGain {
    /// Gain of the left channel.
    pub left: f32,
    /// Gain of the right channel.
    pub right: f32,
}

impl StereoGain {
    /// Full volume on both channels, no panning.
    pub const UNITY: Self = Self::new(1.0, 1.0);

    /// Creates a gain pair.
    pub const fn new(left: f32, right: f32) -> Self {
        Self { left, right }
    }

    /// The combined power of both channels (`left² + right²`).
    pub fn power(&self) -> f32 {
        self.left * self.left + self.right * self.right
    }
}

impl Default for StereoGain {
    fn default() -> Self {
        Self::UNITY
    }
}

/// The outcome of resolving whether a sound can be spatialized.
///
/// `enabled` is false whenever spatialization was requested but the asset or
/// device cannot support it; that is a soft failure, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpatialSettings {
    /// Whether a position was supplied for this sound.
    pub requested: bool,
    /// Whether the sound will actually be spatialized.
    pub enabled: bool,
    /// The gains to apply when `enabled`.
    pub gain: StereoGain,
}

impl SpatialSettings {
    /// Settings for a sound that was never positioned.
    pub const fn unspatialized() -> Self {
        Self {
            requested: false,
            enabled: false,
            gain: StereoGain::UNITY,
        }
    }

    /// Settings for a sound that was positioned but cannot be spatialized.
    pub const fn unsupported() -> Self {
        Self {
            requested: true,
            enabled: false,
            gain: StereoGain::UNITY,
        }
    }

    /// Settings for a sound spatialized with `gain`.
    pub const fn spatialized(gain: StereoGain) -> Self {
        Self {
            requested: true,
            enabled: true,
            gain,
        }
    }
}
