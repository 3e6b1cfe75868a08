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

//! Configuration for the audio playback engine.

use super::format::AudioFormat;
use crate::math::Vec3;

/// Configuration for the audio agent.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AudioConfig {
    /// The format requested when opening the output device.
    /// The device is free to settle on a different one.
    pub desired_format: AudioFormat,
    /// Position used to spatialize voices that were created before any
    /// position was set for them. `None` leaves such voices unspatialized.
    pub default_position: Option<Vec3>,
    /// Whether starting a voice also resumes the output device.
    pub resume_device_on_play: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            desired_format: AudioFormat::default(),
            default_position: None,
            resume_device_on_play: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::format::SampleFormat;

    #[test]
    fn default_requests_float_stereo() {
        let config = AudioConfig::default();
        assert_eq!(config.desired_format.sample_format, SampleFormat::Float32);
        assert_eq!(config.desired_format.channels, 2);
        assert_eq!(config.desired_format.sample_rate, 48_000);
        assert!(config.default_position.is_none());
        assert!(config.resume_device_on_play);
    }
}
