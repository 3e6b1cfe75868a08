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

//! Folds N-channel float audio into a gain-weighted stereo image.

use cadenza_core::audio::{AudioFormat, SampleFormat, StereoGain};
use cadenza_core::lane::{Lane, LaneKind};
use thiserror::Error;

const FLOAT_WIDTH: usize = std::mem::size_of::<f32>();

/// Errors raised when a buffer cannot be down-mixed.
///
/// These indicate corrupt or mislabeled asset data; the lane never guesses.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DownmixError {
    /// The source is not float-encoded.
    #[error("down-mixing requires Float32 samples, got {0:?}")]
    EncodingMismatch(SampleFormat),
    /// The source declares zero channels.
    #[error("down-mixing requires at least one channel")]
    ZeroChannels,
    /// The buffer does not hold a whole number of samples or frames.
    #[error("buffer of {len} bytes is not a whole number of {channels}-channel float frames")]
    SizeMismatch {
        /// Length of the offending buffer in bytes.
        len: usize,
        /// Declared channel count.
        channels: u16,
    },
}

/// A lane averaging every input channel to mono, then spreading the mono
/// signal over two output channels with a [`StereoGain`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DownmixLane;

impl DownmixLane {
    /// Creates a new `DownmixLane`.
    pub fn new() -> Self {
        Self
    }

    /// Down-mixes interleaved `data` described by `format` into interleaved
    /// stereo `[L, R, L, R, ...]`, one output frame per input frame.
    pub fn downmix(
        &self,
        data: &[u8],
        format: &AudioFormat,
        gain: StereoGain,
    ) -> Result<Vec<f32>, DownmixError> {
        if format.sample_format != SampleFormat::Float32 {
            return Err(DownmixError::EncodingMismatch(format.sample_format));
        }
        if format.channels == 0 {
            return Err(DownmixError::ZeroChannels);
        }

        let channels = format.channels as usize;
        let frame_width = FLOAT_WIDTH * channels;
        if data.len() % FLOAT_WIDTH != 0 || data.len() % frame_width != 0 {
            return Err(DownmixError::SizeMismatch {
                len: data.len(),
                channels: format.channels,
            });
        }

        let mut output = Vec::with_capacity(data.len() / frame_width * 2);
        for frame in data.chunks_exact(frame_width) {
            let sum: f32 = frame
                .chunks_exact(FLOAT_WIDTH)
                .map(bytemuck::pod_read_unaligned::<f32>)
                .sum();
            let mono = sum / channels as f32;
            output.push(mono * gain.left);
            output.push(mono * gain.right);
        }

        Ok(output)
    }
}

impl Lane for DownmixLane {
    fn strategy_name(&self) -> &'static str {
        "StereoDownmix"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Audio
    }
}

/// Down-mixes with a default [`DownmixLane`].
pub fn downmix(
    data: &[u8],
    format: &AudioFormat,
    gain: StereoGain,
) -> Result<Vec<f32>, DownmixError> {
    DownmixLane.downmix(data, format, gain)
}
