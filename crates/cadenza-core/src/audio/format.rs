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

//! Device-neutral descriptors for interleaved PCM sample data.

/// The encoding of a single sample within an interleaved buffer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SampleFormat {
    /// The encoding could not be determined. Never playable.
    #[default]
    Unknown,
    /// Unsigned 8-bit integer samples, centered on 128.
    UInt8,
    /// Signed 16-bit integer samples.
    Int16,
    /// Signed 32-bit integer samples.
    Int32,
    /// 32-bit IEEE float samples, nominally in `[-1.0, 1.0]`.
    Float32,
}

impl SampleFormat {
    /// Returns the width of one sample in bytes, or `None` for `Unknown`.
    pub const fn bytes_per_sample(self) -> Option<usize> {
        match self {
            SampleFormat::UInt8 => Some(1),
            SampleFormat::Int16 => Some(2),
            SampleFormat::Int32 | SampleFormat::Float32 => Some(4),
            SampleFormat::Unknown => None,
        }
    }

    /// Returns `true` for float-encoded samples.
    pub const fn is_float(self) -> bool {
        matches!(self, SampleFormat::Float32)
    }
}

/// Describes the layout of an interleaved sample buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AudioFormat {
    /// The encoding of each sample.
    pub sample_format: SampleFormat,
    /// The number of frames per second (e.g., 48000 Hz).
    pub sample_rate: u32,
    /// The number of interleaved channels per frame.
    pub channels: u16,
}

impl AudioFormat {
    /// Creates a new format descriptor.
    pub const fn new(sample_format: SampleFormat, sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_format,
            sample_rate,
            channels,
        }
    }

    /// The size of one interleaved frame in bytes, or `None` when the
    /// encoding is unknown.
    pub fn bytes_per_frame(&self) -> Option<usize> {
        self.sample_format
            .bytes_per_sample()
            .map(|width| width * self.channels as usize)
    }
}

impl Default for AudioFormat {
    /// Float32 stereo at 48 kHz, the engine's preferred output format.
    fn default() -> Self {
        Self::new(SampleFormat::Float32, 48_000, 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_widths() {
        assert_eq!(SampleFormat::UInt8.bytes_per_sample(), Some(1));
        assert_eq!(SampleFormat::Int16.bytes_per_sample(), Some(2));
        assert_eq!(SampleFormat::Int32.bytes_per_sample(), Some(4));
        assert_eq!(SampleFormat::Float32.bytes_per_sample(), Some(4));
        assert_eq!(SampleFormat::Unknown.bytes_per_sample(), None);
    }

    #[test]
    fn frame_size_accounts_for_channels() {
        let format = AudioFormat::new(SampleFormat::Int16, 44_100, 6);
        assert_eq!(format.bytes_per_frame(), Some(12));
        let unknown = AudioFormat::new(SampleFormat::Unknown, 44_100, 2);
        assert_eq!(unknown.bytes_per_frame(), None);
    }
}
