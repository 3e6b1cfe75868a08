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

//! Conversions between the engine's [`AudioFormat`] and the backend's [`StreamSpec`].
//!
//! The mapping is 1:1 for the four supported encodings and performs no bit
//! depth scaling; converting sample values is the backend's job.

use super::backend::{StreamEncoding, StreamSpec};
use super::format::{AudioFormat, SampleFormat};
use std::fmt;

/// Returned when a format has no backend equivalent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatError {
    /// The sample encoding cannot be handed to a backend.
    Unsupported(SampleFormat),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::Unsupported(format) => {
                write!(f, "Unsupported audio sample format: {format:?}")
            }
        }
    }
}

impl std::error::Error for FormatError {}

/// Converts an engine format descriptor into the backend's stream spec.
///
/// Fails with [`FormatError::Unsupported`] for `SampleFormat::Unknown`; callers
/// must check the result before creating a stream from it.
pub fn to_stream_spec(format: &AudioFormat) -> Result<StreamSpec, FormatError> {
    let encoding = match format.sample_format {
        SampleFormat::UInt8 => StreamEncoding::U8,
        SampleFormat::Int16 => StreamEncoding::I16,
        SampleFormat::Int32 => StreamEncoding::I32,
        SampleFormat::Float32 => StreamEncoding::F32,
        SampleFormat::Unknown => return Err(FormatError::Unsupported(format.sample_format)),
    };

    Ok(StreamSpec::new(encoding, format.sample_rate, format.channels))
}

/// Converts a backend stream spec back into an engine format descriptor.
///
/// Encodings the engine has no name for map to `SampleFormat::Unknown`.
pub fn from_stream_spec(spec: &StreamSpec) -> AudioFormat {
    let sample_format = match spec.encoding {
        StreamEncoding::U8 => SampleFormat::UInt8,
        StreamEncoding::I16 => SampleFormat::Int16,
        StreamEncoding::I32 => SampleFormat::Int32,
        StreamEncoding::F32 => SampleFormat::Float32,
        StreamEncoding::I8 | StreamEncoding::U16 | StreamEncoding::F64 => SampleFormat::Unknown,
    };

    AudioFormat::new(sample_format, spec.sample_rate, spec.channels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_formats_round_trip() {
        for sample_format in [
            SampleFormat::UInt8,
            SampleFormat::Int16,
            SampleFormat::Int32,
            SampleFormat::Float32,
        ] {
            let format = AudioFormat::new(sample_format, 22_050, 3);
            let spec = to_stream_spec(&format).expect("supported format must convert");
            assert_eq!(from_stream_spec(&spec), format);
        }
    }

    #[test]
    fn unknown_format_is_rejected() {
        let format = AudioFormat::new(SampleFormat::Unknown, 44_100, 2);
        assert_eq!(
            to_stream_spec(&format),
            Err(FormatError::Unsupported(SampleFormat::Unknown))
        );
    }

    #[test]
    fn foreign_encodings_map_to_unknown() {
        let spec = StreamSpec::new(StreamEncoding::F64, 96_000, 2);
        let format = from_stream_spec(&spec);
        assert_eq!(format.sample_format, SampleFormat::Unknown);
        assert_eq!(format.sample_rate, 96_000);
        assert_eq!(format.channels, 2);
    }

    #[test]
    fn encoding_widths_match() {
        let format = AudioFormat::new(SampleFormat::Int16, 44_100, 2);
        let spec = to_stream_spec(&format).unwrap();
        assert_eq!(Some(spec.bytes_per_frame()), format.bytes_per_frame());
    }
}
