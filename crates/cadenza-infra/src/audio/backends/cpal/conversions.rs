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

//! Mapping between backend stream encodings and cpal sample formats.

use cadenza_core::audio::StreamEncoding;

/// Converts a [`StreamEncoding`] into the matching cpal sample format.
pub(super) fn to_cpal_format(encoding: StreamEncoding) -> cpal::SampleFormat {
    match encoding {
        StreamEncoding::U8 => cpal::SampleFormat::U8,
        StreamEncoding::I8 => cpal::SampleFormat::I8,
        StreamEncoding::I16 => cpal::SampleFormat::I16,
        StreamEncoding::U16 => cpal::SampleFormat::U16,
        StreamEncoding::I32 => cpal::SampleFormat::I32,
        StreamEncoding::F32 => cpal::SampleFormat::F32,
        StreamEncoding::F64 => cpal::SampleFormat::F64,
    }
}

/// Converts a cpal sample format into a [`StreamEncoding`], if it has one.
pub(super) fn from_cpal_format(format: cpal::SampleFormat) -> Option<StreamEncoding> {
    match format {
        cpal::SampleFormat::U8 => Some(StreamEncoding::U8),
        cpal::SampleFormat::I8 => Some(StreamEncoding::I8),
        cpal::SampleFormat::I16 => Some(StreamEncoding::I16),
        cpal::SampleFormat::U16 => Some(StreamEncoding::U16),
        cpal::SampleFormat::I32 => Some(StreamEncoding::I32),
        cpal::SampleFormat::F32 => Some(StreamEncoding::F32),
        cpal::SampleFormat::F64 => Some(StreamEncoding::F64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_encoding_maps_back() {
        for encoding in [
            StreamEncoding::U8,
            StreamEncoding::I8,
            StreamEncoding::I16,
            StreamEncoding::U16,
            StreamEncoding::I32,
            StreamEncoding::F32,
            StreamEncoding::F64,
        ] {
            assert_eq!(from_cpal_format(to_cpal_format(encoding)), Some(encoding));
        }
    }

    #[test]
    fn wide_formats_have_no_encoding() {
        assert_eq!(from_cpal_format(cpal::SampleFormat::I64), None);
        assert_eq!(from_cpal_format(cpal::SampleFormat::U32), None);
    }
}
