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

//! Implements a universal asset loader for audio formats using the `symphonia` library.

use super::DecodedAudio;
use crate::asset_lane::AssetLoader;
use anyhow::anyhow;
use cadenza_core::lane::{Lane, LaneKind};
use std::{error::Error, io::Cursor};
use symphonia::core::{
    audio::SampleBuffer, codecs::DecoderOptions, errors::Error as SymphoniaError,
    formats::FormatOptions, io::MediaSourceStream, meta::MetadataOptions, probe::Hint,
};

/// An `AssetLoader` that uses `symphonia` to decode compressed containers
/// (Ogg/Vorbis, FLAC, MP3, ...).
#[derive(Default)]
pub struct SymphoniaLoaderLane {
    extension: Option<String>,
}

impl SymphoniaLoaderLane {
    /// Creates a loader that probes the format from the data alone.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a loader that hints the prober with a file extension
    /// (without the leading dot).
    pub fn with_extension(extension: impl Into<String>) -> Self {
        Self {
            extension: Some(extension.into()),
        }
    }
}

impl AssetLoader<DecodedAudio> for SymphoniaLoaderLane {
    fn load(&self, bytes: &[u8]) -> Result<DecodedAudio, Box<dyn Error + Send + Sync>> {
        let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());

        let mut hint = Hint::new();
        if let Some(extension) = &self.extension {
            hint.with_extension(extension);
        }
        let meta_opts: MetadataOptions = Default::default();
        let fmt_opts: FormatOptions = Default::default();
        let probed = symphonia::default::get_probe().format(&hint, mss, &fmt_opts, &meta_opts)?;
        let mut format_reader = probed.format;

        let track = format_reader
            .default_track()
            .ok_or_else(|| anyhow!("No default audio track found"))?;

        let track_id = track.id;
        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| anyhow!("Unknown sample rate"))?;
        let channels = track
            .codec_params
            .channels
            .ok_or_else(|| anyhow!("Unknown channel count"))?;

        let dec_opts: DecoderOptions = Default::default();
        let mut decoder = symphonia::default::get_codecs().make(&track.codec_params, &dec_opts)?;

        let mut all_samples = Vec::<f32>::new();

        loop {
            let packet = match format_reader.next_packet() {
                Ok(packet) => packet,
                // End of stream.
                Err(SymphoniaError::IoError(_)) => break,
                Err(e) => return Err(Box::new(e)),
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    // Symphonia yields planar buffers; interleave into LRLR...
                    let mut sample_buf =
                        SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
                    sample_buf.copy_interleaved_ref(decoded);
                    all_samples.extend_from_slice(sample_buf.samples());
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    // A corrupt packet is skipped, not fatal.
                    log::warn!("SymphoniaLoader: Skipping undecodable packet: {e}");
                }
                Err(e) => return Err(Box::new(e)),
            }
        }

        Ok(DecodedAudio {
            samples: all_samples,
            channels: channels.count() as u16,
            sample_rate,
        })
    }
}

impl Lane for SymphoniaLoaderLane {
    fn strategy_name(&self) -> &'static str {
        "SymphoniaLoader"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Asset
    }
}
