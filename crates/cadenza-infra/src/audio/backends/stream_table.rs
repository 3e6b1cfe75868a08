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

//! The producer/consumer stream state shared by every backend.
//!
//! A [`StreamTable`] owns all streams of a backend. Producers push bytes in
//! the stream's source encoding; complete frames are decoded to `f32` and
//! mapped to the destination channel layout before they are queued, so the
//! realtime consumer only ever resamples, applies gain, and sums.
//!
//! Decoding goes through a [`FrameDecoder`] taken from the stream, which
//! needs no access to the table. Backends whose table is shared with a
//! realtime callback decode outside the lock and only lock to append.

use cadenza_core::audio::{
    BackendError, DeviceId, StereoGain, StreamEncoding, StreamId, StreamSpec,
};
use std::collections::{HashMap, VecDeque};

/// Lowest accepted frequency ratio.
pub(crate) const MIN_FREQUENCY_RATIO: f32 = 0.01;
/// Highest accepted frequency ratio.
pub(crate) const MAX_FREQUENCY_RATIO: f32 = 100.0;

/// Decodes one sample to a normalized `f32`.
///
/// `bytes` must be exactly one sample wide.
fn decode_sample(encoding: StreamEncoding, bytes: &[u8]) -> f32 {
    match encoding {
        StreamEncoding::U8 => (bytes[0] as f32 - 128.0) / 128.0,
        StreamEncoding::I8 => bytes[0] as i8 as f32 / 128.0,
        StreamEncoding::I16 => bytemuck::pod_read_unaligned::<i16>(bytes) as f32 / 32_768.0,
        StreamEncoding::U16 => {
            (bytemuck::pod_read_unaligned::<u16>(bytes) as f32 - 32_768.0) / 32_768.0
        }
        StreamEncoding::I32 => {
            bytemuck::pod_read_unaligned::<i32>(bytes) as f32 / 2_147_483_648.0
        }
        StreamEncoding::F32 => bytemuck::pod_read_unaligned::<f32>(bytes),
        StreamEncoding::F64 => bytemuck::pod_read_unaligned::<f64>(bytes) as f32,
    }
}

/// Appends one source frame to `frames`, remapped to `channels` channels.
///
/// Mono is duplicated, multi-channel into mono is averaged, anything else is
/// copied channel by channel and zero-filled.
fn push_mapped(source: &[f32], frames: &mut impl Extend<f32>, channels: usize) {
    if source.len() == channels {
        frames.extend(source.iter().copied());
    } else if source.len() == 1 {
        frames.extend(std::iter::repeat(source[0]).take(channels));
    } else if channels == 1 {
        frames.extend(std::iter::once(source.iter().sum::<f32>() / source.len() as f32));
    } else {
        frames.extend((0..channels).map(|c| source.get(c).copied().unwrap_or(0.0)));
    }
}

/// Decodes source bytes into destination-layout frames.
///
/// Holds the trailing partial frame of the stream it was taken from until the
/// result is appended back with [`StreamState::append`].
#[derive(Debug)]
pub(crate) struct FrameDecoder {
    source: StreamSpec,
    channels: usize,
    pending: Vec<u8>,
}

/// The output of a [`FrameDecoder`], ready to be appended to its stream.
#[derive(Debug)]
pub(crate) struct DecodedFrames {
    samples: Vec<f32>,
    pending: Vec<u8>,
}

impl FrameDecoder {
    fn push_frame(&self, frame: &[u8], decoded: &mut Vec<f32>, samples: &mut Vec<f32>) {
        let width = self.source.encoding.bytes_per_sample();
        decoded.clear();
        decoded.extend(
            frame
                .chunks_exact(width)
                .map(|s| decode_sample(self.source.encoding, s)),
        );
        push_mapped(&decoded[..], samples, self.channels);
    }

    /// Decodes every frame completed by `data`.
    pub(crate) fn decode(mut self, data: &[u8]) -> DecodedFrames {
        let frame = self.source.bytes_per_frame();
        let mut decoded = Vec::with_capacity(self.source.channels as usize);
        let mut samples = Vec::with_capacity((data.len() / frame + 1) * self.channels);
        let mut rest = data;

        if !self.pending.is_empty() {
            let missing = (frame - self.pending.len()).min(rest.len());
            self.pending.extend_from_slice(&rest[..missing]);
            rest = &rest[missing..];
            if self.pending.len() < frame {
                return DecodedFrames {
                    samples: Vec::new(),
                    pending: self.pending,
                };
            }
            let head = std::mem::take(&mut self.pending);
            self.push_frame(&head, &mut decoded, &mut samples);
        }

        let complete = rest.len() / frame * frame;
        for chunk in rest[..complete].chunks_exact(frame) {
            self.push_frame(chunk, &mut decoded, &mut samples);
        }
        self.pending.extend_from_slice(&rest[complete..]);

        DecodedFrames {
            samples,
            pending: self.pending,
        }
    }
}

/// A single producer-side stream.
#[derive(Debug)]
pub(crate) struct StreamState {
    source: StreamSpec,
    destination: StreamSpec,
    device: Option<DeviceId>,
    paused: bool,
    frequency_ratio: f32,
    gain: f32,
    /// Per-channel gains of output channels 0 and 1.
    channel_gains: StereoGain,
    /// Bytes of a trailing, incomplete source frame.
    pending: Vec<u8>,
    /// Decoded frames at the source rate, in the destination channel layout.
    frames: VecDeque<f32>,
    /// Fractional read position into `frames`, in frames.
    cursor: f64,
}

impl StreamState {
    fn new(source: StreamSpec, destination: StreamSpec) -> Self {
        Self {
            source,
            destination,
            device: None,
            paused: false,
            frequency_ratio: 1.0,
            gain: 1.0,
            channel_gains: StereoGain::UNITY,
            pending: Vec::new(),
            frames: VecDeque::new(),
            cursor: 0.0,
        }
    }

    pub(crate) fn source(&self) -> StreamSpec {
        self.source
    }

    pub(crate) fn destination(&self) -> StreamSpec {
        self.destination
    }

    pub(crate) fn device(&self) -> Option<DeviceId> {
        self.device
    }

    pub(crate) fn is_paused(&self) -> bool {
        self.paused
    }

    pub(crate) fn frequency_ratio(&self) -> f32 {
        self.frequency_ratio
    }

    pub(crate) fn gain(&self) -> f32 {
        self.gain
    }

    pub(crate) fn channel_gains(&self) -> StereoGain {
        self.channel_gains
    }

    pub(crate) fn bind(&mut self, device: DeviceId) -> Result<(), BackendError> {
        match self.device {
            Some(bound) => Err(BackendError::new(
                "bind_stream",
                format!("stream is already bound to {bound}"),
            )),
            None => {
                self.device = Some(device);
                Ok(())
            }
        }
    }

    pub(crate) fn unbind(&mut self) {
        self.device = None;
    }

    pub(crate) fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub(crate) fn set_frequency_ratio(&mut self, ratio: f32) -> Result<(), BackendError> {
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(BackendError::new(
                "set_frequency_ratio",
                format!("invalid frequency ratio {ratio}"),
            ));
        }
        self.frequency_ratio = ratio.clamp(MIN_FREQUENCY_RATIO, MAX_FREQUENCY_RATIO);
        Ok(())
    }

    pub(crate) fn set_gain(&mut self, gain: f32) -> Result<(), BackendError> {
        if !gain.is_finite() {
            return Err(BackendError::new("set_gain", format!("invalid gain {gain}")));
        }
        self.gain = gain.max(0.0);
        Ok(())
    }

    pub(crate) fn set_channel_gains(&mut self, gains: StereoGain) -> Result<(), BackendError> {
        if !gains.left.is_finite() || !gains.right.is_finite() {
            return Err(BackendError::new(
                "set_channel_gains",
                format!("invalid channel gains {gains:?}"),
            ));
        }
        self.channel_gains = StereoGain::new(gains.left.max(0.0), gains.right.max(0.0));
        Ok(())
    }

    /// Hands out a decoder carrying this stream's partial frame.
    ///
    /// The partial frame is moved out, so the decoder's result must be
    /// appended back before the next push.
    pub(crate) fn decoder(&mut self) -> FrameDecoder {
        FrameDecoder {
            source: self.source,
            channels: self.destination.channels as usize,
            pending: std::mem::take(&mut self.pending),
        }
    }

    /// Queues frames produced by [`StreamState::decoder`].
    pub(crate) fn append(&mut self, decoded: DecodedFrames) {
        self.frames.extend(decoded.samples);
        self.pending = decoded.pending;
    }

    /// Queues `data` and decodes every complete frame it completes.
    pub(crate) fn put(&mut self, data: &[u8]) {
        let decoded = self.decoder().decode(data);
        self.append(decoded);
    }

    /// Turns a trailing partial frame into a full one, padding missing
    /// samples with silence.
    pub(crate) fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }

        let width = self.source.encoding.bytes_per_sample();
        let mut decoded: Vec<f32> = self
            .pending
            .chunks_exact(width)
            .map(|s| decode_sample(self.source.encoding, s))
            .collect();
        decoded.resize(self.source.channels as usize, 0.0);
        push_mapped(&decoded, &mut self.frames, self.destination.channels as usize);
        self.pending.clear();
    }

    pub(crate) fn clear(&mut self) {
        self.pending.clear();
        self.frames.clear();
        self.cursor = 0.0;
    }

    fn available_frames(&self) -> usize {
        self.frames.len() / self.destination.channels as usize
    }

    /// Source-format bytes not yet consumed.
    pub(crate) fn queued_bytes(&self) -> usize {
        let unread = self.available_frames().saturating_sub(self.cursor as usize);
        unread * self.source.bytes_per_frame() + self.pending.len()
    }

    /// Adds this stream's contribution to `out`.
    ///
    /// Frames are read at `frequency_ratio * source_rate / device_rate` frames
    /// per output frame with linear interpolation, then scaled by the gain
    /// and, on the first two channels, by the channel gains.
    pub(crate) fn render(&mut self, out: &mut [f32], out_channels: usize, device_rate: u32) {
        let channels = self.destination.channels as usize;
        let available = self.available_frames();
        if self.paused || available == 0 || out_channels == 0 || device_rate == 0 {
            return;
        }

        let step = self.frequency_ratio as f64 * self.source.sample_rate as f64 / device_rate as f64;
        let mixed = channels.min(out_channels);
        let weights = [
            self.gain * self.channel_gains.left,
            self.gain * self.channel_gains.right,
        ];

        for out_frame in out.chunks_exact_mut(out_channels) {
            let index = self.cursor as usize;
            if index >= available {
                break;
            }
            let next = (index + 1).min(available - 1);
            let t = (self.cursor - index as f64) as f32;

            for (c, sample) in out_frame.iter_mut().take(mixed).enumerate() {
                let a = self.frames[index * channels + c];
                let b = self.frames[next * channels + c];
                let weight = weights.get(c).copied().unwrap_or(self.gain);
                *sample += (a + (b - a) * t) * weight;
            }
            self.cursor += step;
        }

        let consumed = (self.cursor as usize).min(available);
        self.frames.drain(..consumed * channels);
        self.cursor -= consumed as f64;
        if self.frames.is_empty() {
            self.cursor = 0.0;
        }
    }
}

/// All streams of one backend, keyed by handle.
#[derive(Debug, Default)]
pub(crate) struct StreamTable {
    next_id: u32,
    streams: HashMap<StreamId, StreamState>,
}

fn validate_spec(operation: &'static str, spec: &StreamSpec) -> Result<(), BackendError> {
    if spec.channels == 0 {
        return Err(BackendError::new(operation, "channel count must be non-zero"));
    }
    if spec.sample_rate == 0 {
        return Err(BackendError::new(operation, "sample rate must be non-zero"));
    }
    Ok(())
}

impl StreamTable {
    pub(crate) fn create(
        &mut self,
        source: &StreamSpec,
        destination: &StreamSpec,
    ) -> Result<StreamId, BackendError> {
        validate_spec("create_stream", source)?;
        validate_spec("create_stream", destination)?;

        self.next_id += 1;
        let id = StreamId(self.next_id);
        self.streams.insert(id, StreamState::new(*source, *destination));
        Ok(id)
    }

    pub(crate) fn get(&self, id: StreamId) -> Result<&StreamState, BackendError> {
        self.streams
            .get(&id)
            .ok_or_else(|| BackendError::new("stream lookup", format!("invalid stream {id}")))
    }

    pub(crate) fn get_mut(&mut self, id: StreamId) -> Result<&mut StreamState, BackendError> {
        self.streams
            .get_mut(&id)
            .ok_or_else(|| BackendError::new("stream lookup", format!("invalid stream {id}")))
    }

    pub(crate) fn remove(&mut self, id: StreamId) -> Option<StreamState> {
        self.streams.remove(&id)
    }

    pub(crate) fn unbind_device(&mut self, device: DeviceId) {
        for stream in self.streams.values_mut() {
            if stream.device == Some(device) {
                stream.unbind();
            }
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (StreamId, &StreamState)> {
        self.streams.iter().map(|(id, state)| (*id, state))
    }

    pub(crate) fn len(&self) -> usize {
        self.streams.len()
    }

    /// Fills `out` with the sum of every stream bound to `device`, hard
    /// limited to `[-1.0, 1.0]`.
    pub(crate) fn mix_into(
        &mut self,
        device: DeviceId,
        out: &mut [f32],
        out_channels: usize,
        device_rate: u32,
    ) {
        out.fill(0.0);

        for stream in self.streams.values_mut() {
            if stream.device == Some(device) {
                stream.render(out, out_channels, device_rate);
            }
        }

        for sample in out.iter_mut() {
            *sample = sample.clamp(-1.0, 1.0);
        }
    }
}
