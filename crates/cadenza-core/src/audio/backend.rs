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

//! Defines the abstract `AudioBackend` trait.
//!
//! The backend is the boundary between the engine's playback logic and the
//! platform layer that talks to the sound card. Its model is a set of
//! producer-side *streams*: the engine pushes bytes into a stream, the stream
//! is bound to an output device, and the device consumes queued frames on its
//! own realtime thread. Every call is synchronous and may fail; failures are
//! described by a [`BackendError`].

use super::gain::StereoGain;
use std::fmt;

/// The concrete sample encodings understood by output backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamEncoding {
    /// Unsigned 8-bit integer.
    U8,
    /// Signed 8-bit integer.
    I8,
    /// Signed 16-bit integer, native endian.
    I16,
    /// Unsigned 16-bit integer, native endian.
    U16,
    /// Signed 32-bit integer, native endian.
    I32,
    /// 32-bit float, native endian.
    F32,
    /// 64-bit float, native endian.
    F64,
}

impl StreamEncoding {
    /// Returns the width of one sample in bytes.
    pub const fn bytes_per_sample(self) -> usize {
        match self {
            StreamEncoding::U8 | StreamEncoding::I8 => 1,
            StreamEncoding::I16 | StreamEncoding::U16 => 2,
            StreamEncoding::I32 | StreamEncoding::F32 => 4,
            StreamEncoding::F64 => 8,
        }
    }
}

/// The backend-side description of a stream or device format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamSpec {
    /// The sample encoding.
    pub encoding: StreamEncoding,
    /// Frames per second.
    pub sample_rate: u32,
    /// Interleaved channels per frame.
    pub channels: u16,
}

impl StreamSpec {
    /// Creates a new stream specification.
    pub const fn new(encoding: StreamEncoding, sample_rate: u32, channels: u16) -> Self {
        Self {
            encoding,
            sample_rate,
            channels,
        }
    }

    /// The size of one interleaved frame in bytes.
    pub const fn bytes_per_frame(&self) -> usize {
        self.encoding.bytes_per_sample() * self.channels as usize
    }
}

/// An opaque handle to an opened output device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(pub u32);

/// An opaque handle to a stream created by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamId(pub u32);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device#{}", self.0)
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stream#{}", self.0)
    }
}

/// A string-described failure reported by a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendError {
    /// The backend operation that failed (e.g. `"put_stream_data"`).
    pub operation: &'static str,
    /// The backend's description of the failure.
    pub message: String,
}

impl BackendError {
    /// Creates a new error for the given operation.
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.operation, self.message)
    }
}

impl std::error::Error for BackendError {}

/// The abstract contract for a hardware (or simulated) audio output backend.
///
/// Implementations own the realtime consumption side. All producer-side calls
/// are made from a single engine thread; implementations synchronize with
/// their own consumer internally.
pub trait AudioBackend {
    /// Opens the default output device, asking for `desired` as its format.
    ///
    /// The device may settle on a different format; query it with
    /// [`AudioBackend::device_format`].
    fn open_output_device(&mut self, desired: &StreamSpec) -> Result<DeviceId, BackendError>;

    /// Returns the format the device actually consumes.
    fn device_format(&self, device: DeviceId) -> Result<StreamSpec, BackendError>;

    /// Closes the device. Streams still bound to it are unbound.
    fn close_device(&mut self, device: DeviceId);

    /// Pauses consumption for every stream bound to the device.
    fn pause_device(&mut self, device: DeviceId) -> Result<(), BackendError>;

    /// Resumes consumption for the device.
    fn resume_device(&mut self, device: DeviceId) -> Result<(), BackendError>;

    /// Creates an unbound stream converting from `source` to `destination`.
    fn create_stream(
        &mut self,
        source: &StreamSpec,
        destination: &StreamSpec,
    ) -> Result<StreamId, BackendError>;

    /// Binds a stream to a device so the device starts consuming it.
    fn bind_stream(&mut self, device: DeviceId, stream: StreamId) -> Result<(), BackendError>;

    /// Unbinds a stream from whichever device it is bound to.
    fn unbind_stream(&mut self, stream: StreamId);

    /// Drops all data queued in the stream.
    fn clear_stream(&mut self, stream: StreamId) -> Result<(), BackendError>;

    /// Releases the stream. The handle is invalid afterwards.
    fn destroy_stream(&mut self, stream: StreamId);

    /// Appends raw bytes, encoded in the stream's source format.
    fn put_stream_data(&mut self, stream: StreamId, data: &[u8]) -> Result<(), BackendError>;

    /// Makes all pushed data available to the consumer, including any
    /// trailing partial frame.
    fn flush_stream(&mut self, stream: StreamId) -> Result<(), BackendError>;

    /// Returns the number of source-format bytes still waiting to be consumed.
    fn queued_bytes(&self, stream: StreamId) -> Result<usize, BackendError>;

    /// Sets the playback frequency ratio (pitch and speed combined).
    fn set_frequency_ratio(&mut self, stream: StreamId, ratio: f32) -> Result<(), BackendError>;

    /// Sets the linear output gain of the stream.
    fn set_gain(&mut self, stream: StreamId, gain: f32) -> Result<(), BackendError>;

    /// Sets the gains of the first two output channels, applied at render
    /// time on top of [`AudioBackend::set_gain`]. Data already queued is
    /// heard with the new gains from the next rendered frame.
    fn set_channel_gains(
        &mut self,
        stream: StreamId,
        gains: StereoGain,
    ) -> Result<(), BackendError>;

    /// Pauses consumption of a single stream, keeping its queued data.
    fn pause_stream(&mut self, stream: StreamId) -> Result<(), BackendError>;

    /// Resumes consumption of a single stream.
    fn resume_stream(&mut self, stream: StreamId) -> Result<(), BackendError>;
}
