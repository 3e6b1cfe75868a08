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

//! An in-memory output backend.
//!
//! [`MemoryAudioBackend`] behaves like a real device without touching the
//! platform: streams queue and convert data exactly as on cpal, and the
//! device is driven explicitly with [`MemoryAudioBackend::render`]. Any
//! fallible operation can be made to fail on demand, which makes it the
//! backend of choice for tests and headless runs.

use crate::audio::backends::stream_table::{StreamState, StreamTable};
use cadenza_core::audio::{
    AudioBackend, BackendError, DeviceId, StereoGain, StreamId, StreamSpec,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// How many calls [`MemoryAudioBackend::calls`] remembers.
pub const CALL_LOG_CAPACITY: usize = 1024;

/// The fallible backend operations, used to inject failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendOp {
    /// [`AudioBackend::open_output_device`].
    OpenDevice,
    /// [`AudioBackend::device_format`].
    DeviceFormat,
    /// [`AudioBackend::pause_device`].
    PauseDevice,
    /// [`AudioBackend::resume_device`].
    ResumeDevice,
    /// [`AudioBackend::create_stream`].
    CreateStream,
    /// [`AudioBackend::bind_stream`].
    BindStream,
    /// [`AudioBackend::clear_stream`].
    ClearStream,
    /// [`AudioBackend::put_stream_data`].
    PutData,
    /// [`AudioBackend::flush_stream`].
    Flush,
    /// [`AudioBackend::queued_bytes`].
    QueuedBytes,
    /// [`AudioBackend::set_frequency_ratio`].
    FrequencyRatio,
    /// [`AudioBackend::set_gain`].
    Gain,
    /// [`AudioBackend::set_channel_gains`].
    ChannelGains,
    /// [`AudioBackend::pause_stream`].
    PauseStream,
    /// [`AudioBackend::resume_stream`].
    ResumeStream,
}

impl BackendOp {
    /// The name reported in a [`BackendError`] for this operation.
    pub const fn name(self) -> &'static str {
        match self {
            BackendOp::OpenDevice => "open_output_device",
            BackendOp::DeviceFormat => "device_format",
            BackendOp::PauseDevice => "pause_device",
            BackendOp::ResumeDevice => "resume_device",
            BackendOp::CreateStream => "create_stream",
            BackendOp::BindStream => "bind_stream",
            BackendOp::ClearStream => "clear_stream",
            BackendOp::PutData => "put_stream_data",
            BackendOp::Flush => "flush_stream",
            BackendOp::QueuedBytes => "queued_bytes",
            BackendOp::FrequencyRatio => "set_frequency_ratio",
            BackendOp::Gain => "set_gain",
            BackendOp::ChannelGains => "set_channel_gains",
            BackendOp::PauseStream => "pause_stream",
            BackendOp::ResumeStream => "resume_stream",
        }
    }
}

/// A point-in-time view of one stream.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamSnapshot {
    /// The stream handle.
    pub id: StreamId,
    /// The format data is pushed in.
    pub source: StreamSpec,
    /// The format of the device the stream feeds.
    pub destination: StreamSpec,
    /// The device the stream is bound to, if any.
    pub device: Option<DeviceId>,
    /// Whether consumption of this stream is paused.
    pub paused: bool,
    /// The applied frequency ratio.
    pub frequency_ratio: f32,
    /// The applied linear gain.
    pub gain: f32,
    /// The applied gains of output channels 0 and 1.
    pub channel_gains: StereoGain,
    /// Source-format bytes still waiting to be rendered.
    pub queued_bytes: usize,
}

impl StreamSnapshot {
    fn capture(id: StreamId, state: &StreamState) -> Self {
        Self {
            id,
            source: state.source(),
            destination: state.destination(),
            device: state.device(),
            paused: state.is_paused(),
            frequency_ratio: state.frequency_ratio(),
            gain: state.gain(),
            channel_gains: state.channel_gains(),
            queued_bytes: state.queued_bytes(),
        }
    }
}

#[derive(Debug)]
struct MemoryDevice {
    spec: StreamSpec,
    paused: bool,
}

#[derive(Debug, Default)]
struct MemoryState {
    device_format: Option<StreamSpec>,
    devices: HashMap<DeviceId, MemoryDevice>,
    next_device: u32,
    streams: StreamTable,
    fail_once: HashSet<BackendOp>,
    fail_always: HashSet<BackendOp>,
    /// The most recent calls, oldest first.
    calls: VecDeque<BackendOp>,
    call_counts: HashMap<BackendOp, usize>,
}

impl MemoryState {
    /// Records a call and returns the injected failure, if any.
    fn check(&mut self, op: BackendOp) -> Result<(), BackendError> {
        if self.calls.len() == CALL_LOG_CAPACITY {
            self.calls.pop_front();
        }
        self.calls.push_back(op);
        *self.call_counts.entry(op).or_default() += 1;
        if self.fail_once.remove(&op) || self.fail_always.contains(&op) {
            return Err(BackendError::new(op.name(), "injected failure"));
        }
        Ok(())
    }

    fn device(&mut self, op: BackendOp, id: DeviceId) -> Result<&mut MemoryDevice, BackendError> {
        self.devices
            .get_mut(&id)
            .ok_or_else(|| BackendError::new(op.name(), format!("invalid device {id}")))
    }
}

/// A cloneable handle to a simulated output backend.
///
/// Clones share state, so a test can keep one handle while another is owned
/// by the code under test.
#[derive(Debug, Clone, Default)]
pub struct MemoryAudioBackend {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryAudioBackend {
    /// Creates a backend whose devices accept whatever format is requested.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every opened device settle on `spec` instead of the requested format.
    pub fn with_device_format(self, spec: StreamSpec) -> Self {
        self.lock().device_format = Some(spec);
        self
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fails the next call of `op`.
    pub fn fail_next(&self, op: BackendOp) {
        self.lock().fail_once.insert(op);
    }

    /// Fails every call of `op` until [`MemoryAudioBackend::clear_faults`].
    pub fn fail_always(&self, op: BackendOp) {
        self.lock().fail_always.insert(op);
    }

    /// Removes every injected failure.
    pub fn clear_faults(&self) {
        let mut state = self.lock();
        state.fail_once.clear();
        state.fail_always.clear();
    }

    /// The last [`CALL_LOG_CAPACITY`] fallible operations called, in order.
    pub fn calls(&self) -> Vec<BackendOp> {
        self.lock().calls.iter().copied().collect()
    }

    /// How many times `op` has been called since the backend was created.
    pub fn call_count(&self, op: BackendOp) -> usize {
        self.lock().call_counts.get(&op).copied().unwrap_or(0)
    }

    /// Snapshots of all live streams, ordered by handle.
    pub fn streams(&self) -> Vec<StreamSnapshot> {
        let state = self.lock();
        let mut snapshots: Vec<StreamSnapshot> = state
            .streams
            .iter()
            .map(|(id, stream)| StreamSnapshot::capture(id, stream))
            .collect();
        snapshots.sort_by_key(|snapshot| snapshot.id);
        snapshots
    }

    /// A snapshot of one stream, if it is alive.
    pub fn stream(&self, id: StreamId) -> Option<StreamSnapshot> {
        let state = self.lock();
        state
            .streams
            .get(id)
            .ok()
            .map(|stream| StreamSnapshot::capture(id, stream))
    }

    /// The number of live streams, bound or not.
    pub fn stream_count(&self) -> usize {
        self.lock().streams.len()
    }

    /// The number of open devices.
    pub fn device_count(&self) -> usize {
        self.lock().devices.len()
    }

    /// Returns `true` if `device` is open and paused.
    pub fn is_device_paused(&self, device: DeviceId) -> bool {
        self.lock()
            .devices
            .get(&device)
            .is_some_and(|device| device.paused)
    }

    /// Consumes `frames` frames from `device`, returning the interleaved mix.
    ///
    /// A paused device renders silence and consumes nothing; an unknown one
    /// renders nothing at all.
    pub fn render(&self, device: DeviceId, frames: usize) -> Vec<f32> {
        let mut state = self.lock();
        let Some((spec, paused)) = state.devices.get(&device).map(|d| (d.spec, d.paused)) else {
            return Vec::new();
        };
        let channels = spec.channels as usize;
        let mut out = vec![0.0; frames * channels];
        if !paused {
            state
                .streams
                .mix_into(device, &mut out, channels, spec.sample_rate);
        }
        out
    }
}

impl AudioBackend for MemoryAudioBackend {
    fn open_output_device(&mut self, desired: &StreamSpec) -> Result<DeviceId, BackendError> {
        let mut state = self.lock();
        state.check(BackendOp::OpenDevice)?;

        let spec = state.device_format.unwrap_or(*desired);
        if spec.channels == 0 || spec.sample_rate == 0 {
            return Err(BackendError::new(
                BackendOp::OpenDevice.name(),
                "device format must have channels and a sample rate",
            ));
        }

        state.next_device += 1;
        let id = DeviceId(state.next_device);
        state.devices.insert(id, MemoryDevice { spec, paused: false });
        log::debug!("Opened in-memory audio output {id}.");
        Ok(id)
    }

    fn device_format(&self, device: DeviceId) -> Result<StreamSpec, BackendError> {
        let mut state = self.lock();
        state.check(BackendOp::DeviceFormat)?;
        Ok(state.device(BackendOp::DeviceFormat, device)?.spec)
    }

    fn close_device(&mut self, device: DeviceId) {
        let mut state = self.lock();
        if state.devices.remove(&device).is_some() {
            state.streams.unbind_device(device);
        }
    }

    fn pause_device(&mut self, device: DeviceId) -> Result<(), BackendError> {
        let mut state = self.lock();
        state.check(BackendOp::PauseDevice)?;
        state.device(BackendOp::PauseDevice, device)?.paused = true;
        Ok(())
    }

    fn resume_device(&mut self, device: DeviceId) -> Result<(), BackendError> {
        let mut state = self.lock();
        state.check(BackendOp::ResumeDevice)?;
        state.device(BackendOp::ResumeDevice, device)?.paused = false;
        Ok(())
    }

    fn create_stream(
        &mut self,
        source: &StreamSpec,
        destination: &StreamSpec,
    ) -> Result<StreamId, BackendError> {
        let mut state = self.lock();
        state.check(BackendOp::CreateStream)?;
        state.streams.create(source, destination)
    }

    fn bind_stream(&mut self, device: DeviceId, stream: StreamId) -> Result<(), BackendError> {
        let mut state = self.lock();
        state.check(BackendOp::BindStream)?;
        state.device(BackendOp::BindStream, device)?;
        state.streams.get_mut(stream)?.bind(device)
    }

    fn unbind_stream(&mut self, stream: StreamId) {
        if let Ok(state) = self.lock().streams.get_mut(stream) {
            state.unbind();
        }
    }

    fn clear_stream(&mut self, stream: StreamId) -> Result<(), BackendError> {
        let mut state = self.lock();
        state.check(BackendOp::ClearStream)?;
        state.streams.get_mut(stream)?.clear();
        Ok(())
    }

    fn destroy_stream(&mut self, stream: StreamId) {
        self.lock().streams.remove(stream);
    }

    fn put_stream_data(&mut self, stream: StreamId, data: &[u8]) -> Result<(), BackendError> {
        let mut state = self.lock();
        state.check(BackendOp::PutData)?;
        state.streams.get_mut(stream)?.put(data);
        Ok(())
    }

    fn flush_stream(&mut self, stream: StreamId) -> Result<(), BackendError> {
        let mut state = self.lock();
        state.check(BackendOp::Flush)?;
        state.streams.get_mut(stream)?.flush();
        Ok(())
    }

    fn queued_bytes(&self, stream: StreamId) -> Result<usize, BackendError> {
        let mut state = self.lock();
        state.check(BackendOp::QueuedBytes)?;
        Ok(state.streams.get(stream)?.queued_bytes())
    }

    fn set_frequency_ratio(&mut self, stream: StreamId, ratio: f32) -> Result<(), BackendError> {
        let mut state = self.lock();
        state.check(BackendOp::FrequencyRatio)?;
        state.streams.get_mut(stream)?.set_frequency_ratio(ratio)
    }

    fn set_gain(&mut self, stream: StreamId, gain: f32) -> Result<(), BackendError> {
        let mut state = self.lock();
        state.check(BackendOp::Gain)?;
        state.streams.get_mut(stream)?.set_gain(gain)
    }

    fn set_channel_gains(
        &mut self,
        stream: StreamId,
        gains: StereoGain,
    ) -> Result<(), BackendError> {
        let mut state = self.lock();
        state.check(BackendOp::ChannelGains)?;
        state.streams.get_mut(stream)?.set_channel_gains(gains)
    }

    fn pause_stream(&mut self, stream: StreamId) -> Result<(), BackendError> {
        let mut state = self.lock();
        state.check(BackendOp::PauseStream)?;
        state.streams.get_mut(stream)?.set_paused(true);
        Ok(())
    }

    fn resume_stream(&mut self, stream: StreamId) -> Result<(), BackendError> {
        let mut state = self.lock();
        state.check(BackendOp::ResumeStream)?;
        state.streams.get_mut(stream)?.set_paused(false);
        Ok(())
    }
}
