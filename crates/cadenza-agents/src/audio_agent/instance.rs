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

//! Playback instances and the store that keys them by asset identity.

use anyhow::{anyhow, Context, Result};
use cadenza_core::audio::{
    AudioAsset, AudioBackend, DeviceId, SpatialSettings, StereoGain, StreamId, StreamSpec,
};
use cadenza_core::{AssetUUID, Vec3};
use cadenza_lanes::audio_lane::DownmixLane;
use std::collections::HashMap;

/// Lowest frequency ratio applied to a stream.
pub const MIN_FREQUENCY_RATIO: f32 = 0.01;
/// Highest frequency ratio applied to a stream.
pub const MAX_FREQUENCY_RATIO: f32 = 100.0;

/// Largest buffer, in bytes, that can be queued in one push.
const MAX_QUEUE_BYTES: usize = i32::MAX as usize;

/// The opened output device and the format it consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct OutputDevice {
    pub(crate) id: DeviceId,
    pub(crate) spec: StreamSpec,
}

/// The channel layout of an instance's stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamLayout {
    /// The stream carries the asset's bytes unchanged.
    Native,
    /// The stream carries a Float32 stereo down-mix, panned by per-channel
    /// gains on the stream.
    SpatialStereo,
}

/// Whether an instance lookup may create a missing instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatePolicy {
    /// Only return an instance that already exists.
    ExistingOnly,
    /// Build and start a new instance when none exists.
    CreateIfMissing,
}

/// The outcome of looking up the instance of an asset.
///
/// Successful outcomes carry the handle of the instance's bound stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceLookup {
    /// A live instance was found and kept.
    Reused(StreamId),
    /// A new stream was built, either for a missing instance or because the
    /// stream layout of an existing one had to change.
    Created(StreamId),
    /// No instance exists and none was requested.
    Absent,
    /// Building the instance failed; nothing was left behind.
    Failed,
}

/// Rejects buffers the backend cannot take in a single push.
pub(crate) fn ensure_queueable(len: usize) -> Result<()> {
    if len > MAX_QUEUE_BYTES {
        return Err(anyhow!(
            "buffer of {len} bytes exceeds the {MAX_QUEUE_BYTES} byte queue limit"
        ));
    }
    Ok(())
}

/// The caller-controlled state of a voice, kept when its stream is rebuilt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct VoiceState {
    pub(crate) pitch: f32,
    pub(crate) speed: f32,
    pub(crate) volume: f32,
    pub(crate) looping: bool,
    pub(crate) playing: bool,
}

impl Default for VoiceState {
    fn default() -> Self {
        Self {
            pitch: 1.0,
            speed: 1.0,
            volume: 1.0,
            looping: false,
            playing: true,
        }
    }
}

/// The live state of one voice.
///
/// An instance only exists while its stream is bound to the output device.
#[derive(Debug, Clone)]
pub(crate) struct PlaybackInstance {
    pub(crate) asset: AudioAsset,
    pub(crate) stream: StreamId,
    pub(crate) layout: StreamLayout,
    pub(crate) voice: VoiceState,
    pub(crate) gain: StereoGain,
    pub(crate) position: Option<Vec3>,
}

impl PlaybackInstance {
    /// Creates a stream for `asset`, binds it, and queues the asset once.
    ///
    /// The stream is paused and tuned from `voice` before it is bound, so the
    /// device never renders it in any other state. Every backend resource
    /// acquired along the way is released again when a later step fails.
    pub(crate) fn open(
        backend: &mut dyn AudioBackend,
        downmix: &DownmixLane,
        device: &OutputDevice,
        asset: &AudioAsset,
        source: &StreamSpec,
        spatial: SpatialSettings,
        voice: VoiceState,
    ) -> Result<Self> {
        let stream = backend
            .create_stream(source, &device.spec)
            .context("failed to create audio stream")?;

        let instance = Self {
            asset: asset.clone(),
            stream,
            layout: if spatial.enabled {
                StreamLayout::SpatialStereo
            } else {
                StreamLayout::Native
            },
            voice,
            gain: spatial.gain,
            position: None,
        };

        if !voice.playing {
            if let Err(e) = backend.pause_stream(stream) {
                backend.destroy_stream(stream);
                return Err(anyhow!(e).context("failed to pause audio stream"));
            }
        }
        instance.apply_tuning(backend);

        if let Err(e) = backend.bind_stream(device.id, stream) {
            backend.destroy_stream(stream);
            return Err(anyhow!(e).context("failed to bind audio stream"));
        }

        if let Err(e) = instance.submit(backend, downmix) {
            instance.destroy(backend);
            return Err(e);
        }

        Ok(instance)
    }

    pub(crate) fn is_spatial(&self) -> bool {
        self.layout == StreamLayout::SpatialStereo
    }

    /// The combined pitch and speed, clamped to the accepted range.
    pub(crate) fn frequency_ratio(&self) -> f32 {
        (self.voice.pitch * self.voice.speed).clamp(MIN_FREQUENCY_RATIO, MAX_FREQUENCY_RATIO)
    }

    /// Pushes the whole asset into the stream and flushes it.
    ///
    /// Spatial instances push an unweighted stereo down-mix; their pan lives
    /// in the stream's channel gains. A failed push is an error; a failed
    /// flush is only logged.
    pub(crate) fn submit(
        &self,
        backend: &mut dyn AudioBackend,
        downmix: &DownmixLane,
    ) -> Result<()> {
        let mixed;
        let data: &[u8] = match self.layout {
            StreamLayout::Native => self.asset.samples(),
            StreamLayout::SpatialStereo => {
                mixed =
                    downmix.downmix(self.asset.samples(), self.asset.format(), StereoGain::UNITY)?;
                bytemuck::cast_slice(&mixed)
            }
        };

        if data.is_empty() {
            return Err(anyhow!("asset {} has no sample data", self.asset.id()));
        }
        ensure_queueable(data.len())?;

        backend
            .put_stream_data(self.stream, data)
            .context("failed to queue audio data")?;

        if let Err(e) = backend.flush_stream(self.stream) {
            log::warn!("AudioAgent: Failed to flush audio stream {}: {e}", self.stream);
        }
        Ok(())
    }

    /// Applies frequency ratio, volume, and the stereo gain of a spatial
    /// stream. Rejections are logged and otherwise ignored.
    pub(crate) fn apply_tuning(&self, backend: &mut dyn AudioBackend) {
        if let Err(e) = backend.set_frequency_ratio(self.stream, self.frequency_ratio()) {
            log::warn!("AudioAgent: Failed to adjust playback ratio of {}: {e}", self.stream);
        }
        if let Err(e) = backend.set_gain(self.stream, self.voice.volume) {
            log::warn!("AudioAgent: Failed to adjust volume of {}: {e}", self.stream);
        }
        self.apply_stereo_gain(backend);
    }

    /// Pushes the cached stereo gain to a spatial stream. Queued data is heard
    /// with the new gain immediately.
    pub(crate) fn apply_stereo_gain(&self, backend: &mut dyn AudioBackend) {
        if !self.is_spatial() {
            return;
        }
        if let Err(e) = backend.set_channel_gains(self.stream, self.gain) {
            log::warn!("AudioAgent: Failed to pan {}: {e}", self.stream);
        }
    }

    /// Queues the asset again if the stream has fully drained.
    ///
    /// When the queue depth cannot be read the stream is assumed non-empty
    /// and left alone. Only a failed re-queue is returned as an error.
    pub(crate) fn requeue_if_drained(
        &self,
        backend: &mut dyn AudioBackend,
        downmix: &DownmixLane,
    ) -> Result<()> {
        match backend.queued_bytes(self.stream) {
            Ok(0) => self.submit(backend, downmix),
            Ok(_) => Ok(()),
            Err(e) => {
                log::warn!(
                    "AudioAgent: Failed to query queued audio for asset {}: {e}",
                    self.asset.id()
                );
                Ok(())
            }
        }
    }

    /// Unbinds, clears, and releases the stream.
    pub(crate) fn destroy(self, backend: &mut dyn AudioBackend) {
        backend.unbind_stream(self.stream);
        if let Err(e) = backend.clear_stream(self.stream) {
            log::debug!("AudioAgent: Failed to clear {} before release: {e}", self.stream);
        }
        backend.destroy_stream(self.stream);
    }
}

/// Playback instances keyed by asset identity, at most one per identity.
#[derive(Debug, Default)]
pub(crate) struct InstanceStore {
    instances: HashMap<AssetUUID, PlaybackInstance>,
}

impl InstanceStore {
    pub(crate) fn get(&self, id: &AssetUUID) -> Option<&PlaybackInstance> {
        self.instances.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &AssetUUID) -> Option<&mut PlaybackInstance> {
        self.instances.get_mut(id)
    }

    /// Stores `instance`, returning any instance it displaced.
    pub(crate) fn insert(
        &mut self,
        id: AssetUUID,
        instance: PlaybackInstance,
    ) -> Option<PlaybackInstance> {
        self.instances.insert(id, instance)
    }

    pub(crate) fn remove(&mut self, id: &AssetUUID) -> Option<PlaybackInstance> {
        self.instances.remove(id)
    }

    pub(crate) fn contains(&self, id: &AssetUUID) -> bool {
        self.instances.contains_key(id)
    }

    pub(crate) fn len(&self) -> usize {
        self.instances.len()
    }

    pub(crate) fn ids(&self) -> Vec<AssetUUID> {
        self.instances.keys().copied().collect()
    }

    pub(crate) fn drain(&mut self) -> impl Iterator<Item = PlaybackInstance> + '_ {
        self.instances.drain().map(|(_, instance)| instance)
    }
}
