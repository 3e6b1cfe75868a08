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

//! The AudioAgent is responsible for per-asset playback and spatialization.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use cadenza_core::audio::{
    from_stream_spec, to_stream_spec, AudioAsset, AudioBackend, AudioConfig, AudioFormat,
    AudioLoader, AudioMixer, SampleFormat, SpatialSettings, StereoGain, StreamEncoding, StreamId,
    StreamSpec,
};
use cadenza_core::{AssetUUID, Lane, Vec3};
use cadenza_lanes::asset_lane::{AssetLoader, DecodedAudio};
use cadenza_lanes::audio_lane::{DownmixLane, SpatialGainLane};

use super::instance::{
    CreatePolicy, InstanceLookup, InstanceStore, OutputDevice, PlaybackInstance, StreamLayout,
    VoiceState,
};
use super::loader::AudioLoaderRegistry;

/// The agent that plays audio assets through an [`AudioBackend`].
///
/// Every public operation runs to completion on the calling thread and never
/// returns an error: failures are logged and, when a stream breaks, the
/// offending instance is destroyed. Call [`AudioAgent::update`] once per frame
/// to keep looping sounds fed.
pub struct AudioAgent {
    backend: Box<dyn AudioBackend>,
    config: AudioConfig,
    /// `None` when the output device could not be opened.
    device: Option<OutputDevice>,
    instances: InstanceStore,
    /// Last position successfully applied to each asset. Survives `stop`,
    /// cleared by `forget_position`.
    positions: HashMap<AssetUUID, Vec3>,
    spatial_lane: SpatialGainLane,
    downmix_lane: DownmixLane,
    loaders: AudioLoaderRegistry,
}

impl AudioAgent {
    /// Creates a new `AudioAgent` and opens the default output device.
    ///
    /// If the device cannot be opened the agent still works, but every
    /// playback operation is skipped with a warning.
    pub fn new(mut backend: Box<dyn AudioBackend>, config: AudioConfig) -> Self {
        let device = Self::open_device(backend.as_mut(), &config.desired_format);
        let spatial_lane = SpatialGainLane::new();
        let downmix_lane = DownmixLane::new();
        log::debug!(
            "AudioAgent: Using the {} and {} lanes.",
            spatial_lane.strategy_name(),
            downmix_lane.strategy_name()
        );

        Self {
            backend,
            config,
            device,
            instances: InstanceStore::default(),
            positions: HashMap::new(),
            spatial_lane,
            downmix_lane,
            loaders: AudioLoaderRegistry::new(),
        }
    }

    fn open_device(backend: &mut dyn AudioBackend, desired: &AudioFormat) -> Option<OutputDevice> {
        let desired = to_stream_spec(desired).unwrap_or_else(|e| {
            log::warn!("AudioAgent: Requested device format is invalid ({e}), using Float32 stereo.");
            StreamSpec::new(StreamEncoding::F32, 48_000, 2)
        });

        let id = match backend.open_output_device(&desired) {
            Ok(id) => id,
            Err(e) => {
                log::error!("AudioAgent: Failed to open audio device: {e}");
                return None;
            }
        };

        match backend.device_format(id) {
            Ok(spec) => {
                log::info!(
                    "AudioAgent: Output device {id} ready ({:?}, {} Hz, {} channel(s)).",
                    spec.encoding,
                    spec.sample_rate,
                    spec.channels
                );
                Some(OutputDevice { id, spec })
            }
            Err(e) => {
                log::error!("AudioAgent: Failed to query audio device format: {e}");
                backend.close_device(id);
                None
            }
        }
    }

    /// Registers a decode lane for files with the given extension.
    pub fn register_loader(
        &mut self,
        extension: &str,
        loader: impl AssetLoader<DecodedAudio> + Send + Sync + 'static,
    ) {
        self.loaders.register(extension, loader);
    }

    /// The format the output device consumes, if a device is open.
    pub fn device_format(&self) -> Option<AudioFormat> {
        self.device.map(|device| from_stream_spec(&device.spec))
    }

    /// The number of live playback instances.
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Returns `true` if `audio` has a live instance, playing or paused.
    pub fn has_instance(&self, audio: &AudioAsset) -> bool {
        self.instances.contains(&audio.id())
    }

    /// Returns `true` if `audio` has a live instance that is not paused.
    pub fn is_playing(&self, audio: &AudioAsset) -> bool {
        self.instances
            .get(&audio.id())
            .is_some_and(|instance| instance.voice.playing)
    }

    /// Returns `true` if `audio` is being played through a spatial stream.
    pub fn is_spatial(&self, audio: &AudioAsset) -> bool {
        self.instances
            .get(&audio.id())
            .is_some_and(|instance| instance.is_spatial())
    }

    /// The stereo gain cached for `audio`, if it has a live instance.
    pub fn stereo_gain(&self, audio: &AudioAsset) -> Option<StereoGain> {
        self.instances.get(&audio.id()).map(|instance| instance.gain)
    }

    /// The stream currently bound for `audio`, if any.
    pub fn stream_of(&self, audio: &AudioAsset) -> Option<StreamId> {
        self.instances.get(&audio.id()).map(|instance| instance.stream)
    }

    /// The last position set for `audio`, if it is still remembered.
    pub fn last_position(&self, audio: &AudioAsset) -> Option<Vec3> {
        self.positions.get(&audio.id()).copied()
    }

    /// Forgets the last position set for `audio`.
    ///
    /// A live instance keeps playing where it is; the next instance created
    /// for the asset falls back to the configured default position.
    pub fn forget_position(&mut self, audio: &AudioAsset) {
        self.positions.remove(&audio.id());
    }

    /// Re-queues every playing, looping instance whose stream has drained.
    ///
    /// Instances whose re-queue fails are destroyed.
    pub fn update(&mut self) {
        for id in self.instances.ids() {
            let Some(instance) = self.instances.get(&id) else {
                continue;
            };
            if !(instance.voice.looping && instance.voice.playing) {
                continue;
            }
            if let Err(e) = instance.requeue_if_drained(self.backend.as_mut(), &self.downmix_lane) {
                log::error!("AudioAgent: Failed to queue looped audio for asset {id}: {e:#}");
                self.destroy_instance(&id);
            }
        }
    }

    /// Works out whether `audio` can be spatialized at `position`.
    ///
    /// Every unmet precondition is logged as a warning and yields settings
    /// with `enabled == false`.
    fn resolve_spatial(&self, audio: &AudioAsset, position: Vec3) -> SpatialSettings {
        let id = audio.id();
        let Some(device) = self.device else {
            log::warn!("AudioAgent: No output device, asset {id} cannot be spatialized.");
            return SpatialSettings::unsupported();
        };
        if device.spec.channels < 2 {
            log::warn!(
                "AudioAgent: Output device has {} channel(s), asset {id} cannot be spatialized.",
                device.spec.channels
            );
            return SpatialSettings::unsupported();
        }

        let format = audio.format();
        if format.sample_format != SampleFormat::Float32 {
            log::warn!(
                "AudioAgent: Asset {id} is {:?}, only Float32 audio can be spatialized.",
                format.sample_format
            );
            return SpatialSettings::unsupported();
        }
        if format.channels == 0 {
            log::warn!("AudioAgent: Asset {id} has no channels and cannot be spatialized.");
            return SpatialSettings::unsupported();
        }
        if !position.is_finite() {
            log::warn!("AudioAgent: Ignoring non-finite position for asset {id}.");
            return SpatialSettings::unsupported();
        }

        SpatialSettings::spatialized(self.spatial_lane.calculate_gains(position))
    }

    /// Settings for an instance created without an explicit position: the
    /// last position set for the asset, else the configured default.
    fn default_spatial(&self, audio: &AudioAsset) -> (SpatialSettings, Option<Vec3>) {
        let last_known = self.positions.get(&audio.id()).copied();
        match last_known.or(self.config.default_position) {
            Some(position) => {
                let settings = self.resolve_spatial(audio, position);
                (settings, settings.enabled.then_some(position))
            }
            None => (SpatialSettings::unspatialized(), None),
        }
    }

    /// Builds a new instance for `audio` in the given voice state.
    ///
    /// Unplayable input is logged as a warning, backend failures as errors;
    /// either way nothing is left allocated.
    fn build_instance(
        &mut self,
        audio: &AudioAsset,
        spatial: SpatialSettings,
        position: Option<Vec3>,
        voice: VoiceState,
    ) -> Option<PlaybackInstance> {
        let id = audio.id();
        let Some(device) = self.device else {
            log::warn!("AudioAgent: No output device, asset {id} will not be played.");
            return None;
        };

        let format = audio.format();
        if format.sample_format == SampleFormat::Unknown || audio.is_empty() {
            log::warn!("AudioAgent: Audio asset {id} contains no playable data.");
            return None;
        }

        let source = if spatial.enabled {
            StreamSpec::new(StreamEncoding::F32, format.sample_rate, 2)
        } else {
            match to_stream_spec(format) {
                Ok(spec) => spec,
                Err(e) => {
                    log::warn!("AudioAgent: Asset {id} cannot be played: {e}");
                    return None;
                }
            }
        };

        match PlaybackInstance::open(
            self.backend.as_mut(),
            &self.downmix_lane,
            &device,
            audio,
            &source,
            spatial,
            voice,
        ) {
            Ok(mut instance) => {
                instance.position = position;
                log::debug!(
                    "AudioAgent: Started {} for asset {id} ({:?}).",
                    instance.stream,
                    instance.layout
                );
                Some(instance)
            }
            Err(e) => {
                log::error!("AudioAgent: Failed to start playback of asset {id}: {e:#}");
                None
            }
        }
    }

    /// Replaces the stream of an existing instance with a spatial one,
    /// carrying over tuning, looping, and pause state.
    fn rebuild_spatial(
        &mut self,
        audio: &AudioAsset,
        spatial: SpatialSettings,
        position: Vec3,
    ) -> InstanceLookup {
        let id = audio.id();
        let Some(old) = self.instances.remove(&id) else {
            return InstanceLookup::Absent;
        };
        let voice = old.voice;
        old.destroy(self.backend.as_mut());

        let Some(instance) = self.build_instance(audio, spatial, Some(position), voice) else {
            return InstanceLookup::Failed;
        };

        let stream = instance.stream;
        self.instances.insert(id, instance);
        InstanceLookup::Created(stream)
    }

    /// Looks up the instance of `audio`, creating it if `policy` allows.
    ///
    /// An enabled `spatial` override re-pans a spatial instance in place,
    /// keeping its queued data, and rebuilds a native one; a newly created
    /// instance uses the override, or the last known or configured default
    /// position without one.
    fn lookup(
        &mut self,
        audio: &AudioAsset,
        policy: CreatePolicy,
        spatial: Option<(SpatialSettings, Vec3)>,
    ) -> InstanceLookup {
        let id = audio.id();

        if let Some(instance) = self.instances.get_mut(&id) {
            let stream = instance.stream;
            if let Some((settings, position)) = spatial.filter(|(settings, _)| settings.enabled) {
                if instance.layout == StreamLayout::Native {
                    return self.rebuild_spatial(audio, settings, position);
                }
                instance.gain = settings.gain;
                instance.position = Some(position);
                instance.apply_stereo_gain(self.backend.as_mut());
            }
            return InstanceLookup::Reused(stream);
        }

        if policy == CreatePolicy::ExistingOnly {
            return InstanceLookup::Absent;
        }

        let (settings, position) = match spatial {
            Some((settings, position)) => (settings, settings.enabled.then_some(position)),
            None => self.default_spatial(audio),
        };
        let Some(instance) =
            self.build_instance(audio, settings, position, VoiceState::default())
        else {
            return InstanceLookup::Failed;
        };

        let stream = instance.stream;
        self.instances.insert(id, instance);
        self.resume_output();
        InstanceLookup::Created(stream)
    }

    /// Resumes device consumption when the configuration asks for it.
    fn resume_output(&mut self) {
        if !self.config.resume_device_on_play {
            return;
        }
        if let Some(device) = self.device {
            if let Err(e) = self.backend.resume_device(device.id) {
                log::warn!("AudioAgent: Failed to resume audio device: {e}");
            }
        }
    }

    /// Destroys the instance of `id`, if any, and releases its stream.
    fn destroy_instance(&mut self, id: &AssetUUID) {
        if let Some(instance) = self.instances.remove(id) {
            log::debug!("AudioAgent: Destroyed {} for asset {id}.", instance.stream);
            instance.destroy(self.backend.as_mut());
        }
    }

    /// Re-queues `audio` if its stream has drained, destroying the instance
    /// when that fails.
    fn requeue_or_destroy(&mut self, audio: &AudioAsset) {
        let id = audio.id();
        let Some(instance) = self.instances.get(&id) else {
            return;
        };
        if let Err(e) = instance.requeue_if_drained(self.backend.as_mut(), &self.downmix_lane) {
            log::error!("AudioAgent: Failed to queue audio for asset {id}: {e:#}");
            self.destroy_instance(&id);
        }
    }

    /// Applies `change` to the instance of `audio`, creating it first, then
    /// re-applies the stream tuning.
    fn tune(&mut self, audio: &AudioAsset, change: impl FnOnce(&mut PlaybackInstance)) {
        match self.lookup(audio, CreatePolicy::CreateIfMissing, None) {
            InstanceLookup::Reused(_) | InstanceLookup::Created(_) => {}
            InstanceLookup::Absent | InstanceLookup::Failed => return,
        }
        if let Some(instance) = self.instances.get_mut(&audio.id()) {
            change(instance);
            instance.apply_tuning(self.backend.as_mut());
        }
    }
}

impl AudioMixer for AudioAgent {
    fn play(&mut self, audio: &AudioAsset) {
        let id = audio.id();
        match self.lookup(audio, CreatePolicy::CreateIfMissing, None) {
            InstanceLookup::Created(_) => return,
            InstanceLookup::Reused(_) => {}
            InstanceLookup::Absent | InstanceLookup::Failed => return,
        }

        if let Some(instance) = self.instances.get_mut(&id) {
            if !instance.voice.playing {
                if let Err(e) = self.backend.resume_stream(instance.stream) {
                    log::warn!("AudioAgent: Failed to resume asset {id}: {e}");
                }
                instance.voice.playing = true;
            }
            instance.apply_tuning(self.backend.as_mut());
        }
        self.requeue_or_destroy(audio);
        if self.instances.contains(&id) {
            self.resume_output();
        }
    }

    fn pause(&mut self, audio: &AudioAsset) {
        let id = audio.id();
        let Some(instance) = self.instances.get_mut(&id) else {
            return;
        };
        if !instance.voice.playing {
            return;
        }
        if let Err(e) = self.backend.pause_stream(instance.stream) {
            log::warn!("AudioAgent: Failed to pause asset {id}: {e}");
        }
        instance.voice.playing = false;
    }

    fn stop(&mut self, audio: &AudioAsset) {
        self.destroy_instance(&audio.id());
    }

    fn set_position(&mut self, audio: &AudioAsset, position: Vec3) {
        let settings = self.resolve_spatial(audio, position);
        if !settings.enabled {
            return;
        }
        self.positions.insert(audio.id(), position);
        self.lookup(
            audio,
            CreatePolicy::CreateIfMissing,
            Some((settings, position)),
        );
    }

    fn set_pitch(&mut self, audio: &AudioAsset, pitch: f32) {
        self.tune(audio, |instance| instance.voice.pitch = pitch);
    }

    fn set_playback_speed(&mut self, audio: &AudioAsset, speed: f32) {
        self.tune(audio, |instance| instance.voice.speed = speed);
    }

    fn set_looping(&mut self, audio: &AudioAsset, looping: bool) {
        match self.lookup(audio, CreatePolicy::CreateIfMissing, None) {
            InstanceLookup::Reused(_) | InstanceLookup::Created(_) => {}
            InstanceLookup::Absent | InstanceLookup::Failed => return,
        }
        let Some(instance) = self.instances.get_mut(&audio.id()) else {
            return;
        };
        instance.voice.looping = looping;
        if looping {
            self.requeue_or_destroy(audio);
        }
    }

    fn set_volume(&mut self, audio: &AudioAsset, volume: f32) {
        self.tune(audio, |instance| instance.voice.volume = volume);
    }
}

impl AudioLoader for AudioAgent {
    fn can_load(&self, path: &Path) -> bool {
        self.loaders.supports(path)
    }

    fn load(&self, path: &Path) -> Result<AudioAsset> {
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read '{}'", path.display()))?;
        let decoded = self
            .loaders
            .decode(path, &bytes)
            .with_context(|| format!("Failed to decode '{}'", path.display()))?;

        let asset = decoded.into_asset();
        log::debug!(
            "AudioAgent: Loaded '{}' as asset {} ({} frame(s)).",
            path.display(),
            asset.id(),
            asset.frame_count().unwrap_or(0)
        );
        Ok(asset)
    }
}

impl Drop for AudioAgent {
    fn drop(&mut self) {
        let backend = self.backend.as_mut();
        for instance in self.instances.drain() {
            instance.destroy(backend);
        }

        if let Some(device) = self.device.take() {
            if let Err(e) = self.backend.pause_device(device.id) {
                log::warn!("AudioAgent: Failed to pause audio device on shutdown: {e}");
            }
            self.backend.close_device(device.id);
        }
    }
}
