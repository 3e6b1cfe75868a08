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

//! Contains the `CpalAudioBackend` struct.

use super::conversions::{from_cpal_format, to_cpal_format};
use crate::audio::backends::stream_table::StreamTable;
use crate::audio::subsystem::AudioSubsystem;
use cadenza_core::audio::{
    AudioBackend, BackendError, DeviceId, StereoGain, StreamEncoding, StreamId, StreamSpec,
};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// An opened cpal output stream and the format it consumes.
struct CpalOutput {
    stream: cpal::Stream,
    spec: StreamSpec,
}

/// An `AudioBackend` that plays through the host's default output device via cpal.
///
/// Producer streams live in a table shared with every device callback. Each
/// callback mixes the streams bound to its own device.
pub struct CpalAudioBackend {
    host: cpal::Host,
    devices: HashMap<DeviceId, CpalOutput>,
    streams: Arc<Mutex<StreamTable>>,
    next_device: u32,
    _subsystem: AudioSubsystem,
}

impl Default for CpalAudioBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CpalAudioBackend {
    /// Creates a new backend on the default cpal host.
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
            devices: HashMap::new(),
            streams: Arc::new(Mutex::new(StreamTable::default())),
            next_device: 0,
            _subsystem: AudioSubsystem::acquire(),
        }
    }

    fn table(&self) -> MutexGuard<'_, StreamTable> {
        self.streams.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn output(&self, operation: &'static str, device: DeviceId) -> Result<&CpalOutput, BackendError> {
        self.devices
            .get(&device)
            .ok_or_else(|| BackendError::new(operation, format!("invalid device {device}")))
    }

    /// Picks a supported configuration matching `desired`, falling back to the
    /// device default.
    fn select_config(
        device: &cpal::Device,
        desired: &StreamSpec,
    ) -> Result<cpal::SupportedStreamConfig, BackendError> {
        let format = to_cpal_format(desired.encoding);
        if let Ok(configs) = device.supported_output_configs() {
            for config in configs {
                if config.channels() == desired.channels
                    && config.sample_format() == format
                    && config.min_sample_rate() <= desired.sample_rate
                    && config.max_sample_rate() >= desired.sample_rate
                {
                    return Ok(config.with_sample_rate(desired.sample_rate));
                }
            }
        }

        log::warn!(
            "Output device has no {:?} {} Hz {} channel config, using its default.",
            desired.encoding,
            desired.sample_rate,
            desired.channels
        );
        device
            .default_output_config()
            .map_err(|e| BackendError::new("open_output_device", e.to_string()))
    }

    fn build_output<T>(
        &self,
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        id: DeviceId,
    ) -> Result<cpal::Stream, cpal::BuildStreamError>
    where
        T: SizedSample + FromSample<f32>,
    {
        let streams = Arc::clone(&self.streams);
        let channels = config.channels as usize;
        let sample_rate = config.sample_rate;
        let mut mix = Vec::<f32>::new();

        let data_callback = move |output: &mut [T], _: &cpal::OutputCallbackInfo| {
            mix.resize(output.len(), 0.0);
            streams
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .mix_into(id, &mut mix, channels, sample_rate);
            for (out, sample) in output.iter_mut().zip(&mix) {
                *out = T::from_sample(*sample);
            }
        };

        let error_callback = move |err: cpal::StreamError| {
            log::error!("An error occurred on the audio stream of {id}: {err}");
        };

        device.build_output_stream(config, data_callback, error_callback, None)
    }
}

impl AudioBackend for CpalAudioBackend {
    fn open_output_device(&mut self, desired: &StreamSpec) -> Result<DeviceId, BackendError> {
        let device = self.host.default_output_device().ok_or_else(|| {
            BackendError::new("open_output_device", "no default output device available")
        })?;
        let supported = Self::select_config(&device, desired)?;

        let encoding = from_cpal_format(supported.sample_format()).ok_or_else(|| {
            BackendError::new(
                "open_output_device",
                format!("unsupported device sample format {}", supported.sample_format()),
            )
        })?;
        let config: cpal::StreamConfig = supported.config();
        let spec = StreamSpec::new(encoding, config.sample_rate, config.channels);

        self.next_device += 1;
        let id = DeviceId(self.next_device);

        let stream = match encoding {
            StreamEncoding::U8 => self.build_output::<u8>(&device, &config, id),
            StreamEncoding::I8 => self.build_output::<i8>(&device, &config, id),
            StreamEncoding::I16 => self.build_output::<i16>(&device, &config, id),
            StreamEncoding::U16 => self.build_output::<u16>(&device, &config, id),
            StreamEncoding::I32 => self.build_output::<i32>(&device, &config, id),
            StreamEncoding::F32 => self.build_output::<f32>(&device, &config, id),
            StreamEncoding::F64 => self.build_output::<f64>(&device, &config, id),
        }
        .map_err(|e| BackendError::new("open_output_device", e.to_string()))?;

        stream
            .play()
            .map_err(|e| BackendError::new("open_output_device", e.to_string()))?;

        log::info!(
            "Opened audio output {id}: {:?}, {} Hz, {} channel(s).",
            spec.encoding,
            spec.sample_rate,
            spec.channels
        );
        self.devices.insert(id, CpalOutput { stream, spec });
        Ok(id)
    }

    fn device_format(&self, device: DeviceId) -> Result<StreamSpec, BackendError> {
        self.output("device_format", device).map(|output| output.spec)
    }

    fn close_device(&mut self, device: DeviceId) {
        if self.devices.remove(&device).is_some() {
            self.table().unbind_device(device);
            log::info!("Closed audio output {device}.");
        }
    }

    fn pause_device(&mut self, device: DeviceId) -> Result<(), BackendError> {
        self.output("pause_device", device)?
            .stream
            .pause()
            .map_err(|e| BackendError::new("pause_device", e.to_string()))
    }

    fn resume_device(&mut self, device: DeviceId) -> Result<(), BackendError> {
        self.output("resume_device", device)?
            .stream
            .play()
            .map_err(|e| BackendError::new("resume_device", e.to_string()))
    }

    fn create_stream(
        &mut self,
        source: &StreamSpec,
        destination: &StreamSpec,
    ) -> Result<StreamId, BackendError> {
        self.table().create(source, destination)
    }

    fn bind_stream(&mut self, device: DeviceId, stream: StreamId) -> Result<(), BackendError> {
        self.output("bind_stream", device)?;
        self.table().get_mut(stream)?.bind(device)
    }

    fn unbind_stream(&mut self, stream: StreamId) {
        if let Ok(state) = self.table().get_mut(stream) {
            state.unbind();
        }
    }

    fn clear_stream(&mut self, stream: StreamId) -> Result<(), BackendError> {
        self.table().get_mut(stream)?.clear();
        Ok(())
    }

    fn destroy_stream(&mut self, stream: StreamId) {
        self.table().remove(stream);
    }

    fn put_stream_data(&mut self, stream: StreamId, data: &[u8]) -> Result<(), BackendError> {
        // The callbacks share the table lock; only the append is done under it.
        let decoder = self.table().get_mut(stream)?.decoder();
        let decoded = decoder.decode(data);
        self.table().get_mut(stream)?.append(decoded);
        Ok(())
    }

    fn flush_stream(&mut self, stream: StreamId) -> Result<(), BackendError> {
        self.table().get_mut(stream)?.flush();
        Ok(())
    }

    fn queued_bytes(&self, stream: StreamId) -> Result<usize, BackendError> {
        Ok(self.table().get(stream)?.queued_bytes())
    }

    fn set_frequency_ratio(&mut self, stream: StreamId, ratio: f32) -> Result<(), BackendError> {
        self.table().get_mut(stream)?.set_frequency_ratio(ratio)
    }

    fn set_gain(&mut self, stream: StreamId, gain: f32) -> Result<(), BackendError> {
        self.table().get_mut(stream)?.set_gain(gain)
    }

    fn set_channel_gains(
        &mut self,
        stream: StreamId,
        gains: StereoGain,
    ) -> Result<(), BackendError> {
        self.table().get_mut(stream)?.set_channel_gains(gains)
    }

    fn pause_stream(&mut self, stream: StreamId) -> Result<(), BackendError> {
        self.table().get_mut(stream)?.set_paused(true);
        Ok(())
    }

    fn resume_stream(&mut self, stream: StreamId) -> Result<(), BackendError> {
        self.table().get_mut(stream)?.set_paused(false);
        Ok(())
    }
}

impl Drop for CpalAudioBackend {
    fn drop(&mut self) {
        let devices: Vec<DeviceId> = self.devices.keys().copied().collect();
        for device in devices {
            self.close_device(device);
        }
    }
}
