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

use super::instance::{ensure_queueable, MAX_FREQUENCY_RATIO};
use super::*;
use approx::assert_relative_eq;
use cadenza_core::audio::{
    AudioAsset, AudioBackend, AudioConfig, AudioFormat, AudioLoader, AudioMixer, DeviceId,
    SampleFormat, StreamEncoding, StreamSpec,
};
use cadenza_core::Vec3;
use cadenza_infra::audio::{BackendOp, MemoryAudioBackend, StreamSnapshot};
use std::path::Path;

/// The first device opened by a fresh memory backend.
const DEVICE: DeviceId = DeviceId(1);

fn agent_on(backend: &MemoryAudioBackend) -> AudioAgent {
    AudioAgent::new(Box::new(backend.clone()), AudioConfig::default())
}

fn agent_with(backend: &MemoryAudioBackend, config: AudioConfig) -> AudioAgent {
    AudioAgent::new(Box::new(backend.clone()), config)
}

fn stereo_clip(frames: usize) -> AudioAsset {
    AudioAsset::from_f32_samples(&vec![0.5; frames * 2], 48_000, 2)
}

fn mono_clip(frames: usize) -> AudioAsset {
    AudioAsset::from_f32_samples(&vec![0.5; frames], 48_000, 1)
}

fn only_stream(backend: &MemoryAudioBackend) -> StreamSnapshot {
    let streams = backend.streams();
    assert_eq!(streams.len(), 1, "expected exactly one live stream");
    streams.into_iter().next().unwrap()
}

fn queued(backend: &MemoryAudioBackend, agent: &AudioAgent, audio: &AudioAsset) -> usize {
    let stream = agent.stream_of(audio).expect("asset has no stream");
    backend.stream(stream).expect("stream was released").queued_bytes
}

#[test]
fn play_binds_one_stream_and_queues_the_asset() {
    let backend = MemoryAudioBackend::new();
    let mut agent = agent_on(&backend);
    let clip = stereo_clip(64);

    agent.play(&clip);

    assert_eq!(agent.instance_count(), 1);
    assert!(agent.is_playing(&clip));
    assert!(!agent.is_spatial(&clip));
    let stream = only_stream(&backend);
    assert_eq!(Some(stream.id), agent.stream_of(&clip));
    assert_eq!(stream.device, Some(DEVICE));
    assert_eq!(stream.source, StreamSpec::new(StreamEncoding::F32, 48_000, 2));
    assert_eq!(stream.queued_bytes, clip.samples().len());
}

#[test]
fn repeated_play_with_a_full_queue_does_not_duplicate() {
    let backend = MemoryAudioBackend::new();
    let mut agent = agent_on(&backend);
    let clip = stereo_clip(64);

    agent.play(&clip);
    agent.play(&clip);
    agent.play(&clip.clone());

    assert_eq!(agent.instance_count(), 1);
    assert_eq!(backend.stream_count(), 1);
    assert_eq!(backend.call_count(BackendOp::PutData), 1);
    assert_eq!(queued(&backend, &agent, &clip), clip.samples().len());
}

#[test]
fn stop_releases_the_stream_and_is_idempotent() {
    let backend = MemoryAudioBackend::new();
    let mut agent = agent_on(&backend);
    let clip = stereo_clip(8);

    agent.play(&clip);
    agent.stop(&clip);
    assert!(!agent.has_instance(&clip));
    assert_eq!(backend.stream_count(), 0);

    agent.stop(&clip);
    assert_eq!(agent.instance_count(), 0);
}

#[test]
fn play_after_stop_starts_a_fresh_stream() {
    let backend = MemoryAudioBackend::new();
    let mut agent = agent_on(&backend);
    let clip = stereo_clip(8);

    agent.play(&clip);
    let first = agent.stream_of(&clip).unwrap();
    agent.stop(&clip);
    agent.play(&clip);

    let second = agent.stream_of(&clip).unwrap();
    assert_ne!(first, second);
    assert!(backend.stream(first).is_none());
    assert_eq!(backend.stream_count(), 1);
}

#[test]
fn at_most_one_instance_per_asset() {
    let backend = MemoryAudioBackend::new();
    let mut agent = agent_on(&backend);
    let clips = [stereo_clip(8), mono_clip(8), stereo_clip(4)];

    for clip in &clips {
        agent.play(clip);
        agent.set_volume(clip, 0.5);
        agent.set_position(&clip.clone(), Vec3::new(1.0, 0.0, 2.0));
        agent.set_looping(clip, true);
        agent.play(&clip.clone());
    }

    assert_eq!(agent.instance_count(), clips.len());
    assert_eq!(backend.stream_count(), clips.len());
}

type Mutator = fn(&mut AudioAgent, &AudioAsset);

#[test]
fn mutators_create_the_same_instance_as_play_then_mutate() {
    let cases: [(&str, Mutator); 4] = [
        ("volume", |agent, clip| agent.set_volume(clip, 0.4)),
        ("pitch", |agent, clip| agent.set_pitch(clip, 1.5)),
        ("speed", |agent, clip| agent.set_playback_speed(clip, 0.5)),
        ("looping", |agent, clip| agent.set_looping(clip, true)),
    ];

    for (name, mutate) in cases {
        let lazy_backend = MemoryAudioBackend::new();
        let mut lazy = agent_on(&lazy_backend);
        let lazy_clip = stereo_clip(32);
        mutate(&mut lazy, &lazy_clip);

        let direct_backend = MemoryAudioBackend::new();
        let mut direct = agent_on(&direct_backend);
        let direct_clip = stereo_clip(32);
        direct.play(&direct_clip);
        mutate(&mut direct, &direct_clip);

        assert!(lazy.is_playing(&lazy_clip), "{name}: lazy instance is not playing");
        let lazy_stream = only_stream(&lazy_backend);
        let direct_stream = only_stream(&direct_backend);
        assert_eq!(lazy_stream.source, direct_stream.source, "{name}");
        assert_eq!(lazy_stream.device, direct_stream.device, "{name}");
        assert_eq!(lazy_stream.paused, direct_stream.paused, "{name}");
        assert_eq!(lazy_stream.frequency_ratio, direct_stream.frequency_ratio, "{name}");
        assert_eq!(lazy_stream.gain, direct_stream.gain, "{name}");
        assert_eq!(lazy_stream.queued_bytes, direct_stream.queued_bytes, "{name}");
    }
}

#[test]
fn tuning_combines_pitch_and_speed() {
    let backend = MemoryAudioBackend::new();
    let mut agent = agent_on(&backend);
    let clip = stereo_clip(16);

    agent.set_pitch(&clip, 2.0);
    agent.set_playback_speed(&clip, 3.0);
    agent.set_volume(&clip, 0.25);
    let stream = only_stream(&backend);
    assert_relative_eq!(stream.frequency_ratio, 6.0);
    assert_relative_eq!(stream.gain, 0.25);

    agent.set_pitch(&clip, 1_000.0);
    assert_eq!(only_stream(&backend).frequency_ratio, MAX_FREQUENCY_RATIO);
}

#[test]
fn mono_device_leaves_sounds_unspatialized() {
    let backend = MemoryAudioBackend::new()
        .with_device_format(StreamSpec::new(StreamEncoding::F32, 48_000, 1));
    let mut agent = agent_on(&backend);
    let clip = stereo_clip(16);

    agent.play(&clip);
    agent.set_position(&clip, Vec3::new(3.0, 0.0, 0.0));

    assert!(agent.has_instance(&clip));
    assert!(!agent.is_spatial(&clip));
    let stream = only_stream(&backend);
    assert_eq!(stream.gain, 1.0);
    assert_eq!(stream.source.channels, 2);
    assert_eq!(stream.queued_bytes, clip.samples().len());

    let other = stereo_clip(16);
    agent.set_position(&other, Vec3::new(3.0, 0.0, 0.0));
    assert!(!agent.has_instance(&other));
}

#[test]
fn set_position_creates_a_spatial_instance() {
    let backend = MemoryAudioBackend::new();
    let mut agent = agent_on(&backend);
    let clip = mono_clip(32);

    agent.set_position(&clip, Vec3::new(4.0, 0.0, 0.0));

    assert!(agent.is_spatial(&clip));
    assert!(agent.is_playing(&clip));
    let stream = only_stream(&backend);
    assert_eq!(stream.source, StreamSpec::new(StreamEncoding::F32, 48_000, 2));
    assert_eq!(stream.queued_bytes, 32 * 2 * 4);
    let gain = agent.stereo_gain(&clip).unwrap();
    assert!(gain.right > gain.left);
}

#[test]
fn spatial_center_renders_at_equal_power() {
    let backend = MemoryAudioBackend::new();
    let mut agent = agent_on(&backend);
    let clip = mono_clip(4);

    agent.set_position(&clip, Vec3::ZERO);

    let out = backend.render(DEVICE, 1);
    let expected = 0.5 * 0.5f32.sqrt();
    assert_relative_eq!(out[0], expected, epsilon = 1e-6);
    assert_relative_eq!(out[1], expected, epsilon = 1e-6);
}

#[test]
fn opposite_channels_cancel_when_spatialized() {
    let backend = MemoryAudioBackend::new();
    let mut agent = agent_on(&backend);
    let clip = AudioAsset::from_f32_samples(&[1.0, -1.0, 1.0, -1.0], 48_000, 2);

    agent.set_position(&clip, Vec3::new(2.0, 0.0, 0.0));

    assert!(agent.is_spatial(&clip));
    assert_eq!(backend.render(DEVICE, 2), vec![0.0; 4]);
}

#[test]
fn repositioning_a_spatial_instance_keeps_its_stream() {
    let backend = MemoryAudioBackend::new();
    let mut agent = agent_on(&backend);
    let clip = mono_clip(16);

    agent.set_position(&clip, Vec3::new(-5.0, 0.0, 0.0));
    let stream = agent.stream_of(&clip).unwrap();
    let left_gain = agent.stereo_gain(&clip).unwrap();
    assert!(left_gain.left > left_gain.right);

    agent.set_position(&clip, Vec3::new(5.0, 0.0, 0.0));

    assert_eq!(agent.stream_of(&clip), Some(stream));
    let right_gain = agent.stereo_gain(&clip).unwrap();
    assert!(right_gain.right > right_gain.left);
    assert_eq!(backend.call_count(BackendOp::PutData), 1);
    assert_eq!(only_stream(&backend).channel_gains, right_gain);
}

#[test]
fn moving_a_playing_voice_pans_its_queued_audio() {
    let backend = MemoryAudioBackend::new();
    let mut agent = agent_on(&backend);
    let clip = mono_clip(48_000);

    agent.set_position(&clip, Vec3::new(-5.0, 0.0, 0.0));
    let left = agent.stereo_gain(&clip).unwrap();
    let before = backend.render(DEVICE, 4);
    assert_relative_eq!(before[0], 0.5 * left.left, epsilon = 1e-6);
    assert_relative_eq!(before[1], 0.0, epsilon = 1e-6);

    agent.set_position(&clip, Vec3::new(5.0, 0.0, 0.0));
    let right = agent.stereo_gain(&clip).unwrap();
    let after = backend.render(DEVICE, 4);
    assert_relative_eq!(after[0], 0.0, epsilon = 1e-6);
    assert_relative_eq!(after[1], 0.5 * right.right, epsilon = 1e-6);
    assert_relative_eq!(after[7], 0.5 * right.right, epsilon = 1e-6);

    // Still the first buffer, panned in place.
    assert_eq!(backend.call_count(BackendOp::PutData), 1);
    assert_eq!(queued(&backend, &agent, &clip), (48_000 - 8) * 2 * 4);
}

#[test]
fn positioning_a_native_instance_rebuilds_it_with_its_state() {
    let backend = MemoryAudioBackend::new();
    let mut agent = agent_on(&backend);
    let clip = stereo_clip(16);

    agent.play(&clip);
    agent.set_volume(&clip, 0.3);
    agent.set_pitch(&clip, 1.5);
    agent.set_looping(&clip, true);
    agent.pause(&clip);
    let native = agent.stream_of(&clip).unwrap();

    agent.set_position(&clip, Vec3::new(0.0, 0.0, 2.0));

    assert!(agent.is_spatial(&clip));
    assert!(!agent.is_playing(&clip));
    assert!(backend.stream(native).is_none());
    let stream = only_stream(&backend);
    assert_ne!(stream.id, native);
    assert_relative_eq!(stream.gain, 0.3);
    assert_relative_eq!(stream.frequency_ratio, 1.5);
    assert!(stream.paused);

    agent.play(&clip);
    assert!(!only_stream(&backend).paused);
    assert!(agent.is_playing(&clip));
}

#[test]
fn rebuilt_paused_voices_are_paused_before_they_are_bound() {
    let backend = MemoryAudioBackend::new();
    let mut agent = agent_on(&backend);
    let clip = stereo_clip(16);

    agent.play(&clip);
    agent.pause(&clip);
    agent.set_position(&clip, Vec3::new(2.0, 0.0, 0.0));
    assert!(agent.is_spatial(&clip));

    let calls = backend.calls();
    let created = calls
        .iter()
        .rposition(|op| *op == BackendOp::CreateStream)
        .unwrap();
    let rebuild = &calls[created..];
    let find = |wanted: BackendOp| rebuild.iter().position(|op| *op == wanted).unwrap();
    assert!(find(BackendOp::PauseStream) < find(BackendOp::BindStream));
    assert!(find(BackendOp::BindStream) < find(BackendOp::PutData));

    assert!(only_stream(&backend).paused);
    assert_eq!(backend.render(DEVICE, 4), vec![0.0; 8]);
}

#[test]
fn integer_assets_play_but_are_never_spatialized() {
    let backend = MemoryAudioBackend::new();
    let mut agent = agent_on(&backend);
    let clip = AudioAsset::new(vec![0u8; 64], AudioFormat::new(SampleFormat::Int16, 48_000, 2));

    agent.set_position(&clip, Vec3::new(1.0, 0.0, 0.0));
    assert!(!agent.has_instance(&clip));

    agent.play(&clip);
    agent.set_position(&clip, Vec3::new(1.0, 0.0, 0.0));
    assert!(!agent.is_spatial(&clip));
    assert_eq!(only_stream(&backend).source.encoding, StreamEncoding::I16);
}

#[test]
fn non_finite_positions_are_ignored() {
    let backend = MemoryAudioBackend::new();
    let mut agent = agent_on(&backend);
    let clip = mono_clip(8);

    agent.set_position(&clip, Vec3::new(f32::NAN, 0.0, 0.0));
    assert!(!agent.has_instance(&clip));
}

#[test]
fn unplayable_assets_create_nothing() {
    let backend = MemoryAudioBackend::new();
    let mut agent = agent_on(&backend);
    let unknown = AudioAsset::new(vec![1u8; 16], AudioFormat::new(SampleFormat::Unknown, 48_000, 2));
    let empty = AudioAsset::from_f32_samples(&[], 48_000, 2);

    for clip in [&unknown, &empty] {
        agent.play(clip);
        agent.set_volume(clip, 0.5);
        agent.set_looping(clip, true);
    }

    assert_eq!(agent.instance_count(), 0);
    assert_eq!(backend.call_count(BackendOp::CreateStream), 0);
}

#[test]
fn setup_failures_release_partial_resources() {
    let backend = MemoryAudioBackend::new();
    let mut agent = agent_on(&backend);
    let clip = stereo_clip(8);

    backend.fail_next(BackendOp::CreateStream);
    agent.play(&clip);
    assert_eq!(agent.instance_count(), 0);
    assert_eq!(backend.stream_count(), 0);

    backend.fail_next(BackendOp::BindStream);
    agent.play(&clip);
    assert_eq!(agent.instance_count(), 0);
    assert_eq!(backend.stream_count(), 0);

    agent.play(&clip);
    assert!(agent.is_playing(&clip));
}

#[test]
fn push_failure_destroys_the_instance() {
    let backend = MemoryAudioBackend::new();
    let mut agent = agent_on(&backend);
    let clip = stereo_clip(8);

    backend.fail_next(BackendOp::PutData);
    agent.play(&clip);

    assert!(!agent.has_instance(&clip));
    assert_eq!(backend.stream_count(), 0);
}

#[test]
fn flush_failure_is_not_fatal() {
    let backend = MemoryAudioBackend::new();
    let mut agent = agent_on(&backend);
    let clip = stereo_clip(8);

    backend.fail_next(BackendOp::Flush);
    agent.play(&clip);

    assert!(agent.is_playing(&clip));
    assert_eq!(queued(&backend, &agent, &clip), clip.samples().len());
}

#[test]
fn tuning_failures_keep_the_logical_state() {
    let backend = MemoryAudioBackend::new();
    let mut agent = agent_on(&backend);
    let clip = stereo_clip(8);

    backend.fail_always(BackendOp::Gain);
    agent.play(&clip);
    agent.set_volume(&clip, 0.3);
    assert!(agent.has_instance(&clip));
    assert_eq!(only_stream(&backend).gain, 1.0);

    backend.clear_faults();
    agent.set_pitch(&clip, 1.0);
    assert_relative_eq!(only_stream(&backend).gain, 0.3);
}

#[test]
fn enabling_looping_requeues_a_drained_stream() {
    let backend = MemoryAudioBackend::new();
    let mut agent = agent_on(&backend);
    let clip = stereo_clip(16);

    agent.play(&clip);
    backend.render(DEVICE, 16);
    assert_eq!(queued(&backend, &agent, &clip), 0);

    agent.set_looping(&clip, true);
    assert_eq!(queued(&backend, &agent, &clip), clip.samples().len());
}

#[test]
fn failed_requeue_destroys_a_drained_instance() {
    let backend = MemoryAudioBackend::new();
    let mut agent = agent_on(&backend);
    let looping = stereo_clip(16);

    agent.set_looping(&looping, true);
    backend.render(DEVICE, 16);
    assert_eq!(queued(&backend, &agent, &looping), 0);
    backend.fail_next(BackendOp::PutData);
    agent.play(&looping);

    assert!(!agent.has_instance(&looping));
    assert_eq!(backend.stream_count(), 0);

    let one_shot = stereo_clip(16);
    agent.play(&one_shot);
    backend.render(DEVICE, 16);
    backend.fail_next(BackendOp::PutData);
    agent.set_looping(&one_shot, true);

    assert!(!agent.has_instance(&one_shot));
    assert_eq!(backend.stream_count(), 0);
}

#[test]
fn unknown_queue_depth_leaves_the_stream_alone() {
    let backend = MemoryAudioBackend::new();
    let mut agent = agent_on(&backend);
    let clip = stereo_clip(16);

    agent.play(&clip);
    backend.render(DEVICE, 16);
    backend.fail_next(BackendOp::QueuedBytes);
    agent.set_looping(&clip, true);

    assert!(agent.has_instance(&clip));
    assert_eq!(queued(&backend, &agent, &clip), 0);

    agent.update();
    assert_eq!(queued(&backend, &agent, &clip), clip.samples().len());
}

#[test]
fn play_replays_a_drained_one_shot_and_resumes_a_paused_one() {
    let backend = MemoryAudioBackend::new();
    let mut agent = agent_on(&backend);
    let clip = stereo_clip(16);

    agent.play(&clip);
    backend.render(DEVICE, 16);
    agent.play(&clip);
    assert_eq!(queued(&backend, &agent, &clip), clip.samples().len());
    assert_eq!(backend.call_count(BackendOp::PutData), 2);

    agent.pause(&clip);
    assert!(!agent.is_playing(&clip));
    assert!(only_stream(&backend).paused);
    assert_eq!(backend.render(DEVICE, 4), vec![0.0; 8]);

    agent.play(&clip);
    assert!(agent.is_playing(&clip));
    assert!(!only_stream(&backend).paused);
    assert_eq!(backend.call_count(BackendOp::PutData), 2);
}

#[test]
fn update_feeds_looping_instances_only() {
    let backend = MemoryAudioBackend::new();
    let mut agent = agent_on(&backend);
    let looping = stereo_clip(8);
    let one_shot = stereo_clip(8);

    agent.set_looping(&looping, true);
    agent.play(&one_shot);
    backend.render(DEVICE, 8);
    agent.update();

    assert_eq!(queued(&backend, &agent, &looping), looping.samples().len());
    assert_eq!(queued(&backend, &agent, &one_shot), 0);

    backend.render(DEVICE, 8);
    backend.fail_next(BackendOp::PutData);
    agent.update();
    assert!(!agent.has_instance(&looping));
    assert!(agent.has_instance(&one_shot));
}

#[test]
fn paused_looping_instances_are_not_refilled() {
    let backend = MemoryAudioBackend::new();
    let mut agent = agent_on(&backend);
    let clip = stereo_clip(8);

    agent.set_looping(&clip, true);
    backend.render(DEVICE, 8);
    agent.pause(&clip);
    agent.update();

    assert_eq!(queued(&backend, &agent, &clip), 0);
}

#[test]
fn pause_and_stop_never_create_instances() {
    let backend = MemoryAudioBackend::new();
    let mut agent = agent_on(&backend);
    let clip = stereo_clip(8);

    agent.pause(&clip);
    agent.stop(&clip);

    assert_eq!(agent.instance_count(), 0);
    assert_eq!(backend.call_count(BackendOp::CreateStream), 0);
}

#[test]
fn missing_device_degrades_to_silence() {
    let backend = MemoryAudioBackend::new();
    backend.fail_next(BackendOp::OpenDevice);
    let mut agent = agent_on(&backend);
    let clip = mono_clip(8);

    assert_eq!(agent.device_format(), None);
    agent.play(&clip);
    agent.set_position(&clip, Vec3::X);
    agent.set_volume(&clip, 0.5);

    assert_eq!(agent.instance_count(), 0);
    assert_eq!(backend.call_count(BackendOp::CreateStream), 0);
}

#[test]
fn streams_target_the_settled_device_format() {
    let settled = StreamSpec::new(StreamEncoding::I16, 44_100, 2);
    let backend = MemoryAudioBackend::new().with_device_format(settled);
    let mut agent = agent_on(&backend);
    let clip = stereo_clip(8);

    assert_eq!(
        agent.device_format(),
        Some(AudioFormat::new(SampleFormat::Int16, 44_100, 2))
    );
    agent.play(&clip);
    assert_eq!(only_stream(&backend).destination, settled);
}

#[test]
fn play_resumes_the_device_when_configured() {
    let backend = MemoryAudioBackend::new();
    let mut handle = backend.clone();
    let mut agent = agent_on(&backend);

    handle.pause_device(DEVICE).unwrap();
    agent.play(&stereo_clip(8));
    assert!(!backend.is_device_paused(DEVICE));

    let quiet_backend = MemoryAudioBackend::new();
    let mut quiet_handle = quiet_backend.clone();
    let config = AudioConfig {
        resume_device_on_play: false,
        ..AudioConfig::default()
    };
    let mut quiet = agent_with(&quiet_backend, config);

    quiet_handle.pause_device(DEVICE).unwrap();
    quiet.play(&stereo_clip(8));
    assert!(quiet_backend.is_device_paused(DEVICE));
}

#[test]
fn default_position_spatializes_new_instances() {
    let backend = MemoryAudioBackend::new();
    let config = AudioConfig {
        default_position: Some(Vec3::new(-3.0, 0.0, 0.0)),
        ..AudioConfig::default()
    };
    let mut agent = agent_with(&backend, config);
    let clip = mono_clip(8);

    agent.play(&clip);

    assert!(agent.is_spatial(&clip));
    let gain = agent.stereo_gain(&clip).unwrap();
    assert!(gain.left > gain.right);
}

#[test]
fn last_known_position_survives_stop() {
    let backend = MemoryAudioBackend::new();
    let mut agent = agent_on(&backend);
    let clip = mono_clip(8);

    agent.set_position(&clip, Vec3::new(6.0, 0.0, 0.0));
    agent.stop(&clip);
    agent.play(&clip);

    assert!(agent.is_spatial(&clip));
    let gain = agent.stereo_gain(&clip).unwrap();
    assert!(gain.right > gain.left);
}

#[test]
fn forgotten_positions_fall_back_to_the_default() {
    let backend = MemoryAudioBackend::new();
    let mut agent = agent_on(&backend);
    let clip = mono_clip(8);

    agent.set_position(&clip, Vec3::new(6.0, 0.0, 0.0));
    assert_eq!(agent.last_position(&clip), Some(Vec3::new(6.0, 0.0, 0.0)));
    agent.stop(&clip);
    agent.forget_position(&clip);
    assert_eq!(agent.last_position(&clip), None);

    agent.play(&clip);
    assert!(agent.has_instance(&clip));
    assert!(!agent.is_spatial(&clip));
}

#[test]
fn dropping_the_agent_tears_everything_down() {
    let backend = MemoryAudioBackend::new();
    let mut agent = agent_on(&backend);
    agent.play(&stereo_clip(8));
    agent.set_position(&mono_clip(8), Vec3::Z);
    assert_eq!(backend.stream_count(), 2);

    drop(agent);

    assert_eq!(backend.stream_count(), 0);
    assert_eq!(backend.device_count(), 0);
    assert_eq!(backend.call_count(BackendOp::PauseDevice), 1);
}

#[test]
fn oversized_buffers_are_rejected() {
    assert!(ensure_queueable(4096).is_ok());
    assert!(ensure_queueable(i32::MAX as usize).is_ok());
    assert!(ensure_queueable(i32::MAX as usize + 1).is_err());
}

#[test]
fn loads_wav_files_as_float_assets() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tone.WAV");
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: 22_050,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for sample in [0i16, 16_384, -16_384, 0] {
        writer.write_sample(sample).unwrap();
    }
    writer.finalize().unwrap();

    let backend = MemoryAudioBackend::new();
    let agent = agent_on(&backend);
    assert!(agent.can_load(&path));

    let asset = agent.load(&path).unwrap();
    assert_eq!(
        *asset.format(),
        AudioFormat::new(SampleFormat::Float32, 22_050, 2)
    );
    assert_eq!(asset.frame_count(), Some(2));
    let sample = |index: usize| {
        bytemuck::pod_read_unaligned::<f32>(&asset.samples()[index * 4..index * 4 + 4])
    };
    assert_relative_eq!(sample(1), 0.5);
    assert_relative_eq!(sample(2), -0.5);
}

#[test]
fn loading_reports_missing_and_unsupported_files() {
    let backend = MemoryAudioBackend::new();
    let agent = agent_on(&backend);

    assert!(!agent.can_load(Path::new("notes.txt")));
    let err = agent.load(Path::new("does/not/exist.wav")).unwrap_err();
    assert!(err.to_string().contains("Failed to read"));
}
