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

//! Defines the abstract `AudioMixer` trait, the engine's playback surface.

use super::asset::AudioAsset;
use crate::math::Vec3;

/// Per-asset playback control.
///
/// Each asset identity owns at most one voice. Operations never fail across
/// this boundary: problems are logged and the affected voice is either left
/// untouched or torn down. Implementations are driven from a single thread
/// (typically the engine's per-frame update).
pub trait AudioMixer {
    /// Starts playback of `audio`, or resumes/refills an existing voice.
    fn play(&mut self, audio: &AudioAsset);

    /// Pauses the voice of `audio` without releasing it.
    fn pause(&mut self, audio: &AudioAsset);

    /// Stops and releases the voice of `audio`.
    fn stop(&mut self, audio: &AudioAsset);

    /// Positions `audio` in listener space, spatializing it when supported.
    fn set_position(&mut self, audio: &AudioAsset, position: Vec3);

    /// Sets the pitch multiplier.
    fn set_pitch(&mut self, audio: &AudioAsset, pitch: f32);

    /// Sets the playback speed multiplier.
    fn set_playback_speed(&mut self, audio: &AudioAsset, speed: f32);

    /// Enables or disables looping.
    fn set_looping(&mut self, audio: &AudioAsset, looping: bool);

    /// Sets the linear volume.
    fn set_volume(&mut self, audio: &AudioAsset, volume: f32);
}
