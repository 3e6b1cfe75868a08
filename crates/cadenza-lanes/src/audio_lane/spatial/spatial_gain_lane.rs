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

//! Maps a listener-space position to a pair of stereo gains.

use cadenza_core::audio::StereoGain;
use cadenza_core::lane::{Lane, LaneKind};
use cadenza_core::math::Vec3;

/// Distance below which sounds are never attenuated.
pub const REFERENCE_DISTANCE: f32 = 1.0;

/// Inverse-distance rolloff coefficient.
pub const ROLLOFF_FACTOR: f32 = 0.08;

/// A lane computing distance attenuation combined with an equal-power pan.
///
/// Attenuation follows an inverse-distance rolloff clamped at the reference
/// distance, so a source at the listener's position is played at full
/// volume instead of hitting the `1/0` singularity. Pan is taken from the
/// horizontal plane only (`x` and `z`); height never moves a sound left or
/// right.
#[derive(Debug, Clone, Copy)]
pub struct SpatialGainLane {
    reference_distance: f32,
    rolloff: f32,
}

impl Default for SpatialGainLane {
    fn default() -> Self {
        Self {
            reference_distance: REFERENCE_DISTANCE,
            rolloff: ROLLOFF_FACTOR,
        }
    }
}

impl SpatialGainLane {
    /// Creates a lane with the engine's standard distance model.
    pub fn new() -> Self {
        Self::default()
    }

    /// The attenuation factor for a source at `distance` from the listener.
    pub fn attenuation(&self, distance: f32) -> f32 {
        let excess = (distance - self.reference_distance).max(0.0);
        1.0 / (1.0 + self.rolloff * excess)
    }

    /// Computes the stereo gains for a source at `position`.
    pub fn calculate_gains(&self, position: Vec3) -> StereoGain {
        let attenuation = self.attenuation(position.length());

        let horizontal = (position.x * position.x + position.z * position.z).sqrt();
        let pan = if horizontal > f32::EPSILON {
            (position.x / horizontal).clamp(-1.0, 1.0)
        } else {
            0.0
        };

        StereoGain {
            left: attenuation * (0.5 * (1.0 - pan)).max(0.0).sqrt(),
            right: attenuation * (0.5 * (1.0 + pan)).max(0.0).sqrt(),
        }
    }
}

impl Lane for SpatialGainLane {
    fn strategy_name(&self) -> &'static str {
        "EqualPowerPan"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Audio
    }
}

/// Computes stereo gains for `position` with the standard distance model.
pub fn calculate_gains(position: Vec3) -> StereoGain {
    SpatialGainLane::default().calculate_gains(position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_source_on_the_right() {
        let gain = calculate_gains(Vec3::new(1.0, 0.0, 0.0));

        assert!(gain.left < gain.right);
        assert_abs_diff_eq!(gain.left, 0.0, epsilon = 1e-6);
        assert_relative_eq!(gain.right, 1.0);
    }

    #[test]
    fn test_source_on_the_left() {
        let gain = calculate_gains(Vec3::new(-3.0, 0.0, 0.0));
        assert!(gain.left > gain.right);
        assert_abs_diff_eq!(gain.right, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_equal_power_holds_for_every_pan() {
        let lane = SpatialGainLane::new();
        for step in 0..=16 {
            let angle = step as f32 / 16.0 * std::f32::consts::TAU;
            let position = Vec3::new(angle.cos() * 4.0, 0.5, angle.sin() * 4.0);
            let gain = lane.calculate_gains(position);
            let attenuation = lane.attenuation(position.length());
            assert_relative_eq!(gain.power(), attenuation * attenuation, epsilon = 1e-5);
            assert!(gain.left >= 0.0 && gain.right >= 0.0);
            assert!(gain.left <= 1.0 && gain.right <= 1.0);
        }
    }

    #[test]
    fn test_origin_is_centered_and_unattenuated() {
        let lane = SpatialGainLane::new();
        let gain = lane.calculate_gains(Vec3::ZERO);

        assert_relative_eq!(lane.attenuation(0.0), 1.0);
        assert_relative_eq!(gain.left, gain.right);
        assert_relative_eq!(gain.left, std::f32::consts::FRAC_1_SQRT_2);
        assert_relative_eq!(gain.power(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_height_does_not_pan() {
        let gain = calculate_gains(Vec3::new(0.0, 5.0, 0.0));
        assert_relative_eq!(gain.left, gain.right);
    }

    #[test]
    fn test_inside_reference_distance_is_unattenuated() {
        let lane = SpatialGainLane::new();
        assert_relative_eq!(lane.attenuation(0.5), 1.0);
        assert_relative_eq!(lane.attenuation(1.0), 1.0);
    }

    #[test]
    fn test_distance_attenuation_rolloff() {
        let lane = SpatialGainLane::new();
        // 1 / (1 + 0.08 * 10) at eleven units away.
        assert_relative_eq!(lane.attenuation(11.0), 1.0 / 1.8, epsilon = 1e-6);

        let near = lane.calculate_gains(Vec3::new(0.0, 0.0, -2.0));
        let far = lane.calculate_gains(Vec3::new(0.0, 0.0, -50.0));
        assert!(far.power() < near.power());
    }
}
