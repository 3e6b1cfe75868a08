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

//! # Lane Abstraction
//!
//! A **Lane** is a reusable, swappable processing strategy owned by an agent.
//! Each lane encapsulates one algorithmic approach to a domain task, such as
//! decoding a container format or shaping a sound's stereo image. Agents hold
//! lanes and pick between them; the lanes themselves are stateless or hold
//! only configuration.

/// Classification of lane types, used for routing and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LaneKind {
    /// Audio mixing and spatialization.
    Audio,
    /// Asset loading and decoding.
    Asset,
}

/// The common interface shared by all lanes.
pub trait Lane: Send + Sync {
    /// Human-readable name identifying this lane's strategy.
    ///
    /// Used for logging and debugging. Should be unique within a lane kind
    /// (e.g., `"WavLoader"`, `"StereoDownmix"`).
    fn strategy_name(&self) -> &'static str;

    /// The kind of processing this lane performs.
    fn lane_kind(&self) -> LaneKind;
}
