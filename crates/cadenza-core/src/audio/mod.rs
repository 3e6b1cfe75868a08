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

//! Audio contracts: sample formats, assets, spatial gains, and the traits
//! implemented by device backends, mixers, and loaders.

pub mod asset;
pub mod backend;
pub mod config;
pub mod conversions;
pub mod format;
pub mod gain;
pub mod loader;
pub mod mixer;

pub use asset::AudioAsset;
pub use backend::{AudioBackend, BackendError, DeviceId, StreamEncoding, StreamId, StreamSpec};
pub use config::AudioConfig;
pub use conversions::{from_stream_spec, to_stream_spec, FormatError};
pub use format::{AudioFormat, SampleFormat};
pub use gain::{SpatialSettings, StereoGain};
pub use loader::AudioLoader;
pub use mixer::AudioMixer;
