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

//! Acts as the **[A]gent** for the audio subsystem.
//!
//! The agent keeps at most one playback instance per asset identity. Each
//! instance owns one backend stream, bound to the output device for its whole
//! life; any unrecoverable streaming failure destroys the stream and removes
//! the instance, so there is never a "stopped but retained" voice.
//!
//! Positioned sounds are spatialized by down-mixing them to mono and spreading
//! the result over a stereo stream with equal-power gains.

mod agent;
mod instance;
mod loader;

#[cfg(test)]
mod tests;

pub use agent::AudioAgent;
pub use instance::{CreatePolicy, InstanceLookup, StreamLayout};
