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

//! Process-wide lifetime of the platform audio layer.
//!
//! Every backend that touches the platform layer holds an [`AudioSubsystem`].
//! The first owner brings the subsystem up; when the last owner is dropped
//! the subsystem is shut down. Ownership is counted explicitly, so the
//! composition root decides the ordering instead of an implicit singleton.

use std::sync::atomic::{AtomicUsize, Ordering};

static OWNERS: AtomicUsize = AtomicUsize::new(0);

/// A counted reference to the platform audio subsystem.
#[derive(Debug)]
pub struct AudioSubsystem {
    _private: (),
}

impl AudioSubsystem {
    /// Registers a new owner, initializing the subsystem if it is the first.
    pub fn acquire() -> Self {
        if OWNERS.fetch_add(1, Ordering::AcqRel) == 0 {
            log::info!("Audio subsystem initialized.");
        }
        Self { _private: () }
    }

    /// The number of live owners.
    pub fn owner_count() -> usize {
        OWNERS.load(Ordering::Acquire)
    }

    /// Returns `true` while at least one owner is alive.
    pub fn is_initialized() -> bool {
        Self::owner_count() > 0
    }
}

impl Clone for AudioSubsystem {
    fn clone(&self) -> Self {
        Self::acquire()
    }
}

impl Drop for AudioSubsystem {
    fn drop(&mut self) {
        if OWNERS.fetch_sub(1, Ordering::AcqRel) == 1 {
            log::info!("Audio subsystem shut down (last owner released).");
        }
    }
}
