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

//! Minimal mathematics primitives used for positioning sound sources.
//!
//! Positions are expressed in listener space: the listener sits at the origin,
//! `+X` points to the listener's right, `+Y` points up, and `-Z` points forward.

mod vector;

pub use vector::Vec3;

/// A small constant for floating-point comparisons.
pub const EPSILON: f32 = 1e-5;
