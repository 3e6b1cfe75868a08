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

// Cadenza Sandbox
//
// Plays a sound file (or a generated tone) and orbits it around the listener.
//
//     cargo run -p sandbox -- path/to/sound.ogg

use anyhow::{bail, Result};
use cadenza_agents::AudioAgent;
use cadenza_core::audio::{AudioAsset, AudioConfig, AudioLoader, AudioMixer};
use cadenza_core::math::Vec3;
use cadenza_infra::audio::CpalAudioBackend;
use std::f32::consts::TAU;
use std::path::PathBuf;
use std::time::{Duration, Instant};

const FRAME: Duration = Duration::from_millis(16);
const ORBIT_RADIUS: f32 = 4.0;
const ORBIT_SECONDS: f32 = 6.0;
const RUN_SECONDS: u64 = 12;

/// One second of a 440 Hz sine, mono.
fn tone() -> AudioAsset {
    let rate = 48_000;
    let samples: Vec<f32> = (0..rate)
        .map(|i| (TAU * 440.0 * i as f32 / rate as f32).sin() * 0.3)
        .collect();
    AudioAsset::from_f32_samples(&samples, rate, 1)
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info"))
        .filter_module("symphonia_core", log::LevelFilter::Warn)
        .init();

    let mut agent = AudioAgent::new(Box::new(CpalAudioBackend::new()), AudioConfig::default());
    if agent.device_format().is_none() {
        bail!("no audio output device available");
    }

    let sound = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) if agent.can_load(&path) => agent.load(&path)?,
        Some(path) => bail!("unsupported audio file '{}'", path.display()),
        None => {
            log::info!("Sandbox: No file given, playing a generated tone.");
            tone()
        }
    };

    agent.set_looping(&sound, true);
    agent.play(&sound);

    let start = Instant::now();
    while start.elapsed() < Duration::from_secs(RUN_SECONDS) {
        let angle = start.elapsed().as_secs_f32() / ORBIT_SECONDS * TAU;
        let position = Vec3::new(angle.cos(), 0.0, angle.sin()) * ORBIT_RADIUS;
        agent.set_position(&sound, position);
        agent.update();
        std::thread::sleep(FRAME);
    }

    agent.stop(&sound);
    log::info!("Sandbox: Done.");
    Ok(())
}
