//! Voice manager demo
//!
//! Drives a short scripted scene through the voice manager: footsteps from a
//! variation bank, an ambiance bed that follows the player's location and a
//! music bed ducked by a low-health snapshot. Runs headless on a simulated
//! clock by default; built with `--features rodio` it plays the clips found
//! in the assets directory in real time.
//!
//! Usage: `voice_demo [config.toml|config.ron] [assets dir]`

mod scene;

use audio_voices::audio::{AudioConfig, AudioError, AudioVoiceManager, MixerSnapshot};
use audio_voices::config::{Config, ConfigError};
use audio_voices::foundation::logging;
use thiserror::Error;

#[derive(Debug, Error)]
enum DemoError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),
}

fn load_config(path: Option<&str>) -> Result<AudioConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(AudioConfig::default()
            .with_snapshot(&MixerSnapshot::new("musNormal").with_level("music", 1.0))
            .with_snapshot(&MixerSnapshot::new("musLowHealth").with_level("music", 0.3))
            .with_snapshot(&MixerSnapshot::new("ambNormal").with_level("ambiance", 1.0))
            .with_snapshot(&MixerSnapshot::new("ambLowHealth").with_level("ambiance", 0.5))
            .with_snapshot(&MixerSnapshot::new("off").with_level("music", 0.0).with_level("ambiance", 0.0)));
    };

    let config = AudioConfig::load_from_file(path)?;
    config.validate()?;
    Ok(config)
}

#[cfg(not(feature = "rodio"))]
fn run(config: AudioConfig, _assets: Option<String>) -> Result<(), DemoError> {
    use audio_voices::audio::backend::headless::HeadlessBackend;
    use audio_voices::foundation::time::ManualClock;

    let clock = ManualClock::new();
    let manager = AudioVoiceManager::with_clock(HeadlessBackend::new(), config, clock.clone())?;
    let clips = scene::SceneClips::metadata()?;

    scene::run(&manager, &clips, |dt| clock.advance(dt));

    manager.with_backend(|backend| {
        log::info!(
            "Headless backend acquired {} voices and released {}",
            backend.acquired_total(),
            backend.released_total()
        );
    });
    Ok(())
}

#[cfg(feature = "rodio")]
fn run(config: AudioConfig, assets: Option<String>) -> Result<(), DemoError> {
    use audio_voices::audio::backend::rodio_backend::RodioBackend;
    use std::time::Duration;

    let manager = AudioVoiceManager::new(RodioBackend::new()?, config)?;
    let clips = scene::SceneClips::load(assets.as_deref().unwrap_or("assets"))?;

    scene::run(&manager, &clips, |dt| std::thread::sleep(Duration::from_secs_f64(dt)));
    Ok(())
}

fn main() -> Result<(), DemoError> {
    let mut args = std::env::args().skip(1);
    let config_path = args.next();
    let assets = args.next();

    let config = load_config(config_path.as_deref())?;
    logging::init_with_level(&config.log_level);

    log::info!(
        "Starting voice demo with {}",
        config_path.as_deref().unwrap_or("built-in configuration")
    );

    match run(config, assets) {
        Ok(()) => {
            log::info!("Voice demo finished successfully");
            Ok(())
        }
        Err(e) => {
            log::error!("Voice demo failed: {e}");
            Err(e)
        }
    }
}
