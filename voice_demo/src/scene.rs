//! Scripted ten-second scene

use audio_voices::audio::{
    AudioResult, AudioVoiceManager, Clip, ClipBank, ClipSet, MixerTarget, PlayRequest, PlaybackBackend, StopTarget,
    VoiceCategory,
};

const FRAME_SECONDS: f64 = 1.0 / 60.0;
const SCENE_SECONDS: f64 = 10.0;
const STEP_INTERVAL: f64 = 0.4;
const WALKING_UNTIL: f64 = 9.0;

/// Clips the scene plays
pub struct SceneClips {
    player: ClipBank,
    forest: Clip,
    cave: Clip,
    explore: Clip,
    hit: Clip,
}

impl SceneClips {
    fn assemble(mut make: impl FnMut(&str, f32) -> AudioResult<Clip>) -> AudioResult<Self> {
        let mut player = ClipBank::new("player");
        player.insert(
            "footstep",
            ClipSet::new(vec![
                make("footstep_01", 0.35)?,
                make("footstep_02", 0.32)?,
                make("footstep_03", 0.38)?,
            ])
            .with_pitch_jitter(0.95, 1.05),
        );
        player.insert(
            "eat",
            ClipSet::new(vec![make("eat_01", 0.8)?, make("eat_02", 0.9)?]).with_pitch_jitter(0.95, 1.05),
        );

        Ok(Self {
            player,
            forest: make("amb_forest", 0.0)?,
            cave: make("amb_cave", 0.0)?,
            explore: make("mus_explore", 0.0)?,
            hit: make("mus_hit", 1.5)?,
        })
    }

    /// Clips without audio data, for the headless backend
    #[cfg_attr(feature = "rodio", allow(dead_code))]
    pub fn metadata() -> AudioResult<Self> {
        Self::assemble(|name, duration| Ok(Clip::new(name, duration)))
    }

    /// Decode every clip from `<dir>/<name>.wav`
    #[cfg(feature = "rodio")]
    pub fn load(dir: &str) -> AudioResult<Self> {
        use audio_voices::audio::backend::rodio_backend::load_clip;
        let dir = std::path::Path::new(dir);
        Self::assemble(|name, _| load_clip(name, dir.join(format!("{name}.wav"))))
    }
}

#[derive(Debug, Clone, Copy)]
enum Cue {
    EnterForest,
    StartMusic,
    LowHealth,
    Hit,
    Eat,
    Recover,
    EnterCave,
    FadeOut,
    StopMusic,
}

const SCRIPT: [(f64, Cue); 9] = [
    (0.0, Cue::EnterForest),
    (0.0, Cue::StartMusic),
    (3.0, Cue::LowHealth),
    (3.5, Cue::Hit),
    (5.0, Cue::Eat),
    (6.0, Cue::Recover),
    (7.0, Cue::EnterCave),
    (9.0, Cue::FadeOut),
    (9.8, Cue::StopMusic),
];

fn play_cue<B: PlaybackBackend<Clip = Clip>>(
    manager: &AudioVoiceManager<B>,
    clips: &SceneClips,
    cue: Cue,
    rng: &mut impl rand::Rng,
) -> AudioResult<()> {
    let music = || Some(MixerTarget::new("music"));
    let ambiance = || Some(MixerTarget::new("ambiance"));

    match cue {
        Cue::EnterForest => manager.play_loop(VoiceCategory::Ambiance, &clips.forest, ambiance()).map(drop),
        Cue::EnterCave => manager.play_loop(VoiceCategory::Ambiance, &clips.cave, ambiance()).map(drop),
        Cue::StartMusic => manager.play_loop(VoiceCategory::Music, &clips.explore, music()).map(drop),
        // One-shot sting over the music bed
        Cue::Hit => manager
            .play(PlayRequest::new(VoiceCategory::SoundEffect, &clips.hit).with_mixer_target(music()))
            .map(drop),
        Cue::Eat => manager
            .play_from_bank(&clips.player, "eat", Some(MixerTarget::new("sfx")), rng)
            .map(drop),
        // Music and ambiance fade side by side at their own pace
        Cue::LowHealth => {
            manager.transition_snapshot("musLowHealth", 3.0)?;
            manager.transition_snapshot("ambLowHealth", 0.3)
        }
        Cue::Recover => {
            manager.transition_snapshot("musNormal", 1.0)?;
            manager.transition_snapshot("ambNormal", 1.0)
        }
        Cue::FadeOut => manager.transition_snapshot("off", 0.75),
        Cue::StopMusic => {
            manager.stop(StopTarget::Category(VoiceCategory::Music));
            Ok(())
        }
    }
}

/// Run the scene, calling `wait` with each frame's length
pub fn run<B: PlaybackBackend<Clip = Clip>>(
    manager: &AudioVoiceManager<B>,
    clips: &SceneClips,
    mut wait: impl FnMut(f64),
) {
    let mut rng = rand::thread_rng();
    let mut script = SCRIPT.iter().peekable();
    let mut next_step = 0.0;
    let mut next_report = 0.0;
    let mut frame: u32 = 0;

    loop {
        let elapsed = f64::from(frame) * FRAME_SECONDS;
        if elapsed > SCENE_SECONDS {
            break;
        }

        while let Some((_, cue)) = script.next_if(|(at, _)| *at <= elapsed) {
            log::info!("[{elapsed:5.2}s] {cue:?}");
            if let Err(e) = play_cue(manager, clips, *cue, &mut rng) {
                log::warn!("Cue {cue:?} failed: {e}");
            }
        }

        if elapsed < WALKING_UNTIL && elapsed >= next_step {
            next_step += STEP_INTERVAL;
            if let Err(e) = manager.play_from_bank(&clips.player, "footstep", Some(MixerTarget::new("sfx")), &mut rng) {
                log::warn!("Footstep failed: {e}");
            }
        }

        let expired = manager.update();
        if expired > 0 {
            log::debug!("[{elapsed:5.2}s] {expired} voices finished");
        }

        if elapsed >= next_report {
            next_report += 1.0;
            report(manager, elapsed);
        }

        wait(FRAME_SECONDS);
        frame += 1;
    }

    manager.shutdown();
}

fn report<B: PlaybackBackend>(manager: &AudioVoiceManager<B>, elapsed: f64) {
    let names = |category| {
        manager
            .active_voices(category)
            .into_iter()
            .map(|voice| voice.clip_id)
            .collect::<Vec<_>>()
            .join(", ")
    };
    let now = manager.now();
    let effects_tail = manager
        .active_voices(VoiceCategory::SoundEffect)
        .iter()
        .map(|voice| voice.remaining(now))
        .fold(0.0, f64::max);

    log::info!(
        "[{elapsed:5.2}s] {} live | music [{}] at {:.2} | ambiance [{}] at {:.2} | effects done in {effects_tail:.2}s | snapshot {}",
        manager.live_count(),
        names(VoiceCategory::Music),
        manager.mixer_level("music").unwrap_or_default(),
        names(VoiceCategory::Ambiance),
        manager.mixer_level("ambiance").unwrap_or_default(),
        manager.current_snapshot().as_deref().unwrap_or("-"),
    );
}
