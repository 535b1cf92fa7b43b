//! Voice lifecycle scenarios: exclusivity, expiry, stop and release

use super::test_manager;
use crate::audio::backend::headless::BackendEvent;
use crate::audio::{AudioError, Clip, MixerTarget, PlayRequest, StopTarget, VoiceCategory};

#[cfg(test)]
mod tests {
    use super::*;

    fn sfx() -> Option<MixerTarget> {
        Some(MixerTarget::new("sfx"))
    }

    #[test]
    fn test_at_most_one_music_voice() {
        let (manager, clock) = test_manager();
        let tracks: Vec<Clip> = (0..6).map(|i| Clip::new(format!("track_{i}"), 90.0)).collect();

        for track in &tracks {
            manager.play_loop(VoiceCategory::Music, track, Some(MixerTarget::new("music"))).unwrap();
            clock.advance(0.25);
            manager.update();
            assert_eq!(manager.active_voices(VoiceCategory::Music).len(), 1);
        }

        let live = manager.active_voices(VoiceCategory::Music);
        assert_eq!(live[0].clip_id, "track_5");
        manager.with_backend(|backend| {
            assert_eq!(backend.live_count(), 1);
            assert_eq!(backend.audible_clips(), vec!["track_5"]);
        });
    }

    #[test]
    fn test_effects_expire_independently() {
        let (manager, clock) = test_manager();
        let durations = [0.25_f32, 0.5, 0.75, 1.0];
        let ids: Vec<_> = durations
            .iter()
            .enumerate()
            .map(|(i, d)| manager.play_effect(&Clip::new(format!("hit_{i}"), *d), 1.0, sfx()).unwrap())
            .collect();
        assert_eq!(manager.active_voices(VoiceCategory::SoundEffect).len(), 4);

        for expired in 0..durations.len() {
            clock.advance(0.25);
            assert_eq!(manager.update(), 1);
            assert!(manager.voice(ids[expired]).is_none());
            for id in &ids[expired + 1..] {
                assert!(manager.voice(*id).is_some());
            }
        }
        assert!(manager.active_voices(VoiceCategory::SoundEffect).is_empty());
    }

    #[test]
    fn test_effect_gone_at_end_of_clip() {
        let (manager, clock) = test_manager();
        clock.set(10.0);
        let id = manager.play_effect(&Clip::new("coin", 0.75), 1.1, sfx()).unwrap();
        let voice = manager.voice(id).unwrap();
        assert_eq!(voice.started_at, 10.0);
        assert_eq!(voice.expire_at, Some(10.75));

        clock.set(10.7);
        manager.update();
        assert_eq!(manager.active_voices(VoiceCategory::SoundEffect).len(), 1);

        clock.set(10.75);
        manager.update();
        assert!(manager.active_voices(VoiceCategory::SoundEffect).is_empty());
    }

    #[test]
    fn test_zero_duration_effect_never_expires() {
        let (manager, clock) = test_manager();
        let id = manager.play_effect(&Clip::new("stream", 0.0), 1.0, sfx()).unwrap();
        assert_eq!(manager.voice(id).unwrap().expire_at, None);

        for _ in 0..10 {
            clock.advance(1000.0);
            assert_eq!(manager.update(), 0);
        }
        assert!(manager.is_playing(id));

        assert_eq!(manager.stop(StopTarget::Voice(id)), 1);
        assert!(!manager.is_playing(id));
    }

    #[test]
    fn test_stop_twice_equals_once() {
        let (manager, _clock) = test_manager();
        let id = manager.play_loop(VoiceCategory::Ambiance, &Clip::new("rain", 0.0), None).unwrap();
        let keep = manager.play_effect(&Clip::new("step", 0.4), 1.0, sfx()).unwrap();

        assert_eq!(manager.stop(StopTarget::Voice(id)), 1);
        assert_eq!(manager.stop(StopTarget::Voice(id)), 0);

        assert!(manager.voice(keep).is_some());
        manager.with_backend(|backend| {
            assert_eq!(backend.release_count(0), 1);
            assert_eq!(backend.released_total(), 1);
        });
    }

    #[test]
    fn test_ambiance_replace_releases_incumbent_first() {
        let (manager, _clock) = test_manager();
        manager.play_loop(VoiceCategory::Ambiance, &Clip::new("forest", 0.0), None).unwrap();
        manager.play_loop(VoiceCategory::Ambiance, &Clip::new("cave", 0.0), None).unwrap();

        let live = manager.active_voices(VoiceCategory::Ambiance);
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].clip_id, "cave");

        manager.with_backend(|backend| {
            assert_eq!(backend.release_count(0), 1);
            let tail = &backend.events()[backend.events().len() - 3..];
            assert_eq!(
                tail,
                &[
                    BackendEvent::Acquired {
                        handle: 1,
                        clip_id: "cave".to_string()
                    },
                    BackendEvent::Released { handle: 0 },
                    BackendEvent::Started { handle: 1 },
                ]
            );
        });
    }

    #[test]
    fn test_expiry_and_stop_race_releases_once() {
        let (manager, clock) = test_manager();
        let id = manager.play_effect(&Clip::new("zap", 0.5), 1.0, sfx()).unwrap();

        clock.advance(1.0);
        assert_eq!(manager.update(), 1);
        assert_eq!(manager.stop(StopTarget::Voice(id)), 0);
        assert_eq!(manager.stop(StopTarget::Category(VoiceCategory::SoundEffect)), 0);
        manager.with_backend(|backend| assert_eq!(backend.release_count(0), 1));
    }

    #[test]
    fn test_stale_id_does_not_stop_new_voice() {
        let (manager, _clock) = test_manager();
        let first = manager.play_loop(VoiceCategory::Music, &Clip::new("a", 0.0), None).unwrap();
        let second = manager.play_loop(VoiceCategory::Music, &Clip::new("b", 0.0), None).unwrap();

        assert_eq!(manager.stop(StopTarget::Voice(first)), 0);
        assert!(manager.is_playing(second));
    }

    #[test]
    fn test_backend_refusal_keeps_incumbent() {
        let (manager, _clock) = test_manager();
        let theme = manager.play_loop(VoiceCategory::Music, &Clip::new("theme", 0.0), None).unwrap();

        manager.with_backend_mut(|backend| backend.set_refusing(true));
        assert!(matches!(
            manager.play_loop(VoiceCategory::Music, &Clip::new("boss", 0.0), None),
            Err(AudioError::BackendRefused(_))
        ));

        let live = manager.active_voices(VoiceCategory::Music);
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].id, theme);
        assert!(manager.is_playing(theme));

        manager.with_backend_mut(|backend| backend.set_refusing(false));
        manager.play_loop(VoiceCategory::Music, &Clip::new("boss", 0.0), None).unwrap();
        assert!(!manager.is_playing(theme));
    }

    #[test]
    fn test_invalid_requests_change_nothing() {
        let (manager, _clock) = test_manager();
        let theme = manager.play_loop(VoiceCategory::Music, &Clip::new("theme", 0.0), None).unwrap();

        let bad_clip = Clip::new("broken", -1.0);
        assert!(matches!(
            manager.play_loop(VoiceCategory::Music, &bad_clip, None),
            Err(AudioError::MissingResource(_))
        ));
        assert!(matches!(
            manager.play_loop(VoiceCategory::Music, &Clip::new("other", 0.0), Some(MixerTarget::new("radio"))),
            Err(AudioError::MissingResource(_))
        ));
        assert!(matches!(
            manager.play(PlayRequest::new(VoiceCategory::Music, &Clip::new("other", 0.0)).with_pitch(0.0)),
            Err(AudioError::InvalidParameter(_))
        ));

        assert!(manager.is_playing(theme));
        manager.with_backend(|backend| {
            assert_eq!(backend.acquired_total(), 1);
            assert_eq!(backend.released_total(), 0);
        });
    }

    #[test]
    fn test_every_handle_released_exactly_once() {
        let (manager, clock) = test_manager();
        let step = Clip::new("step", 0.3);
        for i in 0..20 {
            manager.play_effect(&step, 1.0, sfx()).unwrap();
            if i % 5 == 0 {
                manager.play_loop(VoiceCategory::Music, &Clip::new(format!("m{i}"), 0.0), None).unwrap();
                manager.play_loop(VoiceCategory::Ambiance, &Clip::new(format!("a{i}"), 0.0), None).unwrap();
            }
            clock.advance(0.1);
            manager.update();
        }
        manager.stop(StopTarget::Category(VoiceCategory::Ambiance));
        manager.shutdown();

        manager.with_backend(|backend| {
            assert_eq!(backend.live_count(), 0);
            assert_eq!(backend.acquired_total(), backend.released_total());
            for raw in 0..backend.acquired_total() as u64 {
                assert_eq!(backend.release_count(raw), 1, "handle {raw}");
            }
        });
    }
}
