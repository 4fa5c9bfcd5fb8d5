// Channel players: reapply one channel's settings to its voice, then save.
use rand::Rng;
use tracing::debug;

use super::{AmbientController, NO_SONG};
use crate::assets::{rain_sound, CROWD_SOUND, PLAYLIST};
use crate::audio_api::AudioCommand;
use crate::settings::gain;
use crate::shared::Channel;

impl AmbientController {
    pub fn update_channel(&mut self, channel: Channel) {
        match channel {
            Channel::Rain => self.update_rain(),
            Channel::Thunder => self.update_thunder(),
            Channel::Crowd => self.update_crowd(),
            Channel::Music => self.update_music(),
        }
    }

    pub fn update_audio_elements(&mut self) {
        self.update_rain();
        self.update_thunder();
        self.update_crowd();
        self.update_music();
    }

    pub fn update_rain(&mut self) {
        let rain = self.settings.rain.clone();
        if rain.enabled {
            let url = self.catalog.url(rain_sound(rain.intensity));
            self.load_if_changed(Channel::Rain, url);
            self.emit(AudioCommand::SetVolume { channel: Channel::Rain, gain: gain(rain.volume) });
            self.emit(AudioCommand::SetLoop { channel: Channel::Rain, looped: true });
            self.emit(AudioCommand::Play(Channel::Rain));
            self.rain.restart(rain.intensity);
        } else {
            self.stop_channel(Channel::Rain);
            self.rain.hide();
        }
        self.persist();
    }

    pub fn update_crowd(&mut self) {
        let crowd = self.settings.crowd.clone();
        if crowd.enabled {
            let url = self.catalog.url(CROWD_SOUND);
            self.load_if_changed(Channel::Crowd, url);
            self.emit(AudioCommand::SetVolume {
                channel: Channel::Crowd,
                gain: gain(crowd.volume),
            });
            self.emit(AudioCommand::SetLoop { channel: Channel::Crowd, looped: true });
            self.emit(AudioCommand::Play(Channel::Crowd));
        } else {
            self.stop_channel(Channel::Crowd);
        }
        self.persist();
    }

    pub fn update_music(&mut self) {
        let music = self.settings.music.clone();
        if music.enabled {
            self.emit(AudioCommand::SetVolume {
                channel: Channel::Music,
                gain: gain(music.volume),
            });
            self.play_current_song(false);
        } else {
            self.stop_channel(Channel::Music);
            self.now_playing = NO_SONG.to_string();
        }
        self.persist();
    }

    pub fn randomize_initial_song(&mut self) {
        self.current_song = self.rng.random_range(0..PLAYLIST.len());
    }

    /// Called when the music track ends: draw another track at random and
    /// play it if music is still on.
    pub fn next_song(&mut self) {
        self.current_song = self.rng.random_range(0..PLAYLIST.len());
        if self.settings.music.enabled {
            self.play_current_song(true);
        }
    }

    // `restart` rewinds when the drawn track is the one already loaded.
    fn play_current_song(&mut self, restart: bool) {
        let track = PLAYLIST[self.current_song % PLAYLIST.len()];
        let url = self.catalog.url(track.file);
        if !self.load_if_changed(Channel::Music, url) && restart {
            self.emit(AudioCommand::Rewind(Channel::Music));
        }
        self.emit(AudioCommand::SetLoop { channel: Channel::Music, looped: false });
        self.emit(AudioCommand::Play(Channel::Music));
        if self.now_playing != track.name {
            debug!(track = track.name, "now playing");
        }
        self.now_playing = track.name.to_string();
    }

    /// Returns whether a new source was loaded.
    pub(super) fn load_if_changed(&mut self, channel: Channel, url: String) -> bool {
        let slot = &mut self.loaded[channel.index()];
        if slot.as_deref() == Some(url.as_str()) {
            return false;
        }
        *slot = Some(url.clone());
        self.emit(AudioCommand::Load { channel, url });
        true
    }

    pub(super) fn stop_channel(&mut self, channel: Channel) {
        self.emit(AudioCommand::Pause(channel));
        self.emit(AudioCommand::Rewind(channel));
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::audio_api::AudioCommand;
    use crate::settings::RainIntensity;
    use crate::shared::{Channel, InputEvent};

    fn loads(cmds: &[AudioCommand], channel: Channel) -> Vec<String> {
        cmds.iter()
            .filter_map(|c| match c {
                AudioCommand::Load { channel: ch, url } if *ch == channel => Some(url.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn disabling_any_channel_pauses_and_rewinds() {
        let blob = concat!(
            r#"{"rain":{"enabled":true},"thunder":{"enabled":true},"#,
            r#""crowd":{"enabled":true},"music":{"enabled":true}}"#,
        );
        for channel in Channel::ALL {
            let (mut ctl, _) = started(Some(blob));
            let cmds = ctl.handle_input(InputEvent::SetEnabled(channel, false));
            let pause = cmds.iter().position(|c| *c == AudioCommand::Pause(channel));
            let rewind = cmds.iter().position(|c| *c == AudioCommand::Rewind(channel));
            assert!(pause.is_some() && rewind.is_some(), "{channel:?}");
            assert!(!cmds.contains(&AudioCommand::Play(channel)));
        }
    }

    #[test]
    fn volume_is_applied_as_gain() {
        let (mut ctl, _) = started(None);
        ctl.handle_input(InputEvent::SetEnabled(Channel::Crowd, true));
        for v in [0, 1, 37, 100] {
            let cmds = ctl.handle_input(InputEvent::SetVolume(Channel::Crowd, v));
            let gain = v as f32 / 100.0;
            let expected = AudioCommand::SetVolume { channel: Channel::Crowd, gain };
            assert!(cmds.contains(&expected));
        }
        // stored as-is, clamped only on the way out
        let cmds = ctl.handle_input(InputEvent::SetVolume(Channel::Crowd, 250));
        assert!(cmds.contains(&AudioCommand::SetVolume { channel: Channel::Crowd, gain: 1.0 }));
        assert_eq!(ctl.settings().crowd.volume, 250);
    }

    #[test]
    fn source_is_only_loaded_when_it_changes() {
        let (mut ctl, _) = started(None);
        let cmds = ctl.handle_input(InputEvent::SetEnabled(Channel::Rain, true));
        assert_eq!(
            loads(&cmds, Channel::Rain),
            vec!["/static/chatkada/sounds/Rain.mp3".to_string()]
        );

        let cmds = ctl.handle_input(InputEvent::SetVolume(Channel::Rain, 60));
        assert!(loads(&cmds, Channel::Rain).is_empty());
        assert!(cmds.contains(&AudioCommand::Play(Channel::Rain)));

        // heavy shares the medium file
        let cmds = ctl.handle_input(InputEvent::SetRainIntensity(RainIntensity::Heavy));
        assert!(loads(&cmds, Channel::Rain).is_empty());

        let cmds = ctl.handle_input(InputEvent::SetRainIntensity(RainIntensity::Light));
        assert_eq!(
            loads(&cmds, Channel::Rain),
            vec!["/static/chatkada/sounds/rain-light.mp3".to_string()]
        );
    }

    #[test]
    fn rain_and_crowd_loop_music_does_not() {
        let (mut ctl, _) = started(None);
        let cmds = ctl.handle_input(InputEvent::SetEnabled(Channel::Rain, true));
        assert!(cmds.contains(&AudioCommand::SetLoop { channel: Channel::Rain, looped: true }));
        let cmds = ctl.handle_input(InputEvent::SetEnabled(Channel::Crowd, true));
        assert!(cmds.contains(&AudioCommand::SetLoop { channel: Channel::Crowd, looped: true }));
        let cmds = ctl.handle_input(InputEvent::SetEnabled(Channel::Music, true));
        assert!(cmds.contains(&AudioCommand::SetLoop { channel: Channel::Music, looped: false }));
        assert_ne!(ctl.display_state().now_playing, super::NO_SONG);
    }

    #[test]
    fn rain_drop_field_follows_the_channel() {
        let (mut ctl, _) = started(None);
        assert!(!ctl.display_state().rain_visible);
        ctl.handle_input(InputEvent::SetEnabled(Channel::Rain, true));
        ctl.tick(std::time::Duration::from_millis(500));
        let ds = ctl.display_state();
        assert!(ds.rain_visible);
        assert!(!ds.drops.is_empty());

        ctl.handle_input(InputEvent::SetEnabled(Channel::Rain, false));
        let ds = ctl.display_state();
        assert!(!ds.rain_visible);
        assert!(ds.drops.is_empty());
    }

    #[test]
    fn track_end_with_music_on_plays_a_new_track() {
        let (mut ctl, _) = started(Some(r#"{"music":{"enabled":true}}"#));
        for _ in 0..20 {
            let cmds = ctl.on_audio_event(crate::audio_api::AudioEvent::TrackEnded(Channel::Music));
            assert!(cmds.contains(&AudioCommand::Play(Channel::Music)));
            // either a fresh source or the same one from the top
            let reloaded = !loads(&cmds, Channel::Music).is_empty();
            assert!(reloaded || cmds.contains(&AudioCommand::Rewind(Channel::Music)));
        }
    }

    #[test]
    fn track_end_with_music_off_stays_silent() {
        let (mut ctl, _) = started(None);
        let before = ctl.current_song;
        let mut changed = false;
        for _ in 0..20 {
            let cmds = ctl.on_audio_event(crate::audio_api::AudioEvent::TrackEnded(Channel::Music));
            assert!(cmds.is_empty());
            changed |= ctl.current_song != before;
        }
        assert!(changed);
    }
}
