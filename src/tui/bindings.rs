// View-binding layer: which panel controls exist in this layout, and what a
// gesture on each of them means for the controller. A control that is not in
// the set produces nothing; the rest keep working.
use crate::shared::{Channel, ControlId, ControlValues, InputEvent, VOLUME_STEP};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gesture {
    Activate, // space / enter / hotkey
    Decrease, // left
    Increase, // right
}

#[derive(Clone, Debug, PartialEq)]
pub struct ControlSet {
    present: Vec<ControlId>, // panel order
}

impl Default for ControlSet {
    fn default() -> Self {
        Self::from_hidden(&[])
    }
}

impl ControlSet {
    pub fn from_hidden(hidden: &[ControlId]) -> Self {
        Self {
            present: ControlId::ALL.iter().copied().filter(|c| !hidden.contains(c)).collect(),
        }
    }

    pub fn contains(&self, control: ControlId) -> bool {
        self.present.contains(&control)
    }

    pub fn controls(&self) -> &[ControlId] {
        &self.present
    }

    pub fn len(&self) -> usize {
        self.present.len()
    }

    pub fn is_empty(&self) -> bool {
        self.present.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<ControlId> {
        self.present.get(index).copied()
    }

    pub fn bind(
        &self,
        control: ControlId,
        gesture: Gesture,
        values: &ControlValues,
    ) -> Option<InputEvent> {
        if !self.contains(control) {
            return None;
        }
        use ControlId as C;
        use Gesture::*;
        match (control, gesture) {
            (C::AudioControlBtn, Activate) => Some(InputEvent::TogglePanel),
            (C::CloseAudioPanel, Activate) => Some(InputEvent::ClosePanel),
            (C::RealisticModeBtn, Activate) => Some(InputEvent::ToggleRealisticMode),
            (C::MuteAllBtn, Activate) => Some(InputEvent::MuteAll),
            (C::ThunderTest, Activate) => Some(InputEvent::TestThunder),

            (C::RainToggle, Activate) => {
                Some(InputEvent::SetEnabled(Channel::Rain, !values.rain_enabled))
            }
            (C::ThunderToggle, Activate) => {
                Some(InputEvent::SetEnabled(Channel::Thunder, !values.thunder_enabled))
            }
            (C::CrowdToggle, Activate) => {
                Some(InputEvent::SetEnabled(Channel::Crowd, !values.crowd_enabled))
            }
            (C::MusicToggle, Activate) => {
                Some(InputEvent::SetEnabled(Channel::Music, !values.music_enabled))
            }

            (C::RainVolume, g) => step_volume(Channel::Rain, values.rain_volume, g),
            (C::ThunderVolume, g) => step_volume(Channel::Thunder, values.thunder_volume, g),
            (C::CrowdVolume, g) => step_volume(Channel::Crowd, values.crowd_volume, g),
            (C::MusicVolume, g) => step_volume(Channel::Music, values.music_volume, g),

            (C::RainIntensity, Decrease) => {
                Some(InputEvent::SetRainIntensity(values.rain_intensity.prev()))
            }
            (C::RainIntensity, _) => {
                Some(InputEvent::SetRainIntensity(values.rain_intensity.next()))
            }
            (C::ThunderFrequency, Decrease) => {
                Some(InputEvent::SetThunderFrequency(values.thunder_frequency.prev()))
            }
            (C::ThunderFrequency, _) => {
                Some(InputEvent::SetThunderFrequency(values.thunder_frequency.next()))
            }
            (C::LightningIntensity, Decrease) => {
                Some(InputEvent::SetLightningIntensity(values.lightning_intensity.prev()))
            }
            (C::LightningIntensity, _) => {
                Some(InputEvent::SetLightningIntensity(values.lightning_intensity.next()))
            }
            (C::LightningType, Decrease) => {
                Some(InputEvent::SetLightningType(values.lightning_type.prev()))
            }
            (C::LightningType, _) => {
                Some(InputEvent::SetLightningType(values.lightning_type.next()))
            }

            _ => None,
        }
    }
}

// Sliders run 0..=100; an out-of-range stored value is pulled back in on the first step.
fn step_volume(channel: Channel, current: i32, gesture: Gesture) -> Option<InputEvent> {
    let delta = match gesture {
        Gesture::Decrease => -VOLUME_STEP,
        Gesture::Increase => VOLUME_STEP,
        Gesture::Activate => return None,
    };
    Some(InputEvent::SetVolume(channel, (current.clamp(0, 100) + delta).clamp(0, 100)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{LightningType, RainIntensity};

    #[test]
    fn hidden_controls_bind_to_nothing() {
        let set = ControlSet::from_hidden(&[ControlId::ThunderTest, ControlId::MuteAllBtn]);
        let values = ControlValues::default();
        assert_eq!(set.bind(ControlId::ThunderTest, Gesture::Activate, &values), None);
        assert_eq!(set.bind(ControlId::MuteAllBtn, Gesture::Activate, &values), None);
        // everything else still works
        assert_eq!(
            set.bind(ControlId::RealisticModeBtn, Gesture::Activate, &values),
            Some(InputEvent::ToggleRealisticMode)
        );
        assert_eq!(set.len(), ControlId::ALL.len() - 2);
    }

    #[test]
    fn toggles_flip_the_current_state() {
        let set = ControlSet::default();
        let mut values = ControlValues::default();
        assert_eq!(
            set.bind(ControlId::CrowdToggle, Gesture::Activate, &values),
            Some(InputEvent::SetEnabled(Channel::Crowd, true))
        );
        values.crowd_enabled = true;
        assert_eq!(
            set.bind(ControlId::CrowdToggle, Gesture::Activate, &values),
            Some(InputEvent::SetEnabled(Channel::Crowd, false))
        );
        assert_eq!(set.bind(ControlId::CrowdToggle, Gesture::Increase, &values), None);
    }

    #[test]
    fn sliders_step_within_bounds() {
        let set = ControlSet::default();
        let mut values = ControlValues { rain_volume: 30, ..Default::default() };
        assert_eq!(
            set.bind(ControlId::RainVolume, Gesture::Increase, &values),
            Some(InputEvent::SetVolume(Channel::Rain, 35))
        );
        values.rain_volume = 2;
        assert_eq!(
            set.bind(ControlId::RainVolume, Gesture::Decrease, &values),
            Some(InputEvent::SetVolume(Channel::Rain, 0))
        );
        values.rain_volume = 250;
        assert_eq!(
            set.bind(ControlId::RainVolume, Gesture::Decrease, &values),
            Some(InputEvent::SetVolume(Channel::Rain, 95))
        );
        assert_eq!(set.bind(ControlId::RainVolume, Gesture::Activate, &values), None);
    }

    #[test]
    fn selects_cycle_both_ways() {
        let set = ControlSet::default();
        let values = ControlValues::default();
        assert_eq!(
            set.bind(ControlId::RainIntensity, Gesture::Increase, &values),
            Some(InputEvent::SetRainIntensity(RainIntensity::Heavy))
        );
        assert_eq!(
            set.bind(ControlId::RainIntensity, Gesture::Decrease, &values),
            Some(InputEvent::SetRainIntensity(RainIntensity::Light))
        );
        assert_eq!(
            set.bind(ControlId::LightningType, Gesture::Decrease, &values),
            Some(InputEvent::SetLightningType(LightningType::Continuous))
        );
    }
}
