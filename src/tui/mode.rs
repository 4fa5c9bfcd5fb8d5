use crate::shared::ControlId;

use super::bindings::ControlSet;

// state local to the tui: which panel control has focus.
// panel_open is synced from DisplayState each loop
#[derive(Clone, Debug, Default)]
pub struct TuiState {
    pub focus: usize,
    pub panel_open: bool,
}

impl TuiState {
    pub fn focused(&self, set: &ControlSet) -> Option<ControlId> {
        if !self.panel_open || set.is_empty() {
            return None;
        }
        set.get(self.focus.min(set.len() - 1))
    }

    // wraps around at both ends
    pub fn move_focus(&mut self, delta: isize, set: &ControlSet) {
        if set.is_empty() {
            return;
        }
        let len = set.len() as isize;
        let current = self.focus.min(set.len() - 1) as isize;
        self.focus = (current + delta).rem_euclid(len) as usize;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focus_wraps_and_needs_an_open_panel() {
        let set = ControlSet::from_hidden(&[ControlId::AudioControlBtn]);
        let mut ts = TuiState::default();
        assert_eq!(ts.focused(&set), None);

        ts.panel_open = true;
        assert_eq!(ts.focused(&set), Some(ControlId::CloseAudioPanel));
        ts.move_focus(-1, &set);
        assert_eq!(ts.focused(&set), Some(ControlId::MusicVolume));
        ts.move_focus(1, &set);
        assert_eq!(ts.focused(&set), Some(ControlId::CloseAudioPanel));
    }
}
