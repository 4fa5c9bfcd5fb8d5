use std::time::Duration;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crate::shared::{ControlId, ControlValues, InputEvent};
use super::bindings::{ControlSet, Gesture};
use super::mode::TuiState;

// poll for input from the tui, track focus in tuistate,
// resolve keys to input events through the control bindings
pub fn poll_input(
    timeout: Duration,
    ts: &mut TuiState,
    set: &ControlSet,
    values: &ControlValues,
) -> anyhow::Result<Vec<InputEvent>> {
    if !event::poll(timeout)? {
        return Ok(vec![]);
    }

    if let Event::Key(key) = event::read()? {
        if key.kind != KeyEventKind::Press {
            return Ok(vec![]);
        }
        return Ok(handle_key(key.code, ts, set, values));
    }
    Ok(vec![])
}

fn handle_key(
    code: KeyCode,
    ts: &mut TuiState,
    set: &ControlSet,
    values: &ControlValues,
) -> Vec<InputEvent> {
    let hotkey = |control: ControlId| -> Vec<InputEvent> {
        set.bind(control, Gesture::Activate, values).into_iter().collect()
    };
    match code {
        KeyCode::Esc => vec![InputEvent::Quit],

        // hotkeys, also when the panel is closed
        KeyCode::Char('p') => hotkey(ControlId::AudioControlBtn),
        KeyCode::Char('m') => hotkey(ControlId::MuteAllBtn),
        KeyCode::Char('R') => hotkey(ControlId::RealisticModeBtn),
        KeyCode::Char('t') => hotkey(ControlId::ThunderTest),

        // panel navigation
        KeyCode::Up if ts.panel_open => { ts.move_focus(-1, set); vec![] }
        KeyCode::Down if ts.panel_open => { ts.move_focus(1, set); vec![] }
        KeyCode::Char(' ') | KeyCode::Enter => on_focused(Gesture::Activate, ts, set, values),
        KeyCode::Left => on_focused(Gesture::Decrease, ts, set, values),
        KeyCode::Right => on_focused(Gesture::Increase, ts, set, values),

        _ => vec![],
    }
}

fn on_focused(
    gesture: Gesture,
    ts: &TuiState,
    set: &ControlSet,
    values: &ControlValues,
) -> Vec<InputEvent> {
    ts.focused(set)
        .and_then(|control| set.bind(control, gesture, values))
        .into_iter()
        .collect()
}
