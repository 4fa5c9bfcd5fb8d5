use crate::shared::{ControlId, ControlValue, DisplayState};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use super::bindings::ControlSet;
use super::sky::{paint_sky, BRANCH, DROP, HEAVY_DROP};

const PANEL_WIDTH: u16 = 44;

pub fn render(
    frame: &mut Frame,
    area: Rect,
    state: &DisplayState,
    set: &ControlSet,
    focused: Option<ControlId>,
) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // sky (+ panel)
            Constraint::Length(1), // status line
        ])
        .split(area);

    if state.panel_open {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(10), Constraint::Length(PANEL_WIDTH)])
            .split(rows[0]);
        draw_sky(frame, cols[0], state);
        draw_panel(frame, cols[1], state, set, focused);
    } else {
        draw_sky(frame, rows[0], state);
    }
    draw_status(frame, rows[1], state);
}

// screen flash brightens the whole sky
fn flash_style(opacity: Option<f32>) -> Style {
    match opacity {
        Some(o) if o >= 0.5 => Style::default().bg(Color::White),
        Some(o) if o >= 0.25 => Style::default().bg(Color::Gray),
        Some(o) if o > 0.0 => Style::default().bg(Color::DarkGray),
        _ => Style::default(),
    }
}

fn draw_sky(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let block = Block::default().borders(Borders::ALL).title(" sky ");
    let inner = block.inner(area);
    let bg = flash_style(state.lightning.screen);
    let grid = paint_sky(state, inner.width as usize, inner.height as usize);

    let lines: Vec<Line> = grid
        .cells
        .iter()
        .map(|row| {
            Line::from(
                row.iter()
                    .map(|&c| {
                        let style = match c {
                            DROP => bg.fg(Color::Blue),
                            HEAVY_DROP => bg.fg(Color::LightBlue),
                            BRANCH => bg.fg(Color::Gray),
                            ' ' => bg,
                            _ => bg.fg(Color::LightYellow).add_modifier(Modifier::BOLD), // bolt
                        };
                        Span::styled(c.to_string(), style)
                    })
                    .collect::<Vec<_>>(),
            )
        })
        .collect();
    frame.render_widget(Paragraph::new(lines).style(bg).block(block), area);
}

fn draw_panel(
    frame: &mut Frame,
    area: Rect,
    state: &DisplayState,
    set: &ControlSet,
    focused: Option<ControlId>,
) {
    let lines: Vec<Line> = set
        .controls()
        .iter()
        .map(|&control| {
            let value = match state.controls.value(control) {
                ControlValue::Button(label) => format!("[{label}]"),
                ControlValue::Toggle(on) => if on { "[x]".to_string() } else { "[ ]".to_string() },
                ControlValue::Slider { value, display } => {
                    format!("{} {display:>4}", volume_bar(value))
                }
                ControlValue::Select(v) => format!("< {v} >"),
            };
            let style = if focused == Some(control) {
                Style::default().fg(Color::Black).bg(Color::Cyan)
            } else {
                Style::default()
            };
            Line::from(Span::styled(format!("{:<17}{}", control.label(), value), style))
        })
        .collect();
    let block = Block::default().borders(Borders::ALL).title(" ambience ");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

// ten cells, one per 10%
fn volume_bar(value: i32) -> String {
    let filled = (value.clamp(0, 100) / 10) as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}

fn draw_status(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let realistic = if state.controls.realistic_mode { "on" } else { "off" };
    let text = format!(
        " ♪ {} | realistic {} | thunder {} | p panel  m mute  R realistic  t thunder  Esc quit",
        state.now_playing,
        realistic,
        state.sequencer.label(),
    );
    frame.render_widget(Paragraph::new(text).style(Style::default().fg(Color::DarkGray)), area);
}
