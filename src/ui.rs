//! Dashboard rendering and layout

use crate::calibration::CalibrationBounds;
use crate::constants::signal::DISPLAY_FLOOR;
use crate::platform::SignalLevel;
use crate::state::{Mode, Snapshot};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

const PLACEHOLDER: &str = "-";

/// Position of a signal reading on the dashboard scale
pub fn signal_ratio(level: SignalLevel) -> f64 {
    let floor = f64::from(DISPLAY_FLOOR);
    ((f64::from(level) - floor) / -floor).clamp(0.0, 1.0)
}

fn bar_color(i: usize, width: usize) -> Color {
    if i < width / 3 {
        Color::Red
    } else if i < 2 * width / 3 {
        Color::Yellow
    } else {
        Color::Green
    }
}

/// Create a gradient bar filled up to `ratio`
pub fn create_gradient_bar(width: usize, ratio: f64) -> Line<'static> {
    let filled = (ratio * width as f64) as usize;
    let partial_fill = (ratio * width as f64) - filled as f64;
    let mut spans = Vec::new();

    for i in 0..width {
        let ch = if i < filled {
            '█'
        } else if i == filled && partial_fill > 0.0 {
            match (partial_fill * 8.0) as usize {
                0 | 1 => '░',
                2 | 3 => '▒',
                4 | 5 => '▓',
                _ => '█',
            }
        } else {
            '░'
        };
        spans.push(Span::styled(ch.to_string(), Style::default().fg(bar_color(i, width))));
    }

    Line::from(spans)
}

/// Scale labels under the signal bar, with the calibration range marked
pub fn create_range_labels(width: usize, bounds: &CalibrationBounds) -> Line<'static> {
    let marker_at = |level: Option<SignalLevel>| {
        level.map(|l| (signal_ratio(l) * width.saturating_sub(1) as f64).round() as usize)
    };
    let min_pos = marker_at(bounds.min_level);
    let max_pos = marker_at(bounds.max_level);

    let mut spans = Vec::new();
    for i in 0..width {
        if Some(i) == min_pos || Some(i) == max_pos {
            spans.push(Span::styled("▲", Style::default().fg(Color::White)));
            continue;
        }

        let label = if i == 0 {
            DISPLAY_FLOOR.to_string()
        } else if i == width - 1 {
            "0".to_string()
        } else {
            " ".to_string()
        };
        spans.push(Span::styled(label, Style::default().fg(bar_color(i, width))));
    }

    Line::from(spans)
}

fn or_placeholder<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| PLACEHOLDER.to_string(), |v| v.to_string())
}

fn key_value(key: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::raw(format!("{:>18}: ", key)),
        Span::styled(value, Style::default().add_modifier(Modifier::BOLD)),
    ])
}

/// Render the complete dashboard
pub fn render_ui(f: &mut Frame, state: &Snapshot) {
    let size = f.size();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Min(1),
        ])
        .split(size);

    // Device
    let device_name = state
        .accessory
        .as_ref()
        .and_then(|a| a.name.clone())
        .or_else(|| state.device.as_ref().map(|d| d.uid.clone()));
    let wireless = state.device.as_ref().map(|d| if d.is_wireless_audio { "yes" } else { "no" });
    let device_text = Paragraph::new(vec![
        key_value("Active device", or_placeholder(device_name)),
        key_value("Wireless", or_placeholder(wireless)),
        key_value("Signal level", or_placeholder(state.signal_level())),
    ])
    .block(Block::default().title("Device").borders(Borders::ALL));
    f.render_widget(device_text, chunks[0]);

    // Signal bar with calibration markers
    let bar_width = (chunks[1].width as usize).saturating_sub(crate::constants::ui::BAR_BORDER_WIDTH);
    let ratio = state.smoothed_level.map_or(0.0, signal_ratio);
    let signal = Paragraph::new(vec![
        create_gradient_bar(bar_width, ratio),
        create_range_labels(bar_width, &state.calibration),
    ])
    .block(
        Block::default()
            .title(format!("Smoothed signal: {}", or_placeholder(state.smoothed_level)))
            .borders(Borders::ALL),
    );
    f.render_widget(signal, chunks[1]);

    // Gain bar
    let gain = state.output.map(|o| o.normalized_level);
    let gain_style = if state.mode == Mode::Calibrating {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };
    let gain_bar = Paragraph::new(create_gradient_bar(bar_width, gain.unwrap_or(0.0)))
        .style(gain_style)
        .block(
            Block::default()
                .title(format!(
                    "Input level set to: {}",
                    or_placeholder(gain.map(|g| format!("{:.0}%", g * 100.0)))
                ))
                .borders(Borders::ALL),
        );
    f.render_widget(gain_bar, chunks[2]);

    // Calibration
    let mode = match state.mode {
        Mode::Tracking => "off",
        Mode::Calibrating => "ON (walk around, press c to finish)",
    };
    let calibration = Paragraph::new(vec![
        key_value("Calibration mode", mode.to_string()),
        key_value(
            "Min / max signal",
            format!(
                "{} / {}",
                or_placeholder(state.calibration.min_level),
                or_placeholder(state.calibration.max_level)
            ),
        ),
    ])
    .block(Block::default().title("Calibration").borders(Borders::ALL));
    f.render_widget(calibration, chunks[3]);

    // Status
    let status = match &state.last_error {
        Some(err) => Line::from(Span::styled(err.clone(), Style::default().fg(Color::Red))),
        None => Line::from("c: toggle calibration   q/Esc: quit"),
    };
    let status_text =
        Paragraph::new(status).block(Block::default().title("Status").borders(Borders::ALL));
    f.render_widget(status_text, chunks[4]);
}
