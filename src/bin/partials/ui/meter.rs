//! Level meter widget: gradient bar plus numeric readout

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use partials::{synth::limiter::LimiterState, synth::FrameReport};

/// Position of the yellow stop along the bar.
const YELLOW_STOP: f32 = 0.6;

/// Colour at position `t` in [0, 1] along green → yellow → red.
pub fn gradient(t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let (r, g) = if t < YELLOW_STOP {
        ((t / YELLOW_STOP * 255.0) as u8, 255)
    } else {
        let into_red = (t - YELLOW_STOP) / (1.0 - YELLOW_STOP);
        (255, ((1.0 - into_red) * 255.0) as u8)
    };
    Color::Rgb(r, g, 0)
}

/// Render the level meter
pub fn render_meter(frame: &mut Frame, area: Rect, report: &FrameReport) {
    let limiter = match report.limiter {
        LimiterState::Engaged => " LIMIT ",
        LimiterState::Released => "",
    };
    let block = Block::default()
        .title(format!(" Level {limiter}"))
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let width = inner.width.saturating_sub(1) as usize;
    let filled = (report.reading.visual_level * width as f32).round() as usize;

    let mut bar: Vec<Span> = (0..filled.min(width))
        .map(|i| {
            let t = i as f32 / width.max(1) as f32;
            Span::styled("█", Style::default().fg(gradient(t)))
        })
        .collect();
    bar.push(Span::raw(" ".repeat(width.saturating_sub(filled))));

    let stats = Line::from(vec![
        Span::styled(
            format!(" {}  ", report.reading.readout()),
            Style::default().fg(Color::Magenta),
        ),
        Span::styled(
            format!("peak {:.2}  ", report.reading.peak),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("gain {:.2}  ", report.master_gain),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("voices {} (+{} releasing)", report.active_voices, report.draining_voices),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(vec![Line::from(bar), stats]), inner);
}
