//! TUI module for partials
//!
//! Plays notes from the computer keyboard, edits parameters and shows the
//! level meter fed by the audio thread.

pub mod controls;
mod keys;
mod meter;

use std::{
    io::stdout,
    time::{Duration, Instant},
};

use color_eyre::eyre::Result as EyreResult;
use crossterm::{
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::supports_keyboard_enhancement,
};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    DefaultTerminal, Frame,
};
use rtrb::{Consumer, Producer};

use partials::{
    keymap::KeyId,
    synth::{params::ParamChange, FrameReport, Params, SynthMessage},
};

use controls::{control_list, Control};
use keys::KeyTracker;
use meter::render_meter;

/// UI application state
pub struct UiApp {
    /// Control events to the audio thread
    msg_tx: Producer<SynthMessage>,
    /// Meter frames from the audio thread
    report_rx: Consumer<FrameReport>,
    /// Latest frame received
    report: FrameReport,
    /// Mirror of the engine's parameters, edited locally then forwarded
    params: Params,
    controls: Vec<Control>,
    selected: usize,
    /// Hold-timeout fallback, used only without release events
    keys: KeyTracker,
    release_events: bool,
    sample_rate: f32,
    should_quit: bool,
}

impl UiApp {
    pub fn new(
        msg_tx: Producer<SynthMessage>,
        report_rx: Consumer<FrameReport>,
        params: Params,
        sample_rate: f32,
    ) -> Self {
        Self {
            msg_tx,
            report_rx,
            report: FrameReport::default(),
            controls: control_list(params.num_partials()),
            params,
            selected: 0,
            keys: KeyTracker::new(),
            release_events: false,
            sample_rate,
            should_quit: false,
        }
    }

    /// Run the UI event loop
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        self.release_events = matches!(supports_keyboard_enhancement(), Ok(true));
        if self.release_events {
            execute!(
                stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }
        tracing::info!(release_events = self.release_events, "keyboard ready");

        let res = self.event_loop(terminal);

        self.send(SynthMessage::AllNotesOff);
        if self.release_events {
            execute!(stdout(), PopKeyboardEnhancementFlags)?;
        }
        res
    }

    fn event_loop(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_reports();
            if !self.release_events {
                for key in self.keys.expire(Instant::now()) {
                    self.send(SynthMessage::NoteOff { key });
                }
            }

            terminal.draw(|frame| self.render(frame))?;

            // ~60fps
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key);
                }
            }
        }
        Ok(())
    }

    /// Keep only the latest frame
    fn poll_reports(&mut self) {
        while let Ok(report) = self.report_rx.pop() {
            self.report = report;
        }
    }

    /// Push to the audio thread. Returns false if the ring was full.
    fn send(&mut self, message: SynthMessage) -> bool {
        if self.msg_tx.push(message).is_err() {
            tracing::warn!(?message, "control ring full, message dropped");
            return false;
        }
        true
    }

    fn handle_key(&mut self, key: KeyEvent) {
        let pressed = matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat);
        match key.code {
            KeyCode::Esc if key.kind == KeyEventKind::Press => self.should_quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true
            }
            KeyCode::Up if pressed => self.select(-1),
            KeyCode::Down if pressed => self.select(1),
            KeyCode::Left if pressed => self.adjust(-1),
            KeyCode::Right if pressed => self.adjust(1),
            KeyCode::Char(c) => {
                if let Some(note) = KeyId::from_char(c).filter(|k| k.frequency().is_some()) {
                    self.handle_note(note, key.kind);
                }
            }
            _ => {}
        }
    }

    fn handle_note(&mut self, key: KeyId, kind: KeyEventKind) {
        match kind {
            KeyEventKind::Press if self.release_events => {
                self.send(SynthMessage::NoteOn { key });
            }
            KeyEventKind::Press | KeyEventKind::Repeat if !self.release_events => {
                if self.keys.press(key, Instant::now()) {
                    self.send(SynthMessage::NoteOn { key });
                }
            }
            KeyEventKind::Release => {
                self.keys.release(key);
                self.send(SynthMessage::NoteOff { key });
            }
            _ => {}
        }
    }

    fn select(&mut self, delta: isize) {
        let len = self.controls.len() as isize;
        self.selected = (self.selected as isize + delta).rem_euclid(len) as usize;
    }

    fn adjust(&mut self, steps: i32) {
        let Some(&control) = self.controls.get(self.selected) else {
            return;
        };
        let Some(change) = control.step(&self.params, steps) else {
            return;
        };
        let mut next = self.params.clone();
        if let Err(err) = next.apply(change) {
            tracing::warn!(%err, ?change, "control change rejected");
            return;
        }
        // The mirror only moves once the engine is sure to see the change
        if !self.send(SynthMessage::Param(change)) {
            return;
        }
        self.params = next;

        if let ParamChange::PartialCount(count) = change {
            self.controls = control_list(count);
            self.selected = self.selected.min(self.controls.len() - 1);
        }
    }

    /// Render the UI
    fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4), // Meter
                Constraint::Min(6),    // Controls
                Constraint::Length(1), // Help bar
            ])
            .split(frame.area());

        render_meter(frame, chunks[0], &self.report);
        self.render_controls(frame, chunks[1]);

        let help = Paragraph::new(format!(
            " Z..M / Q..P play  [↑↓] select  [←→] adjust  [Esc] quit   {:.1}kHz",
            self.sample_rate / 1000.0
        ))
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[2]);
    }

    fn render_controls(&self, frame: &mut Frame, area: ratatui::layout::Rect) {
        let block = Block::default().title(" Controls ").borders(Borders::ALL);
        let visible = block.inner(area).height as usize;
        // Scroll so the selected row stays on screen
        let first = self.selected.saturating_sub(visible.saturating_sub(1));

        let lines: Vec<Line> = self
            .controls
            .iter()
            .enumerate()
            .skip(first)
            .map(|(i, control)| {
                let style = if i == self.selected {
                    Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                Line::from(vec![
                    Span::styled(format!(" {:<24}", control.label()), style),
                    Span::styled(format!(" {:>8} ", control.readout(&self.params)), style),
                ])
            })
            .collect();

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}
