//! Partials - audio setup and runner

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ratatui::DefaultTerminal;
use rtrb::RingBuffer;

use partials::{
    dsp::analyser::DEFAULT_ANALYSER_SIZE,
    synth::{engine::DEFAULT_FRAME_RATE, EngineConfig, FrameReport, Params, SynthMessage},
    MAX_BLOCK_SIZE,
};

use super::ui::UiApp;

/// Capacity of the UI → audio control ring
const MESSAGE_RING: usize = 256;
/// Capacity of the audio → UI meter ring
const REPORT_RING: usize = 64;

/// Main application builder
pub struct PartialsApp {
    frame_rate: f32,
    analyser_size: usize,
    params: Params,
}

impl PartialsApp {
    pub fn new() -> Self {
        Self {
            frame_rate: DEFAULT_FRAME_RATE,
            analyser_size: DEFAULT_ANALYSER_SIZE,
            params: Params::default(),
        }
    }

    /// Limiter and meter updates per second
    pub fn frame_rate(mut self, rate: f32) -> Self {
        self.frame_rate = rate;
        self
    }

    pub fn analyser_size(mut self, size: usize) -> Self {
        self.analyser_size = size;
        self
    }

    /// Starting parameters
    pub fn params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Open the default output device and run the UI until it quits
    pub fn run(self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;
        tracing::info!(
            sample_rate,
            channels,
            frame_rate = self.frame_rate,
            analyser_size = self.analyser_size,
            "audio config"
        );

        // --- Cross-thread rings ---
        let (msg_tx, mut msg_rx) = RingBuffer::<SynthMessage>::new(MESSAGE_RING);
        let (mut report_tx, report_rx) = RingBuffer::<FrameReport>::new(REPORT_RING);

        let mut engine = EngineConfig::new(sample_rate)
            .with_analyser_size(self.analyser_size)
            .with_frame_rate(self.frame_rate)
            .with_params(self.params.clone())
            .build();

        // Buffer reused by audio callback
        let mut render_buf = vec![0.0f32; MAX_BLOCK_SIZE];

        let stream = device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _| {
                    // Control events land before any sample of this callback
                    engine.drain_messages(&mut msg_rx);

                    let total_frames = data.len() / channels;
                    let mut frames_written = 0;
                    while frames_written < total_frames {
                        let frames_to_render = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                        let block = &mut render_buf[..frames_to_render];

                        // Drop frames if the UI falls behind
                        engine.render_with(block, |report| {
                            let _ = report_tx.push(report);
                        });

                        // Duplicate mono to all channels and write to device
                        let out_off = frames_written * channels;
                        for (i, &s) in block.iter().enumerate() {
                            for ch in 0..channels {
                                data[out_off + i * channels + ch] = s;
                            }
                        }

                        frames_written += frames_to_render;
                    }
                },
                |err| tracing::error!(%err, "output stream error"),
                None,
            )
            .wrap_err("failed to build output stream")?;

        stream.play().wrap_err("failed to start output stream")?;

        let mut ui = UiApp::new(msg_tx, report_rx, self.params, sample_rate);
        ui.run(terminal)
    }
}

impl Default for PartialsApp {
    fn default() -> Self {
        Self::new()
    }
}
