/// Context passed to graph nodes during rendering
///
/// Contains information about what to render:
/// - sample_rate: Audio sample rate (e.g., 48000.0)
/// - time: Render clock in seconds at the first sample of the block
/// - fm: Vibrato offset in Hz, one value per sample (empty when absent)
/// - partials_lfo: Raw partials LFO signal, one value per sample
#[derive(Debug, Clone, Copy)]
pub struct RenderCtx<'a> {
    pub sample_rate: f32,
    pub time: f64,
    pub fm: &'a [f32],
    pub partials_lfo: &'a [f32],
}

impl<'a> RenderCtx<'a> {
    pub fn new(sample_rate: f32, time: f64) -> Self {
        Self {
            sample_rate,
            time,
            fm: &[],
            partials_lfo: &[],
        }
    }

    /// Attach the shared modulation signals for this block.
    pub fn with_modulation(self, fm: &'a [f32], partials_lfo: &'a [f32]) -> Self {
        Self {
            fm,
            partials_lfo,
            ..self
        }
    }

    /// Clock time of sample `index` within the block
    #[inline]
    pub fn sample_time(&self, index: usize) -> f64 {
        self.time + index as f64 / self.sample_rate as f64
    }

    #[inline]
    pub fn fm_at(&self, index: usize) -> f32 {
        self.fm.get(index).copied().unwrap_or(0.0)
    }
}

/// Core trait for audio processing graph nodes
///
/// Nodes overwrite `out` with one block of signal.
pub trait GraphNode: Send {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx);

    /// Check if this node is still producing sound
    ///
    /// Used by voice management to know when a voice can be torn down.
    fn is_active(&self) -> bool {
        true
    }
}
