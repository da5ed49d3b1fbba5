/// Rolling window over the most recent output samples.
///
/// Mirrors what a hardware scope would show: the newest `size` samples,
/// quantized to unsigned bytes centred on 128.
#[derive(Debug, Clone)]
pub struct Analyser {
    ring: Vec<f32>,
    write: usize,
}

/// Default window length in samples.
pub const DEFAULT_ANALYSER_SIZE: usize = 2048;

impl Analyser {
    pub fn new(size: usize) -> Self {
        Self {
            ring: vec![0.0; size.max(1)],
            write: 0,
        }
    }

    pub fn size(&self) -> usize {
        self.ring.len()
    }

    #[inline]
    pub fn push(&mut self, sample: f32) {
        self.ring[self.write] = sample;
        self.write = (self.write + 1) % self.ring.len();
    }

    pub fn push_block(&mut self, block: &[f32]) {
        for &sample in block {
            self.push(sample);
        }
    }

    /// Copy the window, oldest first, as bytes: `floor(128 * (1 + x))`
    /// clamped to 0..=255.
    pub fn byte_time_domain_data(&self, out: &mut [u8]) {
        let (newer, older) = self.ring.split_at(self.write);
        for (byte, &sample) in out.iter_mut().zip(older.iter().chain(newer)) {
            *byte = quantize(sample);
        }
    }
}

impl Default for Analyser {
    fn default() -> Self {
        Self::new(DEFAULT_ANALYSER_SIZE)
    }
}

#[inline]
fn quantize(sample: f32) -> u8 {
    (128.0 * (1.0 + sample)).floor().clamp(0.0, 255.0) as u8
}

/// Inverse of the byte quantization, into [-1, 1).
#[inline]
pub fn normalize_byte(byte: u8) -> f32 {
    (byte as f32 - 128.0) / 128.0
}
