//! Proactive headroom estimate for the master bus.
//!
//! Assumes the worst case: every held voice peaks with all partials in
//! phase, so the bus can reach `held * sum(partial volumes)`. The master gain
//! is scaled so that sum plus a fixed margin fits in full scale.

/// Margin added on top of the summed partial volumes.
pub const SAFETY_MARGIN: f32 = 0.1;

/// Per-voice amplitude assumed when no partial volumes are configured.
pub const EMPTY_VOICE_SUM: f32 = 0.3;

/// Time constant for gliding to a new headroom gain, seconds.
pub const HEADROOM_TIME_CONSTANT: f64 = 0.05;

/// Worst-case bus amplitude for `active_count` held voices.
pub fn potential_amplitude(active_count: usize, volumes: &[f32]) -> f32 {
    let per_voice = if volumes.is_empty() {
        EMPTY_VOICE_SUM
    } else {
        volumes.iter().sum()
    };
    active_count as f32 * per_voice + SAFETY_MARGIN
}

/// Master gain that keeps the worst case at or below 1.0.
pub fn safe_gain(active_count: usize, volumes: &[f32]) -> f32 {
    let potential = potential_amplitude(active_count, volumes);
    if potential > 1.0 {
        1.0 / potential
    } else {
        1.0
    }
}
