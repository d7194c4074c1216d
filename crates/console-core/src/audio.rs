//! Pull-based audio streaming.
//!
//! Each console variant owns a small set of audio channels. A front-end
//! asks for a streamer per channel and pulls sample blocks from its own
//! audio callback. Channel state lives behind a shared handle so the
//! console's register writes and the front-end's pulls see the same tone
//! parameters, and so asking for the same channel twice can never fork or
//! corrupt state.

use std::sync::{Arc, Mutex};

/// A pull-based sample producer bound to one audio channel.
pub trait AudioStreamer {
    /// Fill `out` with the next block of samples.
    fn stream(&mut self, out: &mut [f32]);
}

/// Tone parameters of one channel, as last written by the console's audio
/// registers. Volume 0 is silence.
#[derive(Debug, Default)]
pub struct ChannelState {
    /// Oscillator frequency in Hz.
    pub frequency: f32,
    /// Amplitude, 0.0..=1.0.
    pub volume: f32,
    /// Oscillator phase, 0.0..1.0. Advanced by the streamer.
    pub phase: f32,
}

/// Shared handle to one channel's state.
pub type SharedChannel = Arc<Mutex<ChannelState>>;

/// Create a silent channel.
pub fn shared_channel() -> SharedChannel {
    Arc::new(Mutex::new(ChannelState::default()))
}

/// Square-wave streamer over a shared channel.
///
/// The waveform is deliberately primitive: the core's contract is sample
/// delivery, not synthesis. A front-end wanting richer sound replaces the
/// streamer, not the channel registers.
pub struct ChannelStreamer {
    channel: SharedChannel,
    sample_rate: u32,
}

impl ChannelStreamer {
    pub fn new(channel: SharedChannel, sample_rate: u32) -> Self {
        Self {
            channel,
            sample_rate,
        }
    }
}

impl AudioStreamer for ChannelStreamer {
    fn stream(&mut self, out: &mut [f32]) {
        let Ok(mut ch) = self.channel.lock() else {
            out.fill(0.0);
            return;
        };
        if ch.volume <= 0.0 || ch.frequency <= 0.0 {
            out.fill(0.0);
            return;
        }
        let step = ch.frequency / self.sample_rate as f32;
        for sample in out.iter_mut() {
            *sample = if ch.phase < 0.5 { ch.volume } else { -ch.volume };
            ch.phase += step;
            if ch.phase >= 1.0 {
                ch.phase -= 1.0;
            }
        }
    }
}
