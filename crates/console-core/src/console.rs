//! Console abstraction for fantasy console variants.
//!
//! This module defines the `Console` trait which provides a common lifecycle
//! interface for different console variants (the main console, the companion
//! handheld, etc.) to work with a shared front-end.

use crate::audio::AudioStreamer;
use crate::error::LoadError;

/// Video output configuration for a console.
#[derive(Debug, Clone, Copy)]
pub struct VideoConfig {
    /// Native display width in pixels.
    pub width: u32,
    /// Native display height in pixels.
    pub height: u32,
    /// Frame rate in frames per second.
    pub fps: f32,
}

/// Audio output configuration for a console.
#[derive(Debug, Clone, Copy)]
pub struct AudioConfig {
    /// Audio sample rate in Hz.
    pub sample_rate: u32,
    /// Number of independent audio channels.
    pub channels: usize,
}

/// Lifecycle state of a console.
///
/// A console starts `Unloaded`, becomes `Loaded` after a successful
/// cartridge load, and `Running` after `run()`. There is no transition back
/// to `Unloaded` short of dropping the console; a fresh `load()` re-enters
/// `Loaded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    /// No cartridge loaded.
    #[default]
    Unloaded,
    /// Cartridge loaded, script engine not yet booted.
    Loaded,
    /// Script engine booted; `step()` advances frames.
    Running,
}

/// Trait for emulated consoles.
///
/// Provides a common interface for a front-end to drive different console
/// variants without knowing their specific implementation details. All
/// methods are expected to be called from a single scheduling loop; at most
/// one `step()` may be in flight per console.
pub trait Console {
    /// Get the video output configuration.
    fn video_config(&self) -> VideoConfig;

    /// Get the audio output configuration.
    fn audio_config(&self) -> AudioConfig;

    /// Load a cartridge image.
    ///
    /// Loading is all-or-nothing: on error the console keeps its previous
    /// state (including any previously loaded cartridge).
    fn load(&mut self, image: &[u8]) -> Result<(), LoadError>;

    /// Boot the cartridge: start the script engine and invoke the
    /// cartridge's init entry point. Does nothing unless a cartridge is
    /// loaded. Script failures during boot halt the console rather than
    /// surfacing an error.
    fn run(&mut self);

    /// Advance one frame: drain queued input, then invoke the cartridge's
    /// update and draw callbacks.
    ///
    /// Returns `false` once the cartridge has requested a halt; the
    /// front-end should stop calling `step()` at that point.
    fn step(&mut self, dt: f32) -> bool;

    /// Render the current video RAM to an RGBA pixel buffer.
    ///
    /// The buffer size should be `width * height * 4` bytes. Rendering is a
    /// read-only projection and never mutates console state.
    fn render(&self, frame: &mut [u8]);

    /// Get a pull-based sample producer for one audio channel.
    ///
    /// Returns `None` for channel indices the variant does not have.
    /// Requesting the same channel twice hands out a second streamer bound
    /// to the same shared channel state.
    fn audio_streamer(&mut self, channel: usize) -> Option<Box<dyn AudioStreamer + Send>>;

    /// Queue a button state change. Processed at the next `step()`.
    fn button(&mut self, index: usize, pressed: bool);

    /// Queue a mouse update. Processed at the next `step()`.
    fn mouse(&mut self, x: i32, y: i32, buttons: u8);

    /// Queue a typed character. Processed at the next `step()`.
    fn keyboard(&mut self, ch: char);

    /// Raw RAM view for debuggers and cartridge tooling.
    ///
    /// The view is mutable; a misbehaving caller can corrupt console state
    /// through it. That is an accepted trade-off for tooling access.
    fn ram(&mut self) -> &mut [u8];

    /// Raw ROM view for debuggers and cartridge tooling.
    fn rom(&self) -> &[u8];
}
