//! Core traits and types for fantasy console emulation.

mod audio;
mod console;
mod error;
mod input;
mod memory;
mod script;

pub use audio::{AudioStreamer, ChannelState, ChannelStreamer, SharedChannel, shared_channel};
pub use console::{AudioConfig, Console, RunState, VideoConfig};
pub use error::{LoadError, ScriptError};
pub use input::{Buttons, InputEvent, InputQueue};
pub use memory::Memory;
pub use script::{Host, ScriptEngine, Value, arg};
