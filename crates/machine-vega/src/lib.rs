//! Vega-8 console emulation.
//!
//! The primary fantasy console: 128x128 display, 16 colours, four audio
//! channels, cartridges scripted in a Lua dialect. Implements the
//! `console_core::Console` contract so the shared front-end can drive it.

pub mod api;
pub mod cart;
mod draw;
mod font;
pub mod memory;
mod vega;

pub use cart::Cartridge;
pub use memory::VegaMemory;
pub use vega::{CHANNELS, FPS, PALETTE, SAMPLE_RATE, Vega};
