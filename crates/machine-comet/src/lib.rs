//! Comet companion console emulation.
//!
//! The pocket sibling of the Vega-8: 64x64 display, RAM-resident palette,
//! two audio channels, JSON cartridges. Implements the
//! `console_core::Console` contract so the shared front-end can drive both
//! consoles through one seam.

pub mod cart;
mod comet;
pub mod memory;

pub use cart::Cartridge;
pub use comet::{CHANNELS, Comet, FPS, SAMPLE_RATE};
pub use memory::CometMemory;
