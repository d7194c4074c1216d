//! The Comet companion console.
//!
//! A lighter sibling of the big console: 64x64 display, palette in RAM,
//! two audio channels, JSON cartridges scripted through the same black-box
//! engine seam. Colour 0 is always transparent for sprite drawing.

use std::sync::Arc;

use console_core::{
    arg, AudioConfig, AudioStreamer, Buttons, ChannelStreamer, Console, Host, InputEvent,
    InputQueue, LoadError, RunState, ScriptEngine, SharedChannel, Value, VideoConfig,
    shared_channel,
};
use tracing::{debug, warn};

use crate::cart::Cartridge;
use crate::memory::{CometMemory, SCREEN_H, SCREEN_W};

/// Display refresh rate.
pub const FPS: f32 = 30.0;
/// Audio sample rate in Hz.
pub const SAMPLE_RATE: u32 = 11_025;
/// Number of audio channels.
pub const CHANNELS: usize = 2;
/// Buttons per player.
pub const BUTTONS_PER_PLAYER: usize = 6;

/// Builtin names the console exposes to cartridges. Names in this list
/// without an implementation resolve to a diagnostic stub instead of an
/// unresolved-symbol failure.
const API_NAMES: &[&str] = &[
    "read", "write", "palset", "palm", "palt", "pget", "pset", "fget", "fset", "mget", "mset",
    "btn", "btnp", "cls", "cam", "map", "rect", "rectfill", "spr", "print", "mid", "rnd", "sfx",
    "mus",
];

/// The Comet console.
pub struct Comet {
    engine: Box<dyn ScriptEngine>,
    hw: CometHw,
    code: String,
    state: RunState,
}

struct CometHw {
    mem: CometMemory,
    input: InputQueue,
    buttons: Buttons<12>,
    mouse: (i32, i32, u8),
    channels: Vec<SharedChannel>,
    halted: bool,
    rng: u32,
}

impl Comet {
    /// Create a console around a script engine.
    pub fn new(engine: Box<dyn ScriptEngine>) -> Self {
        Self {
            engine,
            hw: CometHw {
                mem: CometMemory::new(),
                input: InputQueue::new(),
                buttons: Buttons::new(),
                mouse: (0, 0, 0),
                channels: (0..CHANNELS).map(|_| shared_channel()).collect(),
                halted: false,
                rng: 0x517c_c1b7,
            },
            code: String::new(),
            state: RunState::Unloaded,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RunState {
        self.state
    }
}

impl Console for Comet {
    fn video_config(&self) -> VideoConfig {
        VideoConfig {
            width: SCREEN_W as u32,
            height: SCREEN_H as u32,
            fps: FPS,
        }
    }

    fn audio_config(&self) -> AudioConfig {
        AudioConfig {
            sample_rate: SAMPLE_RATE,
            channels: CHANNELS,
        }
    }

    fn load(&mut self, image: &[u8]) -> Result<(), LoadError> {
        let cart = Cartridge::parse(image)?;
        self.hw
            .mem
            .install(&cart.gfx, &cart.map, &cart.flags, &cart.palette);
        self.code = cart.code;
        self.hw.halted = false;
        self.state = RunState::Loaded;
        Ok(())
    }

    fn run(&mut self) {
        if self.state != RunState::Loaded {
            return;
        }
        self.state = RunState::Running;
        let Self {
            engine, hw, code, ..
        } = self;
        if let Err(err) = engine.boot(code, hw) {
            warn!(target: "comet", "cartridge boot failed: {err}");
            hw.halted = true;
            return;
        }
        if engine.has_callback("init") {
            if let Err(err) = engine.call("init", &[], hw) {
                warn!(target: "comet", "cartridge error in init: {err}");
                hw.halted = true;
            }
        }
    }

    fn step(&mut self, _dt: f32) -> bool {
        if self.state != RunState::Running {
            return true;
        }
        if self.hw.halted {
            return false;
        }
        self.hw.apply_input();
        let Self { engine, hw, .. } = self;
        for callback in ["update", "draw"] {
            if hw.halted {
                break;
            }
            if engine.has_callback(callback) {
                if let Err(err) = engine.call(callback, &[], hw) {
                    warn!(target: "comet", "cartridge error in {callback}: {err}");
                    hw.halted = true;
                }
            }
        }
        self.hw.buttons.latch_frame();
        !self.hw.halted
    }

    fn render(&self, frame: &mut [u8]) {
        for y in 0..SCREEN_H {
            for x in 0..SCREEN_W {
                let c = self.hw.mem.screen_pixel(x, y);
                let rgb = self.hw.mem.palette(i32::from(c));
                let offset = ((y * SCREEN_W + x) * 4) as usize;
                if let Some(px) = frame.get_mut(offset..offset + 4) {
                    px[..3].copy_from_slice(&rgb);
                    px[3] = 0xFF;
                }
            }
        }
    }

    fn audio_streamer(&mut self, channel: usize) -> Option<Box<dyn AudioStreamer + Send>> {
        self.hw.channels.get(channel).map(|ch| {
            Box::new(ChannelStreamer::new(Arc::clone(ch), SAMPLE_RATE))
                as Box<dyn AudioStreamer + Send>
        })
    }

    fn button(&mut self, index: usize, pressed: bool) {
        self.hw.input.push(InputEvent::Button { index, pressed });
    }

    fn mouse(&mut self, x: i32, y: i32, buttons: u8) {
        self.hw.input.push(InputEvent::Mouse { x, y, buttons });
    }

    fn keyboard(&mut self, _ch: char) {
        // The handheld has no keyboard.
    }

    fn ram(&mut self) -> &mut [u8] {
        self.hw.mem.ram_slice()
    }

    fn rom(&self) -> &[u8] {
        self.hw.mem.rom_slice()
    }
}

fn int(args: &[Value], index: usize, default: i32) -> i32 {
    arg(args, index).as_int().unwrap_or(default)
}

fn num(args: &[Value], index: usize, default: f64) -> f64 {
    arg(args, index).as_num().unwrap_or(default)
}

impl CometHw {
    fn apply_input(&mut self) {
        for event in self.input.drain_batch() {
            match event {
                InputEvent::Button { index, pressed } => self.buttons.set(index, pressed),
                InputEvent::Mouse { x, y, buttons } => self.mouse = (x, y, buttons),
                InputEvent::Key { .. } => {}
            }
        }
    }

    fn button_index(&self, args: &[Value]) -> usize {
        let i = int(args, 0, 0);
        let p = int(args, 1, 0);
        usize::try_from(p * BUTTONS_PER_PLAYER as i32 + i).unwrap_or(usize::MAX)
    }

    fn plot(&mut self, x: i32, y: i32, c: u8) {
        let (cam_x, cam_y) = self.mem.camera();
        self.mem.set_screen_pixel(x - cam_x, y - cam_y, c);
    }

    fn spr(&mut self, n: i32, x: i32, y: i32, w: f64, h: f64, flip_x: bool, flip_y: bool) {
        let pw = (w * 8.0) as i32;
        let ph = (h * 8.0) as i32;
        let sheet_x = (n % 8) * 8;
        let sheet_y = (n / 8) * 8;
        for dy in 0..ph {
            for dx in 0..pw {
                let sx = if flip_x { pw - 1 - dx } else { dx };
                let sy = if flip_y { ph - 1 - dy } else { dy };
                let c = self.mem.sprite_pixel(sheet_x + sx, sheet_y + sy);
                if c != 0 {
                    self.plot(x + dx, y + dy, c);
                }
            }
        }
    }

    fn next_rand(&mut self) -> f64 {
        let mut x = self.rng;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.rng = x;
        f64::from(x) / (f64::from(u32::MAX) + 1.0)
    }

    fn play_note(&mut self, n: i32, channel: i32) {
        let Ok(ch) = usize::try_from(channel) else {
            return;
        };
        if ch >= self.channels.len() {
            return;
        }
        if n < 0 {
            self.mem.set_audio_reg(ch, 0, false);
            if let Ok(mut state) = self.channels[ch].lock() {
                state.volume = 0.0;
            }
            return;
        }
        let pitch = n.clamp(0, 63) as u8;
        self.mem.set_audio_reg(ch, pitch, true);
        if let Ok(mut state) = self.channels[ch].lock() {
            state.frequency = 440.0 * 2f32.powf((f32::from(pitch) - 33.0) / 12.0);
            state.volume = 0.5;
        }
    }
}

impl Host for CometHw {
    fn api_call(&mut self, name: &str, args: &[Value]) -> Value {
        match name {
            // Raw memory
            "read" => {
                let addr = int(args, 0, -1);
                usize::try_from(addr)
                    .map_or(Value::Num(0.0), |a| i32::from(self.mem.peek(a)).into())
            }
            "write" => {
                if let Ok(addr) = usize::try_from(int(args, 0, -1)) {
                    self.mem.poke(addr, int(args, 1, 0) as u8);
                }
                Value::Nil
            }

            // Palette registers
            "palset" => {
                self.mem.set_palette(
                    int(args, 0, -1),
                    int(args, 1, 0) as u8,
                    int(args, 2, 0) as u8,
                    int(args, 3, 0) as u8,
                );
                Value::Nil
            }

            // Pixels
            "pget" => {
                let (cam_x, cam_y) = self.mem.camera();
                i32::from(
                    self.mem
                        .screen_pixel(int(args, 0, 0) - cam_x, int(args, 1, 0) - cam_y),
                )
                .into()
            }
            "pset" => {
                self.plot(int(args, 0, 0), int(args, 1, 0), int(args, 2, 0) as u8);
                Value::Nil
            }

            // Sprite flags: without the optional third argument, fset
            // replaces the whole byte; with it, it sets one flag bit
            "fget" => {
                let n = int(args, 0, 0);
                match arg(args, 1).as_int() {
                    None => i32::from(self.mem.flags(n)).into(),
                    Some(f) if (0..8).contains(&f) => {
                        Value::Bool(self.mem.flags(n) & (1 << f) != 0)
                    }
                    Some(_) => Value::Bool(false),
                }
            }
            "fset" => {
                let n = int(args, 0, 0);
                if arg(args, 2).is_nil() {
                    self.mem.set_flags(n, int(args, 1, 0) as u8);
                } else {
                    let f = int(args, 1, 0);
                    if (0..8).contains(&f) {
                        let bits = self.mem.flags(n);
                        let bits = if arg(args, 2).truthy() {
                            bits | (1 << f)
                        } else {
                            bits & !(1 << f)
                        };
                        self.mem.set_flags(n, bits);
                    }
                }
                Value::Nil
            }

            // Map cells
            "mget" => i32::from(self.mem.map_cell(int(args, 0, 0), int(args, 1, 0))).into(),
            "mset" => {
                self.mem
                    .set_map_cell(int(args, 0, 0), int(args, 1, 0), int(args, 2, 0) as u8);
                Value::Nil
            }

            // Input
            "btn" => {
                if arg(args, 0).is_nil() {
                    f64::from(self.buttons.mask()).into()
                } else {
                    Value::Bool(self.buttons.held(self.button_index(args)))
                }
            }
            "btnp" => {
                if arg(args, 0).is_nil() {
                    f64::from(self.buttons.pressed_mask()).into()
                } else {
                    Value::Bool(self.buttons.pressed(self.button_index(args)))
                }
            }

            // Drawing
            "cls" => {
                let c = int(args, 0, 0) as u8 & 0x0F;
                let byte = c | (c << 4);
                for i in 0..(SCREEN_W * SCREEN_H / 2) as usize {
                    self.mem.poke(crate::memory::SCREEN_BASE + i, byte);
                }
                Value::Nil
            }
            "cam" => {
                self.mem.set_camera(int(args, 0, 0), int(args, 1, 0));
                Value::Nil
            }
            "rect" | "rectfill" => {
                let (x, y) = (int(args, 0, 0), int(args, 1, 0));
                let (w, h) = (int(args, 2, 0), int(args, 3, 0));
                let c = int(args, 4, 0) as u8;
                if w <= 0 || h <= 0 {
                    return Value::Nil;
                }
                for dy in 0..h {
                    for dx in 0..w {
                        let edge = dy == 0 || dy == h - 1 || dx == 0 || dx == w - 1;
                        if name == "rectfill" || edge {
                            self.plot(x + dx, y + dy, c);
                        }
                    }
                }
                Value::Nil
            }
            "spr" => {
                self.spr(
                    int(args, 0, 0),
                    int(args, 1, 0),
                    int(args, 2, 0),
                    num(args, 3, 1.0),
                    num(args, 4, 1.0),
                    arg(args, 5).truthy(),
                    arg(args, 6).truthy(),
                );
                Value::Nil
            }

            // Helpers
            "mid" => {
                let (a, b, c) = (num(args, 0, 0.0), num(args, 1, 0.0), num(args, 2, 0.0));
                (a.max(b).min(a.max(c).min(b.max(c)))).into()
            }
            "rnd" => {
                let limit = num(args, 0, 1.0);
                (self.next_rand() * limit).into()
            }

            // Audio
            "sfx" => {
                self.play_note(int(args, 0, -1), int(args, 1, 0));
                Value::Nil
            }

            _ => {
                if API_NAMES.contains(&name) {
                    debug!(target: "comet", "stub: {name}({args:?})");
                }
                Value::Nil
            }
        }
    }
}
