//! The Vega-8 console.
//!
//! Owns the addressable memory, the input queues, the audio channels and an
//! embedded script engine, and wires the script-visible builtin surface to
//! the register-mapped accessors. Builtins that the console lists but does
//! not implement resolve to a diagnostic stub so cartridges that only use
//! the implemented subset keep running.

use std::collections::VecDeque;
use std::sync::Arc;

use console_charset as charset;
use console_core::{
    arg, AudioConfig, AudioStreamer, Buttons, ChannelStreamer, Console, Host, InputEvent,
    InputQueue, LoadError, RunState, ScriptEngine, SharedChannel, Value, VideoConfig,
    shared_channel,
};
use tracing::{debug, warn};

use crate::api;
use crate::cart::Cartridge;
use crate::draw;
use crate::memory::{SCREEN_H, SCREEN_W, VegaMemory};

/// Display refresh rate.
pub const FPS: f32 = 30.0;
/// Audio sample rate in Hz.
pub const SAMPLE_RATE: u32 = 22_050;
/// Number of audio channels.
pub const CHANNELS: usize = 4;
/// Buttons per player (left, right, up, down, o, x).
pub const BUTTONS_PER_PLAYER: usize = 6;

/// Hardware palette, RGB per colour index.
pub const PALETTE: [[u8; 3]; 16] = [
    [0x00, 0x00, 0x00],
    [0x1d, 0x2b, 0x53],
    [0x7e, 0x25, 0x53],
    [0x00, 0x87, 0x51],
    [0xab, 0x52, 0x36],
    [0x5f, 0x57, 0x4f],
    [0xc2, 0xc3, 0xc7],
    [0xff, 0xf1, 0xe8],
    [0xff, 0x00, 0x4d],
    [0xff, 0xa3, 0x00],
    [0xff, 0xec, 0x27],
    [0x00, 0xe4, 0x36],
    [0x29, 0xad, 0xff],
    [0x83, 0x76, 0x9c],
    [0xff, 0x77, 0xa8],
    [0xff, 0xcc, 0xaa],
];

/// The Vega-8 console.
pub struct Vega {
    engine: Box<dyn ScriptEngine>,
    hw: VegaHw,
    code: String,
    state: RunState,
}

/// Everything the script-visible builtins operate on. Split from `Vega` so
/// the engine can borrow it as the `Host` while being driven itself.
struct VegaHw {
    mem: VegaMemory,
    input: InputQueue,
    buttons: Buttons<12>,
    mouse: (i32, i32, u8),
    keys: VecDeque<char>,
    channels: Vec<SharedChannel>,
    /// Active cart-data slot id; empty means no slot.
    cartdata: String,
    halted: bool,
    seconds: f64,
    rng: u32,
}

impl Vega {
    /// Create a console around a script engine.
    pub fn new(engine: Box<dyn ScriptEngine>) -> Self {
        Self {
            engine,
            hw: VegaHw {
                mem: VegaMemory::new(),
                input: InputQueue::new(),
                buttons: Buttons::new(),
                mouse: (0, 0, 0),
                keys: VecDeque::new(),
                channels: (0..CHANNELS).map(|_| shared_channel()).collect(),
                cartdata: String::new(),
                halted: false,
                seconds: 0.0,
                rng: 0x2f6e_2b01,
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

impl Console for Vega {
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
        // Parse first; only a valid cartridge touches console state.
        let cart = Cartridge::parse(image)?;
        self.hw.mem.install(&cart.sprites, &cart.map, &cart.flags);
        self.code = cart.code;
        self.hw.cartdata.clear();
        self.hw.halted = false;
        self.hw.seconds = 0.0;
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
            warn!(target: "vega", "cartridge boot failed: {err}");
            hw.halted = true;
            return;
        }
        if engine.has_callback("_init") {
            if let Err(err) = engine.call("_init", &[], hw) {
                warn!(target: "vega", "cartridge error in _init: {err}");
                hw.halted = true;
            }
        }
    }

    fn step(&mut self, dt: f32) -> bool {
        if self.state != RunState::Running {
            return true;
        }
        if self.hw.halted {
            return false;
        }
        self.hw.apply_input();
        let Self { engine, hw, .. } = self;
        for callback in ["_update", "_draw"] {
            if hw.halted {
                break;
            }
            if engine.has_callback(callback) {
                if let Err(err) = engine.call(callback, &[], hw) {
                    warn!(target: "vega", "cartridge error in {callback}: {err}");
                    hw.halted = true;
                }
            }
        }
        self.hw.buttons.latch_frame();
        self.hw.seconds += f64::from(dt);
        !self.hw.halted
    }

    fn render(&self, frame: &mut [u8]) {
        for y in 0..SCREEN_H {
            for x in 0..SCREEN_W {
                let c = self.hw.mem.screen_pal(self.hw.mem.screen_pixel(x, y));
                let rgb = PALETTE[(c & 0x0F) as usize];
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

    fn keyboard(&mut self, ch: char) {
        self.hw.input.push(InputEvent::Key { ch });
    }

    fn ram(&mut self) -> &mut [u8] {
        self.hw.mem.ram_slice()
    }

    fn rom(&self) -> &[u8] {
        self.hw.mem.rom_slice()
    }
}

/// Integer argument with a default for absent positions.
fn int(args: &[Value], index: usize, default: i32) -> i32 {
    arg(args, index).as_int().unwrap_or(default)
}

/// Float argument with a default for absent positions.
fn num(args: &[Value], index: usize, default: f64) -> f64 {
    arg(args, index).as_num().unwrap_or(default)
}

/// Address argument; anything unusable maps to an always-out-of-range value.
fn addr(args: &[Value], index: usize) -> usize {
    arg(args, index)
        .as_int()
        .and_then(|i| usize::try_from(i).ok())
        .unwrap_or(usize::MAX)
}

impl VegaHw {
    /// Drain the input queued since the previous frame.
    fn apply_input(&mut self) {
        for event in self.input.drain_batch() {
            match event {
                InputEvent::Button { index, pressed } => self.buttons.set(index, pressed),
                InputEvent::Mouse { x, y, buttons } => self.mouse = (x, y, buttons),
                InputEvent::Key { ch } => {
                    // Small hardware key buffer; overflow drops keys.
                    if self.keys.len() < 32 {
                        self.keys.push_back(ch);
                    }
                }
            }
        }
    }

    fn button_index(&self, args: &[Value]) -> usize {
        let i = int(args, 0, 0);
        let p = int(args, 1, 0);
        usize::try_from(p * BUTTONS_PER_PLAYER as i32 + i).unwrap_or(usize::MAX)
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
            self.mem.set_audio_reg(ch, 0, false, 0);
            if let Ok(mut state) = self.channels[ch].lock() {
                state.volume = 0.0;
            }
            return;
        }
        let pitch = n.clamp(0, 63) as u8;
        self.mem.set_audio_reg(ch, pitch, true, 7);
        if let Ok(mut state) = self.channels[ch].lock() {
            // Pitch 33 is A4; equal temperament from there.
            state.frequency = 440.0 * 2f32.powf((f32::from(pitch) - 33.0) / 12.0);
            state.volume = 0.5;
        }
    }

    fn stub(&self, name: &str, args: &[Value]) {
        debug!(target: "vega", "stub: {name}({args:?})");
    }
}

impl Host for VegaHw {
    fn api_call(&mut self, name: &str, args: &[Value]) -> Value {
        match name {
            // Raw memory
            "peek" => i32::from(self.mem.peek(addr(args, 0))).into(),
            "poke" => {
                self.mem.poke(addr(args, 0), int(args, 1, 0) as u8);
                Value::Nil
            }

            // Pixels
            "pget" => i32::from(draw::read(&self.mem, int(args, 0, 0), int(args, 1, 0))).into(),
            "pset" => {
                let c = int(args, 2, i32::from(self.mem.pen())) as u8;
                draw::plot(&mut self.mem, int(args, 0, 0), int(args, 1, 0), c);
                Value::Nil
            }
            "sget" => i32::from(self.mem.sprite_pixel(int(args, 0, 0), int(args, 1, 0))).into(),
            "sset" => {
                let c = int(args, 2, i32::from(self.mem.pen())) as u8;
                self.mem.set_sprite_pixel(int(args, 0, 0), int(args, 1, 0), c);
                Value::Nil
            }

            // Sprite flags: combined byte without the optional index,
            // single flag with it
            "fget" => {
                let n = int(args, 0, 0);
                match arg(args, 1).as_int() {
                    None => i32::from(self.mem.flags(n)).into(),
                    Some(f) => {
                        if (0..8).contains(&f) {
                            Value::Bool(self.mem.flags(n) & (1 << f) != 0)
                        } else {
                            Value::Bool(false)
                        }
                    }
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

            // Draw state
            "cls" => {
                draw::clear(&mut self.mem, int(args, 0, 0) as u8);
                Value::Nil
            }
            "camera" => {
                self.mem.set_camera(int(args, 0, 0), int(args, 1, 0));
                Value::Nil
            }
            "clip" => {
                if arg(args, 0).is_nil() {
                    self.mem.set_clip(0, 0, SCREEN_W, SCREEN_H);
                } else {
                    let (x, y) = (int(args, 0, 0), int(args, 1, 0));
                    let (w, h) = (int(args, 2, 0), int(args, 3, 0));
                    self.mem.set_clip(x, y, x + w, y + h);
                }
                Value::Nil
            }
            "cursor" => {
                self.mem.set_cursor(int(args, 0, 0), int(args, 1, 0));
                Value::Nil
            }
            "color" => {
                self.mem.set_pen(int(args, 0, 6) as u8);
                Value::Nil
            }
            "pal" => {
                if arg(args, 0).is_nil() {
                    self.mem.reset_palettes();
                } else if int(args, 2, 0) == 1 {
                    self.mem
                        .set_screen_pal(int(args, 0, 0) as u8, int(args, 1, 0) as u8);
                } else {
                    self.mem
                        .set_draw_pal(int(args, 0, 0) as u8, int(args, 1, 0) as u8);
                }
                Value::Nil
            }
            "palt" => {
                if arg(args, 0).is_nil() {
                    self.mem.reset_transparency();
                } else {
                    self.mem
                        .set_transparent(int(args, 0, 0) as u8, arg(args, 1).truthy());
                }
                Value::Nil
            }

            // Shapes
            "rect" | "rectfill" | "line" => {
                let (x0, y0) = (int(args, 0, 0), int(args, 1, 0));
                let (x1, y1) = (int(args, 2, 0), int(args, 3, 0));
                let c = int(args, 4, i32::from(self.mem.pen())) as u8;
                match name {
                    "rect" => draw::rect(&mut self.mem, x0, y0, x1, y1, c),
                    "rectfill" => draw::rectfill(&mut self.mem, x0, y0, x1, y1, c),
                    _ => draw::line(&mut self.mem, x0, y0, x1, y1, c),
                }
                Value::Nil
            }
            "circ" | "circfill" => {
                let (x, y, r) = (int(args, 0, 0), int(args, 1, 0), int(args, 2, 4));
                let c = int(args, 3, i32::from(self.mem.pen())) as u8;
                if name == "circ" {
                    draw::circ(&mut self.mem, x, y, r, c);
                } else {
                    draw::circfill(&mut self.mem, x, y, r, c);
                }
                Value::Nil
            }
            "spr" => {
                draw::spr(
                    &mut self.mem,
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
            "map" => {
                draw::map(
                    &mut self.mem,
                    int(args, 0, 0),
                    int(args, 1, 0),
                    int(args, 2, 0),
                    int(args, 3, 0),
                    int(args, 4, 16),
                    int(args, 5, 16),
                );
                Value::Nil
            }
            "print" => {
                let text = arg(args, 0).as_str().unwrap_or_default().to_string();
                let c = int(args, 3, i32::from(self.mem.pen())) as u8;
                if arg(args, 1).is_nil() {
                    let (cx, cy) = self.mem.cursor();
                    let (_, end_y) = draw::print(&mut self.mem, &text, cx, cy, c);
                    self.mem.set_cursor(cx, end_y + crate::font::GLYPH_H);
                } else {
                    draw::print(
                        &mut self.mem,
                        &text,
                        int(args, 1, 0),
                        int(args, 2, 0),
                        c,
                    );
                }
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

            // Persistent cart data
            "cartdata" => match arg(args, 0) {
                Value::Nil => Value::Bool(!self.cartdata.is_empty()),
                v => {
                    let id = v.as_str().unwrap_or_default().to_string();
                    if id.is_empty() {
                        self.cartdata.clear();
                        Value::Nil
                    } else {
                        debug!(target: "vega", "stub: cartdata({id:?})");
                        self.cartdata = id;
                        Value::Bool(false)
                    }
                }
            },
            "dget" => self.mem.data_slot(int(args, 0, -1)).into(),
            "dset" => {
                self.mem.set_data_slot(int(args, 0, -1), int(args, 1, 0));
                Value::Nil
            }

            // Audio
            "sfx" => {
                self.play_note(int(args, 0, -1), int(args, 1, 0));
                Value::Nil
            }
            "music" => {
                self.mem.set_music_reg(int(args, 0, 0) as u8);
                Value::Nil
            }

            // Status
            "time" | "t" => self.seconds.into(),
            "stat" => match int(args, 0, 0) {
                30 => Value::Bool(!self.keys.is_empty()),
                31 => Value::Str(self.keys.pop_front().map(String::from).unwrap_or_default()),
                32 => self.mouse.0.into(),
                33 => self.mouse.1.into(),
                34 => i32::from(self.mouse.2).into(),
                _ => Value::Num(0.0),
            },
            "printh" => {
                debug!(target: "vega", "{}", arg(args, 0).as_str().unwrap_or_default());
                Value::Nil
            }
            "stop" | "abort" => {
                self.halted = true;
                Value::Nil
            }

            // Library functions the host language leaves to the console
            "flr" => num(args, 0, 0.0).floor().into(),
            "ceil" => num(args, 0, 0.0).ceil().into(),
            "abs" => num(args, 0, 0.0).abs().into(),
            "sgn" => (if num(args, 0, 0.0) < 0.0 { -1.0 } else { 1.0 }).into(),
            "max" => num(args, 0, 0.0).max(num(args, 1, 0.0)).into(),
            "min" => num(args, 0, 0.0).min(num(args, 1, 0.0)).into(),
            "mid" => {
                let (a, b, c) = (num(args, 0, 0.0), num(args, 1, 0.0), num(args, 2, 0.0));
                (a.max(b).min(a.max(c).min(b.max(c)))).into()
            }
            "sqrt" => {
                let n = num(args, 0, 0.0);
                (if n >= 0.0 { n.sqrt() } else { 0.0 }).into()
            }
            // Angles are in turns; sin is screen-space (inverted)
            "cos" => (num(args, 0, 0.0) * std::f64::consts::TAU).cos().into(),
            "sin" => (-(num(args, 0, 0.0) * std::f64::consts::TAU).sin()).into(),
            "atan2" => {
                let (dx, dy) = (num(args, 0, 0.0), num(args, 1, 0.0));
                let turns = (-dy).atan2(dx) / std::f64::consts::TAU;
                (turns.rem_euclid(1.0)).into()
            }
            "rnd" => {
                let limit = num(args, 0, 1.0);
                (self.next_rand() * limit).into()
            }
            "srand" => {
                self.rng = (num(args, 0, 0.0).to_bits() as u32) | 1;
                Value::Nil
            }
            "ord" => {
                let s = arg(args, 0).as_str().unwrap_or_default();
                charset::encode(s)
                    .first()
                    .map_or(Value::Nil, |&b| i32::from(b).into())
            }
            "chr" => Value::Str(charset::decode(&[int(args, 0, 0) as u8])),
            "tostr" => {
                let text = match arg(args, 0) {
                    Value::Nil => "[nil]".to_string(),
                    Value::Bool(b) => b.to_string(),
                    Value::Num(n) if n.fract() == 0.0 => format!("{}", *n as i64),
                    Value::Num(n) => n.to_string(),
                    Value::Str(s) => s.clone(),
                };
                Value::Str(text)
            }
            "tonum" => match arg(args, 0) {
                Value::Num(n) => Value::Num(*n),
                Value::Str(s) => s.trim().parse::<f64>().map_or(Value::Nil, Value::Num),
                _ => Value::Nil,
            },

            // Anything else the console lists but does not implement gets a
            // diagnostic stub; truly unknown names fall through silently.
            _ => {
                if api::is_api(name) {
                    self.stub(name, args);
                }
                Value::Nil
            }
        }
    }
}
