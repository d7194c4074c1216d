//! Integration tests driving the Vega-8 through the shared `Console`
//! contract, with a scripted stand-in for the embedded engine.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use console_core::{Console, Host, RunState, ScriptEngine, ScriptError, Value};
use machine_vega::{PALETTE, Vega, cart, memory};

type Hook = Box<dyn FnMut(&mut dyn Host)>;

/// Script engine stand-in: runs closures instead of interpreted code.
#[derive(Default)]
struct HookEngine {
    callbacks: HashSet<&'static str>,
    booted_source: Rc<RefCell<String>>,
    on_init: Option<Hook>,
    on_update: Option<Hook>,
    on_draw: Option<Hook>,
    fail_update: bool,
}

impl ScriptEngine for HookEngine {
    fn boot(&mut self, source: &str, _host: &mut dyn Host) -> Result<(), ScriptError> {
        *self.booted_source.borrow_mut() = source.to_string();
        Ok(())
    }

    fn call(
        &mut self,
        name: &str,
        _args: &[Value],
        host: &mut dyn Host,
    ) -> Result<Value, ScriptError> {
        let hook = match name {
            "_init" => &mut self.on_init,
            "_update" => {
                if self.fail_update {
                    return Err(ScriptError::Runtime("boom".to_string()));
                }
                &mut self.on_update
            }
            "_draw" => &mut self.on_draw,
            _ => &mut None,
        };
        if let Some(f) = hook {
            f(host);
        }
        Ok(Value::Nil)
    }

    fn has_callback(&self, name: &str) -> bool {
        self.callbacks.contains(name)
    }
}

fn cart_image(code: &str) -> Vec<u8> {
    cart::build(code, &[0x21; 16], &[5; 4], &[1; 2])
}

#[test]
fn test_lifecycle_states() {
    let mut vega = Vega::new(Box::new(HookEngine::default()));
    assert_eq!(vega.state(), RunState::Unloaded);

    // Stepping an unloaded console is a harmless no-op
    let console: &mut dyn Console = &mut vega;
    assert!(console.step(1.0 / 30.0));

    console.load(&cart_image("x = 1")).unwrap();
    console.run();
    assert!(console.step(1.0 / 30.0));
    assert_eq!(vega.state(), RunState::Running);
}

#[test]
fn test_boot_receives_decoded_code() {
    let source = Rc::new(RefCell::new(String::new()));
    let engine = HookEngine {
        booted_source: Rc::clone(&source),
        ..HookEngine::default()
    };
    let mut vega = Vega::new(Box::new(engine));
    let code = "if btn(\u{2b06}\u{fe0f}) then jump() end";
    vega.load(&cart_image(code)).unwrap();
    vega.run();
    assert_eq!(*source.borrow(), code);
}

#[test]
fn test_load_failure_is_atomic() {
    let mut vega = Vega::new(Box::new(HookEngine::default()));

    // A malformed image leaves a fresh console untouched
    assert!(vega.load(b"not a cartridge").is_err());
    assert_eq!(vega.state(), RunState::Unloaded);
    assert!(vega.ram().iter().all(|&b| b == 0));

    // A malformed image leaves a previously loaded cartridge intact
    vega.load(&cart_image("x = 1")).unwrap();
    assert_eq!(vega.rom()[memory::SPRITE_BASE], 0x21);
    assert!(vega.load(&[0xFF; 4]).is_err());
    assert_eq!(vega.state(), RunState::Loaded);
    assert_eq!(vega.rom()[memory::SPRITE_BASE], 0x21);
}

#[test]
fn test_input_reaches_script_at_next_step() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let seen_in_hook = Rc::clone(&seen);
    let engine = HookEngine {
        callbacks: HashSet::from(["_update"]),
        on_update: Some(Box::new(move |host| {
            seen_in_hook
                .borrow_mut()
                .push(host.api_call("btn", &[0.into()]));
        })),
        ..HookEngine::default()
    };
    let mut vega = Vega::new(Box::new(engine));
    vega.load(&cart_image("")).unwrap();
    vega.run();

    vega.button(0, true);
    vega.step(0.0);
    // Held state persists into the next frame without new events
    vega.step(0.0);
    assert_eq!(
        *seen.borrow(),
        vec![Value::Bool(true), Value::Bool(true)]
    );
}

#[test]
fn test_script_halt_stops_stepping() {
    let engine = HookEngine {
        callbacks: HashSet::from(["_update"]),
        on_update: Some(Box::new(|host| {
            host.api_call("stop", &[]);
        })),
        ..HookEngine::default()
    };
    let mut vega = Vega::new(Box::new(engine));
    vega.load(&cart_image("stop()")).unwrap();
    vega.run();
    assert!(!vega.step(0.0));
    assert!(!vega.step(0.0));
}

#[test]
fn test_script_error_halts_gracefully() {
    let engine = HookEngine {
        callbacks: HashSet::from(["_update"]),
        fail_update: true,
        ..HookEngine::default()
    };
    let mut vega = Vega::new(Box::new(engine));
    vega.load(&cart_image("")).unwrap();
    vega.run();
    assert!(!vega.step(0.0));
}

#[test]
fn test_render_projects_screen_ram() {
    let engine = HookEngine {
        callbacks: HashSet::from(["_draw"]),
        on_draw: Some(Box::new(|host| {
            host.api_call("pset", &[0.into(), 0.into(), 8.into()]);
        })),
        ..HookEngine::default()
    };
    let mut vega = Vega::new(Box::new(engine));
    vega.load(&cart_image("")).unwrap();
    vega.run();
    vega.step(0.0);

    let config = vega.video_config();
    let mut frame = vec![0u8; (config.width * config.height * 4) as usize];
    vega.render(&mut frame);
    assert_eq!(&frame[0..3], &PALETTE[8]);
    assert_eq!(frame[3], 0xFF);

    // Rendering twice projects the same state
    let mut again = vec![0u8; frame.len()];
    vega.render(&mut again);
    assert_eq!(frame, again);
}

#[test]
fn test_audio_streamer_per_channel() {
    let engine = HookEngine {
        callbacks: HashSet::from(["_update"]),
        on_update: Some(Box::new(|host| {
            host.api_call("sfx", &[33.into(), 0.into()]);
        })),
        ..HookEngine::default()
    };
    let mut vega = Vega::new(Box::new(engine));
    vega.load(&cart_image("")).unwrap();
    vega.run();
    vega.step(0.0);

    assert!(vega.audio_streamer(99).is_none());
    let mut streamer = vega.audio_streamer(0).unwrap();
    let mut block = [0.0f32; 256];
    streamer.stream(&mut block);
    assert!(block.iter().any(|&s| s != 0.0));

    // An untouched channel streams silence
    let mut silent = vega.audio_streamer(1).unwrap();
    let mut block = [1.0f32; 64];
    silent.stream(&mut block);
    assert!(block.iter().all(|&s| s == 0.0));
}

#[test]
fn test_raw_memory_views() {
    let mut vega = Vega::new(Box::new(HookEngine::default()));
    vega.load(&cart_image("")).unwrap();
    assert_eq!(vega.ram().len(), memory::RAM_SIZE);
    assert_eq!(vega.rom().len(), memory::ROM_SIZE);
    // The mutable RAM view really aliases console state
    vega.ram()[memory::FLAG_BASE] = 0xAB;
    assert_eq!(vega.ram()[memory::FLAG_BASE], 0xAB);
}
