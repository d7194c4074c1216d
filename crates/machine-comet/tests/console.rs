//! Integration tests driving the Comet through the shared `Console`
//! contract.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use console_core::{Console, Host, RunState, ScriptEngine, ScriptError, Value};
use machine_comet::{Comet, cart, memory};

type Hook = Box<dyn FnMut(&mut dyn Host)>;

#[derive(Default)]
struct HookEngine {
    callbacks: HashSet<&'static str>,
    on_update: Option<Hook>,
    on_draw: Option<Hook>,
}

impl ScriptEngine for HookEngine {
    fn boot(&mut self, _source: &str, _host: &mut dyn Host) -> Result<(), ScriptError> {
        Ok(())
    }

    fn call(
        &mut self,
        name: &str,
        _args: &[Value],
        host: &mut dyn Host,
    ) -> Result<Value, ScriptError> {
        let hook = match name {
            "update" => &mut self.on_update,
            "draw" => &mut self.on_draw,
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

#[test]
fn test_lifecycle_through_trait_object() {
    let mut comet = Comet::new(Box::new(HookEngine::default()));
    assert_eq!(comet.state(), RunState::Unloaded);

    let console: &mut dyn Console = &mut comet;
    assert!(console.step(0.0)); // no-op before load
    console
        .load(&cart::build("orbit", "x = 1", &[], &[], &[]))
        .unwrap();
    console.run();
    assert!(console.step(0.0));
    assert_eq!(comet.state(), RunState::Running);
}

#[test]
fn test_load_failure_is_atomic() {
    let mut comet = Comet::new(Box::new(HookEngine::default()));
    comet
        .load(&cart::build("orbit", "", &[0xAB], &[], &[]))
        .unwrap();
    assert_eq!(comet.rom()[memory::SPRITE_BASE], 0xAB);

    assert!(comet.load(b"{ not json").is_err());
    assert_eq!(comet.state(), RunState::Loaded);
    assert_eq!(comet.rom()[memory::SPRITE_BASE], 0xAB);
}

#[test]
fn test_cart_palette_reaches_renderer() {
    let engine = HookEngine {
        callbacks: HashSet::from(["draw"]),
        on_draw: Some(Box::new(|host| {
            host.api_call("pset", &[0.into(), 0.into(), 1.into()]);
        })),
        ..HookEngine::default()
    };
    let mut comet = Comet::new(Box::new(engine));
    // Palette entry 1 is bright red
    let mut palette = vec![0u8; 6];
    palette[3] = 0xFF;
    comet
        .load(&cart::build("red", "", &[], &[], &palette))
        .unwrap();
    comet.run();
    comet.step(0.0);

    let config = comet.video_config();
    let mut frame = vec![0u8; (config.width * config.height * 4) as usize];
    comet.render(&mut frame);
    assert_eq!(&frame[0..4], &[0xFF, 0x00, 0x00, 0xFF]);
}

#[test]
fn test_palset_feeds_back_into_render() {
    let engine = HookEngine {
        callbacks: HashSet::from(["update"]),
        on_update: Some(Box::new(|host| {
            host.api_call("palset", &[0.into(), 7.into(), 8.into(), 9.into()]);
        })),
        ..HookEngine::default()
    };
    let mut comet = Comet::new(Box::new(engine));
    comet
        .load(&cart::build("pal", "", &[], &[], &[]))
        .unwrap();
    comet.run();
    comet.step(0.0);

    let mut frame = vec![0u8; 64 * 64 * 4];
    comet.render(&mut frame);
    // Colour 0 everywhere, remapped by the register write
    assert_eq!(&frame[0..3], &[7, 8, 9]);
}

#[test]
fn test_button_batch_and_edge_detection() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let seen_in_hook = Rc::clone(&seen);
    let engine = HookEngine {
        callbacks: HashSet::from(["update"]),
        on_update: Some(Box::new(move |host| {
            seen_in_hook
                .borrow_mut()
                .push(host.api_call("btnp", &[2.into()]));
        })),
        ..HookEngine::default()
    };
    let mut comet = Comet::new(Box::new(engine));
    comet
        .load(&cart::build("btn", "", &[], &[], &[]))
        .unwrap();
    comet.run();

    comet.button(2, true);
    comet.step(0.0);
    comet.step(0.0);
    // Pressed on the first frame only; still held, no longer "pressed"
    assert_eq!(*seen.borrow(), vec![Value::Bool(true), Value::Bool(false)]);
}

#[test]
fn test_audio_channels_are_bounded() {
    let mut comet = Comet::new(Box::new(HookEngine::default()));
    assert!(comet.audio_streamer(0).is_some());
    assert!(comet.audio_streamer(1).is_some());
    assert!(comet.audio_streamer(2).is_none());
}
