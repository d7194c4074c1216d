//! Script engine binding seam.
//!
//! The embedded interpreter is an external collaborator. The core talks to
//! it through two narrow traits: `ScriptEngine` (boot code, call a named
//! script function) and `Host` (the console surface a script calls back
//! into, dispatched by builtin name). Neither side sees the other's
//! internal types, so a variant can swap interpreters without touching the
//! hardware emulation.

use crate::error::ScriptError;

/// A value crossing the script boundary in either direction.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// No value (also the return of builtins that return nothing).
    #[default]
    Nil,
    Bool(bool),
    Num(f64),
    Str(String),
}

impl Value {
    /// Numeric view. `Bool` coerces to 0/1 the way console scripts expect.
    pub fn as_num(&self) -> Option<f64> {
        match self {
            Value::Num(n) => Some(*n),
            Value::Bool(b) => Some(f64::from(u8::from(*b))),
            _ => None,
        }
    }

    /// Integer view, truncating toward zero.
    pub fn as_int(&self) -> Option<i32> {
        self.as_num().map(|n| n as i32)
    }

    /// String view.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Script truthiness: everything but `Nil` and `false` is true.
    pub fn truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    /// Whether the value is absent. Used for optional trailing arguments.
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Num(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Num(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

/// Argument accessor with absent-argument semantics.
///
/// Missing trailing arguments read as `Nil`, so dual-arity builtins can
/// branch on `arg(args, n).is_nil()` without caring whether the engine
/// passed an explicit nil or nothing at all.
pub fn arg(args: &[Value], index: usize) -> &Value {
    static NIL: Value = Value::Nil;
    args.get(index).unwrap_or(&NIL)
}

/// The console surface exposed to the script engine.
///
/// Every script-visible builtin resolves through `api_call` by name. The
/// dispatch itself never fails: unknown names return `Nil` (after a
/// diagnostic stub notification for names the console lists as builtins).
pub trait Host {
    fn api_call(&mut self, name: &str, args: &[Value]) -> Value;
}

/// The embedded interpreter, reduced to the capabilities the core needs.
pub trait ScriptEngine {
    /// Parse and execute the cartridge's top-level code.
    fn boot(&mut self, source: &str, host: &mut dyn Host) -> Result<(), ScriptError>;

    /// Call a named script function (an entry point like the per-frame
    /// update callback).
    fn call(
        &mut self,
        name: &str,
        args: &[Value],
        host: &mut dyn Host,
    ) -> Result<Value, ScriptError>;

    /// Whether the booted cartridge defines the named function.
    fn has_callback(&self, name: &str) -> bool;
}
