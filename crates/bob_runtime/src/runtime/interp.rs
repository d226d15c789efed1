//! The interpreter context and its embedding surface.

use std::fmt;

use crate::builtins;
use crate::core::heap::{Heap, NativeResource, Record};
use crate::core::symbol::SymbolTable;
use crate::core::Value;
use crate::errors::BobError;
use crate::runtime::types::{find_local, set_local};
use crate::runtime::{InterpreterConfig, TypeKind};
use crate::vm::{Machine, NativeFn, VirtualGetter, VirtualSetter};

/// Receives every error reported through [`Interpreter::handle_error`],
/// together with the stack trace captured where it was raised.
pub type ErrorHandler = Box<dyn FnMut(&BobError, &str)>;

/// One interpreter: heap, symbol table, type records and the VM.
pub struct Interpreter {
    pub(crate) heap: Heap,
    pub(crate) symbols: SymbolTable,
    /// Type records indexed by `TypeKind`; the `Object` entry is the root
    /// prototype object.
    pub(crate) types: Vec<Value>,
    pub(crate) vm: Machine,
    pub(crate) config: InterpreterConfig,
    pub(crate) output: String,
    pub(crate) errors: String,
    handler: Option<ErrorHandler>,
    pub(crate) rand_seed: i64,
}

impl fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interpreter")
            .field("config", &self.config)
            .field("bytes_used", &self.heap.bytes_used())
            .field("symbols", &self.symbols.len())
            .finish_non_exhaustive()
    }
}

impl Interpreter {
    pub fn new() -> Result<Self, BobError> {
        Self::with_config(InterpreterConfig::default())
    }

    /// Build an interpreter and install the object hierarchy and library.
    pub fn with_config(config: InterpreterConfig) -> Result<Self, BobError> {
        let mut interp = Self {
            heap: Heap::new(config.heap_size),
            symbols: SymbolTable::new(),
            types: Vec::with_capacity(TypeKind::ALL.len()),
            vm: Machine::new(config.stack_size),
            config,
            output: String::new(),
            errors: String::new(),
            handler: None,
            rand_seed: 1,
        };
        for kind in TypeKind::ALL {
            let record = match kind {
                TypeKind::Object => interp.heap.make_object(Value::NIL)?,
                _ => interp.heap.make_type(kind)?,
            };
            interp.types.push(record);
        }
        for kind in TypeKind::ALL {
            if kind != TypeKind::VirtualProperty {
                let record = interp.types[kind.index()];
                interp.set_global(kind.name(), record)?;
            }
        }
        builtins::install(&mut interp)?;
        log::debug!(
            "interpreter ready: {} bytes used of {}",
            interp.heap.bytes_used(),
            interp.heap.semispace_size()
        );
        Ok(interp)
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut InterpreterConfig {
        &mut self.config
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    // ---- output ----

    /// Program output produced since the last call.
    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    /// Error reports written by the default handler since the last call.
    pub fn take_errors(&mut self) -> String {
        std::mem::take(&mut self.errors)
    }

    pub(crate) fn write_output(&mut self, s: &str) {
        self.output.push_str(s);
    }

    // ---- errors ----

    pub fn set_error_handler(&mut self, handler: ErrorHandler) {
        self.handler = Some(handler);
    }

    /// Report `err` through the installed handler, or write
    /// `Error: <message>` and the stack trace to the error sink.
    pub fn handle_error(&mut self, err: &BobError) {
        let trace = self.vm.trace.take().unwrap_or_default();
        match self.handler.as_mut() {
            Some(handler) => handler(err, &trace),
            None => {
                self.errors.push_str("Error: ");
                self.errors.push_str(&err.to_string());
                self.errors.push('\n');
                self.errors.push_str(&trace);
            }
        }
    }

    /// Stack trace of the last error, if one was captured.
    pub fn last_trace(&self) -> Option<&str> {
        self.vm.trace.as_deref()
    }

    // ---- symbols and globals ----

    pub fn intern(&mut self, name: &str) -> Result<Value, BobError> {
        self.symbols.intern(&mut self.heap, name.as_bytes())
    }

    pub(crate) fn intern_bytes(&mut self, name: &[u8]) -> Result<Value, BobError> {
        self.symbols.intern(&mut self.heap, name)
    }

    /// Value of a global variable; unbound globals are `nil`.
    pub fn global(&self, name: &str) -> Value {
        self.symbols
            .lookup(name.as_bytes())
            .map_or(Value::NIL, |s| self.symbol_value(s))
    }

    pub fn set_global(&mut self, name: &str, value: Value) -> Result<(), BobError> {
        let sym = self.intern(name)?;
        self.set_symbol_value(sym, value);
        Ok(())
    }

    pub(crate) fn symbol_value(&self, sym: Value) -> Value {
        self.heap.symbol(sym).map_or(Value::NIL, |s| s.value)
    }

    pub(crate) fn set_symbol_value(&mut self, sym: Value, value: Value) {
        if let Some(Record::Symbol(s)) = self.heap.get_mut(sym) {
            s.value = value;
        }
    }

    // ---- object model ----

    /// Record of a built-in type; `TypeKind::Object` gives the root object.
    pub fn type_object(&self, kind: TypeKind) -> Value {
        self.type_record(kind)
    }

    /// Native method bound to `name` in `owner`'s own properties.
    pub fn define_method(
        &mut self,
        owner: Value,
        name: &'static str,
        handler: NativeFn,
    ) -> Result<(), BobError> {
        let method = self.heap.make_cmethod(name, handler)?;
        let sym = self.intern(name)?;
        if !set_local(&mut self.heap, owner, sym, method) {
            return Err(BobError::TypeError(self.print_string(owner)));
        }
        Ok(())
    }

    /// Native function bound to a global.
    pub fn define_function(&mut self, name: &'static str, handler: NativeFn) -> Result<(), BobError> {
        let method = self.heap.make_cmethod(name, handler)?;
        self.set_global(name, method)
    }

    /// Virtual property in `owner`'s own properties.
    pub fn define_virtual_property(
        &mut self,
        owner: Value,
        name: &'static str,
        get: Option<VirtualGetter>,
        set: Option<VirtualSetter>,
    ) -> Result<(), BobError> {
        let vp = self.heap.make_virtual_property(name, get, set)?;
        let sym = self.intern(name)?;
        if !set_local(&mut self.heap, owner, sym, vp) {
            return Err(BobError::TypeError(self.print_string(owner)));
        }
        Ok(())
    }

    /// Read a property along the class chain, `None` when absent.
    pub fn property(&mut self, obj: Value, tag: Value) -> Result<Option<Value>, BobError> {
        self.get_property(obj, tag)
    }

    pub fn set(&mut self, obj: Value, tag: Value, value: Value) -> Result<(), BobError> {
        if self.set_property(obj, tag, value)? {
            Ok(())
        } else {
            Err(BobError::NoProperty {
                object: self.print_string(obj),
                tag: self.print_string(tag),
            })
        }
    }

    /// A property stored on the object itself.
    pub fn local_property(&self, obj: Value, tag: Value) -> Option<Value> {
        find_local(&self.heap, obj, tag)
    }

    // ---- value constructors and accessors ----

    pub fn make_integer(&mut self, i: i64) -> Result<Value, BobError> {
        self.heap.make_integer(i)
    }

    pub fn make_float(&mut self, f: f64) -> Result<Value, BobError> {
        self.heap.make_float(f)
    }

    pub fn make_string(&mut self, s: &str) -> Result<Value, BobError> {
        self.heap.make_string(s.as_bytes())
    }

    pub fn make_vector(&mut self, items: Vec<Value>) -> Result<Value, BobError> {
        self.heap.make_vector(items)
    }

    pub fn make_object(&mut self, class: Value) -> Result<Value, BobError> {
        self.heap.make_object(class)
    }

    /// Object wrapping a native resource, destroyed once it becomes
    /// unreachable.
    pub fn make_cobject(
        &mut self,
        class: Value,
        resource: Box<dyn NativeResource>,
    ) -> Result<Value, BobError> {
        self.heap.make_cobject(class, resource)
    }

    pub fn integer_value(&self, v: Value) -> Option<i64> {
        self.heap.integer(v)
    }

    pub fn float_value(&self, v: Value) -> Option<f64> {
        self.heap.float(v)
    }

    pub fn string_value(&self, v: Value) -> Option<&[u8]> {
        self.heap.string(v)
    }

    pub fn vector_items(&self, v: Value) -> Option<&[Value]> {
        self.heap.vector(v).map(Vec::as_slice)
    }

    /// Language equality (`==`).
    pub fn equal(&self, a: Value, b: Value) -> bool {
        crate::runtime::types::eql(&self.heap, a, b)
    }

    // ---- protected pointers ----

    pub fn protect(&mut self, v: Value) {
        self.heap.protect(v);
    }

    pub fn unprotect(&mut self) -> Value {
        self.heap.unprotect()
    }

    pub fn protected(&self, depth: usize) -> Value {
        self.heap.protected(depth)
    }

    // ---- calls ----

    /// Call `f` as a function, with `this` nil.
    pub fn call(&mut self, f: Value, args: &[Value]) -> Result<Value, BobError> {
        self.call_method(f, Value::NIL, args)
    }

    /// Call `f` with an explicit `this`.
    pub fn call_method(&mut self, f: Value, this: Value, args: &[Value]) -> Result<Value, BobError> {
        self.enter_idle();
        let result = self.call_method_inner(f, this, args);
        self.leave_idle(&result);
        result
    }

    fn call_method_inner(&mut self, f: Value, this: Value, args: &[Value]) -> Result<Value, BobError> {
        self.vm.push(f)?;
        self.vm.push(this)?;
        self.vm.push(Value::NIL)?;
        for a in args {
            self.vm.push(*a)?;
        }
        self.apply(args.len() + 2)
    }

    /// Send `selector` to `obj`, searching its class chain.
    pub fn send(&mut self, obj: Value, selector: &str, args: &[Value]) -> Result<Value, BobError> {
        self.enter_idle();
        let result = self.send_inner(obj, selector, args);
        self.leave_idle(&result);
        result
    }

    fn send_inner(&mut self, obj: Value, selector: &str, args: &[Value]) -> Result<Value, BobError> {
        self.vm.push(obj)?;
        let sel = self.intern(selector)?;
        self.vm.push(sel)?;
        self.vm.push(obj)?;
        for a in args {
            self.vm.push(*a)?;
        }
        self.send_value(args.len() + 2)
    }

    /// Prepare for a call from outside the interpreter loop.
    pub(crate) fn enter_idle(&mut self) {
        if self.vm.is_idle() {
            self.vm.thrown = None;
            self.vm.trace = None;
        }
    }

    pub(crate) fn leave_idle<T>(&mut self, result: &Result<T, BobError>) {
        if self.vm.is_idle() {
            if result.is_err() {
                let trace = self.vm.trace.take();
                self.vm.reset();
                self.vm.trace = trace;
            } else {
                self.vm.stack.clear();
            }
        }
    }

    /// Park–Miller minimal standard generator.
    pub(crate) fn next_random(&mut self) -> i64 {
        if self.rand_seed == 0 {
            self.rand_seed = 1;
        }
        let k1 = self.rand_seed / 127_773;
        self.rand_seed = 16_807 * (self.rand_seed - k1 * 127_773) - k1 * 2_836;
        if self.rand_seed < 0 {
            self.rand_seed += 2_147_483_647;
        }
        self.rand_seed
    }
}
