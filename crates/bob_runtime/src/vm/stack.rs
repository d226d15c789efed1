use std::rc::Rc;

use crate::core::Value;
use crate::errors::BobError;
use crate::runtime::Interpreter;

/// Handler of a built-in method. Arguments stay on the value stack for the
/// duration of the call; see [`Args`].
pub type NativeFn = fn(&mut Interpreter, Args) -> Result<Value, BobError>;
/// Read accessor of a virtual property, given the receiver.
pub type VirtualGetter = fn(&mut Interpreter, Value) -> Result<Value, BobError>;
/// Write accessor of a virtual property, given the receiver and the value.
pub type VirtualSetter = fn(&mut Interpreter, Value, Value) -> Result<(), BobError>;

/// Window onto the arguments of a native call.
///
/// Arguments are numbered from 1: argument 1 is `this`, 2 is `_next`, and
/// user arguments start at 3. The callee sits just below argument 1.
#[derive(Clone, Copy, Debug)]
pub struct Args {
    pub(crate) base: usize,
    pub(crate) count: usize,
}

impl Args {
    pub(crate) fn new(base: usize, count: usize) -> Self {
        Self { base, count }
    }

    /// Number of arguments, `this` and `_next` included.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn get(&self, interp: &Interpreter, n: usize) -> Value {
        if n == 0 || n > self.count {
            return Value::NIL;
        }
        interp
            .vm
            .stack
            .get(self.base + n - 1)
            .copied()
            .unwrap_or(Value::NIL)
    }

    pub fn callee(&self, interp: &Interpreter) -> Value {
        self.base
            .checked_sub(1)
            .and_then(|i| interp.vm.stack.get(i).copied())
            .unwrap_or(Value::NIL)
    }
}

pub(crate) struct CallFrame {
    /// Caller's registers.
    pub(crate) code: Value,
    pub(crate) bytecode: Rc<[u8]>,
    pub(crate) pc: usize,
    pub(crate) env: Value,
    pub(crate) argc: usize,
    /// Stack height to return to (the callee slot).
    pub(crate) base: usize,
    /// Handler count when the call was made.
    pub(crate) handlers: usize,
    /// Returning from this frame leaves the interpreter loop.
    pub(crate) top: bool,
}

pub(crate) enum Frame {
    Call(CallFrame),
    Block { env: Value },
}

/// An installed `TRY` target.
pub(crate) struct Handler {
    pub(crate) target: usize,
    pub(crate) sp: usize,
    pub(crate) frames: usize,
    pub(crate) env: Value,
    pub(crate) code: Value,
    pub(crate) bytecode: Rc<[u8]>,
    pub(crate) argc: usize,
}

/// Registers, value stack, frame stack and handler stack.
pub(crate) struct Machine {
    pub(crate) stack: Vec<Value>,
    pub(crate) frames: Vec<Frame>,
    pub(crate) handlers: Vec<Handler>,
    pub(crate) val: Value,
    /// Current code object, `nil` outside of bytecode.
    pub(crate) code: Value,
    pub(crate) bytecode: Rc<[u8]>,
    pub(crate) pc: usize,
    pub(crate) env: Value,
    pub(crate) argc: usize,
    /// Value in flight between `THROW` and the handler that takes it.
    pub(crate) thrown: Option<Value>,
    /// Stack trace captured where the current error was raised.
    pub(crate) trace: Option<String>,
    limit: usize,
}

impl Machine {
    pub(crate) fn new(stack_size: usize) -> Self {
        Self {
            stack: Vec::with_capacity(stack_size.min(4096)),
            frames: Vec::new(),
            handlers: Vec::new(),
            val: Value::NIL,
            code: Value::NIL,
            bytecode: Rc::from(&[][..]),
            pc: 0,
            env: Value::NIL,
            argc: 0,
            thrown: None,
            trace: None,
            limit: stack_size,
        }
    }

    #[inline]
    pub(crate) fn push(&mut self, v: Value) -> Result<(), BobError> {
        if self.stack.len() >= self.limit {
            return Err(BobError::StackOverflow);
        }
        self.stack.push(v);
        Ok(())
    }

    #[inline]
    pub(crate) fn pop(&mut self) -> Result<Value, BobError> {
        self.stack.pop().ok_or(BobError::Impossible)
    }

    /// `depth` slots below the top, 0 being the top itself.
    #[inline]
    pub(crate) fn peek(&self, depth: usize) -> Result<Value, BobError> {
        self.stack
            .len()
            .checked_sub(depth + 1)
            .map(|i| self.stack[i])
            .ok_or(BobError::Impossible)
    }

    pub(crate) fn fetch_byte(&mut self) -> Result<u8, BobError> {
        let b = *self.bytecode.get(self.pc).ok_or(BobError::BadOpcode(0))?;
        self.pc += 1;
        Ok(b)
    }

    pub(crate) fn fetch_word(&mut self) -> Result<u16, BobError> {
        if self.pc + 2 > self.bytecode.len() {
            return Err(BobError::BadOpcode(0));
        }
        let w = bob_ir::read_u16(&self.bytecode, self.pc);
        self.pc += 2;
        Ok(w)
    }

    /// Restore the caller's registers saved in `frame`.
    pub(crate) fn restore(&mut self, frame: CallFrame) {
        self.code = frame.code;
        self.bytecode = frame.bytecode;
        self.pc = frame.pc;
        self.env = frame.env;
        self.argc = frame.argc;
        self.stack.truncate(frame.base);
        self.handlers.truncate(frame.handlers);
    }

    /// Forget everything left behind by an abandoned top-level unit.
    pub(crate) fn reset(&mut self) {
        self.stack.clear();
        self.frames.clear();
        self.handlers.clear();
        self.val = Value::NIL;
        self.code = Value::NIL;
        self.bytecode = Rc::from(&[][..]);
        self.pc = 0;
        self.env = Value::NIL;
        self.argc = 0;
        self.thrown = None;
    }

    /// Visit every value the machine holds.
    pub(crate) fn roots(&mut self, f: &mut dyn FnMut(&mut Value)) {
        self.stack.iter_mut().for_each(&mut *f);
        for frame in &mut self.frames {
            match frame {
                Frame::Call(call) => {
                    f(&mut call.code);
                    f(&mut call.env);
                }
                Frame::Block { env } => f(env),
            }
        }
        for h in &mut self.handlers {
            f(&mut h.env);
            f(&mut h.code);
        }
        f(&mut self.val);
        f(&mut self.code);
        f(&mut self.env);
        if let Some(v) = &mut self.thrown {
            f(v);
        }
    }

    /// Nothing is running.
    pub(crate) fn is_idle(&self) -> bool {
        self.frames.is_empty()
    }
}
