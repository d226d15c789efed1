use std::fmt::Write as _;

use crate::errors::BobError;
use crate::runtime::Interpreter;
use crate::vm::Frame;

/// Resume at the innermost handler with the thrown value in the register.
pub(crate) fn catch(interp: &mut Interpreter) -> Result<(), BobError> {
    let vm = &mut interp.vm;
    let h = vm.handlers.pop().ok_or(BobError::Impossible)?;
    vm.frames.truncate(h.frames);
    vm.stack.truncate(h.sp);
    vm.env = h.env;
    vm.code = h.code;
    vm.bytecode = h.bytecode;
    vm.argc = h.argc;
    vm.pc = h.target;
    vm.val = vm.thrown.take().ok_or(BobError::Impossible)?;
    vm.trace = None;
    Ok(())
}

/// Abandon everything an `apply` pushed: frames from `frames`, handlers from
/// `handlers` and the stack down to the callee `slot`. The caller's registers
/// come back from the first abandoned call frame.
pub(crate) fn unwind_to(interp: &mut Interpreter, frames: usize, handlers: usize, slot: usize) {
    let vm = &mut interp.vm;
    let first = if frames < vm.frames.len() {
        vm.frames.drain(frames..).next()
    } else {
        None
    };
    if let Some(Frame::Call(frame)) = first {
        vm.restore(frame);
    }
    vm.handlers.truncate(handlers);
    vm.stack.truncate(slot);
}

/// `Happened in <fn> at <pc>` followed by the callers, innermost first.
pub(crate) fn stack_trace(interp: &Interpreter) -> String {
    let mut out = String::new();
    let vm = &interp.vm;
    let _ = write!(
        out,
        "Happened in {} at {:04x}",
        function_name(interp, vm.code),
        vm.pc
    );
    push_line(interp, &mut out, vm.code, vm.pc);
    out.push('\n');

    let callers: Vec<_> = vm
        .frames
        .iter()
        .rev()
        .filter_map(|f| match f {
            Frame::Call(call) if !call.code.is_nil() => Some((call.code, call.pc)),
            _ => None,
        })
        .collect();
    if !callers.is_empty() {
        out.push_str("Called from:\n");
        for (code, pc) in callers {
            let _ = write!(out, "  {}", function_name(interp, code));
            push_line(interp, &mut out, code, pc);
            out.push('\n');
        }
    }
    out
}

fn function_name(interp: &Interpreter, code: crate::core::Value) -> String {
    interp
        .code_name(code)
        .unwrap_or_else(|| interp.print_string(code))
}

fn push_line(interp: &Interpreter, out: &mut String, code: crate::core::Value, pc: usize) {
    let Some(c) = interp.heap.code(code) else {
        return;
    };
    let idx = c.lines.partition_point(|e| e.pc as usize <= pc);
    if let Some(entry) = idx.checked_sub(1).map(|i| c.lines[i]) {
        let _ = write!(out, " line {}", entry.line);
    }
}
