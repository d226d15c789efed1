//! Built-in library: methods of the root object and the built-in types,
//! and the global functions.

pub(crate) mod args;
mod functions;
mod method;
mod number;
mod object;
mod string;
mod vector;

use crate::errors::BobError;
use crate::runtime::Interpreter;

pub(crate) fn install(interp: &mut Interpreter) -> Result<(), BobError> {
    object::install(interp)?;
    vector::install(interp)?;
    string::install(interp)?;
    number::install(interp)?;
    method::install(interp)?;
    functions::install(interp)
}
