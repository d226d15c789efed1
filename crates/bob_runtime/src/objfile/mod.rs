//! Object files.
//!
//! An object file is the magic `BOBO`, a big-endian version word, then one
//! tagged value per top-level thunk. [`Persisted`] is the value tree the
//! codec reads and writes; it never touches the heap, so encoding and
//! decoding can be tested on their own.

mod codec;
mod load;

use bob_ir::{CodeUnit, Literal};

pub use codec::{DecodeError, Decoder, EncodeError, encode, write_header};

pub const MAGIC: &[u8; 4] = b"BOBO";
pub const VERSION: u32 = 4;

pub(crate) mod tags {
    pub const NIL: u8 = 0;
    pub const CODE: u8 = 1;
    pub const VECTOR: u8 = 2;
    pub const OBJECT: u8 = 3;
    pub const SYMBOL: u8 = 4;
    pub const STRING: u8 = 5;
    pub const INTEGER: u8 = 6;
    pub const FLOAT: u8 = 7;
}

#[derive(Clone, Debug, PartialEq)]
pub enum Persisted {
    Nil,
    /// Bytecode string, name, then the literals.
    Code(Vec<Persisted>),
    Vector(Vec<Persisted>),
    Object {
        class: Box<Persisted>,
        properties: Vec<(Persisted, Persisted)>,
    },
    Symbol(Vec<u8>),
    String(Vec<u8>),
    Integer(i64),
    Float(f64),
}

impl Persisted {
    pub fn from_literal(lit: &Literal) -> Persisted {
        match lit {
            Literal::Nil => Persisted::Nil,
            Literal::Int(i) => Persisted::Integer(*i),
            Literal::Float(f) => Persisted::Float(*f),
            Literal::Str(s) => Persisted::String(s.clone()),
            Literal::Symbol(s) => Persisted::Symbol(s.clone()),
            Literal::Code(unit) => Persisted::from_unit(unit),
        }
    }

    /// The persisted form of a compiled unit. Line tables are not kept.
    pub fn from_unit(unit: &CodeUnit) -> Persisted {
        let mut elements = Vec::with_capacity(unit.literals.len());
        elements.push(Persisted::String(unit.bytecode.clone()));
        elements.extend(unit.literals.iter().skip(1).map(Persisted::from_literal));
        Persisted::Code(elements)
    }
}

/// A complete object file holding `units` as its thunks.
pub fn write_object(units: &[CodeUnit], reverse_floats: bool) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::new();
    write_header(&mut out);
    for unit in units {
        encode(&Persisted::from_unit(unit), reverse_floats, &mut out)?;
    }
    Ok(out)
}
