use thiserror::Error;

use super::{MAGIC, Persisted, VERSION, tags};

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("bad magic")]
    BadMagic,
    #[error("unsupported version {0}")]
    Version(u32),
    #[error("truncated at byte {0}")]
    Truncated(usize),
    #[error("unknown tag {tag} at byte {at}")]
    BadTag { tag: u8, at: usize },
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("length {0} does not fit a 32-bit length field")]
    TooLong(usize),
}

pub fn write_header(out: &mut Vec<u8>) {
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&VERSION.to_be_bytes());
}

fn put_len(out: &mut Vec<u8>, n: usize) -> Result<(), EncodeError> {
    let n = u32::try_from(n).map_err(|_| EncodeError::TooLong(n))?;
    out.extend_from_slice(&n.to_be_bytes());
    Ok(())
}

/// Append the encoding of `value`. Integers keep their low 32 bits.
pub fn encode(value: &Persisted, reverse_floats: bool, out: &mut Vec<u8>) -> Result<(), EncodeError> {
    match value {
        Persisted::Nil => out.push(tags::NIL),
        Persisted::Code(items) | Persisted::Vector(items) => {
            out.push(if matches!(value, Persisted::Code(_)) {
                tags::CODE
            } else {
                tags::VECTOR
            });
            put_len(out, items.len())?;
            for item in items {
                encode(item, reverse_floats, out)?;
            }
        }
        Persisted::Object { class, properties } => {
            out.push(tags::OBJECT);
            encode(class, reverse_floats, out)?;
            put_len(out, properties.len())?;
            for (tag, v) in properties {
                encode(tag, reverse_floats, out)?;
                encode(v, reverse_floats, out)?;
            }
        }
        Persisted::Symbol(s) | Persisted::String(s) => {
            out.push(if matches!(value, Persisted::Symbol(_)) {
                tags::SYMBOL
            } else {
                tags::STRING
            });
            put_len(out, s.len())?;
            out.extend_from_slice(s);
        }
        Persisted::Integer(i) => {
            out.push(tags::INTEGER);
            out.extend_from_slice(&(*i as i32).to_be_bytes());
        }
        Persisted::Float(f) => {
            out.push(tags::FLOAT);
            let mut bytes = f.to_ne_bytes();
            if reverse_floats {
                bytes.reverse();
            }
            out.extend_from_slice(&bytes);
        }
    }
    Ok(())
}

pub struct Decoder<'a> {
    bytes: &'a [u8],
    pos: usize,
    reverse_floats: bool,
}

impl<'a> Decoder<'a> {
    pub fn new(bytes: &'a [u8], reverse_floats: bool) -> Self {
        Self {
            bytes,
            pos: 0,
            reverse_floats,
        }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let end = self.pos.checked_add(n).filter(|e| *e <= self.bytes.len());
        let Some(end) = end else {
            return Err(DecodeError::Truncated(self.pos));
        };
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut a = [0u8; N];
        a.copy_from_slice(self.take(N)?);
        Ok(a)
    }

    fn len(&mut self) -> Result<usize, DecodeError> {
        Ok(u32::from_be_bytes(self.array()?) as usize)
    }

    pub fn read_header(&mut self) -> Result<(), DecodeError> {
        if self.take(4).map_err(|_| DecodeError::BadMagic)? != MAGIC {
            return Err(DecodeError::BadMagic);
        }
        let version = u32::from_be_bytes(self.array().map_err(|_| DecodeError::BadMagic)?);
        if version != VERSION {
            return Err(DecodeError::Version(version));
        }
        Ok(())
    }

    /// Next top-level value, `None` at a clean end of input.
    pub fn next_thunk(&mut self) -> Result<Option<Persisted>, DecodeError> {
        if self.pos == self.bytes.len() {
            return Ok(None);
        }
        self.value().map(Some)
    }

    pub fn value(&mut self) -> Result<Persisted, DecodeError> {
        let at = self.pos;
        let [tag] = self.array()?;
        Ok(match tag {
            tags::NIL => Persisted::Nil,
            tags::CODE | tags::VECTOR => {
                let n = self.len()?;
                let mut items = Vec::with_capacity(n.min(1024));
                for _ in 0..n {
                    items.push(self.value()?);
                }
                if tag == tags::CODE {
                    Persisted::Code(items)
                } else {
                    Persisted::Vector(items)
                }
            }
            tags::OBJECT => {
                let class = Box::new(self.value()?);
                let n = self.len()?;
                let mut properties = Vec::with_capacity(n.min(1024));
                for _ in 0..n {
                    let k = self.value()?;
                    let v = self.value()?;
                    properties.push((k, v));
                }
                Persisted::Object { class, properties }
            }
            tags::SYMBOL | tags::STRING => {
                let n = self.len()?;
                let s = self.take(n)?.to_vec();
                if tag == tags::SYMBOL {
                    Persisted::Symbol(s)
                } else {
                    Persisted::String(s)
                }
            }
            tags::INTEGER => Persisted::Integer(i64::from(i32::from_be_bytes(self.array()?))),
            tags::FLOAT => {
                let mut bytes: [u8; 8] = self.array()?;
                if self.reverse_floats {
                    bytes.reverse();
                }
                Persisted::Float(f64::from_ne_bytes(bytes))
            }
            _ => return Err(DecodeError::BadTag { tag, at }),
        })
    }
}
