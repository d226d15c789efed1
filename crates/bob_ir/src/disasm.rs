use std::fmt::Write;

use crate::opcode::{Op, OperandFormat, read_u16};

fn byte(code: &[u8], i: usize) -> u8 {
    code.get(i).copied().unwrap_or(0)
}

fn word(code: &[u8], i: usize) -> u16 {
    if i + 1 < code.len() { read_u16(code, i) } else { 0 }
}

/// Decode the instruction at `pc` into `out` and return its length.
///
/// `prefix` labels every line (the unit name, or an address for anonymous
/// code); `literal` renders a literal-pool slot for `LIT`/`GREF`/`GSET` and
/// switch cases.
pub fn decode_instruction(
    prefix: &str,
    code: &[u8],
    pc: usize,
    literal: &dyn Fn(u16) -> String,
    out: &mut String,
) -> usize {
    let opcode = byte(code, pc);
    let _ = write!(out, "{prefix}:{pc:04x} {opcode:02x} ");
    let Some(op) = Op::from_byte(opcode) else {
        out.push_str("      <UNKNOWN>\n");
        return 1;
    };
    let name = op.name();
    let (b1, b2) = (byte(code, pc + 1), byte(code, pc + 2));
    match op.format() {
        OperandFormat::None => {
            let _ = writeln!(out, "      {name}");
            1
        }
        OperandFormat::Byte => {
            let _ = writeln!(out, "{b1:02x}    {name} {b1:02x}");
            2
        }
        OperandFormat::TwoBytes => {
            let _ = writeln!(out, "{b1:02x} {b2:02x} {name} {b1:02x} {b2:02x}");
            3
        }
        OperandFormat::Word => {
            let _ = writeln!(out, "{b1:02x} {b2:02x} {name} {b2:02x}{b1:02x}");
            3
        }
        OperandFormat::Literal => {
            let idx = word(code, pc + 1);
            let _ = writeln!(
                out,
                "{b1:02x} {b2:02x} {name} {b2:02x}{b1:02x} ; {}",
                literal(idx)
            );
            3
        }
        OperandFormat::Switch => {
            let _ = writeln!(out, "{b1:02x} {b2:02x} {name} {b2:02x}{b1:02x}");
            let count = word(code, pc + 1) as usize;
            let mut i = pc + 3;
            for _ in 0..count {
                let lit = word(code, i);
                let target = word(code, i + 2);
                let _ = writeln!(out, "                 {lit:04x} {target:04x} ; {}", literal(lit));
                i += 4;
            }
            let _ = writeln!(out, "                 {:04x}", word(code, i));
            3 + count * 4 + 2
        }
    }
}

/// Disassemble a whole bytecode string.
pub fn disassemble(prefix: &str, code: &[u8], literal: &dyn Fn(u16) -> String) -> String {
    let mut out = String::new();
    let mut pc = 0;
    while pc < code.len() {
        pc += decode_instruction(prefix, code, pc, literal, &mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(i: u16) -> String {
        format!("#{i}")
    }

    #[test]
    fn decodes_fixed_formats() {
        let code = [Op::AFrame as u8, 2, 1, Op::Lit as u8, 2, 0, Op::Return as u8];
        let text = disassemble("f", &code, &lit);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "f:0000 31 02 01 AFRAME 02 01");
        assert_eq!(lines[1], "f:0003 19 02 00 LIT 0002 ; #2");
        assert_eq!(lines[2], "f:0006 1e       RETURN");
    }

    #[test]
    fn decodes_switch_table() {
        let code = [Op::Switch as u8, 1, 0, 3, 0, 0x10, 0, 0x20, 0];
        let mut out = String::new();
        let n = decode_instruction("s", &code, 0, &lit, &mut out);
        assert_eq!(n, code.len());
        assert!(out.contains("0003 0010 ; #3"), "{out}");
        assert!(out.trim_end().ends_with("0020"), "{out}");
    }

    #[test]
    fn unknown_opcode_is_one_byte() {
        let mut out = String::new();
        assert_eq!(decode_instruction("x", &[0xee], 0, &lit, &mut out), 1);
        assert!(out.contains("<UNKNOWN>"));
    }
}
