//! Disassembler for breadboard programs.
//!
//! Converts memory images back to readable assembly.

use crate::cpu::decode::{decode, Opcode};

/// Disassemble a single byte to text.
///
/// Every byte is also a plausible data value; the listing does not guess
/// which cells are code.
pub fn disassemble_byte(byte: u8) -> String {
    let instr = decode(byte);
    match instr.opcode {
        Opcode::Undefined(_) => format!("??? ${:02x}", byte),
        op if op.takes_operand() => format!("{} {}", op, instr.operand),
        op if instr.operand != 0 => format!("{} ; operand {} ignored", op, instr.operand),
        op => op.to_string(),
    }
}

/// Listing form of a byte: a mnemonic when it reassembles to the same byte,
/// otherwise a `.byte` with the mnemonic as a comment.
fn listing_text(byte: u8) -> String {
    let instr = decode(byte);
    let exact = match instr.opcode {
        Opcode::Undefined(_) => false,
        op => op.takes_operand() || instr.operand == 0,
    };

    if exact {
        disassemble_byte(byte)
    } else {
        format!(".byte ${:02x} ; {}", byte, disassemble_byte(byte))
    }
}

/// Disassemble a memory image.
///
/// The listing reassembles to the same image, data cells included.
pub fn disassemble(bytes: &[u8]) -> String {
    let mut output = String::new();
    output.push_str("; Breadboard Disassembly\n");
    output.push_str("; ----------------------\n\n");

    for (addr, byte) in bytes.iter().enumerate() {
        let line = listing_text(*byte);
        output.push_str(&format!("{:02}: ${:02x}  {}\n", addr, byte, line));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm::assemble;

    #[test]
    fn test_disassemble_byte() {
        assert_eq!(disassemble_byte(0x1e), "LDA 14");
        assert_eq!(disassemble_byte(0x5f), "LDI 15");
        assert_eq!(disassemble_byte(0xe0), "OUT");
        assert_eq!(disassemble_byte(0xf0), "HLT");
        assert_eq!(disassemble_byte(0x00), "NOP");
        assert_eq!(disassemble_byte(0x9f), "??? $9f");
        assert_eq!(disassemble_byte(0xe3), "OUT ; operand 3 ignored");
    }

    #[test]
    fn test_listing_reassembles() {
        let image = assemble("lda 14\nadd 15\njc 0\nout\nhlt").unwrap();
        let listing = disassemble(&image[..5]);

        let source: String = listing
            .lines()
            .filter_map(|l| l.split_once("  ").map(|(_, text)| text))
            .collect::<Vec<_>>()
            .join("\n");
        assert_eq!(assemble(&source).unwrap(), image);
    }

    #[test]
    fn test_listing_keeps_data_cells() {
        let mut image = assemble("lda 14\nout\nhlt").unwrap();
        image[3] = 0x01;
        image[4] = 0x9f;
        image[5] = 0xe3;
        image[15] = 0xff;

        let listing = disassemble(&image);
        assert!(listing.contains("03: $01  .byte $01 ; NOP ; operand 1 ignored"));
        assert!(listing.contains("04: $9f  .byte $9f ; ??? $9f"));

        let source: String = listing
            .lines()
            .filter_map(|l| l.split_once("  ").map(|(_, text)| text))
            .collect::<Vec<_>>()
            .join("\n");
        assert_eq!(assemble(&source).unwrap(), image);
    }

    #[test]
    fn test_listing_addresses() {
        let listing = disassemble(&[0x51, 0xf0]);
        assert!(listing.contains("00: $51  LDI 1"));
        assert!(listing.contains("01: $f0  HLT"));
    }
}
