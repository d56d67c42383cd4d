//! Two-pass assembler for breadboard programs.
//!
//! Syntax:
//! ```text
//! ; Comment
//! count = 3           ; Define a symbol
//! top:                ; Define a label
//!     LDA 14          ; Load from address 14
//!     ADD $0f         ; Hex operand
//!     JC  done        ; Jump to label
//!     JMP top
//! done: OUT           ; Label and statement on one line
//!     HLT
//!
//!     .org 14         ; Move to address 14
//!     .byte %11110010 ; Raw 8-bit value
//! ```
//!
//! Mnemonics and directives are case insensitive; labels and symbols are
//! not. Instruction operands are four bits wide and a value above 15 is an
//! error, never wrapped.

use crate::cpu::decode::{encode, Instruction, Opcode};
use crate::cpu::memory::MEMORY_SIZE;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{event, Level};

/// Assemble source code to a full memory image.
///
/// Cells not written by the program are zero.
pub fn assemble(source: &str) -> Result<[u8; MEMORY_SIZE], AssemblerError> {
    let mut asm = Assembler::new();
    asm.assemble(source)
}

/// A value as written in the source: a literal or a name to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Operand {
    Literal(u16),
    Symbol(String),
}

/// One statement that occupies memory.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Item {
    Instruction { opcode: Opcode, operand: Option<Operand> },
    Byte(u16),
}

#[derive(Debug, Clone)]
struct Statement {
    line: usize,
    addr: usize,
    item: Item,
}

/// The assembler state.
struct Assembler {
    /// Current address (origin).
    current_addr: usize,
    /// Symbol table (label or symbol -> value).
    symbols: HashMap<String, u16>,
    /// Statements collected by pass 1.
    statements: Vec<Statement>,
}

impl Assembler {
    fn new() -> Self {
        Self {
            current_addr: 0,
            symbols: HashMap::new(),
            statements: Vec::new(),
        }
    }

    fn assemble(&mut self, source: &str) -> Result<[u8; MEMORY_SIZE], AssemblerError> {
        // Pass 1: parse, bind labels and assign addresses
        for (line_num, line) in source.lines().enumerate() {
            self.process_line(line, line_num + 1)?;
        }

        // Pass 2: resolve names and encode
        let image = self.emit()?;
        event!(
            Level::DEBUG,
            "assembled {} statements, {} symbols",
            self.statements.len(),
            self.symbols.len()
        );
        Ok(image)
    }

    fn process_line(&mut self, line: &str, line_num: usize) -> Result<(), AssemblerError> {
        // Remove comments
        let line = match line.find(';') {
            Some(idx) => &line[..idx],
            None => line,
        };
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }

        // Symbol definition: name = value
        if let Some((name, value)) = line.split_once('=') {
            let name = name.trim();
            check_name(name, line_num)?;
            let value = parse_number(value.trim(), line_num)?;
            if value > 0xff {
                return Err(AssemblerError::ValueOutOfRange { line: line_num, value, max: 0xff });
            }
            return self.define(name, value, line_num);
        }

        // Label definition, optionally followed by a statement
        if let Some((label, rest)) = line.split_once(':') {
            let label = label.trim();
            check_name(label, line_num)?;
            self.define(label, self.current_addr as u16, line_num)?;

            let rest = rest.trim();
            if rest.contains(':') {
                return Err(AssemblerError::SyntaxError {
                    line: line_num,
                    message: "more than one label on a line".into(),
                });
            }
            if !rest.is_empty() {
                return self.process_statement(rest, line_num);
            }
            return Ok(());
        }

        self.process_statement(line, line_num)
    }

    fn process_statement(&mut self, line: &str, line_num: usize) -> Result<(), AssemblerError> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let (head, args) = match parts.split_first() {
            Some(split) => split,
            None => return Ok(()),
        };

        if let Some(directive) = head.strip_prefix('.') {
            return self.process_directive(directive, args, line_num);
        }

        let opcode = Opcode::from_mnemonic(head).ok_or_else(|| AssemblerError::UnknownMnemonic {
            line: line_num,
            mnemonic: head.to_string(),
        })?;

        let operand = match (opcode.takes_operand(), args) {
            (false, []) => None,
            (false, _) => {
                return Err(AssemblerError::SyntaxError {
                    line: line_num,
                    message: format!("{} takes no operand", opcode),
                });
            }
            (true, [arg]) => Some(parse_operand(arg, line_num)?),
            (true, _) => {
                return Err(AssemblerError::SyntaxError {
                    line: line_num,
                    message: format!("{} expects 1 operand, got {}", opcode, args.len()),
                });
            }
        };

        // Literals can be range-checked now; names wait for pass 2.
        if let Some(Operand::Literal(value)) = operand {
            if value > 0x0f {
                return Err(AssemblerError::ValueOutOfRange { line: line_num, value, max: 0x0f });
            }
        }

        self.push(Item::Instruction { opcode, operand }, line_num);
        Ok(())
    }

    fn process_directive(&mut self, directive: &str, args: &[&str], line_num: usize)
        -> Result<(), AssemblerError>
    {
        let value = match args {
            [arg] => parse_number(arg, line_num)?,
            _ => {
                return Err(AssemblerError::SyntaxError {
                    line: line_num,
                    message: format!(".{} expects 1 value, got {}", directive, args.len()),
                });
            }
        };
        if value > 0xff {
            return Err(AssemblerError::ValueOutOfRange { line: line_num, value, max: 0xff });
        }

        match directive.to_ascii_lowercase().as_str() {
            "org" => {
                self.current_addr = value as usize;
            }
            "byte" => {
                self.push(Item::Byte(value), line_num);
            }
            _ => {
                return Err(AssemblerError::UnknownDirective {
                    line: line_num,
                    directive: format!(".{}", directive),
                });
            }
        }
        Ok(())
    }

    fn define(&mut self, name: &str, value: u16, line_num: usize) -> Result<(), AssemblerError> {
        if self.symbols.contains_key(name) {
            return Err(AssemblerError::DuplicateSymbol { line: line_num, name: name.to_string() });
        }
        self.symbols.insert(name.to_string(), value);
        Ok(())
    }

    fn push(&mut self, item: Item, line_num: usize) {
        self.statements.push(Statement { line: line_num, addr: self.current_addr, item });
        self.current_addr += 1;
    }

    fn emit(&self) -> Result<[u8; MEMORY_SIZE], AssemblerError> {
        let mut image = [0u8; MEMORY_SIZE];
        let mut used = [false; MEMORY_SIZE];

        for stmt in &self.statements {
            if stmt.addr >= MEMORY_SIZE {
                return Err(AssemblerError::ProgramTooLarge { line: stmt.line });
            }
            if used[stmt.addr] {
                return Err(AssemblerError::AddressConflict { line: stmt.line, addr: stmt.addr });
            }
            used[stmt.addr] = true;

            image[stmt.addr] = match &stmt.item {
                Item::Byte(value) => *value as u8,
                Item::Instruction { opcode, operand } => {
                    let value = match operand {
                        None => 0,
                        Some(op) => self.resolve(op, stmt.line)?,
                    };
                    encode(&Instruction::new(*opcode, value as u8))
                }
            };
        }

        Ok(image)
    }

    fn resolve(&self, operand: &Operand, line_num: usize) -> Result<u16, AssemblerError> {
        let value = match operand {
            Operand::Literal(value) => *value,
            Operand::Symbol(name) => *self.symbols.get(name).ok_or_else(|| {
                AssemblerError::UndefinedSymbol { line: line_num, name: name.clone() }
            })?,
        };
        if value > 0x0f {
            return Err(AssemblerError::ValueOutOfRange { line: line_num, value, max: 0x0f });
        }
        Ok(value)
    }
}

fn parse_operand(text: &str, line_num: usize) -> Result<Operand, AssemblerError> {
    match text.chars().next() {
        Some(c) if c == '$' || c == '%' || c.is_ascii_digit() => {
            Ok(Operand::Literal(parse_number(text, line_num)?))
        }
        _ => {
            check_name(text, line_num)?;
            Ok(Operand::Symbol(text.to_string()))
        }
    }
}

/// Parse `15`, `$0f` or `%1111`.
fn parse_number(text: &str, line_num: usize) -> Result<u16, AssemblerError> {
    let (digits, radix) = if let Some(hex) = text.strip_prefix('$') {
        (hex, 16)
    } else if let Some(bin) = text.strip_prefix('%') {
        (bin, 2)
    } else {
        (text, 10)
    };

    u16::from_str_radix(digits, radix).map_err(|e| AssemblerError::SyntaxError {
        line: line_num,
        message: format!("invalid number '{}': {}", text, e),
    })
}

/// Names may not be empty, start with a digit or contain reserved characters.
fn check_name(name: &str, line_num: usize) -> Result<(), AssemblerError> {
    let bad = |message: String| AssemblerError::SyntaxError { line: line_num, message };

    let first = name.chars().next().ok_or_else(|| bad("missing name".into()))?;
    if first.is_ascii_digit() {
        return Err(bad(format!("name '{}' starts with a digit", name)));
    }
    if let Some(c) = name
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || "$%#.;=:".contains(*c))
    {
        return Err(bad(format!("illegal character {:?} in name '{}'", c, name)));
    }
    Ok(())
}

/// Errors that can occur during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerError {
    #[error("syntax error on line {line}: {message}")]
    SyntaxError { line: usize, message: String },

    #[error("unknown mnemonic on line {line}: {mnemonic}")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("unknown directive on line {line}: {directive}")]
    UnknownDirective { line: usize, directive: String },

    #[error("undefined symbol on line {line}: {name}")]
    UndefinedSymbol { line: usize, name: String },

    #[error("duplicate symbol on line {line}: {name}")]
    DuplicateSymbol { line: usize, name: String },

    #[error("value out of range on line {line}: {value} (max {max})")]
    ValueOutOfRange { line: usize, value: u16, max: u16 },

    #[error("program exceeds 16 bytes on line {line}")]
    ProgramTooLarge { line: usize },

    #[error("address conflict on line {line}: address {addr} already written, check .org directives")]
    AddressConflict { line: usize, addr: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_simple() {
        let source = r#"
            ; Simple test program
            LDA 14
            ADD 15
            OUT
            HLT
        "#;

        let image = assemble(source).unwrap();
        assert_eq!(image[..4], [0x1e, 0x2f, 0xe0, 0xf0]);
        assert!(image[4..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_assemble_with_labels() {
        let source = r#"
        start:
            add adder
            jc complete
            jmp start
        complete:
            out
            hlt
            .org 14
        adder:
            .byte 33
        "#;

        let image = assemble(source).unwrap();
        assert_eq!(image[..5], [0x2e, 0x73, 0x60, 0xe0, 0xf0]);
        assert_eq!(image[14], 33);
    }

    #[test]
    fn test_number_formats() {
        let image = assemble("ldi 15\nldi $0f\nldi %1111\n.byte $f2").unwrap();
        assert_eq!(image[..4], [0x5f, 0x5f, 0x5f, 0xf2]);
    }

    #[test]
    fn test_symbols_and_inline_labels() {
        let source = "
            limit = 9
            loop: ldi limit
                  jmp loop
        ";
        let image = assemble(source).unwrap();
        assert_eq!(image[..2], [0x59, 0x60]);
    }

    #[test]
    fn test_immediate_above_15_rejected() {
        let err = assemble("ldi 16").unwrap_err();
        assert_eq!(err, AssemblerError::ValueOutOfRange { line: 1, value: 16, max: 15 });

        let err = assemble("  ldi $0f\n  lda $1f").unwrap_err();
        assert!(matches!(err, AssemblerError::ValueOutOfRange { line: 2, .. }));
    }

    #[test]
    fn test_symbol_above_15_rejected() {
        let err = assemble("big = 200\n lda big").unwrap_err();
        assert_eq!(err, AssemblerError::ValueOutOfRange { line: 2, value: 200, max: 15 });
    }

    #[test]
    fn test_byte_above_255_rejected() {
        let err = assemble(".byte 256").unwrap_err();
        assert!(matches!(err, AssemblerError::ValueOutOfRange { value: 256, max: 255, .. }));
    }

    #[test]
    fn test_program_too_large() {
        let source = "nop\n".repeat(17);
        let err = assemble(&source).unwrap_err();
        assert_eq!(err, AssemblerError::ProgramTooLarge { line: 17 });

        assert!(assemble(&"nop\n".repeat(16)).is_ok());
    }

    #[test]
    fn test_address_conflict() {
        let err = assemble("nop\nnop\n.org 1\nhlt").unwrap_err();
        assert_eq!(err, AssemblerError::AddressConflict { line: 4, addr: 1 });
    }

    #[test]
    fn test_name_errors() {
        assert!(matches!(
            assemble("jmp nowhere").unwrap_err(),
            AssemblerError::UndefinedSymbol { line: 1, .. }
        ));
        assert!(matches!(
            assemble("a:\na:").unwrap_err(),
            AssemblerError::DuplicateSymbol { line: 2, .. }
        ));
        assert!(matches!(
            assemble("Top:\njmp top").unwrap_err(),
            AssemblerError::UndefinedSymbol { line: 2, .. }
        ));
    }

    #[test]
    fn test_operand_count_errors() {
        assert!(matches!(assemble("hlt 3").unwrap_err(), AssemblerError::SyntaxError { .. }));
        assert!(matches!(assemble("lda").unwrap_err(), AssemblerError::SyntaxError { .. }));
        assert!(matches!(assemble("lda 1 2").unwrap_err(), AssemblerError::SyntaxError { .. }));
    }

    #[test]
    fn test_unknown_words() {
        assert!(matches!(
            assemble("mul 3").unwrap_err(),
            AssemblerError::UnknownMnemonic { line: 1, .. }
        ));
        assert!(matches!(
            assemble(".word 3").unwrap_err(),
            AssemblerError::UnknownDirective { line: 1, .. }
        ));
    }
}
