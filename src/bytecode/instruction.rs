//! Decoded instruction records and operand shapes.

use std::fmt;

use crate::bytecode::{Literal, Opcode};

/// The decoded argument of an instruction.
///
/// The shape depends on the opcode: name-addressed opcodes carry a
/// [`Operand::Name`], `LOAD_CONST` carries the resolved [`Operand::Literal`],
/// jump opcodes carry a [`Operand::Target`] offset, `CALL` carries an
/// argument [`Operand::Count`], and `KW_NAMES` carries the
/// [`Operand::Indices`] of the keyword argument slots. The typed accessors
/// return `None` on shape mismatch; the interpreter turns that into
/// [`Error::InvalidOperand`](crate::Error::InvalidOperand).
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// No argument.
    None,

    /// A name resolved from the name table (global, local, attribute,
    /// module, or operator spelling).
    Name(String),

    /// A literal resolved from the constant pool.
    Literal(Literal),

    /// A jump destination, as an instruction offset.
    Target(u32),

    /// A small integer count (e.g. number of call arguments).
    Count(u32),

    /// A set of argument-slot indices (keyword-argument marker).
    Indices(Vec<u32>),
}

impl Operand {
    /// Returns the operand as a name, if it is one.
    #[must_use]
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            _ => None,
        }
    }

    /// Returns the operand as a literal, if it is one.
    #[must_use]
    pub const fn as_literal(&self) -> Option<&Literal> {
        match self {
            Self::Literal(literal) => Some(literal),
            _ => None,
        }
    }

    /// Returns the operand as a jump target offset, if it is one.
    #[must_use]
    pub const fn as_target(&self) -> Option<u32> {
        match self {
            Self::Target(offset) => Some(*offset),
            _ => None,
        }
    }

    /// Returns the operand as an argument count, if it is one.
    #[must_use]
    pub const fn as_count(&self) -> Option<u32> {
        match self {
            Self::Count(count) => Some(*count),
            _ => None,
        }
    }

    /// Returns the operand as a slice of argument-slot indices, if it is one.
    #[must_use]
    pub fn as_indices(&self) -> Option<&[u32]> {
        match self {
            Self::Indices(indices) => Some(indices),
            _ => None,
        }
    }
}

/// One decoded instruction as handed over by the instruction-stream decoder.
///
/// Instructions are plain records: the interpreter never re-decodes bytes, it
/// consumes the opcode tag, the decoded operand, the raw offset (used for
/// branch-tracking decay), and the jump-target flag (used by the loop
/// boundary recognizer).
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// The operation tag.
    pub opcode: Opcode,

    /// The decoded argument.
    pub operand: Operand,

    /// Raw byte/word offset of this instruction within the stream.
    pub offset: u32,

    /// Whether some other instruction jumps to this offset.
    pub is_jump_target: bool,
}

impl Instruction {
    /// Creates a new instruction record that is not a jump target.
    #[must_use]
    pub const fn new(opcode: Opcode, operand: Operand, offset: u32) -> Self {
        Self {
            opcode,
            operand,
            offset,
            is_jump_target: false,
        }
    }

    /// Marks this instruction as a jump target.
    #[must_use]
    pub fn as_jump_target(mut self) -> Self {
        self.is_jump_target = true;
        self
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>6} {}", self.offset, self.opcode)?;
        match &self.operand {
            Operand::None => Ok(()),
            Operand::Name(name) => write!(f, " {name}"),
            Operand::Literal(literal) => write!(f, " {literal}"),
            Operand::Target(target) => write!(f, " -> {target}"),
            Operand::Count(count) => write!(f, " {count}"),
            Operand::Indices(indices) => write!(f, " {indices:?}"),
        }
    }
}
