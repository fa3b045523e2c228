//! Instruction model for decoded CPython bytecode.
//!
//! The interpreter does not decode raw code objects itself; that is the job
//! of an external decoder. This module pins down the boundary contract: an
//! ordered sequence of [`Instruction`] records, each exposing an [`Opcode`]
//! from a fixed, versioned vocabulary, a decoded [`Operand`], the raw
//! byte/word offset, and a flag marking whether the offset is a jump target.
//! The function's constant pool is an ordered sequence of [`Literal`] values
//! supplied at interpreter construction.
//!
//! # Key Types
//! - [`Opcode`] - The instruction-set vocabulary (CPython 3.11 flavored)
//! - [`Operand`] - Decoded argument shapes (name, literal, target, count, ...)
//! - [`Literal`] - Opaque constant-pool values
//! - [`Instruction`] - One decoded instruction record
//! - [`StreamBuilder`] - Hand-assembly of instruction streams
//!
//! # Example
//! ```rust
//! use pyscope::bytecode::{Literal, Opcode, StreamBuilder};
//!
//! let instructions = StreamBuilder::new()
//!     .load_const(Literal::Int(1))
//!     .store_name("x")
//!     .finish();
//!
//! assert_eq!(instructions[0].opcode, Opcode::LoadConst);
//! assert_eq!(instructions[1].offset, 2);
//! ```

mod builder;
mod instruction;
mod literal;
mod opcode;

pub use builder::StreamBuilder;
pub use instruction::{Instruction, Operand};
pub use literal::Literal;
pub use opcode::Opcode;
