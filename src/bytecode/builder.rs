//! Hand-assembly of decoded instruction streams.
//!
//! Real streams come from an external decoder; tests, benchmarks, and small
//! drivers build them directly with [`StreamBuilder`]. The builder emits
//! instructions at the fixed two-unit stride the host disassembler uses and
//! takes care of the jump-target flag.

use crate::bytecode::{Instruction, Literal, Opcode, Operand};

/// Offset distance between consecutive instructions.
const INSTRUCTION_STRIDE: u32 = 2;

/// Builder for decoded instruction streams.
///
/// Offsets are assigned automatically, two units apart, matching the host
/// code unit size. Call [`jump_target`](Self::jump_target) before an emit to
/// mark the next instruction as a branch destination.
///
/// # Example
///
/// ```rust
/// use pyscope::bytecode::{Literal, StreamBuilder};
///
/// // a = 0; if b > 0: a = 1
/// let mut asm = StreamBuilder::new();
/// asm.load_const(Literal::Int(0)).store_name("a");
/// asm.load_name("b").load_const(Literal::Int(0)).compare_op(">");
/// let body_end = asm.next_offset() + 3 * 2;
/// asm.pop_jump_forward_if_false(body_end);
/// asm.load_const(Literal::Int(1)).store_name("a");
/// asm.jump_target().load_name("a");
/// let instructions = asm.finish();
/// assert_eq!(instructions.len(), 9);
/// assert!(instructions[8].is_jump_target);
/// ```
#[derive(Debug, Default)]
pub struct StreamBuilder {
    instructions: Vec<Instruction>,
    next_offset: u32,
    mark_next: bool,
}

impl StreamBuilder {
    /// Creates an empty builder starting at offset zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the offset the next emitted instruction will receive.
    #[must_use]
    pub const fn next_offset(&self) -> u32 {
        self.next_offset
    }

    /// Marks the next emitted instruction as a jump target.
    pub fn jump_target(&mut self) -> &mut Self {
        self.mark_next = true;
        self
    }

    /// Emits one instruction with an explicit opcode and operand.
    pub fn emit(&mut self, opcode: Opcode, operand: Operand) -> &mut Self {
        let mut instruction = Instruction::new(opcode, operand, self.next_offset);
        if self.mark_next {
            instruction = instruction.as_jump_target();
            self.mark_next = false;
        }
        self.instructions.push(instruction);
        self.next_offset += INSTRUCTION_STRIDE;
        self
    }

    /// Emits an operand-less instruction.
    pub fn op(&mut self, opcode: Opcode) -> &mut Self {
        self.emit(opcode, Operand::None)
    }

    /// Emits `RESUME`.
    pub fn resume(&mut self) -> &mut Self {
        self.op(Opcode::Resume)
    }

    /// Emits `PUSH_NULL`.
    pub fn push_null(&mut self) -> &mut Self {
        self.op(Opcode::PushNull)
    }

    /// Emits `POP_TOP`.
    pub fn pop_top(&mut self) -> &mut Self {
        self.op(Opcode::PopTop)
    }

    /// Emits `IMPORT_NAME name`.
    pub fn import_name(&mut self, name: &str) -> &mut Self {
        self.emit(Opcode::ImportName, Operand::Name(name.to_string()))
    }

    /// Emits `LOAD_CONST` with a resolved literal.
    pub fn load_const(&mut self, literal: Literal) -> &mut Self {
        self.emit(Opcode::LoadConst, Operand::Literal(literal))
    }

    /// Emits `LOAD_NAME name`.
    pub fn load_name(&mut self, name: &str) -> &mut Self {
        self.emit(Opcode::LoadName, Operand::Name(name.to_string()))
    }

    /// Emits `LOAD_FAST name`.
    pub fn load_fast(&mut self, name: &str) -> &mut Self {
        self.emit(Opcode::LoadFast, Operand::Name(name.to_string()))
    }

    /// Emits `LOAD_ATTR name`.
    pub fn load_attr(&mut self, name: &str) -> &mut Self {
        self.emit(Opcode::LoadAttr, Operand::Name(name.to_string()))
    }

    /// Emits `STORE_NAME name`.
    pub fn store_name(&mut self, name: &str) -> &mut Self {
        self.emit(Opcode::StoreName, Operand::Name(name.to_string()))
    }

    /// Emits `STORE_FAST name`.
    pub fn store_fast(&mut self, name: &str) -> &mut Self {
        self.emit(Opcode::StoreFast, Operand::Name(name.to_string()))
    }

    /// Emits `STORE_ATTR name`.
    pub fn store_attr(&mut self, name: &str) -> &mut Self {
        self.emit(Opcode::StoreAttr, Operand::Name(name.to_string()))
    }

    /// Emits `COMPARE_OP` with the comparison spelling (`">"`, `"=="`, ...).
    pub fn compare_op(&mut self, op: &str) -> &mut Self {
        self.emit(Opcode::CompareOp, Operand::Name(op.to_string()))
    }

    /// Emits `BINARY_OP` with the operator spelling (`"+"`, `"%"`, ...).
    pub fn binary_op(&mut self, op: &str) -> &mut Self {
        self.emit(Opcode::BinaryOp, Operand::Name(op.to_string()))
    }

    /// Emits `UNARY_NEGATIVE`.
    pub fn unary_negative(&mut self) -> &mut Self {
        self.op(Opcode::UnaryNegative)
    }

    /// Emits `UNARY_NOT`.
    pub fn unary_not(&mut self) -> &mut Self {
        self.op(Opcode::UnaryNot)
    }

    /// Emits `UNARY_INVERT`.
    pub fn unary_invert(&mut self) -> &mut Self {
        self.op(Opcode::UnaryInvert)
    }

    /// Emits `POP_JUMP_FORWARD_IF_FALSE` skipping to `destination`.
    pub fn pop_jump_forward_if_false(&mut self, destination: u32) -> &mut Self {
        self.emit(Opcode::PopJumpForwardIfFalse, Operand::Target(destination))
    }

    /// Emits `POP_JUMP_FORWARD_IF_TRUE` skipping to `end`.
    pub fn pop_jump_forward_if_true(&mut self, end: u32) -> &mut Self {
        self.emit(Opcode::PopJumpForwardIfTrue, Operand::Target(end))
    }

    /// Emits `POP_JUMP_BACKWARD_IF_TRUE` looping back to `destination`.
    pub fn pop_jump_backward_if_true(&mut self, destination: u32) -> &mut Self {
        self.emit(Opcode::PopJumpBackwardIfTrue, Operand::Target(destination))
    }

    /// Emits `PRECALL count`.
    pub fn precall(&mut self, count: u32) -> &mut Self {
        self.emit(Opcode::Precall, Operand::Count(count))
    }

    /// Emits `KW_NAMES` with the keyword argument-slot indices.
    pub fn kw_names(&mut self, indices: &[u32]) -> &mut Self {
        self.emit(Opcode::KwNames, Operand::Indices(indices.to_vec()))
    }

    /// Emits `CALL count`.
    pub fn call(&mut self, count: u32) -> &mut Self {
        self.emit(Opcode::Call, Operand::Count(count))
    }

    /// Emits `RETURN_VALUE`.
    pub fn return_value(&mut self) -> &mut Self {
        self.op(Opcode::ReturnValue)
    }

    /// Consumes the builder state and returns the assembled stream.
    #[must_use]
    pub fn finish(&mut self) -> Vec<Instruction> {
        self.next_offset = 0;
        self.mark_next = false;
        std::mem::take(&mut self.instructions)
    }
}
