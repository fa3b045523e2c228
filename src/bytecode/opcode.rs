//! The instruction-set vocabulary consumed by the interpreter.
//!
//! Opcode tags follow the CPython 3.11 disassembler mnemonics. The set is
//! deliberately not a complete rendition of the host instruction set:
//! supporting every opcode is a non-goal, and members without a transition
//! rule take the interpreter's permissive-skip path. The vocabulary is a
//! closed enum so that adding a member forces every dispatch site to be
//! revisited.

use strum::{Display, EnumString, IntoStaticStr};

/// One operation tag in the host virtual machine's instruction set.
///
/// The display form is the decoder's mnemonic, e.g.
/// `Opcode::LoadConst.to_string() == "LOAD_CONST"`, and [`std::str::FromStr`]
/// accepts the same spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Opcode {
    /// Function-entry marker; no effect on the abstract state.
    Resume,
    /// Pushes the callee-slot marker before a call sequence.
    PushNull,
    /// Pops and discards the top of the operand stack.
    PopTop,
    /// Explicit no-op.
    Nop,
    /// Imports a module by name and pushes it.
    ImportName,
    /// Pushes a value from the constant pool.
    LoadConst,
    /// Pushes the binding of a global-like name.
    LoadName,
    /// Pushes the binding of a local-like name.
    LoadFast,
    /// Pops a base object and pushes one of its attributes.
    LoadAttr,
    /// Pops a value and binds it to a global-like name.
    StoreName,
    /// Pops a value and binds it to a local-like name.
    StoreFast,
    /// Pops a target and a value and records an attribute write.
    StoreAttr,
    /// Pops two operands and pushes a comparison expression.
    CompareOp,
    /// Pops two operands and pushes a binary-operator expression.
    BinaryOp,
    /// Pops one operand and pushes its arithmetic negation.
    UnaryNegative,
    /// Pops one operand and pushes its boolean negation.
    UnaryNot,
    /// Pops one operand and pushes its bitwise inversion.
    UnaryInvert,
    /// Conditional forward skip taken when the popped condition is falsy.
    PopJumpForwardIfFalse,
    /// Conditional forward skip taken when the popped condition is truthy
    /// (short-circuit `or` continuation).
    PopJumpForwardIfTrue,
    /// Conditional backward skip closing a loop body.
    PopJumpBackwardIfTrue,
    /// Unconditional forward jump.
    JumpForward,
    /// Unconditional backward jump.
    JumpBackward,
    /// Pops an iterable and pushes its iterator.
    GetIter,
    /// Advances an iterator or skips past the loop body.
    ForIter,
    /// Pops a container and an index and pushes the element.
    BinarySubscr,
    /// Pops elements and pushes a freshly built list.
    BuildList,
    /// Builds a function object from a code constant.
    MakeFunction,
    /// Swaps the top of stack with a deeper slot.
    Swap,
    /// Duplicates a stack slot onto the top of stack.
    Copy,
    /// Call-setup marker preceding `CALL`; no effect on the abstract state.
    Precall,
    /// Records which argument slots of the next call are keyword arguments.
    KwNames,
    /// Pops arguments and a callee and captures the call site.
    Call,
    /// Pops the return value and records it, conditionally or finally.
    ReturnValue,
}

impl Opcode {
    /// Returns `true` for the conditional forward skip that opens a guarded
    /// region (branch taken when the condition is falsy).
    #[must_use]
    pub const fn is_forward_guard(&self) -> bool {
        matches!(self, Self::PopJumpForwardIfFalse)
    }

    /// Returns `true` for opcodes that transfer control backward.
    #[must_use]
    pub const fn is_backward_jump(&self) -> bool {
        matches!(self, Self::PopJumpBackwardIfTrue | Self::JumpBackward)
    }

    /// Returns `true` for opcodes that bind a popped value into one of the
    /// two name environments.
    #[must_use]
    pub const fn is_name_store(&self) -> bool {
        matches!(self, Self::StoreName | Self::StoreFast)
    }
}
