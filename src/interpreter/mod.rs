//! The symbolic interpretation engine.
//!
//! The [`Interpreter`] walks a decoded instruction stream one instruction at
//! a time, threading an [`ExecutionState`] through per-opcode transition
//! rules. Before each transition, expired branch-tracking entries are
//! decayed for the instruction's offset; after an unconditional return the
//! run halts. The finished state — environments, stack residue, captured
//! calls, return value, loop detections — is the artifact handed to a
//! downstream solver.
//!
//! # Conditional-Path Tracking
//!
//! At any instruction, the conditions of the live [`Jump`] entries form the
//! conjunction currently assumed true on the modeled path, in encounter
//! order. Stores under active conditions merge into
//! [`AbstractValue::PossibleOutcomes`] nodes instead of replacing bindings;
//! conditional returns accumulate the same way and additionally inject the
//! complement of every live condition, so code following a conditional
//! return is modeled as reachable only when none of the prior returns fired.
//!
//! # Example
//!
//! ```rust
//! use pyscope::prelude::*;
//!
//! // a = 0; if b > 0: a = 1
//! let mut asm = StreamBuilder::new();
//! asm.load_const(Literal::Int(0)).store_name("a");
//! asm.load_name("b").load_const(Literal::Int(0)).compare_op(">");
//! asm.pop_jump_forward_if_false(16);
//! asm.load_const(Literal::Int(1)).store_name("a");
//! asm.jump_target().load_name("a").return_value();
//! let instructions = asm.finish();
//!
//! let mut interpreter = Interpreter::new(Vec::new());
//! interpreter.interpret(&instructions)?;
//!
//! let state = interpreter.state();
//! let a = state.name("a").expect("a is bound");
//! assert!(state.arena().is_possible_outcomes(a));
//! # Ok::<(), pyscope::Error>(())
//! ```

mod handlers;
mod loops;
mod observer;
mod state;
mod value;

#[cfg(test)]
mod tests;

pub use loops::{scan_loops, LoopDetection};
pub use observer::{InterpreterObserver, NullObserver};
pub use state::{ExecutionState, Jump, OrEntry, BUILTIN_NAMES};
pub use value::{
    AbstractObject, AbstractValue, LoopModification, LoopModificationKind, LoopSubject,
    ObjectDisplay, ObjectId, Outcome, ValueArena,
};

use crate::{
    bytecode::{Instruction, Literal, Opcode},
    Result,
};

/// Outcome of dispatching a single instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Proceed to the next instruction.
    Continue,

    /// Stop the run: an unconditional return was processed and no further
    /// instructions should be consumed.
    Halt,
}

/// The per-opcode dispatch loop.
///
/// An interpreter owns exactly one [`ExecutionState`]; construct it fresh
/// over a constant pool with [`new`](Self::new), or resume from an
/// externally supplied snapshot with [`from_state`](Self::from_state). The
/// state is exclusively owned by the in-flight run — a driver wanting to
/// explore branches concurrently forks snapshots and runs independent
/// sequential passes.
#[derive(Debug, Clone, PartialEq)]
pub struct Interpreter {
    state: ExecutionState,
}

impl Interpreter {
    /// Creates an interpreter with a fresh, analysis-ready state over the
    /// given constant pool.
    #[must_use]
    pub fn new(consts: Vec<Literal>) -> Self {
        Self {
            state: ExecutionState::new(consts),
        }
    }

    /// Creates an interpreter resuming from a previously extracted state.
    ///
    /// Snapshot/restore round-trips exactly:
    /// `Interpreter::from_state(s).into_state() == s`.
    #[must_use]
    pub const fn from_state(state: ExecutionState) -> Self {
        Self { state }
    }

    /// Returns the current state, read-only.
    #[must_use]
    pub const fn state(&self) -> &ExecutionState {
        &self.state
    }

    /// Consumes the interpreter and extracts its state.
    #[must_use]
    pub fn into_state(self) -> ExecutionState {
        self.state
    }

    /// Restores the empty, analysis-ready baseline (keeping the constant
    /// pool).
    pub fn reset(&mut self) {
        self.state.reset();
    }

    /// Runs the recognizer pre-pass and interprets a whole stream.
    ///
    /// Stops early when an unconditional return signals
    /// [`Step::Halt`]. The state is *not* reset first; call
    /// [`reset`](Self::reset) to reuse an interpreter across runs.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error encountered: stack underflow, operand
    /// shape mismatch, or a conflicting return (see [`crate::Error`]).
    pub fn run(
        &mut self,
        instructions: &[Instruction],
        observer: &mut dyn InterpreterObserver,
    ) -> Result<()> {
        for detection in scan_loops(instructions) {
            observer.loop_detected(&detection);
            self.state.loops_detected.push(detection);
        }

        for instruction in instructions {
            match self.step(instruction, observer)? {
                Step::Continue => {}
                Step::Halt => {
                    observer.halted(instruction.offset);
                    break;
                }
            }
        }
        Ok(())
    }

    /// Runs a whole stream with no observer attached.
    ///
    /// # Errors
    ///
    /// Same as [`run`](Self::run).
    pub fn interpret(&mut self, instructions: &[Instruction]) -> Result<()> {
        self.run(instructions, &mut NullObserver)
    }

    /// Dispatches a single instruction.
    ///
    /// Decays expired branch-tracking entries for the instruction's offset,
    /// then applies the opcode's transition rule. Opcodes without a rule
    /// take the permissive-skip path: no state change, one
    /// [`InterpreterObserver::unhandled_opcode`] report.
    ///
    /// # Errors
    ///
    /// Returns a fatal error on stack underflow, operand shape mismatch, or
    /// a conflicting return. A fatal error aborts only this run; the
    /// partially mutated state stays local to this interpreter.
    pub fn step(
        &mut self,
        instruction: &Instruction,
        observer: &mut dyn InterpreterObserver,
    ) -> Result<Step> {
        self.state.decay(instruction.offset);
        observer.instruction(instruction);

        match instruction.opcode {
            Opcode::Resume | Opcode::Nop | Opcode::Precall => Ok(Step::Continue),
            Opcode::PushNull => self.push_null(),
            Opcode::PopTop => self.pop_top(instruction),
            Opcode::ImportName => self.import_name(instruction),
            Opcode::LoadConst => self.load_const(instruction),
            Opcode::LoadName => self.load_name(instruction),
            Opcode::LoadFast => self.load_fast(instruction),
            Opcode::LoadAttr => self.load_attr(instruction),
            Opcode::StoreName => self.store_name(instruction),
            Opcode::StoreFast => self.store_fast(instruction),
            Opcode::StoreAttr => self.store_attr(instruction),
            Opcode::CompareOp => self.compare_op(instruction),
            Opcode::BinaryOp => self.binary_op(instruction),
            Opcode::UnaryNegative => self.unary_op(instruction, "-"),
            Opcode::UnaryNot => self.unary_op(instruction, "not"),
            Opcode::UnaryInvert => self.unary_op(instruction, "~"),
            Opcode::PopJumpForwardIfFalse => self.jump_if_false(instruction),
            Opcode::PopJumpForwardIfTrue => self.jump_if_true(instruction),
            Opcode::KwNames => self.record_kw_names(instruction),
            Opcode::Call => self.call(instruction),
            Opcode::ReturnValue => self.return_value(instruction),

            // Recognized vocabulary without a transition rule: permissive
            // skip, observable but never fatal.
            Opcode::PopJumpBackwardIfTrue
            | Opcode::JumpForward
            | Opcode::JumpBackward
            | Opcode::GetIter
            | Opcode::ForIter
            | Opcode::BinarySubscr
            | Opcode::BuildList
            | Opcode::MakeFunction
            | Opcode::Swap
            | Opcode::Copy => {
                observer.unhandled_opcode(instruction);
                Ok(Step::Continue)
            }
        }
    }
}
