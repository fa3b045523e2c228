//! Curated re-exports of the most commonly used types and traits.

pub use crate::bytecode::{Instruction, Literal, Opcode, Operand, StreamBuilder};
pub use crate::interpreter::{
    scan_loops, AbstractObject, AbstractValue, ExecutionState, Interpreter, InterpreterObserver,
    Jump, LoopDetection, NullObserver, ObjectId, OrEntry, Outcome, Step, ValueArena,
};
pub use crate::solver::Solver;
pub use crate::{Error, Result};
