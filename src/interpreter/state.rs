//! Per-run execution state.
//!
//! [`ExecutionState`] bundles everything one analysis run mutates: the value
//! arena, the two name environments, the operand stack, the branch-tracking
//! structures, captured call sites, and the accumulated return value. A
//! fresh state is seeded with the fixed built-in name table; `reset()`
//! restores that baseline. The state is a pure value — cloning it yields a
//! snapshot sharing no mutable substructure, which is the seam a driver uses
//! to fork analysis per branch.

use std::collections::HashMap;

use crate::{
    bytecode::{Instruction, Literal},
    interpreter::{
        loops::LoopDetection,
        value::{AbstractValue, ObjectId, ValueArena},
    },
    Error, Result,
};

/// The fixed table of recognized global built-in names.
///
/// Each seeds a fresh state's global environment with a
/// [`AbstractValue::BuiltIn`] binding.
pub const BUILTIN_NAMES: &[&str] = &[
    "abs",
    "aiter",
    "all",
    "any",
    "anext",
    "ascii",
    "bin",
    "bool",
    "breakpoint",
    "bytearray",
    "bytes",
    "callable",
    "chr",
    "classmethod",
    "compile",
    "complex",
    "print",
];

/// An active conditional branch.
///
/// Created when a conditional forward skip is processed; its condition
/// guards every store and return until the current offset passes
/// `destination`. Entries with no destination (`None`) model the original
/// return-path complement conditions and never decay by offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Jump {
    /// The condition assumed true while this entry is live.
    pub condition: ObjectId,

    /// The offset the branch skips to, or `None` for "no forward bound".
    pub destination: Option<u32>,
}

impl Jump {
    /// Creates a jump expiring once the current offset passes `destination`.
    #[must_use]
    pub const fn bounded(condition: ObjectId, destination: u32) -> Self {
        Self {
            condition,
            destination: Some(destination),
        }
    }

    /// Creates a jump that never decays by offset.
    #[must_use]
    pub const fn unbounded(condition: ObjectId) -> Self {
        Self {
            condition,
            destination: None,
        }
    }
}

/// A pending short-circuit `or` term awaiting combination.
///
/// Created by a conditional skip-on-true; folded into the next
/// skip-on-false's condition, or expired once the current offset passes
/// `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrEntry {
    /// The pending partial condition.
    pub condition: ObjectId,

    /// Offset at which the short-circuit expression's evaluation completes.
    pub end: u32,
}

/// The mutable bundle threaded through a single analysis run.
///
/// Finalized (read-only) once interpretation halts; the accessors expose the
/// output surface handed to a downstream solver. Structural equality and
/// `Clone` make the snapshot/restore round-trip exact.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExecutionState {
    pub(crate) arena: ValueArena,
    pub(crate) consts: Vec<Literal>,
    pub(crate) names: HashMap<String, ObjectId>,
    pub(crate) fast_names: HashMap<String, ObjectId>,
    pub(crate) stack: Vec<ObjectId>,
    pub(crate) active_jumps: Vec<Jump>,
    pub(crate) or_stack: Vec<OrEntry>,
    pub(crate) calls: Vec<ObjectId>,
    pub(crate) kw_names: Vec<u32>,
    pub(crate) return_value: Option<ObjectId>,
    pub(crate) loops_detected: Vec<LoopDetection>,
}

impl ExecutionState {
    /// Creates an analysis-ready state over the given constant pool.
    ///
    /// The global environment is pre-populated with [`BUILTIN_NAMES`].
    #[must_use]
    pub fn new(consts: Vec<Literal>) -> Self {
        let mut state = Self {
            consts,
            ..Self::default()
        };
        for &name in BUILTIN_NAMES {
            let id = state.arena.alloc(AbstractValue::BuiltIn {
                name: name.to_string(),
            });
            state.names.insert(name.to_string(), id);
        }
        state
    }

    /// Restores the empty, analysis-ready baseline.
    ///
    /// Everything accumulated by a run is discarded; the constant pool is
    /// kept, since it is decoder input rather than run state. Calling
    /// `reset` twice in a row produces structurally identical states.
    pub fn reset(&mut self) {
        *self = Self::new(std::mem::take(&mut self.consts));
    }

    /// Returns the value arena.
    #[must_use]
    pub const fn arena(&self) -> &ValueArena {
        &self.arena
    }

    /// Returns the constant pool supplied at construction.
    #[must_use]
    pub fn consts(&self) -> &[Literal] {
        &self.consts
    }

    /// Returns the global-like name environment.
    #[must_use]
    pub const fn names(&self) -> &HashMap<String, ObjectId> {
        &self.names
    }

    /// Returns the local-like name environment.
    #[must_use]
    pub const fn fast_names(&self) -> &HashMap<String, ObjectId> {
        &self.fast_names
    }

    /// Returns the binding of a global-like name, if any.
    #[must_use]
    pub fn name(&self, name: &str) -> Option<ObjectId> {
        self.names.get(name).copied()
    }

    /// Returns the binding of a local-like name, if any.
    #[must_use]
    pub fn fast_name(&self, name: &str) -> Option<ObjectId> {
        self.fast_names.get(name).copied()
    }

    /// Returns the operand stack residue, bottom first.
    #[must_use]
    pub fn stack(&self) -> &[ObjectId] {
        &self.stack
    }

    /// Returns the live conditional branches.
    #[must_use]
    pub fn active_jumps(&self) -> &[Jump] {
        &self.active_jumps
    }

    /// Returns the pending short-circuit terms.
    #[must_use]
    pub fn or_stack(&self) -> &[OrEntry] {
        &self.or_stack
    }

    /// Returns the captured call sites, in capture order.
    ///
    /// Each element is a [`AbstractValue::PossibleOutcomes`] keyed by the
    /// conditions that were active at the call.
    #[must_use]
    pub fn calls(&self) -> &[ObjectId] {
        &self.calls
    }

    /// Returns the pending keyword-argument slot indices for the next call.
    #[must_use]
    pub fn kw_names(&self) -> &[u32] {
        &self.kw_names
    }

    /// Returns the accumulated return value, if any.
    #[must_use]
    pub const fn return_value(&self) -> Option<ObjectId> {
        self.return_value
    }

    /// Returns the loop boundaries located by the recognizer pre-pass.
    #[must_use]
    pub fn loops_detected(&self) -> &[LoopDetection] {
        &self.loops_detected
    }

    /// Removes expired branch-tracking entries for the given offset.
    ///
    /// An active jump whose destination is strictly less than `offset` is
    /// dropped (entries with no bound never are); a pending `or` term whose
    /// end is strictly less than `offset` is dropped. Runs unconditionally
    /// before every instruction's transition, so an entry is live for every
    /// processed offset up to and including its destination.
    pub(crate) fn decay(&mut self, offset: u32) {
        self.active_jumps
            .retain(|jump| match jump.destination {
                Some(destination) => offset <= destination,
                None => true,
            });
        self.or_stack.retain(|entry| offset <= entry.end);
    }

    /// Returns the conjunction of currently assumed conditions, in the order
    /// they were encountered.
    #[must_use]
    pub(crate) fn active_conditions(&self) -> Vec<ObjectId> {
        self.active_jumps.iter().map(|jump| jump.condition).collect()
    }

    /// Pops the top of the operand stack.
    pub(crate) fn pop(&mut self, instruction: &Instruction) -> Result<ObjectId> {
        self.stack.pop().ok_or(Error::StackUnderflow {
            offset: instruction.offset,
            opcode: instruction.opcode,
        })
    }
}
