//! Dispatch contract for downstream consumers of the value graph.
//!
//! Once a run finishes, the [`ExecutionState`] is handed to a solver — a
//! component that turns the produced value graph into higher-level facts
//! (constraint solving, taint propagation, signature recovery, ...). The
//! core defines only the dispatch shape: one handler per
//! [`AbstractValue`] variant, each invoked with the object, an arbitrary
//! external accumulator, and the originating state. Handler bodies are the
//! consumer's business; every default is a no-op.
//!
//! # Example
//!
//! ```rust
//! use pyscope::interpreter::{AbstractValue, ExecutionState, ObjectId};
//! use pyscope::solver::Solver;
//!
//! /// Collects the names of all captured callees.
//! struct CalleeNames;
//!
//! impl Solver for CalleeNames {
//!     type Acc = Vec<String>;
//!
//!     fn solve_call(&mut self, object: ObjectId, acc: &mut Self::Acc, state: &ExecutionState) {
//!         if let AbstractValue::Call { callee, .. } = state.arena().value(object) {
//!             if let AbstractValue::UnknownName { name } = state.arena().value(*callee) {
//!                 acc.push(name.clone());
//!             }
//!         }
//!     }
//! }
//! ```

use crate::interpreter::{AbstractValue, ExecutionState, ObjectId};

/// Per-variant routing over a finished value graph.
///
/// [`solve`](Self::solve) inspects the object behind `id` and forwards to
/// the matching handler. The match is exhaustive over the closed
/// [`AbstractValue`] set, so adding a variant forces this contract to grow
/// with it. Traversal policy is the implementor's choice: handlers receive
/// ids, not resolved children, and may recurse through
/// [`ExecutionState::arena`] as deeply as they need (tracking visited ids if
/// the graph may be cyclic).
pub trait Solver {
    /// The external accumulator threaded through dispatch.
    type Acc;

    /// Routes one object to its variant handler.
    fn solve(&mut self, object: ObjectId, acc: &mut Self::Acc, state: &ExecutionState) {
        match state.arena().value(object) {
            AbstractValue::Unknown => self.solve_unknown(object, acc, state),
            AbstractValue::UnknownName { .. } => self.solve_unknown_name(object, acc, state),
            AbstractValue::UnknownFastName { .. } => {
                self.solve_unknown_fast_name(object, acc, state);
            }
            AbstractValue::Value { .. } => self.solve_value(object, acc, state),
            AbstractValue::Attribute { .. } => self.solve_attribute(object, acc, state),
            AbstractValue::Module { .. } => self.solve_module(object, acc, state),
            AbstractValue::BuiltIn { .. } => self.solve_built_in(object, acc, state),
            AbstractValue::Call { .. } => self.solve_call(object, acc, state),
            AbstractValue::Operation { .. } => self.solve_operation(object, acc, state),
            AbstractValue::UnaryOperation { .. } => {
                self.solve_unary_operation(object, acc, state);
            }
            AbstractValue::Compare { .. } => self.solve_compare(object, acc, state),
            AbstractValue::PossibleOutcomes { .. } => {
                self.solve_possible_outcomes(object, acc, state);
            }
            AbstractValue::WhileLoop { .. } => self.solve_while_loop(object, acc, state),
        }
    }

    /// Handles an [`AbstractValue::Unknown`].
    fn solve_unknown(&mut self, object: ObjectId, acc: &mut Self::Acc, state: &ExecutionState) {
        let _ = (object, acc, state);
    }

    /// Handles an [`AbstractValue::UnknownName`].
    fn solve_unknown_name(
        &mut self,
        object: ObjectId,
        acc: &mut Self::Acc,
        state: &ExecutionState,
    ) {
        let _ = (object, acc, state);
    }

    /// Handles an [`AbstractValue::UnknownFastName`].
    fn solve_unknown_fast_name(
        &mut self,
        object: ObjectId,
        acc: &mut Self::Acc,
        state: &ExecutionState,
    ) {
        let _ = (object, acc, state);
    }

    /// Handles an [`AbstractValue::Value`].
    fn solve_value(&mut self, object: ObjectId, acc: &mut Self::Acc, state: &ExecutionState) {
        let _ = (object, acc, state);
    }

    /// Handles an [`AbstractValue::Attribute`].
    fn solve_attribute(&mut self, object: ObjectId, acc: &mut Self::Acc, state: &ExecutionState) {
        let _ = (object, acc, state);
    }

    /// Handles an [`AbstractValue::Module`].
    fn solve_module(&mut self, object: ObjectId, acc: &mut Self::Acc, state: &ExecutionState) {
        let _ = (object, acc, state);
    }

    /// Handles an [`AbstractValue::BuiltIn`].
    fn solve_built_in(&mut self, object: ObjectId, acc: &mut Self::Acc, state: &ExecutionState) {
        let _ = (object, acc, state);
    }

    /// Handles an [`AbstractValue::Call`].
    fn solve_call(&mut self, object: ObjectId, acc: &mut Self::Acc, state: &ExecutionState) {
        let _ = (object, acc, state);
    }

    /// Handles an [`AbstractValue::Operation`].
    fn solve_operation(&mut self, object: ObjectId, acc: &mut Self::Acc, state: &ExecutionState) {
        let _ = (object, acc, state);
    }

    /// Handles an [`AbstractValue::UnaryOperation`].
    fn solve_unary_operation(
        &mut self,
        object: ObjectId,
        acc: &mut Self::Acc,
        state: &ExecutionState,
    ) {
        let _ = (object, acc, state);
    }

    /// Handles an [`AbstractValue::Compare`].
    fn solve_compare(&mut self, object: ObjectId, acc: &mut Self::Acc, state: &ExecutionState) {
        let _ = (object, acc, state);
    }

    /// Handles an [`AbstractValue::PossibleOutcomes`].
    fn solve_possible_outcomes(
        &mut self,
        object: ObjectId,
        acc: &mut Self::Acc,
        state: &ExecutionState,
    ) {
        let _ = (object, acc, state);
    }

    /// Handles an [`AbstractValue::WhileLoop`].
    fn solve_while_loop(&mut self, object: ObjectId, acc: &mut Self::Acc, state: &ExecutionState) {
        let _ = (object, acc, state);
    }
}
