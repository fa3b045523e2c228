// Copyright 2026 BinFlip
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]

//! # pyscope
//!
//! A framework for symbolic (abstract) interpretation of CPython bytecode.
//!
//! `pyscope` walks a decoded instruction stream once — without executing
//! anything concretely — and builds a value graph describing what each stack
//! slot, local, and global name *symbolically* holds: unknown names, constants,
//! attribute reads, captured call sites, operator expressions, and
//! branch-merged "possible outcomes". Every operand may be partially or fully
//! unknown; the interpreter still produces a sound, inspectable model of data
//! flow, control-dependent value merging, and call-site capture.
//!
//! ## Quick Start
//!
//! ```rust
//! use pyscope::prelude::*;
//!
//! // a = 42; return a
//! let instructions = StreamBuilder::new()
//!     .load_const(Literal::Int(42))
//!     .store_name("a")
//!     .load_name("a")
//!     .return_value()
//!     .finish();
//!
//! let mut interpreter = Interpreter::new(Vec::new());
//! interpreter.interpret(&instructions)?;
//!
//! let state = interpreter.state();
//! assert!(state.return_value().is_some());
//! # Ok::<(), pyscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! `pyscope` is organized into three modules:
//!
//! - [`bytecode`] - The instruction-stream boundary: the [`bytecode::Opcode`]
//!   vocabulary, decoded [`bytecode::Operand`] shapes, constant-pool
//!   [`bytecode::Literal`] values, and [`bytecode::StreamBuilder`] for
//!   assembling streams by hand.
//! - [`interpreter`] - The core engine: the abstract value model and arena,
//!   the per-run [`interpreter::ExecutionState`], the instruction dispatcher
//!   with its conditional-path merge rules, and the loop boundary recognizer.
//! - [`solver`] - The dispatch contract exposed to downstream consumers of
//!   the finished value graph.
//!
//! ## Value Model
//!
//! Abstract values live in a [`interpreter::ValueArena`] and are addressed by
//! copyable [`interpreter::ObjectId`] handles, so attribute graphs may be
//! cyclic without risking unbounded recursion during traversal. The closed
//! set of variants is [`interpreter::AbstractValue`]; branch merges are
//! expressed as [`interpreter::AbstractValue::PossibleOutcomes`], the
//! phi-node equivalent of this representation.
//!
//! ## Branch Tracking
//!
//! Conditional forward skips register an active [`interpreter::Jump`] whose
//! condition guards every store and return processed before the jump's
//! destination offset. Short-circuit `or` terms accumulate on a dedicated
//! stack and fold into the next branch condition. A store under active
//! conditions never discards the pre-branch value; it is preserved as the
//! merge node's fallback, so consumers can always reconstruct "the value if
//! no recorded condition holds".
//!
//! ## Coverage Policy
//!
//! The interpreter targets structured, compiler-generated control flow and
//! deliberately does not cover every opcode of the host instruction set.
//! Unrecognized opcodes are skipped with no state change and reported to the
//! injected [`interpreter::InterpreterObserver`]; malformed streams (operand
//! stack underflow, conflicting returns) abort the run with a diagnosable
//! [`Error`].

mod error;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use pyscope::prelude::*;
///
/// let instructions = StreamBuilder::new()
///     .load_name("x")
///     .return_value()
///     .finish();
/// let mut interpreter = Interpreter::new(Vec::new());
/// interpreter.interpret(&instructions)?;
/// # Ok::<(), pyscope::Error>(())
/// ```
pub mod prelude;

/// Instruction model for decoded CPython bytecode.
///
/// This module defines the boundary contract with the instruction-stream
/// decoder: the fixed [`bytecode::Opcode`] vocabulary, the decoded
/// [`bytecode::Operand`] shapes, opaque [`bytecode::Literal`] constant-pool
/// values, and the [`bytecode::Instruction`] records the interpreter
/// consumes. [`bytecode::StreamBuilder`] assembles streams by hand for
/// tests, benchmarks, and drivers.
pub mod bytecode;

/// The symbolic interpretation engine.
///
/// # Key Types
///
/// - [`interpreter::Interpreter`] - the per-opcode dispatch loop
/// - [`interpreter::ExecutionState`] - environments, operand stack, and
///   branch tracking threaded through one analysis run
/// - [`interpreter::ValueArena`] / [`interpreter::AbstractValue`] - the
///   abstract value graph
/// - [`interpreter::InterpreterObserver`] - injected diagnostics sink
/// - [`interpreter::scan_loops`] - the loop boundary recognizer pre-pass
pub mod interpreter;

/// Dispatch contract for downstream consumers of the value graph.
///
/// The [`solver::Solver`] trait routes each [`interpreter::AbstractValue`]
/// variant to a dedicated handler, threading an arbitrary accumulator and
/// the originating [`interpreter::ExecutionState`] through the traversal.
pub mod solver;

/// `pyscope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is
/// always [`Error`]. Used consistently throughout the crate for all fallible
/// operations.
pub type Result<T> = std::result::Result<T, Error>;

/// `pyscope` Error type
///
/// The main error type for all operations in this crate. Fatal interpreter
/// conditions carry the offending instruction offset and opcode so malformed
/// streams can be diagnosed precisely.
pub use error::Error;
