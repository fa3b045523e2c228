//! Transition rules for the instruction dispatcher.
//!
//! One method per handled opcode, called from [`Interpreter::step`]. The
//! conditional-path merge rules live here: stores under active jumps build
//! or extend [`AbstractValue::PossibleOutcomes`] nodes, pending short-circuit
//! terms fold into branch conditions, and conditional returns accumulate
//! outcomes while injecting the complement of every live condition.

use crate::{
    bytecode::Instruction,
    interpreter::{
        state::{Jump, OrEntry},
        value::{AbstractValue, ObjectId, Outcome},
        Interpreter, Step,
    },
    Error, Result,
};

impl Interpreter {
    /// Creates an error for an operand whose shape does not match the
    /// opcode.
    fn invalid_operand(instruction: &Instruction, expected: &'static str) -> Error {
        Error::InvalidOperand {
            offset: instruction.offset,
            opcode: instruction.opcode,
            expected,
        }
    }

    /// Extracts the name operand or fails with [`Error::InvalidOperand`].
    fn name_operand(instruction: &Instruction) -> Result<&str> {
        instruction
            .operand
            .as_name()
            .ok_or_else(|| Self::invalid_operand(instruction, "name"))
    }

    /// `PUSH_NULL`: pushes the callee-slot marker.
    ///
    /// The marker carries no information in the abstract domain, so a fresh
    /// unknown stands in for it.
    pub(super) fn push_null(&mut self) -> Result<Step> {
        let id = self.state.arena.alloc(AbstractValue::Unknown);
        self.state.stack.push(id);
        Ok(Step::Continue)
    }

    /// `POP_TOP`: pops and discards the top of stack.
    pub(super) fn pop_top(&mut self, instruction: &Instruction) -> Result<Step> {
        self.state.pop(instruction)?;
        Ok(Step::Continue)
    }

    /// `IMPORT_NAME`: pushes a module resolved by identifier only.
    pub(super) fn import_name(&mut self, instruction: &Instruction) -> Result<Step> {
        let name = Self::name_operand(instruction)?.to_string();
        let id = self.state.arena.alloc(AbstractValue::Module { name });
        self.state.stack.push(id);
        Ok(Step::Continue)
    }

    /// `LOAD_CONST`: pushes a known constant.
    pub(super) fn load_const(&mut self, instruction: &Instruction) -> Result<Step> {
        let value = instruction
            .operand
            .as_literal()
            .ok_or_else(|| Self::invalid_operand(instruction, "literal"))?
            .clone();
        let id = self.state.arena.alloc(AbstractValue::Value { value });
        self.state.stack.push(id);
        Ok(Step::Continue)
    }

    /// `LOAD_NAME`: pushes the binding of a global-like name.
    ///
    /// A miss pushes a fresh [`AbstractValue::UnknownName`] without
    /// inserting it into the environment.
    pub(super) fn load_name(&mut self, instruction: &Instruction) -> Result<Step> {
        let name = Self::name_operand(instruction)?;
        let id = match self.state.names.get(name) {
            Some(&id) => id,
            None => self.state.arena.alloc(AbstractValue::UnknownName {
                name: name.to_string(),
            }),
        };
        self.state.stack.push(id);
        Ok(Step::Continue)
    }

    /// `LOAD_FAST`: symmetric to [`load_name`](Self::load_name), against the
    /// local-like environment.
    pub(super) fn load_fast(&mut self, instruction: &Instruction) -> Result<Step> {
        let name = Self::name_operand(instruction)?;
        let id = match self.state.fast_names.get(name) {
            Some(&id) => id,
            None => self.state.arena.alloc(AbstractValue::UnknownFastName {
                name: name.to_string(),
            }),
        };
        self.state.stack.push(id);
        Ok(Step::Continue)
    }

    /// `LOAD_ATTR`: pops a base and pushes the attribute read.
    ///
    /// The resolved value is the base's overlay entry if one was recorded,
    /// otherwise a fresh unknown.
    pub(super) fn load_attr(&mut self, instruction: &Instruction) -> Result<Step> {
        let name = Self::name_operand(instruction)?.to_string();
        let base = self.state.pop(instruction)?;
        let value = self.state.arena.get_attr(base, &name);
        let id = self
            .state
            .arena
            .alloc(AbstractValue::Attribute { base, name, value });
        self.state.stack.push(id);
        Ok(Step::Continue)
    }

    /// `STORE_NAME`: binds a popped value to a global-like name, merging
    /// under active conditions.
    pub(super) fn store_name(&mut self, instruction: &Instruction) -> Result<Step> {
        self.store_env(instruction, true)
    }

    /// `STORE_FAST`: symmetric to [`store_name`](Self::store_name), against
    /// the local-like environment.
    pub(super) fn store_fast(&mut self, instruction: &Instruction) -> Result<Step> {
        self.store_env(instruction, false)
    }

    /// The store merge rule shared by both environments.
    ///
    /// With no active jumps the binding is replaced outright. Under active
    /// jumps, an existing merge node gains a front outcome; any other
    /// binding (or none) is captured as the fallback of a fresh merge node,
    /// so the pre-branch value is never discarded.
    fn store_env(&mut self, instruction: &Instruction, global: bool) -> Result<Step> {
        let name = Self::name_operand(instruction)?.to_string();
        let value = self.state.pop(instruction)?;

        let existing = if global {
            self.state.names.get(&name).copied()
        } else {
            self.state.fast_names.get(&name).copied()
        };

        if self.state.active_jumps.is_empty() {
            let env = if global {
                &mut self.state.names
            } else {
                &mut self.state.fast_names
            };
            env.insert(name, value);
            return Ok(Step::Continue);
        }

        let conditions = self.state.active_conditions();
        match existing {
            Some(id) if self.state.arena.is_possible_outcomes(id) => {
                self.state.arena.add_outcome(id, Outcome::new(conditions, value));
            }
            _ => {
                let merged = self.state.arena.alloc(AbstractValue::PossibleOutcomes {
                    outcomes: vec![Outcome::new(conditions, value)],
                    else_outcome: existing,
                });
                let env = if global {
                    &mut self.state.names
                } else {
                    &mut self.state.fast_names
                };
                env.insert(name, merged);
            }
        }
        Ok(Step::Continue)
    }

    /// `STORE_ATTR`: pops a target, then a value, and records the attribute
    /// assignment in the target's overlay.
    pub(super) fn store_attr(&mut self, instruction: &Instruction) -> Result<Step> {
        let name = Self::name_operand(instruction)?;
        let target = self.state.pop(instruction)?;
        let value = self.state.pop(instruction)?;
        self.state.arena.set_attr(target, name, value);
        Ok(Step::Continue)
    }

    /// `COMPARE_OP`: pops rhs then lhs and pushes the symbolic comparison.
    pub(super) fn compare_op(&mut self, instruction: &Instruction) -> Result<Step> {
        let op = Self::name_operand(instruction)?.to_string();
        let rhs = self.state.pop(instruction)?;
        let lhs = self.state.pop(instruction)?;
        let id = self.state.arena.alloc(AbstractValue::Compare { op, lhs, rhs });
        self.state.stack.push(id);
        Ok(Step::Continue)
    }

    /// `BINARY_OP`: pops rhs then lhs and pushes the symbolic operation.
    pub(super) fn binary_op(&mut self, instruction: &Instruction) -> Result<Step> {
        let op = Self::name_operand(instruction)?.to_string();
        let rhs = self.state.pop(instruction)?;
        let lhs = self.state.pop(instruction)?;
        let id = self.state.arena.alloc(AbstractValue::Operation { op, lhs, rhs });
        self.state.stack.push(id);
        Ok(Step::Continue)
    }

    /// `UNARY_*`: pops the operand and pushes the symbolic unary operation.
    pub(super) fn unary_op(&mut self, instruction: &Instruction, op: &str) -> Result<Step> {
        let operand = self.state.pop(instruction)?;
        let id = self.state.arena.alloc(AbstractValue::UnaryOperation {
            op: op.to_string(),
            operand,
        });
        self.state.stack.push(id);
        Ok(Step::Continue)
    }

    /// `POP_JUMP_FORWARD_IF_FALSE`: registers an active conditional branch.
    ///
    /// Pending short-circuit terms are folded into the popped condition
    /// first, in the order they accumulated — the combined condition is what
    /// guards all subsequent stores and returns, so an uncombined `or` term
    /// would otherwise be silently dropped.
    pub(super) fn jump_if_false(&mut self, instruction: &Instruction) -> Result<Step> {
        let destination = instruction
            .operand
            .as_target()
            .ok_or_else(|| Self::invalid_operand(instruction, "jump target"))?;
        let mut condition = self.state.pop(instruction)?;

        let pending: Vec<OrEntry> = self.state.or_stack.drain(..).collect();
        for entry in pending {
            condition = self.state.arena.alloc(AbstractValue::Operation {
                op: "or".to_string(),
                lhs: condition,
                rhs: entry.condition,
            });
        }

        self.state
            .active_jumps
            .push(Jump::bounded(condition, destination));
        Ok(Step::Continue)
    }

    /// `POP_JUMP_FORWARD_IF_TRUE`: stashes a short-circuit `or` term.
    ///
    /// Does not touch the active jumps; the term waits on the or-stack until
    /// the next skip-on-false combines it, or until its end offset passes.
    pub(super) fn jump_if_true(&mut self, instruction: &Instruction) -> Result<Step> {
        let end = instruction
            .operand
            .as_target()
            .ok_or_else(|| Self::invalid_operand(instruction, "jump target"))?;
        let condition = self.state.pop(instruction)?;
        self.state.or_stack.push(OrEntry { condition, end });
        Ok(Step::Continue)
    }

    /// `KW_NAMES`: records the keyword argument slots for the next call.
    pub(super) fn record_kw_names(&mut self, instruction: &Instruction) -> Result<Step> {
        let indices = instruction
            .operand
            .as_indices()
            .ok_or_else(|| Self::invalid_operand(instruction, "argument-slot indices"))?;
        self.state.kw_names = indices.to_vec();
        Ok(Step::Continue)
    }

    /// `CALL`: pops the arguments and the callee and captures the call site.
    ///
    /// Arguments were pushed left-to-right, so they pop last-to-first;
    /// prepending each positional argument restores source order. Slots
    /// recorded by the preceding `KW_NAMES` route into the keyword map
    /// instead. The captured call is wrapped in a single-outcome
    /// [`AbstractValue::PossibleOutcomes`] keyed by the currently active
    /// conditions, and the wrapper — not the bare call — is pushed, so later
    /// consumers see a uniformly path-dependent value.
    pub(super) fn call(&mut self, instruction: &Instruction) -> Result<Step> {
        let count = instruction
            .operand
            .as_count()
            .ok_or_else(|| Self::invalid_operand(instruction, "argument count"))?;

        let mut args = Vec::new();
        let mut kwargs = std::collections::BTreeMap::new();
        for slot in 0..count {
            let value = self.state.pop(instruction)?;
            if self.state.kw_names.contains(&slot) {
                kwargs.insert(slot, value);
            } else {
                args.insert(0, value);
            }
        }
        self.state.kw_names.clear();

        let callee = self.state.pop(instruction)?;
        let conditions = self.state.active_conditions();
        let call = self.state.arena.alloc(AbstractValue::Call {
            callee,
            args,
            kwargs,
        });
        let wrapped = self.state.arena.alloc(AbstractValue::PossibleOutcomes {
            outcomes: vec![Outcome::new(conditions, call)],
            else_outcome: None,
        });

        self.state.calls.push(wrapped);
        self.state.stack.push(wrapped);
        Ok(Step::Continue)
    }

    /// `RETURN_VALUE`: records the popped value as the run's result.
    ///
    /// With no active jumps this is the final, unconditional return: the
    /// value is recorded (a second unconditional return is a fatal
    /// inconsistency), remaining or-stack entries are discarded, and the run
    /// halts. Under active jumps the return accumulates as one more outcome,
    /// and a complement condition is injected for every live jump so that
    /// subsequent instructions are modeled as reachable only when none of
    /// the recorded returns fired.
    pub(super) fn return_value(&mut self, instruction: &Instruction) -> Result<Step> {
        let value = self.state.pop(instruction)?;

        if self.state.active_jumps.is_empty() {
            if self.state.return_value.is_some() {
                return Err(Error::ReturnConflict {
                    offset: instruction.offset,
                });
            }
            self.state.return_value = Some(value);
            self.state.or_stack.clear();
            return Ok(Step::Halt);
        }

        let conditions = self.state.active_conditions();
        match self.state.return_value {
            None => {
                let merged = self.state.arena.alloc(AbstractValue::PossibleOutcomes {
                    outcomes: vec![Outcome::new(conditions, value)],
                    else_outcome: None,
                });
                self.state.return_value = Some(merged);
            }
            Some(id) if self.state.arena.is_possible_outcomes(id) => {
                self.state.arena.add_outcome(id, Outcome::new(conditions, value));
            }
            Some(_) => {
                return Err(Error::ReturnConflict {
                    offset: instruction.offset,
                });
            }
        }

        let live: Vec<ObjectId> = self.state.active_conditions();
        for condition in live {
            let negated = self.state.arena.alloc(AbstractValue::UnaryOperation {
                op: "not".to_string(),
                operand: condition,
            });
            self.state.active_jumps.push(Jump::unbounded(negated));
        }
        Ok(Step::Continue)
    }
}
