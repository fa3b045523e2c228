//! Unit tests for the instruction dispatcher and merge rules.

use crate::{
    bytecode::{Instruction, Literal, Opcode, Operand, StreamBuilder},
    interpreter::{AbstractValue, Interpreter, InterpreterObserver},
    Error,
};

/// Interprets a stream over an empty constant pool and returns the engine.
fn interpret(instructions: &[Instruction]) -> Interpreter {
    let mut interpreter = Interpreter::new(Vec::new());
    interpreter
        .interpret(instructions)
        .expect("interpretation should succeed");
    interpreter
}

#[test]
fn test_markers_do_not_change_state() {
    let instructions = StreamBuilder::new().resume().precall(1).op(Opcode::Nop).finish();
    let interpreter = interpret(&instructions);
    let baseline = Interpreter::new(Vec::new());
    assert_eq!(interpreter.state(), baseline.state());
}

#[test]
fn test_push_null_and_pop_top() {
    let instructions = StreamBuilder::new().push_null().finish();
    let interpreter = interpret(&instructions);
    assert_eq!(interpreter.state().stack().len(), 1);
    let top = interpreter.state().stack()[0];
    assert!(interpreter.state().arena().value(top).is_unknown());

    let instructions = StreamBuilder::new().push_null().pop_top().finish();
    let interpreter = interpret(&instructions);
    assert!(interpreter.state().stack().is_empty());
}

#[test]
fn test_load_const_pushes_value() {
    let instructions = StreamBuilder::new().load_const(Literal::Str("hi".into())).finish();
    let interpreter = interpret(&instructions);
    let top = interpreter.state().stack()[0];
    assert_eq!(
        interpreter.state().arena().value(top),
        &AbstractValue::Value {
            value: Literal::Str("hi".into())
        }
    );
}

#[test]
fn test_load_name_hits_builtin_table() {
    let instructions = StreamBuilder::new().load_name("print").finish();
    let interpreter = interpret(&instructions);
    let top = interpreter.state().stack()[0];
    assert_eq!(
        interpreter.state().arena().value(top),
        &AbstractValue::BuiltIn {
            name: "print".into()
        }
    );
}

#[test]
fn test_load_name_miss_does_not_bind() {
    let instructions = StreamBuilder::new().load_name("mystery").finish();
    let interpreter = interpret(&instructions);
    let top = interpreter.state().stack()[0];
    assert_eq!(
        interpreter.state().arena().value(top),
        &AbstractValue::UnknownName {
            name: "mystery".into()
        }
    );
    assert!(interpreter.state().name("mystery").is_none());
}

#[test]
fn test_load_fast_miss_is_fast_variant() {
    let instructions = StreamBuilder::new().load_fast("local").finish();
    let interpreter = interpret(&instructions);
    let top = interpreter.state().stack()[0];
    assert_eq!(
        interpreter.state().arena().value(top),
        &AbstractValue::UnknownFastName {
            name: "local".into()
        }
    );
}

#[test]
fn test_import_pushes_module() {
    let instructions = StreamBuilder::new().import_name("os").finish();
    let interpreter = interpret(&instructions);
    let top = interpreter.state().stack()[0];
    assert_eq!(
        interpreter.state().arena().value(top),
        &AbstractValue::Module { name: "os".into() }
    );
}

#[test]
fn test_store_then_load_attr_round_trip() {
    // import os as m; m.field = 1; m.field
    //
    // The base must be a bound name: an unbound LOAD_NAME materializes a
    // fresh unknown on every load, so nothing would connect the two reads.
    let instructions = StreamBuilder::new()
        .import_name("os")
        .store_name("m")
        .load_const(Literal::Int(1))
        .load_name("m")
        .store_attr("field")
        .load_name("m")
        .load_attr("field")
        .finish();
    let interpreter = interpret(&instructions);
    let state = interpreter.state();

    let top = *state.stack().last().expect("attribute read on the stack");
    match state.arena().value(top) {
        AbstractValue::Attribute { name, value, .. } => {
            assert_eq!(name, "field");
            assert_eq!(
                state.arena().value(*value),
                &AbstractValue::Value {
                    value: Literal::Int(1)
                }
            );
        }
        other => panic!("expected Attribute, got {other:?}"),
    }
}

#[test]
fn test_load_attr_miss_resolves_unknown() {
    let instructions = StreamBuilder::new().load_name("obj").load_attr("field").finish();
    let interpreter = interpret(&instructions);
    let state = interpreter.state();
    let top = state.stack()[0];
    match state.arena().value(top) {
        AbstractValue::Attribute { value, .. } => {
            assert!(state.arena().value(*value).is_unknown());
        }
        other => panic!("expected Attribute, got {other:?}"),
    }
}

#[test]
fn test_binary_and_compare_and_unary_shapes() {
    let instructions = StreamBuilder::new()
        .load_name("a")
        .load_name("b")
        .binary_op("+")
        .load_const(Literal::Int(0))
        .compare_op("==")
        .unary_not()
        .finish();
    let interpreter = interpret(&instructions);
    let state = interpreter.state();
    let top = state.stack()[0];

    // not ((a + b) == 0)
    let AbstractValue::UnaryOperation { op, operand } = state.arena().value(top) else {
        panic!("expected UnaryOperation");
    };
    assert_eq!(op, "not");
    let AbstractValue::Compare { op, lhs, .. } = state.arena().value(*operand) else {
        panic!("expected Compare");
    };
    assert_eq!(op, "==");
    let AbstractValue::Operation { op, .. } = state.arena().value(*lhs) else {
        panic!("expected Operation");
    };
    assert_eq!(op, "+");
}

#[test]
fn test_unconditional_store_replaces_binding() {
    let instructions = StreamBuilder::new()
        .load_const(Literal::Int(1))
        .store_name("a")
        .load_const(Literal::Int(2))
        .store_name("a")
        .finish();
    let interpreter = interpret(&instructions);
    let state = interpreter.state();
    let a = state.name("a").expect("a is bound");
    assert_eq!(
        state.arena().value(a),
        &AbstractValue::Value {
            value: Literal::Int(2)
        }
    );
}

#[test]
fn test_store_under_condition_preserves_prior_as_fallback() {
    // a = 0; if b > 0: a = 1
    let mut asm = StreamBuilder::new();
    asm.load_const(Literal::Int(0)).store_name("a");
    asm.load_name("b").load_const(Literal::Int(0)).compare_op(">");
    asm.pop_jump_forward_if_false(16);
    asm.load_const(Literal::Int(1)).store_name("a");
    asm.jump_target().load_name("a");
    let instructions = asm.finish();

    let interpreter = interpret(&instructions);
    let state = interpreter.state();
    let a = state.name("a").expect("a is bound");

    let AbstractValue::PossibleOutcomes {
        outcomes,
        else_outcome,
    } = state.arena().value(a)
    else {
        panic!("expected PossibleOutcomes");
    };
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].conditions.len(), 1);
    assert!(matches!(
        state.arena().value(outcomes[0].conditions[0]),
        AbstractValue::Compare { op, .. } if op == ">"
    ));
    assert_eq!(
        state.arena().value(outcomes[0].outcome),
        &AbstractValue::Value {
            value: Literal::Int(1)
        }
    );
    let fallback = else_outcome.expect("pre-branch value is kept");
    assert_eq!(
        state.arena().value(fallback),
        &AbstractValue::Value {
            value: Literal::Int(0)
        }
    );
}

#[test]
fn test_second_conditional_store_extends_merge_node_at_front() {
    // a = 0; if b: a = 1; if c: a = 2   (both guards live separately)
    let mut asm = StreamBuilder::new();
    asm.load_const(Literal::Int(0)).store_name("a");
    asm.load_name("b");
    asm.pop_jump_forward_if_false(12);
    asm.load_const(Literal::Int(1)).store_name("a");
    asm.jump_target().load_name("c");
    asm.pop_jump_forward_if_false(20);
    asm.load_const(Literal::Int(2)).store_name("a");
    asm.jump_target().load_name("a");
    let instructions = asm.finish();

    let interpreter = interpret(&instructions);
    let state = interpreter.state();
    let a = state.name("a").expect("a is bound");

    let AbstractValue::PossibleOutcomes { outcomes, .. } = state.arena().value(a) else {
        panic!("expected PossibleOutcomes");
    };
    assert_eq!(outcomes.len(), 2);
    // Most recent store first.
    assert_eq!(
        state.arena().value(outcomes[0].outcome),
        &AbstractValue::Value {
            value: Literal::Int(2)
        }
    );
    assert_eq!(
        state.arena().value(outcomes[1].outcome),
        &AbstractValue::Value {
            value: Literal::Int(1)
        }
    );
}

#[test]
fn test_call_captures_positional_args_in_source_order() {
    let instructions = StreamBuilder::new()
        .load_name("f")
        .load_name("x")
        .load_name("y")
        .load_name("z")
        .call(3)
        .finish();
    let interpreter = interpret(&instructions);
    let state = interpreter.state();

    assert_eq!(state.calls().len(), 1);
    let wrapper = state.calls()[0];
    let AbstractValue::PossibleOutcomes { outcomes, .. } = state.arena().value(wrapper) else {
        panic!("captured call is wrapped in PossibleOutcomes");
    };
    let AbstractValue::Call { callee, args, .. } = state.arena().value(outcomes[0].outcome) else {
        panic!("expected Call");
    };

    let names: Vec<String> = args
        .iter()
        .map(|&arg| match state.arena().value(arg) {
            AbstractValue::UnknownName { name } => name.clone(),
            other => panic!("expected UnknownName, got {other:?}"),
        })
        .collect();
    assert_eq!(names, vec!["x", "y", "z"], "pop order must not leak through");
    assert!(matches!(
        state.arena().value(*callee),
        AbstractValue::UnknownName { name } if name == "f"
    ));

    // The wrapper, not the bare call, ends up on the stack.
    assert_eq!(*state.stack().last().expect("call result"), wrapper);
}

#[test]
fn test_call_routes_keyword_slots() {
    // Two arguments, the second pop slot marked as a keyword.
    let instructions = StreamBuilder::new()
        .load_name("f")
        .load_name("x")
        .load_name("y")
        .kw_names(&[1])
        .call(2)
        .finish();
    let interpreter = interpret(&instructions);
    let state = interpreter.state();

    let wrapper = state.calls()[0];
    let AbstractValue::PossibleOutcomes { outcomes, .. } = state.arena().value(wrapper) else {
        panic!("expected PossibleOutcomes");
    };
    let AbstractValue::Call { args, kwargs, .. } = state.arena().value(outcomes[0].outcome) else {
        panic!("expected Call");
    };

    // Slot indices count pops: slot 0 pops the last-pushed argument. Slot 1
    // is in the recorded set, so the second pop routes to the keyword map.
    assert_eq!(args.len(), 1);
    assert_eq!(kwargs.len(), 1);
    assert!(kwargs.contains_key(&1));
    // The pending set is consumed by the call.
    assert!(state.kw_names().is_empty());
}

#[test]
fn test_call_under_condition_records_the_conditions() {
    let mut asm = StreamBuilder::new();
    asm.load_name("b");
    asm.pop_jump_forward_if_false(12);
    asm.push_null().load_name("f").call(0).pop_top();
    asm.jump_target().load_name("a");
    let instructions = asm.finish();

    let interpreter = interpret(&instructions);
    let state = interpreter.state();
    let wrapper = state.calls()[0];
    let AbstractValue::PossibleOutcomes { outcomes, .. } = state.arena().value(wrapper) else {
        panic!("expected PossibleOutcomes");
    };
    assert_eq!(outcomes[0].conditions.len(), 1);
}

#[test]
fn test_unconditional_return_halts() {
    let mut observer = HaltRecorder::default();
    let instructions = StreamBuilder::new()
        .load_const(Literal::Int(1))
        .return_value()
        .load_const(Literal::Int(2))
        .store_name("after")
        .finish();

    let mut interpreter = Interpreter::new(Vec::new());
    interpreter
        .run(&instructions, &mut observer)
        .expect("run should succeed");

    let state = interpreter.state();
    assert!(state.return_value().is_some());
    assert!(state.name("after").is_none(), "nothing runs after the halt");
    assert_eq!(observer.halted_at, Some(2));
}

#[derive(Default)]
struct HaltRecorder {
    halted_at: Option<u32>,
}

impl InterpreterObserver for HaltRecorder {
    fn halted(&mut self, offset: u32) {
        self.halted_at = Some(offset);
    }
}

#[test]
fn test_conditional_return_injects_complements() {
    let mut asm = StreamBuilder::new();
    asm.load_name("b");
    asm.pop_jump_forward_if_false(8);
    asm.load_const(Literal::Int(1));
    asm.return_value();
    asm.jump_target().load_name("a");
    let instructions = asm.finish();

    let interpreter = interpret(&instructions);
    let state = interpreter.state();

    // One bounded jump from the guard plus one unbounded complement.
    let jumps = state.active_jumps();
    assert!(jumps
        .iter()
        .any(|jump| jump.destination.is_none()
            && matches!(
                state.arena().value(jump.condition),
                AbstractValue::UnaryOperation { op, .. } if op == "not"
            )));

    // The return value is a single-outcome merge node.
    let merged = state.return_value().expect("conditional return recorded");
    assert!(state.arena().is_possible_outcomes(merged));
}

#[test]
fn test_double_unconditional_return_is_fatal() {
    // Forge a stream whose second return is also unconditional.
    let instructions = StreamBuilder::new()
        .load_const(Literal::Int(1))
        .return_value()
        .load_const(Literal::Int(2))
        .return_value()
        .finish();

    let mut interpreter = Interpreter::new(Vec::new());
    // `run` halts at the first return; drive `step` directly to force the
    // second one through.
    let mut observer = crate::interpreter::NullObserver;
    for instruction in &instructions[..2] {
        interpreter.step(instruction, &mut observer).expect("first return");
    }
    interpreter
        .step(&instructions[2], &mut observer)
        .expect("load const");
    let err = interpreter
        .step(&instructions[3], &mut observer)
        .expect_err("second unconditional return must fail");
    assert!(matches!(err, Error::ReturnConflict { offset: 6 }));
}

#[test]
fn test_stack_underflow_is_diagnosable() {
    let instructions = StreamBuilder::new().pop_top().finish();
    let mut interpreter = Interpreter::new(Vec::new());
    let err = interpreter
        .interpret(&instructions)
        .expect_err("pop on empty stack");
    assert!(matches!(
        err,
        Error::StackUnderflow {
            offset: 0,
            opcode: Opcode::PopTop
        }
    ));
}

#[test]
fn test_invalid_operand_is_diagnosable() {
    let instructions = vec![Instruction::new(Opcode::LoadConst, Operand::None, 0)];
    let mut interpreter = Interpreter::new(Vec::new());
    let err = interpreter.interpret(&instructions).expect_err("operand mismatch");
    assert!(matches!(
        err,
        Error::InvalidOperand {
            opcode: Opcode::LoadConst,
            expected: "literal",
            ..
        }
    ));
}

#[derive(Default)]
struct SkipCounter {
    skipped: Vec<Opcode>,
}

impl InterpreterObserver for SkipCounter {
    fn unhandled_opcode(&mut self, instruction: &Instruction) {
        self.skipped.push(instruction.opcode);
    }
}

#[test]
fn test_unrecognized_opcode_is_permissive_and_observable() {
    let instructions = StreamBuilder::new()
        .op(Opcode::GetIter)
        .op(Opcode::Swap)
        .finish();

    let mut interpreter = Interpreter::new(Vec::new());
    let mut observer = SkipCounter::default();
    interpreter
        .run(&instructions, &mut observer)
        .expect("permissive skip never fails");

    assert_eq!(observer.skipped, vec![Opcode::GetIter, Opcode::Swap]);
    assert_eq!(interpreter.state(), Interpreter::new(Vec::new()).state());
}
