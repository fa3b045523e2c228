//! Conditional-path merge engine integration tests.
//!
//! Covers the branch-tracking contract: condition conjunctions, fallback
//! preservation, short-circuit `or` composition, return-path complement
//! injection, and the end-to-end single-if scenario.

use pyscope::prelude::*;

fn interpret(instructions: &[Instruction]) -> ExecutionState {
    let mut interpreter = Interpreter::new(Vec::new());
    interpreter
        .interpret(instructions)
        .expect("interpretation should succeed");
    interpreter.into_state()
}

/// Asserts that `id` is `Value(literal)`.
fn assert_is_int(state: &ExecutionState, id: ObjectId, expected: i64) {
    assert_eq!(
        state.arena().value(id),
        &AbstractValue::Value {
            value: Literal::Int(expected)
        }
    );
}

#[test]
fn test_single_if_merge() {
    // a = 0; if b > 0: a = 1
    let mut asm = StreamBuilder::new();
    asm.load_const(Literal::Int(0)).store_name("a");
    asm.load_name("b").load_const(Literal::Int(0)).compare_op(">");
    asm.pop_jump_forward_if_false(16);
    asm.load_const(Literal::Int(1)).store_name("a");
    asm.jump_target().load_name("a");
    let state = interpret(&asm.finish());

    let a = state.name("a").expect("a is bound");
    let AbstractValue::PossibleOutcomes {
        outcomes,
        else_outcome,
    } = state.arena().value(a)
    else {
        panic!("expected PossibleOutcomes");
    };

    assert_eq!(outcomes.len(), 1);
    let outcome = &outcomes[0];
    assert_eq!(outcome.conditions.len(), 1);

    // The guard is Compare(">", UnknownName("b"), Value(0)).
    let AbstractValue::Compare { op, lhs, rhs } = state.arena().value(outcome.conditions[0])
    else {
        panic!("expected Compare condition");
    };
    assert_eq!(op, ">");
    assert_eq!(
        state.arena().value(*lhs),
        &AbstractValue::UnknownName { name: "b".into() }
    );
    assert_is_int(&state, *rhs, 0);

    assert_is_int(&state, outcome.outcome, 1);
    assert_is_int(&state, else_outcome.expect("fallback kept"), 0);
}

#[test]
fn test_short_circuit_or_composition() {
    // a = 0; if b > 0 or b != 2: a = 1
    let mut asm = StreamBuilder::new();
    asm.load_const(Literal::Int(0)).store_name("a");
    asm.load_name("b").load_const(Literal::Int(0)).compare_op(">");
    let body = 20;
    let exit = 24;
    asm.pop_jump_forward_if_true(body);
    asm.load_name("b").load_const(Literal::Int(2)).compare_op("!=");
    asm.pop_jump_forward_if_false(exit);
    asm.jump_target()
        .load_const(Literal::Int(1))
        .store_name("a");
    asm.jump_target().load_name("a");
    let instructions = asm.finish();
    assert_eq!(instructions[10].offset, body);
    assert_eq!(instructions[12].offset, exit);

    let mut interpreter = Interpreter::new(Vec::new());
    let mut observer = NullObserver;
    // Drive to just past the skip-on-false so the live jump can be
    // inspected before it decays.
    for instruction in &instructions[..10] {
        interpreter
            .step(instruction, &mut observer)
            .expect("step should succeed");
    }

    let state = interpreter.state();
    assert!(
        state.or_stack().is_empty(),
        "pending or-terms are consumed by the skip-on-false"
    );
    assert_eq!(state.active_jumps().len(), 1);

    // The combined condition is Operation("or", Q, P): the popped term on
    // the left, the pending short-circuit term folded in on the right.
    let condition = state.active_jumps()[0].condition;
    let AbstractValue::Operation { op, lhs, rhs } = state.arena().value(condition) else {
        panic!("expected a combined or-condition, not a bare term");
    };
    assert_eq!(op, "or");
    assert!(matches!(
        state.arena().value(*lhs),
        AbstractValue::Compare { op, .. } if op == "!="
    ));
    assert!(matches!(
        state.arena().value(*rhs),
        AbstractValue::Compare { op, .. } if op == ">"
    ));

    // Finish the run: the store happens under the combined condition.
    for instruction in &instructions[10..] {
        interpreter
            .step(instruction, &mut observer)
            .expect("step should succeed");
    }
    let state = interpreter.state();
    let a = state.name("a").expect("a is bound");
    let AbstractValue::PossibleOutcomes { outcomes, .. } = state.arena().value(a) else {
        panic!("expected PossibleOutcomes");
    };
    assert_eq!(outcomes[0].conditions, vec![condition]);
}

#[test]
fn test_unconsumed_or_term_expires_by_offset() {
    // A skip-on-true whose expression never reaches a skip-on-false: the
    // pending term decays once the current offset passes its end.
    let mut asm = StreamBuilder::new();
    asm.load_name("b");
    asm.pop_jump_forward_if_true(4);
    asm.jump_target().load_name("c");
    asm.load_name("d");
    let instructions = asm.finish();

    let mut interpreter = Interpreter::new(Vec::new());
    let mut observer = NullObserver;
    for instruction in &instructions[..3] {
        interpreter
            .step(instruction, &mut observer)
            .expect("step should succeed");
    }
    assert_eq!(interpreter.state().or_stack().len(), 1);
    interpreter
        .step(&instructions[3], &mut observer)
        .expect("step should succeed");
    assert!(interpreter.state().or_stack().is_empty());
}

#[test]
fn test_return_path_complement_injection() {
    // if b: return 1
    // x = 2
    let mut asm = StreamBuilder::new();
    asm.load_name("b");
    asm.pop_jump_forward_if_false(8);
    asm.load_const(Literal::Int(1)).return_value();
    asm.jump_target().load_const(Literal::Int(2)).store_name("x");
    let state = interpret(&asm.finish());

    // The store after the conditional return is guarded by not(b).
    let x = state.name("x").expect("x is bound");
    let AbstractValue::PossibleOutcomes { outcomes, .. } = state.arena().value(x) else {
        panic!("store after a conditional return is conditioned");
    };
    let not_b = outcomes[0]
        .conditions
        .iter()
        .copied()
        .find(|&condition| {
            matches!(
                state.arena().value(condition),
                AbstractValue::UnaryOperation { op, .. } if op == "not"
            )
        })
        .expect("complement of the returned path is active");
    let AbstractValue::UnaryOperation { operand, .. } = state.arena().value(not_b) else {
        unreachable!();
    };
    assert_eq!(
        state.arena().value(*operand),
        &AbstractValue::UnknownName { name: "b".into() }
    );
}

#[test]
fn test_two_conditional_returns_accumulate_most_recent_first() {
    // if a: return 1
    // if b: return 2
    let mut asm = StreamBuilder::new();
    asm.load_name("a");
    asm.pop_jump_forward_if_false(8);
    asm.load_const(Literal::Int(1)).return_value();
    asm.jump_target().load_name("b");
    asm.pop_jump_forward_if_false(16);
    asm.load_const(Literal::Int(2)).return_value();
    asm.jump_target().load_name("a");
    let state = interpret(&asm.finish());

    let merged = state.return_value().expect("returns recorded");
    let AbstractValue::PossibleOutcomes {
        outcomes,
        else_outcome,
    } = state.arena().value(merged)
    else {
        panic!("expected PossibleOutcomes");
    };
    assert!(else_outcome.is_none());
    assert_eq!(outcomes.len(), 2);
    assert_is_int(&state, outcomes[0].outcome, 2);
    assert_is_int(&state, outcomes[1].outcome, 1);
    // The second return is additionally conditioned on the complement of
    // the first one's path.
    assert!(outcomes[0].conditions.len() > outcomes[1].conditions.len());
}

#[test]
fn test_end_to_end_single_if_scenario() {
    // a = 0
    // if b > 0: a = 1
    // return a
    let mut asm = StreamBuilder::new();
    asm.load_const(Literal::Int(0)).store_name("a");
    asm.load_name("b").load_const(Literal::Int(0)).compare_op(">");
    asm.pop_jump_forward_if_false(16);
    asm.load_const(Literal::Int(1)).store_name("a");
    asm.jump_target().load_name("a").return_value();
    let state = interpret(&asm.finish());

    let a = state.name("a").expect("a is bound");

    // names["a"] == PossibleOutcomes([Outcome([b > 0], 1)], else = 0)
    let AbstractValue::PossibleOutcomes {
        outcomes,
        else_outcome,
    } = state.arena().value(a)
    else {
        panic!("expected PossibleOutcomes");
    };
    assert_eq!(outcomes.len(), 1);
    assert_is_int(&state, outcomes[0].outcome, 1);
    assert_is_int(&state, else_outcome.expect("fallback"), 0);
    assert!(matches!(
        state.arena().value(outcomes[0].conditions[0]),
        AbstractValue::Compare { op, .. } if op == ">"
    ));

    // The return loaded the merged binding: same object, same merge.
    assert_eq!(state.return_value(), Some(a));

    // Rendered form, for the record.
    assert_eq!(
        state.arena().display(a).to_string(),
        "possibility(outcome(compare(unknown-name(b) > value(0)) -> value(1)), else -> value(0))"
    );
}
