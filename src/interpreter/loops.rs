//! Loop boundary recognizer.
//!
//! A forward, stateful scan over the raw instruction list, independent of
//! the dispatcher's environments, run before the main interpretation pass.
//! It looks for the structural shape the host compiler emits for a
//! conditional loop:
//!
//! ```text
//! POP_JUMP_FORWARD_IF_FALSE ...    ; guard (loop start)
//! <jump target>                    ; body start
//! ...
//! POP_JUMP_BACKWARD_IF_TRUE body   ; closing edge (loop end)
//! <jump target>                    ; loop exit
//! ```
//!
//! The scan is purely diagnostic: detections are recorded in the execution
//! state and reported to the observer, but no loop summary is merged into
//! the environments.

use crate::bytecode::{Instruction, Opcode};

/// The located boundaries of one recognized loop body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopDetection {
    /// Offset of the loop guard.
    pub start: u32,

    /// Offset of the closing backward edge.
    pub end: u32,
}

/// Scanner progress through the expected instruction shape.
#[derive(Debug, Clone, Copy)]
enum ScanState {
    /// No candidate in sight.
    Idle,

    /// Saw a guard; the next instruction must be a jump target.
    SawGuard { start: u32 },

    /// Inside a candidate body, waiting for the closing backward edge.
    InBody { start: u32, body: u32 },

    /// Saw the closing edge; the next instruction decides whether the
    /// pattern counts.
    Closed { start: u32, end: u32 },
}

/// Locates structured conditional-loop patterns in an instruction stream.
///
/// A guard not immediately followed by a jump target resets the scan; while
/// waiting for the closing edge, any instruction other than a backward skip
/// to the body start is tolerated. The pattern is only recorded when the
/// instruction following the closing edge is itself a jump target (the loop
/// exit), matching what the host compiler emits.
#[must_use]
pub fn scan_loops(instructions: &[Instruction]) -> Vec<LoopDetection> {
    let mut detections = Vec::new();
    let mut scan = ScanState::Idle;

    for instruction in instructions {
        if let ScanState::Closed { start, end } = scan {
            if instruction.is_jump_target {
                detections.push(LoopDetection { start, end });
            }
            scan = ScanState::Idle;
            continue;
        }

        scan = match scan {
            ScanState::Idle => {
                if instruction.opcode == Opcode::PopJumpForwardIfFalse {
                    ScanState::SawGuard {
                        start: instruction.offset,
                    }
                } else {
                    ScanState::Idle
                }
            }
            ScanState::SawGuard { start } => {
                if instruction.is_jump_target {
                    ScanState::InBody {
                        start,
                        body: instruction.offset,
                    }
                } else {
                    ScanState::Idle
                }
            }
            ScanState::InBody { start, body } => {
                if instruction.opcode == Opcode::PopJumpBackwardIfTrue
                    && instruction.operand.as_target() == Some(body)
                {
                    ScanState::Closed {
                        start,
                        end: instruction.offset,
                    }
                } else {
                    ScanState::InBody { start, body }
                }
            }
            // Handled above; the match is kept exhaustive.
            ScanState::Closed { .. } => ScanState::Idle,
        };
    }

    detections
}
