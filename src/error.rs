use thiserror::Error;

use crate::bytecode::Opcode;

/// The generic Error type, which provides coverage for all errors this library
/// can potentially return.
///
/// Fatal conditions indicate a mismatch between the decoder and the
/// interpreter (or a malformed instruction stream) and abort the current
/// analysis run. Recoverable conditions are reported to the caller and leave
/// the run intact.
///
/// # Error Categories
///
/// ## Fatal Interpretation Errors
/// - [`Error::StackUnderflow`] - Pop on an empty operand stack
/// - [`Error::ReturnConflict`] - Conflicting unconditional returns
/// - [`Error::InvalidOperand`] - Operand shape does not match the opcode
///
/// ## Recoverable Errors
/// - [`Error::AttributeNotFound`] - Overlay removal of a never-set attribute
///
/// A fatal error aborts only the analysis run that produced it; it never
/// corrupts or becomes visible to any other [`ExecutionState`].
///
/// [`ExecutionState`]: crate::interpreter::ExecutionState
#[derive(Error, Debug)]
pub enum Error {
    /// Pop was attempted on an empty operand stack.
    ///
    /// This indicates a decoder/dispatcher mismatch or a malformed
    /// instruction stream. The offending offset and opcode identify the
    /// instruction whose transition rule underflowed.
    #[error("operand stack underflow at offset {offset} while executing {opcode}")]
    StackUnderflow {
        /// Offset of the instruction that underflowed the stack
        offset: u32,
        /// Opcode of the instruction that underflowed the stack
        opcode: Opcode,
    },

    /// A second unconditional return arrived, or the accumulated return value
    /// had an unexpected shape when a conditional return tried to merge into
    /// it.
    ///
    /// Either case signals a decoder or control-flow-reconstruction bug;
    /// overwriting the recorded return value silently would hide it.
    #[error("return value already recorded when the return at offset {offset} was processed")]
    ReturnConflict {
        /// Offset of the return instruction that conflicted
        offset: u32,
    },

    /// The decoded operand does not have the shape the opcode requires.
    ///
    /// For example, a `LOAD_CONST` whose operand is not a literal, or a
    /// conditional skip without a jump target.
    #[error("invalid operand for {opcode} at offset {offset}: expected {expected}")]
    InvalidOperand {
        /// Offset of the instruction with the mismatched operand
        offset: u32,
        /// Opcode of the instruction with the mismatched operand
        opcode: Opcode,
        /// Description of the expected operand shape
        expected: &'static str,
    },

    /// An attribute-overlay removal named an attribute that was never set.
    ///
    /// Reported to the caller as a local "not found" condition; the analysis
    /// run is unaffected and may continue.
    #[error("attribute `{name}` was never set on this object")]
    AttributeNotFound {
        /// The attribute name that was not present in the overlay
        name: String,
    },
}
