//! Error type for the processing-element models.

use pe_math::Coeff;
use thiserror::Error;

use crate::{
    mode::{OperatingMode, PeResult},
    pe::TransactionId,
};

/// Contract violations that the hardware would let through silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// Operand or intermediate outside the range of a combinational unit.
    #[error(transparent)]
    Math(#[from] pe_math::Error),

    /// Mode change requested before the pipeline drained.
    #[error(
        "mode switch {current} -> {requested} before the pipeline drained ({in_flight} transaction(s) in flight)"
    )]
    ModeSwitchInFlight {
        current: OperatingMode,
        requested: OperatingMode,
        in_flight: usize,
    },

    /// Control-register value outside the six defined modes.
    #[error("undefined mode encoding {0:#05b}")]
    UndefinedMode(u8),

    /// Folded datapath and formula reference disagree.
    #[error("transaction {id} in {mode}: datapath gave {got:?}, expected {expected:?}")]
    DatapathMismatch {
        id: TransactionId,
        mode: OperatingMode,
        got: (Coeff, Coeff),
        expected: PeResult,
    },

    /// PE2 merge output disagrees with `u + v` of the reference.
    #[error("transaction {id}: merge output {got}, expected {expected}")]
    MergeMismatch {
        id: TransactionId,
        got: Coeff,
        expected: Coeff,
    },

    /// A transaction left the pipeline without producing its result.
    #[error("transaction {0} produced no result")]
    MissingCompletion(TransactionId),
}

/// Shorthand used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;
