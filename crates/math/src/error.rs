//! Precondition failures of the combinational units.

use thiserror::Error;

/// A value handed to a combinational unit lies outside the range the unit is
/// defined for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// Coefficient outside the canonical range `[0, q - 1]`.
    #[error("coefficient {0} is outside [0, 3328]")]
    OperandOutOfRange(u32),

    /// Product wider than the 26 bits the table reducer decomposes.
    #[error("product {0} does not fit the 26-bit table reducer input")]
    ProductOutOfRange(u32),

    /// Montgomery input with `|z| >= q * 2^15`.
    #[error("montgomery input {0} is outside (-q*2^15, q*2^15)")]
    MontgomeryInputOutOfRange(i32),
}
