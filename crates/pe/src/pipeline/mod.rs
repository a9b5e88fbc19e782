//! Registered, fully pipelined arithmetic units.
//!
//! Every unit follows the same clocking convention: `tick` returns what the
//! output register shows during the current cycle, then clocks one edge
//! capturing the new input. A unit with `L` register stages therefore returns
//! the result for the input given `L` calls earlier. `None` marks a bubble.

mod basemul;
mod mul;
mod reducer;

pub use basemul::{BaseCaseInput, BaseCaseMultiplier};
pub use mul::ModMul;
pub use reducer::TableReducer;
