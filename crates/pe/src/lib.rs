//! Cycle-accurate models of the ML-KEM processing elements.
//!
//! The crate is layered the same way the hardware is:
//!
//! - [`pipeline`]: registered arithmetic units (table reducer, modular
//!   multiplier, base-case multiplier) clocked one edge per `tick`;
//! - [`DelayLine`]: fixed-depth shift register used for operand alignment and
//!   valid bits;
//! - [`ProcessingElement`]: the folded PE0 / PE2 / PE3 datapath behind a
//!   transaction-level state machine with per-mode latencies and mode-switch
//!   hazard handling.
//!
//! Pure combinational arithmetic lives in [`math`].
//!
//! ```
//! use kyber_pe::{OperatingMode, Operands, Pe0, PeConfig, ProcessingElement};
//!
//! let mut pe = ProcessingElement::<Pe0>::new(OperatingMode::AddSub, PeConfig::default());
//! let out = pe.run(OperatingMode::AddSub, [Operands::try_new(1000, 2500, 0)?])?;
//! assert_eq!((out[0].u.value(), out[0].v.value()), (171, 1829));
//! # Ok::<(), kyber_pe::Error>(())
//! ```

#![deny(unsafe_code)]

mod config;
mod datapath;
mod delay;
mod error;
mod mode;
mod pe;
pub mod pipeline;
mod variant;

pub use pe_math as math;

pub use crate::{
    config::{HazardPolicy, PeConfig},
    delay::DelayLine,
    error::{Error, Result},
    mode::{
        AddSubSource, AlignSource, LaneSource, Latency, ModeDescriptor, OperatingMode, Operands, OutputTap,
        PeResult, Route, apply, descriptor,
    },
    pe::{Completion, Emission, PipelineState, ProcessingElement, Transaction, TransactionId},
    variant::{Pe0, Pe2, Pe3, Variant},
};
