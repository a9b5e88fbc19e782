//! Operating modes, their encoding, and the per-mode descriptor table.
//!
//! The datapath never inspects mode bits. It reads a [`ModeDescriptor`]:
//! the latency class of each output and the [`Route`] every multiplexer
//! follows. [`apply`] is the formula-level reference the folded datapath is
//! checked against.

use core::fmt;

use pe_math::{
    Coeff,
    modular::{AddSubOp, add, div2, mul, sub},
};
use serde::{Deserialize, Serialize};

use crate::{Error, variant::Variant};

/// Closed set of PE operating modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
pub enum OperatingMode {
    /// Cooley-Tukey butterfly: `(a + b*w, a - b*w)`.
    Ntt = 0b000,
    /// Gentleman-Sande butterfly: `((a + b)/2, (a - b)*w)`.
    Intt = 0b001,
    /// Coordinate-wise multiplication.
    Cwm = 0b010,
    /// Plain `(a + b, a - b)`.
    AddSub = 0b011,
    /// Scaling pass `(a, b*w)`, weight port.
    Codeco1 = 0b100,
    /// Scaling pass `(a, b*w)`, twiddle port on PE3.
    Codeco2 = 0b101,
}

impl OperatingMode {
    pub const ALL: [Self; 6] = [
        Self::Ntt,
        Self::Intt,
        Self::Cwm,
        Self::AddSub,
        Self::Codeco1,
        Self::Codeco2,
    ];

    /// 3-bit control-register encoding.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// Decode a control-register value; `0b110` and `0b111` are undefined.
    pub const fn from_bits(bits: u8) -> Result<Self, Error> {
        Ok(match bits {
            0b000 => Self::Ntt,
            0b001 => Self::Intt,
            0b010 => Self::Cwm,
            0b011 => Self::AddSub,
            0b100 => Self::Codeco1,
            0b101 => Self::Codeco2,
            _ => return Err(Error::UndefinedMode(bits)),
        })
    }

    /// Primary (`u`, `v`) latency in cycles; identical across variants.
    #[must_use]
    pub const fn latency(self) -> usize {
        match self {
            Self::AddSub => 1,
            Self::Cwm | Self::Codeco1 | Self::Codeco2 => 3,
            Self::Ntt | Self::Intt => 4,
        }
    }
}

impl TryFrom<u8> for OperatingMode {
    type Error = Error;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        Self::from_bits(bits)
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ntt => write!(f, "NTT"),
            Self::Intt => write!(f, "INTT"),
            Self::Cwm => write!(f, "CWM"),
            Self::AddSub => write!(f, "ADDSUB"),
            Self::Codeco1 => write!(f, "CODECO1"),
            Self::Codeco2 => write!(f, "CODECO2"),
        }
    }
}

/// Operands of the adder / unified add-subtract pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddSubSource {
    /// Input register `(a, b)`.
    Inputs,
    /// Aligned `a` against multiplier lane 0.
    Butterfly,
    /// Lane 0 against lane 1.
    Lanes,
}

/// Operands of multiplier lane 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneSource {
    /// `b * weight` from the input register.
    InputB,
    /// `a * w` from the input register.
    InputA,
    /// Registered difference times the weight delayed by one cycle.
    Difference,
}

/// Input of the two-cycle alignment delay line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignSource {
    InputA,
    /// Registered sum through the divide-by-two unit.
    HalfSum,
}

/// Where the `(u, v)` pair is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputTap {
    /// Combinational adder / subtractor outputs.
    AddSub,
    /// Registered adder / subtractor outputs.
    Registered,
    /// Aligned value and lane 0.
    AlignedLane0,
    /// Lane 0 and lane 1.
    Lanes,
}

/// Multiplexer settings for one mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub add_sub: AddSubSource,
    /// Operation of the unified unit; `Add` only when it forms the merge sum.
    pub second_op: AddSubOp,
    pub lane0: LaneSource,
    pub align: AlignSource,
    pub tap: OutputTap,
    /// Weight taken from the twiddle port instead of `w`.
    pub twiddle: bool,
}

/// Output latencies of one mode on one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Latency {
    /// Cycles from accept to `(u, v)`.
    pub primary: usize,
    /// Cycles from accept to `m`, if the mode produces one.
    pub merge: Option<usize>,
}

impl Latency {
    /// Cycles until a transaction has fully left the pipeline.
    #[must_use]
    pub fn drain(self) -> usize {
        self.merge.map_or(self.primary, |m| m.max(self.primary))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeDescriptor {
    pub mode: OperatingMode,
    pub latency: Latency,
    pub route: Route,
}

/// Descriptor of `mode` on variant `V`.
#[must_use]
pub fn descriptor<V: Variant>(mode: OperatingMode) -> ModeDescriptor {
    use AddSubSource as S;
    use LaneSource as L;
    use OutputTap as T;

    let primary = mode.latency();
    let (add_sub, lane0, align, tap) = match mode {
        OperatingMode::AddSub => (S::Inputs, L::InputB, AlignSource::InputA, T::AddSub),
        OperatingMode::Ntt => (S::Butterfly, L::InputB, AlignSource::InputA, T::Registered),
        OperatingMode::Intt => (S::Inputs, L::Difference, AlignSource::HalfSum, T::AlignedLane0),
        OperatingMode::Cwm if V::DUAL_LANE => (S::Lanes, L::InputA, AlignSource::InputA, T::Lanes),
        OperatingMode::Cwm => (S::Butterfly, L::InputB, AlignSource::InputA, T::AddSub),
        OperatingMode::Codeco1 | OperatingMode::Codeco2 => {
            (S::Inputs, L::InputB, AlignSource::InputA, T::AlignedLane0)
        }
    };
    let merging = V::DUAL_LANE && mode == OperatingMode::Cwm;
    ModeDescriptor {
        mode,
        latency: Latency { primary, merge: merging.then_some(primary + 1) },
        route: Route {
            add_sub,
            second_op: if merging { AddSubOp::Add } else { AddSubOp::Sub },
            lane0,
            align,
            tap,
            twiddle: V::uses_twiddle(mode),
        },
    }
}

/// Operand tuple of one transaction. Variants ignore ports they lack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Operands {
    pub a: Coeff,
    pub b: Coeff,
    /// Weight (`w`, `w1` on PE2).
    pub w: Coeff,
    /// Second weight, PE2 lane 1.
    pub w2: Coeff,
    /// Alternate weight, PE3.
    pub twiddle: Coeff,
}

impl Operands {
    #[must_use]
    pub const fn new(a: Coeff, b: Coeff, w: Coeff) -> Self {
        Self { a, b, w, w2: Coeff::ZERO, twiddle: Coeff::ZERO }
    }

    /// Checked construction from raw integers.
    pub fn try_new(a: u16, b: u16, w: u16) -> Result<Self, Error> {
        Ok(Self::new(Coeff::new(a)?, Coeff::new(b)?, Coeff::new(w)?))
    }

    #[must_use]
    pub const fn with_w2(mut self, w2: Coeff) -> Self {
        self.w2 = w2;
        self
    }

    #[must_use]
    pub const fn with_twiddle(mut self, twiddle: Coeff) -> Self {
        self.twiddle = twiddle;
        self
    }
}

/// Result of one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeResult {
    pub u: Coeff,
    pub v: Coeff,
    /// `u + v`, PE2 in CWM mode only.
    pub m: Option<Coeff>,
}

/// Formula-level result of `ops` under `mode` on variant `V`.
#[must_use]
pub fn apply<V: Variant>(mode: OperatingMode, ops: &Operands) -> PeResult {
    let weight = if V::uses_twiddle(mode) { ops.twiddle } else { ops.w };
    let pair = |u, v| PeResult { u, v, m: None };
    match mode {
        OperatingMode::Ntt => {
            let t = mul(ops.b, weight);
            pair(add(ops.a, t), sub(ops.a, t))
        }
        OperatingMode::Intt => pair(div2(add(ops.a, ops.b)), mul(sub(ops.a, ops.b), weight)),
        OperatingMode::Cwm if V::DUAL_LANE => {
            let u = mul(ops.a, ops.w);
            let v = mul(ops.b, ops.w2);
            PeResult { u, v, m: Some(add(u, v)) }
        }
        OperatingMode::Cwm => {
            let t = mul(ops.b, weight);
            pair(add(ops.a, t), sub(ops.a, t))
        }
        OperatingMode::AddSub => pair(add(ops.a, ops.b), sub(ops.a, ops.b)),
        OperatingMode::Codeco1 | OperatingMode::Codeco2 => pair(ops.a, mul(ops.b, weight)),
    }
}
