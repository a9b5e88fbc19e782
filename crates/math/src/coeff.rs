//! Range-carrying integer types used on the datapath.
//!
//! - [`Coeff`]: canonical element of `Z_q`, 12-bit field, `[0, q - 1]`.
//! - [`Product`]: unsigned raw product, at most 26 bits.
//! - [`Lazy`]: Montgomery output, only known to lie in `(-q, q)`.

use core::fmt;

use crate::{Error, PRODUCT_BITS, Q};

/// Canonical representative of an element of `Z_q`.
///
/// The only way to obtain one from an arbitrary integer is [`Coeff::new`],
/// so every combinational unit taking `Coeff` operands can rely on the
/// canonical range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coeff(u16);

impl Coeff {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(1);
    /// q - 1, the largest canonical value.
    pub const MAX: Self = Self(Q - 1);

    /// Checked construction; fails for `value >= q`.
    #[inline]
    pub const fn new(value: u16) -> Result<Self, Error> {
        if value < Q {
            Ok(Self(value))
        } else {
            Err(Error::OperandOutOfRange(value as u32))
        }
    }

    /// Wrap a value the caller has already folded into `[0, q)`.
    #[inline]
    pub(crate) const fn from_reduced(value: u16) -> Self {
        debug_assert!(value < Q);
        Self(value)
    }

    #[inline]
    #[must_use]
    pub const fn value(self) -> u16 {
        self.0
    }
}

impl TryFrom<u16> for Coeff {
    type Error = Error;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Coeff> for u16 {
    fn from(c: Coeff) -> Self {
        c.0
    }
}

impl fmt::Display for Coeff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unsigned product fed to the table reducer, `[0, 2^26 - 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Product(u32);

impl Product {
    /// Largest value the reducer's chunk decomposition covers.
    pub const MAX: u32 = (1 << PRODUCT_BITS) - 1;

    /// Checked construction; fails above 26 bits.
    #[inline]
    pub const fn new(value: u32) -> Result<Self, Error> {
        if value <= Self::MAX {
            Ok(Self(value))
        } else {
            Err(Error::ProductOutOfRange(value))
        }
    }

    /// Raw 24-bit product of two canonical coefficients.
    #[inline]
    #[must_use]
    pub const fn of(a: Coeff, b: Coeff) -> Self {
        Self((a.0 as u32) * (b.0 as u32))
    }

    #[inline]
    pub(crate) const fn from_raw(value: u32) -> Self {
        debug_assert!(value <= Self::MAX);
        Self(value)
    }

    #[inline]
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

/// Lazily reduced value in the open interval `(-q, q)`.
///
/// Must be folded with [`Lazy::canonical`] before it is compared with a
/// value produced by a canonical reducer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Lazy(i16);

impl Lazy {
    #[inline]
    pub(crate) const fn from_raw(value: i16) -> Self {
        debug_assert!(value > -(Q as i16) && value < Q as i16);
        Self(value)
    }

    #[inline]
    #[must_use]
    pub const fn value(self) -> i16 {
        self.0
    }

    /// Fold into `[0, q)` with a single conditional add.
    #[inline]
    #[must_use]
    pub const fn canonical(self) -> Coeff {
        let v = if self.0 < 0 { self.0 + Q as i16 } else { self.0 };
        Coeff::from_reduced(v as u16)
    }
}

impl From<Coeff> for Lazy {
    fn from(c: Coeff) -> Self {
        Self(c.0 as i16)
    }
}

impl fmt::Display for Lazy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
