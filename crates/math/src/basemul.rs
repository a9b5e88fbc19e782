//! Karatsuba base-case multiplication in `Z_q[X]/(X^2 - zeta)`.
//!
//! For `a = a0 + a1*X`, `b = b0 + b1*X`:
//!
//! ```text
//! c0 = a0*b0 + zeta*(a1*b1)
//! c1 = a0*b1 + a1*b0 = (a0+a1)*(b0+b1) - a1*b1 - a0*b0
//! ```
//!
//! Four multiplications instead of five. The computation is split at the
//! register boundary of the pipelined unit: [`karatsuba_terms`] reduces the
//! three products in parallel, [`combine`] folds in zeta.

use core::fmt::Debug;

use crate::{
    Coeff, Lazy, Product, Q,
    reduce::{mont_reduce, table_reduce},
};

mod sealed {
    pub trait Sealed {}
}

/// Reduction strategy used inside the base-case multiplier.
pub trait Reduction: sealed::Sealed + 'static {
    /// Representation of a reduced value.
    type Output: Copy + Default + Debug + PartialEq;

    /// Reduce one Karatsuba term (non-negative, below 2^26).
    fn reduce_term(p: Product) -> Self::Output;

    /// `c0` from the reduced low and high terms and zeta.
    fn fold_zeta(low: Self::Output, high: Self::Output, zeta: Coeff) -> Self::Output;

    /// Canonical representative, for comparisons across strategies.
    fn canonical(x: Self::Output) -> Coeff;
}

/// Radix-16 table reduction; outputs are canonical.
#[derive(Debug, Clone, Copy)]
pub struct Table;

/// Montgomery reduction; zeta must be supplied in Montgomery form and outputs
/// are lazy values congruent to `R^{-1} * (c0, c1)`.
#[derive(Debug, Clone, Copy)]
pub struct Montgomery;

impl sealed::Sealed for Table {}
impl sealed::Sealed for Montgomery {}

impl Reduction for Table {
    type Output = Coeff;

    #[inline]
    fn reduce_term(p: Product) -> Coeff {
        table_reduce(p)
    }

    #[inline]
    fn fold_zeta(low: Coeff, high: Coeff, zeta: Coeff) -> Coeff {
        // (q-1) + (q-1)^2 stays well inside 26 bits
        let t = low.value() as u32 + Product::of(high, zeta).value();
        table_reduce(Product::from_raw(t))
    }

    #[inline]
    fn canonical(x: Coeff) -> Coeff {
        x
    }
}

impl Reduction for Montgomery {
    type Output = Lazy;

    #[inline]
    fn reduce_term(p: Product) -> Lazy {
        mont_reduce(p.value() as i32)
    }

    #[inline]
    fn fold_zeta(low: Lazy, high: Lazy, zeta: Coeff) -> Lazy {
        let t = mont_reduce(high.value() as i32 * zeta.value() as i32);
        let s = low.value() + t.value();
        let q = Q as i16;
        Lazy::from_raw(if s >= q {
            s - q
        } else if s <= -q {
            s + q
        } else {
            s
        })
    }

    #[inline]
    fn canonical(x: Lazy) -> Coeff {
        x.canonical()
    }
}

/// Stage-one output: the three reduced Karatsuba terms.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KaratsubaTerms<T> {
    /// `a1*b1`
    pub high: T,
    /// `a0*b0`
    pub low: T,
    /// `(a0+a1)*(b0+b1) - a1*b1 - a0*b0`
    pub mid: T,
}

const _: () = {
    let max = (Q - 1) as u32;
    // 13-bit operand sums, 26-bit product of sums
    assert!(2 * max < 1 << 13);
    assert!((2 * max) * (2 * max) <= Product::MAX);
};

/// Raw (unreduced) Karatsuba products `(high, low, mid)`.
///
/// `mid` equals `a0*b1 + a1*b0`, a sum of non-negative products, so the two
/// subtractions cannot underflow; it is at most `2(q-1)^2 < 2^26`.
#[inline]
#[must_use]
pub const fn karatsuba_products(a: [Coeff; 2], b: [Coeff; 2]) -> (Product, Product, Product) {
    let p_high = Product::of(a[1], b[1]).value();
    let p_low = Product::of(a[0], b[0]).value();
    let sum_a = a[0].value() as u32 + a[1].value() as u32;
    let sum_b = b[0].value() as u32 + b[1].value() as u32;
    let p_sum = sum_a * sum_b;
    let mid = p_sum - p_high - p_low;
    (
        Product::from_raw(p_high),
        Product::from_raw(p_low),
        Product::from_raw(mid),
    )
}

/// Stage one: the three reductions that run in parallel.
#[inline]
#[must_use]
pub fn karatsuba_terms<R: Reduction>(a: [Coeff; 2], b: [Coeff; 2]) -> KaratsubaTerms<R::Output> {
    let (high, low, mid) = karatsuba_products(a, b);
    KaratsubaTerms {
        high: R::reduce_term(high),
        low: R::reduce_term(low),
        mid: R::reduce_term(mid),
    }
}

/// Stage two: `[c0, c1]` from the stage-one terms and the aligned zeta.
#[inline]
#[must_use]
pub fn combine<R: Reduction>(terms: KaratsubaTerms<R::Output>, zeta: Coeff) -> [R::Output; 2] {
    [R::fold_zeta(terms.low, terms.high, zeta), terms.mid]
}

/// Base-case product `a * b mod (X^2 - zeta)`.
#[inline]
#[must_use]
pub fn basemul<R: Reduction>(a: [Coeff; 2], b: [Coeff; 2], zeta: Coeff) -> [R::Output; 2] {
    combine::<R>(karatsuba_terms::<R>(a, b), zeta)
}
