//! Zero-latency modular add, subtract, unified add/subtract and halving.
//!
//! Each unit forms the raw 13-bit result and applies at most one correction
//! by q; canonical operands never need a second one.

use crate::{Coeff, INV2, MONT_R, Product, Q, reduce::table_reduce};

/// Operation selected on a [`uni_add_sub`] unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AddSubOp {
    Add,
    #[default]
    Sub,
}

/// `(a + b) mod q`.
#[inline]
#[must_use]
pub const fn add(a: Coeff, b: Coeff) -> Coeff {
    let s = a.value() + b.value();
    Coeff::from_reduced(if s >= Q { s - Q } else { s })
}

/// `(a - b) mod q`.
#[inline]
#[must_use]
pub const fn sub(a: Coeff, b: Coeff) -> Coeff {
    let d = a.value() as i16 - b.value() as i16;
    Coeff::from_reduced(if d < 0 { (d + Q as i16) as u16 } else { d as u16 })
}

/// Add or subtract on a single adder: subtraction adds `q - b`.
///
/// For `b = 0` the negated operand is `q` itself, which the fold below takes
/// back out, so `a - 0` still lands on `a`.
#[inline]
#[must_use]
pub const fn uni_add_sub(a: Coeff, b: Coeff, op: AddSubOp) -> Coeff {
    let operand = match op {
        AddSubOp::Add => b.value(),
        AddSubOp::Sub => Q - b.value(),
    };
    let s = a.value() + operand;
    Coeff::from_reduced(if s >= Q { s - Q } else { s })
}

/// `a * 2^{-1} mod q`, evaluated as a constant multiply by 1665.
#[inline]
#[must_use]
pub const fn div2(a: Coeff) -> Coeff {
    table_reduce(Product::of(a, Coeff::from_reduced(INV2)))
}

/// Combinational `(a * b) mod q` through the table reducer.
#[inline]
#[must_use]
pub const fn mul(a: Coeff, b: Coeff) -> Coeff {
    table_reduce(Product::of(a, b))
}

/// Convert into the Montgomery domain: `a * 2^{16} mod q`.
#[inline]
#[must_use]
pub const fn to_mont(a: Coeff) -> Coeff {
    mul(a, Coeff::from_reduced(MONT_R))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn c(v: u16) -> Coeff {
        Coeff::new(v).unwrap_or_else(|e| panic!("{e}"))
    }

    fn coeff() -> impl Strategy<Value = Coeff> {
        (0..Q).prop_map(c)
    }

    #[test]
    fn addsub_scenario() {
        assert_eq!(add(c(1000), c(2500)), c(171));
        assert_eq!(sub(c(1000), c(2500)), c(1829));
    }

    #[test]
    fn uni_sub_of_zero_folds_q_back_out() {
        assert_eq!(uni_add_sub(c(0), c(0), AddSubOp::Sub), c(0));
        assert_eq!(uni_add_sub(c(3328), c(0), AddSubOp::Sub), c(3328));
    }

    #[test]
    fn div2_of_one_is_inverse_of_two() {
        assert_eq!(div2(c(1)), c(1665));
        assert_eq!(div2(c(2)), c(1));
    }

    #[test]
    fn add_sub_exhaustive_on_edges() {
        for a in [0, 1, 1664, 1665, 3327, 3328] {
            for b in [0, 1, 1664, 1665, 3327, 3328] {
                assert_eq!(add(c(a), c(b)).value(), (a + b) % Q);
                assert_eq!(sub(c(a), c(b)).value(), (a + Q - b) % Q);
            }
        }
    }

    #[test]
    fn to_mont_scales_by_r() {
        assert_eq!(to_mont(c(1)), c(MONT_R));
        assert_eq!(to_mont(c(0)), c(0));
    }

    proptest! {
        #[test]
        fn prop_add_sub_match_reference(a in coeff(), b in coeff()) {
            let (x, y) = (a.value() as u32, b.value() as u32);
            prop_assert_eq!(add(a, b).value() as u32, (x + y) % 3329);
            prop_assert_eq!(sub(a, b).value() as u32, (x + 3329 - y) % 3329);
        }

        #[test]
        fn prop_uni_add_sub_agrees_with_dedicated_units(a in coeff(), b in coeff()) {
            prop_assert_eq!(uni_add_sub(a, b, AddSubOp::Add), add(a, b));
            prop_assert_eq!(uni_add_sub(a, b, AddSubOp::Sub), sub(a, b));
        }

        #[test]
        fn prop_div2_is_multiplicative_inverse(a in coeff()) {
            let h = div2(a);
            prop_assert_eq!(h.value() as u32, a.value() as u32 * 1665 % 3329);
            prop_assert_eq!(mul(h, c(2)), a);
        }

        #[test]
        fn prop_mul_matches_reference(a in coeff(), b in coeff()) {
            prop_assert_eq!(mul(a, b).value() as u32, a.value() as u32 * b.value() as u32 % 3329);
        }
    }
}
