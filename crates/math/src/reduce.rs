//! Table-based and Montgomery modular reduction for the ML-KEM field (q = 3329).
//!
//! The table reducer is split into its two register stages so the pipelined
//! model can clock them separately:
//!
//! - [`table_stage_one`]: radix-16 chunk decomposition, LUT lookup, 14-bit sum.
//! - [`table_stage_two`]: constant-time subtraction of the largest `k*q <= s`.
//!
//! [`reduce_table`] and [`reduce_mont`] are the checked single-call forms.

use crate::{Coeff, Error, Lazy, Product, Q};

const Q32: u32 = Q as u32;

/// -q^{-1} mod 2^{16}.
pub const QINV_NEG: u16 = 3327;

/// Exclusive bound on `|z|` for [`reduce_mont`]: q * 2^{15}.
pub const MONT_INPUT_BOUND: i32 = (Q as i32) << 15;

/// Residue of `2^k mod q` for the weight of each 4-bit chunk.
const W12: u32 = (1 << 12) % Q32; // 767
const W16: u32 = (1 << 16) % Q32; // 2285
const W20: u32 = (1 << 20) % Q32; // 3270
const W24: u32 = (1 << 24) % Q32; // 2385
const W25: u32 = (1 << 25) % Q32; // 1441

const fn chunk_lut(weight: u32) -> [u16; 16] {
    let mut lut = [0u16; 16];
    let mut i = 0;
    while i < 16 {
        lut[i] = ((i as u32 * weight) % Q32) as u16;
        i += 1;
    }
    lut
}

/// `(c << 12) mod q` for bits [15:12].
pub const LUT_15_12: [u16; 16] = chunk_lut(W12);
/// `(c << 16) mod q` for bits [19:16].
pub const LUT_19_16: [u16; 16] = chunk_lut(W16);
/// `(c << 20) mod q` for bits [23:20].
pub const LUT_23_20: [u16; 16] = chunk_lut(W20);
/// `(c << 24) mod q` for the 2-bit chunk [25:24].
pub const LUT_25_24: [u16; 4] = [
    0,
    W24 as u16,
    W25 as u16,
    ((W24 + W25) % Q32) as u16,
];

/// Largest value [`table_stage_one`] can produce over the 26-bit domain.
pub const STAGE_ONE_MAX: u16 = {
    const fn max(lut: &[u16]) -> u16 {
        let mut m = 0;
        let mut i = 0;
        while i < lut.len() {
            if lut[i] > m {
                m = lut[i];
            }
            i += 1;
        }
        m
    }
    0x0FFF + max(&LUT_15_12) + max(&LUT_19_16) + max(&LUT_23_20) + max(&LUT_25_24)
};

const _: () = {
    assert!(W12 == 767 && W16 == 2285 && W20 == 3270 && W24 == 2385 && W25 == 1441);
    // 14-bit intermediate, and a 4q compare ladder covers every overshoot.
    assert!(STAGE_ONE_MAX == 16136);
    assert!(STAGE_ONE_MAX < 1 << 14);
    assert!((STAGE_ONE_MAX as u32) < 5 * Q32);
};

/// Stage one: split `p` into `[25:24] [23:20] [19:16] [15:12] [11:0]` and sum
/// the chunk residues. Result is `≡ p (mod q)` and at most [`STAGE_ONE_MAX`].
#[inline]
#[must_use]
pub const fn table_stage_one(p: Product) -> u16 {
    let p = p.value();
    let low = (p & 0x0FFF) as u16;
    low + LUT_15_12[((p >> 12) & 0xF) as usize]
        + LUT_19_16[((p >> 16) & 0xF) as usize]
        + LUT_23_20[((p >> 20) & 0xF) as usize]
        + LUT_25_24[((p >> 24) & 0x3) as usize]
}

/// Stage two: compare against q, 2q, 3q, 4q and subtract the largest multiple
/// not exceeding `s`. Input must come from [`table_stage_one`].
#[inline]
#[must_use]
pub const fn table_stage_two(s: u16) -> Coeff {
    debug_assert!(s <= STAGE_ONE_MAX);
    let s = s as u32;
    let k = (s >= Q32) as u32 + (s >= 2 * Q32) as u32 + (s >= 3 * Q32) as u32 + (s >= 4 * Q32) as u32;
    Coeff::from_reduced((s - k * Q32) as u16)
}

/// Both table stages back to back, for a product already known to fit.
#[inline]
#[must_use]
pub const fn table_reduce(p: Product) -> Coeff {
    table_stage_two(table_stage_one(p))
}

/// Checked table reduction of an unsigned product of at most 26 bits.
#[inline]
pub const fn reduce_table(p: u32) -> Result<Coeff, Error> {
    match Product::new(p) {
        Ok(p) => Ok(table_reduce(p)),
        Err(e) => Err(e),
    }
}

/// Montgomery reduction without the range check: `z * 2^{-16} mod q`, lazy.
///
/// `m = (z mod 2^16) * (-q^{-1}) mod 2^16` taken as a signed 16-bit value,
/// then `(z + m*q) >> 16`; the low half of `z + m*q` is zero.
#[inline]
#[must_use]
pub(crate) const fn mont_reduce(z: i32) -> Lazy {
    debug_assert!(z > -MONT_INPUT_BOUND && z < MONT_INPUT_BOUND);
    let m = (z as i16).wrapping_mul(QINV_NEG as i16);
    Lazy::from_raw(((z + (m as i32) * (Q as i32)) >> 16) as i16)
}

/// Checked Montgomery reduction. Output lies in `(-q, q)` and is congruent to
/// `z * 2^{-16}`; it is not folded into `[0, q)`.
#[inline]
pub const fn reduce_mont(z: i32) -> Result<Lazy, Error> {
    if z > -MONT_INPUT_BOUND && z < MONT_INPUT_BOUND {
        Ok(mont_reduce(z))
    } else {
        Err(Error::MontgomeryInputOutOfRange(z))
    }
}
