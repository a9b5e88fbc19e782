//! Combinational arithmetic for the ML-KEM processing elements.
//!
//! Fixed-width modular arithmetic over `Z_q`, q = 3329, in the form the
//! accelerator datapath evaluates it: zero-latency add/subtract/halve,
//! the radix-16 table reducer, the signed Montgomery reducer, and the
//! Karatsuba base-case multiplier in `Z_q[X]/(X^2 - zeta)`. The cycle-level
//! pipelines built from these live in `kyber-pe`.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]
#![allow(
    clippy::cast_lossless,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::many_single_char_names
)]

pub mod basemul;
pub mod coeff;
pub mod error;
pub mod modular;
pub mod reduce;
pub mod zetas;

pub use coeff::{Coeff, Lazy, Product};
pub use error::Error;

/// Field modulus.
pub const Q: u16 = 3329;

/// Width in bits of a canonical coefficient.
pub const COEFF_BITS: u32 = 12;

/// Width in bits of the widest product the table reducer accepts.
pub const PRODUCT_BITS: u32 = 26;

/// 2^{-1} mod q.
pub const INV2: u16 = 1665;

/// R = 2^{16} mod q (Montgomery radix residue).
pub const MONT_R: u16 = 2285;

const _: () = {
    assert!((2 * INV2 as u32) % Q as u32 == 1);
    assert!((1u32 << 16) % Q as u32 == MONT_R as u32);
    assert!((Q as u32) < (1 << COEFF_BITS));
};
