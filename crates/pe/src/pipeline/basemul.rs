use core::marker::PhantomData;

use pe_math::{
    Coeff,
    basemul::{KaratsubaTerms, Reduction, combine, karatsuba_terms},
};

/// Operands of one base-case product.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BaseCaseInput {
    pub a: [Coeff; 2],
    pub b: [Coeff; 2],
    pub zeta: Coeff,
}

/// Stage-one register: reduced terms plus zeta, delayed to line up with them.
#[derive(Clone, Copy, Debug)]
struct Stage<T> {
    terms: KaratsubaTerms<T>,
    zeta: Coeff,
}

/// Two-stage Karatsuba multiplier over `Z_q[X]/(X^2 - zeta)`.
#[derive(Clone, Debug)]
pub struct BaseCaseMultiplier<R: Reduction> {
    stage: Option<Stage<R::Output>>,
    out: Option<[R::Output; 2]>,
    _reduction: PhantomData<R>,
}

impl<R: Reduction> BaseCaseMultiplier<R> {
    pub const LATENCY: usize = 2;

    #[must_use]
    pub fn new() -> Self {
        Self { stage: None, out: None, _reduction: PhantomData }
    }

    /// Clock one edge; returns `[c0, c1]` for the operands given two calls ago.
    pub fn tick(&mut self, input: Option<BaseCaseInput>) -> Option<[R::Output; 2]> {
        let visible = self.out;
        self.out = self.stage.map(|s| combine::<R>(s.terms, s.zeta));
        self.stage = input.map(|x| Stage { terms: karatsuba_terms::<R>(x.a, x.b), zeta: x.zeta });
        visible
    }

    #[must_use]
    pub fn busy(&self) -> bool {
        self.stage.is_some() || self.out.is_some()
    }
}

impl<R: Reduction> Default for BaseCaseMultiplier<R> {
    fn default() -> Self {
        Self::new()
    }
}
