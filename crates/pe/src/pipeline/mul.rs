use pe_math::{Coeff, Product};

use super::TableReducer;

/// Full modular multiplier: raw 24-bit product into a [`TableReducer`].
#[derive(Clone, Debug, Default)]
pub struct ModMul {
    reducer: TableReducer,
}

impl ModMul {
    pub const LATENCY: usize = TableReducer::LATENCY;

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock one edge; returns `a*b mod q` for the pair given two calls ago.
    #[inline]
    pub fn tick(&mut self, input: Option<(Coeff, Coeff)>) -> Option<Coeff> {
        self.reducer.tick(input.map(|(a, b)| Product::of(a, b)))
    }

    #[must_use]
    pub fn busy(&self) -> bool {
        self.reducer.busy()
    }
}

#[cfg(test)]
mod tests {
    use pe_math::modular::mul;

    use super::*;

    fn c(v: u16) -> Coeff {
        Coeff::new(v).unwrap_or_else(|e| panic!("{e}"))
    }

    #[test]
    fn back_to_back_products_arrive_in_order() {
        let pairs: Vec<(Coeff, Coeff)> = (0..40u16)
            .map(|i| (c(i * 83 % 3329), c(3328 - i * 61)))
            .collect();
        let mut m = ModMul::new();
        let mut out = Vec::new();
        for x in pairs.iter().copied().map(Some).chain([None, None]) {
            out.extend(m.tick(x));
        }
        let expected: Vec<Coeff> = pairs.iter().map(|&(a, b)| mul(a, b)).collect();
        assert_eq!(out, expected);
    }

    #[test]
    fn latency_is_two_cycles() {
        let mut m = ModMul::new();
        assert_eq!(m.tick(Some((c(3328), c(3328)))), None);
        assert_eq!(m.tick(None), None);
        assert_eq!(m.tick(None), Some(c(1)));
    }
}
