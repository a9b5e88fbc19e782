use pe_math::{
    Coeff, Product,
    reduce::{table_stage_one, table_stage_two},
};

/// Two-stage table reducer: chunk/LUT sum, then the `k*q` correction.
#[derive(Clone, Debug, Default)]
pub struct TableReducer {
    partial: Option<u16>,
    out: Option<Coeff>,
}

impl TableReducer {
    pub const LATENCY: usize = 2;

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock one edge; returns the reduction of the product given two calls ago.
    #[inline]
    pub fn tick(&mut self, input: Option<Product>) -> Option<Coeff> {
        let visible = self.out;
        self.out = self.partial.map(table_stage_two);
        self.partial = input.map(table_stage_one);
        visible
    }

    /// Whether any stage holds a value.
    #[must_use]
    pub fn busy(&self) -> bool {
        self.partial.is_some() || self.out.is_some()
    }
}
