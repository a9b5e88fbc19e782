//! Fixed-depth shift register.

/// `N`-stage delay line: the value shifted in on cycle `t` is shifted out on
/// cycle `t + N`. Starts filled with `T::default()`.
#[derive(Clone, Debug)]
pub struct DelayLine<T, const N: usize> {
    stages: [T; N],
    head: usize,
}

impl<T: Copy + Default, const N: usize> DelayLine<T, N> {
    /// Number of register stages.
    pub const DEPTH: usize = N;

    #[must_use]
    pub fn new() -> Self {
        const { assert!(N > 0, "a delay line needs at least one stage") };
        Self { stages: [T::default(); N], head: 0 }
    }

    /// Clock one edge: shift `input` in, return the value that entered `N`
    /// edges ago.
    #[inline]
    pub fn shift(&mut self, input: T) -> T {
        let out = core::mem::replace(&mut self.stages[self.head], input);
        self.head = (self.head + 1) % N;
        out
    }

    /// Value that the next [`shift`](Self::shift) will return.
    #[inline]
    #[must_use]
    pub fn peek(&self) -> T {
        self.stages[self.head]
    }

    /// Iterate stages from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.stages[self.head..].iter().chain(&self.stages[..self.head])
    }

    /// Reset every stage to `T::default()`.
    pub fn clear(&mut self) {
        self.stages = [T::default(); N];
        self.head = 0;
    }
}

impl<const N: usize> DelayLine<bool, N> {
    /// Whether any stage holds a set bit.
    #[must_use]
    pub fn any(&self) -> bool {
        self.stages.iter().any(|&b| b)
    }
}

impl<T: Copy + Default, const N: usize> Default for DelayLine<T, N> {
    fn default() -> Self {
        Self::new()
    }
}
