//! Register-level model of the folded PE datapath.
//!
//! One input register, one adder and one unified add/subtract unit sharing a
//! sum/difference register, one or two two-cycle multipliers, a weight
//! register for the INTT path, a two-cycle alignment delay line and dedicated
//! valid-bit delay lines per latency class (1, 3 and 4 cycles for `u, v`, 4
//! for the PE2 merge). An accept enters only the lines of the mode it was
//! accepted in, and the valid output is the OR of all pair lines. The data
//! multiplexers read the route of the *current* mode, so a valid bit that
//! outlives a mode change comes out on time carrying the new mode's formula.
//!
//! Timing per mode, accept on cycle `t`:
//!
//! ```text
//! ADDSUB  t+1  in_reg -> adder/unified (comb)                     -> u, v
//! NTT     t+1  in_reg.b*w -> lane0 (t+3) ± aligned a -> sd_reg (t+4) -> u, v
//! INTT    t+1  in_reg a±b -> sd_reg; t+2 diff*w_d1 -> lane0 (t+4)    -> v
//!              t+2  sd.sum/2 -> align (t+4)                            -> u
//! CWM     t+1  lane0 (and lane1 on PE2) -> t+3 -> u, v; PE2: u+v -> sd_reg (t+4) -> m
//! CODECO  t+1  in_reg.b*w -> lane0 (t+3), a -> align (t+3)           -> u, v
//! ```

use core::marker::PhantomData;

use pe_math::{
    Coeff,
    modular::{add, div2, uni_add_sub},
};

use crate::{
    delay::DelayLine,
    mode::{AddSubSource, AlignSource, LaneSource, ModeDescriptor, Operands, OutputTap},
    pipeline::ModMul,
    variant::Variant,
};

/// Sum / difference register shared by the butterfly output, the INTT first
/// stage and the PE2 merge.
#[derive(Debug, Clone, Copy, Default)]
struct SumDiff {
    sum: Coeff,
    diff: Coeff,
}

/// Outputs visible during one cycle, gated by their valid bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Visible {
    pub pair: Option<(Coeff, Coeff)>,
    pub merge: Option<Coeff>,
}

#[derive(Debug, Clone)]
pub(crate) struct Datapath<V: Variant> {
    input: Operands,
    sd: SumDiff,
    weight_d1: Coeff,
    lane0: ModMul,
    lane1: ModMul,
    align: DelayLine<Coeff, 2>,
    valid_d1: DelayLine<bool, 1>,
    valid_d3: DelayLine<bool, 3>,
    valid_d4: DelayLine<bool, 4>,
    valid_merge: DelayLine<bool, 4>,
    _variant: PhantomData<V>,
}

impl<V: Variant> Datapath<V> {
    pub(crate) fn new() -> Self {
        Self {
            input: Operands::default(),
            sd: SumDiff::default(),
            weight_d1: Coeff::ZERO,
            lane0: ModMul::new(),
            lane1: ModMul::new(),
            align: DelayLine::new(),
            valid_d1: DelayLine::new(),
            valid_d3: DelayLine::new(),
            valid_d4: DelayLine::new(),
            valid_merge: DelayLine::new(),
            _variant: PhantomData,
        }
    }

    /// Whether a valid bit is still travelling through any latency class.
    pub(crate) fn busy(&self) -> bool {
        self.valid_d1.any() || self.valid_d3.any() || self.valid_d4.any() || self.valid_merge.any()
    }

    /// Evaluate the combinational logic under `desc`, then clock one edge,
    /// capturing `next` into the input register (zeros when idle).
    pub(crate) fn clock(&mut self, desc: &ModeDescriptor, next: Option<&Operands>) -> Visible {
        let route = desc.route;
        let inp = self.input;
        let weight = if route.twiddle { inp.twiddle } else { inp.w };

        let (x0, y0) = match route.lane0 {
            LaneSource::InputB => (inp.b, weight),
            LaneSource::InputA => (inp.a, inp.w),
            LaneSource::Difference => (self.sd.diff, self.weight_d1),
        };
        let p0 = self.lane0.tick(Some((x0, y0))).unwrap_or_default();
        let p1 = if V::DUAL_LANE {
            self.lane1.tick(Some((inp.b, inp.w2))).unwrap_or_default()
        } else {
            Coeff::ZERO
        };

        let aligned = self.align.shift(match route.align {
            AlignSource::InputA => inp.a,
            AlignSource::HalfSum => div2(self.sd.sum),
        });

        let (x, y) = match route.add_sub {
            AddSubSource::Inputs => (inp.a, inp.b),
            AddSubSource::Butterfly => (aligned, p0),
            AddSubSource::Lanes => (p0, p1),
        };
        let s = add(x, y);
        let d = uni_add_sub(x, y, route.second_op);

        let pair = match route.tap {
            OutputTap::AddSub => (s, d),
            OutputTap::Registered => (self.sd.sum, self.sd.diff),
            OutputTap::AlignedLane0 => (aligned, p0),
            OutputTap::Lanes => (p0, p1),
        };
        let merge = self.sd.diff;

        let accept = next.is_some();
        let class = desc.latency.primary;
        let pair_valid = self.valid_d1.shift(accept && class == 1)
            | self.valid_d3.shift(accept && class == 3)
            | self.valid_d4.shift(accept && class == 4);
        // merge latency is always four
        let merge_valid = self.valid_merge.shift(accept && desc.latency.merge.is_some());

        self.sd = SumDiff { sum: s, diff: d };
        self.weight_d1 = weight;
        self.input = next.copied().unwrap_or_default();

        Visible {
            pair: pair_valid.then_some(pair),
            merge: merge_valid.then_some(merge),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mode::{OperatingMode, apply, descriptor},
        variant::{Pe0, Pe2, Pe3},
    };

    fn c(v: u16) -> Coeff {
        Coeff::new(v).unwrap_or_else(|e| panic!("{e}"))
    }

    fn ops(i: u16) -> Operands {
        Operands::new(c(i * 331 % 3329), c(3328 - i * 17), c(i * 97 % 3329))
            .with_w2(c(i * 1201 % 3329))
            .with_twiddle(c(i * 29 + 1))
    }

    /// Stream `n` back-to-back transactions and record on which cycle each
    /// pair / merge output became valid.
    fn stream<V: Variant>(mode: OperatingMode, n: u16) -> (Vec<(usize, (Coeff, Coeff))>, Vec<(usize, Coeff)>) {
        let desc = descriptor::<V>(mode);
        let mut dp = Datapath::<V>::new();
        let inputs: Vec<Operands> = (0..n).map(ops).collect();
        let mut pairs = Vec::new();
        let mut merges = Vec::new();
        for cycle in 0..n as usize + 6 {
            let out = dp.clock(&desc, inputs.get(cycle));
            if let Some(p) = out.pair {
                pairs.push((cycle, p));
            }
            if let Some(m) = out.merge {
                merges.push((cycle, m));
            }
        }
        assert!(!dp.busy());
        (pairs, merges)
    }

    fn check_mode<V: Variant>(mode: OperatingMode) {
        let n = 8;
        let desc = descriptor::<V>(mode);
        let (pairs, merges) = stream::<V>(mode, n);
        assert_eq!(pairs.len(), n as usize, "{} {mode}", V::NAME);
        for (i, &(cycle, (u, v))) in pairs.iter().enumerate() {
            let expected = apply::<V>(mode, &ops(i as u16));
            assert_eq!(cycle, i + desc.latency.primary, "{} {mode} latency", V::NAME);
            assert_eq!((u, v), (expected.u, expected.v), "{} {mode} txn {i}", V::NAME);
        }
        match desc.latency.merge {
            Some(lat) => {
                assert_eq!(merges.len(), n as usize);
                for (i, &(cycle, m)) in merges.iter().enumerate() {
                    assert_eq!(cycle, i + lat);
                    assert_eq!(Some(m), apply::<V>(mode, &ops(i as u16)).m);
                }
            }
            None => assert!(merges.is_empty()),
        }
    }

    #[test]
    fn every_mode_matches_reference_on_every_variant() {
        for mode in OperatingMode::ALL {
            check_mode::<Pe0>(mode);
            check_mode::<Pe2>(mode);
            check_mode::<Pe3>(mode);
        }
    }

    #[test]
    fn mid_flight_switch_misroutes_in_flight_data() {
        let ntt = descriptor::<Pe0>(OperatingMode::Ntt);
        let intt = descriptor::<Pe0>(OperatingMode::Intt);
        let mut dp = Datapath::<Pe0>::new();
        let x = Operands::new(c(1000), c(2500), c(7));

        assert_eq!(dp.clock(&ntt, Some(&x)), Visible::default());
        // Same latency class: the NTT valid bit still fires on cycle 4, but
        // the data went through the INTT routing.
        for _ in 1..4 {
            assert_eq!(dp.clock(&intt, None), Visible::default());
        }
        let out = dp.clock(&intt, None);
        let corrupted = apply::<Pe0>(OperatingMode::Intt, &x);
        assert_eq!(out.pair, Some((corrupted.u, corrupted.v)));
        let intended = apply::<Pe0>(OperatingMode::Ntt, &x);
        assert_ne!(out.pair, Some((intended.u, intended.v)));
        assert!(!dp.busy());
    }

    #[test]
    fn only_the_accepting_class_carries_the_valid_bit() {
        let addsub = descriptor::<Pe0>(OperatingMode::AddSub);
        let mut dp = Datapath::<Pe0>::new();
        dp.clock(&addsub, Some(&Operands::new(c(1000), c(2500), c(0))));
        assert_eq!(dp.clock(&addsub, None).pair, Some((c(171), c(1829))));
        assert!(!dp.busy());
    }

    #[test]
    fn pe2_merge_line_only_fed_in_cwm() {
        let cwm = descriptor::<Pe2>(OperatingMode::Cwm);
        let mut dp = Datapath::<Pe2>::new();
        dp.clock(&cwm, Some(&ops(3)));
        for _ in 1..=4 {
            dp.clock(&cwm, None);
        }
        assert!(!dp.busy());
        let (_, merges) = stream::<Pe2>(OperatingMode::Ntt, 4);
        assert!(merges.is_empty());
    }
}
