//! Processing element: the folded datapath behind a transaction-level
//! state machine.
//!
//! The element owns the single mode register. Every accepted transaction is
//! recorded in an in-flight queue together with the cycle it must complete
//! on. While all in-flight transactions share one mode and one latency the
//! queue is strictly FIFO and never deeper than the drain latency. A mode
//! change is only legal once the queue is empty.

use std::collections::VecDeque;
use std::fmt;

use pe_math::Coeff;
use tracing::{debug, trace, warn};

use crate::{
    Error,
    config::{HazardPolicy, PeConfig},
    datapath::Datapath,
    error::Result,
    mode::{ModeDescriptor, OperatingMode, Operands, PeResult, apply, descriptor},
    variant::Variant,
};

/// Sequence number assigned on acceptance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransactionId(pub u64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Unit of work offered on one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transaction {
    pub mode: OperatingMode,
    pub operands: Operands,
}

impl Transaction {
    #[must_use]
    pub const fn new(mode: OperatingMode, operands: Operands) -> Self {
        Self { mode, operands }
    }
}

/// One output pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion<T> {
    /// Owning transaction; `None` for a ghost pulse that belongs to no
    /// transaction due on this cycle.
    pub id: Option<TransactionId>,
    /// Mode the datapath was routed for when the pulse left it.
    pub mode: OperatingMode,
    pub cycle: u64,
    pub value: T,
}

/// Everything that left the element on one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Emission {
    /// `(u, v)`.
    pub pair: Option<Completion<(Coeff, Coeff)>>,
    /// `m`, PE2 in CWM mode.
    pub merge: Option<Completion<Coeff>>,
}

impl Emission {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pair.is_none() && self.merge.is_none()
    }
}

/// Pipeline occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Nothing in flight; the mode may change.
    Idle,
    /// A transaction was accepted on the last cycle.
    Streaming { mode: OperatingMode, in_flight: usize },
    /// No accept on the last cycle, results still pending.
    Draining { mode: OperatingMode, in_flight: usize },
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    id: TransactionId,
    mode: OperatingMode,
    accepted: u64,
    expected: PeResult,
    pair_done: bool,
    merge_pending: bool,
}

impl InFlight {
    fn done(&self) -> bool {
        self.pair_done && !self.merge_pending
    }

    /// Last cycle this transaction can legitimately emit on.
    fn deadline<V: Variant>(&self) -> u64 {
        self.accepted + descriptor::<V>(self.mode).latency.drain() as u64
    }
}

/// Cycle-stepped processing element of variant `V`.
#[derive(Debug, Clone)]
pub struct ProcessingElement<V: Variant> {
    config: PeConfig,
    mode: OperatingMode,
    desc: ModeDescriptor,
    datapath: Datapath<V>,
    in_flight: VecDeque<InFlight>,
    state: PipelineState,
    cycle: u64,
    next_id: u64,
}

impl<V: Variant> ProcessingElement<V> {
    /// New idle element in `mode`.
    #[must_use]
    pub fn new(mode: OperatingMode, config: PeConfig) -> Self {
        Self {
            config,
            mode,
            desc: descriptor::<V>(mode),
            datapath: Datapath::new(),
            in_flight: VecDeque::with_capacity(4),
            state: PipelineState::Idle,
            cycle: 0,
            next_id: 0,
        }
    }

    #[must_use]
    pub fn mode(&self) -> OperatingMode {
        self.mode
    }

    #[must_use]
    pub fn config(&self) -> &PeConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Cycles clocked so far; the next tick runs on this cycle number.
    #[must_use]
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// No transaction pending and no valid bit left in the datapath.
    #[must_use]
    pub fn is_drained(&self) -> bool {
        self.in_flight.is_empty() && !self.datapath.busy()
    }

    /// Rewrite the mode register.
    ///
    /// Legal once the pipeline has drained, i.e. `latency(mode)` cycles after
    /// the last accept. Before that this fails under
    /// [`HazardPolicy::Reject`]; under [`HazardPolicy::Faithful`] the switch
    /// happens and the in-flight data is routed through the new mode's
    /// multiplexer settings.
    pub fn set_mode(&mut self, mode: OperatingMode) -> Result<()> {
        if mode == self.mode {
            return Ok(());
        }
        let in_flight = self.in_flight.len();
        if !self.is_drained() {
            match self.config.hazard_policy {
                HazardPolicy::Reject => {
                    return Err(Error::ModeSwitchInFlight { current: self.mode, requested: mode, in_flight });
                }
                HazardPolicy::Faithful => {
                    warn!(pe = V::NAME, from = %self.mode, to = %mode, in_flight, "mode switched mid-flight");
                }
            }
        }
        debug!(pe = V::NAME, from = %self.mode, to = %mode, cycle = self.cycle, "mode change");
        self.mode = mode;
        self.desc = descriptor::<V>(mode);
        Ok(())
    }

    /// Clock one cycle, optionally accepting a transaction.
    ///
    /// A transaction whose mode differs from the current one switches the
    /// mode first, subject to [`set_mode`](Self::set_mode). The returned
    /// emission holds whatever the datapath presented on this cycle, which
    /// never includes the transaction accepted on it.
    pub fn tick(&mut self, input: Option<Transaction>) -> Result<(Emission, Option<TransactionId>)> {
        if let Some(tx) = &input {
            self.set_mode(tx.mode)?;
        }
        let cycle = self.cycle;
        let visible = self.datapath.clock(&self.desc, input.as_ref().map(|tx| &tx.operands));

        let mut emission = Emission::default();
        if let Some(value) = visible.pair {
            let id = self.claim_pair(cycle);
            if let Some(id) = id {
                self.verify(id, value)?;
            }
            emission.pair = Some(Completion { id, mode: self.mode, cycle, value });
        }
        if let Some(value) = visible.merge {
            let id = self.claim_merge(cycle, value)?;
            emission.merge = Some(Completion { id, mode: self.mode, cycle, value });
        }
        self.retire(cycle);

        let accepted = input.map(|tx| {
            let id = TransactionId(self.next_id);
            self.next_id += 1;
            let expected = apply::<V>(tx.mode, &tx.operands);
            trace!(pe = V::NAME, %id, mode = %tx.mode, cycle, "accept");
            self.in_flight.push_back(InFlight {
                id,
                mode: tx.mode,
                accepted: cycle,
                expected,
                pair_done: false,
                merge_pending: expected.m.is_some(),
            });
            id
        });

        self.cycle += 1;
        let in_flight = self.in_flight.len();
        self.state = match (accepted, in_flight) {
            (Some(_), _) => PipelineState::Streaming { mode: self.mode, in_flight },
            (None, 0) => PipelineState::Idle,
            (None, _) => PipelineState::Draining { mode: self.mode, in_flight },
        };
        Ok((emission, accepted))
    }

    /// Accept `operands` in the current mode.
    pub fn submit(&mut self, operands: Operands) -> Result<(Emission, TransactionId)> {
        let id = TransactionId(self.next_id);
        let (emission, _) = self.tick(Some(Transaction::new(self.mode, operands)))?;
        Ok((emission, id))
    }

    /// Clock one cycle with the accept line low.
    pub fn idle(&mut self) -> Result<Emission> {
        self.tick(None).map(|(emission, _)| emission)
    }

    /// Clock idle cycles until nothing is left in flight. Returns the
    /// non-empty emissions in cycle order.
    pub fn drain(&mut self) -> Result<Vec<Emission>> {
        let mut out = Vec::new();
        let start = self.cycle;
        while !self.is_drained() {
            let emission = self.idle()?;
            if !emission.is_empty() {
                out.push(emission);
            }
        }
        debug!(pe = V::NAME, cycles = self.cycle - start, "drained");
        Ok(out)
    }

    /// Run a whole batch in `mode`: drain, switch, stream back-to-back, drain.
    /// Results are returned in submission order.
    pub fn run<I>(&mut self, mode: OperatingMode, operands: I) -> Result<Vec<PeResult>>
    where
        I: IntoIterator<Item = Operands>,
    {
        self.drain()?;
        self.set_mode(mode)?;
        let first = self.next_id;
        let mut pairs: Vec<Option<(Coeff, Coeff)>> = Vec::new();
        let mut merges: Vec<Option<Coeff>> = Vec::new();
        let mut collect = |e: Emission| {
            let slot = |id: Option<TransactionId>| id.map(|id| (id.0 - first) as usize);
            if let Some(p) = e.pair
                && let Some(i) = slot(p.id)
            {
                if pairs.len() <= i {
                    pairs.resize(i + 1, None);
                }
                pairs[i] = Some(p.value);
            }
            if let Some(m) = e.merge
                && let Some(i) = slot(m.id)
            {
                if merges.len() <= i {
                    merges.resize(i + 1, None);
                }
                merges[i] = Some(m.value);
            }
        };
        let mut count = 0;
        for ops in operands {
            let (emission, _) = self.submit(ops)?;
            collect(emission);
            count += 1;
        }
        for emission in self.drain()? {
            collect(emission);
        }

        let merging = descriptor::<V>(mode).latency.merge.is_some();
        (0..count)
            .map(|i| -> Result<PeResult> {
                let id = TransactionId(first + i as u64);
                let (u, v) = pairs.get(i).copied().flatten().ok_or(Error::MissingCompletion(id))?;
                let m = if merging {
                    Some(merges.get(i).copied().flatten().ok_or(Error::MissingCompletion(id))?)
                } else {
                    None
                };
                Ok(PeResult { u, v, m })
            })
            .collect()
    }

    /// Match a pair pulse to the oldest transaction still owing a pair whose
    /// due cycle is this one.
    fn claim_pair(&mut self, cycle: u64) -> Option<TransactionId> {
        let Some(entry) = self
            .in_flight
            .iter_mut()
            .find(|t| !t.pair_done && t.accepted + t.mode.latency() as u64 == cycle)
        else {
            warn!(pe = V::NAME, cycle, mode = %self.mode, "ghost pulse on pair output");
            return None;
        };
        entry.pair_done = true;
        trace!(pe = V::NAME, id = %entry.id, cycle, "pair");
        Some(entry.id)
    }

    fn claim_merge(&mut self, cycle: u64, value: Coeff) -> Result<Option<TransactionId>> {
        let Some(entry) = self
            .in_flight
            .iter_mut()
            .find(|t| t.merge_pending && t.deadline::<V>() == cycle)
        else {
            warn!(pe = V::NAME, cycle, "ghost pulse on merge output");
            return Ok(None);
        };
        entry.merge_pending = false;
        let (id, expected) = (entry.id, entry.expected);
        if let Some(expected) = expected.m
            && expected != value
        {
            if self.checking() {
                return Err(Error::MergeMismatch { id, got: value, expected });
            }
            if self.config.hazard_policy == HazardPolicy::Faithful {
                warn!(pe = V::NAME, %id, cycle, "merge output corrupted by mode switch");
            }
        }
        Ok(Some(id))
    }

    fn verify(&self, id: TransactionId, got: (Coeff, Coeff)) -> Result<()> {
        match self.in_flight.iter().find(|t| t.id == id) {
            Some(t) if (t.expected.u, t.expected.v) != got => {
                if self.checking() {
                    return Err(Error::DatapathMismatch { id, mode: t.mode, got, expected: t.expected });
                }
                if self.config.hazard_policy == HazardPolicy::Faithful {
                    warn!(pe = V::NAME, %id, mode = %t.mode, routed = %self.mode, "result corrupted by mode switch");
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn checking(&self) -> bool {
        self.config.cross_check && self.config.hazard_policy == HazardPolicy::Reject
    }

    /// Drop completed transactions and those whose deadline passed without a
    /// matching pulse.
    fn retire(&mut self, cycle: u64) {
        self.in_flight.retain(|t| {
            if t.done() {
                return false;
            }
            if t.deadline::<V>() <= cycle {
                warn!(pe = V::NAME, id = %t.id, mode = %t.mode, cycle, "transaction lost");
                return false;
            }
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::{Pe0, Pe2};

    fn c(v: u16) -> Coeff {
        Coeff::new(v).unwrap_or_else(|e| panic!("{e}"))
    }

    fn strict() -> PeConfig {
        PeConfig::default().with_cross_check(true)
    }

    #[test]
    fn addsub_completes_after_one_cycle() {
        let mut pe = ProcessingElement::<Pe0>::new(OperatingMode::AddSub, strict());
        let (first, id) = pe.submit(Operands::new(c(1000), c(2500), c(0))).unwrap();
        assert!(first.is_empty());
        assert_eq!(pe.state(), PipelineState::Streaming { mode: OperatingMode::AddSub, in_flight: 1 });
        let out = pe.idle().unwrap();
        let pair = out.pair.unwrap();
        assert_eq!(pair.id, Some(id));
        assert_eq!(pair.cycle, 1);
        assert_eq!(pair.value, (c(171), c(1829)));
        assert_eq!(pe.state(), PipelineState::Idle);
    }

    #[test]
    fn state_machine_walks_streaming_draining_idle() {
        let mut pe = ProcessingElement::<Pe0>::new(OperatingMode::Ntt, strict());
        assert_eq!(pe.state(), PipelineState::Idle);
        pe.submit(Operands::new(c(1), c(2), c(3))).unwrap();
        pe.submit(Operands::new(c(4), c(5), c(6))).unwrap();
        assert_eq!(pe.state(), PipelineState::Streaming { mode: OperatingMode::Ntt, in_flight: 2 });
        pe.idle().unwrap();
        assert_eq!(pe.state(), PipelineState::Draining { mode: OperatingMode::Ntt, in_flight: 2 });
        let emitted = pe.drain().unwrap();
        assert_eq!(emitted.len(), 2);
        assert_eq!(pe.state(), PipelineState::Idle);
        assert_eq!(pe.cycle(), 6);
    }

    #[test]
    fn mode_switch_rejected_until_drained() {
        let mut pe = ProcessingElement::<Pe0>::new(OperatingMode::Ntt, strict());
        pe.submit(Operands::new(c(1), c(2), c(3))).unwrap();
        for _ in 0..3 {
            assert_eq!(
                pe.set_mode(OperatingMode::AddSub),
                Err(Error::ModeSwitchInFlight {
                    current: OperatingMode::Ntt,
                    requested: OperatingMode::AddSub,
                    in_flight: 1
                })
            );
            pe.idle().unwrap();
        }
        // fourth idle cycle delivers the result
        assert!(pe.set_mode(OperatingMode::AddSub).is_err());
        assert!(pe.idle().unwrap().pair.is_some());
        assert_eq!(pe.set_mode(OperatingMode::AddSub), Ok(()));
    }

    #[test]
    fn switch_allowed_once_previous_latency_elapsed() {
        let mut pe = ProcessingElement::<Pe0>::new(OperatingMode::AddSub, strict());
        pe.submit(Operands::new(c(1000), c(2500), c(0))).unwrap();
        assert!(pe.set_mode(OperatingMode::Ntt).is_err());
        assert!(pe.idle().unwrap().pair.is_some());
        assert!(pe.is_drained());
        assert_eq!(pe.set_mode(OperatingMode::Ntt), Ok(()));
        assert_eq!(pe.mode(), OperatingMode::Ntt);
    }

    #[test]
    fn pe2_merge_arrives_one_cycle_after_pair() {
        let mut pe = ProcessingElement::<Pe2>::new(OperatingMode::Cwm, strict());
        let ops = Operands::new(c(2), c(3), c(100)).with_w2(c(1000));
        let (_, id) = pe.submit(ops).unwrap();
        for _ in 0..2 {
            assert!(pe.idle().unwrap().is_empty());
        }
        let e3 = pe.idle().unwrap();
        assert_eq!(e3.pair.map(|p| (p.id, p.value)), Some((Some(id), (c(200), c(3000)))));
        assert!(e3.merge.is_none());
        assert_eq!(pe.in_flight(), 1);
        let e4 = pe.idle().unwrap();
        assert_eq!(e4.merge.map(|m| (m.id, m.value)), Some((Some(id), c(3200))));
        assert!(pe.is_drained());
    }

    #[test]
    fn run_switches_modes_between_batches() {
        let mut pe = ProcessingElement::<Pe0>::new(OperatingMode::Ntt, strict());
        let batch: Vec<Operands> = (1..=5).map(|i| Operands::new(c(i), c(i + 1), c(i + 2))).collect();
        let ntt = pe.run(OperatingMode::Ntt, batch.clone()).unwrap();
        let addsub = pe.run(OperatingMode::AddSub, batch.clone()).unwrap();
        for (i, ops) in batch.iter().enumerate() {
            assert_eq!(ntt[i], apply::<Pe0>(OperatingMode::Ntt, ops));
            assert_eq!(addsub[i], apply::<Pe0>(OperatingMode::AddSub, ops));
        }
    }
}
