//! Processing-element variants as zero-sized marker types.
//!
//! The variants share one datapath skeleton and differ only in the resources
//! they instantiate:
//!
//! | Variant | Multiplier lanes | Merge output `m` | Twiddle port |
//! |---|---|---|---|
//! | [`Pe0`] | 1 | no | no |
//! | [`Pe2`] | 2 | yes (CWM) | no |
//! | [`Pe3`] | 1 | no | yes |

use crate::mode::OperatingMode;

mod sealed {
    pub trait Sealed {}
}

pub trait Variant: sealed::Sealed + Send + Sync + 'static {
    /// Name used in logs.
    const NAME: &'static str;
    /// Second multiplier lane plus the `m = u + v` merge output in CWM mode.
    const DUAL_LANE: bool;
    /// Separate `twiddle` weight input.
    const TWIDDLE: bool;

    /// Whether `mode` reads its weight from the twiddle port.
    #[inline]
    fn uses_twiddle(mode: OperatingMode) -> bool {
        Self::TWIDDLE && matches!(mode, OperatingMode::Intt | OperatingMode::Codeco2)
    }
}

macro_rules! pe_variant {
    ($($name:ident: $label:expr, dual_lane = $dual:expr, twiddle = $tw:expr);* $(;)?) => {
        $(
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
            pub struct $name;
            impl sealed::Sealed for $name {}
            impl Variant for $name {
                const NAME: &'static str = $label;
                const DUAL_LANE: bool = $dual;
                const TWIDDLE: bool = $tw;
            }
        )*
    };
}

pe_variant!(
    Pe0: "PE0", dual_lane = false, twiddle = false;
    Pe2: "PE2", dual_lane = true, twiddle = false;
    Pe3: "PE3", dual_lane = false, twiddle = true;
);
