macro_rules! unit {
    ($name: ident) => {
        #[derive(
            Debug,
            Default,
            Copy,
            Clone,
            PartialOrd,
            Ord,
            PartialEq,
            Eq,
            Hash,
            derive_more::Add,
            derive_more::Sub,
            derive_more::AddAssign,
            derive_more::SubAssign,
            derive_more::Sum,
            derive_more::FromStr,
            serde::Serialize,
            serde::Deserialize,
        )]
        pub struct $name(u64);

        impl $name {
            pub const ZERO: $name = Self::new(0);
            pub const ONE: $name = Self::new(1);
            pub const MAX: $name = Self::new(u64::MAX);

            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            pub const fn into_u64(self) -> u64 {
                self.0
            }

            pub const fn into_usize(self) -> usize {
                self.0 as usize
            }

            pub fn into_f64(self) -> f64 {
                self.0 as f64
            }
        }
    };
}

unit!(Bytes);

impl std::fmt::Display for Bytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}B", self.0)
    }
}

unit!(Nanosecs);

impl Nanosecs {
    /// Number of whole `interval`s that fit in `self`. Returns zero for a
    /// zero-length interval.
    pub const fn intervals(self, interval: Nanosecs) -> u64 {
        if interval.0 == 0 {
            0
        } else {
            self.0 / interval.0
        }
    }
}

impl std::fmt::Display for Nanosecs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}ns", self.0)
    }
}

/// The analysis time window `[start, end)` in nanoseconds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, derive_new::new, serde::Serialize, serde::Deserialize,
)]
pub struct TimeWindow {
    pub start: Nanosecs,
    pub end: Nanosecs,
}

impl TimeWindow {
    /// The window length. Zero if the window is inverted.
    pub fn duration(&self) -> Nanosecs {
        if self.end < self.start {
            Nanosecs::ZERO
        } else {
            self.end - self.start
        }
    }

    /// Whether a sample timestamp lies inside the window. Both edges are
    /// inclusive, matching the sampling convention of the telemetry logs.
    pub fn contains(&self, t: Nanosecs) -> bool {
        self.start <= t && t <= self.end
    }
}
