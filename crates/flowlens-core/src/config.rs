//! Explicit analysis configuration.
//!
//! The mode lookup tables and the topology→BDP mapping are plain values
//! passed into the analysis entry points, so concurrent analyses can use
//! different mappings. The defaults cover the simulation setups the
//! telemetry logs come from; deployments with other topologies load their
//! own profile (JSON at the tool boundary).

use std::collections::BTreeMap;

use crate::units::Bytes;

/// Congestion control schemes, keyed by their numeric code in run configs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CcMode {
    Dcqcn,
    Hp,
    Timely,
    Dctcp,
}

/// Load balancing schemes, keyed by their numeric code in run configs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LbMode {
    Fecmp,
    Drill,
    Conga,
    Letflow,
    Conweave,
}

/// The lookup tables one analysis invocation runs with.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AnalysisProfile {
    /// Numeric code → congestion control scheme.
    pub cc_modes: BTreeMap<u32, CcMode>,
    /// Numeric code → load balancing scheme.
    pub lb_modes: BTreeMap<u32, LbMode>,
    /// Topology name → one-BDP byte threshold.
    pub topo_bdp: BTreeMap<String, Bytes>,
}

impl AnalysisProfile {
    /// The one-BDP threshold for a topology, if the profile knows it.
    pub fn bdp_for_topology(&self, topology: &str) -> Option<Bytes> {
        self.topo_bdp.get(topology).copied()
    }

    /// The congestion control scheme for a numeric run-config code.
    pub fn cc_mode(&self, code: u32) -> Option<CcMode> {
        self.cc_modes.get(&code).copied()
    }

    /// The load balancing scheme for a numeric run-config code.
    pub fn lb_mode(&self, code: u32) -> Option<LbMode> {
        self.lb_modes.get(&code).copied()
    }
}

impl Default for AnalysisProfile {
    fn default() -> Self {
        Self {
            cc_modes: BTreeMap::from([
                (1, CcMode::Dcqcn),
                (3, CcMode::Hp),
                (7, CcMode::Timely),
                (8, CcMode::Dctcp),
            ]),
            lb_modes: BTreeMap::from([
                (0, LbMode::Fecmp),
                (2, LbMode::Drill),
                (3, LbMode::Conga),
                (6, LbMode::Letflow),
                (9, LbMode::Conweave),
            ]),
            topo_bdp: BTreeMap::from([
                // 2-tier, all 100G
                ("leaf_spine_128_100G_OS2".to_string(), Bytes::new(104_000)),
                // 3-tier, all 100G
                ("fat_k8_100G_OS2".to_string(), Bytes::new(156_000)),
            ]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_resolves_known_topologies() {
        let profile = AnalysisProfile::default();
        assert_eq!(
            profile.bdp_for_topology("leaf_spine_128_100G_OS2"),
            Some(Bytes::new(104_000))
        );
        assert_eq!(profile.bdp_for_topology("unknown_topo"), None);
        assert_eq!(profile.cc_mode(8), Some(CcMode::Dctcp));
        assert_eq!(profile.lb_mode(9), Some(LbMode::Conweave));
    }
}
