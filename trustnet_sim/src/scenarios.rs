//! Built-in network scenarios.

use trustnet_core::TopologySpec;

/// Nodes in the campus network.
pub const CAMPUS_NODES: u32 = 26;

/// Black holes planted in the campus network.
pub const CAMPUS_BLACK_HOLES: [u32; 5] = [1, 2, 8, 11, 22];

/// Undirected links of the campus network.
pub const CAMPUS_EDGES: [(u32, u32); 60] = [
    (0, 1), (0, 2), (0, 4), (0, 14), (0, 16), (0, 21),
    (1, 2), (1, 3), (1, 4), (1, 5), (1, 15), (1, 16),
    (2, 4), (2, 12), (2, 14), (2, 21),
    (3, 5), (3, 13), (3, 15), (3, 17),
    (4, 6), (4, 12),
    (5, 7), (5, 11), (5, 13),
    (6, 8), (6, 10), (6, 18),
    (7, 9), (7, 11),
    (8, 10), (8, 18),
    (9, 11), (9, 19), (9, 22), (9, 25),
    (10, 12),
    (11, 13), (11, 18), (11, 19), (11, 24),
    (12, 14),
    (13, 15), (13, 17), (13, 18),
    (14, 21),
    (15, 16), (15, 17),
    (16, 21),
    (17, 18),
    (18, 19), (18, 24),
    (19, 20), (19, 22), (19, 24),
    (20, 22), (20, 23),
    (22, 23), (22, 25),
    (23, 25),
];

/// Rounds the campus scenarios run by default.
pub const DEFAULT_ROUNDS: usize = 100;

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScenarioId {
    /// 26-node campus with five black holes
    Campus,

    /// Same campus with every node honest
    HonestCampus,

    /// Honest 3-node path 0-1-2
    Line,

    /// 3-node path whose only relay is a black hole
    BlackHoleRelay,

    /// Path 0-1-2 plus an unreachable node 3
    Isolated,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::Campus,
            ScenarioId::HonestCampus,
            ScenarioId::Line,
            ScenarioId::BlackHoleRelay,
            ScenarioId::Isolated,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::Campus => "campus",
            ScenarioId::HonestCampus => "honest_campus",
            ScenarioId::Line => "line",
            ScenarioId::BlackHoleRelay => "black_hole_relay",
            ScenarioId::Isolated => "isolated",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::Campus => "26 nodes, 60 links, black holes at 1, 2, 8, 11 and 22",
            ScenarioId::HonestCampus => "Campus links with no black holes (control run)",
            ScenarioId::Line => "Path 0-1-2, everyone forwards",
            ScenarioId::BlackHoleRelay => "Path 0-1-2 where relay 1 drops everything",
            ScenarioId::Isolated => "Path 0-1-2 plus node 3 with no links",
        }
    }

    /// Returns the network description.
    pub fn topology(&self) -> TopologySpec {
        match self {
            ScenarioId::Campus => {
                TopologySpec::with_black_holes(CAMPUS_NODES, &CAMPUS_BLACK_HOLES, &CAMPUS_EDGES)
            }
            ScenarioId::HonestCampus => {
                TopologySpec::with_black_holes(CAMPUS_NODES, &[], &CAMPUS_EDGES)
            }
            ScenarioId::Line => TopologySpec::with_black_holes(3, &[], &[(0, 1), (1, 2)]),
            ScenarioId::BlackHoleRelay => {
                TopologySpec::with_black_holes(3, &[1], &[(0, 1), (1, 2)])
            }
            ScenarioId::Isolated => TopologySpec::with_black_holes(4, &[], &[(0, 1), (1, 2)]),
        }
    }

    /// Rounds this scenario runs when none are requested.
    pub fn default_rounds(&self) -> usize {
        match self {
            ScenarioId::Campus | ScenarioId::HonestCampus => DEFAULT_ROUNDS,
            // Small graphs settle quickly
            ScenarioId::Line | ScenarioId::BlackHoleRelay | ScenarioId::Isolated => 20,
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "campus" | "manet" => Ok(ScenarioId::Campus),
            "honest_campus" | "honest" => Ok(ScenarioId::HonestCampus),
            "line" | "path" => Ok(ScenarioId::Line),
            "black_hole_relay" | "blackhole" | "black_hole" => Ok(ScenarioId::BlackHoleRelay),
            "isolated" | "disconnected" => Ok(ScenarioId::Isolated),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}
