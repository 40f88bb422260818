//! Body parts and body blueprints.

use serde::{Deserialize, Serialize};

/// Hard cap on the number of parts in one body.
pub const MAX_BODY_PARTS: usize = 50;

/// Cycles it takes a spawn point to produce one body part.
pub const SPAWN_TIME_PER_PART: u32 = 3;

/// Lifetime of a freshly spawned agent, in cycles.
pub const AGENT_LIFETIME: u32 = 1500;

/// Energy held by one CARRY part.
pub const CARRY_CAPACITY: u32 = 50;

/// Energy mined per WORK part per cycle.
pub const HARVEST_POWER: u32 = 2;

/// Construction progress per WORK part per cycle.
pub const BUILD_POWER: u32 = 5;

/// Hits restored per WORK part per cycle.
pub const REPAIR_POWER: u32 = 100;

/// Controller progress per WORK part per cycle.
pub const UPGRADE_POWER: u32 = 1;

/// Damage dealt per ATTACK part per cycle.
pub const ATTACK_POWER: u32 = 30;

/// Hit points per body part.
pub const HITS_PER_PART: u32 = 100;

/// One body part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyPart {
    /// Movement
    Move,
    /// Harvest, build, repair, upgrade
    Work,
    /// Energy storage
    Carry,
    /// Melee damage
    Attack,
    /// Ranged damage
    RangedAttack,
    /// Healing
    Heal,
    /// Cheap extra hit points
    Tough,
    /// Controller claiming
    Claim,
}

impl BodyPart {
    /// Energy cost of the part.
    pub fn cost(&self) -> u32 {
        match self {
            BodyPart::Move => 50,
            BodyPart::Work => 100,
            BodyPart::Carry => 50,
            BodyPart::Attack => 80,
            BodyPart::RangedAttack => 150,
            BodyPart::Heal => 250,
            BodyPart::Tough => 10,
            BodyPart::Claim => 600,
        }
    }
}

/// Total energy cost of a body.
pub fn body_cost(body: &[BodyPart]) -> u32 {
    body.iter().map(BodyPart::cost).sum()
}

/// Number of parts of the given kind in a body.
pub fn count_parts(body: &[BodyPart], part: BodyPart) -> u32 {
    body.iter().filter(|p| **p == part).count() as u32
}

/// How a role's body is sized from the energy on offer.
///
/// The body is `prefix + pattern × n + suffix`, with `n` as large as the
/// energy, `max_repeats` and [`MAX_BODY_PARTS`] allow. With `wrap_each` set
/// the prefix and suffix go around every repeat instead:
/// `(prefix + pattern + suffix) × n`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyBlueprint {
    /// Repeatable unit
    pub pattern: Vec<BodyPart>,

    /// Upper bound on repeats
    pub max_repeats: u32,

    /// Fixed parts placed before the repeats
    pub prefix: Vec<BodyPart>,

    /// Fixed parts placed after the repeats
    pub suffix: Vec<BodyPart>,

    /// Prefix and suffix wrap each repeat rather than the whole block
    #[serde(default)]
    pub wrap_each: bool,

    /// Group repeats by part kind instead of interleaving them
    pub ordered: bool,
}

impl BodyBlueprint {
    /// Blueprint repeating `pattern` at most `max_repeats` times.
    pub fn new(pattern: Vec<BodyPart>, max_repeats: u32) -> Self {
        Self {
            pattern,
            max_repeats,
            prefix: Vec::new(),
            suffix: Vec::new(),
            wrap_each: false,
            ordered: false,
        }
    }

    /// Set the fixed prefix.
    pub fn with_prefix(mut self, prefix: Vec<BodyPart>) -> Self {
        self.prefix = prefix;
        self
    }

    /// Set the fixed suffix.
    pub fn with_suffix(mut self, suffix: Vec<BodyPart>) -> Self {
        self.suffix = suffix;
        self
    }

    /// Wrap every repeat in the prefix and suffix.
    pub fn wrap_each(mut self) -> Self {
        self.wrap_each = true;
        self
    }

    /// Lay repeats out grouped by part kind.
    pub fn ordered(mut self) -> Self {
        self.ordered = true;
        self
    }

    /// The parts bought by one repeat.
    fn unit(&self) -> Vec<BodyPart> {
        if self.wrap_each {
            [&self.prefix[..], &self.pattern, &self.suffix].concat()
        } else {
            self.pattern.clone()
        }
    }

    /// Parts placed once around the repeats.
    fn fixed_len(&self) -> usize {
        if self.wrap_each {
            0
        } else {
            self.prefix.len() + self.suffix.len()
        }
    }

    /// Cost of one repeat, including the wrapping parts under `wrap_each`.
    pub fn pattern_cost(&self) -> u32 {
        body_cost(&self.unit())
    }

    /// Cost of the parts placed once around the repeats.
    pub fn fixed_cost(&self) -> u32 {
        if self.wrap_each {
            0
        } else {
            body_cost(&self.prefix) + body_cost(&self.suffix)
        }
    }

    /// Cost of the smallest body this blueprint can produce.
    pub fn min_cost(&self) -> u32 {
        self.fixed_cost() + self.pattern_cost()
    }

    /// How many repeats `available` energy buys.
    pub fn repeats_for(&self, available: u32) -> u32 {
        let unit_cost = self.pattern_cost();
        if self.pattern.is_empty() || unit_cost == 0 {
            return 0;
        }
        if available < self.fixed_cost() {
            return 0;
        }

        let Some(room) = MAX_BODY_PARTS.checked_sub(self.fixed_len()) else {
            return 0;
        };
        let by_size = (room / self.unit().len()) as u32;
        let by_energy = (available - self.fixed_cost()) / unit_cost;

        by_energy.min(by_size).min(self.max_repeats)
    }

    /// Build the largest affordable body. Empty means not even one repeat
    /// is affordable.
    pub fn build(&self, available: u32) -> Vec<BodyPart> {
        let repeats = self.repeats_for(available) as usize;
        if repeats == 0 {
            return Vec::new();
        }

        let unit = self.unit();
        let mut body = Vec::with_capacity(self.fixed_len() + unit.len() * repeats);
        if !self.wrap_each {
            body.extend_from_slice(&self.prefix);
        }

        if self.ordered {
            // Each distinct part, in order of first appearance, repeated in full
            let mut seen = Vec::new();
            for part in &unit {
                if seen.contains(part) {
                    continue;
                }
                seen.push(*part);
                let per_repeat = count_parts(&unit, *part) as usize;
                body.extend(std::iter::repeat(*part).take(per_repeat * repeats));
            }
        } else {
            for _ in 0..repeats {
                body.extend_from_slice(&unit);
            }
        }

        if !self.wrap_each {
            body.extend_from_slice(&self.suffix);
        }
        body
    }
}
