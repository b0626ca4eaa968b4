use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Config for a level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seed of the level
    pub seed: u64,
    /// Total number of rooms, critical path included
    pub rooms_count: usize,
    /// Number of rooms on the critical path
    pub crit_path_length: usize,
    /// Maximum number of doors a single room can have
    pub max_doors: usize,
    /// How evenly side rooms spread over the critical path
    /// -> 0 means side rooms can cluster on a few path rooms
    /// -> 1 means every path room gets the same share
    pub distribution: f32,
    /// Scale applied to the room footprints while laying out the level
    pub spacing: f32,
    /// Place side rooms, or only the critical path
    pub show_side_rooms: bool,
    /// Push overlapping rooms apart after placement
    pub separate_rooms: bool,
    /// Maximum number of separation passes
    pub max_separation_iterations: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: 0,
            rooms_count: 10,
            crit_path_length: 5,
            max_doors: 4,
            distribution: 0.5,
            spacing: 1.,
            show_side_rooms: true,
            separate_rooms: true,
            max_separation_iterations: 10_000,
        }
    }
}

impl Config {
    /// Check the config describes a level that can be built
    pub fn validate(&self) -> Result<(), Error> {
        let invalid = |msg: String| Err(Error::InvalidConfig(msg));
        if self.crit_path_length == 0 {
            return invalid("the critical path needs at least one room".to_owned());
        }
        if self.crit_path_length > self.rooms_count {
            return invalid(format!(
                "critical path of {} rooms does not fit in {} rooms",
                self.crit_path_length, self.rooms_count
            ));
        }
        if self.max_doors < 3 {
            return invalid(format!(
                "rooms need at least 3 doors, got {}",
                self.max_doors
            ));
        }
        if !(self.distribution > 0. && self.distribution <= 1.) {
            return invalid(format!(
                "distribution must be in (0, 1], got {}",
                self.distribution
            ));
        }
        if !(self.spacing.is_finite() && self.spacing >= 0.) {
            return invalid(format!(
                "spacing must be finite and non negative, got {}",
                self.spacing
            ));
        }
        Ok(())
    }
}

/// Partial config for a level
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Parser, Default)]
pub struct PartialConfig {
    /// Seed of the level
    #[clap(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Total number of rooms, critical path included
    #[clap(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rooms_count: Option<usize>,
    /// Number of rooms on the critical path
    #[clap(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crit_path_length: Option<usize>,
    /// Maximum number of doors a single room can have
    #[clap(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_doors: Option<usize>,
    /// How evenly side rooms spread over the critical path
    #[clap(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution: Option<f32>,
    /// Scale applied to the room footprints while laying out the level
    #[clap(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spacing: Option<f32>,
    /// Place side rooms, or only the critical path
    #[clap(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_side_rooms: Option<bool>,
    /// Push overlapping rooms apart after placement
    #[clap(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separate_rooms: Option<bool>,
    /// Maximum number of separation passes
    #[clap(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_separation_iterations: Option<usize>,
}
impl PartialConfig {
    pub fn merge(self, other: PartialConfig) -> Self {
        Self {
            seed: other.seed.or(self.seed),
            rooms_count: other.rooms_count.or(self.rooms_count),
            crit_path_length: other.crit_path_length.or(self.crit_path_length),
            max_doors: other.max_doors.or(self.max_doors),
            distribution: other.distribution.or(self.distribution),
            spacing: other.spacing.or(self.spacing),
            show_side_rooms: other.show_side_rooms.or(self.show_side_rooms),
            separate_rooms: other.separate_rooms.or(self.separate_rooms),
            max_separation_iterations: other
                .max_separation_iterations
                .or(self.max_separation_iterations),
        }
    }
    pub fn or_defaults(self) -> Config {
        let default = Config::default();
        Config {
            seed: self.seed.unwrap_or(default.seed),
            rooms_count: self.rooms_count.unwrap_or(default.rooms_count),
            crit_path_length: self.crit_path_length.unwrap_or(default.crit_path_length),
            max_doors: self.max_doors.unwrap_or(default.max_doors),
            distribution: self.distribution.unwrap_or(default.distribution),
            spacing: self.spacing.unwrap_or(default.spacing),
            show_side_rooms: self.show_side_rooms.unwrap_or(default.show_side_rooms),
            separate_rooms: self.separate_rooms.unwrap_or(default.separate_rooms),
            max_separation_iterations: self
                .max_separation_iterations
                .unwrap_or(default.max_separation_iterations),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, PartialConfig};
    use crate::Error;

    #[test]
    fn default_is_valid() {
        Config::default().validate().unwrap()
    }

    #[test]
    fn later_partial_wins() {
        let file = PartialConfig {
            seed: Some(3),
            rooms_count: Some(12),
            ..Default::default()
        };
        let cli = PartialConfig {
            seed: Some(7),
            max_doors: Some(6),
            ..Default::default()
        };
        let config = file.merge(cli).or_defaults();
        assert_eq!(config.seed, 7);
        assert_eq!(config.rooms_count, 12);
        assert_eq!(config.max_doors, 6);
        assert_eq!(config.distribution, Config::default().distribution);
    }

    #[test]
    fn rejects_out_of_range() {
        let base = Config::default();
        for config in [
            Config {
                crit_path_length: 0,
                ..base
            },
            Config {
                rooms_count: 3,
                crit_path_length: 4,
                ..base
            },
            Config {
                max_doors: 2,
                ..base
            },
            Config {
                distribution: 0.,
                ..base
            },
            Config {
                distribution: 1.5,
                ..base
            },
            Config {
                spacing: -1.,
                ..base
            },
            Config {
                spacing: f32::NAN,
                ..base
            },
        ] {
            assert!(
                matches!(config.validate(), Err(Error::InvalidConfig(_))),
                "{config:?} should be rejected"
            )
        }
    }
}
