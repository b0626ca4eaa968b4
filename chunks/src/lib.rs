use std::collections::BTreeMap;
use std::fmt::Display;
use std::io;

use bincode::error::DecodeError;
use bincode::{Decode, Encode};
use deepsize::DeepSizeOf;
use flate2::Compression;
use flate2::{bufread, read, write};
use serde::{Deserialize, Serialize};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub type Coord = f32;

/// A door slot on a footprint
#[derive(Debug, Clone, Copy, PartialEq, Encode, Decode, DeepSizeOf, Serialize, Deserialize)]
pub struct DoorSlot {
    /// Position relative to the footprint center, on the ground plane
    pub position: [Coord; 2],
    /// Direction the door opens toward, pointing out of the room
    pub facing: [Coord; 2],
}

/// A reusable room template
#[derive(Debug, Clone, PartialEq, Encode, Decode, DeepSizeOf, Serialize, Deserialize)]
pub struct Footprint {
    pub name: String,
    /// Size of the room bounds on the ground plane
    pub size: [Coord; 2],
    #[serde(default)]
    pub doors: Box<[DoorSlot]>,
}
impl Footprint {
    #[inline(always)]
    #[must_use]
    pub fn door_count(&self) -> usize {
        self.doors.len()
    }

    /// Check that the footprint can be placed: finite positive size and
    /// non-degenerate door directions
    fn problem(&self) -> Option<&'static str> {
        if !self.size.iter().all(|s| s.is_finite() && *s > 0.) {
            return Some("size must be finite and positive");
        }
        for door in self.doors.iter() {
            if !door.position.iter().all(|c| c.is_finite()) {
                return Some("door position must be finite");
            }
            let [x, y] = door.facing;
            if !(x.is_finite() && y.is_finite()) || x * x + y * y == 0. {
                return Some("door facing must be a finite non-zero vector");
            }
        }
        None
    }
}
impl Display for Footprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [w, h] = self.size;
        write!(f, "{} ({w}x{h}, {} doors)", self.name, self.door_count())
    }
}

/// Asset manifest listing footprints, as written by hand
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(rename = "footprint", default)]
    pub footprints: Vec<Footprint>,
}
impl Manifest {
    pub fn parse(src: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(src)
    }
}

/// Footprints indexed for lookup by door count
#[derive(Debug, Clone, Default, Encode, Decode, DeepSizeOf, PartialEq)]
pub struct Catalog {
    pub footprints: Box<[Footprint]>,
}
impl Catalog {
    /// Build the catalog, skipping footprints that cannot be placed
    pub fn new(footprints: impl IntoIterator<Item = Footprint>) -> Self {
        Self {
            footprints: footprints
                .into_iter()
                .filter(|fp| match fp.problem() {
                    Some(problem) => {
                        log::warn!("Skipping footprint {}: {problem}", fp.name);
                        false
                    }
                    None => true,
                })
                .collect(),
        }
    }

    /// All footprints exposing exactly `doors` door slots
    #[must_use]
    pub fn find_by_door_count(&self, doors: usize) -> Vec<&Footprint> {
        self.footprints
            .iter()
            .filter(|fp| fp.door_count() == doors)
            .collect()
    }

    /// Largest door count offered by any footprint
    #[must_use]
    pub fn max_doors(&self) -> Option<usize> {
        self.footprints.iter().map(Footprint::door_count).max()
    }

    /// Number of footprints for each door count
    #[must_use]
    pub fn door_counts(&self) -> BTreeMap<usize, usize> {
        let mut counts = BTreeMap::new();
        for fp in self.footprints.iter() {
            *counts.entry(fp.door_count()).or_default() += 1;
        }
        counts
    }

    #[inline(always)]
    #[must_use]
    pub fn len(&self) -> usize {
        self.footprints.len()
    }

    #[inline(always)]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.footprints.is_empty()
    }

    pub fn write(&self, writer: impl io::Write) -> io::Result<()> {
        let mut writer = write::DeflateEncoder::new(writer, Compression::best());
        bincode::encode_into_std_write(self, &mut writer, bincode::config::standard()).map_err(
            |err| match err {
                bincode::error::EncodeError::Io { inner, .. } => inner,
                other => panic!("Catalog should not fail to serialize: {other}"),
            },
        )?;
        writer.finish()?;
        Ok(())
    }
    pub fn read(reader: impl io::Read) -> Result<Self, DecodeError> {
        let mut reader = read::DeflateDecoder::new(reader);
        bincode::decode_from_std_read(&mut reader, bincode::config::standard())
    }
    pub fn bufread(reader: impl io::BufRead) -> Result<Self, DecodeError> {
        let mut reader = bufread::DeflateDecoder::new(reader);
        bincode::decode_from_std_read(&mut reader, bincode::config::standard())
    }
}
impl From<Manifest> for Catalog {
    fn from(Manifest { footprints }: Manifest) -> Self {
        Self::new(footprints)
    }
}
