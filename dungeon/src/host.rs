//! Boundaries with the host engine: where footprints come from, how room
//! instances are spawned, and how hallways get routed.

use chunks::{Catalog, Footprint};
use glam::Vec2;
use serde::Serialize;

use crate::{assembly::Door, graph::NodeId, Rect};

/// Source of room footprints
pub trait ChunkCatalog {
    /// All footprints exposing exactly `doors` door slots
    fn find_by_door_count(&self, doors: usize) -> Vec<&Footprint>;

    /// Largest door count available, if known
    fn max_doors(&self) -> Option<usize> {
        None
    }
}
impl ChunkCatalog for Catalog {
    fn find_by_door_count(&self, doors: usize) -> Vec<&Footprint> {
        Catalog::find_by_door_count(self, doors)
    }
    fn max_doors(&self) -> Option<usize> {
        Catalog::max_doors(self)
    }
}

/// Debug information attached to every spawned room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoomTag {
    pub node: NodeId,
    pub critical: bool,
    /// Hallway leading to this room from its parent
    pub hallway: Option<usize>,
}

/// Creates and destroys room instances in the host
pub trait Instantiator {
    type Handle: Clone + std::fmt::Debug;

    fn create(&mut self, footprint: &Footprint, position: Vec2, tag: RoomTag) -> Self::Handle;
    /// Move an instance to its final position
    fn relocate(&mut self, handle: &Self::Handle, position: Vec2);
    fn destroy(&mut self, handle: Self::Handle);
}

/// A room instance kept by the [`Ledger`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spawned {
    pub footprint: String,
    pub position: Vec2,
    pub tag: RoomTag,
}

/// Instantiator keeping the spawned rooms in memory
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    slots: Vec<Option<Spawned>>,
}
impl Ledger {
    #[must_use]
    pub fn get(&self, handle: usize) -> Option<&Spawned> {
        self.slots.get(handle).and_then(Option::as_ref)
    }

    /// Rooms currently alive
    pub fn live(&self) -> impl Iterator<Item = &Spawned> {
        self.slots.iter().flatten()
    }

    /// Number of rooms ever spawned, destroyed ones included
    #[must_use]
    pub fn spawned(&self) -> usize {
        self.slots.len()
    }
}
impl Instantiator for Ledger {
    type Handle = usize;

    fn create(&mut self, footprint: &Footprint, position: Vec2, tag: RoomTag) -> usize {
        self.slots.push(Some(Spawned {
            footprint: footprint.name.clone(),
            position,
            tag,
        }));
        self.slots.len() - 1
    }

    fn relocate(&mut self, handle: &usize, position: Vec2) {
        match self.slots.get_mut(*handle) {
            Some(Some(spawned)) => spawned.position = position,
            _ => log::warn!("Relocating unknown room {handle}"),
        }
    }

    fn destroy(&mut self, handle: usize) {
        if self.slots.get_mut(handle).and_then(Option::take).is_none() {
            log::warn!("Destroying unknown room {handle}")
        }
    }
}

/// A routed hallway
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Route {
    /// Waypoints from the start door to the end door
    pub path: Vec<Vec2>,
    /// Free area the router had available
    pub available_space: f32,
}

/// Finds a walkable path between two doors, avoiding the rooms
pub trait HallwayRouter {
    fn route(&mut self, rooms: &[Rect], start: &Door, end: &Door) -> Route;
}
impl<F> HallwayRouter for F
where
    F: FnMut(&[Rect], &Door, &Door) -> Route,
{
    fn route(&mut self, rooms: &[Rect], start: &Door, end: &Door) -> Route {
        self(rooms, start, end)
    }
}

#[cfg(test)]
mod tests {
    use chunks::Footprint;
    use glam::Vec2;

    use super::{Instantiator, Ledger, RoomTag};
    use crate::graph::NodeId;

    #[test]
    fn ledger_lifecycle() {
        let footprint = Footprint {
            name: "box".to_owned(),
            size: [1., 1.],
            doors: Box::new([]),
        };
        let tag = RoomTag {
            node: NodeId::from_index(0),
            critical: true,
            hallway: None,
        };
        let mut ledger = Ledger::default();
        let a = ledger.create(&footprint, Vec2::ZERO, tag);
        let b = ledger.create(&footprint, Vec2::ONE, tag);
        ledger.relocate(&b, Vec2::new(5., 5.));
        assert_eq!(ledger.get(b).unwrap().position, Vec2::new(5., 5.));
        ledger.destroy(a);
        assert_eq!(ledger.get(a), None);
        assert_eq!(ledger.live().count(), 1);
        assert_eq!(ledger.spawned(), 2);
    }
}
