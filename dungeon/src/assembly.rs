//! Spatial layout of a [`LevelGraph`].
//!
//! Rooms are placed depth first: every child is put in front of the parent
//! door it connects to, and gets the door facing back to its parent wired to
//! that connection. Rooms are spawned far from each other, and moved to their
//! place only once the layout is final.

use std::iter::zip;

use chunks::{DoorSlot, Footprint};
use glam::Vec2;
use rand::{seq::SliceRandom, Rng};
use serde::Serialize;

use crate::{
    graph::{LevelGraph, NodeId},
    host::{ChunkCatalog, HallwayRouter, Instantiator, RoomTag, Route},
    separation::{self, SeparationReport},
    Config, Error, Rect,
};

/// Distance multiplier for critical path rooms
const CRITICAL_DISTANCE: f32 = 1.;
/// Distance multiplier for side rooms
const SIDE_DISTANCE: f32 = 0.5;
/// Scale of the random offset along the parent door
const LATERAL_SPREAD: f32 = 5.;
/// How far doors are projected along the parent door when matching
const MATCH_PROJECTION: f32 = 1000.;

const STAGING_START_X: f32 = -10_000.;
const STAGING_Z: f32 = -1_000.;
const STAGING_GAP: f32 = 100.;

/// A door of a placed room
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Door {
    /// Position relative to the room center
    pub relative: Vec2,
    /// Unit direction the door opens toward
    pub facing: Vec2,
    /// Absolute position as of the last refresh
    position: Vec2,
}
impl Door {
    fn new(slot: &DoorSlot, rect: &Rect) -> Self {
        let mut door = Self {
            relative: slot.position.into(),
            facing: Vec2::from(slot.facing).normalize_or_zero(),
            position: Vec2::ZERO,
        };
        door.refresh(rect);
        door
    }

    /// Absolute position of the door in a room occupying `rect`
    #[inline(always)]
    #[must_use]
    pub fn absolute(&self, rect: &Rect) -> Vec2 {
        rect.center + self.relative
    }

    #[inline(always)]
    pub fn refresh(&mut self, rect: &Rect) {
        self.position = self.absolute(rect)
    }

    /// Absolute position computed by the last [`Door::refresh`]
    #[inline(always)]
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }
}

/// Reference to a door of a placed room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DoorRef {
    /// Index of the room in [`Layout::rooms`]
    pub room: usize,
    /// Index of the door in [`PositionRecord::doors`]
    pub door: usize,
}

/// The two doors a hallway has to join
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HallwayEndpoints {
    /// Door on the parent room
    pub start: DoorRef,
    /// Matching door on the child room
    pub end: DoorRef,
}

/// A placed room
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionRecord<H> {
    /// Instance spawned for this room
    pub chunk: H,
    pub node: NodeId,
    pub footprint: String,
    /// Unscaled size of the footprint
    pub footprint_size: Vec2,
    /// Layout rectangle, footprint scaled by the spacing
    pub rect: Rect,
    /// Doors in the order they were dealt to this room
    pub doors: Vec<Door>,
}
impl<H> PositionRecord<H> {
    /// Recompute the door positions from the current rect
    pub fn refresh_doors(&mut self) {
        for door in self.doors.iter_mut() {
            door.refresh(&self.rect)
        }
    }

    /// Actual room bounds, centered on the layout rect
    #[inline(always)]
    #[must_use]
    pub fn footprint_rect(&self) -> Rect {
        Rect::new(self.rect.center, self.footprint_size)
    }
}

/// Placed rooms and the hallways between them
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout<H> {
    pub rooms: Vec<PositionRecord<H>>,
    pub hallways: Vec<HallwayEndpoints>,
}
impl<H> Default for Layout<H> {
    fn default() -> Self {
        Self {
            rooms: vec![],
            hallways: vec![],
        }
    }
}
impl<H> Layout<H> {
    #[inline(always)]
    #[must_use]
    pub fn door(&self, DoorRef { room, door }: DoorRef) -> &Door {
        &self.rooms[room].doors[door]
    }

    /// Doors joined by a hallway, start first
    #[must_use]
    pub fn endpoints(&self, hallway: &HallwayEndpoints) -> (&Door, &Door) {
        (self.door(hallway.start), self.door(hallway.end))
    }

    /// Index of the room placed for `node`, if any
    #[must_use]
    pub fn room_of(&self, node: NodeId) -> Option<usize> {
        self.rooms.iter().position(|r| r.node == node)
    }

    /// Layout rectangles, in room order
    #[must_use]
    pub fn rects(&self) -> Vec<Rect> {
        self.rooms.iter().map(|r| r.rect).collect()
    }

    pub fn refresh_doors(&mut self) {
        for room in self.rooms.iter_mut() {
            room.refresh_doors()
        }
    }

    /// Push overlapping rooms apart. Door positions need a refresh afterwards.
    pub fn separate(&mut self, max_iterations: usize) -> SeparationReport {
        let mut rects = self.rects();
        let report = separation::separate(&mut rects, max_iterations);
        for (room, rect) in zip(self.rooms.iter_mut(), rects) {
            room.rect = rect;
        }
        report
    }

    /// Move every instance to the center of its rect
    pub fn apply_positions<I>(&self, instantiator: &mut I)
    where
        I: Instantiator<Handle = H>,
    {
        for room in self.rooms.iter() {
            instantiator.relocate(&room.chunk, room.rect.center)
        }
    }

    /// Route every hallway over the final room bounds
    pub fn route_hallways<R>(&mut self, router: &mut R) -> Vec<Route>
    where
        R: HallwayRouter + ?Sized,
    {
        self.refresh_doors();
        let rooms: Vec<_> = self.rooms.iter().map(PositionRecord::footprint_rect).collect();
        self.hallways
            .iter()
            .map(|hallway| {
                let (start, end) = self.endpoints(hallway);
                router.route(&rooms, start, end)
            })
            .collect()
    }
}

/// Placement settings taken from the [`Config`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssemblyOptions {
    pub spacing: f32,
    pub show_side_rooms: bool,
}
impl From<&Config> for AssemblyOptions {
    fn from(config: &Config) -> Self {
        Self {
            spacing: config.spacing,
            show_side_rooms: config.show_side_rooms,
        }
    }
}

/// Place a room for every node of `graph`, starting from the root.
///
/// On failure every instance created so far is destroyed.
pub fn assemble<C, I, R>(
    graph: &LevelGraph,
    catalog: &C,
    instantiator: &mut I,
    rng: &mut R,
    options: AssemblyOptions,
) -> Result<Layout<I::Handle>, Error>
where
    C: ChunkCatalog + ?Sized,
    I: Instantiator,
    R: Rng + ?Sized,
{
    let mut assembler = LevelAssembler {
        graph,
        catalog,
        instantiator,
        rng,
        options,
        staging_x: STAGING_START_X,
        layout: Layout::default(),
    };
    let result = assembler.place_all(graph.root());
    let LevelAssembler {
        instantiator,
        mut layout,
        ..
    } = assembler;
    match result {
        Ok(()) => {
            log::debug!(
                "Placed {} rooms and {} hallways",
                layout.rooms.len(),
                layout.hallways.len()
            );
            Ok(layout)
        }
        Err(err) => {
            log::debug!("Assembly failed, destroying {} rooms", layout.rooms.len());
            for room in layout.rooms.drain(..) {
                instantiator.destroy(room.chunk)
            }
            Err(err)
        }
    }
}

struct LevelAssembler<'a, C: ?Sized, I: Instantiator, R: ?Sized> {
    graph: &'a LevelGraph,
    catalog: &'a C,
    instantiator: &'a mut I,
    rng: &'a mut R,
    options: AssemblyOptions,
    /// Next spawn coordinate, away from every previous instance
    staging_x: f32,
    layout: Layout<I::Handle>,
}

impl<'a, C, I, R> LevelAssembler<'a, C, I, R>
where
    C: ChunkCatalog + ?Sized,
    I: Instantiator,
    R: Rng + ?Sized,
{
    /// Place the whole subtree of `root`, in depth first pre-order
    fn place_all(&mut self, root: NodeId) -> Result<(), Error> {
        let mut pending = vec![(root, None)];
        while let Some((id, parent)) = pending.pop() {
            let children = self.place(id, parent)?;
            // reversed, so the first child is placed next
            pending.extend(
                children
                    .into_iter()
                    .rev()
                    .map(|(child, door)| (child, Some(door))),
            );
        }
        Ok(())
    }

    /// Place a single room, returning the children to place behind each of
    /// its free doors
    fn place(
        &mut self,
        id: NodeId,
        parent: Option<DoorRef>,
    ) -> Result<Vec<(NodeId, DoorRef)>, Error> {
        let graph = self.graph;
        let catalog = self.catalog;
        let node = &graph[id];
        let doors_needed = node.required_door_count();

        let candidates = catalog.find_by_door_count(doors_needed);
        let footprint: &Footprint = candidates
            .choose(&mut *self.rng)
            .copied()
            .ok_or(Error::CatalogExhausted {
                node: id,
                doors: doors_needed,
            })?;
        let mut slots = footprint.doors.to_vec();
        slots.shuffle(&mut *self.rng);

        let size = Vec2::from(footprint.size) * self.options.spacing;
        let (rect, spawn_at) = match parent {
            None => (Rect::new(Vec2::ZERO, size), Vec2::ZERO),
            Some(parent_door) => {
                let parent_rect = self.layout.rooms[parent_door.room].rect;
                let door = *self.layout.door(parent_door);
                let distance = if node.is_critical_path() {
                    CRITICAL_DISTANCE
                } else {
                    SIDE_DISTANCE
                };
                let lateral = door.relative * door.facing.perp() * self.rng.gen::<f32>();
                let center = parent_rect.center
                    + door.facing * size.length() * distance
                    + lateral * LATERAL_SPREAD;

                let spawn_at = Vec2::new(self.staging_x, STAGING_Z);
                self.staging_x += size.length().floor() + STAGING_GAP;
                (Rect::new(center, size), spawn_at)
            }
        };
        let doors: Vec<Door> = slots.iter().map(|slot| Door::new(slot, &rect)).collect();
        let mut free: Vec<usize> = (0..doors.len()).collect();

        let room = self.layout.rooms.len();
        let hallway = match parent {
            None => None,
            Some(parent_door) => {
                let facing = self.layout.door(parent_door).facing;
                let matched = closest_door(&doors, facing).ok_or(Error::CatalogExhausted {
                    node: id,
                    doors: doors_needed,
                })?;
                free.retain(|d| *d != matched);
                self.layout.hallways.push(HallwayEndpoints {
                    start: parent_door,
                    end: DoorRef {
                        room,
                        door: matched,
                    },
                });
                Some(self.layout.hallways.len() - 1)
            }
        };

        let chunk = self.instantiator.create(
            footprint,
            spawn_at,
            RoomTag {
                node: id,
                critical: node.is_critical_path(),
                hallway,
            },
        );
        log::trace!(
            "{id}: placed {} at {:?} ({} doors)",
            footprint.name,
            rect.center,
            doors.len()
        );
        self.layout.rooms.push(PositionRecord {
            chunk,
            node: id,
            footprint: footprint.name.clone(),
            footprint_size: footprint.size.into(),
            rect,
            doors,
        });

        debug_assert_eq!(node.connections().len(), free.len());
        let show_side_rooms = self.options.show_side_rooms;
        Ok(zip(node.connections(), free)
            .filter(|(child, _)| show_side_rooms || graph[**child].is_critical_path())
            .map(|(&child, door)| (child, DoorRef { room, door }))
            .collect())
    }
}

/// The door that, pushed far along `facing`, ends up closest to where it
/// started from. First found wins ties.
fn closest_door(doors: &[Door], facing: Vec2) -> Option<usize> {
    let mut closest = None;
    let mut best = f32::INFINITY;
    for (i, door) in doors.iter().enumerate() {
        let distance = (door.relative + facing * MATCH_PROJECTION).length();
        if distance < best {
            closest = Some(i);
            best = distance;
        }
    }
    closest
}
