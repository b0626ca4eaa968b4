//! Procedural dungeon levels.
//!
//! A level is generated in two steps. First a [`LevelGraph`] is built: a
//! critical path of rooms every run has to cross, with side rooms branching off
//! it. Then the graph is laid out: a room footprint with the right number of
//! doors is picked for every node, placed in front of its parent door, and the
//! rooms are pushed apart until they do not overlap anymore.
//!
//! ```
//! use chunks::{Catalog, DoorSlot, Footprint};
//! use dungeon::{host::Ledger, Config, Generator};
//!
//! // square rooms with up to 4 doors
//! let facings = [[1., 0.], [0., 1.], [-1., 0.], [0., -1.]];
//! let catalog = Catalog::new((0..=4).map(|doors| Footprint {
//!     name: format!("room-{doors}"),
//!     size: [4., 4.],
//!     doors: facings[..doors]
//!         .iter()
//!         .map(|&facing: &[f32; 2]| DoorSlot { position: facing.map(|c| c * 2.), facing })
//!         .collect(),
//! }));
//!
//! let mut generator = Generator::new(Config::default(), Ledger::default());
//! let level = generator.generate(&catalog).unwrap();
//! assert_eq!(level.graph.len(), Config::default().rooms_count);
//! ```

use rand::SeedableRng;
use rand_wyrand::WyRand;

mod rects;
pub use rects::Rect;

pub mod config;
pub use config::{Config, PartialConfig};

pub mod assembly;
pub mod graph;
pub mod host;
pub mod separation;

use assembly::{AssemblyOptions, Layout};
use graph::{GraphParams, LevelGraph, NodeId};
use host::{ChunkCatalog, HallwayRouter, Instantiator, Route};
use separation::SeparationReport;

/// Errors of a level generation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("No footprint with {doors} doors for room {node}")]
    CatalogExhausted { node: NodeId, doors: usize },
    #[error("Graph build created {created} rooms instead of {expected}")]
    BudgetInconsistency { created: usize, expected: usize },
}

/// A generated level
#[derive(Debug, Clone)]
pub struct Level<H> {
    pub graph: LevelGraph,
    pub layout: Layout<H>,
    /// Present if rooms were separated
    pub separation: Option<SeparationReport>,
}
impl<H> Level<H> {
    /// Route a hallway for every connection between placed rooms
    pub fn route_hallways<R>(&mut self, router: &mut R) -> Vec<Route>
    where
        R: HallwayRouter + ?Sized,
    {
        self.layout.route_hallways(router)
    }
}

/// A level generator, owning the rooms it spawned
#[derive(Debug)]
pub struct Generator<I: Instantiator> {
    config: Config,
    instantiator: I,
    /// Rooms spawned by the last generation
    generated: Vec<I::Handle>,
}
impl<I: Instantiator> Generator<I> {
    pub fn new(config: Config, instantiator: I) -> Self {
        Self {
            config,
            instantiator,
            generated: vec![],
        }
    }

    #[inline(always)]
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn set_config(&mut self, config: Config) {
        self.config = config
    }

    #[inline(always)]
    #[must_use]
    pub fn instantiator(&self) -> &I {
        &self.instantiator
    }

    /// Generate a new level, destroying the previous one
    pub fn generate<C>(&mut self, catalog: &C) -> Result<Level<I::Handle>, Error>
    where
        C: ChunkCatalog + ?Sized,
    {
        self.clear();
        self.config.validate()?;
        let config = self.config;
        if let Some(available) = catalog.max_doors() {
            if config.max_doors > available {
                log::warn!(
                    "Rooms may need up to {} doors, but the catalog offers at most {available}",
                    config.max_doors
                );
            }
        }

        let mut rng = WyRand::seed_from_u64(config.seed);
        let graph = LevelGraph::generate(GraphParams::from(&config), &mut rng)?;
        let mut layout = assembly::assemble(
            &graph,
            catalog,
            &mut self.instantiator,
            &mut rng,
            AssemblyOptions::from(&config),
        )?;
        self.generated = layout.rooms.iter().map(|r| r.chunk.clone()).collect();

        let separation = config
            .separate_rooms
            .then(|| layout.separate(config.max_separation_iterations));
        layout.refresh_doors();
        layout.apply_positions(&mut self.instantiator);

        log::debug!("Generated level with seed {}", config.seed);
        Ok(Level {
            graph,
            layout,
            separation,
        })
    }

    /// Destroy every room of the last generated level
    pub fn clear(&mut self) {
        if !self.generated.is_empty() {
            log::debug!("Clearing {} rooms", self.generated.len());
        }
        for handle in self.generated.drain(..) {
            self.instantiator.destroy(handle)
        }
    }

    /// Give back the instantiator, leaving the spawned rooms alive
    pub fn into_instantiator(self) -> I {
        self.instantiator
    }
}
