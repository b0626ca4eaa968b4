use std::{
    fs::{read_to_string, File},
    io::BufReader,
    path::PathBuf,
};

use anyhow::Context;
use clap::Parser;
use glam::Vec2;
use image::{Rgb, RgbImage};
use simple_logger::SimpleLogger;

use chunks::Catalog;
use dungeon::{
    assembly::Door,
    host::{Ledger, Route},
    Generator, PartialConfig, Rect,
};

#[derive(Debug, Parser)]
struct Args {
    /// Configuration file for the level
    #[clap(short)]
    config: Option<PathBuf>,
    /// Overrides of the configuration file
    #[clap(flatten)]
    overrides: PartialConfig,
    /// Chunk catalog, as made by `chunks-make`
    #[clap(short = 'k', long)]
    catalog: PathBuf,
    /// Output file
    #[clap(short, long)]
    output: PathBuf,
}

/// Pixels per world unit
const SCALE: f32 = 8.;
const MARGIN: f32 = 4.;
const DOOR_SIZE: i64 = 2;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const WALL_COLOR: Rgb<u8> = Rgb([0, 0, 0]);
const CRITICAL_COLOR: Rgb<u8> = Rgb([230, 180, 120]);
const SIDE_COLOR: Rgb<u8> = Rgb([150, 190, 230]);
const DOOR_COLOR: Rgb<u8> = Rgb([200, 30, 30]);
const HALLWAY_COLOR: Rgb<u8> = Rgb([90, 90, 90]);

/// Hallway going straight out of both doors, then joining with an elbow
fn elbow(rooms: &[Rect], start: &Door, end: &Door) -> Route {
    let from = start.position() + start.facing;
    let to = end.position() + end.facing;
    let corner = Vec2::new(to.x, from.y);
    let taken: f32 = rooms.iter().map(Rect::area).sum();
    Route {
        path: vec![start.position(), from, corner, to, end.position()],
        available_space: Rect::bounding(rooms.iter().copied()).map_or(0., |b| b.area() - taken),
    }
}

struct Canvas {
    image: RgbImage,
    origin: Vec2,
}
impl Canvas {
    fn new(bounds: Rect) -> Self {
        let size = (bounds.size + Vec2::splat(2. * MARGIN)) * SCALE;
        let mut image = RgbImage::new(size.x.ceil() as u32, size.y.ceil() as u32);
        for px in image.pixels_mut() {
            *px = BACKGROUND;
        }
        Self {
            image,
            origin: bounds.min() - Vec2::splat(MARGIN),
        }
    }

    fn to_pixel(&self, p: Vec2) -> [i64; 2] {
        let p = (p - self.origin) * SCALE;
        [p.x as i64, self.image.height() as i64 - 1 - p.y as i64]
    }

    fn put(&mut self, [x, y]: [i64; 2], color: Rgb<u8>) {
        if let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) {
            if x < self.image.width() && y < self.image.height() {
                self.image[(x, y)] = color;
            }
        }
    }

    fn rect(&mut self, rect: &Rect, fill: Rgb<u8>) {
        let [minx, maxy] = self.to_pixel(rect.min());
        let [maxx, miny] = self.to_pixel(rect.max());
        for x in minx..=maxx {
            for y in miny..=maxy {
                let border = x == minx || x == maxx || y == miny || y == maxy;
                self.put([x, y], if border { WALL_COLOR } else { fill });
            }
        }
    }

    fn line(&mut self, a: Vec2, b: Vec2, color: Rgb<u8>) {
        let steps = ((b - a).length() * SCALE).ceil().max(1.) as usize;
        for i in 0..=steps {
            let p = a.lerp(b, i as f32 / steps as f32);
            self.put(self.to_pixel(p), color);
        }
    }

    fn door(&mut self, p: Vec2) {
        let [x, y] = self.to_pixel(p);
        for dx in -DOOR_SIZE..=DOOR_SIZE {
            for dy in -DOOR_SIZE..=DOOR_SIZE {
                self.put([x + dx, y + dy], DOOR_COLOR);
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    SimpleLogger::new()
        .without_timestamps()
        .with_level(if cfg!(debug_assertions) {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .env()
        .init()
        .context("While initializing logging")?;

    let Args {
        config,
        overrides,
        catalog,
        output,
    } = Args::parse();
    let config = config
        .map(|path| {
            read_to_string(path)
                .context("Cannot read config file")
                .and_then(|s| {
                    toml::from_str::<PartialConfig>(&s).context("Cannot parse config file")
                })
        })
        .transpose()
        .context("While loading configs")?
        .unwrap_or_default()
        .merge(overrides)
        .or_defaults();
    let catalog = Catalog::bufread(BufReader::new(
        File::open(&catalog).context("Cannot open catalog file")?,
    ))
    .context("Cannot read catalog file")?;

    let mut generator = Generator::new(config, Ledger::default());
    let mut level = generator
        .generate(&catalog)
        .context("While generating the level")?;
    if let Some(report) = level.separation {
        log::info!(
            "Separation: {} passes, {} overlaps left",
            report.iterations,
            report.residual_overlaps
        );
    }
    let routes = level.route_hallways(&mut elbow);

    let rooms: Vec<_> = level
        .layout
        .rooms
        .iter()
        .map(|r| r.footprint_rect())
        .collect();
    let Some(bounds) = Rect::bounding(rooms.iter().copied()) else {
        anyhow::bail!("The level has no rooms")
    };
    let mut canvas = Canvas::new(bounds);
    for (room, rect) in level.layout.rooms.iter().zip(rooms.iter()) {
        let fill = if level.graph[room.node].is_critical_path() {
            CRITICAL_COLOR
        } else {
            SIDE_COLOR
        };
        canvas.rect(rect, fill);
    }
    for route in routes.iter() {
        for segment in route.path.windows(2) {
            canvas.line(segment[0], segment[1], HALLWAY_COLOR);
        }
    }
    for room in level.layout.rooms.iter() {
        for door in room.doors.iter() {
            canvas.door(door.position());
        }
    }
    canvas
        .image
        .save(output)
        .context("While saving the image")?;
    Ok(())
}
