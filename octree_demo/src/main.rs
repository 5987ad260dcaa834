//! Octree Simulation Demo
//!
//! Runs a headless scene of ships bouncing around a cube and keeps an octree
//! over their bounds up to date:
//! - Every move is queued as a bound-change notification and applied in order
//! - Ships that leave the root octant trigger a full rebuild
//! - Some ships spawn unmeasured and join the tree once their bound is known
//! - Tree statistics and a probe ray are logged periodically
//!
//! Usage: `octree_demo [params.toml|params.ron]`

use dyn_octree::prelude::*;
use rand::Rng;
use slotmap::SlotMap;

// Simulation volume: -50 to +50 on each axis
const WORLD_SIZE: f32 = 100.0;

// Ship counts
const NUM_SMALL_SHIPS: usize = 40;
const NUM_LARGE_SHIPS: usize = 8;
const NUM_LATE_SHIPS: usize = 5;

// Movement speeds
const SMALL_SHIP_SPEED: f32 = 6.0;
const LARGE_SHIP_SPEED: f32 = 3.0;
const SMALL_SHIP_SIZE: f32 = 0.8;
const LARGE_SHIP_SIZE: f32 = 2.0;

// Simulation timing
const TICKS: u32 = 600;
const DELTA_TIME: f32 = 1.0 / 60.0;
const STATS_INTERVAL: u32 = 60;
const MEASURE_AFTER_TICKS: u32 = 30;
const DESPAWN_TICK: u32 = 300;

struct Ship {
    id: MemberId,
    position: Vec3,
    velocity: Vec3,
    size: f32,
    /// Ticks until the ship's bound is known; 0 once measured
    unmeasured_ticks: u32,
}

impl Ship {
    fn measured(&self) -> bool {
        self.unmeasured_ticks == 0
    }
}

impl GeometryMember for Ship {
    fn id(&self) -> MemberId {
        self.id
    }

    fn bounds(&self) -> BoundingBox {
        if self.measured() {
            BoundingBox::from_center_extents(self.position, Vec3::repeat(self.size * 0.5))
        } else {
            BoundingBox::empty()
        }
    }
}

impl SceneElement for Ship {
    fn as_geometry(&self) -> Option<&dyn GeometryMember> {
        Some(self)
    }
}

struct OctreeSimulationApp {
    ships: SlotMap<MemberId, Ship>,
    manager: OctreeManager,
    notifications: NotificationQueue,

    // Counters for the final report
    rebuilds: u32,
    applied_notifications: usize,
}

impl OctreeSimulationApp {
    fn new(parameter: OctreeBuildParameter) -> Self {
        Self {
            ships: SlotMap::with_key(),
            manager: OctreeManager::with_parameter(parameter),
            notifications: NotificationQueue::new(),
            rebuilds: 0,
            applied_notifications: 0,
        }
    }

    fn spawn_ship(&mut self, size: f32, speed: f32, unmeasured_ticks: u32) -> MemberId {
        let mut rng = rand::thread_rng();
        let bounds = WORLD_SIZE / 2.0 - 10.0;
        let position = Vec3::new(
            rng.gen_range(-bounds..bounds),
            rng.gen_range(-bounds..bounds),
            rng.gen_range(-bounds..bounds),
        );
        let direction = Vec3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        let velocity = direction.try_normalize(1e-6).unwrap_or_else(Vec3::x) * speed;

        self.ships.insert_with_key(|id| Ship { id, position, velocity, size, unmeasured_ticks })
    }

    fn initialize(&mut self) -> Result<(), OctreeError> {
        for _ in 0..NUM_SMALL_SHIPS {
            self.spawn_ship(SMALL_SHIP_SIZE, SMALL_SHIP_SPEED, 0);
        }
        for _ in 0..NUM_LARGE_SHIPS {
            self.spawn_ship(LARGE_SHIP_SIZE, LARGE_SHIP_SPEED, 0);
        }
        self.rebuild_octree()?;

        // Ships whose bounds arrive a little later
        for _ in 0..NUM_LATE_SHIPS {
            let id = self.spawn_ship(SMALL_SHIP_SIZE, SMALL_SHIP_SPEED, MEASURE_AFTER_TICKS);
            self.manager.add_pending_item(&self.ships[id]);
        }
        Ok(())
    }

    fn rebuild_octree(&mut self) -> Result<(), OctreeError> {
        let elements: Vec<&Ship> = self.ships.values().collect();
        self.manager.rebuild_tree(&elements)?;
        self.rebuilds += 1;
        Ok(())
    }

    fn update(&mut self, delta_time: f32) {
        let half_bounds = WORLD_SIZE / 2.0;

        for ship in self.ships.values_mut() {
            if !ship.measured() {
                ship.unmeasured_ticks -= 1;
                if ship.measured() {
                    self.notifications.send(ship.id, BoundEvent::Initialized);
                }
                continue;
            }

            let old = ship.bounds();
            let mut pos = ship.position + ship.velocity * delta_time;

            // Bounce off walls
            for axis in 0..3 {
                if pos[axis] < -half_bounds || pos[axis] > half_bounds {
                    ship.velocity[axis] = -ship.velocity[axis];
                    pos[axis] = pos[axis].clamp(-half_bounds, half_bounds);
                }
            }

            ship.position = pos;
            self.notifications.send(ship.id, BoundEvent::Changed { old, new: ship.bounds() });
        }

        let ships = &self.ships;
        self.applied_notifications += self
            .manager
            .process_queue(&self.notifications, |id| ships.get(id).map(|ship| ship as &dyn GeometryMember));

        // Only rebuild when a ship escaped the root octant
        if self.manager.request_update_octree() {
            if let Err(e) = self.rebuild_octree() {
                log::warn!("Octree rebuild failed: {}", e);
            }
        }
    }

    fn despawn_first_ship(&mut self) {
        let Some(id) = self.ships.keys().next() else {
            return;
        };
        if let Some(ship) = self.ships.remove(id) {
            if let Err(e) = self.manager.remove_item(&ship) {
                log::warn!("Despawned ship was not indexed: {}", e);
            }
        }
    }

    fn log_stats(&self, tick: u32) {
        let Some(octree) = self.manager.octree() else {
            log::info!("Tick {}: no octree published ({:?})", tick, self.manager.state());
            return;
        };

        let leaves = octree.leaves();
        let occupied = leaves.iter().filter(|leaf| leaf.item_count() > 0).count();
        log::info!(
            "Tick {}: {} ships indexed, {} nodes, depth {}, leaves {} occupied / {} empty",
            tick,
            octree.item_count(),
            octree.node_count(),
            octree.depth(),
            occupied,
            leaves.len() - occupied
        );

        let origin = Vec3::new(-WORLD_SIZE, 0.0, 0.0);
        let result = octree.hit_test(&origin, &Vec3::x());
        match result.nearest() {
            Some(hit) => log::info!(
                "  probe ray hit {} ships, nearest {:?} at {:.2} ({} octants visited)",
                result.hits.len(),
                hit.id,
                hit.distance,
                result.hit_path.len()
            ),
            None => log::info!("  probe ray hit nothing"),
        }
    }

    fn run(mut self) -> Result<(), OctreeError> {
        self.initialize()?;
        self.log_stats(0);

        for tick in 1..=TICKS {
            if tick == DESPAWN_TICK {
                self.despawn_first_ship();
            }
            self.update(DELTA_TIME);
            if tick % STATS_INTERVAL == 0 {
                self.log_stats(tick);
            }
        }

        log::info!(
            "Done: {} ticks, {} rebuilds, {} notifications applied",
            TICKS,
            self.rebuilds,
            self.applied_notifications
        );
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dyn_octree::foundation::logging::init_with_default("info");

    let parameter = match std::env::args().nth(1) {
        Some(path) => OctreeBuildParameter::load_validated(&path)?,
        None => OctreeBuildParameter { record_hit_path_bounding_boxes: true, ..Default::default() },
    };
    log::info!("Octree parameters: {:?}", parameter);

    let app = OctreeSimulationApp::new(parameter);
    app.run()?;
    Ok(())
}
