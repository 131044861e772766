//! Collision probe
//!
//! The multi-sample height probe that drives character movement. Each
//! call samples floor/ceiling clearances at the entity's center, at a
//! facing-projected point ahead, and at the two front corners of its
//! footprint, applies the caller's slope/hazard policy, folds in static
//! mesh overlaps, and classifies the contact into one directional case
//! with a single corrective shift. The character controller's state
//! handlers consume that classification to clamp or redirect motion.
//!
//! The probe is a pure reader: it never mutates the level, and its result
//! is rebuilt from scratch every call.

use log::debug;

use super::items::ItemTable;
use super::statics::test_statics;
use crate::math::{project_x, project_z, quadrant, Vec3i};
use crate::world::geometry::{Level, RoomId, SectorRef, SlopeClass, NO_HEIGHT, SECTOR_SIZE, WALL_SHIFT};
use crate::world::height::{ceiling_at, floor_at};

/// Sampling margin above the entity's head
const PROBE_HEADROOM: i32 = 160;

/// Floor reading substituted when a steep slope counts as a wall
const WALL_READING: i32 = -32767;

/// Floor reading substituted when a steep slope or hazard counts as a pit
const PIT_READING: i32 = 512;

/// "Any drop is fine" threshold for airborne/falling policies
pub const UNLIMITED_DROP: i32 = 32512;

/// Validity margin for the post-static-shift floor check
const STATIC_FLOOR_TOLERANCE: i32 = 512;

/// Directional contact classification consumed by the state handlers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollisionKind {
    #[default]
    None,
    /// Blocked ahead
    Front,
    /// Clipped on the left front corner
    Left,
    /// Clipped on the right front corner
    Right,
    /// Ceiling pushing down
    Top,
    /// Headroom ahead too low
    TopFront,
    /// Squeezed between floor and ceiling
    Clamp,
}

/// One sampled column, converted to clearances: floor relative to the
/// entity's feet (positive = floor below), ceiling relative to its head
/// (negative = clear). NO_HEIGHT passes through unconverted.
#[derive(Debug, Clone, Copy, Default)]
pub struct SurfaceReading {
    pub floor: i32,
    pub ceiling: i32,
    pub slope: SlopeClass,
}

/// Caller-supplied thresholds and slope/hazard handling for one probe.
#[derive(Debug, Clone, Copy)]
pub struct ProbePolicy {
    /// Largest tolerated floor drop ahead (positive, downward)
    pub bad_drop: i32,
    /// Largest tolerated step up ahead (negative, upward)
    pub bad_step: i32,
    /// Ceiling clearance threshold
    pub bad_ceiling: i32,
    /// Steep slopes rising toward the entity read as walls
    pub slopes_are_walls: bool,
    /// Steep slopes falling away read as pits
    pub slopes_are_pits: bool,
    /// Hazardous floors (lava) read as pits
    pub lava_is_pit: bool,
}

impl Default for ProbePolicy {
    fn default() -> Self {
        // Grounded-avatar defaults: one step up or down, no head contact
        Self {
            bad_drop: 384,
            bad_step: -384,
            bad_ceiling: 0,
            slopes_are_walls: false,
            slopes_are_pits: false,
            lava_is_pit: false,
        }
    }
}

/// Result of one probe call. Ephemeral: fully overwritten each call,
/// never persisted between simulation steps.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProbeResult {
    pub kind: CollisionKind,
    /// Corrective shift in world units
    pub shift: Vec3i,
    pub mid: SurfaceReading,
    pub front: SurfaceReading,
    pub left: SurfaceReading,
    pub right: SurfaceReading,
    /// Floor tilt pair (x, z) at the center sample
    pub tilt: (i32, i32),
    /// Movement quadrant the samples were laid out for
    pub quadrant: usize,
    /// A static mesh contributed to the shift
    pub hit_static: bool,
}

/// Shift that realigns a probed point back into the cell of `dst`:
/// the distance to the near/far cell boundary plus one unit, so the
/// entity always ends up strictly inside the destination cell.
pub fn grid_shift(src: i32, dst: i32) -> i32 {
    if (src >> WALL_SHIFT) == (dst >> WALL_SHIFT) {
        return 0;
    }
    let frac = src & (SECTOR_SIZE - 1);
    if dst > src {
        SECTOR_SIZE - frac
    } else {
        -frac - 1
    }
}

/// Sample one column: resolve the sector at the probe height, then read
/// effective floor and ceiling through the portal chains and modifiers.
fn sample(
    level: &Level,
    items: &ItemTable,
    x: i32,
    probe_y: i32,
    z: i32,
    feet_y: i32,
    head_y: i32,
    room: RoomId,
) -> (SurfaceReading, bool, (i32, i32), SectorRef) {
    let sref = level.sector_at(x, probe_y, z, room);
    let floor_info = floor_at(level, items, sref, x, probe_y, z);
    let ceiling_info = ceiling_at(level, items, sref, x, probe_y, z);

    let mut floor = floor_info.height;
    if floor != NO_HEIGHT {
        floor -= feet_y;
    }
    let mut ceiling = ceiling_info.height;
    if ceiling != NO_HEIGHT {
        ceiling -= head_y;
    }

    let reading = SurfaceReading {
        floor,
        ceiling,
        slope: floor_info.slope,
    };
    let tilt = (floor_info.tilt.x_slope(), floor_info.tilt.z_slope());
    (reading, floor_info.hazardous, tilt, sref)
}

/// Apply the caller's slope/hazard policy to a directional sample.
fn apply_policy(reading: &mut SurfaceReading, hazardous: bool, policy: &ProbePolicy) {
    if reading.floor == NO_HEIGHT {
        return;
    }
    if policy.slopes_are_walls && reading.slope == SlopeClass::Steep && reading.floor < 0 {
        reading.floor = WALL_READING;
    } else if policy.slopes_are_pits && reading.slope == SlopeClass::Steep && reading.floor > 0 {
        reading.floor = PIT_READING;
    } else if policy.lava_is_pit && reading.floor > 0 && hazardous {
        reading.floor = PIT_READING;
    }
}

/// The collision probe.
///
/// `position` is the entity's feet after the proposed move, `old` its
/// last known good position; `facing` uses the 65536-unit circle. The
/// returned shift is expressed along the axes implied by the movement
/// quadrant (both axes only on the static-mesh path).
#[allow(clippy::too_many_arguments)]
pub fn probe(
    level: &Level,
    items: &ItemTable,
    position: Vec3i,
    old: Vec3i,
    facing: u16,
    radius: i32,
    body_height: i32,
    room: RoomId,
    policy: &ProbePolicy,
) -> ProbeResult {
    let q = quadrant(facing);
    let head_y = position.y - body_height;
    let probe_y = head_y - PROBE_HEADROOM;

    let mut result = ProbeResult {
        quadrant: q,
        ..ProbeResult::default()
    };

    // Center sample; its resolved room seeds the directional samples
    let (mid, _, tilt, mid_ref) = sample(
        level, items, position.x, probe_y, position.z, position.y, head_y, room,
    );
    result.mid = mid;
    result.tilt = tilt;
    let base_room = mid_ref.room;

    // Quadrant-dependent sample offsets: the front offset projects the
    // exact facing on the free axis so diagonal facings sample ahead
    let sin_r = project_x(radius, facing);
    let cos_r = project_z(radius, facing);
    let (xf, zf, xl, zl, xr, zr) = match q {
        0 => (sin_r, radius, -radius, radius, radius, radius),
        1 => (radius, cos_r, radius, radius, radius, -radius),
        2 => (sin_r, -radius, radius, -radius, -radius, -radius),
        _ => (-radius, cos_r, -radius, -radius, -radius, radius),
    };

    let (mut front, front_hazard, _, _) = sample(
        level,
        items,
        position.x + xf,
        probe_y,
        position.z + zf,
        position.y,
        head_y,
        base_room,
    );
    apply_policy(&mut front, front_hazard, policy);
    result.front = front;

    let (mut left, left_hazard, _, _) = sample(
        level,
        items,
        position.x + xl,
        probe_y,
        position.z + zl,
        position.y,
        head_y,
        base_room,
    );
    apply_policy(&mut left, left_hazard, policy);
    result.left = left;

    let (mut right, right_hazard, _, _) = sample(
        level,
        items,
        position.x + xr,
        probe_y,
        position.z + zr,
        position.y,
        head_y,
        base_room,
    );
    apply_policy(&mut right, right_hazard, policy);
    result.right = right;

    // Static decoration meshes: their shift survives unless one of the
    // classification cases below overwrites it
    if let Some(hit) = test_statics(level, position, old, q, radius, body_height, base_room) {
        result.hit_static = true;
        let mut shift = hit.shift;

        // Reconcile: the shifted spot must itself be standable, else
        // push the other way
        let sx = position.x + shift.x;
        let sz = position.z + shift.z;
        let sref = level.sector_at(sx, probe_y, sz, base_room);
        let floor = floor_at(level, items, sref, sx, probe_y, sz).height;
        let ceiling = ceiling_at(level, items, sref, sx, probe_y, sz).height;
        let floor_bad =
            floor == NO_HEIGHT || floor < position.y - STATIC_FLOOR_TOLERANCE;
        let ceiling_bad = ceiling != NO_HEIGHT && ceiling > head_y;
        if floor_bad || ceiling_bad {
            debug!("static shift ({}, {}) lands in invalid spot, inverting", shift.x, shift.z);
            shift.x = -shift.x;
            shift.z = -shift.z;
        }
        result.kind = hit.kind;
        result.shift = shift;
    }

    // Classification, in priority order. Exactly one kind and shift
    // survive per call.
    if result.mid.floor == NO_HEIGHT {
        result.shift = old - position;
        result.kind = CollisionKind::Front;
        return result;
    }

    if result.mid.floor - result.mid.ceiling <= 0 {
        result.shift = old - position;
        result.kind = CollisionKind::Clamp;
        return result;
    }

    if result.mid.ceiling >= 0 {
        // Head contact: record it and keep evaluating the front cases
        result.shift.y = result.mid.ceiling;
        result.kind = CollisionKind::Top;
    }

    if result.front.floor > policy.bad_drop
        || result.front.floor < policy.bad_step
        || result.front.ceiling > policy.bad_ceiling
    {
        if result.front.floor == NO_HEIGHT {
            result.shift = old - position;
        } else {
            match q {
                0 | 2 => {
                    result.shift.x = old.x - position.x;
                    result.shift.z = grid_shift(position.z + zf, position.z);
                }
                _ => {
                    result.shift.x = grid_shift(position.x + xf, position.x);
                    result.shift.z = old.z - position.z;
                }
            }
        }
        result.kind = CollisionKind::Front;
        return result;
    }

    if result.front.ceiling >= policy.bad_ceiling {
        result.shift = old - position;
        result.kind = CollisionKind::TopFront;
        return result;
    }

    if result.left.floor > policy.bad_drop || result.left.floor < policy.bad_step {
        match q {
            0 | 2 => result.shift.x = grid_shift(position.x + xl, position.x),
            _ => result.shift.z = grid_shift(position.z + zl, position.z),
        }
        result.kind = CollisionKind::Left;
        return result;
    }

    if result.right.floor > policy.bad_drop || result.right.floor < policy.bad_step {
        match q {
            0 | 2 => result.shift.x = grid_shift(position.x + xr, position.x),
            _ => result.shift.z = grid_shift(position.z + zr, position.z),
        }
        result.kind = CollisionKind::Right;
        return result;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{ANGLE_EAST, ANGLE_NORTH};
    use crate::world::geometry::{Aabb3i, Room, StaticInfo, StaticPlacement, Tilt};

    /// 5x5 room, open interior, floors at `floor`, ceilings at `ceiling`
    fn open_room(floor: i32, ceiling: i32) -> Level {
        let mut level = Level::new();
        let mut room = Room::new(Vec3i::ZERO, 5, 5);
        for x in 0..5 {
            for z in 0..5 {
                room.open_sector(x, z, floor, ceiling);
            }
        }
        level.add_room(room);
        level
    }

    const RADIUS: i32 = 100;
    const HEIGHT: i32 = 762;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn test_grid_shift_boundary_arithmetic() {
        // Same cell: nothing to do
        assert_eq!(grid_shift(1500, 1200), 0);
        // Probed point one cell ahead (+): pull back to one unit inside
        assert_eq!(grid_shift(2060, 2000), -(2060 & 1023) - 1);
        // Probed point one cell behind (-): push up to the boundary
        assert_eq!(grid_shift(1990, 2060), 1024 - (1990 & 1023));
    }

    #[test]
    fn test_flat_room_probe_is_clear() {
        init_logging();
        let level = open_room(0, -4096);
        let items = ItemTable::new();
        // Cell center, airborne: floor and ceiling both far away
        let position = Vec3i::new(2560, -1024, 2560);
        let policy = ProbePolicy {
            bad_drop: UNLIMITED_DROP,
            ..ProbePolicy::default()
        };
        let result = probe(
            &level, &items, position, position, ANGLE_NORTH, RADIUS, HEIGHT,
            RoomId::new(0), &policy,
        );
        assert_eq!(result.kind, CollisionKind::None);
        assert_eq!(result.shift, Vec3i::ZERO);
        assert!(!result.hit_static);
        assert_eq!(result.tilt, (0, 0));
    }

    #[test]
    fn test_missing_front_floor_reverts_to_old_position() {
        let mut level = open_room(0, -4096);
        // Kill the floor of the row ahead (z = 3) entirely
        for x in 0..5 {
            let s = level.room_mut(RoomId::new(0)).sector_mut(x, 3);
            s.floor = NO_HEIGHT;
            s.ceiling = NO_HEIGHT;
        }
        let items = ItemTable::new();
        let old = Vec3i::new(2560, 0, 2900);
        let position = Vec3i::new(2560, 0, 2980); // front sample crosses into z-cell 3
        let result = probe(
            &level, &items, position, old, ANGLE_NORTH, RADIUS, HEIGHT,
            RoomId::new(0), &ProbePolicy::default(),
        );
        assert_eq!(result.kind, CollisionKind::Front);
        assert_eq!(result.shift, old - position);
    }

    #[test]
    fn test_missing_mid_floor_reverts() {
        let mut level = open_room(0, -4096);
        let s = level.room_mut(RoomId::new(0)).sector_mut(2, 2);
        s.floor = NO_HEIGHT;
        s.ceiling = NO_HEIGHT;
        let items = ItemTable::new();
        let old = Vec3i::new(1536, 0, 2560);
        let position = Vec3i::new(2560, 0, 2560);
        let result = probe(
            &level, &items, position, old, ANGLE_NORTH, RADIUS, HEIGHT,
            RoomId::new(0), &ProbePolicy::default(),
        );
        assert_eq!(result.kind, CollisionKind::Front);
        assert_eq!(result.shift, old - position);
    }

    #[test]
    fn test_step_ahead_gives_front_with_grid_shift() {
        let mut level = open_room(0, -4096);
        // Row ahead raised two clicks: too high to step
        for x in 0..5 {
            level.room_mut(RoomId::new(0)).sector_mut(x, 3).floor = -512;
        }
        let items = ItemTable::new();
        let old = Vec3i::new(2560, 0, 2900);
        let position = Vec3i::new(2560, 0, 2980);
        let result = probe(
            &level, &items, position, old, ANGLE_NORTH, RADIUS, HEIGHT,
            RoomId::new(0), &ProbePolicy::default(),
        );
        assert_eq!(result.kind, CollisionKind::Front);
        // Cross axis reverts, facing axis realigns to the cell boundary
        assert_eq!(result.shift.x, old.x - position.x);
        assert_eq!(result.shift.z, grid_shift(position.z + RADIUS, position.z));
        assert_eq!(result.shift.z, -(3080 & 1023) - 1);
    }

    #[test]
    fn test_clamp_when_no_vertical_space() {
        let mut level = open_room(0, -4096);
        // Center cell pinched shut: ceiling meets the floor
        level.room_mut(RoomId::new(0)).sector_mut(2, 2).ceiling = 0;
        let items = ItemTable::new();
        let old = Vec3i::new(1536, 0, 2560);
        let position = Vec3i::new(2560, 0, 2560);
        let result = probe(
            &level, &items, position, old, ANGLE_NORTH, RADIUS, HEIGHT,
            RoomId::new(0), &ProbePolicy::default(),
        );
        assert_eq!(result.kind, CollisionKind::Clamp);
        assert_eq!(result.shift, old - position);
    }

    #[test]
    fn test_ceiling_intrusion_reports_top() {
        let mut level = open_room(0, -4096);
        // Ceiling everywhere dips below the entity's head by 62 units
        for x in 0..5 {
            for z in 0..5 {
                level.room_mut(RoomId::new(0)).sector_mut(x, z).ceiling = -700;
            }
        }
        let items = ItemTable::new();
        let position = Vec3i::new(2560, 0, 2560);
        let policy = ProbePolicy {
            bad_ceiling: 100,
            ..ProbePolicy::default()
        };
        let result = probe(
            &level, &items, position, position, ANGLE_NORTH, RADIUS, HEIGHT,
            RoomId::new(0), &policy,
        );
        assert_eq!(result.kind, CollisionKind::Top);
        // Shift.y carries the intrusion amount: ceiling(-700) - head(-762)
        assert_eq!(result.shift.y, 62);
    }

    #[test]
    fn test_steep_slope_ahead_reads_as_wall() {
        let mut level = open_room(0, -4096);
        // Steep ramp ahead whose near edge reads as a small step up -
        // acceptable to the default thresholds, but a wall under policy
        for x in 0..5 {
            let s = level.room_mut(RoomId::new(0)).sector_mut(x, 3);
            s.floor = 0;
            s.floor_tilt = Tilt::new(0, 3);
        }
        let items = ItemTable::new();
        let old = Vec3i::new(2560, 0, 2900);
        let position = Vec3i::new(2560, 0, 2980);

        // Without the policy the step is fine
        let relaxed = probe(
            &level, &items, position, old, ANGLE_NORTH, RADIUS, HEIGHT,
            RoomId::new(0), &ProbePolicy::default(),
        );
        assert_eq!(relaxed.kind, CollisionKind::None);

        let strict = ProbePolicy {
            slopes_are_walls: true,
            ..ProbePolicy::default()
        };
        let result = probe(
            &level, &items, position, old, ANGLE_NORTH, RADIUS, HEIGHT,
            RoomId::new(0), &strict,
        );
        assert_eq!(result.kind, CollisionKind::Front);
        assert_eq!(result.front.floor, -32767);
    }

    #[test]
    fn test_left_corner_drop_gives_left_shift() {
        let mut level = open_room(0, -4096);
        // Column left of the entity (x-cell 1) drops away
        for z in 0..5 {
            level.room_mut(RoomId::new(0)).sector_mut(1, z).floor = 1024;
        }
        let items = ItemTable::new();
        // Near the west edge of cell 2 so only the left corner crosses
        let position = Vec3i::new(2130, 0, 2560);
        let result = probe(
            &level, &items, position, position, ANGLE_NORTH, RADIUS, HEIGHT,
            RoomId::new(0), &ProbePolicy::default(),
        );
        assert_eq!(result.kind, CollisionKind::Left);
        assert_eq!(result.shift.x, grid_shift(position.x - RADIUS, position.x));
        assert_eq!(result.shift.z, 0);
    }

    #[test]
    fn test_static_hit_sets_flag_and_survives_clear_classification() {
        init_logging();
        let mut level = open_room(0, -4096);
        level.static_infos.push(StaticInfo {
            bounds: Aabb3i::new(Vec3i::new(-600, -512, -100), Vec3i::new(600, 0, 100)),
            collidable: true,
        });
        level.room_mut(RoomId::new(0)).statics.push(StaticPlacement {
            position: Vec3i::new(2560, 0, 2700),
            angle: ANGLE_NORTH,
            info: 0,
        });
        let items = ItemTable::new();
        let old = Vec3i::new(2560, 0, 2500);
        let position = Vec3i::new(2560, 0, 2550);
        let result = probe(
            &level, &items, position, old, ANGLE_NORTH, RADIUS, HEIGHT,
            RoomId::new(0), &ProbePolicy::default(),
        );
        assert!(result.hit_static);
        assert_eq!(result.kind, CollisionKind::Front);
        // Z-only push-out from the mesh face
        assert_eq!(result.shift.x, 0);
        assert_eq!(result.shift.z, -50);
    }

    #[test]
    fn test_quadrant_east_probes_along_x() {
        let mut level = open_room(0, -4096);
        // Column ahead on +X raised too high
        for z in 0..5 {
            level.room_mut(RoomId::new(0)).sector_mut(3, z).floor = -512;
        }
        let items = ItemTable::new();
        let old = Vec3i::new(2900, 0, 2560);
        let position = Vec3i::new(2980, 0, 2560);
        let result = probe(
            &level, &items, position, old, ANGLE_EAST, RADIUS, HEIGHT,
            RoomId::new(0), &ProbePolicy::default(),
        );
        assert_eq!(result.kind, CollisionKind::Front);
        assert_eq!(result.shift.z, old.z - position.z);
        assert_eq!(result.shift.x, grid_shift(position.x + RADIUS, position.x));
    }
}
