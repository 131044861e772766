//! Core geometry types for sector-based room worlds
//!
//! A level is an arena of rooms; each room owns a 2D grid of sectors.
//! Sectors carry floor/ceiling heights, one packed tilt per surface, and
//! portal links: a *wall* link hands the cell over to a horizontal
//! neighbor room, *pit*/*sky* links continue floor/ceiling resolution into
//! the room below/above. All heights are integer world units with Y
//! increasing downward, so a sector's floor is numerically >= its ceiling.

use serde::{Deserialize, Serialize};

use super::trigger::Trigger;
use crate::game::items::ItemId;
use crate::math::Vec3i;

/// Sector size in world units
pub const SECTOR_SIZE: i32 = 1024;

/// log2 of SECTOR_SIZE, for grid arithmetic
pub const WALL_SHIFT: i32 = 10;

/// One height step (quarter sector)
pub const CLICK: i32 = 256;

/// "No floor/ceiling here" sentinel.
///
/// In y-down units this sits far above any real geometry, so the floor
/// bracket test `y >= floor` is always satisfied for it and pit-chain
/// walks terminate on `NO_ROOM` instead of on a height comparison.
pub const NO_HEIGHT: i32 = -32512;

/// Sector participates in no pathing box
pub const NO_BOX: u16 = u16::MAX;

/// Bound on portal-chain walks. Production level data is acyclic; hitting
/// this guard means the level data broke that contract.
pub const MAX_PORTAL_HOPS: u32 = 64;

/// Stable index of a room in the level arena.
///
/// Portal links use `RoomId::NONE` for "no neighbor" instead of an
/// out-of-band null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomId(u16);

impl RoomId {
    /// The NO_ROOM sentinel.
    pub const NONE: RoomId = RoomId(u16::MAX);

    pub fn new(index: usize) -> Self {
        RoomId(index as u16)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    pub fn is_some(self) -> bool {
        self != Self::NONE
    }
}

impl Default for RoomId {
    fn default() -> Self {
        RoomId::NONE
    }
}

/// Packed two-axis slope descriptor: signed 4-bit X slope in the low
/// nibble, signed 4-bit Z slope in the high nibble. One slope unit is one
/// CLICK of height change across a full sector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tilt(pub u8);

impl Tilt {
    pub const FLAT: Tilt = Tilt(0);

    /// Pack two slope components, clamped to the representable -8..=7.
    pub fn new(x: i8, z: i8) -> Self {
        let x = (x.clamp(-8, 7) as u8) & 0x0F;
        let z = (z.clamp(-8, 7) as u8) & 0x0F;
        Tilt(x | (z << 4))
    }

    /// Slope along the X axis, sign-extended.
    /// Positive means the surface drops toward +X.
    pub fn x_slope(self) -> i32 {
        let n = (self.0 & 0x0F) as i32;
        if n >= 8 {
            n - 16
        } else {
            n
        }
    }

    /// Slope along the Z axis, sign-extended.
    pub fn z_slope(self) -> i32 {
        let n = (self.0 >> 4) as i32;
        if n >= 8 {
            n - 16
        } else {
            n
        }
    }

    pub fn is_flat(self) -> bool {
        self.0 == 0
    }
}

/// Slope steepness category used by the collision probe's policy clamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlopeClass {
    #[default]
    Flat,
    /// Walkable slope, component magnitude <= 2
    Gentle,
    /// Too steep to stand on, component magnitude > 2
    Steep,
}

impl SlopeClass {
    pub fn of(tilt: Tilt) -> Self {
        if tilt.is_flat() {
            SlopeClass::Flat
        } else if tilt.x_slope().abs() > 2 || tilt.z_slope().abs() > 2 {
            SlopeClass::Steep
        } else {
            SlopeClass::Gentle
        }
    }
}

/// One grid cell of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sector {
    /// Floor height in world units, NO_HEIGHT if the cell has no floor
    pub floor: i32,
    /// Ceiling height in world units, NO_HEIGHT if open above
    pub ceiling: i32,
    /// Floor slope descriptor
    pub floor_tilt: Tilt,
    /// Ceiling slope descriptor
    pub ceiling_tilt: Tilt,
    /// Horizontal continuation into a neighbor room
    pub wall_room: RoomId,
    /// Floor continues in this room below
    pub pit_room: RoomId,
    /// Ceiling continues in this room above
    pub sky_room: RoomId,
    /// Index into the level trigger table
    pub trigger: Option<u16>,
    /// Index into the external pathing table, NO_BOX if unreachable
    pub box_id: u16,
    /// Lava / instant-death surface
    pub hazardous: bool,
}

impl Sector {
    /// A solid wall column: no floor, no ceiling, no links.
    pub fn wall() -> Self {
        Self {
            floor: NO_HEIGHT,
            ceiling: NO_HEIGHT,
            floor_tilt: Tilt::FLAT,
            ceiling_tilt: Tilt::FLAT,
            wall_room: RoomId::NONE,
            pit_room: RoomId::NONE,
            sky_room: RoomId::NONE,
            trigger: None,
            box_id: NO_BOX,
            hazardous: false,
        }
    }

    /// An open cell with flat floor and ceiling.
    pub fn open(floor: i32, ceiling: i32) -> Self {
        Self {
            floor,
            ceiling,
            ..Self::wall()
        }
    }
}

impl Default for Sector {
    fn default() -> Self {
        Self::wall()
    }
}

/// Room-level flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomFlags {
    /// Room volume is liquid (water/quicksand)
    #[serde(default)]
    pub liquid: bool,
    /// Room is open to the sky
    #[serde(default)]
    pub outside: bool,
}

/// Axis-aligned bounding box in integer world units.
/// `min` holds the numerically smallest corner, so with y-down coordinates
/// `min.y` is the highest point of the box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aabb3i {
    pub min: Vec3i,
    pub max: Vec3i,
}

impl Aabb3i {
    pub fn new(min: Vec3i, max: Vec3i) -> Self {
        Self { min, max }
    }

    /// Expand bounds to include a point
    pub fn expand(&mut self, p: Vec3i) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    pub fn intersects(&self, other: &Aabb3i) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }
}

/// Catalog entry for a static decoration mesh: authored collision bounds
/// in object-local units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticInfo {
    pub bounds: Aabb3i,
    /// Purely visual statics opt out of collision entirely
    pub collidable: bool,
}

/// A static mesh placed in a room at one of four cardinal orientations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticPlacement {
    pub position: Vec3i,
    pub angle: u16,
    /// Index into `Level::static_infos`
    pub info: u16,
}

/// One entry of the external creature-pathing table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathBox {
    /// Authored floor height of the box
    pub floor: i32,
    /// Whether a movable block may mark this box as blocked
    pub markable: bool,
    /// Set while a block occupies the box
    pub blocked: bool,
}

/// External creature-pathing table, referenced by sector `box_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathingTable {
    pub boxes: Vec<PathBox>,
}

/// A room: a rectangular sector grid with its own world-space origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// World position of the grid's (0, 0) corner
    pub origin: Vec3i,
    /// Grid width in sectors (X direction)
    pub width: usize,
    /// Grid depth in sectors (Z direction)
    pub depth: usize,
    /// Row-major sector grid, index = x * depth + z
    pub sectors: Vec<Sector>,
    #[serde(default)]
    pub flags: RoomFlags,
    /// Flip-map partner room, NONE if this room never flips
    #[serde(default)]
    pub alternate: RoomId,
    /// Items currently located in this room (owned by the global item table)
    #[serde(default)]
    pub items: Vec<ItemId>,
    /// Transient effects located in this room (owned externally)
    #[serde(default)]
    pub effects: Vec<u32>,
    /// Static decoration meshes placed in this room
    #[serde(default)]
    pub statics: Vec<StaticPlacement>,
    /// World-space bounds, derived from sectors - not serialized
    #[serde(skip)]
    pub bounds: Aabb3i,
}

impl Room {
    /// Create a room filled with solid wall sectors.
    pub fn new(origin: Vec3i, width: usize, depth: usize) -> Self {
        Self {
            origin,
            width,
            depth,
            sectors: vec![Sector::wall(); width * depth],
            flags: RoomFlags::default(),
            alternate: RoomId::NONE,
            items: Vec::new(),
            effects: Vec::new(),
            statics: Vec::new(),
            bounds: Aabb3i::default(),
        }
    }

    #[inline]
    fn index(&self, x: usize, z: usize) -> usize {
        debug_assert!(x < self.width && z < self.depth);
        x * self.depth + z
    }

    pub fn sector(&self, x: usize, z: usize) -> &Sector {
        &self.sectors[self.index(x, z)]
    }

    pub fn sector_mut(&mut self, x: usize, z: usize) -> &mut Sector {
        let idx = self.index(x, z);
        &mut self.sectors[idx]
    }

    /// Carve an open cell with flat floor and ceiling.
    pub fn open_sector(&mut self, x: usize, z: usize, floor: i32, ceiling: i32) -> &mut Sector {
        let idx = self.index(x, z);
        self.sectors[idx] = Sector::open(floor, ceiling);
        &mut self.sectors[idx]
    }

    /// Grid cell containing a world point. Coordinates clamp to the grid,
    /// and on the boundary rows/columns the cross axis is biased inward by
    /// one, so points exactly on a room's outer boundary resolve to the
    /// adjacent interior cell.
    pub fn clamped_cell(&self, x: i32, z: i32) -> (usize, usize) {
        let mut cx = (x - self.origin.x) >> WALL_SHIFT;
        let mut cz = (z - self.origin.z) >> WALL_SHIFT;
        let w = self.width as i32;
        let d = self.depth as i32;

        if cz <= 0 {
            cz = 0;
            cx = clamp_interior(cx, w);
        } else if cz >= d - 1 {
            cz = d - 1;
            cx = clamp_interior(cx, w);
        } else {
            cx = cx.clamp(0, w - 1);
        }
        (cx as usize, cz as usize)
    }

    /// Recalculate world-space bounds from the sector heights.
    /// Call after loading or mutating the grid.
    pub fn recalculate_bounds(&mut self) {
        let mut top = i32::MAX; // numerically smallest y (highest point)
        let mut bottom = i32::MIN;
        for s in &self.sectors {
            if s.floor != NO_HEIGHT {
                bottom = bottom.max(s.floor);
                top = top.min(s.floor);
            }
            if s.ceiling != NO_HEIGHT {
                top = top.min(s.ceiling);
                bottom = bottom.max(s.ceiling);
            }
        }
        if top == i32::MAX {
            top = self.origin.y;
            bottom = self.origin.y;
        }
        self.bounds = Aabb3i::new(
            Vec3i::new(self.origin.x, top, self.origin.z),
            Vec3i::new(
                self.origin.x + self.width as i32 * SECTOR_SIZE,
                bottom,
                self.origin.z + self.depth as i32 * SECTOR_SIZE,
            ),
        );
    }
}

fn clamp_interior(v: i32, size: i32) -> i32 {
    if size <= 2 {
        v.clamp(0, (size - 1).max(0))
    } else {
        v.clamp(1, size - 2)
    }
}

/// A resolved sector address: which room, which cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorRef {
    pub room: RoomId,
    pub x: usize,
    pub z: usize,
}

/// The level: an arena of rooms plus the shared tables the sectors
/// reference (triggers, static-mesh catalog, pathing boxes).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub triggers: Vec<Trigger>,
    #[serde(default)]
    pub static_infos: Vec<StaticInfo>,
    #[serde(default)]
    pub pathing: PathingTable,
    /// Flip-map status: whether the alternate room set is active
    #[serde(default)]
    pub flipped: bool,
}

impl Level {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a room and return its arena index.
    pub fn add_room(&mut self, mut room: Room) -> RoomId {
        room.recalculate_bounds();
        let id = RoomId::new(self.rooms.len());
        self.rooms.push(room);
        id
    }

    /// Room lookup. A NONE or out-of-range id is a fatal precondition
    /// violation (level data is validated at load).
    pub fn room(&self, id: RoomId) -> &Room {
        &self.rooms[id.index()]
    }

    pub fn room_mut(&mut self, id: RoomId) -> &mut Room {
        &mut self.rooms[id.index()]
    }

    pub fn sector(&self, r: SectorRef) -> &Sector {
        self.room(r.room).sector(r.x, r.z)
    }

    pub fn sector_mut(&mut self, r: SectorRef) -> &mut Sector {
        self.room_mut(r.room).sector_mut(r.x, r.z)
    }

    /// Follow wall-portal links from `room` until the cell under (x, z)
    /// has no horizontal continuation. Terminates because wall portals are
    /// acyclic by construction of the level data; the hop guard converts a
    /// broken contract into a detectable invariant violation.
    pub fn converge_walls(&self, x: i32, z: i32, room: RoomId) -> SectorRef {
        let mut current = room;
        let mut hops = 0u32;
        loop {
            let r = self.room(current);
            let (cx, cz) = r.clamped_cell(x, z);
            let next = r.sector(cx, cz).wall_room;
            if next.is_none() {
                return SectorRef {
                    room: current,
                    x: cx,
                    z: cz,
                };
            }
            current = next;
            hops += 1;
            if hops > MAX_PORTAL_HOPS {
                panic!(
                    "wall-portal chain exceeded {} hops at ({}, {}); level data is not acyclic",
                    MAX_PORTAL_HOPS, x, z
                );
            }
        }
    }

    /// Resolve the sector containing a world point: wall-portal
    /// convergence first, then pit/sky hops until the point's height
    /// bracket is satisfied. NO_HEIGHT floors compare as always-below, so
    /// chains through floorless cells run until their own NO_ROOM.
    pub fn sector_at(&self, x: i32, y: i32, z: i32, room: RoomId) -> SectorRef {
        let mut sref = self.converge_walls(x, z, room);

        if y >= self.sector(sref).floor {
            // Below the floor: keep entering the rooms underneath
            let mut hops = 0u32;
            loop {
                let s = self.sector(sref);
                if y < s.floor || s.pit_room.is_none() {
                    break;
                }
                let below = self.room(s.pit_room);
                let (cx, cz) = below.clamped_cell(x, z);
                sref = SectorRef {
                    room: s.pit_room,
                    x: cx,
                    z: cz,
                };
                hops += 1;
                if hops > MAX_PORTAL_HOPS {
                    panic!("pit-portal chain exceeded {} hops", MAX_PORTAL_HOPS);
                }
            }
        } else if y < self.sector(sref).ceiling {
            // Above the ceiling: keep entering the rooms overhead
            let mut hops = 0u32;
            loop {
                let s = self.sector(sref);
                if y >= s.ceiling || s.sky_room.is_none() {
                    break;
                }
                let above = self.room(s.sky_room);
                let (cx, cz) = above.clamped_cell(x, z);
                sref = SectorRef {
                    room: s.sky_room,
                    x: cx,
                    z: cz,
                };
                hops += 1;
                if hops > MAX_PORTAL_HOPS {
                    panic!("sky-portal chain exceeded {} hops", MAX_PORTAL_HOPS);
                }
            }
        }
        sref
    }

    /// Every distinct room reachable through one of this room's sector
    /// links, in first-seen order. Used by broad-phase item/creature scans.
    pub fn neighbor_rooms(&self, room: RoomId) -> Vec<RoomId> {
        let mut out = Vec::new();
        for s in &self.room(room).sectors {
            for link in [s.wall_room, s.pit_room, s.sky_room] {
                if link.is_some() && link != room && !out.contains(&link) {
                    out.push(link);
                }
            }
        }
        out
    }
}
