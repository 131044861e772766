//! World module - room-based level state and queries
//!
//! - Sector grids with wall/pit/sky portal links between rooms
//! - Height queries with tilt and per-item modifier hooks
//! - Terrain mutation (movable blocks, flip-maps), the only writers
//! - Snapshot serialization of all mutable state

pub mod geometry;
pub mod height;
pub mod level;
pub mod mutation;
pub mod trigger;

pub use geometry::{
    Aabb3i, Level, PathBox, PathingTable, Room, RoomFlags, RoomId, Sector, SectorRef, SlopeClass,
    StaticInfo, StaticPlacement, Tilt, CLICK, MAX_PORTAL_HOPS, NO_BOX, NO_HEIGHT, SECTOR_SIZE,
    WALL_SHIFT,
};
pub use height::{ceiling_at, ceiling_height, floor_at, floor_height, water_height, HeightInfo};
pub use level::{
    load_snapshot, save_snapshot, serialize_snapshot, snapshot_from_str, validate_snapshot,
    Snapshot, SnapshotError,
};
pub use mutation::{alter_floor_height, flip_rooms, place_item_in_room};
pub use trigger::{Trigger, TriggerCommand, TriggerKind};
