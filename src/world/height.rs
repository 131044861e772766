//! Floor and ceiling height queries
//!
//! A height query runs in three stages: chase the pit/sky portal chain to
//! the sector that actually owns the surface, apply that sector's planar
//! tilt at the exact (x, z), then let every height-modifier item
//! referenced by the sector's trigger override the running result, in
//! trigger-command order.
//!
//! The slope classification travels in the returned `HeightInfo` instead
//! of the original engine's shared mutable "last tilt type" variable.

use log::trace;

use super::geometry::{Level, RoomId, SectorRef, SlopeClass, Tilt, MAX_PORTAL_HOPS, NO_HEIGHT, SECTOR_SIZE};
use crate::game::items::ItemTable;

/// Result of a floor or ceiling query.
#[derive(Debug, Clone, Copy)]
pub struct HeightInfo {
    /// Effective surface height in world units, or NO_HEIGHT
    pub height: i32,
    pub slope: SlopeClass,
    pub tilt: Tilt,
    /// The surface-owning sector is lava/instant-death
    pub hazardous: bool,
}

/// Per-axis tilt contribution at a point inside a sector. Zero at the
/// cell center; one slope unit spans one CLICK across the full sector.
fn tilt_adjust(x_slope: i32, z_slope: i32, x: i32, z: i32) -> i32 {
    let fx = (x & (SECTOR_SIZE - 1)) - SECTOR_SIZE / 2;
    let fz = (z & (SECTOR_SIZE - 1)) - SECTOR_SIZE / 2;
    (x_slope * fx + z_slope * fz) >> 2
}

/// Effective floor height at (x, z), starting from a resolved sector.
///
/// Descends the full pit chain (a caller that wants the y-bracketed stop
/// resolves via `Level::sector_at` first), applies the floor tilt, then
/// the trigger's height-modifier items. `y` is only consumed by the
/// modifier hooks.
pub fn floor_at(level: &Level, items: &ItemTable, sref: SectorRef, x: i32, y: i32, z: i32) -> HeightInfo {
    let mut sref = sref;
    let mut hops = 0u32;
    while level.sector(sref).pit_room.is_some() {
        let below = level.sector(sref).pit_room;
        let (cx, cz) = level.room(below).clamped_cell(x, z);
        sref = SectorRef {
            room: below,
            x: cx,
            z: cz,
        };
        hops += 1;
        if hops > MAX_PORTAL_HOPS {
            panic!("pit-portal chain exceeded {} hops", MAX_PORTAL_HOPS);
        }
    }

    let sector = level.sector(sref);
    let tilt = sector.floor_tilt;
    let slope = SlopeClass::of(tilt);
    let mut height = sector.floor;
    if height != NO_HEIGHT && !tilt.is_flat() {
        height += tilt_adjust(tilt.x_slope(), tilt.z_slope(), x, z);
    }

    height = apply_floor_modifiers(level, items, sector.trigger, x, y, z, height);

    HeightInfo {
        height,
        slope,
        tilt,
        hazardous: sector.hazardous,
    }
}

/// Effective ceiling height at (x, z), starting from a resolved sector.
/// Mirror image of `floor_at` through the sky chain; the ceiling tilt's
/// X component is applied sign-flipped.
pub fn ceiling_at(level: &Level, items: &ItemTable, sref: SectorRef, x: i32, y: i32, z: i32) -> HeightInfo {
    let mut sref = sref;
    let mut hops = 0u32;
    while level.sector(sref).sky_room.is_some() {
        let above = level.sector(sref).sky_room;
        let (cx, cz) = level.room(above).clamped_cell(x, z);
        sref = SectorRef {
            room: above,
            x: cx,
            z: cz,
        };
        hops += 1;
        if hops > MAX_PORTAL_HOPS {
            panic!("sky-portal chain exceeded {} hops", MAX_PORTAL_HOPS);
        }
    }

    let sector = level.sector(sref);
    let tilt = sector.ceiling_tilt;
    let slope = SlopeClass::of(tilt);
    let mut height = sector.ceiling;
    if height != NO_HEIGHT && !tilt.is_flat() {
        height += tilt_adjust(-tilt.x_slope(), tilt.z_slope(), x, z);
    }

    height = apply_ceiling_modifiers(level, items, sector.trigger, x, y, z, height);

    HeightInfo {
        height,
        slope,
        tilt,
        hazardous: sector.hazardous,
    }
}

/// Floor height at a world point: full resolution from `room`.
pub fn floor_height(
    level: &Level,
    items: &ItemTable,
    x: i32,
    y: i32,
    z: i32,
    room: RoomId,
) -> HeightInfo {
    let sref = level.sector_at(x, y, z, room);
    floor_at(level, items, sref, x, y, z)
}

/// Ceiling height at a world point: full resolution from `room`.
pub fn ceiling_height(
    level: &Level,
    items: &ItemTable,
    x: i32,
    y: i32,
    z: i32,
    room: RoomId,
) -> HeightInfo {
    let sref = level.sector_at(x, y, z, room);
    ceiling_at(level, items, sref, x, y, z)
}

/// Height of the nearest liquid boundary at (x, z).
///
/// From inside a liquid room, ascends sky links while the room above is
/// still liquid and returns the boundary sector's ceiling. From a dry
/// room, descends pit links until a liquid room appears underneath and
/// returns the boundary sector's floor. NO_HEIGHT if no liquid below.
pub fn water_height(level: &Level, x: i32, z: i32, room: RoomId) -> i32 {
    let mut sref = level.converge_walls(x, z, room);
    let mut hops = 0u32;

    if level.room(sref.room).flags.liquid {
        loop {
            let s = level.sector(sref);
            if s.sky_room.is_none() || !level.room(s.sky_room).flags.liquid {
                return s.ceiling;
            }
            let (cx, cz) = level.room(s.sky_room).clamped_cell(x, z);
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
    } else {
        loop {
            let s = level.sector(sref);
            if s.pit_room.is_none() {
                return NO_HEIGHT;
            }
            if level.room(s.pit_room).flags.liquid {
                return s.floor;
            }
            let (cx, cz) = level.room(s.pit_room).clamped_cell(x, z);
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
    }
}

fn apply_floor_modifiers(
    level: &Level,
    items: &ItemTable,
    trigger: Option<u16>,
    x: i32,
    y: i32,
    z: i32,
    mut height: i32,
) -> i32 {
    let Some(idx) = trigger else { return height };
    let Some(trigger) = level.triggers.get(idx as usize) else {
        return height;
    };
    for id in trigger.item_commands() {
        if let Some(item) = items.get(id) {
            if let Some(modifier) = item.behavior.modifier() {
                let before = height;
                height = modifier.floor_height(item, x, y, z, height);
                if height != before {
                    trace!("floor modifier {:?} at ({x},{z}): {before} -> {height}", id);
                }
            }
        }
    }
    height
}

fn apply_ceiling_modifiers(
    level: &Level,
    items: &ItemTable,
    trigger: Option<u16>,
    x: i32,
    y: i32,
    z: i32,
    mut height: i32,
) -> i32 {
    let Some(idx) = trigger else { return height };
    let Some(trigger) = level.triggers.get(idx as usize) else {
        return height;
    };
    for id in trigger.item_commands() {
        if let Some(item) = items.get(id) {
            if let Some(modifier) = item.behavior.modifier() {
                height = modifier.ceiling_height(item, x, y, z, height);
            }
        }
    }
    height
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::items::Item;
    use crate::game::modifiers::{Behavior, Span, Trapdoor};
    use crate::math::{Vec3i, ANGLE_NORTH};
    use crate::world::geometry::Room;
    use crate::world::trigger::{Trigger, TriggerCommand};

    fn flat_room(floor: i32, ceiling: i32) -> Level {
        let mut level = Level::new();
        let mut room = Room::new(Vec3i::ZERO, 3, 3);
        for x in 0..3 {
            for z in 0..3 {
                room.open_sector(x, z, floor, ceiling);
            }
        }
        level.add_room(room);
        level
    }

    #[test]
    fn test_flat_floor_is_exact() {
        let level = flat_room(512, -1024);
        let items = ItemTable::new();
        // No tilt: every in-cell offset returns the raw sector height
        for (x, z) in [(1536, 1536), (1024, 1024), (1100, 2000), (2047, 1025)] {
            let info = floor_height(&level, &items, x, 0, z, RoomId::new(0));
            assert_eq!(info.height, 512, "at ({x},{z})");
            assert_eq!(info.slope, SlopeClass::Flat);
        }
    }

    #[test]
    fn test_tilt_contribution_spans_one_click_per_unit() {
        let mut level = flat_room(0, -2048);
        level
            .room_mut(RoomId::new(0))
            .sector_mut(1, 1)
            .floor_tilt = Tilt::new(1, 0);
        let items = ItemTable::new();

        // Cell (1,1) covers x 1024..2047; center is flat
        let center = floor_height(&level, &items, 1536, 0, 1536, RoomId::new(0));
        assert_eq!(center.height, 0);
        assert_eq!(center.slope, SlopeClass::Gentle);
        // West edge rises half a click, east edge drops half a click
        let west = floor_height(&level, &items, 1024, 0, 1536, RoomId::new(0));
        assert_eq!(west.height, -128);
        let east = floor_height(&level, &items, 2047, 0, 1536, RoomId::new(0));
        assert_eq!(east.height, 127);
    }

    #[test]
    fn test_floor_descends_pit_chain() {
        let mut level = flat_room(0, -2048);
        level.room_mut(RoomId::new(0)).sector_mut(1, 1).pit_room = RoomId::new(1);
        let mut below = Room::new(Vec3i::ZERO, 3, 3);
        below.open_sector(1, 1, 3072, 0);
        level.add_room(below);
        let items = ItemTable::new();

        let sref = level.converge_walls(1536, 1536, RoomId::new(0));
        let info = floor_at(&level, &items, sref, 1536, -512, 1536);
        assert_eq!(info.height, 3072);
    }

    #[test]
    fn test_modifiers_run_in_trigger_command_order() {
        let mut level = flat_room(2048, -2048);
        let mut items = ItemTable::new();

        // Two stacked platforms on the same tile: a closed trapdoor above
        // a flat bridge. Commands list the trapdoor first, so the bridge
        // hook runs last and wins for a query above both.
        let trapdoor = items.spawn(Item::new(
            Vec3i::new(1536, -256, 1536),
            ANGLE_NORTH,
            RoomId::new(0),
            Behavior::Trapdoor(Trapdoor { open: false }),
        ));
        let bridge = items.spawn(Item::new(
            Vec3i::new(1536, -512, 1536),
            ANGLE_NORTH,
            RoomId::new(0),
            Behavior::Bridge(Span::Flat),
        ));
        level.triggers.push(Trigger::pad(vec![
            TriggerCommand::ActivateItem(trapdoor),
            TriggerCommand::ActivateItem(bridge),
        ]));
        level.room_mut(RoomId::new(0)).sector_mut(1, 1).trigger = Some(0);

        let info = floor_height(&level, &items, 1536, -1024, 1536, RoomId::new(0));
        assert_eq!(info.height, -512);

        // Between the two platforms only the trapdoor is overhead-floor
        let info = floor_height(&level, &items, 1536, -400, 1536, RoomId::new(0));
        assert_eq!(info.height, -256);
    }

    #[test]
    fn test_water_height_from_dry_and_liquid_side() {
        let mut level = Level::new();
        // Dry air room over a flooded room
        let mut air = Room::new(Vec3i::ZERO, 3, 3);
        air.open_sector(1, 1, 1024, -1024);
        air.sector_mut(1, 1).pit_room = RoomId::new(1);
        level.add_room(air);
        let mut pool = Room::new(Vec3i::ZERO, 3, 3);
        pool.open_sector(1, 1, 3072, 1024);
        pool.sector_mut(1, 1).sky_room = RoomId::new(0);
        pool.flags.liquid = true;
        level.add_room(pool);

        // From above: the boundary is the dry sector's floor
        assert_eq!(water_height(&level, 1536, 1536, RoomId::new(0)), 1024);
        // From inside the water: the boundary sector's ceiling
        assert_eq!(water_height(&level, 1536, 1536, RoomId::new(1)), 1024);
    }

    #[test]
    fn test_water_height_none_without_liquid() {
        let level = flat_room(0, -2048);
        assert_eq!(water_height(&level, 1536, 1536, RoomId::new(0)), NO_HEIGHT);
    }
}
