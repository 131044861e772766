//! Terrain mutation: movable-block floor edits and flip-maps
//!
//! These are the only writers of the sector grid. Everything else in the
//! crate is a pure reader; the call ordering discipline is mutate first,
//! then query - a mutation completes fully before any query in the same
//! tick observes the room.

use log::{debug, warn};

use super::geometry::{Level, RoomId, CLICK, NO_BOX, NO_HEIGHT, SECTOR_SIZE};
use crate::game::items::{ItemId, ItemTable};
use crate::game::modifiers::Behavior;

/// Height of a movable block's footprint: one tile.
const BLOCK_HEIGHT: i32 = SECTOR_SIZE;

/// Adjust the floor of the sector beneath `item` by `delta` world units
/// (click-quantized; y-down, so a negative delta raises the floor).
///
/// A floor that meets its ceiling collapses to NO_HEIGHT; raising back
/// out of the collapsed state re-derives from the ceiling, so the inverse
/// delta restores the original height exactly. If the sector's pathing
/// box is markable, its blocked flag is recomputed as "floor raised above
/// the box's authored floor".
pub fn alter_floor_height(level: &mut Level, items: &ItemTable, item_id: ItemId, delta: i32) {
    let Some(item) = items.get(item_id) else {
        warn!("alter_floor_height on dead item {:?}", item_id);
        return;
    };
    let delta = (delta / CLICK) * CLICK;
    if delta == 0 {
        return;
    }

    let sref = level.sector_at(item.position.x, item.position.y, item.position.z, item.room);
    let sector = level.sector_mut(sref);
    if sector.floor == NO_HEIGHT {
        sector.floor = sector.ceiling + delta;
    } else {
        sector.floor += delta;
        if sector.floor == sector.ceiling {
            sector.floor = NO_HEIGHT;
        }
    }
    debug!(
        "floor under item {:?} adjusted by {} to {}",
        item_id, delta, sector.floor
    );

    let (floor, box_id) = {
        let s = level.sector(sref);
        (s.floor, s.box_id)
    };
    if box_id != NO_BOX {
        let pbox = &mut level.pathing.boxes[box_id as usize];
        if pbox.markable {
            // NO_HEIGHT compares as raised, so a collapsed cell blocks too
            pbox.blocked = floor < pbox.floor;
        }
    }
}

/// Swap every room with its registered alternate, in place.
///
/// The whole room struct swaps (sectors, flags, bounds), then the item
/// and effect back-reference lists and the alternate link are restored to
/// the room index: occupants stay attached to their world location while
/// the geometry changes under them. Grounded movable blocks lift their
/// floor footprint before the swap and re-apply it to the swapped-in
/// sectors afterwards. Calling twice restores everything exactly.
pub fn flip_rooms(level: &mut Level, items: &ItemTable) {
    let mut swapped: Vec<usize> = Vec::new();

    // Collect the pairs first; the alternate links are level data
    let mut pairs: Vec<(usize, usize)> = Vec::new();
    for i in 0..level.rooms.len() {
        let alt = level.rooms[i].alternate;
        if alt.is_none() {
            continue;
        }
        let j = alt.index();
        if j == i || swapped.contains(&i) || swapped.contains(&j) {
            continue;
        }
        swapped.push(i);
        swapped.push(j);
        pairs.push((i.min(j), i.max(j)));
    }

    // Lift block footprints out of the outgoing geometry
    for &(i, j) in &pairs {
        for room_index in [i, j] {
            for &item_id in &level.rooms[room_index].items.clone() {
                if is_grounded_block(items, item_id) {
                    alter_floor_height(level, items, item_id, BLOCK_HEIGHT);
                }
            }
        }
    }

    for &(i, j) in &pairs {
        level.rooms.swap(i, j);
        let (head, tail) = level.rooms.split_at_mut(j);
        let a = &mut head[i];
        let b = &mut tail[0];
        std::mem::swap(&mut a.items, &mut b.items);
        std::mem::swap(&mut a.effects, &mut b.effects);
        std::mem::swap(&mut a.alternate, &mut b.alternate);
        debug!("flipped rooms {} <-> {}", i, j);
    }

    // Stamp block footprints into the incoming geometry
    for &(i, j) in &pairs {
        for room_index in [i, j] {
            for &item_id in &level.rooms[room_index].items.clone() {
                if is_grounded_block(items, item_id) {
                    alter_floor_height(level, items, item_id, -BLOCK_HEIGHT);
                }
            }
        }
    }

    level.flipped = !level.flipped;
}

fn is_grounded_block(items: &ItemTable, id: ItemId) -> bool {
    matches!(
        items.get(id).map(|item| item.behavior),
        Some(Behavior::MovableBlock { grounded: true })
    )
}

/// Register an item in a room's back-reference list and on the item.
pub fn place_item_in_room(level: &mut Level, items: &mut ItemTable, id: ItemId, room: RoomId) {
    if let Some(item) = items.get_mut(id) {
        if item.room.is_some() {
            let old = &mut level.room_mut(item.room).items;
            old.retain(|&other| other != id);
        }
        item.room = room;
        level.room_mut(room).items.push(id);
    }
}
