//! Static decoration mesh collision
//!
//! Placed meshes collide as axis-aligned boxes: the authored bounds are
//! rotated by the placement's cardinal orientation into world min/max
//! extents, recomputed on every test. The moving entity's circular
//! footprint is treated as its inscribed square of side 2*radius.

use log::debug;

use crate::math::{quadrant, Vec3i};
use crate::world::geometry::{Aabb3i, Level, RoomId, StaticInfo, StaticPlacement};

use super::collision::CollisionKind;

/// Padding added to the query extents when gathering nearby rooms
const GATHER_MARGIN: i32 = 50;

/// A static mesh overlap, with the push-out shift already oriented by the
/// entity's movement quadrant.
#[derive(Debug, Clone, Copy)]
pub struct StaticHit {
    pub kind: CollisionKind,
    pub shift: Vec3i,
}

/// Rooms whose bounds touch the query box around `position`, found by a
/// breadth walk over wall/pit/sky links starting at `room`. The starting
/// room is always included.
pub fn rooms_near(
    level: &Level,
    position: Vec3i,
    radius: i32,
    height: i32,
    room: RoomId,
) -> Vec<RoomId> {
    let query = Aabb3i::new(
        Vec3i::new(
            position.x - radius - GATHER_MARGIN,
            position.y - height - GATHER_MARGIN,
            position.z - radius - GATHER_MARGIN,
        ),
        Vec3i::new(
            position.x + radius + GATHER_MARGIN,
            position.y + GATHER_MARGIN,
            position.z + radius + GATHER_MARGIN,
        ),
    );

    let mut out = vec![room];
    let mut cursor = 0;
    while cursor < out.len() {
        let current = out[cursor];
        cursor += 1;
        for neighbor in level.neighbor_rooms(current) {
            if !out.contains(&neighbor) && level.room(neighbor).bounds.intersects(&query) {
                out.push(neighbor);
            }
        }
    }
    out
}

/// Authored bounds rotated into world space. Only the four cardinal
/// orientations exist; the Y extent never rotates.
fn world_bounds(info: &StaticInfo, placement: &StaticPlacement) -> Aabb3i {
    let b = info.bounds;
    let (min_x, max_x, min_z, max_z) = match quadrant(placement.angle) {
        0 => (b.min.x, b.max.x, b.min.z, b.max.z),
        1 => (b.min.z, b.max.z, -b.max.x, -b.min.x),
        2 => (-b.max.x, -b.min.x, -b.max.z, -b.min.z),
        _ => (-b.max.z, -b.min.z, b.min.x, b.max.x),
    };
    let p = placement.position;
    Aabb3i::new(
        Vec3i::new(p.x + min_x, p.y + b.min.y, p.z + min_z),
        Vec3i::new(p.x + max_x, p.y + b.max.y, p.z + max_z),
    )
}

/// Test the entity box against every collidable static mesh in reach.
///
/// Returns on the first overlapping mesh: no deepest-penetration search
/// across multiple meshes. The shift pushes out along the minimal
/// penetration axis, oriented by `facing_quadrant`: penetration on the
/// cross axis beyond `radius` reads as a frontal hit (push back on the
/// facing axis, cross axis reverts toward `old`), within `radius` as a
/// lateral left/right push.
pub fn test_statics(
    level: &Level,
    position: Vec3i,
    old: Vec3i,
    facing_quadrant: usize,
    radius: i32,
    body_height: i32,
    room: RoomId,
) -> Option<StaticHit> {
    let entity = Aabb3i::new(
        Vec3i::new(position.x - radius, position.y - body_height, position.z - radius),
        Vec3i::new(position.x + radius, position.y, position.z + radius),
    );

    for room_id in rooms_near(level, position, radius, body_height, room) {
        for placement in &level.room(room_id).statics {
            let info = &level.static_infos[placement.info as usize];
            if !info.collidable {
                continue;
            }
            let bounds = world_bounds(info, placement);

            // Strict overlap on all three axes
            if entity.max.x <= bounds.min.x
                || entity.min.x >= bounds.max.x
                || entity.max.y <= bounds.min.y
                || entity.min.y >= bounds.max.y
                || entity.max.z <= bounds.min.z
                || entity.min.z >= bounds.max.z
            {
                continue;
            }

            // Signed push-out along each axis: whichever edge pair
            // overlaps less decides the direction
            let shift_x = {
                let left = entity.max.x - bounds.min.x;
                let right = bounds.max.x - entity.min.x;
                if left < right {
                    -left
                } else {
                    right
                }
            };
            let shift_z = {
                let near = entity.max.z - bounds.min.z;
                let far = bounds.max.z - entity.min.z;
                if near < far {
                    -near
                } else {
                    far
                }
            };

            let hit = orient_shift(facing_quadrant, position, old, radius, shift_x, shift_z);
            debug!(
                "static hit in room {}: kind {:?} shift ({}, {})",
                room_id.index(),
                hit.kind,
                hit.shift.x,
                hit.shift.z
            );
            return Some(hit);
        }
    }
    None
}

/// Turn raw per-axis push-outs into a quadrant-consistent shift.
///
/// Side mapping follows the compass: facing north (+Z) the left hand
/// points -X, facing east (+X) it points +Z, and so on; a push away from
/// an obstacle on the left side classifies as `Left`.
fn orient_shift(
    facing_quadrant: usize,
    position: Vec3i,
    old: Vec3i,
    radius: i32,
    shift_x: i32,
    shift_z: i32,
) -> StaticHit {
    let mut shift = Vec3i::ZERO;
    let kind;
    match facing_quadrant {
        // Facing +Z: X is the cross axis
        0 => {
            if shift_x.abs() > radius {
                shift.z = shift_z;
                shift.x = old.x - position.x;
                kind = CollisionKind::Front;
            } else if shift_x > 0 {
                shift.x = shift_x;
                kind = CollisionKind::Left;
            } else {
                shift.x = shift_x;
                kind = CollisionKind::Right;
            }
        }
        // Facing +X: Z is the cross axis
        1 => {
            if shift_z.abs() > radius {
                shift.x = shift_x;
                shift.z = old.z - position.z;
                kind = CollisionKind::Front;
            } else if shift_z < 0 {
                shift.z = shift_z;
                kind = CollisionKind::Left;
            } else {
                shift.z = shift_z;
                kind = CollisionKind::Right;
            }
        }
        // Facing -Z
        2 => {
            if shift_x.abs() > radius {
                shift.z = shift_z;
                shift.x = old.x - position.x;
                kind = CollisionKind::Front;
            } else if shift_x < 0 {
                shift.x = shift_x;
                kind = CollisionKind::Left;
            } else {
                shift.x = shift_x;
                kind = CollisionKind::Right;
            }
        }
        // Facing -X
        _ => {
            if shift_z.abs() > radius {
                shift.x = shift_x;
                shift.z = old.z - position.z;
                kind = CollisionKind::Front;
            } else if shift_z > 0 {
                shift.z = shift_z;
                kind = CollisionKind::Left;
            } else {
                shift.z = shift_z;
                kind = CollisionKind::Right;
            }
        }
    }
    StaticHit { kind, shift }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{ANGLE_EAST, ANGLE_NORTH};
    use crate::world::geometry::Room;

    fn level_with_static(bounds: Aabb3i, placement: StaticPlacement) -> Level {
        let mut level = Level::new();
        let mut room = Room::new(Vec3i::ZERO, 5, 5);
        for x in 0..5 {
            for z in 0..5 {
                room.open_sector(x, z, 0, -2048);
            }
        }
        room.statics.push(placement);
        level.add_room(room);
        level.static_infos.push(StaticInfo {
            bounds,
            collidable: true,
        });
        level
    }

    fn wide_block() -> Aabb3i {
        // Wider than a sector on X, thin on Z, two sectors tall
        Aabb3i::new(Vec3i::new(-600, -512, -100), Vec3i::new(600, 0, 100))
    }

    #[test]
    fn test_frontal_overlap_gives_z_only_shift() {
        // Mesh ahead of the entity on +Z, overlap spanning beyond the
        // radius on X, entity facing north straight at it
        let level = level_with_static(
            wide_block(),
            StaticPlacement {
                position: Vec3i::new(2560, 0, 2700),
                angle: ANGLE_NORTH,
                info: 0,
            },
        );
        let position = Vec3i::new(2560, 0, 2550);
        let hit = test_statics(&level, position, position, 0, 100, 762, RoomId::new(0))
            .expect("should collide");
        assert_eq!(hit.kind, CollisionKind::Front);
        assert_eq!(hit.shift.x, 0);
        // Pushed back out of the box's -Z face: entity max.z is 2650,
        // box min.z is 2600, so the shift is -50
        assert_eq!(hit.shift.z, -50);
    }

    #[test]
    fn test_narrow_overlap_gives_lateral_shift() {
        // Thin post clipping the entity's left edge while facing north
        let post = Aabb3i::new(Vec3i::new(-50, -512, -50), Vec3i::new(50, 0, 50));
        let level = level_with_static(
            post,
            StaticPlacement {
                position: Vec3i::new(2430, 0, 2560),
                angle: ANGLE_NORTH,
                info: 0,
            },
        );
        let position = Vec3i::new(2560, 0, 2560);
        let hit = test_statics(&level, position, position, 0, 100, 762, RoomId::new(0))
            .expect("should collide");
        assert_eq!(hit.kind, CollisionKind::Left);
        assert_eq!(hit.shift.z, 0);
        // entity min.x 2460, post max.x 2480: pushed +20 off the post
        assert_eq!(hit.shift.x, 20);
    }

    #[test]
    fn test_rotated_bounds_swap_axes() {
        // The wide block rotated east: long axis now runs along Z
        let level = level_with_static(
            wide_block(),
            StaticPlacement {
                position: Vec3i::new(2560, 0, 2560),
                angle: ANGLE_EAST,
                info: 0,
            },
        );
        let placement = &level.room(RoomId::new(0)).statics[0];
        let bounds = world_bounds(&level.static_infos[0], placement);
        assert_eq!(bounds.min.z, 2560 - 600);
        assert_eq!(bounds.max.z, 2560 + 600);
        assert_eq!(bounds.min.x, 2560 - 100);
        assert_eq!(bounds.max.x, 2560 + 100);
    }

    #[test]
    fn test_non_collidable_static_is_ignored() {
        let mut level = level_with_static(
            wide_block(),
            StaticPlacement {
                position: Vec3i::new(2560, 0, 2700),
                angle: ANGLE_NORTH,
                info: 0,
            },
        );
        level.static_infos[0].collidable = false;
        let position = Vec3i::new(2560, 0, 2550);
        assert!(test_statics(&level, position, position, 0, 100, 762, RoomId::new(0)).is_none());
    }

    #[test]
    fn test_rooms_near_walks_portals() {
        let mut level = Level::new();
        let mut a = Room::new(Vec3i::ZERO, 3, 3);
        a.open_sector(1, 1, 0, -2048);
        a.sector_mut(1, 1).wall_room = RoomId::new(1);
        level.add_room(a);
        let mut b = Room::new(Vec3i::new(3 * 1024, 0, 0), 3, 3);
        b.open_sector(1, 1, 0, -2048);
        level.add_room(b);
        // Far room, outside any query box
        let mut c = Room::new(Vec3i::new(100 * 1024, 0, 0), 3, 3);
        c.open_sector(1, 1, 0, -2048);
        level.add_room(c);

        let near = rooms_near(&level, Vec3i::new(3000, -100, 1500), 200, 762, RoomId::new(0));
        assert!(near.contains(&RoomId::new(0)));
        assert!(near.contains(&RoomId::new(1)));
        assert!(!near.contains(&RoomId::new(2)));
    }
}
