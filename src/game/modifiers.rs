//! Height-modifier hooks for platform-like items
//!
//! Some items change the walkable height of the sector their trigger is
//! attached to: bridges span gaps, trapdoors and drawbridges become floor
//! only while closed/lowered. Height queries call these hooks in
//! trigger-command order after resolving the static sector height; each
//! hook may override the running result.
//!
//! Which sectors an item affects is decided by the level data (only those
//! sectors' triggers reference the item), not re-derived here.

use serde::{Deserialize, Serialize};

use super::items::Item;
use crate::math::quadrant;
use crate::world::geometry::{CLICK, SECTOR_SIZE};

/// Capability interface for items that override floor/ceiling results.
///
/// `y` is the query height; `height` is the value computed so far, which
/// the hook returns either unchanged or replaced.
pub trait HeightModifier {
    fn floor_height(&self, item: &Item, x: i32, y: i32, z: i32, height: i32) -> i32;
    fn ceiling_height(&self, item: &Item, x: i32, y: i32, z: i32, height: i32) -> i32;
}

/// Bridge surface shape: flat, or ramped one/two clicks across the tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Span {
    Flat,
    Tilt1,
    Tilt2,
}

impl Span {
    /// Bridge surface height at (x, z). Ramps drop along the item's
    /// facing: one click across the tile for Tilt1, two for Tilt2.
    fn surface(self, item: &Item, x: i32, z: i32) -> i32 {
        let along = match quadrant(item.angle) {
            0 => z & (SECTOR_SIZE - 1),
            1 => x & (SECTOR_SIZE - 1),
            2 => (SECTOR_SIZE - 1) - (z & (SECTOR_SIZE - 1)),
            _ => (SECTOR_SIZE - 1) - (x & (SECTOR_SIZE - 1)),
        };
        match self {
            Span::Flat => item.position.y,
            Span::Tilt1 => item.position.y + (along >> 2),
            Span::Tilt2 => item.position.y + (along >> 1),
        }
    }
}

impl HeightModifier for Span {
    fn floor_height(&self, item: &Item, x: i32, y: i32, z: i32, height: i32) -> i32 {
        let surface = self.surface(item, x, z);
        if y <= surface {
            surface
        } else {
            height
        }
    }

    fn ceiling_height(&self, item: &Item, x: i32, y: i32, z: i32, height: i32) -> i32 {
        let surface = self.surface(item, x, z);
        if y > surface {
            surface + CLICK
        } else {
            height
        }
    }
}

/// Hinged floor panel: solid while closed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trapdoor {
    pub open: bool,
}

impl HeightModifier for Trapdoor {
    fn floor_height(&self, item: &Item, _x: i32, y: i32, _z: i32, height: i32) -> i32 {
        if !self.open && y <= item.position.y {
            item.position.y
        } else {
            height
        }
    }

    fn ceiling_height(&self, item: &Item, _x: i32, y: i32, _z: i32, height: i32) -> i32 {
        if !self.open && y > item.position.y {
            item.position.y + CLICK
        } else {
            height
        }
    }
}

/// Castle-style bridge: walkable only once lowered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drawbridge {
    pub lowered: bool,
}

impl HeightModifier for Drawbridge {
    fn floor_height(&self, item: &Item, _x: i32, y: i32, _z: i32, height: i32) -> i32 {
        if self.lowered && y <= item.position.y {
            item.position.y
        } else {
            height
        }
    }

    fn ceiling_height(&self, item: &Item, _x: i32, y: i32, _z: i32, height: i32) -> i32 {
        if self.lowered && y > item.position.y {
            item.position.y + CLICK
        } else {
            height
        }
    }
}

/// What a placed item does. Behaviors that modify heights expose the
/// capability through `modifier()`; movable blocks mutate the terrain
/// instead (see `world::mutation`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Behavior {
    /// Pushable block; `grounded` gates flip-map footprint reapplication
    MovableBlock { grounded: bool },
    Bridge(Span),
    Trapdoor(Trapdoor),
    Drawbridge(Drawbridge),
}

impl Behavior {
    /// The height-modifier capability of this behavior, if any.
    pub fn modifier(&self) -> Option<&dyn HeightModifier> {
        match self {
            Behavior::Bridge(span) => Some(span),
            Behavior::Trapdoor(door) => Some(door),
            Behavior::Drawbridge(bridge) => Some(bridge),
            Behavior::MovableBlock { .. } => None,
        }
    }
}
