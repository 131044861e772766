//! Global item table with generational ids
//!
//! Items (movable blocks, bridges, trapdoors, ...) are owned by one global
//! table; rooms only keep back-reference lists of the items currently
//! inside them. Ids carry a generation counter so a reference to a
//! despawned item can never silently match a newcomer that reused its
//! slot.

use serde::{Deserialize, Serialize};

use crate::game::modifiers::Behavior;
use crate::math::Vec3i;
use crate::world::geometry::RoomId;

/// A unique identifier for a placed item.
///
/// Consists of a slot index and the generation of that slot; two ids with
/// the same index but different generations are different items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId {
    index: u32,
    generation: u32,
}

impl ItemId {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(self) -> u32 {
        self.index
    }

    /// A null/invalid item reference for "no target" fields.
    pub const NULL: ItemId = ItemId {
        index: u32::MAX,
        generation: 0,
    };

    pub fn is_null(self) -> bool {
        self.index == u32::MAX
    }
}

impl Default for ItemId {
    fn default() -> Self {
        ItemId::NULL
    }
}

/// A dynamic entity placed in the world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub position: Vec3i,
    /// Facing angle, 65536-unit circle
    pub angle: u16,
    /// Room currently containing the item
    pub room: RoomId,
    pub behavior: Behavior,
    /// Whether the trigger layer has switched the item on
    pub active: bool,
}

impl Item {
    pub fn new(position: Vec3i, angle: u16, room: RoomId, behavior: Behavior) -> Self {
        Self {
            position,
            angle,
            room,
            behavior,
            active: false,
        }
    }
}

/// The global item table: sparse slots plus per-slot generations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemTable {
    generations: Vec<u32>,
    free: Vec<u32>,
    slots: Vec<Option<Item>>,
}

impl ItemTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an item, reusing a freed slot if one exists.
    pub fn spawn(&mut self, item: Item) -> ItemId {
        if let Some(index) = self.free.pop() {
            self.slots[index as usize] = Some(item);
            ItemId::new(index, self.generations[index as usize])
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Some(item));
            self.generations.push(0);
            ItemId::new(index, 0)
        }
    }

    /// Remove an item, invalidating all outstanding ids for its slot.
    pub fn despawn(&mut self, id: ItemId) -> Option<Item> {
        if !self.is_alive(id) {
            return None;
        }
        let idx = id.index as usize;
        self.generations[idx] += 1;
        self.free.push(id.index);
        self.slots[idx].take()
    }

    pub fn is_alive(&self, id: ItemId) -> bool {
        if id.is_null() {
            return false;
        }
        let idx = id.index as usize;
        idx < self.generations.len()
            && self.generations[idx] == id.generation
            && self.slots[idx].is_some()
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        if !self.is_alive(id) {
            return None;
        }
        self.slots[id.index as usize].as_ref()
    }

    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        if !self.is_alive(id) {
            return None;
        }
        self.slots[id.index as usize].as_mut()
    }

    /// Iterate over all live items.
    pub fn iter(&self) -> impl Iterator<Item = (ItemId, &Item)> {
        self.slots.iter().enumerate().filter_map(|(idx, slot)| {
            slot.as_ref()
                .map(|item| (ItemId::new(idx as u32, self.generations[idx]), item))
        })
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
