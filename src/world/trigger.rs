//! Trigger command lists attached to sectors
//!
//! Triggers are authored script data: a condition kind plus a list of
//! commands run by the (external) trigger evaluator when an entity
//! activates the sector. This crate does not evaluate them; it only walks
//! `ActivateItem` entries, in command order, when a height query gives
//! placed items the chance to override floor/ceiling results.

use serde::{Deserialize, Serialize};

use crate::game::items::ItemId;

/// Activation condition for a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerKind {
    /// Fires when an entity steps on the sector
    Pad,
    /// Fires when the avatar performs the interact action here
    Switch,
    /// Fires once when a key item is used here
    Key,
    /// Fires every tick the avatar occupies the sector
    Heavy,
}

/// One command in a trigger's list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerCommand {
    /// Activate (or query, for height modifiers) a placed item
    ActivateItem(ItemId),
    /// Swap every room with its registered alternate
    FlipMap,
    /// Flip only if the alternate set is inactive
    FlipOn,
    /// Flip only if the alternate set is active
    FlipOff,
    /// Start a one-shot effect by index
    PlayEffect(u16),
}

/// An authored trigger: condition, timing, activation mask, commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    pub kind: TriggerKind,
    /// Delay in ticks before the commands run
    #[serde(default)]
    pub timer: u8,
    /// Activation bit mask matched against the activating entity
    #[serde(default)]
    pub mask: u8,
    pub commands: Vec<TriggerCommand>,
}

impl Trigger {
    pub fn pad(commands: Vec<TriggerCommand>) -> Self {
        Self {
            kind: TriggerKind::Pad,
            timer: 0,
            mask: 0,
            commands,
        }
    }

    /// Item ids referenced by this trigger, in command order.
    pub fn item_commands(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.commands.iter().filter_map(|c| match c {
            TriggerCommand::ActivateItem(id) => Some(*id),
            _ => None,
        })
    }
}
