//! Dynamic-entity layer
//!
//! The global item table (generational ids), the height-modifier
//! capability implemented by platform-like items, and the collision
//! queries moving entities run against level geometry and placed statics.

pub mod collision;
pub mod items;
pub mod modifiers;
pub mod statics;

pub use collision::{
    grid_shift, probe, CollisionKind, ProbePolicy, ProbeResult, SurfaceReading, UNLIMITED_DROP,
};
pub use items::{Item, ItemId, ItemTable};
pub use modifiers::{Behavior, Drawbridge, HeightModifier, Span, Trapdoor};
pub use statics::{rooms_near, test_statics, StaticHit};
