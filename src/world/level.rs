//! Spatial-state snapshots
//!
//! Uses RON (Rusty Object Notation) for human-readable snapshot files.
//! Supports both compressed (brotli) and uncompressed RON:
//! - Reading: auto-detects format by checking for a valid RON start
//! - Writing: always compresses with brotli
//!
//! A snapshot carries everything Terrain Mutation can change - sector
//! heights, pathing blocked flags, room-flip status, item state - so the
//! save-game subsystem can fully reconstruct this subsystem.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::geometry::{Level, Room, NO_BOX};
use crate::game::items::ItemTable;

/// Validation limits to prevent resource exhaustion from malicious files
pub mod limits {
    /// Maximum number of rooms in a level
    pub const MAX_ROOMS: usize = 1024;
    /// Maximum grid dimension (width or depth) for a room
    pub const MAX_ROOM_SIZE: usize = 128;
    /// Maximum number of triggers
    pub const MAX_TRIGGERS: usize = 4096;
    /// Maximum coordinate magnitude (prevents overflow issues)
    pub const MAX_COORD: i32 = 1 << 26;
}

/// A self-contained snapshot of the mutable spatial state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub level: Level,
    pub items: ItemTable,
}

/// Error type for snapshot loading/saving
#[derive(Debug)]
pub enum SnapshotError {
    IoError(std::io::Error),
    ParseError(ron::error::SpannedError),
    SerializeError(ron::Error),
    ValidationError(String),
}

impl From<std::io::Error> for SnapshotError {
    fn from(e: std::io::Error) -> Self {
        SnapshotError::IoError(e)
    }
}

impl From<ron::error::SpannedError> for SnapshotError {
    fn from(e: ron::error::SpannedError) -> Self {
        SnapshotError::ParseError(e)
    }
}

impl From<ron::Error> for SnapshotError {
    fn from(e: ron::Error) -> Self {
        SnapshotError::SerializeError(e)
    }
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotError::IoError(e) => write!(f, "IO error: {}", e),
            SnapshotError::ParseError(e) => write!(f, "Parse error: {}", e),
            SnapshotError::SerializeError(e) => write!(f, "Serialize error: {}", e),
            SnapshotError::ValidationError(e) => write!(f, "Validation error: {}", e),
        }
    }
}

fn is_valid_coord(v: i32) -> bool {
    v.abs() <= limits::MAX_COORD
}

/// Validate a room against the rest of the level
fn validate_room(room: &Room, room_idx: usize, level: &Level) -> Result<(), String> {
    let context = format!("room[{}]", room_idx);
    let total_rooms = level.rooms.len();

    if room.width == 0 || room.depth == 0 {
        return Err(format!("{}: empty grid", context));
    }
    if room.width > limits::MAX_ROOM_SIZE || room.depth > limits::MAX_ROOM_SIZE {
        return Err(format!(
            "{}: grid too large ({}x{} > {})",
            context,
            room.width,
            room.depth,
            limits::MAX_ROOM_SIZE
        ));
    }
    if room.sectors.len() != room.width * room.depth {
        return Err(format!(
            "{}: sector array length mismatch ({} != {}x{})",
            context,
            room.sectors.len(),
            room.width,
            room.depth
        ));
    }
    if !is_valid_coord(room.origin.x) || !is_valid_coord(room.origin.y) || !is_valid_coord(room.origin.z) {
        return Err(format!(
            "{}: invalid origin ({}, {}, {})",
            context, room.origin.x, room.origin.y, room.origin.z
        ));
    }
    if room.alternate.is_some() && room.alternate.index() >= total_rooms {
        return Err(format!(
            "{}: alternate room {} out of range (only {} rooms)",
            context,
            room.alternate.index(),
            total_rooms
        ));
    }

    for (i, s) in room.sectors.iter().enumerate() {
        for link in [s.wall_room, s.pit_room, s.sky_room] {
            if link.is_some() && link.index() >= total_rooms {
                return Err(format!(
                    "{} sector[{}]: portal to room {} out of range",
                    context,
                    i,
                    link.index()
                ));
            }
        }
        if let Some(t) = s.trigger {
            if t as usize >= level.triggers.len() {
                return Err(format!(
                    "{} sector[{}]: trigger {} out of range (only {})",
                    context,
                    i,
                    t,
                    level.triggers.len()
                ));
            }
        }
        if s.box_id != NO_BOX && s.box_id as usize >= level.pathing.boxes.len() {
            return Err(format!(
                "{} sector[{}]: pathing box {} out of range",
                context, i, s.box_id
            ));
        }
    }

    for (i, placement) in room.statics.iter().enumerate() {
        if placement.info as usize >= level.static_infos.len() {
            return Err(format!(
                "{} static[{}]: catalog index {} out of range",
                context, i, placement.info
            ));
        }
    }

    Ok(())
}

/// Validate an entire snapshot
pub fn validate_snapshot(snapshot: &Snapshot) -> Result<(), SnapshotError> {
    let level = &snapshot.level;

    if level.rooms.len() > limits::MAX_ROOMS {
        return Err(SnapshotError::ValidationError(format!(
            "too many rooms ({} > {})",
            level.rooms.len(),
            limits::MAX_ROOMS
        )));
    }
    if level.triggers.len() > limits::MAX_TRIGGERS {
        return Err(SnapshotError::ValidationError(format!(
            "too many triggers ({} > {})",
            level.triggers.len(),
            limits::MAX_TRIGGERS
        )));
    }

    for (i, room) in level.rooms.iter().enumerate() {
        validate_room(room, i, level).map_err(SnapshotError::ValidationError)?;
    }

    for (id, item) in snapshot.items.iter() {
        if item.room.is_some() && item.room.index() >= level.rooms.len() {
            return Err(SnapshotError::ValidationError(format!(
                "item {:?}: room {} out of range",
                id,
                item.room.index()
            )));
        }
    }

    Ok(())
}

fn decode_bytes(bytes: &[u8]) -> Result<String, SnapshotError> {
    // Detect format: RON files start with '(' or whitespace, brotli is binary
    let is_plain_ron = bytes
        .first()
        .map(|&b| b == b'(' || b == b' ' || b == b'\n' || b == b'\r' || b == b'\t')
        .unwrap_or(false);

    if is_plain_ron {
        String::from_utf8(bytes.to_vec()).map_err(|e| {
            SnapshotError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("invalid UTF-8: {}", e),
            ))
        })
    } else {
        let mut decompressed = Vec::new();
        brotli::BrotliDecompress(&mut Cursor::new(bytes), &mut decompressed).map_err(|e| {
            SnapshotError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("brotli decompression failed: {}", e),
            ))
        })?;
        String::from_utf8(decompressed).map_err(|e| {
            SnapshotError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("invalid UTF-8 after decompression: {}", e),
            ))
        })
    }
}

fn finish_load(mut snapshot: Snapshot) -> Result<Snapshot, SnapshotError> {
    validate_snapshot(&snapshot)?;
    // Bounds are derived state and not serialized
    for room in &mut snapshot.level.rooms {
        room.recalculate_bounds();
    }
    Ok(snapshot)
}

/// Load a snapshot from a file (compressed or plain RON)
pub fn load_snapshot<P: AsRef<Path>>(path: P) -> Result<Snapshot, SnapshotError> {
    let bytes = fs::read(path)?;
    let contents = decode_bytes(&bytes)?;
    let snapshot: Snapshot = ron::from_str(&contents)?;
    finish_load(snapshot)
}

/// Parse a snapshot from a RON string (for embedded fixtures or testing)
pub fn snapshot_from_str(s: &str) -> Result<Snapshot, SnapshotError> {
    let snapshot: Snapshot = ron::from_str(s)?;
    finish_load(snapshot)
}

/// Serialize a snapshot to compressed bytes
pub fn serialize_snapshot(snapshot: &Snapshot) -> Result<Vec<u8>, SnapshotError> {
    let config = ron::ser::PrettyConfig::new()
        .depth_limit(4)
        .indentor("  ".to_string());
    let ron_string = ron::ser::to_string_pretty(snapshot, config)?;

    // brotli quality 6, window 22 - good balance of speed and ratio
    let mut compressed = Vec::new();
    brotli::BrotliCompress(
        &mut Cursor::new(ron_string.as_bytes()),
        &mut compressed,
        &brotli::enc::BrotliEncoderParams {
            quality: 6,
            lgwin: 22,
            ..Default::default()
        },
    )
    .map_err(|e| {
        SnapshotError::IoError(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("brotli compression failed: {}", e),
        ))
    })?;

    Ok(compressed)
}

/// Save a snapshot to a compressed RON file
pub fn save_snapshot<P: AsRef<Path>>(snapshot: &Snapshot, path: P) -> Result<(), SnapshotError> {
    let data = serialize_snapshot(snapshot)?;
    fs::write(path, data)?;
    Ok(())
}
