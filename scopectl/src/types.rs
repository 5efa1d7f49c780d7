//! Common type definitions.
//!
//! # ID Types
//!
//! Reservation IDs are UUIDs wrapped in a type alias, the same way every other entity ID in
//! the service is handled:
//!
//! - [`ReservationId`]: committed reservation identifier
//!
//! # Resource Keys
//!
//! [`ResourceKey`] names the unit the lock coordinator serializes on: one instrument at one
//! start time. The coordinator only understands flat strings, so the key renders itself as
//! `instrument_start`, escaping each component first so that two different slots can never
//! produce the same wire name.
//!
//! # Utility Functions
//!
//! - [`abbrev_uuid`]: Abbreviate UUIDs to first 8 chars for logging

use std::fmt;
use uuid::Uuid;

pub type ReservationId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

/// Separator between the instrument and start components of a resource name.
const SEPARATOR: char = '_';

/// The lockable unit: one instrument at one start time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    instrument: String,
    start: String,
}

impl ResourceKey {
    pub fn new(instrument: impl Into<String>, start: impl Into<String>) -> Self {
        Self {
            instrument: instrument.into(),
            start: start.into(),
        }
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    /// The name sent to the lock coordinator.
    ///
    /// `%` and `_` inside a component are percent-encoded, so the separator only ever appears
    /// between the two components. Slots whose fields contain neither character render as the
    /// plain `instrument_start` concatenation.
    pub fn resource_name(&self) -> String {
        format!("{}{SEPARATOR}{}", escape_component(&self.instrument), escape_component(&self.start))
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.resource_name())
    }
}

fn escape_component(component: &str) -> String {
    let mut out = String::with_capacity(component.len());
    for c in component.chars() {
        match c {
            '%' => out.push_str("%25"),
            SEPARATOR => out.push_str("%5F"),
            other => out.push(other),
        }
    }
    out
}
