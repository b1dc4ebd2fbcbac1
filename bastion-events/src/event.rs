//! The operator event record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an operator event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperatorEventId(Uuid);

impl OperatorEventId {
    /// Creates a new time-ordered event ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for OperatorEventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OperatorEventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Severity of an operator event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventLevel {
    Info,
    Warn,
    Error,
}

impl fmt::Display for EventLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        })
    }
}

/// Part of the server an event concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSubsystem {
    MemoryManager,
    ClusterTopology,
    Dcv2,
    SystemSetup,
    Resource,
}

impl fmt::Display for EventSubsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MemoryManager => "memory-manager",
            Self::ClusterTopology => "cluster-topology",
            Self::Dcv2 => "dcv2",
            Self::SystemSetup => "system-setup",
            Self::Resource => "resource",
        })
    }
}

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    MemoryLongGc,
    TopologyNodeJoined,
    TopologyNodeLeft,
    TopologyNodeState,
    TopologyHandshakeReject,
    TopologyActiveLeft,
    TopologyMirrorLeft,
    TopologyZapReceived,
    TopologyZapAccepted,
    TopologyDbDirty,
    TopologyConfigReloaded,
    Dcv2ServerMapEviction,
    SystemTimeDifferent,
    ResourceCapacityNear,
    ResourceCapacityFull,
    ResourceCapacityRestored,
}

impl EventType {
    /// The subsystem this kind of event belongs to.
    #[must_use]
    pub const fn subsystem(self) -> EventSubsystem {
        match self {
            Self::MemoryLongGc => EventSubsystem::MemoryManager,
            Self::TopologyNodeJoined
            | Self::TopologyNodeLeft
            | Self::TopologyNodeState
            | Self::TopologyHandshakeReject
            | Self::TopologyActiveLeft
            | Self::TopologyMirrorLeft
            | Self::TopologyZapReceived
            | Self::TopologyZapAccepted
            | Self::TopologyDbDirty
            | Self::TopologyConfigReloaded => EventSubsystem::ClusterTopology,
            Self::Dcv2ServerMapEviction => EventSubsystem::Dcv2,
            Self::SystemTimeDifferent => EventSubsystem::SystemSetup,
            Self::ResourceCapacityNear
            | Self::ResourceCapacityFull
            | Self::ResourceCapacityRestored => EventSubsystem::Resource,
        }
    }
}

/// A single operator-facing event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorEvent {
    id: OperatorEventId,
    level: EventLevel,
    subsystem: EventSubsystem,
    event_type: EventType,
    message: String,
    /// Events sharing a non-empty key may be folded together. Empty means
    /// never fold.
    collapse_key: String,
    timestamp: DateTime<Utc>,
}

impl OperatorEvent {
    /// Creates an event stamped with the current time. The subsystem is
    /// derived from `event_type`.
    #[must_use]
    pub fn new(
        level: EventLevel,
        event_type: EventType,
        message: impl Into<String>,
        collapse_key: impl Into<String>,
    ) -> Self {
        Self {
            id: OperatorEventId::new(),
            level,
            subsystem: event_type.subsystem(),
            event_type,
            message: message.into(),
            collapse_key: collapse_key.into(),
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn id(&self) -> OperatorEventId {
        self.id
    }

    #[must_use]
    pub fn level(&self) -> EventLevel {
        self.level
    }

    #[must_use]
    pub fn subsystem(&self) -> EventSubsystem {
        self.subsystem
    }

    #[must_use]
    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn collapse_key(&self) -> &str {
        &self.collapse_key
    }

    /// Returns true if this event may be folded into `other`.
    #[must_use]
    pub fn collapses_with(&self, other: &Self) -> bool {
        !self.collapse_key.is_empty()
            && self.collapse_key == other.collapse_key
            && self.event_type == other.event_type
    }

    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Milliseconds since the Unix epoch.
    #[must_use]
    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }

    /// Writes the event to the tracing pipeline at its level.
    pub fn emit(&self) {
        match self.level {
            EventLevel::Info => tracing::info!(
                target: "bastion::operator",
                id = %self.id,
                subsystem = %self.subsystem,
                event_type = ?self.event_type,
                collapse_key = %self.collapse_key,
                "{}", self.message
            ),
            EventLevel::Warn => tracing::warn!(
                target: "bastion::operator",
                id = %self.id,
                subsystem = %self.subsystem,
                event_type = ?self.event_type,
                collapse_key = %self.collapse_key,
                "{}", self.message
            ),
            EventLevel::Error => tracing::error!(
                target: "bastion::operator",
                id = %self.id,
                subsystem = %self.subsystem,
                event_type = ?self.event_type,
                collapse_key = %self.collapse_key,
                "{}", self.message
            ),
        }
    }
}

impl fmt::Display for OperatorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {} - {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
            self.level,
            self.subsystem,
            self.message
        )
    }
}
