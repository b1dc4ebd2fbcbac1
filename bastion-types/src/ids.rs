//! Identifier types used throughout the Bastion core.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::Error;

/// Cluster-wide identity of a server-managed entity.
///
/// Two entities are the same entity exactly when both the fully-qualified
/// type name and the instance name match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId {
    type_name: String,
    name: String,
}

impl EntityId {
    /// Creates an entity ID from a type name and an instance name.
    #[must_use]
    pub fn new(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            name: name.into(),
        }
    }

    /// Creates an entity ID whose type name is the Rust type name of `T`.
    #[must_use]
    pub fn of<T: ?Sized>(name: impl Into<String>) -> Self {
        Self::new(std::any::type_name::<T>(), name)
    }

    /// The fully-qualified entity type name.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The instance name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parses an entity ID of the form `<type>:<name>`.
    ///
    /// The type name may contain `::` path separators but never a lone `:`,
    /// so the split happens on the first lone `:`. Everything after it is the
    /// instance name, which may itself contain `:` as long as it does not
    /// start with one.
    pub fn parse(s: &str) -> Result<Self, Error> {
        let bytes = s.as_bytes();
        let split = (0..bytes.len()).find(|&i| {
            bytes[i] == b':'
                && (i == 0 || bytes[i - 1] != b':')
                && bytes.get(i + 1) != Some(&b':')
        });
        match split {
            Some(i) if i > 0 && i + 1 < s.len() => Ok(Self::new(&s[..i], &s[i + 1..])),
            _ => Err(Error::InvalidEntityId(s.to_string())),
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.type_name, self.name)
    }
}

impl FromStr for EntityId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Identifies one local attachment to a server-side entity.
///
/// Allocated by an entity reference, starting at 1 and strictly increasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientInstanceId(u64);

impl ClientInstanceId {
    /// The first id handed out by a fresh reference.
    pub const FIRST: Self = Self(1);

    /// Creates a client instance ID, rejecting the reserved value 0.
    pub fn new(value: u64) -> Result<Self, Error> {
        if value == 0 {
            return Err(Error::ZeroClientInstanceId);
        }
        Ok(Self(value))
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ClientInstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out strictly increasing client instance ids, starting at 1.
///
/// Each entity reference owns exactly one allocator; ids are never reused for
/// the lifetime of the allocator.
#[derive(Debug)]
pub struct ClientInstanceIdAllocator {
    next: AtomicU64,
}

impl ClientInstanceIdAllocator {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(ClientInstanceId::FIRST.0),
        }
    }

    /// Allocates the next id in a single atomic step.
    pub fn allocate(&self) -> ClientInstanceId {
        ClientInstanceId(self.next.fetch_add(1, Ordering::SeqCst))
    }

    /// The id the next call to [`allocate`](Self::allocate) will return.
    #[must_use]
    pub fn peek(&self) -> ClientInstanceId {
        ClientInstanceId(self.next.load(Ordering::SeqCst))
    }
}

impl Default for ClientInstanceIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// The entity API version a client asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityVersion(u64);

impl EntityVersion {
    #[must_use]
    pub const fn new(version: u64) -> Self {
        Self(version)
    }

    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl From<u64> for EntityVersion {
    fn from(version: u64) -> Self {
        Self(version)
    }
}

/// Identifies a consumer of server-side services: an entity instance or a
/// synthetic global consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConsumerId(u64);

impl ConsumerId {
    /// Consumer id used by the platform itself rather than any entity.
    pub const PLATFORM: Self = Self(0);

    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConsumerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name of a cluster node (server or client).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}
