//! Typed cell values.

use core::fmt;

use crate::tree::Oid;
use crate::types::ValueType;

/// A value stored on a scalar instance or table cell.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    Integer(i64),
    /// Counters, gauges and time ticks.
    Unsigned(u64),
    OctetString(String),
    ObjectIdentifier(Oid),
    IpAddress([u8; 4]),
    Boolean(bool),
    Null,
}

impl Value {
    /// Natural type of this value when no declared type is known.
    #[must_use]
    pub const fn natural_type(&self) -> ValueType {
        match self {
            Self::Integer(_) => ValueType::Integer,
            Self::Unsigned(_) => ValueType::Gauge,
            Self::OctetString(_) => ValueType::OctetString,
            Self::ObjectIdentifier(_) => ValueType::ObjectIdentifier,
            Self::IpAddress(_) => ValueType::IpAddress,
            Self::Boolean(_) => ValueType::Boolean,
            Self::Null => ValueType::Null,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::OctetString(s) => Some(s),
            _ => None,
        }
    }

    /// Integer content of `Integer` and `Unsigned` values.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Integer(n) => Some(n),
            Self::Unsigned(n) => i64::try_from(n).ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_oid(&self) -> Option<&Oid> {
        match self {
            Self::ObjectIdentifier(oid) => Some(oid),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{n}"),
            Self::Unsigned(n) => write!(f, "{n}"),
            Self::OctetString(s) => write!(f, "{s:?}"),
            Self::ObjectIdentifier(oid) => write!(f, "{oid}"),
            Self::IpAddress([a, b, c, d]) => write!(f, "{a}.{b}.{c}.{d}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Null => f.write_str("null"),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Integer(n.into())
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Unsigned(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Self::Unsigned(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::OctetString(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::OctetString(s)
    }
}

impl From<Oid> for Value {
    fn from(oid: Oid) -> Self {
        Self::ObjectIdentifier(oid)
    }
}

impl From<[u8; 4]> for Value {
    fn from(octets: [u8; 4]) -> Self {
        Self::IpAddress(octets)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}
