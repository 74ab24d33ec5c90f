//! Value types and SYNTAX-name mapping.

use std::collections::BTreeMap;

use crate::definition::{FieldValue, ModuleSet};

/// Wire-level value type of a scalar, column or cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueType {
    Boolean,
    /// INTEGER, Integer32 and enumerations.
    Integer,
    /// OCTET STRING and string-like conventions.
    OctetString,
    Null,
    /// OBJECT IDENTIFIER.
    ObjectIdentifier,
    IpAddress,
    /// Counter32.
    Counter,
    /// Gauge32 and Unsigned32.
    Gauge,
    TimeTicks,
    Opaque,
    Counter64,
}

impl ValueType {
    /// Display name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Boolean => "Boolean",
            Self::Integer => "Integer",
            Self::OctetString => "OctetString",
            Self::Null => "Null",
            Self::ObjectIdentifier => "OID",
            Self::IpAddress => "IpAddress",
            Self::Counter => "Counter",
            Self::Gauge => "Gauge",
            Self::TimeTicks => "TimeTicks",
            Self::Opaque => "Opaque",
            Self::Counter64 => "Counter64",
        }
    }

    /// ASN.1 BER tag.
    #[must_use]
    pub const fn tag(&self) -> u8 {
        match self {
            Self::Boolean => 1,
            Self::Integer => 2,
            Self::OctetString => 4,
            Self::Null => 5,
            Self::ObjectIdentifier => 6,
            Self::IpAddress => 64,
            Self::Counter => 65,
            Self::Gauge => 66,
            Self::TimeTicks => 67,
            Self::Opaque => 68,
            Self::Counter64 => 70,
        }
    }

    /// Map a built-in SYNTAX name: ASN.1 types, SNMPv2-SMI application
    /// types and common SNMPv2-TC conventions.
    #[must_use]
    pub fn from_builtin(name: &str) -> Option<Self> {
        let ty = match name {
            "Boolean" => Self::Boolean,
            "Integer" | "INTEGER" | "Integer32" => Self::Integer,
            "OctetString" | "OCTET STRING" | "BITS" => Self::OctetString,
            "Null" | "NULL" => Self::Null,
            "OID" | "OBJECT IDENTIFIER" => Self::ObjectIdentifier,
            "IpAddress" | "NetworkAddress" => Self::IpAddress,
            "Counter" | "Counter32" => Self::Counter,
            "Gauge" | "Gauge32" | "Unsigned32" => Self::Gauge,
            "TimeTicks" | "TimeStamp" => Self::TimeTicks,
            "Opaque" => Self::Opaque,
            "Counter64" => Self::Counter64,
            "AutonomousType" | "InstancePointer" | "RowPointer" | "TDomain"
            | "VariablePointer" => Self::ObjectIdentifier,
            "DateAndTime" | "DisplayString" | "MacAddress" | "PhysAddress" | "TAddress" => {
                Self::OctetString
            }
            "RowStatus" | "StorageType" | "TestAndIncr" | "TruthValue" => Self::Integer,
            _ => return None,
        };
        Some(ty)
    }
}

/// SYNTAX name to [`ValueType`] for a set of compiled modules.
///
/// Starts from [`ValueType::from_builtin`] and adds every
/// TEXTUAL-CONVENTION in compile order. A convention whose SYNTAX is an
/// enumeration maps to `Integer`; otherwise it maps to whatever its SYNTAX
/// name maps to at that point. The first definition of a name wins.
#[derive(Clone, Debug, Default)]
pub struct SyntaxTypes {
    conventions: BTreeMap<String, ValueType>,
}

impl SyntaxTypes {
    /// Collect conventions from all modules.
    #[must_use]
    pub fn from_modules(modules: &ModuleSet) -> Self {
        let mut types = Self::default();
        for obj in modules.objects() {
            if obj.macro_name() != Some("TEXTUAL-CONVENTION") || types.get(obj.name()).is_some() {
                continue;
            }
            let mapped = match obj.syntax() {
                Some(FieldValue::Enumeration { .. }) => Some(ValueType::Integer),
                Some(FieldValue::Text(name)) => types.get(name),
                _ => None,
            };
            if let Some(ty) = mapped {
                types.conventions.insert(obj.name().to_owned(), ty);
            }
        }
        types
    }

    /// Map a SYNTAX name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<ValueType> {
        ValueType::from_builtin(name).or_else(|| self.conventions.get(name).copied())
    }

    /// Map a SYNTAX field value; enumerations count as `INTEGER`.
    #[must_use]
    pub fn of(&self, syntax: &FieldValue) -> Option<ValueType> {
        match syntax {
            FieldValue::Enumeration { .. } => Some(ValueType::Integer),
            FieldValue::Text(name) => self.get(name),
            FieldValue::List(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_aliases() {
        assert_eq!(ValueType::from_builtin("Unsigned32"), Some(ValueType::Gauge));
        assert_eq!(ValueType::from_builtin("DisplayString"), Some(ValueType::OctetString));
        assert_eq!(ValueType::from_builtin("RowPointer"), Some(ValueType::ObjectIdentifier));
        assert_eq!(ValueType::from_builtin("InterfaceIndex"), None);
        assert_eq!(ValueType::Counter64.tag(), 70);
        assert_eq!(ValueType::ObjectIdentifier.as_str(), "OID");
    }

    #[test]
    fn test_enumeration_is_integer() {
        let types = SyntaxTypes::default();
        let syntax = FieldValue::Enumeration {
            base: "INTEGER".into(),
            values: BTreeMap::new(),
        };
        assert_eq!(types.of(&syntax), Some(ValueType::Integer));
        assert_eq!(types.of(&FieldValue::List(vec![])), None);
    }
}
