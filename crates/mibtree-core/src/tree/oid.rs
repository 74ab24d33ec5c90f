//! Validated object identifiers.

use core::fmt::{self, Write};

use crate::error::{MibError, Result};

/// Largest permitted component value.
pub const MAX_COMPONENT: u32 = i32::MAX as u32;

/// A validated numeric OID.
///
/// Every `Oid` built through [`Oid::parse`] or [`Oid::from_components`]
/// satisfies the X.660 shape rules: the first component is 0, 1 or 2, the
/// second is at most 39, and no component exceeds 2^31-1. The empty OID
/// addresses the tree root.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Oid {
    arcs: Vec<u32>,
}

impl Oid {
    /// The empty (root) OID.
    #[must_use]
    pub const fn root() -> Self {
        Self { arcs: Vec::new() }
    }

    /// Parse dotted text such as `1.3.6.1.2.1`.
    ///
    /// Empty components are dropped, so `.1.3..6.` parses as `1.3.6`.
    ///
    /// # Errors
    ///
    /// A validation error when nothing remains, a component is not an
    /// integer, or a shape rule is broken.
    pub fn parse(text: &str) -> Result<Self> {
        let mut components = Vec::new();
        for part in text.split('.').map(str::trim).filter(|p| !p.is_empty()) {
            components.push(parse_component(part)?);
        }
        if components.is_empty() {
            return Err(MibError::EmptyOid);
        }
        Self::from_components(components)
    }

    /// Build from signed components, applying the shape rules.
    ///
    /// # Errors
    ///
    /// See [`Oid::parse`]. An empty list is the root and is accepted.
    pub fn from_components<I>(components: I) -> Result<Self>
    where
        I: IntoIterator<Item = i64>,
    {
        let arcs = components
            .into_iter()
            .enumerate()
            .map(|(position, value)| check_component(position, value))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { arcs })
    }

    /// Build from arcs already known to be valid, such as the address of an
    /// existing node extended by one arc.
    #[must_use]
    pub(crate) fn from_arcs(arcs: Vec<u32>) -> Self {
        Self { arcs }
    }

    /// Convert to dotted notation.
    #[must_use]
    pub fn to_dotted(&self) -> String {
        let mut result = String::with_capacity(self.arcs.len() * 4);
        let mut iter = self.arcs.iter();
        if let Some(first) = iter.next() {
            let _ = write!(result, "{first}");
            for arc in iter {
                let _ = write!(result, ".{arc}");
            }
        }
        result
    }

    /// All arcs except the last; `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let (_, init) = self.arcs.split_last()?;
        Some(Self::from_arcs(init.to_vec()))
    }

    #[must_use]
    pub fn last_arc(&self) -> Option<u32> {
        self.arcs.last().copied()
    }

    /// Check if this OID is a prefix of (or equal to) another.
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        other.arcs.starts_with(&self.arcs)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    #[must_use]
    pub fn arcs(&self) -> &[u32] {
        &self.arcs
    }

    /// Append an arc.
    ///
    /// # Errors
    ///
    /// A validation error if the result breaks a shape rule.
    pub fn child(&self, arc: u32) -> Result<Self> {
        self.extend(&[arc])
    }

    /// Append several arcs.
    ///
    /// # Errors
    ///
    /// A validation error if the result breaks a shape rule.
    pub fn extend(&self, arcs: &[u32]) -> Result<Self> {
        let offset = self.arcs.len();
        let mut out = Vec::with_capacity(offset + arcs.len());
        out.extend_from_slice(&self.arcs);
        for (i, &arc) in arcs.iter().enumerate() {
            out.push(check_component(offset + i, i64::from(arc))?);
        }
        Ok(Self::from_arcs(out))
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_dotted())
    }
}

impl core::str::FromStr for Oid {
    type Err = MibError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn parse_component(part: &str) -> Result<i64> {
    if let Ok(value) = part.parse::<i64>() {
        return Ok(value);
    }
    // Integers beyond i64 still classify by sign.
    if let Some(digits) = part.strip_prefix('-') {
        if is_digits(digits) {
            return Err(MibError::NegativeComponent(part.to_owned()));
        }
    } else if is_digits(part.strip_prefix('+').unwrap_or(part)) {
        return Err(MibError::ComponentTooLarge(part.to_owned()));
    }
    match part.parse::<f64>() {
        Ok(value) if value.is_finite() && value.fract() != 0.0 => {
            Err(MibError::NonIntegerComponent(part.to_owned()))
        }
        Ok(value) if value.is_finite() && value.abs() < 9.0e18 => {
            // Whole numbers written in float notation, e.g. `1e3`.
            Ok(value as i64)
        }
        _ => Err(MibError::MalformedComponent(part.to_owned())),
    }
}

fn is_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

fn check_component(position: usize, value: i64) -> Result<u32> {
    match position {
        0 if value > 2 => return Err(MibError::InvalidFirstComponent(value)),
        1 if value > 39 => return Err(MibError::InvalidSecondComponent(value)),
        _ => {}
    }
    if value < 0 {
        return Err(MibError::NegativeComponent(value.to_string()));
    }
    u32::try_from(value)
        .ok()
        .filter(|&v| v <= MAX_COMPONENT)
        .ok_or_else(|| MibError::ComponentTooLarge(value.to_string()))
}
