//! Object lookup by OID, name space or bare name.

use crate::definition::{ModuleSet, ObjectDefinition};

/// Which identifier a prefix match was made against.
#[derive(Clone, Copy, PartialEq, Eq)]
enum PrefixKind {
    Oid,
    NameSpace,
}

impl ModuleSet {
    /// Find an object by identifier.
    ///
    /// Tried in order:
    ///
    /// 1. an exact dotted OID (`1.3.6.1.2.1.1.1`)
    /// 2. an exact name space (`iso.org.dod.internet`)
    /// 3. the object whose OID (for all-numeric identifiers) or name space
    ///    is the longest dotted prefix of the identifier, e.g. an instance
    ///    OID `1.3.6.1.2.1.1.1.0` finds `sysDescr`
    /// 4. a bare object name such as `ifIndex`
    ///
    /// Where several modules match, the most recently compiled one wins.
    #[must_use]
    pub fn lookup_object(&self, identifier: &str) -> Option<&ObjectDefinition> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return None;
        }
        self.newest_first(|obj| obj.oid() == Some(identifier))
            .or_else(|| self.newest_first(|obj| obj.name_space() == Some(identifier)))
            .or_else(|| self.longest_prefix(identifier))
            .or_else(|| self.newest_first(|obj| obj.name() == identifier))
    }

    fn newest_first(&self, pred: impl Fn(&ObjectDefinition) -> bool) -> Option<&ObjectDefinition> {
        self.modules()
            .iter()
            .rev()
            .find_map(|module| module.objects().iter().find(|obj| pred(obj)))
    }

    fn longest_prefix(&self, identifier: &str) -> Option<&ObjectDefinition> {
        let kind = if identifier
            .split('.')
            .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()))
        {
            PrefixKind::Oid
        } else {
            PrefixKind::NameSpace
        };

        let mut best: Option<(&ObjectDefinition, usize)> = None;
        for module in self.modules().iter().rev() {
            for obj in module.objects() {
                let candidate = match kind {
                    PrefixKind::Oid => obj.oid(),
                    PrefixKind::NameSpace => obj.name_space(),
                };
                let Some(candidate) = candidate.filter(|c| is_dotted_prefix(c, identifier)) else {
                    continue;
                };
                if best.map_or(true, |(_, len)| candidate.len() > len) {
                    best = Some((obj, candidate.len()));
                }
            }
        }
        best.map(|(obj, _)| obj)
    }
}

/// `prefix` equals `identifier` or is followed in it by a `.`.
fn is_dotted_prefix(prefix: &str, identifier: &str) -> bool {
    identifier
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
}
