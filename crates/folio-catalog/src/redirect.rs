use crate::error::{ConfigurationError, ResolveError};
use folio_core::{ContentId, ContentRecord};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

/// Outcome of resolving a requested identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub canonical: ContentId,
    /// `true` when the request used a retired alias and the caller should
    /// answer with a permanent redirect to `canonical`.
    pub redirect: bool,
}

/// Retired identifier to canonical identifier, plus the set of canonical ids.
///
/// Every alias points directly at a canonical id, so resolution is a single
/// lookup and never follows a chain.
#[derive(Debug, Clone, Default)]
pub struct RedirectMap {
    aliases: HashMap<ContentId, ContentId>,
    known: HashSet<ContentId>,
}

impl RedirectMap {
    /// Builds the map from the full record set.
    ///
    /// Rejects duplicate canonical ids, aliases that name a canonical id and
    /// aliases claimed by two records. Errors are reported for the first
    /// offending record in input order.
    pub fn build<'a>(
        records: impl IntoIterator<Item = &'a ContentRecord> + Clone,
    ) -> Result<Self, ConfigurationError> {
        let mut known = HashSet::new();
        for record in records.clone() {
            if !known.insert(record.id.clone()) {
                return Err(ConfigurationError::DuplicateId(record.id.clone()));
            }
        }

        let mut aliases: HashMap<ContentId, ContentId> = HashMap::new();
        for record in records {
            for alias in &record.aliases {
                if known.contains(alias) {
                    return Err(ConfigurationError::AliasIsCanonical {
                        alias: alias.clone(),
                        owner: record.id.clone(),
                    });
                }

                match aliases.entry(alias.clone()) {
                    Entry::Occupied(existing) => {
                        return Err(ConfigurationError::DuplicateAlias {
                            alias: alias.clone(),
                            first: existing.get().clone(),
                            second: record.id.clone(),
                        });
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(record.id.clone());
                    }
                }
            }
        }

        debug!(
            canonical = known.len(),
            aliases = aliases.len(),
            "built redirect map"
        );
        Ok(Self { aliases, known })
    }

    /// Resolves `requested` to its canonical id.
    pub fn resolve(&self, requested: &str) -> Result<Resolution, ResolveError> {
        if let Some(canonical) = self.known.get(requested) {
            trace!(requested, "resolved canonical id");
            return Ok(Resolution {
                canonical: canonical.clone(),
                redirect: false,
            });
        }

        if let Some(canonical) = self.aliases.get(requested) {
            debug!(requested, canonical = %canonical, "resolved retired alias");
            return Ok(Resolution {
                canonical: canonical.clone(),
                redirect: true,
            });
        }

        trace!(requested, "identifier not found");
        Err(ResolveError::NotFound(requested.to_string()))
    }

    /// O(1) check that `id` is a current canonical id.
    pub fn is_canonical(&self, id: &str) -> bool {
        self.known.contains(id)
    }

    pub fn alias_count(&self) -> usize {
        self.aliases.len()
    }

    pub fn canonical_count(&self) -> usize {
        self.known.len()
    }
}
