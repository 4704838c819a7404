//! Label-based lookup of products and associations, with a strictness policy
//!
//! Every lookup the assembler performs goes through one of two entry points:
//! [`Resolver::require`] for whole collections and [`Resolver::resolve`] for
//! association tables. Both implement the same policy. An empty label means
//! the product is intentionally absent and yields an empty result without
//! complaint. A non-empty label that fails to resolve is fatal in strict
//! mode and degrades to an empty result with a warning otherwise. Indexed
//! access into a resolved association is always guarded; structural
//! at-most-one expectations are checked fatally in both modes.

use crate::{
    error::{Error, Result},
    inputs::{AssociationEdge, AssociationTable},
};
use tracing::{error, warn};

/// A resolved association, ready for per-source lookup
///
/// Wraps a per-source list of edges into the target collection. The absent
/// state covers both an intentionally empty label and a lenient-mode lookup
/// failure; callers must check for it before indexing.
#[derive(Debug)]
pub enum Association<'tab, P = ()> {
    /// No table to look into; every lookup yields nothing
    Absent,

    /// Edge lists indexed by source-collection position
    Valid(Vec<Vec<&'tab AssociationEdge<P>>>),
}
//
impl<'tab, P> Association<'tab, P> {
    /// Whether lookups can return edges at all
    pub fn is_valid(&self) -> bool {
        matches!(self, Association::Valid(_))
    }

    /// Edges of one source element, `None` when the association is absent
    pub fn get(&self, source: usize) -> Option<&[&'tab AssociationEdge<P>]> {
        match self {
            Association::Absent => None,
            Association::Valid(edges) => Some(&edges[source]),
        }
    }

    /// First edge of one source element, if any
    pub fn first(&self, source: usize) -> Option<&'tab AssociationEdge<P>> {
        self.get(source).and_then(|edges| edges.first().copied())
    }

    /// The unique edge of one source element
    ///
    /// Some associations are structurally at-most-one (the track of a
    /// particle, the flash match of a hierarchy). Receiving several edges
    /// there means the upstream reconstruction broke its own contract, which
    /// is fatal regardless of the strictness mode.
    pub fn at_most_one(
        &self,
        source: usize,
        what: &'static str,
    ) -> Result<Option<&'tab AssociationEdge<P>>> {
        match self.get(source) {
            None => Ok(None),
            Some([]) => Ok(None),
            Some([edge]) => Ok(Some(*edge)),
            Some(edges) => Err(Error::integrity(format!(
                "{} edges of {} for source index {}, expected at most one",
                edges.len(),
                what,
                source
            ))),
        }
    }
}

/// Lookup policy shared by every association and product access
pub struct Resolver {
    /// Whether an unresolved non-empty label aborts the job
    strict: bool,
}
//
impl Resolver {
    /// Set up the lookup policy
    pub fn new(strict: bool) -> Self {
        Resolver { strict }
    }

    /// Resolve an association table by label
    ///
    /// `n_sources` is the size of the source collection; the result is
    /// indexable for exactly that range. `from` and `to` name the two
    /// collections for diagnostics.
    pub fn resolve<'tab, P>(
        &self,
        tables: &'tab [AssociationTable<P>],
        n_sources: usize,
        label: &str,
        from: &'static str,
        to: &'static str,
    ) -> Result<Association<'tab, P>> {
        if label.is_empty() {
            return Ok(Association::Absent);
        }

        let table = match tables.iter().find(|table| table.label == label) {
            Some(table) => table,
            None if self.strict => {
                error!(from, to, label, "no association found");
                return Err(Error::MissingAssociation {
                    from,
                    to,
                    label: label.to_owned(),
                });
            }
            None => {
                warn!(from, to, label, "no association found, continuing without it");
                return Ok(Association::Absent);
            }
        };

        let mut edges = Vec::new();
        edges.resize_with(n_sources, Vec::new);
        for edge in &table.edges {
            if edge.source >= n_sources {
                return Err(Error::integrity(format!(
                    "association '{}' points at {} source index {} beyond collection size {}",
                    label, from, edge.source, n_sources
                )));
            }
            edges[edge.source].push(edge);
        }
        Ok(Association::Valid(edges))
    }

    /// Read a whole collection by label
    ///
    /// The product is `None` when the producer did not run; whether that is
    /// tolerable follows the same policy as association resolution.
    pub fn require<'prod, T>(
        &self,
        product: Option<&'prod T>,
        label: &str,
        what: &'static str,
    ) -> Result<Option<&'prod T>> {
        if label.is_empty() {
            return Ok(None);
        }
        match product {
            Some(product) => Ok(Some(product)),
            None if self.strict => {
                error!(what, label, "no product found");
                Err(Error::MissingProduct {
                    what,
                    label: label.to_owned(),
                })
            }
            None => {
                warn!(what, label, "no product found, continuing without it");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::AssociationTable;

    fn tables() -> Vec<AssociationTable> {
        vec![AssociationTable::new(
            "pandora",
            [(0, 1), (0, 2), (2, 0)],
        )]
    }

    #[test]
    fn valid_lookup_groups_edges_by_source() {
        let tables = tables();
        let assoc = Resolver::new(true)
            .resolve(&tables, 3, "pandora", "slice", "particle")
            .unwrap();
        assert!(assoc.is_valid());
        let targets: Vec<usize> = assoc.get(0).unwrap().iter().map(|e| e.target).collect();
        assert_eq!(targets, vec![1, 2]);
        assert!(assoc.get(1).unwrap().is_empty());
        assert_eq!(assoc.first(2).unwrap().target, 0);
    }

    #[test]
    fn empty_label_is_absent_not_an_error() {
        let tables = tables();
        let assoc = Resolver::new(true)
            .resolve(&tables, 3, "", "slice", "particle")
            .unwrap();
        assert!(!assoc.is_valid());
        assert!(assoc.get(0).is_none());
    }

    #[test]
    fn unresolved_label_is_fatal_in_strict_mode() {
        let tables = tables();
        let err = Resolver::new(true)
            .resolve(&tables, 3, "nosuch", "slice", "particle")
            .unwrap_err();
        assert!(matches!(err, Error::MissingAssociation { .. }));
    }

    #[test]
    fn unresolved_label_degrades_in_lenient_mode() {
        let tables = tables();
        let assoc = Resolver::new(false)
            .resolve(&tables, 3, "nosuch", "slice", "particle")
            .unwrap();
        assert!(!assoc.is_valid());
    }

    #[test]
    fn at_most_one_rejects_double_edges() {
        let tables = tables();
        let assoc = Resolver::new(true)
            .resolve(&tables, 3, "pandora", "particle", "track")
            .unwrap();
        assert!(assoc.at_most_one(2, "track").unwrap().is_some());
        assert!(assoc.at_most_one(1, "track").unwrap().is_none());
        let err = assoc.at_most_one(0, "track").unwrap_err();
        assert!(matches!(err, Error::IntegrityViolation(_)));
    }

    #[test]
    fn out_of_range_source_is_an_integrity_error() {
        let tables = tables();
        let err = Resolver::new(true)
            .resolve(&tables, 2, "pandora", "slice", "particle")
            .unwrap_err();
        assert!(matches!(err, Error::IntegrityViolation(_)));
    }

    #[test]
    fn missing_product_follows_the_policy() {
        let strict = Resolver::new(true);
        let lenient = Resolver::new(false);
        let product: Option<Vec<u32>> = None;

        assert!(strict.require(product.as_ref(), "", "hits").unwrap().is_none());
        assert!(matches!(
            strict.require(product.as_ref(), "gaushit", "hits"),
            Err(Error::MissingProduct { .. })
        ));
        assert!(lenient
            .require(product.as_ref(), "gaushit", "hits")
            .unwrap()
            .is_none());

        let product = Some(vec![1u32, 2]);
        assert!(strict
            .require(product.as_ref(), "gaushit", "hits")
            .unwrap()
            .is_some());
    }
}
