//! Query pipeline: filter, search, rank, sort
//!
//! A pure function of (source list, filter, search text, sort mode); no
//! hidden state, so the same inputs always render the same list.

use crate::package::{Package, PackageKind};
use serde::{Deserialize, Serialize};

/// The active package filter. At most one filter is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Filter {
    #[default]
    None,
    /// Installed packages only.
    Installed,
    /// Installed and flagged outdated.
    Outdated,
    /// Installed on explicit user request.
    Leaves,
    /// Casks only.
    Casks,
}

impl Filter {
    /// Toggle semantics: re-applying the active filter clears it,
    /// applying a different one replaces it.
    pub fn toggle(self, requested: Filter) -> Filter {
        if self == requested {
            Filter::None
        } else {
            requested
        }
    }

    fn accepts(&self, pkg: &Package) -> bool {
        match self {
            Filter::None => true,
            Filter::Installed => pkg.installed,
            Filter::Outdated => pkg.installed && pkg.outdated,
            Filter::Leaves => pkg.installed && pkg.installed_on_request,
            Filter::Casks => pkg.kind == PackageKind::Cask,
        }
    }
}

/// Produce the list to render.
///
/// Steps, in order: apply the filter; on non-empty search text, match the
/// lowercased term against name or description, de-duplicate by name, and
/// sort by popularity rank ascending with unranked (rank 0) entries after
/// all ranked ones; if `sort_by_kind` is set, a (kind, lowercased name)
/// sort replaces the rank order entirely.
pub fn query(
    source: &[Package],
    filter: Filter,
    search_text: &str,
    sort_by_kind: bool,
) -> Vec<Package> {
    let filtered = source.iter().filter(|pkg| filter.accepts(pkg));

    let mut result: Vec<Package> = if search_text.is_empty() {
        filtered.cloned().collect()
    } else {
        let term = search_text.to_lowercase();
        let mut seen = std::collections::HashSet::new();
        let mut matched: Vec<Package> = filtered
            .filter(|pkg| {
                pkg.name.to_lowercase().contains(&term)
                    || pkg.description.to_lowercase().contains(&term)
            })
            .filter(|pkg| seen.insert(pkg.name.clone()))
            .cloned()
            .collect();
        sort_by_rank(&mut matched);
        matched
    };

    if sort_by_kind {
        result.sort_by(|a, b| {
            a.kind
                .cmp(&b.kind)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });
    }

    result
}

/// Rank ascending; rank 0 means unranked and sorts after any ranked entry.
fn sort_by_rank(packages: &mut [Package]) {
    packages.sort_by(|a, b| match (a.rank, b.rank) {
        (0, 0) => std::cmp::Ordering::Equal,
        (0, _) => std::cmp::Ordering::Greater,
        (_, 0) => std::cmp::Ordering::Less,
        (x, y) => x.cmp(&y),
    });
}
