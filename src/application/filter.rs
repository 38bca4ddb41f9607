use crate::domain::entities::{Package, PackageKey};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Structural filter. At most one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageFilter {
    Installed,
    Outdated,
    /// Installed on request, not only as a dependency.
    Leaves,
    Casks,
}

impl PackageFilter {
    pub const ALL: [PackageFilter; 4] = [
        PackageFilter::Installed,
        PackageFilter::Outdated,
        PackageFilter::Leaves,
        PackageFilter::Casks,
    ];

    pub fn matches(self, package: &Package) -> bool {
        match self {
            PackageFilter::Installed => package.locally_installed,
            PackageFilter::Outdated => package.locally_installed && package.outdated,
            PackageFilter::Leaves => package.locally_installed && package.installed_on_request,
            PackageFilter::Casks => package.is_cask(),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PackageFilter::Installed => "Installed",
            PackageFilter::Outdated => "Outdated",
            PackageFilter::Leaves => "Leaves",
            PackageFilter::Casks => "Casks",
        }
    }
}

impl fmt::Display for PackageFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PackageFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PackageFilter::ALL
            .into_iter()
            .find(|filter| filter.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown filter '{}' (expected installed, outdated, leaves or casks)", s))
    }
}

pub struct FilterEngine;

impl FilterEngine {
    /// Applies `filter`, then the case-insensitive name/description `query`.
    ///
    /// Without a query the source order is kept. With one, matches are ordered by
    /// ascending popularity rank with unranked packages last; ties keep source order.
    pub fn search(source: &[Package], filter: Option<PackageFilter>, query: &str) -> Vec<Package> {
        let filtered = source
            .iter()
            .filter(|package| filter.is_none_or(|f| f.matches(package)));

        let query = query.to_lowercase();
        if query.is_empty() {
            return filtered.cloned().collect();
        }

        let mut seen: HashSet<PackageKey> = HashSet::new();
        let mut results: Vec<Package> = filtered
            .filter(|package| {
                package.name.to_lowercase().contains(&query)
                    || package.description.to_lowercase().contains(&query)
            })
            .filter(|package| seen.insert(package.key()))
            .cloned()
            .collect();

        results.sort_by_key(|package| rank_order(package.analytics_90d_rank));
        results
    }
}

fn rank_order(rank: i64) -> (bool, i64) {
    (rank <= 0, rank)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::PackageType;

    fn ranked(name: &str, rank: i64) -> Package {
        Package::new(name.to_string(), PackageType::Formula).with_rank(rank)
    }

    #[test]
    fn search_orders_by_rank_with_unranked_last() {
        let source = vec![ranked("pkg-a", 5), ranked("pkg-b", 0), ranked("pkg-c", 2)];
        let names: Vec<_> = FilterEngine::search(&source, None, "PKG")
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["pkg-c", "pkg-a", "pkg-b"]);
    }

    #[test]
    fn empty_query_keeps_source_order() {
        let source = vec![ranked("a", 9), ranked("b", 1)];
        let names: Vec<_> = FilterEngine::search(&source, None, "")
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn whitespace_in_query_is_matched_literally() {
        let source = vec![
            ranked("wget", 1).with_description("Internet file retriever".to_string()),
            ranked("git", 2),
        ];
        assert_eq!(FilterEngine::search(&source, None, " ").len(), 1);
        assert!(FilterEngine::search(&source, None, " wget").is_empty());
        assert_eq!(FilterEngine::search(&source, None, " file")[0].name, "wget");
    }

    #[test]
    fn query_matches_description() {
        let source = vec![
            ranked("wget", 1).with_description("Internet file retriever".to_string()),
            ranked("git", 2).with_description("Distributed revision control".to_string()),
        ];
        let results = FilterEngine::search(&source, None, "retriever");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "wget");
    }

    #[test]
    fn structural_filters_use_install_flags() {
        let leaf = ranked("leaf", 0).set_installed(true).set_installed_on_request(true);
        let dep = ranked("dep", 0).set_installed(true).set_outdated(true);
        let remote = ranked("remote", 0).set_outdated(true);
        let cask = Package::new("firefox".to_string(), PackageType::Cask);
        let source = vec![leaf, dep, remote, cask];

        let names = |filter| -> Vec<String> {
            FilterEngine::search(&source, Some(filter), "")
                .into_iter()
                .map(|p| p.name)
                .collect()
        };
        assert_eq!(names(PackageFilter::Installed), vec!["leaf", "dep"]);
        assert_eq!(names(PackageFilter::Outdated), vec!["dep"]);
        assert_eq!(names(PackageFilter::Leaves), vec!["leaf"]);
        assert_eq!(names(PackageFilter::Casks), vec!["firefox"]);
    }

    #[test]
    fn filter_names_parse_case_insensitively() {
        assert_eq!("Leaves".parse::<PackageFilter>().unwrap(), PackageFilter::Leaves);
        assert!("pinned".parse::<PackageFilter>().is_err());
    }
}
