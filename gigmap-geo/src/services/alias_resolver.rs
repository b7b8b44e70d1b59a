//! Alternate venue spellings → canonical venue name

use std::collections::BTreeMap;
use tracing::debug;

/// Maps registered aliases to their canonical venue name
///
/// Matching is exact. When an alias is registered under more than one
/// canonical name the alphabetically first canonical name wins.
#[derive(Debug, Clone, Default)]
pub struct AliasResolver {
    aliases: BTreeMap<String, Vec<String>>,
}

impl AliasResolver {
    pub fn new(aliases: BTreeMap<String, Vec<String>>) -> Self {
        Self { aliases }
    }

    /// Canonical name for `venue_name`, or the input unchanged
    pub fn normalize<'a>(&'a self, venue_name: &'a str) -> &'a str {
        for (canonical, alternates) in &self.aliases {
            if alternates.iter().any(|alias| alias == venue_name) {
                debug!(alias = %venue_name, canonical = %canonical, "Venue alias applied");
                return canonical;
            }
        }
        venue_name
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> AliasResolver {
        let mut aliases = BTreeMap::new();
        aliases.insert(
            "Bisboccia".to_string(),
            vec!["La Bisboccia".to_string(), "Bisboccia Pub".to_string()],
        );
        aliases.insert("Verde Mare Club".to_string(), vec!["Verdemare".to_string()]);
        AliasResolver::new(aliases)
    }

    #[test]
    fn test_alias_maps_to_canonical() {
        let resolver = resolver();
        assert_eq!(resolver.normalize("La Bisboccia"), "Bisboccia");
        assert_eq!(resolver.normalize("Verdemare"), "Verde Mare Club");
    }

    #[test]
    fn test_counts_canonical_names() {
        assert_eq!(resolver().len(), 2);
        assert!(AliasResolver::default().is_empty());
    }

    #[test]
    fn test_unknown_name_unchanged() {
        assert_eq!(resolver().normalize("Astro Club"), "Astro Club");
    }

    #[test]
    fn test_match_is_exact() {
        let resolver = resolver();
        assert_eq!(resolver.normalize("la bisboccia"), "la bisboccia");
        assert_eq!(resolver.normalize("La Bisboccia "), "La Bisboccia ");
    }

    #[test]
    fn test_canonical_name_maps_to_itself() {
        assert_eq!(resolver().normalize("Bisboccia"), "Bisboccia");
    }

    #[test]
    fn test_ambiguous_alias_prefers_first_canonical() {
        let mut aliases = BTreeMap::new();
        aliases.insert("Zeta".to_string(), vec!["Shared".to_string()]);
        aliases.insert("Alfa".to_string(), vec!["Shared".to_string()]);
        assert_eq!(AliasResolver::new(aliases).normalize("Shared"), "Alfa");
    }
}
