use serde::Serialize;
use std::collections::BTreeMap;

/// Hand-authored adjacency table: locality -> neighbors, in search order
const NEARBY: &[(&str, &[&str])] = &[
    ("Adoor", &["Pathanamthitta", "Konni"]),
    ("Pathanamthitta", &["Adoor", "Konni", "Ranni"]),
    ("Konni", &["Adoor", "Pathanamthitta", "Ranni"]),
    ("Ranni", &["Pathanamthitta", "Kozhencherry"]),
    ("Kozhencherry", &["Ranni", "Pathanamthitta"]),
    ("Elanthoor", &["Pandalam", "Adoor"]),
    ("Pandalam", &["Elanthoor", "Pathanamthitta"]),
    ("Chenneerkara", &["Pathanamthitta", "Konni"]),
    ("Vazhamuttom", &["Adoor", "Konni"]),
    ("SCS Layout", &["Pathanamthitta", "Adoor"]),
];

/// Immutable locality adjacency map, built once at startup
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct LocalityMap {
    nearby: BTreeMap<&'static str, &'static [&'static str]>,
}

impl LocalityMap {
    /// The built-in table
    pub fn builtin() -> Self {
        Self {
            nearby: NEARBY.iter().copied().collect(),
        }
    }

    /// Canonical spelling of a known locality, matched case-insensitively
    pub fn resolve(&self, locality: &str) -> Option<&'static str> {
        let locality = locality.trim();
        self.nearby
            .keys()
            .copied()
            .find(|key| key.eq_ignore_ascii_case(locality))
    }

    /// Neighbors of a locality, or `None` when it is not in the table
    pub fn neighbors(&self, locality: &str) -> Option<&'static [&'static str]> {
        let key = self.resolve(locality)?;
        self.nearby.get(key).copied()
    }
}

impl Default for LocalityMap {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table() {
        let map = LocalityMap::builtin();
        assert_eq!(map.nearby.len(), 10);
        assert_eq!(
            map.neighbors("Adoor"),
            Some(&["Pathanamthitta", "Konni"][..])
        );
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let map = LocalityMap::builtin();
        assert_eq!(map.resolve("  adoor "), Some("Adoor"));
        assert_eq!(map.resolve("scs layout"), Some("SCS Layout"));
        assert_eq!(map.resolve("Kochi"), None);
    }

    #[test]
    fn test_neighbors_keep_table_order() {
        let map = LocalityMap::builtin();
        assert_eq!(
            map.neighbors("konni"),
            Some(&["Adoor", "Pathanamthitta", "Ranni"][..])
        );
    }

    #[test]
    fn test_unknown_locality_has_no_neighbors() {
        assert!(LocalityMap::builtin().neighbors("Nowhere").is_none());
    }

    #[test]
    fn test_serializes_as_object() {
        let value = serde_json::to_value(LocalityMap::builtin()).unwrap();
        assert_eq!(value["Ranni"][1], "Kozhencherry");
    }
}
