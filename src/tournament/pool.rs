//! Beatmap pool resolution (spec §4.10, GLOSSARY "Pool"): a tournament's
//! pool is grouped by mod combination (`NM`, `HD`, `HR`, `DT`, `FM`, ...);
//! ban/pick commands address a single entry as `<group><index>`, 1-based.

use std::collections::HashMap;

use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct PoolEntry {
    pub beatmap_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct Pool {
    groups: HashMap<String, Vec<PoolEntry>>,
}

fn code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^([A-Za-z]+)(\d+)$").expect("static pattern is valid"))
}

impl Pool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, group: impl Into<String>, entry: PoolEntry) {
        self.groups.entry(group.into().to_uppercase()).or_default().push(entry);
    }

    /// Resolves `code` (e.g. `"HD2"`) to a group and 1-based index, then to
    /// the `PoolEntry` at that position. `None` if the code doesn't parse
    /// or the group/index is out of range.
    pub fn resolve(&self, code: &str) -> Option<(&str, &PoolEntry)> {
        let caps = code_re().captures(code)?;
        let group = caps.get(1)?.as_str().to_uppercase();
        let index: usize = caps.get(2)?.as_str().parse().ok()?;
        if index == 0 {
            return None;
        }
        let entries = self.groups.get(&group)?;
        let entry = entries.get(index - 1)?;
        Some((self.groups.get_key_value(&group)?.0.as_str(), entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_pool() -> Pool {
        let mut pool = Pool::new();
        pool.insert("NM", PoolEntry { beatmap_id: 1, name: "no mod 1".into() });
        pool.insert("NM", PoolEntry { beatmap_id: 2, name: "no mod 2".into() });
        pool.insert("HD", PoolEntry { beatmap_id: 3, name: "hidden 1".into() });
        pool
    }

    #[test]
    fn resolves_case_insensitive_group_and_one_based_index() {
        let pool = sample_pool();
        let (group, entry) = pool.resolve("hd1").unwrap();
        assert_eq!(group, "HD");
        assert_eq!(entry.beatmap_id, 3);
    }

    #[test]
    fn second_entry_in_group_resolves() {
        let pool = sample_pool();
        let (_, entry) = pool.resolve("NM2").unwrap();
        assert_eq!(entry.beatmap_id, 2);
    }

    #[test]
    fn out_of_range_index_is_none() {
        let pool = sample_pool();
        assert!(pool.resolve("NM9").is_none());
    }

    #[test]
    fn unknown_group_is_none() {
        let pool = sample_pool();
        assert!(pool.resolve("DT1").is_none());
    }

    #[test]
    fn zero_index_is_none() {
        let pool = sample_pool();
        assert!(pool.resolve("NM0").is_none());
    }

    #[test]
    fn malformed_code_is_none() {
        let pool = sample_pool();
        assert!(pool.resolve("nomod").is_none());
        assert!(pool.resolve("1NM").is_none());
    }
}
