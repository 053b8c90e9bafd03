//! Unique output names within a run.
//!
//! The output directory is flat, so two sources with the same slug (for
//! example `Photo.jpg` and `Photo.png`, both converted to WebP) would land on
//! the same file. [`NameRegistry`] hands out each name once:
//!
//! ```text
//! photo.webp → photo.webp
//! photo.webp → photo-001.webp
//! photo.webp → photo-002.webp
//! ```
//!
//! Suffixes are zero-padded to three digits and simply grow past `-999`
//! (`-1000`), so they never alias a shorter suffix.
//!
//! Names are compared case-insensitively, matching the filesystems most
//! uploads end up on. Names that exist on disk from an earlier run can be
//! fed in through [`NameRegistry::resolve_with`].

use crate::naming::split_extension;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
pub struct NameRegistry {
    /// Lowercased names handed out so far.
    used: HashSet<String>,
    /// Next suffix to try per lowercased candidate.
    next_suffix: HashMap<String, u32>,
}

fn with_suffix(stem: &str, n: u32, extension: Option<&str>) -> String {
    match extension {
        Some(ext) => format!("{stem}-{n:03}.{ext}"),
        None => format!("{stem}-{n:03}"),
    }
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `candidate`, or the first free suffixed variant of it.
    pub fn resolve(&mut self, candidate: &str) -> String {
        self.resolve_with(candidate, |_| false)
    }

    /// Like [`resolve`](Self::resolve), but names for which `is_taken`
    /// returns true are skipped as well.
    pub fn resolve_with(&mut self, candidate: &str, is_taken: impl Fn(&str) -> bool) -> String {
        let key = candidate.to_lowercase();
        if !self.used.contains(&key) && !is_taken(candidate) {
            self.used.insert(key);
            return candidate.to_string();
        }

        let (stem, extension) = split_extension(candidate);
        let mut n = self.next_suffix.get(&key).copied().unwrap_or(1);
        loop {
            let name = with_suffix(stem, n, extension);
            let name_key = name.to_lowercase();
            if !self.used.contains(&name_key) && !is_taken(&name) {
                self.used.insert(name_key);
                self.next_suffix.insert(key, n + 1);
                return name;
            }
            n += 1;
        }
    }

    /// Whether `name` was already handed out (case-insensitive).
    pub fn contains(&self, name: &str) -> bool {
        self.used.contains(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_claim_is_unchanged() {
        let mut names = NameRegistry::new();
        assert_eq!(names.resolve("photo.webp"), "photo.webp");
        assert!(names.contains("photo.webp"));
    }

    #[test]
    fn repeated_candidates_get_sequential_suffixes() {
        let mut names = NameRegistry::new();
        let issued: Vec<String> = (0..12).map(|_| names.resolve("base.jpg")).collect();

        assert_eq!(issued[0], "base.jpg");
        for (i, name) in issued.iter().enumerate().skip(1) {
            assert_eq!(name, &format!("base-{i:03}.jpg"));
        }
        let distinct: HashSet<&String> = issued.iter().collect();
        assert_eq!(distinct.len(), issued.len());
    }

    #[test]
    fn suffix_widens_past_999() {
        let mut names = NameRegistry::new();
        let mut last = String::new();
        for _ in 0..=1000 {
            last = names.resolve("scan.png");
        }
        assert_eq!(last, "scan-1000.png");
        assert!(names.contains("scan-100.png"));
        assert_eq!(names.len(), 1001);
    }

    #[test]
    fn comparison_ignores_case() {
        let mut names = NameRegistry::new();
        names.resolve("photo.webp");
        assert_eq!(names.resolve("PHOTO.webp"), "PHOTO-001.webp");
    }

    #[test]
    fn distinct_extensions_do_not_collide() {
        let mut names = NameRegistry::new();
        assert_eq!(names.resolve("photo.webp"), "photo.webp");
        assert_eq!(names.resolve("photo.jpg"), "photo.jpg");
    }

    #[test]
    fn suffix_skips_names_claimed_directly() {
        let mut names = NameRegistry::new();
        names.resolve("photo-001.webp");
        names.resolve("photo.webp");
        assert_eq!(names.resolve("photo.webp"), "photo-002.webp");
    }

    #[test]
    fn externally_taken_names_are_skipped() {
        let on_disk = ["report.jpg", "report-001.jpg"];
        let mut names = NameRegistry::new();
        let name = names.resolve_with("report.jpg", |n| on_disk.contains(&n));
        assert_eq!(name, "report-002.jpg");
    }

    #[test]
    fn candidate_without_extension() {
        let mut names = NameRegistry::new();
        names.resolve("readme");
        assert_eq!(names.resolve("readme"), "readme-001");
    }

    #[test]
    fn new_registry_is_empty() {
        assert!(NameRegistry::new().is_empty());
    }
}
