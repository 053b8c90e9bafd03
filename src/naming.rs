//! WordPress-style filename slugs.
//!
//! Every output file is named after its source file, reduced to the same
//! shape WordPress gives attachment slugs: lowercase ASCII letters, digits
//! and single hyphens.
//!
//! ```text
//! Straße 123.tif        → strasse-123
//! Café_Photo.png        → cafe-photo
//! Mein Bild Ü.jpg       → mein-bild-ue
//! ---.png               → file
//! ```
//!
//! ## Transliteration Order
//!
//! German umlauts and `ß` are spelled out (`ü` → `ue`) *before* Unicode
//! decomposition. NFKD alone would turn `ü` into `u` and leave `ß` with no
//! ASCII form at all.
//!
//! ## Prefixes
//!
//! A run may carry a prefix (`ABC 123` → `abc123-`). [`apply_prefix`] adds it
//! at most once, so a second run over already-converted files does not yield
//! `abc123-abc123-…`.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Slug used when normalization leaves nothing behind.
pub const FALLBACK_SLUG: &str = "file";

/// Spelled-out forms of German special letters.
const TRANSLITERATIONS: &[(char, &str)] = &[
    ('ä', "ae"),
    ('ö', "oe"),
    ('ü', "ue"),
    ('Ä', "Ae"),
    ('Ö', "Oe"),
    ('Ü', "Ue"),
    ('ß', "ss"),
    ('ẞ', "SS"),
];

/// Split a file name into stem and extension.
///
/// A leading dot does not start an extension (`.hidden` has stem `.hidden`),
/// and neither does a trailing one.
pub fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(0) | None => (name, None),
        Some(pos) if pos + 1 == name.len() => (&name[..pos], None),
        Some(pos) => (&name[..pos], Some(&name[pos + 1..])),
    }
}

fn transliterate(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match TRANSLITERATIONS.iter().find(|(from, _)| *from == c) {
            Some((_, to)) => out.push_str(to),
            None => out.push(c),
        }
    }
    out
}

/// Lowercase `[a-z0-9]`, every other run collapsed into a single hyphen.
fn collapse_to_slug(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_hyphen = false;
    for c in input.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

/// Convert a source file name into a WordPress-compatible slug.
///
/// The extension is dropped; only the stem contributes. The result contains
/// only `[a-z0-9-]`, never starts or ends with a hyphen, never contains
/// `--`, and is never empty (see [`FALLBACK_SLUG`]).
pub fn slugify(raw_name: &str) -> String {
    let (stem, _) = split_extension(raw_name);
    let spelled = transliterate(stem);
    // Lowercasing can reintroduce combining marks (İ → i̇), so decompose twice.
    let folded: String = spelled
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect();
    let slug = collapse_to_slug(&folded);
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Normalize a user-supplied prefix.
///
/// Lowercases, keeps only ASCII letters and digits, and appends a single
/// hyphen. Returns an empty string (prefix disabled) when nothing usable
/// remains, so a prefix never consists of a bare hyphen.
pub fn normalize_prefix(raw: &str) -> String {
    let kept: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect();
    if kept.is_empty() {
        kept
    } else {
        format!("{kept}-")
    }
}

/// Prepend `prefix` to `slug` unless it is already there.
pub fn apply_prefix(slug: &str, prefix: &str) -> String {
    if prefix.is_empty() || slug.starts_with(prefix) {
        slug.to_string()
    } else {
        format!("{prefix}{slug}")
    }
}

/// Page segment appended to PDF page outputs: `-p001`, `-p012`, `-p1000`.
pub fn page_segment(page: u32) -> String {
    format!("-p{page:03}")
}

/// Final file name for a converted source (before collision handling).
///
/// `page` is `Some` for rendered PDF pages.
pub fn output_file_name(base_slug: &str, page: Option<u32>, extension: &str) -> String {
    match page {
        Some(n) => format!("{base_slug}{}.{extension}", page_segment(n)),
        None => format!("{base_slug}.{extension}"),
    }
}
