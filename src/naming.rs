//! Identifier derivation for content: slugs, heading anchors, table keys.
//!
//! Three different conventions live here because three different consumers
//! read them:
//!
//! - **Item slugs** come straight from the filename stem (`hello-world.mdx` →
//!   `hello-world`). They are never rewritten, so a file keeps its URL for as
//!   long as it keeps its name.
//! - **Anchors** are the URL fragments of headings. They are transliterated
//!   ASCII joined by `-`: `"Política & Sociedade"` → `"politica-and-sociedade"`.
//! - **Column keys** are record keys for adapted tables. They keep Unicode
//!   letters and join runs with `_`: `"Preço"` → `"preço"`.

use std::path::Path;

/// Slug of a content file: its stem, untouched.
pub fn item_slug(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_string_lossy();
    if stem.is_empty() {
        None
    } else {
        Some(stem.into_owned())
    }
}

/// Human title derived from a slug: dashes and underscores become spaces.
///
/// - `"who-am-i"` → `"who am i"`
/// - `"release_notes-2024"` → `"release notes 2024"`
pub fn display_title(slug: &str) -> String {
    slug.replace(['-', '_'], " ")
}

/// URL-safe anchor for a heading or a tag path segment.
///
/// `&` is spelled out as `and` before transliteration, every character is
/// transliterated to ASCII, lowercased, and each run of non-alphanumerics
/// collapses to a single `-`. Leading and trailing separators are dropped.
/// Identical input always yields identical output; duplicates are not
/// disambiguated.
pub fn anchor_slug(text: &str) -> String {
    let text = text.replace('&', " and ");
    let mut output = String::with_capacity(text.len());

    let mut need_dash = false;
    for ch in text.chars() {
        for b in deunicode::deunicode_char(ch).unwrap_or("-").bytes() {
            if b.is_ascii_alphanumeric() {
                if need_dash {
                    output.push('-');
                    need_dash = false;
                }
                output.push(b.to_ascii_lowercase() as char);
            } else {
                need_dash = !output.is_empty();
            }
        }
    }

    output
}

/// Record key for a table column.
///
/// Lowercases the header text and replaces each run of non-alphanumeric
/// characters with `_`. Letters outside ASCII are kept. An empty result falls
/// back to the positional key `col_{index}`.
pub fn column_key(header: &str, index: usize) -> String {
    let mut key = String::with_capacity(header.len());
    let mut need_sep = false;
    for ch in header.trim().chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            if need_sep {
                key.push('_');
                need_sep = false;
            }
            key.push(ch);
        } else {
            need_sep = !key.is_empty();
        }
    }

    if key.is_empty() {
        format!("col_{index}")
    } else {
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_is_file_stem() {
        assert_eq!(item_slug(Path::new("blog/hello-world.mdx")).as_deref(), Some("hello-world"));
        assert_eq!(item_slug(Path::new("Notes.md")).as_deref(), Some("Notes"));
    }

    #[test]
    fn display_title_replaces_separators() {
        assert_eq!(display_title("who-am-i"), "who am i");
        assert_eq!(display_title("release_notes-2024"), "release notes 2024");
    }

    #[test]
    fn anchor_spells_out_ampersand() {
        assert_eq!(anchor_slug("Política & Sociedade"), "politica-and-sociedade");
    }

    #[test]
    fn anchor_collapses_punctuation_runs() {
        assert_eq!(anchor_slug("  Hello,   World!!  "), "hello-world");
        assert_eq!(anchor_slug("snake_case words"), "snake-case-words");
        assert_eq!(anchor_slug("Æúű--cool?"), "aeuu-cool");
    }

    #[test]
    fn anchor_is_deterministic() {
        let text = "Design Systems: Tokens & Themes";
        assert_eq!(anchor_slug(text), anchor_slug(text));
        assert_eq!(anchor_slug(text), "design-systems-tokens-and-themes");
    }

    #[test]
    fn anchor_of_symbols_only_is_empty() {
        assert_eq!(anchor_slug("!!!"), "");
    }

    #[test]
    fn column_key_keeps_unicode_letters() {
        assert_eq!(column_key("Nome", 0), "nome");
        assert_eq!(column_key("Preço", 1), "preço");
    }

    #[test]
    fn column_key_joins_with_underscore() {
        assert_eq!(column_key("Unit Price (R$)", 2), "unit_price_r");
        assert_eq!(column_key("  Lead-time  ", 0), "lead_time");
    }

    #[test]
    fn column_key_falls_back_to_position() {
        assert_eq!(column_key("", 0), "col_0");
        assert_eq!(column_key("  --  ", 3), "col_3");
    }
}
