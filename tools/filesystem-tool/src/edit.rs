//! Placeholder-based edit application for edit_file
//!
//! An edit is a sequence of code sections separated by `{{ ... }}`
//! placeholders standing for unchanged code. Without any placeholder the edit
//! replaces the whole file. Otherwise each non-blank section is searched for in
//! order, starting after the previous match; sections that are already present
//! are kept as-is and sections that cannot be found are appended.

use std::sync::LazyLock;

use regex::Regex;

static PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{ *\.\.\. *\}\}").expect("Invalid placeholder regex"));

/// Apply a placeholder edit to `original`, returning the new content
pub fn apply_edits(original: &str, code_edit: &str) -> String {
    let sections: Vec<&str> = PLACEHOLDER_REGEX.split(code_edit).collect();
    if sections.len() == 1 {
        return code_edit.to_string();
    }

    let mut result = original.to_string();
    let mut cursor = 0;

    for section in sections {
        if section.trim().is_empty() {
            continue;
        }
        match result[cursor..].find(section) {
            Some(offset) => cursor += offset + section.len(),
            None => {
                result.push('\n');
                result.push_str(section);
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_placeholder_replaces_everything() {
        assert_eq!(apply_edits("old\ncontent\n", "new content"), "new content");
    }

    #[test]
    fn test_present_sections_are_kept() {
        let original = "fn a() {}\nfn b() {}\n";
        let edit = "{{ ... }}\nfn b() {}\n{{ ... }}";
        assert_eq!(apply_edits(original, edit), original);
    }

    #[test]
    fn test_missing_sections_are_appended() {
        let original = "line one\n";
        let edit = "{{ ... }}\nline two\n{{ ... }}";
        assert_eq!(apply_edits(original, edit), "line one\n\n\nline two\n");
    }

    #[test]
    fn test_placeholder_spacing_is_flexible() {
        let original = "a\n";
        let edit = "{{...}}b{{   ...  }}";
        assert_eq!(apply_edits(original, edit), "a\n\nb");
    }

    #[test]
    fn test_sections_are_matched_in_order() {
        // "x" appears before the cursor only, so the second lookup appends
        let original = "x y";
        let edit = "y{{ ... }}x";
        assert_eq!(apply_edits(original, edit), "x y\nx");
    }
}
