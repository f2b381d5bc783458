//! Filename and extension sanitizer.
//!
//! Anything outside `A-Z a-z 0-9 _ @ . ( ) + -` is replaced with `-`, one
//! placeholder per character. The output can never contain a path separator,
//! a quote or a line break, so it is safe to use as a path component and
//! inside a quoted header value.

/// Placeholder substituted for every rejected character.
pub const PLACEHOLDER: char = '-';

/// Whether `c` belongs to the allow-set.
pub fn is_safe_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '@' | '.' | '(' | ')' | '+' | '-')
}

/// Replace every character outside the allow-set with [`PLACEHOLDER`].
pub fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| if is_safe_char(c) { c } else { PLACEHOLDER })
        .collect()
}

/// True when `s` is already a fixed point of [`sanitize`].
pub fn is_sanitized(s: &str) -> bool {
    s.chars().all(is_safe_char)
}

/// Final `.suffix` of a filename (including the dot), or `""` if none.
pub fn extension(filename: &str) -> &str {
    filename.rfind('.').map_or("", |pos| &filename[pos..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_allowed_characters() {
        let s = "Photo_2024@home.(1)+final-v2.jpg";
        assert_eq!(sanitize(s), s);
    }

    #[test]
    fn replaces_path_separators_and_quotes() {
        let out = sanitize("../../etc/passwd");
        assert_eq!(out, "..-..-etc-passwd");
        assert!(!out.contains('/'));

        let out = sanitize("a\"b\r\nc\\d");
        assert_eq!(out, "a-b--c-d");
    }

    #[test]
    fn one_placeholder_per_character() {
        assert_eq!(sanitize("héllo wörld"), "h-llo-w-rld");
        assert_eq!(sanitize("日本"), "--");
    }

    #[test]
    fn empty_and_control_input() {
        assert_eq!(sanitize(""), "");
        assert_eq!(sanitize("\0\t\u{7f}"), "---");
    }

    #[test]
    fn idempotent_and_within_allow_set() {
        let inputs = [
            "",
            "plain.txt",
            "../../etc/passwd",
            "quote\"d",
            "new\nline",
            "tab\there",
            "emoji 🎉.png",
            "semi;colon=equals",
        ];
        for input in inputs {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "not idempotent for {input:?}");
            assert!(is_sanitized(&once), "unsafe output for {input:?}");
        }
    }

    #[test]
    fn extension_is_last_suffix() {
        assert_eq!(extension("photo.jpg"), ".jpg");
        assert_eq!(extension("archive.tar.gz"), ".gz");
        assert_eq!(extension("README"), "");
        assert_eq!(extension(".hidden"), ".hidden");
    }
}
