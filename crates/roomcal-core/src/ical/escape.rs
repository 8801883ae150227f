//! iCalendar TEXT value escaping (RFC 5545 §3.3.11).

/// Escapes a TEXT value.
///
/// Substitutes backslash, newline, semicolon and comma, in that order.
/// Backslashes go first so the ones inserted by later substitutions are not
/// escaped again.
pub fn escape_text(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace(';', "\\;")
        .replace(',', "\\,")
}

/// Reverses [`escape_text`].
///
/// Unknown escape sequences keep their character and drop the backslash; a
/// trailing lone backslash is kept as-is. `\N` is accepted as a newline.
pub fn unescape_text(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n' | 'N') => result.push('\n'),
            Some(other) => result.push(other),
            None => result.push('\\'),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_special_characters() {
        assert_eq!(escape_text("hello, world"), "hello\\, world");
        assert_eq!(escape_text("line1\nline2"), "line1\\nline2");
        assert_eq!(escape_text("back\\slash"), "back\\\\slash");
        assert_eq!(escape_text("semi;colon"), "semi\\;colon");
    }

    #[test]
    fn backslash_is_escaped_before_the_rest() {
        // A literal backslash-n must not turn into an escaped newline.
        assert_eq!(escape_text("\\n"), "\\\\n");
        assert_eq!(escape_text("\\,\n"), "\\\\\\,\\n");
    }

    #[test]
    fn plain_text_is_untouched() {
        assert_eq!(escape_text(""), "");
        assert_eq!(escape_text("Saal 1 – Grüße"), "Saal 1 – Grüße");
    }

    #[test]
    fn unescape_inverts_escape() {
        let samples = [
            "",
            "plain",
            "a,b;c\\d\ne",
            "\\n is not a newline",
            "trailing backslash\\",
            ";;,,\\\\\n\n",
            "unicode: 日本語, Ärger; ok",
            "\n\nhttp://example.org/?a=1,2;3",
        ];
        for sample in samples {
            assert_eq!(unescape_text(&escape_text(sample)), sample, "{sample:?}");
        }
    }

    #[test]
    fn unescape_tolerates_foreign_sequences() {
        assert_eq!(unescape_text("a\\Nb"), "a\nb");
        assert_eq!(unescape_text("a\\:b"), "a:b");
        assert_eq!(unescape_text("end\\"), "end\\");
    }
}
