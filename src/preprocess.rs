//! Source cleanup before classification.

/// WebFOCUS comment marker.
pub const COMMENT_MARKER: &str = "-*";

/// Drop comment lines (`-*`) and blank lines, keeping the rest in order.
///
/// Kept lines are returned unchanged, so running this twice gives the same
/// result as running it once.
pub fn strip_comments(source: &str) -> Vec<&str> {
    source
        .lines()
        .filter(|line| {
            let trimmed = line.trim_start();
            !trimmed.is_empty() && !trimmed.starts_with(COMMENT_MARKER)
        })
        .collect()
}

/// [`strip_comments`] joined back into text.
pub fn clean_source(source: &str) -> String {
    strip_comments(source).join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_comments_and_blanks() {
        let src = "-* report header\nTABLE FILE SALES\n\n   -* indented comment\nPRINT AMOUNT\n   \nEND";
        assert_eq!(
            strip_comments(src),
            vec!["TABLE FILE SALES", "PRINT AMOUNT", "END"]
        );
    }

    #[test]
    fn test_keeps_dialogue_manager_lines() {
        // -SET and -RUN are not comments
        let src = "-SET &X = 1;\n-RUN";
        assert_eq!(strip_comments(src), vec!["-SET &X = 1;", "-RUN"]);
    }

    #[test]
    fn test_preserves_line_content() {
        let src = "  WHERE A EQ 5  \n-*x";
        assert_eq!(strip_comments(src), vec!["  WHERE A EQ 5  "]);
    }

    #[test]
    fn test_idempotent() {
        let src = "-* c\n\nTABLE FILE A\n  -*\nPRINT X Y\n\t\nBY Z\nEND\n";
        let once = clean_source(src);
        let twice = clean_source(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_only_comments() {
        assert!(strip_comments("-* a\n-* b\n\n").is_empty());
    }
}
