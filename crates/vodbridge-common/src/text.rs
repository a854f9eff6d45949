//! Plain-text sanitizing for strings supplied by the conversion service.

/// Reduce untrusted text to a single plain-text line.
///
/// Markup tags are stripped, control characters dropped, and runs of
/// whitespace (including line breaks and tabs) collapsed to one space.
pub fn sanitize_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    let mut pending_space = false;

    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if in_tag {
            if c == '>' {
                in_tag = false;
                pending_space = true;
            }
            continue;
        }

        // a lone '<' followed by a space or digit is text, not a tag
        if c == '<' && chars.peek().is_some_and(|n| n.is_alphabetic() || *n == '/' || *n == '!') {
            in_tag = true;
            continue;
        }

        if c.is_whitespace() {
            pending_space = true;
            continue;
        }

        if c.is_control() {
            continue;
        }

        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        out.push(c);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_unchanged() {
        assert_eq!(sanitize_text("ffmpeg exited with code 1"), "ffmpeg exited with code 1");
    }

    #[test]
    fn strips_tags() {
        assert_eq!(
            sanitize_text("<b>Download</b> failed: <script>x()</script>404"),
            "Download failed: x() 404"
        );
    }

    #[test]
    fn collapses_whitespace_and_controls() {
        assert_eq!(sanitize_text("  line one\n\n\tline\u{0007} two  "), "line one line two");
    }

    #[test]
    fn keeps_comparisons() {
        assert_eq!(sanitize_text("size < 10 MB"), "size < 10 MB");
    }

    #[test]
    fn empty_input() {
        assert_eq!(sanitize_text(""), "");
        assert_eq!(sanitize_text("<br/>"), "");
    }
}
