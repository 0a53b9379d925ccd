//! Relaxed canonicalization per RFC 6376 §3.4
//!
//! Cosmetic differences (line endings, trailing whitespace, folded headers)
//! must not change the signed bytes, so both body and headers are reduced to
//! a canonical form before hashing.

/// Collapse runs of whitespace to a single space and trim both ends.
fn collapse_whitespace(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut last_was_space = false;
    for c in s.chars() {
        if matches!(c, ' ' | '\t' | '\r' | '\n') {
            if !last_was_space {
                result.push(' ');
                last_was_space = true;
            }
        } else {
            result.push(c);
            last_was_space = false;
        }
    }
    result.trim().to_string()
}

/// Canonicalize a message body with the relaxed algorithm.
///
/// Line endings (CR, LF or CRLF) are normalized, whitespace runs within a
/// line become a single space, trailing whitespace is dropped, and any run
/// of trailing empty lines collapses to one terminating CRLF. An empty or
/// whitespace-only body canonicalizes to a single CRLF.
pub fn relaxed_body(body: &str) -> String {
    let normalized = body.replace("\r\n", "\n").replace('\r', "\n");

    let mut lines: Vec<String> = normalized
        .split('\n')
        .map(|line| {
            let mut out = String::with_capacity(line.len());
            let mut last_was_space = false;
            for c in line.chars() {
                if matches!(c, ' ' | '\t') {
                    if !last_was_space {
                        out.push(' ');
                        last_was_space = true;
                    }
                } else {
                    out.push(c);
                    last_was_space = false;
                }
            }
            out.trim_end().to_string()
        })
        .collect();

    while lines.last().map_or(false, |l| l.is_empty()) {
        lines.pop();
    }

    if lines.is_empty() {
        return "\r\n".to_string();
    }

    let mut result = lines.join("\r\n");
    result.push_str("\r\n");
    result
}

/// Canonicalize one header line (possibly folded) with the relaxed algorithm.
///
/// Returns the lowercased, trimmed field name and the whitespace-collapsed,
/// trimmed value.
pub fn relaxed_header_line(line: &str) -> (String, String) {
    match line.split_once(':') {
        Some((name, value)) => (
            name.trim().to_ascii_lowercase(),
            collapse_whitespace(value),
        ),
        None => (line.trim().to_ascii_lowercase(), String::new()),
    }
}

/// Select and canonicalize the headers named in `requested`.
///
/// `requested` is a colon-separated, case-insensitive field-name list. For
/// each name the FIRST occurrence from the top of the block is used; names
/// with no matching header are dropped. Returns the canonical header block
/// (one `name:value` CRLF-terminated line per kept header, in requested
/// order) and the colon-joined list of kept names for the `h=` tag.
pub fn relaxed_headers(raw_headers: &str, requested: &str) -> (String, String) {
    let logical = unfold(raw_headers);

    // First occurrence from the top wins; later duplicates are ignored.
    let mut first_seen: Vec<(String, String)> = Vec::new();
    for line in &logical {
        let (name, value) = relaxed_header_line(line);
        if name.is_empty() {
            continue;
        }
        if !first_seen.iter().any(|(n, _)| *n == name) {
            first_seen.push((name, value));
        }
    }

    let mut block = String::new();
    let mut kept = Vec::new();
    for requested_name in requested.split(':') {
        let name = requested_name.trim().to_ascii_lowercase();
        if name.is_empty() {
            continue;
        }
        if let Some((_, value)) = first_seen.iter().find(|(n, _)| *n == name) {
            block.push_str(&name);
            block.push(':');
            block.push_str(value);
            block.push_str("\r\n");
            kept.push(name);
        }
    }

    (block, kept.join(":"))
}

/// Split a raw header block into logical lines, joining folded continuations
/// back onto the line they extend.
fn unfold(raw_headers: &str) -> Vec<String> {
    let mut logical: Vec<String> = Vec::new();
    for line in raw_headers.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() {
            continue;
        }
        if line.starts_with(' ') || line.starts_with('\t') {
            if let Some(prev) = logical.last_mut() {
                prev.push_str(line);
                continue;
            }
        }
        logical.push(line.to_string());
    }
    logical
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relaxed_body_collapses_whitespace_and_trailing_lines() {
        assert_eq!(relaxed_body("Hello  world  \r\n\r\n\r\n"), "Hello world\r\n");
    }

    #[test]
    fn test_relaxed_body_idempotent() {
        for input in [
            "Hello  world  \r\n\r\n\r\n",
            "a\r\nb\r\n",
            "",
            "line with\ttabs\t\r\n",
            "no trailing newline",
        ] {
            let once = relaxed_body(input);
            assert_eq!(relaxed_body(&once), once, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_relaxed_body_line_ending_equivalence() {
        let crlf = relaxed_body("a\r\nb\r\n");
        assert_eq!(relaxed_body("a\nb\n"), crlf);
        assert_eq!(relaxed_body("a\rb\r"), crlf);
        assert_eq!(relaxed_body("a\nb"), crlf);
    }

    #[test]
    fn test_relaxed_body_trailing_whitespace_equivalence() {
        assert_eq!(relaxed_body("a  \r\nb\t\r\n"), relaxed_body("a\r\nb\r\n"));
        assert_eq!(relaxed_body("a \t b\r\n"), "a b\r\n");
    }

    #[test]
    fn test_relaxed_body_empty_and_whitespace_only() {
        assert_eq!(relaxed_body(""), "\r\n");
        assert_eq!(relaxed_body("   \r\n \t \r\n"), "\r\n");
        assert_eq!(relaxed_body("\r\n\r\n\r\n"), "\r\n");
    }

    #[test]
    fn test_relaxed_header_line() {
        let (name, value) = relaxed_header_line("Subject:  Hi   there ");
        assert_eq!(name, "subject");
        assert_eq!(value, "Hi there");
    }

    #[test]
    fn test_relaxed_header_line_unfolds() {
        let (name, value) = relaxed_header_line("X-Long: first\r\n  second");
        assert_eq!(name, "x-long");
        assert_eq!(value, "first second");
    }

    #[test]
    fn test_relaxed_headers_selection_and_folding() {
        let raw = "From: a@x\r\nSubject: Hi\r\n there\r\n";
        let (block, kept) = relaxed_headers(raw, "from:subject");
        assert_eq!(block, "from:a@x\r\nsubject:Hi there\r\n");
        assert_eq!(kept, "from:subject");
    }

    #[test]
    fn test_relaxed_headers_requested_order() {
        let raw = "From: a@x\r\nTo: b@y\r\nSubject: Hi\r\n";
        let (block, kept) = relaxed_headers(raw, "subject:from");
        assert_eq!(block, "subject:Hi\r\nfrom:a@x\r\n");
        assert_eq!(kept, "subject:from");
    }

    #[test]
    fn test_relaxed_headers_first_occurrence_wins() {
        let raw = "Received: first\r\nReceived: second\r\nFrom: a@x\r\n";
        let (block, kept) = relaxed_headers(raw, "received:from");
        assert_eq!(block, "received:first\r\nfrom:a@x\r\n");
        assert_eq!(kept, "received:from");
    }

    #[test]
    fn test_relaxed_headers_missing_names_dropped() {
        let raw = "From: a@x\r\n";
        let (block, kept) = relaxed_headers(raw, "from:reply-to:cc");
        assert_eq!(block, "from:a@x\r\n");
        assert_eq!(kept, "from");
    }

    #[test]
    fn test_relaxed_headers_empty_value_kept() {
        let raw = "X-Empty:\r\nFrom: a@x\r\n";
        let (block, kept) = relaxed_headers(raw, "x-empty:from");
        assert_eq!(block, "x-empty:\r\nfrom:a@x\r\n");
        assert_eq!(kept, "x-empty:from");
    }

    #[test]
    fn test_relaxed_headers_case_insensitive_request() {
        let raw = "FROM: a@x\r\nSubject: Hi\r\n";
        let (block, kept) = relaxed_headers(raw, "From:SUBJECT");
        assert_eq!(block, "from:a@x\r\nsubject:Hi\r\n");
        assert_eq!(kept, "from:subject");
    }
}
