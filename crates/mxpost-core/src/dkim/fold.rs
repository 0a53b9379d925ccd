//! RFC 5322 §2.2.3 header folding

/// Default fold column for emitted headers
pub const DEFAULT_WIDTH: usize = 76;

/// Fold a header string so no line carries more than `width` visible octets.
///
/// Folds are `CRLF SPACE`, placed at a whitespace boundary when one exists
/// within the window and at the column limit otherwise. Existing CRLF in the
/// input are preserved and reset the column count.
pub fn fold(input: &str, width: usize) -> String {
    input
        .split("\r\n")
        .map(|line| fold_line(line, width))
        .collect::<Vec<_>>()
        .join("\r\n")
}

fn fold_line(line: &str, width: usize) -> String {
    if line.len() <= width {
        return line.to_string();
    }

    let mut out = String::with_capacity(line.len() + line.len() / width * 3);
    let mut rest = line;
    // Set after a mid-word break, where the continuation space is inserted
    // rather than taken from the input and eats one octet of the fold limit.
    let mut inserted_space = false;

    loop {
        let limit = if inserted_space { width - 1 } else { width };
        if rest.len() <= limit {
            if inserted_space {
                out.push(' ');
            }
            out.push_str(rest);
            return out;
        }

        let window = &rest.as_bytes()[..limit];
        match window.iter().rposition(|&b| b == b' ') {
            Some(pos) if pos > 0 => {
                if inserted_space {
                    out.push(' ');
                }
                out.push_str(&rest[..pos]);
                out.push_str("\r\n");
                rest = &rest[pos..];
                inserted_space = false;
            }
            _ => {
                let mut cut = limit;
                while !rest.is_char_boundary(cut) {
                    cut -= 1;
                }
                if inserted_space {
                    out.push(' ');
                }
                out.push_str(&rest[..cut]);
                out.push_str("\r\n");
                rest = &rest[cut..];
                inserted_space = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn max_visible_line(s: &str) -> usize {
        s.split("\r\n").map(str::len).max().unwrap_or(0)
    }

    #[test]
    fn test_short_line_unchanged() {
        assert_eq!(fold("Subject: hello", 76), "Subject: hello");
    }

    #[test]
    fn test_folds_at_whitespace() {
        let input = "k=aaaa; b=bbbb; c=cccc; d=dddd";
        let folded = fold(input, 12);
        assert!(max_visible_line(&folded) <= 12);
        for continuation in folded.split("\r\n").skip(1) {
            assert!(continuation.starts_with(' '));
        }
        // Unfolding restores the original text.
        assert_eq!(folded.replace("\r\n", ""), input);
    }

    #[test]
    fn test_hard_break_without_whitespace() {
        let input = "a".repeat(30);
        let folded = fold(&input, 10);
        assert!(max_visible_line(&folded) <= 10);
        assert_eq!(folded.replace("\r\n ", ""), input);
    }

    #[test]
    fn test_existing_crlf_preserved() {
        let input = "first line\r\nsecond line";
        assert_eq!(fold(input, 76), input);
    }

    #[test]
    fn test_tag_list_width() {
        let tags = format!(
            "DKIM-Signature: v=1; a=rsa-sha256; c=relaxed/relaxed; d=example.com; \
             q=dns/txt; s=mail; bh={}; h=from:subject:to",
            "B".repeat(44)
        );
        let folded = fold(&tags, 76);
        assert!(max_visible_line(&folded) <= 76);
        assert_eq!(
            folded.replace("\r\n", "").split_whitespace().count(),
            tags.split_whitespace().count()
        );
    }
}
