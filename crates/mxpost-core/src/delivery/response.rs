//! SMTP reply parsing and buffering
//!
//! A reply may span multiple lines (`250-...` continuations terminated by
//! `250 ...`) and a single socket read may carry a partial line, so inbound
//! bytes are buffered until the final `xxx<SP>` line has arrived.

use anyhow::anyhow;
use mxpost_common::Result;

/// One complete SMTP reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub code: u16,
    pub lines: Vec<String>,
}

impl Response {
    /// Reply text with continuation lines joined by a single space
    pub fn text(&self) -> String {
        self.lines.join(" ")
    }

    /// Whether an EHLO reply advertises the named extension.
    ///
    /// The first line of an EHLO reply is the server greeting, not a
    /// capability, and is skipped.
    pub fn has_capability(&self, name: &str) -> bool {
        self.lines.iter().skip(1).any(|line| {
            line.split_whitespace()
                .next()
                .map_or(false, |token| token.eq_ignore_ascii_case(name))
        })
    }
}

/// Accumulates socket reads until a complete reply is available
#[derive(Debug, Default)]
pub struct ResponseBuffer {
    buf: Vec<u8>,
}

impl ResponseBuffer {
    pub fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Pop one complete reply off the buffer, or `None` when more bytes are
    /// needed.
    pub fn next_response(&mut self) -> Result<Option<Response>> {
        let mut lines = Vec::new();
        let mut code = None;
        let mut offset = 0;

        loop {
            let Some(end) = find_crlf(&self.buf[offset..]) else {
                return Ok(None);
            };
            let raw = std::str::from_utf8(&self.buf[offset..offset + end])
                .map_err(|_| anyhow!("SMTP reply is not valid UTF-8"))?;
            let line = parse_line(raw)?;

            match code {
                None => code = Some(line.code),
                Some(code) if code != line.code => {
                    return Err(anyhow!(
                        "SMTP reply changed code mid-response: {} then {}",
                        code,
                        line.code
                    )
                    .into());
                }
                Some(_) => {}
            }

            lines.push(line.content.to_string());
            offset += end + 2;

            if line.is_final {
                self.buf.drain(..offset);
                return Ok(Some(Response {
                    // `code` was set on the first parsed line
                    code: code.unwrap_or(0),
                    lines,
                }));
            }
        }
    }
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|pair| pair == b"\r\n")
}

struct ReplyLine<'a> {
    code: u16,
    is_final: bool,
    content: &'a str,
}

fn parse_line(line: &str) -> Result<ReplyLine<'_>> {
    if line.len() < 4 {
        return Err(anyhow!("Malformed SMTP reply line: {:?}", line).into());
    }
    match line.as_bytes()[3] {
        separator @ (b' ' | b'-') => match line[0..3].parse::<u16>() {
            Ok(code) => Ok(ReplyLine {
                code,
                is_final: separator == b' ',
                content: &line[4..],
            }),
            Err(_) => Err(anyhow!("Malformed SMTP reply line: {:?}", line).into()),
        },
        _ => Err(anyhow!("Malformed SMTP reply line: {:?}", line).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line_reply() {
        let mut buffer = ResponseBuffer::default();
        buffer.extend(b"220 mx.example.com ESMTP\r\n");
        let response = buffer.next_response().unwrap().unwrap();
        assert_eq!(response.code, 220);
        assert_eq!(response.text(), "mx.example.com ESMTP");
        assert!(buffer.next_response().unwrap().is_none());
    }

    #[test]
    fn test_multi_line_reply() {
        let mut buffer = ResponseBuffer::default();
        buffer.extend(b"250-mx.example.com\r\n250-STARTTLS\r\n250 SIZE 1000000\r\n");
        let response = buffer.next_response().unwrap().unwrap();
        assert_eq!(response.code, 250);
        assert_eq!(response.lines.len(), 3);
        assert!(response.has_capability("STARTTLS"));
        assert!(response.has_capability("starttls"));
        assert!(response.has_capability("SIZE"));
    }

    #[test]
    fn test_first_line_is_not_a_capability() {
        let mut buffer = ResponseBuffer::default();
        buffer.extend(b"250 STARTTLS\r\n");
        let response = buffer.next_response().unwrap().unwrap();
        assert!(!response.has_capability("STARTTLS"));
    }

    #[test]
    fn test_partial_reads_are_buffered() {
        let mut buffer = ResponseBuffer::default();
        buffer.extend(b"250-mx.exa");
        assert!(buffer.next_response().unwrap().is_none());
        buffer.extend(b"mple.com\r\n250-STAR");
        assert!(buffer.next_response().unwrap().is_none());
        buffer.extend(b"TTLS\r\n250 OK\r\n");
        let response = buffer.next_response().unwrap().unwrap();
        assert_eq!(response.code, 250);
        assert!(response.has_capability("STARTTLS"));
    }

    #[test]
    fn test_two_replies_in_one_read() {
        let mut buffer = ResponseBuffer::default();
        buffer.extend(b"250 first\r\n354 second\r\n");
        assert_eq!(buffer.next_response().unwrap().unwrap().code, 250);
        assert_eq!(buffer.next_response().unwrap().unwrap().code, 354);
        assert!(buffer.next_response().unwrap().is_none());
    }

    #[test]
    fn test_code_change_mid_reply_is_malformed() {
        let mut buffer = ResponseBuffer::default();
        buffer.extend(b"250-one\r\n550 two\r\n");
        assert!(buffer.next_response().is_err());
    }

    #[test]
    fn test_malformed_line() {
        let mut buffer = ResponseBuffer::default();
        buffer.extend(b"oops\r\n");
        assert!(buffer.next_response().is_err());
    }
}
