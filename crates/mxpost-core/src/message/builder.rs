//! RFC 5322 / MIME message assembly
//!
//! Builds the outer document handed to the DKIM signer: headers, an optional
//! multipart/mixed and multipart/alternative tree, and base64 attachments.
//! Bcc recipients are accepted on the envelope but never written to headers.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use mxpost_common::{Attachment, EmailAddress, Envelope, Result};
use uuid::Uuid;

const BASE64_LINE_WIDTH: usize = 76;

/// Builder producing the RFC 822 bytes for one envelope
pub struct MessageBuilder<'a> {
    envelope: &'a Envelope,
}

impl<'a> MessageBuilder<'a> {
    pub fn new(envelope: &'a Envelope) -> Self {
        Self { envelope }
    }

    /// Assemble the full message with CRLF line endings.
    ///
    /// Suspends only while attachment bytes are produced.
    pub async fn build(&self) -> Result<String> {
        let envelope = self.envelope;
        let mut out = String::new();

        push_header(&mut out, "From", &envelope.from.to_string());
        push_header(&mut out, "To", &join_addresses(&envelope.to));
        if !envelope.cc.is_empty() {
            push_header(&mut out, "Cc", &join_addresses(&envelope.cc));
        }
        push_header(&mut out, "Subject", &envelope.subject);
        push_header(&mut out, "Message-ID", &message_id(&envelope.from.domain));
        push_header(&mut out, "Date", &Utc::now().to_rfc2822());
        push_header(&mut out, "MIME-Version", "1.0");

        if !envelope.attachments.is_empty() {
            let mixed = boundary();
            push_header(
                &mut out,
                "Content-Type",
                &format!("multipart/mixed; boundary=\"{}\"", mixed),
            );
            out.push_str("\r\n");

            out.push_str(&format!("--{}\r\n", mixed));
            self.push_body(&mut out);
            for attachment in &envelope.attachments {
                out.push_str(&format!("--{}\r\n", mixed));
                push_attachment_part(&mut out, attachment).await?;
            }
            out.push_str(&format!("--{}--\r\n", mixed));
        } else {
            self.push_body(&mut out);
        }

        Ok(out)
    }

    /// Emit body content headers followed by the body itself: either a
    /// multipart/alternative tree (text + HTML) or a single text/plain part.
    ///
    /// Used both at the top level and as the first part of multipart/mixed.
    fn push_body(&self, out: &mut String) {
        match &self.envelope.html {
            Some(html) => {
                let alternative = boundary();
                push_header(
                    out,
                    "Content-Type",
                    &format!("multipart/alternative; boundary=\"{}\"", alternative),
                );
                out.push_str("\r\n");

                out.push_str(&format!("--{}\r\n", alternative));
                push_text_part(out, "text/plain", &self.envelope.text);
                out.push_str(&format!("--{}\r\n", alternative));
                push_text_part(out, "text/html", html);
                out.push_str(&format!("--{}--\r\n", alternative));
            }
            None => {
                push_text_part(out, "text/plain", &self.envelope.text);
            }
        }
    }
}

fn push_header(out: &mut String, name: &str, value: &str) {
    out.push_str(name);
    out.push_str(": ");
    out.push_str(value);
    out.push_str("\r\n");
}

fn join_addresses(addresses: &[EmailAddress]) -> String {
    addresses
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// `<hex(16 random bytes).<millis>@<sender-domain>>`
fn message_id(sender_domain: &str) -> String {
    format!(
        "<{}.{}@{}>",
        Uuid::new_v4().simple(),
        Utc::now().timestamp_millis(),
        sender_domain
    )
}

/// Fresh random part boundary; distinct per call.
fn boundary() -> String {
    format!("mx_{}", Uuid::new_v4().simple())
}

fn push_text_part(out: &mut String, content_type: &str, body: &str) {
    push_header(out, "Content-Type", &format!("{}; charset=utf-8", content_type));
    push_header(out, "Content-Transfer-Encoding", "8bit");
    out.push_str("\r\n");
    out.push_str(&to_crlf(body));
    if !out.ends_with("\r\n") {
        out.push_str("\r\n");
    }
}

async fn push_attachment_part(out: &mut String, attachment: &Attachment) -> Result<()> {
    let bytes = attachment.data.bytes().await?;

    push_header(
        out,
        "Content-Type",
        &format!("{}; name=\"{}\"", attachment.content_type, attachment.filename),
    );
    push_header(out, "Content-Transfer-Encoding", "base64");
    push_header(
        out,
        "Content-Disposition",
        &format!("attachment; filename=\"{}\"", attachment.filename),
    );
    out.push_str("\r\n");
    out.push_str(&wrap_base64(&BASE64.encode(bytes)));
    out.push_str("\r\n");
    Ok(())
}

fn to_crlf(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\n', "\r\n")
}

fn wrap_base64(encoded: &str) -> String {
    let mut out = String::with_capacity(encoded.len() + encoded.len() / BASE64_LINE_WIDTH * 2);
    let mut rest = encoded;
    while rest.len() > BASE64_LINE_WIDTH {
        out.push_str(&rest[..BASE64_LINE_WIDTH]);
        out.push_str("\r\n");
        rest = &rest[BASE64_LINE_WIDTH..];
    }
    out.push_str(rest);
    out
}
