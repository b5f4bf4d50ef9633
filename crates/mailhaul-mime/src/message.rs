//! Message decoding: headers, derived fields, and multipart bodies.

use chrono::{DateTime, Utc};

use crate::encoded_word::decode_encoded_words;
use crate::error::Result;
use crate::header::Headers;

/// MIME version assumed when the header is missing or unparseable.
const DEFAULT_MIME_VERSION: f64 = 0.0;

/// One decoded attachment. Payload is base64-decoded at parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Filename from the Content-Disposition parameter.
    pub name: String,
    /// Content type of the part.
    pub content_type: String,
    /// Decoded payload bytes.
    pub data: Vec<u8>,
}

/// Hook for claiming message parts the built-in decoder does not handle,
/// e.g. calendar invites or S/MIME blobs.
///
/// `handle` is consulted for each part (and for the whole body of a
/// non-multipart message) with the part's content type and the line cursor
/// positioned on the blank line after the part headers. Return `true` after
/// consuming the part, leaving the cursor on the last line consumed.
pub trait PartHandler {
    /// Offers a part to the handler. Returning `false` hands it back to
    /// the default decoding.
    fn handle(
        &mut self,
        content_type: &str,
        lines: &[String],
        cursor: &mut usize,
        message: &mut Message,
    ) -> bool;
}

struct NoHandler;

impl PartHandler for NoHandler {
    fn handle(&mut self, _: &str, _: &[String], _: &mut usize, _: &mut Message) -> bool {
        false
    }
}

/// A decoded mail message.
///
/// Derived fields (`subject`, `from`, ...) come from the header block;
/// when a header repeats, the last occurrence wins for the derived field
/// while [`Headers::get`] still returns the first.
#[derive(Debug, Clone)]
pub struct Message {
    /// All parsed headers, order and duplicates preserved.
    pub headers: Headers,
    /// Subject header, possibly still RFC 2047 encoded (see
    /// [`Message::decoded_subject`]).
    pub subject: String,
    /// From header.
    pub from: String,
    /// To header.
    pub to: String,
    /// Cc header.
    pub cc: String,
    /// Bcc header.
    pub bcc: String,
    /// Reply-To header.
    pub reply_to: String,
    /// MIME-Version header, 0 when absent or unparseable.
    pub mime_version: f64,
    /// Top-level content type, lowercased, `text/plain` when absent.
    pub content_type: String,
    /// Multipart boundary, if the top-level content type carries one.
    pub content_boundary: Option<String>,
    /// Date header in UTC; the current time when missing or unparseable.
    pub date: DateTime<Utc>,
    /// True when an In-Reply-To or References header is present.
    pub is_reply: bool,
    /// Plain-text body, empty if none.
    pub body_text: String,
    /// HTML body, empty if none.
    pub body_html: String,
    /// Attachments, already base64-decoded.
    pub attachments: Vec<Attachment>,
    /// The raw message as handed to the parser.
    pub raw: String,
}

impl Message {
    /// Parses a raw RFC 2822 message.
    ///
    /// # Errors
    ///
    /// Returns an error when an attachment or base64-encoded body fails to
    /// decode. Missing or malformed headers never fail; they fall back to
    /// defaults.
    pub fn parse(raw: &str) -> Result<Self> {
        Self::parse_with(raw, &mut NoHandler)
    }

    /// Parses with a [`PartHandler`] consulted before the built-in part
    /// decoding.
    ///
    /// # Errors
    ///
    /// See [`Message::parse`].
    pub fn parse_with(raw: &str, handler: &mut dyn PartHandler) -> Result<Self> {
        let lines: Vec<String> = raw
            .split('\n')
            .map(|l| l.trim_end_matches('\r').to_string())
            .collect();

        let (headers, mut i) = Headers::parse_folded(&lines);
        let mut message = Self {
            headers,
            subject: String::new(),
            from: String::new(),
            to: String::new(),
            cc: String::new(),
            bcc: String::new(),
            reply_to: String::new(),
            mime_version: DEFAULT_MIME_VERSION,
            content_type: "text/plain".to_string(),
            content_boundary: None,
            date: Utc::now(),
            is_reply: false,
            body_text: String::new(),
            body_html: String::new(),
            attachments: Vec::new(),
            raw: raw.to_string(),
        };
        message.derive_fields();

        let content_type = message.content_type.clone();
        if handler.handle(&content_type, &lines, &mut i, &mut message) {
            return Ok(message);
        }

        if content_type == "text/plain" {
            message.body_text = collect_body(&lines, i + 1);
        } else if content_type == "text/html" {
            message.body_html = collect_body(&lines, i + 1);
        } else if let Some(boundary) = message.content_boundary.clone() {
            // Anything else is assumed multipart.
            Self::parse_section(&mut message, &boundary, &lines, i, handler)?;
        }

        Ok(message)
    }

    /// Preferred rendering: the HTML body when present, else plain text.
    #[must_use]
    pub fn body(&self) -> &str {
        if self.body_html.trim().is_empty() {
            &self.body_text
        } else {
            &self.body_html
        }
    }

    /// Subject with RFC 2047 encoded words decoded.
    ///
    /// # Errors
    ///
    /// See [`decode_encoded_words`].
    pub fn decoded_subject(&self) -> Result<String> {
        decode_encoded_words(&self.subject)
    }

    fn derive_fields(&mut self) {
        let entries: Vec<(String, String)> = self
            .headers
            .iter()
            .map(|h| (h.name.to_lowercase(), h.value.clone()))
            .collect();

        for (name, value) in entries {
            match name.as_str() {
                "subject" => self.subject = value,
                "from" => self.from = value,
                "to" => self.to = value,
                "cc" => self.cc = value,
                "bcc" => self.bcc = value,
                "reply-to" => self.reply_to = value,
                "in-reply-to" | "references" => self.is_reply = true,
                "mime-version" => {
                    self.mime_version = value.trim().parse().unwrap_or(DEFAULT_MIME_VERSION);
                }
                "date" => self.date = parse_date(&value),
                // Synthetic overrides, set by part handlers that decode
                // bodies themselves.
                "htmlbody" => self.body_html = value,
                "plaintext" => self.body_text = value,
                "content-type" => {
                    let mut segments = value.split(';');
                    if let Some(main) = segments.next() {
                        self.content_type = main.trim().to_lowercase();
                    }
                    for segment in segments {
                        if let Some(boundary) = param_value(segment, "boundary") {
                            self.content_boundary = Some(boundary.to_string());
                        }
                    }
                }
                _ => {}
            }
        }
    }

    /// Walks one multipart section. `i` sits on or before the first
    /// boundary marker; the returned cursor sits on the closing marker.
    fn parse_section(
        message: &mut Self,
        boundary: &str,
        lines: &[String],
        mut i: usize,
        handler: &mut dyn PartHandler,
    ) -> Result<usize> {
        let open = format!("--{boundary}");
        let close = format!("--{boundary}--");

        while i < lines.len() {
            if lines[i] == close {
                return Ok(i);
            }
            if lines[i] != open {
                i += 1;
                continue;
            }
            i += 1;

            let mut part_type = "text/plain".to_string();
            let mut part_boundary: Option<String> = None;
            let mut transfer_encoding = String::new();
            let mut attachment_name: Option<String> = None;

            while i < lines.len() && !lines[i].is_empty() {
                let line = lines[i].trim();
                if let Some((name, value)) = line.split_once(':') {
                    match name.trim().to_lowercase().as_str() {
                        "content-type" => {
                            let mut segments = value.split(';');
                            if let Some(main) = segments.next() {
                                part_type = main.trim().to_lowercase();
                            }
                            for segment in segments {
                                if let Some(b) = param_value(segment, "boundary") {
                                    part_boundary = Some(b.to_string());
                                }
                            }
                        }
                        "content-transfer-encoding" => {
                            transfer_encoding = value.trim().to_lowercase();
                        }
                        "content-disposition" => {
                            if value.to_lowercase().contains("attachment") {
                                for segment in value.split(';') {
                                    if let Some(f) = param_value(segment, "filename") {
                                        attachment_name = Some(f.to_string());
                                    }
                                }
                            }
                        }
                        _ => {}
                    }
                } else if let Some(b) = param_value(line, "boundary") {
                    // Folded Content-Type parameter on its own line.
                    part_boundary = Some(b.to_string());
                } else if let Some(f) = param_value(line, "filename") {
                    attachment_name = Some(f.to_string());
                }
                i += 1;
            }

            if let Some(child) = &part_boundary {
                i = Self::parse_section(message, child, lines, i, handler)?;
            }

            // The handler sees every part, nested-multipart containers
            // included (for those, after their children were walked).
            if handler.handle(&part_type, lines, &mut i, message) {
                // Part consumed by the handler.
            } else {
                i += 1;
                let is_attachment = attachment_name.is_some();
                let mut body = String::new();
                while i < lines.len() && lines[i] != open && lines[i] != close {
                    body.push_str(&lines[i]);
                    if !is_attachment {
                        body.push('\n');
                    }
                    i += 1;
                }
                // Step back so the outer loop re-examines the marker.
                i = i.saturating_sub(1);

                if let Some(name) = attachment_name {
                    let data = decode_base64_forgiving(&body)?;
                    message.attachments.push(Attachment {
                        name,
                        content_type: part_type,
                        data,
                    });
                } else if part_type == "text/plain" {
                    message.body_text = body.trim().to_string();
                } else if part_type == "text/html" {
                    if transfer_encoding == "base64" {
                        let decoded = decode_base64_forgiving(body.trim())?;
                        message.body_html = String::from_utf8_lossy(&decoded).into_owned();
                    } else {
                        message.body_html = body.trim().to_string();
                    }
                }
                // Other part types without a disposition are dropped.
            }

            i += 1;
        }

        Ok(i)
    }
}

/// Collects body lines from `start` to the end, newline-joined and trimmed.
fn collect_body(lines: &[String], start: usize) -> String {
    let mut body = String::new();
    for line in lines.iter().skip(start) {
        body.push_str(line);
        body.push('\n');
    }
    body.trim().to_string()
}

/// `key=value` parameter with optional quoting, as found in Content-Type
/// and Content-Disposition segments.
fn param_value<'a>(segment: &'a str, key: &str) -> Option<&'a str> {
    let rest = segment.trim().strip_prefix(key)?.trim_start();
    let rest = rest.strip_prefix('=')?;
    Some(rest.trim().trim_matches('"'))
}

/// RFC 2822 date, with a trailing comment like `(CEST)` stripped first.
fn parse_date(value: &str) -> DateTime<Utc> {
    let cleaned = value.rfind('(').map_or(value, |idx| &value[..idx]);
    DateTime::parse_from_rfc2822(cleaned.trim())
        .map_or_else(|_| Utc::now(), |d| d.with_timezone(&Utc))
}

/// Base64 with any interleaved whitespace removed, as produced by line
/// wrapped attachment bodies.
fn decode_base64_forgiving(input: &str) -> Result<Vec<u8>> {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    Ok(STANDARD.decode(compact.as_bytes())?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn param_value_handles_quoting() {
        assert_eq!(param_value(" boundary=\"XYZ\"", "boundary"), Some("XYZ"));
        assert_eq!(param_value("boundary=XYZ", "boundary"), Some("XYZ"));
        assert_eq!(param_value("charset=utf-8", "boundary"), None);
    }

    #[test]
    fn date_comment_is_stripped() {
        let date = parse_date("Tue, 12 Aug 2025 14:30:00 +0200 (CEST)");
        assert_eq!(date.to_rfc2822(), "Tue, 12 Aug 2025 12:30:00 +0000");
    }

    #[test]
    fn forgiving_base64_ignores_line_wraps() {
        assert_eq!(
            decode_base64_forgiving("SGVs\r\nbG8=").unwrap(),
            b"Hello".to_vec()
        );
    }
}
