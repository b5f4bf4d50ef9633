//! End-to-end message decoding fixtures.

#![allow(clippy::unwrap_used)]

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{TimeZone, Utc};
use mailhaul_mime::{Message, PartHandler, decode_encoded_words};
use proptest::prelude::*;

#[test]
fn single_part_plain_text() {
    let raw = concat!(
        "From: sender@example.com\r\n",
        "To: recipient@example.com\r\n",
        "Subject: Hi\r\n",
        "\r\n",
        "Hello\r\n",
    );

    let message = Message::parse(raw).unwrap();
    assert_eq!(message.subject, "Hi");
    assert_eq!(message.from, "sender@example.com");
    assert_eq!(message.to, "recipient@example.com");
    assert_eq!(message.content_type, "text/plain");
    assert_eq!(message.body_text, "Hello");
    assert_eq!(message.body(), "Hello");
    assert!(message.attachments.is_empty());
    assert!(!message.is_reply);
    assert_eq!(message.raw, raw);
}

#[test]
fn single_part_html() {
    let raw = concat!(
        "Subject: markup\r\n",
        "Content-Type: text/html; charset=utf-8\r\n",
        "\r\n",
        "<p>Hello</p>\r\n",
    );

    let message = Message::parse(raw).unwrap();
    assert_eq!(message.content_type, "text/html");
    assert_eq!(message.body_html, "<p>Hello</p>");
    assert_eq!(message.body(), "<p>Hello</p>");
    assert!(message.body_text.is_empty());
}

#[test]
fn folded_headers_unfold_with_single_space() {
    let raw = concat!(
        "Subject: a very\r\n",
        "\t long subject\r\n",
        "\r\n",
        "body\r\n",
    );

    let message = Message::parse(raw).unwrap();
    assert_eq!(message.subject, "a very long subject");
}

#[test]
fn later_duplicate_header_wins_for_derived_field() {
    let raw = concat!(
        "Subject: first\r\n",
        "Subject: second\r\n",
        "\r\n",
    );

    let message = Message::parse(raw).unwrap();
    assert_eq!(message.subject, "second");
    // Positional lookup still returns the first occurrence.
    assert_eq!(message.headers.get("Subject"), Some("first"));
}

#[test]
fn date_with_zone_comment() {
    let raw = concat!(
        "Date: Tue, 12 Aug 2025 14:30:00 +0200 (CEST)\r\n",
        "\r\n",
    );

    let message = Message::parse(raw).unwrap();
    assert_eq!(
        message.date,
        Utc.with_ymd_and_hms(2025, 8, 12, 12, 30, 0).unwrap()
    );
}

#[test]
fn references_header_marks_reply() {
    let raw = concat!(
        "Subject: Re: Hi\r\n",
        "References: <msg-1@example.com>\r\n",
        "\r\n",
    );

    assert!(Message::parse(raw).unwrap().is_reply);
}

#[test]
fn text_plain_with_boundary_parameter_stays_plain() {
    // A boundary parameter on a text type must not trigger the multipart
    // walker; the content type decides the dispatch.
    let raw = concat!(
        "Subject: Hi\r\n",
        "Content-Type: text/plain; boundary=\"x\"\r\n",
        "\r\n",
        "Hello\r\n",
    );

    let message = Message::parse(raw).unwrap();
    assert_eq!(message.content_boundary.as_deref(), Some("x"));
    assert_eq!(message.body_text, "Hello");
    assert!(message.attachments.is_empty());
}

#[test]
fn synthetic_body_override_headers() {
    let raw = concat!(
        "Content-Type: application/x-opaque\r\n",
        "htmlbody: <p>pre-decoded</p>\r\n",
        "plaintext: pre-decoded\r\n",
        "\r\n",
        "raw payload the core does not touch\r\n",
    );

    let message = Message::parse(raw).unwrap();
    assert_eq!(message.body_html, "<p>pre-decoded</p>");
    assert_eq!(message.body_text, "pre-decoded");
}

#[test]
fn unparseable_mime_version_defaults_to_zero() {
    let raw = concat!("MIME-Version: one point oh\r\n", "\r\n");

    let message = Message::parse(raw).unwrap();
    assert!(message.mime_version.abs() < f64::EPSILON);
}

#[test]
fn multipart_with_attachment() {
    let raw = concat!(
        "From: sender@example.com\r\n",
        "Subject: files\r\n",
        "MIME-Version: 1.0\r\n",
        "Content-Type: multipart/mixed; boundary=\"outer\"\r\n",
        "\r\n",
        "preamble, ignored\r\n",
        "--outer\r\n",
        "Content-Type: text/plain\r\n",
        "\r\n",
        "See attachment.\r\n",
        "--outer\r\n",
        "Content-Type: application/octet-stream\r\n",
        "Content-Disposition: attachment; filename=\"a.txt\"\r\n",
        "Content-Transfer-Encoding: base64\r\n",
        "\r\n",
        "SGVsbG8=\r\n",
        "--outer--\r\n",
    );

    let message = Message::parse(raw).unwrap();
    assert_eq!(message.content_type, "multipart/mixed");
    assert_eq!(message.content_boundary.as_deref(), Some("outer"));
    assert!((message.mime_version - 1.0).abs() < f64::EPSILON);
    assert_eq!(message.body_text, "See attachment.");
    assert_eq!(message.attachments.len(), 1);
    assert_eq!(message.attachments[0].name, "a.txt");
    assert_eq!(message.attachments[0].content_type, "application/octet-stream");
    assert_eq!(message.attachments[0].data, b"Hello");
}

#[test]
fn wrapped_attachment_base64_decodes() {
    let raw = concat!(
        "Content-Type: multipart/mixed; boundary=b\r\n",
        "\r\n",
        "--b\r\n",
        "Content-Disposition: attachment; filename=wrapped.bin\r\n",
        "\r\n",
        "SGVsbG8s\r\n",
        "IHdvcmxk\r\n",
        "--b--\r\n",
    );

    let message = Message::parse(raw).unwrap();
    assert_eq!(message.attachments[0].name, "wrapped.bin");
    assert_eq!(message.attachments[0].data, b"Hello, world");
}

#[test]
fn corrupt_attachment_base64_is_an_error() {
    let raw = concat!(
        "Content-Type: multipart/mixed; boundary=b\r\n",
        "\r\n",
        "--b\r\n",
        "Content-Disposition: attachment; filename=bad.bin\r\n",
        "\r\n",
        "not!base64!!\r\n",
        "--b--\r\n",
    );

    assert!(Message::parse(raw).is_err());
}

#[test]
fn nested_alternative_inside_mixed() {
    let raw = concat!(
        "Content-Type: multipart/mixed; boundary=\"outer\"\r\n",
        "\r\n",
        "--outer\r\n",
        "Content-Type: multipart/alternative; boundary=\"inner\"\r\n",
        "\r\n",
        "--inner\r\n",
        "Content-Type: text/plain\r\n",
        "\r\n",
        "plain version\r\n",
        "--inner\r\n",
        "Content-Type: text/html\r\n",
        "\r\n",
        "<b>html version</b>\r\n",
        "--inner--\r\n",
        "--outer--\r\n",
    );

    let message = Message::parse(raw).unwrap();
    assert_eq!(message.body_text, "plain version");
    assert_eq!(message.body_html, "<b>html version</b>");
    // HTML wins for rendering.
    assert_eq!(message.body(), "<b>html version</b>");
}

#[test]
fn base64_html_part_is_decoded() {
    // base64("<i>hi</i>")
    let raw = concat!(
        "Content-Type: multipart/alternative; boundary=b\r\n",
        "\r\n",
        "--b\r\n",
        "Content-Type: text/html\r\n",
        "Content-Transfer-Encoding: base64\r\n",
        "\r\n",
        "PGk+aGk8L2k+\r\n",
        "--b--\r\n",
    );

    let message = Message::parse(raw).unwrap();
    assert_eq!(message.body_html, "<i>hi</i>");
}

#[test]
fn encoded_subject_decodes_on_demand() {
    let raw = concat!(
        "Subject: =?utf-8?B?SGVsbG8gd29ybGQ=?=\r\n",
        "\r\n",
    );

    let message = Message::parse(raw).unwrap();
    assert_eq!(message.subject, "=?utf-8?B?SGVsbG8gd29ybGQ=?=");
    assert_eq!(message.decoded_subject().unwrap(), "Hello world");
}

struct CalendarHandler {
    lines: Vec<String>,
}

impl PartHandler for CalendarHandler {
    fn handle(
        &mut self,
        content_type: &str,
        lines: &[String],
        cursor: &mut usize,
        _message: &mut Message,
    ) -> bool {
        if content_type != "text/calendar" {
            return false;
        }
        let mut i = *cursor + 1;
        while i < lines.len() && !lines[i].starts_with("--") {
            self.lines.push(lines[i].clone());
            i += 1;
        }
        *cursor = i - 1;
        true
    }
}

#[test]
fn part_handler_claims_unknown_parts() {
    let raw = concat!(
        "Content-Type: multipart/mixed; boundary=b\r\n",
        "\r\n",
        "--b\r\n",
        "Content-Type: text/calendar\r\n",
        "\r\n",
        "BEGIN:VCALENDAR\r\n",
        "END:VCALENDAR\r\n",
        "--b\r\n",
        "Content-Type: text/plain\r\n",
        "\r\n",
        "see invite\r\n",
        "--b--\r\n",
    );

    let mut handler = CalendarHandler { lines: Vec::new() };
    let message = Message::parse_with(raw, &mut handler).unwrap();
    assert_eq!(handler.lines, vec!["BEGIN:VCALENDAR", "END:VCALENDAR"]);
    assert_eq!(message.body_text, "see invite");
}

struct TypeRecorder {
    types: Vec<String>,
}

impl PartHandler for TypeRecorder {
    fn handle(
        &mut self,
        content_type: &str,
        _lines: &[String],
        _cursor: &mut usize,
        _message: &mut Message,
    ) -> bool {
        self.types.push(content_type.to_string());
        false
    }
}

#[test]
fn handler_sees_nested_container_parts_too() {
    let raw = concat!(
        "Content-Type: multipart/mixed; boundary=\"outer\"\r\n",
        "\r\n",
        "--outer\r\n",
        "Content-Type: multipart/alternative; boundary=\"inner\"\r\n",
        "\r\n",
        "--inner\r\n",
        "Content-Type: text/plain\r\n",
        "\r\n",
        "plain version\r\n",
        "--inner--\r\n",
        "--outer--\r\n",
    );

    let mut handler = TypeRecorder { types: Vec::new() };
    let message = Message::parse_with(raw, &mut handler).unwrap();

    // The container part is offered after its children were walked.
    assert_eq!(
        handler.types,
        vec!["multipart/mixed", "text/plain", "multipart/alternative"]
    );
    assert_eq!(message.body_text, "plain version");
}

#[test]
fn unhandled_part_types_are_dropped() {
    let raw = concat!(
        "Content-Type: multipart/mixed; boundary=b\r\n",
        "\r\n",
        "--b\r\n",
        "Content-Type: application/x-unknown\r\n",
        "\r\n",
        "opaque payload\r\n",
        "--b--\r\n",
    );

    let message = Message::parse(raw).unwrap();
    assert!(message.body_text.is_empty());
    assert!(message.body_html.is_empty());
    assert!(message.attachments.is_empty());
}

proptest! {
    #[test]
    fn b_encoded_text_survives(s in "\\PC{0,40}") {
        let word = format!("=?utf-8?B?{}?=", STANDARD.encode(s.as_bytes()));
        prop_assert_eq!(decode_encoded_words(&word).unwrap(), s);
    }

    #[test]
    fn q_escaped_bytes_survive(bytes in proptest::collection::vec(any::<u8>(), 0..32)) {
        let payload: String = bytes.iter().map(|b| format!("={b:02X}")).collect();
        let word = format!("=?utf-8?Q?{payload}?=");
        prop_assert_eq!(
            decode_encoded_words(&word).unwrap(),
            String::from_utf8_lossy(&bytes).into_owned()
        );
    }
}
