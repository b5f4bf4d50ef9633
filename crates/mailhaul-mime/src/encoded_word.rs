//! RFC 2047 encoded-word decoding for header values.
//!
//! An encoded word has the shape `=?charset?E?payload?=` where `E` is `B`
//! (base64) or `Q` (quoted-printable-like). Charset labels are resolved
//! through `encoding_rs`, so anything WHATWG knows (utf-8, iso-8859-*,
//! koi8-r, shift_jis, ...) decodes.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use encoding_rs::Encoding;

use crate::error::{Error, Result};

/// Decodes every RFC 2047 encoded word in `input`, passing other text
/// through untouched. The single space that separates two adjacent encoded
/// words is dropped, per the RFC.
///
/// # Errors
///
/// [`Error::Decode`] for a word missing its `?` delimiters,
/// [`Error::UnknownCharset`] for an unresolvable charset label, and
/// [`Error::UnsupportedSubEncoding`] for sub-encodings other than B or Q.
pub fn decode_encoded_words(input: &str) -> Result<String> {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '=' || chars.get(i + 1) != Some(&'?') {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        i += 2;

        let charset = take_until_question(&chars, &mut i)?;
        let sub = take_until_question(&chars, &mut i)?;

        let mut end = None;
        let mut j = i;
        while j + 1 < chars.len() {
            if chars[j] == '?' && chars[j + 1] == '=' {
                end = Some(j);
                break;
            }
            j += 1;
        }
        let Some(end) = end else {
            return Err(Error::Decode("unterminated encoded word".to_string()));
        };
        let payload: String = chars[i..end].iter().collect();
        i = end + 2;

        let encoding = Encoding::for_label_no_replacement(charset.as_bytes())
            .ok_or_else(|| Error::UnknownCharset(charset.clone()))?;

        match sub.to_ascii_uppercase().as_str() {
            "B" => {
                let bytes = STANDARD.decode(payload.as_bytes())?;
                out.push_str(&encoding.decode_without_bom_handling(&bytes).0);
            }
            "Q" => out.push_str(&decode_q(&payload, encoding)?),
            _ => return Err(Error::UnsupportedSubEncoding(sub)),
        }

        // One space after an encoded word is a separator, not content.
        if chars.get(i) == Some(&' ') {
            i += 1;
        }
    }

    Ok(out)
}

fn take_until_question(chars: &[char], i: &mut usize) -> Result<String> {
    let start = *i;
    while *i < chars.len() && chars[*i] != '?' {
        *i += 1;
    }
    if *i >= chars.len() {
        return Err(Error::Decode("unterminated encoded word".to_string()));
    }
    let token: String = chars[start..*i].iter().collect();
    *i += 1;
    Ok(token)
}

/// Q sub-encoding. `=XX` escapes are buffered so multi-byte sequences
/// decode through the charset in one piece; literal characters flush the
/// buffer and pass through. Underscores are kept literal.
fn decode_q(payload: &str, encoding: &'static Encoding) -> Result<String> {
    let chars: Vec<char> = payload.chars().collect();
    let mut out = String::new();
    let mut pending: Vec<u8> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '=' {
            if i + 2 >= chars.len() {
                return Err(Error::Decode("truncated hex escape".to_string()));
            }
            let hex: String = chars[i + 1..=i + 2].iter().collect();
            let byte = u8::from_str_radix(&hex, 16)
                .map_err(|_| Error::Decode(format!("invalid hex escape ={hex}")))?;
            pending.push(byte);
            i += 3;
        } else {
            if !pending.is_empty() {
                out.push_str(&encoding.decode_without_bom_handling(&pending).0);
                pending.clear();
            }
            out.push(chars[i]);
            i += 1;
        }
    }

    if !pending.is_empty() {
        out.push_str(&encoding.decode_without_bom_handling(&pending).0);
    }
    Ok(out)
}
