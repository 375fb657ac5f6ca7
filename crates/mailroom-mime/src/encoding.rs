//! Transfer and header decodings.
//!
//! Decoders are lenient: mail in the wild routinely breaks the letter of
//! RFC 2045/2047, and a malformed escape is kept as literal text rather
//! than failing the whole message.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};

use crate::error::Result;

/// Decodes Base64 data, ignoring whitespace and missing padding.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &[u8]) -> Result<Vec<u8>> {
    let cleaned: Vec<u8> = data
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    match STANDARD.decode(&cleaned) {
        Ok(decoded) => Ok(decoded),
        Err(_) => {
            let unpadded: Vec<u8> = cleaned.iter().copied().filter(|&b| b != b'=').collect();
            STANDARD_NO_PAD.decode(unpadded).map_err(Into::into)
        }
    }
}

/// Decodes Quoted-Printable data (RFC 2045).
///
/// Soft line breaks are removed; an invalid escape is copied through.
#[must_use]
pub fn decode_quoted_printable(data: &[u8]) -> Vec<u8> {
    decode_qp(data, false)
}

fn decode_qp(data: &[u8], underscore_is_space: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        match data[i] {
            b'=' => {
                let rest = &data[i + 1..];
                if rest.starts_with(b"\r\n") {
                    i += 3;
                } else if rest.starts_with(b"\n") {
                    i += 2;
                } else if let Some(byte) = rest.get(..2).and_then(hex_byte) {
                    out.push(byte);
                    i += 3;
                } else {
                    out.push(b'=');
                    i += 1;
                }
            }
            b'_' if underscore_is_space => {
                out.push(b' ');
                i += 1;
            }
            byte => {
                out.push(byte);
                i += 1;
            }
        }
    }
    out
}

fn hex_byte(pair: &[u8]) -> Option<u8> {
    let text = std::str::from_utf8(pair).ok()?;
    u8::from_str_radix(text, 16).ok()
}

/// Converts bytes in the named charset to a string.
///
/// UTF-8 and ASCII are decoded lossily; the ISO-8859-1 family and
/// windows-1252 map each byte to the code point of the same value.
#[must_use]
pub fn decode_charset(bytes: &[u8], charset: &str) -> String {
    let charset = charset.trim().trim_matches('"').to_ascii_lowercase();
    match charset.as_str() {
        "iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" | "windows-1252" | "cp1252" => {
            bytes.iter().map(|&b| char::from(b)).collect()
        }
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Decodes every RFC 2047 encoded word in a header value.
///
/// Whitespace between two adjacent encoded words is dropped; text that
/// only looks like an encoded word is kept as is.
#[must_use]
pub fn decode_rfc2047(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut after_word = false;

    while let Some(start) = rest.find("=?") {
        let (before, candidate) = rest.split_at(start);
        if let Some((decoded, consumed)) = decode_word(candidate) {
            if !(after_word && before.trim().is_empty()) {
                out.push_str(before);
            }
            out.push_str(&decoded);
            rest = &candidate[consumed..];
            after_word = true;
        } else {
            out.push_str(before);
            out.push_str("=?");
            rest = &candidate[2..];
            after_word = false;
        }
    }
    out.push_str(rest);
    out
}

/// Decodes one `=?charset?enc?text?=` word at the start of `s`.
///
/// Returns the decoded text and the number of bytes consumed.
fn decode_word(s: &str) -> Option<(String, usize)> {
    let body = s.strip_prefix("=?")?;
    let (charset, after) = body.split_once('?')?;
    let (encoding, after) = after.split_once('?')?;
    let end = after.find("?=")?;
    let encoded = &after[..end];
    if charset.is_empty() || encoded.contains(char::is_whitespace) {
        return None;
    }

    let consumed = 2 + charset.len() + 1 + encoding.len() + 1 + end + 2;
    let bytes = match encoding {
        "B" | "b" => decode_base64(encoded.as_bytes()).ok()?,
        "Q" | "q" => decode_qp(encoded.as_bytes(), true),
        _ => return None,
    };
    // RFC 2231 language suffix: utf-8*en
    let charset = charset.split('*').next().unwrap_or(charset);
    Some((decode_charset(&bytes, charset), consumed))
}
