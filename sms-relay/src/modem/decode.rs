//! Message body decoding.
//!
//! In text mode a modem hands out bodies outside the GSM alphabet (short codes,
//! non-latin scripts) as UCS2: the UTF-16BE code units written as hex digits.
//! Everything else arrives as plain single-byte text. Nothing in the listing
//! says which one a body is, so a body that is valid UCS2 hex is treated as
//! such and anything else is passed through.

/// Maps every byte to the code point of the same value.
pub fn latin1(bytes: &[u8]) -> String {
    bytes.iter().copied().map(char::from).collect()
}

/// Decodes `text` as UCS2 hex, or returns `None` if it is not exactly that:
/// a non-empty run of hex digits, four per code unit, forming valid UTF-16.
///
/// Plain bodies made only of hex digits are ambiguous and decode as UCS2 too:
/// a numeric one-time code like `12345678` comes out as `"ሴ噸"`, `CAFE` as `"쫾"`.
pub fn try_decode_ucs2(text: &str) -> Option<String> {
    let hex = text.trim();
    if hex.is_empty() || hex.len() % 4 != 0 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let units = hex
        .as_bytes()
        .chunks_exact(4)
        .map(|unit| {
            let digits = std::str::from_utf8(unit).ok()?;
            u16::from_str_radix(digits, 16).ok()
        })
        .collect::<Option<Vec<u16>>>()?;
    String::from_utf16(&units).ok()
}

/// Decodes text that was already read as Latin-1.
pub fn decode_text(text: &str) -> String {
    try_decode_ucs2(text).unwrap_or_else(|| text.to_owned())
}

/// Turns a raw body line into the text that gets relayed.
pub fn decode_body(raw: &[u8]) -> String {
    decode_text(&latin1(raw))
}

/// Inverse of [`try_decode_ucs2`], uppercase like modems emit it.
pub fn encode_ucs2(text: &str) -> String {
    text.encode_utf16().map(|unit| format!("{unit:04X}")).collect()
}
