use chardetng::EncodingDetector;
use encoding_rs::Encoding;

/// How far into the document to look for a `<meta charset>` declaration.
const META_PRESCAN_BYTES: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedHtml {
    pub html: String,
    pub encoding_label: String,
    /// Malformed sequences were replaced with U+FFFD.
    pub had_errors: bool,
}

/// Decode raw bytes into UTF-8 using: BOM -> Content-Type charset -> meta
/// charset -> chardetng fallback. Decoding is lossy and never fails.
pub fn decode_html(bytes: &[u8], content_type: Option<&str>) -> DecodedHtml {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return decode_with(bytes, encoding);
    }

    if let Some(enc) = content_type
        .and_then(extract_charset)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
    {
        return decode_with(bytes, enc);
    }

    if let Some(enc) = sniff_meta_charset(bytes).and_then(|label| Encoding::for_label(label.as_bytes())) {
        return decode_with(bytes, enc);
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let enc = detector.guess(None, true);
    decode_with(bytes, enc)
}

fn extract_charset(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .filter_map(|part| {
            let (key, value) = part.split_once('=')?;
            key.trim()
                .eq_ignore_ascii_case("charset")
                .then(|| value.trim().trim_matches(['"', '\'']).to_string())
        })
        .find(|label| !label.is_empty())
}

/// Finds `charset=` inside the first `<meta` tags of the document head.
fn sniff_meta_charset(bytes: &[u8]) -> Option<String> {
    let head = &bytes[..bytes.len().min(META_PRESCAN_BYTES)];
    let head = String::from_utf8_lossy(head).to_ascii_lowercase();
    head.match_indices("<meta").find_map(|(start, _)| {
        let tag = &head[start..];
        let tag = &tag[..tag.find('>').unwrap_or(tag.len())];
        let value = &tag[tag.find("charset=")? + "charset=".len()..];
        let value = value.trim_start_matches(['"', '\'']);
        let end = value
            .find(|c: char| c == '"' || c == '\'' || c == ';' || c == '/' || c.is_whitespace())
            .unwrap_or(value.len());
        let label = &value[..end];
        (!label.is_empty()).then(|| label.to_string())
    })
}

fn decode_with(bytes: &[u8], enc: &'static Encoding) -> DecodedHtml {
    let (text, _, had_errors) = enc.decode(bytes);
    DecodedHtml {
        html: text.into_owned(),
        encoding_label: enc.name().to_string(),
        had_errors,
    }
}

#[cfg(test)]
mod tests {
    use super::{decode_html, extract_charset, sniff_meta_charset};

    #[test]
    fn stray_byte_is_replaced_not_rejected() {
        let decoded = decode_html(b"caf\xe9 ok", Some("text/html; charset=utf-8"));
        assert_eq!(decoded.html, "caf\u{FFFD} ok");
        assert_eq!(decoded.encoding_label, "UTF-8");
        assert!(decoded.had_errors);
    }

    #[test]
    fn charset_parameter_is_case_insensitive() {
        assert_eq!(
            extract_charset("text/html; Charset=\"ISO-8859-1\"").as_deref(),
            Some("ISO-8859-1")
        );
        assert_eq!(extract_charset("text/html"), None);
    }

    #[test]
    fn meta_charset_is_found_in_head() {
        let html = br#"<html><head><meta charset="windows-1252"><title>x</title>"#;
        assert_eq!(sniff_meta_charset(html).as_deref(), Some("windows-1252"));
    }

    #[test]
    fn http_equiv_meta_is_found() {
        let html = br#"<meta http-equiv="Content-Type" content="text/html; charset=Shift_JIS">"#;
        assert_eq!(sniff_meta_charset(html).as_deref(), Some("shift_jis"));
    }

    #[test]
    fn no_meta_means_no_label() {
        assert_eq!(sniff_meta_charset(b"<p>plain</p>"), None);
    }
}
