//! Charset resolution for raw chapter bytes.
//!
//! Order: byte-order mark, strict UTF-8, statistical detection via
//! `chardetng`, and finally the configured fallback (GBK by default, since
//! most target sites are Chinese web fiction). Decoding substitutes U+FFFD
//! for malformed sequences and never fails.

use encoding_rs::{Encoding, GBK};
use novelreader_shared::{NovelReaderError, Result};
use tracing::debug;

/// Fallback used when nothing better is known.
pub const DEFAULT_FALLBACK: &Encoding = GBK;

/// Resolve a WHATWG encoding label (e.g. `"gbk"`, `"big5"`, `"shift_jis"`).
pub fn encoding_for_label(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| {
        NovelReaderError::validation(format!("unknown encoding label '{label}'"))
    })
}

/// Pick the encoding for `bytes`, using `fallback` when detection is not confident.
pub fn detect(bytes: &[u8], fallback: &'static Encoding) -> &'static Encoding {
    if let Some((encoding, _bom_len)) = Encoding::for_bom(bytes) {
        return encoding;
    }

    if bytes.is_ascii() {
        return fallback;
    }

    if std::str::from_utf8(bytes).is_ok() {
        return encoding_rs::UTF_8;
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(bytes, true);
    let (guess, confident) = detector.guess_assess(None, false);
    if confident {
        guess
    } else {
        fallback
    }
}

/// Decode `bytes` with the default GBK fallback.
pub fn decode(bytes: &[u8]) -> String {
    decode_with_fallback(bytes, DEFAULT_FALLBACK)
}

/// Decode `bytes`, falling back to `fallback` when detection is unsure.
pub fn decode_with_fallback(bytes: &[u8], fallback: &'static Encoding) -> String {
    let encoding = detect(bytes, fallback);
    let (text, used, malformed) = encoding.decode(bytes);
    debug!(
        encoding = used.name(),
        bytes = bytes.len(),
        malformed,
        "decoded page"
    );
    text.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SAMPLE: &str = "第一章 风起青萍之末。少年站在山门之前，望着云海翻涌，心中暗暗发誓，\
        此生定要踏上那九天之巅，看一看传说中的仙人究竟是何模样。";

    #[test]
    fn utf8_is_detected() {
        let text = decode(SAMPLE.as_bytes());
        assert_eq!(text, SAMPLE);
        assert_eq!(detect(SAMPLE.as_bytes(), DEFAULT_FALLBACK), encoding_rs::UTF_8);
    }

    #[test]
    fn gbk_bytes_decode() {
        let (bytes, _, unmappable) = GBK.encode(SAMPLE);
        assert!(!unmappable);
        assert_eq!(decode(&bytes), SAMPLE);
    }

    #[test]
    fn utf8_bom_wins() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("章节".as_bytes());
        assert_eq!(detect(&bytes, DEFAULT_FALLBACK), encoding_rs::UTF_8);
        assert_eq!(decode(&bytes), "章节");
    }

    #[test]
    fn ascii_uses_fallback() {
        assert_eq!(detect(b"<html></html>", DEFAULT_FALLBACK), GBK);
        assert_eq!(decode(b"<p>hello</p>"), "<p>hello</p>");
    }

    #[test]
    fn malformed_bytes_do_not_fail() {
        let text = decode(&[0xFF, 0xFE, 0x81, 0x00, 0xC3]);
        assert!(!text.is_empty());
    }

    #[test]
    fn labels_resolve() {
        assert_eq!(encoding_for_label("GBK").unwrap(), GBK);
        assert_eq!(encoding_for_label(" big5 ").unwrap(), encoding_rs::BIG5);
        assert!(encoding_for_label("klingon").is_err());
    }

    proptest! {
        #[test]
        fn decode_is_total(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
            let first = decode(&bytes);
            let second = decode(&bytes);
            prop_assert_eq!(first, second);
        }
    }
}
