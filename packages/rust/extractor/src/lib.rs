//! Chapter fetching and content extraction.
//!
//! This crate provides:
//! - [`encoding`]: charset detection and decoding of raw response bytes
//! - [`dom`]: the [`DomNode`] query surface and its `scraper` implementation
//! - [`chapter`]: heuristics turning a parsed page into a [`ChapterRecord`]
//! - [`client`]: the HTTP [`ChapterFetcher`]
//!
//! [`ChapterRecord`]: novelreader_shared::ChapterRecord

pub mod chapter;
pub mod client;
pub mod dom;
pub mod encoding;

pub use chapter::{chapter_number, extract_chapter, normalize_whitespace};
pub use client::{ChapterFetcher, parse_chapter};
pub use dom::{DomNode, ParsedPage};
pub use encoding::{DEFAULT_FALLBACK, decode, decode_with_fallback, detect, encoding_for_label};

#[cfg(test)]
mod tests {
    use super::*;
    use novelreader_shared::{NavLabels, UNKNOWN_CHAPTER};
    use url::Url;

    fn load_fixture(name: &str) -> String {
        let path = format!("../../../fixtures/html/{name}");
        std::fs::read_to_string(&path).unwrap_or_else(|_| panic!("missing fixture: {path}"))
    }

    fn extract_fixture(name: &str, url: &str) -> novelreader_shared::ChapterRecord {
        let html = load_fixture(name);
        let page = ParsedPage::parse(&html);
        extract_chapter(&page.root(), &Url::parse(url).unwrap(), &NavLabels::default())
    }

    // -----------------------------------------------------------------------
    // Full-page extraction
    // -----------------------------------------------------------------------

    #[test]
    fn chapter_page_extracts_everything() {
        let record = extract_fixture(
            "chapter.html",
            "https://www.xblqugex.cc/book_41834250/34070832.html",
        );

        assert_eq!(record.title, "第十二章 夜雨孤灯");
        assert_eq!(record.chapter_number, "十二");
        assert!(record.body.starts_with("【第十二章 夜雨孤灯】夜色如墨，细雨无声地落在青石板上。 少年推开"));
        assert!(record.body.ends_with("眼中闪过一丝坚定。【第十二章 夜雨孤灯】"));
        // Footer and search blocks are shorter and must not win.
        assert!(!record.body.contains("转载"));
        assert!(!record.body.contains('\n'));
        assert!(!record.body.contains('\u{a0}'));

        assert_eq!(
            record.prev_url.as_ref().map(Url::as_str),
            Some("https://www.xblqugex.cc/book_41834250/34070831.html")
        );
        assert_eq!(
            record.next_url.as_ref().map(Url::as_str),
            Some("https://www.xblqugex.cc/book_41834250/34070833.html")
        );
        assert_eq!(
            record.toc_url.as_ref().map(Url::as_str),
            Some("https://www.xblqugex.cc/book_41834250/")
        );
        assert_eq!(record.book_title.as_deref(), Some("青云志"));
    }

    #[test]
    fn paged_chapter_guards_duplicate_next_link() {
        let record = extract_fixture("paged_chapter.html", "https://m.example.com/b/9/3.html");

        assert_eq!(record.chapter_number, "3");
        assert_eq!(
            record.toc_url.as_ref().map(Url::as_str),
            Some("https://m.example.com/b/9/")
        );
        assert_eq!(
            record.next_url.as_ref().map(Url::as_str),
            Some("https://m.example.com/b/9/3_2.html")
        );
        assert!(record.is_first_chapter());
        assert_eq!(record.book_title.as_deref(), Some("万古神帝"));
        assert!(record.body.contains("山门巍峨，云雾缭绕。 外门弟子"));
    }

    #[test]
    fn error_page_degrades_to_sentinels() {
        let record = extract_fixture("empty_page.html", "https://m.example.com/b/9/404.html");

        assert_eq!(record.title, UNKNOWN_CHAPTER);
        assert_eq!(record.body, "【未知章节】【未知章节】");
        assert!(record.prev_url.is_none());
        assert!(record.next_url.is_none());
        assert!(record.toc_url.is_none());
        assert!(record.book_title.is_none());
    }

    #[test]
    fn record_json_omits_missing_links() {
        let record = extract_fixture("empty_page.html", "https://m.example.com/b/9/404.html");
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["title"], UNKNOWN_CHAPTER);
        assert_eq!(json["source_url"], "https://m.example.com/b/9/404.html");
        assert!(json.get("next_url").is_none());
        assert!(json.get("book_title").is_none());
    }

    #[test]
    fn gbk_fixture_roundtrips_through_bytes() {
        let html = load_fixture("chapter.html").replace("charset=\"utf-8\"", "charset=\"gbk\"");
        let (bytes, _, unmappable) = encoding_rs::GBK.encode(&html);
        assert!(!unmappable);

        let url = Url::parse("https://www.xblqugex.cc/book_41834250/34070832.html").unwrap();
        let record = parse_chapter(&bytes, &url, DEFAULT_FALLBACK, &NavLabels::default());
        assert_eq!(record.title, "第十二章 夜雨孤灯");
        assert_eq!(record.book_title.as_deref(), Some("青云志"));
    }
}
