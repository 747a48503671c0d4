//! Heuristic chapter extraction.
//!
//! Novel sites share no markup convention, so the extractor leans on a few
//! structural regularities instead:
//! - the real chapter heading is the *last* `<h1>` in the body;
//! - the chapter text is the longest leaf `<div>` that holds `<p>` or `<br>`;
//! - navigation links are recognised by their visible label.

use std::sync::LazyLock;

use novelreader_shared::{
    ChapterRecord, NavLabels, UNKNOWN_CHAPTER, UNKNOWN_CHAPTER_NUMBER,
};
use regex::Regex;
use tracing::{debug, instrument};
use url::Url;

use crate::dom::DomNode;

/// Container tag whose leaves are body candidates.
const CONTAINER_TAG: &str = "div";

/// Descendants that mark a container as holding running text.
const TEXT_MARKERS: [&str; 2] = ["p", "br"];

/// Extract a [`ChapterRecord`] from a parsed page.
///
/// `root` is the document element; `source_url` resolves relative links.
/// Missing pieces degrade to sentinels, never to errors.
#[instrument(skip_all, fields(url = %source_url))]
pub fn extract_chapter<N: DomNode>(root: &N, source_url: &Url, labels: &NavLabels) -> ChapterRecord {
    let title = extract_title(root);
    let chapter_number = chapter_number(&title);
    let content = normalize_whitespace(&longest_leaf_text(root));
    let body = ChapterRecord::wrap_body(&title, &content);
    let links = scan_nav_links(root, source_url, labels);

    let book_title = links
        .toc_href
        .as_deref()
        .and_then(|href| book_title_for_href(root, href));

    debug!(
        %title,
        %chapter_number,
        content_chars = content.chars().count(),
        prev = links.prev.is_some(),
        next = links.next.is_some(),
        toc = links.toc.is_some(),
        book_title = book_title.as_deref().unwrap_or(""),
        "extracted chapter"
    );

    ChapterRecord {
        source_url: source_url.clone(),
        title,
        chapter_number,
        body,
        prev_url: links.prev,
        next_url: links.next,
        toc_url: links.toc,
        book_title,
    }
}

// ---------------------------------------------------------------------------
// Title and chapter number
// ---------------------------------------------------------------------------

/// Text of the last `<h1>` under `<body>` (or the whole document).
fn extract_title<N: DomNode>(root: &N) -> String {
    let scope = root
        .find_all("body")
        .into_iter()
        .next()
        .unwrap_or_else(|| root.clone());

    scope
        .find_all("h1")
        .last()
        .map(|h| h.text().trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNKNOWN_CHAPTER.to_string())
}

/// Numeral between `第` and `章`/`节`, kept as written (CJK numerals are not converted).
pub fn chapter_number(title: &str) -> String {
    static CHAPTER_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"第([零一二三四五六七八九十百千万亿\d]+)(?:章|节)").expect("valid regex")
    });

    CHAPTER_RE
        .captures(title)
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(|| UNKNOWN_CHAPTER_NUMBER.to_string())
}

// ---------------------------------------------------------------------------
// Body
// ---------------------------------------------------------------------------

/// Trimmed text of the longest leaf container holding a text marker.
///
/// Strict `>` keeps the first candidate on ties.
fn longest_leaf_text<N: DomNode>(root: &N) -> String {
    let mut best = String::new();
    let mut best_len = 0usize;

    for candidate in root.find_all(CONTAINER_TAG) {
        if candidate.has_descendant(CONTAINER_TAG) {
            continue;
        }
        if !TEXT_MARKERS.iter().any(|m| candidate.has_descendant(m)) {
            continue;
        }

        let text = candidate.text();
        let trimmed = text.trim();
        let len = trimmed.chars().count();
        if len > best_len {
            best_len = len;
            best = trimmed.to_string();
        }
    }

    best
}

/// Collapse whitespace runs (newlines, full-width spaces, NBSP) to one space.
pub fn normalize_whitespace(text: &str) -> String {
    static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

    WS_RE.replace_all(text, " ").trim().to_string()
}

// ---------------------------------------------------------------------------
// Navigation links
// ---------------------------------------------------------------------------

/// Result of the single anchor pass.
#[derive(Debug, Default)]
struct NavLinks {
    prev: Option<Url>,
    next: Option<Url>,
    toc: Option<Url>,
    /// Raw `href` that produced `toc`, used for book-title recovery and the
    /// duplicate-next guard.
    toc_href: Option<String>,
}

/// Classify anchors by label in document order; first match per kind wins.
fn scan_nav_links<N: DomNode>(root: &N, source_url: &Url, labels: &NavLabels) -> NavLinks {
    let mut links = NavLinks::default();

    for anchor in root.find_all("a") {
        let text = anchor.text();
        let text = text.trim();
        let Some(href) = anchor.attr("href").filter(|h| !h.trim().is_empty()) else {
            continue;
        };

        if links.prev.is_none() && labels.is_prev(text) {
            links.prev = resolve_href(source_url, &href);
        }

        if links.toc.is_none() && labels.is_toc(text) {
            if let Some(url) = resolve_href(source_url, &href) {
                links.toc = Some(url);
                links.toc_href = Some(href.clone());
            }
        }

        // Catalogue-style pages label the TOC link "next page" too.
        if links.next.is_none()
            && labels.is_next(text)
            && links.toc_href.as_deref() != Some(href.as_str())
        {
            links.next = resolve_href(source_url, &href);
        }
    }

    links
}

/// Visible text of the first anchor whose raw `href` equals `toc_href`.
fn book_title_for_href<N: DomNode>(root: &N, toc_href: &str) -> Option<String> {
    root.find_all("a")
        .into_iter()
        .find(|a| a.attr("href").as_deref() == Some(toc_href))
        .map(|a| a.text().trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Resolve `href` against the page URL, dropping unusable targets.
fn resolve_href(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.starts_with('#') || href.starts_with("javascript:") || href.starts_with("mailto:") {
        return None;
    }

    match base.join(href) {
        Ok(url) => Some(url),
        Err(e) => {
            debug!(href, error = %e, "unresolvable navigation link");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ParsedPage;
    use proptest::prelude::*;

    fn base() -> Url {
        Url::parse("https://novel.example.com/book_1/1002.html").unwrap()
    }

    fn extract(html: &str) -> ChapterRecord {
        let page = ParsedPage::parse(html);
        extract_chapter(&page.root(), &base(), &NavLabels::default())
    }

    #[test]
    fn last_heading_is_the_title() {
        let record = extract(
            "<html><body><h1>站点名</h1><div><h1>第十二章 夜雨</h1></div></body></html>",
        );
        assert_eq!(record.title, "第十二章 夜雨");
        assert_eq!(record.chapter_number, "十二");
    }

    #[test]
    fn missing_heading_uses_sentinels() {
        let record = extract("<html><body><div><p>文字</p></div></body></html>");
        assert_eq!(record.title, UNKNOWN_CHAPTER);
        assert_eq!(record.chapter_number, UNKNOWN_CHAPTER_NUMBER);
        assert_eq!(record.body, "【未知章节】文字【未知章节】");
    }

    #[test]
    fn chapter_numbers() {
        assert_eq!(chapter_number("第123章 开端"), "123");
        assert_eq!(chapter_number("第三百零五节"), "三百零五");
        assert_eq!(chapter_number("序章"), UNKNOWN_CHAPTER_NUMBER);
        assert_eq!(chapter_number("第五卷"), UNKNOWN_CHAPTER_NUMBER);
    }

    #[test]
    fn longest_leaf_block_wins() {
        let long = "长".repeat(340);
        let html = format!(
            "<html><body>\
             <div id=\"nav\"><p>{short}</p></div>\
             <div id=\"content\">{long}<br>{long}</div>\
             <div id=\"wrapper\"><div><span>{huge}</span></div></div>\
             </body></html>",
            short = "短".repeat(12),
            huge = "无".repeat(1000),
        );
        let record = extract(&html);
        assert_eq!(record.body, format!("【未知章节】{long}{long}【未知章节】"));
    }

    #[test]
    fn twelve_versus_three_hundred_forty() {
        let html = format!(
            "<html><body><div><p>{}</p></div><div><p>{}</p></div></body></html>",
            "a".repeat(12),
            "b".repeat(340)
        );
        let record = extract(&html);
        assert!(record.body.contains(&"b".repeat(340)));
        assert!(!record.body.contains('a'));
    }

    #[test]
    fn ties_keep_first_candidate() {
        let record = extract("<html><body><div><p>AAAA</p></div><div><p>BBBB</p></div></body></html>");
        assert!(record.body.contains("AAAA"));
    }

    #[test]
    fn no_leaf_block_yields_wrapped_empty_body() {
        let record = extract("<html><body><h1>第1章</h1><div><span>no markers</span></div></body></html>");
        assert_eq!(record.body, "【第1章】【第1章】");
    }

    #[test]
    fn whitespace_collapses() {
        assert_eq!(normalize_whitespace("  a\n\n\tb\u{3000}\u{3000}c \u{a0} "), "a b c");
    }

    #[test]
    fn navigation_links_resolve() {
        let record = extract(
            r#"<html><body>
            <a href="/book_1/">返回书页</a>
            <a href="1001.html">上一章</a>
            <a href="/book_1/">章节目录</a>
            <a href="1003.html">下一章</a>
            <a href="0999.html">上一页</a>
            </body></html>"#,
        );
        assert_eq!(
            record.prev_url.as_ref().map(Url::as_str),
            Some("https://novel.example.com/book_1/1001.html")
        );
        assert_eq!(
            record.next_url.as_ref().map(Url::as_str),
            Some("https://novel.example.com/book_1/1003.html")
        );
        assert_eq!(
            record.toc_url.as_ref().map(Url::as_str),
            Some("https://novel.example.com/book_1/")
        );
        assert_eq!(record.book_title.as_deref(), Some("返回书页"));
    }

    #[test]
    fn next_label_pointing_at_toc_is_ignored() {
        let record = extract(
            r#"<html><body>
            <a href="/book_1/">目录</a>
            <a href="/book_1/">下一页</a>
            <a href="1003.html">下一章</a>
            </body></html>"#,
        );
        assert_eq!(
            record.next_url.as_ref().map(Url::as_str),
            Some("https://novel.example.com/book_1/1003.html")
        );
    }

    #[test]
    fn first_and_last_chapter_signals() {
        let first = extract(r#"<html><body><a href="2.html">下一章</a></body></html>"#);
        assert!(first.is_first_chapter());
        assert!(!first.is_last_chapter());

        let last = extract(r#"<html><body><a href="1.html">上一章</a></body></html>"#);
        assert!(last.is_last_chapter());
        assert!(!last.is_first_chapter());
    }

    #[test]
    fn anchors_without_usable_href_are_skipped() {
        let record = extract(
            r##"<html><body>
            <a>上一章</a>
            <a href="">上一章</a>
            <a href="#top">上一章</a>
            <a href="1001.html">上一章</a>
            </body></html>"##,
        );
        assert_eq!(
            record.prev_url.as_ref().map(Url::as_str),
            Some("https://novel.example.com/book_1/1001.html")
        );
    }

    #[test]
    fn custom_labels() {
        let labels = NavLabels {
            prev: vec!["Previous Chapter".into()],
            toc: vec!["Table of Contents".into()],
            next: vec!["Next Chapter".into()],
        };
        let page = ParsedPage::parse(
            r#"<html><body><h1>Chapter 7</h1>
            <a href="/toc">Table of Contents</a>
            <a href="/c/6">Previous Chapter</a>
            <a href="/c/8">Next Chapter</a></body></html>"#,
        );
        let record = extract_chapter(&page.root(), &base(), &labels);
        assert_eq!(record.next_url.unwrap().as_str(), "https://novel.example.com/c/8");
        assert_eq!(record.prev_url.unwrap().as_str(), "https://novel.example.com/c/6");
        assert_eq!(record.book_title.as_deref(), Some("Table of Contents"));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn extraction_is_idempotent(
            title in "[a-z第一二三章 ]{0,12}",
            paras in proptest::collection::vec("[a-z \n]{0,40}", 0..5),
        ) {
            let body: String = paras.iter().map(|p| format!("<p>{p}</p>")).collect();
            let html = format!(
                "<html><body><h1>{title}</h1><div>{body}</div><a href=\"2.html\">下一章</a></body></html>"
            );
            let page = ParsedPage::parse(&html);
            let first = extract_chapter(&page.root(), &base(), &NavLabels::default());
            let second = extract_chapter(&page.root(), &base(), &NavLabels::default());
            prop_assert_eq!(first, second);
        }
    }
}
