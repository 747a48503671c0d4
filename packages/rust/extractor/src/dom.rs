//! Minimal DOM query surface used by the chapter extractor.
//!
//! The extractor only needs descendant search by tag, text and attributes, so
//! it is written against [`DomNode`]; [`ParsedPage`] provides the `scraper`
//! implementation.

use scraper::{ElementRef, Html};

/// Query capabilities the extractor relies on.
pub trait DomNode: Clone {
    /// Lower-case tag name of this element.
    fn tag(&self) -> String;

    /// All descendant elements named `tag`, in document order (self excluded).
    fn find_all(&self, tag: &str) -> Vec<Self>;

    /// Concatenated text of this element and all descendants.
    fn text(&self) -> String;

    /// Attribute value, if present.
    fn attr(&self, name: &str) -> Option<String>;

    /// Whether any descendant is named `tag`.
    fn has_descendant(&self, tag: &str) -> bool {
        !self.find_all(tag).is_empty()
    }
}

impl DomNode for ElementRef<'_> {
    fn tag(&self) -> String {
        self.value().name().to_ascii_lowercase()
    }

    fn find_all(&self, tag: &str) -> Vec<Self> {
        self.descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .filter(|el| el.value().name().eq_ignore_ascii_case(tag))
            .collect()
    }

    fn text(&self) -> String {
        ElementRef::text(self).collect()
    }

    fn attr(&self, name: &str) -> Option<String> {
        self.value().attr(name).map(str::to_string)
    }

    fn has_descendant(&self, tag: &str) -> bool {
        self.descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .any(|el| el.value().name().eq_ignore_ascii_case(tag))
    }
}

/// A decoded page parsed into a `scraper` tree.
pub struct ParsedPage {
    html: Html,
}

impl ParsedPage {
    /// Parse a full HTML document. Parsing is lenient and never fails.
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    /// The `<html>` element.
    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }
}
