//! # gb-sanitize-strict
//!
//! Strict implementation of `Sanitizer`.
//! No element or attribute survives: only the text a browser would render is
//! kept, re-escaped so entity-encoded markup cannot come back to life.

use gb_core::traits::Sanitizer;
use scraper::{ElementRef, Html, Node};

/// Elements whose whole subtree is dropped rather than flattened to text.
const SKIP_TAGS: &[&str] = &["script", "style", "noscript", "template", "iframe", "object", "svg"];

#[derive(Debug, Default, Clone, Copy)]
pub struct StrictSanitizer;

impl StrictSanitizer {
    pub fn new() -> Self {
        Self
    }
}

impl Sanitizer for StrictSanitizer {
    fn sanitize_field(&self, raw: &str) -> String {
        let fragment = Html::parse_fragment(raw);
        let mut text = String::with_capacity(raw.len());
        collect_text(fragment.root_element(), &mut text);
        html_escape::encode_text(text.trim()).into_owned()
    }
}

fn collect_text(element: ElementRef, out: &mut String) {
    if SKIP_TAGS.contains(&element.value().name()) {
        return;
    }

    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, out);
                }
            }
            _ => {}
        }
    }
}
