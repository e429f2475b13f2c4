//! A CommonMark + GFM Markdown parser producing a document tree with
//! source positions on every item.
//!
//! Beyond CommonMark and the GFM extensions (tables, task lists,
//! strikethrough, autolinks), `mdtree` parses LaTeX math (`$…$`,
//! `$$…$$` and ```` ```math ```` fences), ATX heading ids (`{#label}`),
//! footnotes and YAML front matter, and can optionally follow relative
//! links between Markdown files into a single multi-file document with
//! per-file anchors and page breaks.
//!
//! ```
//! use mdtree::{markdown_to_html, Options};
//!
//! assert_eq!(
//!     markdown_to_html("Hello, **世界**!", &Options::default()),
//!     "<p>Hello, <strong>世界</strong>!</p>\n"
//! );
//! ```
//!
//! For structural work, parse to a [`nodes::Document`] instead:
//!
//! ```
//! use mdtree::{parse_document, nodes::Item, Options};
//!
//! let doc = parse_document("# Title", &Options::default());
//!
//! // The first item of every parsed file is its anchor.
//! assert!(matches!(doc.borrow().items[0], Item::Anchor(_)));
//! assert!(matches!(doc.borrow().items[1], Item::Heading(_)));
//! ```

#![warn(missing_docs)]
#![allow(clippy::too_many_arguments)]

pub mod context;
mod ctype;
mod entity;
pub mod html;
pub mod line;
pub mod nodes;
pub mod parser;
pub mod stream;
pub mod strings;
pub mod visitor;

#[cfg(test)]
mod tests;

pub use html::{render_document, render_document_with_ids, HtmlRenderer, IdsMap};
pub use parser::{Options, ParseOptions, Parser, PipelinePreset, RenderOptions};

use nodes::{Document, NodeRef};

/// Parse in-memory Markdown to a document tree.
pub fn parse_document(text: &str, options: &Options) -> NodeRef<Document> {
    Parser::new(options.clone()).parse(text, "", "")
}

/// Render Markdown to HTML.
pub fn markdown_to_html(text: &str, options: &Options) -> String {
    let mut options = options.clone();
    options.render.wrapped_in_article = false;

    let doc = parse_document(text, &options);

    render_document(&doc, &options)
}
