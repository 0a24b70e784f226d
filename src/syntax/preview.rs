//! Styled HTML fragment of a few blocks
//!
//! Reads the paints already stored for the blocks; nothing is matched again.

use super::document::{BlockId, Document};
use super::graph::ContextGraph;
use super::highlighter::segments;
use super::theme::StyleResolver;

/// Render blocks around the one containing `position` as a `<pre>` element.
///
/// The window holds `block_count` blocks and starts `block_count / 2`
/// blocks above the position, clamped to the document.
pub(crate) fn render<R>(
    document: &Document,
    graph: Option<&ContextGraph>,
    position: usize,
    block_count: usize,
    font: &str,
    resolver: &R,
) -> String
where
    R: StyleResolver + ?Sized,
{
    let center = document.block_at(position).0;
    let first = center.saturating_sub(block_count / 2);
    let last = (first + block_count).min(document.len());

    let mut html = format!("<pre style=\"font-family:{};\">", escape(font));
    for index in first..last {
        if index > first {
            html.push('\n');
        }
        let block = BlockId(index);
        let text = document.text(block).unwrap_or_default();
        for segment in segments(text, document.paints(block)) {
            let css = match (graph, segment.style) {
                (Some(graph), Some(style)) => resolver.resolve(graph, style).css(),
                _ => String::new(),
            };
            if css.is_empty() {
                html.push_str(&escape(segment.text));
            } else {
                html.push_str(&format!("<span style=\"{}\">{}</span>", css, escape(segment.text)));
            }
        }
    }
    html.push_str("</pre>");
    html
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::syntax::document::Document;
    use crate::syntax::highlighter::Highlighter;
    use crate::syntax::loader::GrammarLoader;
    use crate::syntax::source::MemorySource;
    use crate::syntax::theme::Theme;

    const GRAMMAR: &str = r#"<language id="t">
      <styles><style id="keyword" map-to="def:keyword"/></styles>
      <definitions>
        <context id="kw" style-ref="keyword"><keyword>fn</keyword></context>
        <context id="t"><include><context ref="kw"/></include></context>
      </definitions>
    </language>"#;

    fn document(text: &str) -> Document {
        let source = MemorySource::new().with("t", GRAMMAR);
        let language = GrammarLoader::new(&source).into_language("t").unwrap();
        Document::with_highlighter(text, Highlighter::new(Arc::new(language)))
    }

    #[test]
    fn test_fragment_is_styled_and_escaped() {
        let doc = document("fn a<b>()");
        let html = doc.render_preview_fragment(0, 1, "Mono", &Theme::builtin());
        assert_eq!(
            html,
            "<pre style=\"font-family:Mono;\">\
             <span style=\"color:#aa00aa;font-weight:bold;\">fn</span> a&lt;b&gt;()</pre>"
        );
    }

    #[test]
    fn test_window_around_position() {
        let doc = document("l0\nl1\nl2\nl3\nl4");
        // position 7 is in block 2; four blocks starting two above it
        let html = doc.render_preview_fragment(7, 4, "Mono", &Theme::new());
        assert_eq!(html, "<pre style=\"font-family:Mono;\">l0\nl1\nl2\nl3</pre>");

        let html = doc.render_preview_fragment(13, 3, "Mono", &Theme::new());
        assert_eq!(html, "<pre style=\"font-family:Mono;\">l3\nl4</pre>");
    }

    #[test]
    fn test_without_language() {
        let doc = Document::new("<x>");
        let html = doc.render_preview_fragment(0, 2, "Sans", &Theme::builtin());
        assert_eq!(html, "<pre style=\"font-family:Sans;\">&lt;x&gt;</pre>");
    }
}
