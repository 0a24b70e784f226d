//! Block storage and re-highlight propagation
//!
//! The engine never decides where block states live. A host implements
//! [`BlockStore`]; [`rehighlight`] drives the highlighter over it, stopping
//! as soon as a block ends in the same state it ended in before the edit.
//! [`Document`] is a plain in-memory host.

use std::ops::Range;

use tracing::debug;

use super::highlighter::{BlockHighlight, Highlighter, Paint};
use super::preview;
use super::state::BlockState;
use super::theme::StyleResolver;

/// Index of a block in its store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub usize);

/// Host-side storage of blocks and their highlighting results
pub trait BlockStore {
    /// Number of blocks
    fn block_count(&self) -> usize;

    /// Text of a block, without its line terminator
    fn block_text(&self, block: BlockId) -> &str;

    /// Offset of the block in the document
    fn block_position(&self, block: BlockId) -> usize;

    /// State stored for a block, `None` if it was never highlighted
    fn block_state(&self, block: BlockId) -> Option<&BlockState>;

    /// Store the result of highlighting a block
    fn set_block_highlight(&mut self, block: BlockId, result: BlockHighlight);
}

/// Highlight blocks from `range.start`. Every block in `range` is
/// highlighted; past it, highlighting stops after the first block whose
/// state token did not change. Returns the number of blocks highlighted.
pub fn rehighlight<S>(store: &mut S, highlighter: &Highlighter, range: Range<usize>) -> usize
where
    S: BlockStore + ?Sized,
{
    let mut index = range.start;
    let mut count = 0;
    while index < store.block_count() {
        let block = BlockId(index);
        let result = {
            let previous = match index {
                0 => None,
                _ => store.block_state(BlockId(index - 1)),
            };
            highlighter.highlight(store.block_text(block), store.block_position(block), previous)
        };
        let unchanged = store.block_state(block).map(BlockState::token) == Some(result.token());
        store.set_block_highlight(block, result);
        count += 1;
        index += 1;
        if unchanged && index >= range.end {
            break;
        }
    }
    debug!(from = range.start, blocks = count, "rehighlighted");
    count
}

#[derive(Debug, Clone, Default)]
struct Block {
    text: String,
    /// Offset of the first byte in the document
    position: usize,
    paints: Vec<Paint>,
    state: Option<BlockState>,
}

impl Block {
    fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Default::default()
        }
    }
}

/// Lines of text with their paints and states
#[derive(Debug, Clone)]
pub struct Document {
    blocks: Vec<Block>,
    highlighter: Option<Highlighter>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new("")
    }
}

impl Document {
    /// Split `text` into blocks at line breaks. A document always has at
    /// least one block.
    pub fn new(text: &str) -> Self {
        let mut document = Self {
            blocks: split_lines(text).map(Block::new).collect(),
            highlighter: None,
        };
        document.reposition(0);
        document
    }

    /// Create a document and highlight all of it
    pub fn with_highlighter(text: &str, highlighter: Highlighter) -> Self {
        let mut document = Self::new(text);
        document.set_highlighter(Some(highlighter));
        document
    }

    pub fn highlighter(&self) -> Option<&Highlighter> {
        self.highlighter.as_ref()
    }

    /// Change the language. All previous results are dropped and the whole
    /// document is highlighted again.
    pub fn set_highlighter(&mut self, highlighter: Option<Highlighter>) {
        self.highlighter = highlighter;
        for block in &mut self.blocks {
            block.paints.clear();
            block.state = None;
        }
        let count = self.blocks.len();
        self.rehighlight_range(0..count);
    }

    /// Highlight the whole document again
    pub fn rehighlight(&mut self) -> usize {
        let count = self.blocks.len();
        self.rehighlight_range(0..count)
    }

    fn rehighlight_range(&mut self, range: Range<usize>) -> usize {
        let Some(highlighter) = self.highlighter.clone() else {
            return 0;
        };
        rehighlight(self, &highlighter, range)
    }

    /// Replace the blocks in `range` with `lines`, then re-highlight as far
    /// as the edit reaches. Returns the number of blocks highlighted.
    pub fn replace_blocks(&mut self, range: Range<usize>, lines: &[&str]) -> usize {
        let start = range.start.min(self.blocks.len());
        let end = range.end.clamp(start, self.blocks.len());
        self.blocks
            .splice(start..end, lines.iter().map(|line| Block::new(line)));
        if self.blocks.is_empty() {
            self.blocks.push(Block::new(""));
        }
        self.reposition(start);
        self.rehighlight_range(start..start + lines.len().max(1))
    }

    /// Recompute block positions from block `from` on
    fn reposition(&mut self, from: usize) {
        let from = from.min(self.blocks.len());
        let mut position = match from {
            0 => 0,
            _ => {
                let previous = &self.blocks[from - 1];
                previous.position + previous.text.len() + 1
            }
        };
        for block in &mut self.blocks[from..] {
            block.position = position;
            position += block.text.len() + 1;
        }
    }

    /// Replace the text of one block
    pub fn set_block_text(&mut self, block: BlockId, text: &str) -> usize {
        self.replace_blocks(block.0..block.0 + 1, &[text])
    }

    /// Number of blocks
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether the document is a single empty block
    pub fn is_empty(&self) -> bool {
        self.blocks.len() == 1 && self.blocks[0].text.is_empty()
    }

    /// Text of a block
    pub fn text(&self, block: BlockId) -> Option<&str> {
        self.blocks.get(block.0).map(|b| b.text.as_str())
    }

    /// Paints stored for a block
    pub fn paints(&self, block: BlockId) -> &[Paint] {
        self.blocks.get(block.0).map_or(&[], |b| b.paints.as_slice())
    }

    /// State stored for a block
    pub fn state(&self, block: BlockId) -> Option<&BlockState> {
        self.blocks.get(block.0).and_then(|b| b.state.as_ref())
    }

    /// The block containing document offset `position`; offsets past the
    /// end map to the last block
    pub fn block_at(&self, position: usize) -> BlockId {
        let after = self.blocks.partition_point(|b| b.position + b.text.len() < position);
        BlockId(after.min(self.blocks.len() - 1))
    }

    /// The whole text, blocks joined with line breaks
    pub fn to_text(&self) -> String {
        self.blocks
            .iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// HTML fragment of `block_count` blocks around `position`
    pub fn render_preview_fragment<R>(&self, position: usize, block_count: usize, font: &str, resolver: &R) -> String
    where
        R: StyleResolver + ?Sized,
    {
        let graph = self.highlighter.as_ref().map(|h| h.language().graph());
        preview::render(self, graph, position, block_count, font, resolver)
    }
}

impl BlockStore for Document {
    fn block_count(&self) -> usize {
        self.blocks.len()
    }

    fn block_text(&self, block: BlockId) -> &str {
        &self.blocks[block.0].text
    }

    fn block_position(&self, block: BlockId) -> usize {
        self.blocks[block.0].position
    }

    fn block_state(&self, block: BlockId) -> Option<&BlockState> {
        self.blocks.get(block.0).and_then(|b| b.state.as_ref())
    }

    fn set_block_highlight(&mut self, block: BlockId, result: BlockHighlight) {
        let block = &mut self.blocks[block.0];
        block.paints = result.paints;
        block.state = Some(result.state);
    }
}

/// Lines of `text`, with `\r\n` treated like `\n`
fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n').map(|line| line.strip_suffix('\r').unwrap_or(line))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::syntax::loader::GrammarLoader;
    use crate::syntax::source::MemorySource;

    const GRAMMAR: &str = r#"<language id="t">
      <styles><style id="comment" map-to="def:comment"/></styles>
      <definitions>
        <context id="comment" style-ref="comment">
          <start>/\*</start>
          <end>\*/</end>
        </context>
        <context id="t"><include><context ref="comment"/></include></context>
      </definitions>
    </language>"#;

    fn highlighter() -> Highlighter {
        let source = MemorySource::new().with("t", GRAMMAR);
        let language = GrammarLoader::new(&source).into_language("t").unwrap();
        Highlighter::new(Arc::new(language))
    }

    fn commented(document: &Document) -> Vec<bool> {
        (0..document.len())
            .map(|i| !document.paints(BlockId(i)).is_empty())
            .collect()
    }

    #[test]
    fn test_split_lines() {
        let document = Document::new("a\r\nb\n");
        assert_eq!(document.len(), 3);
        assert_eq!(document.text(BlockId(0)), Some("a"));
        assert_eq!(document.text(BlockId(2)), Some(""));
        assert_eq!(document.to_text(), "a\nb\n");
    }

    #[test]
    fn test_positions() {
        let document = Document::new("ab\ncde\nf");
        assert_eq!(document.block_position(BlockId(0)), 0);
        assert_eq!(document.block_position(BlockId(1)), 3);
        assert_eq!(document.block_position(BlockId(2)), 7);
        assert_eq!(document.block_at(0), BlockId(0));
        assert_eq!(document.block_at(2), BlockId(0));
        assert_eq!(document.block_at(3), BlockId(1));
        assert_eq!(document.block_at(8), BlockId(2));
        assert_eq!(document.block_at(100), BlockId(2));
    }

    #[test]
    fn test_positions_follow_edits() {
        let mut document = Document::new("ab\ncde\nf\ng");
        document.replace_blocks(1..2, &["x", "yz"]);
        assert_eq!(document.to_text(), "ab\nx\nyz\nf\ng");
        let positions: Vec<usize> = (0..document.len())
            .map(|i| document.block_position(BlockId(i)))
            .collect();
        assert_eq!(positions, vec![0, 3, 5, 8, 10]);

        document.replace_blocks(0..2, &[]);
        assert_eq!(document.block_position(BlockId(0)), 0);
        assert_eq!(document.block_position(BlockId(2)), 5);
        assert_eq!(document.block_at(6), BlockId(2));
    }

    #[test]
    fn test_initial_highlight() {
        let document = Document::with_highlighter("a\n/* b\nc\nd */ e\nf", highlighter());
        assert_eq!(commented(&document), vec![false, true, true, true, false]);
        assert!(document.state(BlockId(4)).unwrap().is_root_only());
    }

    #[test]
    fn test_edit_propagates_until_state_settles() {
        let mut document = Document::with_highlighter("a\nb\nc\nd */\ne\nf", highlighter());
        assert_eq!(commented(&document), vec![false; 6]);

        // opening a comment re-highlights down to the block that closes it
        let count = document.set_block_text(BlockId(1), "b /*");
        assert_eq!(count, 3);
        assert_eq!(commented(&document), vec![false, true, true, true, false, false]);

        // an edit that keeps the state stops at the next block
        let count = document.set_block_text(BlockId(2), "still comment");
        assert_eq!(count, 2);
        assert_eq!(commented(&document), vec![false, true, true, true, false, false]);
    }

    #[test]
    fn test_replace_blocks_insert_and_delete() {
        let mut document = Document::with_highlighter("/*\nx\n*/\ny", highlighter());
        assert_eq!(commented(&document), vec![true, true, true, false]);

        document.replace_blocks(0..1, &[]);
        assert_eq!(document.len(), 3);
        assert_eq!(commented(&document), vec![false, false, false]);

        document.replace_blocks(1..1, &["/* again", "inside"]);
        assert_eq!(document.len(), 5);
        assert_eq!(commented(&document), vec![false, true, true, true, false]);
    }

    #[test]
    fn test_language_change_rehighlights() {
        let mut document = Document::new("/* x */");
        assert!(document.paints(BlockId(0)).is_empty());
        document.set_highlighter(Some(highlighter()));
        assert_eq!(document.paints(BlockId(0)).len(), 1);
        document.set_highlighter(None);
        assert!(document.paints(BlockId(0)).is_empty());
        assert!(document.state(BlockId(0)).is_none());
    }
}
