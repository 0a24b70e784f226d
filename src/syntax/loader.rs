//! Language definition loader
//!
//! Compiles `.lang` XML into a [`ContextGraph`]. References to other
//! languages (`ref="def:string"`, `map-to="def:comment"`) load those
//! languages into the same graph on demand. A language that is already being
//! loaded is never entered again, so mutually referencing languages see each
//! other's partial definitions instead of recursing.

use std::collections::{HashMap, HashSet};

use roxmltree::Node;
use tracing::{debug, warn};

use super::context::{
    ContainerContext, Context, ContextFlags, ContextId, ContextKind, ContextRef, KeywordContext,
    SimpleContext, StyleId, SubPattern, SubPatternPosition,
};
use super::graph::{language_of, qualify, ContextGraph, Style};
use super::language::Language;
use super::metadata::LanguageMetadata;
use super::pattern::{GroupRef, Pattern};
use super::regex_table::RegexTable;
use super::source::DefinitionSource;
use super::tokens::DefaultStyle;
use crate::error::{Error, Result};

/// Default keyword delimiters, `\%[` and `\%]` after resolution
const WORD_BOUNDARY: &str = r"\b";

/// Builds the graph of one language and everything it references
pub struct GrammarLoader<'s> {
    source: &'s dyn DefinitionSource,
    graph: ContextGraph,
    loading: Vec<String>,
    loaded: HashSet<String>,
    metadata: HashMap<String, LanguageMetadata>,
}

/// Shape of a context, decided by its children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Keyword,
    Simple,
    Container,
}

impl<'s> GrammarLoader<'s> {
    /// Create a loader with the `def:*` style ids already known, so grammars
    /// can map onto them without loading `def.lang`
    pub fn new(source: &'s dyn DefinitionSource) -> Self {
        let mut graph = ContextGraph::new();
        for style in DefaultStyle::ALL {
            graph.add_style(Style {
                name: Some(style.name().to_string()),
                ..Style::new(style.id())
            });
        }
        Self {
            source,
            graph,
            loading: Vec::new(),
            loaded: HashSet::new(),
            metadata: HashMap::new(),
        }
    }

    /// Load a language and return a handle to its root context, or `None`
    /// if the definition is missing or unusable
    pub fn load_language(&mut self, id: &str) -> Option<ContextRef> {
        self.load(id);
        self.root_of(id)
    }

    /// Load a language and hand over the compiled graph
    pub fn into_language(mut self, id: &str) -> Option<Language> {
        let root = self.load_language(id)?;
        let metadata = self.metadata.remove(id).unwrap_or_else(|| LanguageMetadata {
            id: id.to_string(),
            name: id.to_string(),
            ..Default::default()
        });
        Some(Language::new(metadata, self.graph, root))
    }

    /// The graph built so far
    pub fn graph(&self) -> &ContextGraph {
        &self.graph
    }

    /// Metadata of a loaded language
    pub fn metadata(&self, id: &str) -> Option<&LanguageMetadata> {
        self.metadata.get(id)
    }

    fn root_of(&self, id: &str) -> Option<ContextRef> {
        self.graph
            .context_id(&format!("{}:{}", id, id))
            .map(ContextRef::new)
    }

    fn load(&mut self, id: &str) {
        if self.loaded.contains(id) {
            return;
        }
        if self.loading.iter().any(|l| l == id) {
            debug!(language = id, "language already loading, using partial definition");
            return;
        }

        debug!(language = id, "loading language");
        self.loading.push(id.to_string());
        let result = self.try_load(id);
        self.loading.pop();
        self.loaded.insert(id.to_string());

        if let Err(err) = result {
            warn!(language = id, error = %err, "failed to load language");
        }
    }

    fn try_load(&mut self, id: &str) -> Result<()> {
        let text = self
            .source
            .read(id)
            .ok_or_else(|| Error::LanguageNotFound(id.to_string()))?;
        self.parse_document(id, &text)
    }

    fn parse_document(&mut self, id: &str, text: &str) -> Result<()> {
        let document = roxmltree::Document::parse(text)?;
        let language = document.root_element();
        if !language.has_tag_name("language") {
            return Err(Error::NotALanguage(language.tag_name().name().to_string()));
        }

        let mut metadata = LanguageMetadata::from_element(language);
        if metadata.id != id {
            if !metadata.id.is_empty() {
                warn!(language = id, declared = %metadata.id, "language id differs from its file name");
            }
            metadata.id = id.to_string();
        }
        self.metadata.insert(id.to_string(), metadata);

        // Macros are private to the file that defines them
        let mut regexes = RegexTable::new();
        for section in language.children().filter(Node::is_element) {
            match section.tag_name().name() {
                "metadata" => {}
                "styles" => {
                    for style in section.children().filter(|n| n.has_tag_name("style")) {
                        self.parse_style(id, style);
                    }
                }
                "definitions" => {
                    for definition in section.children().filter(Node::is_element) {
                        match definition.tag_name().name() {
                            "define-regex" => match definition.attribute("id") {
                                Some(name) => regexes.define(name, &element_text(definition)),
                                None => warn!(language = id, "define-regex without id"),
                            },
                            "context" => {
                                self.parse_context(id, definition, &regexes);
                            }
                            other => debug!(language = id, element = other, "ignoring definition"),
                        }
                    }
                }
                other => debug!(language = id, element = other, "ignoring section"),
            }
        }
        Ok(())
    }

    fn parse_style(&mut self, language: &str, node: Node<'_, '_>) {
        let Some(id) = node.attribute("id") else {
            warn!(language, "style without id");
            return;
        };

        let map_to = match node.attribute("map-to") {
            Some(target) => {
                let resolved = self.resolve_style_name(language, target);
                if resolved.is_none() {
                    debug!(language, style = id, target, "unresolved map-to");
                }
                resolved
            }
            None => None,
        };

        self.graph.add_style(Style {
            id: qualify(language, id),
            name: node
                .attribute("_name")
                .or_else(|| node.attribute("name"))
                .map(str::to_string),
            map_to,
        });
    }

    /// Compile a `<context>` element and return a handle to it. `None` means
    /// the element is an unresolvable reference.
    fn parse_context(
        &mut self,
        language: &str,
        node: Node<'_, '_>,
        regexes: &RegexTable,
    ) -> Option<ContextRef> {
        let id = node.attribute("id").map(|id| qualify(language, id));
        let style = node.attribute("style-ref").and_then(|name| {
            let resolved = self.resolve_style_name(language, name);
            if resolved.is_none() {
                debug!(language, style = name, "unresolved style-ref");
            }
            resolved
        });
        let ignore_style = bool_attribute(node, "ignore-style").unwrap_or(false);

        if let Some(target) = node.attribute("ref") {
            let Some(context) = self.resolve_context_name(language, target) else {
                warn!(language, target, "unresolved context reference");
                return None;
            };
            if let Some(id) = &id {
                self.graph.register_context(id, context);
            }
            return Some(ContextRef {
                context,
                style,
                ignore_style,
            });
        }

        let case_insensitive = node.attribute("case-sensitive") == Some("false");

        let kind = if let Some(group) = node.attribute("sub-pattern") {
            let position = match node.attribute("where") {
                Some("start") | Some("s") => SubPatternPosition::Start,
                Some("end") | Some("e") => SubPatternPosition::End,
                _ => SubPatternPosition::Default,
            };
            ContextKind::SubPattern(SubPattern {
                group: GroupRef::parse(group),
                position,
            })
        } else {
            match shape_of(node) {
                Shape::Keyword => ContextKind::Keyword(KeywordContext::default()),
                Shape::Simple => ContextKind::Simple(SimpleContext::default()),
                Shape::Container => ContextKind::Container(ContainerContext::default()),
            }
        };
        let mut definition = Context { kind, style };
        if let Some(flags) = definition.flags_mut() {
            read_flags(node, flags);
        }

        // Registered before the children so that they can include it
        let context = self.graph.add_context(definition);
        if let Some(id) = &id {
            self.graph.register_context(id, context);
        }

        let mut keywords = Vec::new();
        let mut prefix = WORD_BOUNDARY.to_string();
        let mut suffix = WORD_BOUNDARY.to_string();

        for child in node.children().filter(Node::is_element) {
            match child.tag_name().name() {
                "start" => {
                    let pattern = Pattern::compile(&regexes.resolve(&element_text(child)), case_insensitive);
                    if let ContextKind::Container(container) = &mut self.graph.context_mut(context).kind {
                        container.start = Some(pattern);
                    }
                }
                "end" => {
                    let pattern = Pattern::deferred(&regexes.resolve(&element_text(child)), case_insensitive);
                    if let ContextKind::Container(container) = &mut self.graph.context_mut(context).kind {
                        container.end = Some(pattern);
                    }
                }
                "match" => {
                    let pattern = Pattern::compile(&regexes.resolve(&element_text(child)), case_insensitive);
                    if let ContextKind::Simple(simple) = &mut self.graph.context_mut(context).kind {
                        simple.pattern = Some(pattern);
                    }
                }
                "keyword" => keywords.push(regexes.resolve(&element_text(child))),
                "prefix" => prefix = regexes.resolve(&element_text(child)),
                "suffix" => suffix = regexes.resolve(&element_text(child)),
                "include" => {
                    for included in child.children().filter(|n| n.has_tag_name("context")) {
                        let Some(reference) = self.parse_context(language, included, regexes) else {
                            continue;
                        };
                        match &mut self.graph.context_mut(context).kind {
                            ContextKind::Simple(simple) => simple.includes.push(reference),
                            ContextKind::Container(container) => container.includes.push(reference),
                            ContextKind::Keyword(_) | ContextKind::SubPattern(_) => {
                                debug!(language, "includes ignored on keyword context")
                            }
                        }
                    }
                }
                other => debug!(language, element = other, "ignoring context child"),
            }
        }

        match &mut self.graph.context_mut(context).kind {
            ContextKind::Keyword(keyword) => {
                keyword.keywords = keywords
                    .iter()
                    .map(|kw| Pattern::compile(&format!("{}(?:{}){}", prefix, kw, suffix), case_insensitive))
                    .collect();
            }
            ContextKind::Container(container) => {
                if container.start.is_none() {
                    container.flags.includes_only = true;
                }
            }
            _ => {}
        }
        debug!(
            language,
            context = id.as_deref().unwrap_or("-"),
            kind = self.graph.context(context).kind_name(),
            "context defined"
        );

        Some(ContextRef {
            context,
            style: None,
            ignore_style,
        })
    }

    fn resolve_context_name(&mut self, language: &str, name: &str) -> Option<ContextId> {
        let qualified = qualify(language, name);
        if self.graph.context_id(&qualified).is_none() {
            if let Some(other) = language_of(name) {
                self.load(other);
            }
        }
        self.graph.context_id(&qualified)
    }

    fn resolve_style_name(&mut self, language: &str, name: &str) -> Option<StyleId> {
        let qualified = qualify(language, name);
        if self.graph.style_id(&qualified).is_none() {
            if let Some(other) = language_of(name) {
                self.load(other);
            }
        }
        self.graph.style_id(&qualified)
    }
}

/// Concatenated text of an element, CDATA included
fn element_text(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .collect()
}

fn bool_attribute(node: Node<'_, '_>, name: &str) -> Option<bool> {
    match node.attribute(name)? {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        other => {
            debug!(attribute = name, value = other, "ignoring non-boolean attribute");
            None
        }
    }
}

fn read_flags(node: Node<'_, '_>, flags: &mut ContextFlags) {
    let fields: [(&str, &mut bool); 7] = [
        ("once-only", &mut flags.once_only),
        ("first-line-only", &mut flags.first_line_only),
        ("extend-parent", &mut flags.extend_parent),
        ("end-parent", &mut flags.end_parent),
        ("end-at-line-end", &mut flags.end_at_line_end),
        ("style-inside", &mut flags.style_inside),
        ("includes-only", &mut flags.includes_only),
    ];
    for (name, field) in fields {
        if let Some(value) = bool_attribute(node, name) {
            *field = value;
        }
    }
}

fn shape_of(node: Node<'_, '_>) -> Shape {
    let has = |tag: &str| node.children().any(|n| n.has_tag_name(tag));
    if has("start") || has("end") {
        Shape::Container
    } else if has("match") {
        Shape::Simple
    } else if has("keyword") {
        Shape::Keyword
    } else {
        Shape::Simple
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::source::MemorySource;

    const DEF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<language id="def" name="Defaults" hidden="true">
  <definitions>
    <context id="string" style-ref="def:string">
      <start>"</start>
      <end>"</end>
    </context>
    <context id="def"/>
  </definitions>
</language>"#;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<language id="sample" name="Sample">
  <styles>
    <style id="comment" name="Comment" map-to="def:comment"/>
    <style id="keyword" name="Keyword" map-to="def:keyword"/>
    <style id="plain" name="Plain"/>
    <style id="broken" map-to="nowhere:style"/>
  </styles>
  <definitions>
    <define-regex id="ident">[a-z_]+   # lower case only</define-regex>
    <context id="line-comment" style-ref="comment" end-at-line-end="true">
      <start>\#</start>
    </context>
    <context id="keywords" style-ref="keyword" once-only="true">
      <keyword>if</keyword>
      <keyword>else</keyword>
    </context>
    <context id="assignment">
      <match>(\%{ident})\ =</match>
      <include>
        <context sub-pattern="1" style-ref="plain"/>
      </include>
    </context>
    <context id="nested" style-ref="comment">
      <start>/\*</start>
      <end>\*/</end>
      <include>
        <context ref="nested"/>
      </include>
    </context>
    <context id="sample">
      <include>
        <context ref="line-comment"/>
        <context ref="keywords"/>
        <context ref="assignment"/>
        <context ref="nested"/>
        <context ref="def:string" style-ref="keyword"/>
        <context ref="missing"/>
      </include>
    </context>
  </definitions>
</language>"#;

    fn source() -> MemorySource {
        MemorySource::new().with("def", DEF).with("sample", SAMPLE)
    }

    #[test]
    fn test_load_root() {
        let source = source();
        let mut loader = GrammarLoader::new(&source);
        let root = loader.load_language("sample").unwrap();
        let graph = loader.graph();
        let includes = graph.context(root.context).includes();
        // the unresolvable reference is dropped
        assert_eq!(includes.len(), 5);
        assert_eq!(loader.metadata("sample").unwrap().name, "Sample");
    }

    #[test]
    fn test_missing_language_is_none() {
        let source = source();
        let mut loader = GrammarLoader::new(&source);
        assert!(loader.load_language("nope").is_none());

        let broken = MemorySource::new().with("bad", "<language id='bad'><definitions>");
        let mut loader = GrammarLoader::new(&broken);
        assert!(loader.load_language("bad").is_none());
    }

    #[test]
    fn test_shapes_and_flags() {
        let source = source();
        let mut loader = GrammarLoader::new(&source);
        loader.load_language("sample").unwrap();
        let graph = loader.graph();

        let comment = graph.context(graph.context_id("sample:line-comment").unwrap());
        assert_eq!(comment.kind_name(), "container");
        assert!(comment.flags().end_at_line_end);
        assert!(comment.flags().extend_parent);

        let keywords = graph.context(graph.context_id("sample:keywords").unwrap());
        assert!(keywords.flags().once_only);
        match &keywords.kind {
            ContextKind::Keyword(kw) => {
                assert_eq!(kw.keywords.len(), 2);
                assert_eq!(kw.keywords[0].source(), r"\b(?:if)\b");
            }
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_macro_expansion_in_match() {
        let source = source();
        let mut loader = GrammarLoader::new(&source);
        loader.load_language("sample").unwrap();
        let graph = loader.graph();
        let assignment = graph.context(graph.context_id("sample:assignment").unwrap());
        match &assignment.kind {
            ContextKind::Simple(simple) => {
                assert_eq!(simple.pattern.as_ref().unwrap().source(), r"([a-z_]+)\ =");
                assert_eq!(simple.includes.len(), 1);
                let sub = graph.context(simple.includes[0].context);
                assert_eq!(sub.kind_name(), "sub-pattern");
            }
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_self_including_container() {
        let source = source();
        let mut loader = GrammarLoader::new(&source);
        loader.load_language("sample").unwrap();
        let graph = loader.graph();
        let nested = graph.context_id("sample:nested").unwrap();
        assert_eq!(graph.context(nested).includes()[0].context, nested);
    }

    #[test]
    fn test_cross_language_ref_with_style_override() {
        let source = source();
        let mut loader = GrammarLoader::new(&source);
        let root = loader.load_language("sample").unwrap();
        let graph = loader.graph();
        let string = graph.context_id("def:string").unwrap();
        let reference = graph
            .context(root.context)
            .includes()
            .iter()
            .find(|r| r.context == string)
            .unwrap();
        let keyword = graph.style_id("sample:keyword").unwrap();
        assert_eq!(reference.style, Some(keyword));
        assert_eq!(graph.effective_style(reference), Some(keyword));
    }

    #[test]
    fn test_style_map_to_chain() {
        let source = source();
        let mut loader = GrammarLoader::new(&source);
        loader.load_language("sample").unwrap();
        let graph = loader.graph();

        let comment = graph.style_id("sample:comment").unwrap();
        let chain: Vec<&str> = graph
            .style_chain(comment)
            .into_iter()
            .map(|s| graph.style(s).id.as_str())
            .collect();
        assert_eq!(chain, vec!["sample:comment", "def:comment"]);

        let plain = graph.style_id("sample:plain").unwrap();
        assert_eq!(graph.resolve_style(plain), plain);

        let broken = graph.style_id("sample:broken").unwrap();
        assert!(graph.style(broken).map_to.is_none());
    }

    #[test]
    fn test_mutual_language_references_terminate() {
        let a = r#"<language id="a"><definitions>
            <context id="x"><match>x</match></context>
            <context id="a"><include><context ref="b:y"/></include></context>
            <context id="z"><match>z</match></context>
        </definitions></language>"#;
        let b = r#"<language id="b"><definitions>
            <context id="y"><match>y</match></context>
            <context id="b"><include><context ref="a:x"/><context ref="a:z"/></include></context>
        </definitions></language>"#;
        let source = MemorySource::new().with("a", a).with("b", b);
        let mut loader = GrammarLoader::new(&source);
        let root = loader.load_language("a").unwrap();
        let graph = loader.graph();
        assert_eq!(graph.context(root.context).includes().len(), 1);
        // b saw a partially loaded: x was known, z was not yet
        assert!(graph.context_id("a:z").is_some());
        let b_root = graph.context_id("b:b").unwrap();
        assert_eq!(graph.context(b_root).includes().len(), 1);
    }

    #[test]
    fn test_keyword_prefix_suffix_and_case() {
        let text = r#"<language id="k"><definitions>
            <context id="k" case-sensitive="false">
              <prefix>(?:^|\s)</prefix>
              <suffix>\%]</suffix>
              <keyword>select</keyword>
            </context>
        </definitions></language>"#;
        let source = MemorySource::new().with("k", text);
        let mut loader = GrammarLoader::new(&source);
        let root = loader.load_language("k").unwrap();
        match &loader.graph().context(root.context).kind {
            ContextKind::Keyword(kw) => {
                assert_eq!(kw.keywords[0].source(), r"(?:^|\s)(?:select)\b");
                assert!(kw.keywords[0].find_at("SELECT 1", 0, 8).is_some());
            }
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_default_styles_are_seeded() {
        let source = MemorySource::new();
        let loader = GrammarLoader::new(&source);
        for style in DefaultStyle::ALL {
            assert!(loader.graph().style_id(style.id()).is_some());
        }
    }
}
