//! Markdown/MDX body → tree of presentational nodes.
//!
//! The body is parsed with pulldown-cmark and the event stream is folded into
//! a [`Node`] tree. Every opening tag is first classified into a
//! [`BlockKind`], and closing a block dispatches on that kind; anything the
//! adapter has no dedicated node for lands in the default arm as a generic
//! [`Node::Container`] of its children, so an unexpected construct never
//! fails a render.
//!
//! ## What gets rewritten
//!
//! - Headings get an `id` from [`naming::anchor_slug`] unless the source
//!   gives one explicitly (`## Title {#custom}`). Duplicate headings get
//!   duplicate ids.
//! - Images whose URL is absolute and on the site origin become root-relative
//!   (`https://example.com/img/a.png` → `/img/a.png`).
//! - Tables become records: one [`Column`] per header cell, one map per row
//!   keyed by [`naming::column_key`].
//! - Fenced code records a language from a `language-xxx` / `lang-xxx` class
//!   or a bare info string; unknown languages become `text`.
//! - GitHub alerts (`> [!WARNING]`) become callouts.
//!
//! ## Shortcodes
//!
//! Capitalized HTML-like tags are shortcodes, looked up in a [`Shortcodes`]
//! symbol table:
//!
//! ```text
//! <Callout type="warning" title="Heads up">
//!
//! Markdown **inside** is adapted too.
//!
//! </Callout>
//!
//! <YouTube id="dQw4w9WgXcQ" />
//! ```
//!
//! An unregistered shortcode renders its children in a container. Lowercase
//! HTML passes through untouched as [`Node::Html`].

use crate::naming;
use pulldown_cmark::{BlockQuoteKind, CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use url::Url;

/// A presentational node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Heading {
        level: u8,
        id: String,
        children: Vec<Node>,
    },
    Paragraph {
        children: Vec<Node>,
    },
    Text {
        value: String,
    },
    Emphasis {
        children: Vec<Node>,
    },
    Strong {
        children: Vec<Node>,
    },
    Strikethrough {
        children: Vec<Node>,
    },
    InlineCode {
        value: String,
    },
    Link {
        href: String,
        title: Option<String>,
        children: Vec<Node>,
    },
    Image {
        src: String,
        alt: String,
        title: Option<String>,
    },
    CodeBlock {
        language: String,
        code: String,
    },
    Table {
        columns: Vec<Column>,
        rows: Vec<BTreeMap<String, String>>,
    },
    List {
        ordered: bool,
        start: Option<u64>,
        items: Vec<Node>,
    },
    ListItem {
        checked: Option<bool>,
        children: Vec<Node>,
    },
    BlockQuote {
        children: Vec<Node>,
    },
    Callout {
        kind: String,
        title: Option<String>,
        children: Vec<Node>,
    },
    Embed {
        provider: String,
        id: String,
        title: Option<String>,
    },
    Figure {
        src: String,
        alt: String,
        caption: Option<String>,
    },
    Html {
        value: String,
    },
    Rule,
    LineBreak,
    Container {
        children: Vec<Node>,
    },
}

/// One table column: record key and header text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub key: String,
    pub label: String,
}

/// A shortcode invocation with its adapted children.
#[derive(Debug, Clone, PartialEq)]
pub struct Shortcode {
    pub name: String,
    pub attrs: BTreeMap<String, String>,
    pub children: Vec<Node>,
}

impl Shortcode {
    fn attr(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .find_map(|k| self.attrs.get(*k))
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

pub type ShortcodeHandler = fn(Shortcode, &AdapterContext) -> Node;

/// Symbol table from shortcode name to handler.
#[derive(Debug, Clone)]
pub struct Shortcodes {
    handlers: HashMap<String, ShortcodeHandler>,
}

impl Default for Shortcodes {
    fn default() -> Self {
        let mut shortcodes = Self::empty();
        shortcodes.register("Callout", callout);
        shortcodes.register("YouTube", youtube);
        shortcodes.register("Figure", figure);
        shortcodes
    }
}

impl Shortcodes {
    /// A table with no handlers: every shortcode becomes a container.
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register `handler` under `name`, returning the handler it replaces.
    pub fn register(&mut self, name: &str, handler: ShortcodeHandler) -> Option<ShortcodeHandler> {
        self.handlers.insert(name.to_string(), handler)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn dispatch(&self, call: Shortcode, ctx: &AdapterContext) -> Node {
        match self.handlers.get(&call.name) {
            Some(handler) => handler(call, ctx),
            None => Node::Container {
                children: call.children,
            },
        }
    }
}

fn callout(call: Shortcode, _ctx: &AdapterContext) -> Node {
    Node::Callout {
        kind: call.attr(&["type", "variant", "kind"]).unwrap_or("note").to_string(),
        title: call.attr(&["title"]).map(str::to_string),
        children: call.children,
    }
}

fn youtube(call: Shortcode, _ctx: &AdapterContext) -> Node {
    let id = call
        .attr(&["id"])
        .map(str::to_string)
        .or_else(|| call.attr(&["url", "src"]).and_then(youtube_id));
    match id {
        Some(id) => Node::Embed {
            provider: "youtube".to_string(),
            id,
            title: call.attr(&["title"]).map(str::to_string),
        },
        None => Node::Container {
            children: call.children,
        },
    }
}

/// Video id from a `youtu.be/ID`, `youtube.com/watch?v=ID`, `/embed/ID` or
/// `/shorts/ID` URL.
fn youtube_id(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    let host = url.host_str()?;
    let mut segments = url.path_segments()?;
    if host == "youtu.be" {
        return segments.next().filter(|s| !s.is_empty()).map(str::to_string);
    }
    if !host.ends_with("youtube.com") {
        return None;
    }
    if let Some((_, v)) = url.query_pairs().find(|(k, _)| k == "v") {
        return Some(v.into_owned());
    }
    match (segments.next(), segments.next()) {
        (Some("embed" | "shorts"), Some(id)) if !id.is_empty() => Some(id.to_string()),
        _ => None,
    }
}

fn figure(call: Shortcode, ctx: &AdapterContext) -> Node {
    let Some(src) = call.attr(&["src"]) else {
        return Node::Container {
            children: call.children,
        };
    };
    let caption = call
        .attr(&["caption"])
        .map(str::to_string)
        .or_else(|| Some(plain_text(&call.children).trim().to_string()).filter(|c| !c.is_empty()));
    Node::Figure {
        src: ctx.rewrite_media_url(src),
        alt: call.attr(&["alt"]).unwrap_or_default().to_string(),
        caption,
    }
}

/// Site origin and shortcode table the adapter works against.
#[derive(Debug, Clone, Default)]
pub struct AdapterContext {
    origin: Option<Url>,
    shortcodes: Shortcodes,
}

impl AdapterContext {
    /// `origin` is the public site origin; an empty or invalid one disables
    /// media rewriting.
    pub fn new(origin: &str) -> Self {
        Self {
            origin: Url::parse(origin).ok(),
            shortcodes: Shortcodes::default(),
        }
    }

    pub fn with_shortcodes(mut self, shortcodes: Shortcodes) -> Self {
        self.shortcodes = shortcodes;
        self
    }

    pub fn shortcodes_mut(&mut self) -> &mut Shortcodes {
        &mut self.shortcodes
    }

    /// Root-relative form of a same-origin absolute URL; anything else as is.
    pub fn rewrite_media_url(&self, src: &str) -> String {
        let (Some(origin), Ok(url)) = (&self.origin, Url::parse(src)) else {
            return src.to_string();
        };
        if url.origin() != origin.origin() {
            return src.to_string();
        }
        let mut local = url.path().to_string();
        if let Some(query) = url.query() {
            local.push('?');
            local.push_str(query);
        }
        if let Some(fragment) = url.fragment() {
            local.push('#');
            local.push_str(fragment);
        }
        local
    }
}

/// Adapt a Markdown/MDX body into presentational nodes.
pub fn adapt(markdown: &str, ctx: &AdapterContext) -> Vec<Node> {
    let mut builder = TreeBuilder::new(ctx);
    for event in Parser::new_ext(markdown, parser_options()) {
        builder.event(event);
    }
    builder.finish()
}

fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_HEADING_ATTRIBUTES
        | Options::ENABLE_GFM
}

// ============================================================================
// Block dispatch
// ============================================================================

/// Classification of an open block, decided when its start tag arrives.
#[derive(Debug, Clone, PartialEq)]
enum BlockKind {
    Paragraph,
    Heading { level: u8, id: Option<String> },
    BlockQuote { alert: Option<&'static str> },
    CodeBlock { language: String },
    HtmlBlock,
    List { start: Option<u64> },
    Item { checked: Option<bool> },
    Table,
    TableHead,
    TableRow,
    TableCell,
    Emphasis,
    Strong,
    Strikethrough,
    Link { href: String, title: Option<String> },
    Image { src: String, title: Option<String> },
    Shortcode { name: String, attrs: BTreeMap<String, String> },
    Generic,
}

impl BlockKind {
    fn from_tag(tag: Tag<'_>, ctx: &AdapterContext) -> Self {
        match tag {
            Tag::Paragraph => BlockKind::Paragraph,
            Tag::Heading { level, id, .. } => BlockKind::Heading {
                level: heading_level(level),
                id: id.map(|id| id.to_string()),
            },
            Tag::BlockQuote(kind) => BlockKind::BlockQuote {
                alert: kind.map(alert_kind),
            },
            Tag::CodeBlock(CodeBlockKind::Fenced(info)) => BlockKind::CodeBlock {
                language: language_from_class(&info),
            },
            Tag::CodeBlock(CodeBlockKind::Indented) => BlockKind::CodeBlock {
                language: FALLBACK_LANGUAGE.to_string(),
            },
            Tag::HtmlBlock => BlockKind::HtmlBlock,
            Tag::List(start) => BlockKind::List { start },
            Tag::Item => BlockKind::Item { checked: None },
            Tag::Table(_) => BlockKind::Table,
            Tag::TableHead => BlockKind::TableHead,
            Tag::TableRow => BlockKind::TableRow,
            Tag::TableCell => BlockKind::TableCell,
            Tag::Emphasis => BlockKind::Emphasis,
            Tag::Strong => BlockKind::Strong,
            Tag::Strikethrough => BlockKind::Strikethrough,
            Tag::Link { dest_url, title, .. } => BlockKind::Link {
                href: dest_url.to_string(),
                title: non_empty(&title),
            },
            Tag::Image { dest_url, title, .. } => BlockKind::Image {
                src: ctx.rewrite_media_url(&dest_url),
                title: non_empty(&title),
            },
            _ => BlockKind::Generic,
        }
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn alert_kind(kind: BlockQuoteKind) -> &'static str {
    match kind {
        BlockQuoteKind::Note => "note",
        BlockQuoteKind::Tip => "tip",
        BlockQuoteKind::Important => "important",
        BlockQuoteKind::Warning => "warning",
        BlockQuoteKind::Caution => "caution",
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() { None } else { Some(s.to_string()) }
}

pub const FALLBACK_LANGUAGE: &str = "text";

const KNOWN_LANGUAGES: &[&str] = &[
    "bash", "c", "cpp", "csharp", "css", "diff", "dockerfile", "go", "graphql", "html", "java",
    "javascript", "js", "json", "jsx", "kotlin", "markdown", "md", "mdx", "php", "python", "py",
    "ruby", "rust", "rs", "scss", "sh", "shell", "sql", "swift", "text", "toml", "ts", "tsx",
    "typescript", "xml", "yaml", "yml", "zsh",
];

/// Language of a code block from its class or fence info string.
///
/// A `language-xxx` or `lang-xxx` token anywhere in the class wins; a bare
/// first token (a fence info string such as `rust,ignore`) is used next.
/// Unknown or absent languages become [`FALLBACK_LANGUAGE`].
pub fn language_from_class(class: &str) -> String {
    let mut tokens = class
        .split(|c: char| c.is_whitespace() || c == ',' || c == '{')
        .filter(|t| !t.is_empty());
    let prefixed = tokens
        .clone()
        .find_map(|t| t.strip_prefix("language-").or_else(|| t.strip_prefix("lang-")));
    let candidate = prefixed.or_else(|| tokens.next()).unwrap_or_default().to_ascii_lowercase();
    if KNOWN_LANGUAGES.contains(&candidate.as_str()) {
        candidate
    } else {
        FALLBACK_LANGUAGE.to_string()
    }
}

// ============================================================================
// Tree construction
// ============================================================================

#[derive(Debug)]
struct Frame {
    kind: BlockKind,
    children: Vec<Node>,
    /// Verbatim text of code and HTML blocks.
    raw: String,
    /// Cell texts of a table head or row.
    cells: Vec<String>,
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Frame {
    fn new(kind: BlockKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
            raw: String::new(),
            cells: Vec::new(),
            header: Vec::new(),
            rows: Vec::new(),
        }
    }
}

struct TreeBuilder<'c> {
    ctx: &'c AdapterContext,
    root: Vec<Node>,
    stack: Vec<Frame>,
}

impl<'c> TreeBuilder<'c> {
    fn new(ctx: &'c AdapterContext) -> Self {
        Self {
            ctx,
            root: Vec::new(),
            stack: Vec::new(),
        }
    }

    fn children(&mut self) -> &mut Vec<Node> {
        match self.stack.last_mut() {
            Some(frame) => &mut frame.children,
            None => &mut self.root,
        }
    }

    fn push(&mut self, node: Node) {
        self.children().push(node);
    }

    fn push_text(&mut self, text: &str) {
        let children = self.children();
        if let Some(Node::Text { value }) = children.last_mut() {
            value.push_str(text);
        } else {
            children.push(Node::Text {
                value: text.to_string(),
            });
        }
    }

    fn collects_raw(&self) -> bool {
        matches!(
            self.stack.last().map(|f| &f.kind),
            Some(BlockKind::CodeBlock { .. } | BlockKind::HtmlBlock)
        )
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => {
                let kind = BlockKind::from_tag(tag, self.ctx);
                self.stack.push(Frame::new(kind));
            }
            Event::End(_) => self.end(),
            Event::Text(text) | Event::Html(text) if self.collects_raw() => {
                if let Some(frame) = self.stack.last_mut() {
                    frame.raw.push_str(&text);
                }
            }
            Event::Text(text) => self.push_text(&text),
            Event::Code(code) => self.push(Node::InlineCode {
                value: code.to_string(),
            }),
            Event::Html(html) | Event::InlineHtml(html) => self.inline_html(&html),
            Event::SoftBreak => self.push_text("\n"),
            Event::HardBreak => self.push(Node::LineBreak),
            Event::Rule => self.push(Node::Rule),
            Event::TaskListMarker(done) => {
                let item = self
                    .stack
                    .iter_mut()
                    .rev()
                    .find(|f| matches!(f.kind, BlockKind::Item { .. }));
                if let Some(Frame {
                    kind: BlockKind::Item { checked },
                    ..
                }) = item
                {
                    *checked = Some(done);
                }
            }
            Event::FootnoteReference(label) => self.push_text(&format!("[{label}]")),
            _ => {}
        }
    }

    /// Close the block whose end tag arrived, closing any shortcode left open
    /// inside it first.
    fn end(&mut self) {
        while let Some(frame) = self.stack.last() {
            let shortcode = matches!(frame.kind, BlockKind::Shortcode { .. });
            self.close();
            if !shortcode {
                break;
            }
        }
    }

    fn close(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        match frame.kind {
            BlockKind::TableCell => {
                let text = plain_text(&frame.children).trim().to_string();
                if let Some(parent) = self.stack.last_mut() {
                    parent.cells.push(text);
                }
            }
            BlockKind::TableHead => {
                if let Some(table) = self.stack.last_mut() {
                    table.header = frame.cells;
                }
            }
            BlockKind::TableRow => {
                if let Some(table) = self.stack.last_mut() {
                    table.rows.push(frame.cells);
                }
            }
            BlockKind::HtmlBlock => self.html_block(frame.raw),
            kind => {
                let node = self.finish_block(kind, frame.children, frame.raw, frame.header, frame.rows);
                self.push(node);
            }
        }
    }

    fn finish_block(
        &self,
        kind: BlockKind,
        children: Vec<Node>,
        raw: String,
        header: Vec<String>,
        rows: Vec<Vec<String>>,
    ) -> Node {
        match kind {
            BlockKind::Paragraph => Node::Paragraph { children },
            BlockKind::Heading { level, id } => {
                let id = id.unwrap_or_else(|| naming::anchor_slug(&plain_text(&children)));
                Node::Heading { level, id, children }
            }
            BlockKind::BlockQuote { alert: Some(kind) } => Node::Callout {
                kind: kind.to_string(),
                title: None,
                children,
            },
            BlockKind::BlockQuote { alert: None } => Node::BlockQuote { children },
            BlockKind::CodeBlock { language } => Node::CodeBlock { language, code: raw },
            BlockKind::List { start } => Node::List {
                ordered: start.is_some(),
                start,
                items: children,
            },
            BlockKind::Item { checked } => Node::ListItem { checked, children },
            BlockKind::Table => table(&header, rows),
            BlockKind::Emphasis => Node::Emphasis { children },
            BlockKind::Strong => Node::Strong { children },
            BlockKind::Strikethrough => Node::Strikethrough { children },
            BlockKind::Link { href, title } => Node::Link {
                href,
                title,
                children,
            },
            BlockKind::Image { src, title } => Node::Image {
                src,
                alt: plain_text(&children),
                title,
            },
            BlockKind::Shortcode { name, attrs } => self.ctx.shortcodes.dispatch(
                Shortcode {
                    name,
                    attrs,
                    children,
                },
                self.ctx,
            ),
            _ => Node::Container { children },
        }
    }

    /// A block of HTML: shortcode tags restructure the tree, anything else
    /// passes through verbatim.
    fn html_block(&mut self, raw: String) {
        match tokenize(&raw) {
            Some(tokens) => self.apply(tokens, true),
            None => self.push(Node::Html { value: raw }),
        }
    }

    fn inline_html(&mut self, html: &str) {
        match tokenize(html) {
            Some(tokens) => self.apply(tokens, false),
            None => self.push(Node::Html {
                value: html.to_string(),
            }),
        }
    }

    fn apply(&mut self, tokens: Vec<HtmlToken>, block: bool) {
        for token in tokens {
            match token {
                HtmlToken::Open {
                    name,
                    attrs,
                    self_closing: true,
                } => {
                    let node = self.ctx.shortcodes.dispatch(
                        Shortcode {
                            name,
                            attrs,
                            children: Vec::new(),
                        },
                        self.ctx,
                    );
                    self.push(node);
                }
                HtmlToken::Open { name, attrs, .. } => {
                    self.stack.push(Frame::new(BlockKind::Shortcode { name, attrs }));
                }
                HtmlToken::Close { name } => self.close_shortcode(&name),
                HtmlToken::Text(text) if block => {
                    if !text.trim().is_empty() {
                        let nodes = adapt(&text, self.ctx);
                        self.children().extend(nodes);
                    }
                }
                HtmlToken::Text(text) => self.push_text(&text),
            }
        }
    }

    /// Close the innermost open shortcode named `name`; a stray closing tag
    /// is dropped.
    fn close_shortcode(&mut self, name: &str) {
        let open = self
            .stack
            .iter()
            .rposition(|f| matches!(&f.kind, BlockKind::Shortcode { name: n, .. } if n == name));
        if let Some(depth) = open {
            while self.stack.len() > depth {
                self.close();
            }
        }
    }

    fn finish(mut self) -> Vec<Node> {
        while !self.stack.is_empty() {
            self.close();
        }
        self.root
    }
}

fn table(header: &[String], rows: Vec<Vec<String>>) -> Node {
    let columns: Vec<Column> = header
        .iter()
        .enumerate()
        .map(|(i, label)| Column {
            key: naming::column_key(label, i),
            label: label.clone(),
        })
        .collect();

    let rows = rows
        .into_iter()
        .map(|cells| {
            let mut cells = cells.into_iter();
            columns
                .iter()
                .map(|col| (col.key.clone(), cells.next().unwrap_or_default()))
                .collect()
        })
        .collect();

    Node::Table { columns, rows }
}

// ============================================================================
// Shortcode tag tokenizer
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum HtmlToken {
    Open {
        name: String,
        attrs: BTreeMap<String, String>,
        self_closing: bool,
    },
    Close {
        name: String,
    },
    Text(String),
}

/// Split an HTML fragment into shortcode tags and text. `None` when any tag
/// in it is not a shortcode (plain HTML, comments, malformed tags).
fn tokenize(html: &str) -> Option<Vec<HtmlToken>> {
    let mut tokens = Vec::new();
    let mut rest = html;
    while !rest.is_empty() {
        match rest.find('<') {
            Some(0) => {
                let (token, consumed) = parse_tag(rest)?;
                tokens.push(token);
                rest = &rest[consumed..];
            }
            Some(start) => {
                tokens.push(HtmlToken::Text(rest[..start].to_string()));
                rest = &rest[start..];
            }
            None => {
                tokens.push(HtmlToken::Text(rest.to_string()));
                rest = "";
            }
        }
    }
    if tokens.iter().any(|t| !matches!(t, HtmlToken::Text(_))) {
        Some(tokens)
    } else {
        None
    }
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if !pred(ch) {
                break;
            }
            self.pos += ch.len_utf8();
        }
        &self.src[start..self.pos]
    }

    fn skip_ws(&mut self) {
        self.take_while(char::is_whitespace);
    }
}

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-')
}

fn is_shortcode_name(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

/// Parse one tag at the start of `input`, returning it and its byte length.
fn parse_tag(input: &str) -> Option<(HtmlToken, usize)> {
    let mut c = Cursor { src: input, pos: 0 };
    if !c.eat('<') {
        return None;
    }

    if c.eat('/') {
        let name = c.take_while(is_name_char);
        if !is_shortcode_name(name) {
            return None;
        }
        c.skip_ws();
        if !c.eat('>') {
            return None;
        }
        return Some((
            HtmlToken::Close {
                name: name.to_string(),
            },
            c.pos,
        ));
    }

    let name = c.take_while(is_name_char);
    if !is_shortcode_name(name) {
        return None;
    }

    let mut attrs = BTreeMap::new();
    loop {
        c.skip_ws();
        match c.peek()? {
            '/' => {
                c.bump();
                if !c.eat('>') {
                    return None;
                }
                return Some((open(name, attrs, true), c.pos));
            }
            '>' => {
                c.bump();
                return Some((open(name, attrs, false), c.pos));
            }
            _ => {
                let key = c.take_while(|ch| !ch.is_whitespace() && !matches!(ch, '=' | '>' | '/'));
                if key.is_empty() {
                    return None;
                }
                c.skip_ws();
                let value = if c.eat('=') {
                    c.skip_ws();
                    attr_value(&mut c)?
                } else {
                    "true".to_string()
                };
                attrs.insert(key.to_string(), value);
            }
        }
    }
}

fn open(name: &str, attrs: BTreeMap<String, String>, self_closing: bool) -> HtmlToken {
    HtmlToken::Open {
        name: name.to_string(),
        attrs,
        self_closing,
    }
}

/// `"quoted"`, `'quoted'`, `{expression}` or a bare word.
fn attr_value(c: &mut Cursor<'_>) -> Option<String> {
    match c.peek()? {
        quote @ ('"' | '\'') => {
            c.bump();
            let value = c.take_while(|ch| ch != quote);
            c.eat(quote).then(|| value.to_string())
        }
        '{' => {
            c.bump();
            let start = c.pos;
            let mut depth = 1;
            while depth > 0 {
                match c.bump()? {
                    '{' => depth += 1,
                    '}' => depth -= 1,
                    _ => {}
                }
            }
            let inner = c.src[start..c.pos - 1].trim();
            Some(strip_literal_quotes(inner).to_string())
        }
        _ => Some(c.take_while(|ch| !ch.is_whitespace() && ch != '>').to_string()),
    }
}

fn strip_literal_quotes(expr: &str) -> &str {
    for quote in ['"', '\'', '`'] {
        if expr.len() >= 2 && expr.starts_with(quote) && expr.ends_with(quote) {
            return &expr[1..expr.len() - 1];
        }
    }
    expr
}

// ============================================================================
// Derived views
// ============================================================================

/// Concatenated text content of `nodes`.
pub fn plain_text(nodes: &[Node]) -> String {
    let mut out = String::new();
    collect_text(nodes, &mut out);
    out
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text { value } | Node::InlineCode { value } => out.push_str(value),
            Node::CodeBlock { code, .. } => out.push_str(code),
            Node::Image { alt, .. } => out.push_str(alt),
            Node::LineBreak => out.push('\n'),
            Node::Heading { children, .. }
            | Node::Paragraph { children }
            | Node::Emphasis { children }
            | Node::Strong { children }
            | Node::Strikethrough { children }
            | Node::Link { children, .. }
            | Node::ListItem { children, .. }
            | Node::BlockQuote { children }
            | Node::Callout { children, .. }
            | Node::Container { children } => collect_text(children, out),
            Node::List { items, .. } => collect_text(items, out),
            _ => {}
        }
    }
}

/// One heading in a table of contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    pub level: u8,
    pub id: String,
    pub text: String,
}

/// Every heading in document order, including headings nested in
/// containers and callouts.
pub fn table_of_contents(nodes: &[Node]) -> Vec<TocEntry> {
    let mut entries = Vec::new();
    collect_headings(nodes, &mut entries);
    entries
}

fn collect_headings(nodes: &[Node], entries: &mut Vec<TocEntry>) {
    for node in nodes {
        match node {
            Node::Heading {
                level,
                id,
                children,
            } => entries.push(TocEntry {
                level: *level,
                id: id.clone(),
                text: plain_text(children),
            }),
            Node::Callout { children, .. }
            | Node::Container { children }
            | Node::BlockQuote { children } => collect_headings(children, entries),
            _ => {}
        }
    }
}

/// Estimated reading time in whole minutes at 200 words per minute, at least one.
pub fn reading_time(body: &str) -> u32 {
    const WORDS_PER_MINUTE: usize = 200;
    let words = body.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1) as u32
}
