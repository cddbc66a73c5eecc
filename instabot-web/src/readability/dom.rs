//! Flat node arena built from the `scraper` parse tree.
//!
//! Nodes are stored in document (pre-)order, so a parent always has a lower
//! index than its children and bottom-up passes can walk the vector backwards.
use scraper::{Html, Node};
use url::Url;

#[derive(Debug, Clone)]
pub(crate) enum NodeKind {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct DomNode {
    pub kind: NodeKind,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

#[derive(Debug, Default)]
pub(crate) struct Dom {
    pub nodes: Vec<DomNode>,
}

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements that break the flow of text into separate paragraphs.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "ol",
    "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

/// Work item for the iterative renderers: open a node, or close an element
/// once its children are done.
#[derive(Debug, Clone, Copy)]
enum Frame {
    Enter(usize),
    Exit(usize),
}

impl Dom {
    /// Copy the element and text nodes under `<html>` into the arena.
    pub fn from_html(doc: &Html) -> Self {
        let mut dom = Dom::default();
        let mut stack = vec![(*doc.root_element(), None::<usize>)];

        while let Some((node, parent)) = stack.pop() {
            let kind = match node.value() {
                Node::Element(el) => NodeKind::Element {
                    tag: el.name().to_ascii_lowercase(),
                    attrs: el
                        .attrs()
                        .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
                        .collect(),
                },
                Node::Text(text) => NodeKind::Text(String::from(&**text)),
                _ => continue,
            };

            let idx = dom.nodes.len();
            dom.nodes.push(DomNode {
                kind,
                parent,
                children: Vec::new(),
            });
            if let Some(p) = parent {
                dom.nodes[p].children.push(idx);
            }

            let kids: Vec<_> = node.children().collect();
            for kid in kids.into_iter().rev() {
                stack.push((kid, Some(idx)));
            }
        }
        dom
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn tag(&self, idx: usize) -> Option<&str> {
        match &self.nodes[idx].kind {
            NodeKind::Element { tag, .. } => Some(tag.as_str()),
            NodeKind::Text(_) => None,
        }
    }

    pub fn attr(&self, idx: usize, name: &str) -> Option<&str> {
        match &self.nodes[idx].kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            NodeKind::Text(_) => None,
        }
    }

    pub fn element_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n.kind, NodeKind::Element { .. }))
            .count()
    }

    pub fn is_block(&self, idx: usize) -> bool {
        self.tag(idx).is_some_and(|t| BLOCK_TAGS.contains(&t))
    }

    /// Plain text of the given roots: blocks become paragraphs separated by a
    /// blank line, inline whitespace collapses to single spaces.
    pub fn render_text(&self, roots: &[usize], skip: &[bool]) -> String {
        let mut paragraphs = Vec::new();
        let mut line = String::new();
        for &root in roots {
            let mut stack = vec![Frame::Enter(root)];
            while let Some(frame) = stack.pop() {
                match frame {
                    Frame::Enter(idx) if skip[idx] => {}
                    Frame::Enter(idx) => match &self.nodes[idx].kind {
                        NodeKind::Text(text) => push_inline(&mut line, text),
                        NodeKind::Element { .. } => {
                            if self.is_block(idx) {
                                flush_line(&mut line, &mut paragraphs);
                                stack.push(Frame::Exit(idx));
                            }
                            self.push_children(idx, &mut stack);
                        }
                    },
                    Frame::Exit(_) => flush_line(&mut line, &mut paragraphs),
                }
            }
            flush_line(&mut line, &mut paragraphs);
        }
        paragraphs.join("\n\n")
    }

    /// Serialize the given roots back to HTML, dropping skipped subtrees,
    /// presentational attributes and event handlers; `href`/`src` are made
    /// absolute against `base`.
    pub fn render_html(&self, roots: &[usize], skip: &[bool], base: &Url) -> String {
        let mut out = String::new();
        for &root in roots {
            let mut stack = vec![Frame::Enter(root)];
            while let Some(frame) = stack.pop() {
                let idx = match frame {
                    Frame::Enter(idx) if skip[idx] => continue,
                    Frame::Enter(idx) => idx,
                    Frame::Exit(idx) => {
                        if let Some(tag) = self.tag(idx) {
                            out.push_str("</");
                            out.push_str(tag);
                            out.push('>');
                        }
                        continue;
                    }
                };
                match &self.nodes[idx].kind {
                    NodeKind::Text(text) => escape_into(&mut out, text, false),
                    NodeKind::Element { tag, attrs } => {
                        out.push('<');
                        out.push_str(tag);
                        for (name, value) in attrs {
                            let Some(value) = clean_attr(name, value, base) else {
                                continue;
                            };
                            out.push(' ');
                            out.push_str(name);
                            out.push_str("=\"");
                            escape_into(&mut out, &value, true);
                            out.push('"');
                        }
                        out.push('>');
                        if !VOID_TAGS.contains(&tag.as_str()) {
                            stack.push(Frame::Exit(idx));
                            self.push_children(idx, &mut stack);
                        }
                    }
                }
            }
        }
        out
    }

    fn push_children(&self, idx: usize, stack: &mut Vec<Frame>) {
        stack.extend(self.nodes[idx].children.iter().rev().map(|&c| Frame::Enter(c)));
    }
}

fn clean_attr(name: &str, value: &str, base: &Url) -> Option<String> {
    if name == "style" || name == "class" || name.starts_with("on") {
        return None;
    }
    if matches!(name, "href" | "src" | "poster") {
        let trimmed = value.trim();
        if trimmed.to_ascii_lowercase().starts_with("javascript:") {
            return None;
        }
        if trimmed.starts_with('#') {
            return Some(trimmed.to_string());
        }
        return Some(
            base.join(trimmed)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| trimmed.to_string()),
        );
    }
    Some(value.to_string())
}

fn escape_into(out: &mut String, text: &str, attr: bool) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attr => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

fn push_inline(line: &mut String, text: &str) {
    let leading = text.starts_with(char::is_whitespace);
    let trailing = text.ends_with(char::is_whitespace);
    let mut words = text.split_whitespace().peekable();
    if words.peek().is_none() {
        if !text.is_empty() && !line.is_empty() && !line.ends_with(' ') {
            line.push(' ');
        }
        return;
    }
    if leading && !line.is_empty() && !line.ends_with(' ') {
        line.push(' ');
    }
    let mut first = true;
    for word in words {
        if !first {
            line.push(' ');
        }
        line.push_str(word);
        first = false;
    }
    if trailing {
        line.push(' ');
    }
}

fn flush_line(line: &mut String, out: &mut Vec<String>) {
    let trimmed = line.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
    line.clear();
}

/// Length in chars of `text` once whitespace runs are collapsed.
pub(crate) fn collapsed_len(text: &str) -> usize {
    let mut len = 0usize;
    let mut words = 0usize;
    for word in text.split_whitespace() {
        len += word.chars().count();
        words += 1;
    }
    len + words.saturating_sub(1)
}
