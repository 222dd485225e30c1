//! Light markup for AI replies: fenced blocks, inline code and line breaks.

use once_cell::sync::Lazy;
use regex::Regex;

static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```(.*?)```").unwrap());
static INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+)`").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupNode {
    Text(String),
    /// Inline code span
    Code(String),
    /// Preformatted block, contents verbatim
    Pre(String),
    Break,
}

/// Converts reply text into display nodes.
///
/// Fenced blocks are cut out first so their contents are never touched by
/// the inline-code or line-break rules.
pub fn parse(text: &str) -> Vec<MarkupNode> {
    let mut nodes = Vec::new();
    let mut last = 0;

    for caps in FENCED_BLOCK.captures_iter(text) {
        let (Some(whole), Some(body)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        parse_inline(&text[last..whole.start()], &mut nodes);
        nodes.push(MarkupNode::Pre(body.as_str().to_string()));
        last = whole.end();
    }
    parse_inline(&text[last..], &mut nodes);

    nodes
}

fn parse_inline(text: &str, nodes: &mut Vec<MarkupNode>) {
    let mut last = 0;

    for caps in INLINE_CODE.captures_iter(text) {
        let (Some(whole), Some(body)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        push_lines(&text[last..whole.start()], nodes, MarkupNode::Text);
        push_lines(body.as_str(), nodes, MarkupNode::Code);
        last = whole.end();
    }
    push_lines(&text[last..], nodes, MarkupNode::Text);
}

fn push_lines(text: &str, nodes: &mut Vec<MarkupNode>, make: fn(String) -> MarkupNode) {
    for (i, part) in text.split('\n').enumerate() {
        if i > 0 {
            nodes.push(MarkupNode::Break);
        }
        if !part.is_empty() {
            nodes.push(make(part.to_string()));
        }
    }
}

/// Flattens nodes back to plain text, breaks as newlines.
pub fn to_plain(nodes: &[MarkupNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            MarkupNode::Text(s) | MarkupNode::Code(s) | MarkupNode::Pre(s) => out.push_str(s),
            MarkupNode::Break => out.push('\n'),
        }
    }
    out
}
