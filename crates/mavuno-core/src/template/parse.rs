use serde_json::Value;

use super::{Node, TemplateError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Each,
    If,
}

impl BlockKind {
    fn name(self) -> &'static str {
        match self {
            Self::Each => "each",
            Self::If => "if",
        }
    }
}

/// An open block awaiting its closing tag.
struct Frame {
    kind: BlockKind,
    offset: usize,
    path: String,
    literal: Value,
    body: Vec<Node>,
    otherwise: Option<Vec<Node>>,
}

impl Frame {
    fn open(kind: BlockKind, offset: usize, path: &str, literal: Value) -> Self {
        Self {
            kind,
            offset,
            path: path.to_string(),
            literal,
            body: Vec::new(),
            otherwise: None,
        }
    }

    fn branch(&mut self) -> &mut Vec<Node> {
        match self.otherwise.as_mut() {
            Some(otherwise) => otherwise,
            None => &mut self.body,
        }
    }

    fn close(self) -> Node {
        match self.kind {
            BlockKind::Each => Node::Each {
                path: self.path,
                body: self.body,
            },
            BlockKind::If => Node::If {
                path: self.path,
                literal: self.literal,
                then: self.body,
                otherwise: self.otherwise.unwrap_or_default(),
            },
        }
    }
}

struct Parser {
    root: Vec<Node>,
    stack: Vec<Frame>,
}

impl Parser {
    fn sink(&mut self) -> &mut Vec<Node> {
        match self.stack.last_mut() {
            Some(frame) => frame.branch(),
            None => &mut self.root,
        }
    }

    fn push(&mut self, node: Node) {
        self.sink().push(node);
    }

    fn open(&mut self, kind: BlockKind, offset: usize, path: &str, literal: Value) -> Result<(), TemplateError> {
        if self.stack.iter().any(|frame| frame.kind == kind) {
            return Err(TemplateError::NestedBlock {
                block: kind.name(),
                offset,
            });
        }
        self.stack.push(Frame::open(kind, offset, path, literal));
        Ok(())
    }

    fn close(&mut self, tag: &str, offset: usize) -> Result<(), TemplateError> {
        let name = tag[1..].trim();
        match self.stack.pop() {
            Some(frame) if frame.kind.name() == name => {
                let node = frame.close();
                self.push(node);
                Ok(())
            }
            _ => Err(TemplateError::UnexpectedTag {
                tag: tag.to_string(),
                offset,
            }),
        }
    }

    fn otherwise(&mut self, offset: usize) -> Result<(), TemplateError> {
        match self.stack.last_mut() {
            Some(frame) if frame.kind == BlockKind::If && frame.otherwise.is_none() => {
                frame.otherwise = Some(Vec::new());
                Ok(())
            }
            _ => Err(TemplateError::UnexpectedTag {
                tag: "else".to_string(),
                offset,
            }),
        }
    }

    fn finish(self) -> Result<Vec<Node>, TemplateError> {
        match self.stack.last() {
            Some(frame) => Err(TemplateError::UnclosedBlock {
                block: frame.kind.name(),
                offset: frame.offset,
            }),
            None => Ok(self.root),
        }
    }
}

pub(super) fn parse(source: &str) -> Result<Vec<Node>, TemplateError> {
    let mut parser = Parser {
        root: Vec::new(),
        stack: Vec::new(),
    };
    let mut pos = 0;

    while let Some(rel) = source[pos..].find("{{") {
        let start = pos + rel;
        if start > pos {
            parser.push(Node::Text(source[pos..start].to_string()));
        }

        let (open, close) = if source[start..].starts_with("{{{") {
            ("{{{", "}}}")
        } else {
            ("{{", "}}")
        };
        let inner_start = start + open.len();
        let inner_len = source[inner_start..]
            .find(close)
            .ok_or(TemplateError::UnclosedTag { offset: start })?;
        let tag = source[inner_start..inner_start + inner_len].trim();
        pos = inner_start + inner_len + close.len();

        if tag.is_empty() {
            return Err(TemplateError::EmptyTag { offset: start });
        }
        if open == "{{{" {
            parser.push(Node::Var(tag.to_string()));
            continue;
        }

        if tag == "else" {
            parser.otherwise(start)?;
        } else if tag.starts_with('/') {
            parser.close(tag, start)?;
        } else if let Some(helper) = tag.strip_prefix('#') {
            let (name, args) = helper
                .split_once(char::is_whitespace)
                .unwrap_or((helper, ""));
            let args = args.trim();
            match name {
                "each" => {
                    if !is_path(args) {
                        return Err(TemplateError::InvalidCondition {
                            condition: args.to_string(),
                            offset: start,
                        });
                    }
                    parser.open(BlockKind::Each, start, args, Value::Null)?;
                }
                "if" => {
                    let (path, literal) =
                        parse_condition(args).ok_or_else(|| TemplateError::InvalidCondition {
                            condition: args.to_string(),
                            offset: start,
                        })?;
                    parser.open(BlockKind::If, start, path, literal)?;
                }
                _ => {
                    return Err(TemplateError::UnknownHelper {
                        helper: name.to_string(),
                        offset: start,
                    });
                }
            }
        } else {
            parser.push(Node::Var(tag.to_string()));
        }
    }

    if pos < source.len() {
        parser.push(Node::Text(source[pos..].to_string()));
    }

    parser.finish()
}

fn parse_condition(condition: &str) -> Option<(&str, Value)> {
    let (path, literal) = condition.split_once("==")?;
    let path = path.trim();
    if !is_path(path) {
        return None;
    }
    Some((path, parse_literal(literal.trim())?))
}

fn parse_literal(raw: &str) -> Option<Value> {
    if let Some(inner) = raw.strip_prefix('\'').and_then(|r| r.strip_suffix('\'')) {
        return Some(Value::String(inner.to_string()));
    }
    match serde_json::from_str::<Value>(raw).ok()? {
        literal @ (Value::String(_) | Value::Number(_) | Value::Bool(_)) => Some(literal),
        _ => None,
    }
}

fn is_path(path: &str) -> bool {
    !path.is_empty() && !path.contains(char::is_whitespace)
}
