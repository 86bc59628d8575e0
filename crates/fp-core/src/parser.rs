//! Statement parser: source text → syntax tree.
//!
//! Token-level scanning uses `winnow` primitives over a byte-offset
//! tracking cursor so every [`ParseError`] carries the position of the
//! failure and the token class expected there. Statement assembly is
//! parse-then-commit: a fragment is fully parsed into an intermediate
//! [`ParsedStatement`] before any node is touched, so malformed input
//! never leaves a half-mutated tree.

use crate::error::{CoreError, ParseError};
use crate::model::{AstNode, NodeKind, SyntaxTree};
use petgraph::graph::NodeIndex;
use winnow::ascii::space0;
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::{take_till, take_while};

/// Value-type keywords that open a variable definition.
const TYPE_KEYWORDS: &[&str] = &[
    "int", "float", "boolean", "string", "json", "xml", "map", "message",
];

// ─── Cursor ──────────────────────────────────────────────────────────────

/// Input window plus the original length, for offset reporting.
struct Cursor<'a> {
    rest: &'a str,
    full: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            rest: input,
            full: input.len(),
        }
    }

    fn offset(&self) -> usize {
        self.full - self.rest.len()
    }

    fn at_end(&self) -> bool {
        self.rest.is_empty()
    }

    fn peek(&self) -> Option<char> {
        self.rest.chars().next()
    }

    fn error(&self, expected: impl Into<String>) -> ParseError {
        ParseError {
            offset: self.offset(),
            expected: expected.into(),
            found: found_at(self.rest),
        }
    }

    /// Consume spaces and tabs (not newlines).
    fn skip_space(&mut self) {
        let _: Result<&str, ErrMode<ContextError>> = space0.parse_next(&mut self.rest);
    }

    /// Consume all whitespace including newlines.
    fn skip_ws(&mut self) {
        self.rest = self.rest.trim_start();
    }

    fn eat(&mut self, c: char) -> bool {
        if self.rest.starts_with(c) {
            self.rest = &self.rest[c.len_utf8()..];
            true
        } else {
            false
        }
    }

    /// Consume `kw` only when followed by a word boundary.
    fn keyword(&mut self, kw: &str) -> bool {
        if let Some(after) = self.rest.strip_prefix(kw)
            && after
                .chars()
                .next()
                .is_none_or(|c| !c.is_alphanumeric() && c != '_')
        {
            self.rest = after;
            return true;
        }
        false
    }

    fn ident(&mut self) -> Result<&'a str, ParseError> {
        let parsed: Result<&str, ErrMode<ContextError>> =
            take_while(1.., |c: char| c.is_alphanumeric() || c == '_').parse_next(&mut self.rest);
        parsed.map_err(|_| self.error("identifier"))
    }

    /// Collect `//` comment lines (and surrounding whitespace) ahead of a
    /// statement.
    fn comments(&mut self) -> Vec<String> {
        let mut out = Vec::new();
        loop {
            self.skip_ws();
            if let Some(after) = self.rest.strip_prefix("//") {
                self.rest = after;
                let line: Result<&str, ErrMode<ContextError>> =
                    take_till(0.., '\n').parse_next(&mut self.rest);
                if let Ok(line) = line {
                    out.push(line.trim().to_string());
                }
            } else {
                return out;
            }
        }
    }

    /// Scan an expression up to the first of `stops` at bracket depth 0.
    /// Consumes the scanned text but not the stop character.
    fn expression_until(
        &mut self,
        stops: &[char],
        expected: &'static str,
    ) -> Result<String, ParseError> {
        let start_error = self.error(expected);
        let mut depth = 0usize;
        let mut end = self.rest.len();
        for (i, c) in self.rest.char_indices() {
            if depth == 0 && stops.contains(&c) {
                end = i;
                break;
            }
            match c {
                '(' | '[' => depth += 1,
                ')' | ']' => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
        let text = self.rest[..end].trim();
        if text.is_empty() {
            return Err(start_error);
        }
        self.rest = &self.rest[end..];
        Ok(text.to_string())
    }
}

/// Short preview of the offending input, for error messages.
fn found_at(rest: &str) -> String {
    let rest = rest.trim_start();
    if rest.is_empty() {
        return "end of input".to_string();
    }
    let token: String = rest
        .chars()
        .take_while(|c| !c.is_whitespace())
        .take(12)
        .collect();
    format!("`{token}`")
}

// ─── Intermediate representation ─────────────────────────────────────────

/// A fully parsed statement, not yet in any tree.
#[derive(Debug)]
struct ParsedStatement {
    comments: Vec<String>,
    kind: ParsedKind,
}

#[derive(Debug)]
enum ParsedKind {
    Assignment {
        target: String,
        value: String,
    },
    VariableDefinition {
        type_name: String,
        name: String,
        value: Option<String>,
    },
    Return {
        value: Option<String>,
    },
    Break,
    IfElse {
        condition: String,
        then_body: Vec<ParsedStatement>,
        else_body: Option<Vec<ParsedStatement>>,
    },
}

impl ParsedKind {
    fn keyword(&self) -> &'static str {
        match self {
            Self::Assignment { .. } => "assignment",
            Self::VariableDefinition { .. } => "variable-definition",
            Self::Return { .. } => "return",
            Self::Break => "break",
            Self::IfElse { .. } => "if-else",
        }
    }
}

// ─── Statement grammar ───────────────────────────────────────────────────

/// Stop set for simple-statement operand expressions.
const EXPR_STOPS: &[char] = &[';', '\n', '}'];

fn parse_statement(cur: &mut Cursor<'_>) -> Result<ParsedKind, ParseError> {
    cur.skip_ws();

    if cur.keyword("return") {
        cur.skip_space();
        let value = match cur.peek() {
            None | Some(';') | Some('\n') | Some('}') => None,
            _ => Some(cur.expression_until(EXPR_STOPS, "return expression")?),
        };
        cur.skip_space();
        cur.eat(';');
        return Ok(ParsedKind::Return { value });
    }

    if cur.keyword("break") {
        cur.skip_space();
        cur.eat(';');
        return Ok(ParsedKind::Break);
    }

    if cur.keyword("if") {
        return parse_if_else(cur);
    }

    let first = cur
        .ident()
        .map_err(|mut e| {
            e.expected = "a statement".into();
            e
        })?
        .to_string();
    cur.skip_space();

    if TYPE_KEYWORDS.contains(&first.as_str()) {
        // variable definition: type ident ('=' expr)? ';'
        let name = cur.ident()?.to_string();
        cur.skip_space();
        let value = if cur.eat('=') {
            cur.skip_space();
            Some(cur.expression_until(EXPR_STOPS, "initializer expression")?)
        } else {
            None
        };
        cur.skip_space();
        cur.eat(';');
        return Ok(ParsedKind::VariableDefinition {
            type_name: first,
            name,
            value,
        });
    }

    // assignment: ident '=' expr ';'
    if !cur.eat('=') {
        return Err(cur.error("`=`"));
    }
    if cur.peek() == Some('=') {
        return Err(cur.error("expression"));
    }
    cur.skip_space();
    let value = cur.expression_until(EXPR_STOPS, "expression")?;
    cur.skip_space();
    cur.eat(';');
    Ok(ParsedKind::Assignment {
        target: first,
        value,
    })
}

fn parse_if_else(cur: &mut Cursor<'_>) -> Result<ParsedKind, ParseError> {
    cur.skip_space();
    if !cur.eat('(') {
        return Err(cur.error("`(`"));
    }
    cur.skip_ws();
    let condition = cur.expression_until(&[')'], "condition expression")?;
    if !cur.eat(')') {
        return Err(cur.error("`)`"));
    }
    cur.skip_ws();
    let then_body = parse_block(cur)?;

    let checkpoint = cur.rest;
    cur.skip_ws();
    let else_body = if cur.keyword("else") {
        cur.skip_ws();
        Some(parse_block(cur)?)
    } else {
        cur.rest = checkpoint;
        None
    };

    Ok(ParsedKind::IfElse {
        condition,
        then_body,
        else_body,
    })
}

fn parse_block(cur: &mut Cursor<'_>) -> Result<Vec<ParsedStatement>, ParseError> {
    if !cur.eat('{') {
        return Err(cur.error("`{`"));
    }
    let mut statements = Vec::new();
    loop {
        let comments = cur.comments();
        if cur.eat('}') {
            return Ok(statements);
        }
        if cur.at_end() {
            return Err(cur.error("`}`"));
        }
        let kind = parse_statement(cur)?;
        statements.push(ParsedStatement { comments, kind });
    }
}

// ─── Tree construction ───────────────────────────────────────────────────

fn node_kind_of(kind: &ParsedKind) -> NodeKind {
    match kind {
        ParsedKind::Assignment { target, value } => NodeKind::Assignment {
            target: target.clone(),
            value: value.clone(),
        },
        ParsedKind::VariableDefinition {
            type_name,
            name,
            value,
        } => NodeKind::VariableDefinition {
            type_name: type_name.clone(),
            name: name.clone(),
            value: value.clone(),
        },
        ParsedKind::Return { value } => NodeKind::Return {
            value: value.clone(),
        },
        ParsedKind::Break => NodeKind::Break,
        ParsedKind::IfElse { condition, .. } => NodeKind::IfElse {
            condition: condition.clone(),
        },
    }
}

fn attach_operand(tree: &mut SyntaxTree, parent: NodeIndex, text: String) {
    let expr = tree.add_detached(AstNode::new(NodeKind::Expression { text }));
    let _ = tree.append_child(parent, expr);
}

/// Build the child subtrees implied by a parsed statement: operand
/// expressions for simple statements, block subtrees for if/else.
fn populate_children(tree: &mut SyntaxTree, idx: NodeIndex, kind: ParsedKind) {
    match kind {
        ParsedKind::Assignment { target, value } => {
            attach_operand(tree, idx, target);
            attach_operand(tree, idx, value);
        }
        ParsedKind::VariableDefinition { value, .. } => {
            if let Some(value) = value {
                attach_operand(tree, idx, value);
            }
        }
        ParsedKind::Return { value } => {
            if let Some(value) = value {
                attach_operand(tree, idx, value);
            }
        }
        ParsedKind::Break => {}
        ParsedKind::IfElse {
            then_body,
            else_body,
            ..
        } => {
            let then_idx = tree.add_detached(AstNode::new(NodeKind::Block));
            let _ = tree.append_child(idx, then_idx);
            for stmt in then_body {
                materialize_into(tree, then_idx, stmt);
            }
            if let Some(else_stmts) = else_body {
                let else_idx = tree.add_detached(AstNode::new(NodeKind::Block));
                let _ = tree.append_child(idx, else_idx);
                for stmt in else_stmts {
                    materialize_into(tree, else_idx, stmt);
                }
            }
        }
    }
}

/// Create a parsed statement as a fresh subtree under `parent`.
fn materialize_into(tree: &mut SyntaxTree, parent: NodeIndex, parsed: ParsedStatement) -> NodeIndex {
    let mut node = AstNode::new(node_kind_of(&parsed.kind));
    node.comments = parsed.comments;
    let idx = tree.add_detached(node);
    let _ = tree.append_child(parent, idx);
    populate_children(tree, idx, parsed.kind);
    idx
}

// ─── Public entry points ─────────────────────────────────────────────────

/// Parse a whole program (top-level statement sequence) into a fresh tree.
#[must_use = "parsing result should be used"]
pub fn parse_program(input: &str) -> Result<SyntaxTree, ParseError> {
    let mut tree = SyntaxTree::new();
    let mut cur = Cursor::new(input);
    loop {
        let comments = cur.comments();
        if cur.at_end() {
            break;
        }
        let kind = parse_statement(&mut cur)?;
        let root = tree.root;
        materialize_into(&mut tree, root, ParsedStatement { comments, kind });
    }
    Ok(tree)
}

/// Re-parse a node's statement from a single-statement source fragment
/// (trailing terminator optional).
///
/// Parse-then-commit: on error the node keeps its prior state. On success
/// the node's operand fields are rebuilt, previous children are discarded
/// and replaced, and dirty propagation completes before returning. A
/// syntactically valid fragment of the *wrong* kind (e.g. `int i1 = 0`
/// offered to an assignment node) is a [`ParseError`] naming the expected
/// kind.
pub fn set_statement_from_string(
    tree: &mut SyntaxTree,
    idx: NodeIndex,
    text: &str,
) -> Result<(), CoreError> {
    let mut cur = Cursor::new(text);
    let kind = parse_statement(&mut cur)?;
    cur.skip_ws();
    if !cur.at_end() {
        return Err(cur.error("end of statement").into());
    }

    let Some(node) = tree.get(idx) else {
        return Ok(());
    };
    if !kind_matches(&node.kind, &kind) {
        return Err(ParseError {
            offset: 0,
            expected: format!("{} statement", node.kind.keyword()),
            found: format!("{} statement", kind.keyword()),
        }
        .into());
    }

    // Commit: replace operand fields and rebuild the child subtrees.
    for child in tree.children(idx).to_vec() {
        tree.delete_subtree(child);
    }
    if let Some(node) = tree.get_mut(idx) {
        log::debug!("reparse {} from {} fragment", node.id, kind.keyword());
        node.kind = node_kind_of(&kind);
    }
    populate_children(tree, idx, kind);
    tree.mark_dirty(idx);
    Ok(())
}

fn kind_matches(node: &NodeKind, parsed: &ParsedKind) -> bool {
    matches!(
        (node, parsed),
        (NodeKind::Assignment { .. }, ParsedKind::Assignment { .. })
            | (
                NodeKind::VariableDefinition { .. },
                ParsedKind::VariableDefinition { .. }
            )
            | (NodeKind::Return { .. }, ParsedKind::Return { .. })
            | (NodeKind::Break, ParsedKind::Break)
            | (NodeKind::IfElse { .. }, ParsedKind::IfElse { .. })
    )
}
