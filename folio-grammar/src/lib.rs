//! # Rule-table grammars
//!
//! `folio-grammar` is a small backtracking parser driven by a declarative
//! rule table. A grammar maps rule names to expressions, where an expression
//! is one or more alternatives separated by `" | "` and each alternative is a
//! space-separated sequence of elements. An element that names another rule
//! is a sub-rule reference; anything else is compiled as a regular-expression
//! token matched at the current position (after skipping the grammar's
//! whitespace pattern).
//!
//! ## Example
//! ```
//! use folio_grammar::Grammar;
//!
//! let grammar = Grammar::new([
//!     ("num", r"[0-9]+"),
//!     ("sum", r"num \+ num | num"),
//! ])
//! .unwrap();
//!
//! let nodes = grammar.parse("sum", "1 + 2").unwrap().unwrap();
//! assert_eq!(nodes.len(), 1);
//! assert_eq!(nodes[0].name(), Some("sum"));
//! ```
//!
//! Alternatives are tried strictly in declaration order and the first fully
//! matching one wins. Once an element inside an alternative has matched, the
//! parser never re-enters it: a later element failing abandons the whole
//! alternative and the next one is retried from the original position. This
//! is ordered-choice parsing, not longest-match.
//!
//! The engine does not detect left recursion or rule cycles that consume no
//! input; a grammar containing either can loop forever. Keeping rules
//! progress-making is the caller's responsibility.

use regex::Regex;
use std::collections::HashMap;
use std::fmt;

/// Default inter-token whitespace pattern.
pub const WHITESPACE: &str = r"\s*";

/// Reserved rule name carrying the whitespace pattern when supplied through
/// the rule table itself.
const WHITESPACE_RULE: &str = "whitespace";

/// One node of a parse tree: either a matched literal, or a rule application
/// with the matched sub-trees as children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Text matched by a token element.
    Leaf(String),
    /// A successfully applied rule and the nodes its elements produced.
    Rule { name: String, children: Vec<Node> },
}

impl Node {
    /// Rule name for rule nodes, `None` for leaves.
    pub fn name(&self) -> Option<&str> {
        match self {
            Node::Rule { name, .. } => Some(name),
            Node::Leaf(_) => None,
        }
    }

    /// Child nodes; empty for leaves.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Rule { children, .. } => children,
            Node::Leaf(_) => &[],
        }
    }

    /// Matched text for leaves, `None` for rule nodes.
    pub fn leaf_text(&self) -> Option<&str> {
        match self {
            Node::Leaf(text) => Some(text),
            Node::Rule { .. } => None,
        }
    }
}

/// Errors surfaced by grammar construction and parsing.
#[derive(Debug)]
pub enum GrammarError {
    /// `parse` was asked for a rule the table does not declare.
    UnknownRule(String),
    /// A token element is not a valid regular expression.
    BadToken {
        rule: String,
        pattern: String,
        source: regex::Error,
    },
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarError::UnknownRule(name) => write!(f, "unknown rule: '{name}'"),
            GrammarError::BadToken { rule, pattern, .. } => {
                write!(f, "invalid token pattern '{pattern}' in rule '{rule}'")
            }
        }
    }
}

impl std::error::Error for GrammarError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GrammarError::BadToken { source, .. } => Some(source),
            GrammarError::UnknownRule(_) => None,
        }
    }
}

#[derive(Debug)]
struct Token {
    matcher: Regex,
}

impl Token {
    fn compile(rule: &str, pattern: &str, whitespace: &str) -> Result<Token, GrammarError> {
        // The whole match (group 0) includes the skipped separators, the
        // token text itself is group 1.
        let anchored = if whitespace.is_empty() {
            format!(r"\A({pattern})")
        } else {
            format!(r"\A(?:{whitespace})({pattern})")
        };
        let matcher = Regex::new(&anchored).map_err(|source| GrammarError::BadToken {
            rule: rule.to_string(),
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Token { matcher })
    }
}

#[derive(Debug)]
enum Element {
    Rule(usize),
    Token(Token),
}

#[derive(Debug)]
struct Rule {
    name: String,
    alternatives: Vec<Vec<Element>>,
}

/// An immutable rule table ready for parsing. Construct once, share freely;
/// `parse` only reads.
#[derive(Debug)]
pub struct Grammar {
    rules: Vec<Rule>,
    index: HashMap<String, usize>,
}

impl Grammar {
    /// Builds a grammar with the default whitespace pattern (`\s*`).
    pub fn new<'a, I>(rules: I) -> Result<Grammar, GrammarError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        Grammar::with_whitespace(rules, WHITESPACE)
    }

    /// Builds a grammar with an explicit whitespace pattern. An empty pattern
    /// disables implicit whitespace skipping entirely. A rule named
    /// `whitespace` in the table overrides the parameter.
    pub fn with_whitespace<'a, I>(rules: I, whitespace: &str) -> Result<Grammar, GrammarError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let definitions: Vec<(&str, &str)> = rules.into_iter().collect();

        let whitespace = definitions
            .iter()
            .find(|(name, _)| *name == WHITESPACE_RULE)
            .map(|(_, pattern)| *pattern)
            .unwrap_or(whitespace);

        let named: Vec<(&str, &str)> = definitions
            .into_iter()
            .filter(|(name, _)| *name != WHITESPACE_RULE)
            .collect();

        let index: HashMap<String, usize> = named
            .iter()
            .enumerate()
            .map(|(id, (name, _))| (name.to_string(), id))
            .collect();

        let mut rules = Vec::with_capacity(named.len());
        for (name, expression) in &named {
            let mut alternatives = Vec::new();
            for alternative in expression.split(" | ") {
                let mut elements = Vec::new();
                for element in alternative.split_whitespace() {
                    // Elements naming a declared rule become references,
                    // everything else is a token pattern. An element naming
                    // an undeclared rule therefore falls through to token
                    // matching.
                    let element = match index.get(element) {
                        Some(&id) => Element::Rule(id),
                        None => Element::Token(Token::compile(name, element, whitespace)?),
                    };
                    elements.push(element);
                }
                alternatives.push(elements);
            }
            rules.push(Rule {
                name: name.to_string(),
                alternatives,
            });
        }

        Ok(Grammar { rules, index })
    }

    /// Applies the named rule repeatedly until `text` is fully consumed and
    /// returns the sequence of top-level parse nodes. Returns `Ok(None)` when
    /// any part of the text cannot be matched, and an error when `rule` is
    /// not declared. An empty input parses to an empty sequence.
    pub fn parse(&self, rule: &str, text: &str) -> Result<Option<Vec<Node>>, GrammarError> {
        let &id = self
            .index
            .get(rule)
            .ok_or_else(|| GrammarError::UnknownRule(rule.to_string()))?;

        let mut parsed = Vec::new();
        let mut rest = text;
        while !rest.is_empty() {
            match self.apply_rule(id, rest) {
                Some((node, remainder)) => {
                    parsed.push(node);
                    rest = remainder;
                }
                None => return Ok(None),
            }
        }
        Ok(Some(parsed))
    }

    fn apply_rule<'t>(&self, id: usize, text: &'t str) -> Option<(Node, &'t str)> {
        let rule = &self.rules[id];
        'alternatives: for alternative in &rule.alternatives {
            let mut children = Vec::with_capacity(alternative.len());
            let mut rest = text;
            for element in alternative {
                match self.apply(element, rest) {
                    Some((node, remainder)) => {
                        children.push(node);
                        rest = remainder;
                    }
                    None => continue 'alternatives,
                }
            }
            return Some((
                Node::Rule {
                    name: rule.name.clone(),
                    children,
                },
                rest,
            ));
        }
        None
    }

    fn apply<'t>(&self, element: &Element, text: &'t str) -> Option<(Node, &'t str)> {
        match element {
            Element::Rule(id) => self.apply_rule(*id, text),
            Element::Token(token) => {
                let captures = token.matcher.captures(text)?;
                let consumed = captures.get(0)?;
                let matched = captures.get(1)?;
                Some((Node::Leaf(matched.as_str().to_string()), &text[consumed.end()..]))
            }
        }
    }
}

/// Renders a parse tree as an indented outline, one node per line, leaves
/// quoted. Purely for debugging parse results.
pub fn visualize(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        visualize_into(node, 0, &mut out);
    }
    out
}

fn visualize_into(node: &Node, depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str("    ");
    }
    match node {
        Node::Leaf(text) => {
            out.push('\'');
            out.push_str(text);
            out.push_str("'\n");
        }
        Node::Rule { name, children } => {
            out.push_str(name);
            out.push('\n');
            for child in children {
                visualize_into(child, depth + 1, out);
            }
        }
    }
}
