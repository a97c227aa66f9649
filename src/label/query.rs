//! A small XPath subset used by label column expressions.
//!
//! Supported: absolute and relative location paths, `//`, `.`, `..`, `*`,
//! `@name`, `@*`, `text()`, unions with `|`, quoted string literals, and the
//! predicates `[n]`, `[@a]`, `[@a='v']`, `[child='v']`.

use thiserror::Error;

/// Read-only view of an XML element, enough to evaluate a [`Query`].
pub trait Queryable: Copy + PartialEq {
    fn element_name(&self) -> &str;
    fn attr_value(&self, name: &str) -> Option<&str>;
    fn attr_pairs(&self) -> Vec<(&str, &str)>;
    fn parent_node(&self) -> Option<Self>;
    fn child_nodes(&self) -> Vec<Self>;
    fn own_text(&self) -> Option<&str>;
    fn document_root(&self) -> Self;
}

impl<'a, 'input: 'a> Queryable for roxmltree::Node<'a, 'input> {
    fn element_name(&self) -> &str {
        self.tag_name().name()
    }

    fn attr_value(&self, name: &str) -> Option<&str> {
        self.attribute(name)
    }

    fn attr_pairs(&self) -> Vec<(&str, &str)> {
        self.attributes().map(|a| (a.name(), a.value())).collect()
    }

    fn parent_node(&self) -> Option<Self> {
        self.parent_element()
    }

    fn child_nodes(&self) -> Vec<Self> {
        self.children().filter(|c| c.is_element()).collect()
    }

    fn own_text(&self) -> Option<&str> {
        self.text()
    }

    fn document_root(&self) -> Self {
        self.document().root_element()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("{message} at offset {offset}")]
pub struct QueryError {
    pub offset: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Literal(String),
    Union(Vec<LocationPath>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationPath {
    absolute: bool,
    steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    /// Preceded by `//`: the context is widened to descendant-or-self first.
    descend: bool,
    axis: Axis,
    test: NodeTest,
    predicates: Vec<Predicate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    SelfNode,
    Parent,
    Attribute,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeTest {
    Name(String),
    Any,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    Position(usize),
    HasAttr(String),
    AttrEquals(String, String),
    ChildEquals(String, String),
}

/// A selected node. Attributes and text keep their owner element so that
/// equal values on different elements stay distinct matches.
#[derive(Debug, Clone, PartialEq)]
enum Item<N> {
    Document,
    Element(N),
    Attribute(N, String),
    Text(N),
}

impl Query {
    pub fn parse(text: &str) -> Result<Self, QueryError> {
        let mut p = Cursor { src: text, pos: 0 };
        p.skip_ws();
        let query = if matches!(p.peek(), Some('\'' | '"')) {
            Query::Literal(p.literal()?)
        } else {
            let mut paths = vec![p.path()?];
            loop {
                p.skip_ws();
                if p.eat("|") {
                    p.skip_ws();
                    paths.push(p.path()?);
                } else {
                    break;
                }
            }
            Query::Union(paths)
        };
        p.skip_ws();
        if p.pos < text.len() {
            return Err(p.error("unexpected trailing input"));
        }
        Ok(query)
    }

    /// String values of every match, in document order per path.
    pub fn evaluate<N: Queryable>(&self, node: N) -> Vec<String> {
        match self {
            Query::Literal(s) => vec![s.clone()],
            Query::Union(paths) => paths
                .iter()
                .flat_map(|p| p.select(node))
                .map(|item| match item {
                    Item::Document => String::new(),
                    Item::Element(e) => e.own_text().unwrap_or("").trim().to_string(),
                    Item::Attribute(e, name) => e.attr_value(&name).unwrap_or("").to_string(),
                    Item::Text(e) => e.own_text().unwrap_or("").to_string(),
                })
                .collect(),
        }
    }
}

impl LocationPath {
    fn select<N: Queryable>(&self, node: N) -> Vec<Item<N>> {
        let mut context = if self.absolute {
            vec![Item::Document]
        } else {
            vec![Item::Element(node)]
        };
        for step in &self.steps {
            let mut next: Vec<Item<N>> = Vec::new();
            for item in &context {
                let origins = if step.descend {
                    descendants_or_self(item, node)
                } else {
                    vec![item.clone()]
                };
                for origin in &origins {
                    let candidates = step.apply(origin, node);
                    for c in step.filter(candidates) {
                        if !next.contains(&c) {
                            next.push(c);
                        }
                    }
                }
            }
            context = next;
        }
        if self.absolute && self.steps.is_empty() {
            return vec![Item::Element(node.document_root())];
        }
        context
    }
}

fn descendants_or_self<N: Queryable>(item: &Item<N>, node: N) -> Vec<Item<N>> {
    fn walk<N: Queryable>(e: N, out: &mut Vec<Item<N>>) {
        out.push(Item::Element(e));
        for c in e.child_nodes() {
            walk(c, out);
        }
    }
    let mut out = Vec::new();
    match item {
        Item::Document => {
            out.push(Item::Document);
            walk(node.document_root(), &mut out);
        }
        Item::Element(e) => walk(*e, &mut out),
        Item::Attribute(..) | Item::Text(_) => out.push(item.clone()),
    }
    out
}

impl Step {
    fn apply<N: Queryable>(&self, item: &Item<N>, node: N) -> Vec<Item<N>> {
        match (self.axis, item) {
            (Axis::SelfNode, _) => vec![item.clone()],
            (Axis::Parent, Item::Element(e)) => match e.parent_node() {
                Some(p) => vec![Item::Element(p)],
                None => vec![Item::Document],
            },
            (Axis::Parent, Item::Attribute(e, _) | Item::Text(e)) => vec![Item::Element(*e)],
            (Axis::Child, Item::Document) => {
                let root = node.document_root();
                if self.matches_element(root) {
                    vec![Item::Element(root)]
                } else {
                    Vec::new()
                }
            }
            (Axis::Child, Item::Element(e)) => match &self.test {
                NodeTest::Text => e
                    .own_text()
                    .filter(|t| !t.trim().is_empty())
                    .map(|_| vec![Item::Text(*e)])
                    .unwrap_or_default(),
                _ => e
                    .child_nodes()
                    .into_iter()
                    .filter(|c| self.matches_element(*c))
                    .map(Item::Element)
                    .collect(),
            },
            (Axis::Attribute, Item::Element(e)) => match &self.test {
                NodeTest::Name(n) => e
                    .attr_value(n)
                    .map(|_| vec![Item::Attribute(*e, n.clone())])
                    .unwrap_or_default(),
                NodeTest::Any => e
                    .attr_pairs()
                    .into_iter()
                    .map(|(name, _)| Item::Attribute(*e, name.to_string()))
                    .collect(),
                NodeTest::Text => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    fn matches_element<N: Queryable>(&self, e: N) -> bool {
        match &self.test {
            NodeTest::Name(n) => e.element_name() == n,
            NodeTest::Any => true,
            NodeTest::Text => false,
        }
    }

    fn filter<N: Queryable>(&self, mut items: Vec<Item<N>>) -> Vec<Item<N>> {
        for pred in &self.predicates {
            items = match pred {
                Predicate::Position(n) => items.into_iter().nth(n - 1).into_iter().collect(),
                _ => items.into_iter().filter(|i| pred.holds(i)).collect(),
            };
        }
        items
    }
}

impl Predicate {
    fn holds<N: Queryable>(&self, item: &Item<N>) -> bool {
        let Item::Element(e) = item else {
            return false;
        };
        match self {
            Predicate::Position(_) => true,
            Predicate::HasAttr(a) => e.attr_value(a).is_some(),
            Predicate::AttrEquals(a, v) => e.attr_value(a) == Some(v.as_str()),
            Predicate::ChildEquals(c, v) => e
                .child_nodes()
                .iter()
                .any(|ch| ch.element_name() == c && ch.own_text().unwrap_or("").trim() == v),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Parser
// ────────────────────────────────────────────────────────────────────────────

struct Cursor<'s> {
    src: &'s str,
    pos: usize,
}

impl<'s> Cursor<'s> {
    fn rest(&self) -> &'s str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn error(&self, message: &str) -> QueryError {
        QueryError {
            offset: self.pos,
            message: message.to_string(),
        }
    }

    fn literal(&mut self) -> Result<String, QueryError> {
        let quote = match self.peek() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(self.error("expected a quoted literal")),
        };
        let body = &self.rest()[1..];
        let end = body
            .find(quote)
            .ok_or_else(|| self.error("unterminated string literal"))?;
        let value = body[..end].to_string();
        self.pos += end + 2;
        Ok(value)
    }

    fn name(&mut self) -> Result<String, QueryError> {
        let rest = self.rest();
        let first = rest.chars().next();
        if !first.is_some_and(|c| c.is_alphabetic() || c == '_') {
            return Err(self.error("expected a name"));
        }
        let len = rest
            .char_indices()
            .find(|(_, c)| !(c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        self.pos += len;
        Ok(rest[..len].to_string())
    }

    fn path(&mut self) -> Result<LocationPath, QueryError> {
        let mut steps = Vec::new();
        let mut absolute = false;
        let mut descend = false;
        if self.eat("//") {
            absolute = true;
            descend = true;
        } else if self.eat("/") {
            absolute = true;
            self.skip_ws();
            if self.rest().is_empty() || matches!(self.peek(), Some('|')) {
                return Ok(LocationPath { absolute, steps });
            }
        }
        loop {
            self.skip_ws();
            steps.push(self.step(descend)?);
            self.skip_ws();
            if self.eat("//") {
                descend = true;
            } else if self.eat("/") {
                descend = false;
            } else {
                break;
            }
        }
        Ok(LocationPath { absolute, steps })
    }

    fn step(&mut self, descend: bool) -> Result<Step, QueryError> {
        let simple = |axis, test| Step {
            descend,
            axis,
            test,
            predicates: Vec::new(),
        };
        if self.eat("..") {
            return Ok(simple(Axis::Parent, NodeTest::Any));
        }
        if self.eat(".") {
            return Ok(simple(Axis::SelfNode, NodeTest::Any));
        }
        if self.eat("@") {
            if self.eat("*") {
                return Ok(simple(Axis::Attribute, NodeTest::Any));
            }
            let n = self.name()?;
            return Ok(simple(Axis::Attribute, NodeTest::Name(n)));
        }
        if self.eat("text()") {
            return Ok(simple(Axis::Child, NodeTest::Text));
        }
        let test = if self.eat("*") {
            NodeTest::Any
        } else {
            NodeTest::Name(self.name()?)
        };
        let mut step = simple(Axis::Child, test);
        loop {
            self.skip_ws();
            if !self.eat("[") {
                break;
            }
            self.skip_ws();
            step.predicates.push(self.predicate()?);
            self.skip_ws();
            if !self.eat("]") {
                return Err(self.error("expected `]`"));
            }
        }
        Ok(step)
    }

    fn predicate(&mut self) -> Result<Predicate, QueryError> {
        let digits: String = self.rest().chars().take_while(|c| c.is_ascii_digit()).collect();
        if !digits.is_empty() {
            self.pos += digits.len();
            return match digits.parse::<usize>() {
                Ok(n) if n > 0 => Ok(Predicate::Position(n)),
                _ => Err(self.error("positions start at 1")),
            };
        }
        let on_attr = self.eat("@");
        let name = self.name()?;
        self.skip_ws();
        if !self.eat("=") {
            return if on_attr {
                Ok(Predicate::HasAttr(name))
            } else {
                Err(self.error("expected `=`"))
            };
        }
        self.skip_ws();
        let value = self.literal()?;
        Ok(if on_attr {
            Predicate::AttrEquals(name, value)
        } else {
            Predicate::ChildEquals(name, value)
        })
    }
}
