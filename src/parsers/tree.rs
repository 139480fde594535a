// Copyright 2020 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Parse trees, and building them from a derivation's events.
//!
//! Nodes live in one flat `im::Vector` and refer to their children by
//! `NodeId`, so dropping, comparing or cloning a tree never recurses,
//! however deeply the derivation nests.

use {
  crate::{
    automaton::{Automaton, RuleIndex, TokenType},
    parsers::earley::backpointer::Event,
    utils::{to_pretty_string, Name, ToDoc},
  },
  im::Vector,
  std::ops::Range,
};

/// Index of a node within its `ParseTree`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct NodeId(usize);

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct TerminalLeaf {
  index: usize,
  token: TokenType,
}

impl TerminalLeaf {
  /// The position of the token in the input.
  pub fn index(&self) -> usize {
    self.index
  }

  pub fn token(&self) -> TokenType {
    self.token
  }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RuleNode {
  rule: RuleIndex,
  name: Name,
  span: Range<usize>,
  children: Vec<NodeId>,
}

impl RuleNode {
  pub fn rule(&self) -> RuleIndex {
    self.rule
  }

  pub fn name(&self) -> &Name {
    &self.name
  }

  /// The half-open range of token positions this rule covers.
  pub fn span(&self) -> Range<usize> {
    self.span.clone()
  }

  /// Child ids, in input order. Resolve them with `ParseTree::node`.
  pub fn children(&self) -> &[NodeId] {
    &self.children
  }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Node {
  Rule(RuleNode),
  Terminal(TerminalLeaf),
}

/// A single derivation of the input, rooted at the start rule.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ParseTree {
  root: RuleNode,
  nodes: Vector<Node>,
}

impl ParseTree {
  pub fn root(&self) -> &RuleNode {
    &self.root
  }

  pub fn node(&self, id: NodeId) -> Option<&Node> {
    self.nodes.get(id.0)
  }

  /// The `n`th child of `node`.
  pub fn child(&self, node: &RuleNode, n: usize) -> Option<&Node> {
    node.children.get(n).and_then(|id| self.node(*id))
  }

  pub fn children<'t>(
    &'t self,
    node: &'t RuleNode,
  ) -> impl Iterator<Item = &'t Node> + 't {
    node.children.iter().filter_map(move |id| self.node(*id))
  }

  /// The number of nodes below the root.
  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  /// The terminal leaves, left to right.
  pub fn leaves(&self) -> Vec<&TerminalLeaf> {
    let mut leaves = Vec::new();
    let mut stack: Vec<NodeId> = self.root.children.iter().rev().copied().collect();
    while let Some(id) = stack.pop() {
      match self.node(id) {
        Some(Node::Terminal(leaf)) => leaves.push(leaf),
        Some(Node::Rule(rule)) => stack.extend(rule.children.iter().rev()),
        None => {}
      }
    }
    leaves
  }

  /// The token types of the leaves, left to right.
  pub fn tokens(&self) -> Vec<TokenType> {
    self.leaves().into_iter().map(TerminalLeaf::token).collect()
  }

  pub fn to_pretty(&self) -> String {
    to_pretty_string(self, 80)
  }
}

fn leaf_doc<'a, DA: pretty::DocAllocator<'a>>(
  da: &'a DA,
  leaf: &TerminalLeaf,
) -> pretty::DocBuilder<'a, DA>
where
  DA::Doc: Clone,
{
  da.text(format!("#{}:", leaf.index))
    .append(leaf.token.to_doc(da))
}

fn rule_doc<'a, DA: pretty::DocAllocator<'a>>(
  da: &'a DA,
  node: &RuleNode,
  children: Vec<pretty::DocBuilder<'a, DA>>,
) -> pretty::DocBuilder<'a, DA>
where
  DA::Doc: Clone,
{
  let header = node
    .name
    .to_doc(da)
    .append(da.text(format!("[{}..{})", node.span.start, node.span.end)));
  if children.is_empty() {
    return header;
  }

  header
    .append(da.text(" {"))
    .append(
      da.line()
        .append(da.intersperse(children, da.line()))
        .nest(2),
    )
    .append(da.line())
    .append(da.text("}"))
    .group()
}

impl ToDoc for ParseTree {
  fn to_doc<'a, DA: pretty::DocAllocator<'a>>(
    &self,
    da: &'a DA,
  ) -> pretty::DocBuilder<'a, DA>
  where
    DA::Doc: Clone,
  {
    // Post-order walk: each frame collects the docs of its finished children.
    let mut frames = vec![(&self.root, 0, Vec::new())];
    loop {
      let (node, next, _) = match frames.last_mut() {
        Some(frame) => frame,
        None => return da.nil(),
      };

      if let Some(&id) = node.children.get(*next) {
        *next += 1;
        match self.node(id) {
          Some(Node::Rule(child)) => frames.push((child, 0, Vec::new())),
          Some(Node::Terminal(leaf)) => {
            let doc = leaf_doc(da, leaf);
            if let Some((_, _, docs)) = frames.last_mut() {
              docs.push(doc);
            }
          }
          None => {}
        }
        continue;
      }

      if let Some((node, _, docs)) = frames.pop() {
        let doc = rule_doc(da, node, docs);
        match frames.last_mut() {
          Some((_, _, parent_docs)) => parent_docs.push(doc),
          None => return doc,
        }
      }
    }
  }
}

#[derive(Debug, thiserror::Error)]
pub enum TreeError {
  #[error("expected to consume token {expected}, but the derivation consumed token {found}")]
  CursorMismatch { expected: usize, found: usize },
  #[error("derivation consumed token {0}, which is past the end of the input")]
  TokenOutOfRange(usize),
  #[error("derivation exits rule {0:?} with no rule open")]
  UnbalancedExit(RuleIndex),
  #[error("derivation exits rule {found:?} while rule {expected:?} is open")]
  MismatchedExit { expected: RuleIndex, found: RuleIndex },
  #[error("rule {0:?} is not in the automaton")]
  UnknownRule(RuleIndex),
}

struct OpenNode {
  rule: RuleIndex,
  name: Name,
  start: usize,
  children: Vec<NodeId>,
}

impl OpenNode {
  fn close(self, end: usize) -> RuleNode {
    RuleNode {
      rule: self.rule,
      name: self.name,
      span: self.start..end,
      children: self.children,
    }
  }
}

/// Builds a parse tree by replaying derivation events.
pub struct TreeBuilder<'a> {
  automaton: &'a Automaton,
  tokens: &'a [TokenType],
  cursor: usize,
  nodes: Vector<Node>,
  root: OpenNode,
  open: Vec<OpenNode>,
}

impl<'a> TreeBuilder<'a> {
  pub fn new(
    automaton: &'a Automaton,
    tokens: &'a [TokenType],
    start_rule: RuleIndex,
  ) -> Result<Self, TreeError> {
    let root = Self::open_node(automaton, start_rule, 0)?;
    Ok(TreeBuilder {
      automaton,
      tokens,
      cursor: 0,
      nodes: Vector::new(),
      root,
      open: Vec::new(),
    })
  }

  fn open_node(
    automaton: &Automaton,
    rule: RuleIndex,
    start: usize,
  ) -> Result<OpenNode, TreeError> {
    let name = automaton
      .rule_name(rule)
      .ok_or(TreeError::UnknownRule(rule))?;
    Ok(OpenNode {
      rule,
      name: name.clone(),
      start,
      children: Vec::new(),
    })
  }

  /// Stores `node` and attaches it to the innermost open rule.
  fn attach(&mut self, node: Node) {
    let id = NodeId(self.nodes.len());
    self.nodes.push_back(node);
    let top = match self.open.last_mut() {
      Some(top) => top,
      None => &mut self.root,
    };
    top.children.push(id);
  }

  pub fn push_event(&mut self, event: &Event) -> Result<(), TreeError> {
    match *event {
      Event::EnterRule(rule) => {
        let node = Self::open_node(self.automaton, rule, self.cursor)?;
        self.open.push(node);
      }
      Event::ExitRule(rule) => {
        let node = self.open.pop().ok_or(TreeError::UnbalancedExit(rule))?;
        if node.rule != rule {
          return Err(TreeError::MismatchedExit {
            expected: node.rule,
            found: rule,
          });
        }
        let closed = node.close(self.cursor);
        self.attach(Node::Rule(closed));
      }
      Event::Consume(index) => {
        if index != self.cursor {
          return Err(TreeError::CursorMismatch {
            expected: self.cursor,
            found: index,
          });
        }
        let token = *self
          .tokens
          .get(index)
          .ok_or(TreeError::TokenOutOfRange(index))?;
        self.attach(Node::Terminal(TerminalLeaf { index, token }));
        self.cursor += 1;
      }
    }
    Ok(())
  }

  /// Closes every rule still open at the current cursor.
  pub fn finish(mut self) -> ParseTree {
    while let Some(node) = self.open.pop() {
      let closed = node.close(self.cursor);
      self.attach(Node::Rule(closed));
    }
    ParseTree {
      root: self.root.close(self.cursor),
      nodes: self.nodes,
    }
  }
}

/// Builds the tree for `events`, a derivation of `tokens` from `start_rule`.
pub fn build_tree(
  automaton: &Automaton,
  tokens: &[TokenType],
  start_rule: RuleIndex,
  events: &[Event],
) -> Result<ParseTree, TreeError> {
  let mut builder = TreeBuilder::new(automaton, tokens, start_rule)?;
  for event in events {
    builder.push_event(event)?;
  }
  Ok(builder.finish())
}

#[cfg(test)]
mod test {
  use {
    super::*,
    crate::automaton::{examples, examples::tokens::*},
  };

  fn rule_child(tree: &ParseTree, node: &RuleNode, n: usize) -> RuleNode {
    match tree.child(node, n) {
      Some(Node::Rule(child)) => child.clone(),
      other => panic!("expected a rule node, got {:?}", other),
    }
  }

  #[test]
  fn test_builds_nested_spans() {
    let automaton = examples::make_arithmetic();
    let m = automaton.rule_index("M").unwrap();
    let t = automaton.rule_index("T").unwrap();
    let tokens = [TWO, TokenType::EOF];
    let events = [
      Event::EnterRule(m),
      Event::EnterRule(t),
      Event::Consume(0),
      Event::ExitRule(t),
      Event::ExitRule(m),
    ];
    let tree = build_tree(&automaton, &tokens, RuleIndex(0), &events).unwrap();

    assert_eq!(tree.root().span(), 0..1);
    assert_eq!(tree.root().name().str(), "S");
    assert_eq!(tree.tokens(), vec![TWO]);
    assert_eq!(tree.len(), 3);

    let node = rule_child(&tree, tree.root(), 0);
    assert_eq!(node.rule(), m);
    assert_eq!(node.span(), 0..1);
    assert_eq!(tree.children(&node).count(), 1);
  }

  #[test]
  fn test_empty_rule_has_empty_span() {
    let automaton = examples::make_arithmetic();
    let m = automaton.rule_index("M").unwrap();
    let tokens = [ONE, TokenType::EOF];
    let events = [Event::Consume(0), Event::EnterRule(m), Event::ExitRule(m)];
    let tree = build_tree(&automaton, &tokens, RuleIndex(0), &events).unwrap();
    assert_eq!(rule_child(&tree, tree.root(), 1).span(), 1..1);
  }

  #[test]
  fn test_cursor_mismatch() {
    let automaton = examples::make_arithmetic();
    let tokens = [ONE, TWO, TokenType::EOF];
    let err = build_tree(
      &automaton,
      &tokens,
      RuleIndex(0),
      &[Event::Consume(0), Event::Consume(2)],
    )
    .unwrap_err();
    assert!(matches!(
      err,
      TreeError::CursorMismatch {
        expected: 1,
        found: 2
      }
    ));
  }

  #[test]
  fn test_consume_past_end_of_input() {
    let automaton = examples::make_arithmetic();
    let tokens = [TokenType::EOF];
    let err = build_tree(
      &automaton,
      &tokens,
      RuleIndex(0),
      &[Event::Consume(0), Event::Consume(1)],
    )
    .unwrap_err();
    assert!(matches!(err, TreeError::TokenOutOfRange(1)));
  }

  #[test]
  fn test_unknown_rule() {
    let automaton = examples::make_arithmetic();
    let tokens = [TokenType::EOF];
    let err = build_tree(&automaton, &tokens, RuleIndex(9), &[]).unwrap_err();
    assert!(matches!(err, TreeError::UnknownRule(RuleIndex(9))));

    let err = build_tree(
      &automaton,
      &tokens,
      RuleIndex(0),
      &[Event::EnterRule(RuleIndex(5))],
    )
    .unwrap_err();
    assert!(matches!(err, TreeError::UnknownRule(RuleIndex(5))));
  }

  #[test]
  fn test_unbalanced_exits() {
    let automaton = examples::make_arithmetic();
    let tokens = [TokenType::EOF];
    let err =
      build_tree(&automaton, &tokens, RuleIndex(0), &[Event::ExitRule(RuleIndex(0))])
        .unwrap_err();
    assert!(matches!(err, TreeError::UnbalancedExit(RuleIndex(0))));

    let err = build_tree(
      &automaton,
      &tokens,
      RuleIndex(0),
      &[Event::EnterRule(RuleIndex(1)), Event::ExitRule(RuleIndex(2))],
    )
    .unwrap_err();
    assert!(matches!(
      err,
      TreeError::MismatchedExit {
        expected: RuleIndex(1),
        found: RuleIndex(2)
      }
    ));
  }

  #[test]
  fn test_open_rules_close_at_end() {
    let automaton = examples::make_arithmetic();
    let tokens = [THREE, TokenType::EOF];
    let tree = build_tree(
      &automaton,
      &tokens,
      RuleIndex(0),
      &[Event::EnterRule(RuleIndex(2)), Event::Consume(0)],
    )
    .unwrap();
    assert_eq!(rule_child(&tree, tree.root(), 0).span(), 0..1);
  }

  #[test]
  fn test_pretty_output() {
    let automaton = examples::make_arithmetic();
    let t = automaton.rule_index("T").unwrap();
    let tokens = [FOUR, PLUS, TokenType::EOF];
    let tree = build_tree(
      &automaton,
      &tokens,
      RuleIndex(0),
      &[
        Event::EnterRule(t),
        Event::Consume(0),
        Event::ExitRule(t),
        Event::Consume(1),
      ],
    )
    .unwrap();
    let text = tree.to_pretty();
    assert_eq!(text, "S[0..2) { T[0..1) { #0:4 } #1:10 }");
  }

  #[test]
  fn test_deep_tree_drops_and_compares() {
    let automaton = examples::make_nested_parens();
    let e = RuleIndex(0);
    let depth = 100_000;
    let mut tokens = vec![LPAREN; depth];
    tokens.push(ATOM);
    tokens.extend(std::iter::repeat(RPAREN).take(depth));

    let mut events = Vec::new();
    for index in 0..depth {
      events.push(Event::Consume(index));
      events.push(Event::EnterRule(e));
    }
    events.push(Event::Consume(depth));
    for index in 0..depth {
      events.push(Event::ExitRule(e));
      events.push(Event::Consume(depth + 1 + index));
    }

    let tree = build_tree(&automaton, &tokens, e, &events).unwrap();
    assert_eq!(tree.leaves().len(), tokens.len());
    let copy = tree.clone();
    assert_eq!(tree, copy);
    drop(copy);
    drop(tree);
  }
}
