// Copyright 2019 Google LLC
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

//! An Earley parser that runs directly on a recursive transition network.
//!
//! Items are automaton states rather than dotted productions. Rule calls are
//! tracked on a shared, interned call stack instead of by scanning back to
//! the origin set, so left recursion of any shape terminates. The parser
//! commits to the first derivation it finds for each item; it does not build
//! a parse forest.

pub mod backpointer;
pub mod call_stack;
pub mod chart;
mod closure;
pub mod observer;
mod scan;

use {
  crate::{
    automaton::{Automaton, RuleIndex, StateId, TokenType},
    parsers::tree::{build_tree, ParseTree, TreeError},
    utils::WasChanged,
  },
  backpointer::{reconstruct, BackEdge, BackEdgeStore, Event, ReconstructError},
  call_stack::{CallStack, StackId},
  chart::{Chart, Item, ItemSet},
  derivative::Derivative,
  observer::{NoopObserver, ParseObserver},
};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
  #[error("start rule {rule:?} does not exist; the automaton has {num_rules} rules")]
  InvalidStartRule { rule: RuleIndex, num_rules: usize },
  /// An item refers to a state the automaton does not have. Automata built
  /// through `Automaton::new` reject dangling state references, so a parse
  /// over one never produces this.
  #[error("item refers to state {0:?}, which is not in the automaton")]
  MissingState(StateId),
  #[error(transparent)]
  Reconstruction(#[from] ReconstructError),
  #[error(transparent)]
  Tree(#[from] TreeError),
}

#[derive(Clone, Debug)]
pub enum ParseOutcome {
  Accepted(ParseTree),
  Rejected,
}

impl ParseOutcome {
  pub fn is_accepted(&self) -> bool {
    matches!(self, ParseOutcome::Accepted(_))
  }

  pub fn into_tree(self) -> Option<ParseTree> {
    match self {
      ParseOutcome::Accepted(tree) => Some(tree),
      ParseOutcome::Rejected => None,
    }
  }
}

/// Sizes of the structures built during a run.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct RunStats {
  /// Chart positions that received a set.
  pub positions: usize,
  pub items: usize,
  /// Call stack nodes, including the empty stack.
  pub stack_nodes: usize,
  pub back_edges: usize,
}

/// The state of a finished recognition run.
#[derive(Debug)]
pub struct Recognition<'a> {
  automaton: &'a Automaton,
  start_rule: RuleIndex,
  // The consumed input followed by the end marker.
  input: Vec<TokenType>,
  chart: Chart,
  stacks: CallStack,
  back_edges: BackEdgeStore,
  accepting: Option<(usize, Item)>,
}

impl<'a> Recognition<'a> {
  fn new(
    automaton: &'a Automaton,
    start_rule: RuleIndex,
    input: Vec<TokenType>,
  ) -> Self {
    Recognition {
      automaton,
      start_rule,
      input,
      chart: Chart::new(),
      stacks: CallStack::new(),
      back_edges: BackEdgeStore::new(),
      accepting: None,
    }
  }

  /// Inserts `item` at `position`. The back edge is only recorded if the
  /// item is new.
  fn add_item(
    &mut self,
    position: usize,
    item: Item,
    edge: BackEdge,
  ) -> WasChanged {
    let changed = self.chart.insert(position, item);
    if changed.is_changed() {
      self.back_edges.insert(position, item, edge);
    }
    changed
  }

  fn drive(
    &mut self,
    start: StateId,
    stop: StateId,
    observer: &mut impl ParseObserver,
  ) -> Result<(), ParseError> {
    let end = self.end_position();
    self.add_item(0, Item::new(start, 0, StackId::EMPTY), BackEdge::Seed);

    for position in 0..=end {
      self.close(position, observer)?;
      let token = self.input[position];
      self.scan(position, token, observer)?;
      log::debug!(
        "Position {}: {} items, {} scanned forward.",
        position,
        self.chart.get(position).map_or(0, ItemSet::len),
        self.chart.get(position + 1).map_or(0, ItemSet::len)
      );

      if self.chart.get(position + 1).map_or(true, ItemSet::is_empty) {
        break;
      }
    }

    // Only items that consumed the end marker reach this set.
    if self.chart.get(end + 1).map_or(false, |set| !set.is_empty()) {
      self.close(end + 1, observer)?;
    }

    let accept = Item::new(stop, 0, StackId::EMPTY);
    self.accepting = [end + 1, end]
      .iter()
      .copied()
      .find(|position| self.chart.contains(*position, &accept))
      .map(|position| (position, accept));

    match self.accepting {
      Some((position, item)) => {
        log::debug!("Accepted at position {}.", position);
        observer.on_accept(position, &item);
      }
      None => {
        log::debug!("Rejected input of {} tokens.", end);
        observer.on_reject(end);
      }
    }

    Ok(())
  }

  pub fn is_accepted(&self) -> bool {
    self.accepting.is_some()
  }

  /// The accepting item and the position it was found at.
  pub fn accepting_item(&self) -> Option<(usize, Item)> {
    self.accepting
  }

  /// The position of the end marker.
  pub fn end_position(&self) -> usize {
    self.input.len() - 1
  }

  /// The input as seen by the parser: the tokens before the first end marker,
  /// followed by the end marker.
  pub fn input(&self) -> &[TokenType] {
    &self.input
  }

  pub fn chart(&self) -> &Chart {
    &self.chart
  }

  pub fn stats(&self) -> RunStats {
    RunStats {
      positions: self.chart.len(),
      items: self.chart.total_items(),
      stack_nodes: self.stacks.len(),
      back_edges: self.back_edges.len(),
    }
  }

  /// The events of the chosen derivation, or `None` if the input was
  /// rejected.
  pub fn events(&self) -> Result<Option<Vec<Event>>, ReconstructError> {
    match self.accepting {
      Some((position, item)) => {
        reconstruct(&self.back_edges, position, item).map(Some)
      }
      None => Ok(None),
    }
  }

  /// Builds the parse tree of the chosen derivation, or `None` if the input
  /// was rejected.
  pub fn tree(&self) -> Result<Option<ParseTree>, ParseError> {
    match self.events()? {
      Some(events) => Ok(Some(build_tree(
        self.automaton,
        &self.input,
        self.start_rule,
        &events,
      )?)),
      None => Ok(None),
    }
  }
}

/// Runs Earley recognition over an automaton.
///
/// The observer defaults to `NoopObserver`; see `with_observer`.
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct Parser<'a, O = NoopObserver> {
  automaton: &'a Automaton,
  #[derivative(Debug = "ignore")]
  observer: O,
}

impl<'a> Parser<'a> {
  pub fn new(automaton: &'a Automaton) -> Self {
    Parser {
      automaton,
      observer: NoopObserver,
    }
  }
}

impl<'a, O: ParseObserver> Parser<'a, O> {
  /// Replaces the observer. Pass `&mut observer` to inspect it after the
  /// parser is dropped.
  pub fn with_observer<P: ParseObserver>(self, observer: P) -> Parser<'a, P> {
    Parser {
      automaton: self.automaton,
      observer,
    }
  }

  pub fn observer(&self) -> &O {
    &self.observer
  }

  pub fn into_observer(self) -> O {
    self.observer
  }

  /// Runs recognition of `tokens` from `start_rule`.
  ///
  /// The input ends at the first `TokenType::EOF` in `tokens`; if there is
  /// none, the end marker is implied after the last token. Tokens after the
  /// first end marker are ignored.
  pub fn run(
    &mut self,
    tokens: &[TokenType],
    start_rule: RuleIndex,
  ) -> Result<Recognition<'a>, ParseError> {
    let rule = self.automaton.rule(start_rule).ok_or(
      ParseError::InvalidStartRule {
        rule: start_rule,
        num_rules: self.automaton.num_rules(),
      },
    )?;

    let end = match tokens.iter().position(|token| token.is_eof()) {
      Some(end) => {
        if end + 1 < tokens.len() {
          log::warn!(
            "Ignoring {} tokens after the end marker at position {}.",
            tokens.len() - end - 1,
            end
          );
        }
        end
      }
      None => tokens.len(),
    };

    let mut input = tokens[..end].to_vec();
    input.push(TokenType::EOF);

    let mut recognition = Recognition::new(self.automaton, start_rule, input);
    recognition.drive(rule.start(), rule.stop(), &mut self.observer)?;
    Ok(recognition)
  }

  pub fn recognize(
    &mut self,
    tokens: &[TokenType],
    start_rule: RuleIndex,
  ) -> Result<bool, ParseError> {
    Ok(self.run(tokens, start_rule)?.is_accepted())
  }

  pub fn parse(
    &mut self,
    tokens: &[TokenType],
    start_rule: RuleIndex,
  ) -> Result<ParseOutcome, ParseError> {
    let recognition = self.run(tokens, start_rule)?;
    Ok(match recognition.tree()? {
      Some(tree) => ParseOutcome::Accepted(tree),
      None => ParseOutcome::Rejected,
    })
  }
}

/// Returns whether `tokens` is in the language of `start_rule`.
pub fn recognize(
  automaton: &Automaton,
  tokens: &[TokenType],
  start_rule: RuleIndex,
) -> Result<bool, ParseError> {
  Parser::new(automaton).recognize(tokens, start_rule)
}

/// Parses `tokens` from `start_rule`, returning one parse tree on success.
pub fn parse(
  automaton: &Automaton,
  tokens: &[TokenType],
  start_rule: RuleIndex,
) -> Result<ParseOutcome, ParseError> {
  Parser::new(automaton).parse(tokens, start_rule)
}
