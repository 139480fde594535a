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

//! The recursive transition network consumed by the parsers.
//!
//! An automaton is a flat list of states. Every rule owns a start state and a
//! stop state; the states in between are connected by terminal edges, epsilon
//! edges, and rule-call edges that enter another rule's start state and name
//! the state to resume at once that rule reaches its stop state.

pub mod builder;
mod dot;
pub mod examples;

pub use builder::{build, AltBuilder, AutomatonBuilder, RuleBuilder};

use {
  crate::utils::{to_pretty_string, Name, ToDoc},
  std::collections::BTreeSet,
};

/// A token type identifier, as produced by an external lexer.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct TokenType(pub i32);

impl TokenType {
  /// The reserved end-of-input marker.
  pub const EOF: TokenType = TokenType(-1);

  pub fn is_eof(self) -> bool {
    self == TokenType::EOF
  }
}

impl ToDoc for TokenType {
  fn to_doc<'a, DA: pretty::DocAllocator<'a>>(
    &self,
    da: &'a DA,
  ) -> pretty::DocBuilder<'a, DA>
  where
    DA::Doc: Clone,
  {
    if self.is_eof() {
      da.text("<EOF>")
    } else {
      da.text(format!("{}", self.0))
    }
  }
}

/// Index of a state within an `Automaton`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct StateId(pub usize);

/// Index of a rule within an `Automaton`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct RuleIndex(pub usize);

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum StateKind {
  Basic,
  RuleStart(RuleIndex),
  RuleStop(RuleIndex),
}

/// The predicate a terminal edge applies to the current token.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum TerminalMatch {
  /// Matches any token in the set. The set may name `TokenType::EOF`.
  Atoms(BTreeSet<TokenType>),
  /// Matches any token outside the set, except the end-of-input marker.
  NotAtoms(BTreeSet<TokenType>),
  /// Matches any token except the end-of-input marker.
  Wildcard,
}

impl TerminalMatch {
  pub fn matches(&self, token: TokenType) -> bool {
    match self {
      TerminalMatch::Atoms(set) => set.contains(&token),
      TerminalMatch::NotAtoms(set) => !token.is_eof() && !set.contains(&token),
      TerminalMatch::Wildcard => !token.is_eof(),
    }
  }
}

impl ToDoc for TerminalMatch {
  fn to_doc<'a, DA: pretty::DocAllocator<'a>>(
    &self,
    da: &'a DA,
  ) -> pretty::DocBuilder<'a, DA>
  where
    DA::Doc: Clone,
  {
    let set_doc = |set: &BTreeSet<TokenType>| {
      da.text("{")
        .append(da.intersperse(set.iter().map(|t| t.to_doc(da)), da.text(",")))
        .append(da.text("}"))
    };
    match self {
      TerminalMatch::Atoms(set) => set_doc(set),
      TerminalMatch::NotAtoms(set) => da.text("~").append(set_doc(set)),
      TerminalMatch::Wildcard => da.text("."),
    }
  }
}

/// What an epsilon edge stood for in the grammar it was compiled from. The
/// parsers take every kind unconditionally.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum EpsilonKind {
  Plain,
  Predicate,
  Action,
  Precedence,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Transition {
  Terminal {
    matcher: TerminalMatch,
    target: StateId,
  },
  RuleCall {
    /// The start state of the callee.
    start: StateId,
    /// The state entered once the callee reaches its stop state.
    follow: StateId,
    rule: RuleIndex,
  },
  Epsilon {
    kind: EpsilonKind,
    target: StateId,
  },
}

impl Transition {
  /// Every state this transition names.
  fn referenced_states(&self) -> Vec<StateId> {
    match self {
      Transition::Terminal { target, .. } => vec![*target],
      Transition::RuleCall { start, follow, .. } => vec![*start, *follow],
      Transition::Epsilon { target, .. } => vec![*target],
    }
  }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct State {
  kind: StateKind,
  transitions: Vec<Transition>,
}

impl State {
  pub fn new(kind: StateKind, transitions: Vec<Transition>) -> Self {
    State { kind, transitions }
  }

  pub fn kind(&self) -> StateKind {
    self.kind
  }

  /// The outgoing transitions, in the order the parsers visit them.
  pub fn transitions(&self) -> &[Transition] {
    &self.transitions
  }

  /// If this is a rule stop state, returns the rule it stops.
  pub fn stop_rule(&self) -> Option<RuleIndex> {
    match self.kind {
      StateKind::RuleStop(rule) => Some(rule),
      _ => None,
    }
  }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RuleInfo {
  name: Name,
  start: StateId,
  stop: StateId,
}

impl RuleInfo {
  pub fn new(name: Name, start: StateId, stop: StateId) -> Self {
    RuleInfo { name, start, stop }
  }

  pub fn name(&self) -> &Name {
    &self.name
  }

  pub fn start(&self) -> StateId {
    self.start
  }

  pub fn stop(&self) -> StateId {
    self.stop
  }
}

#[derive(Debug, thiserror::Error)]
pub enum AutomatonError {
  #[error("state {from:?} refers to missing state {to:?}")]
  DanglingState { from: StateId, to: StateId },
  #[error("rule {rule:?} has a start or stop state of the wrong kind")]
  RuleBoundary { rule: RuleIndex },
  #[error("state {from:?} calls rule {rule:?} through a state that is not its start state")]
  BadCall { from: StateId, rule: RuleIndex },
  #[error("reference to undefined rule `{0}`")]
  UndefinedRule(Name),
  #[error("rule `{0}` is defined more than once")]
  DuplicateRule(Name),
}

/// A validated recursive transition network.
///
/// Automata are read-only once built. All state references inside the
/// automaton are checked on construction.
#[derive(Clone, Debug)]
pub struct Automaton {
  states: Vec<State>,
  rules: Vec<RuleInfo>,
}

impl Automaton {
  /// Builds an automaton from raw parts, as produced by an external grammar
  /// compiler.
  pub fn new(
    states: Vec<State>,
    rules: Vec<RuleInfo>,
  ) -> Result<Self, AutomatonError> {
    let automaton = Automaton { states, rules };
    automaton.check().map(|_| automaton)
  }

  fn check(&self) -> Result<(), AutomatonError> {
    for (index, rule) in self.rules.iter().enumerate() {
      let rule_index = RuleIndex(index);
      let start_kind = self.state(rule.start).map(State::kind);
      let stop_kind = self.state(rule.stop).map(State::kind);
      if start_kind != Some(StateKind::RuleStart(rule_index))
        || stop_kind != Some(StateKind::RuleStop(rule_index))
      {
        return Err(AutomatonError::RuleBoundary { rule: rule_index });
      }
    }

    for (index, state) in self.states.iter().enumerate() {
      let from = StateId(index);
      match state.kind {
        StateKind::RuleStart(rule) | StateKind::RuleStop(rule) => {
          if self.rule(rule).is_none() {
            return Err(AutomatonError::RuleBoundary { rule });
          }
        }
        StateKind::Basic => {}
      }

      for transition in &state.transitions {
        for to in transition.referenced_states() {
          if self.state(to).is_none() {
            return Err(AutomatonError::DanglingState { from, to });
          }
        }

        if let Transition::RuleCall { start, rule, .. } = transition {
          if self.rule(*rule).map(RuleInfo::start) != Some(*start) {
            return Err(AutomatonError::BadCall { from, rule: *rule });
          }
        }
      }
    }

    Ok(())
  }

  pub fn state(&self, id: StateId) -> Option<&State> {
    self.states.get(id.0)
  }

  pub fn rule(&self, rule: RuleIndex) -> Option<&RuleInfo> {
    self.rules.get(rule.0)
  }

  pub fn num_states(&self) -> usize {
    self.states.len()
  }

  pub fn num_rules(&self) -> usize {
    self.rules.len()
  }

  pub fn states(&self) -> impl Iterator<Item = (StateId, &State)> {
    self
      .states
      .iter()
      .enumerate()
      .map(|(index, state)| (StateId(index), state))
  }

  /// Looks up a rule by name.
  pub fn rule_index(&self, name: &str) -> Option<RuleIndex> {
    self
      .rules
      .iter()
      .position(|rule| rule.name.str() == name)
      .map(RuleIndex)
  }

  pub fn rule_name(&self, rule: RuleIndex) -> Option<&Name> {
    self.rule(rule).map(RuleInfo::name)
  }

  pub fn to_pretty(&self) -> String {
    to_pretty_string(self, 80)
  }
}

impl ToDoc for Automaton {
  fn to_doc<'a, DA: pretty::DocAllocator<'a>>(
    &self,
    da: &'a DA,
  ) -> pretty::DocBuilder<'a, DA>
  where
    DA::Doc: Clone,
  {
    let rule_ref = |rule: RuleIndex| match self.rule_name(rule) {
      Some(name) => da.text("<").append(name.to_doc(da)).append(da.text(">")),
      None => da.text(format!("<#{}>", rule.0)),
    };

    let state_docs = self.states().map(|(id, state)| {
      let header = match state.kind {
        StateKind::Basic => da.text(format!("s{}", id.0)),
        StateKind::RuleStart(rule) => da
          .text(format!("s{} start ", id.0))
          .append(rule_ref(rule)),
        StateKind::RuleStop(rule) => {
          da.text(format!("s{} stop ", id.0)).append(rule_ref(rule))
        }
      };

      let transition_docs = state.transitions.iter().map(|t| match t {
        Transition::Terminal { matcher, target } => matcher
          .to_doc(da)
          .append(da.text(format!(" -> s{}", target.0))),
        Transition::RuleCall { follow, rule, .. } => rule_ref(*rule)
          .append(da.text(format!(" -> s{}", follow.0))),
        Transition::Epsilon { kind, target } => {
          da.text(format!("{:?} -> s{}", kind, target.0))
        }
      });

      header
        .append(da.text(":"))
        .append(
          da.line()
            .append(da.intersperse(transition_docs, da.line()))
            .nest(2),
        )
        .group()
    });

    da.intersperse(state_docs, da.text(";").append(da.line()))
  }
}
