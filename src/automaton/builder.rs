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

use {
  super::{
    Automaton, AutomatonError, EpsilonKind, RuleIndex, RuleInfo, State,
    StateId, StateKind, TerminalMatch, TokenType, Transition,
  },
  crate::utils::Name,
  std::collections::BTreeMap,
};

/// Lets builder methods take rule names either as a `Name` or as a `&str`.
pub trait BuilderInto<T> {
  /// Consumes self and produces a value of type `T`.
  fn builder_into(self) -> T;
}

impl<T> BuilderInto<T> for T {
  fn builder_into(self) -> T {
    self
  }
}

impl BuilderInto<Name> for &'_ str {
  fn builder_into(self) -> Name {
    Name::new(self)
  }
}

#[derive(Clone, Debug)]
enum Step {
  Match(TerminalMatch),
  Call(Name),
  Epsilon(EpsilonKind),
}

/// Builds a single alternative of a rule as a chain of steps.
pub struct AltBuilder {
  steps: Vec<Step>,
}

impl AltBuilder {
  fn new() -> Self {
    AltBuilder { steps: Vec::new() }
  }

  /// Matches exactly one token type.
  pub fn term(&mut self, token: TokenType) -> &mut Self {
    self.terms(std::iter::once(token))
  }

  /// Matches any of the given token types.
  pub fn terms(
    &mut self,
    tokens: impl IntoIterator<Item = TokenType>,
  ) -> &mut Self {
    self
      .steps
      .push(Step::Match(TerminalMatch::Atoms(tokens.into_iter().collect())));
    self
  }

  /// Matches any token type except the given ones and the end marker.
  pub fn not_terms(
    &mut self,
    tokens: impl IntoIterator<Item = TokenType>,
  ) -> &mut Self {
    self.steps.push(Step::Match(TerminalMatch::NotAtoms(
      tokens.into_iter().collect(),
    )));
    self
  }

  /// Matches any token type except the end marker.
  pub fn wildcard(&mut self) -> &mut Self {
    self.steps.push(Step::Match(TerminalMatch::Wildcard));
    self
  }

  /// Calls the rule with the given name. The name is resolved when the
  /// automaton is built, so rules may refer to rules defined later.
  pub fn call(&mut self, rule: impl BuilderInto<Name>) -> &mut Self {
    self.steps.push(Step::Call(rule.builder_into()));
    self
  }

  pub fn epsilon(&mut self, kind: EpsilonKind) -> &mut Self {
    self.steps.push(Step::Epsilon(kind));
    self
  }
}

// ----------------

pub struct RuleBuilder {
  name: Name,
  alts: Vec<Vec<Step>>,
}

impl RuleBuilder {
  fn new(name: Name) -> Self {
    RuleBuilder {
      name,
      alts: Vec::new(),
    }
  }

  pub fn add_alt(
    &mut self,
    build_fn: impl FnOnce(&mut AltBuilder),
  ) -> &mut Self {
    let mut builder = AltBuilder::new();
    build_fn(&mut builder);
    self.alts.push(builder.steps);
    self
  }

  pub fn add_empty_alt(&mut self) -> &mut Self {
    self.alts.push(Vec::new());
    self
  }
}

// ----------------

/// Lays rules out as states of an `Automaton`.
///
/// Each rule gets a start and a stop state. Each alternative leaves the start
/// state through an epsilon edge into a chain of basic states, one per step,
/// and the last state of the chain has an epsilon edge into the stop state.
/// Alternatives keep the order they were added in, which is also the order
/// the parsers explore them in.
pub struct AutomatonBuilder {
  rules: Vec<RuleBuilder>,
}

impl AutomatonBuilder {
  fn new() -> Self {
    AutomatonBuilder { rules: Vec::new() }
  }

  pub fn add_rule<F>(
    &mut self,
    name: impl BuilderInto<Name>,
    build_fn: F,
  ) -> &mut Self
  where
    F: FnOnce(&mut RuleBuilder),
  {
    let mut rule_builder = RuleBuilder::new(name.builder_into());
    build_fn(&mut rule_builder);
    self.rules.push(rule_builder);
    self
  }

  fn build(self) -> Result<Automaton, AutomatonError> {
    let mut rule_indexes = BTreeMap::new();
    for (index, rule) in self.rules.iter().enumerate() {
      if rule_indexes.insert(rule.name.clone(), RuleIndex(index)).is_some() {
        return Err(AutomatonError::DuplicateRule(rule.name.clone()));
      }
    }

    let mut layout = Layout::new();
    let rule_infos: Vec<RuleInfo> = self
      .rules
      .iter()
      .enumerate()
      .map(|(index, rule)| {
        let start = layout.add_state(StateKind::RuleStart(RuleIndex(index)));
        let stop = layout.add_state(StateKind::RuleStop(RuleIndex(index)));
        RuleInfo::new(rule.name.clone(), start, stop)
      })
      .collect();

    for (rule, info) in self.rules.iter().zip(&rule_infos) {
      for alt in &rule.alts {
        let mut curr = layout.add_state(StateKind::Basic);
        layout.add_transition(
          info.start(),
          Transition::Epsilon {
            kind: EpsilonKind::Plain,
            target: curr,
          },
        );

        for step in alt {
          let next = layout.add_state(StateKind::Basic);
          let transition = match step {
            Step::Match(matcher) => Transition::Terminal {
              matcher: matcher.clone(),
              target: next,
            },
            Step::Call(name) => {
              let callee = *rule_indexes
                .get(name)
                .ok_or_else(|| AutomatonError::UndefinedRule(name.clone()))?;
              Transition::RuleCall {
                start: rule_infos[callee.0].start(),
                follow: next,
                rule: callee,
              }
            }
            Step::Epsilon(kind) => Transition::Epsilon {
              kind: *kind,
              target: next,
            },
          };
          layout.add_transition(curr, transition);
          curr = next;
        }

        layout.add_transition(
          curr,
          Transition::Epsilon {
            kind: EpsilonKind::Plain,
            target: info.stop(),
          },
        );
      }
    }

    Automaton::new(layout.states, rule_infos)
  }
}

struct Layout {
  states: Vec<State>,
}

impl Layout {
  fn new() -> Self {
    Layout { states: Vec::new() }
  }

  fn add_state(&mut self, kind: StateKind) -> StateId {
    let id = StateId(self.states.len());
    self.states.push(State::new(kind, Vec::new()));
    id
  }

  fn add_transition(&mut self, from: StateId, transition: Transition) {
    self.states[from.0].transitions.push(transition);
  }
}

/// Builds an automaton using a builder function.
///
/// Example:
///
/// ```rust
/// # use rtn_earley::automaton::{build, TokenType};
/// let a = TokenType(1);
/// let automaton = build(|ab| {
///   ab.add_rule("x", |rb| {
///     rb.add_alt(|alt| {
///       alt.term(a).call("x").term(a);
///     })
///     .add_empty_alt();
///   });
/// })
/// .unwrap();
/// assert_eq!(automaton.num_rules(), 1);
/// ```
pub fn build(
  build_fn: impl FnOnce(&mut AutomatonBuilder),
) -> Result<Automaton, AutomatonError> {
  let mut builder = AutomatonBuilder::new();
  build_fn(&mut builder);
  builder.build()
}
