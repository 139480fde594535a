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

//! Predict, complete and epsilon closure of a single chart position.

use {
  super::{
    backpointer::BackEdge,
    call_stack::{Frame, StackId},
    chart::Item,
    observer::ParseObserver,
    ParseError, Recognition,
  },
  crate::automaton::{RuleIndex, StateId, Transition},
};

impl Recognition<'_> {
  /// Expands the item set at `position` until no step adds a new item.
  ///
  /// The set is its own worklist: items are visited in discovery order and
  /// anything they produce is appended behind them.
  pub(super) fn close(
    &mut self,
    position: usize,
    observer: &mut impl ParseObserver,
  ) -> Result<(), ParseError> {
    let automaton = self.automaton;
    let mut cursor = 0;
    while let Some(item) = self.chart.item(position, cursor) {
      cursor += 1;
      let state = automaton
        .state(item.state())
        .ok_or(ParseError::MissingState(item.state()))?;

      if let Some(rule) = state.stop_rule() {
        self.complete(position, item, rule, observer);
        continue;
      }

      for transition in state.transitions() {
        match transition {
          Transition::Terminal { .. } => {}
          Transition::RuleCall {
            start,
            follow,
            rule,
          } => {
            self.predict(position, item, *start, *follow, *rule, observer);
          }
          Transition::Epsilon { target, .. } => {
            self.add_item(
              position,
              item.with_state(*target),
              BackEdge::Epsilon(item),
            );
          }
        }
      }
    }

    Ok(())
  }

  fn predict(
    &mut self,
    position: usize,
    caller: Item,
    start: StateId,
    follow: StateId,
    rule: RuleIndex,
    observer: &mut impl ParseObserver,
  ) {
    let frame = Frame {
      follow,
      rule,
      position,
    };
    let (node, _) = self.stacks.push(frame);
    let callee = Item::new(start, position, node);
    if self
      .add_item(position, callee, BackEdge::Predict { prev: caller, rule })
      .is_changed()
    {
      log::trace!("Predicting {:?} at {} from {:?}.", callee, position, caller);
      observer.on_predict(position, &callee, rule);
    }

    if self.stacks.add_caller(node, caller).is_changed() {
      for stop in self.stacks.empty_pops(node).to_vec() {
        self.return_to(position, stop, caller, frame, observer);
      }
    }
  }

  fn complete(
    &mut self,
    position: usize,
    stop: Item,
    rule: RuleIndex,
    observer: &mut impl ParseObserver,
  ) {
    if stop.stack() == StackId::EMPTY {
      // Only the acceptance check looks at these.
      return;
    }

    let frame = match self.stacks.frame(stop.stack()) {
      Some(frame) => frame,
      None => return,
    };

    if frame.rule != rule {
      log::warn!(
        "Stop state of rule {:?} reached inside a call to {:?}; ignoring {:?}.",
        rule,
        frame.rule,
        stop
      );
      return;
    }

    if frame.position == position {
      self.stacks.record_empty_pop(stop.stack(), stop);
    }

    for caller in self.stacks.callers(stop.stack()).to_vec() {
      self.return_to(position, stop, caller, frame, observer);
    }
  }

  fn return_to(
    &mut self,
    position: usize,
    stop: Item,
    caller: Item,
    frame: Frame,
    observer: &mut impl ParseObserver,
  ) {
    let next = caller.with_state(frame.follow);
    let edge = BackEdge::Complete {
      stop,
      caller,
      rule: frame.rule,
    };
    if self.add_item(position, next, edge).is_changed() {
      log::trace!("Completing {:?} into {:?} at {}.", stop, next, position);
      observer.on_complete(position, &next, frame.rule);
    }
  }
}
