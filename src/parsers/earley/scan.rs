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
    backpointer::BackEdge, observer::ParseObserver, ParseError, Recognition,
  },
  crate::automaton::{TokenType, Transition},
};

impl Recognition<'_> {
  /// Advances every item at `position` over `token` into the next position.
  pub(super) fn scan(
    &mut self,
    position: usize,
    token: TokenType,
    observer: &mut impl ParseObserver,
  ) -> Result<(), ParseError> {
    let automaton = self.automaton;
    let next_position = position + 1;
    let mut cursor = 0;
    while let Some(item) = self.chart.item(position, cursor) {
      cursor += 1;
      let state = automaton
        .state(item.state())
        .ok_or(ParseError::MissingState(item.state()))?;
      if state.stop_rule().is_some() {
        continue;
      }

      for transition in state.transitions() {
        if let Transition::Terminal { matcher, target } = transition {
          if !matcher.matches(token) {
            continue;
          }

          let next = item.with_state(*target);
          let edge = BackEdge::Scan {
            prev: item,
            token_index: position,
          };
          if self.add_item(next_position, next, edge).is_changed() {
            log::trace!("Scanned {:?} into {:?}.", token, next);
            observer.on_scan(next_position, &next, token);
          }
        }
      }
    }

    Ok(())
  }
}
