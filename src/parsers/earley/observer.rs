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
  super::chart::Item,
  crate::automaton::{RuleIndex, TokenType},
};

/// Callbacks for watching an Earley run.
///
/// Step callbacks fire only when the step discovers an item that was not in
/// the chart yet. Observers cannot influence the run.
pub trait ParseObserver {
  fn on_predict(&mut self, _position: usize, _item: &Item, _rule: RuleIndex) {
  }

  fn on_complete(&mut self, _position: usize, _item: &Item, _rule: RuleIndex) {
  }

  /// `position` is the position the scanned item lands at.
  fn on_scan(&mut self, _position: usize, _item: &Item, _token: TokenType) {}

  fn on_accept(&mut self, _position: usize, _item: &Item) {}

  fn on_reject(&mut self, _position: usize) {}
}

#[derive(Copy, Clone, Debug, Default)]
pub struct NoopObserver;

impl ParseObserver for NoopObserver {}

impl<O: ParseObserver + ?Sized> ParseObserver for &mut O {
  fn on_predict(&mut self, position: usize, item: &Item, rule: RuleIndex) {
    (**self).on_predict(position, item, rule)
  }

  fn on_complete(&mut self, position: usize, item: &Item, rule: RuleIndex) {
    (**self).on_complete(position, item, rule)
  }

  fn on_scan(&mut self, position: usize, item: &Item, token: TokenType) {
    (**self).on_scan(position, item, token)
  }

  fn on_accept(&mut self, position: usize, item: &Item) {
    (**self).on_accept(position, item)
  }

  fn on_reject(&mut self, position: usize) {
    (**self).on_reject(position)
  }
}
