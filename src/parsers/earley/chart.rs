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

//! Items and the per-position item sets that make up the chart.

use {
  super::call_stack::StackId,
  crate::{automaton::StateId, utils::WasChanged},
  std::collections::BTreeSet,
};

/// A position inside an automaton, together with where the current rule
/// invocation began and the calls still waiting on it.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Item {
  state: StateId,
  origin: usize,
  stack: StackId,
}

impl Item {
  pub fn new(state: StateId, origin: usize, stack: StackId) -> Self {
    Item {
      state,
      origin,
      stack,
    }
  }

  pub fn state(&self) -> StateId {
    self.state
  }

  pub fn origin(&self) -> usize {
    self.origin
  }

  pub fn stack(&self) -> StackId {
    self.stack
  }

  /// The item for `state` within the same invocation as this one.
  pub fn with_state(&self, state: StateId) -> Self {
    Item { state, ..*self }
  }
}

/// The items at one input position, in the order they were discovered.
///
/// The set doubles as the closure worklist: items are appended as they are
/// found and processed by walking the list from the front.
#[derive(Clone, Debug, Default)]
pub struct ItemSet {
  items: Vec<Item>,
  index: BTreeSet<Item>,
}

impl ItemSet {
  pub fn new() -> Self {
    ItemSet::default()
  }

  pub fn insert(&mut self, item: Item) -> WasChanged {
    let changed = self.index.insert(item);
    if changed {
      self.items.push(item);
    }
    WasChanged::from_changed(changed)
  }

  pub fn contains(&self, item: &Item) -> bool {
    self.index.contains(item)
  }

  /// The `n`th item discovered at this position.
  pub fn get(&self, n: usize) -> Option<Item> {
    self.items.get(n).copied()
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &Item> {
    self.items.iter()
  }
}

#[derive(Clone, Debug, Default)]
pub struct Chart {
  sets: Vec<ItemSet>,
}

impl Chart {
  pub fn new() -> Self {
    Chart::default()
  }

  /// Appends an empty set for the next position.
  pub fn push_set(&mut self) {
    self.sets.push(ItemSet::new());
  }

  pub fn get(&self, position: usize) -> Option<&ItemSet> {
    self.sets.get(position)
  }

  /// Inserts into the set at `position`, extending the chart if needed.
  pub fn insert(&mut self, position: usize, item: Item) -> WasChanged {
    while self.sets.len() <= position {
      self.push_set();
    }
    self.sets[position].insert(item)
  }

  pub fn item(&self, position: usize, n: usize) -> Option<Item> {
    self.get(position).and_then(|set| set.get(n))
  }

  pub fn contains(&self, position: usize, item: &Item) -> bool {
    self.get(position).map_or(false, |set| set.contains(item))
  }

  /// The number of positions with a set.
  pub fn len(&self) -> usize {
    self.sets.len()
  }

  pub fn is_empty(&self) -> bool {
    self.sets.is_empty()
  }

  pub fn total_items(&self) -> usize {
    self.sets.iter().map(ItemSet::len).sum()
  }
}
