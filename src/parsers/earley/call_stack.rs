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

//! The shared call stack of an Earley run.
//!
//! Stack nodes are interned on their frame: the state to return to, the rule
//! being called, and the input position of the call. Every caller that makes
//! the same call at the same position shares one node, and the node keeps the
//! list of those callers. Popping a node therefore returns to each of its
//! callers, which is what keeps left-recursive calls from growing the stack
//! without bound.

use {
  super::chart::Item,
  crate::{
    automaton::{RuleIndex, StateId},
    utils::WasChanged,
  },
  std::collections::{BTreeMap, BTreeSet},
};

/// Identifies an interned stack node. Two stacks are equal iff their ids are.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct StackId(usize);

impl StackId {
  /// The empty stack, the stack of the start rule's own invocation.
  pub const EMPTY: StackId = StackId(0);

  pub fn is_empty(self) -> bool {
    self == StackId::EMPTY
  }
}

/// The pending return recorded when a rule is called.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Frame {
  /// The state the caller resumes at.
  pub follow: StateId,
  /// The rule being called.
  pub rule: RuleIndex,
  /// The input position of the call.
  pub position: usize,
}

#[derive(Debug)]
struct StackNode {
  frame: Option<Frame>,
  callers: Vec<Item>,
  caller_set: BTreeSet<Item>,
  // Stop items that finished at the call position. Callers that show up
  // later at the same position still have to return through them.
  empty_pops: Vec<Item>,
}

impl StackNode {
  fn new(frame: Option<Frame>) -> Self {
    StackNode {
      frame,
      callers: Vec::new(),
      caller_set: BTreeSet::new(),
      empty_pops: Vec::new(),
    }
  }
}

#[derive(Debug)]
pub struct CallStack {
  nodes: Vec<StackNode>,
  interned: BTreeMap<Frame, StackId>,
}

impl CallStack {
  pub fn new() -> Self {
    CallStack {
      nodes: vec![StackNode::new(None)],
      interned: BTreeMap::new(),
    }
  }

  /// Returns the node for `frame`, creating it if this frame has not been
  /// pushed before.
  pub fn push(&mut self, frame: Frame) -> (StackId, WasChanged) {
    if let Some(id) = self.interned.get(&frame) {
      return (*id, WasChanged::Unchanged);
    }

    let id = StackId(self.nodes.len());
    self.nodes.push(StackNode::new(Some(frame)));
    self.interned.insert(frame, id);
    (id, WasChanged::Changed)
  }

  /// The frame on top of the given stack, or `None` for the empty stack.
  pub fn frame(&self, id: StackId) -> Option<Frame> {
    self.nodes.get(id.0).and_then(|node| node.frame)
  }

  /// Registers `caller` as an item waiting on the call recorded by `id`.
  pub fn add_caller(&mut self, id: StackId, caller: Item) -> WasChanged {
    match self.nodes.get_mut(id.0) {
      Some(node) => {
        let changed = node.caller_set.insert(caller);
        if changed {
          node.callers.push(caller);
        }
        WasChanged::from_changed(changed)
      }
      None => WasChanged::Unchanged,
    }
  }

  /// The callers of `id`, in the order they were registered.
  pub fn callers(&self, id: StackId) -> &[Item] {
    self
      .nodes
      .get(id.0)
      .map(|node| &node.callers[..])
      .unwrap_or(&[])
  }

  /// Records that `stop` finished the call `id` without consuming input.
  pub fn record_empty_pop(&mut self, id: StackId, stop: Item) -> WasChanged {
    match self.nodes.get_mut(id.0) {
      Some(node) if !node.empty_pops.contains(&stop) => {
        node.empty_pops.push(stop);
        WasChanged::Changed
      }
      _ => WasChanged::Unchanged,
    }
  }

  pub fn empty_pops(&self, id: StackId) -> &[Item] {
    self
      .nodes
      .get(id.0)
      .map(|node| &node.empty_pops[..])
      .unwrap_or(&[])
  }

  /// The number of nodes, including the empty stack.
  pub fn len(&self) -> usize {
    self.nodes.len()
  }
}

impl Default for CallStack {
  fn default() -> Self {
    CallStack::new()
  }
}
