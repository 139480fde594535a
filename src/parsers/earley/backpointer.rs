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

//! Backpointers and derivation reconstruction.
//!
//! Every item in the chart remembers the first step that produced it. Walking
//! those steps back from an accepting item yields one derivation of the
//! input, which is replayed as a flat list of events.

use {
  super::chart::Item,
  crate::{
    automaton::RuleIndex,
    utils::{insert_if_absent, WasChanged},
  },
  std::collections::BTreeMap,
};

/// The step that first produced an item.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum BackEdge {
  /// The initial item of the run.
  Seed,
  /// Followed an epsilon edge from an item at the same position.
  Epsilon(Item),
  /// Entered `rule` on behalf of the calling item at the same position.
  Predict { prev: Item, rule: RuleIndex },
  /// `stop` finished `rule`, returning to `caller`. The caller sits at the
  /// position where `stop`'s invocation began.
  Complete {
    stop: Item,
    caller: Item,
    rule: RuleIndex,
  },
  /// Consumed the token at `token_index` from an item one position back.
  Scan { prev: Item, token_index: usize },
}

#[derive(Clone, Debug, Default)]
pub struct BackEdgeStore {
  edges: BTreeMap<(usize, Item), BackEdge>,
}

impl BackEdgeStore {
  pub fn new() -> Self {
    BackEdgeStore::default()
  }

  /// Records `edge` for the item unless the item already has one.
  pub fn insert(
    &mut self,
    position: usize,
    item: Item,
    edge: BackEdge,
  ) -> WasChanged {
    insert_if_absent(&mut self.edges, (position, item), edge)
  }

  pub fn get(&self, position: usize, item: &Item) -> Option<&BackEdge> {
    self.edges.get(&(position, *item))
  }

  pub fn len(&self) -> usize {
    self.edges.len()
  }

  pub fn is_empty(&self) -> bool {
    self.edges.is_empty()
  }
}

/// One step of a derivation, in input order.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Event {
  EnterRule(RuleIndex),
  ExitRule(RuleIndex),
  Consume(usize),
}

#[derive(Debug, thiserror::Error)]
pub enum ReconstructError {
  #[error("no backpointer for {item:?} at position {position}")]
  MissingBackEdge { position: usize, item: Item },
  #[error("rule entered at position {position} without a pending return")]
  UnbalancedReturn { position: usize },
  #[error("reached the seed item with {pending} calls still pending")]
  PendingCalls { pending: usize },
  #[error("scan recorded for {item:?} at the first position")]
  ScanAtStart { item: Item },
}

/// Walks backpointers from `item` at `position` back to the seed item and
/// returns the events of that derivation in input order.
///
/// A `Complete` edge descends into the finished callee and remembers its
/// caller; the callee's `Predict` edge then resumes at that caller, whichever
/// item the prediction was first recorded for.
pub fn reconstruct(
  store: &BackEdgeStore,
  position: usize,
  item: Item,
) -> Result<Vec<Event>, ReconstructError> {
  let mut events = Vec::new();
  let mut resume: Vec<(usize, Item)> = Vec::new();
  let mut position = position;
  let mut item = item;

  loop {
    let edge = store
      .get(position, &item)
      .ok_or(ReconstructError::MissingBackEdge { position, item })?;

    match *edge {
      BackEdge::Seed => {
        if !resume.is_empty() {
          return Err(ReconstructError::PendingCalls {
            pending: resume.len(),
          });
        }
        break;
      }
      BackEdge::Epsilon(prev) => item = prev,
      BackEdge::Predict { rule, .. } => {
        events.push(Event::EnterRule(rule));
        let (caller_position, caller) = resume
          .pop()
          .ok_or(ReconstructError::UnbalancedReturn { position })?;
        position = caller_position;
        item = caller;
      }
      BackEdge::Complete { stop, caller, rule } => {
        events.push(Event::ExitRule(rule));
        resume.push((stop.origin(), caller));
        item = stop;
      }
      BackEdge::Scan { prev, token_index } => {
        events.push(Event::Consume(token_index));
        position = position
          .checked_sub(1)
          .ok_or(ReconstructError::ScanAtStart { item })?;
        item = prev;
      }
    }
  }

  events.reverse();
  Ok(events)
}

#[cfg(test)]
mod test {
  use {
    super::*,
    crate::{automaton::StateId, parsers::earley::call_stack::StackId},
  };

  fn item(state: usize, origin: usize) -> Item {
    Item::new(StateId(state), origin, StackId::EMPTY)
  }

  #[test]
  fn test_first_edge_wins() {
    let mut store = BackEdgeStore::new();
    assert!(store.insert(0, item(1, 0), BackEdge::Seed).is_changed());
    assert!(!store
      .insert(0, item(1, 0), BackEdge::Epsilon(item(0, 0)))
      .is_changed());
    assert_eq!(store.get(0, &item(1, 0)), Some(&BackEdge::Seed));
    assert_eq!(store.len(), 1);
  }

  #[test]
  fn test_reconstruct_scans_and_epsilons() {
    let mut store = BackEdgeStore::new();
    store.insert(0, item(0, 0), BackEdge::Seed);
    store.insert(0, item(1, 0), BackEdge::Epsilon(item(0, 0)));
    store.insert(
      1,
      item(2, 0),
      BackEdge::Scan {
        prev: item(1, 0),
        token_index: 0,
      },
    );
    store.insert(
      2,
      item(3, 0),
      BackEdge::Scan {
        prev: item(2, 0),
        token_index: 1,
      },
    );

    let events = reconstruct(&store, 2, item(3, 0)).unwrap();
    assert_eq!(events, vec![Event::Consume(0), Event::Consume(1)]);
  }

  #[test]
  fn test_reconstruct_resumes_at_recorded_caller() {
    // caller (2, 0) calls rule 1 at position 0; the callee start item was
    // first predicted for a different caller (9, 0).
    let callee = RuleIndex(1);
    let callee_start = item(4, 0);
    let callee_stop = item(5, 0);
    let caller = item(2, 0);
    let mut store = BackEdgeStore::new();
    store.insert(0, item(0, 0), BackEdge::Seed);
    store.insert(0, caller, BackEdge::Epsilon(item(0, 0)));
    store.insert(
      0,
      callee_start,
      BackEdge::Predict {
        prev: item(9, 0),
        rule: callee,
      },
    );
    store.insert(
      1,
      callee_stop,
      BackEdge::Scan {
        prev: callee_start,
        token_index: 0,
      },
    );
    store.insert(
      1,
      item(3, 0),
      BackEdge::Complete {
        stop: callee_stop,
        caller,
        rule: callee,
      },
    );

    let events = reconstruct(&store, 1, item(3, 0)).unwrap();
    assert_eq!(
      events,
      vec![
        Event::EnterRule(callee),
        Event::Consume(0),
        Event::ExitRule(callee),
      ]
    );
  }

  #[test]
  fn test_missing_edge_is_an_error() {
    let store = BackEdgeStore::new();
    let err = reconstruct(&store, 3, item(1, 0)).unwrap_err();
    assert!(matches!(
      err,
      ReconstructError::MissingBackEdge { position: 3, .. }
    ));
  }

  #[test]
  fn test_predict_without_caller_is_an_error() {
    let mut store = BackEdgeStore::new();
    store.insert(
      0,
      item(1, 0),
      BackEdge::Predict {
        prev: item(0, 0),
        rule: RuleIndex(0),
      },
    );
    let err = reconstruct(&store, 0, item(1, 0)).unwrap_err();
    assert!(matches!(
      err,
      ReconstructError::UnbalancedReturn { position: 0 }
    ));
  }

  #[test]
  fn test_seed_with_pending_call_is_an_error() {
    let mut store = BackEdgeStore::new();
    store.insert(0, item(0, 0), BackEdge::Seed);
    store.insert(
      0,
      item(2, 0),
      BackEdge::Complete {
        stop: item(0, 0),
        caller: item(1, 0),
        rule: RuleIndex(0),
      },
    );
    let err = reconstruct(&store, 0, item(2, 0)).unwrap_err();
    assert!(matches!(err, ReconstructError::PendingCalls { pending: 1 }));
  }

  #[test]
  fn test_scan_at_first_position_is_an_error() {
    let mut store = BackEdgeStore::new();
    store.insert(
      0,
      item(1, 0),
      BackEdge::Scan {
        prev: item(0, 0),
        token_index: 0,
      },
    );
    let err = reconstruct(&store, 0, item(1, 0)).unwrap_err();
    assert!(matches!(err, ReconstructError::ScanAtStart { .. }));
  }
}
