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

//! GraphViz output for automata.

use {
  super::{Automaton, StateId, StateKind, Transition},
  crate::utils::to_pretty_string,
  std::borrow::Cow,
};

#[derive(Clone, Debug)]
struct Edge {
  from: StateId,
  to: StateId,
  label: String,
}

struct DotGraph {
  nodes: Vec<StateId>,
  node_labels: Vec<String>,
  edges: Vec<Edge>,
}

impl DotGraph {
  fn new(automaton: &Automaton) -> Self {
    let mut edges = Vec::new();
    for (from, state) in automaton.states() {
      for transition in state.transitions() {
        match transition {
          Transition::Terminal { matcher, target } => edges.push(Edge {
            from,
            to: *target,
            label: to_pretty_string(matcher, 80),
          }),
          Transition::RuleCall {
            start,
            follow,
            rule,
          } => {
            let name = automaton
              .rule_name(*rule)
              .map(|n| n.str().to_string())
              .unwrap_or_else(|| format!("#{}", rule.0));
            edges.push(Edge {
              from,
              to: *start,
              label: format!("call {}", name),
            });
            edges.push(Edge {
              from,
              to: *follow,
              label: format!("after {}", name),
            });
          }
          Transition::Epsilon { kind, target } => edges.push(Edge {
            from,
            to: *target,
            label: format!("ε {:?}", kind),
          }),
        }
      }
    }

    let rule_name = |rule| {
      automaton
        .rule_name(rule)
        .map(|name| name.str().to_string())
        .unwrap_or_default()
    };
    let node_labels = automaton
      .states()
      .map(|(id, state)| match state.kind() {
        StateKind::RuleStart(rule) => {
          format!("s{} start {}", id.0, rule_name(rule))
        }
        StateKind::RuleStop(rule) => {
          format!("s{} stop {}", id.0, rule_name(rule))
        }
        StateKind::Basic => format!("s{}", id.0),
      })
      .collect();

    DotGraph {
      nodes: automaton.states().map(|(id, _)| id).collect(),
      node_labels,
      edges,
    }
  }
}

impl<'a> dot::Labeller<'a, StateId, Edge> for DotGraph {
  fn graph_id(&'a self) -> dot::Id<'a> {
    dot::Id::new("automaton").expect("static graph id is valid")
  }

  fn node_id(&'a self, n: &StateId) -> dot::Id<'a> {
    dot::Id::new(format!("s{}", n.0)).expect("state ids are valid dot ids")
  }

  fn node_label(&'a self, n: &StateId) -> dot::LabelText<'a> {
    dot::LabelText::LabelStr(Cow::Borrowed(&self.node_labels[n.0]))
  }

  fn edge_label(&'a self, e: &Edge) -> dot::LabelText<'a> {
    dot::LabelText::LabelStr(Cow::Owned(e.label.clone()))
  }
}

impl<'a> dot::GraphWalk<'a, StateId, Edge> for DotGraph {
  fn nodes(&'a self) -> dot::Nodes<'a, StateId> {
    Cow::Borrowed(&self.nodes)
  }

  fn edges(&'a self) -> dot::Edges<'a, Edge> {
    Cow::Borrowed(&self.edges)
  }

  fn source(&'a self, edge: &Edge) -> StateId {
    edge.from
  }

  fn target(&'a self, edge: &Edge) -> StateId {
    edge.to
  }
}

impl Automaton {
  /// Renders this automaton as a GraphViz digraph.
  pub fn to_dot(&self) -> anyhow::Result<String> {
    let graph = DotGraph::new(self);
    let mut out = Vec::new();
    dot::render(&graph, &mut out)?;
    Ok(String::from_utf8(out)?)
  }
}
