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

//! Earley recognition and parsing over recursive transition networks.
//!
//! A grammar is given as an [`automaton::Automaton`]: one sub-automaton per
//! rule, connected by rule-call edges. The parser runs the Earley chart
//! algorithm directly on those states, so grammars with left recursion
//! (including mutual left recursion) are accepted as they are.
//!
//! ```rust
//! # use rtn_earley::{automaton::{build, TokenType}, parse};
//! let (num, plus) = (TokenType(1), TokenType(2));
//! let automaton = build(|ab| {
//!   ab.add_rule("sum", |rb| {
//!     rb.add_alt(|alt| {
//!       alt.call("sum").term(plus).term(num);
//!     })
//!     .add_alt(|alt| {
//!       alt.term(num);
//!     });
//!   });
//! })
//! .unwrap();
//!
//! let start = automaton.rule_index("sum").unwrap();
//! let tree = parse(&automaton, &[num, plus, num], start)
//!   .unwrap()
//!   .into_tree()
//!   .unwrap();
//! assert_eq!(tree.tokens(), vec![num, plus, num]);
//! ```

pub mod automaton;
pub mod parsers;
pub mod utils;

pub use parsers::{
  earley::{
    parse, recognize, ParseError, ParseOutcome, Parser, Recognition, RunStats,
  },
  tree::ParseTree,
};
