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

use rtn_earley::{
  automaton::{examples, examples::tokens::*, Automaton, RuleIndex, TokenType},
  parse,
  parsers::tree::{Node, RuleNode},
  recognize, ParseError, ParseOutcome, ParseTree, Parser,
};

fn start(automaton: &Automaton, name: &str) -> RuleIndex {
  automaton.rule_index(name).unwrap()
}

fn parse_tree(
  automaton: &Automaton,
  tokens: &[TokenType],
  rule: &str,
) -> ParseTree {
  parse(automaton, tokens, start(automaton, rule))
    .unwrap()
    .into_tree()
    .unwrap()
}

fn rule_child<'t>(
  tree: &'t ParseTree,
  node: &'t RuleNode,
  n: usize,
) -> (&'t str, std::ops::Range<usize>) {
  match tree.child(node, n) {
    Some(Node::Rule(rule)) => (rule.name().str(), rule.span()),
    other => panic!("expected a rule node, got {:?}", other),
  }
}

#[test]
fn test_arithmetic_accepts() {
  let automaton = examples::make_arithmetic();
  let tokens = [TWO, PLUS, THREE, TIMES, FOUR];
  let tree = parse_tree(&automaton, &tokens, "S");

  assert_eq!(tree.tokens(), tokens.to_vec());
  let indexes: Vec<_> = tree.leaves().iter().map(|leaf| leaf.index()).collect();
  assert_eq!(indexes, vec![0, 1, 2, 3, 4]);

  // S -> S '+' M, with the product grouped under M.
  let root = tree.root();
  assert_eq!(root.span(), 0..5);
  assert_eq!(tree.children(root).count(), 3);
  assert_eq!(rule_child(&tree, root, 0), ("S", 0..1));
  assert_eq!(rule_child(&tree, root, 2), ("M", 2..5));
}

#[test]
fn test_arithmetic_rejects() {
  let automaton = examples::make_arithmetic();
  let s = start(&automaton, "S");
  assert!(!recognize(&automaton, &[TWO, PLUS, TIMES, FOUR], s).unwrap());
  assert!(matches!(
    parse(&automaton, &[TWO, PLUS, TIMES, FOUR], s).unwrap(),
    ParseOutcome::Rejected
  ));
  assert!(!recognize(&automaton, &[TWO, PLUS], s).unwrap());
  assert!(!recognize(&automaton, &[], s).unwrap());
}

#[test]
fn test_mutual_left_recursion() {
  let automaton = examples::make_mutual_left_recursion();
  let a = start(&automaton, "A");
  assert!(recognize(&automaton, &[A, Y, X], a).unwrap());
  assert!(recognize(&automaton, &[B, X], a).unwrap());
  assert!(recognize(&automaton, &[A, Y, X, Y, X], a).unwrap());
  assert!(!recognize(&automaton, &[A, X, X], a).unwrap());
  assert!(!recognize(&automaton, &[A, Y], a).unwrap());

  let tree = parse_tree(&automaton, &[A, Y, X], "A");
  assert_eq!(tree.tokens(), vec![A, Y, X]);
  let root = tree.root();
  assert_eq!(tree.children(root).count(), 2);
  assert_eq!(rule_child(&tree, root, 0), ("B", 0..2));
}

#[test]
fn test_empty_input() {
  let nullable = examples::make_nullable();
  let opt = start(&nullable, "opt");
  assert!(recognize(&nullable, &[], opt).unwrap());
  assert!(recognize(&nullable, &[TokenType::EOF], opt).unwrap());
  let tree = parse_tree(&nullable, &[], "opt");
  assert!(tree.leaves().is_empty());
  assert_eq!(tree.root().span(), 0..0);

  let non_nullable = examples::make_non_nullable();
  let some = start(&non_nullable, "some");
  assert!(!recognize(&non_nullable, &[], some).unwrap());
  assert!(!parse(&non_nullable, &[], some).unwrap().is_accepted());
}

#[test]
fn test_explicit_end_marker_is_a_leaf() {
  let automaton = examples::make_file();
  let tokens = [ATOM, LPAREN, RPAREN, TokenType::EOF];
  let tree = parse_tree(&automaton, &tokens, "file");
  assert_eq!(tree.tokens(), tokens.to_vec());

  // The end marker is implied when it is missing.
  let tree = parse_tree(&automaton, &tokens[..3], "file");
  assert_eq!(tree.tokens(), tokens.to_vec());

  let file = start(&automaton, "file");
  assert!(!recognize(&automaton, &[RPAREN], file).unwrap());
  assert!(!recognize(&automaton, &[LPAREN], file).unwrap());
}

#[test]
fn test_implied_end_marker_is_not_a_leaf() {
  let automaton = examples::make_arithmetic();
  let tree = parse_tree(&automaton, &[ONE, PLUS, TWO, TokenType::EOF], "S");
  assert_eq!(tree.tokens(), vec![ONE, PLUS, TWO]);
  assert_eq!(tree.root().span(), 0..3);
}

#[test]
fn test_recognize_agrees_with_parse() {
  let automaton = examples::make_arithmetic();
  let s = start(&automaton, "S");
  let inputs: Vec<Vec<TokenType>> = vec![
    vec![],
    vec![ONE],
    vec![ONE, PLUS],
    vec![ONE, PLUS, TWO, PLUS, THREE],
    vec![ONE, TIMES, TWO, PLUS, THREE, TIMES, FOUR],
    vec![PLUS, ONE],
    vec![ONE, ONE],
    vec![ONE, TIMES, TIMES, TWO],
  ];

  for tokens in &inputs {
    let recognized = recognize(&automaton, tokens, s).unwrap();
    let outcome = parse(&automaton, tokens, s).unwrap();
    assert_eq!(recognized, outcome.is_accepted(), "input {:?}", tokens);
    if let ParseOutcome::Accepted(tree) = outcome {
      assert_eq!(&tree.tokens(), tokens);
    }
  }
}

#[test]
fn test_runs_are_deterministic() {
  let automaton = examples::make_mutual_left_recursion();
  let a = start(&automaton, "A");
  let tokens = [A, Y, X, Y, X, Y, X];

  let first = Parser::new(&automaton).run(&tokens, a).unwrap();
  let second = Parser::new(&automaton).run(&tokens, a).unwrap();
  assert_eq!(first.events().unwrap(), second.events().unwrap());
  assert_eq!(first.stats(), second.stats());
  assert_eq!(first.tree().unwrap(), second.tree().unwrap());
}

fn nested_parens(depth: usize) -> Vec<TokenType> {
  let mut tokens = vec![LPAREN; depth];
  tokens.push(ATOM);
  tokens.extend(std::iter::repeat(RPAREN).take(depth));
  tokens
}

fn sum_of_ones(terms: usize) -> Vec<TokenType> {
  let mut tokens = vec![ONE];
  for _ in 1..terms {
    tokens.push(PLUS);
    tokens.push(ONE);
  }
  tokens
}

#[test]
fn test_deep_right_nesting_grows_linearly() {
  let automaton = examples::make_nested_parens();
  let e = start(&automaton, "E");

  let small = Parser::new(&automaton).run(&nested_parens(100), e).unwrap();
  let large = Parser::new(&automaton).run(&nested_parens(200), e).unwrap();
  assert!(small.is_accepted());
  assert!(large.is_accepted());
  assert!(large.stats().items <= 3 * small.stats().items);
  assert!(large.stats().stack_nodes <= 3 * small.stats().stack_nodes);

  let tree = large.tree().unwrap().unwrap();
  assert_eq!(tree.leaves().len(), 401);
  assert!(!recognize(&automaton, &nested_parens(200)[..400], e).unwrap());
}

#[test]
fn test_very_deep_nesting_builds_and_drops() {
  let automaton = examples::make_nested_parens();
  let tokens = nested_parens(100_000);
  let tree = parse_tree(&automaton, &tokens, "E");
  assert_eq!(tree.leaves().len(), 200_001);
  assert_eq!(tree.root().span(), 0..200_001);
  drop(tree);
}

#[test]
fn test_long_left_recursion_grows_linearly() {
  let automaton = examples::make_arithmetic();
  let s = start(&automaton, "S");

  let small = Parser::new(&automaton).run(&sum_of_ones(100), s).unwrap();
  let large = Parser::new(&automaton).run(&sum_of_ones(200), s).unwrap();
  assert!(small.is_accepted());
  assert!(large.is_accepted());
  assert!(large.stats().items <= 3 * small.stats().items);
  assert_eq!(large.stats().items, large.stats().back_edges);

  let tree = large.tree().unwrap().unwrap();
  assert_eq!(tree.tokens(), sum_of_ones(200));
}

#[test]
fn test_invalid_start_rule() {
  let automaton = examples::make_nullable();
  let err = parse(&automaton, &[], RuleIndex(1)).unwrap_err();
  assert!(matches!(
    err,
    ParseError::InvalidStartRule {
      rule: RuleIndex(1),
      num_rules: 1
    }
  ));
  assert!(recognize(&automaton, &[], RuleIndex(7)).is_err());
}

#[test]
fn test_non_start_rule_as_entry() {
  let automaton = examples::make_arithmetic();
  let t = start(&automaton, "T");
  assert!(recognize(&automaton, &[THREE], t).unwrap());
  assert!(!recognize(&automaton, &[THREE, PLUS, ONE], t).unwrap());

  let tree = parse_tree(&automaton, &[THREE], "T");
  assert_eq!(tree.root().name().str(), "T");
  assert!(tree.to_pretty().starts_with("T[0..1)"));
}
