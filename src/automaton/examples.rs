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

//! Small automata used by tests and documentation.

use crate::automaton::{build, Automaton, EpsilonKind, TokenType};

pub mod tokens {
  use crate::automaton::TokenType;

  pub const ONE: TokenType = TokenType(1);
  pub const TWO: TokenType = TokenType(2);
  pub const THREE: TokenType = TokenType(3);
  pub const FOUR: TokenType = TokenType(4);
  pub const PLUS: TokenType = TokenType(10);
  pub const TIMES: TokenType = TokenType(11);

  pub const A: TokenType = TokenType(20);
  pub const B: TokenType = TokenType(21);
  pub const X: TokenType = TokenType(22);
  pub const Y: TokenType = TokenType(23);

  pub const LPAREN: TokenType = TokenType(30);
  pub const RPAREN: TokenType = TokenType(31);
  pub const ATOM: TokenType = TokenType(32);
}

use tokens::*;

/// `S -> S '+' M | M; M -> M '*' T | T; T -> '1' | '2' | '3' | '4'`
pub fn make_arithmetic() -> Automaton {
  build(|ab| {
    ab.add_rule("S", |rb| {
      rb.add_alt(|alt| {
        alt.call("S").term(PLUS).call("M");
      })
      .add_alt(|alt| {
        alt.call("M");
      });
    })
    .add_rule("M", |rb| {
      rb.add_alt(|alt| {
        alt.call("M").term(TIMES).call("T");
      })
      .add_alt(|alt| {
        alt.call("T");
      });
    })
    .add_rule("T", |rb| {
      for digit in &[ONE, TWO, THREE, FOUR] {
        rb.add_alt(|alt| {
          alt.term(*digit);
        });
      }
    });
  })
  .expect("arithmetic automaton is well formed")
}

/// `A -> B 'x' | 'a'; B -> A 'y' | 'b'`
pub fn make_mutual_left_recursion() -> Automaton {
  build(|ab| {
    ab.add_rule("A", |rb| {
      rb.add_alt(|alt| {
        alt.call("B").term(X);
      })
      .add_alt(|alt| {
        alt.term(A);
      });
    })
    .add_rule("B", |rb| {
      rb.add_alt(|alt| {
        alt.call("A").term(Y);
      })
      .add_alt(|alt| {
        alt.term(B);
      });
    });
  })
  .expect("mutually recursive automaton is well formed")
}

/// `opt -> 'a' opt | ε`
pub fn make_nullable() -> Automaton {
  build(|ab| {
    ab.add_rule("opt", |rb| {
      rb.add_alt(|alt| {
        alt.term(A).call("opt");
      })
      .add_empty_alt();
    });
  })
  .expect("nullable automaton is well formed")
}

/// `some -> 'a' | 'a' some`
pub fn make_non_nullable() -> Automaton {
  build(|ab| {
    ab.add_rule("some", |rb| {
      rb.add_alt(|alt| {
        alt.term(A);
      })
      .add_alt(|alt| {
        alt.term(A).call("some");
      });
    });
  })
  .expect("non-nullable automaton is well formed")
}

/// `E -> '(' E ')' | atom`
pub fn make_nested_parens() -> Automaton {
  build(|ab| {
    ab.add_rule("E", |rb| {
      rb.add_alt(|alt| {
        alt.term(LPAREN).call("E").term(RPAREN);
      })
      .add_alt(|alt| {
        alt.term(ATOM);
      });
    });
  })
  .expect("paren automaton is well formed")
}

/// `file -> list EOF; list -> item list | ε; item -> {predicate} ~')' | '(' .`
///
/// Exercises explicit end-of-input matching, negated sets, wildcards and
/// non-plain epsilon edges.
pub fn make_file() -> Automaton {
  build(|ab| {
    ab.add_rule("file", |rb| {
      rb.add_alt(|alt| {
        alt.call("list").term(TokenType::EOF);
      });
    })
    .add_rule("list", |rb| {
      rb.add_alt(|alt| {
        alt.call("item").call("list");
      })
      .add_empty_alt();
    })
    .add_rule("item", |rb| {
      rb.add_alt(|alt| {
        alt
          .epsilon(EpsilonKind::Predicate)
          .not_terms(vec![LPAREN, RPAREN])
          .epsilon(EpsilonKind::Action);
      })
      .add_alt(|alt| {
        alt.term(LPAREN).wildcard();
      });
    });
  })
  .expect("file automaton is well formed")
}
