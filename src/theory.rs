//! The theory context: the slice of a loaded `.mm` database the unifier
//! needs. The engine never reads `.mm` files itself; the embedding
//! application supplies a [`Theory`] and a [`Grammar`].

use crate::working_vars::WorkingVars;
use indexmap::IndexMap;
use std::collections::HashMap;

/// A floating (`$f`) hypothesis: assigns a kind to a variable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FloatHyp {
  pub label: String,
  pub kind: String,
  pub var: String,
}

/// An essential (`$e`) hypothesis of an assertion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EssHyp {
  pub label: String,
  pub typecode: String,
  /// The hypothesis pattern, without the leading typecode.
  pub tokens: Vec<String>,
}

/// An `$a`/`$p` statement together with its frame.
#[derive(Clone, Debug)]
pub struct Assertion {
  pub label: String,
  /// Mandatory floating hypotheses, in declaration order. This order fixes
  /// the order of children in [`ParseNode::Node`] and the order in which
  /// substituted subtrees are emitted into proofs.
  pub float_hyps: Vec<FloatHyp>,
  pub ess_hyps: Vec<EssHyp>,
  pub typecode: String,
  /// The conclusion pattern, without the leading typecode.
  pub conclusion: Vec<String>,
  /// Disjoint variable conditions of the frame (unordered pairs).
  pub disjoint: Vec<(String, String)>,
  /// True for syntax constructors (`wff`/`class`/`setvar` typecodes),
  /// false for provable statements.
  pub is_syntax: bool,
}

#[derive(Clone, Debug)]
pub enum Statement {
  Float(FloatHyp),
  Assert(Assertion),
}

/// The read-only theory the worksheet is unified against.
///
/// `statements` is insertion-ordered; the position of a `$f` statement in it
/// determines the mandatory-hypothesis order of every theorem.
#[derive(Debug, Default)]
pub struct Theory {
  pub statements: IndexMap<String, Statement>,
  /// Variable name to kind, for every `$f`-declared variable.
  pub kinds: HashMap<String, String>,
  /// Variable name to its `$f` label.
  pub floats: HashMap<String, String>,
}

impl Theory {
  pub fn new() -> Self { Self::default() }

  pub fn add_float(&mut self, label: &str, kind: &str, var: &str) {
    let hyp =
      FloatHyp { label: label.to_owned(), kind: kind.to_owned(), var: var.to_owned() };
    self.kinds.insert(var.to_owned(), kind.to_owned());
    self.floats.insert(var.to_owned(), label.to_owned());
    self.statements.insert(label.to_owned(), Statement::Float(hyp));
  }

  pub fn add_assertion(&mut self, a: Assertion) {
    self.statements.insert(a.label.clone(), Statement::Assert(a));
  }

  pub fn assertion(&self, label: &str) -> Option<&Assertion> {
    match self.statements.get(label) {
      Some(Statement::Assert(a)) => Some(a),
      _ => None,
    }
  }

  pub fn float_for(&self, var: &str) -> Option<&FloatHyp> {
    match self.statements.get(self.floats.get(var)?) {
      Some(Statement::Float(f)) => Some(f),
      _ => None,
    }
  }

  /// Declaration position of the `$f` statement for `var`, used to sort
  /// mandatory hypotheses.
  pub fn var_order(&self, var: &str) -> Option<usize> {
    self.statements.get_index_of(self.floats.get(var)?.as_str())
  }
}

/// A parsed formula. Children of a `Node` are in the floating-hypothesis
/// order of the syntax constructor, which is also the order their proofs
/// appear in an RPN proof string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseNode {
  /// Application of a syntax constructor.
  Node { label: String, children: Vec<ParseNode> },
  /// A theory variable; `label` is its `$f` label.
  Var { label: String, var: String },
  /// A working variable placeholder, e.g. `&W2`.
  Work { var: String, kind: String },
}

impl ParseNode {
  pub fn has_working_vars(&self) -> bool {
    match self {
      ParseNode::Work { .. } => true,
      ParseNode::Var { .. } => false,
      ParseNode::Node { children, .. } => children.iter().any(|c| c.has_working_vars()),
    }
  }

  /// Collects theory variables, first occurrence first, no duplicates.
  pub fn collect_vars(&self, out: &mut Vec<String>) {
    match self {
      ParseNode::Var { var, .. } =>
        if !out.iter().any(|v| v == var) {
          out.push(var.clone())
        },
      ParseNode::Work { .. } => {}
      ParseNode::Node { children, .. } =>
        for c in children {
          c.collect_vars(out)
        },
    }
  }

  /// Renders the formula back to its token string (without a typecode).
  pub fn append_tokens(&self, th: &Theory, out: &mut Vec<String>) {
    match self {
      ParseNode::Var { var, .. } => out.push(var.clone()),
      ParseNode::Work { var, .. } => out.push(var.clone()),
      ParseNode::Node { label, children } => {
        let a = th.assertion(label).expect("parse node is not a syntax constructor");
        let by_var: HashMap<&str, &ParseNode> =
          a.float_hyps.iter().zip(children).map(|(f, c)| (f.var.as_str(), c)).collect();
        for tok in &a.conclusion {
          match by_var.get(tok.as_str()) {
            Some(c) => c.append_tokens(th, out),
            None => out.push(tok.clone()),
          }
        }
      }
    }
  }
}

/// A substitution mapping assertion variables to parsed subtrees.
pub type Substitution = HashMap<String, ParseNode>;

/// The formula parser of the embedding application.
///
/// `typecode` is the token the formula started with (`|-` parses with the
/// grammar of its provable kind). Working variables in `tokens` must be
/// resolved against `work`. Returns `None` when the token string is not a
/// well-formed formula of that kind.
pub trait Grammar {
  fn parse(&self, typecode: &str, tokens: &[String], work: &WorkingVars) -> Option<ParseNode>;
}
