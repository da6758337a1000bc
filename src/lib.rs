//! Unification and proof encoding engine for Metamath proof worksheets.
//!
//! The entry point is [`unify::Unifier`], which takes the text of a `.mmp`
//! proof worksheet and produces a single whole-document [`types::TextEdit`]:
//! every step is re-unified against its rule, missing formulas are derived
//! (with working variables standing in for underdetermined parts), and when
//! the `qed` step is fully proven a `$= ... $.` proof block is generated in
//! one of three encodings (normal, packed, compressed).
//!
//! The theory context (the loaded `.mm` database) is abstracted behind
//! [`theory::Theory`] and the [`theory::Grammar`] trait; the engine never
//! parses `.mm` files itself.

use std::sync::atomic::AtomicBool;

pub mod checker;
pub mod error;
pub mod format;
pub mod parser;
pub mod proof;
pub mod theory;
pub mod types;
pub mod unify;
pub mod working_vars;
pub mod write;

#[macro_export]
macro_rules! vprintln {
  ($($args:tt)*) => {
    if $crate::verbose() {
      eprintln!($($args)*)
    }
  };
}

static VERBOSE: AtomicBool = AtomicBool::new(false);
pub fn verbose() -> bool { DEBUG && VERBOSE.load(std::sync::atomic::Ordering::SeqCst) }
pub fn set_verbose(b: bool) { VERBOSE.store(b, std::sync::atomic::Ordering::SeqCst) }

const DEBUG: bool = cfg!(debug_assertions);

/// The encoding used for the generated `$= ... $.` proof block.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ProofMode {
  /// Every proof tree node spelled out as its label, in postorder.
  Normal,
  /// Postorder labels with repeated subproofs tagged (`1:wi`) and
  /// back-referenced by number.
  Packed,
  /// The standard Metamath compressed format: a label list in parentheses
  /// followed by an upper-case letter stream.
  Compressed,
}

/// Which ordering to use for the label list of a compressed proof.
#[derive(Clone, Debug)]
pub enum LabelOrderKind {
  /// Labels in order of first use.
  Fifo,
  /// Labels sorted by number of uses, most used first (shorter codes for
  /// more frequent labels); ties broken by first use.
  SortedByReference,
  /// A caller-supplied label list, used as is.
  Hardcoded(Vec<String>),
}

impl LabelOrderKind {
  pub fn strategy(&self) -> Box<dyn write::LabelOrder> {
    match self {
      LabelOrderKind::Fifo => Box::new(write::Fifo),
      LabelOrderKind::SortedByReference => Box::new(write::SortedByReference),
      LabelOrderKind::Hardcoded(labels) => Box::new(write::Hardcoded(labels.clone())),
    }
  }
}

#[derive(Clone, Debug)]
pub struct Config {
  pub proof_mode: ProofMode,
  /// Inclusive line width for generated proof blocks.
  pub characters_per_line: usize,
  /// Continuation indent for compressed proof blocks.
  pub left_margin: usize,
  /// Rewrite step ids as 1..n before unifying.
  pub renumber: bool,
  /// Insert `$theorem <label>` at the top when the worksheet has none.
  pub expected_theorem_label: Option<String>,
  /// Budget for non-identity hypothesis dispositions tried per step.
  pub max_hyp_permutations: usize,
  pub label_order: LabelOrderKind,
}

impl Default for Config {
  fn default() -> Self {
    Config {
      proof_mode: ProofMode::Normal,
      characters_per_line: 79,
      left_margin: 3,
      renumber: false,
      expected_theorem_label: None,
      max_hyp_permutations: 64,
      label_order: LabelOrderKind::Fifo,
    }
  }
}
