//! Worksheet formatting: step columns, document assembly, proof block
//! placement.

use crate::parser::{MmpProof, MmpProofStep, MmpStatement};
use crate::Config;
use itertools::Itertools;
use std::collections::HashMap;

/// Base column for step formulas; each level of reference depth indents one
/// more column.
const FORMULA_COLUMN: usize = 19;

/// Reference depth of each step, in script order: the length of the longest
/// reference chain from any later step down to it (`qed` is 0).
fn step_depths(proof: &MmpProof) -> Vec<usize> {
  let steps: Vec<&MmpProofStep> = proof.steps().collect();
  let index: HashMap<&str, usize> =
    steps.iter().enumerate().map(|(i, s)| (s.id.as_str(), i)).collect();
  let mut depth = vec![0; steps.len()];
  for i in (0..steps.len()).rev() {
    for r in &steps[i].refs {
      if let Some(&j) = index.get(r.as_str()) {
        depth[j] = depth[j].max(depth[i] + 1)
      }
    }
  }
  depth
}

fn step_lines(step: &MmpProofStep, depth: usize) -> Vec<String> {
  let mut header = String::new();
  if step.is_hyp {
    header.push('h')
  }
  header.push_str(&step.id);
  header.push(':');
  header.push_str(&step.refs.join(","));
  header.push(':');
  if let Some(l) = &step.label {
    header.push_str(l)
  }
  let Some(formula) = &step.formula else { return vec![header] };
  let formula = formula.join(" ");
  let col = FORMULA_COLUMN + depth;
  if header.len() >= col {
    // header too long for the column; formula moves to its own line
    vec![header, format!("{}{formula}", " ".repeat(col))]
  } else {
    vec![format!("{header}{}{formula}", " ".repeat(col - header.len()))]
  }
}

/// Assembles the replacement document: statements in order, step formulas
/// aligned, the proof block (when present) inserted after the last step
/// with a blank line on both sides, and the `$theorem`/comment headers
/// inserted when configured and missing.
pub fn build_document(proof: &MmpProof, block: Option<&[String]>, cfg: &Config) -> String {
  let depths = step_depths(proof);
  let mut lines: Vec<String> = vec![];
  if let Some(label) = &cfg.expected_theorem_label {
    if !proof.statements.iter().any(|st| matches!(st, MmpStatement::TheoremLabel(_))) {
      lines.push(format!("$theorem {label}"));
    }
  }
  if !proof.statements.iter().any(|st| matches!(st, MmpStatement::Comment(_))) {
    lines.extend(["".to_owned(), "* MissingComment".to_owned(), "".to_owned()]);
  }
  let last_step =
    proof.statements.iter().rposition(|st| matches!(st, MmpStatement::Step(_)));
  let mut step_no = 0;
  for (i, st) in proof.statements.iter().enumerate() {
    match st {
      MmpStatement::TheoremLabel(l) => lines.push(format!("$theorem {l}")),
      MmpStatement::Comment(text) => lines.push(text.clone()),
      MmpStatement::Blank => lines.push(String::new()),
      MmpStatement::DisjVar(vars) => lines.push(format!("$d {}", vars.iter().format(" "))),
      MmpStatement::Step(step) => {
        lines.extend(step_lines(step, depths[step_no]));
        step_no += 1;
        if Some(i) == last_step {
          if let Some(block) = block {
            lines.push(String::new());
            lines.extend(block.iter().cloned());
            lines.push(String::new());
          }
        }
      }
    }
  }
  let mut out = lines.join("\n");
  out.push('\n');
  out
}
