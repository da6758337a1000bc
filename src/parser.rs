//! Parser for `.mmp` proof worksheets.
//!
//! A worksheet is a line-oriented script: step lines (`h50::mp2.1 |- ph`),
//! `$theorem` and `$d` statements, `*` comment lines, blank lines, and an
//! optional previously generated `$= ... $.` proof block, which is dropped
//! on parse so the pass can regenerate it.

use crate::error::ParseError;
use crate::theory::{Grammar, ParseNode, Substitution};
use crate::types::*;
use crate::working_vars::WorkingVars;
use std::collections::{HashMap, HashSet};

/// One proof step of the worksheet.
#[derive(Clone, Debug)]
pub struct MmpProofStep {
  pub id: String,
  /// `h`-prefixed steps are hypotheses of the theorem being proved.
  pub is_hyp: bool,
  /// Ids of the steps proving this step's essential hypotheses.
  pub refs: Vec<String>,
  /// The assertion justifying the step (for hypothesis steps, the
  /// hypothesis label).
  pub label: Option<String>,
  /// The step formula including its leading typecode, or `None` when the
  /// step is still to be derived.
  pub formula: Option<Vec<String>>,
  pub line: u32,
  pub range: Range,
  pub tree: Option<ParseNode>,
  /// Filled by unification.
  pub proven: bool,
  pub subst: Option<Substitution>,
  /// `hyp_order[i]` is the index into `refs` matched against the i-th
  /// essential hypothesis.
  pub hyp_order: Option<Vec<usize>>,
}

#[derive(Clone, Debug)]
pub enum MmpStatement {
  TheoremLabel(String),
  /// A `*` comment line, verbatim.
  Comment(String),
  Blank,
  Step(MmpProofStep),
  /// The variables of a `$d` statement.
  DisjVar(Vec<String>),
}

/// A parsed worksheet plus the working-variable allocator, already advanced
/// past every placeholder present in the text.
#[derive(Debug)]
pub struct MmpProof {
  pub statements: Vec<MmpStatement>,
  pub work: WorkingVars,
}

impl MmpProof {
  pub fn steps(&self) -> impl Iterator<Item = &MmpProofStep> {
    self.statements.iter().filter_map(|st| match st {
      MmpStatement::Step(s) => Some(s),
      _ => None,
    })
  }

  pub fn qed(&self) -> Option<&MmpProofStep> { self.steps().find(|s| s.id == "qed") }

  /// All declared disjoint pairs, as ordered (lesser, greater) tuples.
  pub fn declared_disjoint(&self) -> HashSet<(String, String)> {
    let mut out = HashSet::new();
    for st in &self.statements {
      if let MmpStatement::DisjVar(vars) = st {
        for (i, x) in vars.iter().enumerate() {
          for y in &vars[i + 1..] {
            if x != y {
              let pair = if x < y { (x.clone(), y.clone()) } else { (y.clone(), x.clone()) };
              out.insert(pair);
            }
          }
        }
      }
    }
    out
  }
}

pub struct MmpParser<'a> {
  grammar: &'a dyn Grammar,
}

impl<'a> MmpParser<'a> {
  pub fn new(grammar: &'a dyn Grammar) -> Self { MmpParser { grammar } }

  pub fn parse(&self, text: &str) -> Result<MmpProof, ParseError> {
    let lines: Vec<&str> = text.lines().collect();
    let mut statements: Vec<MmpStatement> = vec![];
    let mut i = 0;
    while i < lines.len() {
      let ln = i as u32;
      let line = lines[i];
      i += 1;
      let trimmed = line.trim_end();
      if trimmed.trim_start().is_empty() {
        statements.push(MmpStatement::Blank);
        continue;
      }
      if trimmed.starts_with('*') {
        statements.push(MmpStatement::Comment(trimmed.to_owned()));
        continue;
      }
      if let Some(rest) = trimmed.strip_prefix("$theorem") {
        statements.push(MmpStatement::TheoremLabel(rest.trim().to_owned()));
        continue;
      }
      if trimmed.starts_with("$d") {
        let vars: Vec<String> =
          trimmed.split_whitespace().skip(1).map(str::to_owned).collect();
        if vars.len() < 2 {
          return Err(ParseError::MissingDisjVars { line: ln });
        }
        statements.push(MmpStatement::DisjVar(vars));
        continue;
      }
      if trimmed.starts_with("$=") {
        // drop a previously generated proof block, together with the blank
        // lines around it; the pass regenerates all three
        while let Some(MmpStatement::Blank) = statements.last() {
          statements.pop();
        }
        let mut cur = trimmed;
        while !cur.split_whitespace().any(|t| t == "$.") && i < lines.len() {
          cur = lines[i];
          i += 1;
        }
        while i < lines.len() && lines[i].trim().is_empty() {
          i += 1;
        }
        continue;
      }
      if line.starts_with(' ') || line.starts_with('\t') {
        let more = trimmed.split_whitespace().map(str::to_owned);
        let Some(step) = statements.iter_mut().rev().find_map(|st| match st {
          MmpStatement::Step(s) => Some(s),
          _ => None,
        }) else {
          return Err(ParseError::DanglingContinuation { line: ln });
        };
        step.formula.get_or_insert_with(Vec::new).extend(more);
        continue;
      }
      statements.push(MmpStatement::Step(parse_step_line(trimmed, ln)?));
    }

    self.check_step_refs(&statements)?;

    let mut work = WorkingVars::default();
    for st in &statements {
      if let MmpStatement::Step(s) = st {
        if let Some(f) = &s.formula {
          work.rehydrate(f.iter().map(String::as_str));
        }
      }
    }

    for st in &mut statements {
      if let MmpStatement::Step(s) = st {
        if let Some(f) = &s.formula {
          match self.grammar.parse(&f[0], &f[1..], &work) {
            Some(tree) => s.tree = Some(tree),
            None =>
              return Err(ParseError::UnparsableFormula { line: s.line, id: s.id.clone() }),
          }
        }
      }
    }
    Ok(MmpProof { statements, work })
  }

  fn check_step_refs(&self, statements: &[MmpStatement]) -> Result<(), ParseError> {
    let mut seen: HashMap<&str, ()> = HashMap::new();
    for st in statements {
      let MmpStatement::Step(s) = st else { continue };
      if seen.contains_key(s.id.as_str()) {
        return Err(ParseError::DuplicateStepId { line: s.line, id: s.id.clone() });
      }
      for r in &s.refs {
        if !seen.contains_key(r.as_str()) {
          return Err(ParseError::UnknownStepRef {
            line: s.line,
            id: s.id.clone(),
            reference: r.clone(),
          });
        }
      }
      seen.insert(&s.id, ());
    }
    Ok(())
  }
}

fn parse_step_line(line: &str, ln: u32) -> Result<MmpProofStep, ParseError> {
  let mut toks = line.split_whitespace();
  let header = toks.next().expect("step line is nonempty");
  let parts: Vec<&str> = header.split(':').collect();
  if parts.len() > 3 {
    return Err(ParseError::MalformedHeader { line: ln, header: header.to_owned() });
  }
  let (is_hyp, id) = match parts[0].strip_prefix('h') {
    Some(rest) => (true, rest),
    None => (false, parts[0]),
  };
  if id.is_empty() {
    return Err(ParseError::MalformedHeader { line: ln, header: header.to_owned() });
  }
  let refs: Vec<String> = parts
    .get(1)
    .map(|p| p.split(',').filter(|r| !r.is_empty()).map(str::to_owned).collect())
    .unwrap_or_default();
  let label = parts.get(2).filter(|l| !l.is_empty()).map(|l| (*l).to_owned());
  let formula: Vec<String> = toks.map(str::to_owned).collect();
  Ok(MmpProofStep {
    id: id.to_owned(),
    is_hyp,
    refs,
    label,
    formula: (!formula.is_empty()).then_some(formula),
    line: ln,
    range: Range::line(ln, 0, header.len() as u32),
    tree: None,
    proven: false,
    subst: None,
    hyp_order: None,
  })
}
