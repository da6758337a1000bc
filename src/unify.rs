//! The unification pass: re-derives every step of a worksheet against its
//! justifying assertion and produces a single whole-document edit.

use crate::checker::DisjVarChecker;
use crate::error::{ParseError, StepError};
use crate::parser::{MmpParser, MmpProof, MmpProofStep, MmpStatement};
use crate::proof::{mandatory_hyps, ProofArena};
use crate::theory::{Assertion, Grammar, ParseNode, Substitution, Theory};
use crate::types::*;
use crate::working_vars::WorkingVars;
use crate::{format, vprintln, write, Config, ProofMode};
use itertools::Itertools;
use std::collections::HashMap;

/// The result of one pass over a worksheet.
#[derive(Clone, Debug)]
pub struct UnifyOutcome {
  /// Whole-document replacement with the reformatted worksheet.
  pub edit: TextEdit,
  pub diagnostics: Vec<Diagnostic>,
  /// True when the `qed` step is proven and a proof block was emitted.
  pub complete: bool,
}

pub struct Unifier<'a> {
  theory: &'a Theory,
  grammar: &'a dyn Grammar,
  cfg: &'a Config,
  pub diagnostics: Vec<Diagnostic>,
}

impl<'a> Unifier<'a> {
  pub fn new(theory: &'a Theory, grammar: &'a dyn Grammar, cfg: &'a Config) -> Self {
    Unifier { theory, grammar, cfg, diagnostics: vec![] }
  }

  /// Runs the full pass and builds the replacement text.
  pub fn unify(&mut self, text: &str) -> Result<UnifyOutcome, ParseError> {
    let proof = self.unify_proof(text)?;
    let complete = proof.qed().map_or(false, |s| s.proven);
    let block = if complete {
      let w = self.cfg.characters_per_line;
      ProofArena::build(&proof, self.theory).map(|(arena, root)| match self.cfg.proof_mode {
        ProofMode::Normal => write::normal_block(&arena.proof_array(root), w),
        ProofMode::Packed => write::packed_block(&arena.packed(root), w),
        ProofMode::Compressed => {
          let mandatory = mandatory_hyps(&proof, self.theory);
          let strategy = self.cfg.label_order.strategy();
          write::compressed_block(&arena.packed(root), &mandatory, &*strategy, w, self.cfg.left_margin)
        }
      })
    } else {
      None
    };
    let new_text = format::build_document(&proof, block.as_deref(), self.cfg);
    Ok(UnifyOutcome {
      edit: TextEdit::replace_all(text, new_text),
      diagnostics: std::mem::take(&mut self.diagnostics),
      complete,
    })
  }

  /// Parses and unifies, returning the annotated worksheet (steps carry
  /// their substitution, hypothesis disposition and proven flag).
  pub fn unify_proof(&mut self, text: &str) -> Result<MmpProof, ParseError> {
    let mut proof = MmpParser::new(self.grammar).parse(text)?;
    if self.cfg.renumber {
      renumber(&mut proof)
    }
    self.process_steps(&mut proof);
    Ok(proof)
  }

  fn process_steps(&mut self, proof: &mut MmpProof) {
    let theory = self.theory;
    let checker = DisjVarChecker::new(proof);
    for i in 0..proof.statements.len() {
      let (before, rest) = proof.statements.split_at_mut(i);
      let MmpStatement::Step(step) = &mut rest[0] else { continue };
      if step.is_hyp {
        step.proven = step.label.is_some()
          && step.tree.as_ref().map_or(false, |t| !t.has_working_vars());
        continue;
      }
      let Some(label) = step.label.clone() else { continue };
      let Some(a) = theory.assertion(&label) else {
        self.diagnostics.push(StepError::UnknownLabel(label).report(&step.id, step.range));
        continue;
      };
      let refs: Vec<&MmpProofStep> = step
        .refs
        .iter()
        .map(|r| find_step(before, r).expect("references checked at parse"))
        .collect();
      match self.unify_step(a, step, &refs, &mut proof.work) {
        Ok((subst, order, derived)) => {
          if let Some(tree) = derived {
            let mut formula = vec![a.typecode.clone()];
            tree.append_tokens(theory, &mut formula);
            step.formula = Some(formula);
            step.tree = Some(tree);
          }
          match checker.check(a, &subst) {
            Ok(()) => {
              let refs_proven = refs.iter().all(|r| r.proven);
              step.proven = refs_proven
                && step.tree.as_ref().map_or(false, |t| !t.has_working_vars());
              step.subst = Some(subst);
              step.hyp_order = Some(order);
              vprintln!("step {} unified with {label}", step.id);
            }
            Err((var1, var2)) => {
              self.diagnostics.push(
                StepError::DisjVarViolation { label, var1, var2 }
                  .report(&step.id, step.range),
              );
            }
          }
        }
        Err(e) => self.diagnostics.push(e.report(&step.id, step.range)),
      }
    }
  }

  /// Unifies one derived step: matches the conclusion pattern against the
  /// step formula (when present), then tries hypothesis dispositions until
  /// one matches all referenced steps. Returns the substitution, the
  /// winning disposition, and the derived tree when the step had no
  /// formula.
  fn unify_step(
    &self, a: &Assertion, step: &MmpProofStep, refs: &[&MmpProofStep],
    work: &mut WorkingVars,
  ) -> Result<(Substitution, Vec<usize>, Option<ParseNode>), StepError> {
    if refs.len() != a.ess_hyps.len() {
      return Err(StepError::HypCountMismatch {
        label: a.label.clone(),
        expected: a.ess_hyps.len(),
        got: refs.len(),
      });
    }
    let fail = || StepError::UnificationFailure { label: a.label.clone() };
    let concl = self.grammar.parse(&a.typecode, &a.conclusion, work).ok_or_else(fail)?;
    let hyp_pats: Vec<ParseNode> = a
      .ess_hyps
      .iter()
      .map(|h| self.grammar.parse(&h.typecode, &h.tokens, work))
      .collect::<Option<_>>()
      .ok_or_else(fail)?;
    let mut base = Substitution::new();
    if let Some(tree) = &step.tree {
      if !match_node(&concl, tree, &mut base) {
        return Err(fail());
      }
    }
    // identity disposition first, then permutations in lexicographic order;
    // the cap budgets the non-identity attempts
    let n = refs.len();
    for order in (0..n).permutations(n).take(self.cfg.max_hyp_permutations.saturating_add(1))
    {
      let mut subst = base.clone();
      let mut ok = true;
      for (pat, &r) in hyp_pats.iter().zip(&order) {
        match &refs[r].tree {
          Some(t) if match_node(pat, t, &mut subst) => {}
          _ => {
            ok = false;
            break;
          }
        }
      }
      if !ok {
        continue;
      }
      let derived = if step.tree.is_none() {
        // derive the formula, inventing working variables for anything
        // the hypotheses left unbound
        for f in &a.float_hyps {
          if !subst.contains_key(&f.var) {
            let var = work.alloc(&f.kind).ok_or_else(fail)?;
            subst.insert(f.var.clone(), ParseNode::Work { var, kind: f.kind.clone() });
          }
        }
        Some(substitute(&concl, &subst))
      } else {
        None
      };
      return Ok((subst, order, derived));
    }
    Err(fail())
  }
}

fn find_step<'s>(statements: &'s [MmpStatement], id: &str) -> Option<&'s MmpProofStep> {
  statements.iter().find_map(|st| match st {
    MmpStatement::Step(s) if s.id == id => Some(s),
    _ => None,
  })
}

/// Matches an assertion pattern against a parsed formula, extending `subst`.
/// On failure `subst` may hold partial bindings; callers clone per attempt.
pub fn match_node(pat: &ParseNode, target: &ParseNode, subst: &mut Substitution) -> bool {
  match pat {
    ParseNode::Var { var, .. } => match subst.get(var) {
      Some(prev) => prev == target,
      None => {
        subst.insert(var.clone(), target.clone());
        true
      }
    },
    ParseNode::Node { label, children } => match target {
      ParseNode::Node { label: tl, children: tc }
        if label == tl && children.len() == tc.len() =>
      {
        for (p, t) in children.iter().zip(tc) {
          if !match_node(p, t, subst) {
            return false;
          }
        }
        true
      }
      _ => false,
    },
    // assertion patterns never contain working variables
    ParseNode::Work { .. } => false,
  }
}

/// Applies a substitution to an assertion pattern. Every variable of the
/// pattern must be bound.
pub fn substitute(pat: &ParseNode, subst: &Substitution) -> ParseNode {
  match pat {
    ParseNode::Var { var, .. } => subst[var.as_str()].clone(),
    ParseNode::Work { .. } => pat.clone(),
    ParseNode::Node { label, children } => ParseNode::Node {
      label: label.clone(),
      children: children.iter().map(|c| substitute(c, subst)).collect(),
    },
  }
}

/// Rewrites step ids to 1..n in script order (`qed` keeps its name) and
/// updates every reference.
fn renumber(proof: &mut MmpProof) {
  let mut map: HashMap<String, String> = HashMap::new();
  let mut n = 0u32;
  for st in &proof.statements {
    if let MmpStatement::Step(s) = st {
      if s.id != "qed" {
        n += 1;
        map.insert(s.id.clone(), n.to_string());
      }
    }
  }
  for st in &mut proof.statements {
    if let MmpStatement::Step(s) = st {
      if let Some(new) = map.get(&s.id) {
        s.id = new.clone()
      }
      for r in &mut s.refs {
        if let Some(new) = map.get(r) {
          *r = new.clone()
        }
      }
    }
  }
}
