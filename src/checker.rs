//! Disjoint-variable restriction checker.
//!
//! When a step instantiates an assertion with a `$d u v` condition, every
//! variable of the subtree substituted for `u` must be declared disjoint
//! (by a `$d` statement of the worksheet) from every variable of the
//! subtree substituted for `v`; a variable shared between the two subtrees
//! violates the restriction outright.

use crate::parser::MmpProof;
use crate::theory::{Assertion, Substitution};
use std::collections::HashSet;

pub struct DisjVarChecker {
  declared: HashSet<(String, String)>,
}

impl DisjVarChecker {
  pub fn new(proof: &MmpProof) -> Self {
    DisjVarChecker { declared: proof.declared_disjoint() }
  }

  /// Checks every `$d` condition of `a` under `subst`; returns the first
  /// offending variable pair on failure.
  pub fn check(&self, a: &Assertion, subst: &Substitution) -> Result<(), (String, String)> {
    for (u, v) in &a.disjoint {
      let (Some(su), Some(sv)) = (subst.get(u), subst.get(v)) else { continue };
      let (mut vu, mut vv) = (vec![], vec![]);
      su.collect_vars(&mut vu);
      sv.collect_vars(&mut vv);
      for x in &vu {
        for y in &vv {
          if x == y {
            return Err((x.clone(), y.clone()));
          }
          let pair =
            if x < y { (x.clone(), y.clone()) } else { (y.clone(), x.clone()) };
          if !self.declared.contains(&pair) {
            return Err((x.clone(), y.clone()));
          }
        }
      }
    }
    Ok(())
  }
}
