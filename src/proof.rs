//! Proof linearization: turns a fully proven worksheet into an arena of
//! RPN proof nodes, then into the flat label sequences the encoders
//! consume.

use crate::mk_id;
use crate::parser::{MmpProof, MmpProofStep};
use crate::theory::{ParseNode, Theory};
use crate::types::*;
use std::collections::HashMap;
use std::rc::Rc;

mk_id! {
  ProofId,
}

#[derive(Clone, Debug)]
pub struct ProofNode {
  pub label: String,
  pub children: Vec<ProofId>,
}

/// An arena of proof nodes. Referenced steps are built once and shared, so
/// the arena is a DAG; the normal encoding re-expands shared nodes, the
/// packed and compressed encodings back-reference them.
#[derive(Debug, Default)]
pub struct ProofArena {
  pub nodes: IdxVec<ProofId, ProofNode>,
}

/// One element of a packed proof: a label, possibly tagged for reuse, or a
/// back-reference to a tagged element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PackedItem {
  Label { name: String, tag: Option<u32> },
  /// `name` is the label of the referenced element (the encoders that only
  /// need a number ignore it).
  Backref { tag: u32, name: String },
}

impl ProofArena {
  /// Builds the proof DAG rooted at the `qed` step. Returns `None` when the
  /// worksheet is not fully proven.
  pub fn build(proof: &MmpProof, th: &Theory) -> Option<(ProofArena, ProofId)> {
    let qed = proof.qed()?;
    if !qed.proven {
      return None;
    }
    let steps: HashMap<&str, &MmpProofStep> =
      proof.steps().map(|s| (s.id.as_str(), s)).collect();
    let mut b = Builder { arena: ProofArena::default(), th, steps, memo: HashMap::new() };
    let root = b.step_node(qed);
    Some((b.arena, root))
  }

  /// The full RPN label sequence, shared nodes expanded every time.
  pub fn proof_array(&self, root: ProofId) -> Vec<String> {
    fn walk(a: &ProofArena, id: ProofId, out: &mut Vec<String>) {
      for &c in &a.nodes[id].children {
        walk(a, c, out)
      }
      out.push(a.nodes[id].label.clone())
    }
    let mut out = vec![];
    walk(self, root, &mut out);
    out
  }

  /// The packed sequence: whenever a subproof of length >= 2 repeats an
  /// earlier expansion, it is replaced by a back-reference, and the first
  /// occurrence is tagged. Tags are numbered by position of the tagged
  /// element in the sequence.
  pub fn packed(&self, root: ProofId) -> Vec<PackedItem> {
    enum Ev {
      Label(ProofId),
      Ref(usize),
    }
    let mut exps = HashMap::new();
    let mut seen: HashMap<Rc<Vec<String>>, usize> = HashMap::new();
    let mut events: Vec<Ev> = vec![];
    fn emit(
      a: &ProofArena, id: ProofId, events: &mut Vec<Ev>,
      seen: &mut HashMap<Rc<Vec<String>>, usize>,
      exps: &mut HashMap<ProofId, Rc<Vec<String>>>,
    ) {
      let exp = a.expansion(id, exps);
      if exp.len() > 1 {
        if let Some(&target) = seen.get(&exp) {
          events.push(Ev::Ref(target));
          return;
        }
      }
      for &c in &a.nodes[id].children {
        emit(a, c, events, seen, exps)
      }
      events.push(Ev::Label(id));
      if exp.len() > 1 {
        seen.insert(exp, events.len() - 1);
      }
    }
    emit(self, root, &mut events, &mut seen, &mut exps);

    let mut targets: Vec<usize> = events
      .iter()
      .filter_map(|e| match e {
        Ev::Ref(t) => Some(*t),
        Ev::Label(_) => None,
      })
      .collect();
    targets.sort_unstable();
    targets.dedup();
    let tag_of: HashMap<usize, u32> =
      targets.iter().enumerate().map(|(i, &p)| (p, i as u32 + 1)).collect();

    events
      .iter()
      .enumerate()
      .map(|(pos, e)| match e {
        Ev::Label(id) => PackedItem::Label {
          name: self.nodes[*id].label.clone(),
          tag: tag_of.get(&pos).copied(),
        },
        Ev::Ref(t) => {
          let Ev::Label(id) = &events[*t] else { unreachable!("tag target is a label") };
          PackedItem::Backref { tag: tag_of[t], name: self.nodes[*id].label.clone() }
        }
      })
      .collect()
  }

  fn expansion(
    &self, id: ProofId, memo: &mut HashMap<ProofId, Rc<Vec<String>>>,
  ) -> Rc<Vec<String>> {
    if let Some(e) = memo.get(&id) {
      return e.clone();
    }
    let mut v = vec![];
    for &c in &self.nodes[id].children {
      let e = self.expansion(c, memo);
      v.extend_from_slice(&e);
    }
    v.push(self.nodes[id].label.clone());
    let rc = Rc::new(v);
    memo.insert(id, rc.clone());
    rc
  }
}

struct Builder<'a> {
  arena: ProofArena,
  th: &'a Theory,
  steps: HashMap<&'a str, &'a MmpProofStep>,
  /// Step id -> node, so a step referenced twice becomes a shared node.
  memo: HashMap<String, ProofId>,
}

impl Builder<'_> {
  fn step_node(&mut self, step: &MmpProofStep) -> ProofId {
    if let Some(&id) = self.memo.get(&step.id) {
      return id;
    }
    let label = step.label.clone().expect("proven step has a label");
    let node = if step.is_hyp {
      ProofNode { label, children: vec![] }
    } else {
      let a = self.th.assertion(&label).expect("proven step has a known assertion");
      let subst = step.subst.as_ref().expect("proven step has a substitution");
      let order = step.hyp_order.as_ref().expect("proven step has a disposition");
      let mut children = vec![];
      for f in &a.float_hyps {
        let c = self.syntax_node(&subst[f.var.as_str()]);
        children.push(c);
      }
      for (i, _) in a.ess_hyps.iter().enumerate() {
        let r = self.steps[step.refs[order[i]].as_str()];
        let c = self.step_node(r);
        children.push(c);
      }
      ProofNode { label, children }
    };
    let id = self.arena.nodes.push(node);
    self.memo.insert(step.id.clone(), id);
    id
  }

  /// The syntax proof of a substituted subtree: builds the formula
  /// bottom-up from `$f` hypotheses and syntax constructors.
  fn syntax_node(&mut self, tree: &ParseNode) -> ProofId {
    match tree {
      ParseNode::Node { label, children } => {
        let mut cs = vec![];
        for c in children {
          let n = self.syntax_node(c);
          cs.push(n);
        }
        self.arena.nodes.push(ProofNode { label: label.clone(), children: cs })
      }
      ParseNode::Var { label, .. } =>
        self.arena.nodes.push(ProofNode { label: label.clone(), children: vec![] }),
      ParseNode::Work { .. } => unreachable!("working variable in a proven derivation"),
    }
  }
}

/// The mandatory hypothesis labels of the theorem being proved: the `$f`
/// labels of every variable occurring in the `qed` or hypothesis step
/// formulas (in `$f` declaration order), followed by the hypothesis step
/// labels in script order. These come before the parenthesized label list
/// in a compressed proof.
pub fn mandatory_hyps(proof: &MmpProof, th: &Theory) -> Vec<String> {
  let mut vars: Vec<String> = vec![];
  let mut hyp_labels: Vec<String> = vec![];
  for step in proof.steps() {
    if step.is_hyp || step.id == "qed" {
      if let Some(t) = &step.tree {
        t.collect_vars(&mut vars);
      }
    }
    if step.is_hyp {
      if let Some(l) = &step.label {
        hyp_labels.push(l.clone());
      }
    }
  }
  let mut floats: Vec<(usize, String)> = vars
    .iter()
    .filter_map(|v| Some((th.var_order(v)?, th.float_for(v)?.label.clone())))
    .collect();
  floats.sort();
  let mut out: Vec<String> = floats.into_iter().map(|(_, l)| l).collect();
  out.append(&mut hyp_labels);
  out
}
