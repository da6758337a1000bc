//! Shared test support: a minimal `.mm` loader, a recursive-descent formula
//! parser implementing [`Grammar`], and proof decoders used for round-trip
//! checks. The engine itself never parses `.mm` files; these stand in for
//! the embedding application.

use mmp_unifier::proof::PackedItem;
use mmp_unifier::theory::{Assertion, EssHyp, FloatHyp, Grammar, ParseNode, Statement, Theory};
use mmp_unifier::unify::{Unifier, UnifyOutcome};
use mmp_unifier::working_vars::WorkingVars;
use mmp_unifier::Config;
use std::collections::HashMap;

/// Loads a flat `.mm` theory text: `$c $v $f $e $a $p $d ${ $}` statements,
/// `$p` proofs skipped. Enough for the fixture theories below.
pub fn load_theory(text: &str) -> Theory {
  let toks: Vec<&str> = text.split_whitespace().collect();
  let mut th = Theory::new();
  let mut ess: Vec<EssHyp> = vec![];
  let mut disj: Vec<(String, String)> = vec![];
  let mut scopes: Vec<(usize, usize)> = vec![];
  let mut i = 0;
  while i < toks.len() {
    match toks[i] {
      "$c" | "$v" => {
        while toks[i] != "$." {
          i += 1
        }
        i += 1;
      }
      "${" => {
        scopes.push((ess.len(), disj.len()));
        i += 1;
      }
      "$}" => {
        let (e, d) = scopes.pop().expect("unbalanced $}");
        ess.truncate(e);
        disj.truncate(d);
        i += 1;
      }
      "$d" => {
        i += 1;
        let start = i;
        while toks[i] != "$." {
          i += 1
        }
        let vars = &toks[start..i];
        for (a, x) in vars.iter().enumerate() {
          for y in &vars[a + 1..] {
            disj.push(((*x).to_owned(), (*y).to_owned()));
          }
        }
        i += 1;
      }
      label => match toks[i + 1] {
        "$f" => {
          th.add_float(label, toks[i + 2], toks[i + 3]);
          assert_eq!(toks[i + 4], "$.", "malformed $f");
          i += 5;
        }
        "$e" => {
          let typecode = toks[i + 2].to_owned();
          i += 3;
          let start = i;
          while toks[i] != "$." {
            i += 1
          }
          ess.push(EssHyp {
            label: label.to_owned(),
            typecode,
            tokens: toks[start..i].iter().map(|t| (*t).to_owned()).collect(),
          });
          i += 1;
        }
        "$a" | "$p" => {
          let typecode = toks[i + 2].to_owned();
          i += 3;
          let start = i;
          while toks[i] != "$." && toks[i] != "$=" {
            i += 1
          }
          let conclusion: Vec<String> =
            toks[start..i].iter().map(|t| (*t).to_owned()).collect();
          while toks[i] != "$." {
            i += 1
          }
          i += 1;
          // mandatory variables in $f declaration order
          let mut vars: Vec<String> = vec![];
          for t in ess.iter().flat_map(|h| &h.tokens).chain(&conclusion) {
            if th.kinds.contains_key(t.as_str()) && !vars.contains(t) {
              vars.push(t.clone())
            }
          }
          vars.sort_by_key(|v| th.var_order(v));
          let float_hyps: Vec<FloatHyp> =
            vars.iter().map(|v| th.float_for(v).expect("declared variable").clone()).collect();
          let disjoint: Vec<(String, String)> = disj
            .iter()
            .filter(|(x, y)| vars.contains(x) && vars.contains(y))
            .cloned()
            .collect();
          let is_syntax = typecode != "|-";
          th.add_assertion(Assertion {
            label: label.to_owned(),
            float_hyps,
            ess_hyps: ess.clone(),
            typecode,
            conclusion,
            disjoint,
            is_syntax,
          });
        }
        other => panic!("unexpected token '{other}' after '{label}'"),
      },
    }
  }
  th
}

/// A backtracking recursive-descent parser over the theory's syntax
/// constructors, tried in declaration order. Fine for the fixture grammars,
/// which have no left recursion.
pub struct RecDescent<'a> {
  pub th: &'a Theory,
}

impl Grammar for RecDescent<'_> {
  fn parse(&self, typecode: &str, tokens: &[String], work: &WorkingVars) -> Option<ParseNode> {
    let kind = if typecode == "|-" { "wff" } else { typecode };
    let (node, used) = self.parse_kind(kind, tokens, 0, work)?;
    (used == tokens.len()).then_some(node)
  }
}

impl RecDescent<'_> {
  fn parse_kind(
    &self, kind: &str, toks: &[String], pos: usize, work: &WorkingVars,
  ) -> Option<(ParseNode, usize)> {
    let t = toks.get(pos)?;
    if self.th.kinds.get(t.as_str()).map_or(false, |k| k == kind) {
      let f = self.th.float_for(t).expect("declared variable");
      return Some((ParseNode::Var { label: f.label.clone(), var: t.clone() }, pos + 1));
    }
    if work.kind_of(t).map_or(false, |k| k == kind) {
      return Some((ParseNode::Work { var: t.clone(), kind: kind.to_owned() }, pos + 1));
    }
    'axiom: for (_, st) in &self.th.statements {
      let Statement::Assert(a) = st else { continue };
      if !a.is_syntax || a.typecode != kind {
        continue;
      }
      let mut children: Vec<(String, ParseNode)> = vec![];
      let mut p = pos;
      for pt in &a.conclusion {
        match self.th.kinds.get(pt.as_str()) {
          Some(k) => match self.parse_kind(k, toks, p, work) {
            Some((node, np)) => {
              children.push((pt.clone(), node));
              p = np;
            }
            None => continue 'axiom,
          },
          None => {
            if toks.get(p).map(String::as_str) != Some(pt.as_str()) {
              continue 'axiom;
            }
            p += 1;
          }
        }
      }
      let mut ordered = Vec::with_capacity(children.len());
      for f in &a.float_hyps {
        let (_, node) = children.iter().find(|(v, _)| *v == f.var)?;
        ordered.push(node.clone());
      }
      return Some((ParseNode::Node { label: a.label.clone(), children: ordered }, p));
    }
    None
  }
}

pub fn unify_text(th: &Theory, cfg: &Config, src: &str) -> UnifyOutcome {
  let grammar = RecDescent { th };
  Unifier::new(th, &grammar, cfg).unify(src).expect("worksheet parses")
}

fn arity(th: &Theory, label: &str) -> usize {
  th.assertion(label).map_or(0, |a| a.float_hyps.len() + a.ess_hyps.len())
}

/// Expands a packed proof back to the full RPN label sequence, resolving
/// back-references through the tag table.
pub fn expand_packed(th: &Theory, items: &[PackedItem]) -> Vec<String> {
  let mut stack: Vec<Vec<String>> = vec![];
  let mut tagged: HashMap<u32, Vec<String>> = HashMap::new();
  for it in items {
    match it {
      PackedItem::Label { name, tag } => {
        let k = arity(th, name);
        let mut exp: Vec<String> = vec![];
        for arg in stack.split_off(stack.len() - k) {
          exp.extend(arg)
        }
        exp.push(name.clone());
        if let Some(t) = tag {
          tagged.insert(*t, exp.clone());
        }
        stack.push(exp);
      }
      PackedItem::Backref { tag, .. } => stack.push(tagged[tag].clone()),
    }
  }
  assert_eq!(stack.len(), 1, "packed proof leaves one subproof");
  stack.pop().unwrap()
}

/// Decompresses the letter stream of a compressed proof to the full RPN
/// label sequence, given its index tables.
pub fn decode_compressed(
  th: &Theory, mandatory: &[String], distinct: &[String], letters: &str,
) -> Vec<String> {
  let labels: Vec<&String> = mandatory.iter().chain(distinct).collect();
  let base = labels.len() as u32;
  let mut stack: Vec<Vec<String>> = vec![];
  let mut tagged: Vec<Vec<String>> = vec![];
  let mut acc: u32 = 0;
  for ch in letters.chars() {
    match ch {
      'A'..='T' => {
        let n = acc * 20 + (ch as u32 - 'A' as u32 + 1);
        acc = 0;
        if n <= base {
          let name = labels[(n - 1) as usize];
          let k = arity(th, name);
          let mut exp: Vec<String> = vec![];
          for arg in stack.split_off(stack.len() - k) {
            exp.extend(arg)
          }
          exp.push(name.clone());
          stack.push(exp);
        } else {
          stack.push(tagged[(n - base - 1) as usize].clone());
        }
      }
      'U'..='Y' => acc = acc * 5 + (ch as u32 - 'U' as u32 + 1),
      'Z' => tagged.push(stack.last().expect("Z follows a subproof").clone()),
      other => panic!("unexpected character '{other}' in compressed proof"),
    }
  }
  assert_eq!(stack.len(), 1, "compressed proof leaves one subproof");
  stack.pop().unwrap()
}

pub const MP2_MM: &str = "
$c ( $. $c ) $. $c -> $. $c wff $. $c |- $.
$v ph $. $v ps $. $v ch $.
wph $f wff ph $. wps $f wff ps $. wch $f wff ch $.
wi $a wff ( ph -> ps ) $.
${ min $e |- ph $. maj $e |- ( ph -> ps ) $. ax-mp $a |- ps $. $}
";

pub const ID_MM: &str = "
$c ( $. $c ) $. $c -> $. $c wff $. $c |- $.
$v ph $. $v ps $. $v ch $.
wph $f wff ph $. wps $f wff ps $. wch $f wff ch $.
wi $a wff ( ph -> ps ) $.
${ min $e |- ph $. maj $e |- ( ph -> ps ) $. ax-mp $a |- ps $. $}
ax-1 $a |- ( ph -> ( ps -> ph ) ) $.
ax-2 $a |- ( ( ph -> ( ps -> ch ) ) -> ( ( ph -> ps ) -> ( ph -> ch ) ) ) $.
${ a2i.1 $e |- ( ph -> ( ps -> ch ) ) $. a2i $p |- ( ( ph -> ps ) -> ( ph -> ch ) ) $=
( wi ax-2 ax-mp ) ABCEEABEACEEDABCFG $. $}
${ mpd.1 $e |- ( ph -> ps ) $. mpd.2 $e |- ( ph -> ( ps -> ch ) ) $.
mpd $p |- ( ph -> ch ) $= ( wi a2i ax-mp ) ABFACFDABCEGH $. $}
id $p |- ( ph -> ph ) $= ( wi ax-1 mpd ) AAABZAAACAECD $.
";

/// Set-theory fragment covering the vex and equvinv derivations.
pub const VEX_MM: &str = "
$c ( ) -> <-> /\\ = e. E. { | } _V wff setvar class |- $.
$v ph ps ch x y z A B $.
wph $f wff ph $. wps $f wff ps $. wch $f wff ch $.
vx $f setvar x $. vy $f setvar y $. vz $f setvar z $.
cA $f class A $. cB $f class B $.
wi $a wff ( ph -> ps ) $.
wb $a wff ( ph <-> ps ) $.
wa $a wff ( ph /\\ ps ) $.
wex $a wff E. x ph $.
cv $a class x $.
wceq $a wff A = B $.
wcel $a wff A e. B $.
cvv $a class _V $.
cab $a class { x | ph } $.
equid $a |- x = x $.
df-v $a |- _V = { x | x = x } $.
${ abeq2i.1 $e |- A = { x | ph } $. abeq2i $a |- ( x e. A <-> ph ) $. $}
${ mpbir.min $e |- ps $. mpbir.maj $e |- ( ph <-> ps ) $. mpbir $a |- ph $. $}
${ $d x y $. ax6ev $a |- E. x x = y $. $}
ax7 $a |- ( x = y -> ( x = z -> y = z ) ) $.
equtrr $a |- ( x = y -> ( z = x -> z = y ) ) $.
${ ancld.1 $e |- ( ph -> ( ps -> ch ) ) $. ancld $a |- ( ph -> ( ps -> ( ps /\\ ch ) ) ) $. $}
${ $d x ph $. eximdv.1 $e |- ( ph -> ( ps -> ch ) ) $.
eximdv $a |- ( ph -> ( E. x ps -> E. x ch ) ) $. $}
${ mpi.1 $e |- ps $. mpi.2 $e |- ( ph -> ( ps -> ch ) ) $. mpi $a |- ( ph -> ch ) $. $}
${ imp.1 $e |- ( ph -> ( ps -> ch ) ) $. imp $a |- ( ( ph /\\ ps ) -> ch ) $. $}
${ $d x ps $. exlimiv.1 $e |- ( ph -> ps ) $. exlimiv $a |- ( E. x ph -> ps ) $. $}
${ impbii.1 $e |- ( ph -> ps ) $. impbii.2 $e |- ( ps -> ph ) $. impbii $a |- ( ph <-> ps ) $. $}
";

/// Theory with a `$d` condition on ax-5, for restriction checking.
pub const DJVAR_MM: &str = "
$c ( ) -> A. e. wff setvar class |- $.
$v ph ps x y A B $.
wph $f wff ph $. wps $f wff ps $.
vx $f setvar x $. vy $f setvar y $.
cA $f class A $. cB $f class B $.
wi $a wff ( ph -> ps ) $.
wal $a wff A. x ph $.
cv $a class x $.
wcel $a wff A e. B $.
${ $d x ph $. ax-5 $a |- ( ph -> A. x ph ) $. $}
";

/// Complex-number fragment for the opelcn derivation.
pub const OPELCN_MM: &str = "
$c ( ) <-> /\\ = e. <. >. , X. CC R. wff class |- $.
$v ph ps ch A B C D $.
wph $f wff ph $. wps $f wff ps $. wch $f wff ch $.
cA $f class A $. cB $f class B $. cC $f class C $. cD $f class D $.
wb $a wff ( ph <-> ps ) $.
wa $a wff ( ph /\\ ps ) $.
wceq $a wff A = B $.
wcel $a wff A e. B $.
cop $a class <. A , B >. $.
cxp $a class ( A X. B ) $.
cc $a class CC $.
cnr $a class R. $.
df-c $a |- CC = ( R. X. R. ) $.
${ eleq2i.1 $e |- A = B $. eleq2i $a |- ( C e. A <-> C e. B ) $. $}
opelxp $a |- ( <. A , B >. e. ( C X. D ) <-> ( A e. C /\\ B e. D ) ) $.
${ bitri.1 $e |- ( ph <-> ps ) $. bitri.2 $e |- ( ps <-> ch ) $. bitri $a |- ( ph <-> ch ) $. $}
";
