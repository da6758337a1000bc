//! Proof block serialization. The output format is consumed by other
//! Metamath tools, so the layout (prefixes, continuation indents, the
//! inclusive line width) is exact, not cosmetic.

use crate::proof::PackedItem;
use indexmap::IndexMap;
use std::collections::HashMap;

/// Encodes a 1-based index as the upper-case letter code of a compressed
/// proof: a final letter in `A..T` (base 20) preceded by carry letters in
/// `U..Y` (base 5, most significant first).
pub fn upper_case_letters(n: u32) -> String {
  assert!(n >= 1, "compressed proof indices are 1-based");
  let mut out = vec![b'A' + ((n - 1) % 20) as u8];
  let mut q = (n - 1) / 20;
  while q > 0 {
    out.push(b'U' + ((q - 1) % 5) as u8);
    q = (q - 1) / 5;
  }
  out.reverse();
  String::from_utf8(out).expect("ASCII letters")
}

/// Ordering of the parenthesized label list of a compressed proof.
/// Mandatory hypothesis labels are excluded; they get the lowest indices
/// implicitly.
pub trait LabelOrder {
  fn order(&self, packed: &[PackedItem], mandatory: &[String]) -> Vec<String>;
}

/// Labels in order of first use.
pub struct Fifo;

impl LabelOrder for Fifo {
  fn order(&self, packed: &[PackedItem], mandatory: &[String]) -> Vec<String> {
    let mut out: Vec<String> = vec![];
    for it in packed {
      if let PackedItem::Label { name, .. } = it {
        if !mandatory.contains(name) && !out.contains(name) {
          out.push(name.clone())
        }
      }
    }
    out
  }
}

/// Most used labels first, so the most frequent labels get the shortest
/// letter codes. A back-reference counts as a use of the label it points
/// at. Ties are broken by first use.
pub struct SortedByReference;

impl LabelOrder for SortedByReference {
  fn order(&self, packed: &[PackedItem], mandatory: &[String]) -> Vec<String> {
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for it in packed {
      let name = match it {
        PackedItem::Label { name, .. } | PackedItem::Backref { name, .. } => name,
      };
      *counts.entry(name.as_str()).or_insert(0) += 1;
    }
    let mut entries: Vec<(usize, &str, usize)> =
      counts.iter().enumerate().map(|(first, (&name, &count))| (first, name, count)).collect();
    entries.sort_by_key(|&(first, _, count)| (std::cmp::Reverse(count), first));
    entries
      .into_iter()
      .filter(|(_, name, _)| !mandatory.iter().any(|m| m == name))
      .map(|(_, name, _)| name.to_owned())
      .collect()
  }
}

/// A caller-supplied label list, used as is.
pub struct Hardcoded(pub Vec<String>);

impl LabelOrder for Hardcoded {
  fn order(&self, _packed: &[PackedItem], mandatory: &[String]) -> Vec<String> {
    self.0.iter().filter(|l| !mandatory.contains(l)).cloned().collect()
  }
}

/// Greedy word wrap: `prefix` starts the first line, continuation lines are
/// indented `indent` spaces, and `width` is inclusive.
fn wrap_words<'a>(
  prefix: &str, indent: usize, width: usize, words: impl IntoIterator<Item = &'a str>,
) -> Vec<String> {
  let mut lines = vec![];
  let mut line = prefix.to_owned();
  let mut fresh = true;
  for w in words {
    if fresh {
      line.push_str(w);
      fresh = false;
    } else if line.len() + 1 + w.len() <= width {
      line.push(' ');
      line.push_str(w);
    } else {
      lines.push(std::mem::replace(&mut line, " ".repeat(indent)));
      line.push_str(w);
    }
  }
  lines.push(line);
  lines
}

/// `$=    label label ... $.` with a 6-space continuation indent.
pub fn normal_block(array: &[String], width: usize) -> Vec<String> {
  let words = array.iter().map(String::as_str).chain(["$."]);
  wrap_words("$=    ", 6, width, words)
}

/// `$=  ...` with tagged labels (`1:wi`), numeric back-references, and a
/// 4-space continuation indent.
pub fn packed_block(items: &[PackedItem], width: usize) -> Vec<String> {
  let words: Vec<String> = items
    .iter()
    .map(|it| match it {
      PackedItem::Label { name, tag: Some(t) } => format!("{t}:{name}"),
      PackedItem::Label { name, tag: None } => name.clone(),
      PackedItem::Backref { tag, .. } => tag.to_string(),
    })
    .chain(["$.".to_owned()])
    .collect();
  wrap_words("$=  ", 4, width, words.iter().map(String::as_str))
}

/// `$= ( labels ) LETTERS $.`: the label list is word wrapped, the letter
/// stream continues on the same line and is filled character by character
/// to the line width, continuation lines indented by `margin`.
///
/// Letter codes: 1..m are the mandatory hypotheses (not listed), m+1..m+n
/// the parenthesized labels, and codes past m+n are back-references to the
/// `Z`-tagged subproofs in tag order.
pub fn compressed_block(
  items: &[PackedItem], mandatory: &[String], strategy: &dyn LabelOrder, width: usize,
  margin: usize,
) -> Vec<String> {
  let distinct = strategy.order(items, mandatory);
  let mut index: HashMap<&str, u32> = HashMap::new();
  for (i, l) in mandatory.iter().chain(&distinct).enumerate() {
    index.entry(l.as_str()).or_insert(i as u32 + 1);
  }
  let base = (mandatory.len() + distinct.len()) as u32;

  let mut letters = String::new();
  for it in items {
    match it {
      PackedItem::Label { name, tag } => {
        let Some(&i) = index.get(name.as_str()) else {
          panic!("label '{name}' missing from the compressed label map")
        };
        letters.push_str(&upper_case_letters(i));
        if tag.is_some() {
          letters.push('Z')
        }
      }
      PackedItem::Backref { tag, .. } => letters.push_str(&upper_case_letters(base + tag)),
    }
  }

  let words =
    std::iter::once("(").chain(distinct.iter().map(String::as_str)).chain([")"]);
  let mut lines = wrap_words("$= ", margin, width, words);
  let indent = " ".repeat(margin);
  let mut line = lines.pop().expect("wrap_words returns at least one line");
  if line.len() + 2 > width {
    lines.push(std::mem::replace(&mut line, indent.clone()));
  } else {
    line.push(' ');
  }
  for ch in letters.chars() {
    if line.len() >= width {
      lines.push(std::mem::replace(&mut line, indent.clone()));
    }
    line.push(ch);
  }
  line.push_str(" $.");
  lines.push(line);
  lines
}
