//! Working variables are placeholders (`&W1`, `&S2`, `&C3`) that stand in
//! for parts of a derived formula the unification did not determine. Each
//! kind has its own prefix and counter.

use indexmap::IndexMap;
use once_cell::sync::Lazy;

static DEFAULT_PREFIXES: Lazy<IndexMap<String, String>> = Lazy::new(|| {
  [("wff", "&W"), ("setvar", "&S"), ("class", "&C")]
    .into_iter()
    .map(|(k, p)| (k.to_owned(), p.to_owned()))
    .collect()
});

#[derive(Clone, Debug)]
pub struct WorkingVars {
  prefixes: IndexMap<String, String>,
  next: IndexMap<String, u32>,
}

fn split<'a>(prefixes: &'a IndexMap<String, String>, sym: &str) -> Option<(&'a str, u32)> {
  for (kind, prefix) in prefixes {
    if let Some(rest) = sym.strip_prefix(prefix.as_str()) {
      if let Ok(n) = rest.parse::<u32>() {
        if n >= 1 {
          return Some((kind, n));
        }
      }
    }
  }
  None
}

impl Default for WorkingVars {
  fn default() -> Self { Self::new(DEFAULT_PREFIXES.clone()) }
}

impl WorkingVars {
  pub fn new(prefixes: IndexMap<String, String>) -> Self {
    WorkingVars { prefixes, next: IndexMap::new() }
  }

  /// Allocates the next unused working variable of the given kind, or `None`
  /// if the kind has no placeholder prefix.
  pub fn alloc(&mut self, kind: &str) -> Option<String> {
    let prefix = self.prefixes.get(kind)?;
    let n = self.next.entry(kind.to_owned()).or_insert(1);
    let sym = format!("{prefix}{n}");
    *n += 1;
    Some(sym)
  }

  /// The kind of a working variable symbol, or `None` if the symbol is not
  /// a working variable.
  pub fn kind_of(&self, sym: &str) -> Option<&str> {
    split(&self.prefixes, sym).map(|(kind, _)| kind)
  }

  /// Bumps each kind's counter past every working variable appearing in
  /// `tokens`, so later allocations never collide with placeholders already
  /// present in the worksheet.
  pub fn rehydrate<'a>(&mut self, tokens: impl Iterator<Item = &'a str>) {
    for t in tokens {
      if let Some((kind, n)) = split(&self.prefixes, t) {
        let kind = kind.to_owned();
        let e = self.next.entry(kind).or_insert(1);
        if *e <= n {
          *e = n + 1
        }
      }
    }
  }
}
