use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// A trait for newtyped integers, that can be used as index types in vectors and sets.
pub trait Idx: Copy + Eq + std::hash::Hash + Ord {
  /// Convert from `T` to `usize`
  fn into_usize(self) -> usize;
  /// Convert from `usize` to `T`
  fn from_usize(_: usize) -> Self;
}

impl Idx for usize {
  fn into_usize(self) -> usize { self }
  fn from_usize(n: usize) -> Self { n }
}
impl Idx for u32 {
  fn into_usize(self) -> usize { self as _ }
  fn from_usize(n: usize) -> Self { n as _ }
}

/// A vector indexed by a custom indexing type `I`, usually a newtyped integer.
pub struct IdxVec<I, T>(pub Vec<T>, PhantomData<I>);

impl<I, T: std::fmt::Debug> std::fmt::Debug for IdxVec<I, T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { self.0.fmt(f) }
}

impl<I, T: Clone> Clone for IdxVec<I, T> {
  fn clone(&self) -> Self { Self(self.0.clone(), PhantomData) }
}

impl<I, T> IdxVec<I, T> {
  /// Construct a new empty [`IdxVec`].
  #[must_use]
  pub const fn new() -> Self { Self(vec![], PhantomData) }

  /// The number of elements in the [`IdxVec`].
  #[must_use]
  pub fn len(&self) -> usize { self.0.len() }

  /// Returns the value that would be returned by the next call to `push`.
  pub fn peek(&self) -> I
  where I: Idx {
    I::from_usize(self.0.len())
  }

  /// Insert a new value at the end of the vector.
  pub fn push(&mut self, val: T) -> I
  where I: Idx {
    let id = self.peek();
    self.0.push(val);
    id
  }

  /// An iterator including the indexes, like `iter().enumerate()`.
  pub fn enum_iter(&self) -> impl Iterator<Item = (I, &T)>
  where I: Idx {
    self.0.iter().enumerate().map(|(n, val)| (I::from_usize(n), val))
  }

  /// Returns `true` if the vector contains no elements.
  #[must_use]
  pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

impl<I, T> From<Vec<T>> for IdxVec<I, T> {
  fn from(vec: Vec<T>) -> Self { Self(vec, PhantomData) }
}

impl<I, T> Default for IdxVec<I, T> {
  fn default() -> Self { vec![].into() }
}

impl<I: Idx, T> Index<I> for IdxVec<I, T> {
  type Output = T;
  fn index(&self, index: I) -> &Self::Output { &self.0[I::into_usize(index)] }
}

impl<I: Idx, T> IndexMut<I> for IdxVec<I, T> {
  fn index_mut(&mut self, index: I) -> &mut Self::Output { &mut self.0[I::into_usize(index)] }
}

#[macro_export]
macro_rules! mk_id {
  ($($id:ident,)*) => {
    $(
      #[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
      pub struct $id(pub u32);
      impl $crate::types::Idx for $id {
        fn from_usize(n: usize) -> Self { Self(n as u32) }
        fn into_usize(self) -> usize { self.0 as usize }
      }
      impl std::fmt::Debug for $id {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { self.0.fmt(f) }
      }
    )*
  };
}

/// A zero-based line/character position in a text document.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
  pub line: u32,
  pub character: u32,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Range {
  pub start: Position,
  pub end: Position,
}

impl Range {
  pub fn line(line: u32, start: u32, end: u32) -> Self {
    Range {
      start: Position { line, character: start },
      end: Position { line, character: end },
    }
  }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Severity {
  Error,
  Warning,
}

/// A diagnostic attached to a range of the worksheet, reported to the caller
/// rather than aborting the pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
  pub range: Range,
  pub severity: Severity,
  pub message: String,
}

/// A whole-document replacement edit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextEdit {
  pub range: Range,
  pub new_text: String,
}

impl TextEdit {
  /// An edit replacing all of `old`, with an end position safely past the
  /// previous content.
  pub fn replace_all(old: &str, new_text: String) -> Self {
    let end = Position { line: old.lines().count() as u32 + 1, character: 0 };
    TextEdit { range: Range { start: Position::default(), end }, new_text }
  }
}
