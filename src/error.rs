use crate::types::*;

/// Fatal errors: the worksheet text itself is malformed and no edit can be
/// produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseError {
  MalformedHeader { line: u32, header: String },
  DuplicateStepId { line: u32, id: String },
  /// A step reference that is not the id of an earlier step.
  UnknownStepRef { line: u32, id: String, reference: String },
  MissingDisjVars { line: u32 },
  UnparsableFormula { line: u32, id: String },
  /// An indented line with no proof step before it.
  DanglingContinuation { line: u32 },
}

impl ParseError {
  pub fn line(&self) -> u32 {
    match *self {
      ParseError::MalformedHeader { line, .. }
      | ParseError::DuplicateStepId { line, .. }
      | ParseError::UnknownStepRef { line, .. }
      | ParseError::MissingDisjVars { line }
      | ParseError::UnparsableFormula { line, .. }
      | ParseError::DanglingContinuation { line } => line,
    }
  }

  pub fn report(&self) -> Diagnostic {
    Diagnostic {
      range: Range::line(self.line(), 0, 0),
      severity: Severity::Error,
      message: format!("{self}"),
    }
  }
}

impl std::fmt::Display for ParseError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ParseError::MalformedHeader { header, .. } =>
        write!(f, "malformed step header '{header}'"),
      ParseError::DuplicateStepId { id, .. } => write!(f, "duplicate step id '{id}'"),
      ParseError::UnknownStepRef { id, reference, .. } =>
        write!(f, "step '{id}' references '{reference}', which is not an earlier step"),
      ParseError::MissingDisjVars { .. } =>
        write!(f, "$d statement requires at least two variables"),
      ParseError::UnparsableFormula { id, .. } =>
        write!(f, "the formula of step '{id}' does not parse"),
      ParseError::DanglingContinuation { .. } =>
        write!(f, "continuation line with no preceding proof step"),
    }
  }
}

impl std::error::Error for ParseError {}

/// Per-step failures: reported as diagnostics, the pass continues with the
/// remaining steps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepError {
  UnknownLabel(String),
  HypCountMismatch { label: String, expected: usize, got: usize },
  UnificationFailure { label: String },
  DisjVarViolation { label: String, var1: String, var2: String },
}

impl StepError {
  pub fn report(self, id: &str, range: Range) -> Diagnostic {
    let message = match self {
      StepError::UnknownLabel(label) =>
        format!("step {id}: unknown assertion label '{label}'"),
      StepError::HypCountMismatch { label, expected, got } =>
        format!("step {id}: '{label}' expects {expected} hypotheses, got {got}"),
      StepError::UnificationFailure { label } =>
        format!("step {id}: could not unify with '{label}'"),
      StepError::DisjVarViolation { label, var1, var2 } => format!(
        "step {id}: disjoint variable restriction of '{label}' violated by '{var1}' and '{var2}'"
      ),
    };
    Diagnostic { range, severity: Severity::Error, message }
  }
}
