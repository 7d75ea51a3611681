use thiserror::Error;

/// An impact summary that contradicts itself.
///
/// Trusting corrupt impact data before a destructive operation is not
/// acceptable, so these are never corrected silently.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
  #[error("total record count {declared} does not match the sum of group counts {computed}")]
  TotalMismatch { declared: u64, computed: u64 },

  #[error("record counts overflow")]
  CountOverflow,

  #[error("affected group '{name}' is listed more than once")]
  DuplicateGroup { name: String },
}

/// Rejected change to the consent fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsentError {
  #[error("no impact preview is loaded")]
  NoPreview,

  #[error("warning index {index} is out of range ({count} warnings)")]
  WarningOutOfRange { index: usize, count: usize },
}
