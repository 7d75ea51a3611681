use std::fmt;

/// A secret submitted for identity re-verification.
///
/// `Debug` never prints the secret, so credentials can pass through
/// instrumented functions and error paths without leaking into logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
  pub fn new(secret: impl Into<String>) -> Self {
    Self(secret.into())
  }

  pub fn expose(&self) -> &str {
    &self.0
  }
}

impl fmt::Debug for Credential {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("Credential(***)")
  }
}

impl From<String> for Credential {
  fn from(secret: String) -> Self {
    Self(secret)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_debug_redacts() {
    let credential = Credential::new("hunter2");
    assert_eq!(format!("{:?}", credential), "Credential(***)");
    assert_eq!(credential.expose(), "hunter2");
  }
}
