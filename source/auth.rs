// Authenticator collaborator (spec §6): supplies user/password and selects
// a SASL mechanism. The PLAIN encoding itself is the teacher's imap::plain
// (source/imap.rs), kept verbatim; only the trait wrapper around it and the
// credential hygiene (zeroize) are new.

use zeroize::Zeroize as _;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mechanism {
  Plain,
}

pub trait Authenticator {
  fn user(&self) -> &str;
  fn password(&self) -> &str;
  fn mechanism(&self) -> Mechanism {
    Mechanism::Plain
  }
}

pub struct StaticCredentials {
  user: String,
  password: String,
}

impl StaticCredentials {
  pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
    Self {
      user: user.into(),
      password: password.into(),
    }
  }
}

impl Authenticator for StaticCredentials {
  fn user(&self) -> &str {
    &self.user
  }

  fn password(&self) -> &str {
    &self.password
  }
}

impl Drop for StaticCredentials {
  fn drop(&mut self) {
    self.password.zeroize();
  }
}

/// https://www.rfc-editor.org/rfc/rfc4616#section-2
/// The client presents the authorization identity (identity to act as),
/// followed by a NUL character, followed by the authentication identity
/// [...] followed by a NUL character, followed by the clear-text password.
pub fn plain(user: &str, password: &str) -> String {
  use base64::Engine as _;
  let engine = base64::engine::GeneralPurpose::new(
    &base64::alphabet::STANDARD,
    base64::engine::general_purpose::PAD,
  );
  let mut bytes = format!("\0{user}\0{password}").into_bytes();
  let encoded = engine.encode(&bytes);
  bytes.zeroize();
  encoded
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use test_log::test;

  #[test]
  fn plain_encodes_as_base64_of_nul_separated_triple() {
    let encoded = plain("user", "pass");
    use base64::Engine as _;
    let decoded = base64::engine::general_purpose::STANDARD
      .decode(encoded)
      .unwrap();
    assert_eq!(b"\0user\0pass".to_vec(), decoded);
  }

  #[test]
  fn mechanism_defaults_to_plain() {
    let credentials = StaticCredentials::new("a", "b");
    assert_eq!(Mechanism::Plain, credentials.mechanism());
  }
}
