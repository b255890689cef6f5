// TimeoutPolicy collaborator (spec §5): consulted between blocking reads.
// May extend the deadline or instruct abort; on abort the read raises
// Error::OperationTimedOut and the connection is poisoned.
//
// The teacher only ever sets a single read timeout on the TcpStream itself
// (source/lib.rs TCP::open); this generalizes that one-shot setup into a
// collaborator so a caller can implement backoff/progress-based extension
// instead of a fixed deadline.

use std::time;

pub enum Decision {
  Continue,
  Extend(time::Duration),
  Abort,
}

pub trait TimeoutPolicy {
  /// Called before each blocking read, given how long the current
  /// operation has already been waiting.
  fn poll(&mut self, waited: time::Duration) -> Decision;
}

/// A fixed deadline: aborts once `waited` exceeds `limit`.
pub struct FixedDeadline {
  pub limit: time::Duration,
}

impl TimeoutPolicy for FixedDeadline {
  fn poll(&mut self, waited: time::Duration) -> Decision {
    if waited >= self.limit {
      Decision::Abort
    } else {
      Decision::Continue
    }
  }
}

/// Never aborts.
pub struct NoTimeout;

impl TimeoutPolicy for NoTimeout {
  fn poll(&mut self, _waited: time::Duration) -> Decision {
    Decision::Continue
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use test_log::test;

  #[test]
  fn fixed_deadline_aborts_past_limit() {
    let mut policy = FixedDeadline {
      limit: time::Duration::from_secs(5),
    };
    assert!(matches!(
      policy.poll(time::Duration::from_secs(1)),
      Decision::Continue
    ));
    assert!(matches!(
      policy.poll(time::Duration::from_secs(5)),
      Decision::Abort
    ));
  }

  #[test]
  fn no_timeout_never_aborts() {
    let mut policy = NoTimeout;
    assert!(matches!(
      policy.poll(time::Duration::from_secs(1_000_000)),
      Decision::Continue
    ));
  }
}
