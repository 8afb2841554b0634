//! HMAC key provisioning for HLX snapshots.
//!
//! Two process-wide 32-byte keys feed the envelope MAC:
//!
//! - The **machine key** is random, generated on first use, and persisted
//!   under the user-local application data directory. Snapshots signed with
//!   it verify only on the install that wrote them.
//! - The **global key** is reconstructed from compiled-in constants and is
//!   identical in every build of the same binary, so snapshots signed with
//!   it are portable across installs.
//!
//! Both keys are provisioned lazily, once per process, and are read-only
//! afterwards; sharing them across threads is safe.

pub mod error;
pub mod global;
pub mod machine;

pub use error::{KeyError, KeyResult};
pub use global::global_key;
pub use machine::machine_key;

/// Which of the two HMAC keys signs and verifies an envelope.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum KeyScope {
    /// Compiled-in global key; snapshots verify on any install.
    #[default]
    Portable,
    /// Per-install random key; snapshots are rejected elsewhere.
    Machine,
}

impl KeyScope {
    /// Map the public API's `portable` flag onto a scope.
    pub fn from_portable(portable: bool) -> Self {
        if portable {
            Self::Portable
        } else {
            Self::Machine
        }
    }

    /// Resolve the scope to its key material.
    ///
    /// The portable scope never fails; the machine scope can fail on first
    /// use if the key file cannot be provisioned.
    pub fn resolve(self) -> KeyResult<&'static [u8; 32]> {
        match self {
            Self::Portable => Ok(global_key()),
            Self::Machine => machine_key(),
        }
    }
}
