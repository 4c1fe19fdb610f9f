//! Process-wide transfer library lifetime.
//!
//! libcurl must be initialized once before any easy handle exists and torn
//! down once at exit. `Global` makes that an explicit object: construct it at
//! startup, hand `&Global` to every `Handle`, drop it at shutdown. A second
//! `Global::init` in the same process fails, also after the first guard has
//! been dropped.

use std::sync::atomic::{AtomicU8, Ordering};

use crate::error::{Error, Result};

const UNINITIALIZED: u8 = 0;
const ACTIVE: u8 = 1;
const RELEASED: u8 = 2;

static STATE: AtomicU8 = AtomicU8::new(UNINITIALIZED);

/// Guard for the one-time global setup of the transfer library.
/// Not `Clone`: exactly one exists per process.
#[derive(Debug)]
pub struct Global {
    _private: (),
}

impl Global {
    /// Initialize the transfer library. Fails with `Error::Init` if a guard
    /// was already created in this process.
    pub fn init() -> Result<Global> {
        STATE
            .compare_exchange(UNINITIALIZED, ACTIVE, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|prev| {
                let msg = if prev == ACTIVE {
                    "already globally initialized"
                } else {
                    "already torn down; only one initialization per process"
                };
                Error::Init(msg.to_string())
            })?;
        curl::init();
        tracing::info!("curl {} initialized", curl::Version::get().version());
        Ok(Global { _private: () })
    }
}

impl Drop for Global {
    fn drop(&mut self) {
        STATE.store(RELEASED, Ordering::Release);
        tracing::info!("transfer library released");
    }
}
