//! Re-entrancy guarded handle around a [`CustodyEngine`].
//!
//! The engine already commits its effects before calling the token ledger.
//! [`SharedEngine`] additionally refuses to start a call while another is
//! still running, so a ledger callback that calls back into the engine gets
//! [`CustodyError::Reentrant`] instead of a second `&mut` view.

use parking_lot::Mutex;

use crate::authority::Authority;
use crate::engine::CustodyEngine;
use crate::error::CustodyError;
use crate::ledger::TokenLedger;

/// An engine behind a non-blocking lock.
#[derive(Debug)]
pub struct SharedEngine<L, A> {
    inner: Mutex<CustodyEngine<L, A>>,
}

impl<L: TokenLedger, A: Authority> SharedEngine<L, A> {
    /// Wraps `engine`.
    pub fn new(engine: CustodyEngine<L, A>) -> Self {
        Self {
            inner: Mutex::new(engine),
        }
    }

    /// Runs one operation with exclusive access to the engine.
    ///
    /// Fails with [`CustodyError::Reentrant`], without running `op`, when
    /// another call holds the engine.
    pub fn call<R, F>(&self, op: F) -> Result<R, CustodyError>
    where
        F: FnOnce(&mut CustodyEngine<L, A>) -> Result<R, CustodyError>,
    {
        let mut engine = self.inner.try_lock().ok_or_else(|| {
            tracing::warn!("re-entrant call rejected");
            CustodyError::Reentrant
        })?;
        op(&mut engine)
    }

    /// Runs a read-only query. Same exclusion rule as [`call`](Self::call).
    pub fn read<R, F>(&self, query: F) -> Result<R, CustodyError>
    where
        F: FnOnce(&CustodyEngine<L, A>) -> R,
    {
        let engine = self.inner.try_lock().ok_or(CustodyError::Reentrant)?;
        Ok(query(&engine))
    }

    /// Unwraps the engine.
    pub fn into_inner(self) -> CustodyEngine<L, A> {
        self.inner.into_inner()
    }
}
