//! Connection cache keyed by destination.
//!
//! [`CachingDialer`] memoizes another dialer's `dial` with idle, already
//! established connections. The idle map is the only shared mutable state
//! in the crate; its lock is held for map manipulation only and never
//! across network I/O. A connection is either in the idle set or checked
//! out to exactly one caller, never both.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::dialer::{Conn, Dialer};
use crate::error::Result;

/// One idle bucket per (scheme, host).
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct ConnKey {
    pub scheme: String,
    pub host: String,
}

type IdleMap = HashMap<ConnKey, Vec<Conn>>;
type SharedIdleMap = Arc<Mutex<IdleMap>>;

/// Recover the map from a holder that panicked; the map itself is always
/// structurally sound.
fn lock_idle(idle: &SharedIdleMap) -> MutexGuard<'_, IdleMap> {
    match idle.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Ticket a pooled connection carries so `release` can find its way home.
#[derive(Clone)]
pub(crate) struct PoolTag {
    idle: SharedIdleMap,
    key: ConnKey,
}

impl PoolTag {
    pub(crate) fn store(self, conn: Conn) {
        tracing::debug!(scheme = %self.key.scheme, host = %self.key.host, "connection returned to pool");
        lock_idle(&self.idle).entry(self.key).or_default().push(conn);
    }
}

/// Dialer decorator that hands out idle connections before dialing fresh
/// ones.
///
/// No eviction, health-checking, or idle-timeout policy: a pooled
/// connection the peer has since closed surfaces as an ordinary I/O error
/// on its next use.
pub struct CachingDialer<D> {
    idle: SharedIdleMap,
    inner: D,
}

impl<D> CachingDialer<D> {
    pub fn new(inner: D) -> Self {
        Self {
            idle: Arc::new(Mutex::new(HashMap::new())),
            inner,
        }
    }

    /// Number of idle connections currently cached for this destination.
    pub fn idle_count(&self, scheme: &str, host: &str) -> usize {
        let key = ConnKey {
            scheme: scheme.to_string(),
            host: host.to_string(),
        };
        lock_idle(&self.idle).get(&key).map_or(0, Vec::len)
    }
}

impl<D: Dialer + Sync> Dialer for CachingDialer<D> {
    async fn dial(&self, scheme: &str, host: &str) -> Result<Conn> {
        let key = ConnKey {
            scheme: scheme.to_string(),
            host: host.to_string(),
        };
        let pooled = lock_idle(&self.idle).get_mut(&key).and_then(Vec::pop);
        if let Some(conn) = pooled {
            tracing::debug!(%scheme, %host, "reusing pooled connection");
            return Ok(conn);
        }
        tracing::debug!(%scheme, %host, "no idle connection, dialing fresh");
        let mut conn = self.inner.dial(scheme, host).await?;
        conn.attach_pool(PoolTag {
            idle: Arc::clone(&self.idle),
            key,
        });
        Ok(conn)
    }
}
