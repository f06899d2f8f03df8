use crate::di::Value;
use crate::di::scope::{Expiry, Key};
use crate::error::Result;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::cell::RefCell;
use std::collections::HashSet;

/// Backing cache of a [`Scope`](crate::di::Scope).
///
/// Concurrent first requests for the same key may both produce a value; the
/// cache keeps one of them and never exposes a partially constructed value.
/// Implementations may serialize a key to construct exactly once.
pub trait Repository: Send + Sync {
    /// Returns the value cached under `key`, or produces, stores and returns a
    /// new one. With [`Expiry::Ignore`] the value is produced and returned
    /// without touching the cache.
    fn serve(&self, key: Key, expiry: Expiry, produce: &dyn Fn() -> Result<Value>)
    -> Result<Value>;
}

thread_local! {
    // (repository, serial) of every slot this thread is initializing
    static INITIALIZING: RefCell<HashSet<(usize, usize)>> = RefCell::new(HashSet::new());
}

/// Marks a slot as being initialized by the current thread until dropped.
struct Initializing((usize, usize));

impl Initializing {
    fn enter(slot: (usize, usize)) -> Option<Self> {
        INITIALIZING
            .with(|slots| slots.borrow_mut().insert(slot))
            .then_some(Self(slot))
    }
}

impl Drop for Initializing {
    fn drop(&mut self) {
        INITIALIZING.with(|slots| slots.borrow_mut().remove(&self.0));
    }
}

/// One slot per injectron, each initialized exactly once.
///
/// A producer that asks for its own slot again (a generic binding resolving
/// another parameterization of itself) gets a value produced without
/// caching; waiting on the slot would never return.
pub(crate) struct ApplicationRepository {
    instances: Box<[OnceCell<Value>]>,
}

impl ApplicationRepository {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            instances: (0..capacity).map(|_| OnceCell::new()).collect(),
        }
    }
}

impl Repository for ApplicationRepository {
    fn serve(
        &self,
        key: Key,
        expiry: Expiry,
        produce: &dyn Fn() -> Result<Value>,
    ) -> Result<Value> {
        let Some(slot) = self
            .instances
            .get(key.serial())
            .filter(|_| expiry != Expiry::Ignore)
        else {
            return produce();
        };
        if let Some(value) = slot.get() {
            return Ok(value.clone());
        }
        let serial = key.serial();
        let Some(_initializing) = Initializing::enter((self as *const Self as usize, serial)) else {
            tracing::trace!("Slot {} is already initializing, producing uncached", serial);
            return produce();
        };
        slot.get_or_try_init(produce).cloned()
    }
}

/// Race tolerant cache: the last completed production for a key wins.
///
/// Nothing is ever evicted, so a thread keyed entry outlives its thread.
#[derive(Default)]
pub(crate) struct KeyedRepository {
    instances: DashMap<Key, Value>,
}

impl Repository for KeyedRepository {
    fn serve(
        &self,
        key: Key,
        expiry: Expiry,
        produce: &dyn Fn() -> Result<Value>,
    ) -> Result<Value> {
        if expiry == Expiry::Ignore {
            return produce();
        }
        if let Some(value) = self.instances.get(&key) {
            return Ok(value.clone());
        }
        // the shard lock must not be held here, producers resolve reentrantly
        let value = produce()?;
        self.instances.insert(key, value.clone());
        Ok(value)
    }
}

/// Caches nothing.
pub(crate) struct InjectionRepository;

impl Repository for InjectionRepository {
    fn serve(
        &self,
        _key: Key,
        _expiry: Expiry,
        produce: &dyn Fn() -> Result<Value>,
    ) -> Result<Value> {
        produce()
    }
}
