use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tokio::sync::{Semaphore, SemaphorePermit};

/// Bounded object pool: a semaphore caps concurrent holders, a free-list
/// keeps returned items for reuse. Items are created lazily, never more than
/// `capacity` in total.
pub struct Pool<T> {
    permits: Semaphore,
    idle: Mutex<Vec<T>>,
    factory: Box<dyn Fn() -> T + Send + Sync>,
    created: AtomicUsize,
    capacity: usize,
}

impl<T> Pool<T> {
    pub fn new<F>(capacity: usize, factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let capacity = capacity.max(1);
        Self {
            permits: Semaphore::new(capacity),
            idle: Mutex::new(Vec::with_capacity(capacity)),
            factory: Box::new(factory),
            created: AtomicUsize::new(0),
            capacity,
        }
    }

    /// Waits until an item is free. The guard hands it back when dropped.
    pub async fn acquire(&self) -> anyhow::Result<PoolGuard<'_, T>> {
        let permit = self.permits.acquire().await?;
        let item = match self.idle.lock().pop() {
            Some(item) => item,
            None => {
                self.created.fetch_add(1, Ordering::Relaxed);
                (self.factory)()
            }
        };
        Ok(PoolGuard {
            pool: self,
            item: ManuallyDrop::new(item),
            _permit: permit,
        })
    }

    /// Explicit form of dropping the guard.
    pub fn release(&self, guard: PoolGuard<'_, T>) {
        drop(guard);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Items handed out right now.
    pub fn in_use(&self) -> usize {
        self.capacity - self.permits.available_permits()
    }

    /// Items ever built by the factory.
    pub fn created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }
}

/// Exclusive handle on a pooled item. The item goes back on the free-list
/// before the permit is released, so the next waiter always finds it.
pub struct PoolGuard<'a, T> {
    pool: &'a Pool<T>,
    item: ManuallyDrop<T>,
    _permit: SemaphorePermit<'a>,
}

impl<T> Deref for PoolGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.item
    }
}

impl<T> DerefMut for PoolGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.item
    }
}

impl<T> Drop for PoolGuard<'_, T> {
    fn drop(&mut self) {
        // SAFETY: `item` is never touched again after this take.
        let item = unsafe { ManuallyDrop::take(&mut self.item) };
        self.pool.idle.lock().push(item);
    }
}
