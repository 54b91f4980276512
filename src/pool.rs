//! Lock-free buffer pool for relay I/O
//!
//! Relay rounds need a scratch buffer per read; pooling them avoids an
//! allocation per round. Uses crossbeam's `SegQueue` for lock-free
//! acquire/release across session tasks.

use crossbeam::queue::SegQueue;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

use crate::types::BufferSize;

/// Pool of reusable, fixed-size byte buffers
#[derive(Debug, Clone)]
pub struct BufferPool {
    pool: Arc<SegQueue<Vec<u8>>>,
    buffer_size: usize,
    max_pool_size: usize,
    pool_size: Arc<AtomicUsize>,
}

impl BufferPool {
    /// Create a pool of `max_pool_size` buffers of `buffer_size` bytes each
    ///
    /// All buffers are pre-allocated so relay hot paths never hit the
    /// allocator under steady load.
    #[must_use]
    pub fn new(buffer_size: BufferSize, max_pool_size: usize) -> Self {
        let pool = Arc::new(SegQueue::new());
        let pool_size = Arc::new(AtomicUsize::new(0));
        let buffer_size = buffer_size.as_usize();

        for _ in 0..max_pool_size {
            pool.push(vec![0u8; buffer_size]);
            pool_size.fetch_add(1, Ordering::Relaxed);
        }
        debug!(
            "Buffer pool ready: {} buffers of {} bytes",
            max_pool_size, buffer_size
        );

        Self {
            pool: Arc::clone(&pool),
            buffer_size,
            max_pool_size,
            pool_size,
        }
    }

    /// Get a buffer from the pool, or allocate one if the pool is drained
    ///
    /// The returned buffer is zero-filled to the pool's buffer size.
    #[must_use]
    pub fn acquire(&self) -> Vec<u8> {
        if let Some(mut buffer) = self.pool.pop() {
            self.pool_size.fetch_sub(1, Ordering::Relaxed);
            buffer.clear();
            buffer.resize(self.buffer_size, 0);
            buffer
        } else {
            vec![0u8; self.buffer_size]
        }
    }

    /// Return a buffer to the pool
    ///
    /// Buffers of the wrong size (or beyond the pool cap) are dropped.
    pub fn release(&self, buffer: Vec<u8>) {
        if buffer.len() != self.buffer_size {
            return;
        }
        if self.pool_size.load(Ordering::Relaxed) < self.max_pool_size {
            self.pool.push(buffer);
            self.pool_size.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Per-buffer size in bytes
    #[must_use]
    #[inline]
    pub const fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Current number of pooled (idle) buffers
    #[must_use]
    pub fn idle_buffers(&self) -> usize {
        self.pool_size.load(Ordering::Relaxed)
    }
}
