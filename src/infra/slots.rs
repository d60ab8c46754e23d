//! Process-wide gate for memory-hungry tools
//!
//! The YAIL compiler and the dex merger each start a JVM with a large heap.
//! Builds running side by side share one [`ToolSlots`] holding the memory
//! budget in megabytes. Each child takes as many megabytes as its heap, so
//! the heaps of concurrently running children never add up past the budget.

use std::sync::Arc;

use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// Memory budget shared by JVM-backed tool invocations
#[derive(Debug, Clone)]
pub struct ToolSlots {
    semaphore: Arc<Semaphore>,
    budget_mb: u32,
}

/// A held share of the budget; released on drop
#[derive(Debug)]
pub struct ToolSlot {
    _permit: OwnedSemaphorePermit,
}

impl ToolSlots {
    /// Create a gate over `memory_budget_mb` (at least 1 MB)
    #[must_use]
    pub fn new(memory_budget_mb: u32) -> Self {
        let budget_mb = memory_budget_mb.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(budget_mb as usize)),
            budget_mb,
        }
    }

    /// Total budget, in MB
    pub fn budget_mb(&self) -> u32 {
        self.budget_mb
    }

    /// Budget not currently held, in MB
    pub fn available_mb(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// How many children with `heap_mb` heaps may run at once
    pub fn capacity_for(&self, heap_mb: u32) -> usize {
        (self.budget_mb / self.share(heap_mb)) as usize
    }

    /// Wait until a child with a `heap_mb` heap fits in the budget.
    ///
    /// A heap larger than the whole budget waits for the entire budget and
    /// so runs alone.
    pub async fn acquire(&self, heap_mb: u32) -> Result<ToolSlot, AcquireError> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_many_owned(self.share(heap_mb))
            .await?;
        Ok(ToolSlot { _permit: permit })
    }

    fn share(&self, heap_mb: u32) -> u32 {
        heap_mb.clamp(1, self.budget_mb)
    }
}
