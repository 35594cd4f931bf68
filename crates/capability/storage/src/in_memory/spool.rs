//! 持久化队列内存实现（不持久化，仅用于测试）

use crate::error::{SpoolError, StorageError};
use crate::models::{EnqueueReceipt, NewSpoolEntry, OverflowPolicy, SpoolCapacity, SpoolEntry};
use crate::traits::DurableQueue;
use std::collections::VecDeque;
use std::sync::Mutex;

struct SpoolState {
    entries: VecDeque<SpoolEntry>,
    next_id: i64,
}

pub struct InMemorySpool {
    capacity: SpoolCapacity,
    state: Mutex<SpoolState>,
}

impl InMemorySpool {
    pub fn new() -> Self {
        Self::with_capacity(SpoolCapacity::default())
    }

    pub fn with_capacity(capacity: SpoolCapacity) -> Self {
        Self {
            capacity: capacity.sanitized(),
            state: Mutex::new(SpoolState {
                entries: VecDeque::new(),
                next_id: 1,
            }),
        }
    }

    /// 按 FIFO 顺序返回全部条目
    pub fn entries(&self) -> Vec<SpoolEntry> {
        self.state
            .lock()
            .map(|state| state.entries.iter().cloned().collect())
            .unwrap_or_default()
    }
}

impl Default for InMemorySpool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl DurableQueue for InMemorySpool {
    async fn enqueue(&self, entry: NewSpoolEntry) -> Result<EnqueueReceipt, SpoolError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| StorageError::new("lock failed"))?;
        let mut evicted = 0;
        while state.entries.len() as u64 >= self.capacity.max_entries {
            match self.capacity.overflow {
                OverflowPolicy::RejectNewest => {
                    return Err(SpoolError::Full(self.capacity.max_entries));
                }
                OverflowPolicy::EvictOldest => {
                    state.entries.pop_front();
                    evicted += 1;
                }
            }
        }
        let id = state.next_id;
        state.next_id += 1;
        state.entries.push_back(SpoolEntry {
            id,
            data_type: entry.data_type,
            device: entry.device,
            payload: entry.payload,
            enqueued_at_ms: entry.enqueued_at_ms,
        });
        Ok(EnqueueReceipt { id, evicted })
    }

    async fn peek_oldest(&self) -> Result<Option<SpoolEntry>, StorageError> {
        let state = self
            .state
            .lock()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(state.entries.front().cloned())
    }

    async fn delete(&self, id: i64) -> Result<(), StorageError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| StorageError::new("lock failed"))?;
        state.entries.retain(|entry| entry.id != id);
        Ok(())
    }

    async fn len(&self) -> Result<u64, StorageError> {
        let state = self
            .state
            .lock()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(state.entries.len() as u64)
    }
}
