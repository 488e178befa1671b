// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::ops::Deref;
use std::ops::DerefMut;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

const INITIAL_CAPACITY: usize = 256;

/// The reusable encode buffer together with the token serializing access to it.
///
/// The buffer and its token are a single value, so handlers that share one always share the
/// other. Clones share both.
#[derive(Debug, Clone)]
pub(crate) struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Vec::with_capacity(INITIAL_CAPACITY))),
        }
    }

    /// Block until the token is available and take it.
    ///
    /// A panic inside a previous critical section does not wedge the buffer: the poisoned lock
    /// is recovered, and the buffer was already emptied by the unwinding guard.
    pub(crate) fn acquire(&self) -> BufferGuard<'_> {
        let guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        debug_assert!(guard.is_empty(), "shared buffer must be empty between records");
        BufferGuard { guard }
    }

    pub(crate) fn ptr_eq(&self, other: &SharedBuffer) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    #[cfg(test)]
    pub(crate) fn is_available(&self) -> bool {
        use std::sync::TryLockError;

        match self.inner.try_lock() {
            Ok(_) | Err(TryLockError::Poisoned(_)) => true,
            Err(TryLockError::WouldBlock) => false,
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Exclusive access to the shared buffer.
///
/// Dropping the guard empties the buffer and releases the token, on every exit path.
#[derive(Debug)]
pub(crate) struct BufferGuard<'a> {
    guard: MutexGuard<'a, Vec<u8>>,
}

impl Deref for BufferGuard<'_> {
    type Target = Vec<u8>;

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

impl DerefMut for BufferGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.guard
    }
}

impl Drop for BufferGuard<'_> {
    fn drop(&mut self) {
        self.guard.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_resets_and_releases() {
        let buffer = SharedBuffer::new();
        {
            let mut guard = buffer.acquire();
            guard.extend_from_slice(b"partial record");
            assert!(!buffer.is_available());
        }
        assert!(buffer.is_available());
        assert_eq!(buffer.len(), 0);
    }

    #[test]
    fn test_guard_recovers_after_panic() {
        let buffer = SharedBuffer::new();
        let cloned = buffer.clone();
        let result = std::thread::spawn(move || {
            let mut guard = cloned.acquire();
            guard.extend_from_slice(b"doomed");
            if !guard.is_empty() {
                panic!("encoder exploded");
            }
        })
        .join();
        assert!(result.is_err());

        assert!(buffer.is_available());
        assert_eq!(buffer.len(), 0);
        let guard = buffer.acquire();
        assert!(guard.is_empty());
    }

    #[test]
    fn test_clones_share_token() {
        let a = SharedBuffer::new();
        let b = a.clone();
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&SharedBuffer::new()));

        let _guard = a.acquire();
        assert!(!b.is_available());
    }
}
