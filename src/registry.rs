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

//! Per-level registry of extra destinations.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::sync::RwLockReadGuard;
use std::sync::RwLockWriteGuard;

use crate::Error;
use crate::record::Level;
use crate::sink::FileSink;
use crate::sink::Sink;

/// A mapping from level to the ordered list of destinations registered for exactly that level.
///
/// Entries are only ever added. Registering the same path twice opens it twice and the record is
/// written to it twice.
#[derive(Debug, Default)]
pub struct OutputRegistry {
    outputs: RwLock<BTreeMap<Level, Vec<Arc<dyn Sink>>>>,
}

impl OutputRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open each path for appending, creating it if absent, and register it for `level`.
    ///
    /// # Errors
    ///
    /// Stops at the first path that fails to open and returns that failure. Files opened for
    /// earlier paths in the same call stay registered.
    pub fn register_outputs_for_level<I, P>(&self, level: Level, paths: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        for path in paths {
            let sink = FileSink::open(path)?;
            self.register_sink(level, Arc::new(sink));
        }
        Ok(())
    }

    /// Register an already constructed sink for `level`.
    pub fn register_sink(&self, level: Level, sink: Arc<dyn Sink>) {
        self.write().entry(level).or_default().push(sink);
    }

    /// A copy of the destinations registered for `level`.
    ///
    /// The returned list is detached from the registry, so later registrations do not affect it.
    pub fn outputs_for_level(&self, level: Level) -> Vec<Arc<dyn Sink>> {
        self.read().get(&level).cloned().unwrap_or_default()
    }

    /// Every registered destination, each listed once per registration.
    pub fn all_outputs(&self) -> Vec<Arc<dyn Sink>> {
        self.read().values().flatten().cloned().collect()
    }

    /// A new registry seeded with this registry's current entries.
    ///
    /// The sinks themselves are shared; the lists are not.
    pub fn snapshot(&self) -> OutputRegistry {
        OutputRegistry {
            outputs: RwLock::new(self.read().clone()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<Level, Vec<Arc<dyn Sink>>>> {
        self.outputs.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<Level, Vec<Arc<dyn Sink>>>> {
        self.outputs.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::ErrorKind;
    use crate::sink::Capture;

    fn names(sinks: &[Arc<dyn Sink>]) -> Vec<String> {
        sinks.iter().map(|s| s.name().into_owned()).collect()
    }

    #[test]
    fn test_register_accumulates() {
        let registry = OutputRegistry::new();
        registry.register_sink(Level::ERROR, Arc::new(Capture::new("a")));
        registry.register_sink(Level::ERROR, Arc::new(Capture::new("b")));
        registry.register_sink(Level::ERROR, Arc::new(Capture::new("a")));
        registry.register_sink(Level::INFO, Arc::new(Capture::new("c")));

        assert_eq!(names(&registry.outputs_for_level(Level::ERROR)), vec!["a", "b", "a"]);
        assert_eq!(names(&registry.outputs_for_level(Level::INFO)), vec!["c"]);
        assert!(registry.outputs_for_level(Level::WARN).is_empty());
        assert_eq!(registry.all_outputs().len(), 4);
    }

    #[test]
    fn test_outputs_are_a_copy() {
        let registry = OutputRegistry::new();
        registry.register_sink(Level::INFO, Arc::new(Capture::new("a")));
        let outputs = registry.outputs_for_level(Level::INFO);
        registry.register_sink(Level::INFO, Arc::new(Capture::new("b")));

        assert_eq!(names(&outputs), vec!["a"]);
        assert_eq!(registry.outputs_for_level(Level::INFO).len(), 2);
    }

    #[test]
    fn test_snapshot_is_independent() {
        let parent = OutputRegistry::new();
        parent.register_sink(Level::INFO, Arc::new(Capture::new("a")));

        let child = parent.snapshot();
        child.register_sink(Level::INFO, Arc::new(Capture::new("child")));
        parent.register_sink(Level::INFO, Arc::new(Capture::new("parent")));

        assert_eq!(names(&parent.outputs_for_level(Level::INFO)), vec!["a", "parent"]);
        assert_eq!(names(&child.outputs_for_level(Level::INFO)), vec!["a", "child"]);
    }

    #[test]
    fn test_register_partial_failure_keeps_opened() {
        let dir = TempDir::new().expect("failed to create a temporary directory");
        let good = dir.path().join("good.log");
        let bad = dir.path().join("missing").join("bad.log");
        let never = dir.path().join("never.log");

        let registry = OutputRegistry::new();
        let err = registry
            .register_outputs_for_level(Level::WARN, [&good, &bad, &never])
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Open);
        assert_eq!(
            names(&registry.outputs_for_level(Level::WARN)),
            vec![good.to_string_lossy().into_owned()]
        );
        assert!(good.exists());
        assert!(!never.exists());
    }
}
