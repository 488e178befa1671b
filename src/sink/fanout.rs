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

use std::io;
use std::sync::Arc;

use crate::Error;
use crate::ErrorKind;
use crate::sink::Sink;

/// Replicates one write to every sink in a set.
///
/// Every sink is attempted even if an earlier one fails. Successful writes are not rolled back;
/// the failures are collected into a single [`ErrorKind::Write`] error that names each failed
/// destination under the `destination` context key.
#[derive(Debug, Clone, Copy)]
pub struct FanOut<'a> {
    sinks: &'a [Arc<dyn Sink>],
}

impl<'a> FanOut<'a> {
    /// Create a fan-out writer over `sinks`.
    pub fn new(sinks: &'a [Arc<dyn Sink>]) -> Self {
        Self { sinks }
    }

    /// Write `bytes` to every sink.
    pub fn write_all(&self, bytes: &[u8]) -> Result<(), Error> {
        self.for_each("failed to write to destinations", |sink| {
            sink.write_all(bytes)
        })
    }

    /// Flush every sink.
    pub fn flush(&self) -> Result<(), Error> {
        self.for_each("failed to flush destinations", |sink| sink.flush())
    }

    fn for_each<F>(&self, message: &str, mut f: F) -> Result<(), Error>
    where
        F: FnMut(&dyn Sink) -> io::Result<()>,
    {
        let mut error: Option<Error> = None;
        for sink in self.sinks {
            if let Err(err) = f(sink.as_ref()) {
                let e = error.take().unwrap_or_else(|| Error::new(ErrorKind::Write, message));
                error = Some(e.with_context("destination", sink.name()).with_source(err));
            }
        }

        match error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use super::*;
    use crate::sink::Capture;

    #[derive(Debug)]
    struct Broken(&'static str);

    impl Sink for Broken {
        fn name(&self) -> Cow<'_, str> {
            Cow::Borrowed(self.0)
        }

        fn write_all(&self, _: &[u8]) -> io::Result<()> {
            Err(io::Error::other("device unplugged"))
        }
    }

    #[test]
    fn test_fanout_writes_everywhere() {
        let a = Capture::new("a");
        let b = Capture::new("b");
        let sinks: Vec<Arc<dyn Sink>> = vec![Arc::new(a.clone()), Arc::new(b.clone())];

        FanOut::new(&sinks).write_all(b"line\n").unwrap();
        assert_eq!(a.contents(), b"line\n");
        assert_eq!(b.contents(), b"line\n");
    }

    #[test]
    fn test_fanout_aggregates_failures() {
        let a = Capture::new("a");
        let c = Capture::new("c");
        let sinks: Vec<Arc<dyn Sink>> = vec![
            Arc::new(Broken("x")),
            Arc::new(a.clone()),
            Arc::new(Broken("y")),
            Arc::new(c.clone()),
        ];

        let err = FanOut::new(&sinks).write_all(b"line\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Write);
        assert_eq!(err.context("destination").collect::<Vec<_>>(), vec!["x", "y"]);
        assert_eq!(err.sources().len(), 2);

        // healthy destinations still received the bytes
        assert_eq!(a.contents(), b"line\n");
        assert_eq!(c.contents(), b"line\n");
    }

    #[test]
    fn test_fanout_empty() {
        FanOut::new(&[]).write_all(b"ignored").unwrap();
    }
}
