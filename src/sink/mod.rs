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

//! Destinations for encoded records.

use std::borrow::Cow;
use std::fmt;
use std::io;
use std::sync::Arc;

use crate::record::Level;

mod fanout;
mod file;
mod stdio;
mod testing;

pub use self::fanout::FanOut;
pub use self::file::FileSink;
pub use self::stdio::Stderr;
pub use self::stdio::Stdout;
pub use self::testing::Capture;

/// An append-only byte destination.
///
/// Sinks are shared between handlers and threads, so writes take `&self`. A handler hands each
/// sink one complete encoded record per call.
pub trait Sink: fmt::Debug + Send + Sync + 'static {
    /// A human-readable name used in error reports.
    fn name(&self) -> Cow<'_, str>;

    /// Append all of `bytes`.
    fn write_all(&self, bytes: &[u8]) -> io::Result<()>;

    /// Flush any buffered bytes.
    ///
    /// Default to a no-op.
    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
}

/// The standard stream a record goes to when nothing else is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdStream {
    /// The standard output stream.
    Stdout,
    /// The standard error stream.
    Stderr,
}

/// Select the default stream for a level: error and above go to stderr, the rest to stdout.
pub fn default_stream(level: Level) -> StdStream {
    if level >= Level::ERROR {
        StdStream::Stderr
    } else {
        StdStream::Stdout
    }
}

/// The pair of default streams every record is written to.
#[derive(Debug, Clone)]
pub struct Console {
    stdout: Arc<dyn Sink>,
    stderr: Arc<dyn Sink>,
}

impl Default for Console {
    fn default() -> Self {
        Self {
            stdout: Arc::new(Stdout),
            stderr: Arc::new(Stderr),
        }
    }
}

impl Console {
    /// Replace the sink standing in for the standard output stream.
    pub fn with_stdout(mut self, sink: impl Sink) -> Self {
        self.stdout = Arc::new(sink);
        self
    }

    /// Replace the sink standing in for the standard error stream.
    pub fn with_stderr(mut self, sink: impl Sink) -> Self {
        self.stderr = Arc::new(sink);
        self
    }

    /// The default sink for records at `level`.
    pub fn select(&self, level: Level) -> &Arc<dyn Sink> {
        match default_stream(level) {
            StdStream::Stdout => &self.stdout,
            StdStream::Stderr => &self.stderr,
        }
    }

    pub(crate) fn sinks(&self) -> [&Arc<dyn Sink>; 2] {
        [&self.stdout, &self.stderr]
    }
}
