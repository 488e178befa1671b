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

use std::borrow::Cow;
use std::io;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use crate::sink::Sink;

/// A sink that keeps everything written to it in memory.
///
/// Clones share the same storage, so a test can hand one clone to a handler and inspect the
/// other.
///
/// # Examples
///
/// ```
/// use logforth_fanout::sink::Capture;
/// use logforth_fanout::sink::Sink;
///
/// let capture = Capture::new("stdout");
/// capture.clone().write_all(b"hello\n").unwrap();
/// assert_eq!(capture.contents_string(), "hello\n");
/// ```
#[derive(Debug, Clone)]
pub struct Capture {
    name: String,
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl Capture {
    /// Create an empty capture named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bytes: Arc::new(Mutex::new(vec![])),
        }
    }

    /// All bytes written so far.
    pub fn contents(&self) -> Vec<u8> {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// All bytes written so far, lossily decoded as UTF-8.
    pub fn contents_string(&self) -> String {
        String::from_utf8_lossy(&self.contents()).into_owned()
    }
}

impl Sink for Capture {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }

    fn write_all(&self, bytes: &[u8]) -> io::Result<()> {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(bytes);
        Ok(())
    }
}
