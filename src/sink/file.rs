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
use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use crate::Error;
use crate::ErrorKind;
use crate::sink::Sink;

/// A sink appending to a file.
///
/// The file is opened once and stays open for as long as the sink lives.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    file: File,
}

impl FileSink {
    /// Open `path` for appending, creating the file if it does not exist.
    ///
    /// The parent directory must already exist.
    pub fn open(path: impl AsRef<Path>) -> Result<FileSink, Error> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .map_err(|err| {
                Error::new(ErrorKind::Open, "failed to open log file")
                    .with_context("path", path.display())
                    .with_source(err)
            })?;
        Ok(FileSink {
            path: path.to_path_buf(),
            file,
        })
    }

    /// The path this sink was opened with.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Sink for FileSink {
    fn name(&self) -> Cow<'_, str> {
        self.path.to_string_lossy()
    }

    fn write_all(&self, bytes: &[u8]) -> io::Result<()> {
        (&self.file).write_all(bytes)
    }

    fn flush(&self) -> io::Result<()> {
        (&self.file).flush()
    }
}
