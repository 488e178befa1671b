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

//! The fan-out handler.

use std::path::Path;
use std::sync::Arc;

use crate::Error;
use crate::encoder::Encoder;
use crate::encoder::Format;
use crate::kv::Attr;
use crate::record::Level;
use crate::record::Record;
use crate::registry::OutputRegistry;
use crate::sink::Console;
use crate::sink::FanOut;
use crate::sink::Sink;

mod buffer;

use self::buffer::SharedBuffer;

/// Options shared by the built-in encoders and the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerOptions {
    /// The minimum level a record must have to be handled. Default to [`Level::INFO`].
    pub level: Level,
    /// Whether the built-in encoders emit the source position of the log statement.
    pub add_source: bool,
}

impl Default for HandlerOptions {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            add_source: false,
        }
    }
}

/// Encodes each record once and writes the bytes to every destination for its level.
///
/// The destinations for a record are the outputs registered for its exact level followed by
/// the default console stream (stderr for [`Level::ERROR`] and above, stdout otherwise).
///
/// One reusable buffer serves every call. A call holds the buffer's token from before encoding
/// until the buffer has been written out and emptied, so concurrent calls never interleave and
/// each destination receives whole records.
///
/// # Examples
///
/// ```
/// use logforth_fanout::FanOutHandler;
/// use logforth_fanout::encoder::Format;
/// use logforth_fanout::record::Level;
/// use logforth_fanout::record::Record;
///
/// let handler = FanOutHandler::builder(Format::Json).build();
/// handler.handle(&Record::new(Level::INFO, "hello")).unwrap();
/// ```
#[derive(Debug)]
pub struct FanOutHandler {
    encoder: Box<dyn Encoder>,
    options: HandlerOptions,
    buffer: SharedBuffer,
    console: Console,
    registry: OutputRegistry,
}

impl FanOutHandler {
    /// Create a handler writing `format` with the default console streams.
    pub fn new(format: Format, options: HandlerOptions) -> Self {
        FanOutHandler::builder(format).options(options).build()
    }

    /// Start building a handler writing `format`.
    pub fn builder(format: Format) -> HandlerBuilder {
        HandlerBuilder::new(format)
    }

    /// The options this handler was built with.
    pub fn options(&self) -> HandlerOptions {
        self.options
    }

    /// Whether records at `level` pass the minimum level.
    ///
    /// [`handle`](FanOutHandler::handle) does not check this; callers filter first.
    pub fn enabled(&self, level: Level) -> bool {
        level >= self.options.level
    }

    /// Encode `record` and write it to every destination for its level.
    ///
    /// Blocks until no other call sharing this handler's buffer is in flight.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorKind::Encode`](crate::ErrorKind::Encode) error if the encoder fails, in
    /// which case nothing is written. Returns an [`ErrorKind::Write`](crate::ErrorKind::Write)
    /// error naming every destination that failed; the others still received the record.
    ///
    /// Either way the buffer is empty and available to the next call when this returns.
    pub fn handle(&self, record: &Record) -> Result<(), Error> {
        let mut buf = self.buffer.acquire();

        let level = record.level();
        let mut destinations = self.registry.outputs_for_level(level);
        destinations.push(self.console.select(level).clone());

        self.encoder.encode(record, &mut buf)?;
        FanOut::new(&destinations).write_all(&buf)
    }

    /// Open each path for appending and add it as a destination for records at `level`.
    ///
    /// # Errors
    ///
    /// Stops at the first path that fails to open. Paths opened before it stay registered.
    pub fn register_outputs_for_level<I, P>(&self, level: Level, paths: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.registry.register_outputs_for_level(level, paths)
    }

    /// Add an arbitrary sink as a destination for records at `level`.
    pub fn register_sink_for_level(&self, level: Level, sink: impl Sink) {
        self.registry.register_sink(level, Arc::new(sink));
    }

    /// Derive a handler whose records all carry `attrs`.
    ///
    /// The derived handler shares this handler's buffer and token, so the two never write
    /// concurrently. It starts with a copy of this handler's registered outputs; outputs
    /// registered on either afterwards are not seen by the other.
    pub fn with_attrs(&self, attrs: &[Attr]) -> FanOutHandler {
        self.derive(self.encoder.with_attrs(attrs))
    }

    /// Derive a handler that nests every later attribute under the group `name`.
    ///
    /// Shares state with this handler the same way [`with_attrs`](FanOutHandler::with_attrs)
    /// does.
    pub fn with_group(&self, name: &str) -> FanOutHandler {
        self.derive(self.encoder.with_group(name))
    }

    /// Flush the console streams and every registered output.
    pub fn flush(&self) -> Result<(), Error> {
        let mut sinks = self.registry.all_outputs();
        sinks.extend(self.console.sinks().into_iter().cloned());
        FanOut::new(&sinks).flush()
    }

    /// Whether `other` serializes on the same buffer as this handler.
    pub fn shares_buffer_with(&self, other: &FanOutHandler) -> bool {
        self.buffer.ptr_eq(&other.buffer)
    }

    fn derive(&self, encoder: Box<dyn Encoder>) -> FanOutHandler {
        FanOutHandler {
            encoder,
            options: self.options,
            buffer: self.buffer.clone(),
            console: self.console.clone(),
            registry: self.registry.snapshot(),
        }
    }
}

/// A builder to configure and create a [`FanOutHandler`].
#[must_use = "call `build` to create the handler"]
#[derive(Debug)]
pub struct HandlerBuilder {
    format: Format,
    encoder: Option<Box<dyn Encoder>>,
    options: HandlerOptions,
    console: Console,
}

impl HandlerBuilder {
    /// Create a new builder writing `format`.
    pub fn new(format: Format) -> Self {
        Self {
            format,
            encoder: None,
            options: HandlerOptions::default(),
            console: Console::default(),
        }
    }

    /// Use a custom encoder instead of the built-in one for the format.
    ///
    /// The `add_source` option has no effect on a custom encoder.
    pub fn encoder(mut self, encoder: impl Into<Box<dyn Encoder>>) -> Self {
        self.encoder = Some(encoder.into());
        self
    }

    /// Set all options at once.
    pub fn options(mut self, options: HandlerOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the minimum level.
    ///
    /// Default to [`Level::INFO`].
    pub fn level(mut self, level: Level) -> Self {
        self.options.level = level;
        self
    }

    /// Emit the source position of the log statement.
    pub fn add_source(mut self, add_source: bool) -> Self {
        self.options.add_source = add_source;
        self
    }

    /// Replace the sink standing in for stdout.
    pub fn stdout(mut self, sink: impl Sink) -> Self {
        self.console = self.console.with_stdout(sink);
        self
    }

    /// Replace the sink standing in for stderr.
    pub fn stderr(mut self, sink: impl Sink) -> Self {
        self.console = self.console.with_stderr(sink);
        self
    }

    /// Build the [`FanOutHandler`].
    pub fn build(self) -> FanOutHandler {
        let HandlerBuilder {
            format,
            encoder,
            options,
            console,
        } = self;
        let encoder = encoder.unwrap_or_else(|| format.encoder(options.add_source));
        FanOutHandler {
            encoder,
            options,
            buffer: SharedBuffer::new(),
            console,
            registry: OutputRegistry::new(),
        }
    }
}
