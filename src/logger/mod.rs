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

//! A logger facade over [`FanOutHandler`].

use std::borrow::Cow;
use std::path::Path;

use crate::Error;
use crate::FanOutHandler;
use crate::encoder::Format;
use crate::handler::HandlerOptions;
use crate::kv::Attr;
use crate::record::Level;
use crate::record::Record;
use crate::record::Source;

mod bridge;

pub use self::bridge::LogBridge;

/// Options for [`Logger::new`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// The encoder variant.
    pub format: Format,
    /// Whether records carry a `source` attribute with the position of the log statement.
    pub add_source: bool,
    /// The minimum level a record must have to be logged. Default to [`Level::INFO`].
    pub level: Level,
}

/// A logger writing through a [`FanOutHandler`].
///
/// # Examples
///
/// ```
/// use logforth_fanout::Logger;
/// use logforth_fanout::Options;
/// use logforth_fanout::encoder::Format;
/// use logforth_fanout::kv::Attr;
///
/// let logger = Logger::new(Options {
///     format: Format::Json,
///     ..Default::default()
/// });
/// logger.info("service started", &[Attr::new("port", 8080)]).unwrap();
///
/// let requests = logger.with_group("req").with_attrs(&[Attr::new("id", 7)]);
/// requests.warn("slow request", &[]).unwrap();
/// ```
#[derive(Debug)]
pub struct Logger {
    handler: FanOutHandler,
}

impl Logger {
    /// Create a logger writing to the console in the given format.
    pub fn new(options: Options) -> Logger {
        let Options {
            format,
            add_source,
            level,
        } = options;
        Logger::from_handler(FanOutHandler::new(format, HandlerOptions { level, add_source }))
    }

    /// Create a logger on top of an existing handler.
    pub fn from_handler(handler: FanOutHandler) -> Logger {
        Logger { handler }
    }

    /// The underlying handler.
    pub fn handler(&self) -> &FanOutHandler {
        &self.handler
    }

    /// Log `message` at `level` with `attrs`.
    ///
    /// Records below the minimum level are dropped and `Ok(())` is returned.
    #[track_caller]
    pub fn log(
        &self,
        level: Level,
        message: impl Into<Cow<'static, str>>,
        attrs: &[Attr],
    ) -> Result<(), Error> {
        if !self.handler.enabled(level) {
            return Ok(());
        }

        let record = Record::builder()
            .level(level)
            .message(message)
            .source(Some(Source::caller()))
            .attrs(attrs.iter().cloned())
            .build();
        self.handler.handle(&record)
    }

    /// Log at [`Level::DEBUG`].
    #[track_caller]
    pub fn debug(&self, message: impl Into<Cow<'static, str>>, attrs: &[Attr]) -> Result<(), Error> {
        self.log(Level::DEBUG, message, attrs)
    }

    /// Log at [`Level::INFO`].
    #[track_caller]
    pub fn info(&self, message: impl Into<Cow<'static, str>>, attrs: &[Attr]) -> Result<(), Error> {
        self.log(Level::INFO, message, attrs)
    }

    /// Log at [`Level::WARN`].
    #[track_caller]
    pub fn warn(&self, message: impl Into<Cow<'static, str>>, attrs: &[Attr]) -> Result<(), Error> {
        self.log(Level::WARN, message, attrs)
    }

    /// Log at [`Level::ERROR`].
    #[track_caller]
    pub fn error(&self, message: impl Into<Cow<'static, str>>, attrs: &[Attr]) -> Result<(), Error> {
        self.log(Level::ERROR, message, attrs)
    }

    /// See [`FanOutHandler::register_outputs_for_level`].
    pub fn register_outputs_for_level<I, P>(&self, level: Level, paths: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.handler.register_outputs_for_level(level, paths)
    }

    /// A logger whose records all carry `attrs`. See [`FanOutHandler::with_attrs`].
    pub fn with_attrs(&self, attrs: &[Attr]) -> Logger {
        Logger::from_handler(self.handler.with_attrs(attrs))
    }

    /// A logger nesting later attributes under `name`. See [`FanOutHandler::with_group`].
    pub fn with_group(&self, name: &str) -> Logger {
        Logger::from_handler(self.handler.with_group(name))
    }

    /// Install this logger as the global [`log`] logger.
    ///
    /// # Panics
    ///
    /// Panics if a global logger has already been set.
    pub fn apply(self) {
        LogBridge::new(self).apply()
    }

    /// Install this logger as the global [`log`] logger.
    ///
    /// # Errors
    ///
    /// An error is returned if the global logger has already been set.
    pub fn try_apply(self) -> Result<(), log::SetLoggerError> {
        LogBridge::new(self).try_apply()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::sink::Capture;

    fn json_logger(level: Level, out: &Capture) -> Logger {
        Logger::from_handler(
            FanOutHandler::builder(Format::Json)
                .level(level)
                .add_source(true)
                .stdout(out.clone())
                .stderr(out.clone())
                .build(),
        )
    }

    fn lines(capture: &Capture) -> Vec<Value> {
        capture
            .contents_string()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_level_methods_and_filter() {
        let out = Capture::new("out");
        let logger = json_logger(Level::INFO, &out);

        logger.debug("hidden", &[]).unwrap();
        logger.info("i", &[]).unwrap();
        logger.warn("w", &[]).unwrap();
        logger.error("e", &[Attr::new("code", 500)]).unwrap();

        let lines = lines(&out);
        let levels: Vec<_> = lines.iter().map(|v| v["level"].as_str().unwrap()).collect();
        assert_eq!(levels, vec!["INFO", "WARN", "ERROR"]);
        assert_eq!(lines[2]["code"], 500);
    }

    #[test]
    fn test_source_is_the_caller() {
        let out = Capture::new("out");
        let logger = json_logger(Level::DEBUG, &out);
        let (info, info_line) = (logger.info("here", &[]), line!());
        info.unwrap();
        let (log, log_line) = (logger.log(Level::WARN, "there", &[]), line!());
        log.unwrap();

        let lines = lines(&out);
        assert_eq!(lines[0]["source"], format!("{}:{info_line}", file!()));
        assert_eq!(lines[1]["source"], format!("{}:{log_line}", file!()));
    }

    #[test]
    fn test_with_attrs_does_not_leak_to_parent() {
        let out = Capture::new("out");
        let parent = json_logger(Level::INFO, &out);
        let child = parent.with_attrs(&[Attr::new("k", "v")]);

        child.info("child", &[Attr::new("n", 1)]).unwrap();
        parent.info("parent", &[]).unwrap();
        child.info("child again", &[]).unwrap();

        let lines = lines(&out);
        assert_eq!(lines[0]["k"], "v");
        assert_eq!(lines[0]["n"], 1);
        assert!(lines[1].get("k").is_none());
        assert_eq!(lines[2]["k"], "v");
    }

    #[test]
    fn test_with_group() {
        let out = Capture::new("out");
        let logger = json_logger(Level::INFO, &out)
            .with_group("req")
            .with_attrs(&[Attr::new("id", 9)]);
        logger.info("m", &[Attr::new("path", "/health")]).unwrap();

        let lines = lines(&out);
        assert_eq!(lines[0]["req"]["id"], 9);
        assert_eq!(lines[0]["req"]["path"], "/health");
    }
}
