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

//! Log record and severity level.

use std::borrow::Cow;
use std::fmt;
use std::panic::Location;
use std::str::FromStr;
use std::time::SystemTime;

use crate::Error;
use crate::ErrorKind;
use crate::kv::Attr;
use crate::kv::Value;

/// The severity of a record.
///
/// Levels are an ordered integer scale. The four named levels are spaced four apart so that
/// custom levels can sit between them; such levels render relative to the named level below
/// them, e.g. `INFO+2`.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Level(i32);

impl Level {
    /// The "debug" level.
    pub const DEBUG: Level = Level(-4);
    /// The "info" level.
    pub const INFO: Level = Level(0);
    /// The "warn" level.
    pub const WARN: Level = Level(4);
    /// The "error" level.
    pub const ERROR: Level = Level(8);

    /// Create a level from its integer value.
    pub const fn new(value: i32) -> Level {
        Level(value)
    }

    /// The integer value of this level.
    pub const fn value(self) -> i32 {
        self.0
    }

    fn base(self) -> (&'static str, i32) {
        if self.0 < Level::INFO.0 {
            ("DEBUG", Level::DEBUG.0)
        } else if self.0 < Level::WARN.0 {
            ("INFO", Level::INFO.0)
        } else if self.0 < Level::ERROR.0 {
            ("WARN", Level::WARN.0)
        } else {
            ("ERROR", Level::ERROR.0)
        }
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::INFO
    }
}

impl fmt::Debug for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, base) = self.base();
        let delta = self.0 - base;
        if delta == 0 {
            f.pad(name)
        } else {
            f.pad(&format!("{name}{delta:+}"))
        }
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_err = || {
            Error::new(ErrorKind::Unexpected, "malformed level").with_context("input", s)
        };

        let (name, delta) = match s.find(['+', '-']) {
            Some(idx) => {
                let delta = s[idx..].parse::<i32>().map_err(|err| parse_err().with_source(err))?;
                (&s[..idx], delta)
            }
            None => (s, 0),
        };

        let base = match name.to_ascii_uppercase().as_str() {
            "DEBUG" => Level::DEBUG,
            "INFO" => Level::INFO,
            "WARN" => Level::WARN,
            "ERROR" => Level::ERROR,
            _ => return Err(parse_err()),
        };

        base.0.checked_add(delta).map(Level).ok_or_else(parse_err)
    }
}

impl From<log::Level> for Level {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Level::ERROR,
            log::Level::Warn => Level::WARN,
            log::Level::Info => Level::INFO,
            log::Level::Debug => Level::DEBUG,
            log::Level::Trace => Level(Level::DEBUG.0 - 4),
        }
    }
}

/// The source code position of a log statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    file: Cow<'static, str>,
    line: u32,
}

impl Source {
    /// Create a new source position.
    pub fn new(file: impl Into<Cow<'static, str>>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// The source position of the caller.
    #[track_caller]
    pub fn caller() -> Self {
        Source::from(Location::caller())
    }

    /// The source file.
    pub fn file(&self) -> &str {
        &self.file
    }

    /// The line in the source file.
    pub fn line(&self) -> u32 {
        self.line
    }
}

impl From<&'static Location<'static>> for Source {
    fn from(location: &'static Location<'static>) -> Self {
        Source::new(location.file(), location.line())
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// A log event.
#[derive(Clone, Debug)]
pub struct Record {
    // the observed time
    now: SystemTime,

    level: Level,
    source: Option<Source>,

    // the payload
    message: Cow<'static, str>,

    // structural logging
    attrs: Vec<Attr>,
}

impl Record {
    /// Create a record at the given level with the current time and no attributes.
    pub fn new(level: Level, message: impl Into<Cow<'static, str>>) -> Self {
        Record::builder().level(level).message(message).build()
    }

    /// Returns a new builder.
    pub fn builder() -> RecordBuilder {
        RecordBuilder::default()
    }

    /// The observed time.
    pub fn time(&self) -> SystemTime {
        self.now
    }

    /// The severity of the record.
    pub fn level(&self) -> Level {
        self.level
    }

    /// The source code position, if captured.
    pub fn source(&self) -> Option<&Source> {
        self.source.as_ref()
    }

    /// The message body.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The per-record attributes, in the order they were added.
    pub fn attrs(&self) -> &[Attr] {
        &self.attrs
    }
}

/// Builder for [`Record`].
#[derive(Debug)]
pub struct RecordBuilder {
    record: Record,
}

impl Default for RecordBuilder {
    fn default() -> Self {
        RecordBuilder {
            record: Record {
                now: SystemTime::now(),
                level: Level::INFO,
                source: None,
                message: Cow::Borrowed(""),
                attrs: vec![],
            },
        }
    }
}

impl RecordBuilder {
    /// Set [`time`](Record::time).
    pub fn time(mut self, now: SystemTime) -> Self {
        self.record.now = now;
        self
    }

    /// Set [`level`](Record::level).
    pub fn level(mut self, level: Level) -> Self {
        self.record.level = level;
        self
    }

    /// Set [`source`](Record::source).
    pub fn source(mut self, source: Option<Source>) -> Self {
        self.record.source = source;
        self
    }

    /// Set [`message`](Record::message).
    pub fn message(mut self, message: impl Into<Cow<'static, str>>) -> Self {
        self.record.message = message.into();
        self
    }

    /// Append one attribute.
    pub fn attr(mut self, key: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Self {
        self.record.attrs.push(Attr::new(key, value));
        self
    }

    /// Append attributes.
    pub fn attrs(mut self, attrs: impl IntoIterator<Item = Attr>) -> Self {
        self.record.attrs.extend(attrs);
        self
    }

    /// Invoke the builder and return a `Record`.
    pub fn build(self) -> Record {
        self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_order() {
        assert!(Level::DEBUG < Level::INFO);
        assert!(Level::INFO < Level::WARN);
        assert!(Level::WARN < Level::ERROR);
    }

    #[test]
    fn test_level_display() {
        assert_eq!(Level::DEBUG.to_string(), "DEBUG");
        assert_eq!(Level::ERROR.to_string(), "ERROR");
        assert_eq!(Level::new(2).to_string(), "INFO+2");
        assert_eq!(Level::new(-8).to_string(), "DEBUG-4");
        assert_eq!(Level::new(12).to_string(), "ERROR+4");
        assert_eq!(format!("{:>5}", Level::INFO), " INFO");
    }

    #[test]
    fn test_level_from_str() {
        assert_eq!("info".parse::<Level>().unwrap(), Level::INFO);
        assert_eq!("WARN".parse::<Level>().unwrap(), Level::WARN);
        assert_eq!("INFO+2".parse::<Level>().unwrap(), Level::new(2));
        assert_eq!("debug-4".parse::<Level>().unwrap(), Level::new(-8));
        assert!("verbose".parse::<Level>().is_err());
        assert!("INFO+x".parse::<Level>().is_err());
        let err = "ERROR+2147483647".parse::<Level>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unexpected);
        assert!("DEBUG-2147483647".parse::<Level>().is_err());
        assert_eq!(
            "INFO+2147483647".parse::<Level>().unwrap(),
            Level::new(i32::MAX)
        );

        for level in [Level::DEBUG, Level::new(-1), Level::new(7), Level::ERROR] {
            assert_eq!(level.to_string().parse::<Level>().unwrap(), level);
        }
    }

    #[test]
    fn test_from_log_level() {
        assert_eq!(Level::from(log::Level::Error), Level::ERROR);
        assert_eq!(Level::from(log::Level::Trace).to_string(), "DEBUG-4");
    }

    #[test]
    fn test_record_builder() {
        let record = Record::builder()
            .level(Level::WARN)
            .message("disk almost full")
            .attr("usage", 0.93)
            .source(Some(Source::new("main.rs", 7)))
            .build();

        assert_eq!(record.level(), Level::WARN);
        assert_eq!(record.message(), "disk almost full");
        assert_eq!(record.attrs(), &[Attr::new("usage", 0.93)]);
        assert_eq!(record.source().map(ToString::to_string).as_deref(), Some("main.rs:7"));
    }

    #[test]
    fn test_source_caller() {
        let source = Source::caller();
        assert!(source.file().ends_with("record.rs"));
        assert!(source.line() > 0);
    }
}
