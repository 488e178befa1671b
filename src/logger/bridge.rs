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
use std::io::Write;

use log::LevelFilter;

use crate::Error;
use crate::Logger;
use crate::kv::collect_log_kvs;
use crate::record::Level;
use crate::record::Record;
use crate::record::Source;

/// Routes records from the [`log`] facade into a [`Logger`].
///
/// # Examples
///
/// ```no_run
/// use logforth_fanout::LogBridge;
/// use logforth_fanout::Logger;
///
/// LogBridge::new(Logger::new(Default::default()))
///     .filter_from_env("RUST_LOG")
///     .apply();
///
/// log::info!(user = "alice"; "logged in");
/// ```
#[derive(Debug)]
pub struct LogBridge {
    logger: Logger,
    filter: Option<env_filter::Filter>,
}

impl LogBridge {
    /// Create a bridge into `logger`.
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            filter: None,
        }
    }

    /// Additionally filter records by target, using `env_logger` directive syntax.
    pub fn filter(mut self, filter: env_filter::Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Parse the directives in the environment variable `var`, if it is set.
    ///
    /// When the variable is unset only the logger's minimum level applies.
    pub fn filter_from_env(self, var: &str) -> Self {
        match std::env::var(var) {
            Ok(directives) => self.filter(env_filter::Builder::new().parse(&directives).build()),
            Err(_) => self,
        }
    }

    /// The most verbose [`log`] level that passes the logger's minimum level.
    pub fn max_level(&self) -> LevelFilter {
        let options = self.logger.handler().options();
        [
            log::Level::Trace,
            log::Level::Debug,
            log::Level::Info,
            log::Level::Warn,
            log::Level::Error,
        ]
        .into_iter()
        .find(|level| Level::from(*level) >= options.level)
        .map_or(LevelFilter::Off, |level| level.to_level_filter())
    }

    /// Set up the global logger.
    ///
    /// # Errors
    ///
    /// An error is returned if the global logger has already been set.
    pub fn try_apply(self) -> Result<(), log::SetLoggerError> {
        let max_level = self.max_level();
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(max_level);
        Ok(())
    }

    /// Set up the global logger.
    ///
    /// # Panics
    ///
    /// Panics if the global logger has already been set.
    pub fn apply(self) {
        self.try_apply()
            .expect("LogBridge::apply should not be called after the global logger initialized");
    }
}

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.logger.handler().enabled(metadata.level().into())
            && self.filter.as_ref().is_none_or(|f| f.enabled(metadata))
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Some(filter) = &self.filter {
            if !filter.matches(record) {
                return;
            }
        }

        // Format the message and the key-values before the handler takes its token: a Display
        // impl that logs would otherwise block on the token this thread holds.
        let message = match record.args().as_str() {
            Some(s) => Cow::Borrowed(s),
            None => Cow::Owned(record.args().to_string()),
        };
        let source = record
            .file()
            .zip(record.line())
            .map(|(file, line)| Source::new(file.to_string(), line));

        let converted = Record::builder()
            .level(record.level().into())
            .message(message)
            .source(source)
            .attrs(collect_log_kvs(record.key_values()))
            .build();

        if let Err(err) = self.logger.handler().handle(&converted) {
            handle_log_error(record, err);
        }
    }

    fn flush(&self) {
        if let Err(err) = self.logger.handler().flush() {
            handle_flush_error(err);
        }
    }
}

fn handle_log_error(record: &log::Record, error: Error) {
    let Err(fallback_error) = write!(
        std::io::stderr(),
        r###"
Error perform logging.
    Attempted to log: {args}
    Record: {record:?}
    Error: {error:?}
"###,
        args = record.args(),
        record = record,
        error = error,
    ) else {
        return;
    };

    panic!(
        r###"
Error performing stderr logging after error occurred during regular logging.
    Attempted to log: {args}
    Record: {record:?}
    Error: {error:?}
    Fallback error: {fallback_error}
"###,
        args = record.args(),
        record = record,
        error = error,
        fallback_error = fallback_error,
    );
}

fn handle_flush_error(error: Error) {
    let Err(fallback_error) = write!(
        std::io::stderr(),
        r###"
Error perform flush.
    Error: {error:?}
"###,
    ) else {
        return;
    };

    panic!(
        r###"
Error performing stderr logging after error occurred during regular flush.
    Error: {error:?}
    Fallback error: {fallback_error}
"###,
    );
}

#[cfg(test)]
mod tests {
    use log::Log;

    use super::*;
    use crate::FanOutHandler;
    use crate::encoder::Format;
    use crate::sink::Capture;

    fn bridge(level: Level, out: &Capture) -> LogBridge {
        LogBridge::new(Logger::from_handler(
            FanOutHandler::builder(Format::Text)
                .level(level)
                .stdout(out.clone())
                .stderr(out.clone())
                .build(),
        ))
    }

    #[test]
    fn test_max_level() {
        let out = Capture::new("out");
        assert_eq!(bridge(Level::INFO, &out).max_level(), LevelFilter::Info);
        assert_eq!(bridge(Level::DEBUG, &out).max_level(), LevelFilter::Debug);
        assert_eq!(bridge(Level::new(-100), &out).max_level(), LevelFilter::Trace);
        assert_eq!(bridge(Level::new(2), &out).max_level(), LevelFilter::Warn);
        assert_eq!(bridge(Level::new(100), &out).max_level(), LevelFilter::Off);
    }

    #[test]
    fn test_log_record_conversion() {
        let out = Capture::new("out");
        let bridge = bridge(Level::DEBUG, &out);

        let kvs: &[(&str, &str)] = &[("user", "alice")];
        bridge.log(
            &log::Record::builder()
                .level(log::Level::Warn)
                .args(format_args!("login failed {}", 3))
                .file(Some("src/auth.rs"))
                .line(Some(42))
                .key_values(&kvs)
                .build(),
        );
        bridge.log(
            &log::Record::builder()
                .level(log::Level::Trace)
                .args(format_args!("too chatty"))
                .build(),
        );

        let text = out.contents_string();
        assert_eq!(text.lines().count(), 1);
        assert!(text.contains("level=WARN msg=\"login failed 3\" user=alice\n"), "{text}");
    }

    fn meta(target: &str, level: log::Level) -> log::Metadata<'_> {
        log::Metadata::builder().target(target).level(level).build()
    }

    #[test]
    fn test_env_filter() {
        let out = Capture::new("out");
        let filter = env_filter::Builder::new().parse("noisy=error,info").build();
        let bridge = bridge(Level::DEBUG, &out).filter(filter);

        assert!(bridge.enabled(&meta("app", log::Level::Info)));
        assert!(!bridge.enabled(&meta("app", log::Level::Debug)));
        assert!(!bridge.enabled(&meta("noisy", log::Level::Warn)));
        assert!(bridge.enabled(&meta("noisy", log::Level::Error)));
    }
}
