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

use std::fmt::Write;

use jiff::tz::TimeZone;

use crate::Error;
use crate::encoder::Encoder;
use crate::encoder::Scope;
use crate::encoder::timestamp;
use crate::kv::Attr;
use crate::kv::Value;
use crate::record::Record;

/// An encoder that writes records as `key=value` pairs, one record per line.
///
/// Output format:
///
/// ```text
/// time=2024-08-11T22:44:57.172105+08:00 level=ERROR msg="Hello error!" user=alice
/// ```
///
/// Attributes under a group have their keys prefixed with the group path, e.g. `req.id=7`.
///
/// # Examples
///
/// ```
/// use logforth_fanout::encoder::TextEncoder;
///
/// let encoder = TextEncoder::default().add_source(true);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TextEncoder {
    tz: Option<TimeZone>,
    add_source: bool,
    scope: Scope,
}

impl TextEncoder {
    /// Set the timezone for timestamps.
    ///
    /// Defaults to the system timezone if not set.
    ///
    /// # Examples
    ///
    /// ```
    /// use jiff::tz::TimeZone;
    /// use logforth_fanout::encoder::TextEncoder;
    ///
    /// let encoder = TextEncoder::default().timezone(TimeZone::UTC);
    /// ```
    pub fn timezone(mut self, tz: TimeZone) -> Self {
        self.tz = Some(tz);
        self
    }

    /// Emit a `source=<file>:<line>` pair for records that carry a source position.
    pub fn add_source(mut self, add_source: bool) -> Self {
        self.add_source = add_source;
        self
    }
}

fn needs_quoting(s: &str) -> bool {
    s.is_empty()
        || s
            .chars()
            .any(|c| c == '=' || c == '"' || c.is_control() || c.is_whitespace())
}

fn write_quoted(text: &mut String, s: &str) {
    text.push('"');
    for c in s.chars() {
        match c {
            '"' => text.push_str("\\\""),
            '\\' => text.push_str("\\\\"),
            '\n' => text.push_str("\\n"),
            '\r' => text.push_str("\\r"),
            '\t' => text.push_str("\\t"),
            // SAFETY: write to a string always succeeds
            c if c.is_control() => write!(text, "\\u{{{:04x}}}", c as u32).unwrap(),
            c => text.push(c),
        }
    }
    text.push('"');
}

fn write_str_value(text: &mut String, s: &str) {
    if needs_quoting(s) {
        write_quoted(text, s);
    } else {
        text.push_str(s);
    }
}

fn write_value(text: &mut String, value: &Value) {
    match value {
        Value::String(s) => write_str_value(text, s),
        Value::Null | Value::Bool(_) | Value::Number(_) => {
            // SAFETY: write to a string always succeeds
            write!(text, "{value}").unwrap();
        }
        Value::Array(_) | Value::Object(_) => write_str_value(text, &value.to_string()),
    }
}

// Keys follow the same quoting rule as values, so a key can never end the line or pose as
// another pair.
fn write_pair(text: &mut String, path: &[String], attr: &Attr) {
    text.push(' ');
    if path.is_empty() {
        write_str_value(text, attr.key());
    } else {
        let mut key = path.join(".");
        key.push('.');
        key.push_str(attr.key());
        write_str_value(text, &key);
    }
    text.push('=');
    write_value(text, attr.value());
}

impl Encoder for TextEncoder {
    fn encode(&self, record: &Record, buf: &mut Vec<u8>) -> Result<(), Error> {
        let time = timestamp(record.time(), self.tz.as_ref())?;

        let mut text = format!("time={time:.6} level={}", record.level());
        if self.add_source {
            if let Some(source) = record.source() {
                text.push_str(" source=");
                write_str_value(&mut text, &source.to_string());
            }
        }
        text.push_str(" msg=");
        write_str_value(&mut text, record.message());

        self.scope.visit(record, |path, attr| {
            write_pair(&mut text, path, attr);
            Ok(())
        })?;
        text.push('\n');

        buf.extend_from_slice(text.as_bytes());
        Ok(())
    }

    fn with_attrs(&self, attrs: &[Attr]) -> Box<dyn Encoder> {
        Box::new(TextEncoder {
            tz: self.tz.clone(),
            add_source: self.add_source,
            scope: self.scope.with_attrs(attrs),
        })
    }

    fn with_group(&self, name: &str) -> Box<dyn Encoder> {
        Box::new(TextEncoder {
            tz: self.tz.clone(),
            add_source: self.add_source,
            scope: self.scope.with_group(name),
        })
    }
}
