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

use std::fmt;

use jiff::TimestampDisplayWithOffset;
use jiff::tz::TimeZone;
use serde::Serialize;
use serde_json::Map;

use crate::Error;
use crate::ErrorKind;
use crate::encoder::Encoder;
use crate::encoder::Scope;
use crate::encoder::timestamp;
use crate::kv::Attr;
use crate::kv::Value;
use crate::record::Level;
use crate::record::Record;

/// An encoder that writes records as JSON objects, one per line.
///
/// Output format:
///
/// ```json
/// {"time":"2024-08-11T22:44:57.172105+08:00","level":"ERROR","msg":"Hello error!","user":"alice"}
/// ```
///
/// Attributes under a group are nested in an object named after the group. Groups that end up
/// without any attribute are omitted.
///
/// Attributes are written after the `time`, `level`, `source` and `msg` fields without renaming,
/// so an attribute with one of those keys shows up as a duplicate key in the object. Among
/// attributes in the same object, a later one replaces an earlier one with the same key. A group
/// whose name is already taken by a non-object attribute in the same object fails the record
/// with an [`ErrorKind::Encode`] error.
///
/// # Examples
///
/// ```
/// use logforth_fanout::encoder::JsonEncoder;
///
/// let encoder = JsonEncoder::default();
/// ```
#[derive(Debug, Clone, Default)]
pub struct JsonEncoder {
    tz: Option<TimeZone>,
    add_source: bool,
    scope: Scope,
}

impl JsonEncoder {
    /// Set the timezone for timestamps.
    ///
    /// # Examples
    ///
    /// ```
    /// use jiff::tz::TimeZone;
    /// use logforth_fanout::encoder::JsonEncoder;
    ///
    /// let encoder = JsonEncoder::default().timezone(TimeZone::UTC);
    /// ```
    pub fn timezone(mut self, tz: TimeZone) -> Self {
        self.tz = Some(tz);
        self
    }

    /// Emit a `"source":"<file>:<line>"` field for records that carry a source position.
    pub fn add_source(mut self, add_source: bool) -> Self {
        self.add_source = add_source;
        self
    }
}

#[derive(Serialize)]
struct RecordLine<'a> {
    #[serde(serialize_with = "serialize_timestamp")]
    time: TimestampDisplayWithOffset,
    #[serde(serialize_with = "serialize_display")]
    level: Level,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    msg: &'a str,
    #[serde(flatten)]
    attrs: Map<String, Value>,
}

fn serialize_timestamp<S>(
    timestamp: &TimestampDisplayWithOffset,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_str(&format_args!("{timestamp:.6}"))
}

fn serialize_display<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: fmt::Display,
    S: serde::Serializer,
{
    serializer.collect_str(value)
}

fn insert_at(root: &mut Map<String, Value>, path: &[String], attr: &Attr) -> Result<(), Error> {
    let mut map = root;
    for group in path {
        let slot = map
            .entry(group.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        map = match slot {
            Value::Object(inner) => inner,
            _ => {
                return Err(Error::new(
                    ErrorKind::Encode,
                    "group name collides with an attribute key",
                )
                .with_context("group", group)
                .with_context("key", attr.key()));
            }
        };
    }
    map.insert(attr.key().to_string(), attr.value().clone());
    Ok(())
}

impl Encoder for JsonEncoder {
    fn encode(&self, record: &Record, buf: &mut Vec<u8>) -> Result<(), Error> {
        let mut attrs = Map::new();
        self.scope.visit(record, |path, attr| insert_at(&mut attrs, path, attr))?;

        let source = match record.source() {
            Some(source) if self.add_source => Some(source.to_string()),
            _ => None,
        };

        let record_line = RecordLine {
            time: timestamp(record.time(), self.tz.as_ref())?,
            level: record.level(),
            source,
            msg: record.message(),
            attrs,
        };

        serde_json::to_writer(&mut *buf, &record_line).map_err(|err| {
            Error::new(ErrorKind::Encode, "failed to serialize record").with_source(err)
        })?;
        buf.push(b'\n');
        Ok(())
    }

    fn with_attrs(&self, attrs: &[Attr]) -> Box<dyn Encoder> {
        Box::new(JsonEncoder {
            tz: self.tz.clone(),
            add_source: self.add_source,
            scope: self.scope.with_attrs(attrs),
        })
    }

    fn with_group(&self, name: &str) -> Box<dyn Encoder> {
        Box::new(JsonEncoder {
            tz: self.tz.clone(),
            add_source: self.add_source,
            scope: self.scope.with_group(name),
        })
    }
}
