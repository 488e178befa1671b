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

//! Encoders that serialize one record into a byte buffer.

use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;

use jiff::Timestamp;
use jiff::TimestampDisplayWithOffset;
use jiff::tz::TimeZone;

use crate::Error;
use crate::ErrorKind;
use crate::kv::Attr;
use crate::record::Record;

mod json;
mod text;

pub use self::json::JsonEncoder;
pub use self::text::TextEncoder;

/// Serializes records into a caller-supplied buffer.
///
/// An encoder must only append to the buffer it is given and must not synchronize on its own;
/// the handler owning the buffer guarantees exclusive access for the duration of one call.
pub trait Encoder: fmt::Debug + Send + Sync + 'static {
    /// Append exactly one encoded record to `buf`.
    fn encode(&self, record: &Record, buf: &mut Vec<u8>) -> Result<(), Error>;

    /// Derive an encoder that adds `attrs` to every record it encodes.
    fn with_attrs(&self, attrs: &[Attr]) -> Box<dyn Encoder>;

    /// Derive an encoder that qualifies every later attribute with the group `name`.
    fn with_group(&self, name: &str) -> Box<dyn Encoder>;
}

impl<T: Encoder> From<T> for Box<dyn Encoder> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}

/// The built-in encoder variants.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// `key=value` text, one record per line.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl Format {
    /// Construct the encoder for this format.
    pub fn encoder(self, add_source: bool) -> Box<dyn Encoder> {
        match self {
            Format::Text => Box::new(TextEncoder::default().add_source(add_source)),
            Format::Json => Box::new(JsonEncoder::default().add_source(add_source)),
        }
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Format::Text),
            "json" => Ok(Format::Json),
            _ => Err(Error::new(ErrorKind::Unexpected, "unknown format").with_context("input", s)),
        }
    }
}

/// Attributes and groups accumulated through `with_attrs` and `with_group`.
#[derive(Debug, Clone, Default)]
pub(crate) struct Scope {
    groups: Vec<String>,
    // each attribute remembers how many groups were open when it was added
    attrs: Vec<(usize, Attr)>,
}

impl Scope {
    pub(crate) fn with_attrs(&self, attrs: &[Attr]) -> Scope {
        let mut scope = self.clone();
        let depth = scope.groups.len();
        scope
            .attrs
            .extend(attrs.iter().map(|attr| (depth, attr.clone())));
        scope
    }

    pub(crate) fn with_group(&self, name: &str) -> Scope {
        let mut scope = self.clone();
        if !name.is_empty() {
            scope.groups.push(name.to_string());
        }
        scope
    }

    /// Visit the scoped attributes followed by the record attributes, each with its group path.
    pub(crate) fn visit<'a, F>(&'a self, record: &'a Record, mut f: F) -> Result<(), Error>
    where
        F: FnMut(&'a [String], &'a Attr) -> Result<(), Error>,
    {
        for (depth, attr) in &self.attrs {
            f(&self.groups[..*depth], attr)?;
        }
        for attr in record.attrs() {
            f(&self.groups, attr)?;
        }
        Ok(())
    }
}

pub(crate) fn timestamp(
    time: SystemTime,
    tz: Option<&TimeZone>,
) -> Result<TimestampDisplayWithOffset, Error> {
    let ts = Timestamp::try_from(time).map_err(|err| {
        Error::new(ErrorKind::Encode, "record time is out of range").with_source(err)
    })?;
    let offset = match tz {
        Some(tz) => tz.to_offset(ts),
        None => TimeZone::system().to_offset(ts),
    };
    Ok(ts.display_with_offset(offset))
}
