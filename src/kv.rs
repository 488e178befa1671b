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

//! Structured key-value attributes attached to records and handlers.

use std::borrow::Cow;
use std::fmt;

/// The value of an attribute.
///
/// Any JSON value is accepted, so nested objects and arrays survive both encoders.
pub type Value = serde_json::Value;

/// A key-value pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    key: Cow<'static, str>,
    value: Value,
}

impl Attr {
    /// Create a new attribute.
    ///
    /// # Examples
    ///
    /// ```
    /// use logforth_fanout::kv::Attr;
    ///
    /// let attr = Attr::new("user", "alice");
    /// assert_eq!(attr.key(), "user");
    /// ```
    pub fn new(key: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// The attribute key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The attribute value.
    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl fmt::Display for Attr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Value::String(s) => write!(f, "{}={}", self.key, s),
            v => write!(f, "{}={}", self.key, v),
        }
    }
}

impl<K, V> From<(K, V)> for Attr
where
    K: Into<Cow<'static, str>>,
    V: Into<Value>,
{
    fn from((key, value): (K, V)) -> Self {
        Attr::new(key, value)
    }
}

/// Collect key-values from a [`log::kv::Source`] into attributes.
pub(crate) fn collect_log_kvs(source: &dyn log::kv::Source) -> Vec<Attr> {
    struct Collector {
        attrs: Vec<Attr>,
    }

    impl<'kvs> log::kv::VisitSource<'kvs> for Collector {
        fn visit_pair(
            &mut self,
            key: log::kv::Key<'kvs>,
            value: log::kv::Value<'kvs>,
        ) -> Result<(), log::kv::Error> {
            let value = if let Some(v) = value.to_bool() {
                Value::from(v)
            } else if let Some(v) = value.to_i64() {
                Value::from(v)
            } else if let Some(v) = value.to_u64() {
                Value::from(v)
            } else if let Some(v) = value.to_f64() {
                Value::from(v)
            } else {
                Value::from(value.to_string())
            };
            self.attrs.push(Attr::new(key.to_string(), value));
            Ok(())
        }
    }

    let mut collector = Collector { attrs: Vec::new() };
    // Visiting only fails if the collector does; it never does.
    let _ = source.visit(&mut collector);
    collector.attrs
}
