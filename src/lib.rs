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

//! A structured log handler that encodes each record once and fans the bytes out to every
//! destination registered for the record's level.
//!
//! # Overview
//!
//! A [`FanOutHandler`] owns an [`Encoder`](encoder::Encoder) (text or JSON), one reusable encode
//! buffer, and a per-level registry of output files. Every record is written to the files
//! registered for its exact level plus a default console stream: stderr for errors, stdout for
//! everything else.
//!
//! Concurrent calls serialize on the buffer, so each destination always receives whole records
//! in some order, never interleaved bytes.
//!
//! # Examples
//!
//! Register per-level files and log through a [`Logger`]:
//!
//! ```no_run
//! use logforth_fanout::Logger;
//! use logforth_fanout::Options;
//! use logforth_fanout::encoder::Format;
//! use logforth_fanout::kv::Attr;
//! use logforth_fanout::record::Level;
//!
//! let logger = Logger::new(Options {
//!     format: Format::Json,
//!     add_source: true,
//!     level: Level::DEBUG,
//! });
//! logger
//!     .register_outputs_for_level(Level::ERROR, ["errors.log", "all.log"])
//!     .unwrap();
//! logger
//!     .register_outputs_for_level(Level::INFO, ["all.log"])
//!     .unwrap();
//!
//! logger.error("boom", &[Attr::new("code", 500)]).unwrap();
//! ```
//!
//! Or install it behind the [`log`] facade:
//!
//! ```no_run
//! use logforth_fanout::Logger;
//!
//! Logger::new(Default::default()).apply();
//! log::info!("This is an info message.");
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod encoder;
pub mod handler;
pub mod kv;
pub mod record;
pub mod registry;
pub mod sink;

mod error;
mod logger;

pub use self::error::Error;
pub use self::error::ErrorKind;
pub use self::handler::FanOutHandler;
pub use self::handler::HandlerBuilder;
pub use self::handler::HandlerOptions;
pub use self::logger::LogBridge;
pub use self::logger::Logger;
pub use self::logger::Options;
