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

use logforth_fanout::LogBridge;
use logforth_fanout::Logger;
use logforth_fanout::Options;
use logforth_fanout::encoder::Format;
use logforth_fanout::record::Level;

fn main() {
    let logger = Logger::new(Options {
        format: Format::Text,
        add_source: true,
        level: Level::DEBUG,
    });
    LogBridge::new(logger).filter_from_env("RUST_LOG").apply();

    log::error!("Hello error!");
    log::warn!("Hello warn!");
    log::info!(user = "alice", attempts = 3; "Hello info!");
    log::debug!("Hello debug!");
    log::trace!("Hello trace!");
}
