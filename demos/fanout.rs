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

use logforth_fanout::Logger;
use logforth_fanout::Options;
use logforth_fanout::encoder::Format;
use logforth_fanout::kv::Attr;
use logforth_fanout::record::Level;

fn main() {
    let logger = Logger::new(Options {
        format: Format::Json,
        add_source: true,
        level: Level::DEBUG,
    });

    let dir = std::env::temp_dir().join("logforth-fanout-demo");
    std::fs::create_dir_all(&dir).unwrap();
    logger
        .register_outputs_for_level(Level::ERROR, [dir.join("errors.log"), dir.join("all.log")])
        .unwrap();
    logger
        .register_outputs_for_level(Level::INFO, [dir.join("all.log")])
        .unwrap();

    logger.debug("console only", &[]).unwrap();
    logger
        .info("service started", &[Attr::new("port", 8080)])
        .unwrap();

    let request = logger
        .with_attrs(&[Attr::new("service", "api")])
        .with_group("req");
    request
        .error("upstream timed out", &[Attr::new("id", 7), Attr::new("ms", 3000)])
        .unwrap();

    println!("log files written to {}", dir.display());
}
