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

use std::collections::BTreeMap;
use std::fs;
use std::thread;

use logforth_fanout::FanOutHandler;
use logforth_fanout::encoder::Format;
use logforth_fanout::kv::Attr;
use logforth_fanout::record::Level;
use logforth_fanout::record::Record;
use logforth_fanout::sink::Capture;
use rand::Rng;
use rand::distr::Alphanumeric;
use serde_json::Value;
use tempfile::TempDir;

const PER_THREAD: usize = 1000;

fn random_payload() -> String {
    let mut rng = rand::rng();
    let len = rng.random_range(1..=512);
    std::iter::repeat(())
        .map(|()| rng.sample(Alphanumeric))
        .map(char::from)
        .take(len)
        .collect()
}

#[test]
fn test_two_threads_never_interleave() {
    let dir = TempDir::new().expect("failed to create a temporary directory");
    let path = dir.path().join("shared.log");
    let stdout = Capture::new("stdout");

    let handler = FanOutHandler::builder(Format::Json)
        .stdout(stdout.clone())
        .build();
    handler.register_outputs_for_level(Level::INFO, [&path]).unwrap();

    thread::scope(|s| {
        for worker in 0..2 {
            let handler = &handler;
            s.spawn(move || {
                for seq in 0..PER_THREAD {
                    let record = Record::builder()
                        .level(Level::INFO)
                        .message(random_payload())
                        .attr("worker", worker)
                        .attr("seq", seq)
                        .build();
                    handler.handle(&record).unwrap();
                }
            });
        }
    });

    for text in [fs::read_to_string(&path).unwrap(), stdout.contents_string()] {
        assert!(text.ends_with('\n'));
        let lines: Vec<Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).expect("a whole record per line"))
            .collect();
        assert_eq!(lines.len(), 2 * PER_THREAD);

        // records from each worker appear exactly once and in their own order
        let mut next: BTreeMap<u64, u64> = BTreeMap::new();
        for line in &lines {
            let worker = line["worker"].as_u64().unwrap();
            let seq = line["seq"].as_u64().unwrap();
            let expected = next.entry(worker).or_insert(0);
            assert_eq!(seq, *expected);
            *expected += 1;
        }
        assert_eq!(next.values().copied().collect::<Vec<_>>(), vec![1000, 1000]);
    }
}

#[test]
fn test_derived_handlers_serialize_with_their_parent() {
    let dir = TempDir::new().expect("failed to create a temporary directory");
    let path = dir.path().join("tree.log");
    let stdout = Capture::new("stdout");

    let root = FanOutHandler::builder(Format::Text)
        .stdout(stdout.clone())
        .build();
    root.register_outputs_for_level(Level::WARN, [&path]).unwrap();

    let handlers = vec![
        root.with_attrs(&[Attr::new("branch", "a")]),
        root.with_group("b").with_attrs(&[Attr::new("branch", "b")]),
        root.with_attrs(&[Attr::new("branch", "c")]).with_group("c"),
    ];
    for handler in &handlers {
        assert!(handler.shares_buffer_with(&root));
    }

    thread::scope(|s| {
        for handler in &handlers {
            s.spawn(move || {
                for _ in 0..200 {
                    let record = Record::builder()
                        .level(Level::WARN)
                        .message(random_payload())
                        .attr("tail", "end")
                        .build();
                    handler.handle(&record).unwrap();
                }
            });
        }
        s.spawn(|| {
            for _ in 0..200 {
                root.handle(&Record::new(Level::WARN, random_payload())).unwrap();
            }
        });
    });

    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 800);
    for line in lines {
        assert!(line.starts_with("time="), "{line}");
        assert_eq!(line.matches("level=WARN").count(), 1, "{line}");
        if line.contains("branch") {
            assert!(line.ends_with("tail=end"), "{line}");
        }
    }
    assert_eq!(stdout.contents_string().lines().count(), 800);
}
