//! File-backed span recording.

use std::io::Write;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use serde_json::{json, Map, Value};
use shamble_core::Tracer;

struct OpenSpan {
    id: u64,
    parent_id: Option<u64>,
    name: String,
    context: Vec<(String, String)>,
    start_time: SystemTime,
    started: Instant,
}

/// Tracer that writes one JSON object per closed span.
///
/// Spans nest: a span opened while another is open records it as its parent.
/// Writing is best effort; a failed write drops the span and reports it on
/// stderr rather than aborting the simulation.
#[derive(Debug)]
pub(crate) struct FileTracer<W: Write> {
    out: W,
    next_id: u64,
    stack: Vec<OpenSpan>,
}

impl<W: Write> FileTracer<W> {
    pub(crate) fn new(out: W) -> Self {
        Self {
            out,
            next_id: 0,
            stack: Vec::new(),
        }
    }
}

impl<W: Write> Tracer for FileTracer<W> {
    fn open_span(&mut self, name: &str, context: &[(&str, &str)]) {
        let id = self.next_id;
        self.next_id += 1;
        self.stack.push(OpenSpan {
            id,
            parent_id: self.stack.last().map(|parent| parent.id),
            name: name.to_owned(),
            context: context
                .iter()
                .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
                .collect(),
            start_time: SystemTime::now(),
            started: Instant::now(),
        });
    }

    fn close_span(&mut self) {
        let Some(span) = self.stack.pop() else {
            return;
        };
        let duration_us = u64::try_from(span.started.elapsed().as_micros()).unwrap_or(u64::MAX);
        let start_time = span
            .start_time
            .duration_since(UNIX_EPOCH)
            .map(|since| since.as_secs_f64())
            .unwrap_or(0.0);

        let mut record = Map::new();
        let _ = record.insert("id".to_owned(), json!(span.id));
        if let Some(parent_id) = span.parent_id {
            let _ = record.insert("parent_id".to_owned(), json!(parent_id));
        }
        let _ = record.insert("name".to_owned(), json!(span.name));
        let _ = record.insert("start_time".to_owned(), json!(start_time));
        let _ = record.insert("duration_us".to_owned(), json!(duration_us));
        for (key, value) in span.context {
            let _ = record.insert(key, json!(value));
        }

        if let Err(error) = writeln!(self.out, "{}", Value::Object(record)) {
            eprintln!("failed to write trace span: {error}");
        }
    }
}

impl std::fmt::Debug for OpenSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenSpan")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
