//! Event sinks: where detector events are written.

use std::io::{self, Write};

use crate::types::DetectorEvent;

/// Destination for detector events.
pub trait EventSink: Send {
    fn emit(&mut self, event: &DetectorEvent) -> io::Result<()>;

    /// Called after each batch's events have been emitted.
    fn flush(&mut self) -> io::Result<()>;
}

/// Human-readable lines, one per event.
///
/// `SamplesSeen` diagnostics are only written when `verbose` is set.
pub struct TextSink<W: Write + Send> {
    out: W,
    verbose: bool,
}

impl<W: Write + Send> TextSink<W> {
    pub const fn new(out: W, verbose: bool) -> Self {
        Self { out, verbose }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> EventSink for TextSink<W> {
    fn emit(&mut self, event: &DetectorEvent) -> io::Result<()> {
        if matches!(event, DetectorEvent::SamplesSeen { .. }) && !self.verbose {
            return Ok(());
        }
        writeln!(self.out, "{event}")
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// One JSON object per line, for every event.
pub struct JsonSink<W: Write + Send> {
    out: W,
}

impl<W: Write + Send> JsonSink<W> {
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> EventSink for JsonSink<W> {
    fn emit(&mut self, event: &DetectorEvent) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, event)?;
        self.out.write_all(b"\n")
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// Collects events in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub events: Vec<DetectorEvent>,
}

impl EventSink for MemorySink {
    fn emit(&mut self, event: &DetectorEvent) -> io::Result<()> {
        self.events.push(event.clone());
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChangeReport;

    #[test]
    fn test_text_sink_hides_samples_seen_unless_verbose() {
        let mut sink = TextSink::new(Vec::new(), false);
        sink.emit(&DetectorEvent::SamplesSeen { samples_seen: 600 })
            .unwrap();
        sink.emit(&DetectorEvent::Change(ChangeReport::compared(3.5)))
            .unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text, "spectrum change: 3.50%\n");

        let mut sink = TextSink::new(Vec::new(), true);
        sink.emit(&DetectorEvent::SamplesSeen { samples_seen: 600 })
            .unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text, "samples seen: 600\n");
    }

    #[test]
    fn test_json_sink_writes_one_object_per_line() {
        let mut sink = JsonSink::new(Vec::new());
        sink.emit(&DetectorEvent::SamplesSeen { samples_seen: 4 })
            .unwrap();
        sink.emit(&DetectorEvent::InsufficientSamples {
            required: 4,
            available: 2,
        })
        .unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["event"], "samples_seen");
        assert_eq!(first["samples_seen"], 4);
        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["event"], "insufficient_samples");
    }
}
