use std::io::Write;

use super::ComplianceEvent;

/// Downstream consumer of emitted events (alerting, persistence, evidence capture).
pub trait EventSink {
    fn handle_event(&mut self, event: &ComplianceEvent);
}

impl EventSink for Vec<ComplianceEvent> {
    fn handle_event(&mut self, event: &ComplianceEvent) {
        self.push(event.clone());
    }
}

/// Writes every event to the tracing subscriber.
/// Violations log at WARN, activity events at INFO.
#[derive(Debug, Default)]
pub struct LogSink {
    camera: Option<String>,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_camera(&mut self, camera: Option<String>) {
        self.camera = camera;
    }
}

impl EventSink for LogSink {
    fn handle_event(&mut self, event: &ComplianceEvent) {
        let camera = self.camera.as_deref().unwrap_or("-");
        let evidence = serde_json::Value::Object(event.evidence.clone());
        if event.kind.is_violation() {
            tracing::warn!(
                camera,
                kind = %event.kind,
                track_id = event.track_id,
                timestamp = %event.timestamp,
                %evidence,
                "compliance violation"
            );
        } else {
            tracing::info!(
                camera,
                kind = %event.kind,
                track_id = event.track_id,
                timestamp = %event.timestamp,
                %evidence,
                "activity"
            );
        }
    }
}

/// Serializes each event as one JSON line.
///
/// Write failures are logged and counted, never propagated: a broken output
/// must not stall the per-frame loop.
pub struct JsonLinesSink<W: Write> {
    writer: W,
    camera: Option<String>,
    written: u64,
    failed: u64,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            camera: None,
            written: 0,
            failed: 0,
        }
    }

    /// Tag every line with a `camera` field
    pub fn with_camera(mut self, camera: impl Into<String>) -> Self {
        self.camera = Some(camera.into());
        self
    }

    /// Retag subsequent lines; `None` drops the field
    pub fn set_camera(&mut self, camera: Option<String>) {
        self.camera = camera;
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn failed(&self) -> u64 {
        self.failed
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_event(&mut self, event: &ComplianceEvent) -> Result<(), String> {
        let mut value = serde_json::to_value(event).map_err(|e| e.to_string())?;
        if let (Some(camera), Some(obj)) = (&self.camera, value.as_object_mut()) {
            obj.insert("camera".to_string(), camera.clone().into());
        }
        serde_json::to_writer(&mut self.writer, &value).map_err(|e| e.to_string())?;
        self.writer.write_all(b"\n").map_err(|e| e.to_string())
    }
}

impl<W: Write> EventSink for JsonLinesSink<W> {
    fn handle_event(&mut self, event: &ComplianceEvent) {
        match self.write_event(event) {
            Ok(()) => self.written += 1,
            Err(e) => {
                self.failed += 1;
                tracing::error!(error = %e, kind = %event.kind, track_id = event.track_id, "Failed to write event");
            }
        }
    }
}
