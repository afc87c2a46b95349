//! Export payloads delivered to the embedding host.

use crate::store::PageMarkSet;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

/// Export delivery errors.
#[derive(Debug, Error)]
pub enum ExportError {
    /// No embedding host context to deliver to.
    #[error("Export unavailable: {0}")]
    HostUnavailable(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Which part of the document an export covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportScope {
    All,
    Current,
}

/// The message handed to the host: a scope discriminant and page sets.
///
/// Marks carry only their fractional coordinates and shape kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportPayload {
    #[serde(rename = "type")]
    pub scope: ExportScope,
    pub data: Vec<PageMarkSet>,
}

impl ExportPayload {
    pub fn new(scope: ExportScope, data: Vec<PageMarkSet>) -> Self {
        Self { scope, data }
    }

    /// Serialize the payload to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize a payload from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Destination for export payloads (a parent frame, a pipe, a test buffer).
pub trait ExportSink {
    fn deliver(&mut self, payload: &ExportPayload) -> Result<(), ExportError>;
}

/// Sink that keeps every delivered payload.
///
/// Clones share the same buffer, so a handle can be kept after moving one
/// into an engine.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    payloads: Rc<RefCell<Vec<ExportPayload>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Payloads delivered so far.
    pub fn payloads(&self) -> Vec<ExportPayload> {
        self.payloads.borrow().clone()
    }

    /// Remove and return the delivered payloads.
    pub fn take(&self) -> Vec<ExportPayload> {
        std::mem::take(&mut *self.payloads.borrow_mut())
    }

    pub fn len(&self) -> usize {
        self.payloads.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.borrow().is_empty()
    }
}

impl ExportSink for CollectingSink {
    fn deliver(&mut self, payload: &ExportPayload) -> Result<(), ExportError> {
        self.payloads.borrow_mut().push(payload.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mark::{Mark, ShapeKind};
    use kurbo::Point;

    #[test]
    fn test_payload_wire_format() {
        let mut set = PageMarkSet::new(1);
        set.marks.push(Mark::new(
            ShapeKind::HorizontalLine,
            Point::new(0.1, 0.5),
            Point::new(0.4, 0.5),
        ));
        let payload = ExportPayload::new(ExportScope::Current, vec![set]);
        let json: serde_json::Value = serde_json::from_str(&payload.to_json().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "current",
                "data": [{
                    "page": 1,
                    "marks": [{
                        "startX": 0.1,
                        "startY": 0.5,
                        "endX": 0.4,
                        "endY": 0.5,
                        "shapeKind": 0
                    }]
                }]
            })
        );
    }

    #[test]
    fn test_collecting_sink_shares_buffer() {
        let sink = CollectingSink::new();
        let mut handle = sink.clone();
        handle
            .deliver(&ExportPayload::new(ExportScope::All, Vec::new()))
            .unwrap();
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.take()[0].scope, ExportScope::All);
        assert!(sink.is_empty());
    }
}
