//! Tools for inspecting the frame structure of an encoded stream.
//! Useful for debugging field ordering and verifying what a stream names.

use std::hash::Hasher;

use serde::Serialize;
use twox_hash::XxHash64;

use crate::error::{Result, UserialError};
use crate::reader::ObjectReader;
use crate::types::TypeRegistry;
use crate::value::Value;

/// A structural report of an encoded stream.
#[derive(Debug, Clone, Serialize)]
pub struct InspectionReport {
    /// Total size of the stream in bytes.
    pub total_size: u64,
    /// xxHash64 (seed 0) of the whole stream.
    pub checksum: u64,
    /// The root frame and everything nested in it.
    pub root: FrameInfo,
}

/// Metadata for a single frame.
#[derive(Debug, Clone, Serialize)]
pub struct FrameInfo {
    /// Absolute offset of the frame's identifier.
    pub offset: u64,
    /// Total frame length, nested frames included.
    pub length: u64,
    /// The type identifier heading the frame.
    pub identifier: String,
    /// Kind of value the frame decoded to (e.g. "composite", "array").
    pub kind: String,
    /// Extra info (e.g. "3 entries", the enum constant, a primitive's value).
    pub detail: Option<String>,
    /// Nested frames.
    pub children: Vec<FrameInfo>,
}

/// Collects frame boundaries while an [`ObjectReader`] decodes.
#[derive(Debug, Default)]
pub(crate) struct FrameRecorder {
    open: Vec<FrameInfo>,
    root: Option<FrameInfo>,
}

impl FrameRecorder {
    pub(crate) fn begin(&mut self, offset: usize, identifier: &str) {
        self.open.push(FrameInfo {
            offset: offset as u64,
            length: 0,
            identifier: identifier.to_string(),
            kind: String::new(),
            detail: None,
            children: Vec::new(),
        });
    }

    pub(crate) fn end(&mut self, end: usize, value: &Value) {
        let Some(mut frame) = self.open.pop() else {
            return;
        };
        frame.length = end as u64 - frame.offset;
        let (kind, detail) = describe(value);
        frame.kind = kind.to_string();
        frame.detail = detail;
        match self.open.last_mut() {
            Some(parent) => parent.children.push(frame),
            None => self.root = Some(frame),
        }
    }

    fn into_root(self) -> Option<FrameInfo> {
        self.root
    }
}

fn describe(value: &Value) -> (&'static str, Option<String>) {
    match value {
        Value::Null => ("null", None),
        Value::Text(s) => ("text", Some(format!("{} bytes", s.len()))),
        Value::Array { items, .. } => ("array", Some(format!("{} elements", items.len()))),
        Value::Enum(e) => ("enum", Some(e.constant.clone())),
        Value::Map { entries, .. } => ("map", Some(format!("{} entries", entries.len()))),
        Value::Sequence { items, .. } => ("sequence", Some(format!("{} items", items.len()))),
        Value::Composite(c) => ("composite", Some(format!("{} fields", c.fields().len()))),
        Value::Byte(v) => ("primitive", Some(v.to_string())),
        Value::Short(v) => ("primitive", Some(v.to_string())),
        Value::Int(v) => ("primitive", Some(v.to_string())),
        Value::Long(v) => ("primitive", Some(v.to_string())),
        Value::Float(v) => ("primitive", Some(v.to_string())),
        Value::Double(v) => ("primitive", Some(v.to_string())),
        Value::Char(v) => ("primitive", Some(format!("U+{v:04X}"))),
        Value::Boolean(v) => ("primitive", Some(v.to_string())),
    }
}

/// The userial inspector tool.
#[derive(Debug)]
pub struct FrameInspector;

impl FrameInspector {
    /// Decodes `bytes` and reports every frame it contains.
    ///
    /// Fails exactly where decoding with the same `max_depth` would fail.
    pub fn inspect(
        bytes: &[u8],
        registry: &TypeRegistry,
        max_depth: Option<usize>,
    ) -> Result<InspectionReport> {
        let mut reader = ObjectReader::new(registry, bytes)
            .with_max_depth(max_depth)
            .with_recorder();
        reader.read_value()?;
        let root = reader
            .take_recorder()
            .and_then(FrameRecorder::into_root)
            .ok_or_else(|| UserialError::Format("stream contains no frame".into()))?;

        let mut hasher = XxHash64::with_seed(0);
        hasher.write(bytes);

        Ok(InspectionReport {
            total_size: bytes.len() as u64,
            checksum: hasher.finish(),
            root,
        })
    }
}

impl std::fmt::Display for InspectionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== USERIAL INSPECTOR REPORT ===")?;
        writeln!(f, "Total Size:     {}", self.total_size)?;
        writeln!(f, "Checksum:       {:016x}", self.checksum)?;
        writeln!(f, "\n[FRAME LAYOUT]")?;
        self.root.fmt_recursive(f, "", true)
    }
}

impl FrameInfo {
    fn fmt_recursive(
        &self,
        f: &mut std::fmt::Formatter<'_>,
        prefix: &str,
        is_last: bool,
    ) -> std::fmt::Result {
        let connector = if is_last { "└── " } else { "├── " };
        let child_prefix = if is_last { "    " } else { "│   " };
        let detail = self
            .detail
            .as_deref()
            .map(|d| format!(" [{d}]"))
            .unwrap_or_default();

        writeln!(
            f,
            "{prefix}{connector}{} ({}) @{} | {}b{detail}",
            self.identifier, self.kind, self.offset, self.length
        )?;

        for (i, child) in self.children.iter().enumerate() {
            let is_last_child = i + 1 == self.children.len();
            child.fmt_recursive(f, &format!("{prefix}{child_prefix}"), is_last_child)?;
        }
        Ok(())
    }
}
