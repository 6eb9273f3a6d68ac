//! JSON output for extracted mappings.
//!
//! Mappings keep their key order all the way to the serialized text.

use std::io::Write;

use crate::value::OutputMap;

/// Error type for serialization operations
#[derive(Debug)]
pub enum SerializationError {
    JsonError(serde_json::Error),
    IoError(std::io::Error),
}

impl From<serde_json::Error> for SerializationError {
    fn from(err: serde_json::Error) -> Self {
        SerializationError::JsonError(err)
    }
}

impl From<std::io::Error> for SerializationError {
    fn from(err: std::io::Error) -> Self {
        SerializationError::IoError(err)
    }
}

impl std::fmt::Display for SerializationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SerializationError::JsonError(e) => write!(f, "JSON error: {}", e),
            SerializationError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for SerializationError {}

/// Convert a mapping into a `serde_json::Value` object.
pub fn to_json_value(map: &OutputMap) -> Result<serde_json::Value, SerializationError> {
    Ok(serde_json::to_value(map)?)
}

pub fn to_json_string(map: &OutputMap) -> Result<String, SerializationError> {
    Ok(serde_json::to_string(map)?)
}

pub fn to_json_pretty(map: &OutputMap) -> Result<String, SerializationError> {
    Ok(serde_json::to_string_pretty(map)?)
}

/// NDJSON (Newline Delimited JSON) writer
///
/// Writes one mapping per line.
pub struct NdjsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> NdjsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write(&mut self, map: &OutputMap) -> Result<(), SerializationError> {
        serde_json::to_writer(&mut self.writer, map)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    pub fn write_all(&mut self, maps: &[OutputMap]) -> Result<(), SerializationError> {
        for map in maps {
            self.write(map)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), SerializationError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// JSON array writer
///
/// Streams mappings as the elements of one JSON array.
pub struct JsonArrayWriter<W: Write> {
    writer: W,
    first: bool,
}

impl<W: Write> JsonArrayWriter<W> {
    /// Create a new JSON array writer and write the opening bracket
    pub fn new(mut writer: W) -> Result<Self, SerializationError> {
        write!(writer, "[")?;
        Ok(Self {
            writer,
            first: true,
        })
    }

    pub fn write(&mut self, map: &OutputMap) -> Result<(), SerializationError> {
        if !self.first {
            write!(self.writer, ",")?;
        }
        self.first = false;

        serde_json::to_writer(&mut self.writer, map)?;
        Ok(())
    }

    /// Finish writing the array and close the bracket
    pub fn finish(mut self) -> Result<(), SerializationError> {
        write!(self.writer, "]")?;
        self.writer.flush()?;
        Ok(())
    }
}
