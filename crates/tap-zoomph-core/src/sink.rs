//! Singer message sink

use std::io::{self, Write};

use serde::Serialize;
use serde_json::Value;

/// Downstream consumer of a stream: one schema declaration, then records.
pub trait RecordSink {
    /// Declare the schema of `stream` with its primary-key fields.
    fn write_schema(&mut self, stream: &str, schema: &Value, key_properties: &[&str])
        -> io::Result<()>;

    /// Write a batch of records to `stream`, in order.
    fn write_records(&mut self, stream: &str, records: &[Value]) -> io::Result<()>;
}

/// Singer wire message, one JSON object per line
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
enum Message<'a> {
    Schema {
        stream: &'a str,
        schema: &'a Value,
        key_properties: &'a [&'a str],
    },
    Record {
        stream: &'a str,
        record: &'a Value,
    },
}

/// Writes Singer SCHEMA/RECORD messages as JSON lines, flushing each one
pub struct SingerSink<W: Write> {
    out: W,
}

impl<W: Write> std::fmt::Debug for SingerSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingerSink").finish_non_exhaustive()
    }
}

impl<W: Write> SingerSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, message: &Message<'_>) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, message).map_err(io::Error::other)?;
        self.out.write_all(b"\n")?;
        self.out.flush()
    }
}

impl<W: Write> RecordSink for SingerSink<W> {
    fn write_schema(
        &mut self,
        stream: &str,
        schema: &Value,
        key_properties: &[&str],
    ) -> io::Result<()> {
        self.emit(&Message::Schema {
            stream,
            schema,
            key_properties,
        })
    }

    fn write_records(&mut self, stream: &str, records: &[Value]) -> io::Result<()> {
        for record in records {
            self.emit(&Message::Record { stream, record })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn lines(sink: SingerSink<Vec<u8>>) -> Vec<Value> {
        String::from_utf8(sink.into_inner())
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn schema_message_shape() {
        let mut sink = SingerSink::new(Vec::new());
        let schema = json!({"type": "object", "properties": {"Id": {"type": "number"}}});
        sink.write_schema("zoomph", &schema, &["Id"]).unwrap();

        let out = lines(sink);
        assert_eq!(
            out,
            vec![json!({
                "type": "SCHEMA",
                "stream": "zoomph",
                "schema": schema,
                "key_properties": ["Id"],
            })]
        );
    }

    #[test]
    fn records_one_line_each_in_order() {
        let mut sink = SingerSink::new(Vec::new());
        sink.write_records("zoomph", &[json!({"Id": 1}), json!({"Id": 2})])
            .unwrap();

        let out = lines(sink);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["type"], "RECORD");
        assert_eq!(out[0]["record"]["Id"], 1);
        assert_eq!(out[1]["record"]["Id"], 2);
    }

    #[test]
    fn empty_batch_writes_nothing() {
        let mut sink = SingerSink::new(Vec::new());
        sink.write_records("zoomph", &[]).unwrap();
        assert!(sink.into_inner().is_empty());
    }
}
