use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use serframe_frame::{
    decode_frame, ConfigRecord, DecodedFrame, SessionReport, MIN_FRAME_SIZE, TRAILER_SIZE,
};
use serframe_transport::PortInfo;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct RecordOutput {
    version: u32,
    blink_ms: u16,
    mode: u8,
    reserved: u8,
}

impl From<&ConfigRecord> for RecordOutput {
    fn from(record: &ConfigRecord) -> Self {
        Self {
            version: record.version,
            blink_ms: record.blink_ms,
            mode: record.mode,
            reserved: record.reserved,
        }
    }
}

#[derive(Serialize)]
struct EncodedOutput {
    frame_size: usize,
    payload_size: usize,
    checksum: String,
    frame: String,
}

#[derive(Serialize)]
struct DecodedOutput {
    payload_size: usize,
    payload: String,
    checksum: String,
    verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    record: Option<RecordOutput>,
}

impl From<&DecodedFrame> for DecodedOutput {
    fn from(decoded: &DecodedFrame) -> Self {
        Self {
            payload_size: decoded.payload.len(),
            payload: hex::encode(&decoded.payload),
            checksum: format_checksum(decoded.checksum),
            verified: decoded.verified,
            record: ConfigRecord::from_payload(&decoded.payload)
                .ok()
                .as_ref()
                .map(RecordOutput::from),
        }
    }
}

#[derive(Serialize)]
struct SendOutput<'a> {
    port: &'a str,
    bytes_sent: usize,
    chunks: usize,
    elapsed_ms: u128,
    reply_size: usize,
    reply: String,
    reply_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_frame: Option<DecodedOutput>,
    timestamp: String,
}

#[derive(Serialize)]
struct PortOutput<'a> {
    name: &'a str,
    kind: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

/// Print a freshly encoded frame.
pub fn print_encoded(frame: &[u8], format: OutputFormat) {
    let payload_size = frame.len().saturating_sub(MIN_FRAME_SIZE);
    let checksum = frame
        .len()
        .checked_sub(TRAILER_SIZE)
        .and_then(|at| frame[at..].try_into().ok())
        .map(u32::from_le_bytes)
        .unwrap_or_default();

    match format {
        OutputFormat::Json => {
            let out = EncodedOutput {
                frame_size: frame.len(),
                payload_size,
                checksum: format_checksum(checksum),
                frame: hex::encode(frame),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let table = key_value_table(vec![
                ("FRAME SIZE", frame.len().to_string()),
                ("PAYLOAD SIZE", payload_size.to_string()),
                ("CRC-32", format_checksum(checksum)),
                ("FRAME", spaced_hex(frame)),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "frame={} size={} payload={} crc32={}",
                spaced_hex(frame),
                frame.len(),
                payload_size,
                format_checksum(checksum)
            );
        }
        OutputFormat::Raw => print_raw(frame),
    }
}

/// Print a decoded frame and, when the payload is a record, its fields.
pub fn print_decoded(decoded: &DecodedFrame, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&DecodedOutput::from(decoded)),
        OutputFormat::Table => {
            let out = DecodedOutput::from(decoded);
            let mut rows = vec![
                ("PAYLOAD SIZE", out.payload_size.to_string()),
                ("PAYLOAD", spaced_hex(&decoded.payload)),
                ("CRC-32", out.checksum.clone()),
                ("VERIFIED", out.verified.to_string()),
            ];
            if let Some(record) = &out.record {
                rows.extend(record_rows(record));
            }
            println!("{}", key_value_table(rows));
        }
        OutputFormat::Pretty => {
            let out = DecodedOutput::from(decoded);
            print!(
                "payload={} size={} crc32={} verified={}",
                out.payload, out.payload_size, out.checksum, out.verified
            );
            match &out.record {
                Some(record) => println!(
                    " version={} blink_ms={} mode={} reserved={}",
                    record.version, record.blink_ms, record.mode, record.reserved
                ),
                None => println!(),
            }
        }
        OutputFormat::Raw => print_raw(&decoded.payload),
    }
}

/// Print the outcome of a send/receive session.
pub fn print_session(report: &SessionReport, port: &str, format: OutputFormat) {
    let reply = report.reply.as_ref();
    let reply_frame = decode_frame(reply).ok();

    match format {
        OutputFormat::Json => {
            let out = SendOutput {
                port,
                bytes_sent: report.sent.bytes,
                chunks: report.sent.chunks,
                elapsed_ms: report.elapsed.as_millis(),
                reply_size: reply.len(),
                reply: hex::encode(reply),
                reply_text: String::from_utf8_lossy(reply).into_owned(),
                reply_frame: reply_frame.as_ref().map(DecodedOutput::from),
                timestamp: now_unix_seconds(),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut rows = vec![
                ("PORT", port.to_string()),
                ("SENT", format!("{} bytes in {} chunks", report.sent.bytes, report.sent.chunks)),
                ("ELAPSED", format!("{} ms", report.elapsed.as_millis())),
                ("REPLY SIZE", reply.len().to_string()),
            ];
            if !reply.is_empty() {
                rows.push(("REPLY", spaced_hex(reply)));
                rows.push(("REPLY TEXT", String::from_utf8_lossy(reply).into_owned()));
            }
            if let Some(decoded) = &reply_frame {
                rows.push(("REPLY FRAME VERIFIED", decoded.verified.to_string()));
            }
            println!("{}", key_value_table(rows));
        }
        OutputFormat::Pretty => {
            println!(
                "sent {} bytes to {port} in {} chunks",
                report.sent.bytes, report.sent.chunks
            );
            if reply.is_empty() {
                println!("No response from device within timeout.");
            } else {
                println!("Device replied (raw): {}", spaced_hex(reply));
                println!("Decoded text (utf-8): {}", String::from_utf8_lossy(reply));
                if let Some(decoded) = &reply_frame {
                    println!(
                        "Reply is a frame: payload={} verified={}",
                        hex::encode(&decoded.payload),
                        decoded.verified
                    );
                }
            }
        }
        OutputFormat::Raw => print_raw(reply),
    }
}

/// Print the serial ports found on this host.
pub fn print_ports(ports: &[PortInfo], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out: Vec<PortOutput<'_>> = ports
                .iter()
                .map(|p| PortOutput {
                    name: &p.name,
                    kind: p.kind,
                    description: p.description.as_deref(),
                })
                .collect();
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PORT", "KIND", "DESCRIPTION"]);
            for port in ports {
                table.add_row(vec![
                    port.name.clone(),
                    port.kind.to_string(),
                    port.description.clone().unwrap_or_default(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for port in ports {
                match &port.description {
                    Some(desc) => println!("{} ({}) {desc}", port.name, port.kind),
                    None => println!("{} ({})", port.name, port.kind),
                }
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn key_value_table(rows: Vec<(&str, String)>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["FIELD", "VALUE"]);
    for (key, value) in rows {
        table.add_row(vec![key.to_string(), value]);
    }
    table
}

fn record_rows(record: &RecordOutput) -> Vec<(&'static str, String)> {
    vec![
        ("VERSION", record.version.to_string()),
        ("BLINK MS", record.blink_ms.to_string()),
        ("MODE", record.mode.to_string()),
        ("RESERVED", record.reserved.to_string()),
    ]
}

fn format_checksum(checksum: u32) -> String {
    format!("0x{checksum:08x}")
}

fn spaced_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spaced_hex_formats_bytes() {
        assert_eq!(spaced_hex(&[0x08, 0x00, 0x2c]), "08 00 2c");
        assert_eq!(spaced_hex(&[]), "");
    }

    #[test]
    fn checksum_is_zero_padded() {
        assert_eq!(format_checksum(0x3926), "0x00003926");
    }

    #[test]
    fn decoded_output_includes_record_for_record_payloads() {
        let frame = serframe_frame::encode_record(&ConfigRecord::default()).unwrap();
        let decoded = decode_frame(&frame).unwrap();
        let out = DecodedOutput::from(&decoded);

        assert!(out.verified);
        assert_eq!(out.payload, "020000002c010100");
        let record = out.record.expect("8-byte payload should parse");
        assert_eq!(record.blink_ms, 300);
    }

    #[test]
    fn decoded_output_omits_record_for_other_payloads() {
        let mut buf = bytes::BytesMut::new();
        serframe_frame::encode_frame(b"hello", &mut buf).unwrap();
        let decoded = decode_frame(&buf).unwrap();

        let json = serde_json::to_value(DecodedOutput::from(&decoded)).unwrap();
        assert!(json.get("record").is_none());
        assert_eq!(json["payload"], "68656c6c6f");
    }
}
