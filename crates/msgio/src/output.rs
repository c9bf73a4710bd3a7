use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

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

/// An owned copy of one decoded message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Integer(u32),
    Array { items: Vec<Vec<u8>>, zero_copy: bool },
    Scalar { data: Vec<u8>, zero_copy: bool },
}

impl Decoded {
    pub fn kind(&self) -> &'static str {
        match self {
            Decoded::Integer(_) => "integer",
            Decoded::Array { .. } => "array",
            Decoded::Scalar { .. } => "scalar",
        }
    }

    /// Payload bytes (array items without terminators).
    pub fn size(&self) -> usize {
        match self {
            Decoded::Integer(_) => 0,
            Decoded::Array { items, .. } => items.iter().map(Vec::len).sum(),
            Decoded::Scalar { data, .. } => data.len(),
        }
    }

    fn zero_copy(&self) -> Option<bool> {
        match self {
            Decoded::Integer(_) => None,
            Decoded::Array { zero_copy, .. } | Decoded::Scalar { zero_copy, .. } => {
                Some(*zero_copy)
            }
        }
    }

    fn preview(&self) -> String {
        match self {
            Decoded::Integer(value) => value.to_string(),
            Decoded::Array { items, .. } => items
                .iter()
                .map(|item| payload_preview(item))
                .collect::<Vec<_>>()
                .join(", "),
            Decoded::Scalar { data, .. } => payload_preview(data),
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum ValueOutput {
    Integer(u32),
    Items(Vec<String>),
    Text(String),
}

#[derive(Serialize)]
struct MessageOutput {
    index: usize,
    kind: &'static str,
    size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    zero_copy: Option<bool>,
    value: ValueOutput,
}

impl MessageOutput {
    fn new(index: usize, message: &Decoded) -> Self {
        let value = match message {
            Decoded::Integer(value) => ValueOutput::Integer(*value),
            Decoded::Array { items, .. } => {
                ValueOutput::Items(items.iter().map(|item| payload_preview(item)).collect())
            }
            Decoded::Scalar { data, .. } => ValueOutput::Text(payload_preview(data)),
        };
        Self {
            index,
            kind: message.kind(),
            size: message.size(),
            zero_copy: message.zero_copy(),
            value,
        }
    }
}

pub fn print_messages(messages: &[Decoded], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for (index, message) in messages.iter().enumerate() {
                let out = MessageOutput::new(index, message);
                println!(
                    "{}",
                    serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
                );
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "KIND", "SIZE", "ZERO-COPY", "VALUE"]);
            for (index, message) in messages.iter().enumerate() {
                table.add_row(vec![
                    index.to_string(),
                    message.kind().to_string(),
                    message.size().to_string(),
                    message
                        .zero_copy()
                        .map(|flag| flag.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    message.preview(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for (index, message) in messages.iter().enumerate() {
                println!(
                    "#{index} {} size={} value={}",
                    message.kind(),
                    message.size(),
                    message.preview()
                );
            }
        }
        OutputFormat::Raw => {
            for message in messages {
                print_raw(&raw_bytes(message));
            }
        }
    }
}

/// Raw rendering: integers in decimal, array items one per line, scalars verbatim.
fn raw_bytes(message: &Decoded) -> Vec<u8> {
    match message {
        Decoded::Integer(value) => format!("{value}\n").into_bytes(),
        Decoded::Array { items, .. } => items
            .iter()
            .flat_map(|item| item.iter().copied().chain(std::iter::once(b'\n')))
            .collect(),
        Decoded::Scalar { data, .. } => data.clone(),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}
