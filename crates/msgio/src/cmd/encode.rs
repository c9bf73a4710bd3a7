use std::fs;
use std::io::Read;

use msgio_frame::{ArrayMessage, MessageWriter, ScalarMessage, Uint16Message, Uint32Message};
use msgio_transport::{FdSink, VectoredSink, WriterConfig};
use tracing::debug;

use crate::cmd::{EncodeArgs, EncodeMessage, ScalarArgs};
use crate::exit::{frame_error, io_error, CliError, CliResult, SUCCESS, USAGE};

pub fn run(args: EncodeArgs) -> CliResult<i32> {
    if args.repeat == 0 {
        return Err(CliError::new(USAGE, "--repeat must be greater than zero"));
    }

    let mut config = WriterConfig::default();
    if let Some(max_vectors) = args.max_vectors {
        if max_vectors == 0 {
            return Err(CliError::new(USAGE, "--max-vectors must be greater than zero"));
        }
        config = config.with_max_vectors(max_vectors);
    }

    let stdout = std::io::stdout();
    let mut writer = MessageWriter::with_config(FdSink::from_fd(&stdout), config);
    let written = encode(&mut writer, &args.message, args.repeat)?;

    debug!(
        bytes = written,
        repeat = args.repeat,
        max_vectors = writer.config().max_vectors,
        "message written"
    );
    Ok(SUCCESS)
}

/// Generate the message once and write it `repeat` times.
fn encode<S: VectoredSink>(
    writer: &mut MessageWriter<S>,
    message: &EncodeMessage,
    repeat: usize,
) -> CliResult<usize> {
    match message {
        EncodeMessage::Array(args) => {
            let items: Vec<&[u8]> = args.items.iter().map(|item| item.as_bytes()).collect();
            let mut header = [0u8; 2];
            let mut fragments = Vec::with_capacity(ArrayMessage::output_size(items.len()));
            ArrayMessage::generate(&items, &mut header, &mut fragments)
                .map_err(|err| frame_error("encode failed", err))?;
            send_repeated(writer, &fragments, repeat)
        }
        EncodeMessage::Scalar(args) => {
            let payload = scalar_payload(args)?;
            let mut header = [0u8; 4];
            let mut fragments = Vec::with_capacity(2);
            ScalarMessage::generate(&payload, &mut header, &mut fragments)
                .map_err(|err| frame_error("encode failed", err))?;
            send_repeated(writer, &fragments, repeat)
        }
        EncodeMessage::U16 { value } => {
            let mut buf = [0u8; 2];
            Uint16Message::generate(&mut buf, *value);
            send_repeated(writer, &[&buf[..]], repeat)
        }
        EncodeMessage::U32 { value } => {
            let mut buf = [0u8; 4];
            Uint32Message::generate(&mut buf, *value);
            send_repeated(writer, &[&buf[..]], repeat)
        }
    }
}

fn send_repeated<S: VectoredSink>(
    writer: &mut MessageWriter<S>,
    fragments: &[&[u8]],
    repeat: usize,
) -> CliResult<usize> {
    let collections = vec![fragments; repeat];
    writer
        .send_all(&collections)
        .map_err(|err| frame_error("write failed", err))
}

fn scalar_payload(args: &ScalarArgs) -> CliResult<Vec<u8>> {
    if let Some(data) = &args.data {
        return Ok(data.as_bytes().to_vec());
    }
    if let Some(path) = &args.file {
        return fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }
    let mut payload = Vec::new();
    std::io::stdin()
        .read_to_end(&mut payload)
        .map_err(|err| io_error("failed reading stdin", err))?;
    Ok(payload)
}
