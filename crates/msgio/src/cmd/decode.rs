use std::io::Read;

use msgio_frame::{ArrayMessage, MessageReader, ScalarMessage, Uint16Message, Uint32Message};
use tracing::debug;

use crate::cmd::{DecodeArgs, MessageKind};
use crate::exit::{frame_error, io_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{print_messages, Decoded, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let mut input = Vec::new();
    std::io::stdin()
        .read_to_end(&mut input)
        .map_err(|err| io_error("failed reading stdin", err))?;

    let messages = decode(&input, &args)?;
    debug!(
        bytes = input.len(),
        messages = messages.len(),
        chunk_size = args.chunk_size,
        "input decoded"
    );

    print_messages(&messages, format);
    Ok(SUCCESS)
}

/// Decode every message in `input`, feeding the reader `chunk_size` bytes at a time.
pub fn decode(input: &[u8], args: &DecodeArgs) -> CliResult<Vec<Decoded>> {
    if args.chunk_size == 0 {
        return Err(CliError::new(USAGE, "--chunk-size must be greater than zero"));
    }

    let mut messages = Vec::new();
    match args.kind {
        MessageKind::Array => {
            let max_size = u16::try_from(args.max_size).map_err(|_| {
                CliError::new(USAGE, "--max-size for arrays must fit in 16 bits")
            })?;
            let mut reader = ArrayMessage::with_max_size(max_size);
            read_chunks(&mut reader, input, args.chunk_size, |msg| {
                if let Some(view) = msg.value() {
                    messages.push(Decoded::Array {
                        items: view.to_vec(),
                        zero_copy: view.is_zero_copy(),
                    });
                }
            })?;
        }
        MessageKind::Scalar => {
            let mut reader = ScalarMessage::with_max_size(args.max_size);
            read_chunks(&mut reader, input, args.chunk_size, |msg| {
                if let Some(view) = msg.value() {
                    messages.push(Decoded::Scalar {
                        data: view.to_vec(),
                        zero_copy: view.is_zero_copy(),
                    });
                }
            })?;
        }
        MessageKind::U16 => {
            let mut reader = Uint16Message::new();
            read_chunks(&mut reader, input, args.chunk_size, |msg| {
                messages.push(Decoded::Integer(u32::from(msg.value())));
            })?;
        }
        MessageKind::U32 => {
            let mut reader = Uint32Message::new();
            read_chunks(&mut reader, input, args.chunk_size, |msg| {
                messages.push(Decoded::Integer(msg.value()));
            })?;
        }
    }
    Ok(messages)
}

/// Feed `input` through `reader` chunk by chunk, handing each completed
/// message to `on_message`. Input that ends inside a message is an error.
fn read_chunks<'a, R, F>(
    reader: &mut R,
    input: &'a [u8],
    chunk_size: usize,
    mut on_message: F,
) -> CliResult<()>
where
    R: MessageReader<'a>,
    F: FnMut(&R),
{
    let mut pending = 0usize;

    for chunk in input.chunks(chunk_size) {
        let mut rest = chunk;
        while !rest.is_empty() {
            let used = reader.feed(rest);
            rest = &rest[used..];
            pending += used;

            if !reader.done() {
                break;
            }
            if let Some(err) = reader.error() {
                return Err(frame_error("decode failed", err.into()));
            }
            on_message(reader);
            reader.reset();
            pending = 0;
        }
    }

    if pending > 0 {
        return Err(CliError::new(
            DATA_INVALID,
            format!("decode failed: input ended {pending} bytes into an incomplete message"),
        ));
    }
    Ok(())
}
