//! Groundlink inspector
//!
//! Decodes captured MAVLink byte streams through the production frame decoder
//! and encodes single records for a configured link. Useful for checking
//! dictionaries, CRC_EXTRA values and signing keys against real traffic.

mod fields;
mod input;
mod render;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use groundlink_codec::{
    DecodeResult, FrameDecoder, FrameEncoder, MessageSchemaRegistry, SecretKeySafe,
};
use groundlink_config::{init_tracing_with, load_registry, GroundlinkConfig};
use groundlink_types::MessageSchema;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(name = "groundlink-inspect", author, version, about, long_about = None)]
struct Args {
    /// Link configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Extra dictionary files, added to those in the config
    #[arg(short, long = "dictionary")]
    dictionaries: Vec<PathBuf>,

    /// Log filter when RUST_LOG is unset (overrides the config)
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a capture file (or stdin) and print every frame
    Decode {
        /// Capture file; stdin when omitted
        input: Option<PathBuf>,

        /// Input is a hex dump rather than raw bytes
        #[arg(long)]
        hex: bool,

        /// Feed the decoder in chunks of this many bytes
        #[arg(long, default_value_t = 4096)]
        chunk_size: usize,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,

        /// Exit with an error if any frame was rejected
        #[arg(long)]
        strict: bool,
    },

    /// Encode one record and print the frame as hex
    Encode {
        /// Message name or numeric id
        message: String,

        /// Field assignments, e.g. custom_mode=0x20009 or text=ARMED
        #[arg(short, long = "field")]
        fields: Vec<String>,

        /// Number of frames to emit (consecutive sequence numbers)
        #[arg(long, default_value_t = 1)]
        count: usize,

        /// First sequence number
        #[arg(long, default_value_t = 0)]
        seq: u8,

        /// Write raw bytes to stdout instead of hex lines
        #[arg(long)]
        raw: bool,
    },

    /// List the messages known to the registry
    List,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => GroundlinkConfig::load(path)
            .with_context(|| format!("Failed to load configuration {:?}", path))?,
        None => GroundlinkConfig::default(),
    };
    config.link.dictionaries.extend(args.dictionaries.iter().cloned());

    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    init_tracing_with(level, args.json_logs || config.logging.json)?;

    debug!("Configuration loaded: {:?}", config);
    let registry = load_registry(&config.link)?;
    let key_safe = config.link.take_secret_key_safe()?.map(Arc::new);

    match args.command {
        Command::Decode {
            input,
            hex,
            chunk_size,
            output,
            strict,
        } => {
            let capture = input::read_capture(input.as_deref(), hex)?;
            decode(key_safe, registry, &capture, chunk_size, output, strict)
        }
        Command::Encode {
            message,
            fields,
            count,
            seq,
            raw,
        } => encode(&config, key_safe, registry, &message, &fields, count, seq, raw),
        Command::List => {
            list(&registry);
            Ok(())
        }
    }
}

fn decode(
    key_safe: Option<Arc<SecretKeySafe>>,
    registry: Arc<MessageSchemaRegistry>,
    capture: &[u8],
    chunk_size: usize,
    output: OutputFormat,
    strict: bool,
) -> Result<()> {
    if chunk_size == 0 {
        bail!("--chunk-size must be at least 1");
    }

    let mut decoder = match key_safe {
        Some(key) => FrameDecoder::with_key_safe(Arc::clone(&registry), key),
        None => FrameDecoder::new(Arc::clone(&registry)),
    };

    info!("Decoding {} bytes in {}-byte chunks", capture.len(), chunk_size);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for chunk in capture.chunks(chunk_size) {
        decoder.feed(chunk);
        for result in decoder.drain() {
            match result {
                DecodeResult::Frame { frame, record } => match output {
                    OutputFormat::Text => {
                        writeln!(out, "{}", render::frame_line(&registry, &frame, &record))?
                    }
                    OutputFormat::Json => {
                        writeln!(out, "{}", render::frame_json(&registry, &frame, &record))?
                    }
                },
                DecodeResult::Error { error, raw } => {
                    warn!(bytes = raw.len(), raw = %hex::encode(&raw), "{}", error);
                }
                DecodeResult::NeedMoreData => {}
            }
        }
    }

    if decoder.buffered() > 0 {
        warn!(bytes = decoder.buffered(), state = ?decoder.state(), "capture ends mid-frame");
    }

    let stats = decoder.stats();
    info!(
        frames = stats.frames,
        noise_bytes = stats.noise_bytes,
        checksum_errors = stats.checksum_errors,
        signature_errors = stats.signature_errors,
        unknown_ids = stats.unknown_ids,
        other_errors = stats.other_errors,
        "Decode finished"
    );

    if strict && stats.errors() > 0 {
        bail!("{} frames rejected", stats.errors());
    }
    Ok(())
}

fn resolve_message<'a>(registry: &'a MessageSchemaRegistry, message: &str) -> Result<&'a MessageSchema> {
    let found = match message.parse::<u32>() {
        Ok(id) => registry.lookup(id),
        Err(_) => registry
            .iter()
            .find(|schema| schema.name().eq_ignore_ascii_case(message)),
    };
    found.ok_or_else(|| anyhow!("Unknown message '{}'", message))
}

#[allow(clippy::too_many_arguments)]
fn encode(
    config: &GroundlinkConfig,
    key_safe: Option<Arc<SecretKeySafe>>,
    registry: Arc<MessageSchemaRegistry>,
    message: &str,
    assignments: &[String],
    count: usize,
    seq: u8,
    raw: bool,
) -> Result<()> {
    let schema = resolve_message(&registry, message)?;
    let record = fields::record_from_assignments(schema, assignments)?;

    let header_context = Arc::new(config.link.header_context().starting_at(seq));
    let mut encoder = FrameEncoder::new(
        Arc::clone(&registry),
        header_context,
        config.link.wire_version(),
    );
    if let Some(key) = key_safe {
        encoder = encoder.with_key_safe(key);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for _ in 0..count {
        let bytes = encoder
            .encode(&record)
            .with_context(|| format!("Failed to encode {}", schema.name()))?;
        if raw {
            out.write_all(&bytes)?;
        } else {
            writeln!(out, "{}", hex::encode_upper(&bytes))?;
        }
    }
    out.flush()?;

    info!(
        msg_id = schema.id(),
        name = schema.name(),
        frames = count,
        "Encode finished"
    );
    Ok(())
}

fn list(registry: &MessageSchemaRegistry) {
    for id in registry.ids() {
        if let Some(schema) = registry.lookup(id) {
            println!(
                "{:>8}  {:<24} crc_extra={:<3} len={}..{}{}",
                id,
                schema.name(),
                schema.crc_extra(),
                schema.min_length(),
                schema.max_length(),
                if schema.fits_v1() { "" } else { "  (v2 only)" }
            );
        }
    }
}
