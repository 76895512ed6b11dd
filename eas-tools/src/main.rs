use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use eas_codec::{format_schema, parse_schema, schema_uid, Address, Codec};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;

#[derive(Parser)]
#[command(
    name = "eas-tools",
    about = "Utility commands for attestation schemas and payloads"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect schema strings.
    #[command(subcommand)]
    Schema(SchemaCommands),
    /// Decode a hex payload against a schema and print its fields as JSON.
    Decode(DecodeArgs),
}

#[derive(Subcommand)]
enum SchemaCommands {
    /// Parse a schema and print its canonical form.
    Canonical { schema: String },
    /// Print the registry UID of a schema.
    Uid(UidArgs),
}

#[derive(Args)]
struct UidArgs {
    schema: String,
    /// Resolver contract address (defaults to the zero address).
    #[arg(long)]
    resolver: Option<String>,
    /// Whether attestations under the schema can be revoked.
    #[arg(long)]
    revocable: bool,
}

#[derive(Args)]
struct DecodeArgs {
    /// Schema declaration the payload was encoded under.
    #[arg(long)]
    schema: String,
    /// ABI-encoded payload, optionally `0x`-prefixed.
    payload: String,
    /// Reject payloads that are not canonically encoded.
    #[arg(long)]
    strict: bool,
    /// Reject payloads larger than this many bytes.
    #[arg(long)]
    max_payload_len: Option<usize>,
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Schema(SchemaCommands::Canonical { schema }) => canonical(&schema),
        Commands::Schema(SchemaCommands::Uid(args)) => uid(args),
        Commands::Decode(args) => decode(args),
    }
}

fn canonical(schema: &str) -> Result<()> {
    let declarations = parse_schema(schema).context("failed to parse schema")?;
    println!("{}", format_schema(&declarations));
    Ok(())
}

fn uid(args: UidArgs) -> Result<()> {
    let resolver = match args.resolver.as_deref() {
        Some(text) => parse_address(text)?,
        None => Address::zero(),
    };
    // The registry hashes the schema text exactly as submitted.
    let uid = schema_uid(&args.schema, resolver, args.revocable);
    println!("{uid}");
    Ok(())
}

fn decode(args: DecodeArgs) -> Result<()> {
    let mut config = config::from_env()?;
    if args.strict {
        config.strict_decoding = true;
    }
    if let Some(len) = args.max_payload_len {
        config.max_payload_len = Some(len);
    }
    debug!(?config, "decoding payload");

    let data = parse_hex(&args.payload).context("payload is not valid hex")?;
    let fields = Codec::new(config)
        .decode_fields(&data, &args.schema)
        .context("failed to decode payload")?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&fields)?
    } else {
        serde_json::to_string(&fields)?
    };
    println!("{json}");
    Ok(())
}

fn parse_hex(text: &str) -> Result<Vec<u8>> {
    let text = text.trim();
    Ok(hex::decode(text.strip_prefix("0x").unwrap_or(text))?)
}

fn parse_address(text: &str) -> Result<Address> {
    let bytes = parse_hex(text).with_context(|| format!("invalid address {text}"))?;
    if bytes.len() != 20 {
        bail!("address must be 20 bytes, got {}", bytes.len());
    }
    Ok(Address::from_slice(&bytes))
}
