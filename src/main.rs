//! Purpose: `qtag` CLI entry point for inspecting tags and query strings.
//! Role: Binary crate root; parses args, runs commands, emits JSON on stdout.
//! Invariants: Successful commands print exactly one JSON document on stdout.
//! Invariants: Errors are emitted as a JSON envelope on stderr.
//! Invariants: Decode failures exit with `qtag::to_exit_code`; other failures use sysexits codes.
use std::net::SocketAddr;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use url::Url;

use qtag::{Error, ErrorEnvelope, ParamMap, parse_tag, to_exit_code};

mod paging;
mod serve;

use paging::Paging;
use serve::{ServeConfig, ServeError};

const EXIT_USAGE: u8 = 64;
const EXIT_IO: u8 = 74;

#[derive(Parser, Debug)]
#[command(
    name = "qtag",
    version,
    about = "Inspect qt field tags, parse query strings, and try the decoder"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a raw `qt` tag and print the resulting directive.
    Tag {
        /// Tag text, e.g. "limit,default=10".
        raw: String,
    },
    /// Parse a query string or absolute URL and print its parameters.
    Params {
        /// Query string (leading `?` optional) or absolute URL.
        input: String,
        /// Print only the first value per key.
        #[arg(long)]
        first: bool,
    },
    /// Decode a query string into the demo `Paging` record.
    Decode {
        /// Query string (leading `?` optional) or absolute URL.
        input: String,
    },
    /// Run the demo HTTP server exposing `/v0/echo`.
    Serve {
        #[arg(long, default_value = "127.0.0.1:9710")]
        bind: SocketAddr,
        #[arg(long, help = "Allow binding to a non-loopback address")]
        allow_non_loopback: bool,
    },
}

enum Failure {
    Decode(Error),
    Serve(ServeError),
    Runtime(std::io::Error),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            let (value, code) = failure_json(&failure);
            emit_error(&value);
            ExitCode::from(code)
        }
    }
}

fn run(command: Command) -> Result<(), Failure> {
    match command {
        Command::Tag { raw } => {
            emit(&json!({ "tag": raw, "directive": parse_tag(&raw) }));
            Ok(())
        }
        Command::Params { input, first } => {
            let params = params_from_input(&input);
            if first {
                let firsts: serde_json::Map<String, Value> = params
                    .iter()
                    .filter_map(|(key, values)| {
                        values
                            .first()
                            .map(|value| (key.to_string(), Value::from(value.as_str())))
                    })
                    .collect();
                emit(&Value::Object(firsts));
            } else {
                emit(&json!(params));
            }
            Ok(())
        }
        Command::Decode { input } => {
            let params = params_from_input(&input);
            let mut paging = Paging::default();
            qtag::decode(&params, &mut paging).map_err(Failure::Decode)?;
            emit(&json!({ "paging": paging }));
            Ok(())
        }
        Command::Serve {
            bind,
            allow_non_loopback,
        } => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .map_err(Failure::Runtime)?;
            runtime
                .block_on(serve::serve(ServeConfig {
                    bind,
                    allow_non_loopback,
                }))
                .map_err(Failure::Serve)
        }
    }
}

// Absolute URLs contribute their query; anything else is treated as a bare query.
fn params_from_input(input: &str) -> ParamMap {
    match Url::parse(input) {
        Ok(url) if url.has_host() => ParamMap::from_url(&url),
        _ => ParamMap::parse(input),
    }
}

fn failure_json(failure: &Failure) -> (Value, u8) {
    match failure {
        Failure::Decode(err) => {
            let code = u8::try_from(to_exit_code(err.kind())).unwrap_or(1);
            (json!(ErrorEnvelope::from_error(err)), code)
        }
        Failure::Serve(err) => {
            let mut body = json!({
                "kind": if err.is_usage() { "Usage" } else { "Io" },
                "message": err.to_string(),
            });
            if let Some(hint) = err.hint() {
                body["hint"] = json!(hint);
            }
            let code = if err.is_usage() { EXIT_USAGE } else { EXIT_IO };
            (json!({ "error": body }), code)
        }
        Failure::Runtime(err) => (
            json!({ "error": { "kind": "Io", "message": format!("failed to start runtime: {err}") } }),
            EXIT_IO,
        ),
    }
}

fn emit(value: &Value) {
    println!("{value}");
}

fn emit_error(value: &Value) {
    let json = serde_json::to_string(value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}
