//! # Bogen CLI
//!
//! Usage:
//!   bogen serve
//!   bogen protocol input.json -o protocol.pdf [--template form.pdf] [--calibration cal.json]
//!   bogen quote input.json -o quote.pdf
//!   bogen --example protocol > protocol.json

use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use bogen::config::ServerConfig;
use bogen::error::RenderError;
use bogen::overlay::{Calibration, LocalOrRemoteTemplate};
use bogen::ProtocolOptions;

const EXAMPLE_PROTOCOL: &str = include_str!("../demos/protocol.json");
const EXAMPLE_QUOTE: &str = include_str!("../demos/quote.json");

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();

    if let Some(i) = args.iter().position(|a| a == "--example") {
        match args.get(i + 1).map(String::as_str) {
            Some("quote") => print!("{}", EXAMPLE_QUOTE),
            _ => print!("{}", EXAMPLE_PROTOCOL),
        }
        return;
    }

    let result = match args.first().map(String::as_str) {
        Some("serve") => serve(),
        Some("protocol") => render_protocol(&args[1..]),
        Some("quote") => render_quote(&args[1..]),
        _ => {
            eprintln!("usage: bogen serve | protocol <input.json> -o <out.pdf> | quote <input.json> -o <out.pdf> | --example protocol|quote");
            std::process::exit(2);
        }
    };

    if let Err(e) = result {
        eprintln!("✗ {}", e);
        std::process::exit(1);
    }
}

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

fn serve() -> Result<(), RenderError> {
    dotenvy::dotenv().ok();
    init_logging();
    let config = ServerConfig::from_env()?;
    let calibration = config.load_calibration()?;
    actix_web::rt::System::new().block_on(bogen::server::run(config, calibration))?;
    Ok(())
}

fn render_protocol(args: &[String]) -> Result<(), RenderError> {
    init_logging();
    let input = read_input(args)?;
    let mut options = ProtocolOptions::flowed();
    if let Some(template) = flag(args, "--template") {
        options.template = Some(Box::new(LocalOrRemoteTemplate::new(PathBuf::from(template))));
    }
    if let Some(path) = flag(args, "--calibration") {
        options.calibration = Calibration::load(&PathBuf::from(path))?;
    }
    let doc = bogen::render_protocol_json(&input, options)?;
    let output = output_path(args, &doc.filename);
    write_output(&output, &doc.bytes)?;
    eprintln!(
        "✓ Written {} bytes to {} ({})",
        doc.bytes.len(),
        output,
        doc.mode.as_str()
    );
    Ok(())
}

fn render_quote(args: &[String]) -> Result<(), RenderError> {
    init_logging();
    let input = read_input(args)?;
    let doc = bogen::render_quote_json(&input)?;
    let output = output_path(args, &doc.filename);
    write_output(&output, &doc.bytes)?;
    eprintln!("✓ Written {} bytes to {}", doc.bytes.len(), output);
    Ok(())
}

/// The first positional argument, or stdin.
fn read_input(args: &[String]) -> Result<String, RenderError> {
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg.starts_with('-') {
            skip_next = true;
            continue;
        }
        log::debug!("reading input from {}", arg);
        return fs::read_to_string(arg).map_err(|e| {
            log::error!("cannot read {}", arg);
            RenderError::Io(e)
        });
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn write_output(path: &str, bytes: &[u8]) -> Result<(), RenderError> {
    fs::write(path, bytes).map_err(|e| {
        log::error!("cannot write {}", path);
        RenderError::Io(e)
    })
}

fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == name)
        .map(|w| w[1].as_str())
}

fn output_path(args: &[String], default: &str) -> String {
    flag(args, "-o").unwrap_or(default).to_string()
}
