mod args;

use std::io::Write;

use anyhow::Context;
use args::Args;
use env_logger::Env;
use log::LevelFilter;
use spc2wav_core::{engine, Decoder, SpcFilter, SUMMARY_TARGET};

fn main() -> anyhow::Result<()> {
    let args = Args::parse_or_exit();
    logger(Env::default().default_filter_or("info")).init();
    log::debug!("env logger initialized");

    let output = args.output_path();
    let engine = engine::default_engine().context("cannot render without a synthesis engine")?;
    let mut decoder = Decoder::new(engine, SpcFilter::new(), args.amp);

    spc2wav_core::convert(&args.input, &output, &mut decoder)?;

    Ok(())
}

/// The run summary is always shown, whatever `RUST_LOG` asks for.
fn logger(env: Env) -> env_logger::Builder {
    let mut builder = env_logger::Builder::from_env(env);
    builder
        .format(|buf, record| {
            writeln!(buf, "{}: {}", record.level(), record.args())
        })
        .filter_module(SUMMARY_TARGET, LevelFilter::Info);
    builder
}
