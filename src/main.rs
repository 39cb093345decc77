use std::env;
use std::fs;

use anyhow::{anyhow, Context, Result};

use passthrough_mapper::app::{print_planes, print_uniforms, Session};
use passthrough_mapper::Rig;

const DEFAULT_FRAMES: u32 = 3;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;
    let xml = fs::read_to_string(&options.path)
        .with_context(|| format!("failed to read rig {}", options.path))?;
    let rig = Rig::from_xml(&xml).context("failed to parse rig XML")?;

    println!("Loaded rig with {} feed(s)", rig.feeds.len());
    for feed in &rig.feeds {
        println!(" - {} (starts at frame {})", feed.eye, feed.start_frame);
    }

    let mut session = Session::new(rig);
    if let Some(err) = session.setup_error() {
        println!("Mapper inactive: {err}");
    }

    for _ in 0..options.frames {
        let frame = session.frame();
        let outcome = session.advance();
        println!("frame {frame}: {outcome}");
    }

    print_planes(&session.plane_placements());
    if let Some(uniforms) = session.shutdown() {
        print_uniforms(&uniforms);
    }
    Ok(())
}

struct CliOptions {
    path: String,
    frames: u32,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let Some(path) = args.next() else {
            return Err(anyhow!("Usage: passthrough-mapper <rig.xml> [--frames N]"));
        };
        let mut frames = DEFAULT_FRAMES;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--frames" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--frames expects a value"))?;
                    frames = value
                        .parse()
                        .with_context(|| format!("invalid frame count: {value}"))?;
                }
                other => {
                    return Err(anyhow!("Unknown argument: {other}. Expected --frames N"));
                }
            }
        }
        Ok(Self { path, frames })
    }
}
