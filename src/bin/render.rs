//! CLI: render a note pattern file to a 24-bit PCM WAV file.
//!
//! Usage: render <pattern.txt> [options]

use std::env;
use std::fs;
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;

use klang::instruments::config::parse_instrument;
use klang::song::parse_pattern;
use klang::{
    Adsr, Bpm, Instrument, Player, Scale, SimpleInstrument, Song, Synth, Track, Waveform,
    render_mono,
};

const USAGE: &str = "Usage: render <pattern.txt> [options]

Render a note pattern file to a 24-bit PCM WAV file.

Options:
  -o, --output <file>       Output path (default: pattern path with .wav)
      --bpm <number>        Tempo in beats per minute (default: 120)
      --instrument <file>   Instrument description file (default: built-in saw)
      --sample-rate <hz>    Output sample rate (default: 44100)
      --seed <number>       Seed for noise oscillators (default: from entropy)
  -h, --help                Show this help

Examples:
  render lamb.txt
  render lamb.txt -o lamb.wav --bpm 240 --instrument warm-lead.ins
";

struct Args {
    pattern_path: String,
    output_path: String,
    bpm: f64,
    instrument_path: Option<String>,
    sample_rate: u32,
    seed: Option<u64>,
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut pattern_path = None;
    let mut output_path = None;
    let mut bpm = 120.0;
    let mut instrument_path = None;
    let mut sample_rate = 44100;
    let mut seed = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let mut value = |name: &str| {
            iter.next()
                .cloned()
                .with_context(|| format!("{} requires a value", name))
        };
        match arg.as_str() {
            "-o" | "--output" => output_path = Some(value(arg)?),
            "--bpm" => bpm = value(arg)?.parse().context("--bpm is not a number")?,
            "--instrument" => instrument_path = Some(value(arg)?),
            "--sample-rate" => {
                sample_rate = value(arg)?
                    .parse()
                    .context("--sample-rate is not an integer")?;
            }
            "--seed" => seed = Some(value(arg)?.parse().context("--seed is not an integer")?),
            other if other.starts_with('-') && other != "-" => {
                bail!("unknown option '{}'\n\n{}", other, USAGE);
            }
            _ if pattern_path.is_none() => pattern_path = Some(arg.clone()),
            other => bail!("unexpected argument '{}'\n\n{}", other, USAGE),
        }
    }

    let Some(pattern_path) = pattern_path else {
        bail!("missing pattern file\n\n{}", USAGE);
    };
    if !(bpm > 0.0) {
        bail!("--bpm must be positive");
    }
    let output_path = output_path.unwrap_or_else(|| match pattern_path.strip_suffix(".txt") {
        Some(stem) => format!("{}.wav", stem),
        None => format!("{}.wav", pattern_path),
    });

    Ok(Args {
        pattern_path,
        output_path,
        bpm,
        instrument_path,
        sample_rate,
        seed,
    })
}

fn load_instrument(path: Option<&str>) -> Result<Arc<dyn Instrument>> {
    match path {
        None => Ok(Arc::new(SimpleInstrument::new(
            "default saw",
            Adsr::new(0.02, 0.1, 0.7, 0.25),
            Waveform::SawSoft,
        ))),
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading instrument file {}", path))?;
            let instrument = parse_instrument(&text)
                .map_err(|errors| anyhow::anyhow!("{}: {}", path, errors))?;
            Ok(Arc::new(instrument))
        }
    }
}

fn run(args: Args) -> Result<()> {
    let text = fs::read_to_string(&args.pattern_path)
        .with_context(|| format!("reading pattern file {}", args.pattern_path))?;
    let events = parse_pattern(&text)
        .map_err(|errors| anyhow::anyhow!("{}: {}", args.pattern_path, errors))?;
    info!("parsed {} notes from {}", events.len(), args.pattern_path);

    let instrument = load_instrument(args.instrument_path.as_deref())?;
    info!("instrument: {}", instrument.name());

    let track = Track::new("melody", instrument, events);
    let song = Song::new(Bpm::new(args.bpm), vec![track]);
    let length = song.length();
    info!(
        "rendering {:.2}s at {} BPM, {} Hz",
        length, args.bpm, args.sample_rate
    );

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let scale = Scale::default();
    let mut player = Player::new();
    let mut synth = Synth::new();
    // Headroom for a handful of overlapping voices; the encoder clamps
    // anything that still peaks over full scale.
    let gain = 0.2;
    let wav = render_mono(length, args.sample_rate, |t| {
        (gain * player.step(&song, &mut synth, &scale, t, &mut rng)).clamp(-1.0, 1.0)
    });

    wav.write_to_file(&args.output_path)
        .with_context(|| format!("writing {}", args.output_path))?;
    info!(
        "wrote {} ({} frames)",
        args.output_path,
        wav.frame_count()
    );
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let raw: Vec<String> = env::args().skip(1).collect();
    if raw.iter().any(|a| a == "-h" || a == "--help") {
        println!("{}", USAGE);
        return;
    }

    let result = parse_args(&raw).and_then(run);
    if let Err(error) = result {
        eprintln!("error: {:#}", error);
        process::exit(1);
    }
}
