//! Parser for the instrument description format.
//!
//! An instrument is a list of nodes, one per line; `#` starts a comment.
//! Each node is a kind followed by positional arguments and optional
//! `key=value` properties:
//!
//! ```text
//! name "Warm Lead"
//! envelope-adsr 0.05 0.1 0.7 0.3     # attack decay sustain release
//! volume 0.8
//! saw 0.6 0 time-since-press lfo-hz=5 lfo-amp=0.02
//! sine 0.4 12 absolute-time
//! noise 0.05 0 time-since-press
//! ```
//!
//! Waveform nodes (`sine`, `square`, `triangle`, `saw`, `saw-dig`, `noise`)
//! take `<volume> <steps> <time-basis>`: a layer gain, an integer pitch
//! offset in semitones, and one of `absolute-time`, `time-since-press`,
//! `press-minus-time`. Optional properties `lfo-hz=`, `lfo-amp=` and
//! `saw-steps=` override the oscillator settings. `saw` is the warm additive
//! sawtooth, `saw-dig` the hard digital one.
//!
//! Errors are collected per node with a line/column locator; any error fails
//! the whole load — there is no partially-applied instrument.

use std::fmt;

use crate::envelopes::Adsr;
use crate::instruments::{LayeredInstrument, OscillatorLayer, TimeBasis};
use crate::oscillators::{OscillatorSettings, Waveform};

/// One problem found while loading an instrument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// 1-based line.
    pub line: usize,
    /// 1-based column of the offending token (0 for whole-line problems).
    pub column: usize,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}: {}", self.line, self.column, self.message)
    }
}

/// All errors found in one instrument load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigErrors {
    pub errors: Vec<ConfigError>,
}

impl fmt::Display for ConfigErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} instrument error(s):", self.errors.len())?;
        for error in &self.errors {
            writeln!(f, "  {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigErrors {}

/// One token with its 1-based column.
struct Token<'a> {
    text: &'a str,
    column: usize,
}

/// Splits a line into tokens, honoring double quotes in a single token.
fn tokenize(line: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_whitespace() {
            i += 1;
            continue;
        }
        let start = i;
        if bytes[i] == b'"' {
            i += 1;
            while i < bytes.len() && bytes[i] != b'"' {
                i += 1;
            }
            i = (i + 1).min(bytes.len());
        } else {
            while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
                i += 1;
            }
        }
        tokens.push(Token {
            text: &line[start..i],
            column: start + 1,
        });
    }
    tokens
}

/// Accumulates node data while errors are being collected.
#[derive(Default)]
struct Draft {
    name: Option<String>,
    envelope: Option<Adsr>,
    volume: Option<f64>,
    layers: Vec<OscillatorLayer>,
    // Node kinds seen at all, even if their arguments were bad; used to
    // avoid piling "missing node" errors on top of argument errors.
    saw_envelope_node: bool,
    saw_waveform_node: bool,
}

struct NodeContext<'a> {
    line: usize,
    tokens: &'a [Token<'a>],
    errors: &'a mut Vec<ConfigError>,
}

impl NodeContext<'_> {
    fn error(&mut self, column: usize, message: impl Into<String>) {
        self.errors.push(ConfigError {
            line: self.line,
            column,
            message: message.into(),
        });
    }

    /// Positional argument `index` (0-based, after the node kind), parsed.
    fn arg<T: std::str::FromStr>(&mut self, index: usize, what: &str) -> Option<T> {
        match self.tokens.get(index + 1) {
            None => {
                self.error(0, format!("missing {} argument", what));
                None
            }
            Some(token) => match token.text.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    self.error(
                        token.column,
                        format!("{} '{}' is not a valid value", what, token.text),
                    );
                    None
                }
            },
        }
    }
}

fn parse_time_basis(ctx: &mut NodeContext<'_>) -> Option<TimeBasis> {
    match ctx.tokens.get(3) {
        None => {
            ctx.error(0, "missing time-basis argument");
            None
        }
        Some(token) => match token.text {
            "absolute-time" => Some(TimeBasis::Absolute),
            "time-since-press" => Some(TimeBasis::SincePress),
            "press-minus-time" => Some(TimeBasis::PressMinus),
            other => {
                ctx.error(
                    token.column,
                    format!(
                        "unknown time basis '{}' (expected absolute-time, \
                         time-since-press or press-minus-time)",
                        other
                    ),
                );
                None
            }
        },
    }
}

/// Parses `key=value` properties after the positional args.
fn parse_settings(ctx: &mut NodeContext<'_>, from: usize) -> OscillatorSettings {
    let mut settings = OscillatorSettings::default();
    for token in &ctx.tokens[from.min(ctx.tokens.len())..] {
        let column = token.column;
        let Some((key, value)) = token.text.split_once('=') else {
            ctx.error(column, format!("expected key=value property, got '{}'", token.text));
            continue;
        };
        match key {
            "lfo-hz" => match value.parse() {
                Ok(v) => settings.lfo_hz = v,
                Err(_) => ctx.error(column, format!("lfo-hz '{}' is not a number", value)),
            },
            "lfo-amp" => match value.parse() {
                Ok(v) => settings.lfo_amplitude = v,
                Err(_) => ctx.error(column, format!("lfo-amp '{}' is not a number", value)),
            },
            "saw-steps" => match value.parse() {
                Ok(v) => settings.saw_soft_steps = v,
                Err(_) => ctx.error(column, format!("saw-steps '{}' is not an integer", value)),
            },
            other => ctx.error(column, format!("unknown property '{}'", other)),
        }
    }
    settings
}

fn waveform_kind(kind: &str) -> Option<Waveform> {
    match kind {
        "sine" => Some(Waveform::Sine),
        "square" => Some(Waveform::Square),
        "triangle" => Some(Waveform::Triangle),
        "saw" => Some(Waveform::SawSoft),
        "saw-dig" => Some(Waveform::SawHard),
        "noise" => Some(Waveform::Noise),
        _ => None,
    }
}

/// Parses an instrument description.
///
/// Requires an `envelope-adsr` node and at least one waveform node; `name`
/// and `volume` default to `"instrument"` and 1.0. On any error the whole
/// load fails and every problem found is reported.
pub fn parse_instrument(text: &str) -> Result<LayeredInstrument, ConfigErrors> {
    let mut draft = Draft::default();
    let mut errors = Vec::new();

    for (line_index, raw_line) in text.lines().enumerate() {
        let line = raw_line.split('#').next().unwrap_or(raw_line);
        let tokens = tokenize(line);
        let Some(kind) = tokens.first() else {
            continue;
        };

        let mut ctx = NodeContext {
            line: line_index + 1,
            tokens: &tokens,
            errors: &mut errors,
        };

        match kind.text {
            "name" => match tokens.get(1) {
                Some(token) => {
                    draft.name = Some(token.text.trim_matches('"').to_string());
                    if let Some(extra) = tokens.get(2) {
                        ctx.error(
                            extra.column,
                            format!(
                                "unexpected token '{}' after name; quote multi-word names",
                                extra.text
                            ),
                        );
                    }
                }
                None => ctx.error(0, "missing name argument"),
            },
            "envelope-adsr" => {
                draft.saw_envelope_node = true;
                // attack decay sustain release
                let attack: Option<f64> = ctx.arg(0, "attack");
                let decay: Option<f64> = ctx.arg(1, "decay");
                let sustain: Option<f64> = ctx.arg(2, "sustain");
                let release: Option<f64> = ctx.arg(3, "release");
                if let (Some(a), Some(d), Some(s), Some(r)) = (attack, decay, sustain, release) {
                    draft.envelope = Some(Adsr::new(a, d, s, r));
                }
            }
            "volume" => {
                if let Some(volume) = ctx.arg(0, "volume") {
                    draft.volume = Some(volume);
                }
            }
            other => match waveform_kind(other) {
                Some(waveform) => {
                    draft.saw_waveform_node = true;
                    let volume: Option<f64> = ctx.arg(0, "volume");
                    let steps: Option<i32> = ctx.arg(1, "steps");
                    let basis = parse_time_basis(&mut ctx);
                    let settings = parse_settings(&mut ctx, 4);
                    if let (Some(volume), Some(steps), Some(time_basis)) = (volume, steps, basis) {
                        draft.layers.push(OscillatorLayer {
                            waveform,
                            volume,
                            steps,
                            time_basis,
                            settings,
                        });
                    }
                }
                None => ctx.error(kind.column, format!("unknown node kind '{}'", other)),
            },
        }
    }

    if !draft.saw_envelope_node {
        errors.push(ConfigError {
            line: 0,
            column: 0,
            message: "instrument has no envelope-adsr node".to_string(),
        });
    }
    if !draft.saw_waveform_node {
        errors.push(ConfigError {
            line: 0,
            column: 0,
            message: "instrument has no waveform nodes".to_string(),
        });
    }

    let envelope = match draft.envelope {
        Some(envelope) if errors.is_empty() => envelope,
        _ => return Err(ConfigErrors { errors }),
    };
    Ok(LayeredInstrument::new(
        draft.name.unwrap_or_else(|| "instrument".to_string()),
        envelope,
        draft.volume.unwrap_or(1.0),
        draft.layers,
    ))
}
