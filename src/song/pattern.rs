//! Parser for the note pattern text format.
//!
//! A pattern is whitespace-separated tokens; a token beginning with `#`
//! starts a comment running to the end of the line. A `#` inside a token is
//! a sharp accidental, not a comment. The parser keeps a beat cursor and a
//! step length (initially 1 beat) and walks the tokens left to right:
//!
//! - **Note**: pitch letter `A`-`G`, optional `#` or `b`, optional octave
//!   digit (default octave 2, the scale reference octave). Emits an event at
//!   the cursor and advances the cursor one step. By default the note sounds
//!   for 80% of the step, leaving a 20% gap before the next one; a trailing
//!   `~` makes it legato (sounds the full step).
//! - **`-`**: rest; advances the cursor one step without emitting anything.
//! - **`/x`**: sets the step length to `x` beats from here on. May stand
//!   alone (`/0.5`) or follow a note in the same token (`C#3/0.5`, applying
//!   to that note's step already).
//!
//! Semitones are counted from A2 (semitone 0), so `C` is 3 and `C4` is 27.
//!
//! Errors are collected, not fail-fast: every bad token in the pattern is
//! reported together, and any error fails the whole parse.
//!
//! # Examples
//!
//! ```
//! use klang::song::parse_pattern;
//!
//! // Mary had a little lamb, opening
//! let events = parse_pattern("E D C D E E E~").unwrap();
//! assert_eq!(events.len(), 7);
//! assert_eq!(events[0].semitone, 7); // E above A2
//! assert_eq!(events[6].length_beat, 1.0); // legato final note
//! ```

use std::fmt;

use crate::song::NoteEvent;

/// Fraction of a step a non-legato note sounds; the rest is gap.
const GATE: f64 = 0.8;

/// The scale octave a bare pitch letter lands in.
const DEFAULT_OCTAVE: i32 = 2;

/// One offending token with its position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenError {
    /// 1-based line of the token.
    pub line: usize,
    /// 1-based column of the token's first character.
    pub column: usize,
    /// The token text as written.
    pub token: String,
    pub message: String,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}, column {}: '{}': {}",
            self.line, self.column, self.token, self.message
        )
    }
}

/// All parse errors found in one pass over a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternError {
    pub errors: Vec<TokenError>,
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} pattern error(s):", self.errors.len())?;
        for error in &self.errors {
            writeln!(f, "  {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for PatternError {}

/// Semitone offset from A for a pitch letter, or None for a non-pitch char.
fn letter_semitone(letter: char) -> Option<i32> {
    match letter.to_ascii_uppercase() {
        'A' => Some(0),
        'B' => Some(2),
        'C' => Some(3),
        'D' => Some(5),
        'E' => Some(7),
        'F' => Some(8),
        'G' => Some(10),
        _ => None,
    }
}

/// What one token contributes to the walk.
struct ParsedToken {
    semitone: Option<i32>,
    legato: bool,
    rest: bool,
    new_step: Option<f64>,
}

fn parse_token(token: &str) -> Result<ParsedToken, String> {
    let mut parsed = ParsedToken {
        semitone: None,
        legato: false,
        rest: false,
        new_step: None,
    };

    // Split off a step directive suffix, if any
    let (head, directive) = match token.split_once('/') {
        Some((head, rest)) => (head, Some(rest)),
        None => (token, None),
    };
    if let Some(rest) = directive {
        let step: f64 = rest
            .parse()
            .map_err(|_| format!("step length '{}' is not a number", rest))?;
        if !(step > 0.0) {
            return Err(format!("step length {} must be positive", step));
        }
        parsed.new_step = Some(step);
    }

    if head.is_empty() {
        if parsed.new_step.is_none() {
            return Err("empty token".to_string());
        }
        return Ok(parsed); // bare directive like "/0.5"
    }
    if head == "-" {
        parsed.rest = true;
        return Ok(parsed);
    }

    let mut chars = head.chars().peekable();
    let letter = chars.next().ok_or("empty token")?;
    let mut semitone =
        letter_semitone(letter).ok_or_else(|| format!("'{}' is not a pitch A-G", letter))?;

    if let Some(&accidental) = chars.peek() {
        match accidental {
            '#' => {
                semitone += 1;
                chars.next();
            }
            'b' => {
                semitone -= 1;
                chars.next();
            }
            _ => {}
        }
    }

    let mut octave = DEFAULT_OCTAVE;
    if let Some(&digit) = chars.peek() {
        if let Some(o) = digit.to_digit(10) {
            octave = o as i32;
            chars.next();
        }
    }

    if let Some(&tie) = chars.peek() {
        if tie == '~' {
            parsed.legato = true;
            chars.next();
        }
    }

    if let Some(trailing) = chars.next() {
        return Err(format!("unexpected character '{}'", trailing));
    }

    parsed.semitone = Some(semitone + (octave - DEFAULT_OCTAVE) * 12);
    Ok(parsed)
}

/// Parses pattern text into note events.
///
/// All errors found are returned together; a pattern with any bad token
/// yields no events.
pub fn parse_pattern(text: &str) -> Result<Vec<NoteEvent>, PatternError> {
    let mut events = Vec::new();
    let mut errors = Vec::new();

    let mut cursor = 0.0f64;
    let mut step = 1.0f64;

    for (line_index, line) in text.lines().enumerate() {
        let mut rest = line;
        let mut consumed = 0usize;
        while let Some(start) = rest.find(|c: char| !c.is_whitespace()) {
            let after = &rest[start..];
            let end = after
                .find(char::is_whitespace)
                .unwrap_or(after.len());
            let token = &after[..end];
            let column = consumed + start + 1;

            // Comment to end of line. Only at token start: a '#' inside a
            // token is a sharp.
            if token.starts_with('#') {
                break;
            }

            match parse_token(token) {
                Ok(parsed) => {
                    if let Some(new_step) = parsed.new_step {
                        step = new_step;
                    }
                    if let Some(semitone) = parsed.semitone {
                        let length = if parsed.legato { step } else { step * GATE };
                        events.push(NoteEvent::new(cursor, length, semitone));
                        cursor += step;
                    } else if parsed.rest {
                        cursor += step;
                    }
                }
                Err(message) => errors.push(TokenError {
                    line: line_index + 1,
                    column,
                    token: token.to_string(),
                    message,
                }),
            }

            consumed += start + end;
            rest = &rest[start + end..];
        }
    }

    if errors.is_empty() {
        Ok(events)
    } else {
        Err(PatternError { errors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_note() {
        let events = parse_pattern("A").unwrap();
        assert_eq!(events, vec![NoteEvent::new(0.0, 0.8, 0)]);
    }

    #[test]
    fn test_pitch_letters_and_accidentals() {
        let events = parse_pattern("A A# Bb C C#").unwrap();
        let semitones: Vec<i32> = events.iter().map(|e| e.semitone).collect();
        assert_eq!(semitones, vec![0, 1, 1, 3, 4]);
    }

    #[test]
    fn test_octave_digits() {
        let events = parse_pattern("A2 A3 C4 A1").unwrap();
        let semitones: Vec<i32> = events.iter().map(|e| e.semitone).collect();
        assert_eq!(semitones, vec![0, 12, 27, -12]);
    }

    #[test]
    fn test_rest_advances_time() {
        let events = parse_pattern("A - A").unwrap();
        assert_eq!(events[0].start_beat, 0.0);
        assert_eq!(events[1].start_beat, 2.0);
    }

    #[test]
    fn test_default_gate_leaves_gap() {
        let events = parse_pattern("A A").unwrap();
        assert_eq!(events[0].length_beat, 0.8);
        assert!(events[0].end_beat() < events[1].start_beat);
    }

    #[test]
    fn test_legato_fills_step() {
        let events = parse_pattern("A~ A").unwrap();
        assert_eq!(events[0].length_beat, 1.0);
        assert_eq!(events[0].end_beat(), events[1].start_beat);
    }

    #[test]
    fn test_step_directive_standalone_and_suffix() {
        let events = parse_pattern("A /0.5 A A C/2 D").unwrap();
        // A at 0 (step 1), then step 0.5: A at 1.0, A at 1.5,
        // then C/2 switches to 2-beat steps for itself: C at 2.0, D at 4.0
        let starts: Vec<f64> = events.iter().map(|e| e.start_beat).collect();
        assert_eq!(starts, vec![0.0, 1.0, 1.5, 2.0, 4.0]);
        assert_eq!(events[3].length_beat, 2.0 * 0.8);
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let text = "# a comment line\nA B # trailing comment with C D\n\nE";
        let events = parse_pattern(text).unwrap();
        assert_eq!(events.len(), 3);
        let semitones: Vec<i32> = events.iter().map(|e| e.semitone).collect();
        assert_eq!(semitones, vec![0, 2, 7]);
    }

    #[test]
    fn test_sharps_are_not_comments() {
        // '#' only opens a comment at the start of a token
        let events = parse_pattern("C# G#3 # sharp comment C#\n  # indented comment\nD#").unwrap();
        let semitones: Vec<i32> = events.iter().map(|e| e.semitone).collect();
        assert_eq!(semitones, vec![4, 23, 6]);
    }

    #[test]
    fn test_errors_are_collected_not_fail_fast() {
        let err = parse_pattern("A X B 4z C").unwrap_err();
        assert_eq!(err.errors.len(), 2);
        assert_eq!(err.errors[0].token, "X");
        assert_eq!(err.errors[1].token, "4z");
    }

    #[test]
    fn test_error_positions() {
        let err = parse_pattern("A B\n  Q C").unwrap_err();
        assert_eq!(err.errors.len(), 1);
        assert_eq!(err.errors[0].line, 2);
        assert_eq!(err.errors[0].column, 3);
    }

    #[test]
    fn test_bad_step_directive() {
        assert!(parse_pattern("/abc").is_err());
        assert!(parse_pattern("/0").is_err());
        assert!(parse_pattern("/-1").is_err());
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        let err = parse_pattern("A#3~x").unwrap_err();
        assert_eq!(err.errors.len(), 1);
    }

    #[test]
    fn test_empty_pattern_is_ok() {
        assert_eq!(parse_pattern("").unwrap(), vec![]);
        assert_eq!(parse_pattern("# only comments\n").unwrap(), vec![]);
    }
}
