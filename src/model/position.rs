//! Angular position on the zodiac circle at arc-minute resolution.
//!
//! A full circle is 360° × 60' = 21600 minute units. Positions are stored as
//! a `u16` in `[0, 21600)` and are immutable once built.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Minute units in a full circle (360°).
pub const FULL_CIRCLE: u16 = 21_600;
/// Minute units in half a circle (180°). Largest possible circular distance.
pub const HALF_CIRCLE: u16 = 10_800;
/// Minute units in one zodiac sign (30°).
pub const MINUTES_PER_SIGN: u16 = 1_800;
/// Minute units in one degree.
pub const MINUTES_PER_DEGREE: u16 = 60;

/// Sign names in zodiac order; index 0 starts at 0°.
pub const SIGN_NAMES: [&str; 12] = [
    "Aries", "Taurus", "Gemini", "Cancer", "Leo", "Virgo",
    "Libra", "Scorpio", "Sagittarius", "Capricorn", "Aquarius", "Pisces",
];

/// An absolute position in minute units, `0 <= minutes < 21600`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Position(u16);

impl Position {
    /// Build from raw minute units. Fails when `minutes >= 21600`.
    pub fn new(minutes: u16) -> Result<Self> {
        if minutes >= FULL_CIRCLE {
            return Err(Error::InvalidPosition(format!(
                "{minutes} is outside [0, {FULL_CIRCLE})"
            )));
        }
        Ok(Self(minutes))
    }

    /// Build from any integer, wrapping it onto the circle.
    pub fn wrapping(minutes: i64) -> Self {
        Self(minutes.rem_euclid(FULL_CIRCLE as i64) as u16)
    }

    /// `sign * 1800 + degree * 60 + minute`.
    ///
    /// `sign` in `[0, 11]`, `degree` in `[0, 29]`, `minute` in `[0, 59]`.
    pub fn encode(sign: u8, degree: u8, minute: u8) -> Result<Self> {
        if sign > 11 {
            return Err(Error::InvalidPosition(format!("sign index {sign} is outside [0, 11]")));
        }
        if degree > 29 {
            return Err(Error::InvalidPosition(format!("degree {degree} is outside [0, 29]")));
        }
        if minute > 59 {
            return Err(Error::InvalidPosition(format!("minute {minute} is outside [0, 59]")));
        }
        Ok(Self(
            sign as u16 * MINUTES_PER_SIGN + degree as u16 * MINUTES_PER_DEGREE + minute as u16,
        ))
    }

    pub fn minutes(self) -> u16 {
        self.0
    }

    pub fn degrees(self) -> f64 {
        self.0 as f64 / MINUTES_PER_DEGREE as f64
    }

    pub fn sign_index(self) -> u8 {
        (self.0 / MINUTES_PER_SIGN) as u8
    }

    pub fn sign_name(self) -> &'static str {
        SIGN_NAMES[self.sign_index() as usize]
    }

    /// Rotate forward by `delta` minute units, wrapping at 360°.
    pub fn rotate(self, delta: u16) -> Self {
        Self::wrapping(self.0 as i64 + delta as i64)
    }

    /// Shortest arc to `other`; see [`circular_distance`].
    pub fn distance(self, other: Position) -> u16 {
        circular_distance(self, other)
    }
}

/// Shortest arc between two positions, in minute units. Always in `[0, 10800]`.
pub fn circular_distance(p1: Position, p2: Position) -> u16 {
    let d = p1.0.abs_diff(p2.0);
    d.min(FULL_CIRCLE - d)
}

impl TryFrom<u16> for Position {
    type Error = Error;

    fn try_from(minutes: u16) -> Result<Self> {
        Self::new(minutes)
    }
}

impl From<Position> for u16 {
    fn from(p: Position) -> u16 {
        p.0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let within = self.0 % MINUTES_PER_SIGN;
        write!(
            f,
            "{} {}°{:02}'",
            self.sign_name(),
            within / MINUTES_PER_DEGREE,
            within % MINUTES_PER_DEGREE,
        )
    }
}

/// Parses `"Leo 12 30"`, `"Leo 12°30'"`, `"leo 12"` or `"Sco 3°05'"`.
impl FromStr for Position {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut tokens = s
            .split(|c: char| c.is_whitespace() || c == '°' || c == '\'')
            .filter(|t| !t.is_empty());

        let sign_token = tokens
            .next()
            .ok_or_else(|| Error::InvalidPosition("empty position".into()))?;
        let sign = sign_index(sign_token)
            .ok_or_else(|| Error::InvalidPosition(format!("unknown sign '{sign_token}'")))?;

        let degree = match tokens.next() {
            Some(t) => t
                .parse::<u8>()
                .map_err(|_| Error::InvalidPosition(format!("bad degree '{t}' in '{s}'")))?,
            None => return Err(Error::InvalidPosition(format!("missing degree in '{s}'"))),
        };
        let minute = match tokens.next() {
            Some(t) => t
                .parse::<u8>()
                .map_err(|_| Error::InvalidPosition(format!("bad minute '{t}' in '{s}'")))?,
            None => 0,
        };
        if let Some(extra) = tokens.next() {
            return Err(Error::InvalidPosition(format!("trailing '{extra}' in '{s}'")));
        }

        Self::encode(sign, degree, minute)
    }
}

/// Sign index for a full name or three-letter abbreviation, case-insensitive.
pub fn sign_index(name: &str) -> Option<u8> {
    SIGN_NAMES
        .iter()
        .position(|full| {
            full.eq_ignore_ascii_case(name)
                || (name.len() == 3 && full[..3].eq_ignore_ascii_case(name))
        })
        .map(|i| i as u8)
}

/// Unvalidated position as supplied by an entry form or data file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawPosition {
    /// Absolute minute units.
    Minutes(i64),
    /// Sign index, degree within sign, minute.
    Zodiac { sign: u8, degree: u8, minute: u8 },
    /// Text such as `"Leo 12°30'"`.
    Text(String),
}

impl RawPosition {
    pub fn resolve(&self) -> Result<Position> {
        match self {
            RawPosition::Minutes(m) => u16::try_from(*m)
                .map_err(|_| Error::InvalidPosition(format!("{m} is outside [0, {FULL_CIRCLE})")))
                .and_then(Position::new),
            RawPosition::Zodiac { sign, degree, minute } => Position::encode(*sign, *degree, *minute),
            RawPosition::Text(text) => text.parse(),
        }
    }
}
