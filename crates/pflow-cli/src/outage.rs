//! Outages given on the command line.
//!
//! Element ids follow the native readers, which store circuit and machine
//! ids as two characters, left-justified (`"1 "`). A bare `1` on the command
//! line is padded to match.

use std::str::FromStr;

use thiserror::Error;

/// Default id when none is given.
const DEFAULT_ID: &str = "1";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OutageParseError {
    #[error("expected {expected}, got '{input}'")]
    Shape {
        expected: &'static str,
        input: String,
    },
    #[error("invalid bus number '{0}'")]
    Bus(String),
}

/// A line to take out of service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineOutage {
    pub from_bus: i32,
    pub to_bus: i32,
    pub id: String,
}

/// A generator to take out of service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenOutage {
    pub bus: i32,
    pub id: String,
}

impl FromStr for LineOutage {
    type Err = OutageParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        let (from, to, id) = match parts.as_slice() {
            [from, to] => (*from, *to, DEFAULT_ID),
            [from, to, id] => (*from, *to, *id),
            _ => {
                return Err(OutageParseError::Shape {
                    expected: "FROM:TO[:ID]",
                    input: s.to_string(),
                })
            }
        };
        Ok(LineOutage {
            from_bus: parse_bus(from)?,
            to_bus: parse_bus(to)?,
            id: native_id(id),
        })
    }
}

impl FromStr for GenOutage {
    type Err = OutageParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        let (bus, id) = match parts.as_slice() {
            [bus] => (*bus, DEFAULT_ID),
            [bus, id] => (*bus, *id),
            _ => {
                return Err(OutageParseError::Shape {
                    expected: "BUS[:ID]",
                    input: s.to_string(),
                })
            }
        };
        Ok(GenOutage {
            bus: parse_bus(bus)?,
            id: native_id(id),
        })
    }
}

impl std::fmt::Display for LineOutage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{} ({})", self.from_bus, self.to_bus, self.id.trim_end())
    }
}

impl std::fmt::Display for GenOutage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.bus, self.id.trim_end())
    }
}

fn parse_bus(s: &str) -> Result<i32, OutageParseError> {
    s.trim()
        .parse::<i32>()
        .ok()
        .filter(|bus| *bus >= 0)
        .ok_or_else(|| OutageParseError::Bus(s.to_string()))
}

fn native_id(id: &str) -> String {
    format!("{:<2}", id.trim())
}
