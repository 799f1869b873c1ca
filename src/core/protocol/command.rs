// src/core/protocol/command.rs

//! Parsing of request lines into typed commands.
//!
//! Grammar, with whitespace-separated tokens and case-insensitive keywords:
//!
//! ```text
//! READ  <AREA> <BYTE> <BIT>
//! WRITE <AREA> <BYTE> <BIT> <VALUE>
//! ```

use crate::core::BridgeError;
use crate::core::address::{Address, Area};
use std::fmt;

/// A parsed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Read(Address),
    Write(Address, bool),
}

impl Command {
    /// Returns the action keyword, for logging and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Read(_) => "READ",
            Command::Write(..) => "WRITE",
        }
    }

    pub fn address(&self) -> &Address {
        match self {
            Command::Read(address) | Command::Write(address, _) => address,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Read(address) => write!(f, "READ {address}"),
            Command::Write(address, value) => write!(f, "WRITE {address} = {}", u8::from(*value)),
        }
    }
}

/// `1` and any casing of `TRUE` are true. Every other token is false.
fn parse_value(token: &str) -> bool {
    token == "1" || token.eq_ignore_ascii_case("TRUE")
}

impl TryFrom<&str> for Command {
    type Error = BridgeError;

    fn try_from(line: &str) -> Result<Self, Self::Error> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let [action, area, byte, bit, rest @ ..] = parts.as_slice() else {
            return Err(BridgeError::InvalidFormat);
        };

        let action = action.to_ascii_uppercase();
        let value = match (action.as_str(), rest.first()) {
            ("READ", _) => None,
            ("WRITE", Some(token)) => Some(parse_value(token)),
            _ => return Err(BridgeError::UnknownCommand),
        };

        let address = Address::new(Area::parse(area), byte.parse()?, bit.parse()?);
        Ok(match value {
            None => Command::Read(address),
            Some(value) => Command::Write(address, value),
        })
    }
}
