//! Stdin envelope parsing.
//!
//! The host sends one JSON object per invocation on stdin. Anything that
//! does not match the expected shape is a [`crate::errors::RgError::MalformedEnvelope`];
//! the pipeline treats that as allow (exit 0), never as a reason to block.

use std::path::PathBuf;

use serde::Deserialize;

use crate::errors::{Result, RgError};

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    tool_name: String,
    tool_input: RawToolInput,
    cwd: String,
}

#[derive(Debug, Deserialize)]
struct RawToolInput {
    command: String,
}

/// A parsed, validated invocation envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// The host tool name, e.g. `"Bash"`. Only `Bash` invocations are
    /// analysed; everything else allows silently.
    pub tool_name: String,
    /// The proposed shell command line.
    pub command: String,
    /// The invocation's working directory, as reported by the host.
    pub cwd: PathBuf,
}

impl Envelope {
    /// Parse an envelope from the raw stdin bytes.
    ///
    /// # Errors
    ///
    /// Returns [`RgError::MalformedEnvelope`] on invalid JSON or a
    /// missing/wrong-typed field.
    pub fn parse(stdin: &str) -> Result<Self> {
        let raw: RawEnvelope = serde_json::from_str(stdin).map_err(|e| RgError::MalformedEnvelope {
            details: e.to_string(),
        })?;
        Ok(Self {
            tool_name: raw.tool_name,
            command: raw.tool_input.command,
            cwd: PathBuf::from(raw.cwd),
        })
    }

    /// Whether this envelope should be analysed at all. Non-`Bash` tools
    /// are allowed silently per spec's stdin contract.
    #[must_use]
    pub fn is_bash(&self) -> bool {
        self.tool_name == "Bash"
    }
}
