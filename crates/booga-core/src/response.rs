//! Response selection for device reads.
//!
//! Every read answers with one of four fixed strings. The choice is driven by a single
//! random byte supplied by the caller: the low seven bits modulo four pick the variant,
//! so a uniform byte gives four equiprobable outcomes.

use crate::error::{BoogaError, Result};
use serde::{Deserialize, Serialize};

/// One of the four strings a read may produce. Each variant owns one print counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Response {
    /// `"booga! booga! "`
    Booga,
    /// `"googoo! gaagaa! "`
    Googoo,
    /// `"neka! maka! "`
    Neka,
    /// `"wooga! wooga! "`
    Wooga,
}

impl Response {
    /// All variants in report order.
    pub const ALL: [Response; 4] = [
        Response::Booga,
        Response::Googoo,
        Response::Neka,
        Response::Wooga,
    ];

    /// The exact bytes a read repeats.
    pub fn text(self) -> &'static str {
        match self {
            Response::Booga => "booga! booga! ",
            Response::Googoo => "googoo! gaagaa! ",
            Response::Neka => "neka! maka! ",
            Response::Wooga => "wooga! wooga! ",
        }
    }

    /// Short name used for counters and structured output.
    pub fn name(self) -> &'static str {
        match self {
            Response::Booga => "booga",
            Response::Googoo => "googoo",
            Response::Neka => "neka",
            Response::Wooga => "wooga",
        }
    }

    /// Position of this variant's counter in the statistics record.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Map a selector remainder to its variant.
    ///
    /// Only `0..=3` are valid. Anything else means the selector arithmetic is broken and
    /// is reported as [`BoogaError::LogicError`] rather than defaulted.
    pub fn from_remainder(remainder: u8) -> Result<Self> {
        match remainder {
            0 => Ok(Response::Booga),
            1 => Ok(Response::Googoo),
            2 => Ok(Response::Neka),
            3 => Ok(Response::Wooga),
            other => {
                tracing::error!(remainder = other, "response selector out of range");
                Err(BoogaError::LogicError(format!(
                    "selector remainder {other} has no response variant"
                )))
            }
        }
    }

    /// Pick the variant for a random byte: `(byte & 0x7F) % 4`.
    pub fn choose(random_byte: u8) -> Result<Self> {
        Self::from_remainder((random_byte & 0x7F) % 4)
    }
}

/// Selector entry point: the string to emit paired with the counter to bump.
pub fn choose(random_byte: u8) -> Result<(&'static str, Response)> {
    let response = Response::choose(random_byte)?;
    Ok((response.text(), response))
}
