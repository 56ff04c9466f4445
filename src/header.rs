//! Parsing of the one-line wire header every accepted connection must send.
//!
//! ```text
//! OUBLIETTE-DOWNSTREAM <project_id>
//! OUBLIETTE-UPSTREAM <session_id> <project_id> <depth>
//! ```
//!
//! Everything past the header's terminating `\n` is opaque payload and is
//! never touched here.

use crate::direction::Direction;

const DOWNSTREAM_TAG: &str = "OUBLIETTE-DOWNSTREAM";
const UPSTREAM_TAG: &str = "OUBLIETTE-UPSTREAM";

/// A successfully parsed header line.
#[derive(Debug, PartialEq, Eq)]
pub struct Header {
    pub direction: Direction,
    pub project_id: String,
}

/// Why a header line was rejected. Carries no data beyond a tag for logging;
/// the raw line itself is logged by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderError {
    /// Fewer than two whitespace-separated fields.
    TooFewFields,
    /// The leading field wasn't `OUBLIETTE-UPSTREAM` or `OUBLIETTE-DOWNSTREAM`.
    UnknownTag,
}

impl std::fmt::Display for HeaderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::TooFewFields => "header has fewer than two fields",
            Self::UnknownTag => "header tag is neither OUBLIETTE-UPSTREAM nor OUBLIETTE-DOWNSTREAM",
        })
    }
}

/// Parses one header line (without its trailing newline).
///
/// Whitespace is trimmed from both ends and runs of whitespace between
/// fields collapse, matching a plain `str::split_whitespace()`.
///
/// The upstream form normally carries `<session_id> <project_id> <depth>`
/// (project id at field index 2). A degenerate two-field upstream header is
/// tolerated: its single remaining field is treated as the project id. This
/// tolerance is preserved from the source relay rather than independently
/// re-decided.
pub fn parse(line: &str) -> Result<Header, HeaderError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 2 {
        return Err(HeaderError::TooFewFields);
    }

    match fields[0] {
        DOWNSTREAM_TAG => Ok(Header {
            direction: Direction::Downstream,
            project_id: fields[1].to_owned(),
        }),
        UPSTREAM_TAG => {
            let project_id = fields.get(2).unwrap_or(&fields[1]);
            Ok(Header {
                direction: Direction::Upstream,
                project_id: (*project_id).to_owned(),
            })
        }
        _ => Err(HeaderError::UnknownTag),
    }
}
