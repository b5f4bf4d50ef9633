//! Response line classification.
//!
//! Every server line is one of three shapes: a continuation request (`+`),
//! an untagged data line (`*`), or a tagged completion line beginning with
//! the client's request tag. This client uses a fixed literal tag for every
//! command, so a tagged line always begins `". "`.

/// The fixed literal request tag used on every command.
///
/// A single tag precludes pipelining; the session engine is strictly
/// half-duplex, one command in flight at a time, so no correlation by tag
/// is ever needed.
pub const TAG: &str = ".";

/// Status token of a tagged (or greeting) response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Command completed successfully.
    Ok,
    /// Command failed (business-level refusal).
    No,
    /// Command was malformed or rejected.
    Bad,
    /// Server is disconnecting.
    Bye,
}

impl Status {
    fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_uppercase().as_str() {
            "OK" => Some(Self::Ok),
            "NO" => Some(Self::No),
            "BAD" => Some(Self::Bad),
            "BYE" => Some(Self::Bye),
            _ => None,
        }
    }
}

/// One classified response line. Transient; raw text lives with the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseLine {
    /// `+ ...`: the server wants more client input mid-command.
    Continuation,
    /// `* ...`: informational or data payload, not bound to one command.
    Untagged(String),
    /// `. <status> ...`: command completion.
    Tagged {
        /// Completion status.
        status: Status,
        /// Human-readable text after the status token.
        detail: String,
    },
    /// Anything else, e.g. a raw body line inside a FETCH payload.
    Other,
}

/// Classifies one response line (terminator already irrelevant; the line is
/// matched on its trimmed prefix).
#[must_use]
pub fn classify(line: &str) -> ResponseLine {
    let trimmed = line.trim_end();

    if trimmed.starts_with('+') {
        return ResponseLine::Continuation;
    }
    if let Some(payload) = trimmed.strip_prefix('*') {
        return ResponseLine::Untagged(payload.trim_start().to_string());
    }
    if let Some(rest) = trimmed.strip_prefix(TAG)
        && rest.starts_with(' ')
    {
        let rest = rest.trim_start();
        let (token, detail) = rest.split_once(' ').unwrap_or((rest, ""));
        if let Some(status) = Status::parse(token) {
            return ResponseLine::Tagged {
                status,
                detail: detail.to_string(),
            };
        }
    }
    ResponseLine::Other
}

/// Extracts the numeric token immediately *before* `keyword`, as in
/// `* 5 EXISTS`. Surrounding brackets are stripped from both tokens.
#[must_use]
pub fn count_before(line: &str, keyword: &str) -> Option<u32> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let idx = tokens
        .iter()
        .position(|t| t.trim_matches(['[', ']']) == keyword)?;
    tokens
        .get(idx.checked_sub(1)?)?
        .trim_matches(['[', ']'])
        .parse()
        .ok()
}

/// Extracts the numeric token immediately *after* `keyword`, as in
/// `* OK [UNSEEN 12] Message 12 is first unseen`.
#[must_use]
pub fn count_after(line: &str, keyword: &str) -> Option<u32> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let idx = tokens
        .iter()
        .position(|t| t.trim_matches(['[', ']']) == keyword)?;
    tokens.get(idx + 1)?.trim_matches(['[', ']']).parse().ok()
}

/// Extracts capability tokens from an untagged `* CAPABILITY ...` line.
/// Returns `None` if the line is not a capability line.
#[must_use]
pub fn capability_tokens(line: &str) -> Option<Vec<String>> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let idx = tokens
        .iter()
        .position(|t| t.eq_ignore_ascii_case("CAPABILITY"))?;
    Some(tokens[idx + 1..].iter().map(ToString::to_string).collect())
}
