//! Merge request reference parsing

use crate::error::{Error, Result};
use crate::types::MrRef;
use regex::Regex;
use std::str::FromStr;
use std::sync::LazyLock;

static PROJECT_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<project>[A-Za-z0-9_.\-]+(?:/[A-Za-z0-9_.\-]+)*)!(?P<iid>\d+)$")
        .expect("valid MR reference regex")
});

/// Parse a merge request reference
///
/// Accepted forms:
/// - `1234` - instance-wide MR id
/// - `42!7` - project id and IID
/// - `group/sub/project!7` - project path and IID
pub fn parse_mr_ref(input: &str) -> Result<MrRef> {
    let input = input.trim();

    if let Ok(id) = input.parse::<u64>() {
        return Ok(MrRef::Global(id));
    }

    let caps = PROJECT_REF
        .captures(input)
        .ok_or_else(|| Error::InvalidReference(input.to_string()))?;

    let iid = caps["iid"]
        .parse::<u64>()
        .map_err(|_| Error::InvalidReference(input.to_string()))?;

    Ok(MrRef::Project {
        project: caps["project"].to_string(),
        iid,
    })
}

impl FromStr for MrRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_mr_ref(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_id() {
        assert_eq!(parse_mr_ref("1234").unwrap(), MrRef::Global(1234));
        assert_eq!(parse_mr_ref("  99 ").unwrap(), MrRef::Global(99));
    }

    #[test]
    fn test_project_id_and_iid() {
        assert_eq!(parse_mr_ref("42!7").unwrap(), MrRef::project(42, 7));
    }

    #[test]
    fn test_nested_project_path() {
        let parsed = parse_mr_ref("platform/backend/api-gateway!311").unwrap();
        assert_eq!(
            parsed,
            MrRef::Project {
                project: "platform/backend/api-gateway".to_string(),
                iid: 311,
            }
        );
        // Display round-trips
        assert_eq!(parsed.to_string(), "platform/backend/api-gateway!311");
    }

    #[test]
    fn test_rejects_garbage() {
        for bad in ["", "!3", "group/project", "group/project!", "group!abc", "-5"] {
            match parse_mr_ref(bad) {
                Err(Error::InvalidReference(input)) => assert_eq!(input, bad.trim()),
                other => panic!("expected InvalidReference for {bad:?}, got {other:?}"),
            }
        }
    }
}
