use regex::Regex;

use crate::error::CreateError;

/// Name grammar for `spawn`'s `name` argument. Distinct from `path::validate_segment`
/// (which also accepts the wider set a resolved path segment may already contain);
/// a *new* child name is restricted to the stricter, no-slashes-no-wildcards set.
pub fn validate_name(name: &str) -> Result<(), CreateError> {
    let rgx = Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
    if rgx.is_match(name) {
        Ok(())
    } else {
        Err(CreateError::InvalidName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_alnum_dash_underscore() {
        assert!(validate_name("worker-1").is_ok());
        assert!(validate_name("worker_1").is_ok());
        assert!(validate_name("Worker1").is_ok());
    }

    #[test]
    fn rejects_slashes_and_empty() {
        assert!(validate_name("a/b").is_err());
        assert!(validate_name("").is_err());
        assert!(validate_name("a b").is_err());
    }
}
