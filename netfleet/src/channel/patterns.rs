//! Prompt pattern helpers.

use regex::bytes::Regex;

/// Build one regex that matches the prompt of any of the given patterns.
pub fn combine_patterns<'a>(patterns: impl IntoIterator<Item = &'a Regex>) -> Result<Regex, regex::Error> {
    let combined: Vec<String> = patterns
        .into_iter()
        .map(|p| format!("(?:{})", p.as_str()))
        .collect();

    if combined.is_empty() {
        return Regex::new(r"(?m)^\S{1,63}[>#$]\s?$");
    }

    Regex::new(&combined.join("|"))
}

/// Return the last prompt match in `data`.
///
/// Multi-line patterns can match a line in the middle of the output (a
/// `show running-config` banner that ends in `#`, for instance); the prompt
/// the device is actually waiting at is always the last one.
pub fn last_prompt<'d>(pattern: &Regex, data: &'d [u8]) -> Option<&'d [u8]> {
    pattern
        .find_iter(data)
        .last()
        .map(|m| &data[m.start()..m.end()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_patterns() {
        let exec = Regex::new(r"(?m)^\w+>\s?$").unwrap();
        let privileged = Regex::new(r"(?m)^\w+#\s?$").unwrap();
        let combined = combine_patterns([&exec, &privileged]).unwrap();

        assert!(combined.is_match(b"R1>"));
        assert!(combined.is_match(b"show version\nR1#"));
        assert!(!combined.is_match(b"R1 $"));
    }

    #[test]
    fn test_combine_empty_falls_back() {
        let combined = combine_patterns(std::iter::empty::<&Regex>()).unwrap();
        assert!(combined.is_match(b"switch#"));
        assert!(combined.is_match(b"user@host:~$"));
    }

    #[test]
    fn test_last_prompt() {
        let pattern = Regex::new(r"(?m)^R1[#>]\s?$").unwrap();
        let data = b"R1#\nshow clock\n*10:00:00.000 UTC\nR1>";
        assert_eq!(last_prompt(&pattern, data), Some(&b"R1>"[..]));
        assert_eq!(last_prompt(&pattern, b"no prompt here"), None);
    }
}
