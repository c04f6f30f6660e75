const ORDINAL_SUFFIXES: [&str; 4] = ["st", "nd", "rd", "th"];

// Only the first whitespace-delimited token is inspected; anything that is
// not <digits><ordinal-suffix> yields unknown, never an error.
pub fn parse_grade_level(project_name: &str) -> Option<u32> {
    let token = project_name.split_whitespace().next()?;
    let digits = ORDINAL_SUFFIXES
        .iter()
        .find_map(|suffix| token.strip_suffix(suffix))?;

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_ordinal_token() {
        assert_eq!(parse_grade_level("3rd Grade Reading"), Some(3));
        assert_eq!(parse_grade_level("1st Grade Phonics"), Some(1));
        assert_eq!(parse_grade_level("2nd Grade Fiction"), Some(2));
        assert_eq!(parse_grade_level("11th Grade Essays"), Some(11));
    }

    #[test]
    fn test_only_first_token_is_inspected() {
        assert_eq!(parse_grade_level("Reading 3rd Grade"), None);
        assert_eq!(parse_grade_level("Grade 3"), None);
    }

    #[test]
    fn test_rejects_non_ordinal_tokens() {
        assert_eq!(parse_grade_level(""), None);
        assert_eq!(parse_grade_level("th Grade"), None);
        assert_eq!(parse_grade_level("first Grade"), None);
        assert_eq!(parse_grade_level("3 Grade"), None);
        assert_eq!(parse_grade_level("3rd-Grade Reading"), None);
    }
}
