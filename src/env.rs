/// Parse a flag value such as "1" or "no".
///
/// Returns `None` if the value is not recognized.
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" => Some(true),
        "0" | "false" | "f" | "no" | "n" => Some(false),
        _ => None,
    }
}

/// Interpret a string value such as "1" or "no" as a boolean.
///
/// Unrecognized values are reported on stderr and treated as false.
pub fn str_as_bool(s: &str) -> bool {
    parse_bool(s).unwrap_or_else(|| {
        eprintln!("Unrecognized boolean value \"{}\"", s);
        false
    })
}

/// Return whether a graph option controlled by an environment variable is
/// enabled, or `default` if the variable is not set.
pub fn env_flag(name: &str, default: bool) -> bool {
    std::env::var(name)
        .as_ref()
        .map(|s| str_as_bool(s))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use tensor_ir_testing::TestCases;

    use super::{env_flag, parse_bool, str_as_bool};

    #[test]
    fn test_parse_bool() {
        #[derive(Debug)]
        struct Case<'a> {
            value: &'a str,
            expected: Option<bool>,
        }

        let cases = [
            ("1", Some(true)),
            ("true", Some(true)),
            ("Yes", Some(true)),
            (" y ", Some(true)),
            ("0", Some(false)),
            ("FALSE", Some(false)),
            ("n", Some(false)),
            ("", None),
            ("maybe", None),
        ]
        .map(|(value, expected)| Case { value, expected });

        cases.test_each(|case| {
            assert_eq!(parse_bool(case.value), case.expected);
            assert_eq!(str_as_bool(case.value), case.expected.unwrap_or(false));
        });
    }

    #[test]
    fn test_env_flag_default() {
        assert!(env_flag("TIR_TEST_FLAG_WHICH_IS_NEVER_SET", true));
        assert!(!env_flag("TIR_TEST_FLAG_WHICH_IS_NEVER_SET", false));
    }
}
