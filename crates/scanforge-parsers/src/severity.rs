//! Severity normalization (spec §4.5: "Unknown severities default to Info
//! and must not cause parse failure").

use scanforge_core::Severity;

/// Normalize a tool-reported severity/confidence string. Case-insensitive;
/// anything not recognized maps to `Info` rather than failing the parse.
pub fn normalize(raw: &str) -> Severity {
    match raw.trim().to_ascii_uppercase().as_str() {
        "HIGH" | "ERROR" | "CRITICAL" | "H" => Severity::High,
        "MEDIUM" | "WARNING" | "MODERATE" | "M" => Severity::Medium,
        "LOW" | "L" => Severity::Low,
        _ => Severity::Info,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_common_tool_vocabularies() {
        assert_eq!(normalize("HIGH"), Severity::High);
        assert_eq!(normalize("error"), Severity::High);
        assert_eq!(normalize("Medium"), Severity::Medium);
        assert_eq!(normalize("warning"), Severity::Medium);
        assert_eq!(normalize("low"), Severity::Low);
    }

    #[test]
    fn unrecognized_strings_default_to_info_without_failing() {
        assert_eq!(normalize("UNKNOWN"), Severity::Info);
        assert_eq!(normalize(""), Severity::Info);
        assert_eq!(normalize("Weak"), Severity::Info);
    }
}
