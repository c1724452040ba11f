//! Formula sanitizer: pure screening of a single formula before it is
//! written.
//!
//! The sanitizer never touches a workbook. It normalizes the leading `=`,
//! scans for constructs that reach outside the document (network fetches,
//! hyperlinks, dynamic library calls, external workbook references), and
//! checks length and nesting ceilings. With `allow_external` unset, any
//! warning is a hard [`SecurityError`]; with it set, the warnings ride along
//! for the caller to audit-log.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Formulas longer than this are flagged (Excel's own formula length limit)
pub const MAX_FORMULA_LEN: usize = 8192;

/// Parenthesis nesting deeper than this is flagged (Excel's nesting limit)
pub const MAX_NESTING_DEPTH: usize = 64;

/// A formula the sanitizer refused to pass through
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Formula rejected: {}", warnings.join("; "))]
pub struct SecurityError {
    /// Every warning that was triggered, so callers can report all of them
    pub warnings: Vec<String>,
}

/// A formula the sanitizer passed through
#[derive(Debug, Clone, PartialEq)]
pub struct Sanitized {
    /// The formula with its leading `=` normalized
    pub formula: String,
    /// Non-blocking warnings (only non-empty when `allow_external` is set)
    pub warnings: Vec<String>,
}

/// Disallowed construct table: pattern, concern named in the warning.
static DISALLOWED: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(
                r"(?i)\b(WEBSERVICE|RTD|IMPORTXML|IMPORTDATA|IMPORTHTML|IMPORTFEED|IMPORTRANGE)\s*\(",
            )
            .expect("static pattern"),
            "network-fetch function",
        ),
        (
            Regex::new(r"(?i)\bHYPERLINK\s*\(").expect("static pattern"),
            "hyperlink function",
        ),
        (
            Regex::new(r"(?i)\b(CALL|REGISTER\.ID)\s*\(").expect("static pattern"),
            "dynamic library call",
        ),
        (
            Regex::new(r"(?i)\[[^\[\]]+\.(xlsx?|xlsm|xlsb|csv)\]").expect("static pattern"),
            "external workbook reference",
        ),
    ]
});

/// Screen one formula.
///
/// Pure: identical `(formula, allow_external)` input always yields the
/// identical result, and nothing is read or written.
pub fn sanitize_formula(
    formula: &str,
    allow_external: bool,
) -> Result<Sanitized, SecurityError> {
    let normalized = if formula.starts_with('=') {
        formula.to_string()
    } else {
        format!("={}", formula)
    };

    let mut warnings = Vec::new();

    for (pattern, concern) in DISALLOWED.iter() {
        for m in pattern.find_iter(&normalized) {
            let construct = m.as_str().trim_end_matches('(').trim_end();
            let warning = format!("disallowed {}: {}", concern, construct);
            if !warnings.contains(&warning) {
                warnings.push(warning);
            }
        }
    }

    if normalized.len() > MAX_FORMULA_LEN {
        warnings.push(format!(
            "formula length {} exceeds the {} character ceiling",
            normalized.len(),
            MAX_FORMULA_LEN
        ));
    }

    match nesting_depth(&normalized) {
        Ok(depth) if depth > MAX_NESTING_DEPTH => {
            warnings.push(format!(
                "parenthesis nesting depth {} exceeds the ceiling of {}",
                depth, MAX_NESTING_DEPTH
            ));
        }
        Ok(_) => {}
        Err(()) => {
            warnings.push("unbalanced parentheses".to_string());
        }
    }

    if !warnings.is_empty() && !allow_external {
        return Err(SecurityError { warnings });
    }

    Ok(Sanitized {
        formula: normalized,
        warnings,
    })
}

/// Maximum parenthesis nesting depth, or Err on a closer with no opener.
fn nesting_depth(formula: &str) -> Result<usize, ()> {
    let mut depth: usize = 0;
    let mut max_depth: usize = 0;
    for c in formula.chars() {
        match c {
            '(' => {
                depth += 1;
                max_depth = max_depth.max(depth);
            }
            ')' => {
                depth = depth.checked_sub(1).ok_or(())?;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(());
    }
    Ok(max_depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalizes_leading_equals() {
        let s = sanitize_formula("SUM(A1:A3)", false).unwrap();
        assert_eq!(s.formula, "=SUM(A1:A3)");
        assert!(s.warnings.is_empty());

        let s = sanitize_formula("=SUM(A1:A3)", false).unwrap();
        assert_eq!(s.formula, "=SUM(A1:A3)");
    }

    #[test]
    fn test_network_fetch_rejected_then_allowed() {
        let formula = "=WEBSERVICE(\"http://example.com\")";

        let err = sanitize_formula(formula, false).unwrap_err();
        assert_eq!(err.warnings.len(), 1);
        assert!(err.warnings[0].contains("network-fetch"));

        // Same input, opt-in: passes, but the warning still surfaces
        let s = sanitize_formula(formula, true).unwrap();
        assert_eq!(s.formula, formula);
        assert_eq!(s.warnings, err.warnings);
    }

    #[test]
    fn test_hyperlink_and_dynamic_call() {
        let err = sanitize_formula("=HYPERLINK(\"http://x\", A1)", false).unwrap_err();
        assert!(err.warnings[0].contains("hyperlink"));

        let err = sanitize_formula("=CALL(\"Kernel32\",\"GetTickCount\",\"J\")", false).unwrap_err();
        assert!(err.warnings[0].contains("dynamic library call"));
    }

    #[test]
    fn test_case_insensitive_matching() {
        assert!(sanitize_formula("=webservice(\"u\")", false).is_err());
        assert!(sanitize_formula("=WebService(\"u\")", false).is_err());
    }

    #[test]
    fn test_external_workbook_reference() {
        let err = sanitize_formula("=[Budget.xlsx]Sheet1!A1", false).unwrap_err();
        assert!(err.warnings[0].contains("external workbook"));

        // Structured table references are not external workbooks
        assert!(sanitize_formula("=SUM(Sales[Amount])", false).is_ok());
    }

    #[test]
    fn test_multiple_warnings_all_named() {
        let err = sanitize_formula(
            "=IF(WEBSERVICE(\"u\")=\"\", HYPERLINK(\"v\"), 0)",
            false,
        )
        .unwrap_err();
        assert_eq!(err.warnings.len(), 2);
        let joined = err.to_string();
        assert!(joined.contains("network-fetch"));
        assert!(joined.contains("hyperlink"));
    }

    #[test]
    fn test_repeated_match_reported_once() {
        let err = sanitize_formula("=WEBSERVICE(A1)&WEBSERVICE(A1)", false).unwrap_err();
        assert_eq!(err.warnings.len(), 1);
    }

    #[test]
    fn test_length_ceiling() {
        let long = format!("=\"{}\"", "x".repeat(MAX_FORMULA_LEN));
        let err = sanitize_formula(&long, false).unwrap_err();
        assert!(err.warnings[0].contains("length"));
    }

    #[test]
    fn test_nesting_ceiling() {
        let deep = format!("={}1{}", "(".repeat(65), ")".repeat(65));
        let err = sanitize_formula(&deep, false).unwrap_err();
        assert!(err.warnings[0].contains("nesting"));

        let ok = format!("={}1{}", "(".repeat(64), ")".repeat(64));
        assert!(sanitize_formula(&ok, false).is_ok());
    }

    #[test]
    fn test_unbalanced_parentheses() {
        let err = sanitize_formula("=SUM(A1:A3", false).unwrap_err();
        assert!(err.warnings[0].contains("unbalanced"));

        let err = sanitize_formula("=A1)", false).unwrap_err();
        assert!(err.warnings[0].contains("unbalanced"));
    }

    #[test]
    fn test_plain_formulas_pass_clean() {
        for f in ["=A1+B2", "=SUM(A1:A10)/COUNT(A1:A10)", "=IF(A1>0, 1, -1)"] {
            let s = sanitize_formula(f, false).unwrap();
            assert!(s.warnings.is_empty(), "unexpected warnings for {}", f);
        }
    }
}
