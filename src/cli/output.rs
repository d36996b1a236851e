//! Handles all user-facing output for the CLI.
//!
//! Outcomes go to stdout as JSON; diagnostics and logs go to stderr.

use miette::{LabeledSpan, MietteDiagnostic, NamedSource, Report};

use crate::engine::ParseOutcome;

/// Prints an outcome as JSON.
pub fn print_outcome(outcome: &ParseOutcome, pretty: bool) {
    let rendered = if pretty {
        serde_json::to_string_pretty(outcome)
    } else {
        serde_json::to_string(outcome)
    };
    match rendered {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("cannot render outcome: {e}"),
    }
}

/// Renders a miette diagnostic showing where a rule stopped matching.
pub fn report_mismatch(source_name: &str, input: &str, rule: &str, outcome: &ParseOutcome) {
    let at = outcome.position.min(input.len());
    let (message, label) = if outcome.success {
        (
            format!("rule '{rule}' matched only part of the input"),
            "unconsumed input starts here",
        )
    } else {
        (format!("rule '{rule}' did not match"), "matching stopped here")
    };
    let diagnostic = MietteDiagnostic::new(message)
        .with_code("parsegraph::mismatch")
        .with_label(LabeledSpan::at(at..at, label));
    let report =
        Report::new(diagnostic).with_source_code(NamedSource::new(source_name, input.to_string()));
    eprintln!("{report:?}");
}

/// Prints the rule list produced by `check`.
pub fn print_rules<'a>(rules: impl Iterator<Item = &'a str>) {
    for rule in rules {
        println!("{rule}");
    }
}
