use super::{Diagnostic, Severity, SourceMap};

/// One-line JSON rendering, for tools driving the CLI.
pub fn render(d: &Diagnostic) -> String {
    let severity = match d.severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
    };

    let mut obj = serde_json::json!({
        "severity": severity,
        "message": d.message,
        "notes": d.notes,
    });

    if let Some(code) = d.code {
        obj["code"] = serde_json::Value::from(code);
    }

    if let Some(label) = &d.label {
        let mut l = serde_json::json!({
            "start": label.span.start,
            "end": label.span.end,
            "message": label.message,
        });
        if let Some(source) = &d.source {
            let (line, col) = SourceMap::new(source).lookup(label.span.start);
            l["line"] = serde_json::Value::from(line);
            l["col"] = serde_json::Value::from(col);
        }
        obj["label"] = l;
    }

    if let Some(s) = &d.suggestion {
        obj["suggestion"] = serde_json::Value::from(s.as_str());
    }

    serde_json::to_string(&obj).unwrap_or_else(|_| r#"{"severity":"error","message":"internal error serializing diagnostic"}"#.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm::Span;

    fn parse_json(s: &str) -> serde_json::Value {
        serde_json::from_str(s).expect("valid JSON")
    }

    #[test]
    fn render_basic_error() {
        let v = parse_json(&render(&Diagnostic::error("division by zero").with_code("LP-R002")));
        assert_eq!(v["severity"], "error");
        assert_eq!(v["message"], "division by zero");
        assert_eq!(v["code"], "LP-R002");
        assert!(v.get("label").is_none());
        assert!(v.get("suggestion").is_none());
    }

    #[test]
    fn render_label_with_position() {
        let d = Diagnostic::error("invalid command")
            .with_span(Span { start: 11, end: 15 }, "here")
            .with_source("header {\n}\nADDD 0 1\n");
        let v = parse_json(&render(&d));
        assert_eq!(v["label"]["start"], 11);
        assert_eq!(v["label"]["end"], 15);
        assert_eq!(v["label"]["line"], 3);
        assert_eq!(v["label"]["col"], 1);
    }

    #[test]
    fn render_label_without_source_has_no_position() {
        let d = Diagnostic::error("bad").with_span(Span { start: 1, end: 2 }, "here");
        let v = parse_json(&render(&d));
        assert!(v["label"].get("line").is_none());
    }

    #[test]
    fn render_notes_and_suggestion() {
        let d = Diagnostic::warning("stopped")
            .with_note("after 10 steps")
            .with_suggestion("raise --max-steps");
        let v = parse_json(&render(&d));
        assert_eq!(v["severity"], "warning");
        assert_eq!(v["notes"][0], "after 10 steps");
        assert_eq!(v["suggestion"], "raise --max-steps");
    }

    #[test]
    fn render_is_single_line() {
        let out = render(&Diagnostic::error("a\nb"));
        assert!(!out.contains('\n'));
    }
}
