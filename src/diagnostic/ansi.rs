use super::{Diagnostic, Severity, SourceMap};

pub struct AnsiRenderer {
    pub use_color: bool,
}

impl AnsiRenderer {
    fn paint(&self, style: &str, s: &str) -> String {
        if self.use_color { format!("\x1b[{style}m{s}\x1b[0m") } else { s.to_string() }
    }

    pub fn render(&self, d: &Diagnostic) -> String {
        let mut out = String::new();

        // "error[LP-A005]: message"
        let mut head = match d.severity {
            Severity::Error => "error".to_string(),
            Severity::Warning => "warning".to_string(),
        };
        if let Some(code) = d.code {
            head.push_str(&format!("[{code}]"));
        }
        let head = match d.severity {
            Severity::Error => self.paint("1;31", &head),
            Severity::Warning => self.paint("1;33", &head),
        };
        out.push_str(&format!("{}: {}\n", head, self.paint("1", &d.message)));

        if let (Some(label), Some(source)) = (&d.label, &d.source) {
            let map = SourceMap::new(source);
            let (line, col) = map.lookup(label.span.start);
            let text = map.line_text(line);

            let gutter = line.to_string().len();
            let pad = " ".repeat(gutter);
            let pipe = self.paint("36", "|");

            out.push_str(&format!("{pad}{} {line}:{col}\n", self.paint("36", "-->")));
            out.push_str(&format!("{pad} {pipe}\n"));
            out.push_str(&format!("{} {pipe} {text}\n", self.paint("36", &line.to_string())));

            // Carets stay on this line even if the span runs past it.
            let start = col - 1;
            let width = label.span.end.saturating_sub(label.span.start).max(1);
            let width = width.min(text.len().saturating_sub(start).max(1));
            let carets = self.paint("1;31", &"^".repeat(width));
            let indent = " ".repeat(start);
            if label.message.is_empty() {
                out.push_str(&format!("{pad} {pipe} {indent}{carets}\n"));
            } else {
                out.push_str(&format!("{pad} {pipe} {indent}{carets} {}\n", self.paint("1;31", &label.message)));
            }
        }

        for note in &d.notes {
            out.push_str(&format!("  {} note: {}\n", self.paint("2", "="), note));
        }
        if let Some(s) = &d.suggestion {
            out.push_str(&format!("  {} help: {}\n", self.paint("2", "="), s));
        }
        out
    }
}
