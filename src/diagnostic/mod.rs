pub mod ansi;
pub mod json;
pub mod registry;
pub mod source_map;

pub use source_map::SourceMap;

use crate::asm::{AsmError, Span};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone)]
pub struct Label {
    pub span: Span,
    pub message: String,
}

/// A user-facing report of a load-time error or runtime fault.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: Option<&'static str>,
    pub message: String,
    pub label: Option<Label>,
    pub notes: Vec<String>,
    pub suggestion: Option<String>,
    pub source: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Error,
            code: None,
            message: message.into(),
            label: None,
            notes: Vec::new(),
            suggestion: None,
            source: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic { severity: Severity::Warning, ..Diagnostic::error(message) }
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_span(mut self, span: Span, label: impl Into<String>) -> Self {
        self.label = Some(Label { span, message: label.into() });
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

// ---- From impls for the crate's error types ----

impl From<&AsmError> for Diagnostic {
    fn from(e: &AsmError) -> Self {
        let mut d = Diagnostic::error(&e.message)
            .with_code(e.code)
            .with_span(e.span, "here")
            .with_note(format!("on line {}", e.line));
        if let Some(s) = &e.suggestion {
            d = d.with_suggestion(s.clone());
        }
        d
    }
}

impl From<&crate::bytecode::BytecodeError> for Diagnostic {
    fn from(e: &crate::bytecode::BytecodeError) -> Self {
        Diagnostic::error(e.to_string()).with_code(e.code())
    }
}

impl From<&crate::vm::VmError> for Diagnostic {
    fn from(e: &crate::vm::VmError) -> Self {
        Diagnostic::error(e.to_string()).with_code(e.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_error_builder() {
        let d = Diagnostic::error("something went wrong");
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.message, "something went wrong");
        assert!(d.label.is_none());
        assert!(d.notes.is_empty());
        assert!(d.suggestion.is_none());
        assert!(d.code.is_none());
    }

    #[test]
    fn warning_keeps_message() {
        let d = Diagnostic::warning("input ignored");
        assert_eq!(d.severity, Severity::Warning);
        assert_eq!(d.message, "input ignored");
    }

    #[test]
    fn from_asm_error() {
        let e = crate::asm::assemble("header {\n}\nADDD 0 1\n").unwrap_err();
        let d = Diagnostic::from(&e);
        assert_eq!(d.code, Some("LP-A005"));
        assert!(d.message.contains("ADDD"));
        assert_eq!(d.label.as_ref().map(|l| l.span), Some(Span { start: 11, end: 15 }));
        assert!(d.notes.iter().any(|n| n == "on line 3"));
        assert_eq!(d.suggestion.as_deref(), Some("did you mean 'ADD'?"));
    }

    #[test]
    fn from_bytecode_error() {
        let e = crate::bytecode::BytecodeError::UnknownOpcode { opcode: 0x20, offset: 8 };
        let d = Diagnostic::from(&e);
        assert_eq!(d.code, Some("LP-B002"));
        assert!(d.message.contains("0x20"));
        assert!(d.label.is_none());
    }

    #[test]
    fn from_vm_error() {
        let e = crate::vm::VmError::OutOfBounds { index: 9, size: 4 };
        let d = Diagnostic::from(&e);
        assert_eq!(d.code, Some("LP-R001"));
        assert!(d.message.contains("index 9"));
    }
}
