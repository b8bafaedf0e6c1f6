/// An entry in the error code registry.
pub struct ErrorEntry {
    pub code: &'static str,
    pub short: &'static str,
    pub long: &'static str,
}

/// Every stable error code the assembler, loader and engine report.
pub static REGISTRY: &[ErrorEntry] = &[
    // ── Assembler ────────────────────────────────────────────────────────────
    ErrorEntry {
        code: "LP-A001",
        short: "missing header",
        long: r#"## LP-A001: missing header

The first line of an assembly file must open the header block, exactly:

    header {

The header may be empty, but it must be present.
"#,
    },
    ErrorEntry {
        code: "LP-A002",
        short: "bad header indentation",
        long: r#"## LP-A002: bad header indentation

Each header value sits on its own line, indented by exactly two spaces.
Tabs, one space, three or more spaces and blank lines are all rejected.

    header {
      5
      18446744073709551615
    }
"#,
    },
    ErrorEntry {
        code: "LP-A003",
        short: "invalid header value",
        long: r#"## LP-A003: invalid header value

Header values are unsigned decimal numbers that fit in a 64-bit word.
Signs, hex, separators and anything after the number are rejected. Store a
negative amount as its two's-complement word:

    18446744073709551613    (-3)
"#,
    },
    ErrorEntry {
        code: "LP-A004",
        short: "unclosed header",
        long: r#"## LP-A004: unclosed header

The file ended before the header block was closed. End the header with a
line containing only `}`.
"#,
    },
    ErrorEntry {
        code: "LP-A005",
        short: "unknown command",
        long: r#"## LP-A005: unknown command

Every code line starts with one of the sixteen mnemonics, in uppercase:

    AND OR XOR NOT SHIFT ADD SUB MUL DIV MOD LESS EQU COPY GOTO INPUT LOAD

Lines starting with `#` and blank lines are ignored.
"#,
    },
    ErrorEntry {
        code: "LP-A006",
        short: "invalid parameter",
        long: r#"## LP-A006: invalid parameter

Parameters are unsigned decimal numbers separated by spaces. They are
memory addresses (or, for GOTO's first parameter, a hop count), never
literal values: stage constants in the header and pass their address.
"#,
    },
    ErrorEntry {
        code: "LP-A007",
        short: "wrong parameter count",
        long: r#"## LP-A007: wrong parameter count

INPUT takes one parameter; every other command takes two. NOT reads only
its first parameter but still needs a second one, usually `0`.

    NOT 4 0
    INPUT 4
    GOTO 0 7
"#,
    },

    // ── Bytecode ─────────────────────────────────────────────────────────────
    ErrorEntry {
        code: "LP-B001",
        short: "truncated bytecode",
        long: r#"## LP-B001: truncated bytecode

A bytecode file is a little-endian header length, that many header words,
then 17-byte instruction records (one opcode byte, two words). The file
ended in the middle of one of these pieces.
"#,
    },
    ErrorEntry {
        code: "LP-B002",
        short: "unknown opcode",
        long: r#"## LP-B002: unknown opcode

An instruction record starts with an opcode byte outside 0..=15. The file
was not produced by this assembler, or it is corrupted.
"#,
    },

    // ── Runtime ──────────────────────────────────────────────────────────────
    ErrorEntry {
        code: "LP-R001",
        short: "memory access out of bounds",
        long: r#"## LP-R001: memory access out of bounds

An instruction read or wrote an address at or beyond the memory size.
Addresses are never wrapped or clamped. Run with more memory, or check the
pointer chain followed by LOAD or GOTO.
"#,
    },
    ErrorEntry {
        code: "LP-R002",
        short: "division by zero",
        long: r#"## LP-R002: division by zero

DIV or MOD read a zero divisor. The target cell keeps its old value and
the program stops.
"#,
    },
    ErrorEntry {
        code: "LP-R003",
        short: "memory too small for header",
        long: r#"## LP-R003: memory too small for header

The requested memory size is smaller than the number of header words the
program starts with. Ask for at least as many words as the header holds.
"#,
    },
    ErrorEntry {
        code: "LP-R004",
        short: "input supplied while not waiting",
        long: r#"## LP-R004: input supplied while not waiting

A value was handed to the engine while no INPUT instruction was pending.
"#,
    },
    ErrorEntry {
        code: "LP-R005",
        short: "memory too large",
        long: r#"## LP-R005: memory too large

The host could not allocate the requested number of 64-bit words. Each word
takes eight bytes; ask for less memory.
"#,
    },
];

/// Look up an error entry by code (e.g. `"LP-A005"`).
pub fn lookup(code: &str) -> Option<&'static ErrorEntry> {
    REGISTRY.iter().find(|e| e.code.eq_ignore_ascii_case(code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::BytecodeError;
    use crate::vm::VmError;

    #[test]
    fn lookup_known_code() {
        let e = lookup("LP-A005").expect("LP-A005 should be in registry");
        assert_eq!(e.code, "LP-A005");
        assert!(e.long.contains("LP-A005"));
        assert!(lookup("lp-a005").is_some());
    }

    #[test]
    fn lookup_unknown_returns_none() {
        assert!(lookup("LP-X999").is_none());
        assert!(lookup("").is_none());
    }

    #[test]
    fn all_codes_unique() {
        let mut codes: Vec<&str> = REGISTRY.iter().map(|e| e.code).collect();
        codes.sort_unstable();
        let len_before = codes.len();
        codes.dedup();
        assert_eq!(codes.len(), len_before, "duplicate codes in registry");
    }

    #[test]
    fn every_reported_code_is_registered() {
        let asm = ["LP-A001", "LP-A002", "LP-A003", "LP-A004", "LP-A005", "LP-A006", "LP-A007"];
        let reported = [
            BytecodeError::MissingHeaderLength { len: 0 }.code(),
            BytecodeError::UnknownOpcode { opcode: 99, offset: 0 }.code(),
            VmError::OutOfBounds { index: 0, size: 0 }.code(),
            VmError::DivisionByZero { target: 0, operand: 0 }.code(),
            VmError::HeaderTooLarge { header: 1, size: 0 }.code(),
            VmError::NotSuspended.code(),
            VmError::MemoryTooLarge { size: 0 }.code(),
        ];
        for code in asm.into_iter().chain(reported) {
            assert!(lookup(code).is_some(), "{code} missing from registry");
        }
    }

    #[test]
    fn all_codes_have_content() {
        for entry in REGISTRY {
            assert!(!entry.short.is_empty(), "{} missing short description", entry.code);
            assert!(entry.long.starts_with(&format!("## {}", entry.code)));
        }
    }
}
