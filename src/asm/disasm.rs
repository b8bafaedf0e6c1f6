use crate::bytecode::{self, BytecodeError, Image};

use super::{HEADER_CLOSE, HEADER_OPEN, INDENT};

/// Render an image in the text assembly form accepted by [`super::assemble`].
pub fn disassemble(image: &Image) -> String {
    let mut out = String::new();
    out.push_str(HEADER_OPEN);
    out.push('\n');
    for w in &image.header {
        out.push_str(INDENT);
        out.push_str(&w.to_string());
        out.push('\n');
    }
    out.push_str(HEADER_CLOSE);
    out.push('\n');
    for ins in &image.program {
        out.push_str(&ins.to_string());
        out.push('\n');
    }
    out
}

pub fn disassemble_bytes(bytes: &[u8]) -> Result<String, BytecodeError> {
    bytecode::decode(bytes).map(|image| disassemble(&image))
}
