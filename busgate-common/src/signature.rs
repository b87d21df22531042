use crate::{Error, Result};

/// Splits a concatenated signature into its top-level type codes.
///
/// Each returned code is itself a valid signature, so container contents
/// can be split recursively. Concatenating the result yields the input
/// back.
pub fn split(signature: &str) -> Result<Vec<String>> {
    let bytes = signature.as_bytes();
    let mut codes = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let len = type_length(bytes, pos)?;
        codes.push(signature[pos..pos + len].to_owned());
        pos += len;
    }

    Ok(codes)
}

/// Length of the single complete type starting at `pos`.
fn type_length(signature: &[u8], pos: usize) -> Result<usize> {
    match signature.get(pos) {
        // An array extends through exactly one following complete type
        Some(b'a') => Ok(1 + type_length(signature, pos + 1)?),
        Some(b'(') | Some(b'{') => container_length(signature, pos),
        Some(code) if is_single_code(*code) => Ok(1),
        Some(code) => Err(Error::InvalidSignature(format!(
            "unexpected character '{}' in \"{}\"",
            *code as char,
            String::from_utf8_lossy(signature)
        ))),
        None => Err(Error::InvalidSignature(format!(
            "array with no element type in \"{}\"",
            String::from_utf8_lossy(signature)
        ))),
    }
}

fn container_length(signature: &[u8], pos: usize) -> Result<usize> {
    let mut depth = 0usize;

    for (offset, code) in signature[pos..].iter().enumerate() {
        match code {
            b'(' | b'{' => depth += 1,
            b')' | b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(offset + 1);
                }
            }
            _ => (),
        }
    }

    Err(Error::InvalidSignature(format!(
        "unbalanced brackets in \"{}\"",
        String::from_utf8_lossy(signature)
    )))
}

fn is_single_code(code: u8) -> bool {
    matches!(
        code,
        b'y' | b'b' | b'n' | b'q' | b'i' | b'u' | b'x' | b't' | b'd' | b's' | b'o' | b'g' | b'v'
    )
}
