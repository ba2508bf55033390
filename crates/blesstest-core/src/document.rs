//! Parser for comment-tolerant JSON test definition documents.

use crate::types::{CaseSpec, Document};
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur while parsing a definition document.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("unterminated block comment starting on line {line}")]
    UnterminatedComment { line: u32 },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("definition document must be a JSON object, found {found}")]
    NotAnObject { found: &'static str },
    #[error("invalid case '{name}': {source}")]
    InvalidCase {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Parse a definition document.
///
/// `//` and `/* */` comments and trailing commas are accepted. Entry order
/// is preserved.
///
/// # Errors
/// Returns an error if the text is not valid JSON after comment removal,
/// the top level is not an object, or an entry does not match the case schema.
pub fn parse_document(src: &str) -> Result<Document, DocumentError> {
    let cleaned = strip_trailing_commas(&strip_comments(src)?);
    let value: Value = serde_json::from_str(&cleaned)?;
    let Value::Object(entries) = value else {
        return Err(DocumentError::NotAnObject {
            found: kind_of(&value),
        });
    };

    entries
        .into_iter()
        .map(|(name, raw)| match serde_json::from_value::<CaseSpec>(raw) {
            Ok(spec) => Ok((name, spec)),
            Err(source) => Err(DocumentError::InvalidCase { name, source }),
        })
        .collect()
}

/// Replace comments with whitespace, keeping newlines so JSON error
/// positions still point at the original lines.
///
/// # Errors
/// Returns `DocumentError::UnterminatedComment` for a `/*` without `*/`.
pub fn strip_comments(src: &str) -> Result<String, DocumentError> {
    let chars: Vec<char> = src.chars().collect();
    let mut out = String::with_capacity(src.len());
    let mut pos = 0usize;
    let mut line: u32 = 1;
    let mut in_string = false;

    while pos < chars.len() {
        let c = chars[pos];

        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(&escaped) = chars.get(pos + 1) {
                        out.push(escaped);
                        pos += 1;
                    }
                }
                '"' => in_string = false,
                '\n' => line += 1,
                _ => {}
            }
            pos += 1;
            continue;
        }

        // Line comment
        if c == '/' && chars.get(pos + 1) == Some(&'/') {
            while pos < chars.len() && chars[pos] != '\n' {
                pos += 1;
            }
            continue;
        }

        // Block comment
        if c == '/' && chars.get(pos + 1) == Some(&'*') {
            let start = line;
            pos += 2;
            loop {
                match chars.get(pos) {
                    None => return Err(DocumentError::UnterminatedComment { line: start }),
                    Some('*') if chars.get(pos + 1) == Some(&'/') => {
                        pos += 2;
                        out.push(' ');
                        break;
                    }
                    Some('\n') => {
                        line += 1;
                        out.push('\n');
                        pos += 1;
                    }
                    Some(_) => pos += 1,
                }
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '\n' => line += 1,
            _ => {}
        }
        out.push(c);
        pos += 1;
    }

    Ok(out)
}

/// Drop commas that directly precede a closing `}` or `]`.
#[must_use]
pub fn strip_trailing_commas(src: &str) -> String {
    let chars: Vec<char> = src.chars().collect();
    let mut out = String::with_capacity(src.len());
    let mut in_string = false;
    let mut pos = 0usize;

    while pos < chars.len() {
        let c = chars[pos];
        if in_string {
            out.push(c);
            if c == '\\' {
                if let Some(&escaped) = chars.get(pos + 1) {
                    out.push(escaped);
                    pos += 1;
                }
            } else if c == '"' {
                in_string = false;
            }
            pos += 1;
            continue;
        }

        if c == ',' {
            let next = chars[pos + 1..].iter().find(|ch| !ch.is_whitespace());
            if matches!(next, Some('}' | ']')) {
                out.push(' ');
                pos += 1;
                continue;
            }
        }
        if c == '"' {
            in_string = true;
        }
        out.push(c);
        pos += 1;
    }

    out
}

const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
