//! Lexical scanning of `export const NAME = ...;` declarations.
//!
//! The scanner understands just enough TypeScript to find declarations
//! reliably: line and block comments, the three string literal forms, and
//! bracket nesting. Everything else is opaque text.

use std::ops::Range;

use super::ConstantsError;

/// Location of one top-level `export const` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    /// From `export` through the terminating `;` (or the end of the
    /// initializer when the statement has no semicolon), plus a trailing
    /// `// comment` on the same line.
    pub span: Range<usize>,
    /// The initializer expression after `=`, trimmed.
    pub initializer: Range<usize>,
}

/// Text the scanner steps over without looking inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Opaque {
    Comment,
    Str,
}

fn skip_opaque(bytes: &[u8], i: usize) -> Option<(Opaque, usize)> {
    match bytes[i] {
        b'/' if bytes.get(i + 1) == Some(&b'/') => {
            let end = bytes[i..]
                .iter()
                .position(|&b| b == b'\n')
                .map_or(bytes.len(), |p| i + p);
            Some((Opaque::Comment, end))
        }
        b'/' if bytes.get(i + 1) == Some(&b'*') => {
            let end = find_subslice(&bytes[i + 2..], b"*/").map_or(bytes.len(), |p| i + 2 + p + 2);
            Some((Opaque::Comment, end))
        }
        quote @ (b'\'' | b'"' | b'`') => {
            let mut j = i + 1;
            while j < bytes.len() {
                match bytes[j] {
                    b'\\' => j += 2,
                    b if b == quote => return Some((Opaque::Str, j + 1)),
                    b'\n' if quote != b'`' => return Some((Opaque::Str, j)),
                    _ => j += 1,
                }
            }
            Some((Opaque::Str, bytes.len()))
        }
        _ => None,
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

fn keyword_at(bytes: &[u8], i: usize, keyword: &[u8]) -> bool {
    bytes[i..].starts_with(keyword)
        && (i == 0 || !is_ident_byte(bytes[i - 1]))
        && bytes
            .get(i + keyword.len())
            .is_none_or(|&b| !is_ident_byte(b))
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// Replace every comment with spaces, keeping byte offsets and newlines.
pub fn blank_comments(source: &str) -> String {
    let bytes = source.as_bytes();
    let mut out = bytes.to_vec();
    let mut i = 0;
    while i < bytes.len() {
        match skip_opaque(bytes, i) {
            Some((Opaque::Comment, end)) => {
                for b in &mut out[i..end] {
                    if *b != b'\n' {
                        *b = b' ';
                    }
                }
                i = end;
            }
            Some((Opaque::Str, end)) => i = end,
            None => i += 1,
        }
    }
    // Every blanked byte became an ASCII space, so the buffer is still UTF-8
    String::from_utf8(out).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

/// Find every top-level `export const` declaration in `source`.
pub fn scan_declarations(source: &str) -> Result<Vec<Declaration>, ConstantsError> {
    let bytes = source.as_bytes();
    let mut declarations = Vec::new();
    let mut depth = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        if let Some((_, end)) = skip_opaque(bytes, i) {
            i = end;
            continue;
        }
        match bytes[i] {
            b'{' | b'[' | b'(' => depth += 1,
            b'}' | b']' | b')' => depth = depth.saturating_sub(1),
            _ => {}
        }
        if depth == 0 && keyword_at(bytes, i, b"export") {
            if let Some(decl) = parse_export_const(source, i)? {
                i = decl.span.end;
                declarations.push(decl);
                continue;
            }
        }
        i += 1;
    }

    Ok(declarations)
}

/// Locate a single declaration by name.
pub fn find_declaration(source: &str, name: &str) -> Result<Option<Declaration>, ConstantsError> {
    Ok(scan_declarations(source)?
        .into_iter()
        .find(|decl| decl.name == name))
}

fn parse_export_const(source: &str, start: usize) -> Result<Option<Declaration>, ConstantsError> {
    let bytes = source.as_bytes();
    let mut i = skip_whitespace(bytes, start + "export".len());
    if !keyword_at(bytes, i, b"const") {
        return Ok(None);
    }
    i = skip_whitespace(bytes, i + "const".len());

    let name_start = i;
    while i < bytes.len() && is_ident_byte(bytes[i]) {
        i += 1;
    }
    if i == name_start {
        return Ok(None);
    }
    let name = source[name_start..i].to_string();

    // Optional type annotation, up to the `=` at nesting depth 0
    let mut depth = 0usize;
    let eq = loop {
        if i >= bytes.len() {
            return Err(ConstantsError::Malformed {
                name,
                reason: "missing `=`".to_string(),
            });
        }
        if let Some((_, end)) = skip_opaque(bytes, i) {
            i = end;
            continue;
        }
        match bytes[i] {
            b'<' | b'{' | b'[' | b'(' => depth += 1,
            b'>' if bytes.get(i.wrapping_sub(1)) != Some(&b'=') => {
                depth = depth.saturating_sub(1)
            }
            b'}' | b']' | b')' => depth = depth.saturating_sub(1),
            b'=' if depth == 0 && bytes.get(i + 1) != Some(&b'>') => break i,
            b';' if depth == 0 => {
                return Err(ConstantsError::Malformed {
                    name,
                    reason: "declaration has no initializer".to_string(),
                });
            }
            _ => {}
        }
        i += 1;
    };

    let init_start = skip_whitespace(bytes, eq + 1);
    let mut i = init_start;
    let mut depth = 0usize;
    let mut last_significant = init_start;
    let (init_end, stmt_end) = loop {
        if i >= bytes.len() {
            if depth > 0 {
                return Err(ConstantsError::Unterminated { name });
            }
            break (last_significant, last_significant);
        }
        if let Some((kind, end)) = skip_opaque(bytes, i) {
            if kind == Opaque::Str {
                last_significant = end;
            }
            i = end;
            continue;
        }
        match bytes[i] {
            b'{' | b'[' | b'(' => depth += 1,
            b'}' | b']' | b')' => {
                if depth == 0 {
                    return Err(ConstantsError::Malformed {
                        name,
                        reason: "unbalanced closing bracket".to_string(),
                    });
                }
                depth -= 1;
            }
            b';' if depth == 0 => break (last_significant, i + 1),
            _ => {}
        }
        // A statement without a semicolon ends before the next top-level export
        if depth == 0 && i > init_start && keyword_at(bytes, i, b"export") {
            break (last_significant, last_significant);
        }
        if !bytes[i].is_ascii_whitespace() {
            last_significant = i + 1;
        }
        i += 1;
    };

    let span_end = include_trailing_comment(bytes, stmt_end);
    Ok(Some(Declaration {
        name,
        span: start..span_end,
        initializer: init_start..init_end,
    }))
}

/// Extend `end` over `  // comment` on the same line.
fn include_trailing_comment(bytes: &[u8], end: usize) -> usize {
    let mut i = end;
    while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\t') {
        i += 1;
    }
    if bytes.get(i) == Some(&b'/') && bytes.get(i + 1) == Some(&b'/') {
        return bytes[i..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(bytes.len(), |p| i + p);
    }
    end
}

/// Decode a string literal starting at `bytes[start]` (a quote character).
///
/// Returns the decoded value and the byte offset just past the literal.
/// Template literals containing `${` substitutions are rejected.
pub fn read_string_literal(source: &str, start: usize) -> Option<(String, usize)> {
    let rest = source.get(start..)?;
    let mut chars = rest.char_indices();
    let (_, quote) = chars.next()?;
    if !matches!(quote, '\'' | '"' | '`') {
        return None;
    }

    let mut value = String::new();
    while let Some((offset, c)) = chars.next() {
        match c {
            '\\' => {
                let (_, escaped) = chars.next()?;
                match escaped {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    'r' => value.push('\r'),
                    '0' => value.push('\0'),
                    // Line continuation
                    '\n' => {}
                    other => value.push(other),
                }
            }
            '$' if quote == '`' && rest[offset..].starts_with("${") => return None,
            '\n' if quote != '`' => return None,
            c if c == quote => return Some((value, start + offset + c.len_utf8())),
            c => value.push(c),
        }
    }
    None
}
