/// Longest narration segment, in characters, handed to TTS as one clip.
pub const MAX_SEGMENT_CHARS: usize = 25;

const SENTENCE_ENDS: &[char] = &['。', '！', '？', '；'];
const ASCII_SENTENCE_ENDS: &[char] = &['.', '!', '?', ';'];
const CLAUSE_ENDS: &[char] = &['，', '、', ','];

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split `text` after every character accepted by `is_boundary`, keeping the
/// boundary character with the piece it ends.
fn split_after(text: &str, is_boundary: impl Fn(char, Option<char>) -> bool) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        let next = chars.peek().map(|&(_, n)| n);
        if is_boundary(c, next) {
            let end = idx + c.len_utf8();
            pieces.push(&text[start..end]);
            start = end;
        }
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

fn is_sentence_end(c: char, next: Option<char>) -> bool {
    SENTENCE_ENDS.contains(&c)
        || (ASCII_SENTENCE_ENDS.contains(&c) && next.is_none_or(char::is_whitespace))
}

fn is_clause_end(c: char, _next: Option<char>) -> bool {
    CLAUSE_ENDS.contains(&c)
}

/// Hard-wrap a clause that is longer than the limit on its own.
fn push_wrapped(result: &mut Vec<String>, piece: &str, limit: usize) {
    let chars: Vec<char> = piece.trim().chars().collect();
    for chunk in chars.chunks(limit) {
        let text: String = chunk.iter().collect();
        let text = text.trim();
        if !text.is_empty() {
            result.push(text.to_string());
        }
    }
}

fn push_trimmed(result: &mut Vec<String>, piece: &str, limit: usize) {
    let trimmed = piece.trim();
    if trimmed.is_empty() {
        return;
    }
    if char_len(trimmed) <= limit {
        result.push(trimmed.to_string());
    } else {
        push_wrapped(result, trimmed, limit);
    }
}

/// Split narration into TTS-sized segments of at most `limit` characters.
///
/// Sentences are split first; sentences that are still too long are cut at
/// clause punctuation and greedily re-packed. Pieces are trimmed and never
/// empty.
pub fn split_narration_with_limit(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut result = Vec::new();

    for sentence in split_after(text, is_sentence_end) {
        let trimmed = sentence.trim();
        if trimmed.is_empty() {
            continue;
        }
        if char_len(trimmed) <= limit {
            result.push(trimmed.to_string());
            continue;
        }

        let mut buffer = String::new();
        for clause in split_after(trimmed, is_clause_end) {
            if char_len(&buffer) + char_len(clause) <= limit {
                buffer.push_str(clause);
            } else {
                push_trimmed(&mut result, &buffer, limit);
                buffer = clause.to_string();
            }
        }
        push_trimmed(&mut result, &buffer, limit);
    }

    result
}

pub fn split_narration_text(text: &str) -> Vec<String> {
    split_narration_with_limit(text, MAX_SEGMENT_CHARS)
}
