use arch::{dir::DirKind, op::OpKind};

/// Split a raw source line into statement tokens.
///
/// Commas act as separators outside quotes, quoted literal text stays one
/// token (a leading `=` counts as part of the literal opener), and a known
/// keyword glued to digits is split apart first.
pub fn tokenize(line: &str) -> Vec<String> {
    let norm = normalize_compact(line.trim());
    let words: Vec<&str> = norm.split_whitespace().collect();
    split_respecting_quotes(&words)
}

/// Rewrite `START100` as `START 100`. Only the leading word is checked,
/// and only when its alphabetic head is a known directive or opcode.
fn normalize_compact(line: &str) -> String {
    let first = line.split_whitespace().next().unwrap_or("");
    if let Some(pos) = first.find(|c: char| c.is_ascii_digit()) {
        if pos > 0 {
            let kw = &first[..pos];
            if kw.chars().all(|c| c.is_ascii_alphabetic())
                && (DirKind::parse(kw).is_ok() || OpKind::parse(kw).is_ok())
            {
                return format!("{} {}", kw, &line[pos..]);
            }
        }
    }
    line.to_string()
}

/// Quote character opening a literal token, if any.
fn quote_char(tk: &str) -> Option<char> {
    let body = tk.strip_prefix('=').unwrap_or(tk);
    match body.chars().next() {
        Some(c @ ('\'' | '"')) => Some(c),
        _ => None,
    }
}

/// Position of the first unescaped `q` in `s`.
fn find_close(s: &str, q: char) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if c == q && !escaped {
            return Some(i);
        }
        escaped = c == '\\' && !escaped;
    }
    None
}

fn split_respecting_quotes(words: &[&str]) -> Vec<String> {
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut open: Option<char> = None;

    for tk in words {
        match open {
            None => {
                if let Some(q) = quote_char(tk) {
                    let head = if tk.starts_with('=') { 2 } else { 1 };
                    match find_close(&tk[head..], q) {
                        Some(rel) => {
                            let end = head + rel + 1;
                            out.push(tk[..end].to_string());
                            // text after the closing quote splits at commas
                            for part in tk[end..].split(',') {
                                if !part.is_empty() {
                                    out.push(part.to_string());
                                }
                            }
                        }
                        None => {
                            cur.clear();
                            cur.push_str(tk);
                            open = Some(q);
                        }
                    }
                } else if tk.contains(',') {
                    for part in tk.split(',') {
                        if !part.is_empty() {
                            out.push(part.to_string());
                        }
                    }
                } else {
                    out.push(tk.to_string());
                }
            }
            Some(q) => {
                cur.push(' ');
                match find_close(tk, q) {
                    Some(rel) => {
                        let end = rel + 1;
                        cur.push_str(&tk[..end]);
                        open = None;
                        out.push(std::mem::take(&mut cur));
                        for part in tk[end..].split(',') {
                            if !part.is_empty() {
                                out.push(part.to_string());
                            }
                        }
                    }
                    None => cur.push_str(tk),
                }
            }
        }
    }
    // unterminated quote: keep what was accumulated
    if open.is_some() {
        out.push(cur);
    }
    out
}

/// Remove one matching pair of surrounding quotes.
pub fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    let b = s.as_bytes();
    if b.len() >= 2
        && ((b[0] == b'\'' && b[b.len() - 1] == b'\'')
            || (b[0] == b'"' && b[b.len() - 1] == b'"'))
    {
        return &s[1..s.len() - 1];
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(line: &str) -> Vec<String> {
        tokenize(line)
    }

    #[test]
    fn test_compact_keyword() {
        assert_eq!(toks("START100"), vec!["START", "100"]);
        assert_eq!(toks("start200"), vec!["start", "200"]);
        // not a keyword: stays one token
        assert_eq!(toks("FOO100"), vec!["FOO100"]);
    }

    #[test]
    fn test_comma_split() {
        assert_eq!(
            toks("MOVER AREG, ='5'"),
            vec!["MOVER", "AREG", "='5'"]
        );
        assert_eq!(toks("ADD AREG,,BREG"), vec!["ADD", "AREG", "BREG"]);
    }

    #[test]
    fn test_quoted_literal_stays_whole() {
        assert_eq!(toks("MSG DC 'HI THERE'"), vec!["MSG", "DC", "'HI THERE'"]);
        assert_eq!(toks("A DC \"5\""), vec!["A", "DC", "\"5\""]);
    }

    #[test]
    fn test_comma_after_quoted_literal() {
        assert_eq!(toks("MOVER ='5',AREG"), vec!["MOVER", "='5'", "AREG"]);
        assert_eq!(
            toks("MOVER AREG, ='5',BREG"),
            vec!["MOVER", "AREG", "='5'", "BREG"]
        );
        assert_eq!(toks("DC 'HI THERE',X"), vec!["DC", "'HI THERE'", "X"]);
    }

    #[test]
    fn test_unterminated_quote() {
        assert_eq!(toks("MSG DC 'OOPS"), vec!["MSG", "DC", "'OOPS"]);
    }

    #[test]
    fn test_strip_quotes() {
        assert_eq!(strip_quotes("'5'"), "5");
        assert_eq!(strip_quotes("\"12\""), "12");
        assert_eq!(strip_quotes("5"), "5");
        assert_eq!(strip_quotes("'"), "'");
    }
}
