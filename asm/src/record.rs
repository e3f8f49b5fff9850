use std::fmt;

// ----------------------------------------------------------------------------
// Intermediate record

/// Record kind tag of the intermediate code stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Assembler directive
    AD,
    /// Declaration (DS/DC)
    DL,
    /// Imperative statement
    IS,
    /// Literal placed by a pool flush
    LT,
    /// Unrecognized statement, passed through verbatim
    Unknown,
}

impl Kind {
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::AD => "AD",
            Kind::DL => "DL",
            Kind::IS => "IS",
            Kind::LT => "LT",
            Kind::Unknown => "??",
        }
    }

    pub fn parse(s: &str) -> Kind {
        match s.to_ascii_uppercase().as_str() {
            "AD" => Kind::AD,
            "DL" => Kind::DL,
            "IS" => Kind::IS,
            "LT" => Kind::LT,
            _ => Kind::Unknown,
        }
    }
}

/// One intermediate-code record, the pass-one/pass-two contract:
/// `LC \t (kind) \t op \t operand`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub lc: i32,
    pub kind: Kind,
    pub op: String,
    pub operand: Option<String>,
}

impl Record {
    pub fn new(lc: i32, kind: Kind, op: &str, operand: Option<String>) -> Self {
        Record {
            lc,
            kind,
            op: op.to_string(),
            operand,
        }
    }

    pub fn parse(line: &str) -> Option<Record> {
        let mut it = line.splitn(4, '\t');
        let lc = it.next()?.trim().parse().ok()?;
        let kind_tok = it.next()?.trim();
        let kind = Kind::parse(kind_tok.trim_start_matches('(').trim_end_matches(')'));
        let op = it.next()?.trim().to_string();
        let operand = it
            .next()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        Some(Record { lc, kind, op, operand })
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}\t({})\t{}\t{}",
            self.lc,
            self.kind.as_str(),
            self.op,
            self.operand.as_deref().unwrap_or("")
        )
    }
}

// ----------------------------------------------------------------------------
// Reference tokens

/// Parsed form of a bracketed reference embedded in operand text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ref {
    /// `(n)` — bare number: register code or small immediate.
    Number(i32),
    /// `(C,n)` with signed offset — raw constant.
    Constant(i32, i32),
    /// `(S,i)` with signed offset — symbol table index, 1-based.
    Symbol(usize, i32),
    /// `(L,i)` with signed offset — literal table index, 1-based.
    Literal(usize, i32),
}

impl Ref {
    pub fn render(self) -> String {
        let body = match self {
            Ref::Number(n) => return format!("({})", n),
            Ref::Constant(n, _) => format!("(C,{})", n),
            Ref::Symbol(i, _) => format!("(S,{})", i),
            Ref::Literal(i, _) => format!("(L,{})", i),
        };
        match self.offset() {
            0 => body,
            off if off > 0 => format!("{}+{}", body, off),
            off => format!("{}{}", body, off),
        }
    }

    fn offset(self) -> i32 {
        match self {
            Ref::Number(_) => 0,
            Ref::Constant(_, off) | Ref::Symbol(_, off) | Ref::Literal(_, off) => off,
        }
    }

    /// Parse one `(...)` group with an optional glued `+n`/`-n` suffix.
    pub fn parse(tok: &str) -> Option<Ref> {
        let tok = tok.trim();
        let rest = tok.strip_prefix('(')?;
        let close = rest.find(')')?;
        let inner = &rest[..close];
        let suffix = rest[close + 1..].trim();
        let off = if suffix.is_empty() {
            0
        } else {
            suffix.parse::<i32>().ok()?
        };
        match inner.split_once(',') {
            None => {
                let n = inner.trim().parse().ok()?;
                (off == 0).then_some(Ref::Number(n))
            }
            Some((kind, idx)) => match kind.trim().to_ascii_uppercase().as_str() {
                "C" => Some(Ref::Constant(idx.trim().parse().ok()?, off)),
                "S" => Some(Ref::Symbol(idx.trim().parse().ok()?, off)),
                "L" => Some(Ref::Literal(idx.trim().parse().ok()?, off)),
                _ => None,
            },
        }
    }

    /// Collect every parsable reference token in operand text, in order.
    pub fn scan(text: &str) -> Vec<Ref> {
        let mut out = Vec::new();
        let bytes = text.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] != b'(' {
                i += 1;
                continue;
            }
            let Some(rel) = text[i..].find(')') else { break };
            let mut end = i + rel + 1;
            if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
                let mut j = end + 1;
                while j < bytes.len() && bytes[j].is_ascii_digit() {
                    j += 1;
                }
                if j > end + 1 {
                    end = j;
                }
            }
            if let Some(r) = Ref::parse(&text[i..end]) {
                out.push(r);
            }
            i = end;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_format() {
        let rec = Record::new(100, Kind::IS, "MOVER", Some("(1) (L,1)".to_string()));
        assert_eq!(rec.to_string(), "0100\t(IS)\tMOVER\t(1) (L,1)");
        assert_eq!(Record::parse(&rec.to_string()), Some(rec));
    }

    #[test]
    fn test_record_without_operand() {
        let rec = Record::new(103, Kind::AD, "END", None);
        assert_eq!(rec.to_string(), "0103\t(AD)\tEND\t");
        assert_eq!(Record::parse(&rec.to_string()), Some(rec));
    }

    #[test]
    fn test_unknown_kind_roundtrip() {
        let parsed = Record::parse("0000\t(??)\tBOGUS\tX Y").unwrap();
        assert_eq!(parsed.kind, Kind::Unknown);
        assert_eq!(parsed.op, "BOGUS");
        assert_eq!(parsed.operand.as_deref(), Some("X Y"));
    }

    #[test]
    fn test_ref_parse() {
        assert_eq!(Ref::parse("(4)"), Some(Ref::Number(4)));
        assert_eq!(Ref::parse("(C,200)"), Some(Ref::Constant(200, 0)));
        assert_eq!(Ref::parse("(S,2)+1"), Some(Ref::Symbol(2, 1)));
        assert_eq!(Ref::parse("(L,3)-2"), Some(Ref::Literal(3, -2)));
        assert_eq!(Ref::parse("(Q,1)"), None);
        assert_eq!(Ref::parse("AREG"), None);
    }

    #[test]
    fn test_ref_render() {
        assert_eq!(Ref::Number(1).render(), "(1)");
        assert_eq!(Ref::Constant(100, 0).render(), "(C,100)");
        assert_eq!(Ref::Symbol(2, 1).render(), "(S,2)+1");
        assert_eq!(Ref::Literal(1, -3).render(), "(L,1)-3");
    }

    #[test]
    fn test_scan_mixed_text() {
        let refs = Ref::scan("='5' (C,5)");
        assert_eq!(refs, vec![Ref::Constant(5, 0)]);
        let refs = Ref::scan("(1) (S,2)+2 junk (L,1)");
        assert_eq!(
            refs,
            vec![Ref::Number(1), Ref::Symbol(2, 2), Ref::Literal(1, 0)]
        );
    }
}
