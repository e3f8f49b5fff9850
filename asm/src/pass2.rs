use std::{
    fmt, fs,
    io::{BufRead, BufReader},
    path::Path,
};

use arch::op::OpKind;

use crate::{
    error::Error,
    msg::Msgs,
    record::{Kind, Record, Ref},
};

/// One resolved machine-code row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineRow {
    pub lc: i32,
    pub op: String,
    pub reg: String,
    pub operand: String,
}

impl fmt::Display for MachineRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}\t{}\t{}\t{}", self.lc, self.op, self.reg, self.operand)
    }
}

/// Pass-two session: read-only copies of the pass-one artifacts.
#[derive(Debug, Default)]
pub struct Pass2 {
    sym_addrs: Vec<i32>,
    lit_addrs: Vec<i32>,
    records: Vec<Record>,
}

impl Pass2 {
    pub fn from_parts(sym_addrs: Vec<i32>, lit_addrs: Vec<i32>, records: Vec<Record>) -> Self {
        Pass2 {
            sym_addrs,
            lit_addrs,
            records,
        }
    }

    /// Load the pass-one artifacts from `dir`. A missing table file only
    /// warns; a missing intermediate-code file is fatal.
    pub fn load(dir: &Path) -> Result<(Self, Msgs), Error> {
        let mut msgs = Msgs::new();
        let sym_addrs = load_addrs(&dir.join("symtab.txt"), Col::Second, &mut msgs)?;
        let lit_addrs = load_addrs(&dir.join("littab.txt"), Col::Last, &mut msgs)?;

        let ic_path = dir.join("intermediate.txt");
        if !ic_path.exists() {
            return Err(Error::MissingIntermediate(ic_path.display().to_string()));
        }
        let file = fs::File::open(&ic_path)
            .map_err(|e| Error::FileOpen(ic_path.display().to_string(), e))?;
        let mut records = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(Error::FileRead)?;
            let line = line.trim_end();
            if line.trim().is_empty() {
                continue;
            }
            match Record::parse(line) {
                Some(rec) => records.push(rec),
                None => msgs.warn(format!("Unparsable intermediate line: {}", line), None),
            }
        }
        Ok((Self::from_parts(sym_addrs, lit_addrs, records), msgs))
    }

    /// Resolve every record into machine-code rows.
    pub fn resolve(&self) -> (Vec<MachineRow>, Msgs) {
        let mut msgs = Msgs::new();
        let mut rows = Vec::new();
        let mut lc: i32 = 0;

        for rec in &self.records {
            let refs = Ref::scan(rec.operand.as_deref().unwrap_or(""));
            match rec.kind {
                Kind::AD => match rec.op.to_ascii_uppercase().as_str() {
                    "START" => {
                        match first_constant(&refs) {
                            Some(n) => lc = n,
                            None => msgs.warn(
                                format!("START without constant operand: {}", rec),
                                None,
                            ),
                        }
                        rows.push(row(lc, "AD-START", "-", "-"));
                    }
                    "ORIGIN" => {
                        match refs.first() {
                            Some(r) => lc = self.resolve_ref(*r, &mut msgs),
                            None => msgs.warn(
                                format!("ORIGIN without reference operand: {}", rec),
                                None,
                            ),
                        }
                        rows.push(row(lc, "AD-ORIGIN", "-", "-"));
                    }
                    _ => rows.push(row(lc, "AD", "-", "-")),
                },

                Kind::DL => {
                    let value = first_constant(&refs).unwrap_or(0);
                    rows.push(row(lc, "DL", "-", &value.to_string()));
                    // DS reserves `value` words, DC occupies one
                    lc += if rec.op.eq_ignore_ascii_case("DS") { value } else { 1 };
                }

                Kind::LT => {
                    let value = first_constant(&refs).unwrap_or(0);
                    rows.push(row(lc, "LT", "-", &value.to_string()));
                    lc += 1;
                }

                Kind::IS => {
                    let mut reg = String::from("-");
                    let mut operand = String::from("-");
                    for r in refs {
                        match r {
                            Ref::Number(n) => {
                                if reg == "-" {
                                    reg = n.to_string();
                                } else {
                                    operand = n.to_string();
                                }
                            }
                            _ => operand = self.resolve_ref(r, &mut msgs).to_string(),
                        }
                    }
                    let op = match OpKind::parse(&rec.op) {
                        Ok(kind) => format!("{:02}", kind.code()),
                        Err(_) => rec.op.clone(),
                    };
                    rows.push(MachineRow { lc, op, reg, operand });
                    lc += 1;
                }

                Kind::Unknown => {
                    msgs.warn(format!("Unhandled intermediate record: {}", rec), None);
                }
            }
        }
        (rows, msgs)
    }

    /// Base address of a reference plus its signed offset.
    fn resolve_ref(&self, r: Ref, msgs: &mut Msgs) -> i32 {
        match r {
            Ref::Number(n) => n,
            Ref::Constant(n, off) => n + off,
            Ref::Symbol(i, off) => lookup(&self.sym_addrs, i, "Symbol", msgs) + off,
            Ref::Literal(i, off) => lookup(&self.lit_addrs, i, "Literal", msgs) + off,
        }
    }
}

fn row(lc: i32, op: &str, reg: &str, operand: &str) -> MachineRow {
    MachineRow {
        lc,
        op: op.to_string(),
        reg: reg.to_string(),
        operand: operand.to_string(),
    }
}

fn first_constant(refs: &[Ref]) -> Option<i32> {
    refs.iter().find_map(|r| match *r {
        Ref::Constant(n, off) => Some(n + off),
        _ => None,
    })
}

/// 1-based table lookup; out-of-range indices resolve to 0 with a warning.
fn lookup(addrs: &[i32], i: usize, what: &str, msgs: &mut Msgs) -> i32 {
    match i.checked_sub(1).and_then(|i| addrs.get(i)) {
        Some(a) => *a,
        None => {
            msgs.warn(format!("{} index {} out of range. Using 0.", what, i), None);
            0
        }
    }
}

/// Address column of a table artifact.
enum Col {
    /// symtab: `name address value` (the value may contain spaces)
    Second,
    /// littab: `index literal address` (the literal may contain spaces)
    Last,
}

/// Read one address per row, in file order. A `-` (unassigned) or
/// malformed address loads as 0 with a warning so indices never shift.
fn load_addrs(path: &Path, col: Col, msgs: &mut Msgs) -> Result<Vec<i32>, Error> {
    if !path.exists() {
        msgs.warn(
            format!("{} not found. Table treated as empty.", path.display()),
            None,
        );
        return Ok(Vec::new());
    }
    let file = fs::File::open(path).map_err(|e| Error::FileOpen(path.display().to_string(), e))?;
    let mut out = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(Error::FileRead)?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let tok = match col {
            Col::Second => line.split_whitespace().nth(1),
            Col::Last => line.split_whitespace().last(),
        }
        .unwrap_or("-");
        match tok.parse::<i32>() {
            Ok(addr) => out.push(addr),
            Err(_) => {
                msgs.warn(
                    format!("Unresolved address `{}` in {}. Using 0.", tok, path.display()),
                    None,
                );
                out.push(0);
            }
        }
    }
    Ok(out)
}
