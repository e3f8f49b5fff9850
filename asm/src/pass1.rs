use std::{fs, path::Path};

use arch::{dir::DirKind, op::OpKind, reg::Reg};
use color_print::cprintln;

use crate::{
    error::Error,
    expr,
    msg::{Loc, Msgs},
    record::{Kind, Record, Ref},
    tables::{LitTab, PoolTab, SymTab},
    token,
};

/// Pass-one session: owns the symbol table, literal table, pool table,
/// location counter and intermediate record stream.
#[derive(Debug, Default)]
pub struct Pass1 {
    pub symtab: SymTab,
    pub littab: LitTab,
    pub pooltab: PoolTab,
    pub records: Vec<Record>,
    lc: i32,
    done: bool,
}

impl Pass1 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lc(&self) -> i32 {
        self.lc
    }

    pub fn done(&self) -> bool {
        self.done
    }

    /// Run pass one over raw source lines. Processing stops after the line
    /// carrying the `END` directive.
    pub fn run(path: &str, lines: &[String]) -> (Self, Msgs) {
        let mut pass = Self::new();
        let mut msgs = Msgs::new();
        for (idx, raw) in lines.iter().enumerate() {
            let loc = Loc {
                path: path.to_string(),
                line_no: idx + 1,
                raw: raw.clone(),
            };
            pass.feed(&loc, raw, &mut msgs);
            if pass.done {
                break;
            }
        }
        (pass, msgs)
    }

    /// Process one source line.
    pub fn feed(&mut self, loc: &Loc, raw: &str, msgs: &mut Msgs) {
        if self.done {
            return;
        }
        let toks = token::tokenize(raw);
        if toks.is_empty() {
            return;
        }

        // 1. Leading label: present iff the first token is no keyword
        let is_keyword =
            DirKind::parse(&toks[0]).is_ok() || OpKind::parse(&toks[0]).is_ok();
        let (label, rest) = if is_keyword {
            (None, &toks[..])
        } else {
            (Some(toks[0].as_str()), &toks[1..])
        };

        // a bare label with no statement binds nothing
        let Some(op_tok) = rest.first() else { return };
        let args = &rest[1..];

        // 2. Bind the label to the current LC. First definition wins.
        if let Some(label) = label {
            self.symtab.define(label, self.lc);
        }

        // 3. Dispatch on the directive or opcode
        if let Ok(dir) = DirKind::parse(op_tok) {
            self.directive(dir, label, args, loc, msgs);
        } else if let Ok(op) = OpKind::parse(op_tok) {
            self.instruction(op, args);
        } else {
            // 4. Unrecognized statement: passthrough record, LC untouched
            let operand = args.join(" ");
            self.push(Kind::Unknown, op_tok, (!operand.is_empty()).then_some(operand));
        }
    }

    fn directive(
        &mut self,
        dir: DirKind,
        label: Option<&str>,
        args: &[String],
        loc: &Loc,
        msgs: &mut Msgs,
    ) {
        match dir {
            DirKind::START => {
                if !self.records.is_empty() {
                    msgs.warn("START after other statements.".to_string(), Some(loc.clone()));
                }
                self.lc = match args.first() {
                    Some(tok) => tok.parse().unwrap_or_else(|_| {
                        msgs.warn(
                            format!("Invalid START operand `{}`. Default LC=0.", tok),
                            Some(loc.clone()),
                        );
                        0
                    }),
                    None => 0,
                };
                self.push(Kind::AD, "START", Some(Ref::Constant(self.lc, 0).render()));
            }

            DirKind::END => {
                self.push(Kind::AD, "END", None);
                self.flush_pool(msgs);
                self.done = true;
            }

            DirKind::LTORG => {
                self.push(Kind::AD, "LTORG", None);
                self.flush_pool(msgs);
            }

            DirKind::ORIGIN => {
                let raw_expr = args.first().map(String::as_str).unwrap_or("");
                let target = expr::eval(raw_expr, &self.symtab, self.lc, msgs);
                let operand = self.origin_ref(raw_expr, target);
                self.push(Kind::AD, "ORIGIN", Some(operand));
                self.lc = target;
            }

            DirKind::EQU => {
                let Some(label) = label else {
                    msgs.warn("EQU without label. Line skipped.".to_string(), Some(loc.clone()));
                    return;
                };
                let raw_expr = args.first().map(String::as_str).unwrap_or("");
                let val = expr::eval(raw_expr, &self.symtab, self.lc, msgs);
                self.symtab.equ(label, val);
                self.push(Kind::AD, "EQU", Some(format!("{}={}", label, raw_expr)));
            }

            DirKind::DS => {
                let Some(_) = label else {
                    msgs.warn("DS without label. Line skipped.".to_string(), Some(loc.clone()));
                    return;
                };
                let size = match args.first() {
                    Some(tok) => tok.parse().unwrap_or_else(|_| {
                        msgs.warn(
                            format!("Invalid DS size `{}`. Default 1.", tok),
                            Some(loc.clone()),
                        );
                        1
                    }),
                    None => 1,
                };
                self.push(Kind::DL, "DS", Some(Ref::Constant(size, 0).render()));
                self.lc += size;
            }

            DirKind::DC => {
                let Some(label) = label else {
                    msgs.warn("DC without label. Line skipped.".to_string(), Some(loc.clone()));
                    return;
                };
                let val_tok = args.first().map(String::as_str).unwrap_or("0");
                let cleaned = token::strip_quotes(val_tok).to_string();
                let val = cleaned.parse().unwrap_or_else(|_| {
                    msgs.warn(
                        format!("Non-numeric DC value `{}`. Using 0.", cleaned),
                        Some(loc.clone()),
                    );
                    0
                });
                self.symtab.set_value(label, cleaned);
                self.push(Kind::DL, "DC", Some(Ref::Constant(val, 0).render()));
                self.lc += 1;
            }
        }
    }

    fn instruction(&mut self, op: OpKind, args: &[String]) {
        let mut parts: Vec<String> = Vec::new();
        for opd in args {
            let opd = opd.trim();
            if opd.is_empty() {
                continue;
            }
            if opd.starts_with('=') {
                self.littab.register(opd);
                let i = self.littab.ref_index(opd).unwrap_or(0);
                parts.push(Ref::Literal(i, 0).render());
            } else if let Ok(reg) = Reg::parse(opd) {
                parts.push(Ref::Number(reg.code() as i32).render());
            } else if Reg::is_reg_name(opd) {
                // register-like name outside the known set: keep verbatim
                parts.push(opd.to_string());
            } else if let Ok(n) = opd.parse::<i32>() {
                parts.push(Ref::Constant(n, 0).render());
            } else if opd.starts_with('\'') || opd.starts_with('"') {
                let n = token::strip_quotes(opd).parse().unwrap_or(0);
                parts.push(Ref::Constant(n, 0).render());
            } else {
                let (term, off) = split_offset(opd);
                self.symtab.touch(term);
                let i = self.symtab.ref_index(term).unwrap_or(0);
                parts.push(Ref::Symbol(i, off).render());
            }
        }
        let operand = parts.join(" ");
        self.push(Kind::IS, &op.to_string(), (!operand.is_empty()).then_some(operand));
        self.lc += 1;
    }

    /// Render an ORIGIN expression as a reference token. Falls back to the
    /// already-evaluated target when the base term has no table index.
    fn origin_ref(&self, raw: &str, target: i32) -> String {
        let (term, off) = split_offset(raw.trim());
        if let Ok(n) = term.parse::<i32>() {
            return Ref::Constant(n, off).render();
        }
        if let Some(i) = self.symtab.ref_index(term) {
            return Ref::Symbol(i, off).render();
        }
        if let Some(i) = self.littab.ref_index(term) {
            return Ref::Literal(i, off).render();
        }
        Ref::Constant(target, 0).render()
    }

    /// Assign addresses to the unaddressed literals of the current pool.
    /// A new pool entry is appended only when at least one literal was
    /// assigned.
    fn flush_pool(&mut self, msgs: &mut Msgs) {
        let start = self.pooltab.current_start();
        let mut assigned = false;
        for i in start..self.littab.len() {
            let Some(lit) = self.littab.get(i) else { break };
            if lit.address.is_some() {
                continue;
            }
            let text = lit.text.clone();
            let val = LitTab::value_of(&text).unwrap_or_else(|| {
                msgs.warn(format!("Non-numeric literal `{}`. Using 0.", text), None);
                0
            });
            self.littab.set_address(i, self.lc);
            self.records.push(Record::new(
                self.lc,
                Kind::LT,
                "LITERAL",
                Some(format!("{} {}", text, Ref::Constant(val, 0).render())),
            ));
            self.lc += 1;
            assigned = true;
        }
        if assigned {
            self.pooltab.push(self.littab.len());
        }
    }

    fn push(&mut self, kind: Kind, op: &str, operand: Option<String>) {
        self.records.push(Record::new(self.lc, kind, op, operand));
    }

    /// Write the four pass-one artifacts into `dir`.
    pub fn write_artifacts(&self, dir: &Path) -> Result<(), Error> {
        fs::create_dir_all(dir).map_err(|e| Error::DirCreate(dir.display().to_string(), e))?;
        write_file(&dir.join("symtab.txt"), &self.symtab.render())?;
        write_file(&dir.join("littab.txt"), &self.littab.render())?;
        write_file(&dir.join("pooltab.txt"), &self.pooltab.render())?;
        let ic: String = self.records.iter().map(|r| format!("{}\n", r)).collect();
        write_file(&dir.join("intermediate.txt"), &ic)?;
        Ok(())
    }

    /// Pretty-print the tables and record stream.
    pub fn dump(&self) {
        cprintln!("<bold>----- Intermediate Code -----</>");
        for rec in &self.records {
            println!("{}", rec);
        }
        cprintln!("<bold>----- Symbol Table -----</>");
        cprintln!("<bold>{:<10} {:<10} {:<10}</>", "Symbol", "Address", "Value");
        print!("{}", self.symtab.render());
        cprintln!("<bold>----- Literal Table -----</>");
        cprintln!("<bold>{:<6} {:<15} {:<8}</>", "Idx", "Literal", "Address");
        print!("{}", self.littab.render());
        cprintln!("<bold>----- Pool Table -----</>");
        cprintln!("<bold>{:<6} {:<10}</>", "Idx", "Start");
        print!("{}", self.pooltab.render());
    }
}

/// Split `TERM+n`/`TERM-n` into the base term and its signed offset. The
/// sign is never taken from position 0, so negative numbers stay whole.
fn split_offset(s: &str) -> (&str, i32) {
    let tail = s.get(1..).unwrap_or("");
    if let Some(pos) = tail.find(['+', '-']).map(|p| p + 1) {
        let (term, rest) = s.split_at(pos);
        if let Ok(off) = rest.parse::<i32>() {
            return (term.trim(), off);
        }
    }
    (s, 0)
}

fn write_file(path: &Path, content: &str) -> Result<(), Error> {
    fs::write(path, content).map_err(|e| Error::FileWrite(path.display().to_string(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(src: &[&str]) -> (Pass1, Msgs) {
        let lines: Vec<String> = src.iter().map(|s| s.to_string()).collect();
        Pass1::run("test.ps", &lines)
    }

    #[test]
    fn test_scenario_literal_pool() {
        let (pass, msgs) = run(&[
            "START 100",
            "L1 MOVER AREG ='5'",
            "L2 ADD AREG ='5'",
            "LTORG",
            "END",
        ]);
        assert!(msgs.is_empty());

        assert_eq!(pass.symtab.get("L1").unwrap().address, Some(100));
        assert_eq!(pass.symtab.get("L2").unwrap().address, Some(101));

        assert_eq!(pass.littab.len(), 1);
        let lit = pass.littab.get(0).unwrap();
        assert_eq!(lit.text, "='5'");
        assert_eq!(lit.address, Some(102));

        assert_eq!(pass.pooltab.entries(), &[0, 1]);

        let kinds: Vec<Kind> = pass.records.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![Kind::AD, Kind::IS, Kind::IS, Kind::AD, Kind::LT, Kind::AD]
        );
        assert_eq!(pass.records[1].to_string(), "0100\t(IS)\tMOVER\t(1) (L,1)");
        assert_eq!(pass.records[2].to_string(), "0101\t(IS)\tADD\t(1) (L,1)");
        assert_eq!(pass.records[4].to_string(), "0102\t(LT)\tLITERAL\t='5' (C,5)");
    }

    #[test]
    fn test_scenario_equ() {
        let (pass, msgs) = run(&["A EQU 5+3", "END"]);
        assert!(msgs.is_empty());
        let sym = pass.symtab.get("A").unwrap();
        assert_eq!(sym.address, Some(8));
        assert_eq!(sym.value.as_deref(), Some("8"));
    }

    #[test]
    fn test_scenario_origin_forward_reference() {
        let (pass, msgs) = run(&["ORIGIN X+2", "END"]);
        assert_eq!(msgs.warns(), 1);
        assert_eq!(pass.lc(), 2);
        // no table index for X: the record falls back to the evaluated LC
        assert_eq!(pass.records[0].operand.as_deref(), Some("(C,2)"));
    }

    #[test]
    fn test_origin_symbol_reference() {
        let (pass, msgs) = run(&["START 100", "L1 MOVER AREG BETA", "ORIGIN L1+1", "END"]);
        assert!(msgs.is_empty());
        // L1 is symbol 1, BETA symbol 2
        assert_eq!(pass.records[2].operand.as_deref(), Some("(S,1)+1"));
        assert_eq!(pass.lc(), 101);
    }

    #[test]
    fn test_ds_advances_lc() {
        let (pass, msgs) = run(&["START 100", "A DS 3", "B DC '7'", "END"]);
        assert!(msgs.is_empty());
        assert_eq!(pass.symtab.get("A").unwrap().address, Some(100));
        assert_eq!(pass.symtab.get("B").unwrap().address, Some(103));
        assert_eq!(pass.symtab.get("B").unwrap().value.as_deref(), Some("7"));
        assert_eq!(pass.lc(), 104);
        assert_eq!(pass.records[1].operand.as_deref(), Some("(C,3)"));
        assert_eq!(pass.records[2].operand.as_deref(), Some("(C,7)"));
    }

    #[test]
    fn test_missing_label_skips_line() {
        let (pass, msgs) = run(&["START 100", "DS 5", "EQU 3", "DC '1'", "END"]);
        assert_eq!(msgs.warns(), 3);
        assert_eq!(pass.lc(), 100);
        // only START and END records
        assert_eq!(pass.records.len(), 2);
        assert!(pass.symtab.is_empty());
    }

    #[test]
    fn test_forward_reference_stays_undefined() {
        let (pass, _) = run(&["START 100", "MOVER AREG NEXT", "END"]);
        let sym = pass.symtab.get("NEXT").unwrap();
        assert!(!sym.defined);
        assert_eq!(sym.address, None);
    }

    #[test]
    fn test_label_rebinding_is_ignored() {
        let (pass, _) = run(&["START 100", "L1 MOVER AREG BETA", "L1 ADD AREG BETA", "END"]);
        assert_eq!(pass.symtab.get("L1").unwrap().address, Some(100));
    }

    #[test]
    fn test_unknown_statement_passthrough() {
        let (pass, msgs) = run(&["START 100", "FROB AREG", "END"]);
        assert!(msgs.is_empty());
        let rec = &pass.records[1];
        assert_eq!(rec.kind, Kind::Unknown);
        assert_eq!(rec.op, "FROB");
        assert_eq!(rec.operand.as_deref(), Some("AREG"));
        // unknown lines never advance the LC
        assert_eq!(rec.lc, 100);
        assert_eq!(pass.records[2].lc, 100);
    }

    #[test]
    fn test_ltorg_without_pending_literals() {
        let (pass, msgs) = run(&["START 100", "LTORG", "LTORG", "END"]);
        assert!(msgs.is_empty());
        assert_eq!(pass.pooltab.entries(), &[0]);
        assert_eq!(pass.lc(), 100);
    }

    #[test]
    fn test_two_pools() {
        let (pass, msgs) = run(&[
            "START 100",
            "MOVER AREG ='5'",
            "LTORG",
            "MOVER AREG ='9'",
            "MOVER BREG ='5'",
            "END",
        ]);
        assert!(msgs.is_empty());
        // ='5' reappears after the flush: identity is exact text, so the
        // already-assigned entry is reused
        assert_eq!(pass.littab.len(), 2);
        assert_eq!(pass.littab.get(0).unwrap().address, Some(101));
        assert_eq!(pass.littab.get(1).unwrap().address, Some(104));
        assert_eq!(pass.pooltab.entries(), &[0, 1, 2]);
    }

    #[test]
    fn test_compact_start() {
        let (pass, msgs) = run(&["START200", "END"]);
        assert!(msgs.is_empty());
        assert_eq!(pass.records[0].operand.as_deref(), Some("(C,200)"));
        assert_eq!(pass.lc(), 200);
    }

    #[test]
    fn test_invalid_start_operand_defaults() {
        let (pass, msgs) = run(&["START XY", "END"]);
        assert_eq!(msgs.warns(), 1);
        assert_eq!(pass.lc(), 0);
    }

    #[test]
    fn test_symbol_with_offset_operand() {
        let (pass, msgs) = run(&["START 100", "L1 MOVER AREG L1+2", "END"]);
        assert!(msgs.is_empty());
        assert_eq!(pass.records[1].operand.as_deref(), Some("(1) (S,1)+2"));
    }
}
