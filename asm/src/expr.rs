use crate::{msg::Msgs, tables::SymTab};

/// Evaluate an operand expression: `term`, `term+term` or `term-term`,
/// where a term is a decimal integer or a symbol name. Only the first
/// operator splits the expression. An empty expression yields the current
/// location counter; an unresolved symbol yields 0 with a warning.
pub fn eval(expr: &str, symtab: &SymTab, lc: i32, msgs: &mut Msgs) -> i32 {
    let expr = expr.trim();
    if expr.is_empty() {
        return lc;
    }
    if let Ok(n) = expr.parse::<i32>() {
        return n;
    }
    if let Some(pos) = expr.find(['+', '-']) {
        let lv = term(expr[..pos].trim(), expr, symtab, msgs);
        let rv = term(expr[pos + 1..].trim(), expr, symtab, msgs);
        return match expr.as_bytes()[pos] {
            b'+' => lv + rv,
            _ => lv - rv,
        };
    }
    term(expr, expr, symtab, msgs)
}

fn term(t: &str, expr: &str, symtab: &SymTab, msgs: &mut Msgs) -> i32 {
    if let Ok(n) = t.parse::<i32>() {
        return n;
    }
    if let Some(sym) = symtab.get(t) {
        if let Some(addr) = sym.address {
            return addr;
        }
        if let Some(val) = &sym.value {
            if let Ok(n) = val.parse::<i32>() {
                return n;
            }
        }
    }
    msgs.warn(
        format!("Symbol `{}` not defined while evaluating `{}`. Using 0.", t, expr),
        None,
    );
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric() {
        let mut msgs = Msgs::new();
        assert_eq!(eval("100", &SymTab::new(), 0, &mut msgs), 100);
        assert_eq!(eval("-5", &SymTab::new(), 0, &mut msgs), -5);
        assert_eq!(eval("5+3", &SymTab::new(), 0, &mut msgs), 8);
        assert_eq!(eval("5-3", &SymTab::new(), 0, &mut msgs), 2);
        assert!(msgs.is_empty());
    }

    #[test]
    fn test_empty_yields_lc() {
        let mut msgs = Msgs::new();
        assert_eq!(eval("", &SymTab::new(), 42, &mut msgs), 42);
        assert!(msgs.is_empty());
    }

    #[test]
    fn test_symbol_address() {
        let mut symtab = SymTab::new();
        symtab.define("L2", 101);
        let mut msgs = Msgs::new();
        assert_eq!(eval("L2", &symtab, 0, &mut msgs), 101);
        assert_eq!(eval("L2+1", &symtab, 0, &mut msgs), 102);
        assert_eq!(eval("L2-1", &symtab, 0, &mut msgs), 100);
        assert!(msgs.is_empty());
    }

    #[test]
    fn test_symbol_value_fallback() {
        let mut symtab = SymTab::new();
        symtab.touch("N");
        symtab.set_value("N", "7".to_string());
        let mut msgs = Msgs::new();
        assert_eq!(eval("N+1", &symtab, 0, &mut msgs), 8);
        assert!(msgs.is_empty());
    }

    #[test]
    fn test_unresolved_symbol_warns_and_zeroes() {
        let mut msgs = Msgs::new();
        assert_eq!(eval("X+2", &SymTab::new(), 0, &mut msgs), 2);
        assert_eq!(msgs.warns(), 1);
    }
}
