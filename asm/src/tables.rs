use indexmap::IndexMap;

// ----------------------------------------------------------------------------
// Symbol table

#[derive(Debug, Clone, Default)]
pub struct Symbol {
    pub address: Option<i32>,
    pub value: Option<String>,
    pub defined: bool,
}

/// Label name to address/value mapping, insertion order preserved.
#[derive(Debug, Default)]
pub struct SymTab(IndexMap<String, Symbol>);

impl SymTab {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure an entry exists. Used when a symbol is referenced as an
    /// operand before its defining line has been seen.
    pub fn touch(&mut self, name: &str) {
        self.0.entry(name.to_string()).or_default();
    }

    /// Bind a label to an address. The first definition is permanent.
    pub fn define(&mut self, name: &str, addr: i32) {
        let sym = self.0.entry(name.to_string()).or_default();
        if !sym.defined {
            sym.address = Some(addr);
            sym.defined = true;
        }
    }

    /// EQU result: address and value are stored unconditionally.
    pub fn equ(&mut self, name: &str, val: i32) {
        let sym = self.0.entry(name.to_string()).or_default();
        sym.address = Some(val);
        sym.value = Some(val.to_string());
        sym.defined = true;
    }

    pub fn set_value(&mut self, name: &str, value: String) {
        self.0.entry(name.to_string()).or_default().value = Some(value);
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.0.get(name)
    }

    /// 1-based index used by `(S,n)` reference tokens.
    pub fn ref_index(&self, name: &str) -> Option<usize> {
        self.0.get_index_of(name).map(|i| i + 1)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Symbol)> {
        self.0.iter()
    }

    /// Artifact rows: `name address|- value|-`.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (name, sym) in self.iter() {
            let addr = sym.address.map_or("-".to_string(), |a| a.to_string());
            let value = sym.value.as_deref().unwrap_or("-");
            out.push_str(&format!("{:<10} {:<10} {:<10}\n", name, addr, value));
        }
        out
    }
}

// ----------------------------------------------------------------------------
// Literal table

#[derive(Debug, Clone)]
pub struct Literal {
    /// Verbatim text, including the leading `=` and quotes.
    pub text: String,
    pub address: Option<i32>,
}

#[derive(Debug, Default)]
pub struct LitTab(Vec<Literal>);

impl LitTab {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a literal. Identity is exact text equality.
    pub fn register(&mut self, text: &str) {
        if !self.0.iter().any(|l| l.text == text) {
            self.0.push(Literal {
                text: text.to_string(),
                address: None,
            });
        }
    }

    /// 1-based index used by `(L,n)` reference tokens.
    pub fn ref_index(&self, text: &str) -> Option<usize> {
        self.0.iter().position(|l| l.text == text).map(|i| i + 1)
    }

    pub fn get(&self, i: usize) -> Option<&Literal> {
        self.0.get(i)
    }

    pub fn set_address(&mut self, i: usize, addr: i32) {
        if let Some(lit) = self.0.get_mut(i) {
            lit.address = Some(addr);
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Literal> {
        self.0.iter()
    }

    /// Numeric value between the quotes, if the literal holds one.
    pub fn value_of(text: &str) -> Option<i32> {
        let body = text.trim_start_matches('=');
        crate::token::strip_quotes(body).parse().ok()
    }

    /// Artifact rows: `index literal address|-`.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, lit) in self.0.iter().enumerate() {
            let addr = lit.address.map_or("-".to_string(), |a| a.to_string());
            out.push_str(&format!("{:<6} {:<15} {:<8}\n", i, lit.text, addr));
        }
        out
    }
}

// ----------------------------------------------------------------------------
// Pool table

/// Pool boundaries: entry `i` is the literal-table index where pool `i`
/// begins. The first pool always starts at 0.
#[derive(Debug)]
pub struct PoolTab(Vec<usize>);

impl Default for PoolTab {
    fn default() -> Self {
        PoolTab(vec![0])
    }
}

impl PoolTab {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_start(&self) -> usize {
        *self.0.last().unwrap_or(&0)
    }

    pub fn push(&mut self, start: usize) {
        self.0.push(start);
    }

    pub fn entries(&self) -> &[usize] {
        &self.0
    }

    /// Artifact rows: `index littab-start-index`.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, start) in self.0.iter().enumerate() {
            out.push_str(&format!("{:<6} {:<10}\n", i, start));
        }
        out
    }
}
