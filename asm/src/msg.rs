use color_print::cprintln;

/// Source position carried by a diagnostic.
#[derive(Debug, Clone)]
pub struct Loc {
    pub path: String,
    pub line_no: usize,
    pub raw: String,
}

#[derive(Debug, Clone)]
struct Msg {
    text: String,
    loc: Option<Loc>,
}

impl Msg {
    fn print(&self) {
        cprintln!("<yellow,bold>warn</>: {}", self.text);
        if let Some(loc) = &self.loc {
            cprintln!("     <blue>--></> <underline>{}:{}</>", loc.path, loc.line_no);
            cprintln!("      <blue>|</>");
            cprintln!(" <blue>{:>4} |</> {}", loc.line_no, loc.raw);
            cprintln!("      <blue>|</>");
        }
    }
}

/// Side-channel warnings. Collecting a message never alters control flow;
/// fatal conditions travel through `error::Error` instead.
#[derive(Debug, Default)]
pub struct Msgs(Vec<Msg>);

impl Msgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, text: String, loc: Option<Loc>) {
        self.0.push(Msg { text, loc });
    }

    pub fn warns(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn dump(&self) {
        for msg in &self.0 {
            msg.print();
        }
    }
}
