use strum::{Display, EnumString};

/// Assembler directives handled during pass one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
pub enum DirKind {
    START,
    END,
    LTORG,
    ORIGIN,
    EQU,
    DS,
    DC,
}

impl DirKind {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_ascii_uppercase().parse::<Self>() {
            Ok(a) => Ok(a),
            Err(_) => Err(format!("Undefined directive: {s}")),
        }
    }
}

#[test]
fn test() {
    assert_eq!(DirKind::parse("start"), Ok(DirKind::START));
    assert_eq!(DirKind::parse("LtOrg"), Ok(DirKind::LTORG));
    assert!(DirKind::parse("hoge").is_err());
}
