use num_enum::IntoPrimitive;
use strum::{Display, EnumString};

/// Instruction mnemonics of the pseudo-machine. The discriminant is the
/// machine opcode number emitted in pass two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, EnumString, Display)]
#[repr(u8)]
pub enum OpKind {
    STOP = 0,
    ADD = 1,
    SUB = 2,
    MULT = 3,
    MOVER = 4,
    MOVEM = 5,
    COMP = 6,
    BC = 7,
    DIV = 8,
    READ = 9,
    PRINT = 10,
    JMP = 11,
}

impl OpKind {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_ascii_uppercase().parse::<Self>() {
            Ok(a) => Ok(a),
            Err(_) => Err(format!("Undefined op: {s}")),
        }
    }

    /// Machine opcode number.
    pub fn code(self) -> u8 {
        self.into()
    }
}

#[test]
fn test() {
    assert_eq!(OpKind::parse("mover"), Ok(OpKind::MOVER));
    assert_eq!(OpKind::parse("MOVER").unwrap().code(), 4);
    assert_eq!(OpKind::parse("stop").unwrap().code(), 0);
    assert!(OpKind::parse("hoge").is_err());
}
