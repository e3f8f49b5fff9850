use num_enum::IntoPrimitive;
use strum::{Display, EnumString};

/// General-purpose registers. The discriminant is the register code used
/// in intermediate code and machine code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, EnumString, Display)]
#[repr(u8)]
pub enum Reg {
    AREG = 1,
    BREG = 2,
    CREG = 3,
    DREG = 4,
}

impl Reg {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_ascii_uppercase().parse::<Self>() {
            Ok(a) => Ok(a),
            Err(_) => Err(format!("Unknown reg name: {s}")),
        }
    }

    pub fn code(self) -> u8 {
        self.into()
    }

    /// Register-like operand, including names outside the four known regs.
    pub fn is_reg_name(s: &str) -> bool {
        Self::parse(s).is_ok() || s.to_ascii_uppercase().ends_with("REG")
    }
}

#[test]
fn test() {
    assert_eq!(Reg::parse("areg"), Ok(Reg::AREG));
    assert_eq!(Reg::parse("DREG").unwrap().code(), 4);
    assert!(Reg::parse("hoge").is_err());
    assert!(Reg::is_reg_name("EREG"));
    assert!(!Reg::is_reg_name("L1"));
}
