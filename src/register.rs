//! The general purpose registers of the shading processor. There are four of them, each six
//! bits wide, spelled `R0`..`R3` in assembly source.

use strum_macros::{Display as StrumDisplay, EnumString, IntoStaticStr};
use num_enum::IntoPrimitive;

/// Size of the register file.
pub const REGISTER_COUNT: usize = 4;

#[derive(
StrumDisplay, IntoStaticStr, EnumString, IntoPrimitive,
Clone,        Copy,          Eq, PartialEq, Debug, Hash
)]
#[repr(u8)]
pub enum Register {
  R0,
  R1,
  R2,
  R3
}

impl Register {
  /// The two bit field value identifying this register inside an instruction word.
  pub fn code(&self) -> u8 {
    Into::<u8>::into(*self)
  }

  /// Recovers a register from a two bit instruction word field. Bits above the field
  /// width are ignored, so any byte maps to some register.
  pub fn from_code(code: u8) -> Register {
    match code & 0b11 {
      0b00 => Register::R0,
      0b01 => Register::R1,
      0b10 => Register::R2,
      _    => Register::R3
    }
  }

  /// Converts the register to an index into the register file.
  pub fn idx(&self) -> usize {
    self.code() as usize
  }
}


#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use super::*;

  #[test]
  fn register_names_round_trip() {
    for code in 0..REGISTER_COUNT as u8 {
      let register = Register::from_code(code);
      assert_eq!(register.code(), code);
      assert_eq!(Register::from_str(&register.to_string()), Ok(register));
    }
  }

  #[test]
  fn register_names_are_exact() {
    assert!(Register::from_str("R4").is_err());
    assert!(Register::from_str("r0").is_err());
    assert!(Register::from_str("R03").is_err());
    assert!(Register::from_str("X0").is_err());
  }

  #[test]
  fn from_code_ignores_high_bits() {
    assert_eq!(Register::from_code(0b0000_0110), Register::R2);
    assert_eq!(Register::from_code(0b1111_1111), Register::R3);
  }
}
