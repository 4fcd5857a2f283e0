
use std::convert::TryFrom;
use std::fmt::{Display, Formatter};

use strum_macros::{Display as StrumDisplay, EnumString, IntoStaticStr};
use num_enum::{TryFromPrimitive, IntoPrimitive};

use crate::register::Register;

/**
  Opcodes of the shading processor.

  Rust stores enum variants as bytes. As in C, enum values are represented by consecutive
  natural numbers and can be treated as numeric types. Therefore, we list the sixteen
  single operand opcodes first (each discriminant equals its six bit opcode field), then
  the eight dual operand opcodes, then the immediate load, then the pseudo instruction,
  so that a given opcode's format can be determined with a trivial comparison.
  Consequently, the order the opcodes are listed below is significant.
  Order-dependencies:
      ```
      Operation::format()
      Operation::all()
      ```
*/
#[derive(
StrumDisplay, IntoStaticStr, EnumString, TryFromPrimitive, IntoPrimitive,
Clone,        Copy,          Eq, PartialEq,  Debug,            Hash
)]
#[repr(u8)]
pub enum Operation {
  // Single operand opcodes //
  // Output //
  #[strum(serialize = "SETRGB")]
  SetRgb,            // RGB <= RA
  #[strum(serialize = "SETR")]
  SetR,              // R <= RA[1:0]
  #[strum(serialize = "SETG")]
  SetG,              // G <= RA[1:0]
  #[strum(serialize = "SETB")]
  SetB,              // B <= RA[1:0]

  // Input //
  #[strum(serialize = "GETX")]
  GetX,              // RA <= X
  #[strum(serialize = "GETY")]
  GetY,              // RA <= Y
  #[strum(serialize = "GETTIME")]
  GetTime,           // RA <= TIME
  #[strum(serialize = "GETUSER")]
  GetUser,           // RA <= USER

  // Branches //
  #[strum(serialize = "IFEQ")]
  IfEq,              // TAKE <= RA == REG0
  #[strum(serialize = "IFNE")]
  IfNe,              // TAKE <= RA != REG0
  #[strum(serialize = "IFGE")]
  IfGe,              // TAKE <= RA >= REG0
  #[strum(serialize = "IFLT")]
  IfLt,              // TAKE <= RA < REG0

  #[strum(serialize = "DOUBLE")]
  Double,            // RA <= RA * 2
  #[strum(serialize = "HALF")]
  Half,              // RA <= RA / 2
  #[strum(serialize = "CLEAR")]
  Clear,             // RA <= 0
  #[strum(serialize = "SINE")]
  Sine,              // RA <= SINE[REG0]
  // Opcode 16

  // Dual operand opcodes //
  #[strum(serialize = "AND")]
  And,               // RA <= RA & RB
  #[strum(serialize = "OR")]
  Or,                // RA <= RA | RB
  #[strum(serialize = "NOT")]
  Not,               // RA <= ~RB
  #[strum(serialize = "XOR")]
  Xor,               // RA <= RA ^ RB
  #[strum(serialize = "MOV")]
  Mov,               // RA <= RB
  #[strum(serialize = "ADD")]
  Add,               // RA <= RA + RB
  #[strum(serialize = "SHIFTL")]
  ShiftL,            // RA <= RA << RB
  #[strum(serialize = "SHIFTR")]
  ShiftR,            // RA <= RA >> RB
  // Opcode 24

  // Immediate opcode //
  #[strum(serialize = "LDI")]
  Ldi,               // REG0 <= IMMEDIATE

  // Pseudo instruction //
  #[strum(serialize = "NOP")]
  Nop,               // R0 <= R0 & R0

}

pub const MAX_SINGLE_OPERAND_OPCODE : u8 = 16u8;
pub const MAX_DUAL_OPERAND_OPCODE   : u8 = 24u8;
pub const MAX_IMMEDIATE_OPCODE      : u8 = 25u8;
pub const OPERATION_COUNT           : u8 = 26u8;

/// The instruction word layouts. Every word is exactly eight bits; the layouts differ in
/// how those bits are split between opcode and operand fields.
#[derive(StrumDisplay, Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub enum Format {
  /// [Opcode:2][Immediate:6]
  Immediate,
  /// [Opcode:6][RA:2]
  SingleOperand,
  /// [Opcode:4][RB:2][RA:2]
  DualOperand,
  /// [Word:8], a fixed bit pattern with no operand fields
  Pseudo,
}

impl Format {
  /// Number of operand tokens the format takes in assembly source.
  pub fn arity(&self) -> usize {
    match self {
      Format::Immediate     => 1,
      Format::SingleOperand => 1,
      Format::DualOperand   => 2,
      Format::Pseudo        => 0,
    }
  }

  /// Operand placeholders for the instruction set summary.
  pub fn syntax(&self) -> &'static str {
    match self {
      Format::Immediate     => "IMMEDIATE",
      Format::SingleOperand => "RA",
      Format::DualOperand   => "RA RB",
      Format::Pseudo        => "",
    }
  }
}

/// Instruction categories, used to group the instruction set summary.
#[derive(StrumDisplay, Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub enum Category {
  Output,
  Input,
  Branches,
  Arithmetic,
  Load,
  Special,
  Boolean,
  Move,
  Shift,
  Pseudo,
}

/// The order in which the instruction set summary lists the categories.
pub const CATEGORY_ORDER: [Category; 10] = [
  Category::Output,
  Category::Input,
  Category::Branches,
  Category::Arithmetic,
  Category::Load,
  Category::Special,
  Category::Boolean,
  Category::Move,
  Category::Shift,
  Category::Pseudo,
];

/// Holds the unencoded components of an instruction. As such, it enumerates the possible
/// operand combinations of the four word layouts.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Instruction {
  /// [Opcode:2][Immediate:6]
  Immediate {
    opcode    : Operation,
    immediate : u8
  },
  /// [Opcode:6][RA:2]
  SingleOperand {
    opcode : Operation,
    ra     : Register
  },
  /// [Opcode:4][RB:2][RA:2]
  DualOperand {
    opcode : Operation,
    ra     : Register,
    rb     : Register
  },
  /// [Word:8]
  Pseudo(Operation),
}

impl Instruction {
  pub fn opcode(&self) -> Operation {
    match self {
      Instruction::Immediate     { opcode, .. } => *opcode,
      Instruction::SingleOperand { opcode, .. } => *opcode,
      Instruction::DualOperand   { opcode, .. } => *opcode,
      Instruction::Pseudo(opcode)               => *opcode,
    }
  }
}

impl Display for Instruction {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {

      Instruction::Immediate { opcode, immediate } => {
        write!(f, "{} {}", opcode, immediate)
      }

      Instruction::SingleOperand { opcode, ra } => {
        write!(f, "{} {}", opcode, ra)
      }

      Instruction::DualOperand { opcode, ra, rb } => {
        write!(f, "{} {} {}", opcode, ra, rb)
      }

      Instruction::Pseudo(opcode) => {
        write!(f, "{}", opcode)
      }

    }
  }
}

impl Operation {
  pub fn code(&self) -> u8 {
    Into::<u8>::into(*self)
  }

  /// Iterates over the complete instruction catalog in opcode order.
  pub fn all() -> impl Iterator<Item = Operation> {
    (0..OPERATION_COUNT).filter_map(|value| Operation::try_from(value).ok())
  }

  pub fn format(&self) -> Format {
    match self.code() {
      value if value < MAX_SINGLE_OPERAND_OPCODE => Format::SingleOperand,
      value if value < MAX_DUAL_OPERAND_OPCODE   => Format::DualOperand,
      value if value < MAX_IMMEDIATE_OPCODE      => Format::Immediate,
      _value                                     => Format::Pseudo
    }
  }

  pub fn arity(&self) -> usize {
    self.format().arity()
  }

  /**
    The fixed opcode bit pattern identifying this instruction within its word layout:
    six bits for a single operand opcode, four for dual operand, two for the immediate
    load, and the entire word for a pseudo instruction.
  */
  pub fn opcode_bits(&self) -> u8 {
    match self {
      // Single operand, six bits
      Operation::SetRgb  => 0b00_0000,
      Operation::SetR    => 0b00_0001,
      Operation::SetG    => 0b00_0010,
      Operation::SetB    => 0b00_0011,
      Operation::GetX    => 0b00_0100,
      Operation::GetY    => 0b00_0101,
      Operation::GetTime => 0b00_0110,
      Operation::GetUser => 0b00_0111,
      Operation::IfEq    => 0b00_1000,
      Operation::IfNe    => 0b00_1001,
      Operation::IfGe    => 0b00_1010,
      Operation::IfLt    => 0b00_1011,
      Operation::Double  => 0b00_1100,
      Operation::Half    => 0b00_1101,
      Operation::Clear   => 0b00_1110,
      Operation::Sine    => 0b00_1111,

      // Dual operand, four bits
      Operation::And     => 0b01_00,
      Operation::Or      => 0b01_01,
      Operation::Not     => 0b01_10,
      Operation::Xor     => 0b01_11,
      Operation::Mov     => 0b10_00,
      Operation::Add     => 0b10_01,
      Operation::ShiftL  => 0b10_10,
      Operation::ShiftR  => 0b10_11,

      // Immediate, two bits
      Operation::Ldi     => 0b11,

      // Pseudo, the whole word
      Operation::Nop     => 0b01_00_00_00,
    }
  }

  /// Register transfer description, as the hardware documentation writes it.
  pub fn synopsis(&self) -> &'static str {
    match self {
      Operation::SetRgb  => "RGB <= RA",
      Operation::SetR    => "R <= RA[1:0]",
      Operation::SetG    => "G <= RA[1:0]",
      Operation::SetB    => "B <= RA[1:0]",
      Operation::GetX    => "RA <= X",
      Operation::GetY    => "RA <= Y",
      Operation::GetTime => "RA <= TIME",
      Operation::GetUser => "RA <= USER",
      Operation::IfEq    => "TAKE <= RA == REG0",
      Operation::IfNe    => "TAKE <= RA != REG0",
      Operation::IfGe    => "TAKE <= RA >= REG0",
      Operation::IfLt    => "TAKE <= RA < REG0",
      Operation::Double  => "RA <= RA * 2",
      Operation::Half    => "RA <= RA / 2",
      Operation::Clear   => "RA <= 0",
      Operation::Sine    => "RA <= SINE[REG0]",
      Operation::And     => "RA <= RA & RB",
      Operation::Or      => "RA <= RA | RB",
      Operation::Not     => "RA <= ~RB",
      Operation::Xor     => "RA <= RA ^ RB",
      Operation::Mov     => "RA <= RB",
      Operation::Add     => "RA <= RA + RB",
      Operation::ShiftL  => "RA <= RA << RB",
      Operation::ShiftR  => "RA <= RA >> RB",
      Operation::Ldi     => "REG0 <= IMMEDIATE",
      Operation::Nop     => "R0 <= R0 & R0",
    }
  }

  /// One line prose description for the instruction set summary.
  pub fn description(&self) -> &'static str {
    match self {
      Operation::SetRgb  => "Set the output color to the value of register RA.",
      Operation::SetR    => "Set the red output channel to the lower two bits of register RA.",
      Operation::SetG    => "Set the green output channel to the lower two bits of register RA.",
      Operation::SetB    => "Set the blue output channel to the lower two bits of register RA.",
      Operation::GetX    => "Set register RA to the x position of the current pixel.",
      Operation::GetY    => "Set register RA to the y position of the current pixel.",
      Operation::GetTime => "Set register RA to the time value, which increases with each frame.",
      Operation::GetUser => "Set register RA to the externally supplied user value.",
      Operation::IfEq    => "Execute the next instruction if RA equals register 0.",
      Operation::IfNe    => "Execute the next instruction if RA does not equal register 0.",
      Operation::IfGe    => "Execute the next instruction if RA is greater than or equal to register 0.",
      Operation::IfLt    => "Execute the next instruction if RA is less than register 0.",
      Operation::Double  => "Double the value of register RA.",
      Operation::Half    => "Halve the value of register RA.",
      Operation::Clear   => "Clear register RA by writing 0.",
      Operation::Sine    => "Look up the sine value for register 0 and write it into register RA.",
      Operation::And     => "Boolean AND of RA and RB, result written into RA.",
      Operation::Or      => "Boolean OR of RA and RB, result written into RA.",
      Operation::Not     => "Boolean NOT of RB, result written into RA.",
      Operation::Xor     => "Boolean XOR of RA and RB, result written into RA.",
      Operation::Mov     => "Move the value of register RB into register RA.",
      Operation::Add     => "Add RA and RB, result written into RA.",
      Operation::ShiftL  => "Shift RA left by RB places, result written into RA.",
      Operation::ShiftR  => "Shift RA right by RB places, result written into RA.",
      Operation::Ldi     => "Load an immediate value into register 0.",
      Operation::Nop     => "No operation.",
    }
  }

  pub fn category(&self) -> Category {
    match self {
      | Operation::SetRgb
      | Operation::SetR
      | Operation::SetG
      | Operation::SetB    => Category::Output,

      | Operation::GetX
      | Operation::GetY
      | Operation::GetTime
      | Operation::GetUser => Category::Input,

      | Operation::IfEq
      | Operation::IfNe
      | Operation::IfGe
      | Operation::IfLt    => Category::Branches,

      | Operation::Double
      | Operation::Half
      | Operation::Add     => Category::Arithmetic,

      | Operation::Clear
      | Operation::Ldi     => Category::Load,

      Operation::Sine      => Category::Special,

      | Operation::And
      | Operation::Or
      | Operation::Not
      | Operation::Xor     => Category::Boolean,

      Operation::Mov       => Category::Move,

      | Operation::ShiftL
      | Operation::ShiftR  => Category::Shift,

      Operation::Nop       => Category::Pseudo,
    }
  }
}


#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use super::*;

  #[test]
  fn catalog_is_complete() {
    assert_eq!(Operation::all().count(), OPERATION_COUNT as usize);
  }

  #[test]
  fn mnemonics_round_trip() {
    for operation in Operation::all() {
      let mnemonic = operation.to_string();
      assert_eq!(Operation::from_str(&mnemonic), Ok(operation), "mnemonic {}", mnemonic);
    }
  }

  #[test]
  fn mnemonics_are_uppercase() {
    for operation in Operation::all() {
      let mnemonic: &'static str = operation.into();
      assert_eq!(mnemonic, mnemonic.to_uppercase());
    }
  }

  #[test]
  fn formats_partition_the_catalog() {
    assert_eq!(Operation::SetRgb.format(), Format::SingleOperand);
    assert_eq!(Operation::Sine.format(),   Format::SingleOperand);
    assert_eq!(Operation::And.format(),    Format::DualOperand);
    assert_eq!(Operation::ShiftR.format(), Format::DualOperand);
    assert_eq!(Operation::Ldi.format(),    Format::Immediate);
    assert_eq!(Operation::Nop.format(),    Format::Pseudo);
  }

  #[test]
  fn arity_follows_format() {
    assert_eq!(Operation::SetRgb.arity(), 1);
    assert_eq!(Operation::Add.arity(),    2);
    assert_eq!(Operation::Ldi.arity(),    1);
    assert_eq!(Operation::Nop.arity(),    0);
  }

  #[test]
  fn single_operand_discriminants_equal_their_opcode_bits() {
    for operation in Operation::all().filter(|op| op.format() == Format::SingleOperand) {
      assert_eq!(operation.code(), operation.opcode_bits());
    }
  }

  #[test]
  fn opcode_bits_fit_their_fields() {
    for operation in Operation::all() {
      match operation.format() {
        Format::SingleOperand => assert!(operation.opcode_bits() < 1 << 6),
        Format::DualOperand   => assert!(operation.opcode_bits() < 1 << 4),
        Format::Immediate     => assert!(operation.opcode_bits() < 1 << 2),
        Format::Pseudo        => {} // Pseudo patterns use the whole word.
      }
    }
  }

  #[test]
  fn nop_pattern_is_the_self_and_of_register_0() {
    assert_eq!(Operation::Nop.opcode_bits(), Operation::And.opcode_bits() << 4);
  }

  #[test]
  fn every_category_is_inhabited() {
    for category in CATEGORY_ORDER.iter() {
      assert!(
        Operation::all().any(|operation| operation.category() == *category),
        "category {} has no instructions",
        category
      );
    }
  }

  #[test]
  fn instruction_display_echoes_assembly_syntax() {
    let add = Instruction::DualOperand { opcode: Operation::Add, ra: Register::R0, rb: Register::R2 };
    assert_eq!(format!("{}", add), "ADD R0 R2");

    let ldi = Instruction::Immediate { opcode: Operation::Ldi, immediate: 10 };
    assert_eq!(format!("{}", ldi), "LDI 10");

    let getx = Instruction::SingleOperand { opcode: Operation::GetX, ra: Register::R1 };
    assert_eq!(format!("{}", getx), "GETX R1");

    assert_eq!(format!("{}", Instruction::Pseudo(Operation::Nop)), "NOP");
  }

  #[test]
  fn opcode_is_recovered_from_any_variant() {
    let half = Instruction::SingleOperand { opcode: Operation::Half, ra: Register::R3 };
    assert_eq!(half.opcode(), Operation::Half);
    assert_eq!(Instruction::Pseudo(Operation::Nop).opcode(), Operation::Nop);
  }
}
