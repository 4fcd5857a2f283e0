/*!
  This module is responsible for the encoding and decoding of binary instruction words.

  A word is always exactly eight bits. The top two bits select the layout: `00` introduces
  a single operand instruction, `01` and `10` introduce dual operand instructions, and `11`
  introduces the immediate load. Every possible byte therefore decodes to some defined
  instruction, which mirrors the hardware: the shader core never traps on a word it reads
  from program memory. The word `01_00_00_00` is `AND R0 R0`, which writes register 0 back
  to itself; the decoder reports it under its catalog alias `NOP`.
*/
use crate::bytecode::{Instruction, Operation};
use crate::register::Register;

// If you change this you must also change `encode_instruction` and `decode_instruction`.
pub type Word = u8;

/// Mask of the six bit immediate field.
pub const IMMEDIATE_MASK: Word = 0b0011_1111;
/// Mask of a two bit register field.
pub const REGISTER_MASK: Word = 0b0000_0011;
/// The encoding of `NOP`, bit identical to `AND R0 R0`.
pub const NOP_WORD: Word = 0b0100_0000;

/**
  Encodes the instruction into its eight bit word. It is the caller's responsibility to
  use the correct `Instruction` variant for the given opcode; the assembler constructs
  variants from `Operation::format()`, which keeps the two in agreement.
*/
pub fn encode_instruction(instruction: &Instruction) -> Word {
  match instruction {

    Instruction::Immediate { opcode, immediate } => {
      // [Opcode:2][Immediate:6]
      (opcode.opcode_bits() << 6) | (immediate & IMMEDIATE_MASK)
    }

    Instruction::SingleOperand { opcode, ra } => {
      // [Opcode:6][RA:2]
      (opcode.opcode_bits() << 2) | ra.code()
    }

    Instruction::DualOperand { opcode, ra, rb } => {
      // [Opcode:4][RB:2][RA:2]
      (opcode.opcode_bits() << 4) | (rb.code() << 2) | ra.code()
    }

    Instruction::Pseudo(opcode) => opcode.opcode_bits(),
  }
}

/**
  Decodes an eight bit word into an instruction. The layout selector in the top two bits
  covers the whole byte space, so decoding is total and cannot fail.
*/
pub fn decode_instruction(word: Word) -> Instruction {
  if word == NOP_WORD {
    return Instruction::Pseudo(Operation::Nop);
  }

  match word >> 6 {

    0b00 => {
      let opcode = match word >> 2 {
        0b00_0000 => Operation::SetRgb,
        0b00_0001 => Operation::SetR,
        0b00_0010 => Operation::SetG,
        0b00_0011 => Operation::SetB,
        0b00_0100 => Operation::GetX,
        0b00_0101 => Operation::GetY,
        0b00_0110 => Operation::GetTime,
        0b00_0111 => Operation::GetUser,
        0b00_1000 => Operation::IfEq,
        0b00_1001 => Operation::IfNe,
        0b00_1010 => Operation::IfGe,
        0b00_1011 => Operation::IfLt,
        0b00_1100 => Operation::Double,
        0b00_1101 => Operation::Half,
        0b00_1110 => Operation::Clear,
        _         => Operation::Sine
      };
      Instruction::SingleOperand {
        opcode,
        ra: Register::from_code(word)
      }
    }

    0b11 => {
      Instruction::Immediate {
        opcode: Operation::Ldi,
        immediate: word & IMMEDIATE_MASK
      }
    }

    _selector => {
      let opcode = match word >> 4 {
        0b01_00 => Operation::And,
        0b01_01 => Operation::Or,
        0b01_10 => Operation::Not,
        0b01_11 => Operation::Xor,
        0b10_00 => Operation::Mov,
        0b10_01 => Operation::Add,
        0b10_10 => Operation::ShiftL,
        _       => Operation::ShiftR
      };
      Instruction::DualOperand {
        opcode,
        ra: Register::from_code(word),
        rb: Register::from_code(word >> 2)
      }
    }

  }
}

/**
  Renders a word as underscore grouped binary digits aligned to the field boundaries of
  its layout:

    00_0100_01    single operand, `GETX R1`
    10_01_10_00   dual operand,   `ADD R0 R2`
    11_001010     immediate,      `LDI 10`
    01_00_00_00   pseudo,         `NOP`
*/
pub fn format_word(word: Word) -> String {
  match word >> 6 {
    0b00 => format!("{:02b}_{:04b}_{:02b}", word >> 6, (word >> 2) & 0b1111, word & REGISTER_MASK),
    0b11 => format!("{:02b}_{:06b}", word >> 6, word & IMMEDIATE_MASK),
    _    => format!(
              "{:02b}_{:02b}_{:02b}_{:02b}",
              word >> 6,
              (word >> 4) & REGISTER_MASK,
              (word >> 2) & REGISTER_MASK,
              word & REGISTER_MASK
            )
  }
}
