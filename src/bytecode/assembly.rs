/*!
  The human readable textual form of shader programs is called assembly. This module turns
  raw source text into catalog resolved instructions in two passes: a preprocessing pass
  strips comments and blank lines and splits each surviving line into whitespace separated
  tokens, and a resolution pass looks each mnemonic up in the catalog, checks the operand
  count against the format's arity, and parses every operand according to the format.
  Mnemonic and register recognition leverage the `strum` derives of the instruction
  related enums.

  Resolution is all or nothing: the first defect aborts with the offending source line
  number, except for out of range immediates, which are reported as warnings and
  truncated to the six bits that fit the word.
*/

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use nom::{
  bytes::complete::is_not,
  character::complete::{
    char as one_char,
    space0,
    space1
  },
  combinator::{all_consuming, opt, rest},
  multi::many0,
  sequence::{
    delimited,
    pair,
    preceded
  },
  IResult
};

use crate::bytecode::binary::IMMEDIATE_MASK;
use crate::bytecode::{Instruction, Operation, Format};
use crate::register::Register;

/// Everything from this character to the end of the line is commentary.
pub const COMMENT_MARKER: char = '#';

/// One preprocessed instruction line: the one based source line number, the mnemonic
/// token, the operand tokens in source order, and the comment stripped text that listings
/// reproduce as an annotation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SourceLine {
  pub number   : u32,
  pub mnemonic : String,
  pub operands : Vec<String>,
  pub text     : String,
}

/// A fatal assembly error. Each variant carries the one based source line it was
/// triggered on.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AssemblyError {
  /// The mnemonic is absent from the instruction catalog.
  UnknownInstruction {
    line     : u32,
    mnemonic : String
  },
  /// The operand count does not match the arity of the instruction's format.
  ArityMismatch {
    line      : u32,
    operation : Operation,
    expected  : usize,
    found     : usize
  },
  /// A register operand is not one of `R0`..`R3`.
  InvalidRegisterOperand {
    line  : u32,
    token : String
  },
  /// An immediate operand is not an integer.
  InvalidImmediateOperand {
    line  : u32,
    token : String
  },
}

impl Display for AssemblyError {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {

      AssemblyError::UnknownInstruction { line, mnemonic } => {
        write!(f, "Error on line {}: {} is not an instruction.", line, mnemonic)
      }

      AssemblyError::ArityMismatch { line, operation, expected, found } => {
        write!(
          f,
          "Error on line {}: {} requires {} operands but was given {}.",
          line, operation, expected, found
        )
      }

      AssemblyError::InvalidRegisterOperand { line, token } => {
        write!(f, "Error on line {}: {} is not a register (expected R0..R3).", line, token)
      }

      AssemblyError::InvalidImmediateOperand { line, token } => {
        write!(f, "Error on line {}: {} is not an immediate value.", line, token)
      }

    }
  }
}

impl std::error::Error for AssemblyError {}

/// A non fatal diagnostic. Assembly proceeds, and the caller decides whether to surface
/// the message.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AssemblyWarning {
  /// An immediate outside `0..=63`. Only the low six bits reach the instruction word.
  ImmediateOutOfRange {
    line      : u32,
    value     : i64,
    truncated : u8
  },
}

impl Display for AssemblyWarning {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      AssemblyWarning::ImmediateOutOfRange { line, value, truncated } => {
        write!(
          f,
          "Warning on line {}: immediate {} is outside 0..=63 and was truncated to {}.",
          line, value, truncated
        )
      }
    }
  }
}

// A line reduces to its mnemonic and operand tokens, or to nothing at all.
type LineTokens<'a> = Option<(&'a str, Vec<&'a str>)>;

fn token(input: &str) -> IResult<&str, &str> {
  // A token may not contain whitespace or the comment marker. This is how a marker
  // glued to the end of a token still starts a comment.
  is_not(" \t#")(input)
}

fn comment(input: &str) -> IResult<&str, &str> {
  preceded(one_char(COMMENT_MARKER), rest)(input)
}

fn line_tokens(input: &str) -> IResult<&str, LineTokens<'_>> {
  all_consuming(delimited(
    space0,
    opt(pair(token, many0(preceded(space1, token)))),
    pair(space0, opt(comment)),
  ))(input)
}

/**
  Strips comments and blank lines from raw program text and splits each surviving line
  into whitespace separated tokens. Original line numbers are preserved for diagnostics.
*/
pub fn preprocess(source: &str) -> Vec<SourceLine> {
  let mut lines = Vec::new();

  for (index, raw) in source.lines().enumerate() {
    // Windows line endings leave a stray '\r' on the line.
    let raw = raw.trim_end();

    // The token grammar accepts every line; blank and comment only lines reduce to `None`.
    let (mnemonic, operands) = match line_tokens(raw) {
      Ok((_rest, Some(tokens))) => tokens,
      _                         => continue
    };

    let text = match raw.find(COMMENT_MARKER) {
      Some(position) => raw[..position].trim_end(),
      None           => raw
    };

    lines.push(SourceLine {
      number   : index as u32 + 1,
      mnemonic : mnemonic.to_string(),
      operands : operands.iter().map(|operand| operand.to_string()).collect(),
      text     : text.to_string(),
    });
  }

  lines
}

/**
  Resolves one preprocessed line against the instruction catalog. On success the
  instruction is returned together with an optional out of range diagnostic.
*/
pub fn resolve_line(line: &SourceLine)
  -> Result<(Instruction, Option<AssemblyWarning>), AssemblyError>
{
  let operation = match Operation::from_str(&line.mnemonic) {
    Ok(operation) => operation,
    Err(_) => {
      return Err(AssemblyError::UnknownInstruction {
        line: line.number,
        mnemonic: line.mnemonic.clone()
      });
    }
  };

  let format = operation.format();
  if line.operands.len() != format.arity() {
    return Err(AssemblyError::ArityMismatch {
      line: line.number,
      operation,
      expected: format.arity(),
      found: line.operands.len()
    });
  }

  match format {

    Format::Pseudo => Ok((Instruction::Pseudo(operation), None)),

    Format::Immediate => {
      let (immediate, warning) = parse_immediate(line, &line.operands[0])?;
      Ok((Instruction::Immediate { opcode: operation, immediate }, warning))
    }

    Format::SingleOperand => {
      let ra = parse_register(line, &line.operands[0])?;
      Ok((Instruction::SingleOperand { opcode: operation, ra }, None))
    }

    Format::DualOperand => {
      let ra = parse_register(line, &line.operands[0])?;
      let rb = parse_register(line, &line.operands[1])?;
      Ok((Instruction::DualOperand { opcode: operation, ra, rb }, None))
    }

  }
}

fn parse_register(line: &SourceLine, token: &str) -> Result<Register, AssemblyError> {
  Register::from_str(token).map_err(|_|
    AssemblyError::InvalidRegisterOperand {
      line: line.number,
      token: token.to_string()
    }
  )
}

fn parse_immediate(line: &SourceLine, token: &str)
  -> Result<(u8, Option<AssemblyWarning>), AssemblyError>
{
  let value = token.parse::<i64>().map_err(|_|
    AssemblyError::InvalidImmediateOperand {
      line: line.number,
      token: token.to_string()
    }
  )?;

  let truncated = (value & IMMEDIATE_MASK as i64) as u8;
  let warning = match (0..=63).contains(&value) {
    true  => None,
    false => Some(AssemblyWarning::ImmediateOutOfRange { line: line.number, value, truncated })
  };

  Ok((truncated, warning))
}


#[cfg(test)]
mod tests {
  use super::*;

  fn line(number: u32, mnemonic: &str, operands: &[&str]) -> SourceLine {
    SourceLine {
      number,
      mnemonic: mnemonic.to_string(),
      operands: operands.iter().map(|operand| operand.to_string()).collect(),
      text: String::new(),
    }
  }

  #[test]
  fn preprocess_strips_comments_and_blank_lines() {
    let source = "# A header comment\n\nSETRGB R0 # trailing comment\n   \t\nNOP\n";
    let lines = preprocess(source);

    assert_eq!(lines.len(), 2);

    assert_eq!(lines[0].number, 3);
    assert_eq!(lines[0].mnemonic, "SETRGB");
    assert_eq!(lines[0].operands, vec!["R0".to_string()]);
    assert_eq!(lines[0].text, "SETRGB R0");

    assert_eq!(lines[1].number, 5);
    assert_eq!(lines[1].mnemonic, "NOP");
    assert!(lines[1].operands.is_empty());
  }

  #[test]
  fn comment_marker_binds_without_whitespace() {
    let lines = preprocess("SETR R0#no space before this comment");
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].operands, vec!["R0".to_string()]);
    assert_eq!(lines[0].text, "SETR R0");
  }

  #[test]
  fn windows_line_endings_are_tolerated() {
    let lines = preprocess("GETX R1\r\nGETY R2\r\n");
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].mnemonic, "GETX");
    assert_eq!(lines[1].mnemonic, "GETY");
    assert_eq!(lines[1].operands, vec!["R2".to_string()]);
  }

  #[test]
  fn tabs_separate_tokens() {
    let lines = preprocess("ADD\tR0\tR1");
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].operands, vec!["R0".to_string(), "R1".to_string()]);
  }

  #[test]
  fn indentation_is_preserved_in_the_annotation_text() {
    let lines = preprocess("    SETRGB R1");
    assert_eq!(lines[0].text, "    SETRGB R1");
    assert_eq!(lines[0].mnemonic, "SETRGB");
  }

  #[test]
  fn unknown_mnemonics_are_fatal() {
    let result = resolve_line(&line(7, "FOO", &["R0"]));
    assert_eq!(
      result,
      Err(AssemblyError::UnknownInstruction { line: 7, mnemonic: "FOO".to_string() })
    );
  }

  #[test]
  fn arity_is_checked_for_every_format() {
    assert_eq!(
      resolve_line(&line(1, "SETRGB", &[])),
      Err(AssemblyError::ArityMismatch {
        line: 1, operation: Operation::SetRgb, expected: 1, found: 0
      })
    );
    assert_eq!(
      resolve_line(&line(2, "ADD", &["R0"])),
      Err(AssemblyError::ArityMismatch {
        line: 2, operation: Operation::Add, expected: 2, found: 1
      })
    );
    assert_eq!(
      resolve_line(&line(3, "NOP", &["R0"])),
      Err(AssemblyError::ArityMismatch {
        line: 3, operation: Operation::Nop, expected: 0, found: 1
      })
    );
    assert_eq!(
      resolve_line(&line(4, "LDI", &["1", "2"])),
      Err(AssemblyError::ArityMismatch {
        line: 4, operation: Operation::Ldi, expected: 1, found: 2
      })
    );
  }

  #[test]
  fn register_operands_must_name_a_register() {
    for bad in &["R4", "X0", "5", "r0"] {
      let result = resolve_line(&line(9, "SETRGB", &[bad]));
      assert_eq!(
        result,
        Err(AssemblyError::InvalidRegisterOperand { line: 9, token: bad.to_string() }),
        "token {}",
        bad
      );
    }
  }

  #[test]
  fn immediate_operands_must_be_integers() {
    for bad in &["R1", "3.5", "ten", ""] {
      let result = resolve_line(&line(11, "LDI", &[bad]));
      assert_eq!(
        result,
        Err(AssemblyError::InvalidImmediateOperand { line: 11, token: bad.to_string() }),
        "token {}",
        bad
      );
    }
  }

  #[test]
  fn in_range_immediates_resolve_without_warning() {
    let (instruction, warning) = resolve_line(&line(1, "LDI", &["10"])).unwrap();
    assert_eq!(instruction, Instruction::Immediate { opcode: Operation::Ldi, immediate: 10 });
    assert!(warning.is_none());
  }

  #[test]
  fn out_of_range_immediates_are_truncated_with_a_warning() {
    let (instruction, warning) = resolve_line(&line(5, "LDI", &["100"])).unwrap();
    assert_eq!(instruction, Instruction::Immediate { opcode: Operation::Ldi, immediate: 36 });
    assert_eq!(
      warning,
      Some(AssemblyWarning::ImmediateOutOfRange { line: 5, value: 100, truncated: 36 })
    );
  }

  #[test]
  fn negative_immediates_truncate_to_their_low_bits() {
    let (instruction, warning) = resolve_line(&line(6, "LDI", &["-5"])).unwrap();
    assert_eq!(instruction, Instruction::Immediate { opcode: Operation::Ldi, immediate: 59 });
    assert_eq!(
      warning,
      Some(AssemblyWarning::ImmediateOutOfRange { line: 6, value: -5, truncated: 59 })
    );
  }

  #[test]
  fn dual_operands_resolve_in_source_order() {
    let (instruction, _warning) = resolve_line(&line(1, "MOV", &["R1", "R3"])).unwrap();
    assert_eq!(
      instruction,
      Instruction::DualOperand { opcode: Operation::Mov, ra: Register::R1, rb: Register::R3 }
    );
  }

  #[test]
  fn error_messages_carry_the_line_number() {
    let error = AssemblyError::UnknownInstruction { line: 12, mnemonic: "BLIT".to_string() };
    assert_eq!(error.to_string(), "Error on line 12: BLIT is not an instruction.");

    let warning = AssemblyWarning::ImmediateOutOfRange { line: 4, value: 64, truncated: 0 };
    assert_eq!(
      warning.to_string(),
      "Warning on line 4: immediate 64 is outside 0..=63 and was truncated to 0."
    );
  }
}
