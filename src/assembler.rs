/*!
  The assembler translates shader assembly source into packed eight bit instruction
  words. Emission order is source order, one word per surviving line; there is no
  address resolution because the processor has no jumps. Assembly is all or nothing:
  the first error aborts, so a failed assembly never produces a partial program.
*/

use std::fmt::{Display, Formatter};

use crate::bytecode::assembly::{preprocess, resolve_line, AssemblyError, AssemblyWarning};
use crate::bytecode::{encode_instruction, format_word, Instruction, Word};

/// One assembled source line: the resolved instruction, its encoded word, and the
/// comment stripped source text reproduced in listings.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AssembledLine {
  pub instruction : Instruction,
  pub word        : Word,
  pub source      : String,
}

impl Display for AssembledLine {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{} // {}", format_word(self.word), self.source)
  }
}

/// The result of a successful assembly.
#[derive(Clone, Debug, Eq, PartialEq, Default)]
pub struct AssembledProgram {
  pub lines    : Vec<AssembledLine>,
  pub warnings : Vec<AssemblyWarning>,
}

impl AssembledProgram {
  /// The packed instruction words in source order, one byte per instruction. This is
  /// the stream the hardware loader consumes.
  pub fn words(&self) -> Vec<Word> {
    self.lines.iter().map(|line| line.word).collect()
  }

  /// The resolved instructions in source order.
  pub fn instructions(&self) -> Vec<Instruction> {
    self.lines.iter().map(|line| line.instruction).collect()
  }

  /**
    Renders the program as underscore grouped binary words, one per line, each annotated
    with the source line it was assembled from:

      11_001010 // LDI 10
      10_01_10_00 // ADD R0 R2
  */
  pub fn listing(&self) -> String {
    let mut listing = String::new();
    for line in &self.lines {
      listing.push_str(&format!("{}\n", line));
    }
    listing
  }

  pub fn len(&self) -> usize {
    self.lines.len()
  }

  pub fn is_empty(&self) -> bool {
    self.lines.is_empty()
  }
}

/**
  Assembles shader source text into eight bit instruction words.

  Each preprocessed line is resolved against the instruction catalog and packed
  according to its format. Out of range immediates are truncated and collected as
  warnings on the returned program; any other defect aborts with the offending line.
*/
pub fn assemble(source: &str) -> Result<AssembledProgram, AssemblyError> {
  let mut program = AssembledProgram::default();

  for line in preprocess(source) {
    let (instruction, warning) = resolve_line(&line)?;

    if let Some(warning) = warning {
      program.warnings.push(warning);
    }

    program.lines.push(AssembledLine {
      instruction,
      word: encode_instruction(&instruction),
      source: line.text,
    });
  }

  Ok(program)
}


#[cfg(test)]
mod tests {
  use super::*;

  // Byte streams the hardware bring up scripts load over SPI, reproduced here as ground
  // truth for the encoder.
  const CROSSHAIR_WORDS: [Word; 10] = [
    0b0011_1000, // CLEAR R0
    0b0000_0000, // SETRGB R0
    0b0001_0001, // GETX R1
    0b0001_0110, // GETY R2
    0b1101_0000, // LDI 16
    0b0010_0001, // IFEQ R1
    0b0000_0001, // SETRGB R1
    0b0010_0010, // IFEQ R2
    0b0000_0010, // SETRGB R2
    0b0100_0000, // NOP
  ];

  const SINE_THRESHOLD_WORDS: [Word; 10] = [
    0b0011_1011, // CLEAR R3
    0b0001_0000, // GETX R0
    0b0001_1101, // GETUSER R1
    0b1001_0100, // ADD R0 R1
    0b0000_0000, // SETRGB R0
    0b0011_1100, // SINE R0
    0b0011_0100, // HALF R0
    0b0001_0101, // GETY R1
    0b0010_1001, // IFGE R1
    0b0000_0011, // SETRGB R3
  ];

  #[test]
  fn crosshair_program_matches_hardware_bytes() {
    let source = "\
CLEAR R0
SETRGB R0
GETX R1
GETY R2
LDI 16
IFEQ R1
SETRGB R1
IFEQ R2
SETRGB R2
NOP
";
    let program = assemble(source).unwrap();
    assert_eq!(program.words(), CROSSHAIR_WORDS.to_vec());
    assert!(program.warnings.is_empty());
  }

  #[test]
  fn sine_threshold_program_matches_hardware_bytes() {
    let source = "\
CLEAR R3
GETX R0
GETUSER R1
ADD R0 R1
SETRGB R0
SINE R0
HALF R0
GETY R1
IFGE R1
SETRGB R3
";
    let program = assemble(source).unwrap();
    assert_eq!(program.words(), SINE_THRESHOLD_WORDS.to_vec());
  }

  #[test]
  fn listing_annotates_each_word_with_its_source() {
    let program = assemble("LDI 10 # load the threshold\nADD R0 R2").unwrap();
    assert_eq!(program.listing(), "11_001010 // LDI 10\n10_01_10_00 // ADD R0 R2\n");
  }

  #[test]
  fn listing_preserves_source_indentation() {
    let program = assemble("    GETX R1").unwrap();
    assert_eq!(program.listing(), "00_0100_01 //     GETX R1\n");
  }

  #[test]
  fn comments_and_blanks_do_not_emit_words() {
    let source = "# Example Shader\n\nSETRGB R0\n\n# done\n";
    let program = assemble(source).unwrap();
    assert_eq!(program.len(), 1);
    assert_eq!(program.words(), vec![0b0000_0000]);
  }

  #[test]
  fn empty_source_assembles_to_an_empty_program() {
    let program = assemble("# nothing but commentary\n\n").unwrap();
    assert!(program.is_empty());
    assert!(program.listing().is_empty());
  }

  #[test]
  fn first_error_aborts_with_its_line_number() {
    let result = assemble("LDI 10\nFOO R0\nSETRGB R0");
    assert_eq!(
      result,
      Err(AssemblyError::UnknownInstruction { line: 2, mnemonic: "FOO".to_string() })
    );
  }

  #[test]
  fn out_of_range_immediates_assemble_with_warnings() {
    let program = assemble("LDI 100\nLDI -5").unwrap();
    assert_eq!(program.words(), vec![0b1110_0100, 0b1111_1011]);
    assert_eq!(program.warnings.len(), 2);
  }

  #[test]
  fn instructions_and_words_stay_in_step() {
    let program = assemble("GETX R0\nGETTIME R1\nADD R0 R1\nSETRGB R0").unwrap();
    let decoded: Vec<Instruction> = program
      .words()
      .iter()
      .map(|word| crate::bytecode::decode_instruction(*word))
      .collect();
    assert_eq!(decoded, program.instructions());
  }
}
