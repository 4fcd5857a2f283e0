//! Structures and functions for the Shader Virtual Machine, a functional simulator for
//! the shading processor core. The simulator is the software half of a hardware parity
//! contract: for every (program, x, y, time, user) tuple it must latch exactly the color
//! the circuit latches, which pins down the skip timing, the modulo 64 arithmetic, and
//! the sine table fold below.

use std::fmt::{Display, Formatter};

use prettytable::{format as TableFormat, Table};

use crate::assembler::assemble;
use crate::bytecode::assembly::AssemblyError;
use crate::bytecode::{decode_instruction, Instruction, Operation, Word};
use crate::context::{Color, ShaderContext};
use crate::register::{Register, REGISTER_COUNT};

/// Mask keeping a value within the six bit datapath.
pub const VALUE_MASK: u8 = 0b0011_1111;
/// Mask keeping an output channel within its two bits.
pub const CHANNEL_MASK: u8 = 0b0000_0011;

/**
  Quarter wave sine table: `SINE_LUT[i] = round(63 * sin(6 * i degrees))` for `i` in
  `0..16`, so the table rises from 0 to 63 over a quarter period. `SINE` folds the low
  five bits of register 0 onto the table, mirroring the index when bit 4 is set, which
  yields the positive half period; bit 5 is ignored.
*/
pub const SINE_LUT: [u8; 16] = [0, 7, 13, 19, 26, 31, 37, 42, 47, 51, 55, 58, 60, 62, 63, 63];

pub struct SVM {

  // Registers //
  registers : [u8; REGISTER_COUNT], // The general purpose register file
  rgb       : Color,                // Output color latch
  skip      : bool,                 // Conditional skip flag

}

impl SVM {

  // region Display methods

  fn make_register_table(&self) -> Table {
    let mut table = Table::new();

    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->"Register", ubl->"Contents"]);

    for (i, value) in self.registers.iter().enumerate() {
      table.add_row(
        row![r->format!("R{} =", i), format!("{:2}  0b{:06b}", value, value)]
      );
    }
    table.add_row(row![r->"RGB =", format!("{}", self.rgb)]);
    table.add_row(row![r->"SKIP =", format!("{}", self.skip)]);
    table
  }

  // endregion

  // region Low-level utility methods

  pub fn new() -> SVM {
    SVM {
      registers : [0; REGISTER_COUNT],
      rgb       : Color::default(),
      skip      : false,
    }
  }

  fn get(&self, register: Register) -> u8 {
    self.registers[register.idx()]
  }

  /// Every register write passes through here, so register values are invariantly
  /// within the datapath width.
  fn set(&mut self, register: Register, value: u8) {
    self.registers[register.idx()] = value & VALUE_MASK;
  }

  // endregion

  // region Execution

  /**
    Runs the program against the given context and returns the latched output color.
    All state is reset first: registers to 0, the latch to black, the skip flag clear.
    A single `SVM` value can therefore be reused across pixels.
  */
  pub fn run(&mut self, program: &[Instruction], context: &ShaderContext) -> Color {
    self.registers = [0; REGISTER_COUNT];
    self.rgb      = Color::default();
    self.skip     = false;

    for (_cursor, instruction) in program.iter().enumerate() {

      if self.skip {
        // The flag reaches exactly one instruction, conditional or not.
        self.skip = false;

        #[cfg(feature = "trace_execution")]
        println!("{:3}:  Skipping {}", _cursor, instruction);

        continue;
      }

      self.step(instruction, context);

      #[cfg(feature = "trace_execution")]
      println!("{:3}:  {}\n{}", _cursor, instruction, self);

    }

    self.rgb
  }

  fn step(&mut self, instruction: &Instruction, context: &ShaderContext) {
    match *instruction {

      // The immediate load always targets register 0; the word has no register field.
      Instruction::Immediate { immediate, .. } => {
        self.registers[0] = immediate & VALUE_MASK;
      }

      Instruction::SingleOperand { opcode, ra } => {
        self.step_single(opcode, ra, context);
      }

      Instruction::DualOperand { opcode, ra, rb } => {
        self.step_dual(opcode, ra, rb);
      }

      // NOP is the self AND of register 0, so even the hardware leaves all state alone.
      Instruction::Pseudo(_) => {}

    }
  }

  fn step_single(&mut self, opcode: Operation, ra: Register, context: &ShaderContext) {
    let value = self.get(ra);

    match opcode {

      // Output latch //
      Operation::SetRgb => {
        self.rgb = Color {
          r: (value >> 4) & CHANNEL_MASK,
          g: (value >> 2) & CHANNEL_MASK,
          b: value & CHANNEL_MASK,
        };
      }
      Operation::SetR => self.rgb.r = value & CHANNEL_MASK,
      Operation::SetG => self.rgb.g = value & CHANNEL_MASK,
      Operation::SetB => self.rgb.b = value & CHANNEL_MASK,

      // Context inputs, masked to the datapath width by `set` //
      Operation::GetX    => self.set(ra, context.x),
      Operation::GetY    => self.set(ra, context.y),
      Operation::GetTime => self.set(ra, context.time),
      Operation::GetUser => self.set(ra, context.user),

      // Conditionals: the skip flag is the negation of the condition //
      Operation::IfEq => self.skip = !(value == self.registers[0]),
      Operation::IfNe => self.skip = !(value != self.registers[0]),
      Operation::IfGe => self.skip = !(value >= self.registers[0]),
      Operation::IfLt => self.skip = !(value < self.registers[0]),

      Operation::Double => self.set(ra, value << 1),
      Operation::Half   => self.set(ra, value >> 1),
      Operation::Clear  => self.set(ra, 0),
      // The angle is read from register 0 before `ra` is written, which matters
      // when `ra` is register 0 itself.
      Operation::Sine   => self.set(ra, sine(self.registers[0])),

      _operation => unreachable!("Error: {} decoded as a single operand instruction.", _operation),
    }
  }

  fn step_dual(&mut self, opcode: Operation, ra: Register, rb: Register) {
    let a = self.get(ra);
    let b = self.get(rb);

    let result = match opcode {
      Operation::And => a & b,
      Operation::Or  => a | b,
      Operation::Not => !b,
      Operation::Xor => a ^ b,
      Operation::Mov => b,
      // Register values never exceed 63, so the sum fits in a byte; `set` wraps it.
      Operation::Add => a + b,
      // The shift amount runs up to 63, but a u8 shift only accepts 0..=7. Anything
      // past the datapath width empties the register regardless.
      Operation::ShiftL => match b < 8 { true => a << b, false => 0 },
      Operation::ShiftR => match b < 8 { true => a >> b, false => 0 },

      _operation => unreachable!("Error: {} decoded as a dual operand instruction.", _operation),
    };

    self.set(ra, result);
  }

  // endregion

}

/// Folds a six bit angle onto the quarter wave table: bit 4 selects the mirrored half,
/// bits 3..0 index into it, bit 5 is ignored.
fn sine(angle: u8) -> u8 {
  let low4 = (angle & 0b1111) as usize;
  match angle & 0b1_0000 {
    0 => SINE_LUT[low4],
    _ => SINE_LUT[15 - low4],
  }
}

/**
  Evaluates a shader program for one pixel and returns the latched color. Execution
  state is fresh per invocation, so evaluations are independent of one another and a
  full image can be computed in any order.
*/
pub fn execute(program: &[Instruction], context: &ShaderContext) -> Color {
  SVM::new().run(program, context)
}

/// Evaluates a raw word stream, the same bytes the hardware loader ships to the device.
pub fn execute_words(words: &[Word], context: &ShaderContext) -> Color {
  let program: Vec<Instruction> = words.iter().map(|word| decode_instruction(*word)).collect();
  execute(&program, context)
}

/// Assembles and evaluates shader source in one step.
pub fn execute_source(source: &str, context: &ShaderContext) -> Result<Color, AssemblyError> {
  let program = assemble(source)?;
  Ok(execute(&program.instructions(), context))
}


lazy_static! {
  pub static ref TABLE_DISPLAY_FORMAT: TableFormat::TableFormat =
    TableFormat::FormatBuilder::new()
      .column_separator('│')
      .borders(' ')
      .separator(
        TableFormat::LinePosition::Title,
        TableFormat::LineSeparator::new('─', '┼', ' ', ' ')
      )
      .separator(
        TableFormat::LinePosition::Bottom,
        TableFormat::LineSeparator::new('─', '┴', ' ', ' ')
      )
      .padding(1, 1)
      .build();
}

impl Display for SVM {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.make_register_table())
  }
}
