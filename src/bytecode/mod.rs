/*!

  The shading processor uses a fixed eight bit instruction word. The top bits of the word
  select the layout, and the remaining bits pack the opcode and operand fields:

    [Opcode:2][Immediate:6]    immediate load
    [Opcode:6][RA:2]           single operand
    [Opcode:4][RB:2][RA:2]     dual operand
    [Word:8]                   pseudo instruction, a fixed bit pattern

  Register fields are two bits and address the four register file entries `R0`..`R3`.
  Immediates are six bits, matching the register width. Since the opcode field floats
  with the layout, the layout selector doubles as the leading opcode bits. Every eight
  bit value decodes to a defined instruction.

  One design decision that needed to be made is whether to store a program as raw words
  or as decoded instructions. A decoded `Instruction` is several bytes wide, but programs
  top out at the hardware's program memory depth, so the simulator trades the space for
  decoding each instruction once instead of on every pixel. The raw word form remains the
  interchange format with the hardware.

*/

pub mod assembly;
pub mod binary;
pub mod instruction;

pub use binary::{decode_instruction, encode_instruction, format_word,
                 Word, IMMEDIATE_MASK, NOP_WORD, REGISTER_MASK};
pub use instruction::{Category, Format, Instruction, Operation, CATEGORY_ORDER,
                      OPERATION_COUNT};
