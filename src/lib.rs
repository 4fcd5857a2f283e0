/*!

  Toolchain for a tiny per pixel shading processor with a fixed eight bit instruction
  word. The crate pairs an assembler, which translates mnemonic source text into the
  packed binary words the hardware consumes, with a functional simulator, which executes
  the same instruction stream against a per pixel evaluation context (x, y, time, user)
  and latches a two bit per channel output color. The two halves share one instruction
  catalog so that encoding and execution can never drift apart.

  Programs are straight line: no jumps, no loops, executed once per pixel from the top.
  The interesting semantics are the conditional skip flag, which suppresses exactly the
  next instruction, the modulo 64 register arithmetic, and the table driven sine
  approximation. All three must match the circuit bit for bit.

*/

#[macro_use] extern crate prettytable;
#[macro_use] extern crate lazy_static;
extern crate strum;

pub mod assembler;
pub mod bytecode;
pub mod context;
pub mod register;
pub mod svm;

pub use crate::assembler::{assemble, AssembledLine, AssembledProgram};
pub use crate::bytecode::assembly::{AssemblyError, AssemblyWarning};
pub use crate::bytecode::{Instruction, Operation, Word};
pub use crate::context::{Color, ShaderContext};
pub use crate::register::Register;
pub use crate::svm::{execute, execute_source, execute_words, SVM};
