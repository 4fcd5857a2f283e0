#[macro_use] extern crate prettytable;

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use prettytable::Table;

use tinyshader::bytecode::{Instruction, Operation, CATEGORY_ORDER};
use tinyshader::svm::TABLE_DISPLAY_FORMAT;
use tinyshader::{assemble, execute, ShaderContext};

/// Assembled when no input file is given.
const EXAMPLE_SHADER: &str = "\
# Example Shader
SETRGB R0

GETX R1
GETY R2

LDI 10

IFEQ R1
SETRGB R1

IFEQ R2
SETRGB R2
";

// Preview image dimensions: one shader evaluation per 10 pixel tile of the 640x480 frame.
const IMAGE_WIDTH  : usize = 640 / 10;
const IMAGE_HEIGHT : usize = 480 / 10;

#[derive(Parser)]
#[command(name = "tinyshader")]
#[command(about = "Assembler and simulator for the tiny shading processor", long_about = None)]
struct Args {
  /// Shader source file to assemble
  #[arg(short, long)]
  input: Option<PathBuf>,

  /// Output name of the assembled result
  #[arg(short, long, default_value = "shader.bit")]
  output: PathBuf,

  /// Simulate the shader and save a PPM image of the result
  #[arg(long)]
  image: Option<PathBuf>,

  /// Time value the simulation runs at
  #[arg(long, default_value_t = 0)]
  time: u8,

  /// User value the simulation runs at
  #[arg(long, default_value_t = 0)]
  user: u8,

  /// Verbose output
  #[arg(short, long)]
  verbose: bool,

  /// Print a summary of all instructions
  #[arg(short, long)]
  summary: bool,
}

fn main() {
  let args = Args::parse();

  if args.summary {
    summary();
    return;
  }

  let source = match &args.input {
    Some(path) => {
      match fs::read_to_string(path) {
        Ok(source) => source,
        Err(error) => {
          eprintln!("Error: cannot read {}: {}", path.display(), error);
          process::exit(1);
        }
      }
    }
    None => {
      println!("No input specified! Using example shader:\n");
      println!("{}", EXAMPLE_SHADER);
      EXAMPLE_SHADER.to_string()
    }
  };

  let program = match assemble(&source) {
    Ok(program) => program,
    Err(error) => {
      eprintln!("{}", error);
      process::exit(1);
    }
  };

  for warning in &program.warnings {
    eprintln!("{}", warning);
  }

  if args.verbose {
    print!("{}", program.listing());
    println!("Assembled {} instruction words.", program.len());
  }

  if let Some(path) = &args.image {
    if let Err(error) = write_image(path, &program.instructions(), args.time, args.user) {
      eprintln!("Error: cannot write {}: {}", path.display(), error);
      process::exit(1);
    }
    if args.verbose {
      println!("Wrote {}x{} preview to {}", IMAGE_WIDTH, IMAGE_HEIGHT, path.display());
    }
  }

  if let Err(error) = fs::write(&args.output, program.listing()) {
    eprintln!("Error: cannot write {}: {}", args.output.display(), error);
    process::exit(1);
  }
}

/// Prints the instruction set reference grouped by category.
fn summary() {
  for category in CATEGORY_ORDER.iter() {
    println!("### {}", category);

    let mut table = Table::new();
    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ub->"Instruction", ub->"Operation", ub->"Description"]);

    for operation in Operation::all().filter(|operation| operation.category() == *category) {
      let name: &'static str = operation.into();
      let syntax = operation.format().syntax();
      let spelled = match syntax.is_empty() {
        true  => name.to_string(),
        false => format!("{} {}", name, syntax)
      };
      table.add_row(row![spelled, operation.synopsis(), operation.description()]);
    }

    table.printstd();
    println!();
  }
}

/// Evaluates the program over the preview grid and writes a binary PPM, expanding each
/// two bit channel to eight bits.
fn write_image(path: &Path, program: &[Instruction], time: u8, user: u8) -> std::io::Result<()> {
  let mut data = format!("P6\n{} {}\n255\n", IMAGE_WIDTH, IMAGE_HEIGHT).into_bytes();

  for y in 0..IMAGE_HEIGHT {
    for x in 0..IMAGE_WIDTH {
      let context = ShaderContext::new(x as u8, y as u8, time, user);
      let color = execute(program, &context);
      data.extend_from_slice(&color.to_rgb8());
    }
  }

  fs::write(path, data)
}
