//! Breadboard Emulator - CLI Entry Point
//!
//! Commands:
//! - `bbcpu-emu run <program>` - Run an image or ASM file
//! - `bbcpu-emu debug <program>` - Interactive debugger
//! - `bbcpu-emu asm <source>` - Assemble to a binary image
//! - `bbcpu-emu disasm <image>` - Disassemble an image

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::{event, Level};
use tracing_subscriber::prelude::*;

use bbcpu::{assemble, Cpu};

#[derive(Parser)]
#[command(name = "bbcpu-emu")]
#[command(version = "0.1.0")]
#[command(about = "A board-level emulator of the 8-bit breadboard computer")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it halts
    Run {
        /// Path to the image or ASM file to execute
        program: String,
        /// Maximum number of ticks to run
        #[arg(short, long, default_value = "100000")]
        max_ticks: u64,
        /// Print one line per instruction
        #[arg(short, long)]
        trace: bool,
        /// Print the final machine state as JSON
        #[arg(long)]
        json: bool,
    },
    /// Interactive debugger
    Debug {
        /// Path to the image or ASM file to debug
        program: String,
    },
    /// Assemble source to a binary image
    Asm {
        /// Path to the source file
        source: String,
        /// Output image file
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Disassemble an image to readable text
    Disasm {
        /// Path to the image file
        image: String,
    },
    /// Run the built-in self-test
    Test,
}

/// Multiplies 2 by 4 with repeated addition.
const MULTIPLY: &str = "
top:    lda prod
        add f2
        sta prod
        lda f1
        sub one
        sta f1
        jz done
        jmp top
done:   lda prod
        out
        hlt
        .org 12
one:    .byte 1
prod:   .byte 0
f1:     .byte 2
f2:     .byte 4
";

/// Adds 33 until the sum carries.
const CARRY_LOOP: &str = "
start:  add adder
        jc complete
        jmp start
complete:
        out
        hlt
        .org 14
adder:  .byte 33
";

/// Adds two constants in the top of memory and stops on carry.
const WRAPPED_SUM: &str = "
start:  lda 15
        add 14
        jc exit
        jmp start
exit:   out
        hlt
        .org 14
        .byte $f2
        .byte $0f
";

fn main() {
    init_logging();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run { program, max_ticks, trace, json }) => {
            run_program(&program, max_ticks, trace, json);
        }
        Some(Commands::Debug { program }) => {
            debug_program(&program);
        }
        Some(Commands::Asm { source, output }) => {
            assemble_file(&source, output);
        }
        Some(Commands::Disasm { image }) => {
            disassemble_file(&image);
        }
        Some(Commands::Test) => {
            run_self_test();
        }
        None => {
            println!("Breadboard Emulator v0.1.0");
            println!("A clock-accurate 8-bit breadboard computer");
            println!();
            println!("Use --help for available commands");
            println!();
            demo_multiply();
        }
    }
}

/// Log to stderr; `RUST_LOG` selects what gets printed.
fn init_logging() {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);
    let filter_layer = match tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info"))
    {
        Err(e) => fail(&format!("Bad log filter: {}", e)),
        Ok(layer) => layer,
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}

fn fail(message: &str) -> ! {
    eprintln!("❌ {}", message);
    std::process::exit(1);
}

/// Load either assembly source or a raw image.
fn load_program(path: &str) -> Vec<u8> {
    if path.ends_with(".asm") {
        let source = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => fail(&format!("Failed to read file: {}", e)),
        };

        match assemble(&source) {
            Ok(image) => {
                event!(Level::INFO, path, "assembled");
                image.to_vec()
            }
            Err(e) => fail(&format!("Assembly error: {}", e)),
        }
    } else {
        match bbcpu::load_image(path) {
            Ok(image) => {
                event!(Level::INFO, path, len = image.len(), "loaded image");
                image
            }
            Err(e) => fail(&format!("Failed to load image: {}", e)),
        }
    }
}

/// A reset machine holding `image`.
fn boot(image: &[u8]) -> Cpu {
    let mut cpu = Cpu::new();
    if cpu.load_memory(image) {
        eprintln!("⚠️  Image is {} bytes; only the first {} were loaded", image.len(), bbcpu::MEMORY_SIZE);
    }
    cpu.reset();
    cpu
}

fn run_program(path: &str, max_ticks: u64, trace: bool, json: bool) {
    use bbcpu::asm::disasm::disassemble_byte;

    if !json {
        println!("🔧 Running: {}", path);
    }

    let image = load_program(path);
    let mut cpu = boot(&image);
    let start = cpu.ticks;

    if trace {
        println!();
        println!("━━━ Execution ━━━");
        while !cpu.is_halted() && cpu.ticks - start < max_ticks {
            cpu.run_to_instruction_boundary();
            println!(
                "{:>6}: {:<12} A={:<3} B={:<3} {} OUT={}",
                cpu.ticks,
                disassemble_byte(cpu.ir.value()),
                cpu.a.value(),
                cpu.b.value(),
                cpu.flags(),
                cpu.output()
            );
        }
    } else {
        cpu.run_limited(max_ticks);
    }

    let ticks = cpu.ticks - start;

    match report(&cpu, ticks, json) {
        Ok(text) => println!("{}", text),
        Err(e) => fail(&format!("Failed to serialize state: {}", e)),
    }

    // stderr, so `--json` output stays parseable
    if !cpu.is_halted() {
        eprintln!("⚠️  Reached max ticks limit ({}). Use --max-ticks to increase.", max_ticks);
    }
}

/// Everything `run` prints on stdout once the machine stops.
fn report(cpu: &Cpu, ticks: u64, json: bool) -> Result<String, serde_json::Error> {
    if json {
        return serde_json::to_string_pretty(cpu);
    }

    Ok(format!(
        "\n━━━ Result ━━━\nTicks:  {}\nHalted: {}\nFlags:  {}\nOUT:    {}",
        ticks,
        cpu.is_halted(),
        cpu.flags(),
        cpu.output()
    ))
}

#[cfg(feature = "tui")]
fn debug_program(path: &str) {
    use bbcpu::tui::run_debugger;

    println!("🔍 Loading: {}", path);

    let image = load_program(path);

    if let Err(e) = run_debugger(image) {
        fail(&format!("Debugger error: {}", e));
    }
}

#[cfg(not(feature = "tui"))]
fn debug_program(_path: &str) {
    fail("This build has no debugger; enable the `tui` feature");
}

/// Where `asm` writes its image: `output` if given, else the source path
/// with a `.bin` extension. `None` if that would overwrite the source.
fn image_path(source_path: &str, output: Option<String>) -> Option<PathBuf> {
    let out_path = match output {
        Some(path) => PathBuf::from(path),
        None => Path::new(source_path).with_extension("bin"),
    };

    if out_path == Path::new(source_path) {
        None
    } else {
        Some(out_path)
    }
}

fn assemble_file(source_path: &str, output: Option<String>) {
    let out_path = match image_path(source_path, output) {
        Some(path) => path,
        None => fail(&format!("Refusing to overwrite {}; pass -o", source_path)),
    };

    println!("📝 Assembling: {} → {}", source_path, out_path.display());

    let source = match std::fs::read_to_string(source_path) {
        Ok(s) => s,
        Err(e) => fail(&format!("Failed to read file: {}", e)),
    };

    let image = match assemble(&source) {
        Ok(image) => image,
        Err(e) => fail(&format!("Assembly error: {}", e)),
    };

    if let Err(e) = bbcpu::save_image(&out_path, &image) {
        fail(&format!("Failed to save image: {}", e));
    }

    println!("✓ Saved {} bytes to {}", image.len(), out_path.display());
}

fn disassemble_file(image_path: &str) {
    println!("📖 Disassembling: {}", image_path);
    println!();

    let image = match bbcpu::load_image(image_path) {
        Ok(image) => image,
        Err(e) => fail(&format!("Failed to load image: {}", e)),
    };

    println!("{}", bbcpu::disassemble(&image));
}

fn demo_multiply() {
    println!("━━━ Multiply Demo ━━━");
    println!();

    let image = match assemble(MULTIPLY) {
        Ok(image) => image,
        Err(e) => fail(&format!("Assembly error: {}", e)),
    };
    println!("{}", bbcpu::disassemble(&image));

    let mut cpu = boot(&image);
    let ticks = cpu.run_limited(10_000);

    println!("2 × 4 = {} after {} ticks", cpu.output(), ticks);
}

fn run_self_test() {
    println!("━━━ Breadboard Emulator Self-Test ━━━");
    println!();

    let mut passed = 0;
    let mut failed = 0;

    let programs = [
        ("Multiply by repeated addition", MULTIPLY, 8),
        ("Add until carry", CARRY_LOOP, 8),
        ("Wrapped sum", WRAPPED_SUM, 1),
    ];

    for (name, source, expected) in programs {
        print!("{}... ", name);
        let image = match assemble(source) {
            Ok(image) => image,
            Err(e) => {
                println!("✗ ({})", e);
                failed += 1;
                continue;
            }
        };

        let mut cpu = boot(&image);
        cpu.run_limited(100_000);
        if cpu.is_halted() && cpu.output() == expected {
            println!("✓");
            passed += 1;
        } else {
            println!("✗ (got {}, expected {})", cpu.output(), expected);
            failed += 1;
        }
    }

    print!("Ten ticks per instruction... ");
    let mut cpu = boot(&[0x51, 0x52, 0xf0]);
    let before = cpu.ticks;
    cpu.run_to_instruction_boundary();
    cpu.tick();
    if cpu.ticks - before == 10 && cpu.a.value() == 1 {
        println!("✓");
        passed += 1;
    } else {
        println!("✗ (took {} ticks)", cpu.ticks - before);
        failed += 1;
    }

    print!("Reset clears and reruns... ");
    let image = match assemble(MULTIPLY) {
        Ok(image) => image,
        Err(e) => fail(&format!("Assembly error: {}", e)),
    };
    let mut cpu = boot(&image);
    cpu.run_limited(100_000);
    let truncated = cpu.load_memory(&image);
    cpu.reset();
    let clean = !truncated && !cpu.is_halted() && cpu.output() == 0 && cpu.pc.value() == 0;
    cpu.run_limited(100_000);
    if clean && cpu.output() == 8 {
        println!("✓");
        passed += 1;
    } else {
        println!("✗");
        failed += 1;
    }

    println!();
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Results: {} passed, {} failed", passed, failed);

    if failed == 0 {
        println!("✓ All tests passed!");
    } else {
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_path_swaps_extension() {
        assert_eq!(image_path("prog.asm", None), Some(PathBuf::from("prog.bin")));
        assert_eq!(image_path("/tmp/prog.s", None), Some(PathBuf::from("/tmp/prog.bin")));
        assert_eq!(image_path("prog", None), Some(PathBuf::from("prog.bin")));
    }

    #[test]
    fn test_json_report_of_capped_run_parses() {
        // JMP 0 never halts
        let mut cpu = boot(&[0x60]);
        let ticks = cpu.run_limited(50);
        assert!(!cpu.is_halted());

        let text = report(&cpu, ticks, true).unwrap();
        let parsed: Cpu = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, cpu);
    }

    #[test]
    fn test_image_path_never_overwrites_source() {
        assert_eq!(image_path("prog.bin", None), None);
        assert_eq!(image_path("prog.s", Some("prog.s".into())), None);
        assert_eq!(
            image_path("prog.s", Some("out.img".into())),
            Some(PathBuf::from("out.img"))
        );
    }
}
