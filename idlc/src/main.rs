use clap::{Parser, ValueEnum};
use codespan_reporting::term::termcolor::ColorChoice;
use simplelog::{
    ColorChoice as LogColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode,
};
use std::path::PathBuf;

/// Compile IDL interface definitions to TypeScript
///
/// The top-level declarations of `dir/file.idl` are written to `dir/file.ts`,
/// and the body of each `module M` to `dir/M/file.ts`. Included files are
/// compiled along with the file that includes them.
#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Path to the IDL file to compile
    #[clap(name = "FILE")]
    file: PathBuf,
    /// Log more about the compilation (may be repeated)
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    /// When to use colours in diagnostics
    #[clap(long, value_enum, default_value_t = Color::Auto)]
    color: Color,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Color {
    Auto,
    Always,
    Never,
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let config = ConfigBuilder::new()
        .set_time_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .build();

    // A logger can only fail to initialise if one is set already.
    let _ = TermLogger::init(level, config, TerminalMode::Stderr, LogColorChoice::Auto);
}

fn main() -> ! {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let mut driver = idlc::Driver::new();
    driver.install_panic_hook();
    match cli.color {
        Color::Auto => {}
        Color::Always => driver.set_color_choice(ColorChoice::Always),
        Color::Never => driver.set_color_choice(ColorChoice::Never),
    }

    let status = driver.compile_and_emit(&cli.file);
    std::process::exit(status.exit_code())
}
