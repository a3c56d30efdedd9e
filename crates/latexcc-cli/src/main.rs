use anyhow::Context;
use clap::{ArgAction, Args, Parser, Subcommand};
use latexcc_build::{CompileError, CompileOptions, Diagnostic, Pipeline};
use latexcc_log::{LogParser, LogReport};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "latexcc")]
#[command(about = "Compile LaTeX to PDF in a scratch directory", long_about = None)]
#[command(version)]
struct Cli {
    /// More logging (-v: info, -vv: debug, -vvv: trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a .tex file (or `-` for stdin) to PDF
    Compile(CompileArgs),
    /// Parse a TeX log file and emit JSON
    Parse {
        /// Path to the .log file
        #[arg(value_name = "FILE")]
        path: PathBuf,
        /// Emit the folded error/warning report instead of raw events
        #[arg(long)]
        report: bool,
    },
}

#[derive(Args, Debug, Default)]
struct CompileArgs {
    /// Source file, or `-` to read stdin
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Where to write the PDF [default: input with .pdf extension]
    #[arg(short, long, value_name = "PDF")]
    output: Option<PathBuf>,

    /// Directory to search before the inherited TEXINPUTS (repeatable)
    #[arg(short = 'I', long = "tex-input", value_name = "DIR")]
    tex_inputs: Vec<PathBuf>,

    /// Allow \write18 shell commands
    #[arg(long)]
    shell_escape: bool,

    /// Passes to run after the first
    #[arg(short = 'n', long, value_name = "N", allow_negative_numbers = true)]
    extra_passes: Option<i64>,

    /// Engine executable [default: pdflatex]
    #[arg(long, value_name = "NAME")]
    engine: Option<String>,

    /// Leave the scratch directory on disk
    #[arg(long)]
    keep_workspace: bool,

    /// JSON options file; flags given on the command line win
    #[arg(long, value_name = "FILE")]
    options: Option<PathBuf>,

    /// Print a failed compilation's diagnostic as JSON
    #[arg(long)]
    json: bool,
}

impl CompileArgs {
    fn compile_options(&self) -> anyhow::Result<CompileOptions> {
        let base = match &self.options {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("invalid options in {}", path.display()))?
            }
            None => CompileOptions::default(),
        };
        Ok(self.apply(base))
    }

    fn apply(&self, mut options: CompileOptions) -> CompileOptions {
        options.tex_inputs.extend(self.tex_inputs.iter().cloned());
        options.shell_escape |= self.shell_escape;
        options.keep_workspace |= self.keep_workspace;
        if self.extra_passes.is_some() {
            options.compile_extra_times = self.extra_passes;
        }
        if self.engine.is_some() {
            options.engine = self.engine.clone();
        }
        options
    }

    fn reads_stdin(&self) -> bool {
        self.input.as_os_str() == "-"
    }

    fn output_path(&self) -> PathBuf {
        match &self.output {
            Some(path) => path.clone(),
            None if self.reads_stdin() => PathBuf::from("texput.pdf"),
            None => self.input.with_extension("pdf"),
        }
    }

    fn read_source(&self) -> anyhow::Result<String> {
        if self.reads_stdin() {
            let mut source = String::new();
            io::stdin()
                .read_to_string(&mut source)
                .context("failed to read source from stdin")?;
            Ok(source)
        } else {
            fs::read_to_string(&self.input)
                .with_context(|| format!("failed to read {}", self.input.display()))
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Compile(args) => compile(args),
        Commands::Parse { path, report } => {
            let content = read_log(path)?;
            let json = if *report {
                serde_json::to_string_pretty(&LogReport::from_log(&content))?
            } else {
                serde_json::to_string_pretty(&LogParser::new().parse(&content))?
            };
            println!("{json}");
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Logs are decoded lossily, the same way the pipeline reads them.
fn read_log(path: &Path) -> anyhow::Result<String> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn compile(args: &CompileArgs) -> anyhow::Result<ExitCode> {
    let options = args.compile_options()?;
    let source = args.read_source()?;

    match Pipeline::new().compile(&source, &options) {
        Ok(doc) => {
            let output = args.output_path();
            fs::write(&output, doc.bytes())
                .with_context(|| format!("failed to write {}", output.display()))?;
            for warning in doc.warnings() {
                log::warn!("{warning}");
            }
            log::info!(
                "wrote {} ({} bytes, {} pass(es), sha256 {})",
                output.display(),
                doc.bytes().len(),
                doc.passes(),
                doc.fingerprint()
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(CompileError::Compilation(diagnostic)) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&diagnostic)?);
            } else {
                eprint!("{}", render(&diagnostic, &args.input));
            }
            Ok(ExitCode::FAILURE)
        }
        Err(other) => Err(other.into()),
    }
}

/// Human-readable rendering of a diagnostic. `./texput.tex` is reported as
/// the file the user actually gave.
fn render(diagnostic: &Diagnostic, input: &Path) -> String {
    let mut out = format!("error: {}\n", diagnostic.message);

    let location = match diagnostic.file.as_deref() {
        Some("./texput.tex" | "texput.tex") => Diagnostic {
            file: Some(input.display().to_string()),
            ..diagnostic.clone()
        }
        .location(),
        _ => diagnostic.location(),
    };
    if let Some(location) = location {
        out.push_str(&format!("  --> {location}\n"));
    }
    if let Some(excerpt) = &diagnostic.source_excerpt {
        out.push_str(&format!("   | {excerpt}\n"));
    }
    for line in &diagnostic.context {
        out.push_str(&format!("   | {}\n", line.trim()));
    }
    for other in &diagnostic.other_errors {
        out.push_str(&format!("also: {other}\n"));
    }
    for note in &diagnostic.notes {
        out.push_str(&format!("note: {note}\n"));
    }
    if diagnostic.pass > 1 {
        out.push_str(&format!("note: failed on pass {}\n", diagnostic.pass));
    }
    out
}
