use super::*;
use crate::error::ErrorKind;
use crate::executor::Invocation;
use crate::search_path::TEXINPUTS;
use crate::workspace::{ARTIFACT_FILE, LOG_FILE, SOURCE_FILE};
use std::fs;
use std::io;
use std::process::{ExitStatus, Output};
use std::sync::Mutex;

const CLEAN_LOG: &str = "(./texput.tex\nLaTeX Warning: Label(s) may have changed.\n)\nOutput written on texput.pdf (1 page, 100 bytes).\n";
const FAILED_LOG: &str = "(./texput.tex\n! Undefined control sequence.\nl.3 \\nosuchmacro\n\n!  ==> Fatal error occurred, no output PDF file produced!\n";

/// What the fake engine does on a given pass.
#[derive(Debug, Clone, Copy)]
enum Pass {
    /// Writes a PDF derived from the source and a clean log.
    Succeed,
    /// Exits 0 and writes a log, but leaves no PDF behind.
    SucceedWithoutPdf,
    /// Writes [`FAILED_LOG`] and exits 1.
    Fail,
    /// Exits 1 without writing a log.
    FailSilently,
    /// Cannot be started.
    Missing,
}

#[derive(Debug)]
struct ScriptedEngine {
    script: Vec<Pass>,
    fallback: Pass,
    calls: Mutex<Vec<Invocation>>,
}

impl ScriptedEngine {
    fn always(pass: Pass) -> Arc<Self> {
        Self::script(&[], pass)
    }

    fn script(script: &[Pass], fallback: Pass) -> Arc<Self> {
        Arc::new(Self {
            script: script.to_vec(),
            fallback,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }
}

impl CommandExecutor for ScriptedEngine {
    fn execute(&self, invocation: &Invocation) -> io::Result<Output> {
        let pass = {
            let mut calls = self.calls.lock().unwrap();
            let pass = self.script.get(calls.len()).copied().unwrap_or(self.fallback);
            calls.push(invocation.clone());
            pass
        };
        let dir = &invocation.working_dir;
        let code = match pass {
            Pass::Succeed => {
                let source = fs::read(dir.join(SOURCE_FILE))?;
                let mut pdf = b"%PDF-fake\n".to_vec();
                pdf.extend(source);
                fs::write(dir.join(ARTIFACT_FILE), pdf)?;
                fs::write(dir.join(LOG_FILE), CLEAN_LOG)?;
                0
            }
            Pass::SucceedWithoutPdf => {
                fs::write(dir.join(LOG_FILE), CLEAN_LOG)?;
                let _ = fs::remove_file(dir.join(ARTIFACT_FILE));
                0
            }
            Pass::Fail => {
                fs::write(dir.join(LOG_FILE), FAILED_LOG)?;
                1
            }
            Pass::FailSilently => 1,
            Pass::Missing => {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("{} not found", invocation.program),
                ));
            }
        };
        Ok(Output {
            status: exit_status(code),
            stdout: Vec::new(),
            stderr: Vec::new(),
        })
    }
}

fn exit_status(code: i32) -> ExitStatus {
    #[cfg(unix)]
    let status = {
        use std::os::unix::process::ExitStatusExt;
        ExitStatus::from_raw(code << 8)
    };
    #[cfg(windows)]
    let status = {
        use std::os::windows::process::ExitStatusExt;
        ExitStatus::from_raw(code as u32)
    };
    status
}

fn pipeline(engine: &Arc<ScriptedEngine>, root: &tempfile::TempDir) -> Pipeline {
    Pipeline::with_executor(engine.clone()).with_scratch_root(root.path())
}

fn scratch_is_empty(root: &tempfile::TempDir) -> bool {
    fs::read_dir(root.path()).unwrap().next().is_none()
}

#[test]
fn runs_extra_passes_plus_one() {
    for extra in 0..4 {
        let root = tempfile::tempdir().unwrap();
        let engine = ScriptedEngine::always(Pass::Succeed);
        let options = CompileOptions::new().with_extra_passes(extra);

        let doc = pipeline(&engine, &root).compile("x", &options).unwrap();
        assert_eq!(engine.calls().len() as i64, extra + 1);
        assert_eq!(doc.passes() as i64, extra + 1);
    }
}

#[test]
fn absent_null_or_negative_extra_passes_mean_one_pass() {
    let variants = [
        r#"{}"#,
        r#"{ "compileExtraTimes": null }"#,
        r#"{ "compileExtraTimes": -1 }"#,
        r#"{ "compileExtraTimes": -100 }"#,
    ];
    for json in variants {
        let root = tempfile::tempdir().unwrap();
        let engine = ScriptedEngine::always(Pass::Succeed);
        let options: CompileOptions = serde_json::from_str(json).unwrap();

        pipeline(&engine, &root).compile("x", &options).unwrap();
        assert_eq!(engine.calls().len(), 1, "options {json}");
    }
}

#[test]
fn returns_the_artifact_bytes() {
    let root = tempfile::tempdir().unwrap();
    let engine = ScriptedEngine::always(Pass::Succeed);
    let source = "\\documentclass{article}\\begin{document}hi\\end{document}";

    let doc = pipeline(&engine, &root)
        .compile(source, &CompileOptions::new())
        .unwrap();

    let mut expected = b"%PDF-fake\n".to_vec();
    expected.extend(source.as_bytes());
    assert_eq!(doc.bytes(), expected.as_slice());
    assert_eq!(doc.warnings(), ["LaTeX Warning: Label(s) may have changed."]);
}

#[test]
fn rejected_source_yields_diagnostic_after_one_pass() {
    let root = tempfile::tempdir().unwrap();
    let engine = ScriptedEngine::always(Pass::Fail);
    let options = CompileOptions::new().with_extra_passes(3);

    let err = pipeline(&engine, &root)
        .compile("\\nosuchmacro", &options)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Compilation);
    let diagnostic = err.diagnostic().unwrap();
    assert_eq!(diagnostic.message, "Undefined control sequence.");
    assert_eq!(diagnostic.file.as_deref(), Some("./texput.tex"));
    assert_eq!(diagnostic.line, Some(3));
    assert_eq!(diagnostic.pass, 1);
    assert!(!diagnostic.degraded);
    assert_eq!(engine.calls().len(), 1);
}

#[test]
fn failure_on_a_later_pass_stops_the_loop() {
    let root = tempfile::tempdir().unwrap();
    let engine = ScriptedEngine::script(&[Pass::Succeed, Pass::Fail], Pass::Succeed);
    let options = CompileOptions::new().with_extra_passes(4);

    let err = pipeline(&engine, &root).compile("x", &options).unwrap_err();
    assert_eq!(err.diagnostic().map(|d| d.pass), Some(2));
    assert_eq!(engine.calls().len(), 2);
}

#[test]
fn clean_exit_without_pdf_is_artifact_missing() {
    let root = tempfile::tempdir().unwrap();
    let engine = ScriptedEngine::script(&[Pass::Succeed], Pass::SucceedWithoutPdf);
    let options = CompileOptions::new().with_extra_passes(1);

    let err = pipeline(&engine, &root).compile("x", &options).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ArtifactMissing);
    assert!(err.diagnostic().is_none());
    assert_eq!(engine.calls().len(), 2);
}

#[test]
fn failure_without_log_is_a_degraded_diagnostic() {
    let root = tempfile::tempdir().unwrap();
    let engine = ScriptedEngine::always(Pass::FailSilently);

    let err = pipeline(&engine, &root)
        .compile("x", &CompileOptions::new())
        .unwrap_err();

    let diagnostic = err.diagnostic().unwrap();
    assert!(diagnostic.degraded);
    assert!(diagnostic.message.contains(LOG_FILE));
}

#[test]
fn missing_engine_is_a_degraded_diagnostic_with_note() {
    let root = tempfile::tempdir().unwrap();
    let engine = ScriptedEngine::always(Pass::Missing);
    let options = CompileOptions::new().with_engine("nolatex");

    let err = pipeline(&engine, &root).compile("x", &options).unwrap_err();
    let diagnostic = err.diagnostic().unwrap();
    assert!(diagnostic.degraded);
    assert!(diagnostic.notes.iter().any(|n| n.contains("nolatex not found")));
}

#[test]
fn command_line_and_environment() {
    let root = tempfile::tempdir().unwrap();
    let engine = ScriptedEngine::always(Pass::Succeed);
    let options = CompileOptions::new()
        .with_shell_escape(true)
        .with_tex_inputs(["styles", "/abs/figs"])
        .with_extra_passes(1);

    pipeline(&engine, &root).compile("x", &options).unwrap();

    let calls = engine.calls();
    let first = &calls[0];
    assert_eq!(first.program, "pdflatex");
    assert_eq!(first.args, ["-shell-escape", "-halt-on-error", "texput.tex"]);
    assert!(first.working_dir.starts_with(root.path()));

    let cwd = std::env::current_dir().unwrap();
    let texinputs = first.env_var(TEXINPUTS).unwrap();
    let expected_prefix = format!("{}:/abs/figs:", cwd.join("styles").display());
    assert!(
        texinputs.starts_with(&expected_prefix),
        "{texinputs} should start with {expected_prefix}"
    );
    assert_eq!(calls[1], calls[0]);
}

#[test]
fn workspace_is_removed_on_every_path() {
    for pass in [Pass::Succeed, Pass::Fail, Pass::SucceedWithoutPdf] {
        let root = tempfile::tempdir().unwrap();
        let engine = ScriptedEngine::always(pass);
        let _ = pipeline(&engine, &root).compile("x", &CompileOptions::new());
        assert!(scratch_is_empty(&root), "{pass:?} left files behind");
    }
}

#[test]
fn keep_workspace_leaves_the_directory() {
    let root = tempfile::tempdir().unwrap();
    let engine = ScriptedEngine::always(Pass::Succeed);
    let options = CompileOptions::new().with_keep_workspace(true);

    pipeline(&engine, &root).compile("x", &options).unwrap();

    let kept = &engine.calls()[0].working_dir;
    assert!(kept.join(SOURCE_FILE).is_file());
    assert!(kept.join(ARTIFACT_FILE).is_file());
}

#[test]
fn repeated_compiles_are_independent_and_identical() {
    let root = tempfile::tempdir().unwrap();
    let engine = ScriptedEngine::always(Pass::Succeed);
    let pipeline = pipeline(&engine, &root);
    let options = CompileOptions::new().with_extra_passes(1);

    let first = pipeline.compile("same", &options).unwrap();
    let second = pipeline.compile("same", &options).unwrap();
    assert_eq!(first.fingerprint(), second.fingerprint());

    let calls = engine.calls();
    assert_eq!(calls.len(), 4);
    assert_eq!(calls[0].working_dir, calls[1].working_dir);
    assert_ne!(calls[1].working_dir, calls[2].working_dir);
}

#[test]
fn concurrent_compiles_do_not_interfere() {
    let root = tempfile::tempdir().unwrap();
    let engine = ScriptedEngine::always(Pass::Succeed);
    let pipeline = pipeline(&engine, &root);

    let docs: Vec<Vec<u8>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let pipeline = &pipeline;
                scope.spawn(move || {
                    pipeline
                        .compile(&format!("doc {i}"), &CompileOptions::new())
                        .unwrap()
                        .into_bytes()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (i, pdf) in docs.iter().enumerate() {
        assert!(pdf.ends_with(format!("doc {i}").as_bytes()));
    }
    assert!(scratch_is_empty(&root));
}

#[test]
fn unusable_scratch_root_fails_allocation() {
    let root = tempfile::tempdir().unwrap();
    let file = root.path().join("file");
    fs::write(&file, "").unwrap();
    let engine = ScriptedEngine::always(Pass::Succeed);

    let err = Pipeline::with_executor(engine.clone())
        .with_scratch_root(&file)
        .compile("x", &CompileOptions::new())
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::WorkspaceAllocation);
    assert!(engine.calls().is_empty());
}
