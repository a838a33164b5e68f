use std::error::Error;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::str;

const GLINT_PATH: &str = "./target/debug/glint";

/// Expected stdout/stderr/exit code of a `glint` invocation.
pub struct Expected<'a> {
    pub stdout: &'a str,
    pub stderr: &'a str,
    pub code: i32,
}

impl<'a> Expected<'a> {
    fn assert_matches(&self, output: &Output) -> Result<(), Box<dyn Error>> {
        assert_eq!(str::from_utf8(&output.stdout)?, self.stdout, "stdout mismatch");
        assert_eq!(str::from_utf8(&output.stderr)?, self.stderr, "stderr mismatch");
        assert_eq!(output.status.code(), Some(self.code), "exit code mismatch");
        Ok(())
    }
}

/// Runs `glint` with `args` (the phase, if any, and the source path) and
/// asserts its stdout/stderr/exit code against `expected`.
pub fn check_output(args: &[&str], expected: Expected) -> Result<(), Box<dyn Error>> {
    let output = Command::new(GLINT_PATH).args(args).output()?;
    expected.assert_matches(&output)
}

/// Same as [`check_output`] but feeds `stdin_input` to the process, for
/// scenarios exercising the `read`/`<-` dynamic literal.
pub fn check_output_with_stdin(args: &[&str], stdin_input: &str, expected: Expected) -> Result<(), Box<dyn Error>> {
    let mut child = Command::new(GLINT_PATH)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    child
        .stdin
        .as_mut()
        .expect("stdin was piped")
        .write_all(stdin_input.as_bytes())?;

    let output = child.wait_with_output()?;
    expected.assert_matches(&output)
}

/// Convenience for the common `glint <path>` shape.
pub fn script_path(name: &str) -> String {
    Path::new("tests").join("scripts").join(name).to_string_lossy().into_owned()
}
