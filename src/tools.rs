//! The `tools` module wraps the external binutils-style command-line tools used
//! to inspect and convert ELF files. The core codec never depends on this; it
//! is a thin invoker that resolves a tool, captures its interleaved
//! stdout/stderr as text, and kills the process if it outlives the timeout.

use crate::error::ToolError;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Invoker for the ELF toolchain executables (readelf, objdump, objcopy).
///
/// `tool_dir` empty means tools resolve through `PATH`; otherwise the named
/// executable must exist inside it. Each document/file gets its own instance;
/// there is no shared state.
#[derive(Debug, Clone)]
pub struct ElfToolchain {
    filename: PathBuf,
    /// Directory holding the toolchain binaries; empty = use `PATH`
    pub tool_dir: PathBuf,
    /// Kill the tool process after this long
    pub timeout: Duration,
    pub readelf: String,
    pub objdump: String,
    pub objcopy: String,
}

impl ElfToolchain {
    /// Creates a toolchain wrapper for `filename`, resolving tools via `PATH`.
    #[must_use]
    pub fn new<P: AsRef<Path>>(filename: P) -> Self {
        Self {
            filename: filename.as_ref().to_path_buf(),
            tool_dir: PathBuf::new(),
            timeout: DEFAULT_TIMEOUT,
            readelf: String::from("arm-none-eabi-readelf"),
            objdump: String::from("arm-none-eabi-objdump"),
            objcopy: String::from("arm-none-eabi-objcopy"),
        }
    }

    /// Creates a toolchain wrapper with an explicit tool directory.
    #[must_use]
    pub fn with_tool_dir<P: AsRef<Path>, Q: AsRef<Path>>(filename: P, tool_dir: Q) -> Self {
        Self {
            tool_dir: tool_dir.as_ref().to_path_buf(),
            ..Self::new(filename)
        }
    }

    /// ELF file, program and section headers (`readelf -h -l -S`).
    ///
    /// # Errors
    /// Fails if the tool is missing, times out, or cannot be spawned.
    pub fn headers(&self) -> Result<String, ToolError> {
        let file = self.filename.to_string_lossy().into_owned();
        self.run(&self.readelf, &["-h", "-l", "-S", &file])
    }

    /// Everything readelf reports (`readelf --all`).
    ///
    /// # Errors
    /// Fails if the tool is missing, times out, or cannot be spawned.
    pub fn all_info(&self) -> Result<String, ToolError> {
        let file = self.filename.to_string_lossy().into_owned();
        self.run(&self.readelf, &["--all", &file])
    }

    /// Disassembly listing (`objdump -d`).
    ///
    /// # Errors
    /// Fails if the tool is missing, times out, or cannot be spawned.
    pub fn disassemble(&self) -> Result<String, ToolError> {
        let file = self.filename.to_string_lossy().into_owned();
        self.run(&self.objdump, &["-d", &file])
    }

    /// Converts the ELF to a flat binary image (`objcopy -O binary`).
    ///
    /// # Errors
    /// Fails if the tool is missing, times out, or cannot be spawned.
    pub fn to_binary<P: AsRef<Path>>(&self, output: P) -> Result<String, ToolError> {
        let file = self.filename.to_string_lossy().into_owned();
        let out = output.as_ref().to_string_lossy().into_owned();
        self.run(&self.objcopy, &["-O", "binary", &file, &out])
    }

    /// Runs one tool with the given arguments and returns its captured
    /// console output (stdout and stderr interleaved as they arrive).
    ///
    /// # Errors
    /// - [`ToolError::NotFound`] if the executable cannot be located.
    /// - [`ToolError::Timeout`] if the process does not exit in time; it is
    ///   forcibly terminated in that case.
    /// - [`ToolError::Io`] for any other spawn/wait failure.
    pub fn run(&self, tool: &str, args: &[&str]) -> Result<String, ToolError> {
        let program = if self.tool_dir.as_os_str().is_empty() {
            PathBuf::from(tool)
        } else {
            let full = self.tool_dir.join(tool);
            if !full.is_file() {
                return Err(ToolError::NotFound(tool.to_string()));
            }
            full
        };

        let mut child = Command::new(&program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| {
                if err.kind() == std::io::ErrorKind::NotFound {
                    ToolError::NotFound(tool.to_string())
                } else {
                    ToolError::Io(err)
                }
            })?;

        let response = Arc::new(Mutex::new(String::new()));
        let out_handle = spawn_capture(child.stdout.take(), Arc::clone(&response));
        let err_handle = spawn_capture(child.stderr.take(), Arc::clone(&response));

        let started = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(_status)) => break,
                Ok(None) => {
                    if started.elapsed() > self.timeout {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(ToolError::Timeout(
                            tool.to_string(),
                            self.timeout.as_secs(),
                        ));
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(err) => return Err(ToolError::Io(err)),
            }
        }

        let _ = out_handle.join();
        let _ = err_handle.join();

        let captured = response.lock().map(|s| s.clone()).unwrap_or_default();
        Ok(captured)
    }
}

/// Drain one pipe line-by-line into the shared response buffer.
fn spawn_capture<R>(pipe: Option<R>, sink: Arc<Mutex<String>>) -> JoinHandle<()>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let Some(pipe) = pipe else { return };
        let reader = BufReader::new(pipe);
        for line in reader.lines() {
            let Ok(line) = line else { break };
            if let Ok(mut buf) = sink.lock() {
                buf.push_str(&line);
                buf.push('\n');
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tool_in_explicit_dir() {
        // Arrange
        let tools = ElfToolchain::with_tool_dir("firmware.elf", "/nonexistent/toolchain");

        // Act
        let res = tools.headers();

        // Assert
        assert!(matches!(res, Err(ToolError::NotFound(_))));
    }

    #[test]
    fn test_missing_tool_on_path() {
        let mut tools = ElfToolchain::new("firmware.elf");
        tools.readelf = String::from("definitely-not-a-real-readelf");

        let res = tools.headers();

        assert!(matches!(res, Err(ToolError::NotFound(_))));
    }

    #[test]
    #[cfg(unix)]
    fn test_captures_console_output() {
        let tools = ElfToolchain::new("unused");

        let out = tools.run("echo", &["hello", "world"]).unwrap();

        assert_eq!(out, "hello world\n");
    }

    #[test]
    #[cfg(unix)]
    fn test_timeout_kills_process() {
        // Arrange: a tool that sleeps far past the timeout
        let mut tools = ElfToolchain::new("unused");
        tools.timeout = Duration::from_millis(200);

        // Act
        let started = Instant::now();
        let res = tools.run("sleep", &["30"]);

        // Assert: killed shortly after the timeout, not after 30s
        assert!(matches!(res, Err(ToolError::Timeout(_, _))));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
