//! Platform-specific subprocess launching.
//!
//! Every call here blocks the calling thread: [`run`] waits for the child to
//! terminate and [`Pipe::close`] waits for the piped child. Nothing in this
//! module can cancel a running child.

use crate::config::ProcessConfig;
use crate::error::{PortkitError, Result};
use crate::platform::permissions;
use std::fmt;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, ExitStatus, Stdio};
use tracing::{debug, warn};

/// How a child process ended.
///
/// A command that could not be started is reported as
/// [`ProcessStatus::SpawnFailed`], so it cannot be mistaken for a child that
/// ran and exited with the same nonzero code. Callers that only want the
/// integer contract can use [`ProcessStatus::code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    /// The child ran and exited with this code.
    Exited(i32),
    /// The child was terminated by this signal (POSIX only).
    Signaled(i32),
    /// The child was never started.
    SpawnFailed(io::ErrorKind),
}

impl ProcessStatus {
    /// The status as a plain exit code.
    ///
    /// Signals map to `128 + signo` like a POSIX shell reports them; a spawn
    /// failure maps to [`ProcessConfig::SPAWN_FAILED_EXIT_CODE`].
    pub fn code(&self) -> i32 {
        match *self {
            ProcessStatus::Exited(code) => code,
            ProcessStatus::Signaled(signal) => ProcessConfig::SIGNAL_EXIT_BASE + signal,
            ProcessStatus::SpawnFailed(_) => ProcessConfig::SPAWN_FAILED_EXIT_CODE,
        }
    }

    /// True only for a child that ran and exited with code 0.
    pub fn success(&self) -> bool {
        matches!(self, ProcessStatus::Exited(0))
    }

    pub fn spawn_failed(&self) -> bool {
        matches!(self, ProcessStatus::SpawnFailed(_))
    }
}

impl From<ExitStatus> for ProcessStatus {
    fn from(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return ProcessStatus::Exited(code);
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return ProcessStatus::Signaled(signal);
            }
        }

        ProcessStatus::Exited(ProcessConfig::SPAWN_FAILED_EXIT_CODE)
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessStatus::Exited(code) => write!(f, "exited with code {}", code),
            ProcessStatus::Signaled(signal) => write!(f, "terminated by signal {}", signal),
            ProcessStatus::SpawnFailed(kind) => write!(f, "failed to spawn ({})", kind),
        }
    }
}

/// Identifier of the current process.
pub fn current_process_id() -> u32 {
    std::process::id()
}

/// Run `command` with the argument string `args` and wait for it to finish.
///
/// The command is resolved like [`permissions::find_executable`] does before
/// anything is spawned; a command that cannot be resolved is reported as
/// `SpawnFailed(NotFound)`. The child inherits stdio and the environment.
///
/// # Platform Behavior
/// - **Linux/macOS**: The resolved command and `args` run through
///   `/bin/sh -c`, so `args` follows shell quoting rules.
///   `attach_console` has no effect.
/// - **Windows**: `args` is passed to the child verbatim. When
///   `attach_console` is false the child is created without a console
///   window.
pub fn run(command: &str, args: &str, attach_console: bool) -> ProcessStatus {
    let name = strip_quotes(command.trim());
    let Some(program) = permissions::find_executable(name) else {
        debug!("Cannot run {}: command not found", name);
        return ProcessStatus::SpawnFailed(io::ErrorKind::NotFound);
    };

    let mut cmd = build_command(&program, args, attach_console);
    debug!("Running {} {}", program.display(), args);

    match cmd.status() {
        Ok(status) => {
            let status = ProcessStatus::from(status);
            debug!("{} {}", program.display(), status);
            status
        }
        Err(e) => {
            debug!("Failed to spawn {}: {}", program.display(), e);
            ProcessStatus::SpawnFailed(e.kind())
        }
    }
}

fn strip_quotes(command: &str) -> &str {
    command
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(command)
}

#[cfg(unix)]
fn build_command(program: &Path, args: &str, _attach_console: bool) -> Command {
    let mut line = shell_quote(&program.to_string_lossy());
    if !args.trim().is_empty() {
        line.push(' ');
        line.push_str(args);
    }
    let mut cmd = Command::new(ProcessConfig::POSIX_SHELL);
    cmd.arg("-c").arg(line);
    cmd
}

#[cfg(windows)]
fn build_command(program: &Path, args: &str, attach_console: bool) -> Command {
    use std::os::windows::process::CommandExt;
    use windows_sys::Win32::System::Threading::CREATE_NO_WINDOW;

    let mut cmd = Command::new(program);
    if !args.trim().is_empty() {
        cmd.raw_arg(args);
    }
    if !attach_console {
        cmd.creation_flags(CREATE_NO_WINDOW);
    }
    cmd
}

#[cfg(not(any(unix, windows)))]
fn build_command(program: &Path, args: &str, _attach_console: bool) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(args.split_whitespace());
    cmd
}

/// Quote `value` for `/bin/sh` so that it is taken as a single word.
#[cfg(unix)]
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Build a command that runs `line` through the host shell.
fn shell_command(line: &str) -> Command {
    #[cfg(unix)]
    {
        let mut cmd = Command::new(ProcessConfig::POSIX_SHELL);
        cmd.arg("-c").arg(line);
        cmd
    }

    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        let mut cmd = Command::new(ProcessConfig::WINDOWS_SHELL);
        cmd.arg("/C").raw_arg(line);
        cmd
    }

    #[cfg(not(any(unix, windows)))]
    {
        let mut parts = line.split_whitespace();
        let mut cmd = Command::new(parts.next().unwrap_or_default());
        cmd.args(parts);
        cmd
    }
}

/// Direction of a [`Pipe`], seen from the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipeMode {
    /// The caller reads the child's standard output.
    Read,
    /// The caller writes the child's standard input.
    Write,
}

impl PipeMode {
    /// Parse a `popen`-style mode string (`"r"`, `"w"`, optionally with a
    /// `b` or `t` suffix).
    pub fn from_mode_str(mode: &str) -> Result<Self> {
        match mode.trim_end_matches(['b', 't']) {
            "r" => Ok(PipeMode::Read),
            "w" => Ok(PipeMode::Write),
            _ => Err(PortkitError::InvalidMode {
                mode: mode.to_string(),
            }),
        }
    }
}

/// A one-directional byte stream connected to a child process.
///
/// Close it with [`Pipe::close`] to collect the child's exit status.
/// Dropping an unclosed pipe still closes the stream and reaps the child,
/// discarding its status.
#[derive(Debug)]
pub struct Pipe {
    command: String,
    mode: PipeMode,
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    stdin: Option<ChildStdin>,
}

impl Pipe {
    /// Run `command_line` through the host shell with one of its standard
    /// streams connected to the returned pipe.
    pub fn open(command_line: &str, mode: PipeMode) -> Result<Self> {
        let mut cmd = shell_command(command_line);
        match mode {
            PipeMode::Read => cmd.stdout(Stdio::piped()),
            PipeMode::Write => cmd.stdin(Stdio::piped()),
        };

        let mut child = cmd.spawn().map_err(|e| PortkitError::SpawnFailed {
            command: command_line.to_string(),
            message: e.to_string(),
        })?;
        debug!(
            "Opened {:?} pipe to '{}' (pid {})",
            mode,
            command_line,
            child.id()
        );

        Ok(Self {
            command: command_line.to_string(),
            mode,
            stdout: child.stdout.take(),
            stdin: child.stdin.take(),
            child: Some(child),
        })
    }

    pub fn mode(&self) -> PipeMode {
        self.mode
    }

    /// Process id of the child.
    pub fn id(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    /// Close the stream, wait for the child and return how it ended.
    pub fn close(mut self) -> Result<ProcessStatus> {
        self.finish()
    }

    fn finish(&mut self) -> Result<ProcessStatus> {
        // Closing our end first lets a writer child see EOF.
        self.stdin.take();
        self.stdout.take();

        let mut child = self.child.take().ok_or(PortkitError::HandleClosed("pipe"))?;
        let status = ProcessStatus::from(child.wait()?);
        debug!("Pipe to '{}' closed: {}", self.command, status);
        Ok(status)
    }
}

impl Read for Pipe {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.stdout.as_mut() {
            Some(stdout) => stdout.read(buf),
            None => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "pipe is not open for reading",
            )),
        }
    }
}

impl Write for Pipe {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.stdin.as_mut() {
            Some(stdin) => stdin.write(buf),
            None => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "pipe is not open for writing",
            )),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.stdin.as_mut() {
            Some(stdin) => stdin.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for Pipe {
    fn drop(&mut self) {
        if self.child.is_some() {
            if let Err(e) = self.finish() {
                warn!("Failed to reap pipe child '{}': {}", self.command, e);
            }
        }
    }
}
