//! Portkit Core - one contract for the OS primitives a document toolchain
//! needs, whatever it is compiled for.
//!
//! The facade covers:
//! - blocking subprocess launch and pipes ([`run`], [`Pipe`])
//! - environment access ([`getenv`], [`setenv`], [`unsetenv`])
//! - buffered file I/O with 64-bit offsets ([`PortableFile`], [`remove`])
//! - path conventions and per-OS constants ([`PathStyle`], [`dev_null_path`], ...)
//! - executable lookup ([`check_executable`])
//! - streaming character-set conversion ([`Transcoder`])
//! - an external-tool timer and the short installation directory
//!   ([`PlatformContext`]) plus [`sleep_milliseconds`]
//!
//! Failures are always return values. Nothing here panics on bad input,
//! retries, or aborts the process.
//!
//! # Example
//!
//! ```rust,no_run
//! use portkit_core::{run, PlatformContext, Transcoder};
//!
//! fn main() -> portkit_core::Result<()> {
//!     let mut ctx = PlatformContext::new();
//!
//!     ctx.timer_start()?;
//!     let status = run("dot", "-Tpng graph.dot -o graph.png", false);
//!     ctx.timer_stop()?;
//!     if status.spawn_failed() {
//!         eprintln!("dot is not installed");
//!     }
//!
//!     let mut to_utf16 = Transcoder::open("UTF-16LE", "UTF-8")?;
//!     let mut out = [0u8; 64];
//!     let step = to_utf16.convert("héllo".as_bytes(), &mut out)?;
//!     println!("{} bytes in, {} bytes out", step.consumed, step.produced);
//!     to_utf16.close()
//! }
//! ```

pub mod config;
pub mod context;
pub mod encoding;
pub mod error;
pub mod platform;
pub mod text;
pub mod timer;

// Re-export commonly used types
pub use context::PlatformContext;
pub use encoding::{
    recode_utf8_to_wide, BackendKind, Charset, Conversion, ConvertStatus, Transcoder,
};
pub use error::{PortkitError, Result};
pub use platform::{
    check_executable, command_extension, correct_path, correct_search_path, current_platform,
    current_process_id, dev_null_path, file_system_is_case_sensitive, find_executable, getenv,
    ghostscript_command, is_absolute_path, is_supported_platform, path_list_separator,
    path_separator, remove, run, setenv, unsetenv, FileOffset, OpenMode, PathStyle, Pipe,
    PipeMode, PlatformInfo, PortableFile, ProcessStatus, Whence,
};
pub use text::find_bounded;
pub use timer::{sleep_milliseconds, SysTimer};
