//! Type-safe tool argument contracts.
//!
//! Every external command raidgrow issues (`mdadm`, `pvmove`, `vgextend`, ...)
//! is described by a struct implementing `ToolArgs`. Call sites never build
//! command strings; the argv is produced here and handed to the process
//! directly, so device names never pass through a shell.
//!
//! # Contract
//!
//! - `program()`: the binary name, resolved on `PATH` at execution time.
//! - `to_cli_args()`: argv after the program name, exactly as the tool expects.
//! - `command_line()`: a shell-quoted rendering used only for the transcript
//!   and error messages.
//!
//! # Example
//!
//! ```
//! use std::path::PathBuf;
//! use raidgrow::tool_traits::ToolArgs;
//! use raidgrow::tools::mdadm::MdadmStopArgs;
//!
//! let args = MdadmStopArgs { device: PathBuf::from("/dev/md0") };
//! assert_eq!(args.to_cli_args(), vec!["--stop", "/dev/md0"]);
//! assert_eq!(args.command_line(), "mdadm --stop /dev/md0");
//! ```

use std::borrow::Cow;

/// Trait for typed tool arguments.
pub trait ToolArgs {
    /// The executable to run (e.g. `"mdadm"`).
    fn program(&self) -> &'static str;

    /// Convert struct fields to command-line arguments.
    fn to_cli_args(&self) -> Vec<String>;

    /// Human-readable command line with shell quoting applied where needed.
    fn command_line(&self) -> String {
        let mut line = String::from(self.program());
        for arg in self.to_cli_args() {
            line.push(' ');
            line.push_str(&quote_arg(&arg));
        }
        line
    }
}

/// Quote an argument for display the way a POSIX shell would need it.
pub fn quote_arg(arg: &str) -> Cow<'_, str> {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "/._-=,:+@%".contains(c));
    if safe {
        Cow::Borrowed(arg)
    } else {
        Cow::Owned(format!("'{}'", arg.replace('\'', "'\\''")))
    }
}
