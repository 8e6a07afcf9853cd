use std::borrow::Cow;
use std::process::Command;

/// How a shell takes a command string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellStyle {
    /// `cmd.exe /c <cmd>`
    Cmd,
    /// `sh -c <cmd>`
    Posix,
}

/// The shell used as a transport for editor CLI invocations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shell {
    program: String,
    style: ShellStyle,
}

impl Shell {
    pub fn new(program: impl Into<String>, style: ShellStyle) -> Self {
        Shell {
            program: program.into(),
            style,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn style(&self) -> ShellStyle {
        self.style
    }

    /// Same invocation style, different program.
    pub fn with_program(&self, program: impl Into<String>) -> Self {
        Shell::new(program, self.style)
    }

    /// Arguments that make the shell run `command_line`.
    pub fn wrap_args(&self, command_line: &str) -> Vec<String> {
        let flag = match self.style {
            ShellStyle::Cmd => "/c",
            ShellStyle::Posix => "-c",
        };
        vec![flag.to_string(), command_line.to_string()]
    }

    /// A ready-to-run `Command` executing `command_line` through this shell.
    pub fn command(&self, command_line: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        match self.style {
            ShellStyle::Posix => {
                cmd.args(self.wrap_args(command_line));
            }
            ShellStyle::Cmd => {
                // cmd.exe does its own parsing, so the line must reach it unquoted.
                #[cfg(windows)]
                {
                    use std::os::windows::process::CommandExt;
                    cmd.arg("/c").raw_arg(command_line);
                }
                #[cfg(not(windows))]
                {
                    cmd.args(self.wrap_args(command_line));
                }
            }
        }
        cmd
    }

    /// Quote a single word for embedding in a command line.
    pub fn quote<'a>(&self, word: &'a str) -> Cow<'a, str> {
        match self.style {
            ShellStyle::Cmd => shell_escape::windows::escape(Cow::Borrowed(word)),
            ShellStyle::Posix => shell_escape::unix::escape(Cow::Borrowed(word)),
        }
    }
}
