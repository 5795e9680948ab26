use std::collections::BTreeMap;

use serde::Serialize;

use crate::terminal::script;
use crate::terminal::state::TerminalState;
use crate::terminal::vfs::VirtualFileSystem;

/// What running one input line produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommandOutcome {
    pub output_lines: Vec<String>,
    pub is_error: bool,
    pub clear_requested: bool,
}

impl CommandOutcome {
    fn lines(text: &str) -> Self {
        Self {
            output_lines: text.split('\n').map(str::to_owned).collect(),
            ..Self::default()
        }
    }

    fn line(text: impl Into<String>) -> Self {
        Self {
            output_lines: vec![text.into()],
            ..Self::default()
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            output_lines: vec![text.into()],
            is_error: true,
            clear_requested: false,
        }
    }

    fn clear() -> Self {
        Self {
            clear_requested: true,
            ..Self::default()
        }
    }
}

struct Invocation<'a> {
    args: &'a [&'a str],
    state: &'a TerminalState,
    vfs: &'a VirtualFileSystem,
}

type Handler = fn(&Invocation<'_>) -> CommandOutcome;

#[derive(Clone, Copy)]
pub struct CommandSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    handler: Handler,
}

impl std::fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("usage", &self.usage)
            .finish()
    }
}

const CLEAR: &str = "clear";

const BUILTINS: [CommandSpec; 8] = [
    CommandSpec {
        name: "cat",
        description: "Display file contents",
        usage: "cat <filename>",
        handler: cat,
    },
    CommandSpec {
        name: "ls",
        description: "List directory contents",
        usage: "ls [directory]",
        handler: ls,
    },
    CommandSpec {
        name: "help",
        description: "Show available commands",
        usage: "help",
        handler: help,
    },
    CommandSpec {
        name: CLEAR,
        description: "Clear the terminal",
        usage: "clear",
        handler: |_| CommandOutcome::clear(),
    },
    CommandSpec {
        name: "pointlabs",
        description: "Point Labs CLI",
        usage: "pointlabs [--version | network status]",
        handler: pointlabs,
    },
    CommandSpec {
        name: "git",
        description: "Git commands (limited)",
        usage: "git log --oneline -5",
        handler: git,
    },
    CommandSpec {
        name: "echo",
        description: "Display a line of text",
        usage: "echo [text]",
        handler: |call| CommandOutcome::line(call.args.join(" ")),
    },
    CommandSpec {
        name: "pwd",
        description: "Print working directory",
        usage: "pwd",
        handler: |call| CommandOutcome::line(call.state.current_directory()),
    },
];

/// Named handlers for the interactive terminal.
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    commands: BTreeMap<&'static str, CommandSpec>,
    vfs: VirtualFileSystem,
}

impl CommandRegistry {
    pub fn new(vfs: VirtualFileSystem) -> Self {
        Self {
            commands: BUILTINS.iter().map(|spec| (spec.name, *spec)).collect(),
            vfs,
        }
    }

    pub fn vfs(&self) -> &VirtualFileSystem {
        &self.vfs
    }

    pub fn commands(&self) -> impl Iterator<Item = &CommandSpec> {
        self.commands.values()
    }

    pub fn get(&self, name: &str) -> Option<&CommandSpec> {
        self.commands.get(name)
    }

    /// Parses and runs one input line. Blank input produces an empty outcome.
    pub fn execute(&self, input: &str, state: &TerminalState) -> CommandOutcome {
        let mut parts = input.split_whitespace();
        let Some(first) = parts.next() else {
            return CommandOutcome::default();
        };
        let name = first.to_lowercase();
        if name == CLEAR {
            return CommandOutcome::clear();
        }

        let Some(spec) = self.commands.get(name.as_str()) else {
            tracing::debug!(command = %name, "unknown terminal command");
            return CommandOutcome::error(format!("command not found: {name}"));
        };
        let args = parts.collect::<Vec<_>>();
        let outcome = (spec.handler)(&Invocation {
            args: &args,
            state,
            vfs: &self.vfs,
        });
        tracing::debug!(
            command = spec.name,
            lines = outcome.output_lines.len(),
            is_error = outcome.is_error,
            "terminal command executed"
        );
        outcome
    }

    /// Command names starting with `partial`. Blank input lists every command.
    pub fn suggestions(&self, partial: &str) -> Vec<&'static str> {
        let prefix = partial.trim().to_lowercase();
        self.commands
            .keys()
            .copied()
            .filter(|name| name.starts_with(prefix.as_str()))
            .collect()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new(VirtualFileSystem::stock())
    }
}

fn cat(call: &Invocation<'_>) -> CommandOutcome {
    let Some(&filename) = call.args.first() else {
        return CommandOutcome::error("cat: missing file operand");
    };
    match call.vfs.resolve_file(filename) {
        Some(content) => CommandOutcome::lines(content),
        None => CommandOutcome::error(format!("cat: {filename}: No such file or directory")),
    }
}

fn ls(call: &Invocation<'_>) -> CommandOutcome {
    let cwd = call.state.current_directory();
    let dirname = call.args.first().copied().unwrap_or(cwd);
    match call.vfs.resolve_directory(dirname, cwd) {
        Some(entries) => CommandOutcome::line(entries.join("  ")),
        None => CommandOutcome::error(format!(
            "ls: cannot access '{dirname}': No such file or directory"
        )),
    }
}

fn help(_: &Invocation<'_>) -> CommandOutcome {
    CommandOutcome::lines(script::HELP_OUTPUT)
}

fn pointlabs(call: &Invocation<'_>) -> CommandOutcome {
    match call.args {
        [] => CommandOutcome::line("Usage: pointlabs [--version | network status]"),
        ["--version" | "-v", ..] => CommandOutcome::lines(script::VERSION_OUTPUT),
        ["network", "status", ..] => CommandOutcome::lines(script::NETWORK_STATUS),
        args => CommandOutcome::error(format!(
            "pointlabs: unknown command '{}'",
            args.join(" ")
        )),
    }
}

fn git(call: &Invocation<'_>) -> CommandOutcome {
    match call.args {
        ["log", rest @ ..] if rest.contains(&"--oneline") => {
            CommandOutcome::lines(script::GIT_LOG_OUTPUT)
        }
        _ => CommandOutcome::error("Only \"git log --oneline -5\" is available in this demo"),
    }
}

#[cfg(test)]
mod tests {
    use super::CommandRegistry;
    use crate::terminal::script;
    use crate::terminal::state::TerminalState;

    fn run(input: &str) -> super::CommandOutcome {
        CommandRegistry::default().execute(input, &TerminalState::default())
    }

    #[test]
    fn cat_prints_file_lines() {
        let outcome = run("cat mission.txt");
        assert!(!outcome.is_error);
        let expected = script::MISSION_TXT.split('\n').collect::<Vec<_>>();
        assert_eq!(outcome.output_lines, expected);
    }

    #[test]
    fn cat_reports_missing_files_and_operands() {
        let outcome = run("cat nope.txt");
        assert!(outcome.is_error);
        assert_eq!(outcome.output_lines.len(), 1);
        assert!(outcome.output_lines[0].contains("No such file or directory"));

        assert_eq!(run("cat").output_lines, vec!["cat: missing file operand"]);
    }

    #[test]
    fn ls_lists_the_current_directory_on_one_line() {
        let outcome = run("ls");
        assert_eq!(outcome.output_lines, vec!["mission.txt  values.txt  .config/"]);

        let missing = run("ls /tmp");
        assert!(missing.is_error);
        assert_eq!(
            missing.output_lines,
            vec!["ls: cannot access '/tmp': No such file or directory"]
        );
    }

    #[test]
    fn blank_input_does_nothing() {
        assert_eq!(run(""), super::CommandOutcome::default());
        assert_eq!(run("   \t "), super::CommandOutcome::default());
    }

    #[test]
    fn clear_is_signalled_regardless_of_case_or_arguments() {
        let outcome = run("CLEAR everything");
        assert!(outcome.clear_requested);
        assert!(outcome.output_lines.is_empty());
    }

    #[test]
    fn unknown_commands_name_the_lowercased_command() {
        let outcome = run("UnknownCmd foo");
        assert!(outcome.is_error);
        assert_eq!(outcome.output_lines, vec!["command not found: unknowncmd"]);
    }

    #[test]
    fn domain_commands_cover_their_subcommands() {
        assert_eq!(
            run("pointlabs -v").output_lines[0],
            "pointlabs v0.3.1 (build 2024.12.001)"
        );
        assert_eq!(
            run("pointlabs network status").output_lines[0],
            "Network Status: OPERATIONAL"
        );
        assert_eq!(
            run("pointlabs").output_lines,
            vec!["Usage: pointlabs [--version | network status]"]
        );
        let unknown = run("pointlabs deploy now");
        assert!(unknown.is_error);
        assert_eq!(unknown.output_lines, vec!["pointlabs: unknown command 'deploy now'"]);

        assert_eq!(run("git log --oneline -5").output_lines.len(), 5);
        assert!(run("git status").is_error);
    }

    #[test]
    fn echo_and_pwd_use_arguments_and_state() {
        assert_eq!(run("echo  hello   world").output_lines, vec!["hello world"]);
        assert_eq!(run("pwd").output_lines, vec!["~/pointlabs"]);
    }

    #[test]
    fn suggestions_match_prefixes() {
        let registry = CommandRegistry::default();
        assert_eq!(registry.suggestions("c"), vec!["cat", "clear"]);
        assert_eq!(registry.suggestions(" P"), vec!["pointlabs", "pwd"]);
        assert_eq!(registry.suggestions("").len(), 8);
        assert!(registry.suggestions("zz").is_empty());
    }
}
