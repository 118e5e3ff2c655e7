use tokio::process::Command;

/// Build a `sh -c` invocation for an operator supplied command line.
pub(crate) fn shell(command_line: &str) -> Command {
    let mut command = Command::new("sh");
    command.arg("-c").arg(command_line);
    command
}

/// First meaningful chunk of a process' captured output, for log lines.
pub(crate) fn trimmed_output(output: &[u8]) -> String {
    String::from_utf8_lossy(output).trim().to_owned()
}
