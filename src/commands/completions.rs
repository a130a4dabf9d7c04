use anyhow::Result;
use clap::CommandFactory;
use clap_complete::{
    generate,
    shells::{Bash, Fish, Zsh},
};
use std::io::{self, Write};

use crate::error::CliError;
use crate::Cli;

pub fn run(shell: &str) -> Result<()> {
    write_completions(shell, &mut io::stdout())
}

pub fn write_completions(shell: &str, out: &mut dyn Write) -> Result<()> {
    let mut cmd = Cli::command();
    match shell {
        "bash" => generate(Bash, &mut cmd, "openschema", out),
        "zsh" => generate(Zsh, &mut cmd, "openschema", out),
        "fish" => generate(Fish, &mut cmd, "openschema", out),
        other => {
            return Err(CliError::user_with_hint(
                format!("unsupported shell '{other}'"),
                "choose one of: bash, zsh, fish",
            )
            .into())
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bash_completions_mention_subcommands() {
        let mut out = Vec::new();
        write_completions("bash", &mut out).unwrap();
        let script = String::from_utf8(out).unwrap();
        assert!(script.contains("openschema"));
        assert!(script.contains("push"));
    }

    #[test]
    fn test_unknown_shell_is_rejected() {
        let err = write_completions("tcsh", &mut Vec::new()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::UserInput { .. })
        ));
    }
}
