//! Shell completion generation.

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use std::io;

/// Write completions for `A` to stdout.
pub fn generate_completions<A: CommandFactory>(shell: Shell, bin_name: &str) {
    let mut cmd = A::command();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}
