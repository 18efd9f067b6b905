//! toolcrib - Manage tools, loans and materials in a toolcrib ledger.
//!
//! Primary binary for every ledger operation.

fn main() -> std::process::ExitCode {
    toolcrib::cmd::ledger::main()
}
