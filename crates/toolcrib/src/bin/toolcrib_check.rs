//! toolcrib-check - Verify the invariants of a toolcrib ledger.

fn main() -> std::process::ExitCode {
    toolcrib::cmd::check::main()
}
