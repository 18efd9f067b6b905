//! toolcrib-sweep - Mark past-due loans as overdue.
//!
//! Meant to run periodically, e.g. from cron.

fn main() -> std::process::ExitCode {
    toolcrib::cmd::sweep::main()
}
