//! fl-dedup - Collapse duplicate lot records.

fn main() -> std::process::ExitCode {
    floraledger::cmd::dedup::main()
}
