//! fl-recompute - Rebuild the lot set from the full movement log.

fn main() -> std::process::ExitCode {
    floraledger::cmd::recompute::main()
}
