//! fl-adjust - Correct the quantity of a lot.

fn main() -> std::process::ExitCode {
    floraledger::cmd::adjust::main()
}
