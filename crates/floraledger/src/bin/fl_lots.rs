//! fl-lots - List the lots currently in stock.

fn main() -> std::process::ExitCode {
    floraledger::cmd::lots::main()
}
