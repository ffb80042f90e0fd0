//! fl-ingest - Post stock movements to the ledger.

fn main() -> std::process::ExitCode {
    floraledger::cmd::ingest::main()
}
