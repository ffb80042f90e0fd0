//! fl-price - Set an explicit sale price on a lot.

fn main() -> std::process::ExitCode {
    floraledger::cmd::price::main()
}
