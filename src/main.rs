use anyhow::Result;

fn main() -> Result<()> {
    redator::cli::run()
}
