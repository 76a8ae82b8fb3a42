use anyhow::Result;

fn main() -> Result<()> {
    genomos::cli::run()
}
