use anyhow::Result;

mod app;
mod logging;

fn main() -> Result<()> {
    let args = pdf_splitter::cli::parse();
    app::run(args)
}
