use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    voice_translator_lib::run(voice_translator_lib::Cli::parse()).await
}
