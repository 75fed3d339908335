#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let _guards = promptdeck::tracing_setup::init_tracing();
    promptdeck::try_main().await
}
