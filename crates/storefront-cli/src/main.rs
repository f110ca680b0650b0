//! Thin entrypoint delegating to [`storefront_cli::run`].

#[tokio::main]
async fn main() {
    let exit_code = storefront_cli::run().await;
    std::process::exit(exit_code);
}
