#[tokio::main]
async fn main() -> std::io::Result<()> {
    combat_server::frameworks::server::run_with_config().await
}
