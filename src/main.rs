#[tokio::main]
async fn main() -> anyhow::Result<()> {
    xpclock_lib::run().await
}
