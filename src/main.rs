#[tokio::main]
async fn main() -> anyhow::Result<()> {
    registro_vendas_pos::run().await
}
