use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    cnpj_bot::run().await
}
