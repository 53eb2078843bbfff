use anyhow::Result;
use colored::*;

use cnpj_bot::config::AppConfig;
use cnpj_bot::importer::import_csv;
use cnpj_bot::store::Store;

/// Offline CSV importer. Re-runnable: duplicates are ignored, so loading
/// the same file twice changes nothing.
#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::load();

    println!(
        "{} {} {} {}",
        "Importing".bright_cyan(),
        config.csv_path.bold(),
        "into".bright_cyan(),
        config.db_path.bold()
    );

    let store = Store::open(&config.db_path).await?;
    let report = import_csv(&store, &config.csv_path).await?;

    println!("Total lidos: {}", report.read);
    println!("Inseridos: {}", report.inserted.to_string().green());
    if report.skipped > 0 {
        println!("Ignorados: {}", report.skipped.to_string().yellow());
    }
    println!("Empresas na base: {}", store.company_count().await?);

    Ok(())
}
