//! Direct ERP queries: live stock, order pass-through and customer lookup.

use std::io::Read;
use std::path::PathBuf;

use clap::Subcommand;
use erpbridge_core::{check_cart_line, AppConfig, Availability};

#[derive(Debug, Subcommand)]
pub enum StockCommands {
    /// Show live stock for a SKU and whether a quantity can be fulfilled
    Check {
        sku: String,
        #[arg(long, default_value = "1")]
        quantity: u32,
    },
}

#[derive(Debug, Subcommand)]
pub enum OrderCommands {
    /// Send an order JSON document to the ERP as-is
    Submit {
        /// Read the order from this file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
pub enum CustomerCommands {
    /// Look up a customer by tax id
    Get { tax_id: String },
}

pub(crate) async fn run_stock(config: &AppConfig, command: StockCommands) -> anyhow::Result<()> {
    let StockCommands::Check { sku, quantity } = command;
    let erp = erpbridge_erp::build_erp_client(config)?;
    let signal = erp.fetch_stock(&sku).await;
    let availability = Availability::from_signal(&signal);

    println!("SKU:        {sku}");
    println!("Available:  {}", signal.available_qty);
    println!("Backorder:  {}", if signal.allow_backorder { "yes" } else { "no" });
    println!("Status:     {}", availability.label());

    match check_cart_line(&sku, &sku, &signal, quantity) {
        Ok(()) => println!("Quantity {quantity}: ok"),
        Err(notice) => println!("Quantity {quantity}: {notice}"),
    }
    Ok(())
}

pub(crate) async fn run_order(config: &AppConfig, command: OrderCommands) -> anyhow::Result<()> {
    let OrderCommands::Submit { file } = command;
    let raw = match file {
        Some(path) => std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let payload: serde_json::Value = serde_json::from_str(&raw)?;

    let erp = erpbridge_erp::build_erp_client(config)?;
    let receipt = erp.submit_order(&payload).await;
    println!("{}", serde_json::to_string_pretty(&receipt)?);

    if !receipt.is_success() {
        anyhow::bail!(
            "ERP rejected the order: {}",
            receipt.message.as_deref().unwrap_or(&receipt.status)
        );
    }
    Ok(())
}

pub(crate) async fn run_customer(
    config: &AppConfig,
    command: CustomerCommands,
) -> anyhow::Result<()> {
    let CustomerCommands::Get { tax_id } = command;
    let erp = erpbridge_erp::build_erp_client(config)?;
    match erp.fetch_customer_by_tax_id(&tax_id).await {
        Some(customer) => println!("{}", serde_json::to_string_pretty(&customer)?),
        None => anyhow::bail!("customer '{tax_id}' not found in the ERP"),
    }
    Ok(())
}
