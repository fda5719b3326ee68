//! Orders CLI
//!
//! Command-line interface for the Orders API.

use anyhow::Result;
use clap::{Parser, Subcommand};

use orders_client::OrdersClient;
use orders_types::{OrderId, OrderStatus, PaymentDetails, PaymentMethodId};

#[derive(Parser)]
#[command(name = "orders")]
#[command(author, version, about = "Orders API CLI client", long_about = None)]
struct Cli {
    /// Base URL of the Orders API
    #[arg(long, env = "ORDERS_API_URL", default_value = "http://localhost:3000")]
    api_url: String,

    /// Bearer token issued by the user service
    #[arg(long, env = "ORDERS_API_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Order operations
    Order {
        #[command(subcommand)]
        action: OrderCommands,
    },
    /// Stored payment method operations
    PaymentMethod {
        #[command(subcommand)]
        action: PaymentMethodCommands,
    },
    /// Check API health
    Health,
}

#[derive(Subcommand)]
enum OrderCommands {
    /// Place a new order
    Create {
        /// Inventory product ID
        #[arg(long)]
        product: String,
        /// Number of units
        #[arg(long, default_value = "1")]
        quantity: u32,
        /// Payment method ID (UUID)
        #[arg(long)]
        payment_method: Option<String>,
    },
    /// List your orders
    List,
    /// Show one order
    Get {
        /// Order ID (UUID)
        #[arg(long)]
        id: String,
    },
    /// Charge the order's payment method
    Pay {
        #[arg(long)]
        id: String,
    },
    /// Refund a paid order (admin only)
    Refund {
        #[arg(long)]
        id: String,
        /// Amount in minor units, defaults to the full total
        #[arg(long)]
        amount: Option<i64>,
        #[arg(long)]
        reason: String,
    },
    /// Override an order's status (admin only)
    Status {
        #[arg(long)]
        id: String,
        /// pending, paid, cancelled or refunded
        #[arg(long)]
        status: String,
        #[arg(long)]
        note: Option<String>,
    },
}

#[derive(Subcommand)]
enum PaymentMethodCommands {
    /// Store a payment method
    Add {
        /// Kind of instrument, e.g. card
        #[arg(long = "type")]
        method_type: String,
        /// Instrument details as a JSON object
        #[arg(long, default_value = "{}")]
        details: String,
        /// Make this the default method
        #[arg(long)]
        default: bool,
    },
    /// List active payment methods
    List,
    /// Delete (deactivate) a payment method
    Delete {
        /// Payment method ID (UUID)
        #[arg(long)]
        id: String,
    },
}

fn parse_order_id(s: &str) -> Result<OrderId> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("Invalid order ID: {}", s))
}

fn parse_payment_method_id(s: &str) -> Result<PaymentMethodId> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("Invalid payment method ID: {}", s))
}

fn parse_status(s: &str) -> Result<OrderStatus> {
    s.parse().map_err(|_| {
        anyhow::anyhow!(
            "Unknown status: {}. Supported: pending, paid, cancelled, refunded",
            s
        )
    })
}

fn parse_details(s: &str) -> Result<PaymentDetails> {
    serde_json::from_str(s).map_err(|e| anyhow::anyhow!("Details must be a JSON object: {}", e))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut client = OrdersClient::new(&cli.api_url);
    if let Some(token) = cli.token {
        client = client.with_token(token);
    }

    match cli.command {
        Commands::Health => {
            if client.health().await? {
                println!("✓ API is healthy");
            } else {
                println!("✗ API is not healthy");
                std::process::exit(1);
            }
        }

        Commands::Order { action } => match action {
            OrderCommands::Create {
                product,
                quantity,
                payment_method,
            } => {
                let method = payment_method
                    .as_deref()
                    .map(parse_payment_method_id)
                    .transpose()?;
                let order = client.create_order(&product, quantity, method).await?;
                println!("{}", serde_json::to_string_pretty(&order)?);
            }
            OrderCommands::List => {
                let orders = client.list_orders().await?;
                println!("{}", serde_json::to_string_pretty(&orders)?);
            }
            OrderCommands::Get { id } => {
                let order = client.get_order(parse_order_id(&id)?).await?;
                println!("{}", serde_json::to_string_pretty(&order)?);
            }
            OrderCommands::Pay { id } => {
                let order = client.process_payment(parse_order_id(&id)?).await?;
                println!("{}", serde_json::to_string_pretty(&order)?);
            }
            OrderCommands::Refund { id, amount, reason } => {
                let order = client
                    .refund_order(parse_order_id(&id)?, amount, &reason)
                    .await?;
                println!("{}", serde_json::to_string_pretty(&order)?);
            }
            OrderCommands::Status { id, status, note } => {
                let order = client
                    .update_order_status(parse_order_id(&id)?, parse_status(&status)?, note)
                    .await?;
                println!("{}", serde_json::to_string_pretty(&order)?);
            }
        },

        Commands::PaymentMethod { action } => match action {
            PaymentMethodCommands::Add {
                method_type,
                details,
                default,
            } => {
                let details = parse_details(&details)?;
                let method = client
                    .create_payment_method(&method_type, details, default)
                    .await?;
                println!("{}", serde_json::to_string_pretty(&method)?);
            }
            PaymentMethodCommands::List => {
                let methods = client.list_payment_methods().await?;
                println!("{}", serde_json::to_string_pretty(&methods)?);
            }
            PaymentMethodCommands::Delete { id } => {
                let resp = client
                    .delete_payment_method(parse_payment_method_id(&id)?)
                    .await?;
                println!("✓ {}", resp.message);
            }
        },
    }

    Ok(())
}
