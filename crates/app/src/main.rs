//! Trolley CLI

use std::{io, process::ExitCode, sync::Arc};

use clap::{Args, Parser, Subcommand};
use thiserror::Error;
use trolley::{
    config::ConfigError,
    items::{CartItemId, ProductId, Variant},
    totals::TotalsError,
};
use trolley_app::{
    backend::HttpConfigError,
    backup::FileBackupStore,
    cart::{Cart, QuantityUpdate},
    config::ClientConfig,
    observability::{self, ObservabilityError},
    observer::TracingObserver,
    render,
};

#[derive(Debug, Parser)]
#[command(name = "trolley", about = "Storefront cart client", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: ClientConfig,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the cart and its totals
    Show,

    /// Add a product to the cart
    Add(AddArgs),

    /// Remove a line from the cart
    Remove {
        /// Cart line id
        cart_id: String,
    },

    /// Set the quantity of a line; zero or less removes it
    Set {
        /// Cart line id
        cart_id: String,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },

    /// Empty the cart
    Clear {
        /// Do not ask for confirmation
        #[arg(long)]
        yes: bool,
    },

    /// Apply or remove a promo code
    Promo {
        #[command(subcommand)]
        command: PromoCommand,
    },
}

#[derive(Debug, Args)]
struct AddArgs {
    /// Product id
    product_id: String,

    /// Units to add
    #[arg(short, long, default_value_t = 1)]
    quantity: u32,

    /// Variant option as `name=value`; repeat for several options
    #[arg(long = "variant", value_parser = parse_option)]
    options: Vec<(String, String)>,
}

impl AddArgs {
    fn variant(&self) -> Option<Variant> {
        if self.options.is_empty() {
            return None;
        }

        Some(self.options.iter().cloned().collect())
    }
}

#[derive(Debug, Subcommand)]
enum PromoCommand {
    /// Apply a promo code
    Apply { code: String },

    /// Remove an applied promo code
    Remove { code: String },
}

#[derive(Debug, Error)]
enum CliError {
    #[error("invalid cart settings: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid API settings: {0}")]
    Backend(#[from] HttpConfigError),

    #[error(transparent)]
    Observability(#[from] ObservabilityError),

    #[error("failed to total the cart: {0}")]
    Totals(#[from] TotalsError),

    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

fn parse_option(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected `name=value`, got `{raw}`"))?;

    let name = name.trim();

    if name.is_empty() {
        return Err(format!("missing option name in `{raw}`"));
    }

    Ok((name.to_string(), value.trim().to_string()))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::load() {
        Ok(cli) => cli,
        Err(error) => error.exit(),
    };

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            #[expect(
                clippy::print_stderr,
                reason = "errors may occur before logging is initialized"
            )]
            {
                eprintln!("{error}");
            }

            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<bool, CliError> {
    let Cli { config, command } = cli;

    observability::init(&config.logging)?;

    let assume_yes = matches!(command, Command::Clear { yes: true });

    let cart = Cart::new(
        Arc::new(config.api.backend()?),
        Arc::new(FileBackupStore::new(config.cart.backup_path.clone())),
        Arc::new(TracingObserver::new(assume_yes)),
        config.cart.cart_config()?,
    )
    .with_retry_policy(config.cart.retry_policy())
    .with_debounce_window(config.cart.debounce_window());

    cart.load().await;

    let succeeded = match command {
        Command::Show => true,
        Command::Add(args) => {
            let variant = args.variant();

            cart.add_item(ProductId::new(args.product_id), args.quantity, variant)
                .await
        }
        Command::Remove { cart_id } => cart.remove_item(&CartItemId::new(cart_id)).await,
        Command::Set { cart_id, quantity } => matches!(
            cart.update_quantity(&CartItemId::new(cart_id), quantity).await,
            QuantityUpdate::Updated(_) | QuantityUpdate::Removed | QuantityUpdate::Unchanged
        ),
        Command::Clear { .. } => cart.clear().await,
        Command::Promo {
            command: PromoCommand::Apply { code },
        } => cart.apply_promo_code(&code).await,
        Command::Promo {
            command: PromoCommand::Remove { code },
        } => cart.remove_promo_code(&code).await,
    };

    let items = cart.items();
    let totals = cart.totals()?;

    render::write_cart(io::stdout().lock(), &items, &totals)?;

    Ok(succeeded)
}
