//! Cart commands

use clap::{Args, Subcommand};
use larder::{ingredients::IngredientId, items::CartItemId};
use larder_app::context::AppContext;

use super::output;

/// Cart command arguments.
#[derive(Debug, Args)]
pub struct CartArgs {
    /// Cart operation
    #[command(subcommand)]
    pub command: CartCommand,
}

/// Cart operations.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum CartCommand {
    /// Show the current cart
    Show,

    /// Add an ingredient to the cart
    Add {
        /// Ingredient ID
        #[arg(long)]
        ingredient: u64,

        /// Quantity to add
        #[arg(long, default_value_t = 1u32)]
        quantity: u32,
    },

    /// Change the quantity of a cart line, zero removes it
    Update {
        /// Cart item ID
        #[arg(long)]
        item: u64,

        /// New quantity
        #[arg(long)]
        quantity: u32,
    },

    /// Remove a line from the cart
    Remove {
        /// Cart item ID
        #[arg(long)]
        item: u64,
    },

    /// Empty the cart
    Clear,
}

/// Load the cart, apply the requested change and print the result.
pub(crate) async fn run(app: &AppContext, args: &CartArgs) -> Result<(), String> {
    let mut notices = app.cart.notices();

    app.restore().await;

    let result = match args.command {
        CartCommand::Show => Ok(()),
        CartCommand::Add {
            ingredient,
            quantity,
        } => app
            .cart
            .add_to_cart(IngredientId::new(ingredient), quantity)
            .await
            .map(|_line| ()),
        CartCommand::Update { item, quantity } => {
            app.cart
                .update_cart_item(CartItemId::new(item), quantity)
                .await
        }
        CartCommand::Remove { item } => app.cart.remove_from_cart(CartItemId::new(item)).await,
        CartCommand::Clear => app.cart.clear_cart().await,
    };

    output::print_success_notices(&mut notices);

    result.map_err(|error| error.to_string())?;

    output::finish(&app.cart.state())
}
