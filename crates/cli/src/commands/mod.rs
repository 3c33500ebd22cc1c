//! Subcommands

use clap::Subcommand;
use larder_app::context::AppContext;

mod auth;
mod cart;
mod ingredients;
mod output;
mod watch;

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show or change the cart
    Cart(cart::CartArgs),

    /// List the ingredients on sale
    Ingredients,

    /// Log in and merge the guest cart into the account cart
    Login(auth::LoginArgs),

    /// Log out, falling back to the guest cart
    Logout,

    /// Show which session requests are made with
    Whoami,

    /// Follow the cart until interrupted, keeping the session fresh
    Watch,
}

/// Run a command against the client.
pub(crate) async fn run(app: &AppContext, command: &Command) -> Result<(), String> {
    match command {
        Command::Cart(args) => cart::run(app, args).await,
        Command::Ingredients => ingredients::run(app).await,
        Command::Login(args) => auth::login(app, args).await,
        Command::Logout => auth::logout(app).await,
        Command::Whoami => {
            auth::whoami(app);

            Ok(())
        }
        Command::Watch => watch::run(app).await,
    }
}
