//! Terminal rendering.

use larder::{cart::CartState, ingredients::Ingredient, items::CartLineItem};
use larder_app::domain::carts::Notice;
use tokio::sync::broadcast::{self, error::TryRecvError};

#[expect(clippy::print_stdout, reason = "the cart listing is command output")]
pub(crate) fn print_cart(state: &CartState) {
    if state.is_empty() {
        println!("Cart is empty");

        return;
    }

    for line in state.items() {
        println!("{}", format_line(line));
    }

    println!(
        "{} item(s), total {}",
        state.total_items(),
        state.total_price()
    );
}

/// Cart listing followed by the last fetch error, if any.
#[expect(clippy::print_stderr, reason = "fetch errors are user facing output")]
pub(crate) fn print_state(state: &CartState) {
    print_cart(state);

    if let Some(error) = state.error() {
        eprintln!("error: {error}");
    }
}

#[expect(clippy::print_stdout, reason = "the ingredient listing is command output")]
pub(crate) fn print_ingredients(ingredients: &[Ingredient]) {
    if ingredients.is_empty() {
        println!("No ingredients available");

        return;
    }

    for ingredient in ingredients {
        println!(
            "{:>8}  {} ({}) @ {}",
            ingredient.id, ingredient.name, ingredient.unit, ingredient.price
        );
    }
}

#[expect(clippy::print_stdout, reason = "notices are user facing output")]
#[expect(clippy::print_stderr, reason = "notices are user facing output")]
pub(crate) fn print_notice(notice: &Notice) {
    if notice.is_error() {
        eprintln!("error: {}", notice.message);
    } else {
        println!("{}", notice.message);
    }
}

/// Print queued success notices. Failures reach the user through the command result instead.
pub(crate) fn print_success_notices(notices: &mut broadcast::Receiver<Notice>) {
    loop {
        match notices.try_recv() {
            Ok(notice) if !notice.is_error() => print_notice(&notice),
            Ok(_) | Err(TryRecvError::Lagged(_)) => {}
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}

/// Print what the shop sent back, or fail with the last fetch error.
pub(crate) fn finish(state: &CartState) -> Result<(), String> {
    if let Some(error) = state.error() {
        return Err(error.to_string());
    }

    print_cart(state);

    Ok(())
}

fn format_line(line: &CartLineItem) -> String {
    let id = line
        .id
        .map_or_else(|| "pending".to_string(), |id| id.to_string());

    format!(
        "{id:>8}  {:>3} x {} ({}) @ {} = {}",
        line.quantity,
        line.ingredient.name,
        line.ingredient.unit,
        line.ingredient.price,
        line.line_total()
    )
}
