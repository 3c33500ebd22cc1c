//! Ingredient listing

use larder_app::context::AppContext;

use super::output;

pub(crate) async fn run(app: &AppContext) -> Result<(), String> {
    let ingredients = app
        .cart
        .list_ingredients()
        .await
        .map_err(|error| error.to_string())?;

    output::print_ingredients(&ingredients);

    Ok(())
}
