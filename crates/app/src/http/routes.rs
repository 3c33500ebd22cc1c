//! Shop and auth API paths.

use larder::items::CartItemId;

pub const CART: &str = "/api/shop/platform-ingredients-cart/";
pub const CART_ADD: &str = "/api/shop/platform-ingredients-cart/add/";
pub const CART_CLEAR: &str = "/api/shop/platform-ingredients-cart/clear/";
pub const INGREDIENTS: &str = "/api/shop/platform-ingredients/";
pub const GUEST_SESSION: &str = "/api/shop/guest-session/";
pub const MERGE_GUEST_CART: &str = "/api/shop/merge-guest-cart/";
pub const TOKEN: &str = "/api/auth/token/";
pub const TOKEN_REFRESH: &str = "/api/auth/token/refresh/";
pub const CURRENT_USER: &str = "/api/auth/user/";

/// Path of a single cart line.
pub fn cart_item_path(id: CartItemId) -> String {
    format!("/api/shop/platform-ingredients-cart/item/{id}/")
}
