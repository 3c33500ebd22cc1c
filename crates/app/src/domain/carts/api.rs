//! Cart and catalog endpoints.

use async_trait::async_trait;
use larder::{
    cart::CartSnapshot,
    credentials::Credential,
    ingredients::{Ingredient, IngredientId},
    items::{CartItemId, CartLineItem},
};
use mockall::automock;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::http::{ApiClient, ApiError, routes};

#[derive(Debug, Serialize)]
struct AddItemRequest {
    ingredient_id: IngredientId,
    quantity: u32,
}

#[derive(Debug, Serialize)]
struct UpdateItemRequest {
    quantity: u32,
}

/// The catalog endpoint may or may not paginate.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IngredientList {
    Page { results: Vec<Ingredient> },
    All(Vec<Ingredient>),
}

impl From<IngredientList> for Vec<Ingredient> {
    fn from(list: IngredientList) -> Self {
        match list {
            IngredientList::Page { results } => results,
            IngredientList::All(ingredients) => ingredients,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpCartApi {
    client: ApiClient,
}

impl HttpCartApi {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CartApi for HttpCartApi {
    async fn get_cart(&self, credential: &Credential) -> Result<CartSnapshot, ApiError> {
        let request = self
            .client
            .request(Method::GET, routes::CART, Some(credential));

        self.client.send_json(request).await
    }

    async fn add_item(
        &self,
        credential: &Credential,
        ingredient: IngredientId,
        quantity: u32,
    ) -> Result<CartLineItem, ApiError> {
        let request = self
            .client
            .request(Method::POST, routes::CART_ADD, Some(credential))
            .json(&AddItemRequest {
                ingredient_id: ingredient,
                quantity,
            });

        self.client.send_json(request).await
    }

    async fn update_item(
        &self,
        credential: &Credential,
        item: CartItemId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        let request = self
            .client
            .request(Method::PUT, &routes::cart_item_path(item), Some(credential))
            .json(&UpdateItemRequest { quantity });

        self.client.send_empty(request).await
    }

    async fn remove_item(&self, credential: &Credential, item: CartItemId) -> Result<(), ApiError> {
        let request = self.client.request(
            Method::DELETE,
            &routes::cart_item_path(item),
            Some(credential),
        );

        self.client.send_empty(request).await
    }

    async fn clear(&self, credential: &Credential) -> Result<(), ApiError> {
        let request = self
            .client
            .request(Method::POST, routes::CART_CLEAR, Some(credential));

        self.client.send_empty(request).await
    }

    async fn list_ingredients(&self) -> Result<Vec<Ingredient>, ApiError> {
        let request = self
            .client
            .request(Method::GET, routes::INGREDIENTS, None);

        let list: IngredientList = self.client.send_json(request).await?;

        Ok(list.into())
    }
}

#[automock]
#[async_trait]
pub trait CartApi: Send + Sync {
    /// Fetch the cart belonging to `credential`.
    async fn get_cart(&self, credential: &Credential) -> Result<CartSnapshot, ApiError>;

    /// Add `quantity` units of an ingredient, returning the resulting line.
    async fn add_item(
        &self,
        credential: &Credential,
        ingredient: IngredientId,
        quantity: u32,
    ) -> Result<CartLineItem, ApiError>;

    /// Set the quantity of a line.
    async fn update_item(
        &self,
        credential: &Credential,
        item: CartItemId,
        quantity: u32,
    ) -> Result<(), ApiError>;

    /// Delete a line.
    async fn remove_item(&self, credential: &Credential, item: CartItemId) -> Result<(), ApiError>;

    /// Delete every line.
    async fn clear(&self, credential: &Credential) -> Result<(), ApiError>;

    /// The ingredient catalog.
    async fn list_ingredients(&self) -> Result<Vec<Ingredient>, ApiError>;
}
