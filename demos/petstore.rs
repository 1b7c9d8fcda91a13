//! Petstore API client
//!
//! Shows how to wrap a `NetworkClient` in a typed, namespaced API:
//! `api.pet().find_by_status(...)`, `api.store().inventory()`, and so on.
//! Every namespace derives its client from the parent, so shared settings
//! (base URL, auth, retries, error decoding) are declared once.
//!
//! Run with: cargo run --example petstore

use netclient::config::LevelFilter;
use netclient::{AuthModifier, HeaderMode, NetworkClient};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pet {
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub status: Option<PetStatus>,
    #[serde(default, rename = "photoUrls")]
    pub photo_urls: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PetStatus {
    Available,
    Pending,
    Sold,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Option<i64>,
    #[serde(rename = "petId")]
    pub pet_id: i64,
    pub quantity: i32,
    pub complete: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(rename = "firstName")]
    pub first_name: Option<String>,
    pub email: Option<String>,
}

/// Error body returned by the API on failure.
#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub code: i32,
    pub message: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[derive(Clone)]
pub struct Petstore {
    client: NetworkClient,
}

impl Petstore {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        let client = NetworkClient::new(base_url)
            .header("Accept", "application/json")
            .auth(signed_api_key(api_key))
            .validate_status_code()
            .decodable_error::<ApiError>()
            .retry(2)
            .log_level(LevelFilter::DEBUG);
        Petstore { client }
    }

    pub fn pet(&self) -> PetApi {
        PetApi {
            client: self.client.path("pet"),
        }
    }

    pub fn store(&self) -> StoreApi {
        StoreApi {
            client: self.client.path("store"),
        }
    }

    pub fn user(&self) -> UserApi {
        UserApi {
            // Public endpoints
            client: self.client.path("user").disable_auth(),
        }
    }
}

/// `api_key` header plus a request id on every authenticated call.
fn signed_api_key(key: &str) -> AuthModifier {
    let key = key.to_string();
    AuthModifier::new(move |request, _configs| {
        request.set_header("api_key", &key, HeaderMode::Set)?;
        let request_id = uuid::Uuid::new_v4().to_string();
        request.set_header("X-Request-Id", &request_id, HeaderMode::Set)
    })
}

pub struct PetApi {
    client: NetworkClient,
}

impl PetApi {
    pub async fn get(&self, id: i64) -> netclient::Result<Pet> {
        self.client.path(id).get().decodable().await
    }

    pub async fn add(&self, pet: Pet) -> netclient::Result<Pet> {
        self.client.post().body(pet).decodable().await
    }

    pub async fn find_by_status(&self, status: PetStatus) -> netclient::Result<Vec<Pet>> {
        self.client
            .path("findByStatus")
            .query(HashMap::from([("status", status)]))
            .decodable()
            .await
    }

    pub async fn rename(&self, id: i64, name: &str) -> netclient::Result<()> {
        self.client
            .path(id)
            .post()
            .body_form(HashMap::from([("name", name.to_string())]))
            .send()
            .await
    }

    pub async fn delete(&self, id: i64) -> netclient::Result<()> {
        self.client.path(id).delete().send().await
    }
}

pub struct StoreApi {
    client: NetworkClient,
}

impl StoreApi {
    pub async fn inventory(&self) -> netclient::Result<HashMap<String, i64>> {
        self.client.path("inventory").decodable().await
    }

    pub async fn place_order(&self, order: Order) -> netclient::Result<Order> {
        self.client.path("order").post().body(order).decodable().await
    }
}

pub struct UserApi {
    client: NetworkClient,
}

impl UserApi {
    pub async fn get(&self, username: &str) -> netclient::Result<User> {
        self.client.path(username).decodable().await
    }

    pub async fn login(&self, username: &str, password: &str) -> netclient::Result<String> {
        self.client
            .path("login")
            .query_item("username", Some(username))
            .query_item("password", Some(password))
            .text()
            .await
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("Petstore Client Example");
    println!("=======================\n");

    let api = Petstore::new("https://petstore.swagger.io/v2", "special-key");

    let pets = api.pet().find_by_status(PetStatus::Available).await?;
    println!("{} pets available", pets.len());
    for pet in pets.iter().take(5) {
        println!("  {:?} {}", pet.id, pet.name);
    }

    let added = api
        .pet()
        .add(Pet {
            id: None,
            name: "Rex".into(),
            status: Some(PetStatus::Pending),
            photo_urls: vec![],
        })
        .await?;
    println!("\nAdded {:?} with id {:?}", added.name, added.id);

    match api.pet().get(-1).await {
        Ok(pet) => println!("Unexpected pet: {:?}", pet),
        Err(err) => match err.server_error::<ApiError>() {
            Some(api_error) => println!("API error: {}", api_error),
            None => println!("Request failed: {}", err),
        },
    }

    let inventory = api.store().inventory().await?;
    println!("\nInventory: {:?}", inventory);

    let session = api.user().login("demo", "demo").await?;
    println!("Login: {}", session);

    Ok(())
}
