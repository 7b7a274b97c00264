//! Shared setup: a seeded backend on a free port and editors bound to it.

use std::sync::Arc;

use serde_json::{json, Map, Value};

use stockroom_api::{Router, Server, Store};
use stockroom_client::RestClient;
use stockroom_core::config::{ClientConfig, ServerConfig};
use stockroom_core::schema::register_builtin_schemas;
use stockroom_core::SchemaRegistry;
use stockroom_editor::{CellEditor, EditorConfig};

pub fn seed() -> Map<String, Value> {
    let data = json!({
        "rooms": [
            {"pk": 3, "name": "Shelf A"},
            {"pk": 7, "name": "Shelf B"}
        ],
        "item-ratings": [
            {"pk": 1, "name": "New"},
            {"pk": 2, "name": "Used"}
        ],
        "inventory": [
            {"pk": 1, "serial": "A-1", "total_cost": "10.00", "room": 3, "rating": 1,
             "product": {"sku": "CH-1", "name": "Blue chair"}, "received": "2024-03-01", "sold": false},
            {"pk": 2, "serial": "A-2", "total_cost": "20.00", "room": 7, "rating": 2,
             "product": {"sku": "TB-2", "name": "Oak table"}, "received": "2024-02-01", "sold": false}
        ]
    });
    match data {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

pub fn registry() -> SchemaRegistry {
    let registry = SchemaRegistry::new();
    register_builtin_schemas(&registry).unwrap();
    registry
}

/// Starts a seeded backend and returns its base URL.
pub async fn spawn_backend(token: Option<&str>) -> anyhow::Result<String> {
    let store = Store::from_registry(&registry())?;
    store.seed(seed())?;

    let config = ServerConfig {
        port: 0,
        auth_token: token.map(str::to_string),
        ..Default::default()
    };
    let server = Server::bind(
        "127.0.0.1:0".parse()?,
        Router::new(Arc::new(store), Arc::new(config)),
    )
    .await?;
    let addr = server.local_addr()?;
    tokio::spawn(server.serve());
    Ok(format!("http://{}", addr))
}

pub fn rest_client(base_url: &str) -> Arc<RestClient> {
    let config = ClientConfig {
        base_url: base_url.to_string(),
        ..Default::default()
    };
    Arc::new(RestClient::new(&config).unwrap())
}

/// Editor for `resource` talking to the backend at `base_url`.
pub fn editor(base_url: &str, resource: &str, config: EditorConfig) -> CellEditor {
    let schema = registry().get(resource).unwrap();
    CellEditor::new(schema, rest_client(base_url), config).unwrap()
}
