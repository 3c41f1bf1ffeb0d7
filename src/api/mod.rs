// API module entry
// Dispatches normalized events to space and user operations

mod error;
mod handlers;
mod normalize;
mod response;
mod types;
mod updaters;

use std::sync::Arc;

use crate::logger;
use crate::routing::{self, Event, Route};
use crate::store::Store;

pub use error::HandlerResult;
pub use response::{internal_error, HandlerResponse};

use response::{bad_request, unsupported_route};

/// Table and index names the operations address
#[derive(Debug, Clone)]
pub struct Tables {
    pub spaces: String,
    pub users: String,
    pub owner_index: String,
}

/// Collaborators shared by every operation
#[derive(Clone)]
pub struct Context {
    pub store: Arc<dyn Store>,
    pub tables: Tables,
}

impl Context {
    pub fn new(store: Arc<dyn Store>, tables: Tables) -> Self {
        Self { store, tables }
    }
}

/// Route an event to exactly one operation
///
/// Client errors become 400 responses here. Store failures that the
/// operation does not handle itself are returned as `Err`.
pub async fn handle_event(ctx: &Context, event: &Event) -> HandlerResult<HandlerResponse> {
    let Some(descriptor) = event.descriptor() else {
        logger::log_warning("Rejected event without method and path");
        return Ok(bad_request("Invalid event format"));
    };
    let route_key = descriptor.route_key();

    let Some(route) = routing::resolve(&descriptor, event.query_params()) else {
        logger::log_info(&format!("No route for {route_key}"));
        return Ok(unsupported_route(&route_key));
    };
    logger::log_debug(&format!("{route_key} -> {route:?}"));

    let result = match route {
        Route::GetSpace => handlers::get_space(ctx, event).await,
        Route::ListAvailable => handlers::list_available(ctx).await,
        Route::ListByOwner { owner } => handlers::list_by_owner(ctx, event, owner.as_deref()).await,
        Route::CreateSpace => handlers::create_space(ctx, event).await,
        Route::UpdateSpace => handlers::update_space(ctx, event).await,
        Route::UpdateSpaceAliased => handlers::update_space_aliased(ctx, event).await,
        Route::DeleteSpace => handlers::delete_space(ctx, event).await,
        Route::GetUser { user_id } => handlers::get_user(ctx, event, &user_id).await,
    };

    match result {
        Err(e) if e.is_client_error() => {
            logger::log_info(&format!("{route_key}: {e}"));
            Ok(bad_request(&e.to_string()))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::error::HandlerError;
    use super::*;
    use crate::store::{
        AttributeValue, Condition, Item, MemoryStore, StoreError, StoreResult, UpdateItem,
    };
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SPACES: &str = "coworking-spaces";
    const USERS: &str = "users";
    const INDEX: &str = "byHoster";

    fn tables() -> Tables {
        Tables {
            spaces: SPACES.to_string(),
            users: USERS.to_string(),
            owner_index: INDEX.to_string(),
        }
    }

    fn full_store() -> MemoryStore {
        MemoryStore::new()
            .with_table(SPACES, "spaceId")
            .with_table(USERS, "userId")
            .with_index(SPACES, INDEX, "hoster")
    }

    fn context(store: impl Store + 'static) -> Context {
        Context::new(Arc::new(store), tables())
    }

    /// Counts mutations reaching the wrapped store
    struct CountingStore {
        inner: MemoryStore,
        mutations: AtomicUsize,
    }

    #[async_trait]
    impl Store for CountingStore {
        async fn get_item(&self, table: &str, key_attr: &str, key: &str) -> StoreResult<Option<Item>> {
            self.inner.get_item(table, key_attr, key).await
        }

        async fn put_item(&self, table: &str, item: Item) -> StoreResult<()> {
            self.mutations.fetch_add(1, Ordering::SeqCst);
            self.inner.put_item(table, item).await
        }

        async fn update_item(
            &self,
            table: &str,
            key_attr: &str,
            key: &str,
            update: &UpdateItem,
        ) -> StoreResult<Item> {
            self.mutations.fetch_add(1, Ordering::SeqCst);
            self.inner.update_item(table, key_attr, key, update).await
        }

        async fn delete_item(&self, table: &str, key_attr: &str, key: &str) -> StoreResult<()> {
            self.mutations.fetch_add(1, Ordering::SeqCst);
            self.inner.delete_item(table, key_attr, key).await
        }

        async fn query_index(
            &self,
            table: &str,
            index: &str,
            key_attr: &str,
            value: &str,
        ) -> StoreResult<Vec<Item>> {
            self.inner.query_index(table, index, key_attr, value).await
        }

        async fn scan(&self, table: &str, filter: Option<&Condition>) -> StoreResult<Vec<Item>> {
            self.inner.scan(table, filter).await
        }
    }

    async fn send(ctx: &Context, event: Event) -> HandlerResponse {
        handle_event(ctx, &event).await.unwrap()
    }

    async fn create(ctx: &Context, body: &Value) -> HandlerResponse {
        send(ctx, Event::http("POST", "/spaces").with_body(body.to_string())).await
    }

    async fn read(ctx: &Context, space_id: &str) -> HandlerResponse {
        send(ctx, Event::http("GET", "/spaces").with_query("spaceId", space_id)).await
    }

    fn space(id: &str, hoster: &str) -> Value {
        json!({"spaceId": id, "name": format!("Space {id}"), "hoster": hoster})
    }

    #[tokio::test]
    async fn test_create_then_read() {
        let ctx = context(full_store());
        let resp = create(
            &ctx,
            &json!({
                "spaceId": "S1", "name": "Hub", "hoster": "U1",
                "precoHora": 50, "precoDia": "300.5", "city": "Recife"
            }),
        )
        .await;
        assert_eq!(resp.status_code, 200);
        assert_eq!(
            resp.json(),
            json!({"message": "Coworking space added successfully", "spaceId": "S1"})
        );

        let resp = read(&ctx, "S1").await;
        assert_eq!(resp.status_code, 200);
        let record = resp.json();
        assert_eq!(record["precoHora"], json!(50.0));
        assert_eq!(record["precoDia"], json!(300.5));
        assert_eq!(record["country"], "Brasil");
        assert!(record.get("street").is_none());
        assert!(record.get("imagemUrl").is_none());
    }

    #[tokio::test]
    async fn test_create_flags_hoster() {
        let ctx = context(full_store());
        create(&ctx, &space("S1", "U1")).await;

        let resp = send(&ctx, Event::http("GET", "/users/U1")).await;
        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.json(), json!({"userId": "U1", "isHoster": true}));
    }

    #[tokio::test]
    async fn test_create_ignores_hoster_flag_failure() {
        let store = MemoryStore::new().with_table(SPACES, "spaceId");
        let ctx = context(store);
        let resp = create(&ctx, &space("S1", "U1")).await;
        assert_eq!(resp.status_code, 200);
        assert_eq!(read(&ctx, "S1").await.status_code, 200);
    }

    #[tokio::test]
    async fn test_create_missing_field_is_client_error() {
        let ctx = context(full_store());
        let resp = create(&ctx, &json!({"spaceId": "S1", "hoster": "U1"})).await;
        assert_eq!(resp.status_code, 400);
        assert_eq!(resp.json(), json!({"message": "name is required"}));
    }

    #[tokio::test]
    async fn test_create_store_failure_is_fatal() {
        let ctx = context(MemoryStore::new());
        let event = Event::http("POST", "/spaces").with_body(space("S1", "U1").to_string());
        let err = handle_event(&ctx, &event).await.unwrap_err();
        assert!(matches!(err, HandlerError::Store(StoreError::TableNotFound(_))));
    }

    #[tokio::test]
    async fn test_create_overwrites() {
        let ctx = context(full_store());
        create(&ctx, &json!({"spaceId": "S1", "name": "Old", "hoster": "U1", "city": "X"})).await;
        create(&ctx, &json!({"spaceId": "S1", "name": "New", "hoster": "U1"})).await;
        let record = read(&ctx, "S1").await.json();
        assert_eq!(record["name"], "New");
        assert!(record.get("city").is_none());
    }

    #[tokio::test]
    async fn test_read_missing_space() {
        let ctx = context(full_store());
        let resp = read(&ctx, "nope").await;
        assert_eq!(resp.status_code, 404);
        assert_eq!(resp.json(), json!({"message": "Coworking space not found"}));

        let resp = read(&ctx, "  ").await;
        assert_eq!(resp.status_code, 400);
    }

    #[tokio::test]
    async fn test_direct_update_touches_only_named_fields() {
        let ctx = context(full_store());
        create(
            &ctx,
            &json!({"spaceId": "S1", "name": "Hub", "hoster": "U1", "city": "Recife", "precoHora": 10}),
        )
        .await;
        let before = read(&ctx, "S1").await.json();

        let resp = send(
            &ctx,
            Event::http("PUT", "/spaces")
                .with_query("spaceId", "S1")
                .with_body(r#"{"name": "X"}"#),
        )
        .await;
        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.json(), json!({"name": "X"}));

        let mut expected = before;
        expected["name"] = json!("X");
        assert_eq!(read(&ctx, "S1").await.json(), expected);
    }

    #[tokio::test]
    async fn test_direct_update_decodes_identifier() {
        let ctx = context(full_store());
        create(&ctx, &space("S 1", "U1")).await;
        let resp = send(
            &ctx,
            Event::http("PUT", "/spaces")
                .with_query("spaceId", " S%201 ")
                .with_body(r#"{"precoDia": "abc"}"#),
        )
        .await;
        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.json(), json!({"precoDia": 0.0}));
    }

    #[tokio::test]
    async fn test_direct_update_null_clears_field() {
        let ctx = context(full_store());
        create(&ctx, &json!({"spaceId": "S1", "name": "Hub", "hoster": "U1", "city": "Recife"})).await;
        let resp = send(
            &ctx,
            Event::http("PUT", "/spaces")
                .with_query("spaceId", "S1")
                .with_body(r#"{"city": null}"#),
        )
        .await;
        assert_eq!(resp.status_code, 200);
        assert!(read(&ctx, "S1").await.json().get("city").is_none());
    }

    #[tokio::test]
    async fn test_direct_update_store_failure_is_fatal() {
        let ctx = context(MemoryStore::new());
        let event = Event::http("PUT", "/spaces")
            .with_query("spaceId", "S1")
            .with_body(r#"{"name": "X"}"#);
        assert!(handle_event(&ctx, &event).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_update_never_reaches_store() {
        let store = Arc::new(CountingStore {
            inner: full_store(),
            mutations: AtomicUsize::new(0),
        });
        let ctx = Context::new(store.clone(), tables());

        let direct = Event::http("PUT", "/spaces")
            .with_query("spaceId", "S1")
            .with_body(r#"{"bogus": 1}"#);
        let resp = send(&ctx, direct).await;
        assert_eq!(resp.status_code, 400);
        assert_eq!(resp.json(), json!({"message": "No fields to update"}));

        let aliased = Event::http("PUT", "/spaces/full").with_body(r#"{"spaceId": "S1", "bogus": 1}"#);
        let resp = send(&ctx, aliased).await;
        assert_eq!(resp.status_code, 400);
        assert_eq!(resp.json(), json!({"message": "No fields to update"}));

        assert_eq!(store.mutations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_aliased_update_uses_body_identifier() {
        let ctx = context(full_store());
        create(&ctx, &space("S1", "U1")).await;

        let resp = send(
            &ctx,
            Event::http("PUT", "/spaces/full").with_body(r#"{"id": "S1", "title": "Y", "weekdays": ["mon"]}"#),
        )
        .await;
        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.json(), json!({"name": "Y", "diasSemana": ["mon"]}));
        assert_eq!(read(&ctx, "S1").await.json()["name"], "Y");
    }

    #[tokio::test]
    async fn test_aliased_update_missing_identifier() {
        let ctx = context(full_store());
        let resp = send(&ctx, Event::http("PUT", "/spaces/full").with_body(r#"{"title": "Y"}"#)).await;
        assert_eq!(resp.status_code, 400);
        assert_eq!(resp.json(), json!({"message": "spaceId is required"}));
    }

    #[tokio::test]
    async fn test_aliased_update_store_failure_is_500() {
        let ctx = context(MemoryStore::new());
        let resp = send(
            &ctx,
            Event::http("PUT", "/spaces/full").with_body(r#"{"spaceId": "S1", "title": "Y"}"#),
        )
        .await;
        assert_eq!(resp.status_code, 500);
        let body = resp.json();
        assert_eq!(body["message"], "Failed to update");
        assert_eq!(body["error"], "Table not found: coworking-spaces");
    }

    #[tokio::test]
    async fn test_invalid_body_is_client_error() {
        let ctx = context(full_store());
        let resp = send(
            &ctx,
            Event::http("PUT", "/spaces/full").with_body("{not json"),
        )
        .await;
        assert_eq!(resp.status_code, 400);
    }

    #[tokio::test]
    async fn test_list_available_excludes_disabled() {
        let ctx = context(full_store());
        create(&ctx, &space("S1", "U1")).await;
        create(
            &ctx,
            &json!({"spaceId": "S2", "name": "Off", "hoster": "U1", "availability": false}),
        )
        .await;

        let resp = send(&ctx, Event::http("GET", "/spaces")).await;
        assert_eq!(resp.status_code, 200);
        let list = resp.json();
        let list = list.as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["spaceId"], "S1");
        assert_eq!(list[0]["district"], "");
    }

    #[tokio::test]
    async fn test_list_available_failure_is_500() {
        let ctx = context(MemoryStore::new());
        let resp = send(&ctx, Event::http("GET", "/spaces")).await;
        assert_eq!(resp.status_code, 500);
        assert_eq!(resp.json(), json!({"message": "Internal Server Error"}));
    }

    fn ids(resp: &HandlerResponse) -> Vec<String> {
        let mut ids: Vec<String> = resp
            .json()
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["spaceId"].as_str().unwrap().to_string())
            .collect();
        ids.sort();
        ids
    }

    #[tokio::test]
    async fn test_owner_scan_fallback_matches_index() {
        let indexed = context(full_store());
        let unindexed = context(
            MemoryStore::new()
                .with_table(SPACES, "spaceId")
                .with_table(USERS, "userId"),
        );
        for ctx in [&indexed, &unindexed] {
            create(ctx, &space("S1", "U1")).await;
            create(ctx, &space("S2", "U2")).await;
            create(ctx, &space("S3", "U1")).await;
        }

        let by_path = send(&indexed, Event::http("GET", "/spaces/hoster/U1")).await;
        let by_scan = send(&unindexed, Event::http("GET", "/spaces/hoster/U1")).await;
        assert_eq!(by_path.status_code, 200);
        assert_eq!(by_scan.status_code, 200);
        assert_eq!(ids(&by_path), vec!["S1", "S3"]);
        assert_eq!(ids(&by_path), ids(&by_scan));
    }

    #[tokio::test]
    async fn test_owner_path_wins_over_query() {
        let ctx = context(full_store());
        create(&ctx, &space("S1", "U1")).await;
        create(&ctx, &space("S2", "U2")).await;

        let resp = send(
            &ctx,
            Event::http("GET", "/spaces/hoster/U2").with_query("hoster", "U1"),
        )
        .await;
        assert_eq!(ids(&resp), vec!["S2"]);

        let resp = send(&ctx, Event::http("GET", "/spaces").with_query("hoster", "U1")).await;
        assert_eq!(ids(&resp), vec!["S1"]);
    }

    #[tokio::test]
    async fn test_owner_missing_is_client_error() {
        let ctx = context(full_store());
        let resp = send(&ctx, Event::http("GET", "/spaces/hoster/")).await;
        assert_eq!(resp.status_code, 400);

        let resp = send(&ctx, Event::http("GET", "/spaces/hoster/U9")).await;
        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.json(), json!([]));
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let ctx = context(full_store());
        let resp = send(&ctx, Event::http("DELETE", "/spaces").with_query("spaceId", "ghost")).await;
        assert_eq!(resp.status_code, 200);
        assert_eq!(
            resp.json(),
            json!({"message": "Coworking space deleted successfully", "spaceId": "ghost"})
        );
    }

    #[tokio::test]
    async fn test_delete_removes_record() {
        let ctx = context(full_store());
        create(&ctx, &space("S1", "U1")).await;
        send(&ctx, Event::http("DELETE", "/spaces").with_query("spaceId", "S1")).await;
        assert_eq!(read(&ctx, "S1").await.status_code, 404);
    }

    #[tokio::test]
    async fn test_amenities_unwrapped_on_every_read_path() {
        let store = full_store();
        let wrapped = AttributeValue::L(vec![
            AttributeValue::M([("S".to_string(), AttributeValue::S("wifi".to_string()))].into()),
            AttributeValue::M([("S".to_string(), AttributeValue::S("cafe".to_string()))].into()),
        ]);
        let mixed = AttributeValue::L(vec![
            AttributeValue::S("wifi".to_string()),
            AttributeValue::Bool(true),
        ]);
        for (id, amenities) in [("S1", wrapped), ("S2", mixed)] {
            let item = Item::from([
                ("spaceId".to_string(), AttributeValue::S(id.to_string())),
                ("hoster".to_string(), AttributeValue::S("U1".to_string())),
                ("availability".to_string(), AttributeValue::Bool(true)),
                ("amenities".to_string(), amenities),
            ]);
            store.put_item(SPACES, item).await.unwrap();
        }
        let ctx = context(store);

        assert_eq!(read(&ctx, "S1").await.json()["amenities"], json!(["wifi", "cafe"]));
        assert_eq!(read(&ctx, "S2").await.json()["amenities"], json!([]));

        for event in [Event::http("GET", "/spaces"), Event::http("GET", "/spaces/hoster/U1")] {
            let list = send(&ctx, event).await.json();
            for record in list.as_array().unwrap() {
                let expected = if record["spaceId"] == "S1" {
                    json!(["wifi", "cafe"])
                } else {
                    json!([])
                };
                assert_eq!(record["amenities"], expected);
            }
        }
    }

    #[tokio::test]
    async fn test_user_read_paths() {
        let ctx = context(full_store());
        let resp = send(&ctx, Event::http("GET", "/users/U1")).await;
        assert_eq!(resp.status_code, 404);
        assert_eq!(resp.json(), json!({"message": "User not found"}));

        let resp = send(&ctx, Event::http("GET", "/users/")).await;
        assert_eq!(resp.status_code, 400);

        let broken = context(MemoryStore::new());
        let resp = send(&broken, Event::http("GET", "/users/U1")).await;
        assert_eq!(resp.status_code, 500);
        assert_eq!(resp.json(), json!({"message": "Internal error while fetching user"}));
    }

    #[tokio::test]
    async fn test_invalid_event_format() {
        let ctx = context(full_store());
        let event: Event = serde_json::from_value(json!({"body": "{}"})).unwrap();
        let resp = send(&ctx, event).await;
        assert_eq!(resp.status_code, 400);
        assert_eq!(resp.json(), json!({"message": "Invalid event format"}));
    }

    #[tokio::test]
    async fn test_unsupported_route() {
        let ctx = context(full_store());
        let resp = send(&ctx, Event::http("PATCH", "/pro/spaces").with_stage("pro")).await;
        assert_eq!(resp.status_code, 400);
        assert_eq!(resp.json(), json!("Unsupported method or route: PATCH /spaces"));
    }

    #[tokio::test]
    async fn test_event_shapes_route_identically() {
        let ctx = context(full_store());
        create(&ctx, &space("S1", "U1")).await;

        let http: Event = serde_json::from_value(json!({
            "requestContext": {"http": {"method": "GET", "path": "/pro/spaces"}, "stage": "pro"},
            "queryStringParameters": {"spaceId": "S1"}
        }))
        .unwrap();
        let rest: Event = serde_json::from_value(json!({
            "httpMethod": "GET",
            "path": "/spaces",
            "requestContext": {"stage": "pro"},
            "queryStringParameters": {"spaceId": "S1"}
        }))
        .unwrap();

        let a = send(&ctx, http).await;
        let b = send(&ctx, rest).await;
        assert_eq!(a.status_code, 200);
        assert_eq!(a, b);
    }
}
