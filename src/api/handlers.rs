// Space and user operation handlers

use serde_json::{json, Map, Value};

use super::error::{HandlerError, HandlerResult};
use super::normalize::{normalize_listing, normalize_record};
use super::response::{internal_error, json_response, not_found, ok, HandlerResponse};
use super::types::NewSpace;
use super::updaters::{self, ALIASED_FIELDS, DIRECT_FIELDS};
use super::Context;
use crate::logger;
use crate::routing::Event;
use crate::store::{item_to_json, AttributeValue, Condition, Item, StoreError};

const SPACE_KEY: &str = "spaceId";
const USER_KEY: &str = "userId";
const OWNER_ATTR: &str = "hoster";

/// Parse the event body as a JSON object; a missing body is `{}`
fn parse_body(event: &Event) -> HandlerResult<Map<String, Value>> {
    let Some(raw) = event.body.as_deref().filter(|b| !b.trim().is_empty()) else {
        return Ok(Map::new());
    };
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(HandlerError::InvalidBody("expected a JSON object".to_string())),
        Err(e) => Err(HandlerError::InvalidBody(e.to_string())),
    }
}

/// Non-empty, trimmed query parameter
fn query_id<'e>(event: &'e Event, name: &'static str) -> HandlerResult<&'e str> {
    event
        .query(name)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(HandlerError::MissingField(name))
}

fn listing(items: &[Item]) -> Vec<Value> {
    items.iter().map(normalize_listing).collect()
}

/// `POST /spaces`
pub async fn create_space(ctx: &Context, event: &Event) -> HandlerResult<HandlerResponse> {
    let body = parse_body(event)?;
    let space = NewSpace::from_body(&body)?;

    logger::log_info(&format!("Saving space {}", space.space_id));
    logger::log_debug(&format!("Item: {}", item_to_json(&space.item)));
    ctx.store.put_item(&ctx.tables.spaces, space.item).await?;

    mark_hoster(ctx, &space.hoster).await;

    Ok(ok(&json!({
        "message": "Coworking space added successfully",
        "spaceId": space.space_id,
    })))
}

/// Flag the owner's user record; failures are logged and dropped
async fn mark_hoster(ctx: &Context, hoster: &str) {
    let result = match updaters::hoster_flag() {
        Ok(update) => ctx
            .store
            .update_item(&ctx.tables.users, USER_KEY, hoster, &update)
            .await
            .map_err(HandlerError::from),
        Err(e) => Err(e),
    };
    match result {
        Ok(_) => logger::log_info(&format!("User {hoster} flagged as hoster")),
        Err(e) => logger::log_warning(&format!("Failed to flag user {hoster} as hoster: {e}")),
    }
}

/// `GET /spaces?spaceId=`
pub async fn get_space(ctx: &Context, event: &Event) -> HandlerResult<HandlerResponse> {
    let space_id = query_id(event, SPACE_KEY)?;
    match ctx.store.get_item(&ctx.tables.spaces, SPACE_KEY, space_id).await? {
        Some(item) => Ok(ok(&normalize_record(&item))),
        None => Ok(not_found("Coworking space not found")),
    }
}

/// `GET /spaces` without filters
pub async fn list_available(ctx: &Context) -> HandlerResult<HandlerResponse> {
    let filter = Condition::equals("availability", AttributeValue::Bool(true));
    match ctx.store.scan(&ctx.tables.spaces, Some(&filter)).await {
        Ok(items) => Ok(ok(&listing(&items))),
        Err(e) => {
            logger::log_error(&format!("Failed to list available spaces: {e}"));
            Ok(internal_error("Internal Server Error"))
        }
    }
}

/// `GET /spaces/hoster/{id}` and `GET /spaces?hoster=`
///
/// The path suffix takes precedence over the query parameter.
pub async fn list_by_owner(
    ctx: &Context,
    event: &Event,
    path_owner: Option<&str>,
) -> HandlerResult<HandlerResponse> {
    let owner = path_owner
        .or_else(|| event.query(OWNER_ATTR))
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .ok_or(HandlerError::MissingField("userId/hoster"))?;

    let items = match ctx
        .store
        .query_index(&ctx.tables.spaces, &ctx.tables.owner_index, OWNER_ATTR, owner)
        .await
    {
        Ok(items) => items,
        Err(e) if e.is_structural() => {
            logger::log_warning(&format!(
                "Index {} unavailable ({e}), falling back to scan",
                ctx.tables.owner_index
            ));
            scan_by_owner(ctx, owner).await?
        }
        Err(e) => return Err(e.into()),
    };

    Ok(ok(&listing(&items)))
}

async fn scan_by_owner(ctx: &Context, owner: &str) -> Result<Vec<Item>, StoreError> {
    let filter = Condition::equals(OWNER_ATTR, AttributeValue::S(owner.to_string()));
    ctx.store.scan(&ctx.tables.spaces, Some(&filter)).await
}

/// `PUT /spaces?spaceId=`: raw field names
pub async fn update_space(ctx: &Context, event: &Event) -> HandlerResult<HandlerResponse> {
    let raw_id = event.query(SPACE_KEY).unwrap_or_default();
    let space_id = urlencoding::decode(raw_id)
        .map_or_else(|_| raw_id.to_string(), |decoded| decoded.into_owned());
    let space_id = space_id.trim();
    if space_id.is_empty() {
        return Err(HandlerError::MissingField(SPACE_KEY));
    }

    let body = parse_body(event)?;
    let update = updaters::build_update(&body, &DIRECT_FIELDS)?;
    logger::log_debug(&format!("Update {space_id}: {}", update.expression));

    let attributes = ctx
        .store
        .update_item(&ctx.tables.spaces, SPACE_KEY, space_id, &update)
        .await?;
    Ok(ok(&item_to_json(&attributes)))
}

/// Where the aliased update found its identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IdSource {
    Body(&'static str),
    Query,
}

fn aliased_id(event: &Event, body: &Map<String, Value>) -> Option<(String, IdSource)> {
    let from_body = ["spaceId", "id"].into_iter().find_map(|field| {
        body.get(field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| (id.to_string(), IdSource::Body(field)))
    });
    from_body.or_else(|| {
        event
            .query(SPACE_KEY)
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| (id.to_string(), IdSource::Query))
    })
}

/// `PUT /spaces/full`: external field names
pub async fn update_space_aliased(ctx: &Context, event: &Event) -> HandlerResult<HandlerResponse> {
    let body = parse_body(event)?;
    let (space_id, source) = aliased_id(event, &body).ok_or(HandlerError::MissingField(SPACE_KEY))?;
    logger::log_info(&format!("Full update of {space_id} (id from {source:?})"));

    let update = updaters::build_update(&body, &ALIASED_FIELDS)?;

    match ctx
        .store
        .update_item(&ctx.tables.spaces, SPACE_KEY, &space_id, &update)
        .await
    {
        Ok(attributes) => Ok(ok(&item_to_json(&attributes))),
        Err(e) => {
            logger::log_error(&format!("Failed to update {space_id}: {e}"));
            Ok(json_response(
                500,
                &json!({ "message": "Failed to update", "error": e.to_string() }),
            ))
        }
    }
}

/// `DELETE /spaces?spaceId=`
pub async fn delete_space(ctx: &Context, event: &Event) -> HandlerResult<HandlerResponse> {
    let space_id = query_id(event, SPACE_KEY)?;
    ctx.store
        .delete_item(&ctx.tables.spaces, SPACE_KEY, space_id)
        .await?;
    Ok(ok(&json!({
        "message": "Coworking space deleted successfully",
        "spaceId": space_id,
    })))
}

/// Resolve the user id: route suffix, then path parameter, then raw path
fn resolve_user_id<'e>(event: &'e Event, suffix: &'e str) -> Option<&'e str> {
    let from_raw = || {
        event
            .raw_path()
            .and_then(|path| path.split_once("/users/"))
            .map(|(_, rest)| rest.trim_matches('/'))
    };
    Some(suffix)
        .filter(|id| !id.is_empty())
        .or_else(|| event.path_param(USER_KEY))
        .or_else(from_raw)
        .map(str::trim)
        .filter(|id| !id.is_empty())
}

/// `GET /users/{id}`
pub async fn get_user(ctx: &Context, event: &Event, suffix: &str) -> HandlerResult<HandlerResponse> {
    let user_id = resolve_user_id(event, suffix).ok_or(HandlerError::MissingField(USER_KEY))?;
    match ctx.store.get_item(&ctx.tables.users, USER_KEY, user_id).await {
        Ok(Some(item)) => Ok(ok(&item_to_json(&item))),
        Ok(None) => Ok(not_found("User not found")),
        Err(e) => {
            logger::log_error(&format!("Failed to fetch user {user_id}: {e}"));
            Ok(internal_error("Internal error while fetching user"))
        }
    }
}
