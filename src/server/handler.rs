//! Message dispatch and request handling.
//!
//! Pure logic, no I/O. Each handler takes the [`ServerState`] and
//! returns the response message. Error reasons are machine-readable
//! codes: the [`FavoriteError`] code, `item_not_found`,
//! `invalid_hello_id`, `version_mismatch` or `unknown_type`.

use crate::favorite::{
    FavoriteAction, FavoriteError, Item, Link, Principal, Reachable, select_default_branch,
};
use crate::ipc::protocol::{Message, PROTOCOL_VERSION, Status};

use super::state::{ConnectionId, ServerState};

/// Dispatch a request message to the appropriate handler.
///
/// Server-originated variants are answered with `unknown_type`.
pub fn handle_message(
    state: &mut ServerState,
    request: Message,
    connection_id: ConnectionId,
) -> Message {
    match request {
        Message::Hello { id, version, user } => {
            handle_hello(state, id, version, user, connection_id)
        }
        Message::Toggle { id, item, favorite } => {
            handle_toggle(state, id, &item, FavoriteAction { favorite }, connection_id)
        }
        Message::GetFavorite { id, name, anchor } => {
            handle_get_favorite(state, id, &name, anchor.as_deref())
        }
        Message::ListFavorites { id } => handle_list_favorites(state, id, connection_id),
        Message::HelloAck { id, .. } | Message::Response { id, .. } => {
            Message::error(id, "unknown_type")
        }
    }
}

// -- Individual handlers --

fn handle_hello(
    state: &mut ServerState,
    id: u32,
    version: u32,
    user: Option<String>,
    connection_id: ConnectionId,
) -> Message {
    // The principal is fixed for the life of the connection.
    if state.is_connected(connection_id) {
        tracing::debug!(?connection_id, "repeated hello rejected");
        return Message::error(id, "unknown_type");
    }
    // The handshake always uses id 0.
    if id != 0 {
        return hello_ack_error("invalid_hello_id");
    }
    if version != PROTOCOL_VERSION {
        return hello_ack_error("version_mismatch");
    }

    let principal = user
        .filter(|u| !u.trim().is_empty())
        .map(|u| Principal::new(u.trim()));
    tracing::debug!(
        ?connection_id,
        user = principal.as_ref().map(|p| p.id.as_str()),
        "handshake"
    );
    state.add_connection(connection_id, principal);

    Message::HelloAck {
        id: 0,
        status: Status::Ok,
        error: None,
    }
}

/// Toggle a favorite and answer with the toggled item's favorite.
///
/// Multi-branch projects are favorited through their default branch.
fn handle_toggle(
    state: &ServerState,
    id: u32,
    full_name: &str,
    action: FavoriteAction,
    connection_id: ConnectionId,
) -> Message {
    let engine = state.engine();
    let Some(item) = engine.item(full_name) else {
        return Message::error(id, "item_not_found");
    };

    let result = toggle_target(item).and_then(|target| {
        engine.toggle(action, target, state.principal(connection_id))?;
        engine.resolve_item(target)
    });

    match result {
        Ok(favorite) => Message::Response {
            id,
            status: Status::Ok,
            error: None,
            favorite,
            favorites: None,
        },
        Err(e) => favorite_error(id, &e),
    }
}

fn toggle_target(item: &Item) -> Result<&Item, FavoriteError> {
    if item.is_multibranch() {
        select_default_branch(item)
    } else {
        Ok(item)
    }
}

fn handle_get_favorite(
    state: &ServerState,
    id: u32,
    encoded_name: &str,
    anchor: Option<&str>,
) -> Message {
    let anchor = anchor.map(Link::new);
    let parent = anchor.as_ref().map(|l| l as &dyn Reachable);

    match state.engine().resolve_by_encoded_name(encoded_name, parent) {
        Ok(favorite) => Message::Response {
            id,
            status: Status::Ok,
            error: None,
            favorite,
            favorites: None,
        },
        Err(e) => favorite_error(id, &e),
    }
}

fn handle_list_favorites(state: &ServerState, id: u32, connection_id: ConnectionId) -> Message {
    match state.engine().favorites(state.principal(connection_id)) {
        Ok(favorites) => Message::Response {
            id,
            status: Status::Ok,
            error: None,
            favorite: None,
            favorites: Some(favorites),
        },
        Err(e) => favorite_error(id, &e),
    }
}

// -- Helpers --

fn favorite_error(id: u32, err: &FavoriteError) -> Message {
    match err {
        FavoriteError::Unexpected { source, .. } => {
            tracing::error!(id, error = %err, cause = %source, "request failed");
        }
        _ => tracing::debug!(id, error = %err, "request rejected"),
    }
    Message::error(id, err.code())
}

fn hello_ack_error(reason: &str) -> Message {
    Message::HelloAck {
        id: 0,
        status: Status::Error,
        error: Some(reason.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::favorite::Favorite;

    const CATALOG: &str = r#"{
        "items": [
            { "type": "job", "name": "job" },
            { "type": "folder", "name": "folder", "items": [
                { "type": "job", "name": "job" }
            ]},
            { "type": "multibranch", "name": "repo", "branches": [
                { "type": "job", "name": "feature" },
                { "type": "job", "name": "main", "primary": true }
            ]},
            { "type": "multibranch", "name": "orphan", "branches": [
                { "type": "job", "name": "develop" }
            ]}
        ]
    }"#;

    const PIPELINES: &str = "/blue/rest/organizations/jenkins/pipelines/";

    fn fresh() -> (ServerState, ConnectionId) {
        let catalog = Catalog::from_json(CATALOG).unwrap();
        let state = ServerState::new(crate::server::build_engine(catalog));
        (state, ConnectionId::new())
    }

    fn hello(user: Option<&str>) -> Message {
        Message::Hello {
            id: 0,
            version: PROTOCOL_VERSION,
            user: user.map(String::from),
        }
    }

    fn login(state: &mut ServerState, conn: ConnectionId, user: Option<&str>) {
        let resp = handle_message(state, hello(user), conn);
        assert!(matches!(
            resp,
            Message::HelloAck {
                status: Status::Ok,
                ..
            }
        ));
    }

    fn toggle(id: u32, item: &str, favorite: bool) -> Message {
        Message::Toggle {
            id,
            item: item.into(),
            favorite,
        }
    }

    fn assert_error(resp: &Message, expected_id: u32, reason: &str) {
        match resp {
            Message::Response {
                id,
                status: Status::Error,
                error: Some(e),
                ..
            } => {
                assert_eq!(*id, expected_id);
                assert_eq!(e, reason);
            }
            other => panic!("expected error {reason}, got {other:?}"),
        }
    }

    fn ok_favorite(resp: Message) -> Option<Favorite> {
        match resp {
            Message::Response {
                status: Status::Ok,
                favorite,
                ..
            } => favorite,
            other => panic!("expected ok response, got {other:?}"),
        }
    }

    fn ok_favorites(resp: Message) -> Vec<Favorite> {
        match resp {
            Message::Response {
                status: Status::Ok,
                favorites: Some(favorites),
                ..
            } => favorites,
            other => panic!("expected favorites, got {other:?}"),
        }
    }

    // -- Hello --

    #[test]
    fn hello_registers_principal() {
        let (mut s, c) = fresh();
        login(&mut s, c, Some("alice"));
        assert_eq!(s.principal(c).unwrap().id, "alice");
    }

    #[test]
    fn hello_blank_user_is_anonymous() {
        let (mut s, c) = fresh();
        login(&mut s, c, Some("  "));
        assert!(s.is_connected(c));
        assert!(s.principal(c).is_none());
    }

    #[test]
    fn repeated_hello_keeps_principal() {
        let (mut s, c) = fresh();
        login(&mut s, c, Some("alice"));
        let resp = handle_message(&mut s, hello(Some("bob")), c);
        assert_error(&resp, 0, "unknown_type");
        assert_eq!(s.principal(c).unwrap().id, "alice");

        let resp = handle_message(&mut s, toggle(1, "job", true), c);
        assert!(ok_favorite(resp).is_some());
        let favs = ok_favorites(handle_message(&mut s, Message::ListFavorites { id: 2 }, c));
        assert_eq!(favs.len(), 1);
    }

    #[test]
    fn hello_version_mismatch() {
        let (mut s, c) = fresh();
        let resp = handle_message(
            &mut s,
            Message::Hello {
                id: 0,
                version: 99,
                user: None,
            },
            c,
        );
        assert_eq!(resp, hello_ack_error("version_mismatch"));
        assert!(!s.is_connected(c));
    }

    #[test]
    fn hello_nonzero_id_rejected() {
        let (mut s, c) = fresh();
        let resp = handle_message(
            &mut s,
            Message::Hello {
                id: 7,
                version: PROTOCOL_VERSION,
                user: None,
            },
            c,
        );
        assert_eq!(resp, hello_ack_error("invalid_hello_id"));
    }

    // -- Toggle --

    #[test]
    fn anonymous_toggle_is_forbidden() {
        let (mut s, c) = fresh();
        login(&mut s, c, None);
        let resp = handle_message(&mut s, toggle(1, "job", true), c);
        assert_error(&resp, 1, "forbidden");

        let alice = ConnectionId::new();
        login(&mut s, alice, Some("alice"));
        let favs = ok_favorites(handle_message(&mut s, Message::ListFavorites { id: 2 }, alice));
        assert!(favs.is_empty());
    }

    #[test]
    fn toggle_unknown_item() {
        let (mut s, c) = fresh();
        login(&mut s, c, Some("alice"));
        let resp = handle_message(&mut s, toggle(3, "nope", true), c);
        assert_error(&resp, 3, "item_not_found");
    }

    #[test]
    fn toggle_returns_resolved_favorite() {
        let (mut s, c) = fresh();
        login(&mut s, c, Some("alice"));
        let fav = ok_favorite(handle_message(&mut s, toggle(1, "folder/job", true), c)).unwrap();
        assert_eq!(
            fav.link().href(),
            format!("{PIPELINES}folder/pipelines/job/favorite/")
        );
    }

    #[test]
    fn toggle_on_then_off_updates_list() {
        let (mut s, c) = fresh();
        login(&mut s, c, Some("alice"));
        handle_message(&mut s, toggle(1, "job", true), c);
        handle_message(&mut s, toggle(2, "folder/job", true), c);

        let favs = ok_favorites(handle_message(&mut s, Message::ListFavorites { id: 3 }, c));
        let names: Vec<&str> = favs.iter().map(|f| f.item.full_name.as_str()).collect();
        assert_eq!(names, vec!["job", "folder/job"]);

        handle_message(&mut s, toggle(4, "job", false), c);
        let favs = ok_favorites(handle_message(&mut s, Message::ListFavorites { id: 5 }, c));
        assert_eq!(favs.len(), 1);
        assert_eq!(favs[0].item.full_name, "folder/job");
    }

    #[test]
    fn favorites_are_per_principal() {
        let (mut s, alice) = fresh();
        let bob = ConnectionId::new();
        login(&mut s, alice, Some("alice"));
        login(&mut s, bob, Some("bob"));
        handle_message(&mut s, toggle(1, "job", true), alice);
        assert!(ok_favorites(handle_message(&mut s, Message::ListFavorites { id: 2 }, bob)).is_empty());
    }

    #[test]
    fn toggle_multibranch_favorites_default_branch() {
        let (mut s, c) = fresh();
        login(&mut s, c, Some("alice"));
        let fav = ok_favorite(handle_message(&mut s, toggle(1, "repo", true), c)).unwrap();
        assert_eq!(fav.item.full_name, "repo/main");
        assert_eq!(
            fav.link().href(),
            format!("{PIPELINES}repo/branches/main/favorite/")
        );

        let favs = ok_favorites(handle_message(&mut s, Message::ListFavorites { id: 2 }, c));
        assert_eq!(favs[0].item.full_name, "repo/main");
    }

    #[test]
    fn toggle_multibranch_without_default_branch_is_bad_request() {
        let (mut s, c) = fresh();
        login(&mut s, c, Some("alice"));
        let resp = handle_message(&mut s, toggle(9, "orphan", true), c);
        assert_error(&resp, 9, "bad_request");
    }

    // -- GetFavorite --

    #[test]
    fn get_favorite_decodes_name_twice() {
        let (mut s, c) = fresh();
        login(&mut s, c, None);
        let fav = ok_favorite(handle_message(
            &mut s,
            Message::GetFavorite {
                id: 1,
                name: "folder%252Fjob".into(),
                anchor: None,
            },
            c,
        ))
        .unwrap();
        assert_eq!(fav.item.full_name, "folder/job");
    }

    #[test]
    fn get_favorite_with_anchor() {
        let (mut s, c) = fresh();
        login(&mut s, c, None);
        let fav = ok_favorite(handle_message(
            &mut s,
            Message::GetFavorite {
                id: 1,
                name: "job".into(),
                anchor: Some("/blue/rest/users/alice/favorites".into()),
            },
            c,
        ))
        .unwrap();
        assert_eq!(fav.link().href(), "/blue/rest/users/alice/favorites/job/favorite/");
    }

    #[test]
    fn get_favorite_multibranch_resolves_branch() {
        let (mut s, c) = fresh();
        login(&mut s, c, None);
        let fav = ok_favorite(handle_message(
            &mut s,
            Message::GetFavorite {
                id: 1,
                name: "repo".into(),
                anchor: None,
            },
            c,
        ))
        .unwrap();
        assert_eq!(fav.item.full_name, "repo/main");
    }

    #[test]
    fn get_favorite_unknown_is_ok_without_favorite() {
        let (mut s, c) = fresh();
        login(&mut s, c, None);
        let resp = handle_message(
            &mut s,
            Message::GetFavorite {
                id: 4,
                name: "missing".into(),
                anchor: None,
            },
            c,
        );
        assert!(ok_favorite(resp).is_none());
    }

    #[test]
    fn get_favorite_malformed_name() {
        let (mut s, c) = fresh();
        login(&mut s, c, None);
        let resp = handle_message(
            &mut s,
            Message::GetFavorite {
                id: 5,
                name: "bad%zz".into(),
                anchor: None,
            },
            c,
        );
        assert_error(&resp, 5, "unexpected_error");
    }

    // -- List / server-originated --

    #[test]
    fn anonymous_list_is_forbidden() {
        let (mut s, c) = fresh();
        login(&mut s, c, None);
        let resp = handle_message(&mut s, Message::ListFavorites { id: 6 }, c);
        assert_error(&resp, 6, "forbidden");
    }

    #[test]
    fn server_originated_messages_rejected() {
        let (mut s, c) = fresh();
        login(&mut s, c, None);
        let resp = handle_message(&mut s, Message::ok(8), c);
        assert_error(&resp, 8, "unknown_type");
    }
}
