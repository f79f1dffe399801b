/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::jmap::{raw_message, setup};
use jmap_proto::method::get_mailboxes::GetMailboxesRequest;
use serde_json::Value;
use types::{
    acl::{Acl, AclGrant},
    id::Id,
    keyword::Keyword,
    special_use::SpecialUse,
};

fn find<'x>(list: &'x [Value], name: &str) -> &'x Value {
    list.iter()
        .find(|mailbox| mailbox["name"] == name)
        .unwrap_or_else(|| panic!("mailbox {name} not listed"))
}

#[tokio::test]
async fn provisioned_roles_and_sort_orders() {
    let params = setup();
    let (_, token) = params.account("alice@example.com");

    let response = params
        .engine
        .get_mailboxes(GetMailboxesRequest::default(), &token)
        .await
        .unwrap();

    assert_eq!(response.list.len(), 7);
    let inbox = find(&response.list, "Inbox");
    assert_eq!(inbox["role"], "inbox");
    assert_eq!(inbox["sortOrder"], 10);
    assert_eq!(inbox["namespace"]["type"], "Personal");
    assert_eq!(inbox["namespace"]["owner"], Value::Null);
    assert_eq!(inbox["mayReadItems"], true);
    assert_eq!(inbox["mayDelete"], true);
    assert_eq!(find(&response.list, "Trash")["sortOrder"], 60);
}

#[tokio::test]
async fn message_and_thread_counts() {
    let params = setup();
    let (account_id, token) = params.account("alice@example.com");
    let inbox = params.mailbox_with_role(account_id, SpecialUse::Inbox).await;

    params.store.seed_message(
        account_id,
        vec![inbox],
        raw_message("bob@example.com", "alice@example.com", "one", "body"),
        vec![Keyword::Seen],
        1000,
    );
    params.store.seed_message(
        account_id,
        vec![inbox],
        raw_message("bob@example.com", "alice@example.com", "Re: one", "body"),
        vec![],
        1001,
    );
    params.store.seed_message(
        account_id,
        vec![inbox],
        raw_message("bob@example.com", "alice@example.com", "two", "body"),
        vec![],
        1002,
    );

    let response = params
        .engine
        .get_mailboxes(GetMailboxesRequest::default(), &token)
        .await
        .unwrap();
    let inbox = find(&response.list, "Inbox");
    assert_eq!(inbox["totalMessages"], 3);
    assert_eq!(inbox["unreadMessages"], 2);
    assert_eq!(inbox["totalThreads"], 2);
    assert_eq!(inbox["unreadThreads"], 2);
}

#[tokio::test]
async fn outbox_always_reports_zero() {
    let params = setup();
    let (account_id, token) = params.account("alice@example.com");
    let outbox = params
        .mailbox_with_role(account_id, SpecialUse::Outbox)
        .await;

    params.store.seed_message(
        account_id,
        vec![outbox],
        raw_message("alice@example.com", "bob@example.com", "queued", "body"),
        vec![],
        1000,
    );

    let response = params
        .engine
        .get_mailboxes(GetMailboxesRequest::default(), &token)
        .await
        .unwrap();
    let outbox = find(&response.list, "Outbox");
    assert_eq!(outbox["totalMessages"], 0);
    assert_eq!(outbox["unreadMessages"], 0);
}

#[tokio::test]
async fn shared_mailbox_visibility_requires_lookup() {
    let params = setup();
    let (alice_id, _) = params.account("alice@example.com");
    let (_, bob_token) = params.account("bob@example.com");
    let inbox = params.mailbox_with_role(alice_id, SpecialUse::Inbox).await;

    // Nothing shared yet: Bob sees only his own seven mailboxes.
    let response = params
        .engine
        .get_mailboxes(GetMailboxesRequest::default(), &bob_token)
        .await
        .unwrap();
    assert_eq!(response.list.len(), 7);

    params.store.share_mailbox(
        alice_id,
        inbox,
        AclGrant::new(bob_token.primary_id, [Acl::Lookup]),
    );

    let response = params
        .engine
        .get_mailboxes(GetMailboxesRequest::default(), &bob_token)
        .await
        .unwrap();
    assert_eq!(response.list.len(), 8);

    let shared = response
        .list
        .iter()
        .find(|mailbox| mailbox["namespace"]["type"] == "Delegated")
        .unwrap();
    assert_eq!(shared["namespace"]["owner"], "alice@example.com");
    // The role is owner-private, and Lookup alone grants no capability.
    assert_eq!(shared["role"], Value::Null);
    assert_eq!(shared["mayReadItems"], false);
    assert_eq!(shared["mayAddItems"], false);
}

#[tokio::test]
async fn capabilities_follow_granted_rights() {
    let params = setup();
    let (alice_id, _) = params.account("alice@example.com");
    let (_, bob_token) = params.account("bob@example.com");
    let inbox = params.mailbox_with_role(alice_id, SpecialUse::Inbox).await;

    params.store.share_mailbox(
        alice_id,
        inbox,
        AclGrant::new(bob_token.primary_id, [Acl::Lookup, Acl::Read, Acl::Insert]),
    );

    let response = params
        .engine
        .get_mailboxes(GetMailboxesRequest::default(), &bob_token)
        .await
        .unwrap();
    let shared = response
        .list
        .iter()
        .find(|mailbox| mailbox["namespace"]["type"] == "Delegated")
        .unwrap();
    assert_eq!(shared["mayReadItems"], true);
    assert_eq!(shared["mayAddItems"], true);
    assert_eq!(shared["mayRemoveItems"], false);
    assert_eq!(shared["mayCreateChild"], false);
    assert_eq!(shared["mayRename"], false);
    assert_eq!(shared["mayDelete"], false);
}

#[tokio::test]
async fn shared_with_is_gated_on_administer() {
    let params = setup();
    let (alice_id, alice_token) = params.account("alice@example.com");
    let (_, bob_token) = params.account("bob@example.com");
    let (_, carol_token) = params.account("carol@example.com");
    let inbox = params.mailbox_with_role(alice_id, SpecialUse::Inbox).await;

    params.store.share_mailbox(
        alice_id,
        inbox,
        AclGrant::new(
            bob_token.primary_id,
            [Acl::Lookup, Acl::Read, Acl::Administer],
        ),
    );
    params.store.share_mailbox(
        alice_id,
        inbox,
        AclGrant::new(carol_token.primary_id, [Acl::Lookup, Acl::Post]),
    );

    // The owner sees every grantee, never itself, with rights projected
    // into the fixed {Administer, Lookup, Read} order.
    let response = params
        .engine
        .get_mailboxes(GetMailboxesRequest::default(), &alice_token)
        .await
        .unwrap();
    let inbox_obj = find(&response.list, "Inbox");
    let shared_with = inbox_obj["sharedWith"].as_object().unwrap();
    assert_eq!(shared_with.len(), 2);
    assert_eq!(
        shared_with["bob@example.com"],
        serde_json::json!(["Administer", "Lookup", "Read"])
    );
    // Post is not projected; only Lookup remains.
    assert_eq!(
        shared_with["carol@example.com"],
        serde_json::json!(["Lookup"])
    );

    // Bob holds Administer and sees the map too.
    let response = params
        .engine
        .get_mailboxes(GetMailboxesRequest::default(), &bob_token)
        .await
        .unwrap();
    let shared = response
        .list
        .iter()
        .find(|mailbox| mailbox["namespace"]["type"] == "Delegated")
        .unwrap();
    assert_eq!(shared["sharedWith"].as_object().unwrap().len(), 2);

    // Carol does not hold Administer: the map is empty for her.
    let response = params
        .engine
        .get_mailboxes(GetMailboxesRequest::default(), &carol_token)
        .await
        .unwrap();
    let shared = response
        .list
        .iter()
        .find(|mailbox| mailbox["namespace"]["type"] == "Delegated")
        .unwrap();
    assert_eq!(shared["sharedWith"].as_object().unwrap().len(), 0);
}

#[tokio::test]
async fn unsupported_account_id_is_rejected() {
    let params = setup();
    let (_, token) = params.account("alice@example.com");

    let request: GetMailboxesRequest =
        serde_json::from_str(r#"{"accountId": "alice@example.com"}"#).unwrap();
    let err = params.engine.get_mailboxes(request, &token).await.unwrap_err();
    assert_eq!(
        err.description().unwrap(),
        "The field 'accountId' of 'GetMailboxesRequest' is not supported"
    );
}

#[tokio::test]
async fn unknown_ids_are_reported_not_found() {
    let params = setup();
    let (account_id, token) = params.account("alice@example.com");
    let inbox = params.mailbox_with_role(account_id, SpecialUse::Inbox).await;

    let request = GetMailboxesRequest {
        ids: Some(vec![Id::from(inbox), Id::new(99_999)]),
        ..Default::default()
    };
    let response = params.engine.get_mailboxes(request, &token).await.unwrap();
    assert_eq!(response.list.len(), 1);
    assert_eq!(response.not_found, vec![Id::new(99_999)]);
}

#[tokio::test]
async fn properties_projection_retains_id() {
    let params = setup();
    let (_, token) = params.account("alice@example.com");

    let request = GetMailboxesRequest {
        properties: Some(vec!["name".to_string(), "sortOrder".to_string()]),
        ..Default::default()
    };
    let response = params.engine.get_mailboxes(request, &token).await.unwrap();
    let mailbox = response.list.first().unwrap().as_object().unwrap();
    assert_eq!(mailbox.len(), 3);
    assert!(mailbox.contains_key("id"));
    assert!(mailbox.contains_key("name"));
    assert!(mailbox.contains_key("sortOrder"));
}
