/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::jmap::{raw_message, setup, setup_with_config};
use jmap::JmapConfig;
use jmap_proto::method::get_message_list::GetMessageListRequest;
use types::{
    acl::{Acl, AclGrant},
    id::Id,
    keyword::Keyword,
    special_use::SpecialUse,
};

fn request(json: &str) -> GetMessageListRequest {
    serde_json::from_str(json).unwrap()
}

#[tokio::test]
async fn filter_depth_is_bounded() {
    let params = setup();
    let (_, token) = params.account("alice@example.com");

    let mut filter = r#"{"isUnread":true}"#.to_string();
    for _ in 0..9 {
        filter = format!(r#"{{"operator":"AND","conditions":[{filter}]}}"#);
    }
    // Depth 10 is accepted.
    assert!(params
        .engine
        .get_message_list(request(&format!(r#"{{"filter":{filter}}}"#)), &token)
        .await
        .is_ok());

    // One more level is not, regardless of branch content.
    let filter = format!(r#"{{"operator":"OR","conditions":[{filter}]}}"#);
    let err = params
        .engine
        .get_message_list(request(&format!(r#"{{"filter":{filter}}}"#)), &token)
        .await
        .unwrap_err();
    assert_eq!(
        err.description().unwrap(),
        "Filter depth is higher than maximum allowed value 10"
    );
}

#[tokio::test]
async fn mailbox_clauses_are_root_only() {
    let params = setup();
    let (account_id, token) = params.account("alice@example.com");
    let inbox = params.mailbox_with_role(account_id, SpecialUse::Inbox).await;

    let err = params
        .engine
        .get_message_list(
            request(&format!(
                r#"{{"filter":{{"operator":"AND","conditions":[{{"inMailboxes":["{}"]}}]}}}}"#,
                Id::from(inbox)
            )),
            &token,
        )
        .await
        .unwrap_err();
    assert_eq!(
        err.description().unwrap(),
        "'inMailboxes' and 'notInMailboxes' wrapped within Filter Operators are not \
         implemented. Review your search request."
    );
}

#[tokio::test]
async fn not_operator_is_none_of() {
    let params = setup();
    let (account_id, token) = params.account("alice@example.com");
    let inbox = params.mailbox_with_role(account_id, SpecialUse::Inbox).await;

    // flagged+read, unflagged+unread, flagged+unread, unflagged+read
    let m1 = params.store.seed_message(
        account_id,
        vec![inbox],
        raw_message("bob@example.com", "alice@example.com", "m1", "body"),
        vec![Keyword::Flagged, Keyword::Seen],
        1000,
    );
    let _m2 = params.store.seed_message(
        account_id,
        vec![inbox],
        raw_message("bob@example.com", "alice@example.com", "m2", "body"),
        vec![],
        1001,
    );
    let _m3 = params.store.seed_message(
        account_id,
        vec![inbox],
        raw_message("bob@example.com", "alice@example.com", "m3", "body"),
        vec![Keyword::Flagged],
        1002,
    );
    let m4 = params.store.seed_message(
        account_id,
        vec![inbox],
        raw_message("bob@example.com", "alice@example.com", "m4", "body"),
        vec![Keyword::Seen],
        1003,
    );
    let _ = m1;

    // NOT [isFlagged, isUnread] matches only messages that are neither
    // flagged nor unread.
    let response = params
        .engine
        .get_message_list(
            request(
                r#"{"filter":{"operator":"NOT","conditions":[{"isFlagged":true},{"isUnread":true}]}}"#,
            ),
            &token,
        )
        .await
        .unwrap();
    assert_eq!(response.message_ids, vec![Id::from(m4.id)]);
}

#[tokio::test]
async fn recent_keyword_predicates_are_noops() {
    let params = setup();
    let (account_id, token) = params.account("alice@example.com");
    let inbox = params.mailbox_with_role(account_id, SpecialUse::Inbox).await;

    for (subject, received_at) in [("m1", 1000), ("m2", 1001)] {
        params.store.seed_message(
            account_id,
            vec![inbox],
            raw_message("bob@example.com", "alice@example.com", subject, "body"),
            vec![],
            received_at,
        );
    }

    let all = params
        .engine
        .get_message_list(GetMessageListRequest::default(), &token)
        .await
        .unwrap();
    let with_recent = params
        .engine
        .get_message_list(request(r#"{"filter":{"hasKeyword":"$Recent"}}"#), &token)
        .await
        .unwrap();
    let without_recent = params
        .engine
        .get_message_list(request(r#"{"filter":{"notKeyword":"$Recent"}}"#), &token)
        .await
        .unwrap();

    assert_eq!(all.message_ids, with_recent.message_ids);
    assert_eq!(all.message_ids, without_recent.message_ids);
}

#[tokio::test]
async fn mailbox_membership_filters() {
    let params = setup();
    let (account_id, token) = params.account("alice@example.com");
    let inbox = params.mailbox_with_role(account_id, SpecialUse::Inbox).await;
    let archive = params
        .mailbox_with_role(account_id, SpecialUse::Archive)
        .await;
    let other = params.store.create_mailbox(account_id, "other", None);

    let in_inbox = params.store.seed_message(
        account_id,
        vec![inbox],
        raw_message("bob@example.com", "alice@example.com", "m1", "body"),
        vec![],
        1000,
    );
    let in_both = params.store.seed_message(
        account_id,
        vec![inbox, archive],
        raw_message("bob@example.com", "alice@example.com", "m2", "body"),
        vec![],
        1001,
    );
    let in_other = params.store.seed_message(
        account_id,
        vec![other],
        raw_message("bob@example.com", "alice@example.com", "m3", "body"),
        vec![],
        1002,
    );

    // Membership in any of the listed mailboxes is enough.
    let response = params
        .engine
        .get_message_list(
            request(&format!(
                r#"{{"filter":{{"inMailboxes":["{}","{}"]}}}}"#,
                Id::from(inbox),
                Id::from(archive)
            )),
            &token,
        )
        .await
        .unwrap();
    assert_eq!(
        response.message_ids,
        vec![Id::from(in_inbox.id), Id::from(in_both.id)]
    );

    // Exclusion wins over inclusion on the intersection.
    let response = params
        .engine
        .get_message_list(
            request(&format!(
                r#"{{"filter":{{"inMailboxes":["{}"],"notInMailboxes":["{}"]}}}}"#,
                Id::from(inbox),
                Id::from(archive)
            )),
            &token,
        )
        .await
        .unwrap();
    assert_eq!(response.message_ids, vec![Id::from(in_inbox.id)]);

    let response = params
        .engine
        .get_message_list(
            request(&format!(
                r#"{{"filter":{{"notInMailboxes":["{}"]}}}}"#,
                Id::from(inbox)
            )),
            &token,
        )
        .await
        .unwrap();
    assert_eq!(response.message_ids, vec![Id::from(in_other.id)]);
}

#[tokio::test]
async fn text_predicates_match_case_insensitively() {
    let params = setup();
    let (account_id, token) = params.account("alice@example.com");
    let inbox = params.mailbox_with_role(account_id, SpecialUse::Inbox).await;

    let matching = params.store.seed_message(
        account_id,
        vec![inbox],
        raw_message(
            "bob@example.com",
            "alice@example.com",
            "Meeting Agenda",
            "the BUDGET numbers are attached",
        ),
        vec![],
        1000,
    );
    params.store.seed_message(
        account_id,
        vec![inbox],
        raw_message("carol@example.com", "alice@example.com", "lunch", "pizza?"),
        vec![],
        1001,
    );

    for filter in [
        r#"{"filter":{"subject":"agenda"}}"#.to_string(),
        r#"{"filter":{"text":"budget"}}"#.to_string(),
        r#"{"filter":{"from":"BOB@example.com"}}"#.to_string(),
        r#"{"filter":{"body":"budget numbers"}}"#.to_string(),
        r#"{"filter":{"header":["From","bob@example.com"]}}"#.to_string(),
    ] {
        let response = params
            .engine
            .get_message_list(request(&filter), &token)
            .await
            .unwrap();
        assert_eq!(
            response.message_ids,
            vec![Id::from(matching.id)],
            "filter {filter}"
        );
    }
}

#[tokio::test]
async fn attachment_file_name_matches_declared_name_only() {
    let params = setup();
    let (account_id, token) = params.account("alice@example.com");
    let inbox = params.mailbox_with_role(account_id, SpecialUse::Inbox).await;

    let with_attachment = params.store.seed_message(
        account_id,
        vec![inbox],
        b"From: bob@example.com\r\nTo: alice@example.com\r\nSubject: files\r\n\
          Content-Type: multipart/mixed; boundary=\"b1\"\r\n\r\n\
          --b1\r\nContent-Type: text/plain\r\n\r\nsee matchme.txt inside\r\n\
          --b1\r\nContent-Type: text/plain\r\n\
          Content-Disposition: attachment; filename=\"matchme.txt\"\r\n\r\n\
          attached payload\r\n--b1--\r\n"
            .to_vec(),
        vec![],
        1000,
    );
    // Mentions the name in its body but declares no attachment.
    params.store.seed_message(
        account_id,
        vec![inbox],
        raw_message(
            "bob@example.com",
            "alice@example.com",
            "no files",
            "please rename matchme.txt",
        ),
        vec![],
        1001,
    );

    let response = params
        .engine
        .get_message_list(
            request(r#"{"filter":{"attachmentFileName":"matchme.txt"}}"#),
            &token,
        )
        .await
        .unwrap();
    assert_eq!(response.message_ids, vec![Id::from(with_attachment.id)]);

    let response = params
        .engine
        .get_message_list(request(r#"{"filter":{"hasAttachment":true}}"#), &token)
        .await
        .unwrap();
    assert_eq!(response.message_ids, vec![Id::from(with_attachment.id)]);
}

#[tokio::test]
async fn sorts_by_size_then_date_header_descending() {
    let params = setup();
    let (account_id, token) = params.account("alice@example.com");
    let inbox = params.mailbox_with_role(account_id, SpecialUse::Inbox).await;

    let seed = |date_header: &str, subject: &str, body: &str, received_at: i64| {
        params.store.seed_message(
            account_id,
            vec![inbox],
            format!(
                "Date: {date_header}\r\nFrom: bob@example.com\r\n\
                 To: alice@example.com\r\nSubject: {subject}\r\n\r\n{body}"
            )
            .into_bytes(),
            vec![],
            received_at,
        )
    };

    // Sizes {big, small, big}; the size tie between m1 and m3 breaks on
    // the parsed Date header, newest first.
    let m1 = seed(
        "Fri, 02 Jun 2017 13:54:59 +0200",
        "a",
        "testmail really bigger",
        2000,
    );
    let m2 = seed("Fri, 02 Jun 2017 14:54:59 +0200", "a", "testmail smaller", 1000);
    let m3 = seed(
        "Fri, 02 Jun 2017 15:54:59 +0200",
        "a",
        "testmail really bigger",
        2000,
    );

    let response = params
        .engine
        .get_message_list(request(r#"{"sort":["size asc","date desc"]}"#), &token)
        .await
        .unwrap();
    assert_eq!(
        response.message_ids,
        vec![Id::from(m2.id), Id::from(m3.id), Id::from(m1.id)]
    );
}

#[tokio::test]
async fn bare_sort_field_descends_and_default_sort_ascends() {
    let params = setup();
    let (account_id, token) = params.account("alice@example.com");
    let inbox = params.mailbox_with_role(account_id, SpecialUse::Inbox).await;

    let older = params.store.seed_message(
        account_id,
        vec![inbox],
        raw_message("bob@example.com", "alice@example.com", "older", "x"),
        vec![],
        1000,
    );
    let newer = params.store.seed_message(
        account_id,
        vec![inbox],
        raw_message("bob@example.com", "alice@example.com", "newer", "x"),
        vec![],
        2000,
    );

    let response = params
        .engine
        .get_message_list(request(r#"{"sort":["date"]}"#), &token)
        .await
        .unwrap();
    assert_eq!(
        response.message_ids,
        vec![Id::from(newer.id), Id::from(older.id)]
    );

    let response = params
        .engine
        .get_message_list(GetMessageListRequest::default(), &token)
        .await
        .unwrap();
    assert_eq!(
        response.message_ids,
        vec![Id::from(older.id), Id::from(newer.id)]
    );
}

#[tokio::test]
async fn position_bounds_and_pagination() {
    let params = setup();
    let (account_id, token) = params.account("alice@example.com");
    let inbox = params.mailbox_with_role(account_id, SpecialUse::Inbox).await;

    let mut ids = Vec::new();
    for i in 0..4 {
        ids.push(
            params
                .store
                .seed_message(
                    account_id,
                    vec![inbox],
                    raw_message("bob@example.com", "alice@example.com", &format!("m{i}"), "x"),
                    vec![],
                    1000 + i,
                )
                .id,
        );
    }

    let response = params
        .engine
        .get_message_list(request(r#"{"position":1,"limit":2}"#), &token)
        .await
        .unwrap();
    assert_eq!(
        response.message_ids,
        vec![Id::from(ids[1]), Id::from(ids[2])]
    );
    assert_eq!(response.total, Some(4));

    // The largest exact JSON integer is still a legal position.
    let response = params
        .engine
        .get_message_list(request(r#"{"position":9007199254740991}"#), &token)
        .await
        .unwrap();
    assert!(response.message_ids.is_empty());

    let err = params
        .engine
        .get_message_list(request(r#"{"position":9007199254740992}"#), &token)
        .await
        .unwrap_err();
    assert_eq!(
        err.description().unwrap(),
        "value should be positive and less than 2^53"
    );
}

#[tokio::test]
async fn default_limit_is_configured_not_hardcoded() {
    let params = setup_with_config(JmapConfig {
        query_max_results: 3,
        ..Default::default()
    });
    let (account_id, token) = params.account("alice@example.com");
    let inbox = params.mailbox_with_role(account_id, SpecialUse::Inbox).await;

    for i in 0..4 {
        params.store.seed_message(
            account_id,
            vec![inbox],
            raw_message("bob@example.com", "alice@example.com", &format!("m{i}"), "x"),
            vec![],
            1000 + i,
        );
    }

    let response = params
        .engine
        .get_message_list(GetMessageListRequest::default(), &token)
        .await
        .unwrap();
    assert_eq!(response.message_ids.len(), 3);

    // An explicit limit overrides the default.
    let response = params
        .engine
        .get_message_list(request(r#"{"limit":4}"#), &token)
        .await
        .unwrap();
    assert_eq!(response.message_ids.len(), 4);
}

#[tokio::test]
async fn collapse_threads_keeps_first_per_thread() {
    let params = setup();
    let (account_id, token) = params.account("alice@example.com");
    let inbox = params.mailbox_with_role(account_id, SpecialUse::Inbox).await;

    let first = params.store.seed_message(
        account_id,
        vec![inbox],
        raw_message("bob@example.com", "alice@example.com", "topic", "x"),
        vec![],
        1000,
    );
    params.store.seed_message(
        account_id,
        vec![inbox],
        raw_message("bob@example.com", "alice@example.com", "Re: topic", "x"),
        vec![],
        1001,
    );
    let other = params.store.seed_message(
        account_id,
        vec![inbox],
        raw_message("bob@example.com", "alice@example.com", "unrelated", "x"),
        vec![],
        1002,
    );

    let response = params
        .engine
        .get_message_list(request(r#"{"collapseThreads":true}"#), &token)
        .await
        .unwrap();
    assert_eq!(
        response.message_ids,
        vec![Id::from(first.id), Id::from(other.id)]
    );
}

#[tokio::test]
async fn lookup_alone_hides_messages_read_reveals_them() {
    let params = setup();
    let (alice_id, _) = params.account("alice@example.com");
    let (_, bob_token) = params.account("bob@example.com");
    let inbox = params.mailbox_with_role(alice_id, SpecialUse::Inbox).await;

    let message = params.store.seed_message(
        alice_id,
        vec![inbox],
        raw_message("carol@example.com", "alice@example.com", "secret", "x"),
        vec![],
        1000,
    );

    params.store.share_mailbox(
        alice_id,
        inbox,
        AclGrant::new(bob_token.primary_id, [Acl::Lookup]),
    );
    let response = params
        .engine
        .get_message_list(GetMessageListRequest::default(), &bob_token)
        .await
        .unwrap();
    assert!(response.message_ids.is_empty());

    params.store.share_mailbox(
        alice_id,
        inbox,
        AclGrant::new(bob_token.primary_id, [Acl::Lookup, Acl::Read]),
    );
    let response = params
        .engine
        .get_message_list(GetMessageListRequest::default(), &bob_token)
        .await
        .unwrap();
    assert_eq!(response.message_ids, vec![Id::from(message.id)]);
}
