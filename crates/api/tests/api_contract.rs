mod support;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use support::FakeApi;
use townhall_api::{AccountAction, Credentials, EventAction, Inbox, LicenseReview, ReviewAction};
use townhall_core::ClientError;
use townhall_core::Selection;
use townhall_core::listing::{CollectionSource, RemoteFilter, ResourceList};
use townhall_core::schema::{Role, VoteType};

#[test]
fn authenticated_requests_carry_token_header() {
    let api = FakeApi::spawn(|_| (200, "[]".to_string()));
    let client = api.client().with_token("abc123");

    client.complaints().fetch(&RemoteFilter::new()).expect("list");

    let requests = api.requests();
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].url, "/api/citizen/complaints/");
    assert_eq!(requests[0].authorization.as_deref(), Some("Token abc123"));
}

#[test]
fn public_endpoints_skip_token_header() {
    let api = FakeApi::spawn(|_| {
        (
            200,
            json!([{"id": 1, "name": "Parks", "contact_email": "parks@town.gov"}]).to_string(),
        )
    });
    let client = api.client().with_token("abc123");

    let departments = client.departments().fetch(&RemoteFilter::new()).expect("list");

    assert_eq!(departments[0].name, "Parks");
    assert_eq!(api.requests()[0].authorization, None);
}

#[test]
fn filters_become_query_parameters_without_all() {
    let api = FakeApi::spawn(|_| (200, "[]".to_string()));
    let client = api.client().with_token("t");

    let filter = RemoteFilter::new().status("all").priority("high").sort("votes");
    client.bills().fetch(&filter).expect("list");

    assert_eq!(
        api.requests()[0].url,
        "/api/government/bills/?priority=high&sort=votes"
    );
}

#[test]
fn server_error_message_is_surfaced_verbatim() {
    let api = FakeApi::spawn(|_| {
        (
            403,
            json!({"error": "Only government officials can create bill proposals"}).to_string(),
        )
    });
    let client = api.client().with_token("t");

    let err = client.bills().fetch(&RemoteFilter::new()).unwrap_err();

    assert_eq!(
        err,
        ClientError::server(403, "Only government officials can create bill proposals")
    );
}

#[test]
fn non_json_error_falls_back_to_generic_message() {
    let api = FakeApi::spawn(|_| (500, "Internal Server Error".to_string()));
    let client = api.client().with_token("t");

    let err = client.events().fetch(&RemoteFilter::new()).unwrap_err();

    assert_eq!(err.to_string(), "Request failed with status 500");
}

#[test]
fn unreachable_api_is_a_network_error() {
    let config = townhall_core::config::ClientConfig {
        base_url: "http://127.0.0.1:1/api".into(),
        timeout: Some(std::time::Duration::from_secs(2)),
        session_path: "unused.db".into(),
    };
    let client = townhall_api::ApiClient::new(&config).unwrap().with_token("t");

    let err = client.complaints().fetch(&RemoteFilter::new()).unwrap_err();
    assert!(err.is_network(), "expected network error, got {err:?}");
}

#[test]
fn login_posts_credentials_publicly() {
    let api = FakeApi::spawn(|_| {
        (
            200,
            json!({
                "token": "tok-9",
                "user": {"id": 3, "email": "ana@town.gov", "firstName": "Ana", "lastName": "Lee", "role": "government", "is_superuser": false}
            })
            .to_string(),
        )
    });
    let client = api.client();

    let login = client
        .login(&Credentials {
            email: "ana@town.gov",
            password: "secret",
            user_type: Role::Government,
        })
        .expect("login");

    assert_eq!(login.token, "tok-9");
    assert_eq!(login.user.role, Some(Role::Government));
    let req = &api.requests()[0];
    assert_eq!(req.url, "/api/auth/login/");
    assert_eq!(req.authorization, None);
    let body: Value = serde_json::from_str(&req.body).unwrap();
    assert_eq!(body["userType"], json!("government"));
}

#[test]
fn review_endpoints_post_actions() {
    let api = FakeApi::spawn(|_| (200, json!({"message": "ok"}).to_string()));
    let client = api.client().with_token("t");

    client
        .review_license(
            12,
            &LicenseReview {
                action: ReviewAction::Reject,
                review_comment: Some("Missing insurance".into()),
                fee: None,
                expiry_days: None,
            },
        )
        .expect("review license");
    client.review_event(4, EventAction::Approve).expect("review event");

    let requests = api.requests();
    assert_eq!(requests[0].url, "/api/government/licenses/12/review/");
    let body: Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(body, json!({"action": "reject", "review_comment": "Missing insurance"}));
    assert_eq!(requests[1].url, "/api/business/events/4/");
    assert_eq!(requests[1].body, json!({"action": "approve"}).to_string());
}

#[test]
fn delete_accepts_empty_no_content_reply() {
    let api = FakeApi::spawn(|_| (204, String::new()));
    let client = api.client().with_token("t");

    client.delete_bill(8).expect("delete");

    assert_eq!(api.requests()[0].method, "DELETE");
}

#[test]
fn fetch_one_without_detail_endpoint_searches_the_list() {
    let api = FakeApi::spawn(|_| {
        (
            200,
            json!([
                {"id": 1, "title": "Farmers market", "description": "", "status": "approved"},
                {"id": 2, "title": "Night run", "description": "", "status": "pending"}
            ])
            .to_string(),
        )
    });
    let client = api.client().with_token("t");

    let event = client.events().fetch_one(2).expect("event");
    assert_eq!(event.title, "Night run");

    let err = client.events().fetch_one(99).unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[test]
fn vote_is_reflected_by_follow_up_fetch() {
    let bill = Arc::new(Mutex::new(json!({
        "id": 5,
        "title": "Bike lanes",
        "description": "Protected lanes on Main St",
        "status": "published",
        "support_count": 4,
        "oppose_count": 1,
        "user_vote": null
    })));
    let state = Arc::clone(&bill);
    let api = FakeApi::spawn(move |req| {
        let mut bill = state.lock().unwrap();
        match (req.method.as_str(), req.url.as_str()) {
            ("POST", "/api/government/bills/5/vote/") => {
                let body: Value = serde_json::from_str(&req.body).unwrap();
                if bill["user_vote"].is_null() && body["vote_type"] == "support" {
                    let count = bill["support_count"].as_u64().unwrap();
                    bill["support_count"] = json!(count + 1);
                    bill["user_vote"] = json!("support");
                }
                (200, json!({"message": "Vote recorded"}).to_string())
            }
            ("GET", "/api/government/bills/5/") => (200, bill.to_string()),
            ("GET", "/api/government/bills/") => (200, json!([bill.clone()]).to_string()),
            _ => (404, json!({"error": "not found"}).to_string()),
        }
    });
    let client = api.client().with_token("t");
    let bills = client.bills();
    let mut list = ResourceList::new(RemoteFilter::new());
    list.refresh(&bills);
    assert_eq!(list.items()[0].user_vote, None);

    list.open_fresh(5, &bills).expect("open");
    list.submit(&bills, |_| client.vote_on_bill(5, VoteType::Support))
        .expect("vote");

    assert!(list.dialog().is_none());
    let refreshed = &list.items()[0];
    assert_eq!(refreshed.user_vote, Some(VoteType::Support));
    assert_eq!(refreshed.support_count, 5);

    let detail = bills.fetch_one(5).expect("detail");
    assert_eq!(detail.user_vote, Some(VoteType::Support));
    assert_eq!(detail.support_count, 5);

    let list_fetches = api
        .requests()
        .iter()
        .filter(|r| r.method == "GET" && r.url == "/api/government/bills/")
        .count();
    assert_eq!(list_fetches, 2);
}

#[test]
fn notifications_are_read_from_their_envelope() {
    let api = FakeApi::spawn(|req| match (req.method.as_str(), req.url.as_str()) {
        ("GET", url) if url.starts_with("/api/business/notifications/") => (
            200,
            json!({
                "notifications": [
                    {"id": 4, "type": "application_approved", "title": "License approved", "message": "Your food license is active", "is_read": false, "created_at": "2024-05-01 09:15", "related_license_id": 12}
                ],
                "unread_count": 1
            })
            .to_string(),
        ),
        ("PATCH", "/api/business/notifications/4/") => (
            200,
            json!({"message": "Notification marked as read"}).to_string(),
        ),
        _ => (404, json!({"error": "not found"}).to_string()),
    });
    let client = api.client().with_token("t");

    let filter = RemoteFilter::new().with("is_read", Selection::parse("false"));
    let inbox = client.notifications(Inbox::Business).fetch(&filter).expect("inbox");
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].kind, "application_approved");
    assert_eq!(inbox[0].related_license_id, Some(12));

    let ack = client
        .mark_notification_read(Inbox::Business, 4)
        .expect("mark read");
    assert_eq!(ack.message_or(""), "Notification marked as read");

    let requests = api.requests();
    assert_eq!(requests[0].url, "/api/business/notifications/?is_read=false");
    assert_eq!(requests[1].method, "PATCH");
}

#[test]
fn missing_envelope_is_a_decode_error() {
    let api = FakeApi::spawn(|_| (200, json!({"unread_count": 0}).to_string()));
    let client = api.client().with_token("t");

    let err = client
        .notifications(Inbox::Citizen)
        .fetch(&RemoteFilter::new())
        .unwrap_err();

    assert!(matches!(err, ClientError::Decode(_)));
}

#[test]
fn announcement_questions_and_answers_use_nested_paths() {
    let api = FakeApi::spawn(|req| match req.url.as_str() {
        "/api/government/announcements/3/questions/" if req.method == "GET" => (
            200,
            json!([{"id": 9, "question": "How long?", "is_answered": false, "citizen_name": "Sam Doe", "created_at": "2024-05-02 10:00"}])
                .to_string(),
        ),
        _ => (200, json!({"message": "Answer submitted successfully"}).to_string()),
    });
    let client = api.client().with_token("t");

    let questions = client.announcement_questions(3).expect("questions");
    assert_eq!(questions[0].question, "How long?");
    assert!(!questions[0].is_answered);

    client.answer_question(3, 9, "Two weeks").expect("answer");

    let requests = api.requests();
    assert_eq!(
        requests[1].url,
        "/api/government/announcements/3/questions/9/answers/"
    );
    assert_eq!(requests[1].body, json!({"answer": "Two weeks"}).to_string());
}

#[test]
fn account_actions_patch_the_user() {
    let api = FakeApi::spawn(|_| (200, json!({"message": "User approved successfully"}).to_string()));
    let client = api.client().with_token("t");

    client
        .update_account(8, AccountAction::Approve)
        .expect("approve");

    let req = &api.requests()[0];
    assert_eq!(req.method, "PATCH");
    assert_eq!(req.url, "/api/auth/users/8/");
    assert_eq!(req.body, json!({"status": "approved"}).to_string());
}
