//! API integration tests
//!
//! Run against a live server started with `RUN_MODE=test` (bootstrap
//! superuser admin/admin): `cargo test -- --ignored`

use chrono::{Duration, Local};
use reqwest::{redirect, Client, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

const BASE_URL: &str = "http://localhost:8080";

fn client() -> Client {
    Client::builder()
        .redirect(redirect::Policy::none())
        .cookie_store(true)
        .build()
        .expect("Failed to build client")
}

async fn login(client: &Client, login: &str, password: &str) -> String {
    let response = client
        .post(format!("{}/accounts/login/", BASE_URL))
        .json(&json!({ "login": login, "password": password }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

async fn admin_token(client: &Client) -> String {
    login(client, "admin", "admin").await
}

/// Create a user through the admin API and return (id, token)
async fn create_user(client: &Client, admin: &str, permissions: &[&str]) -> (i64, String) {
    let name = format!("reader-{}", &Uuid::new_v4().simple().to_string()[..8]);
    let response = client
        .post(format!("{}/admin/users/", BASE_URL))
        .bearer_auth(admin)
        .json(&json!({
            "login": name,
            "password": "password",
            "permissions": permissions,
        }))
        .send()
        .await
        .expect("Failed to create user");
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = response.json().await.expect("Failed to parse user");
    let id = body["id"].as_i64().expect("No user id");
    (id, login(client, &name, "password").await)
}

async fn admin_create(client: &Client, admin: &str, model: &str, body: Value) -> Value {
    let response = client
        .post(format!("{}/admin/{}/", BASE_URL, model))
        .bearer_auth(admin)
        .json(&body)
        .send()
        .await
        .expect("Failed to send admin create");
    assert_eq!(response.status(), StatusCode::CREATED, "create {}", model);
    response.json().await.expect("Failed to parse admin row")
}

/// A book with one copy on loan to `borrower_id`; returns (book id, copy id)
async fn lend_copy(client: &Client, admin: &str, borrower_id: i64) -> (i64, String) {
    lend_copy_due(client, admin, borrower_id, 3).await
}

/// As `lend_copy`, due back `days` from today
async fn lend_copy_due(client: &Client, admin: &str, borrower_id: i64, days: i64) -> (i64, String) {
    let genre = admin_create(client, admin, "genre", json!({ "name": "Science Fiction" })).await;
    let author = admin_create(
        client,
        admin,
        "author",
        json!({ "first_name": "Ursula", "last_name": "Le Guin" }),
    )
    .await;
    let book = admin_create(
        client,
        admin,
        "book",
        json!({
            "title": "The Dispossessed",
            "author_id": author["id"],
            "summary": "An ambiguous utopia.",
            "isbn": "9780061054884",
            "genre_ids": [genre["id"]],
        }),
    )
    .await;
    let copy = admin_create(
        client,
        admin,
        "bookinstance",
        json!({
            "book_id": book["id"],
            "imprint": "Harper, 1974",
            "status": "o",
            "due_back": (Local::now().date_naive() + Duration::days(days)).to_string(),
            "borrower_id": borrower_id,
        }),
    )
    .await;

    (
        book["id"].as_i64().expect("No book id"),
        copy["id"].as_str().expect("No copy id").to_string(),
    )
}

async fn get_json(client: &Client, token: &str, path: &str) -> Value {
    client
        .get(format!("{}{}", BASE_URL, path))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response")
}

fn object_ids(page: &Value) -> Vec<String> {
    page["object_list"]
        .as_array()
        .expect("No object_list")
        .iter()
        .map(|i| i["id"].as_str().expect("No id").to_string())
        .collect()
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let response = client()
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let response = client()
        .post(format!("{}/accounts/login/", BASE_URL))
        .json(&json!({ "login": "admin", "password": "wrong" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_visit_counter_is_per_session() {
    async fn visits(client: &Client) -> u64 {
        let body: Value = client
            .get(format!("{}/", BASE_URL))
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse response");
        assert!(body["num_books"].is_number());
        body["num_visits"].as_u64().expect("No num_visits")
    }

    let first = client();
    assert_eq!(visits(&first).await, 0);
    assert_eq!(visits(&first).await, 1);
    assert_eq!(visits(&first).await, 2);

    // A fresh cookie jar is a fresh session
    let second = client();
    assert_eq!(visits(&second).await, 0);
}

#[tokio::test]
#[ignore]
async fn test_borrowed_requires_login() {
    let response = client()
        .get(format!("{}/borrowed", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::FOUND);
    let location = response.headers()["location"].to_str().unwrap();
    assert!(location.starts_with("/accounts/login/"));
}

#[tokio::test]
#[ignore]
async fn test_mybooks_only_lists_own_loans() {
    let client = client();
    let admin = admin_token(&client).await;
    let (alice_id, alice) = create_user(&client, &admin, &[]).await;
    let (_, bob) = create_user(&client, &admin, &[]).await;
    let (_, copy_id) = lend_copy(&client, &admin, alice_id).await;

    let alice_loans: Value = client
        .get(format!("{}/mybooks/", BASE_URL))
        .bearer_auth(&alice)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let ids: Vec<_> = alice_loans["object_list"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_str().unwrap().to_string())
        .collect();
    assert!(ids.contains(&copy_id));

    let bob_loans: Value = client
        .get(format!("{}/mybooks/", BASE_URL))
        .bearer_auth(&bob)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(bob_loans["count"], 0);

    // Without the permission the full list is refused
    let response = client
        .get(format!("{}/borrowed", BASE_URL))
        .bearer_auth(&alice)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore]
async fn test_renewal_window() {
    let client = client();
    let admin = admin_token(&client).await;
    let (borrower_id, _) = create_user(&client, &admin, &[]).await;
    let (_, librarian) = create_user(&client, &admin, &["catalog.can_mark_returned"]).await;
    let (_, copy_id) = lend_copy(&client, &admin, borrower_id).await;
    let renew_url = format!("{}/book/{}/renew/", BASE_URL, copy_id);
    let today = Local::now().date_naive();

    let form: Value = client
        .get(&renew_url)
        .bearer_auth(&librarian)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(
        form["form"]["renewal_date"],
        (today + Duration::days(21)).to_string()
    );

    for (date, message) in [
        (today - Duration::days(1), "Invalid date - renewal in past"),
        (today + Duration::days(29), "Invalid date - renewal more than 4 weeks ahead"),
    ] {
        let response = client
            .post(&renew_url)
            .bearer_auth(&librarian)
            .form(&[("renewal_date", date.to_string())])
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = response.json().await.expect("Failed to parse response");
        assert_eq!(body["errors"]["renewal_date"][0], message);
    }

    let next_week = today + Duration::days(7);
    let response = client
        .post(&renew_url)
        .bearer_auth(&librarian)
        .form(&[("renewal_date", next_week.to_string())])
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/borrowed");

    let copy: Value = client
        .get(format!("{}/admin/bookinstance/{}/", BASE_URL, copy_id))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(copy["object"]["due_back"], next_week.to_string());
}

#[tokio::test]
#[ignore]
async fn test_author_delete_keeps_books() {
    let client = client();
    let admin = admin_token(&client).await;
    let (borrower_id, _) = create_user(&client, &admin, &[]).await;
    let (book_id, _) = lend_copy(&client, &admin, borrower_id).await;

    let book: Value = client
        .get(format!("{}/book/{}/", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let author_id = book["author"]["id"].as_i64().expect("No author");

    let response = client
        .post(format!("{}/author/{}/delete/", BASE_URL, author_id))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/authors/");

    let book: Value = client
        .get(format!("{}/book/{}/", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert!(book["author"].is_null());
}

#[tokio::test]
#[ignore]
async fn test_author_create_form() {
    let client = client();
    let admin = admin_token(&client).await;

    let form: Value = client
        .get(format!("{}/author/create/", BASE_URL))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(form["form"]["date_of_death"], "05/01/2018");

    let response = client
        .post(format!("{}/author/create/", BASE_URL))
        .bearer_auth(&admin)
        .form(&[
            ("first_name", "Octavia"),
            ("last_name", "Butler"),
            ("date_of_birth", "1947-06-22"),
            ("date_of_death", ""),
        ])
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response.headers()["location"].to_str().unwrap().to_string();
    assert!(location.starts_with("/author/"));

    let author: Value = client
        .get(format!("{}{}", BASE_URL, location))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(author["display"], "Butler (Octavia)");
    assert!(author["author"]["date_of_death"].is_null());
}

#[tokio::test]
#[ignore]
async fn test_loans_ordered_by_due_date() {
    let client = client();
    let admin = admin_token(&client).await;
    let (borrower_id, borrower) = create_user(&client, &admin, &[]).await;
    let (_, late) = lend_copy_due(&client, &admin, borrower_id, 10).await;
    let (_, soon) = lend_copy_due(&client, &admin, borrower_id, 2).await;

    let mine = get_json(&client, &borrower, "/mybooks/").await;
    assert_eq!(object_ids(&mine), vec![soon, late]);

    // The librarian list is ordered the same way, undated copies last
    let (_, librarian) = create_user(&client, &admin, &["catalog.can_mark_returned"]).await;
    let borrowed = get_json(&client, &librarian, "/borrowed").await;
    let due: Vec<Option<String>> = borrowed["object_list"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["due_back"].as_str().map(str::to_string))
        .collect();
    assert!(!due.is_empty());
    for pair in due.windows(2) {
        match (&pair[0], &pair[1]) {
            (Some(a), Some(b)) => assert!(a <= b, "{} after {}", a, b),
            (None, Some(b)) => panic!("undated copy listed before {}", b),
            _ => {}
        }
    }
}

#[tokio::test]
#[ignore]
async fn test_mybooks_excludes_copies_not_on_loan() {
    let client = client();
    let admin = admin_token(&client).await;
    let (borrower_id, borrower) = create_user(&client, &admin, &[]).await;
    let (book_id, on_loan) = lend_copy(&client, &admin, borrower_id).await;

    let reserved = admin_create(
        &client,
        &admin,
        "bookinstance",
        json!({
            "book_id": book_id,
            "imprint": "Harper, 1994",
            "status": "r",
            "due_back": (Local::now().date_naive() + Duration::days(5)).to_string(),
            "borrower_id": borrower_id,
        }),
    )
    .await;
    let available = admin_create(
        &client,
        &admin,
        "bookinstance",
        json!({
            "book_id": book_id,
            "imprint": "Harper, 2003",
            "status": "a",
            "borrower_id": borrower_id,
        }),
    )
    .await;

    let ids = object_ids(&get_json(&client, &borrower, "/mybooks/").await);
    assert_eq!(ids, vec![on_loan]);
    assert!(!ids.contains(&reserved["id"].as_str().unwrap().to_string()));
    assert!(!ids.contains(&available["id"].as_str().unwrap().to_string()));
}

#[tokio::test]
#[ignore]
async fn test_book_delete_keeps_copies() {
    let client = client();
    let admin = admin_token(&client).await;
    let (borrower_id, _) = create_user(&client, &admin, &[]).await;
    let (book_id, copy_id) = lend_copy(&client, &admin, borrower_id).await;

    let response = client
        .delete(format!("{}/admin/book/{}/", BASE_URL, book_id))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let copy = get_json(&client, &admin, &format!("/admin/bookinstance/{}/", copy_id)).await;
    assert_eq!(copy["object"]["id"], copy_id.as_str());
    assert!(copy["object"]["book_id"].is_null());
}

#[tokio::test]
#[ignore]
async fn test_book_create_ignores_repeated_genres() {
    let client = client();
    let admin = admin_token(&client).await;
    let genre = admin_create(&client, &admin, "genre", json!({ "name": "Poetry" })).await;

    let book = admin_create(
        &client,
        &admin,
        "book",
        json!({
            "title": "Leaves of Grass",
            "genre_ids": [genre["id"], genre["id"]],
        }),
    )
    .await;

    let detail = get_json(&client, &admin, &format!("/admin/book/{}/", book["id"])).await;
    assert_eq!(detail["object"]["genre"].as_array().unwrap().len(), 1);
}
