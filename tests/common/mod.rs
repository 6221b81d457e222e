use rocket::http::{ContentType, Status};
use rocket::local::asynchronous::Client;
use rust_django_todo::build_rocket;
use rust_django_todo::config::Settings;

/// テストごとに新しいインメモリSQLiteでアプリを起動する。
/// マイグレーションも毎回実行されるので、テスト間でデータは共有されない。
pub async fn setup() -> Client {
    let rocket = build_rocket(&Settings::in_memory())
        .await
        .expect("in-memory database");
    Client::tracked(rocket).await.expect("valid rocket instance")
}

/// フォームをPOSTしてステータスを返す
pub async fn post_form(client: &Client, uri: &str, body: &str) -> Status {
    client
        .post(uri)
        .header(ContentType::Form)
        .body(body.to_owned())
        .dispatch()
        .await
        .status()
}

/// GETしてステータスと本文を返す
pub async fn get_page(client: &Client, uri: &str) -> (Status, String) {
    let response = client.get(uri).dispatch().await;
    let status = response.status();
    let body = response.into_string().await.unwrap_or_default();
    (status, body)
}
