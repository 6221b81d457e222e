use std::time::Instant;

use rocket::fairing::{Fairing, Info, Kind};
use rocket::{Data, Request, Response};

/// リクエストごとのアクセスログを出力するFairing。
/// Djangoの `django.request` ロガー / runserver のアクセスログに相当します。
pub struct RequestLogger;

/// リクエスト開始時刻 (local_cache 用)
#[derive(Clone, Copy)]
struct RequestStart(Option<Instant>);

#[rocket::async_trait]
impl Fairing for RequestLogger {
    fn info(&self) -> Info {
        Info {
            name: "Request Logger",
            kind: Kind::Request | Kind::Response,
        }
    }

    async fn on_request(&self, request: &mut Request<'_>, _data: &mut Data<'_>) {
        request.local_cache(|| RequestStart(Some(Instant::now())));
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        let elapsed_ms = request
            .local_cache(|| RequestStart(None))
            .0
            .map(|start| start.elapsed().as_millis() as u64)
            .unwrap_or_default();
        let status = response.status();

        if status.code >= 500 {
            tracing::error!(method = %request.method(), path = %request.uri().path(), status = status.code, elapsed_ms, "request failed");
        } else {
            tracing::info!(method = %request.method(), path = %request.uri().path(), status = status.code, elapsed_ms, "request");
        }
    }
}
