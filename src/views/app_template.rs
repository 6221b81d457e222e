use std::borrow::Cow;
use rocket::request::Request;
use rocket::response::{Responder, Result};
use rocket::serde::json::serde_json;
use rocket_dyn_templates::Template;

use crate::services::TodoService;

/// テンプレート共通のアプリ名
pub const APP_NAME: &str = "TODO App";

/// アプリケーション標準のテンプレートレスポンダー。
/// Djangoの `context_processors` のように、共通のコンテキスト（アプリ名、現在のパス、今日の日付）を自動注入します。
pub struct AppTemplate {
    pub name: Cow<'static, str>,
    pub context: serde_json::Value,
}

impl AppTemplate {
    pub fn new<N, C>(name: N, context: C) -> Self
    where
        N: Into<Cow<'static, str>>,
        C: serde::Serialize,
    {
        AppTemplate {
            name: name.into(),
            context: serde_json::to_value(context).unwrap_or(serde_json::json!({})),
        }
    }
}

impl<'r> Responder<'r, 'static> for AppTemplate {
    fn respond_to(self, request: &'r Request<'_>) -> Result<'static> {
        // 1. グローバルコンテキストの準備
        let mut global_context = serde_json::Map::new();
        global_context.insert("app_name".into(), APP_NAME.into());
        global_context.insert("request_path".into(), request.uri().path().as_str().into());
        global_context.insert("today".into(), TodoService::today().to_string().into());

        // 2. マージ (Local Context overrides Global)
        let mut final_context = global_context;
        if let serde_json::Value::Object(local_map) = self.context {
            for (k, v) in local_map {
                final_context.insert(k, v);
            }
        }

        // 3. Templateに委譲
        let template = Template::render(self.name, serde_json::Value::Object(final_context));
        template.respond_to(request)
    }
}
