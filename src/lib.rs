#[macro_use]
extern crate rocket;

use std::sync::Arc;

use rocket::fs::{relative, FileServer};
use rocket::Build;
use rocket_dyn_templates::Template;
use sea_orm::DbErr;

pub mod config;
pub mod controllers;
pub mod db;
pub mod entities;
pub mod errors;
pub mod fairings;
pub mod repository;
pub mod services;
pub mod validation;
pub mod views;

use config::Settings;
use repository::SeaOrmTodoRepository;
use services::TodoService;

/// サービスを受け取ってRocketインスタンスを構築する関数。
/// テスト時にはインメモリのリポジトリを渡せるように分離しています。
pub fn rocket_with_service(service: TodoService) -> rocket::Rocket<Build> {
    rocket::build()
        // Djangoの `request.db` のように、どのハンドラからでも参照可能にする
        .manage(service)
        .attach(Template::fairing())
        .attach(fairings::RequestLogger)
        .mount("/", controllers::todo::routes())
        .mount("/static", FileServer::from(relative!("static")))
}

/// データベースに接続してRocketインスタンスを構築する関数。
/// Djangoの `manage.py runserver` 起動時の初期化に相当します。
pub async fn build_rocket(settings: &Settings) -> Result<rocket::Rocket<Build>, DbErr> {
    // 1. データベース接続とマイグレーション
    let db = db::set_up_db(settings).await?;

    // 2. リポジトリをサービスに注入
    let repo = Arc::new(SeaOrmTodoRepository::new(db));

    // 3. Rocketインスタンスの構築
    Ok(rocket_with_service(TodoService::new(repo)))
}
