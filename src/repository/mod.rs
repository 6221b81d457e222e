//! TODOの永続化層。
//! Djangoの `Todo.objects` (Manager / QuerySet) に相当します。
//!
//! コントローラはこのトレイト越しにしかストアに触れないので、
//! 本番は SeaORM 実装、テストはインメモリ実装に差し替えられます。

use sea_orm::prelude::{Date, DateTimeWithTimeZone};
use sea_orm::DbErr;
use serde::Serialize;

use crate::entities::todo::{self, Priority};

pub mod database;
pub mod memory;

pub use database::SeaOrmTodoRepository;
pub use memory::InMemoryTodoRepository;

/// 1ページあたりの表示件数 (Django: paginate_by)
pub const PAGE_SIZE: u64 = 20;

/// 一覧の絞り込み条件 (`?filter=`)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKeyword {
    #[default]
    All,
    Active,
    Completed,
}

impl FilterKeyword {
    /// クエリパラメータを解釈します。未指定・未知の値はエラーにせず `All` として扱います。
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("all") => FilterKeyword::All,
            Some("active") => FilterKeyword::Active,
            Some("completed") => FilterKeyword::Completed,
            Some(other) => {
                tracing::debug!(filter = other, "unknown filter keyword, showing all");
                FilterKeyword::All
            }
        }
    }

    /// `is_resolved` の条件。`None` は絞り込みなし。
    pub fn is_resolved(self) -> Option<bool> {
        match self {
            FilterKeyword::All => None,
            FilterKeyword::Active => Some(false),
            FilterKeyword::Completed => Some(true),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FilterKeyword::All => "all",
            FilterKeyword::Active => "active",
            FilterKeyword::Completed => "completed",
        }
    }
}

/// 全件に対する集計 (フィルタやページとは無関係)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TodoCounts {
    pub total: u64,
    pub active: u64,
    pub completed: u64,
}

impl TodoCounts {
    /// フィルタ適用後の件数
    pub fn for_filter(&self, filter: FilterKeyword) -> u64 {
        match filter {
            FilterKeyword::All => self.total,
            FilterKeyword::Active => self.active,
            FilterKeyword::Completed => self.completed,
        }
    }
}

/// 新規作成するTODO。IDはストアが採番します。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewTodo {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<Date>,
    pub is_resolved: bool,
    pub priority: Priority,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

/// TODOリポジトリ。
/// 各操作は単一レコードに対してアトミックで、同時更新は後勝ちです。
#[rocket::async_trait]
pub trait TodoRepository: Send + Sync {
    /// 作成 (Django: `Todo.objects.create()`)
    async fn insert(&self, todo: NewTodo) -> Result<todo::Model, DbErr>;

    /// IDで取得 (Django: `Todo.objects.filter(pk=id).first()`)
    async fn find_by_id(&self, id: i32) -> Result<Option<todo::Model>, DbErr>;

    /// IDが一致するレコードを丸ごと上書きします。存在しなければ `None`。
    async fn update(&self, todo: todo::Model) -> Result<Option<todo::Model>, DbErr>;

    /// 削除。削除した場合は true。
    async fn delete(&self, id: i32) -> Result<bool, DbErr>;

    /// デフォルトの並び順で絞り込み・ページングした一覧。`page` は1始まり。
    async fn list(&self, filter: FilterKeyword, page: u64, per_page: u64) -> Result<Vec<todo::Model>, DbErr>;

    async fn counts(&self) -> Result<TodoCounts, DbErr>;
}
