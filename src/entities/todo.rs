use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 優先度。
/// Djangoの `PRIORITY_CHOICES` に相当します。
/// DBには整数 (1: 低, 2: 中, 3: 高) で保存し、並び替えがそのまま `ORDER BY` で行えるようにしています。
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[sea_orm(num_value = 1)]
    Low,
    #[default]
    #[sea_orm(num_value = 2)]
    Medium,
    #[sea_orm(num_value = 3)]
    High,
}

/// 未知の優先度文字列
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown priority: {0:?}")]
pub struct InvalidPriority(pub String);

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    /// フォームの値 (`<option value>`)
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// 表示用ラベル (Django: get_priority_display)
    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl FromStr for Priority {
    type Err = InvalidPriority;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(InvalidPriority(s.to_owned())),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// TODOモデル。
/// Djangoの `models.Model` に相当します。
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "todo")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// TODOのタイトル (必須、最大200文字)
    pub title: String,

    /// 詳細な説明 (任意)。未入力は空文字列ではなく `None`
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// 期限日 (任意、タイムゾーンなし)
    pub due_date: Option<Date>,

    /// 完了状態
    pub is_resolved: bool,

    pub priority: Priority,

    /// 作成日時 (Django: auto_now_add)
    pub created_at: DateTimeWithTimeZone,

    /// 更新日時 (Django: auto_now)
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// 期限切れかどうか。
    /// 期限日が設定されていて、未完了で、期限日が `today` より前の場合に true。
    pub fn is_overdue(&self, today: Date) -> bool {
        match self.due_date {
            Some(due) if !self.is_resolved => due < today,
            _ => false,
        }
    }

    /// 詳細ページのURL (Django: get_absolute_url)
    pub fn absolute_url(&self) -> String {
        format!("/todo/{}/", self.id)
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

/// 一覧のデフォルト並び順。
/// Djangoの `Meta.ordering = ['is_resolved', '-priority', 'due_date', '-created_at']` に相当し、
/// 期限日なしは末尾、最後にIDの降順で全順序にしています。
pub fn listing_order(a: &Model, b: &Model) -> Ordering {
    a.is_resolved
        .cmp(&b.is_resolved)
        .then_with(|| b.priority.cmp(&a.priority))
        .then_with(|| match (a.due_date, b.due_date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| b.id.cmp(&a.id))
}
