use sea_orm::sea_query::NullOrdering;
use sea_orm::*;

use super::{FilterKeyword, NewTodo, TodoCounts, TodoRepository};
use crate::entities::{prelude::*, todo};

/// SeaORMによるリポジトリ実装
#[derive(Clone, Debug)]
pub struct SeaOrmTodoRepository {
    db: DatabaseConnection,
}

impl SeaOrmTodoRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// `Meta.ordering` をSQLで表現したもの
fn ordered(query: Select<Todo>) -> Select<Todo> {
    query
        .order_by_asc(todo::Column::IsResolved)
        .order_by_desc(todo::Column::Priority)
        .order_by_with_nulls(todo::Column::DueDate, Order::Asc, NullOrdering::Last)
        .order_by_desc(todo::Column::CreatedAt)
        .order_by_desc(todo::Column::Id)
}

#[rocket::async_trait]
impl TodoRepository for SeaOrmTodoRepository {
    async fn insert(&self, new: NewTodo) -> Result<todo::Model, DbErr> {
        let active_model = todo::ActiveModel {
            title: Set(new.title),
            description: Set(new.description),
            due_date: Set(new.due_date),
            is_resolved: Set(new.is_resolved),
            priority: Set(new.priority),
            created_at: Set(new.created_at),
            updated_at: Set(new.updated_at),
            ..Default::default()
        };
        active_model.insert(&self.db).await
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<todo::Model>, DbErr> {
        Todo::find_by_id(id).one(&self.db).await
    }

    async fn update(&self, model: todo::Model) -> Result<Option<todo::Model>, DbErr> {
        // created_at は作成時から変更しない
        let active_model = todo::ActiveModel {
            id: ActiveValue::Unchanged(model.id),
            title: Set(model.title),
            description: Set(model.description),
            due_date: Set(model.due_date),
            is_resolved: Set(model.is_resolved),
            priority: Set(model.priority),
            created_at: ActiveValue::Unchanged(model.created_at),
            updated_at: Set(model.updated_at),
        };

        match active_model.update(&self.db).await {
            Ok(updated) => Ok(Some(updated)),
            Err(DbErr::RecordNotUpdated) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn delete(&self, id: i32) -> Result<bool, DbErr> {
        let result = Todo::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }

    async fn list(&self, filter: FilterKeyword, page: u64, per_page: u64) -> Result<Vec<todo::Model>, DbErr> {
        let mut query = Todo::find();
        if let Some(resolved) = filter.is_resolved() {
            query = query.filter(todo::Column::IsResolved.eq(resolved));
        }

        // 範囲外のページは空の Vec になる。
        // OFFSET は i64 に収まる必要があるので、溢れるページはクエリせずに返す。
        let page_index = page.saturating_sub(1);
        let fits = page_index
            .checked_mul(per_page)
            .is_some_and(|offset| i64::try_from(offset).is_ok());
        if !fits {
            return Ok(Vec::new());
        }

        ordered(query).paginate(&self.db, per_page).fetch_page(page_index).await
    }

    async fn counts(&self) -> Result<TodoCounts, DbErr> {
        let total = Todo::find().count(&self.db).await?;
        let active = Todo::find()
            .filter(todo::Column::IsResolved.eq(false))
            .count(&self.db)
            .await?;
        let completed = Todo::find()
            .filter(todo::Column::IsResolved.eq(true))
            .count(&self.db)
            .await?;

        Ok(TodoCounts { total, active, completed })
    }
}
