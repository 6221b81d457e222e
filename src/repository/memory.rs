use std::collections::BTreeMap;

use rocket::tokio::sync::RwLock;
use sea_orm::DbErr;

use super::{FilterKeyword, NewTodo, TodoCounts, TodoRepository};
use crate::entities::todo::{self, listing_order};

/// メモリ上のリポジトリ実装。テストやDBなしでの動作確認用。
#[derive(Debug, Default)]
pub struct InMemoryTodoRepository {
    state: RwLock<State>,
}

#[derive(Debug, Default)]
struct State {
    last_id: i32,
    todos: BTreeMap<i32, todo::Model>,
}

impl InMemoryTodoRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[rocket::async_trait]
impl TodoRepository for InMemoryTodoRepository {
    async fn insert(&self, new: NewTodo) -> Result<todo::Model, DbErr> {
        let mut state = self.state.write().await;
        state.last_id += 1;
        let model = todo::Model {
            id: state.last_id,
            title: new.title,
            description: new.description,
            due_date: new.due_date,
            is_resolved: new.is_resolved,
            priority: new.priority,
            created_at: new.created_at,
            updated_at: new.updated_at,
        };
        state.todos.insert(model.id, model.clone());
        Ok(model)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<todo::Model>, DbErr> {
        Ok(self.state.read().await.todos.get(&id).cloned())
    }

    async fn update(&self, model: todo::Model) -> Result<Option<todo::Model>, DbErr> {
        let mut state = self.state.write().await;
        let Some(stored) = state.todos.get_mut(&model.id) else {
            return Ok(None);
        };
        let created_at = stored.created_at;
        *stored = todo::Model { created_at, ..model };
        Ok(Some(stored.clone()))
    }

    async fn delete(&self, id: i32) -> Result<bool, DbErr> {
        Ok(self.state.write().await.todos.remove(&id).is_some())
    }

    async fn list(&self, filter: FilterKeyword, page: u64, per_page: u64) -> Result<Vec<todo::Model>, DbErr> {
        let state = self.state.read().await;
        let mut todos: Vec<todo::Model> = state
            .todos
            .values()
            .filter(|t| filter.is_resolved().map_or(true, |resolved| t.is_resolved == resolved))
            .cloned()
            .collect();
        todos.sort_by(listing_order);

        let offset = page.saturating_sub(1).saturating_mul(per_page);
        Ok(todos
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(per_page).unwrap_or(usize::MAX))
            .collect())
    }

    async fn counts(&self) -> Result<TodoCounts, DbErr> {
        let state = self.state.read().await;
        let total = state.todos.len() as u64;
        let completed = state.todos.values().filter(|t| t.is_resolved).count() as u64;
        Ok(TodoCounts {
            total,
            active: total - completed,
            completed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::todo::Priority;
    use chrono::Utc;

    fn new_todo(title: &str, is_resolved: bool) -> NewTodo {
        let now = Utc::now().into();
        NewTodo {
            title: title.to_owned(),
            description: None,
            due_date: None,
            is_resolved,
            priority: Priority::Medium,
            created_at: now,
            updated_at: now,
        }
    }

    #[rocket::async_test]
    async fn test_ids_are_not_reused() {
        let repo = InMemoryTodoRepository::new();
        let first = repo.insert(new_todo("first", false)).await.unwrap();
        assert!(repo.delete(first.id).await.unwrap());

        let second = repo.insert(new_todo("second", false)).await.unwrap();
        assert_ne!(first.id, second.id);
    }

    #[rocket::async_test]
    async fn test_filter_and_counts() {
        let repo = InMemoryTodoRepository::new();
        repo.insert(new_todo("active", false)).await.unwrap();
        repo.insert(new_todo("done", true)).await.unwrap();
        repo.insert(new_todo("also active", false)).await.unwrap();

        assert_eq!(repo.list(FilterKeyword::Active, 1, 20).await.unwrap().len(), 2);
        assert_eq!(repo.list(FilterKeyword::Completed, 1, 20).await.unwrap().len(), 1);
        assert_eq!(
            repo.counts().await.unwrap(),
            TodoCounts { total: 3, active: 2, completed: 1 }
        );
        assert!(repo.list(FilterKeyword::All, 2, 20).await.unwrap().is_empty());
    }

    #[rocket::async_test]
    async fn test_update_keeps_created_at() {
        let repo = InMemoryTodoRepository::new();
        let original = repo.insert(new_todo("original", false)).await.unwrap();

        let mut changed = original.clone();
        changed.title = "changed".into();
        changed.created_at = Utc::now().into();
        let updated = repo.update(changed).await.unwrap().unwrap();

        assert_eq!(updated.title, "changed");
        assert_eq!(updated.created_at, original.created_at);
    }
}
