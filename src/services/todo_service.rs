use std::sync::Arc;

use chrono::{Local, NaiveDate, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::Serialize;

use crate::entities::todo;
use crate::errors::AppError;
use crate::repository::{FilterKeyword, NewTodo, TodoCounts, TodoRepository, PAGE_SIZE};
use crate::validation::{validate, TodoForm};

/// TODOのビジネスロジックを集約するサービス。
/// Djangoの汎用ビュー (ListView, CreateView, UpdateView, DeleteView) が内部で行っている処理を
/// 明示的な関数として持ちます。HTTPやテンプレートには依存しません。
#[derive(Clone)]
pub struct TodoService {
    repo: Arc<dyn TodoRepository>,
}

/// 一覧の結果。件数は常に全件に対する値です。
#[derive(Debug, Clone, Serialize)]
pub struct TodoListing {
    pub todos: Vec<todo::Model>,
    pub filter: FilterKeyword,
    pub counts: TodoCounts,
    pub page: u64,
    pub num_pages: u64,
}

impl TodoListing {
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.num_pages
    }
}

/// トグル後の状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleStatus {
    Completed,
    Reopened,
}

impl ToggleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ToggleStatus::Completed => "completed",
            ToggleStatus::Reopened => "reopened",
        }
    }
}

impl TodoService {
    pub fn new(repo: Arc<dyn TodoRepository>) -> Self {
        Self { repo }
    }

    /// 期限判定に使う「今日」 (Django: `timezone.now().date()`)
    pub fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    fn now() -> DateTimeWithTimeZone {
        Utc::now().into()
    }

    /// 一覧 (Django: `TodoListView.get_queryset` + `get_context_data`)
    pub async fn list(&self, filter: FilterKeyword, page: Option<u64>) -> Result<TodoListing, AppError> {
        let page = page.unwrap_or(1).max(1);
        let counts = self.repo.counts().await?;
        let num_pages = counts.for_filter(filter).div_ceil(PAGE_SIZE).max(1);
        // 最終ページより後ろは問い合わせるまでもなく空
        let todos = if page > num_pages {
            Vec::new()
        } else {
            self.repo.list(filter, page, PAGE_SIZE).await?
        };

        Ok(TodoListing {
            todos,
            filter,
            counts,
            page,
            num_pages,
        })
    }

    /// 詳細取得 (Django: `get_object_or_404`)
    pub async fn get(&self, id: i32) -> Result<todo::Model, AppError> {
        self.repo.find_by_id(id).await?.ok_or(AppError::NotFound)
    }

    /// 作成 (Django: `TodoCreateView.form_valid`)
    pub async fn create(&self, form: &TodoForm) -> Result<todo::Model, AppError> {
        let validated = validate(form, true, Self::today()).map_err(|errors| {
            tracing::warn!(%errors, "todo create rejected");
            AppError::Validation(errors)
        })?;

        let now = Self::now();
        let created = self
            .repo
            .insert(NewTodo {
                title: validated.title,
                description: validated.description,
                due_date: validated.due_date,
                is_resolved: validated.is_resolved,
                priority: validated.priority,
                created_at: now,
                updated_at: now,
            })
            .await?;

        tracing::info!(id = created.id, title = %created.title, "todo created");
        Ok(created)
    }

    /// 更新 (Django: `TodoUpdateView.form_valid`)。
    /// 期限日の過去チェックは行いません。
    pub async fn update(&self, id: i32, form: &TodoForm) -> Result<todo::Model, AppError> {
        let existing = self.get(id).await?;
        let validated = validate(form, false, Self::today()).map_err(|errors| {
            tracing::warn!(id, %errors, "todo update rejected");
            AppError::Validation(errors)
        })?;

        let changed = todo::Model {
            title: validated.title,
            description: validated.description,
            due_date: validated.due_date,
            is_resolved: validated.is_resolved,
            priority: validated.priority,
            updated_at: Self::now().max(existing.created_at),
            ..existing
        };

        let updated = self.repo.update(changed).await?.ok_or(AppError::NotFound)?;
        tracing::info!(id, "todo updated");
        Ok(updated)
    }

    /// 削除 (Django: `TodoDeleteView.delete`)。存在しないIDは `NotFound`。
    pub async fn delete(&self, id: i32) -> Result<(), AppError> {
        if !self.repo.delete(id).await? {
            return Err(AppError::NotFound);
        }
        tracing::info!(id, "todo deleted");
        Ok(())
    }

    /// 完了/未完了の切り替え (Django: `toggle_todo`)
    pub async fn toggle(&self, id: i32) -> Result<(todo::Model, ToggleStatus), AppError> {
        let existing = self.get(id).await?;
        let changed = todo::Model {
            is_resolved: !existing.is_resolved,
            updated_at: Self::now().max(existing.created_at),
            ..existing
        };

        let updated = self.repo.update(changed).await?.ok_or(AppError::NotFound)?;
        let status = if updated.is_resolved {
            ToggleStatus::Completed
        } else {
            ToggleStatus::Reopened
        };
        tracing::info!(id, status = status.as_str(), "todo toggled");
        Ok((updated, status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::todo::Priority;
    use crate::repository::InMemoryTodoRepository;
    use crate::validation::FieldError;
    use chrono::Duration;
    use std::time::Duration as StdDuration;

    fn service() -> TodoService {
        TodoService::new(Arc::new(InMemoryTodoRepository::new()))
    }

    fn form(title: &str) -> TodoForm {
        TodoForm {
            title: title.to_owned(),
            ..Default::default()
        }
    }

    async fn titles(service: &TodoService, filter: FilterKeyword) -> Vec<String> {
        service
            .list(filter, None)
            .await
            .unwrap()
            .todos
            .into_iter()
            .map(|t| t.title)
            .collect()
    }

    #[rocket::async_test]
    async fn test_create_sets_defaults_and_timestamps() {
        let service = service();
        let todo = service.create(&form("Minimal TODO")).await.unwrap();

        assert_eq!(todo.priority, Priority::Medium);
        assert!(!todo.is_resolved);
        assert!(todo.description.is_none());
        assert!(todo.due_date.is_none());
        assert_eq!(todo.created_at, todo.updated_at);
    }

    #[rocket::async_test]
    async fn test_create_with_empty_title_persists_nothing() {
        let service = service();
        let err = service.create(&form("")).await.unwrap_err();

        match err {
            AppError::Validation(errors) => assert_eq!(errors.get("title"), &[FieldError::Required]),
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(service.list(FilterKeyword::All, None).await.unwrap().counts.total, 0);
    }

    #[rocket::async_test]
    async fn test_create_due_date_rule() {
        let service = service();
        let today = TodoService::today();

        let mut past = form("Past");
        past.due_date = (today - Duration::days(1)).to_string();
        assert!(matches!(service.create(&past).await, Err(AppError::Validation(_))));

        let mut due_today = form("Today");
        due_today.due_date = today.to_string();
        let created = service.create(&due_today).await.unwrap();
        assert_eq!(created.due_date, Some(today));
    }

    #[rocket::async_test]
    async fn test_update_allows_past_due_date() {
        let service = service();
        let todo = service.create(&form("Editable")).await.unwrap();

        let mut edit = form("Edited");
        edit.due_date = (TodoService::today() - Duration::days(1)).to_string();
        edit.priority = "high".into();
        let updated = service.update(todo.id, &edit).await.unwrap();

        assert_eq!(updated.title, "Edited");
        assert_eq!(updated.priority, Priority::High);
        assert!(updated.is_overdue(TodoService::today()));
        assert_eq!(updated.created_at, todo.created_at);
        assert!(updated.updated_at >= updated.created_at);
    }

    #[rocket::async_test]
    async fn test_invalid_update_leaves_record_unchanged() {
        let service = service();
        let todo = service.create(&form("Keep me")).await.unwrap();

        assert!(matches!(service.update(todo.id, &form("  ")).await, Err(AppError::Validation(_))));
        assert_eq!(service.get(todo.id).await.unwrap(), todo);
    }

    #[rocket::async_test]
    async fn test_missing_ids_are_not_found() {
        let service = service();
        assert!(matches!(service.get(99).await, Err(AppError::NotFound)));
        assert!(matches!(service.update(99, &form("x")).await, Err(AppError::NotFound)));
        assert!(matches!(service.toggle(99).await, Err(AppError::NotFound)));
        assert!(matches!(service.delete(99).await, Err(AppError::NotFound)));
    }

    #[rocket::async_test]
    async fn test_toggle_twice() {
        let service = service();
        let todo = service.create(&form("Toggle me")).await.unwrap();

        rocket::tokio::time::sleep(StdDuration::from_millis(5)).await;
        let (first, status) = service.toggle(todo.id).await.unwrap();
        assert!(first.is_resolved);
        assert_eq!(status, ToggleStatus::Completed);
        assert!(first.updated_at > todo.updated_at);

        rocket::tokio::time::sleep(StdDuration::from_millis(5)).await;
        let (second, status) = service.toggle(todo.id).await.unwrap();
        assert!(!second.is_resolved);
        assert_eq!(status, ToggleStatus::Reopened);
        assert!(second.updated_at > first.updated_at);
        assert_eq!(second.created_at, todo.created_at);
    }

    #[rocket::async_test]
    async fn test_delete_then_get() {
        let service = service();
        let todo = service.create(&form("Delete me")).await.unwrap();

        service.delete(todo.id).await.unwrap();
        assert!(matches!(service.get(todo.id).await, Err(AppError::NotFound)));
        assert!(matches!(service.delete(todo.id).await, Err(AppError::NotFound)));
    }

    #[rocket::async_test]
    async fn test_counts_ignore_filter_and_page() {
        let service = service();
        let done = service.create(&form("Completed TODO")).await.unwrap();
        service.toggle(done.id).await.unwrap();
        service.create(&form("Active TODO")).await.unwrap();

        for filter in [FilterKeyword::All, FilterKeyword::Active, FilterKeyword::Completed] {
            for page in [None, Some(1), Some(7)] {
                let listing = service.list(filter, page).await.unwrap();
                assert_eq!(listing.counts, TodoCounts { total: 2, active: 1, completed: 1 });
            }
        }

        let beyond = service.list(FilterKeyword::All, Some(7)).await.unwrap();
        assert!(beyond.todos.is_empty());
        assert_eq!(beyond.page, 7);
        assert_eq!(beyond.num_pages, 1);
    }

    #[rocket::async_test]
    async fn test_huge_page_is_empty_listing() {
        let service = service();
        service.create(&form("Only")).await.unwrap();

        let listing = service.list(FilterKeyword::All, Some(u64::MAX)).await.unwrap();
        assert!(listing.todos.is_empty());
        assert_eq!(listing.page, u64::MAX);
        assert_eq!(listing.counts.total, 1);
        assert!(listing.has_previous());
        assert!(!listing.has_next());
    }

    #[rocket::async_test]
    async fn test_pages_below_one_are_first_page() {
        let service = service();
        service.create(&form("Only")).await.unwrap();

        let listing = service.list(FilterKeyword::All, Some(0)).await.unwrap();
        assert_eq!(listing.page, 1);
        assert_eq!(listing.todos.len(), 1);
        assert!(!listing.has_previous());
        assert!(!listing.has_next());
    }

    #[rocket::async_test]
    async fn test_num_pages_follows_filter() {
        let service = service();
        for i in 0..21 {
            service.create(&form(&format!("todo {}", i))).await.unwrap();
        }

        let all = service.list(FilterKeyword::All, None).await.unwrap();
        assert_eq!(all.num_pages, 2);
        assert!(all.has_next());
        assert_eq!(all.todos.len(), 20);

        let completed = service.list(FilterKeyword::Completed, None).await.unwrap();
        assert_eq!(completed.num_pages, 1);
        assert!(completed.todos.is_empty());
    }

    #[rocket::async_test]
    async fn test_end_to_end_lifecycle() {
        let service = service();
        let mut input = form("Buy milk");
        input.priority = "high".into();
        let todo = service.create(&input).await.unwrap();

        assert_eq!(titles(&service, FilterKeyword::All).await, vec!["Buy milk"]);
        assert_eq!(titles(&service, FilterKeyword::Active).await, vec!["Buy milk"]);
        assert!(titles(&service, FilterKeyword::Completed).await.is_empty());

        service.toggle(todo.id).await.unwrap();
        assert!(titles(&service, FilterKeyword::Active).await.is_empty());
        assert_eq!(titles(&service, FilterKeyword::Completed).await, vec!["Buy milk"]);

        service.delete(todo.id).await.unwrap();
        for filter in [FilterKeyword::All, FilterKeyword::Active, FilterKeyword::Completed] {
            assert!(titles(&service, filter).await.is_empty());
        }
    }
}
