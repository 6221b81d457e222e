//! SeaORMのエンティティ定義。
//! Djangoの `models.py` に相当します。

pub mod prelude;
pub mod todo;
