//! ルーティングとハンドラ。
//! Djangoの `urls.py` + `views.py` に相当します。

pub mod todo;
