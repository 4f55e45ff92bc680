pub mod auth_service;
pub mod movie_service;
pub mod order_service;
pub mod petition_service;
pub mod rating_calculator;
pub mod rating_service;
pub mod region_service;
pub mod sample_data_service;
pub mod trending_calculator;
pub mod trending_service;
pub mod user_service;

pub use auth_service::*;
pub use movie_service::*;
pub use order_service::*;
pub use petition_service::*;
pub use rating_service::*;
pub use region_service::*;
pub use sample_data_service::*;
pub use trending_service::*;
pub use user_service::*;

use sea_orm::sea_query::{Expr, Func, IntoColumnRef, LikeExpr, SimpleExpr};

/// `lower(col) LIKE '%term%'`（忽略大小写的包含匹配），term 中的 `%` `_` `\` 按字面匹配
pub(crate) fn icontains<C: IntoColumnRef>(col: C, term: &str) -> SimpleExpr {
    let escaped = term
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    Expr::expr(Func::lower(Expr::col(col))).like(LikeExpr::new(format!("%{escaped}%")).escape('\\'))
}
