pub mod admin;
pub mod common;
pub mod geographic;
pub mod movie;
pub mod order;
pub mod pagination;
pub mod petition;
pub mod rating;
pub mod user;

pub use admin::*;
pub use common::*;
pub use geographic::*;
pub use movie::*;
pub use order::*;
pub use pagination::*;
pub use petition::*;
pub use rating::*;
pub use user::*;
