pub mod movie_purchases;
pub mod movie_ratings;
pub mod movies;
pub mod order_items;
pub mod orders;
pub mod petitions;
pub mod rating_aggregates;
pub mod regions;
pub mod reviews;
pub mod security_phrases;
pub mod trending_movies;
pub mod user_regions;
pub mod users;
pub mod votes;

pub use movie_purchases as movie_purchase_entity;
pub use movie_ratings as movie_rating_entity;
pub use movies as movie_entity;
pub use order_items as order_item_entity;
pub use orders as order_entity;
pub use petitions as petition_entity;
pub use rating_aggregates as rating_aggregate_entity;
pub use regions as region_entity;
pub use reviews as review_entity;
pub use security_phrases as security_phrase_entity;
pub use trending_movies as trending_movie_entity;
pub use user_regions as user_region_entity;
pub use users as user_entity;
pub use votes as vote_entity;
pub use votes::VoteType;
