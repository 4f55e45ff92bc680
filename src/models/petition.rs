use crate::entities::{VoteType, petition_entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatePetitionRequest {
    #[schema(example = "Bring back classic noir")]
    pub title: String,
    pub description: String,
    #[schema(example = "Double Indemnity")]
    pub movie_title: String,
    #[schema(example = 1944)]
    pub movie_year: Option<i32>,
    #[schema(example = "Billy Wilder")]
    pub movie_director: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
pub struct PetitionQuery {
    pub search: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VoteRequest {
    pub vote_type: VoteType,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VoteCounts {
    pub yes_votes: i64,
    pub no_votes: i64,
    pub total_votes: i64,
}

impl VoteCounts {
    pub fn new(yes_votes: i64, no_votes: i64) -> Self {
        Self {
            yes_votes,
            no_votes,
            total_votes: yes_votes + no_votes,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PetitionResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub movie_title: String,
    pub movie_year: Option<i32>,
    pub movie_director: Option<String>,
    pub created_by: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub votes: VoteCounts,
}

impl PetitionResponse {
    pub fn from_model(m: petition_entity::Model, votes: VoteCounts) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            movie_title: m.movie_title,
            movie_year: m.movie_year,
            movie_director: m.movie_director,
            created_by: m.created_by,
            is_active: m.is_active,
            created_at: m.created_at,
            updated_at: m.updated_at,
            votes,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PetitionDetailResponse {
    pub petition: PetitionResponse,
    pub has_voted: bool,
    pub user_vote: Option<VoteType>,
    pub can_vote: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VoteResponse {
    pub petition_id: i64,
    pub vote_type: VoteType,
    pub votes: VoteCounts,
}
