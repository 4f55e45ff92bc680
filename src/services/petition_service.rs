use crate::entities::{VoteType, petition_entity as petitions, vote_entity as votes};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::icontains;
use crate::utils::{normalize_optional, validate_text_length};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use std::collections::HashMap;

pub const TITLE_MIN_LENGTH: usize = 5;
pub const TITLE_MAX_LENGTH: usize = 200;
pub const DESCRIPTION_MIN_LENGTH: usize = 20;
pub const MOVIE_TITLE_MAX_LENGTH: usize = 200;
pub const DIRECTOR_MAX_LENGTH: usize = 100;
pub const MIN_MOVIE_YEAR: i32 = 1900;
pub const MAX_MOVIE_YEAR: i32 = 2030;

#[derive(Clone)]
pub struct PetitionService {
    pool: DatabaseConnection,
}

impl PetitionService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 启用中的请愿，最新在前；搜索标题、电影名、导演、描述（忽略大小写）
    pub async fn list_petitions(&self, query: &PetitionQuery) -> AppResult<Vec<PetitionResponse>> {
        let mut select = petitions::Entity::find().filter(petitions::Column::IsActive.eq(true));

        if let Some(term) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            select = select.filter(
                Condition::any()
                    .add(icontains(petitions::Column::Title, term))
                    .add(icontains(petitions::Column::MovieTitle, term))
                    .add(icontains(petitions::Column::MovieDirector, term))
                    .add(icontains(petitions::Column::Description, term)),
            );
        }

        let rows = select
            .order_by_desc(petitions::Column::CreatedAt)
            .order_by_desc(petitions::Column::Id)
            .all(&self.pool)
            .await?;
        self.with_counts(rows).await
    }

    pub async fn create_petition(
        &self,
        user_id: i64,
        request: CreatePetitionRequest,
    ) -> AppResult<PetitionResponse> {
        let title = validate_text_length(&request.title, "Title", TITLE_MIN_LENGTH, TITLE_MAX_LENGTH)?;
        let description =
            validate_text_length(&request.description, "Description", DESCRIPTION_MIN_LENGTH, usize::MAX)?;
        let movie_title = validate_text_length(&request.movie_title, "Movie title", 1, MOVIE_TITLE_MAX_LENGTH)?;

        if let Some(year) = request.movie_year
            && !(MIN_MOVIE_YEAR..=MAX_MOVIE_YEAR).contains(&year)
        {
            return Err(AppError::ValidationError(format!(
                "Please enter a valid year between {MIN_MOVIE_YEAR} and {MAX_MOVIE_YEAR}."
            )));
        }

        let movie_director = normalize_optional(request.movie_director.as_deref());
        if let Some(director) = &movie_director
            && director.chars().count() > DIRECTOR_MAX_LENGTH
        {
            return Err(AppError::ValidationError(format!(
                "Movie director must be at most {DIRECTOR_MAX_LENGTH} characters long."
            )));
        }

        let now = Utc::now();
        let petition = petitions::ActiveModel {
            title: Set(title),
            description: Set(description),
            movie_title: Set(movie_title),
            movie_year: Set(request.movie_year),
            movie_director: Set(movie_director),
            created_by: Set(user_id),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!("Petition {} created by user {user_id}", petition.id);
        Ok(PetitionResponse::from_model(petition, VoteCounts::default()))
    }

    /// 请愿详情；viewer 为当前登录用户（可为空）
    pub async fn get_petition(
        &self,
        petition_id: i64,
        viewer_id: Option<i64>,
    ) -> AppResult<PetitionDetailResponse> {
        let petition = self.find_petition(petition_id).await?;
        let counts = self.vote_counts(petition_id).await?;

        let user_vote = match viewer_id {
            Some(uid) => self.find_vote(uid, petition_id).await?.map(|v| v.vote_type),
            None => None,
        };
        let has_voted = user_vote.is_some();
        let can_vote = viewer_id.is_some() && petition.is_active && !has_voted;

        Ok(PetitionDetailResponse {
            petition: PetitionResponse::from_model(petition, counts),
            has_voted,
            user_vote,
            can_vote,
        })
    }

    pub async fn has_user_voted(&self, user_id: i64, petition_id: i64) -> AppResult<bool> {
        Ok(self.find_vote(user_id, petition_id).await?.is_some())
    }

    /// 投票：每人每个请愿只能投一次，唯一索引兜底并发重复提交
    pub async fn vote(&self, user_id: i64, petition_id: i64, vote_type: VoteType) -> AppResult<VoteResponse> {
        const ALREADY_VOTED: &str = "You have already voted on this petition.";

        let petition = self.find_petition(petition_id).await?;
        if !petition.is_active {
            return Err(AppError::ValidationError(
                "This petition is no longer accepting votes.".to_string(),
            ));
        }
        if self.has_user_voted(user_id, petition_id).await? {
            return Err(AppError::Conflict(ALREADY_VOTED.to_string()));
        }

        votes::ActiveModel {
            user_id: Set(user_id),
            petition_id: Set(petition_id),
            vote_type: Set(vote_type),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.pool)
        .await
        .map_err(|e| AppError::from_unique_violation(e, ALREADY_VOTED))?;

        Ok(VoteResponse {
            petition_id,
            vote_type,
            votes: self.vote_counts(petition_id).await?,
        })
    }

    /// 当前用户发起的请愿（含已关闭的）
    pub async fn my_petitions(&self, user_id: i64) -> AppResult<Vec<PetitionResponse>> {
        let rows = petitions::Entity::find()
            .filter(petitions::Column::CreatedBy.eq(user_id))
            .order_by_desc(petitions::Column::CreatedAt)
            .order_by_desc(petitions::Column::Id)
            .all(&self.pool)
            .await?;
        self.with_counts(rows).await
    }

    async fn find_petition(&self, petition_id: i64) -> AppResult<petitions::Model> {
        petitions::Entity::find_by_id(petition_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Petition not found".to_string()))
    }

    async fn find_vote(&self, user_id: i64, petition_id: i64) -> AppResult<Option<votes::Model>> {
        Ok(votes::Entity::find()
            .filter(votes::Column::UserId.eq(user_id))
            .filter(votes::Column::PetitionId.eq(petition_id))
            .one(&self.pool)
            .await?)
    }

    async fn vote_counts(&self, petition_id: i64) -> AppResult<VoteCounts> {
        let map = self.count_votes(vec![petition_id]).await?;
        Ok(map.get(&petition_id).copied().unwrap_or_default())
    }

    /// 按请愿分组统计赞成/反对票
    async fn count_votes(&self, petition_ids: Vec<i64>) -> AppResult<HashMap<i64, VoteCounts>> {
        if petition_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(i64, VoteType, i64)> = votes::Entity::find()
            .select_only()
            .column(votes::Column::PetitionId)
            .column(votes::Column::VoteType)
            .column_as(Expr::col(votes::Column::Id).count(), "vote_count")
            .filter(votes::Column::PetitionId.is_in(petition_ids))
            .group_by(votes::Column::PetitionId)
            .group_by(votes::Column::VoteType)
            .into_tuple()
            .all(&self.pool)
            .await?;

        let mut tally: HashMap<i64, (i64, i64)> = HashMap::new();
        for (petition_id, vote_type, count) in rows {
            let entry = tally.entry(petition_id).or_default();
            match vote_type {
                VoteType::Yes => entry.0 += count,
                VoteType::No => entry.1 += count,
            }
        }

        Ok(tally
            .into_iter()
            .map(|(id, (yes, no))| (id, VoteCounts::new(yes, no)))
            .collect())
    }

    async fn with_counts(&self, rows: Vec<petitions::Model>) -> AppResult<Vec<PetitionResponse>> {
        let counts = self.count_votes(rows.iter().map(|p| p.id).collect()).await?;
        Ok(rows
            .into_iter()
            .map(|p| {
                let c = counts.get(&p.id).copied().unwrap_or_default();
                PetitionResponse::from_model(p, c)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{create_test_db, insert_user};
    use sea_orm::IntoActiveModel;

    fn request(title: &str, movie_title: &str, director: Option<&str>) -> CreatePetitionRequest {
        CreatePetitionRequest {
            title: title.to_string(),
            description: "Please add this classic to the catalog soon.".to_string(),
            movie_title: movie_title.to_string(),
            movie_year: Some(1950),
            movie_director: director.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_create_petition_validation() {
        let db = create_test_db().await;
        let user = insert_user(&db, "norma", false).await;
        let svc = PetitionService::new(db);

        let err = svc
            .create_petition(user.id, request("Add", "Rashomon", None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(msg) if msg == "Title must be at least 5 characters long."));

        let mut short = request("Add Rashomon", "Rashomon", None);
        short.description = "Too short".to_string();
        assert!(svc.create_petition(user.id, short).await.is_err());

        let mut bad_year = request("Add Rashomon", "Rashomon", None);
        bad_year.movie_year = Some(1899);
        assert!(svc.create_petition(user.id, bad_year).await.is_err());

        let created = svc
            .create_petition(user.id, request("  Add Rashomon  ", "Rashomon", Some("  ")))
            .await
            .unwrap();
        assert_eq!(created.title, "Add Rashomon");
        assert!(created.movie_director.is_none());
        assert_eq!(created.votes.total_votes, 0);
    }

    #[tokio::test]
    async fn test_vote_once_per_user() {
        let db = create_test_db().await;
        let author = insert_user(&db, "norma", false).await;
        let voter = insert_user(&db, "joe", false).await;
        let svc = PetitionService::new(db);

        let p = svc
            .create_petition(author.id, request("Add Rashomon", "Rashomon", Some("Akira Kurosawa")))
            .await
            .unwrap();

        assert!(!svc.has_user_voted(voter.id, p.id).await.unwrap());
        let res = svc.vote(voter.id, p.id, VoteType::Yes).await.unwrap();
        assert_eq!(res.votes, VoteCounts::new(1, 0));
        assert!(svc.has_user_voted(voter.id, p.id).await.unwrap());

        let err = svc.vote(voter.id, p.id, VoteType::No).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(msg) if msg == "You have already voted on this petition."));

        svc.vote(author.id, p.id, VoteType::No).await.unwrap();
        let detail = svc.get_petition(p.id, Some(voter.id)).await.unwrap();
        assert_eq!(detail.petition.votes, VoteCounts::new(1, 1));
        assert!(detail.has_voted);
        assert_eq!(detail.user_vote, Some(VoteType::Yes));
        assert!(!detail.can_vote);

        let anon = svc.get_petition(p.id, None).await.unwrap();
        assert!(!anon.has_voted);
        assert!(!anon.can_vote);
    }

    #[tokio::test]
    async fn test_duplicate_vote_row_maps_to_conflict() {
        let db = create_test_db().await;
        let user = insert_user(&db, "norma", false).await;
        let svc = PetitionService::new(db.clone());
        let p = svc
            .create_petition(user.id, request("Add Rashomon", "Rashomon", None))
            .await
            .unwrap();
        svc.vote(user.id, p.id, VoteType::Yes).await.unwrap();

        // 绕过 has_user_voted，直接撞唯一索引（并发提交的情形）
        let err = votes::ActiveModel {
            user_id: Set(user.id),
            petition_id: Set(p.id),
            vote_type: Set(VoteType::No),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "dup"))
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict(msg) if msg == "dup"));
        assert_eq!(svc.vote_counts(p.id).await.unwrap(), VoteCounts::new(1, 0));
    }

    #[tokio::test]
    async fn test_inactive_petition_rejects_votes() {
        let db = create_test_db().await;
        let user = insert_user(&db, "norma", false).await;
        let svc = PetitionService::new(db.clone());
        let p = svc
            .create_petition(user.id, request("Add Rashomon", "Rashomon", None))
            .await
            .unwrap();

        let model = petitions::Entity::find_by_id(p.id).one(&db).await.unwrap().unwrap();
        let mut am = model.into_active_model();
        am.is_active = Set(false);
        am.update(&db).await.unwrap();

        let err = svc.vote(user.id, p.id, VoteType::Yes).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert!(svc.list_petitions(&PetitionQuery::default()).await.unwrap().is_empty());
        assert_eq!(svc.my_petitions(user.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_search_petitions() {
        let db = create_test_db().await;
        let user = insert_user(&db, "norma", false).await;
        let svc = PetitionService::new(db);
        svc.create_petition(user.id, request("Add Rashomon", "Rashomon", Some("Akira Kurosawa")))
            .await
            .unwrap();
        svc.create_petition(user.id, request("Add Metropolis", "Metropolis", Some("Fritz Lang")))
            .await
            .unwrap();

        let found = svc
            .list_petitions(&PetitionQuery { search: Some("kurosawa".into()) })
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].movie_title, "Rashomon");

        let all = svc.list_petitions(&PetitionQuery::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].movie_title, "Metropolis");

        // `_` 按字面匹配，不是单字符通配
        svc.create_petition(user.id, request("Add Wall_E", "Wall_E", None))
            .await
            .unwrap();
        let found = svc
            .list_petitions(&PetitionQuery { search: Some("_".into()) })
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].movie_title, "Wall_E");
    }
}
