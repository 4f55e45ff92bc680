use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct RebuildAggregatesResponse {
    pub movies_updated: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrendingRefreshResponse {
    pub regions: usize,
    pub rows_written: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SeedRegionsResponse {
    pub created: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SampleRatingsResponse {
    pub users: usize,
    pub ratings_created: usize,
    pub movies_updated: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SamplePurchasesResponse {
    pub username: String,
    pub region_code: String,
    pub purchases_created: usize,
    pub trending_rows: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RealisticPurchasesResponse {
    pub users: usize,
    pub regions: usize,
    pub purchases_created: usize,
    pub trending_rows: usize,
}
