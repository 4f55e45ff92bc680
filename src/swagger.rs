use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::VoteType;
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::signup,
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::auth::logout,
        handlers::auth::forgot_password,
        handlers::auth::get_security_question,
        handlers::auth::answer_security_question,
        handlers::auth::reset_password,
        handlers::account::get_profile,
        handlers::account::get_security_phrase,
        handlers::account::set_security_phrase,
        handlers::account::get_orders,
        handlers::movie::list_movies,
        handlers::movie::get_movie,
        handlers::movie::create_movie,
        handlers::movie::update_movie,
        handlers::movie::delete_movie,
        handlers::movie::list_reviews,
        handlers::movie::create_review,
        handlers::movie::update_review,
        handlers::movie::delete_review,
        handlers::order::checkout,
        handlers::order::get_orders,
        handlers::rating::submit_rating,
        handlers::rating::delete_rating,
        handlers::rating::get_movie_ratings,
        handlers::rating::get_movie_analytics,
        handlers::rating::top_rated,
        handlers::rating::most_rated,
        handlers::rating::recent_ratings,
        handlers::rating::my_ratings,
        handlers::geographic::list_regions,
        handlers::geographic::trending_all,
        handlers::geographic::region_trending,
        handlers::geographic::region_snapshot,
        handlers::geographic::get_user_region,
        handlers::geographic::set_user_region,
        handlers::petition::list_petitions,
        handlers::petition::create_petition,
        handlers::petition::get_petition,
        handlers::petition::vote,
        handlers::petition::my_petitions,
        handlers::admin::rebuild_rating_aggregates,
        handlers::admin::refresh_trending,
        handlers::admin::seed_regions,
        handlers::admin::generate_sample_ratings,
        handlers::admin::generate_sample_purchases,
        handlers::admin::generate_realistic_purchases,
    ),
    components(
        schemas(
            ApiError,
            LimitQuery,
            PaginationParams,
            SignupRequest,
            LoginRequest,
            RefreshTokenRequest,
            UserResponse,
            AuthResponse,
            ProfileResponse,
            SecurityPhraseRequest,
            SecurityPhraseResponse,
            ForgotPasswordRequest,
            ForgotPasswordResponse,
            SecurityQuestionResponse,
            SecurityAnswerRequest,
            SecurityAnswerResponse,
            ResetPasswordRequest,
            MovieResponse,
            MovieListItem,
            MovieDetailResponse,
            CreateMovieRequest,
            UpdateMovieRequest,
            ReviewRequest,
            ReviewResponse,
            CartItem,
            CheckoutRequest,
            OrderItemResponse,
            OrderResponse,
            SubmitRatingRequest,
            RatingResponse,
            RatingStats,
            MovieRatingView,
            SubmitRatingResponse,
            RatedMovie,
            RatingHistoryItem,
            RecentRating,
            RatingTrendPoint,
            RatingCorrelation,
            RatingAnalyticsResponse,
            RegionResponse,
            UserRegionResponse,
            SetUserRegionRequest,
            TrendingMovieResponse,
            RegionTrendingResponse,
            TrendingSnapshotItem,
            CreatePetitionRequest,
            VoteType,
            VoteRequest,
            VoteCounts,
            PetitionResponse,
            PetitionDetailResponse,
            VoteResponse,
            RebuildAggregatesResponse,
            TrendingRefreshResponse,
            SeedRegionsResponse,
            SampleRatingsResponse,
            SamplePurchasesResponse,
            RealisticPurchasesResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Signup, login and password recovery"),
        (name = "account", description = "Profile, security phrase and order history"),
        (name = "movies", description = "Movie catalogue and reviews"),
        (name = "orders", description = "Cart checkout"),
        (name = "ratings", description = "Star ratings and analytics"),
        (name = "geographic", description = "Regions and trending movies"),
        (name = "petitions", description = "Movie petitions and votes"),
        (name = "admin", description = "Staff maintenance operations"),
    ),
    info(
        title = "Movie Store API",
        version = "1.0.0",
        description = "Movie Store REST API documentation"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_document_lists_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/movies"));
        assert!(doc.paths.paths.contains_key("/petitions/{id}/vote"));
        assert!(doc.paths.paths.contains_key("/geographic/regions/{id}/trending"));
        assert!(doc.paths.paths.contains_key("/admin/sample/realistic-purchases"));
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
