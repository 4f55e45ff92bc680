use crate::error::AppError;
use crate::utils::JwtService;
use actix_web::http::Method;
use actix_web::{
    Error, HttpMessage,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};

// 公开路径配置
struct PublicPaths {
    exact_paths: Vec<&'static str>,
    prefix_paths: Vec<&'static str>,
    // 仅 GET 公开
    get_exact_paths: Vec<&'static str>,
    get_prefix_paths: Vec<&'static str>,
    excluded_paths: Vec<&'static str>,
}

impl PublicPaths {
    fn new() -> Self {
        Self {
            exact_paths: vec!["/swagger-ui", "/swagger-ui/", "/api-docs/openapi.json"],
            prefix_paths: vec!["/swagger-ui/", "/api-docs/", "/api/v1/auth/"],
            get_exact_paths: vec!["/api/v1/movies", "/api/v1/petitions", "/api/v1/geographic/regions"],
            get_prefix_paths: vec!["/api/v1/movies/", "/api/v1/ratings/", "/api/v1/petitions/"],
            // 即使在公开前缀下也需要认证
            excluded_paths: vec![
                "/api/v1/auth/logout",
                "/api/v1/ratings/me",
                "/api/v1/petitions/mine",
            ],
        }
    }

    fn is_public(&self, method: &Method, path: &str) -> bool {
        if self
            .excluded_paths
            .iter()
            .any(|&excluded| path.starts_with(excluded))
        {
            return false;
        }

        if self.exact_paths.contains(&path)
            || self.prefix_paths.iter().any(|&prefix| path.starts_with(prefix))
        {
            return true;
        }

        *method == Method::GET
            && (self.get_exact_paths.contains(&path)
                || self.get_prefix_paths.iter().any(|&prefix| path.starts_with(prefix)))
    }
}

pub struct AuthMiddleware {
    jwt_service: JwtService,
}

impl AuthMiddleware {
    pub fn new(jwt_service: JwtService) -> Self {
        Self { jwt_service }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            jwt_service: self.jwt_service.clone(),
            public_paths: PublicPaths::new(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    jwt_service: JwtService,
    public_paths: PublicPaths,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // 放行所有 CORS 预检请求
        if req.method() == Method::OPTIONS {
            return Box::pin(self.service.call(req));
        }

        let is_public = self.public_paths.is_public(req.method(), req.path());

        let token = req
            .headers()
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .map(str::to_string);

        let user_id = match token {
            Some(token) => match self
                .jwt_service
                .verify_access_token(&token)
                .and_then(|claims| claims.user_id())
            {
                Ok(id) => Some(id),
                // 公开路径上无效令牌按匿名处理
                Err(_) if is_public => None,
                Err(_) => {
                    let error = AppError::AuthError("Invalid access token".to_string());
                    return Box::pin(async move { Err(error.into()) });
                }
            },
            None => None,
        };

        match user_id {
            Some(id) => {
                req.extensions_mut().insert(id);
            }
            None if !is_public => {
                let error = AppError::AuthError("Missing access token".to_string());
                return Box::pin(async move { Err(error.into()) });
            }
            None => {}
        }

        Box::pin(self.service.call(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_path_rules() {
        let paths = PublicPaths::new();
        assert!(paths.is_public(&Method::POST, "/api/v1/auth/login"));
        assert!(paths.is_public(&Method::POST, "/api/v1/auth/refresh"));
        assert!(!paths.is_public(&Method::POST, "/api/v1/auth/logout"));

        assert!(paths.is_public(&Method::GET, "/api/v1/movies"));
        assert!(paths.is_public(&Method::GET, "/api/v1/movies/3/reviews"));
        assert!(!paths.is_public(&Method::POST, "/api/v1/movies"));
        assert!(!paths.is_public(&Method::POST, "/api/v1/movies/3/reviews"));

        assert!(paths.is_public(&Method::GET, "/api/v1/ratings/top-rated"));
        assert!(!paths.is_public(&Method::GET, "/api/v1/ratings/me"));
        assert!(!paths.is_public(&Method::POST, "/api/v1/ratings/movies/1"));

        assert!(paths.is_public(&Method::GET, "/api/v1/geographic/regions"));
        assert!(!paths.is_public(&Method::GET, "/api/v1/geographic/regions/1/trending"));
        assert!(!paths.is_public(&Method::GET, "/api/v1/geographic/user-region"));

        assert!(paths.is_public(&Method::GET, "/api/v1/petitions/4"));
        assert!(!paths.is_public(&Method::GET, "/api/v1/petitions/mine"));
        assert!(!paths.is_public(&Method::GET, "/api/v1/account/profile"));
        assert!(!paths.is_public(&Method::POST, "/api/v1/admin/trending/refresh"));
    }
}
