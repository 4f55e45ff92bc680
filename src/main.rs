use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter

use moviestore_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    tasks,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 加载配置
    let config = Config::from_toml().expect("Failed to load configuration file");

    // 创建数据库连接池
    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    // 运行数据库迁移
    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    let jwt_service = JwtService::new(
        &config.jwt.secret,
        config.jwt.access_token_expires_in,
        config.jwt.refresh_token_expires_in,
    );

    // 创建服务
    let auth_service = AuthService::new(
        pool.clone(),
        jwt_service.clone(),
        config.password_reset.ticket_ttl_secs,
    );
    let user_service = UserService::new(pool.clone());
    let rating_service = RatingService::new(pool.clone());
    let movie_service = MovieService::new(pool.clone(), rating_service.clone());
    let order_service = OrderService::new(pool.clone());
    let region_service = RegionService::new(pool.clone());
    let trending_service = TrendingService::new(pool.clone(), config.trending.clone());
    let petition_service = PetitionService::new(pool.clone());
    let sample_data_service = SampleDataService::new(
        pool.clone(),
        rating_service.clone(),
        trending_service.clone(),
        config.trending.period_days,
    );

    // 启动后台任务（评分聚合重建、热门榜快照刷新）
    tasks::spawn_all(
        rating_service.clone(),
        trending_service.clone(),
        config.trending.refresh_interval_secs,
    );

    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    let cors_origins = config.server.cors_origins.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors(&cors_origins))
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .app_data(handlers::json_config())
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(user_service.clone()))
            .app_data(web::Data::new(rating_service.clone()))
            .app_data(web::Data::new(movie_service.clone()))
            .app_data(web::Data::new(order_service.clone()))
            .app_data(web::Data::new(region_service.clone()))
            .app_data(web::Data::new(trending_service.clone()))
            .app_data(web::Data::new(petition_service.clone()))
            .app_data(web::Data::new(sample_data_service.clone()))
            .configure(swagger_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::auth_config)
                    .configure(handlers::account_config)
                    .configure(handlers::movie_config)
                    .configure(handlers::order_config)
                    .configure(handlers::rating_config)
                    .configure(handlers::geographic_config)
                    .configure(handlers::petition_config)
                    .configure(handlers::admin_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
