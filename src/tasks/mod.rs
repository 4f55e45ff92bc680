//! 后台定时任务
//!
//! 启动时调用一次 `spawn_all`，任务通过 `tokio::spawn` 脱离运行，不阻塞调用方。

use crate::services::{RatingService, TrendingService};
use std::time::Duration;

/// 启动所有后台任务
///
/// - 启动后重建一次全部评分聚合（修复历史数据）
/// - 按 `refresh_interval_secs` 周期刷新各地区热门榜快照
pub fn spawn_all(
    rating_service: RatingService,
    trending_service: TrendingService,
    refresh_interval_secs: u64,
) {
    tokio::spawn(async move {
        match rating_service.update_all_rating_aggregates().await {
            Ok(n) => log::info!("Rating aggregates rebuilt on startup: {n}"),
            Err(e) => log::error!("Failed to rebuild rating aggregates: {e:?}"),
        }
    });

    let interval = Duration::from_secs(refresh_interval_secs.max(1));
    tokio::spawn(async move {
        loop {
            match trending_service.update_trending_scores().await {
                Ok(result) => log::debug!(
                    "Trending snapshot refreshed: {} regions, {} rows",
                    result.regions,
                    result.rows_written
                ),
                Err(e) => log::error!("Failed to refresh trending snapshot: {e:?}"),
            }
            tokio::time::sleep(interval).await;
        }
    });
}
