use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter

use sofluent_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    external::PayoutGateway,
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
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

    // 创建JWT服务
    let jwt_service = JwtService::new(
        &config.jwt.secret,
        config.jwt.access_token_expires_in,
        config.jwt.refresh_token_expires_in,
    );

    // 支付网关
    let payout_gateway = PayoutGateway::new(config.payout.clone());

    // 创建服务
    let earning_service = EarningService::new(pool.clone());
    let withdrawal_service = WithdrawalService::new(pool.clone(), payout_gateway);
    let content_reward_service =
        ContentRewardService::new(pool.clone(), earning_service.clone());
    let referral_reward_service =
        ReferralRewardService::new(pool.clone(), earning_service.clone());
    let auth_service = AuthService::new(
        pool.clone(),
        jwt_service.clone(),
        referral_reward_service.clone(),
    );
    let user_service = UserService::new(pool.clone());

    // 后台任务：轮询 processing 提现的网关状态（每30秒）
    {
        let withdrawal_service_clone = withdrawal_service.clone();
        tokio::spawn(async move {
            loop {
                if let Err(e) = withdrawal_service_clone.poll_processing_withdrawals().await {
                    log::error!("Payout status poll failed: {:?}", e);
                }
                tokio::time::sleep(std::time::Duration::from_secs(30)).await;
            }
        });
    }

    // 后台任务：推荐留存扫描（每小时）
    {
        let referral_service_clone = referral_reward_service.clone();
        tokio::spawn(async move {
            loop {
                if let Err(e) = referral_service_clone.run_retention_sweep().await {
                    log::error!("Retention sweep failed: {:?}", e);
                }
                tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
            }
        });
    }

    // 启动HTTP服务器
    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors())
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(user_service.clone()))
            .app_data(web::Data::new(earning_service.clone()))
            .app_data(web::Data::new(withdrawal_service.clone()))
            .app_data(web::Data::new(content_reward_service.clone()))
            .app_data(web::Data::new(referral_reward_service.clone()))
            .configure(swagger_config)
            .service(
                web::scope("/api")
                    .configure(handlers::auth_config)
                    .configure(handlers::user_config)
                    .configure(handlers::earning_config)
                    .configure(handlers::withdrawal_config)
                    .configure(handlers::referral_config)
                    .configure(handlers::event_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
