use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;

use trailhead_api::config::AppConfig;
use trailhead_api::db::catalog::{ExperienceRepository, MongoCatalog};
use trailhead_api::db::ledger::{BookingLedger, MemoryLedger, MirroredLedger, MongoLedger};
use trailhead_api::db::promos::{MongoPromos, PromoRepository};
use trailhead_api::routes;
use trailhead_api::services::notification_service::{NoopNotifier, Notifier, SmtpNotifier};
use trailhead_api::services::payment::razorpay::RazorpayGateway;
use trailhead_api::services::payment::stripe::StripeGateway;

const HOST: &str = "0.0.0.0";
const PORT: u16 = 8080;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    if cfg!(debug_assertions) {
        dotenv::dotenv().ok();
    }

    let host = std::env::var("HOST").unwrap_or_else(|_| HOST.to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| PORT.to_string())
        .parse()
        .unwrap_or(PORT);

    let config = AppConfig::from_env();

    let mongo_uri = std::env::var("MONGODB_URI").expect("MONGODB_URI must be set");
    let client = trailhead_api::db::mongo::create_mongo_client(&mongo_uri).await;

    // The memory mirror keeps recent bookings readable through short Mongo
    // outages; Mongo stays the authoritative copy.
    let ledger: Arc<dyn BookingLedger> = Arc::new(MirroredLedger::new(
        Arc::new(MongoLedger::new(&client)),
        Arc::new(MemoryLedger::new()),
    ));
    let catalog: Arc<dyn ExperienceRepository> = Arc::new(MongoCatalog::new(&client));
    let promos: Arc<dyn PromoRepository> = Arc::new(MongoPromos::new(&client));

    let stripe = Arc::new(StripeGateway::new(
        config.stripe.clone(),
        config.base_url.clone(),
    ));
    let razorpay = Arc::new(RazorpayGateway::new(config.razorpay.clone()));

    let notifier: Arc<dyn Notifier> = match config.smtp.clone() {
        Some(smtp) => match SmtpNotifier::new(smtp) {
            Ok(mailer) => Arc::new(mailer),
            Err(e) => {
                log::warn!("SMTP setup failed, booking emails disabled: {}", e);
                Arc::new(NoopNotifier)
            }
        },
        None => {
            log::info!("SMTP_HOST not set, booking emails disabled");
            Arc::new(NoopNotifier)
        }
    };

    log::info!("Listening on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(Cors::permissive())
            .app_data(web::Data::new(ledger.clone()))
            .app_data(web::Data::new(catalog.clone()))
            .app_data(web::Data::new(promos.clone()))
            .app_data(web::Data::new(stripe.clone()))
            .app_data(web::Data::new(razorpay.clone()))
            .app_data(web::Data::new(notifier.clone()))
            .route("/health", web::get().to(routes::health::health_check))
            .service(
                web::scope("/api")
                    .route(
                        "/experiences/{slug}",
                        web::get().to(routes::experiences::get_experience),
                    )
                    .route(
                        "/promos/validate",
                        web::post().to(routes::promo::validate_promo),
                    )
                    .service(
                        web::scope("/checkout")
                            .route(
                                "/session",
                                web::post().to(routes::checkout::create_stripe_session),
                            )
                            .route(
                                "/order",
                                web::post().to(routes::checkout::create_razorpay_order),
                            )
                            .route("/confirm", web::post().to(routes::confirm::confirm_booking)),
                    )
                    .route(
                        "/webhooks/stripe",
                        web::post().to(routes::webhook::stripe_webhook),
                    )
                    .service(
                        web::scope("/bookings")
                            .route("", web::get().to(routes::bookings::list_bookings))
                            .route("/{id}", web::get().to(routes::bookings::get_booking))
                            .route("/{id}", web::patch().to(routes::bookings::patch_booking)),
                    ),
            )
    })
    .bind((host, port))?
    .run()
    .await
}
