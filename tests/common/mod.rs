use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App};
use async_trait::async_trait;
use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use trailhead_api::config::{RazorpayConfig, StripeConfig};
use trailhead_api::db::catalog::{ExperienceRepository, MemoryCatalog};
use trailhead_api::db::ledger::{AppendOutcome, BookingLedger, MemoryLedger};
use trailhead_api::db::promos::{MemoryPromos, PromoRepository};
use trailhead_api::db::StoreError;
use trailhead_api::models::booking::BookingPatch;
use trailhead_api::models::booking::{BookingRecord, BookingStatus};
use trailhead_api::models::experience::{Experience, ExperienceKind};
use trailhead_api::models::promo::{PromoCode, PromoKind};
use trailhead_api::routes;
use trailhead_api::services::notification_service::{NoopNotifier, Notifier};
use trailhead_api::services::payment::razorpay::RazorpayGateway;
use trailhead_api::services::payment::stripe::{self, StripeGateway};

pub const WEBHOOK_SECRET: &str = "whsec_test_secret";
pub const RAZORPAY_SECRET: &str = "rzp_secret_test";

/// Unroutable, so any accidental provider call fails fast instead of
/// reaching the network.
const DEAD_API: &str = "http://127.0.0.1:1";

pub struct TestApp {
    /// Concrete handle so tests can assert on ledger contents directly.
    pub ledger: Arc<MemoryLedger>,
    /// What the routes actually see; normally the memory ledger above, but
    /// swappable for a failure or race double.
    ledger_dyn: Arc<dyn BookingLedger>,
    catalog: Arc<dyn ExperienceRepository>,
    promos: Arc<dyn PromoRepository>,
    notifier: Arc<dyn Notifier>,
    stripe: Arc<StripeGateway>,
    razorpay: Arc<RazorpayGateway>,
}

impl TestApp {
    /// Both providers configured. Provider HTTP calls still fail (the API
    /// base is unroutable); tests that reach one assert on that failure.
    pub fn new() -> Self {
        Self::build(
            StripeConfig {
                secret_key: "sk_test_123".to_string(),
                webhook_secret: WEBHOOK_SECRET.to_string(),
                deposit_rate: 0.3,
            },
            configured_razorpay(),
        )
    }

    /// Stripe credentials absent; the hosted checkout flow is unavailable.
    pub fn without_stripe() -> Self {
        Self::build(
            StripeConfig {
                secret_key: String::new(),
                webhook_secret: WEBHOOK_SECRET.to_string(),
                deposit_rate: 0.3,
            },
            configured_razorpay(),
        )
    }

    /// No webhook signing secret set, the local-development relaxation.
    pub fn without_webhook_secret() -> Self {
        Self::build(
            StripeConfig {
                secret_key: "sk_test_123".to_string(),
                webhook_secret: String::new(),
                deposit_rate: 0.3,
            },
            configured_razorpay(),
        )
    }

    /// Razorpay credentials absent; the order flow is unavailable.
    pub fn without_razorpay() -> Self {
        Self::build(
            StripeConfig {
                secret_key: "sk_test_123".to_string(),
                webhook_secret: WEBHOOK_SECRET.to_string(),
                deposit_rate: 0.3,
            },
            RazorpayConfig {
                key_id: String::new(),
                key_secret: String::new(),
                api_base_url: DEAD_API.to_string(),
                deposit_rate: 0.2,
            },
        )
    }

    /// Razorpay configured against a live stub server (see
    /// [`spawn_razorpay_stub`]) so the paid-order path runs end to end.
    pub fn with_razorpay_base(api_base_url: &str) -> Self {
        Self::build(
            StripeConfig {
                secret_key: "sk_test_123".to_string(),
                webhook_secret: WEBHOOK_SECRET.to_string(),
                deposit_rate: 0.3,
            },
            RazorpayConfig {
                api_base_url: api_base_url.to_string(),
                ..configured_razorpay()
            },
        )
    }

    /// Every ledger call fails. Exercises the persistence-failure branches.
    pub fn with_failing_ledger() -> Self {
        let mut app = Self::new();
        app.ledger_dyn = Arc::new(FailingLedger);
        app
    }

    /// The first session lookup misses, so a confirmation proceeds to the
    /// ledger write and loses to an existing record, as if another tab got
    /// there in between.
    pub fn with_lost_race_ledger(api_base_url: &str) -> Self {
        let mut app = Self::with_razorpay_base(api_base_url);
        app.ledger_dyn = Arc::new(LostRaceLedger {
            inner: app.ledger.clone(),
            raced: AtomicBool::new(false),
        });
        app
    }

    fn build(stripe_config: StripeConfig, razorpay_config: RazorpayConfig) -> Self {
        let ledger = Arc::new(MemoryLedger::new());
        let ledger_dyn: Arc<dyn BookingLedger> = ledger.clone();
        let catalog: Arc<dyn ExperienceRepository> = Arc::new(seeded_catalog());
        let promos: Arc<dyn PromoRepository> = Arc::new(seeded_promos());
        let notifier: Arc<dyn Notifier> = Arc::new(NoopNotifier);

        Self {
            ledger,
            ledger_dyn,
            catalog,
            promos,
            notifier,
            stripe: Arc::new(StripeGateway::new(
                stripe_config,
                "http://localhost:3000".to_string(),
            )),
            razorpay: Arc::new(RazorpayGateway::new(razorpay_config)),
        }
    }

    pub fn create_app(
        &self,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        let ledger = self.ledger_dyn.clone();

        App::new()
            .wrap(Logger::default())
            .wrap(Cors::permissive())
            .app_data(web::Data::new(ledger))
            .app_data(web::Data::new(self.catalog.clone()))
            .app_data(web::Data::new(self.promos.clone()))
            .app_data(web::Data::new(self.stripe.clone()))
            .app_data(web::Data::new(self.razorpay.clone()))
            .app_data(web::Data::new(self.notifier.clone()))
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
    }
}

fn configured_razorpay() -> RazorpayConfig {
    RazorpayConfig {
        key_id: "rzp_test_123".to_string(),
        key_secret: RAZORPAY_SECRET.to_string(),
        api_base_url: DEAD_API.to_string(),
        deposit_rate: 0.2,
    }
}

fn seeded_catalog() -> MemoryCatalog {
    let mut catalog = MemoryCatalog::new();
    catalog.insert(
        ExperienceKind::Tour,
        Experience {
            id: None,
            slug: "highland-circuit".to_string(),
            title: "Highland Circuit".to_string(),
            price_per_person: 100.0,
            duration_days: Some(1),
            summary: Some("A full-day loop through the highlands.".to_string()),
        },
    );
    catalog.insert(
        ExperienceKind::Package,
        Experience {
            id: None,
            slug: "coast-and-crater".to_string(),
            title: "Coast & Crater".to_string(),
            price_per_person: 450.0,
            duration_days: Some(5),
            summary: Some("Five days from the shore to the caldera rim.".to_string()),
        },
    );
    catalog
}

fn seeded_promos() -> MemoryPromos {
    let mut promos = MemoryPromos::new();
    promos.insert(PromoCode {
        id: None,
        code: "SUMMER10".to_string(),
        kind: PromoKind::Percent,
        value: 10.0,
        active: true,
    });
    promos.insert(PromoCode {
        id: None,
        code: "flat500".to_string(),
        kind: PromoKind::Fixed,
        value: 500.0,
        active: true,
    });
    promos.insert(PromoCode {
        id: None,
        code: "expired20".to_string(),
        kind: PromoKind::Percent,
        value: 20.0,
        active: false,
    });
    promos
}

/// A ledgered booking, as the webhook would have written it.
pub fn sample_booking(session_id: &str) -> BookingRecord {
    BookingRecord {
        id: uuid::Uuid::new_v4().to_string(),
        session_id: session_id.to_string(),
        kind: ExperienceKind::Tour,
        experience_slug: "highland-circuit".to_string(),
        experience_title: "Highland Circuit".to_string(),
        date: chrono::NaiveDate::from_ymd_opt(2026, 9, 12).unwrap(),
        adults: 2,
        children: 1,
        total_usd: 250.0,
        deposit_usd: 75.0,
        balance_usd: 175.0,
        promo_code: None,
        customer_name: "Ada Mwangi".to_string(),
        customer_email: "ada@example.com".to_string(),
        customer_phone: None,
        notes: None,
        status: BookingStatus::Confirmed,
        payment_status: Some("deposit_paid".to_string()),
        created_at: chrono::Utc::now(),
        source: "stripe".to_string(),
    }
}

/// A ledger whose every call fails.
pub struct FailingLedger;

fn store_down() -> StoreError {
    StoreError::Database(mongodb::error::Error::custom("backend down"))
}

#[async_trait]
impl BookingLedger for FailingLedger {
    async fn append_if_absent(&self, _record: BookingRecord) -> Result<AppendOutcome, StoreError> {
        Err(store_down())
    }
    async fn read_all(&self) -> Result<Vec<BookingRecord>, StoreError> {
        Err(store_down())
    }
    async fn find_by_id(&self, _id: &str) -> Result<Option<BookingRecord>, StoreError> {
        Err(store_down())
    }
    async fn find_by_session(
        &self,
        _session_id: &str,
    ) -> Result<Option<BookingRecord>, StoreError> {
        Err(store_down())
    }
    async fn update_by_id(
        &self,
        _id: &str,
        _patch: BookingPatch,
    ) -> Result<Option<BookingRecord>, StoreError> {
        Err(store_down())
    }
}

/// Misses the first session lookup, then behaves normally. With the inner
/// ledger pre-seeded, a confirmation reads "no record yet", writes, and
/// collides, reproducing two tabs confirming at once.
pub struct LostRaceLedger {
    pub inner: Arc<MemoryLedger>,
    pub raced: AtomicBool,
}

#[async_trait]
impl BookingLedger for LostRaceLedger {
    async fn append_if_absent(&self, record: BookingRecord) -> Result<AppendOutcome, StoreError> {
        self.inner.append_if_absent(record).await
    }
    async fn read_all(&self) -> Result<Vec<BookingRecord>, StoreError> {
        self.inner.read_all().await
    }
    async fn find_by_id(&self, id: &str) -> Result<Option<BookingRecord>, StoreError> {
        self.inner.find_by_id(id).await
    }
    async fn find_by_session(
        &self,
        session_id: &str,
    ) -> Result<Option<BookingRecord>, StoreError> {
        if !self.raced.swap(true, Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.find_by_session(session_id).await
    }
    async fn update_by_id(
        &self,
        id: &str,
        patch: BookingPatch,
    ) -> Result<Option<BookingRecord>, StoreError> {
        self.inner.update_by_id(id, patch).await
    }
}

/// A minimal Razorpay Orders stand-in on a random local port. Requests
/// naming an "unpaid" order get a created-but-never-paid order; everything
/// else gets a paid order carrying full booking notes. Returns the base URL
/// to point `RazorpayConfig::api_base_url` at.
pub fn spawn_razorpay_stub() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let mut buf = [0u8; 4096];
            let n = stream.read(&mut buf).unwrap_or(0);
            let request = String::from_utf8_lossy(&buf[..n]);

            let body = if request.contains("order_unpaid") {
                serde_json::json!({
                    "id": "order_unpaid_1",
                    "amount": 5000,
                    "amount_paid": 0,
                    "currency": "USD",
                    "status": "created",
                    "notes": {}
                })
            } else {
                serde_json::json!({
                    "id": "order_paid_1",
                    "amount": 5000,
                    "amount_paid": 5000,
                    "currency": "USD",
                    "status": "paid",
                    "notes": {
                        "experience_type": "tour",
                        "experience_slug": "highland-circuit",
                        "experience_title": "Highland Circuit",
                        "date": "2026-09-12",
                        "adults": "2",
                        "children": "1",
                        "subtotal": "250.00",
                        "discount": "0.00",
                        "total": "250.00",
                        "deposit": "50.00",
                        "customer_name": "Ada Mwangi",
                        "customer_email": "ada@example.com"
                    }
                })
            }
            .to_string();

            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });

    base
}

/// A `Stripe-Signature` header value that verifies against `payload` under
/// the test webhook secret.
pub fn signed_stripe_header(payload: &str) -> String {
    let timestamp = chrono::Utc::now().timestamp();
    format!(
        "t={},v1={}",
        timestamp,
        stripe::sign_payload(payload, timestamp, WEBHOOK_SECRET)
    )
}

/// A `checkout.session.completed` event body carrying full booking metadata.
pub fn completed_session_payload(session_id: &str, amount_total: i64) -> String {
    serde_json::json!({
        "id": "evt_test_1",
        "type": "checkout.session.completed",
        "data": {
            "object": {
                "id": session_id,
                "object": "checkout.session",
                "amount_total": amount_total,
                "customer_email": "ada@example.com",
                "customer_details": { "email": "ada@example.com" },
                "metadata": {
                    "experience_type": "tour",
                    "experience_slug": "highland-circuit",
                    "experience_title": "Highland Circuit",
                    "date": "2026-09-12",
                    "adults": "2",
                    "children": "1",
                    "subtotal": "250.00",
                    "discount": "0.00",
                    "total": "250.00",
                    "deposit": "75.00",
                    "customer_name": "Ada Mwangi",
                    "customer_email": "ada@example.com"
                }
            }
        }
    })
    .to_string()
}
