//! Single binary web server: JSON API for rosters, fixtures and team balancing.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. Override with env: HOST, PORT.
//! Balancer limits come from BALANCER_* env vars (see `BalancerSettings::from_env`).

use actix_web::{
    get, post, put,
    web::{Data, Json, Path},
    App, HttpResponse, HttpServer, Responder,
};
use chrono::{DateTime, Utc};
use league_balancer_web::{
    balance_by_performance, balance_by_rating, import_players_csv, BalanceError, BalancerSettings,
    ErrorKind, FixtureId, FixtureProvider, InMemoryStore, PerformanceRating, PerformanceRequest,
    PerformanceWeights, Player, PlayerAttributes, PlayerId, PositionWeights, RandomIndex,
    RatingRequest, TeamSizeTemplate, TeamSizes,
};
use serde::Deserialize;

type Store = Data<InMemoryStore>;
type Settings = Data<BalancerSettings>;

#[derive(serde::Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct AddPlayerBody {
    name: String,
    #[serde(default)]
    attributes: PlayerAttributes,
    #[serde(default)]
    performance: PerformanceRating,
}

#[derive(Deserialize)]
struct CreateFixtureBody {
    size_a: usize,
    size_b: usize,
    #[serde(default)]
    kickoff: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct SetPoolBody {
    player_ids: Vec<PlayerId>,
}

/// Path segment: fixture id (e.g. /api/fixtures/{id})
#[derive(Deserialize)]
struct FixturePath {
    id: FixtureId,
}

/// Validation 400, missing 404, conflict 409, anything else 500.
fn error_response(e: &BalanceError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e.kind() {
        ErrorKind::Validation => HttpResponse::BadRequest().json(body),
        ErrorKind::MissingReference => HttpResponse::NotFound().json(body),
        ErrorKind::Conflict => HttpResponse::Conflict().json(body),
        ErrorKind::Internal => {
            log::error!("{}", e);
            HttpResponse::InternalServerError().json(body)
        }
    }
}

fn respond<T: serde::Serialize>(result: Result<T, BalanceError>) -> HttpResponse {
    match result {
        Ok(v) => HttpResponse::Ok().json(v),
        Err(e) => error_response(&e),
    }
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "league-balancer-web",
    })
}

/// List all rostered players.
#[get("/api/players")]
async fn api_list_players(store: Store) -> HttpResponse {
    respond(store.list_players())
}

/// Add one player (ratings optional).
#[post("/api/players")]
async fn api_add_player(store: Store, body: Json<AddPlayerBody>) -> HttpResponse {
    let name = body.name.trim();
    if name.is_empty() {
        return HttpResponse::BadRequest().json(serde_json::json!({ "error": "Player name is required" }));
    }
    let mut player = Player::new(name).with_attributes(body.attributes);
    player.performance = body.performance;
    respond(store.add_player(player.clone()).map(|_| player))
}

/// Bulk import players from a CSV body; nothing is added if any row is bad.
#[post("/api/players/import")]
async fn api_import_players(store: Store, body: String) -> HttpResponse {
    let players = match import_players_csv(body.as_bytes()) {
        Ok(p) => p,
        Err(e) => return error_response(&e),
    };
    for p in &players {
        if let Err(e) = store.add_player(p.clone()) {
            return error_response(&e);
        }
    }
    HttpResponse::Ok().json(players)
}

/// Create a fixture with target team sizes.
#[post("/api/fixtures")]
async fn api_create_fixture(store: Store, body: Json<CreateFixtureBody>) -> HttpResponse {
    respond(store.create_fixture(TeamSizes::new(body.size_a, body.size_b), body.kickoff))
}

#[get("/api/fixtures/{id}")]
async fn api_get_fixture(store: Store, path: Path<FixturePath>) -> HttpResponse {
    respond(store.fixture(path.id))
}

/// Replace the fixture's confirmed player pool.
#[put("/api/fixtures/{id}/pool")]
async fn api_set_pool(store: Store, path: Path<FixturePath>, body: Json<SetPoolBody>) -> HttpResponse {
    respond(store.set_pool(path.id, body.into_inner().player_ids))
}

/// Current team/slot assignments.
#[get("/api/fixtures/{id}/assignments")]
async fn api_assignments(store: Store, path: Path<FixturePath>) -> HttpResponse {
    respond(store.assignments(path.id))
}

/// Balance on power rating / goal threat (randomized search).
#[post("/api/fixtures/{id}/balance/performance")]
async fn api_balance_performance(
    store: Store,
    settings: Settings,
    path: Path<FixturePath>,
    body: Option<Json<PerformanceRequest>>,
) -> HttpResponse {
    let request = body.map(Json::into_inner).unwrap_or_default();
    let mut source = RandomIndex(rand::thread_rng());
    respond(balance_by_performance(
        store.get_ref(),
        settings.get_ref(),
        path.id,
        &request,
        &mut source,
    ))
}

/// Balance on positional attributes (exhaustive search).
#[post("/api/fixtures/{id}/balance/rating")]
async fn api_balance_rating(
    store: Store,
    settings: Settings,
    path: Path<FixturePath>,
    body: Option<Json<RatingRequest>>,
) -> HttpResponse {
    let request = body.map(Json::into_inner).unwrap_or_default();
    respond(balance_by_rating(store.get_ref(), settings.get_ref(), path.id, &request))
}

#[put("/api/settings/performance-weights")]
async fn api_set_performance_weights(store: Store, body: Json<PerformanceWeights>) -> HttpResponse {
    let weights = body.into_inner();
    respond(store.set_performance_weights(weights).map(|_| weights))
}

#[put("/api/settings/position-weights")]
async fn api_set_position_weights(store: Store, body: Json<PositionWeights>) -> HttpResponse {
    let weights = body.into_inner();
    respond(store.set_position_weights(weights.clone()).map(|_| weights))
}

/// Add or replace team-size templates.
#[put("/api/settings/templates")]
async fn api_set_templates(store: Store, body: Json<Vec<TeamSizeTemplate>>) -> HttpResponse {
    let templates = body.into_inner();
    respond(store.set_templates(templates.clone()).map(|_| templates))
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let host = std::env::var("HOST").unwrap_or_else(|_| default_host());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(default_port);
    let bind = (host.as_str(), port);

    let settings = Data::new(BalancerSettings::from_env());
    log::info!(
        "Pool size {}..={}, up to {} search iterations",
        settings.min_pool_size,
        settings.max_pool_size,
        settings.search.max_iterations
    );
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    let store = Data::new(InMemoryStore::new());

    HttpServer::new(move || {
        App::new()
            .app_data(store.clone())
            .app_data(settings.clone())
            .service(api_health)
            .service(api_list_players)
            .service(api_add_player)
            .service(api_import_players)
            .service(api_create_fixture)
            .service(api_get_fixture)
            .service(api_set_pool)
            .service(api_assignments)
            .service(api_balance_performance)
            .service(api_balance_rating)
            .service(api_set_performance_weights)
            .service(api_set_position_weights)
            .service(api_set_templates)
    })
    .bind(bind)?
    .run()
    .await
}
