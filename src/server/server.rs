use crate::geocode::nominatim;
use crate::layers::coverage::Coverage;
use crate::render::html;
use crate::server::cors::cors_middleware;
use crate::server::session::{AppState, Role, Session};

use actix_web::http::header::{self, ContentType};
use actix_web::{get, middleware, post, web, App, HttpResponse, HttpServer, Responder};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Mutex;

const UI_PAGE: &str = include_str!("ui.html");

/// Upload size cap for feed archives.
const MAX_FEED_BYTES: usize = 64 * 1024 * 1024;

#[derive(Deserialize)]
struct GeocodeParams {
    q: String,
}

/// Selections to commit; an absent role keeps its stored value.
#[derive(Deserialize)]
struct ConfirmRequest {
    start: Option<nominatim::GeocodedPoint>,
    end: Option<nominatim::GeocodedPoint>,
}

#[get("/")]
async fn index() -> impl Responder {
    HttpResponse::Ok().content_type(ContentType::html()).body(UI_PAGE)
}

#[post("/api/feed")]
async fn upload_feed(body: web::Bytes, data: web::Data<AppState>) -> impl Responder {
    println!("Processing uploaded feed ({} bytes)", body.len());

    let mut session = data.session.lock().unwrap();
    match Coverage::from_zip_bytes(&body) {
        Ok(coverage) => {
            let routes = coverage.routes.len();
            let skipped_shapes = coverage.skipped_shapes;
            session.install_coverage(coverage);
            HttpResponse::Ok().json(serde_json::json!({
                "message": "GTFS loaded successfully",
                "routes": routes,
                "skipped_shapes": skipped_shapes
            }))
        }
        Err(e) => {
            // A failed upload must not leave a stale buffer behind
            session.clear_coverage();
            HttpResponse::BadRequest().json(serde_json::json!({
                "error": format!("{}", e)
            }))
        }
    }
}

#[get("/api/geocode")]
async fn geocode(query: web::Query<GeocodeParams>, data: web::Data<AppState>) -> impl Responder {
    let candidates = data.geocoder.search(&query.q).await;
    HttpResponse::Ok().json(serde_json::json!({ "candidates": candidates }))
}

#[post("/api/confirm")]
async fn confirm(body: web::Json<ConfirmRequest>, data: web::Data<AppState>) -> impl Responder {
    let mut session = data.session.lock().unwrap();
    if session.coverage.is_none() {
        return HttpResponse::Conflict().json(serde_json::json!({
            "error": "No feed loaded; upload a GTFS archive first"
        }));
    }

    let body = body.into_inner();
    if let Some(point) = body.start {
        session.set_selection(Role::Start, point);
    }
    if let Some(point) = body.end {
        session.set_selection(Role::End, point);
    }
    session.show_map = true;

    let results = session
        .check_selections()
        .into_iter()
        .map(|result| {
            let message = result.message();
            serde_json::json!({
                "role": result.role,
                "label": result.point.label,
                "within": result.within,
                "message": message,
            })
        })
        .collect::<Vec<_>>();

    HttpResponse::Ok().json(serde_json::json!({ "results": results }))
}

fn rendered_map(session: &Session) -> Option<String> {
    if !session.show_map {
        return None;
    }
    let coverage = session.coverage.as_ref()?;
    Some(html::render_map(coverage, &session.markers()))
}

fn no_map_yet() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({
        "error": "No map to show yet; load a feed and confirm your addresses"
    }))
}

#[get("/map")]
async fn map_page(data: web::Data<AppState>) -> impl Responder {
    let session = data.session.lock().unwrap();
    match rendered_map(&session) {
        Some(page) => HttpResponse::Ok().content_type(ContentType::html()).body(page),
        None => no_map_yet(),
    }
}

#[get("/map/download")]
async fn map_download(data: web::Data<AppState>) -> impl Responder {
    let session = data.session.lock().unwrap();
    match rendered_map(&session) {
        Some(page) => HttpResponse::Ok()
            .content_type(ContentType::html())
            .insert_header((
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", html::DOWNLOAD_FILE_NAME),
            ))
            .body(page),
        None => no_map_yet(),
    }
}

pub async fn start_server(
    host: &str,
    port: u16,
    geocoder: nominatim::Client,
) -> std::io::Result<()> {
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .expect("Invalid address format");

    let app_state = web::Data::new(AppState {
        session: Mutex::new(Session::default()),
        geocoder,
    });

    println!("Starting server on {}:{}", host, port);
    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .wrap(cors_middleware())
            .app_data(app_state.clone())
            .app_data(web::PayloadConfig::new(MAX_FEED_BYTES))
            .service(index)
            .service(upload_feed)
            .service(geocode)
            .service(confirm)
            .service(map_page)
            .service(map_download)
    })
    // One interaction at a time; the session is single-owner
    .workers(1)
    .bind(addr)?
    .run()
    .await
}
