use actix_cors::Cors;
use actix_web::http::header;

pub fn cors_middleware() -> Cors {
    // The page is served from this process; CORS matters for dev
    // frontends running on their own port
    Cors::default()
        .allowed_origin("http://localhost:3000")
        .allowed_methods(vec!["GET", "POST"])
        .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
        .max_age(3600)
}
