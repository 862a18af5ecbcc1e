use actix_cors::Cors;
use actix_web::http::header;

pub fn cors_middleware(allowed_origin: Option<&str>) -> Cors {
    let cors = match allowed_origin {
        Some(origin) => Cors::default().allowed_origin(origin),
        None => Cors::default().allow_any_origin(),
    };
    cors.allowed_methods(vec!["GET", "POST"])
        .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
        .expose_headers(vec![
            header::CONTENT_DISPOSITION,
            header::HeaderName::from_static("x-conversion-warnings"),
        ])
        .max_age(3600) // Cache CORS preflight for 1 hour
}
