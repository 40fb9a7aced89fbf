use std::env;

use actix_web::{App, HttpResponse, HttpServer, Responder, get, middleware, post, web};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Deserialize;

use marsten_core::{Codec, EncodeError};

const DEFAULT_MODEL: &str = "./data/model.bin";
const DEFAULT_BIND: &str = "127.0.0.1:5000";
/// Request body limit, in bytes. Encoded documents are at least eight times
/// larger than their payload, so the limit must leave room for `/v1/decode`.
const DEFAULT_BODY_LIMIT: usize = 64 * 1024 * 1024;

/// Query parameters for the `/v1/encode` endpoint
#[derive(Deserialize)]
struct EncodeParams {
	seed: Option<u64>,
}

/// HTTP POST endpoint `/v1/encode`
///
/// Hides the raw request body in generated text and returns the text.
/// A payload the model cannot carry is answered with 422.
#[post("/v1/encode")]
async fn post_encode(codec: web::Data<Codec>, query: web::Query<EncodeParams>, body: web::Bytes) -> impl Responder {
	let mut rng = match query.seed {
		Some(seed) => StdRng::seed_from_u64(seed),
		None => StdRng::from_os_rng(),
	};

	match codec.encode(&body, &mut rng) {
		Ok(document) => HttpResponse::Ok().content_type("text/plain; charset=utf-8").body(document),
		Err(e @ EncodeError::Stalled { .. }) => {
			log::warn!("encode rejected: {e}");
			HttpResponse::UnprocessableEntity().body(e.to_string())
		}
		Err(e) => {
			log::error!("encode failed: {e}");
			HttpResponse::InternalServerError().body(e.to_string())
		}
	}
}

/// HTTP POST endpoint `/v1/decode`
///
/// Recovers the payload hidden in the request body.
#[post("/v1/decode")]
async fn post_decode(codec: web::Data<Codec>, body: String) -> impl Responder {
	match codec.decode(&body) {
		Ok(payload) => HttpResponse::Ok().content_type("application/octet-stream").body(payload),
		Err(e) => HttpResponse::UnprocessableEntity().body(e.to_string()),
	}
}

#[get("/v1/model")]
async fn get_model(codec: web::Data<Codec>) -> impl Responder {
	HttpResponse::Ok().json(codec.summary())
}

/// Registers the shared codec, the body limit and every endpoint.
fn routes(codec: web::Data<Codec>, body_limit: usize) -> impl FnOnce(&mut web::ServiceConfig) {
	move |cfg| {
		cfg.app_data(codec)
			.app_data(web::PayloadConfig::new(body_limit))
			.service(post_encode)
			.service(post_decode)
			.service(get_model);
	}
}

/// Main entry point for the server.
///
/// Loads the codec once and shares it read-only between workers.
///
/// # Notes
/// - `MARSTEN_MODEL` selects the model file (default `./data/model.bin`).
/// - `MARSTEN_BIND` selects the listen address (default `127.0.0.1:5000`).
/// - `MARSTEN_BODY_LIMIT` caps request bodies, in bytes (default 64 MiB).
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let model_path = env::var("MARSTEN_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_owned());
	let bind = env::var("MARSTEN_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_owned());
	let body_limit = match env::var("MARSTEN_BODY_LIMIT") {
		Ok(value) => value
			.parse::<usize>()
			.map_err(|e| std::io::Error::other(format!("Invalid MARSTEN_BODY_LIMIT {value:?}: {e}")))?,
		Err(_) => DEFAULT_BODY_LIMIT,
	};

	let codec = Codec::load(&model_path)
		.map_err(|e| std::io::Error::other(format!("Failed to load model {model_path}: {e}")))?;
	let shared_codec = web::Data::new(codec);

	log::info!("listening on {bind}, body limit {body_limit} bytes");
	HttpServer::new(move || {
		App::new()
			.wrap(middleware::Logger::default())
			.configure(routes(shared_codec.clone(), body_limit))
	})
		.bind(bind)?
		.run()
		.await
}

#[cfg(test)]
mod tests {
	use actix_web::http::StatusCode;
	use actix_web::test;

	use marsten_core::{CodecConfig, ModelBuilder};

	use super::*;

	/// History-1 corpus on which every context is balanced.
	const DE_BRUIJN: &str = "aabacadbbcbdccdda\nbacadbbcbdccddaab\ncadbbcbdccddaabac\ndbbcbdccddaabacad";

	fn codec(corpus: &str, config: CodecConfig) -> web::Data<Codec> {
		let mut builder = ModelBuilder::new(1).unwrap();
		builder.fit(corpus);
		web::Data::new(Codec::new(builder.build().unwrap(), config).unwrap())
	}

	#[actix_web::test]
	async fn decodes_documents_above_the_default_body_limit() {
		let app = test::init_service(
			App::new().configure(routes(codec(DE_BRUIJN, CodecConfig::default()), DEFAULT_BODY_LIMIT)),
		)
		.await;
		let payload: Vec<u8> = (0..48 * 1024u32).map(|i| (i * 31 % 251) as u8).collect();

		let req = test::TestRequest::post()
			.uri("/v1/encode?seed=1")
			.set_payload(payload.clone())
			.to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::OK);
		let document = test::read_body(resp).await;
		// One character per bit at least, well past actix's 256 KiB default.
		assert!(document.len() > 256 * 1024);

		let req = test::TestRequest::post().uri("/v1/decode").set_payload(document).to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::OK);
		assert_eq!(&test::read_body(resp).await[..], &payload[..]);
	}

	#[actix_web::test]
	async fn bodies_over_the_limit_are_rejected() {
		let app = test::init_service(App::new().configure(routes(codec(DE_BRUIJN, CodecConfig::default()), 16))).await;

		let req = test::TestRequest::post().uri("/v1/encode").set_payload(vec![0u8; 64]).to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
	}

	#[actix_web::test]
	async fn stalled_encode_is_unprocessable() {
		// After 'b', a set bit can only be carried by END, so 0xff never fits.
		let mut config = CodecConfig::default();
		config.set_max_stalled_chunks(5).unwrap();
		let app = test::init_service(App::new().configure(routes(codec("abab", config), DEFAULT_BODY_LIMIT))).await;

		let req = test::TestRequest::post().uri("/v1/encode?seed=1").set_payload(vec![0xffu8]).to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
		let body = test::read_body(resp).await;
		assert!(!body.is_empty());
	}

	#[actix_web::test]
	async fn model_summary_is_served_as_json() {
		let app = test::init_service(
			App::new().configure(routes(codec(DE_BRUIJN, CodecConfig::default()), DEFAULT_BODY_LIMIT)),
		)
		.await;

		#[derive(Deserialize)]
		struct Summary {
			history: usize,
			contexts: usize,
			balanced_contexts: usize,
		}

		let req = test::TestRequest::get().uri("/v1/model").to_request();
		let summary: Summary = test::call_and_read_body_json(&app, req).await;
		assert_eq!(summary.history, 1);
		assert_eq!(summary.contexts, 5);
		assert_eq!(summary.balanced_contexts, 5);
	}
}
