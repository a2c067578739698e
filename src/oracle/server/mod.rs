use crate::Algorithm;

use axum::{
    extract::Query,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::{TcpListener, ToSocketAddrs};

use std::{collections::HashMap, sync::Arc};

type Params = Query<HashMap<String, String>>;

/// Bind `address` and serve the oracle on a background task. Returns the
/// base URL of the server.
pub async fn spawn_server(
    address: impl ToSocketAddrs,
    request_handler: &MacRequestHandler,
) -> std::io::Result<String> {
    let listener = TcpListener::bind(address).await?;
    let addr = listener.local_addr()?;
    let app = router(request_handler.clone());
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "MAC oracle server stopped");
        }
    });
    tracing::debug!(%addr, "MAC oracle listening");
    Ok(format!("http://{}", addr))
}

pub fn router(request_handler: MacRequestHandler) -> Router {
    let handler = Arc::new(request_handler);
    Router::new()
        .route(
            "/mac",
            get({
                let handler = Arc::clone(&handler);
                move |query: Params| async move { handler.handle_mac(query) }
            }),
        )
        .route(
            "/verify",
            get(move |query: Params| async move { handler.handle_verify(query) }),
        )
}

#[derive(Debug, Clone)]
pub struct MacRequestHandler {
    algorithm: Algorithm,
    key: Vec<u8>,
}

impl MacRequestHandler {
    pub fn new(algorithm: Algorithm, key: &[u8]) -> Self {
        Self {
            algorithm,
            key: key.to_vec(),
        }
    }

    /// `GET /mac?message=<hex>` responds with the hex MAC of the message.
    pub fn handle_mac(&self, Query(params): Params) -> Response {
        let message = match hex_param(&params, "message") {
            Ok(m) => m,
            Err(response) => return response,
        };

        let mac = self.algorithm.authenticate_message(&self.key, &message);
        (StatusCode::OK, hex::encode(mac)).into_response()
    }

    /// `GET /verify?message=<hex>&mac=<hex>` responds 200 for a valid MAC and
    /// 401 otherwise.
    pub fn handle_verify(&self, Query(params): Params) -> Response {
        let message = match hex_param(&params, "message") {
            Ok(m) => m,
            Err(response) => return response,
        };
        let mac = match hex_param(&params, "mac") {
            Ok(m) => m,
            Err(response) => return response,
        };

        if self.algorithm.verify_message(&self.key, &message, &mac) {
            (StatusCode::OK, "MAC is valid").into_response()
        } else {
            (StatusCode::UNAUTHORIZED, "Invalid MAC").into_response()
        }
    }
}

fn hex_param(params: &HashMap<String, String>, name: &str) -> Result<Vec<u8>, Response> {
    match params.get(name) {
        Some(value) => hex::decode(value).map_err(|e| {
            (StatusCode::BAD_REQUEST, format!("Illegal '{name}': {e}")).into_response()
        }),
        None => {
            let message = format!("Missing '{name}' parameter");
            Err((StatusCode::BAD_REQUEST, message).into_response())
        }
    }
}
