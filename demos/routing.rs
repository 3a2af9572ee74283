//! The routing guide as one runnable app.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example routing
//!
//! Try:
//!   curl http://localhost:3000/
//!   curl -X POST http://localhost:3000/
//!   curl http://localhost:3000/secret
//!   curl http://localhost:3000/abcd http://localhost:3000/abbbcd http://localhost:3000/abxyzcd
//!   curl http://localhost:3000/butterfly
//!   curl http://localhost:3000/users/34/books/8989
//!   curl http://localhost:3000/flights/LAX-SFO
//!   curl http://localhost:3000/plantae/Prunus.persica
//!   curl http://localhost:3000/user/42
//!   curl http://localhost:3000/example/d
//!   curl -X PUT http://localhost:3000/book
//!   curl http://localhost:3000/birds/about

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use regex::Regex;
use senda::{Chain, Outcome, Request, Response, Router, Server, chain};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), senda::Error> {
    tracing_subscriber::fmt::init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_owned());
    Server::bind(&format!("0.0.0.0:{port}"))?.serve(app()).await
}

fn app() -> Router {
    Router::new()
        // methods
        .get("/", |_req: Request| async { "GET request to the homepage" })
        .post("/", |_req: Request| async { "POST request to the homepage" })
        .all("/secret", |req: Request| async move {
            info!("Accessing the secret section ...");
            req.next()
        })
        .get("/secret", |_req: Request| async { "The secret section" })
        // string paths
        .get("/about", |_req: Request| async { "about" })
        .get("/random.text", |_req: Request| async { "random.text" })
        // string patterns
        .get("/ab?cd", |_req: Request| async { "ab?cd" })
        .get("/ab+cd", |_req: Request| async { "ab+cd" })
        .get("/ab*cd", |_req: Request| async { "ab*cd" })
        .get("/ab(cd)?e", |_req: Request| async { "ab(cd)?e" })
        // route parameters
        .get("/users/:userId/books/:bookId", params_as_json)
        .get("/flights/:from-:to", params_as_json)
        .get("/plantae/:genus.:species", params_as_json)
        .get("/user/:userId(\\d+)", params_as_json)
        // handler chains
        .get("/example/a", |_req: Request| async { "Hello from A!" })
        .get("/example/b", chain![announce, |_req: Request| async { "Hello from B!" }])
        .get("/example/c", chain![cb0, cb1, cb2])
        .get(
            "/example/d",
            Chain::new()
                .then(chain![cb0, cb1])
                .then(announce)
                .then(|_req: Request| async { "Hello from D!" }),
        )
        // chainable route handlers
        .route("/book", |r| {
            r.get(|_req: Request| async { "Get a random book" })
                .post(|_req: Request| async { "Add a book" })
                .put(|_req: Request| async { "Update the book" })
        })
        .mount("/birds", birds())
        // regular expressions match anywhere in the path, so they go last
        .get(regex("a"), |_req: Request| async { "/a/" })
        .get(regex(".*fly$"), |_req: Request| async { "/.*fly$/" })
}

fn birds() -> Router {
    Router::new()
        .all("/*", |req: Request| async move {
            let secs = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default();
            info!(time = secs, path = req.path(), "birds");
            req.next()
        })
        .get("/", |_req: Request| async { "Birds home page" })
        .get("/about", |_req: Request| async { "About birds" })
}

fn regex(source: &str) -> Regex {
    Regex::new(source).unwrap_or_else(|e| panic!("demo regex `{source}`: {e}"))
}

async fn params_as_json(req: Request) -> Result<Response, serde_json::Error> {
    let params: BTreeMap<_, _> = req.params().iter().collect();
    Ok(Response::json(serde_json::to_vec(&params)?))
}

async fn announce(req: Request) -> Outcome {
    info!("the response will be sent by the next function ...");
    req.next()
}

async fn cb0(req: Request) -> Outcome {
    info!("CB0");
    req.next()
}

async fn cb1(req: Request) -> Outcome {
    info!("CB1");
    req.next()
}

async fn cb2(_: Request) -> Response {
    Response::text("Hello from C!")
}

#[cfg(test)]
mod tests {
    use senda::Method;

    use super::*;

    async fn get(target: &str) -> (u16, String) {
        let res = app().handle(Request::new(Method::Get, target)).await;
        (res.status_code(), String::from_utf8_lossy(res.body()).into_owned())
    }

    #[tokio::test]
    async fn string_and_pattern_paths() {
        assert_eq!(get("/").await.1, "GET request to the homepage");
        assert_eq!(get("/secret").await.1, "The secret section");
        assert_eq!(get("/random.text").await.1, "random.text");
        assert_eq!(get("/acd").await.1, "ab?cd");
        assert_eq!(get("/abbbcd").await.1, "ab+cd");
        assert_eq!(get("/abRANDOMcd").await.1, "ab*cd");
        assert_eq!(get("/abcde").await.1, "ab(cd)?e");
    }

    #[tokio::test]
    async fn params_are_echoed_as_json() {
        let (status, body) = get("/users/34/books/8989").await;
        assert_eq!(status, 200);
        assert_eq!(body, r#"{"bookId":"8989","userId":"34"}"#);

        assert_eq!(get("/flights/LAX-SFO").await.1, r#"{"from":"LAX","to":"SFO"}"#);
        assert_eq!(get("/plantae/Prunus.persica").await.1, r#"{"genus":"Prunus","species":"persica"}"#);
        assert_eq!(get("/user/42").await.1, r#"{"userId":"42"}"#);
    }

    #[tokio::test]
    async fn decoded_params_stay_valid_json() {
        let (_, body) = get("/users/a%22b/books/1%5C").await;
        let parsed: BTreeMap<String, String> = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed["userId"], "a\"b");
        assert_eq!(parsed["bookId"], "1\\");
    }

    #[tokio::test]
    async fn chains_and_book_route() {
        assert_eq!(get("/example/c").await.1, "Hello from C!");
        assert_eq!(get("/example/d").await.1, "Hello from D!");

        let res = app().handle(Request::new(Method::Put, "/book")).await;
        assert_eq!(res.body(), b"Update the book");
    }

    #[tokio::test]
    async fn birds_are_served_before_the_regex_routes() {
        assert_eq!(get("/birds").await.1, "Birds home page");
        assert_eq!(get("/birds/about").await.1, "About birds");
        assert_eq!(get("/banana").await.1, "/a/");
        assert_eq!(get("/butterfly").await.1, "/.*fly$/");
        // "a" is tried first
        assert_eq!(get("/dragonfly").await.1, "/a/");
    }
}
