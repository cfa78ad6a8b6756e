//! Shared harness for the HTTP integration tests: an app over a temporary
//! database, a mail transport that records instead of sending, and request
//! helpers.

use std::sync::{Arc, Mutex};

use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use reviewd::{
    api::{AppState, router},
    auth::{AuthKeys, MailError, Mailer, fresh_secret},
    db::{self, DbPool, run_migrations},
    models::{NewUser, Role, User},
};

/// One recorded message: recipient and body text.
pub type SentMail = (String, String);

/// Mail transport that captures messages for assertions.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<SentMail>>,
}

impl Mailer for RecordingMailer {
    fn send(&self, to: &str, _subject: &str, body: &str) -> Result<(), MailError> {
        self.sent
            .lock()
            .expect("mailer lock")
            .push((to.to_owned(), body.to_owned()));
        Ok(())
    }
}

impl RecordingMailer {
    /// The body of the most recent message sent to `to`.
    pub fn last_body_to(&self, to: &str) -> Option<String> {
        self.sent
            .lock()
            .expect("mailer lock")
            .iter()
            .rev()
            .find(|(recipient, _)| recipient == to)
            .map(|(_, body)| body.clone())
    }
}

pub struct TestApp {
    pub router: Router,
    pub pool: DbPool,
    pub keys: Arc<AuthKeys>,
    pub mailer: Arc<RecordingMailer>,
    _dir: tempfile::TempDir,
}

/// A pool holding exactly one connection, so concurrent requests serialise.
async fn single_conn_pool(db_url: &str) -> DbPool {
    use diesel_async::pooled_connection::{AsyncDieselConnectionManager, ManagerConfig, bb8::Pool};
    let mut config = ManagerConfig::default();
    config.custom_setup = Box::new(db::establish_connection);
    let manager = AsyncDieselConnectionManager::<db::DbConnection>::new_with_config(db_url, config);
    Pool::builder()
        .max_size(1)
        .build(manager)
        .await
        .expect("pool")
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_inner(false).await
    }

    /// An app whose pool holds a single connection; two in-flight requests
    /// cannot interleave their queries.
    pub async fn spawn_serialized() -> Self {
        Self::spawn_inner(true).await
    }

    async fn spawn_inner(serialize: bool) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("test.db");
        let db_url = db_path.to_str().expect("utf8 path").to_owned();
        let pool = if serialize {
            single_conn_pool(&db_url).await
        } else {
            db::establish_pool(&db_url).await.expect("pool")
        };
        run_migrations(&pool, &db_url).await.expect("migrations");
        let keys = Arc::new(AuthKeys::new("test-secret", 3_600, 3_600));
        let mailer = Arc::new(RecordingMailer::default());
        let state = AppState {
            pool: pool.clone(),
            keys: Arc::clone(&keys),
            mailer: mailer.clone(),
        };
        Self {
            router: router(state),
            pool,
            keys,
            mailer,
            _dir: dir,
        }
    }

    /// Insert an account directly, bypassing the signup flow.
    pub async fn seed_user(&self, username: &str, role: Role) -> User {
        let email = format!("{username}@example.com");
        let secret = fresh_secret();
        let mut conn = self.pool.get().await.expect("connection");
        db::create_user(
            &mut conn,
            &NewUser {
                username,
                email: &email,
                role,
                bio: "",
                first_name: "",
                last_name: "",
                is_superuser: false,
                confirmation_secret: &secret,
            },
        )
        .await
        .expect("seed user")
    }

    /// Mint a bearer token for a seeded account.
    pub fn token_for(&self, user: &User) -> String {
        self.keys.tokens.issue(user).expect("token")
    }

    /// Issue a request against the in-process router.
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        bearer: Option<&str>,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");
        self.router.clone().oneshot(request).await.expect("response")
    }
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

/// Pull the confirmation code out of a recorded mail body.
pub fn code_from_mail(body: &str) -> String {
    body.rsplit(' ')
        .next()
        .expect("code in mail body")
        .to_owned()
}
