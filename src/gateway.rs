//! The only component permitted to talk to the campus API. Requests ride an
//! ambient cookie session held by the reqwest client; nothing here attaches or
//! reads tokens manually, and nothing here writes application state — callers
//! (SessionStore, the boards) own their own updates.

use std::future::Future;

use anyhow::{Context, Result};
use reqwest::Url;
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::models::{
    Course, CourseUpdate, Enrollment, Identity, LoginRequest, NewCourse, ProfileUpdate,
    RegisterRequest,
};

/// Identity operations consumed by the SessionStore.
pub trait SessionGateway: Send + Sync {
    fn check_session(&self) -> impl Future<Output = ApiResult<Identity>> + Send;
    fn login(&self, req: &LoginRequest) -> impl Future<Output = ApiResult<Identity>> + Send;
    fn register(&self, req: &RegisterRequest) -> impl Future<Output = ApiResult<Identity>> + Send;
    fn logout(&self) -> impl Future<Output = ApiResult<()>> + Send;
}

/// Catalog and enrollment operations consumed by the view-model boards.
pub trait EnrollmentGateway: Send + Sync {
    fn list_courses(&self) -> impl Future<Output = ApiResult<Vec<Course>>> + Send;
    fn my_enrollments(&self) -> impl Future<Output = ApiResult<Vec<Enrollment>>> + Send;
    fn enroll(&self, course_id: i64) -> impl Future<Output = ApiResult<Enrollment>> + Send;
    fn unenroll(&self, enrollment_id: i64) -> impl Future<Output = ApiResult<()>> + Send;
}

/// Profile picture payload; the server accepts either an inline base64 image
/// or a URL reference.
#[derive(Debug, Clone)]
pub enum PictureSource {
    Base64(String),
    Url(String),
}

// --- Wire envelopes (the server wraps mutation results in a message object) ---

#[derive(Deserialize)]
struct UserEnvelope {
    user: Identity,
}

#[derive(Deserialize)]
struct UsersEnvelope {
    users: Vec<Identity>,
}

#[derive(Deserialize)]
struct EnrollmentEnvelope {
    enrollment: Enrollment,
}

#[derive(Deserialize)]
struct CourseEnvelope {
    course: Course,
}

#[derive(Deserialize)]
struct PictureEnvelope {
    picture_url: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// HTTP gateway to the campus API. Clones share the underlying client and its
/// cookie store, so one login covers every handle.
#[derive(Clone)]
pub struct HttpGateway {
    base: Url,
    client: reqwest::Client,
}

impl HttpGateway {
    pub fn new(base: &str) -> Result<Self> {
        let base = Url::parse(base).context("invalid base URL")?;
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { base, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> ApiResult<Url> {
        self.base
            .join(path)
            .map_err(|e| ApiError::server("bad_url".to_string(), e.to_string()))
    }

    /// Turn a non-success response into a typed error, preferring the server's
    /// own `{"error": ...}` message over a bare status line.
    async fn failure(resp: reqwest::Response) -> ApiError {
        let status = resp.status().as_u16();
        let message = match resp.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => format!("HTTP {}", status),
        };
        ApiError::from_status(status, message)
    }

    async fn expect_ok(resp: reqwest::Response) -> ApiResult<reqwest::Response> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            Err(Self::failure(resp).await)
        }
    }

    // --- Course management (teacher/admin surface) ---

    pub async fn get_course(&self, course_id: i64) -> ApiResult<Course> {
        let resp = self.client.get(self.url(&format!("/courses/{}", course_id))?).send().await?;
        Ok(Self::expect_ok(resp).await?.json::<Course>().await?)
    }

    pub async fn create_course(&self, req: &NewCourse) -> ApiResult<Course> {
        let resp = self.client.post(self.url("/courses")?).json(req).send().await?;
        Ok(Self::expect_ok(resp).await?.json::<CourseEnvelope>().await?.course)
    }

    pub async fn update_course(&self, course_id: i64, req: &CourseUpdate) -> ApiResult<Course> {
        let resp = self
            .client
            .put(self.url(&format!("/courses/{}", course_id))?)
            .json(req)
            .send()
            .await?;
        Ok(Self::expect_ok(resp).await?.json::<CourseEnvelope>().await?.course)
    }

    pub async fn delete_course(&self, course_id: i64) -> ApiResult<()> {
        let resp = self.client.delete(self.url(&format!("/courses/{}", course_id))?).send().await?;
        Self::expect_ok(resp).await?;
        Ok(())
    }

    // --- Users and profiles ---

    pub async fn list_users(&self) -> ApiResult<Vec<Identity>> {
        let resp = self.client.get(self.url("/users")?).send().await?;
        Ok(Self::expect_ok(resp).await?.json::<UsersEnvelope>().await?.users)
    }

    pub async fn fetch_profile(&self, user_id: i64) -> ApiResult<Identity> {
        let resp = self.client.get(self.url(&format!("/users/profile/{}", user_id))?).send().await?;
        Ok(Self::expect_ok(resp).await?.json::<Identity>().await?)
    }

    pub async fn update_profile(&self, user_id: i64, req: &ProfileUpdate) -> ApiResult<Identity> {
        let resp = self
            .client
            .put(self.url(&format!("/users/profile/{}", user_id))?)
            .json(req)
            .send()
            .await?;
        Ok(Self::expect_ok(resp).await?.json::<UserEnvelope>().await?.user)
    }

    pub async fn upload_picture(&self, user_id: i64, source: &PictureSource) -> ApiResult<String> {
        let body = match source {
            PictureSource::Base64(data) => serde_json::json!({ "picture_base64": data }),
            PictureSource::Url(url) => serde_json::json!({ "picture_url": url }),
        };
        let resp = self
            .client
            .post(self.url(&format!("/users/profile/{}/picture", user_id))?)
            .json(&body)
            .send()
            .await?;
        Ok(Self::expect_ok(resp).await?.json::<PictureEnvelope>().await?.picture_url)
    }
}

impl SessionGateway for HttpGateway {
    async fn check_session(&self) -> ApiResult<Identity> {
        let resp = self.client.get(self.url("/auth/me")?).send().await?;
        Ok(Self::expect_ok(resp).await?.json::<Identity>().await?)
    }

    async fn login(&self, req: &LoginRequest) -> ApiResult<Identity> {
        let resp = self.client.post(self.url("/auth/login")?).json(req).send().await?;
        // The session cookie arrives on this response; the cookie store keeps it.
        Ok(Self::expect_ok(resp).await?.json::<UserEnvelope>().await?.user)
    }

    async fn register(&self, req: &RegisterRequest) -> ApiResult<Identity> {
        let resp = self.client.post(self.url("/auth/register")?).json(req).send().await?;
        Ok(Self::expect_ok(resp).await?.json::<UserEnvelope>().await?.user)
    }

    async fn logout(&self) -> ApiResult<()> {
        let resp = self.client.post(self.url("/auth/logout")?).send().await?;
        Self::expect_ok(resp).await?;
        Ok(())
    }
}

impl EnrollmentGateway for HttpGateway {
    async fn list_courses(&self) -> ApiResult<Vec<Course>> {
        let resp = self.client.get(self.url("/courses")?).send().await?;
        Ok(Self::expect_ok(resp).await?.json::<Vec<Course>>().await?)
    }

    async fn my_enrollments(&self) -> ApiResult<Vec<Enrollment>> {
        let resp = self.client.get(self.url("/enrollments/my-enrollments")?).send().await?;
        Ok(Self::expect_ok(resp).await?.json::<Vec<Enrollment>>().await?)
    }

    async fn enroll(&self, course_id: i64) -> ApiResult<Enrollment> {
        let resp = self
            .client
            .post(self.url("/enrollments")?)
            .json(&serde_json::json!({ "course_id": course_id }))
            .send()
            .await?;
        Ok(Self::expect_ok(resp).await?.json::<EnrollmentEnvelope>().await?.enrollment)
    }

    async fn unenroll(&self, enrollment_id: i64) -> ApiResult<()> {
        let resp = self
            .client
            .delete(self.url(&format!("/enrollments/{}", enrollment_id))?)
            .send()
            .await?;
        Self::expect_ok(resp).await?;
        Ok(())
    }
}
