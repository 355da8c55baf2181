use std::{future::Future, path::Path};

use api_types::{
    DataBody, Entity,
    auth::{AuthResponse, ChangePassword, Register, SignIn},
    envelope::{ErrorEnvelope, List, Single},
    upload::UploadedFile,
};
use engine::{
    DeleteSink, ListPage, ListQuery, ListSource, Resource, Session, WireRecord,
    listing::DEFAULT_PAGE_SIZE,
};
use reqwest::{Method, RequestBuilder, Url, multipart};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::error::{AppError, Result};

const GENERIC_FAILURE: &str = "Something went wrong!";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Server(String),
    #[error("server unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Maps a failed response to a [`ClientError`]. `message` is the server's
/// own message when the body was a known error envelope.
pub fn error_for_status(status: u16, message: Option<String>) -> ClientError {
    let message = message.unwrap_or_else(|| GENERIC_FAILURE.to_string());
    match status {
        401 => ClientError::Unauthorized,
        403 => ClientError::Forbidden,
        404 => ClientError::NotFound,
        400 | 422 => ClientError::Validation(message),
        _ => ClientError::Server(message),
    }
}

/// Text shown to the user in a toast.
pub fn user_message(err: &ClientError) -> String {
    match err {
        ClientError::Unauthorized => "Invalid identifier or password.".to_string(),
        ClientError::Forbidden => "You are not allowed to do that.".to_string(),
        ClientError::NotFound => "Not found.".to_string(),
        ClientError::Validation(message) | ClientError::Server(message) => message.clone(),
        ClientError::Transport(_) => GENERIC_FAILURE.to_string(),
    }
}

/// Makes sure `Url::join` appends to the base path instead of replacing its
/// last segment.
pub fn normalize_base_url(base_url: &str) -> std::result::Result<Url, String> {
    let trimmed = base_url.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    Url::parse(&with_slash).map_err(|err| format!("invalid base_url {trimmed}: {err}"))
}

#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    http: reqwest::Client,
}

impl Client {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = normalize_base_url(base_url).map_err(AppError::BaseUrl)?;
        Ok(Self {
            base_url,
            http: reqwest::Client::new(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        session: Option<&Session>,
    ) -> std::result::Result<RequestBuilder, ClientError> {
        let endpoint = self
            .base_url
            .join(path)
            .map_err(|err| ClientError::Server(format!("invalid endpoint {path}: {err}")))?;
        tracing::debug!("{method} {endpoint}");
        let builder = self.http.request(method, endpoint);
        Ok(match session {
            Some(session) => builder.header(reqwest::header::AUTHORIZATION, session.bearer()),
            None => builder,
        })
    }

    async fn send<R: DeserializeOwned>(
        builder: RequestBuilder,
    ) -> std::result::Result<R, ClientError> {
        let res = builder.send().await?;

        if res.status().is_success() {
            return Ok(res.json::<R>().await?);
        }

        let status = res.status();
        let message = res
            .json::<ErrorEnvelope>()
            .await
            .ok()
            .map(|envelope| envelope.error.message);
        tracing::error!("request failed with {status}: {message:?}");
        Err(error_for_status(status.as_u16(), message))
    }

    pub async fn sign_in(&self, body: &SignIn) -> std::result::Result<AuthResponse, ClientError> {
        let builder = self.request(Method::POST, "auth/local", None)?.json(body);
        Self::send(builder).await
    }

    pub async fn register(
        &self,
        body: &Register,
    ) -> std::result::Result<AuthResponse, ClientError> {
        let builder = self
            .request(Method::POST, "auth/local/register", None)?
            .json(body);
        Self::send(builder).await
    }

    pub async fn change_password(
        &self,
        session: &Session,
        body: &ChangePassword,
    ) -> std::result::Result<AuthResponse, ClientError> {
        let builder = self
            .request(Method::POST, "auth/change-password", Some(session))?
            .json(body);
        Self::send(builder).await
    }

    /// One page of `resource`, decoded into `T`.
    pub async fn list<T: WireRecord>(
        &self,
        session: &Session,
        resource: Resource,
        query: &ListQuery,
    ) -> std::result::Result<ListPage<T>, ClientError> {
        let builder = self
            .request(Method::GET, resource.route(), Some(session))?
            .query(query.pairs());
        let envelope: List<T::Wire> = Self::send(builder).await?;
        let page_size = query
            .get("pagination[pageSize]")
            .and_then(|size| size.parse().ok())
            .unwrap_or(DEFAULT_PAGE_SIZE);
        Ok(ListPage::from_envelope(envelope, page_size))
    }

    /// A single record with every relation populated.
    pub async fn get<T: WireRecord>(
        &self,
        session: &Session,
        resource: Resource,
        id: u64,
    ) -> std::result::Result<T, ClientError> {
        let builder = self
            .request(Method::GET, &format!("{}/{id}", resource.route()), Some(session))?
            .query(&[("populate", "*")]);
        let envelope: Single<T::Wire> = Self::send(builder).await?;
        Ok(T::from(envelope.data))
    }

    /// Creates a record and returns its id.
    pub async fn create<B: Serialize>(
        &self,
        session: &Session,
        resource: Resource,
        data: &B,
    ) -> std::result::Result<u64, ClientError> {
        let builder = self
            .request(Method::POST, resource.route(), Some(session))?
            .json(&DataBody { data });
        let created: Single<Entity<serde_json::Value>> = Self::send(builder).await?;
        tracing::info!("created {} #{}", resource.route(), created.data.id);
        Ok(created.data.id)
    }

    pub async fn update<B: Serialize>(
        &self,
        session: &Session,
        resource: Resource,
        id: u64,
        data: &B,
    ) -> std::result::Result<(), ClientError> {
        let builder = self
            .request(Method::PUT, &format!("{}/{id}", resource.route()), Some(session))?
            .json(&DataBody { data });
        let _: Single<Entity<serde_json::Value>> = Self::send(builder).await?;
        tracing::info!("updated {} #{id}", resource.route());
        Ok(())
    }

    pub async fn delete(
        &self,
        session: &Session,
        resource: Resource,
        id: u64,
    ) -> std::result::Result<(), ClientError> {
        let builder =
            self.request(Method::DELETE, &format!("{}/{id}", resource.route()), Some(session))?;
        let _: serde_json::Value = Self::send(builder).await?;
        Ok(())
    }

    /// Uploads a receipt and returns the stored file.
    pub async fn upload(
        &self,
        session: &Session,
        path: &Path,
    ) -> std::result::Result<UploadedFile, ClientError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|err| ClientError::Validation(format!("cannot read {}: {err}", path.display())))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "receipt".to_string());
        let form = multipart::Form::new()
            .part("files", multipart::Part::bytes(bytes).file_name(file_name));
        let builder = self
            .request(Method::POST, "upload", Some(session))?
            .multipart(form);
        let files: Vec<UploadedFile> = Self::send(builder).await?;
        files
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::Server("upload returned no file".to_string()))
    }
}

/// A client bound to a session, usable from spawned tasks.
#[derive(Debug, Clone)]
pub struct Authed {
    client: Client,
    session: Session,
}

impl Authed {
    pub fn new(client: Client, session: Session) -> Self {
        Self { client, session }
    }

    pub async fn get<T: WireRecord>(
        &self,
        resource: Resource,
        id: u64,
    ) -> std::result::Result<T, ClientError> {
        self.client.get(&self.session, resource, id).await
    }
}

impl<T: WireRecord> ListSource<T> for Authed {
    type Error = ClientError;

    fn list(
        &self,
        resource: Resource,
        query: &ListQuery,
    ) -> impl Future<Output = std::result::Result<ListPage<T>, Self::Error>> + Send {
        self.client.list::<T>(&self.session, resource, query)
    }
}

impl DeleteSink for Authed {
    type Error = ClientError;

    fn delete(
        &self,
        resource: Resource,
        id: u64,
    ) -> impl Future<Output = std::result::Result<(), Self::Error>> + Send {
        self.client.delete(&self.session, resource, id)
    }
}
