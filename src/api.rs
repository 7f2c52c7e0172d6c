// API client module: a small blocking HTTP client for the note service's
// open API. Every call is signed with OAuth 1.0a; the client holds the
// application's consumer key and, once authorized, the user's access
// credentials.

use reqwest::blocking::{multipart, Client, RequestBuilder, Response};
use reqwest::header::AUTHORIZATION;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, info};

use crate::auth::OAuthService;
use crate::config::AppConfig;
use crate::credentials::{Credentials, TemporaryCredential};
use crate::error::ApiError;
use crate::import::{NewNote, NoteService};
use crate::oauth::{self, Signer, TokenRef};

const REQUEST_TOKEN_PATH: &str = "/oauth/request_token";
const AUTHORIZE_PATH: &str = "/oauth/authorize";
const ACCESS_TOKEN_PATH: &str = "/oauth/access_token";
const USER_INFO_PATH: &str = "/yws/open/user/get.json";
const NOTEBOOK_ALL_PATH: &str = "/yws/open/notebook/all.json";
const NOTEBOOK_CREATE_PATH: &str = "/yws/open/notebook/create.json";
const NOTE_CREATE_PATH: &str = "/yws/open/note/create.json";

/// Out-of-band callback: the service shows the verifier to the user
/// instead of redirecting.
const OOB_CALLBACK: &str = "oob";

/// Account details returned by the user-info endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserInfo {
    pub user: String,
    #[serde(default)]
    pub total_size: Option<i64>,
    #[serde(default)]
    pub used_size: Option<i64>,
    #[serde(default)]
    pub register_time: Option<i64>,
    #[serde(default)]
    pub last_login_time: Option<i64>,
    #[serde(default)]
    pub default_notebook: Option<String>,
}

/// A remote notebook. `path` is what notes are created against.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NotebookInfo {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub notes_num: Option<i64>,
    #[serde(default)]
    pub create_time: Option<i64>,
    #[serde(default)]
    pub modify_time: Option<i64>,
}

impl NotebookInfo {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        NotebookInfo {
            name: name.into(),
            path: path.into(),
            notes_num: None,
            create_time: None,
            modify_time: None,
        }
    }
}

/// `{"path": ...}` answer of the create endpoints.
#[derive(Deserialize, Debug)]
struct PathResponse {
    path: String,
}

/// Blocking client for the note service. No timeout is configured: a
/// stalled call blocks the run, matching the sequential CLI flow.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    signer: Signer,
    credentials: Option<Credentials>,
}

impl ApiClient {
    pub fn new(config: &AppConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(ApiClient {
            client,
            base_url: config.base_url.clone(),
            signer: Signer::new(&config.consumer_key, &config.consumer_secret),
            credentials: None,
        })
    }

    /// Attach access credentials for subsequent API calls.
    pub fn set_credentials(&mut self, credentials: Credentials) {
        self.credentials = Some(credentials);
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn access_token(&self) -> Result<TokenRef<'_>, ApiError> {
        self.credentials
            .as_ref()
            .map(|c| TokenRef {
                token: &c.token,
                secret: &c.secret,
            })
            .ok_or(ApiError::MissingCredentials)
    }

    fn signed(
        &self,
        builder: RequestBuilder,
        method: &str,
        url: &str,
        token: Option<TokenRef<'_>>,
        oauth_extra: &[(&str, &str)],
        params: &[(&str, &str)],
    ) -> Result<RequestBuilder, ApiError> {
        let header = self
            .signer
            .authorization_header(method, url, token, oauth_extra, params)?;
        Ok(builder.header(AUTHORIZATION, header))
    }

    /// Turn a non-2xx response into an `ApiError` carrying the body.
    fn check_response(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        debug!(status = %status, body = %body, "request failed");
        Err(ApiError::from_status(status, &body))
    }

    fn parse_json<T: DeserializeOwned>(response: Response, what: &str) -> Result<T, ApiError> {
        let body = response.text()?;
        serde_json::from_str(&body)
            .map_err(|e| ApiError::InvalidResponse(format!("{}: {} ({})", what, e, body)))
    }

    /// Signed GET against a token endpoint, returning the form-encoded pair.
    fn token_request(
        &self,
        path: &str,
        token: Option<TokenRef<'_>>,
        oauth_extra: &[(&str, &str)],
    ) -> Result<(String, String), ApiError> {
        let url = self.url(path);
        let req = self.signed(self.client.get(&url), "GET", &url, token, oauth_extra, &[])?;
        let res = Self::check_response(req.send()?)?;
        let body = res.text()?;
        let mut form = oauth::parse_form(&body);
        match (form.remove("oauth_token"), form.remove("oauth_token_secret")) {
            (Some(token), Some(secret)) => Ok((token, secret)),
            _ => Err(ApiError::InvalidResponse(format!(
                "token response without oauth_token/oauth_token_secret: {}",
                body
            ))),
        }
    }

    /// Fetch the authorized user's account information.
    pub fn user_info(&self) -> Result<UserInfo, ApiError> {
        let url = self.url(USER_INFO_PATH);
        let token = self.access_token()?;
        let req = self.signed(self.client.get(&url), "GET", &url, Some(token), &[], &[])?;
        let res = Self::check_response(req.send()?)?;
        Self::parse_json(res, "user info")
    }

    /// List every notebook of the authorized user.
    pub fn list_notebooks(&self) -> Result<Vec<NotebookInfo>, ApiError> {
        let url = self.url(NOTEBOOK_ALL_PATH);
        let token = self.access_token()?;
        let req = self.signed(self.client.post(&url), "POST", &url, Some(token), &[], &[])?;
        let res = Self::check_response(req.send()?)?;
        Self::parse_json(res, "notebook list")
    }
}

impl OAuthService for ApiClient {
    fn request_temporary_credentials(&self) -> Result<TemporaryCredential, ApiError> {
        let (token, secret) =
            self.token_request(REQUEST_TOKEN_PATH, None, &[("oauth_callback", OOB_CALLBACK)])?;
        Ok(TemporaryCredential { token, secret })
    }

    fn authorization_url(&self, temporary: &TemporaryCredential) -> String {
        format!(
            "{}?oauth_token={}",
            self.url(AUTHORIZE_PATH),
            oauth::encode(&temporary.token)
        )
    }

    fn request_token(
        &self,
        temporary: &TemporaryCredential,
        verifier: &str,
    ) -> Result<Credentials, ApiError> {
        let token = TokenRef {
            token: &temporary.token,
            secret: &temporary.secret,
        };
        let (token, secret) =
            self.token_request(ACCESS_TOKEN_PATH, Some(token), &[("oauth_verifier", verifier)])?;
        Ok(Credentials {
            token,
            secret,
            access_token: None,
        })
    }
}

impl NoteService for ApiClient {
    fn create_notebook(&self, name: &str) -> Result<NotebookInfo, ApiError> {
        let url = self.url(NOTEBOOK_CREATE_PATH);
        let token = self.access_token()?;
        let params = [("name", name)];
        let req = self.signed(
            self.client.post(&url).form(&params),
            "POST",
            &url,
            Some(token),
            &[],
            &params,
        )?;
        let res = Self::check_response(req.send()?)?;
        let created: PathResponse = Self::parse_json(res, "notebook create")?;
        info!(name = %name, path = %created.path, "notebook created");
        Ok(NotebookInfo::new(name, created.path))
    }

    fn find_notebook(&self, name: &str) -> Result<NotebookInfo, ApiError> {
        self.list_notebooks()?
            .into_iter()
            .find(|nb| nb.name == name)
            .ok_or_else(|| ApiError::NotFound(format!("notebook {}", name)))
    }

    fn create_note(&self, note: &NewNote<'_>) -> Result<String, ApiError> {
        let url = self.url(NOTE_CREATE_PATH);
        let token = self.access_token()?;
        // Multipart fields are not part of the OAuth signature.
        let mut form = multipart::Form::new()
            .text("title", note.title.to_string())
            .text("author", note.author.to_string())
            .text("source", note.source.to_string())
            .text("content", note.content.clone());
        if !note.notebook.is_empty() {
            form = form.text("notebook", note.notebook.to_string());
        }
        let req = self.signed(
            self.client.post(&url).multipart(form),
            "POST",
            &url,
            Some(token),
            &[],
            &[],
        )?;
        let res = Self::check_response(req.send()?)?;
        let created: PathResponse = Self::parse_json(res, "note create")?;
        Ok(created.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        let config = AppConfig {
            consumer_key: "ck".into(),
            consumer_secret: "cs".into(),
            base_url: "https://note.example.com".into(),
        };
        ApiClient::new(&config).unwrap()
    }

    #[test]
    fn test_authorization_url() {
        let tmp = TemporaryCredential {
            token: "a b/c".into(),
            secret: "s".into(),
        };
        assert_eq!(
            client().authorization_url(&tmp),
            "https://note.example.com/oauth/authorize?oauth_token=a%20b%2Fc"
        );
    }

    #[test]
    fn test_calls_need_credentials() {
        let c = client();
        assert!(matches!(c.user_info(), Err(ApiError::MissingCredentials)));
        assert!(matches!(c.create_notebook("x"), Err(ApiError::MissingCredentials)));
    }

    #[test]
    fn test_parse_notebook_list() {
        let json = r#"[{"path":"/4AF64012E9864C","name":"notes","notes_num":3,"create_time":1323310917}]"#;
        let books: Vec<NotebookInfo> = serde_json::from_str(json).unwrap();
        assert_eq!(books[0].name, "notes");
        assert_eq!(books[0].path, "/4AF64012E9864C");
        assert_eq!(books[0].notes_num, Some(3));
        assert_eq!(books[0].modify_time, None);
    }

    #[test]
    fn test_parse_user_info() {
        let json = r#"{"user":"alice","total_size":1073741824,"used_size":2048,"register_time":1323310917,"last_login_time":1323310917,"last_modify_time":1323310917,"default_notebook":"/ABC"}"#;
        let info: UserInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.user, "alice");
        assert_eq!(info.default_notebook.as_deref(), Some("/ABC"));
    }
}
