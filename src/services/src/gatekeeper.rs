use dao::Dao;
use harness_config::{HarnessConfig, ServiceKind};
use model::{latest_verification_code, Application, Group, User};
use reqwest::{blocking::Response, header::LOCATION};
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    response::{csrf_token, envelope, Envelope},
    ServiceClient, ServiceError, ServiceResult,
};

pub const SESSION_COOKIE: &str = "sessionid";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    Unauthenticated,
    /// Credentials accepted, the second factor is still outstanding.
    PendingVerification,
    Authenticated,
}

/// Gatekeeper (single sign-on) client. Tracks the login state of the session
/// it holds.
pub struct GateKeeperService<'c> {
    client: ServiceClient<'c>,
    state: LoginState,
    /// Session cookie issued with the credentials, before the second factor.
    pending_cookie: Option<String>,
}

impl<'c> GateKeeperService<'c> {
    pub fn new(config: &'c HarnessConfig) -> ServiceResult<Self> {
        Ok(GateKeeperService {
            client: ServiceClient::new(config, ServiceKind::Gatekeeper)?,
            state: LoginState::Unauthenticated,
            pending_cookie: None,
        })
    }

    pub fn client(&self) -> &ServiceClient<'c> {
        &self.client
    }

    pub fn state(&self) -> LoginState {
        self.state
    }

    pub fn session_cookie(&self) -> Option<String> {
        self.client.cookie(SESSION_COOKIE)
    }

    /// Posts the login form. The returned response is whatever the service
    /// answered; the session state is updated from it.
    pub fn login(&mut self, username: &str, password: &str) -> ServiceResult<Response> {
        let page = self.client.get("login", "GET", &[], &[])?;
        let token = csrf_token(&page.text()?)?;

        let mut form = vec![("username", username), ("password", password)];
        if let Some(token) = token.as_deref() {
            form.push(("csrfmiddlewaretoken", token));
        }
        let response = self.client.post_form("login", "POST", &[], &form)?;

        self.pending_cookie = None;
        self.state = if redirects_to_verification(&response) {
            self.pending_cookie = self.session_cookie();
            LoginState::PendingVerification
        } else if self.session_cookie().is_some() {
            LoginState::Authenticated
        } else {
            LoginState::Unauthenticated
        };
        info!(username, state = ?self.state, status = %response.status(), "login");
        Ok(response)
    }

    /// Logs in with the credentials configured for the gatekeeper.
    pub fn login_as_admin(&mut self) -> ServiceResult<Response> {
        let credentials = self
            .client
            .descriptor()?
            .credentials
            .clone()
            .ok_or_else(|| ServiceError::MissingCredentials(ServiceKind::Gatekeeper.to_string()))?;
        self.login(&credentials.username, &credentials.password)
    }

    /// Submits a verification code. The session only becomes authenticated
    /// when the gatekeeper redirects out of the verify flow and rotates the
    /// session cookie; anything else leaves the login pending.
    pub fn verify(&mut self, code: &str) -> ServiceResult<Response> {
        let response = self
            .client
            .post_form("login_verify", "POST", &[], &[("code", code)])?;
        let cookie = self.session_cookie();
        let accepted = response.status().is_redirection()
            && !redirects_to_verification(&response)
            && cookie.is_some()
            && cookie != self.pending_cookie;
        if accepted {
            self.state = LoginState::Authenticated;
            self.pending_cookie = None;
        } else {
            warn!(status = %response.status(), state = ?self.state, "verification rejected");
        }
        Ok(response)
    }

    /// Finishes a pending two-factor login with the code the gatekeeper
    /// stored for `user_id`.
    pub fn complete_two_factor(&mut self, dao: &mut dyn Dao, user_id: i64) -> ServiceResult<Response> {
        let code = latest_verification_code(dao, user_id)?
            .ok_or(ServiceError::NoVerificationCode(user_id))?;
        self.verify(&code)
    }

    pub fn logout(&mut self) -> ServiceResult<Response> {
        let response = self.client.get("logout", "GET", &[], &[])?;
        self.state = LoginState::Unauthenticated;
        self.pending_cookie = None;
        info!(status = %response.status(), "logout");
        Ok(response)
    }

    /// A new gatekeeper session for another user. Fails unless that user ends
    /// up fully authenticated.
    pub fn as_user(&self, username: &str, password: &str) -> ServiceResult<GateKeeperService<'c>> {
        let mut session = GateKeeperService::new(self.client.config())?;
        let response = session.login(username, password)?;
        if session.state != LoginState::Authenticated {
            return Err(ServiceError::LoginFailed {
                username: username.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(session)
    }

    /// A client for another backend carrying this session's cookie.
    pub fn session_client(&self, service: ServiceKind) -> ServiceResult<ServiceClient<'c>> {
        let cookie = self.session_cookie().ok_or(ServiceError::NotLoggedIn)?;
        self.client.sibling(service, &[(SESSION_COOKIE, &cookie)])
    }

    pub fn session_info(&self) -> ServiceResult<Envelope> {
        envelope(self.client.get("session", "v1", &[], &[])?)
    }

    pub fn validate_permission(&self, application: &str, codename: &str) -> ServiceResult<Response> {
        self.client
            .get("permission", "v1_check", &[application, codename], &[])
    }

    pub fn list_users(&self, query: &[(&str, &str)]) -> ServiceResult<Response> {
        self.client.get("user", "v1", &[], query)
    }

    pub fn get_user(&self, id: &str) -> ServiceResult<Response> {
        self.client.get("user", "v1_item", &[id], &[])
    }

    pub fn create_user(&self, user: &User) -> ServiceResult<Response> {
        self.client.post_json("user", "v1", &[], user)
    }

    pub fn update_user(&self, id: &str, user: &User) -> ServiceResult<Response> {
        self.client.put_json("user", "v1_item", &[id], user)
    }

    pub fn delete_user(&self, id: &str) -> ServiceResult<Response> {
        self.client.delete("user", "v1_item", &[id])
    }

    pub fn list_applications(&self) -> ServiceResult<Response> {
        self.client.get("application", "v1", &[], &[])
    }

    pub fn create_application(&self, application: &Application) -> ServiceResult<Response> {
        self.client.post_json("application", "v1", &[], application)
    }

    pub fn update_application(&self, id: &str, application: &Application) -> ServiceResult<Response> {
        self.client.put_json("application", "v1_item", &[id], application)
    }

    pub fn delete_application(&self, id: &str) -> ServiceResult<Response> {
        self.client.delete("application", "v1_item", &[id])
    }

    pub fn list_groups(&self) -> ServiceResult<Response> {
        self.client.get("group", "v1", &[], &[])
    }

    pub fn create_group(&self, group: &Group) -> ServiceResult<Response> {
        self.client.post_json("group", "v1", &[], group)
    }

    pub fn add_group_members<T: Serialize + ?Sized>(&self, id: &str, members: &T) -> ServiceResult<Response> {
        self.client.put_json("group", "v1_item", &[id], members)
    }

    pub fn delete_group(&self, id: &str) -> ServiceResult<Response> {
        self.client.delete("group", "v1_item", &[id])
    }
}

fn redirects_to_verification(response: &Response) -> bool {
    response.status().is_redirection()
        && response
            .headers()
            .get(LOCATION)
            .and_then(|location| location.to_str().ok())
            .is_some_and(|location| location.contains("verify"))
}
