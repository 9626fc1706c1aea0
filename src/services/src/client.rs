use std::{sync::Arc, time::Duration};

use harness_config::{HarnessConfig, ServiceConfig, ServiceKind};
use reqwest::{
    blocking::{Client, RequestBuilder, Response},
    cookie::{CookieStore, Jar},
    redirect::Policy,
    Method, StatusCode, Url,
};
use serde::Serialize;
use tracing::debug;

use crate::{ServiceError, ServiceResult};

/// HTTP access to one backend. URLs come from the configured service
/// descriptor and API path table; responses are returned untouched so the
/// caller decides what a status code means.
pub struct ServiceClient<'c> {
    config: &'c HarnessConfig,
    service: ServiceKind,
    base_url: Url,
    jar: Arc<Jar>,
    http: Client,
}

impl<'c> ServiceClient<'c> {
    pub fn new(config: &'c HarnessConfig, service: ServiceKind) -> ServiceResult<Self> {
        Self::with_jar(config, service, Arc::new(Jar::default()))
    }

    fn with_jar(config: &'c HarnessConfig, service: ServiceKind, jar: Arc<Jar>) -> ServiceResult<Self> {
        let descriptor = config.service(service)?;
        let base_url = parse_url(&descriptor.base_url())?;

        let settings = config.http();
        let mut builder = Client::builder()
            .cookie_provider(jar.clone())
            .redirect(Policy::none())
            .danger_accept_invalid_certs(!settings.verify_tls);
        if let Some(secs) = settings.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(ServiceClient {
            config,
            service,
            base_url,
            jar,
            http: builder.build()?,
        })
    }

    pub fn config(&self) -> &'c HarnessConfig {
        self.config
    }

    pub fn service(&self) -> ServiceKind {
        self.service
    }

    pub fn descriptor(&self) -> ServiceResult<&'c ServiceConfig> {
        Ok(self.config.service(self.service)?)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves `resource`/`key` from the API path table and fills in `params`.
    pub fn url(&self, resource: &str, key: &str, params: &[&str]) -> ServiceResult<Url> {
        let path = self.config.api().path(self.service, resource, key, params)?;
        self.base_url
            .join(&path)
            .map_err(|err| ServiceError::Url {
                url: format!("{}{path}", self.base_url),
                reason: err.to_string(),
            })
    }

    pub fn request(
        &self,
        method: Method,
        resource: &str,
        key: &str,
        params: &[&str],
    ) -> ServiceResult<RequestBuilder> {
        let url = self.url(resource, key, params)?;
        debug!(service = %self.service, %method, %url, "request");
        Ok(self.http.request(method, url))
    }

    pub fn get(
        &self,
        resource: &str,
        key: &str,
        params: &[&str],
        query: &[(&str, &str)],
    ) -> ServiceResult<Response> {
        let response = self.request(Method::GET, resource, key, params)?.query(query).send()?;
        Ok(trace(response))
    }

    pub fn post_form(
        &self,
        resource: &str,
        key: &str,
        params: &[&str],
        form: &[(&str, &str)],
    ) -> ServiceResult<Response> {
        let response = self.request(Method::POST, resource, key, params)?.form(form).send()?;
        Ok(trace(response))
    }

    pub fn post_json<T: Serialize + ?Sized>(
        &self,
        resource: &str,
        key: &str,
        params: &[&str],
        body: &T,
    ) -> ServiceResult<Response> {
        let response = self.request(Method::POST, resource, key, params)?.json(body).send()?;
        Ok(trace(response))
    }

    pub fn put_json<T: Serialize + ?Sized>(
        &self,
        resource: &str,
        key: &str,
        params: &[&str],
        body: &T,
    ) -> ServiceResult<Response> {
        let response = self.request(Method::PUT, resource, key, params)?.json(body).send()?;
        Ok(trace(response))
    }

    pub fn delete(&self, resource: &str, key: &str, params: &[&str]) -> ServiceResult<Response> {
        let response = self.request(Method::DELETE, resource, key, params)?.send()?;
        Ok(trace(response))
    }

    /// Value of cookie `name` as it would be sent to this service.
    pub fn cookie(&self, name: &str) -> Option<String> {
        let header = self.jar.cookies(&self.base_url)?;
        let header = header.to_str().ok()?;
        header.split("; ").find_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            (key == name).then(|| value.to_string())
        })
    }

    /// A fresh client for `service` with `cookies` already in its jar.
    pub fn sibling(&self, service: ServiceKind, cookies: &[(&str, &str)]) -> ServiceResult<ServiceClient<'c>> {
        let jar = Arc::new(Jar::default());
        let client = Self::with_jar(self.config, service, jar)?;
        for (name, value) in cookies {
            client.set_cookie(name, value);
        }
        Ok(client)
    }

    pub fn set_cookie(&self, name: &str, value: &str) {
        self.jar
            .add_cookie_str(&format!("{name}={value}; Path=/"), &self.base_url);
    }
}

fn parse_url(url: &str) -> ServiceResult<Url> {
    Url::parse(url).map_err(|err| ServiceError::Url {
        url: url.to_string(),
        reason: err.to_string(),
    })
}

fn trace(response: Response) -> Response {
    debug!(status = %response.status(), url = %response.url(), "response");
    response
}

/// Reachability check against the shared `google-server` host.
pub fn ping(config: &HarnessConfig) -> ServiceResult<StatusCode> {
    let client = ServiceClient::new(config, ServiceKind::GoogleServer)?;
    Ok(client.get("health", "GET", &[], &[])?.status())
}
