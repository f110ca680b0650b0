//! Users: the authenticated principal and session logout.

use serde::de::IgnoredAny;
use storefront_api_models::UserRead;

use crate::descriptor::{HTTP_BEARER, HttpMethod, OperationDescriptor};
use crate::error::ClientResult;
use crate::facade::{ApiFacade, Endpoint};

/// `GET /api/v1/users/me`
pub static GET_AUTHENTICATED_USER: OperationDescriptor = OperationDescriptor {
    id: "users:get_authenticated",
    method: HttpMethod::Get,
    path: "/api/v1/users/me",
    params: &[],
    security: Some(HTTP_BEARER),
};

/// `GET /api/v1/auth/logout`
pub static LOGOUT: OperationDescriptor = OperationDescriptor {
    id: "auth:logout",
    method: HttpMethod::Get,
    path: "/api/v1/auth/logout",
    params: &[],
    security: Some(HTTP_BEARER),
};

/// Typed [`GET_AUTHENTICATED_USER`].
pub const GET_AUTHENTICATED_USER_ENDPOINT: Endpoint<(), UserRead> =
    Endpoint::new(&GET_AUTHENTICATED_USER);
/// Typed [`LOGOUT`]; the response body is discarded.
pub const LOGOUT_ENDPOINT: Endpoint<(), IgnoredAny> = Endpoint::new(&LOGOUT);

/// Typed operations on the current user.
#[derive(Debug, Clone, Copy)]
pub struct UsersApi<'a> {
    facade: &'a ApiFacade,
}

impl<'a> UsersApi<'a> {
    pub(crate) const fn new(facade: &'a ApiFacade) -> Self {
        Self { facade }
    }

    /// Fetch the user the credential belongs to.
    ///
    /// # Errors
    ///
    /// The kind matching the response classification.
    pub async fn get_authenticated_user(&self) -> ClientResult<UserRead> {
        self.facade.call(GET_AUTHENTICATED_USER_ENDPOINT, ()).await
    }

    /// End the server-side session.
    ///
    /// # Errors
    ///
    /// The kind matching the response classification.
    pub async fn logout(&self) -> ClientResult<()> {
        self.facade.call(LOGOUT_ENDPOINT, ()).await.map(|_| ())
    }
}
