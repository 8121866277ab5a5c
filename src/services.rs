// Endpoint groups over the dispatcher: user, booking, hotels

use crate::config::{ClientConfig, ClientError};
use crate::dispatcher::{ApiError, Dispatcher, RequestOptions, ResponseResult};
use crate::models::{Credentials, RegisterRequest};
use crate::transport::{ReqwestTransport, Transport};
use serde::Serialize;
use std::fmt::Display;

pub const LOGIN_PATH: &str = "/api/user/login";
pub const REGISTER_PATH: &str = "/api/user/register";
pub const BOOKING_PATH: &str = "/api/booking";
pub const HOTELS_PATH: &str = "/api/hotels";

fn json_body<B: Serialize + ?Sized>(body: &B) -> Result<RequestOptions, ApiError> {
    serde_json::to_string(body)
        .map(RequestOptions::post)
        .map_err(|e| ApiError::Serialization(e.to_string()))
}

/// Centralized access to the TravelSathi backend.
pub struct Api<T: Transport> {
    dispatcher: Dispatcher<T>,
}

impl Api<ReqwestTransport> {
    // Production client talking HTTP through reqwest
    pub fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        Self::new(config, ReqwestTransport::new())
    }
}

impl<T: Transport> Api<T> {
    pub fn new(config: ClientConfig, transport: T) -> Result<Self, ClientError> {
        Ok(Self {
            dispatcher: Dispatcher::new(config, transport)?,
        })
    }

    pub fn base_url(&self) -> &str {
        self.dispatcher.base_url()
    }

    pub fn dispatcher(&self) -> &Dispatcher<T> {
        &self.dispatcher
    }

    pub fn user(&self) -> UserApi<'_, T> {
        UserApi {
            dispatcher: &self.dispatcher,
        }
    }

    pub fn booking(&self) -> BookingApi<'_, T> {
        BookingApi {
            dispatcher: &self.dispatcher,
        }
    }

    pub fn hotels(&self) -> HotelsApi<'_, T> {
        HotelsApi {
            dispatcher: &self.dispatcher,
        }
    }
}

pub struct UserApi<'a, T: Transport> {
    dispatcher: &'a Dispatcher<T>,
}

impl<'a, T: Transport> UserApi<'a, T> {
    pub async fn login(&self, credentials: &Credentials) -> Result<ResponseResult, ApiError> {
        self.dispatcher
            .request(LOGIN_PATH, json_body(credentials)?)
            .await
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<ResponseResult, ApiError> {
        self.dispatcher
            .request(REGISTER_PATH, json_body(request)?)
            .await
    }
}

pub struct BookingApi<'a, T: Transport> {
    dispatcher: &'a Dispatcher<T>,
}

impl<'a, T: Transport> BookingApi<'a, T> {
    // The booking shape belongs to the backend; any serializable value goes
    pub async fn create<B>(&self, booking: &B) -> Result<ResponseResult, ApiError>
    where
        B: Serialize + Sync + ?Sized,
    {
        self.dispatcher
            .request(BOOKING_PATH, json_body(booking)?)
            .await
    }

    pub async fn get_all(&self) -> Result<ResponseResult, ApiError> {
        self.dispatcher
            .request(BOOKING_PATH, RequestOptions::get())
            .await
    }

    pub async fn get_by_id(&self, id: impl Display) -> Result<ResponseResult, ApiError> {
        self.dispatcher
            .request(&format!("{}/{}", BOOKING_PATH, id), RequestOptions::get())
            .await
    }
}

pub struct HotelsApi<'a, T: Transport> {
    dispatcher: &'a Dispatcher<T>,
}

impl<'a, T: Transport> HotelsApi<'a, T> {
    pub async fn get_all(&self) -> Result<ResponseResult, ApiError> {
        self.dispatcher
            .request(HOTELS_PATH, RequestOptions::get())
            .await
    }

    pub async fn get_by_id(&self, id: impl Display) -> Result<ResponseResult, ApiError> {
        self.dispatcher
            .request(&format!("{}/{}", HOTELS_PATH, id), RequestOptions::get())
            .await
    }
}
