// Client library for the TravelSathi booking backend

pub mod config;
pub mod dispatcher;
pub mod models;
pub mod registration;
pub mod services;
pub mod transport;

// Re-export key types for convenience
pub use config::{ClientConfig, ClientError};
pub use dispatcher::{ApiError, Dispatcher, RequestOptions, ResponseResult};
pub use models::{Credentials, RegisterRequest, Role};
pub use registration::{
    indicates_success, Field, FormState, Navigator, Phase, RegistrationError, RegistrationForm,
    Route, ValidationError,
};
pub use services::{Api, BookingApi, HotelsApi, UserApi};
pub use transport::{HttpRequest, RawResponse, ReqwestTransport, Transport};
