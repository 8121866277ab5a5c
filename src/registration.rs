// Registration form: field state, local validation and the submit flow
//
// Editing -> Submitting -> {Success, Failed}. Validation failures drop back
// to Editing without touching the network.

use crate::dispatcher::{ApiError, ResponseResult};
use crate::models::{RegisterRequest, Role};
use crate::services::Api;
use crate::transport::Transport;
use std::str::FromStr;
use thiserror::Error;

pub const SUCCESS_MARKER: &str = "success";
pub const REGISTERED_ALERT: &str = "Registration successful!";
pub const REGISTRATION_FAILED: &str = "Registration failed";
pub const REGISTRATION_ERROR_FALLBACK: &str =
    "Failed to register. Please check console for details.";

/// Whether a stringified backend response means the account was created.
///
/// The backend signals success with a textual marker rather than a status
/// field, so this is a case-insensitive search for "success".
pub fn indicates_success(response: &str) -> bool {
    response.to_lowercase().contains(SUCCESS_MARKER)
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Please fill in all fields")]
    MissingFields,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Unknown role: {0}")]
    UnknownRole(String),
}

#[derive(Error, Debug, PartialEq)]
pub enum RegistrationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),

    // The call went through but the body carried no success marker
    #[error("Registration not confirmed: {0}")]
    AmbiguousSuccess(String),
}

impl RegistrationError {
    // What the form shows inline
    pub fn display_message(&self) -> String {
        let message = match self {
            RegistrationError::Validation(e) => return e.to_string(),
            RegistrationError::Api(e) => (e.user_message(), REGISTRATION_ERROR_FALLBACK),
            RegistrationError::AmbiguousSuccess(body) => (body.clone(), REGISTRATION_FAILED),
        };

        match message {
            (text, fallback) if text.is_empty() => fallback.to_string(),
            (text, _) => text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Email,
    Phone,
    Password,
    ConfirmPassword,
    Role,
}

impl Field {
    // Input names as the page knows them
    pub fn wire_name(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Phone => "phone",
            Field::Password => "password",
            Field::ConfirmPassword => "confirmPassword",
            Field::Role => "role",
        }
    }
}

impl FromStr for Field {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Field::Name),
            "email" => Ok(Field::Email),
            "phone" => Ok(Field::Phone),
            "password" => Ok(Field::Password),
            "confirmPassword" => Ok(Field::ConfirmPassword),
            "role" => Ok(Field::Role),
            other => Err(ValidationError::UnknownField(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub confirm_password: String,
    pub role: Role,
}

impl FormState {
    /// Check the form locally and build the payload to send.
    ///
    /// Presence is a plain emptiness check; whitespace counts as filled in.
    pub fn validate(&self) -> Result<RegisterRequest, ValidationError> {
        let required = [
            &self.name,
            &self.email,
            &self.phone,
            &self.password,
            &self.confirm_password,
        ];
        if required.iter().any(|value| value.is_empty()) {
            return Err(ValidationError::MissingFields);
        }

        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }

        Ok(RegisterRequest {
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            password: self.password.clone(),
            role: self.role,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
        }
    }
}

// Side effects the form needs from whatever hosts it
pub trait Navigator {
    fn alert(&mut self, message: &str);
    fn navigate(&mut self, route: Route);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Editing,
    Submitting,
    Success,
    Failed,
}

#[derive(Debug)]
pub struct RegistrationForm {
    state: FormState,
    phase: Phase,
    error_message: Option<String>,
}

impl Default for RegistrationForm {
    fn default() -> Self {
        Self {
            state: FormState::default(),
            phase: Phase::Editing,
            error_message: None,
        }
    }
}

impl RegistrationForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    // Field edits never clear the phase or the displayed message
    pub fn set(&mut self, field: Field, value: impl Into<String>) -> Result<(), ValidationError> {
        let value = value.into();
        match field {
            Field::Name => self.state.name = value,
            Field::Email => self.state.email = value,
            Field::Phone => self.state.phone = value,
            Field::Password => self.state.password = value,
            Field::ConfirmPassword => self.state.confirm_password = value,
            Field::Role => {
                self.state.role = value.parse().map_err(ValidationError::UnknownRole)?;
            }
        }
        Ok(())
    }

    pub fn set_role(&mut self, role: Role) {
        self.state.role = role;
    }

    /// Apply a change keyed by input name, e.g. `("confirmPassword", "p")`.
    pub fn handle_change(&mut self, name: &str, value: &str) -> Result<(), ValidationError> {
        let field: Field = name.parse()?;
        self.set(field, value)
    }

    // "Already have an account?" link
    pub fn go_to_login<N: Navigator>(&self, navigator: &mut N) {
        navigator.navigate(Route::Login);
    }

    /// Run one registration attempt.
    ///
    /// On success the user is alerted and sent to the login view. Every
    /// failure leaves its message in `error_message()` and the form stays
    /// usable for another attempt.
    pub async fn submit<T, N>(
        &mut self,
        api: &Api<T>,
        navigator: &mut N,
    ) -> Result<(), RegistrationError>
    where
        T: Transport,
        N: Navigator,
    {
        self.phase = Phase::Submitting;

        let payload = match self.state.validate() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, "registration form rejected");
                self.phase = Phase::Editing;
                self.error_message = Some(e.to_string());
                return Err(e.into());
            }
        };

        let result = match api.user().register(&payload).await {
            Ok(response) => Self::classify(response),
            Err(e) => {
                tracing::error!(error = %e, "Registration error");
                Err(RegistrationError::Api(e))
            }
        };

        match result {
            Ok(()) => {
                tracing::info!(email = %payload.email, "registration succeeded");
                self.phase = Phase::Success;
                self.error_message = None;
                navigator.alert(REGISTERED_ALERT);
                navigator.navigate(Route::Login);
                Ok(())
            }
            Err(e) => {
                self.phase = Phase::Failed;
                self.error_message = Some(e.display_message());
                Err(e)
            }
        }
    }

    fn classify(response: ResponseResult) -> Result<(), RegistrationError> {
        let body = response.stringify();
        if indicates_success(&body) {
            Ok(())
        } else {
            Err(RegistrationError::AmbiguousSuccess(body))
        }
    }
}
