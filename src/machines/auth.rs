// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2025-2026 Marquee Contributors

//! Session machine: startup check, login and registration forms, logout.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::actor::Actor;
use crate::api_error::ApiError;
use crate::builder::transitions::goto;
use crate::builder::FsmBuilder;
use crate::clients::identity::{login_response, sign_in_error, sign_up_error, AuthProvider};
use crate::entity::{LoginRequest, LoginResponse, RegisterRequest, User};
use crate::machine::StateMachine;
use crate::service::Service;
use crate::types::{FsmAction, FsmContext, FsmResult, Invocation, Transition};
use crate::{EventVariant, StateVariant};

pub const LOGIN_USER: &str = "loginUser";
pub const REGISTER_USER: &str = "registerUser";
pub const LOGOUT_USER: &str = "logoutUser";

#[derive(Clone, Debug, PartialEq, StateVariant)]
pub enum LoginForm {
    Idle,
    #[fsm(tag = "loading")]
    LoggingIn,
}

#[derive(Clone, Debug, PartialEq, StateVariant)]
pub enum RegisterForm {
    Idle,
    #[fsm(tag = "loading")]
    Registering,
}

#[derive(Clone, Debug, PartialEq, StateVariant)]
pub enum AuthState {
    AwaitingCheck,
    /// Resolved immediately on entry.
    CheckingAuth,
    #[fsm(nested)]
    ShowingLogin(LoginForm),
    #[fsm(nested)]
    ShowingRegister(RegisterForm),
    Authenticated,
}

#[derive(Clone, Debug, EventVariant)]
pub enum AuthEvent {
    /// Startup check; `session` is the user the provider already knows, if any.
    CheckAuthentication { session: Option<User> },
    Login { email: String, password: String },
    Register {
        name: String,
        email: String,
        password: String,
    },
    Logout,
    ShowRegisterForm,
    ShowLoginForm,
    LoginSucceeded {
        invocation: Invocation,
        output: LoginResponse,
    },
    LoginFailed {
        invocation: Invocation,
        error: ApiError,
    },
    RegisterSucceeded {
        invocation: Invocation,
        output: LoginResponse,
    },
    RegisterFailed {
        invocation: Invocation,
        error: ApiError,
    },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AuthContext {
    pub name: String,
    pub email: String,
    pub password: String,
    pub user: Option<User>,
    pub error: Option<ApiError>,
}

impl AuthContext {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

impl FsmContext for AuthContext {
    fn describe(&self) -> String {
        format!(
            "auth(user={}, error={})",
            self.user.as_ref().map_or("-", |u| u.id.as_str()),
            self.error.as_ref().map_or("-", |e| e.message())
        )
    }
}

#[derive(Clone, Debug)]
pub enum AuthAction {
    LoginUser {
        invocation: Invocation,
        request: LoginRequest,
    },
    RegisterUser {
        invocation: Invocation,
        request: RegisterRequest,
    },
    /// End the provider session. Nothing is reported back.
    EndSession,
}

#[async_trait::async_trait]
impl FsmAction for AuthAction {
    type Event = AuthEvent;
    type Actors = AuthActors;

    fn invocation(&self) -> Option<&Invocation> {
        match self {
            AuthAction::LoginUser { invocation, .. }
            | AuthAction::RegisterUser { invocation, .. } => Some(invocation),
            AuthAction::EndSession => None,
        }
    }

    async fn execute(&self, actors: &AuthActors) -> Option<AuthEvent> {
        match self {
            AuthAction::LoginUser {
                invocation,
                request,
            } => {
                let invocation = *invocation;
                Some(match actors.login_user.call(request.clone()).await {
                    Ok(output) => AuthEvent::LoginSucceeded { invocation, output },
                    Err(error) => AuthEvent::LoginFailed { invocation, error },
                })
            }
            AuthAction::RegisterUser {
                invocation,
                request,
            } => {
                let invocation = *invocation;
                Some(match actors.register_user.call(request.clone()).await {
                    Ok(output) => AuthEvent::RegisterSucceeded { invocation, output },
                    Err(error) => AuthEvent::RegisterFailed { invocation, error },
                })
            }
            AuthAction::EndSession => {
                if let Err(err) = actors.logout_user.call(()).await {
                    warn!(error = %err, "logout failed");
                }
                None
            }
        }
    }

    // Requests carry passwords.
    fn describe(&self) -> String {
        match self {
            AuthAction::LoginUser { invocation, .. } => format!("LoginUser({invocation})"),
            AuthAction::RegisterUser { invocation, .. } => format!("RegisterUser({invocation})"),
            AuthAction::EndSession => "EndSession".to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AuthActors {
    pub login_user: Actor<LoginRequest, LoginResponse>,
    pub register_user: Actor<RegisterRequest, LoginResponse>,
    pub logout_user: Actor<(), ()>,
}

impl Default for AuthActors {
    fn default() -> Self {
        Self {
            login_user: Actor::unbound(LOGIN_USER),
            register_user: Actor::unbound(REGISTER_USER),
            logout_user: Actor::unbound(LOGOUT_USER),
        }
    }
}

impl AuthActors {
    pub fn with_login_user<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(LoginRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<LoginResponse, ApiError>> + Send + 'static,
    {
        self.login_user = Actor::from_fn(LOGIN_USER, f);
        self
    }

    pub fn with_register_user<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(RegisterRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<LoginResponse, ApiError>> + Send + 'static,
    {
        self.register_user = Actor::from_fn(REGISTER_USER, f);
        self
    }

    pub fn with_logout_user<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(()) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ApiError>> + Send + 'static,
    {
        self.logout_user = Actor::from_fn(LOGOUT_USER, f);
        self
    }

    /// Wire every slot to `provider`.
    pub fn bind(provider: Arc<dyn AuthProvider>) -> Self {
        let login = Arc::clone(&provider);
        let register = Arc::clone(&provider);
        let logout = provider;

        Self::default()
            .with_login_user(move |request: LoginRequest| {
                let provider = Arc::clone(&login);
                async move {
                    let account = provider
                        .sign_in(&request.email, &request.password)
                        .await
                        .map_err(|err| {
                            error!(code = ?err.code, error = %err, "sign-in failed");
                            sign_in_error(&err)
                        })?;
                    login_response(&account, &request.email)
                }
            })
            .with_register_user(move |request: RegisterRequest| {
                let provider = Arc::clone(&register);
                async move {
                    let account = provider
                        .sign_up(&request.name, &request.email, &request.password)
                        .await
                        .map_err(|err| {
                            error!(code = ?err.code, error = %err, "sign-up failed");
                            sign_up_error(&err)
                        })?;
                    login_response(&account, &request.email)
                }
            })
            .with_logout_user(move |()| {
                let provider = Arc::clone(&logout);
                async move {
                    provider
                        .sign_out()
                        .await
                        .map_err(|err| ApiError::unknown_with_cause("Failed to sign out", err))
                }
            })
    }
}

pub type AuthMachine = StateMachine<AuthState, AuthEvent, AuthContext, AuthAction>;
pub type AuthService = Service<AuthState, AuthEvent, AuthContext, AuthAction>;

pub fn machine() -> FsmResult<AuthMachine> {
    let builder: FsmBuilder<AuthState, AuthEvent, AuthContext, AuthAction> =
        FsmBuilder::new(AuthState::AwaitingCheck);
    builder
        .when("AwaitingCheck")
        .on("CheckAuthentication", |_state, event, ctx: &mut AuthContext| {
            if let AuthEvent::CheckAuthentication { session } = event {
                ctx.user = session.clone();
            }
            goto(AuthState::CheckingAuth)
        })
        .done()
        .when("CheckingAuth")
        .always_if(AuthContext::is_authenticated, |_state, ctx| {
            ctx.error = None;
            goto(AuthState::Authenticated)
        })
        .always(|_state, _ctx| goto(AuthState::ShowingLogin(LoginForm::Idle)))
        .done()
        .when("ShowingLogin.Idle")
        .on("Login", |_state, event, ctx| {
            if let AuthEvent::Login { email, password } = event {
                ctx.email = email.clone();
                ctx.password = password.clone();
            }
            goto(AuthState::ShowingLogin(LoginForm::LoggingIn))
        })
        .on("ShowRegisterForm", |_state, _event, ctx| {
            ctx.error = None;
            goto(AuthState::ShowingRegister(RegisterForm::Idle))
        })
        .done()
        .when("ShowingLogin.LoggingIn")
        .invoke(LOGIN_USER, |_state, ctx: &AuthContext, invocation| {
            AuthAction::LoginUser {
                invocation,
                request: LoginRequest {
                    email: ctx.email.clone(),
                    password: ctx.password.clone(),
                },
            }
        })
        .on("LoginSucceeded", |_state, event, ctx| {
            if let AuthEvent::LoginSucceeded { output, .. } = event {
                ctx.user = Some(output.user.clone());
                ctx.error = None;
            }
            goto(AuthState::Authenticated)
        })
        .on("LoginFailed", |_state, event, ctx| {
            if let AuthEvent::LoginFailed { error, .. } = event {
                ctx.error = Some(error.clone());
            }
            goto(AuthState::ShowingLogin(LoginForm::Idle))
        })
        .done()
        .when("ShowingRegister.Idle")
        .on("Register", |_state, event, ctx| {
            if let AuthEvent::Register {
                name,
                email,
                password,
            } = event
            {
                ctx.name = name.clone();
                ctx.email = email.clone();
                ctx.password = password.clone();
            }
            goto(AuthState::ShowingRegister(RegisterForm::Registering))
        })
        .on("ShowLoginForm", |_state, _event, ctx| {
            ctx.error = None;
            goto(AuthState::ShowingLogin(LoginForm::Idle))
        })
        .done()
        .when("ShowingRegister.Registering")
        .invoke(REGISTER_USER, |_state, ctx: &AuthContext, invocation| {
            AuthAction::RegisterUser {
                invocation,
                request: RegisterRequest {
                    name: ctx.name.clone(),
                    email: ctx.email.clone(),
                    password: ctx.password.clone(),
                },
            }
        })
        .on("RegisterSucceeded", |_state, event, ctx| {
            if let AuthEvent::RegisterSucceeded { output, .. } = event {
                ctx.user = Some(output.user.clone());
                ctx.error = None;
            }
            goto(AuthState::Authenticated)
        })
        .on("RegisterFailed", |_state, event, ctx| {
            if let AuthEvent::RegisterFailed { error, .. } = event {
                ctx.error = Some(error.clone());
            }
            goto(AuthState::ShowingRegister(RegisterForm::Idle))
        })
        .done()
        .when("Authenticated")
        .on("Logout", |_state, _event, ctx| {
            *ctx = AuthContext::default();
            Transition::to(AuthState::ShowingLogin(LoginForm::Idle))
                .with_action(AuthAction::EndSession)
                .build()
        })
        .done()
        .when_unhandled(|state, event| {
            debug!(state = %state.state_path(), event = event.variant_name(), "auth event ignored");
        })
        .build()
}

pub fn service(actors: AuthActors) -> FsmResult<AuthService> {
    Ok(Service::new(machine()?, AuthContext::default(), actors))
}
