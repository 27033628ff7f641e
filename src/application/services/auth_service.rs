//! Authentication Service
//!
//! Handles sign-up, email confirmation, sign-in, JWT token management, and
//! refresh sessions.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::{distr::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::JwtSettings;
use crate::domain::{
    Session, SessionRepository, Token, TokenRepository, TokenType, User, UserRepository, UserRole,
};
use crate::infrastructure::email::{confirmation_mail_body, Mailer};
use crate::shared::snowflake::SnowflakeGenerator;

/// Length of the random body of a purpose token
const TOKEN_BODY_LENGTH: usize = 48;

/// Authentication service trait for dependency injection
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a new, inactive user and dispatch a confirmation mail
    async fn sign_up(&self, request: SignUpDto) -> Result<User, AuthError>;

    /// Redeem a confirm-email token, activating the account
    async fn confirm_email(&self, token_body: &str) -> Result<(), AuthError>;

    /// Authenticate with email-or-username and password
    async fn sign_in(&self, login: &str, password: &str) -> Result<AuthTokens, AuthError>;

    /// Refresh access token using refresh token (rotates the pair)
    async fn refresh_token(&self, refresh_token: &str) -> Result<AuthTokens, AuthError>;

    /// Revoke refresh token (logout)
    async fn revoke_token(&self, refresh_token: &str) -> Result<(), AuthError>;
}

/// Sign-up input, already format-validated at the request boundary
#[derive(Debug, Clone)]
pub struct SignUpDto {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Authentication tokens response
#[derive(Debug, Clone, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub token_type: String,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at time (Unix timestamp)
    pub iat: i64,
}

/// Authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account not activated")]
    NotActivated,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token not found")]
    TokenNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("Email already exists")]
    EmailExists,

    #[error("Username already exists")]
    UsernameExists,

    #[error("Session not found or expired")]
    SessionNotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// AuthService implementation
pub struct AuthServiceImpl<U, S, T, M>
where
    U: UserRepository,
    S: SessionRepository,
    T: TokenRepository,
    M: Mailer,
{
    user_repo: Arc<U>,
    session_repo: Arc<S>,
    token_repo: Arc<T>,
    mailer: Arc<M>,
    id_generator: Arc<SnowflakeGenerator>,
    jwt_settings: JwtSettings,
    frontend_url: String,
}

impl<U, S, T, M> AuthServiceImpl<U, S, T, M>
where
    U: UserRepository,
    S: SessionRepository,
    T: TokenRepository,
    M: Mailer,
{
    /// Create a new AuthServiceImpl
    pub fn new(
        user_repo: Arc<U>,
        session_repo: Arc<S>,
        token_repo: Arc<T>,
        mailer: Arc<M>,
        id_generator: Arc<SnowflakeGenerator>,
        jwt_settings: JwtSettings,
        frontend_url: String,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            token_repo,
            mailer,
            id_generator,
            jwt_settings,
            frontend_url,
        }
    }

    /// Hash a password using Argon2id
    fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// Verify a password against its hash
    fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AuthError::Internal(format!("Invalid password hash: {}", e)))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Generate access and refresh tokens
    fn generate_tokens(&self, user_id: i64) -> Result<AuthTokens, AuthError> {
        let now = Utc::now();
        let access_expiry = now + Duration::hours(self.jwt_settings.access_token_expiry_hours);

        let access_claims = Claims {
            sub: user_id.to_string(),
            exp: access_expiry.timestamp(),
            iat: now.timestamp(),
        };

        let access_token = encode(
            &Header::default(),
            &access_claims,
            &EncodingKey::from_secret(self.jwt_settings.secret.as_bytes()),
        )
        .map_err(|e| AuthError::Internal(format!("Token generation failed: {}", e)))?;

        // Opaque refresh token, no user data embedded
        let refresh_token = format!("{}.{}", uuid::Uuid::new_v4(), uuid::Uuid::new_v4());

        Ok(AuthTokens {
            access_token,
            refresh_token,
            expires_in: self.jwt_settings.access_token_expiry_hours * 3600,
            token_type: "Bearer".to_string(),
        })
    }

    /// Hash refresh token for storage
    fn hash_refresh_token(&self, token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Persist a session row for a freshly minted refresh token
    async fn store_session(&self, user_id: i64, refresh_token: &str) -> Result<(), AuthError> {
        let token_hash = self.hash_refresh_token(refresh_token);
        let session = Session::new(
            user_id,
            token_hash,
            Utc::now() + Duration::days(self.jwt_settings.refresh_token_expiry_days),
        );

        self.session_repo
            .create(&session)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        Ok(())
    }

    /// Random unguessable token body
    fn generate_token_body(&self) -> String {
        rand::rng()
            .sample_iter(Alphanumeric)
            .take(TOKEN_BODY_LENGTH)
            .map(char::from)
            .collect()
    }
}

/// Decode and validate an access token against the given secret,
/// returning the user id it carries. Also used by the principal
/// middleware.
pub fn decode_access_token(token: &str, secret: &str) -> Result<i64, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    token_data
        .claims
        .sub
        .parse::<i64>()
        .map_err(|_| AuthError::InvalidToken)
}

#[async_trait]
impl<U, S, T, M> AuthService for AuthServiceImpl<U, S, T, M>
where
    U: UserRepository + 'static,
    S: SessionRepository + 'static,
    T: TokenRepository + 'static,
    M: Mailer + 'static,
{
    async fn sign_up(&self, request: SignUpDto) -> Result<User, AuthError> {
        // Uniqueness: username first, then email
        if self
            .user_repo
            .username_exists(&request.username)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
        {
            return Err(AuthError::UsernameExists);
        }

        if self
            .user_repo
            .email_exists(&request.email)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
        {
            return Err(AuthError::EmailExists);
        }

        let password_hash = self.hash_password(&request.password)?;

        let now = Utc::now();
        let user = User {
            id: self.id_generator.generate(),
            first_name: request.first_name,
            last_name: request.last_name,
            username: request.username,
            email: request.email,
            password_hash,
            role: UserRole::User,
            active: false,
            followers: Vec::new(),
            avatar_url: None,
            created_at: now,
            updated_at: now,
        };

        let created_user = self
            .user_repo
            .create(&user)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        // Confirmation token and mail. Neither failure rolls back the
        // created user record.
        let token = Token {
            id: self.id_generator.generate(),
            body: self.generate_token_body(),
            user_id: created_user.id,
            token_type: TokenType::ConfirmEmail,
            created_at: Utc::now(),
        };

        let token = self
            .token_repo
            .create(&token)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        self.mailer
            .send(
                &created_user.email,
                "Confirm your email",
                &confirmation_mail_body(&self.frontend_url, &token.body),
            )
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        tracing::info!(user_id = created_user.id, "User signed up");

        Ok(created_user)
    }

    async fn confirm_email(&self, token_body: &str) -> Result<(), AuthError> {
        let token = self
            .token_repo
            .find_by_body(token_body, TokenType::ConfirmEmail)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .ok_or(AuthError::TokenNotFound)?;

        if token.is_expired(Utc::now()) {
            // Single-use either way
            self.token_repo
                .delete(token.id)
                .await
                .map_err(|e| AuthError::Internal(e.to_string()))?;
            return Err(AuthError::TokenExpired);
        }

        self.user_repo
            .activate(token.user_id)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        self.token_repo
            .delete(token.id)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        tracing::info!(user_id = token.user_id, "Account activated");

        Ok(())
    }

    async fn sign_in(&self, login: &str, password: &str) -> Result<AuthTokens, AuthError> {
        let user = self
            .user_repo
            .find_by_login(login)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.verify_password(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        if !user.active {
            return Err(AuthError::NotActivated);
        }

        let tokens = self.generate_tokens(user.id)?;
        self.store_session(user.id, &tokens.refresh_token).await?;

        tracing::info!(user_id = user.id, "User signed in");

        Ok(tokens)
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<AuthTokens, AuthError> {
        let token_hash = self.hash_refresh_token(refresh_token);

        let session = self
            .session_repo
            .find_by_token_hash(&token_hash)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .ok_or(AuthError::SessionNotFound)?;

        if !session.is_active() {
            return Err(AuthError::TokenExpired);
        }

        // Rotate the refresh token on every use
        let new_tokens = self.generate_tokens(session.user_id)?;
        let new_token_hash = self.hash_refresh_token(&new_tokens.refresh_token);
        let new_expires_at =
            Utc::now() + Duration::days(self.jwt_settings.refresh_token_expiry_days);

        self.session_repo
            .update_token_hash(session.id, &new_token_hash, new_expires_at)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        Ok(new_tokens)
    }

    async fn revoke_token(&self, refresh_token: &str) -> Result<(), AuthError> {
        let token_hash = self.hash_refresh_token(refresh_token);

        let session = self
            .session_repo
            .find_by_token_hash(&token_hash)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .ok_or(AuthError::SessionNotFound)?;

        self.session_repo
            .revoke(session.id)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::session::MockSessionRepository;
    use crate::domain::entities::token::MockTokenRepository;
    use crate::domain::entities::user::MockUserRepository;
    use crate::infrastructure::email::MockMailer;
    use mockall::predicate::eq;

    fn jwt_settings() -> JwtSettings {
        JwtSettings {
            secret: "test-secret-that-is-at-least-32-chars!!".into(),
            access_token_expiry_hours: 3,
            refresh_token_expiry_days: 7,
        }
    }

    fn service(
        user_repo: MockUserRepository,
        session_repo: MockSessionRepository,
        token_repo: MockTokenRepository,
        mailer: MockMailer,
    ) -> AuthServiceImpl<MockUserRepository, MockSessionRepository, MockTokenRepository, MockMailer>
    {
        AuthServiceImpl::new(
            Arc::new(user_repo),
            Arc::new(session_repo),
            Arc::new(token_repo),
            Arc::new(mailer),
            Arc::new(SnowflakeGenerator::new(1, 0)),
            jwt_settings(),
            "http://localhost:3000".into(),
        )
    }

    fn sign_up_request() -> SignUpDto {
        SignUpDto {
            first_name: "Jack".into(),
            last_name: "Bourne".into(),
            username: "jackb".into(),
            email: "jack@example.com".into(),
            password: "Passw0rd".into(),
        }
    }

    fn hash_of(password: &str) -> String {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_sign_up_creates_inactive_user_and_sends_mail() {
        let mut user_repo = MockUserRepository::new();
        let mut token_repo = MockTokenRepository::new();
        let mut mailer = MockMailer::new();

        user_repo
            .expect_username_exists()
            .with(eq("jackb"))
            .times(1)
            .returning(|_| Ok(false));
        user_repo
            .expect_email_exists()
            .with(eq("jack@example.com"))
            .times(1)
            .returning(|_| Ok(false));
        user_repo
            .expect_create()
            .withf(|u: &User| !u.active && u.username == "jackb")
            .times(1)
            .returning(|u| Ok(u.clone()));
        token_repo
            .expect_create()
            .withf(|t: &Token| t.token_type == TokenType::ConfirmEmail && !t.body.is_empty())
            .times(1)
            .returning(|t| Ok(t.clone()));
        mailer
            .expect_send()
            .withf(|to: &str, _subject: &str, _body: &str| to == "jack@example.com")
            .times(1)
            .returning(|_, _, _| Ok(()));

        let service = service(user_repo, MockSessionRepository::new(), token_repo, mailer);
        let user = service.sign_up(sign_up_request()).await.unwrap();

        assert!(!user.active);
        assert_eq!(user.email, "jack@example.com");
    }

    #[tokio::test]
    async fn test_sign_up_duplicate_username_rejected_before_email_check() {
        let mut user_repo = MockUserRepository::new();

        user_repo
            .expect_username_exists()
            .times(1)
            .returning(|_| Ok(true));
        // No expectation for email_exists: reaching it would panic the mock,
        // asserting the username check runs first.

        let service = service(
            user_repo,
            MockSessionRepository::new(),
            MockTokenRepository::new(),
            MockMailer::new(),
        );
        let result = service.sign_up(sign_up_request()).await;

        assert!(matches!(result, Err(AuthError::UsernameExists)));
    }

    #[tokio::test]
    async fn test_sign_up_duplicate_email_rejected() {
        let mut user_repo = MockUserRepository::new();

        user_repo
            .expect_username_exists()
            .times(1)
            .returning(|_| Ok(false));
        user_repo
            .expect_email_exists()
            .times(1)
            .returning(|_| Ok(true));

        let service = service(
            user_repo,
            MockSessionRepository::new(),
            MockTokenRepository::new(),
            MockMailer::new(),
        );
        let result = service.sign_up(sign_up_request()).await;

        assert!(matches!(result, Err(AuthError::EmailExists)));
    }

    #[tokio::test]
    async fn test_sign_in_rejects_inactive_account_with_correct_credentials() {
        let mut user_repo = MockUserRepository::new();
        let password_hash = hash_of("Passw0rd");

        user_repo.expect_find_by_login().times(1).returning(move |_| {
            Ok(Some(User {
                id: 7,
                username: "jackb".into(),
                email: "jack@example.com".into(),
                password_hash: password_hash.clone(),
                active: false,
                ..Default::default()
            }))
        });

        let service = service(
            user_repo,
            MockSessionRepository::new(),
            MockTokenRepository::new(),
            MockMailer::new(),
        );
        let result = service.sign_in("jackb", "Passw0rd").await;

        assert!(matches!(result, Err(AuthError::NotActivated)));
    }

    #[tokio::test]
    async fn test_sign_in_rejects_wrong_password() {
        let mut user_repo = MockUserRepository::new();
        let password_hash = hash_of("Passw0rd");

        user_repo.expect_find_by_login().times(1).returning(move |_| {
            Ok(Some(User {
                id: 7,
                active: true,
                password_hash: password_hash.clone(),
                ..Default::default()
            }))
        });

        let service = service(
            user_repo,
            MockSessionRepository::new(),
            MockTokenRepository::new(),
            MockMailer::new(),
        );
        let result = service.sign_in("jackb", "wrong-Passw0rd").await;

        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_sign_in_active_account_mints_tokens() {
        let mut user_repo = MockUserRepository::new();
        let mut session_repo = MockSessionRepository::new();
        let password_hash = hash_of("Passw0rd");

        user_repo.expect_find_by_login().times(1).returning(move |_| {
            Ok(Some(User {
                id: 7,
                active: true,
                password_hash: password_hash.clone(),
                ..Default::default()
            }))
        });
        session_repo
            .expect_create()
            .withf(|s: &Session| s.user_id == 7)
            .times(1)
            .returning(|s| Ok(s.clone()));

        let service = service(
            user_repo,
            session_repo,
            MockTokenRepository::new(),
            MockMailer::new(),
        );
        let tokens = service.sign_in("jackb", "Passw0rd").await.unwrap();

        assert_eq!(tokens.token_type, "Bearer");
        assert_eq!(tokens.expires_in, 3 * 3600);
        assert_eq!(decode_access_token(&tokens.access_token, &jwt_settings().secret).unwrap(), 7);
    }

    #[tokio::test]
    async fn test_confirm_email_activates_and_deletes_token() {
        let mut user_repo = MockUserRepository::new();
        let mut token_repo = MockTokenRepository::new();

        token_repo
            .expect_find_by_body()
            .with(eq("tok"), eq(TokenType::ConfirmEmail))
            .times(1)
            .returning(|_, _| {
                Ok(Some(Token {
                    id: 5,
                    body: "tok".into(),
                    user_id: 7,
                    token_type: TokenType::ConfirmEmail,
                    created_at: Utc::now(),
                }))
            });
        user_repo.expect_activate().with(eq(7)).times(1).returning(|_| Ok(()));
        token_repo.expect_delete().with(eq(5)).times(1).returning(|_| Ok(()));

        let service = service(user_repo, MockSessionRepository::new(), token_repo, MockMailer::new());
        assert!(service.confirm_email("tok").await.is_ok());
    }

    #[tokio::test]
    async fn test_confirm_email_unknown_token_is_not_found() {
        let mut token_repo = MockTokenRepository::new();
        token_repo
            .expect_find_by_body()
            .times(1)
            .returning(|_, _| Ok(None));

        let service = service(
            MockUserRepository::new(),
            MockSessionRepository::new(),
            token_repo,
            MockMailer::new(),
        );
        let result = service.confirm_email("gone").await;

        assert!(matches!(result, Err(AuthError::TokenNotFound)));
    }

    #[tokio::test]
    async fn test_confirm_email_expired_token_rejected_and_deleted() {
        let mut token_repo = MockTokenRepository::new();

        token_repo.expect_find_by_body().times(1).returning(|_, _| {
            Ok(Some(Token {
                id: 5,
                body: "tok".into(),
                user_id: 7,
                token_type: TokenType::ConfirmEmail,
                created_at: Utc::now() - Duration::minutes(6),
            }))
        });
        token_repo.expect_delete().with(eq(5)).times(1).returning(|_| Ok(()));

        let service = service(
            MockUserRepository::new(),
            MockSessionRepository::new(),
            token_repo,
            MockMailer::new(),
        );
        let result = service.confirm_email("tok").await;

        assert!(matches!(result, Err(AuthError::TokenExpired)));
    }

    #[tokio::test]
    async fn test_refresh_rotates_session_token_hash() {
        let mut session_repo = MockSessionRepository::new();
        let session = Session::new(7, "old-hash".into(), Utc::now() + Duration::days(7));
        let session_id = session.id;

        session_repo
            .expect_find_by_token_hash()
            .times(1)
            .returning(move |_| Ok(Some(session.clone())));
        session_repo
            .expect_update_token_hash()
            .withf(move |id, hash, _| *id == session_id && hash != "old-hash")
            .times(1)
            .returning(|_, _, _| Ok(()));

        let service = service(
            MockUserRepository::new(),
            session_repo,
            MockTokenRepository::new(),
            MockMailer::new(),
        );
        let tokens = service.refresh_token("raw-refresh-token").await.unwrap();

        assert_eq!(decode_access_token(&tokens.access_token, &jwt_settings().secret).unwrap(), 7);
    }

    #[tokio::test]
    async fn test_refresh_with_unknown_token_fails() {
        let mut session_repo = MockSessionRepository::new();
        session_repo
            .expect_find_by_token_hash()
            .times(1)
            .returning(|_| Ok(None));

        let service = service(
            MockUserRepository::new(),
            session_repo,
            MockTokenRepository::new(),
            MockMailer::new(),
        );
        let result = service.refresh_token("bogus").await;

        assert!(matches!(result, Err(AuthError::SessionNotFound)));
    }

    #[test]
    fn test_decode_rejects_garbage_token() {
        assert!(matches!(
            decode_access_token("not-a-jwt", "test-secret-that-is-at-least-32-chars!!"),
            Err(AuthError::InvalidToken)
        ));
    }
}
