use subtle::ConstantTimeEq;

/// Why a request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// No `Authorization` header at all.
    MissingCredentials,
    /// Header present, but no bearer token or the wrong one.
    InvalidToken,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingCredentials => write!(f, "Missing authorization header"),
            AuthError::InvalidToken => write!(f, "Invalid lecturer token"),
        }
    }
}

impl std::error::Error for AuthError {}

/// Decides whether a caller may schedule lectures.
pub trait Authorizer: Send + Sync {
    /// Check the raw `Authorization` header value.
    fn authorize(&self, authorization: Option<&str>) -> Result<(), AuthError>;

    /// Check a bare token (no scheme), e.g. from a login form.
    fn verify(&self, token: &str) -> bool;
}

/// Extract the token from `Bearer <token>`. The scheme is case-insensitive.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Single shared secret handed out to lecturers.
pub struct StaticTokenAuthorizer {
    token: String,
}

impl StaticTokenAuthorizer {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for StaticTokenAuthorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenAuthorizer")
            .field("token", &"<redacted>")
            .finish()
    }
}

impl Authorizer for StaticTokenAuthorizer {
    fn authorize(&self, authorization: Option<&str>) -> Result<(), AuthError> {
        let header = authorization.ok_or(AuthError::MissingCredentials)?;
        match bearer_token(header) {
            Some(token) if self.verify(token) => Ok(()),
            _ => Err(AuthError::InvalidToken),
        }
    }

    fn verify(&self, token: &str) -> bool {
        let expected = self.token.as_bytes();
        let given = token.as_bytes();
        expected.len() == given.len() && bool::from(expected.ct_eq(given))
    }
}
