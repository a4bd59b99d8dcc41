//! Login and signup form state and validation.
//!
//! Validation happens here, before any request is made. The server's own
//! checks only show up as an inline error after submit.

use elib_core::models::NewUser;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Longest value any text field accepts
const MAX_FIELD_LENGTH: usize = 128;

/// Printable characters only, up to the field limit
pub fn can_add_char(current_len: usize, c: char) -> bool {
    current_len < MAX_FIELD_LENGTH && !c.is_control()
}

/// `local@domain.tld`: no whitespace, exactly one `@`, and a dot in the
/// domain with something on both sides of it.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() {
        return false;
    }
    if email.chars().any(char::is_whitespace) || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

// ============================================================================
// Login
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFocus {
    Email,
    Password,
    Button,
}

impl LoginFocus {
    pub fn next(self) -> Self {
        match self {
            LoginFocus::Email => LoginFocus::Password,
            LoginFocus::Password => LoginFocus::Button,
            LoginFocus::Button => LoginFocus::Email,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            LoginFocus::Email => LoginFocus::Button,
            LoginFocus::Password => LoginFocus::Email,
            LoginFocus::Button => LoginFocus::Password,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub focus: LoginFocus,
    pub error: Option<String>,
    pub submitting: bool,
}

impl LoginForm {
    pub fn new(email: String) -> Self {
        let focus = if email.is_empty() {
            LoginFocus::Email
        } else {
            LoginFocus::Password
        };
        Self {
            email,
            password: String::new(),
            focus,
            error: None,
            submitting: false,
        }
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err("Email and password required");
        }
        Ok(())
    }

    pub fn active_field_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            LoginFocus::Email => Some(&mut self.email),
            LoginFocus::Password => Some(&mut self.password),
            LoginFocus::Button => None,
        }
    }
}

// ============================================================================
// Signup
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupField {
    Username,
    FirstName,
    LastName,
    Email,
    Password,
    Confirm,
    Phone,
    Submit,
}

impl SignupField {
    pub const ALL: [SignupField; 8] = [
        SignupField::Username,
        SignupField::FirstName,
        SignupField::LastName,
        SignupField::Email,
        SignupField::Password,
        SignupField::Confirm,
        SignupField::Phone,
        SignupField::Submit,
    ];

    fn index(self) -> usize {
        Self::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn label(self) -> &'static str {
        match self {
            SignupField::Username => "Username",
            SignupField::FirstName => "First name",
            SignupField::LastName => "Last name",
            SignupField::Email => "Email",
            SignupField::Password => "Password",
            SignupField::Confirm => "Confirm",
            SignupField::Phone => "Phone",
            SignupField::Submit => "Sign up",
        }
    }

    pub fn is_secret(self) -> bool {
        matches!(self, SignupField::Password | SignupField::Confirm)
    }
}

/// Per-field validation messages. `None` means the field is fine.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SignupErrors {
    pub username: Option<&'static str>,
    pub email: Option<&'static str>,
    pub password: Option<&'static str>,
    pub confirm: Option<&'static str>,
}

impl SignupErrors {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.confirm.is_none()
    }

    pub fn for_field(&self, field: SignupField) -> Option<&'static str> {
        match field {
            SignupField::Username => self.username,
            SignupField::Email => self.email,
            SignupField::Password => self.password,
            SignupField::Confirm => self.confirm,
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SignupForm {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm: String,
    pub phone: String,
    pub focus: SignupField,
    pub error: Option<String>,
    pub submitting: bool,
}

impl Default for SignupForm {
    fn default() -> Self {
        Self {
            username: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            password: String::new(),
            confirm: String::new(),
            phone: String::new(),
            focus: SignupField::Username,
            error: None,
            submitting: false,
        }
    }
}

impl SignupForm {
    pub fn errors(&self) -> SignupErrors {
        let mut errors = SignupErrors::default();

        if self.username.trim().is_empty() {
            errors.username = Some("Username is required");
        }
        if self.email.trim().is_empty() {
            errors.email = Some("Email is required");
        } else if !is_valid_email(&self.email) {
            errors.email = Some("Invalid email format");
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.password = Some("Password must be at least 6 characters");
        }
        if self.password != self.confirm {
            errors.confirm = Some("Passwords do not match");
        }
        errors
    }

    /// Submit stays disabled until this is true
    pub fn is_valid(&self) -> bool {
        self.errors().is_empty()
    }

    pub fn value(&self, field: SignupField) -> &str {
        match field {
            SignupField::Username => &self.username,
            SignupField::FirstName => &self.first_name,
            SignupField::LastName => &self.last_name,
            SignupField::Email => &self.email,
            SignupField::Password => &self.password,
            SignupField::Confirm => &self.confirm,
            SignupField::Phone => &self.phone,
            SignupField::Submit => "",
        }
    }

    pub fn active_field_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            SignupField::Username => Some(&mut self.username),
            SignupField::FirstName => Some(&mut self.first_name),
            SignupField::LastName => Some(&mut self.last_name),
            SignupField::Email => Some(&mut self.email),
            SignupField::Password => Some(&mut self.password),
            SignupField::Confirm => Some(&mut self.confirm),
            SignupField::Phone => Some(&mut self.phone),
            SignupField::Submit => None,
        }
    }

    pub fn to_new_user(&self) -> NewUser {
        let phone = self.phone.trim();
        NewUser {
            user_name: self.username.trim().to_string(),
            first_name: self.first_name.trim().to_string(),
            second_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            phone: (!phone.is_empty()).then(|| phone.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_signup() -> SignupForm {
        SignupForm {
            username: "ann".to_string(),
            email: "ann@example.com".to_string(),
            password: "secret".to_string(),
            confirm: "secret".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_email_shapes() {
        assert!(is_valid_email("ann@example.com"));
        assert!(is_valid_email("a.b@mail.example.org"));
        assert!(!is_valid_email("ann"));
        assert!(!is_valid_email("ann@"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ann@example"));
        assert!(!is_valid_email("ann@.com"));
        assert!(!is_valid_email("ann@example."));
        assert!(!is_valid_email("ann@@example.com"));
        assert!(!is_valid_email("an n@example.com"));
        assert!(!is_valid_email(" ann@example.com"));
    }

    #[test]
    fn test_valid_signup_has_no_errors() {
        let form = valid_signup();
        assert_eq!(form.errors(), SignupErrors::default());
        assert!(form.is_valid());
    }

    #[test]
    fn test_username_required() {
        let form = SignupForm {
            username: "   ".to_string(),
            ..valid_signup()
        };
        assert_eq!(form.errors().username, Some("Username is required"));
        assert!(!form.is_valid());
    }

    #[test]
    fn test_email_required_then_shaped() {
        let mut form = SignupForm {
            email: String::new(),
            ..valid_signup()
        };
        assert_eq!(form.errors().email, Some("Email is required"));

        form.email = "ann.example.com".to_string();
        assert_eq!(form.errors().email, Some("Invalid email format"));
    }

    #[test]
    fn test_password_length_boundary() {
        let mut form = SignupForm {
            password: "12345".to_string(),
            confirm: "12345".to_string(),
            ..valid_signup()
        };
        assert!(form.errors().password.is_some());

        form.password = "123456".to_string();
        form.confirm = "123456".to_string();
        assert!(form.errors().password.is_none());
    }

    #[test]
    fn test_confirm_must_match() {
        let form = SignupForm {
            confirm: "secreT".to_string(),
            ..valid_signup()
        };
        let errors = form.errors();
        assert_eq!(errors.confirm, Some("Passwords do not match"));
        assert_eq!(errors.for_field(SignupField::Confirm), Some("Passwords do not match"));
        assert!(errors.password.is_none());
    }

    #[test]
    fn test_phone_is_optional() {
        let mut form = valid_signup();
        assert!(form.to_new_user().phone.is_none());

        form.phone = " 555-0100 ".to_string();
        assert!(form.is_valid());
        assert_eq!(form.to_new_user().phone.as_deref(), Some("555-0100"));
    }

    #[test]
    fn test_signup_focus_wraps() {
        assert_eq!(SignupField::Username.prev(), SignupField::Submit);
        assert_eq!(SignupField::Submit.next(), SignupField::Username);
        assert_eq!(SignupField::Email.next(), SignupField::Password);
    }

    #[test]
    fn test_login_requires_both_fields() {
        let mut form = LoginForm::new(String::new());
        assert_eq!(form.focus, LoginFocus::Email);
        assert!(form.validate().is_err());

        form.email = "ann@example.com".to_string();
        assert!(form.validate().is_err());

        form.password = "x".to_string();
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_prefilled_login_starts_on_password() {
        let form = LoginForm::new("ann@example.com".to_string());
        assert_eq!(form.focus, LoginFocus::Password);
    }

    #[test]
    fn test_can_add_char() {
        assert!(can_add_char(0, 'a'));
        assert!(can_add_char(127, '!'));
        assert!(!can_add_char(128, 'a'));
        assert!(!can_add_char(0, '\n'));
        assert!(!can_add_char(0, '\x00'));
    }
}
