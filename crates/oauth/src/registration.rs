//! Registration form state, including the provider profiles attached through OAuth handshakes.
//! Profiles live only as long as the form does.

use crate::coordinator::HandshakeOutcome;
use aptwise_api::{CreateAccount, OAuthProfile, Provider};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

const SPECIAL_CHARACTERS: &str = "!@#$%^&*(),.?\":{}|<>";

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"))
}

pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// Suggests a full address when the domain looks like a truncated common provider
/// (`ada@gm` -> `ada@gmail.com`).
pub fn email_suggestion(email: &str) -> Option<String> {
    let at = email.rfind('@')?;
    let (local, domain) = (&email[..at], email[at + 1..].to_lowercase());
    if domain.is_empty() {
        return None;
    }
    let full = ["gmail.com", "yahoo.com", "outlook.com", "hotmail.com"]
        .into_iter()
        .find(|full| {
            let name = full.trim_end_matches(".com");
            // "outlok" is a common enough typo to be worth catching.
            name.starts_with(domain.as_str()) || (domain == "outlok" && name == "outlook")
        })?;
    let suggestion = format!("{}@{}", local, full);
    (suggestion != email).then_some(suggestion)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordCriteria {
    pub length: bool,
    pub uppercase: bool,
    pub lowercase: bool,
    pub number: bool,
    pub special: bool,
}

impl PasswordCriteria {
    pub fn check(password: &str) -> Self {
        Self {
            length: password.chars().count() >= 8,
            uppercase: password.chars().any(|c| c.is_ascii_uppercase()),
            lowercase: password.chars().any(|c| c.is_ascii_lowercase()),
            number: password.chars().any(|c| c.is_ascii_digit()),
            special: password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)),
        }
    }

    pub fn missing(&self) -> Vec<&'static str> {
        [
            (self.length, "8+ characters"),
            (self.uppercase, "uppercase letter"),
            (self.lowercase, "lowercase letter"),
            (self.number, "number"),
            (self.special, "special character"),
        ]
        .into_iter()
        .filter(|(met, _)| !met)
        .map(|(_, label)| label)
        .collect()
    }

    pub fn error_message(&self) -> Option<String> {
        let missing = self.missing();
        if missing.is_empty() {
            None
        } else {
            Some(format!("Password must include: {}", missing.join(", ")))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationErrors {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
    pub terms: Option<String>,
}

impl RegistrationErrors {
    pub fn is_empty(&self) -> bool {
        self.messages().is_empty()
    }

    pub fn messages(&self) -> Vec<&str> {
        [
            &self.full_name,
            &self.email,
            &self.password,
            &self.confirm_password,
            &self.terms,
        ]
        .into_iter()
        .filter_map(|e| e.as_deref())
        .collect()
    }
}

/// How an OAuth outcome changed the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthApplied {
    /// The provider account already belongs to a user; the form was pre-filled from it.
    LinkedAccount,
    /// A fresh provider profile is now attached and pre-filled the form.
    ProfileAttached,
    /// Nothing usable came back; the user completes the form by hand.
    Manual,
}

#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub linkedin_url: String,
    pub github_url: String,
    pub skills: Vec<String>,
    pub interview_categories: Vec<String>,
    pub terms_accepted: bool,
    profiles: HashMap<Provider, OAuthProfile>,
    connected: Vec<Provider>,
}

impl RegistrationForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn profile(&self, provider: Provider) -> Option<&OAuthProfile> {
        self.profiles.get(&provider)
    }

    pub fn has_oauth_profile(&self) -> bool {
        !self.profiles.is_empty()
    }

    pub fn is_connected(&self, provider: Provider) -> bool {
        self.connected.contains(&provider)
    }

    /// An attached provider profile with no password typed means the backend picks the password.
    pub fn is_oauth_only(&self) -> bool {
        self.has_oauth_profile() && self.password.is_empty()
    }

    pub fn add_skill(&mut self, skill: &str) {
        let skill = skill.trim();
        if !skill.is_empty() {
            self.skills.push(skill.to_string());
        }
    }

    pub fn remove_skill(&mut self, index: usize) {
        if index < self.skills.len() {
            self.skills.remove(index);
        }
    }

    pub fn toggle_category(&mut self, category: &str) {
        if let Some(pos) = self.interview_categories.iter().position(|c| c == category) {
            self.interview_categories.remove(pos);
        } else {
            self.interview_categories.push(category.to_string());
        }
    }

    fn url_field(&mut self, provider: Provider) -> &mut String {
        match provider {
            Provider::LinkedIn => &mut self.linkedin_url,
            Provider::GitHub => &mut self.github_url,
        }
    }

    fn mark_connected(&mut self, provider: Provider) {
        if !self.connected.contains(&provider) {
            self.connected.push(provider);
        }
    }

    /// Folds a successful handshake into the form. Fields the user already typed are kept.
    pub fn apply_oauth(&mut self, outcome: &HandshakeOutcome) -> OAuthApplied {
        let provider = outcome.provider;

        if outcome.is_linked_account {
            if let Some(user) = outcome.user() {
                fill(&mut self.full_name, user.name.clone().or(user.full_name.clone()));
                fill(&mut self.email, user.email.clone());
                let url = match provider {
                    Provider::LinkedIn => user.linkedin_url.clone(),
                    Provider::GitHub => user.github_url.clone(),
                };
                fill(self.url_field(provider), url);
            }
            self.mark_connected(provider);
            return OAuthApplied::LinkedAccount;
        }

        match outcome.profile() {
            Some(profile) => {
                fill(&mut self.full_name, profile.name.clone());
                fill(&mut self.email, profile.email.clone());
                fill(self.url_field(provider), profile.public_url());
                self.profiles.insert(provider, profile);
                self.mark_connected(provider);
                OAuthApplied::ProfileAttached
            }
            None => OAuthApplied::Manual,
        }
    }

    pub fn validate(&self) -> Result<(), RegistrationErrors> {
        let mut errors = RegistrationErrors::default();

        if self.full_name.trim().is_empty() {
            errors.full_name = Some("Full name is required".to_string());
        }

        if self.email.is_empty() {
            errors.email = Some("Email is required".to_string());
        } else if !is_valid_email(&self.email) {
            errors.email = Some("Please enter a valid email address".to_string());
        }

        if self.password.is_empty() {
            if !self.has_oauth_profile() {
                errors.password =
                    Some("Password is required (or connect via LinkedIn/GitHub)".to_string());
            }
        } else {
            errors.password = PasswordCriteria::check(&self.password).error_message();
            if self.confirm_password.is_empty() {
                errors.confirm_password = Some("Please confirm your password".to_string());
            } else if self.confirm_password != self.password {
                errors.confirm_password = Some("Passwords do not match".to_string());
            }
        }

        if !self.terms_accepted {
            errors.terms = Some("You must agree to the terms and conditions".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validates and builds the `create-account` body.
    pub fn to_create_account(&self) -> Result<CreateAccount, RegistrationErrors> {
        self.validate()?;

        let linkedin = self.profile(Provider::LinkedIn);
        let github = self.profile(Provider::GitHub);
        let typed = |s: &str| (!s.is_empty()).then(|| s.to_string());

        Ok(CreateAccount {
            name: self.full_name.trim().to_string(),
            email: self.email.clone(),
            password: typed(&self.password),
            linkedin_url: typed(&self.linkedin_url)
                .or_else(|| linkedin.and_then(|p| p.public_url())),
            github_url: typed(&self.github_url).or_else(|| github.and_then(|p| p.public_url())),
            skills: self.skills.clone(),
            interview_categories: self.interview_categories.clone(),
            linkedin_id: linkedin.and_then(|p| p.provider_id.clone()),
            linkedin_access_token: linkedin.and_then(|p| p.access_token.clone()),
            is_linkedin_connected: linkedin.map(|_| true),
            github_id: github.and_then(|p| p.provider_id.clone()),
            github_access_token: github.and_then(|p| p.access_token.clone()),
            is_github_connected: github.map(|_| true),
            profile_picture_url: github.and_then(|p| p.profile_picture_url.clone()),
            is_oauth_only: self.is_oauth_only(),
        })
    }
}

fn fill(field: &mut String, value: Option<String>) {
    if field.trim().is_empty() {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            *field = value;
        }
    }
}
