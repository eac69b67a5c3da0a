use crate::commands::{Command, USAGE};
use crate::config::Config;
use crate::prompt::Prompt;
use crate::terminal::TerminalHost;
use anyhow::{anyhow, Result};
use aptwise_api::{ApiClient, Credentials, Provider, SessionStore, User};
use aptwise_oauth::registration::OAuthApplied;
use aptwise_oauth::{OAuthCoordinator, OAuthError, Purpose, RegistrationForm};
use tracing::{error, info};

pub struct App {
    session: SessionStore,
    oauth: OAuthCoordinator<TerminalHost>,
    prompt: Prompt,
}

impl App {
    pub fn new(config: &Config) -> Result<Self> {
        let api = ApiClient::with_timeout(&config.api.base_url, config.api_timeout())?;
        let prompt = Prompt::stdin();
        let host = TerminalHost::new(config.origin()?, prompt.clone(), config.close_delay());
        Ok(Self {
            session: SessionStore::new(api.clone()),
            oauth: OAuthCoordinator::with_settings(api, host, config.coordinator_settings()),
            prompt,
        })
    }

    pub async fn execute(&self, command: Command) -> Result<()> {
        match command {
            Command::Help => println!("{}", USAGE),
            Command::Me => match self.session.check().await {
                Some(user) => print_user(&user),
                None => println!("Not logged in."),
            },
            Command::Login { email, password } => self.login(email, password).await?,
            Command::Logout => {
                self.session.logout().await;
                println!("Logged out.");
            }
            Command::Auth(provider) => self.authenticate(provider).await?,
            Command::Connect(provider) => self.connect(provider).await?,
            Command::Register(provider) => self.register(provider).await?,
            Command::Disconnect(provider) => {
                self.oauth.disconnect(provider).await.map_err(|e| {
                    anyhow!("{} disconnection failed: {}", provider, e)
                })?;
                println!("{} disconnected.", provider);
            }
        }
        Ok(())
    }

    async fn login(&self, email: String, password: Option<String>) -> Result<()> {
        let password = match password {
            Some(password) => password,
            None => self
                .prompt
                .required("Password: ")
                .await?
                .ok_or_else(|| anyhow!("No password given"))?,
        };
        self.session
            .login(&Credentials { email, password })
            .await
            .map_err(|e| anyhow!("Login failed: {}", e))?;
        match self.session.user().await {
            Some(user) => print_user(&user),
            None => println!("Logged in."),
        }
        Ok(())
    }

    async fn authenticate(&self, provider: Provider) -> Result<()> {
        let outcome = self
            .oauth
            .initiate(provider, Purpose::Authenticate)
            .await
            .map_err(report)?;
        let user = self.session.refresh().await.ok().flatten().or(outcome.user());
        match user {
            Some(user) => print_user(&user),
            None => println!("{} authentication successful.", provider),
        }
        Ok(())
    }

    /// Links the provider when someone is logged in; otherwise logs in through it instead.
    async fn connect(&self, provider: Provider) -> Result<()> {
        if self.session.check().await.is_none() {
            info!(%provider, "Not logged in, using the authentication flow");
            return self.authenticate(provider).await;
        }
        let outcome = self
            .oauth
            .initiate(provider, Purpose::Connect)
            .await
            .map_err(report)?;
        println!(
            "{}",
            outcome
                .result
                .message()
                .map(String::from)
                .unwrap_or_else(|| format!("{} account connected successfully!", provider))
        );
        Ok(())
    }

    async fn register(&self, provider: Provider) -> Result<()> {
        let mut form = RegistrationForm::new();

        match self.oauth.initiate(provider, Purpose::Register).await {
            Ok(outcome) => match form.apply_oauth(&outcome) {
                OAuthApplied::LinkedAccount => {
                    println!(
                        "This {} account is already linked to a user. Log in with `aptwise auth {}`.",
                        provider,
                        provider.slug()
                    );
                    return Ok(());
                }
                OAuthApplied::ProfileAttached => println!(
                    "{} profile connected! Please complete the remaining registration details.",
                    provider
                ),
                OAuthApplied::Manual => {
                    println!("{} sent no profile data; please fill in the form.", provider)
                }
            },
            Err(e) => {
                error!("{} registration handshake failed: {}", provider, e);
                println!("{}", e.user_message());
                println!("Continuing with manual registration.");
            }
        }

        self.fill_form(&mut form).await?;
        let account = form.to_create_account().map_err(|errors| {
            anyhow!("Registration is incomplete:\n  {}", errors.messages().join("\n  "))
        })?;
        let user = self
            .session
            .api()
            .create_account(&account)
            .await
            .map_err(|e| anyhow!("Registration failed: {}", e))?;
        self.session.set_user(Some(user.clone())).await;
        println!("Account created.");
        print_user(&user);
        Ok(())
    }

    async fn fill_form(&self, form: &mut RegistrationForm) -> Result<()> {
        if form.full_name.is_empty() {
            form.full_name = self.prompt.required("Full name: ").await?.unwrap_or_default();
        }
        if form.email.is_empty() {
            form.email = self.prompt.required("Email: ").await?.unwrap_or_default();
        } else if let Some(suggestion) = aptwise_oauth::registration::email_suggestion(&form.email)
        {
            if self.prompt.confirm(&format!("Did you mean {}?", suggestion)).await? {
                form.email = suggestion;
            }
        }

        let label = if form.has_oauth_profile() {
            "Password (leave empty to sign in through your provider only): "
        } else {
            "Password: "
        };
        form.password = self.prompt.read_line(label).await?.unwrap_or_default();
        if !form.password.is_empty() {
            form.confirm_password = self
                .prompt
                .read_line("Confirm password: ")
                .await?
                .unwrap_or_default();
        }

        if let Some(skills) = self.prompt.read_line("Skills (comma separated): ").await? {
            for skill in skills.split(',') {
                form.add_skill(skill);
            }
        }
        form.terms_accepted = self
            .prompt
            .confirm("Do you agree to the terms and conditions?")
            .await?;
        Ok(())
    }
}

fn report(e: OAuthError) -> anyhow::Error {
    error!(provider = %e.provider(), "OAuth handshake failed: {}", e);
    anyhow!(e.user_message())
}

fn print_user(user: &User) {
    println!("{}", user.display_name());
    if let Some(email) = &user.email {
        println!("  email:    {}", email);
    }
    for provider in Provider::ALL {
        let state = if user.is_connected(provider) {
            "connected"
        } else {
            "not connected"
        };
        println!("  {:<9} {}", format!("{}:", provider.slug()), state);
    }
}
