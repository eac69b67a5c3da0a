use aptwise_api::Provider;

pub const USAGE: &str = "\
Usage: aptwise <command>

Commands:
  me                        Show the logged-in user
  login <email> [password]  Log in with email and password
  logout                    Log out
  auth <provider>           Log in (or sign up) with linkedin|github
  connect <provider>        Link linkedin|github to your account
  register <provider>       Create an account, pre-filled from linkedin|github
  disconnect <provider>     Unlink linkedin|github
  help                      Show this message";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Me,
    Login {
        email: String,
        password: Option<String>,
    },
    Logout,
    Auth(Provider),
    Connect(Provider),
    Register(Provider),
    Disconnect(Provider),
    Help,
}

impl Command {
    pub fn parse(args: &[String]) -> Result<Self, String> {
        let Some((name, rest)) = args.split_first() else {
            return Ok(Self::Help);
        };
        let provider = || -> Result<Provider, String> {
            rest.first()
                .ok_or_else(|| format!("`{}` needs a provider (linkedin or github)", name))?
                .parse()
        };

        match name.to_lowercase().as_str() {
            "me" | "whoami" => Ok(Self::Me),
            "login" => {
                let email = rest
                    .first()
                    .cloned()
                    .ok_or_else(|| "`login` needs an email".to_string())?;
                Ok(Self::Login {
                    email,
                    password: rest.get(1).cloned(),
                })
            }
            "logout" => Ok(Self::Logout),
            "auth" | "signin" => Ok(Self::Auth(provider()?)),
            "connect" | "link" => Ok(Self::Connect(provider()?)),
            "register" | "signup" => Ok(Self::Register(provider()?)),
            "disconnect" | "unlink" => Ok(Self::Disconnect(provider()?)),
            "help" | "-h" | "--help" => Ok(Self::Help),
            other => Err(format!("Unknown command: {}", other)),
        }
    }
}
