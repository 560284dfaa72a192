use std::io::{self, Write};

use civic_auth::{
    AuthService, AuthUser, CreateProfileData, SignInData, SignUpData, UpdateProfileData, UserRole,
};
use thiserror::Error;

pub const USAGE: &str = "\
Usage: demo-auth [COMMAND]...

Commands run in order against one session:
  signup <email> <password> [full_name] [citizen|official]
  signin <email> <password>
  signout
  status
  bio <text>

With no commands, signs in with DEMO_EMAIL/DEMO_PASSWORD when set and prints the status.";

const KEYWORDS: [&str; 5] = ["signup", "signin", "signout", "status", "bio"];

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SignUp {
        email: String,
        password: String,
        full_name: Option<String>,
        role: Option<UserRole>,
    },
    SignIn {
        email: String,
        password: String,
    },
    SignOut,
    Status,
    Bio(String),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SignUp { .. } => "signup",
            Self::SignIn { .. } => "signin",
            Self::SignOut => "signout",
            Self::Status => "status",
            Self::Bio(_) => "bio",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("Missing <{arg}> for {command}")]
    Missing {
        command: &'static str,
        arg: &'static str,
    },
}

struct Tokens<'a> {
    items: &'a [String],
    pos: usize,
}

impl<'a> Tokens<'a> {
    fn next_token(&mut self) -> Option<&'a str> {
        let item = self.items.get(self.pos)?;
        self.pos += 1;
        Some(item.as_str())
    }

    fn peek(&self) -> Option<&'a str> {
        self.items.get(self.pos).map(String::as_str)
    }

    fn required(
        &mut self,
        command: &'static str,
        arg: &'static str,
    ) -> Result<String, ParseError> {
        self.next_token()
            .map(str::to_string)
            .ok_or(ParseError::Missing { command, arg })
    }

    /// Next token, unless it starts another command
    fn optional(&mut self) -> Option<String> {
        let token = self.peek()?;
        if KEYWORDS.contains(&token) {
            return None;
        }
        self.pos += 1;
        Some(token.to_string())
    }

    /// Next token if it is exactly one of the role keywords
    fn optional_role(&mut self) -> Option<UserRole> {
        let role = match self.peek()? {
            "citizen" => UserRole::Citizen,
            "official" => UserRole::Official,
            _ => return None,
        };
        self.pos += 1;
        Some(role)
    }
}

pub fn parse(args: &[String]) -> Result<Vec<Command>, ParseError> {
    let mut tokens = Tokens {
        items: args,
        pos: 0,
    };
    let mut commands = Vec::new();

    while let Some(token) = tokens.next_token() {
        let command = match token {
            "signup" => {
                let email = tokens.required("signup", "email")?;
                let password = tokens.required("signup", "password")?;
                let role = tokens.optional_role();
                let (full_name, role) = match role {
                    Some(role) => (None, Some(role)),
                    None => {
                        let full_name = tokens.optional();
                        (full_name, tokens.optional_role())
                    }
                };
                Command::SignUp {
                    email,
                    password,
                    full_name,
                    role,
                }
            }
            "signin" => Command::SignIn {
                email: tokens.required("signin", "email")?,
                password: tokens.required("signin", "password")?,
            },
            "signout" => Command::SignOut,
            "status" => Command::Status,
            "bio" => Command::Bio(tokens.required("bio", "text")?),
            other => return Err(ParseError::Unknown(other.to_string())),
        };
        commands.push(command);
    }

    Ok(commands)
}

/// Commands for a bare invocation
pub fn default_commands(email: Option<String>, password: Option<String>) -> Vec<Command> {
    match (email, password) {
        (Some(email), Some(password)) => {
            vec![Command::SignIn { email, password }, Command::Status]
        }
        _ => vec![Command::Status],
    }
}

pub async fn run<W: Write>(
    auth: &AuthService,
    commands: &[Command],
    out: &mut W,
) -> io::Result<()> {
    for command in commands {
        tracing::debug!(command = command.name(), "Running command");
        match command {
            Command::SignUp {
                email,
                password,
                full_name,
                role,
            } => {
                let mut data = SignUpData::new(email, password);
                data.full_name = full_name.clone();
                data.role = *role;

                match auth.sign_up(data).await {
                    Ok(response) => {
                        writeln!(out, "Sign up successful! Check your email for verification.")?;
                        // Signed in straight away: make sure the profile row exists
                        if response.session.is_some() {
                            let profile = CreateProfileData {
                                full_name: full_name.clone(),
                                role: *role,
                                ..Default::default()
                            };
                            if auth.profiles().ensure_profile(profile).await.is_none() {
                                writeln!(out, "Error: Could not create profile")?;
                            }
                        }
                    }
                    Err(e) => writeln!(out, "Error: {}", e.message())?,
                }
            }
            Command::SignIn { email, password } => {
                match auth.sign_in(SignInData::new(email, password)).await {
                    Ok(_) => writeln!(out, "Sign in successful!")?,
                    Err(e) => writeln!(out, "Error: {}", e.message())?,
                }
            }
            Command::SignOut => match auth.sign_out().await {
                Ok(()) => writeln!(out, "Signed out successfully!")?,
                Err(e) => writeln!(out, "Error: {}", e.message())?,
            },
            Command::Status => match auth.get_current_user().await {
                Some(user) => write_user(out, &user)?,
                None => writeln!(out, "Not signed in")?,
            },
            Command::Bio(text) => {
                let updates = UpdateProfileData {
                    bio: Some(text.clone()),
                    ..Default::default()
                };
                match auth.profiles().try_update_profile(updates).await {
                    Ok(_) => writeln!(out, "Profile updated!")?,
                    Err(e) => writeln!(out, "Error: {e}")?,
                }
            }
        }
    }
    Ok(())
}

pub fn write_user<W: Write>(out: &mut W, user: &AuthUser) -> io::Result<()> {
    writeln!(out, "Email: {}", user.email().unwrap_or("-"))?;
    writeln!(out, "ID: {}", user.id())?;
    match &user.profile {
        Some(profile) => {
            writeln!(out, "Role: {}", profile.role)?;
            writeln!(out, "Name: {}", profile.full_name.as_deref().unwrap_or("-"))?;
            writeln!(out, "Verified: {}", profile.is_verified)?;
            writeln!(out, "Bio: {}", profile.bio.as_deref().unwrap_or("-"))?;
            writeln!(out, "Location: {}", profile.location.as_deref().unwrap_or("-"))?;
        }
        None => writeln!(out, "Profile: none")?,
    }
    Ok(())
}
