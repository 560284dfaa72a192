use std::env;
use std::io::Write;

use civic_auth::{AuthContext, AuthService};
use dotenvy::dotenv;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use crate::commands::{USAGE, default_commands, parse, run, write_user};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("{}=debug,civic_auth=debug", env!("CARGO_CRATE_NAME")).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.iter().any(|arg| arg == "-h" || arg == "--help") {
        println!("{USAGE}");
        return Ok(());
    }

    let commands = if args.is_empty() {
        default_commands(env::var("DEMO_EMAIL").ok(), env::var("DEMO_PASSWORD").ok())
    } else {
        match parse(&args) {
            Ok(commands) => commands,
            Err(e) => {
                eprintln!("{e}\n\n{USAGE}");
                std::process::exit(2);
            }
        }
    };

    let auth = AuthService::new(AuthContext::from_env()?);

    let _subscription = auth.on_auth_state_change(|user| {
        let mut out = std::io::stdout().lock();
        let printed = match user {
            Some(user) => writeln!(out, "[auth] session started")
                .and_then(|()| write_user(&mut out, &user)),
            None => writeln!(out, "[auth] session ended"),
        };
        if let Err(e) = printed {
            tracing::warn!("Failed to print auth state: {}", e);
        }
    });

    run(&auth, &commands, &mut std::io::stdout()).await?;

    // Let the listener report the last transition before exiting
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    Ok(())
}
