//! Interactive login against a real identity provider.
//!
//! Configure with the `SESSIONLINK_*` environment variables, run, open the
//! printed URL, log in, then paste the address the browser was redirected
//! to.

use sessionlink::prelude::*;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let link = SessionLinkBuilder::from_env().build().await?;
    let Some(login_url) = link.login_url() else {
        return Err("identity provider is misconfigured".into());
    };

    let mut events = link.events();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            tracing::info!(?event, "session event");
        }
    });

    println!("Open this address and log in:\n\n  {login_url}\n");
    println!("Paste the redirect address (empty line to cancel):");

    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    let line = line.trim();

    if line.is_empty() {
        link.cancel_login();
    } else if let Err(e) = link.complete_login(&Url::parse(line)?).await {
        eprintln!("provider login failed: {e}");
    }

    let mut watch = link.subscribe();
    let state = watch
        .wait_for(|s| s.user().is_some() || s.error().is_some())
        .await
        .ok_or("session controller stopped")?;

    match state {
        SessionState::Authenticated(user) => {
            println!("Signed in as {} <{}> ({})", user.display_name(), user.email, user.id);
        }
        SessionState::Failed(err) => println!("Login failed: {err}"),
        other => println!("Unexpected state: {other:?}"),
    }

    link.sign_out().await;
    Ok(())
}
