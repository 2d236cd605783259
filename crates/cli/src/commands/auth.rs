//! `login`, `register`, `logout` and `whoami`.

use std::io::Write;

use c2c_client::Marketplace;
use c2c_core::validation::{LoginForm, RegisterForm};

use super::{CommandResult, reject};
use crate::render::Renderer;

pub async fn login<W: Write>(
    market: &Marketplace,
    out: &mut Renderer<W>,
    email: String,
    password: String,
) -> CommandResult {
    let user = match market.login(&LoginForm::new(email, password)).await {
        Ok(user) => user,
        Err(e) => return Err(reject(out, e)),
    };
    out.line(format_args!("Signed in as {}", user.display_name()))?;
    Ok(())
}

pub async fn register<W: Write>(
    market: &Marketplace,
    out: &mut Renderer<W>,
    form: RegisterForm,
) -> CommandResult {
    let user = match market.register(&form).await {
        Ok(user) => user,
        Err(e) => return Err(reject(out, e)),
    };
    out.line(format_args!(
        "Welcome, {}! Your account is ready.",
        user.display_name()
    ))?;
    Ok(())
}

pub async fn logout<W: Write>(market: &Marketplace, out: &mut Renderer<W>) -> CommandResult {
    // Attach the persisted token so the server can end the session too.
    if let Err(e) = market.initialize_auth().await {
        tracing::debug!(error = %e, "Session not restored before logout");
    }
    market.logout().await?;
    out.line("Signed out")?;
    Ok(())
}

pub async fn whoami<W: Write>(market: &Marketplace, out: &mut Renderer<W>) -> CommandResult {
    if let Err(e) = market.initialize_auth().await {
        tracing::warn!(error = %e, "Could not restore session");
    }
    let auth = market.auth();
    match auth.data.user() {
        Some(user) if auth.data.is_authenticated() => out.user(user)?,
        _ => out.line("Not signed in")?,
    }
    Ok(())
}
