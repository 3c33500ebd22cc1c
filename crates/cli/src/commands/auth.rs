//! Login, logout and session inspection

use clap::Args;
use larder_app::{context::AppContext, domain::sessions::SessionError};

use super::output;

/// Login arguments.
#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Account email address
    #[arg(long, env = "LARDER_EMAIL")]
    pub email: String,

    /// Account password
    #[arg(long, env = "LARDER_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[expect(clippy::print_stdout, reason = "login outcome is command output")]
pub(crate) async fn login(app: &AppContext, args: &LoginArgs) -> Result<(), String> {
    let mut notices = app.cart.notices();

    let user = app
        .login(&args.email, &args.password)
        .await
        .map_err(|error| match error {
            SessionError::Api(api) => api.user_message("Login failed"),
            other => other.to_string(),
        })?;

    println!(
        "Logged in as {}",
        user.username.as_deref().unwrap_or(&user.email)
    );

    output::print_success_notices(&mut notices);
    output::finish(&app.cart.state())
}

#[expect(clippy::print_stdout, reason = "logout outcome is command output")]
pub(crate) async fn logout(app: &AppContext) -> Result<(), String> {
    app.logout().await.map_err(|error| error.to_string())?;

    println!("Logged out");

    output::finish(&app.cart.state())
}

#[expect(clippy::print_stdout, reason = "session details are command output")]
pub(crate) fn whoami(app: &AppContext) {
    let sessions = &app.sessions;

    if let Some(user) = sessions.current_user() {
        println!("{} (user {})", user.email, user.id);
    } else if sessions.is_authenticated() {
        println!("Logged in");
    } else if let Some(guest) = sessions.guest_session() {
        println!(
            "Guest session {} (expires {})",
            guest.session_key, guest.expires_at
        );
    } else {
        println!("No session");
    }
}
