// Interactive creation of one Airflow user
//
// The operator fills in username, email and password, then confirms. Anything
// but Y/y throws the pass away and starts over.

use anyhow::Result;

use crate::db::Session;
use crate::prompt::Prompt;
use crate::user::{PasswordUser, User};

pub const IS_CORRECT: &str = "Y";
pub const HINT_THIS_SCRIPT: &str = "YOU RUN THIS SCRIPT TO CREATE AIRFLOW USER NOW\n";
pub const HINT_USER: &str = "Please enter airflow username: ";

pub fn hint_email(username: &str) -> String {
    format!("Please enter email for airflow user `{}`: ", username)
}

pub fn hint_password(username: &str) -> String {
    format!("Please enter password for airflow user `{}`: ", username)
}

pub fn hint_confirm(username: &str, email: &str) -> String {
    format!(
        "\nhint!! > you want to add user with `{}` and `{}`\n\
         enter 'Y/y' to confirm the information\n\
         or enter other key to update information\n>> ",
        username, email
    )
}

/// Case-insensitive "Y", surrounding whitespace ignored
pub fn is_confirmed(answer: &str) -> bool {
    answer.trim().to_uppercase() == IS_CORRECT
}

/// Prompt until the operator confirms. Returns how many passes it took.
pub fn collect_user<P: Prompt>(prompt: &mut P, user: &mut PasswordUser) -> Result<usize> {
    let mut passes = 0;

    loop {
        passes += 1;
        tracing::debug!(pass = passes, "collecting user details");

        prompt.say(HINT_THIS_SCRIPT)?;
        let username = prompt.read_line(HINT_USER)?;
        let email = prompt.read_line(&hint_email(&username))?;
        let password = prompt.read_password(&hint_password(&username))?;
        user.set_username(username);
        user.set_email(email);
        user.set_password(&password)?;

        let answer = prompt.read_line(&hint_confirm(user.username(), user.email()))?;
        if is_confirmed(&answer) {
            return Ok(passes);
        }
        tracing::info!(username = user.username(), "details rejected, asking again");
    }
}

/// Add, commit, close. Commit errors are returned as-is.
pub fn persist(mut session: Session, user: PasswordUser) -> Result<()> {
    session.add(user);
    session.commit()?;
    session.close()
}

/// Full flow: collect a confirmed user, then open a session and write it
pub fn run<P, F>(prompt: &mut P, open_session: F) -> Result<User>
where
    P: Prompt,
    F: FnOnce() -> Result<Session>,
{
    let mut user = PasswordUser::new(User::new());
    collect_user(prompt, &mut user)?;

    let created = user.user().clone();
    persist(open_session()?, user)?;
    tracing::info!(username = %created.username, "user created");

    Ok(created)
}
