//! Profile command handlers.

use std::path::PathBuf;

use anyhow::{Context, Result};
use jobseek_session::EditProfileRequest;
use jobseek_session::config::Config;
use jobseek_session::upload::Attachment;

use super::auth::require_session;
use super::build_client;

/// Field overrides from the command line; `None` keeps the current value.
#[derive(Debug, Default)]
pub struct ProfileEdits {
    pub name: Option<String>,
    pub dob: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub about: Option<String>,
    pub avatar: Option<PathBuf>,
    pub cv: Option<PathBuf>,
}

pub async fn edit(config: &Config, edits: ProfileEdits) -> Result<()> {
    let client = build_client(config)?;
    require_session(&client).await?;

    let store = client.store();
    let (Some(token), Some(user)) = (store.access_token(), store.user()) else {
        anyhow::bail!("Not logged in. Run `jobseek login` first.");
    };

    let mut profile = user.profile_fields();
    let ProfileEdits {
        name,
        dob,
        phone,
        address,
        about,
        avatar,
        cv,
    } = edits;
    profile.name = name.or(profile.name);
    profile.dob = dob.or(profile.dob);
    profile.phone = phone.or(profile.phone);
    profile.address = address.or(profile.address);
    profile.about = about.or(profile.about);

    let mut request = EditProfileRequest::new(profile, token);
    if let Some(path) = avatar {
        request = request.with_avatar(vec![read_attachment(&path).await?]);
    }
    if let Some(path) = cv {
        request = request.with_cv(vec![read_attachment(&path).await?]);
    }

    let session = client.edit_profile(request).await?;
    let user = serde_json::to_string_pretty(&session.user()).context("render user")?;
    println!("{user}");
    Ok(())
}

async fn read_attachment(path: &std::path::Path) -> Result<Attachment> {
    Attachment::from_path(path)
        .await
        .with_context(|| format!("load attachment {}", path.display()))
}
